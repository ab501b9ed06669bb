use anyhow::{anyhow, Context, Result};
use driverdeck_core::{parse_folder_name, DriverExporter, DriverRecord, FolderKind, HostFs};
use driverdeck_inf::{parse_descriptor_from, ParseOutcome};
use driverdeck_naming::{derive_candidate, resolve_unique_name, UsedNames};
use driverdeck_report::{write_report_bundle, ReportOptions, ReportPaths};
use std::path::{Path, PathBuf};

const DESCRIPTOR_EXTENSION: &str = "inf";

pub trait Workflow {
    fn name(&self) -> &'static str;
    fn run(&self) -> Result<()>;
}

pub fn run_workflow<W: Workflow>(workflow: W) -> Result<()> {
    workflow.run()
}

#[derive(Debug, Clone)]
pub struct OrganizeParams {
    pub target_path: PathBuf,
    /// Parse-only mode: use the folders already in `target_path`.
    pub skip_export: bool,
    pub skip_rename: bool,
    pub write_json: bool,
}

#[derive(Debug, Clone)]
pub struct OrganizeResult {
    pub records: Vec<DriverRecord>,
    pub exported: Option<usize>,
    pub matched_folders: usize,
    pub skipped_folders: usize,
    pub rename_failures: usize,
    pub report: ReportPaths,
}

impl OrganizeResult {
    pub fn renamed_count(&self) -> usize {
        self.records.iter().filter(|record| record.renamed).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Init,
    Export,
    SkipExport,
    Enumerate,
    ProcessEach,
    Aggregate,
    Report,
    Done,
}

#[derive(Debug, Clone)]
pub struct FolderProgress<'a> {
    /// Zero-based position of the folder about to be processed.
    pub index: usize,
    pub total: usize,
    pub folder_name: &'a str,
}

pub trait ProgressObserver {
    fn on_folder(&mut self, progress: FolderProgress<'_>);
}

pub struct OrganizeWorkflow<'a> {
    params: OrganizeParams,
    exporter: &'a dyn DriverExporter,
    fs: &'a dyn HostFs,
}

impl<'a> OrganizeWorkflow<'a> {
    pub fn new(params: OrganizeParams, exporter: &'a dyn DriverExporter, fs: &'a dyn HostFs) -> Self {
        Self {
            params,
            exporter,
            fs,
        }
    }

    pub fn execute(&self, observer: Option<&mut dyn ProgressObserver>) -> Result<OrganizeResult> {
        run_organize(&self.params, self.exporter, self.fs, observer)
    }
}

impl Workflow for OrganizeWorkflow<'_> {
    fn name(&self) -> &'static str {
        "organize-drivers"
    }

    fn run(&self) -> Result<()> {
        self.execute(None).map(|_| ())
    }
}

enum FolderOutcome {
    Processed(DriverRecord),
    Skipped,
}

struct RunState {
    used: UsedNames,
    records: Vec<DriverRecord>,
    skipped_folders: usize,
    rename_failures: usize,
}

pub fn run_organize(
    params: &OrganizeParams,
    exporter: &dyn DriverExporter,
    fs: &dyn HostFs,
    mut observer: Option<&mut dyn ProgressObserver>,
) -> Result<OrganizeResult> {
    let target = params.target_path.as_path();

    enter(Stage::Init);
    tracing::info!("target path: {}", target.display());
    if params.skip_export {
        if !fs.exists(target) {
            return Err(anyhow!("target path does not exist: {}", target.display()));
        }
    } else {
        fs.create_dir_all(target)?;
    }

    let exported = if params.skip_export {
        enter(Stage::SkipExport);
        tracing::info!("export skipped, parsing existing folders");
        None
    } else {
        enter(Stage::Export);
        let count = exporter
            .export_drivers(target)
            .context("driver export failed")?;
        if count == 0 {
            tracing::warn!("driver export reported no packages");
        } else {
            tracing::info!("exported {} driver packages", count);
        }
        Some(count)
    };

    enter(Stage::Enumerate);
    let folders = enumerate_package_folders(fs, target)?;
    if folders.is_empty() {
        tracing::warn!("no driver package folders found in {}", target.display());
    } else {
        tracing::info!("found {} driver package folders", folders.len());
    }

    enter(Stage::ProcessEach);
    let mut state = RunState {
        used: UsedNames::new(),
        records: Vec::with_capacity(folders.len()),
        skipped_folders: 0,
        rename_failures: 0,
    };
    for (index, (name, _kind)) in folders.iter().enumerate() {
        if let Some(obs) = observer.as_deref_mut() {
            obs.on_folder(FolderProgress {
                index,
                total: folders.len(),
                folder_name: name,
            });
        }
        match process_folder(params, fs, target, name, &mut state) {
            FolderOutcome::Processed(record) => state.records.push(record),
            FolderOutcome::Skipped => state.skipped_folders += 1,
        }
    }

    enter(Stage::Aggregate);
    if state.records.is_empty() {
        tracing::warn!("no drivers were processed");
    }

    enter(Stage::Report);
    let report = write_report_bundle(
        fs,
        target,
        &state.records,
        ReportOptions {
            json: params.write_json,
        },
    )?;

    let result = OrganizeResult {
        records: state.records,
        exported,
        matched_folders: folders.len(),
        skipped_folders: state.skipped_folders,
        rename_failures: state.rename_failures,
        report,
    };
    tracing::info!(
        "processed {} drivers ({} renamed, {} skipped, {} rename failures)",
        result.records.len(),
        result.renamed_count(),
        result.skipped_folders,
        result.rename_failures
    );
    enter(Stage::Done);
    Ok(result)
}

/// Immediate subdirectories named like exported packages, sorted by name.
pub fn enumerate_package_folders(fs: &dyn HostFs, target: &Path) -> Result<Vec<(String, FolderKind)>> {
    let mut names = fs.list_dirs(target)?;
    names.sort();
    let folders = names
        .into_iter()
        .filter_map(|name| match parse_folder_name(&name) {
            Some(kind) => Some((name, kind)),
            None => {
                tracing::debug!("ignoring folder {}", name);
                None
            }
        })
        .collect();
    Ok(folders)
}

/// First `.inf` file in `folder` by name.
pub fn find_descriptor(fs: &dyn HostFs, folder: &Path) -> Result<Option<PathBuf>> {
    let mut files = fs.list_files_with_extension(folder, DESCRIPTOR_EXTENSION)?;
    files.sort();
    Ok(files.into_iter().next())
}

fn process_folder(
    params: &OrganizeParams,
    fs: &dyn HostFs,
    target: &Path,
    name: &str,
    state: &mut RunState,
) -> FolderOutcome {
    let folder = target.join(name);
    let descriptor = match find_descriptor(fs, &folder) {
        Ok(Some(path)) => path,
        Ok(None) => {
            tracing::warn!("no .inf file in {}, skipping", name);
            return FolderOutcome::Skipped;
        }
        Err(error) => {
            tracing::warn!("cannot list {}: {:#}, skipping", name, error);
            return FolderOutcome::Skipped;
        }
    };

    let mut record = match parse_descriptor_from(&descriptor, fs.read_bytes(&descriptor)) {
        ParseOutcome::Parsed(parsed) => parsed.record,
        ParseOutcome::Empty => {
            tracing::warn!("{} has an empty descriptor, skipping", name);
            return FolderOutcome::Skipped;
        }
        ParseOutcome::Failed(error) => {
            tracing::warn!("{}: {}, skipping", name, error);
            return FolderOutcome::Skipped;
        }
    };

    if params.skip_rename {
        return FolderOutcome::Processed(record);
    }

    let candidate = derive_candidate(&record);
    let new_name = resolve_unique_name(&candidate, &record.original_folder_name, &mut state.used, |n| {
        fs.exists(&target.join(n))
    });
    let destination = target.join(&new_name);
    match fs.rename(&folder, &destination) {
        Ok(()) => {
            tracing::info!("renamed {} -> {}", name, new_name);
            record.mark_renamed(new_name);
        }
        Err(error) => {
            tracing::error!("failed to rename {} to {}: {:#}", name, new_name, error);
            state.rename_failures += 1;
        }
    }
    FolderOutcome::Processed(record)
}

fn enter(stage: Stage) {
    tracing::debug!("stage={:?}", stage);
}

#[cfg(test)]
mod tests {
    use super::*;
    use driverdeck_core::LocalFs;
    use std::fs;

    struct NoExport;

    impl DriverExporter for NoExport {
        fn export_drivers(&self, _destination: &Path) -> Result<usize> {
            Err(anyhow!("export must not run in parse-only mode"))
        }
    }

    fn params(target: &Path) -> OrganizeParams {
        OrganizeParams {
            target_path: target.to_path_buf(),
            skip_export: true,
            skip_rename: false,
            write_json: false,
        }
    }

    #[test]
    fn enumerates_only_package_folders_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["oem2.inf", "Intel_Net_1.0", "nvhda.inf_amd64_9fb9ca6ebbf0a797", "oem10.inf"] {
            fs::create_dir(dir.path().join(name)).unwrap();
        }
        fs::write(dir.path().join("oem3.inf"), "a file, not a folder").unwrap();

        let folders = enumerate_package_folders(&LocalFs, dir.path()).unwrap();
        let names: Vec<&str> = folders.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["nvhda.inf_amd64_9fb9ca6ebbf0a797", "oem10.inf", "oem2.inf"]);
    }

    #[test]
    fn first_descriptor_by_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.inf"), "").unwrap();
        fs::write(dir.path().join("a.INF"), "").unwrap();
        fs::write(dir.path().join("a.cat"), "").unwrap();
        let found = find_descriptor(&LocalFs, dir.path()).unwrap();
        assert_eq!(found, Some(dir.path().join("a.INF")));
    }

    #[test]
    fn missing_target_is_fatal_in_parse_only_mode() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = run_organize(&params(&missing), &NoExport, &LocalFs, None).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn folder_without_descriptor_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("oem1.inf")).unwrap();
        let result = run_organize(&params(dir.path()), &NoExport, &LocalFs, None).unwrap();
        assert!(result.records.is_empty());
        assert_eq!(result.matched_folders, 1);
        assert_eq!(result.skipped_folders, 1);
        assert!(dir.path().join("oem1.inf").exists());
    }

    #[test]
    fn workflow_trait_runs() {
        let dir = tempfile::tempdir().unwrap();
        let workflow = OrganizeWorkflow::new(params(dir.path()), &NoExport, &LocalFs);
        assert_eq!(workflow.name(), "organize-drivers");
        run_workflow(workflow).unwrap();
        assert!(dir.path().join(driverdeck_report::REPORT_FILE_NAME).exists());
    }
}
