use anyhow::{anyhow, Result};
use clap::Parser;
use driverdeck_core::LocalFs;
use driverdeck_host_windows::{elevation_status, DismExporter};
use driverdeck_safety::{can_export_drivers, SafetyContext, SafetyDecision};
use driverdeck_workflow_engine::{
    FolderProgress, OrganizeParams, OrganizeResult, OrganizeWorkflow, ProgressObserver,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "driverdeck")]
#[command(about = "Export driver packages and rename their folders by provider, class and version", long_about = None)]
struct Cli {
    /// Directory that receives (or already holds) the exported driver packages
    #[arg(short, long, env = "DRIVERDECK_TARGET_PATH")]
    target_path: PathBuf,

    /// Parse folders already in the target instead of exporting
    #[arg(long)]
    skip_export: bool,

    /// Only parse and report; leave folder names untouched
    #[arg(long)]
    skip_rename: bool,

    /// Also write driver_mapping.json next to the text report
    #[arg(long, env = "DRIVERDECK_JSON")]
    json: bool,

    /// Hide the progress bar
    #[arg(long)]
    no_progress: bool,

    /// Debug-level logging (RUST_LOG overrides)
    #[arg(short, long)]
    verbose: bool,
}

struct BarObserver {
    bar: Option<ProgressBar>,
}

impl BarObserver {
    fn new() -> Self {
        Self { bar: None }
    }

    fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_with_message("done");
        }
    }
}

impl ProgressObserver for BarObserver {
    fn on_folder(&mut self, progress: FolderProgress<'_>) {
        let bar = self.bar.get_or_insert_with(|| {
            let bar = ProgressBar::new(progress.total as u64);
            let style = ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-");
            bar.set_style(style);
            bar
        });
        bar.set_message(progress.folder_name.to_string());
        bar.set_position(progress.index as u64 + 1);
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(result) => {
            print_summary(&result);
            ExitCode::SUCCESS
        }
        Err(error) => {
            tracing::error!("{:#}", error);
            ExitCode::from(1)
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn run(cli: &Cli) -> Result<OrganizeResult> {
    let ctx = SafetyContext {
        export_requested: !cli.skip_export,
        elevation: elevation_status(),
    };
    match can_export_drivers(&ctx) {
        SafetyDecision::Allow => {}
        SafetyDecision::Deny(reason) => return Err(anyhow!(reason)),
    }

    let params = OrganizeParams {
        target_path: cli.target_path.clone(),
        skip_export: cli.skip_export,
        skip_rename: cli.skip_rename,
        write_json: cli.json,
    };
    let exporter = DismExporter::default();
    let workflow = OrganizeWorkflow::new(params, &exporter, &LocalFs);

    if cli.no_progress {
        return workflow.execute(None);
    }
    let mut bar = BarObserver::new();
    let observer: &mut dyn ProgressObserver = &mut bar;
    let result = workflow.execute(Some(observer));
    bar.finish();
    result
}

fn print_summary(result: &OrganizeResult) {
    if let Some(exported) = result.exported {
        println!("exported: {}", exported);
    }
    println!("package_folders: {}", result.matched_folders);
    println!("processed: {}", result.records.len());
    println!("renamed: {}", result.renamed_count());
    println!("skipped: {}", result.skipped_folders);
    println!("rename_failures: {}", result.rename_failures);
    println!("report: {}", result.report.report_txt.display());
    if let Some(json) = &result.report.mapping_json {
        println!("mapping_json: {}", json.display());
    }
}
