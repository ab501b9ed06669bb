use anyhow::Result;
use driverdeck_core::{now_utc_rfc3339, DriverRecord, HostFs};
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const REPORT_FILE_NAME: &str = "Driver_Mapping_Report.txt";
pub const JSON_FILE_NAME: &str = "driver_mapping.json";

const RULE_WIDTH: usize = 80;

#[derive(Debug, Clone, Serialize)]
pub struct ReportPaths {
    pub run_id: String,
    pub report_txt: PathBuf,
    pub mapping_json: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct MappingDocument<'a> {
    run_id: &'a str,
    generated_at_utc: &'a str,
    target_path: String,
    total_drivers: usize,
    renamed_count: usize,
    records: Vec<&'a DriverRecord>,
}

/// Records ordered by provider then class, case-insensitively; ties keep input order.
pub fn sort_records(records: &[DriverRecord]) -> Vec<&DriverRecord> {
    let mut sorted: Vec<&DriverRecord> = records.iter().collect();
    sorted.sort_by_cached_key(|record| {
        (
            record.provider.to_lowercase(),
            record.device_class.to_lowercase(),
        )
    });
    sorted
}

/// Count per distinct value (case-insensitive, first spelling seen), largest
/// first; equal counts keep the order in which the values were first seen.
pub fn group_counts<F>(records: &[DriverRecord], key: F) -> Vec<(String, usize)>
where
    F: Fn(&DriverRecord) -> &str,
{
    let mut groups: Vec<(String, usize)> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    for record in records {
        let value = key(record);
        match index.get(&value.to_lowercase()) {
            Some(&slot) => groups[slot].1 += 1,
            None => {
                index.insert(value.to_lowercase(), groups.len());
                groups.push((value.to_string(), 1));
            }
        }
    }
    groups.sort_by(|a, b| b.1.cmp(&a.1));
    groups
}

pub fn render_mapping_report(records: &[DriverRecord], target: &Path, generated_at: &str) -> String {
    let heavy = "=".repeat(RULE_WIDTH);
    let light = "-".repeat(RULE_WIDTH);
    let renamed = records.iter().filter(|record| record.renamed).count();

    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(out, "{}", heavy);
    let _ = writeln!(out, "DRIVER EXPORT MAPPING REPORT");
    let _ = writeln!(out, "{}", heavy);
    let _ = writeln!(out, "Generated: {}", generated_at);
    let _ = writeln!(out, "Target Path: {}", target.display());
    let _ = writeln!(out, "Total Drivers Processed: {}", records.len());
    let _ = writeln!(out, "Folders Renamed: {}", renamed);
    let _ = writeln!(out, "{}", heavy);
    let _ = writeln!(out);

    for record in sort_records(records) {
        let _ = writeln!(out, "Original Folder: {}", record.original_folder_name);
        if record.renamed {
            let _ = writeln!(out, "New Folder Name: {}", record.new_folder_name);
        }
        let _ = writeln!(out, "INF File: {}", record.descriptor_file_name);
        let _ = writeln!(out, "Provider: {}", record.provider);
        let _ = writeln!(out, "Class: {}", record.device_class);
        let _ = writeln!(out, "Version: {}", record.version);
        let _ = writeln!(out, "Date: {}", record.date);
        let _ = writeln!(out, "Class GUID: {}", record.class_guid);
        let _ = writeln!(out, "{}", light);
        let _ = writeln!(out);
    }

    write_summary(&mut out, "SUMMARY BY PROVIDER", &group_counts(records, |r| r.provider.as_str()), &light);
    let _ = writeln!(out);
    write_summary(&mut out, "SUMMARY BY CLASS", &group_counts(records, |r| r.device_class.as_str()), &light);
    out
}

fn write_summary(out: &mut String, title: &str, counts: &[(String, usize)], rule: &str) {
    let _ = writeln!(out, "{}", title);
    let _ = writeln!(out, "{}", rule);
    for (value, count) in counts {
        let _ = writeln!(out, "{}: {}", value, count);
    }
}

/// Writes the text report (and the JSON mapping when asked) into `target`,
/// replacing files from earlier runs.
pub fn write_report_bundle(
    fs: &dyn HostFs,
    target: impl AsRef<Path>,
    records: &[DriverRecord],
    options: ReportOptions,
) -> Result<ReportPaths> {
    write_report_bundle_at(fs, target, records, options, &now_utc_rfc3339())
}

pub fn write_report_bundle_at(
    fs: &dyn HostFs,
    target: impl AsRef<Path>,
    records: &[DriverRecord],
    options: ReportOptions,
    generated_at: &str,
) -> Result<ReportPaths> {
    let target = target.as_ref();
    let run_id = Uuid::new_v4().to_string();

    let report_txt = target.join(REPORT_FILE_NAME);
    let text = render_mapping_report(records, target, generated_at);
    fs.write_text(&report_txt, &text)?;
    tracing::info!("report written to {}", report_txt.display());

    let mapping_json = if options.json {
        let path = target.join(JSON_FILE_NAME);
        let document = MappingDocument {
            run_id: &run_id,
            generated_at_utc: generated_at,
            target_path: target.display().to_string(),
            total_drivers: records.len(),
            renamed_count: records.iter().filter(|record| record.renamed).count(),
            records: sort_records(records),
        };
        let json = serde_json::to_string_pretty(&document)?;
        fs.write_text(&path, &json)?;
        tracing::info!("mapping written to {}", path.display());
        Some(path)
    } else {
        None
    };

    Ok(ReportPaths {
        run_id,
        report_txt,
        mapping_json,
    })
}
