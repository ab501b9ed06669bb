use anyhow::{anyhow, Context, Result};
use driverdeck_core::DriverExporter;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Exports third-party drivers of the running system with DISM.
#[derive(Debug, Clone)]
pub struct DismExporter {
    program: PathBuf,
}

impl Default for DismExporter {
    fn default() -> Self {
        Self {
            program: PathBuf::from("dism.exe"),
        }
    }
}

impl DismExporter {
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl DriverExporter for DismExporter {
    fn export_drivers(&self, destination: &Path) -> Result<usize> {
        if !cfg!(windows) {
            return Err(anyhow!("driver export requires Windows"));
        }
        fs::create_dir_all(destination)
            .with_context(|| format!("create dir {}", destination.display()))?;

        tracing::info!("exporting drivers to {}", destination.display());
        let output = Command::new(&self.program)
            .arg("/Online")
            .arg("/Export-Driver")
            .arg(format!("/Destination:{}", destination.display()))
            .output()
            .with_context(|| format!("run {}", self.program.display()))?;

        if !output.status.success() {
            let mut detail = String::from_utf8_lossy(&output.stderr).trim().to_string();
            if detail.is_empty() {
                // DISM writes its errors to stdout.
                detail = String::from_utf8_lossy(&output.stdout).trim().to_string();
            }
            return Err(anyhow!(
                "{} failed ({}): {}",
                self.program.display(),
                output.status,
                detail
            ));
        }

        let count = count_package_dirs(destination)?;
        tracing::debug!("export produced {} package folders", count);
        Ok(count)
    }
}

/// Number of immediate subdirectories, one per exported package.
pub fn count_package_dirs(destination: &Path) -> Result<usize> {
    let mut count = 0usize;
    for entry in fs::read_dir(destination).with_context(|| format!("read {}", destination.display()))? {
        if entry?.file_type()?.is_dir() {
            count += 1;
        }
    }
    Ok(count)
}
