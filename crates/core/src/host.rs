use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// System-level driver export into `destination`, returning how many packages landed there.
pub trait DriverExporter {
    fn export_drivers(&self, destination: &Path) -> Result<usize>;
}

/// Filesystem operations the organizer needs from its host.
pub trait HostFs {
    /// Names of the immediate subdirectories of `root`.
    fn list_dirs(&self, root: &Path) -> Result<Vec<String>>;
    /// Files directly inside `dir` whose extension matches `extension` (no dot, any case).
    fn list_files_with_extension(&self, dir: &Path, extension: &str) -> Result<Vec<PathBuf>>;
    fn read_bytes(&self, path: &Path) -> std::io::Result<Vec<u8>>;
    fn exists(&self, path: &Path) -> bool;
    fn create_dir_all(&self, path: &Path) -> Result<()>;
    /// Rename in place; fails when `to` already exists.
    fn rename(&self, from: &Path, to: &Path) -> Result<()>;
    fn write_text(&self, path: &Path, text: &str) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl HostFs for LocalFs {
    fn list_dirs(&self, root: &Path) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(root).with_context(|| format!("read {}", root.display()))? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                names.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        Ok(names)
    }

    fn list_files_with_extension(&self, dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir).with_context(|| format!("read {}", dir.display()))? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case(extension))
                .unwrap_or(false);
            if matches {
                files.push(path);
            }
        }
        Ok(files)
    }

    fn read_bytes(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path).with_context(|| format!("create dir {}", path.display()))
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<()> {
        // std::fs::rename replaces an empty directory on unix, so check first.
        if to.exists() {
            return Err(anyhow!("rename target already exists: {}", to.display()));
        }
        fs::rename(from, to)
            .with_context(|| format!("rename {} to {}", from.display(), to.display()))
    }

    fn write_text(&self, path: &Path, text: &str) -> Result<()> {
        fs::write(path, text).with_context(|| format!("write {}", path.display()))
    }
}
