use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;

pub mod folder;
pub mod host;

pub use folder::{parse_folder_name, Arch, FolderKind};
pub use host::{DriverExporter, HostFs, LocalFs};

/// Placeholder for any descriptor field that was absent or unusable.
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DriverRecord {
    pub provider: String,
    pub version: String,
    pub date: String,
    pub device_class: String,
    pub class_guid: String,     // "Unknown" or 8-4-4-4-12 hex
    pub descriptor_file_name: String,
    pub original_folder_name: String,
    pub new_folder_name: String,
    pub renamed: bool,
}

impl DriverRecord {
    pub fn new(descriptor_file_name: impl Into<String>, folder_name: impl Into<String>) -> Self {
        let folder_name = folder_name.into();
        Self {
            provider: UNKNOWN.to_string(),
            version: UNKNOWN.to_string(),
            date: UNKNOWN.to_string(),
            device_class: UNKNOWN.to_string(),
            class_guid: UNKNOWN.to_string(),
            descriptor_file_name: descriptor_file_name.into(),
            new_folder_name: folder_name.clone(),
            original_folder_name: folder_name,
            renamed: false,
        }
    }

    pub fn mark_renamed(&mut self, new_folder_name: impl Into<String>) {
        self.new_folder_name = new_folder_name.into();
        self.renamed = true;
    }
}

/// Checks the 8-4-4-4-12 hex layout without braces.
pub fn is_canonical_guid(value: &str) -> bool {
    const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];
    let parts: Vec<&str> = value.split('-').collect();
    parts.len() == GROUPS.len()
        && parts
            .iter()
            .zip(GROUPS)
            .all(|(part, len)| part.len() == len && part.bytes().all(|b| b.is_ascii_hexdigit()))
}

pub fn now_utc_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}
