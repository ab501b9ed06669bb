//! Reader for driver-package descriptor (INF) files.
//!
//! Only the identity of a package is extracted: `Provider`, `DriverVer`,
//! `Class` and `ClassGuid`. Values of the form `%token%` are looked up in a
//! string table built from every `key = value` line of the same file.
//!
//! Malformed fields degrade to [`UNKNOWN`] and produce a [`ParseWarning`];
//! only a missing, unreadable, or empty file yields no record.

use driverdeck_core::{is_canonical_guid, DriverRecord, UNKNOWN};
use std::path::{Path, PathBuf};

mod encoding;
mod string_table;
mod tokenize;

pub use encoding::{decode_text, detect_encoding, split_lines, TextEncoding};
pub use string_table::{Resolution, StringTable};
pub use tokenize::{
    field_value, parse_key_value, split_driver_ver, string_reference, strip_guid_wrapping,
    strip_quotes,
};

pub const FIELD_PROVIDER: &str = "Provider";
pub const FIELD_DRIVER_VER: &str = "DriverVer";
pub const FIELD_CLASS: &str = "Class";
pub const FIELD_CLASS_GUID: &str = "ClassGuid";

#[derive(thiserror::Error, Debug)]
pub enum DescriptorError {
    #[error("descriptor not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    #[error("{field}: string reference %{token}% not found in string table")]
    UnresolvedToken { field: &'static str, token: String },

    #[error("ClassGuid: '{0}' is not a valid GUID")]
    InvalidClassGuid(String),
}

#[derive(Debug, Clone)]
pub struct ParsedDescriptor {
    pub record: DriverRecord,
    pub warnings: Vec<ParseWarning>,
}

#[derive(Debug)]
pub enum ParseOutcome {
    Parsed(ParsedDescriptor),
    /// The file decoded to zero lines.
    Empty,
    Failed(DescriptorError),
}

impl ParseOutcome {
    pub fn record(&self) -> Option<&DriverRecord> {
        match self {
            ParseOutcome::Parsed(parsed) => Some(&parsed.record),
            _ => None,
        }
    }

    pub fn into_record(self) -> Option<DriverRecord> {
        match self {
            ParseOutcome::Parsed(parsed) => Some(parsed.record),
            _ => None,
        }
    }
}

/// Reads and parses the descriptor at `path`. The record's folder name is the
/// file's parent directory name.
pub fn parse_descriptor(path: impl AsRef<Path>) -> ParseOutcome {
    let path = path.as_ref();
    parse_descriptor_from(path, std::fs::read(path))
}

/// Parses bytes already read (or a failed read) for the descriptor at `path`.
pub fn parse_descriptor_from(path: &Path, read: std::io::Result<Vec<u8>>) -> ParseOutcome {
    let bytes = match read {
        Ok(bytes) => bytes,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!("descriptor not found: {}", path.display());
            return ParseOutcome::Failed(DescriptorError::NotFound(path.to_path_buf()));
        }
        Err(source) => {
            tracing::warn!("failed to read {}: {}", path.display(), source);
            return ParseOutcome::Failed(DescriptorError::Read {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    let (file_name, folder_name) = descriptor_names(path);
    parse_descriptor_bytes(&bytes, &file_name, &folder_name)
}

/// Base name of the descriptor and name of the folder holding it.
pub fn descriptor_names(path: &Path) -> (String, String) {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    let folder_name = path
        .parent()
        .and_then(|parent| parent.file_name())
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();
    (file_name, folder_name)
}

pub fn parse_descriptor_bytes(bytes: &[u8], file_name: &str, folder_name: &str) -> ParseOutcome {
    let text = decode_text(bytes);
    let lines = split_lines(&text);
    if lines.is_empty() {
        tracing::warn!("descriptor {} in {} is empty", file_name, folder_name);
        return ParseOutcome::Empty;
    }

    let table = StringTable::from_lines(lines.iter().copied());
    let mut record = DriverRecord::new(file_name, folder_name);
    let mut warnings = Vec::new();

    if let Some(value) = first_field(&lines, FIELD_PROVIDER) {
        if let Some(provider) = resolve_field(&table, FIELD_PROVIDER, value, &mut warnings) {
            record.provider = provider;
        }
    }

    if let Some(value) = first_field(&lines, FIELD_DRIVER_VER) {
        let (date, version) = split_driver_ver(value);
        if let Some(date) = date.filter(|date| !date.is_empty()) {
            record.date = date.to_string();
        }
        if !version.is_empty() {
            record.version = version.to_string();
        }
    }

    if let Some(value) = first_field(&lines, FIELD_CLASS) {
        if let Some(class) = resolve_field(&table, FIELD_CLASS, value, &mut warnings) {
            record.device_class = class;
        }
    }

    if let Some(value) = first_field(&lines, FIELD_CLASS_GUID) {
        let guid = strip_guid_wrapping(value);
        if is_canonical_guid(guid) {
            record.class_guid = guid.to_string();
        } else {
            warnings.push(ParseWarning::InvalidClassGuid(value.to_string()));
        }
    }

    for warning in &warnings {
        tracing::warn!("{} ({}): {}", file_name, folder_name, warning);
    }
    tracing::debug!(
        "parsed {}: provider={} class={} version={} date={} guid={} strings={}",
        file_name,
        record.provider,
        record.device_class,
        record.version,
        record.date,
        record.class_guid,
        table.len()
    );

    ParseOutcome::Parsed(ParsedDescriptor { record, warnings })
}

fn first_field<'a>(lines: &[&'a str], name: &str) -> Option<&'a str> {
    lines.iter().find_map(|line| field_value(line, name))
}

fn resolve_field(
    table: &StringTable,
    field: &'static str,
    raw: &str,
    warnings: &mut Vec<ParseWarning>,
) -> Option<String> {
    let resolution = table.resolve(strip_quotes(raw).trim());
    if let Resolution::Unresolved { token, .. } = &resolution {
        warnings.push(ParseWarning::UnresolvedToken {
            field,
            token: token.clone(),
        });
    }
    let value = resolution.into_value().trim().to_string();
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
