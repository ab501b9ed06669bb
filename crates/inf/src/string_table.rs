use crate::tokenize::{parse_key_value, string_reference};
use std::collections::HashMap;

/// Key/value pairs collected from every `key = value` line of one descriptor.
///
/// Entries keep first-insertion order; a repeated key overwrites the earlier
/// value in place. Keys are looked up ASCII-case-insensitively.
#[derive(Debug, Default, Clone)]
pub struct StringTable {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

/// Outcome of resolving one field value against the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Literal(String),
    Resolved { token: String, value: String },
    Unresolved { token: String, literal: String },
}

impl Resolution {
    pub fn value(&self) -> &str {
        match self {
            Resolution::Literal(value) => value,
            Resolution::Resolved { value, .. } => value,
            Resolution::Unresolved { literal, .. } => literal,
        }
    }

    pub fn into_value(self) -> String {
        match self {
            Resolution::Literal(value) => value,
            Resolution::Resolved { value, .. } => value,
            Resolution::Unresolved { literal, .. } => literal,
        }
    }
}

impl StringTable {
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        let mut table = Self::default();
        for line in lines {
            if let Some((key, value)) = parse_key_value(line) {
                table.insert(key, value);
            }
        }
        table
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        let folded = key.to_ascii_lowercase();
        match self.index.get(&folded) {
            Some(&slot) => self.entries[slot].1 = value.to_string(),
            None => {
                self.index.insert(folded, self.entries.len());
                self.entries.push((key.to_string(), value.to_string()));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(&key.to_ascii_lowercase())
            .map(|&slot| self.entries[slot].1.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Single-pass `%token%` substitution; the replacement is never re-resolved.
    pub fn resolve(&self, value: &str) -> Resolution {
        let Some(token) = string_reference(value) else {
            return Resolution::Literal(value.to_string());
        };
        match self.get(token) {
            Some(resolved) => Resolution::Resolved {
                token: token.to_string(),
                value: resolved.to_string(),
            },
            None => Resolution::Unresolved {
                token: token.to_string(),
                literal: value.to_string(),
            },
        }
    }
}
