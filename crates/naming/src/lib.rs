use driverdeck_core::{parse_folder_name, DriverRecord, UNKNOWN};
use rand::Rng;
use std::collections::HashSet;

pub const MAX_NAME_LEN: usize = 50;
pub const MAX_SUFFIX_ATTEMPTS: u32 = 9999;
pub const RESERVED_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

const ALL_UNKNOWN: &str = "Unknown_Unknown_Unknown";

/// `Provider_Class_shortId_Version` for modern export folders with a
/// meaningful short id, `Provider_Class_Version` otherwise.
pub fn derive_candidate(record: &DriverRecord) -> String {
    let short_id = parse_folder_name(&record.original_folder_name)
        .and_then(|kind| kind.short_id().map(str::to_string));
    match short_id {
        Some(short_id) => format!(
            "{}_{}_{}_{}",
            record.provider, record.device_class, short_id, record.version
        ),
        None => format!(
            "{}_{}_{}",
            record.provider, record.device_class, record.version
        ),
    }
}

pub fn sanitize_folder_name(name: &str) -> String {
    if name.trim().is_empty() {
        return UNKNOWN.to_string();
    }

    let mut out = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for ch in name.chars() {
        if ch.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        out.push(if RESERVED_CHARS.contains(&ch) { '_' } else { ch });
    }

    let mut out = out.trim_matches('_').to_string();
    if out.chars().count() > MAX_NAME_LEN {
        out = out.chars().take(MAX_NAME_LEN).collect();
        out = out.trim_end_matches('_').to_string();
    }
    if out.is_empty() {
        return UNKNOWN.to_string();
    }
    out
}

/// Names handed out during one run, compared case-insensitively.
#[derive(Debug, Default, Clone)]
pub struct UsedNames {
    names: HashSet<String>,
}

impl UsedNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&fold(name))
    }

    pub fn insert(&mut self, name: &str) -> bool {
        self.names.insert(fold(name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn fold(name: &str) -> String {
    name.to_lowercase()
}

/// Base name before uniqueness suffixes: the sanitized candidate, or
/// `Unknown_<original folder>` when nothing identifying was parsed.
pub fn base_name(candidate: &str, original_folder_name: &str) -> String {
    let sanitized = sanitize_folder_name(candidate);
    if sanitized == ALL_UNKNOWN {
        sanitize_folder_name(&format!("{}_{}", UNKNOWN, original_folder_name))
    } else {
        sanitized
    }
}

/// Picks a name unused in this run and absent from the destination
/// (`exists` answers for the destination directory), then records it.
pub fn resolve_unique_name<F>(
    candidate: &str,
    original_folder_name: &str,
    used: &mut UsedNames,
    exists: F,
) -> String
where
    F: Fn(&str) -> bool,
{
    let base = base_name(candidate, original_folder_name);
    let taken = |name: &str| used.contains(name) || exists(name);

    let mut name = base.clone();
    let mut attempt = 0u32;
    while taken(&name) {
        attempt += 1;
        if attempt > MAX_SUFFIX_ATTEMPTS {
            let suffix = rand::thread_rng().gen_range(10_000..=99_999);
            name = format!("{}_{}", base, suffix);
            tracing::warn!(
                "no free suffix for {} after {} attempts, using {}",
                base,
                MAX_SUFFIX_ATTEMPTS,
                name
            );
            break;
        }
        name = format!("{}_{}", base, attempt);
    }

    used.insert(&name);
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(provider: &str, class: &str, version: &str, folder: &str) -> DriverRecord {
        let mut record = DriverRecord::new("driver.inf", folder);
        record.provider = provider.to_string();
        record.device_class = class.to_string();
        record.version = version.to_string();
        record
    }

    #[test]
    fn modern_folder_includes_short_id() {
        let r = record("NVIDIA", "MEDIA", "1.3.40.21", "nvhda.inf_amd64_9fb9ca6ebbf0a797");
        assert_eq!(derive_candidate(&r), "NVIDIA_MEDIA_nvhda_1.3.40.21");
    }

    #[test]
    fn legacy_folder_omits_short_id() {
        let r = record(
            "Realtek Semiconductor Corp.",
            "Net",
            "10.42.526.2020",
            "oem7.inf",
        );
        let candidate = derive_candidate(&r);
        assert_eq!(candidate, "Realtek Semiconductor Corp._Net_10.42.526.2020");
        assert_eq!(
            sanitize_folder_name(&candidate),
            "Realtek_Semiconductor_Corp._Net_10.42.526.2020"
        );
    }

    #[test]
    fn generic_oem_short_id_falls_back() {
        let r = record("Intel", "Net", "1.0", "oem.inf_x86_0123456789abcdef");
        assert_eq!(derive_candidate(&r), "Intel_Net_1.0");
    }

    #[test]
    fn unknown_fields_keep_their_slot() {
        let r = record(UNKNOWN, "Net", UNKNOWN, "e1d.inf_amd64_0123456789abcdef");
        assert_eq!(derive_candidate(&r), "Unknown_Net_e1d_Unknown");
    }

    #[test]
    fn sanitize_replaces_reserved_and_whitespace() {
        assert_eq!(sanitize_folder_name("a<b>c:d\"e/f\\g|h?i*j"), "a_b_c_d_e_f_g_h_i_j");
        assert_eq!(sanitize_folder_name("  Acme   Corp\t Ltd "), "Acme_Corp_Ltd");
        assert_eq!(sanitize_folder_name("__x__"), "x");
        assert_eq!(sanitize_folder_name(""), UNKNOWN);
        assert_eq!(sanitize_folder_name(" \t "), UNKNOWN);
        assert_eq!(sanitize_folder_name("***"), UNKNOWN);
    }

    #[test]
    fn sanitize_truncates_and_trims() {
        let long = "A".repeat(49) + " B" + &"C".repeat(20);
        let out = sanitize_folder_name(&long);
        assert_eq!(out, "A".repeat(49));

        let out = sanitize_folder_name(&"x".repeat(80));
        assert_eq!(out.chars().count(), MAX_NAME_LEN);
    }

    #[test]
    fn sanitized_names_respect_limits() {
        let inputs = [
            "Realtek Semiconductor Corp._Net_10.42.526.2020_with_a_long_tail",
            "Contoso: \"Imaging\" | Scanners? * <v2> / \\ beta",
            "ÄÖÜ unicode провайдер ドライバー long long long long long long",
        ];
        for input in inputs {
            let out = sanitize_folder_name(input);
            assert!(out.chars().count() <= MAX_NAME_LEN, "{}", out);
            assert!(!out.contains(&RESERVED_CHARS[..]), "{}", out);
        }
    }

    #[test]
    fn all_unknown_uses_original_folder() {
        let mut used = UsedNames::new();
        let a = resolve_unique_name("Unknown_Unknown_Unknown", "A", &mut used, |_| false);
        let b = resolve_unique_name("Unknown_Unknown_Unknown", "B", &mut used, |_| false);
        assert_eq!(a, "Unknown_A");
        assert_eq!(b, "Unknown_B");
    }

    #[test]
    fn duplicate_candidates_get_suffixes() {
        let mut used = UsedNames::new();
        let first = resolve_unique_name("Intel_Net_1.0", "oem1.inf", &mut used, |_| false);
        let second = resolve_unique_name("Intel_Net_1.0", "oem2.inf", &mut used, |_| false);
        let third = resolve_unique_name("intel_net_1.0", "oem3.inf", &mut used, |_| false);
        assert_eq!(first, "Intel_Net_1.0");
        assert_eq!(second, "Intel_Net_1.0_1");
        assert_eq!(third, "intel_net_1.0_2");
        assert_eq!(used.len(), 3);
    }

    #[test]
    fn existing_entries_are_skipped() {
        let mut used = UsedNames::new();
        let on_disk = ["Intel_Net_1.0", "Intel_Net_1.0_1"];
        let name = resolve_unique_name("Intel_Net_1.0", "oem1.inf", &mut used, |name| {
            on_disk.contains(&name)
        });
        assert_eq!(name, "Intel_Net_1.0_2");
        assert!(used.contains("INTEL_NET_1.0_2"));
    }

    #[test]
    fn exhausted_suffixes_fall_back_to_random() {
        let mut used = UsedNames::new();
        let name = resolve_unique_name("Busy", "oem1.inf", &mut used, |name| {
            name == "Busy" || name.rsplit_once('_').map_or(false, |(_, n)| n.len() <= 4)
        });
        let (base, suffix) = name.rsplit_once('_').unwrap();
        assert_eq!(base, "Busy");
        assert_eq!(suffix.len(), 5);
        assert!(suffix.parse::<u32>().is_ok());
        assert!(used.contains(&name));
    }

    #[test]
    fn never_returns_duplicates() {
        let mut used = UsedNames::new();
        let mut seen = HashSet::new();
        for i in 0..200 {
            let candidate = if i % 2 == 0 { "Same_Name_1.0" } else { "SAME_name_1.0" };
            let name = resolve_unique_name(candidate, "oem.inf", &mut used, |_| false);
            assert!(seen.insert(name.to_lowercase()), "duplicate {}", name);
        }
    }
}
