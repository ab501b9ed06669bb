//! Package folder naming conventions produced by driver export.
//!
//! Modern exports name each folder `<shortId>.inf_<arch>_<16 hex digest>`;
//! older exports use `oem<N>.inf`. Matching is ASCII-case-insensitive.

const DIGEST_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arch {
    Amd64,
    X86,
    Arm64,
    Neutral,
}

impl Arch {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "amd64" => Some(Arch::Amd64),
            "x86" => Some(Arch::X86),
            "arm64" => Some(Arch::Arm64),
            "neutral" => Some(Arch::Neutral),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::Amd64 => "amd64",
            Arch::X86 => "x86",
            Arch::Arm64 => "arm64",
            Arch::Neutral => "neutral",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FolderKind {
    Modern {
        short_id: String,
        arch: Arch,
        digest: String,
    },
    LegacyOem {
        number: u32,
    },
}

impl FolderKind {
    /// Short identifier usable in a derived name; the generic `oem` id is not.
    pub fn short_id(&self) -> Option<&str> {
        match self {
            FolderKind::Modern { short_id, .. } if !short_id.eq_ignore_ascii_case("oem") => {
                Some(short_id)
            }
            _ => None,
        }
    }
}

pub fn parse_folder_name(name: &str) -> Option<FolderKind> {
    parse_modern(name).or_else(|| parse_legacy(name))
}

fn parse_modern(name: &str) -> Option<FolderKind> {
    let (rest, digest) = name.rsplit_once('_')?;
    if digest.len() != DIGEST_LEN || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let (stem, arch) = rest.rsplit_once('_')?;
    let arch = Arch::parse(arch)?;
    let short_id = strip_suffix_ignore_case(stem, ".inf")?;
    if short_id.is_empty() {
        return None;
    }
    Some(FolderKind::Modern {
        short_id: short_id.to_string(),
        arch,
        digest: digest.to_string(),
    })
}

fn parse_legacy(name: &str) -> Option<FolderKind> {
    let stem = strip_suffix_ignore_case(name, ".inf")?;
    let prefix = stem.get(..3)?;
    if !prefix.eq_ignore_ascii_case("oem") {
        return None;
    }
    let digits = &stem[3..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Absurdly long digit runs still match; the number saturates.
    let number = digits.parse().unwrap_or(u32::MAX);
    Some(FolderKind::LegacyOem { number })
}

fn strip_suffix_ignore_case<'a>(value: &'a str, suffix: &str) -> Option<&'a str> {
    let split = value.len().checked_sub(suffix.len())?;
    let tail = value.get(split..)?;
    if tail.eq_ignore_ascii_case(suffix) {
        Some(&value[..split])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modern_names() {
        let kind = parse_folder_name("nvhda.inf_amd64_9fb9ca6ebbf0a797").unwrap();
        assert_eq!(
            kind,
            FolderKind::Modern {
                short_id: "nvhda".to_string(),
                arch: Arch::Amd64,
                digest: "9fb9ca6ebbf0a797".to_string(),
            }
        );
        assert_eq!(kind.short_id(), Some("nvhda"));

        assert!(parse_folder_name("usbxhci.INF_ARM64_0123456789ABCDEF").is_some());
        assert!(parse_folder_name("my_driver.inf_neutral_0123456789abcdef").is_some());
        assert!(parse_folder_name("x.inf_x86_0123456789abcdef").is_some());
    }

    #[test]
    fn modern_rejects_bad_parts() {
        assert!(parse_folder_name("nvhda.inf_amd64_9fb9ca6ebbf0a79").is_none());
        assert!(parse_folder_name("nvhda.inf_amd64_9fb9ca6ebbf0a79z").is_none());
        assert!(parse_folder_name("nvhda.inf_ia64_9fb9ca6ebbf0a797").is_none());
        assert!(parse_folder_name("nvhda.sys_amd64_9fb9ca6ebbf0a797").is_none());
        assert!(parse_folder_name(".inf_amd64_9fb9ca6ebbf0a797").is_none());
        assert!(parse_folder_name("NVIDIA_MEDIA_nvhda_1.3.40.21").is_none());
    }

    #[test]
    fn generic_oem_short_id_is_not_used() {
        let kind = parse_folder_name("oem.inf_amd64_9fb9ca6ebbf0a797").unwrap();
        assert_eq!(kind.short_id(), None);
    }

    #[test]
    fn legacy_names() {
        assert_eq!(
            parse_folder_name("oem7.inf"),
            Some(FolderKind::LegacyOem { number: 7 })
        );
        assert_eq!(
            parse_folder_name("OEM123.INF"),
            Some(FolderKind::LegacyOem { number: 123 })
        );
        assert_eq!(parse_folder_name("oem7.inf").unwrap().short_id(), None);
        assert!(parse_folder_name("oem.inf").is_none());
        assert!(parse_folder_name("oem7a.inf").is_none());
        assert!(parse_folder_name("oem7.inf.bak").is_none());
        assert!(parse_folder_name("foo7.inf").is_none());
    }
}
