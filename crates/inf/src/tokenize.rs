//! Per-line pattern matching. Each function owns one line category.

/// `<key> = <value>`: key is everything before the first `=`, value has one
/// layer of surrounding double quotes removed.
pub fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, strip_quotes(value.trim())))
}

/// Value of a `<name> = ...` line. The name match is case-sensitive and must
/// be followed by optional whitespace and `=`, so `Class` does not match
/// `ClassGuid = ...`.
pub fn field_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let rest = line.trim_start().strip_prefix(name)?;
    let rest = rest.trim_start().strip_prefix('=')?;
    Some(rest.trim())
}

pub fn strip_quotes(value: &str) -> &str {
    let value = value.strip_prefix('"').unwrap_or(value);
    value.strip_suffix('"').unwrap_or(value)
}

/// Token inside a `%token%` reference, when the whole value is one.
pub fn string_reference(value: &str) -> Option<&str> {
    let token = value.strip_prefix('%')?.strip_suffix('%')?;
    if token.is_empty() || token.contains('%') {
        return None;
    }
    Some(token)
}

/// Strips quotes and braces around a GUID value.
pub fn strip_guid_wrapping(value: &str) -> &str {
    let value = strip_quotes(value.trim()).trim();
    let value = value.strip_prefix('{').unwrap_or(value);
    value.strip_suffix('}').unwrap_or(value).trim()
}

/// `DriverVer` value split into `(date, version)`.
pub fn split_driver_ver(value: &str) -> (Option<&str>, &str) {
    match value.split_once(',') {
        Some((date, version)) => (Some(date.trim()), version.trim()),
        None => (None, value.trim()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_value_lines() {
        assert_eq!(parse_key_value("ClassName = \"MEDIA\""), Some(("ClassName", "MEDIA")));
        assert_eq!(parse_key_value("  a=b=c "), Some(("a", "b=c")));
        assert_eq!(parse_key_value("Empty ="), Some(("Empty", "")));
        assert_eq!(parse_key_value(" = orphan"), None);
        assert_eq!(parse_key_value("[Strings]"), None);
        assert_eq!(parse_key_value("x = \"\"quoted\"\""), Some(("x", "\"quoted\"")));
    }

    #[test]
    fn field_lines() {
        assert_eq!(field_value("  Provider = %Mfg%", "Provider"), Some("%Mfg%"));
        assert_eq!(field_value("Class=Net", "Class"), Some("Net"));
        assert_eq!(field_value("ClassGuid = {x}", "Class"), None);
        assert_eq!(field_value("provider = x", "Provider"), None);
        assert_eq!(field_value("; Provider = x", "Provider"), None);
        assert_eq!(field_value("Provider", "Provider"), None);
    }

    #[test]
    fn quotes_strip_one_layer() {
        assert_eq!(strip_quotes("\"abc\""), "abc");
        assert_eq!(strip_quotes("\"abc"), "abc");
        assert_eq!(strip_quotes("abc"), "abc");
        assert_eq!(strip_quotes("\""), "");
    }

    #[test]
    fn references() {
        assert_eq!(string_reference("%ClassName%"), Some("ClassName"));
        assert_eq!(string_reference("%%"), None);
        assert_eq!(string_reference("%a%b%"), None);
        assert_eq!(string_reference("prefix %a%"), None);
        assert_eq!(string_reference("%a"), None);
    }

    #[test]
    fn guid_wrapping() {
        assert_eq!(
            strip_guid_wrapping(" {4d36e972-e325-11ce-bfc1-08002be10318} "),
            "4d36e972-e325-11ce-bfc1-08002be10318"
        );
        assert_eq!(strip_guid_wrapping("\"{abc}\""), "abc");
    }

    #[test]
    fn driver_ver_split() {
        assert_eq!(
            split_driver_ver("01/15/2023, 1.3.40.21"),
            (Some("01/15/2023"), "1.3.40.21")
        );
        assert_eq!(split_driver_ver("1.0"), (None, "1.0"));
        assert_eq!(split_driver_ver("a,b,c"), (Some("a"), "b,c"));
    }
}
