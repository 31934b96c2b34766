use crate::error::{PhpError, E_ALL};
use std::collections::HashMap;

/// Where a directive may be changed from.
pub const INI_USER: i64 = 1;
pub const INI_PERDIR: i64 = 2;
pub const INI_SYSTEM: i64 = 4;
pub const INI_ALL: i64 = 7;

const DIRECTIVES: &[(&str, i64)] = &[
    ("arg_separator.input", INI_SYSTEM),
    ("arg_separator.output", INI_ALL),
    ("default_charset", INI_ALL),
    ("error_reporting", INI_ALL),
    ("input_encoding", INI_ALL),
    ("internal_encoding", INI_ALL),
    ("max_input_nesting_level", INI_PERDIR),
    ("post_max_size", INI_PERDIR),
    ("short_open_tag", INI_PERDIR),
    ("variables_order", INI_PERDIR),
];

const BOOL_DIRECTIVES: &[&str] = &["short_open_tag"];
const INT_DIRECTIVES: &[&str] = &["error_reporting", "max_input_nesting_level"];

#[derive(Debug, Clone)]
pub struct Ini {
    directives: HashMap<String, String>,
}

impl Ini {
    /// Hardened defaults: diagnostics off.
    pub fn new() -> Self {
        let mut directives = HashMap::new();
        directives.insert("arg_separator.input".into(), "&".into());
        directives.insert("arg_separator.output".into(), "&".into());
        directives.insert("default_charset".into(), "UTF-8".into());
        directives.insert("error_reporting".into(), "0".into());
        directives.insert("input_encoding".into(), "".into());
        directives.insert("internal_encoding".into(), "".into());
        directives.insert("max_input_nesting_level".into(), "64".into());
        directives.insert("post_max_size".into(), "8M".into());
        directives.insert("short_open_tag".into(), "".into());
        directives.insert("variables_order".into(), "EGPCS".into());
        Self { directives }
    }

    /// Development profile: everything reported.
    pub fn dev() -> Self {
        let mut ini = Self::new();
        ini.set("error_reporting", &E_ALL.to_string(), INI_ALL)
            .expect("error_reporting is always settable");
        ini
    }

    /// `dev()` plus `key=value` overrides, e.g. from `-d` CLI flags.
    pub fn dev_with_overrides(overrides: &[(String, String)]) -> Result<Self, PhpError> {
        let mut ini = Self::dev();
        for (key, value) in overrides {
            ini.set(key, value, INI_ALL)?;
        }
        Ok(ini)
    }

    pub fn set(&mut self, directive: &str, value: &str, source: i64) -> Result<(), PhpError> {
        let Some((_, changeable)) = DIRECTIVES.iter().find(|(name, _)| *name == directive)
        else {
            return Err(PhpError::fatal(format!(
                "Directive {} not found",
                directive
            )));
        };

        if changeable & source == 0 {
            return Err(PhpError::fatal(format!(
                "Not allowed to change {}",
                directive
            )));
        }

        if BOOL_DIRECTIVES.contains(&directive) {
            let on = value == "1" || value.eq_ignore_ascii_case("on");
            self.directives
                .insert(directive.to_string(), if on { "1" } else { "" }.to_string());
            return Ok(());
        }

        if INT_DIRECTIVES.contains(&directive) {
            if value.parse::<i64>().is_err() {
                // Silently ignored, matching a lenient php.ini reader.
                return Ok(());
            }
            self.directives
                .insert(directive.to_string(), value.to_string());
            return Ok(());
        }

        self.directives
            .insert(directive.to_string(), value.to_string());
        Ok(())
    }

    pub fn get(&self, directive: &str) -> Option<&str> {
        if !DIRECTIVES.iter().any(|(name, _)| *name == directive) {
            return None;
        }
        self.directives.get(directive).map(|s| s.as_str())
    }

    pub fn get_bool(&self, directive: &str) -> bool {
        self.get(directive) == Some("1")
    }

    pub fn get_int(&self, directive: &str) -> i64 {
        self.get(directive)
            .and_then(|v| v.parse().ok())
            .unwrap_or(-1)
    }

    pub fn get_str(&self, directive: &str) -> String {
        self.get(directive).unwrap_or("").to_string()
    }

    /// `post_max_size`-style values: an int with an optional K/M/G suffix.
    pub fn get_size(&self, directive: &str) -> i64 {
        let value = self.get_str(directive);
        if value.is_empty() {
            return 0;
        }
        let (digits, factor) = match value.as_bytes()[value.len() - 1] {
            b'K' | b'k' => (&value[..value.len() - 1], 1 << 10),
            b'M' | b'm' => (&value[..value.len() - 1], 1 << 20),
            b'G' | b'g' => (&value[..value.len() - 1], 1 << 30),
            _ => (value.as_str(), 1),
        };
        digits.parse::<i64>().map(|n| n * factor).unwrap_or(0)
    }
}

impl Default for Ini {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::E_ALL;

    #[test]
    fn default_reporting_is_off() {
        assert_eq!(Ini::new().get_int("error_reporting"), 0);
        assert_eq!(Ini::dev().get_int("error_reporting"), E_ALL);
    }

    #[test]
    fn scope_is_enforced() {
        let mut ini = Ini::new();
        // arg_separator.input is SYSTEM-only.
        assert!(ini.set("arg_separator.input", ";", INI_USER).is_err());
        assert!(ini.set("arg_separator.input", ";", INI_SYSTEM).is_ok());
        assert_eq!(ini.get_str("arg_separator.input"), ";");
    }

    #[test]
    fn unknown_directive_is_an_error() {
        let mut ini = Ini::new();
        assert!(ini.set("no_such_directive", "1", INI_ALL).is_err());
        assert_eq!(ini.get("no_such_directive"), None);
    }

    #[test]
    fn bool_directives_normalize() {
        let mut ini = Ini::new();
        ini.set("short_open_tag", "On", INI_PERDIR).unwrap();
        assert!(ini.get_bool("short_open_tag"));
        ini.set("short_open_tag", "off", INI_PERDIR).unwrap();
        assert!(!ini.get_bool("short_open_tag"));
    }

    #[test]
    fn size_suffixes() {
        let mut ini = Ini::new();
        ini.set("post_max_size", "2M", INI_PERDIR).unwrap();
        assert_eq!(ini.get_size("post_max_size"), 2 << 20);
        ini.set("post_max_size", "512", INI_PERDIR).unwrap();
        assert_eq!(ini.get_size("post_max_size"), 512);
    }
}
