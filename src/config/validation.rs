//! Config validation: unknown-key detection with "did you mean?" suggestions.
//!
//! The raw TOML is first walked as a `toml::Value` and every dotted key path
//! compared against the known field names. Unknown keys only warn; a typo
//! never stops the service from starting with defaults for that field.

use std::collections::HashSet;

/// Tables whose children are user-defined (not checked).
const FREE_FORM_TABLES: &[&str] = &["sentiment.lexicon_overrides"];

/// A non-fatal config warning.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

/// Every valid dotted key path of `AppConfig`.
///
/// Must be kept in step with the structs in `app_config.rs`.
pub fn known_config_keys() -> HashSet<&'static str> {
    [
        "server",
        "server.addr",
        "server.max_body_bytes",
        "storage",
        "storage.data_dir",
        "storage.list_limit",
        "analytics",
        "analytics.trend_days",
        "analytics.recent_comments_limit",
        "analytics.positive_threshold",
        "analytics.utc_offset_minutes",
        "sentiment",
        "sentiment.positive_above",
        "sentiment.negative_below",
        "sentiment.lexicon_overrides",
        "ingest",
        "ingest.max_comment_chars",
        "auth",
        "auth.admin_username",
        "auth.admin_password",
        "auth.session_ttl_minutes",
    ]
    .into_iter()
    .collect()
}

/// Collect dotted key paths of every table and value in `value`.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() && !FREE_FORM_TABLES.contains(&path.as_str()) {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// Closest known key within an edit distance of 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    known
        .iter()
        .map(|&k| (k, levenshtein(unknown, k)))
        .filter(|&(_, dist)| dist <= 3)
        .min_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)))
        .map(|(k, _)| k.to_string())
}

/// Warnings for every unknown key in `raw_toml`.
///
/// Parse errors are left to serde, which reports them with line numbers.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let Ok(value) = raw_toml.parse::<toml::Value>() else {
        return Vec::new();
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| ValidationWarning {
            suggestion: suggest_correction(&key, &known),
            message: format!("Unknown config key '{key}'"),
            field: key,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein() {
        assert_eq!(levenshtein("hello", "hello"), 0);
        assert_eq!(levenshtein("trend_dayz", "trend_days"), 1);
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [analytics]
            trend_days = 7
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"analytics".to_string()));
        assert!(keys.contains(&"analytics.trend_days".to_string()));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let warnings = validate_unknown_keys("[analytics]\ntrend_dayz = 7\n");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field, "analytics.trend_dayz");
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("analytics.trend_days")
        );
    }

    #[test]
    fn test_lexicon_override_words_are_not_flagged() {
        let warnings = validate_unknown_keys("[sentiment.lexicon_overrides]\nsoggy = -2\n");
        assert!(warnings.is_empty(), "{warnings:?}");
    }

    #[test]
    fn test_valid_config_has_no_warnings() {
        let warnings = validate_unknown_keys("[server]\naddr = \"127.0.0.1:5000\"\n");
        assert!(warnings.is_empty());
    }
}
