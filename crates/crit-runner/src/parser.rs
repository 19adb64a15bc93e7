//! Parsing of the solver's `key=value` result line.

use crate::schema::NA;
use std::collections::BTreeMap;
use tracing::trace;

pub const MAX_KEY_LEN: usize = 63;
pub const MAX_VALUE_LEN: usize = 127;
/// Fields kept from a single line; later ones are dropped.
pub const MAX_TOKENS: usize = 64;

/// Field values reported by one solver run.
///
/// An empty record is the failed-run record: every lookup yields `NA`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultRecord {
    fields: BTreeMap<String, String>,
}

impl ResultRecord {
    pub fn failed() -> Self {
        Self::default()
    }

    /// Raw value of `field`, or `NA` if the line did not carry it.
    pub fn get(&self, field: &str) -> &str {
        self.fields.get(field).map(String::as_str).unwrap_or(NA)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Splits `line` on spaces and keeps every `key=value` token.
///
/// Tokens without `=` are skipped. The first occurrence of a key wins.
/// Overlong keys and values are truncated.
pub fn parse_result_line(line: &str) -> ResultRecord {
    let mut fields = BTreeMap::new();
    let mut kept = 0usize;
    for token in line.split(' ').filter(|t| !t.is_empty()) {
        if kept == MAX_TOKENS {
            trace!(token, "token limit reached, ignoring rest of line");
            break;
        }
        let Some((key, value)) = token.split_once('=') else {
            trace!(token, "skipping token without '='");
            continue;
        };
        kept += 1;
        let key = truncate_bytes(key, MAX_KEY_LEN);
        let value = truncate_bytes(value, MAX_VALUE_LEN);
        fields
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
    }
    ResultRecord { fields }
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a char.
pub(crate) fn truncate_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_without_separator_are_skipped() {
        let record = parse_result_line("foo bar=3 baz");
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("bar"), "3");
        assert_eq!(record.get("foo"), NA);
        assert_eq!(record.get("baz"), NA);
    }

    #[test]
    fn parsing_is_idempotent() {
        let line = "instance=myciel3.col k=4 time=0.01  crit=1 seed=42 junk";
        assert_eq!(parse_result_line(line), parse_result_line(line));
    }

    #[test]
    fn absent_and_reported_na_look_the_same() {
        let record = parse_result_line("crit=NA time=1.5");
        assert_eq!(record.get("crit"), NA);
        assert_eq!(record.get("iter"), NA);
        assert!(record.contains("crit"));
        assert!(!record.contains("iter"));
    }

    #[test]
    fn values_keep_everything_after_the_first_separator() {
        let record = parse_result_line("expr=a=b empty= =orphan");
        assert_eq!(record.get("expr"), "a=b");
        assert_eq!(record.get("empty"), "");
        assert_eq!(record.get(""), "orphan");
    }

    #[test]
    fn first_duplicate_wins() {
        let record = parse_result_line("k=5 k=6");
        assert_eq!(record.get("k"), "5");
    }

    #[test]
    fn overlong_keys_and_values_are_truncated() {
        let key = "k".repeat(MAX_KEY_LEN + 10);
        let value = "é".repeat(MAX_VALUE_LEN);
        let record = parse_result_line(&format!("{}={}", key, value));
        let (k, v) = record.iter().next().expect("one field");
        assert_eq!(k.len(), MAX_KEY_LEN);
        assert!(v.len() <= MAX_VALUE_LEN);
        assert!(v.chars().all(|c| c == 'é'));
    }

    #[test]
    fn token_limit_caps_the_field_count() {
        let line: Vec<String> = (0..MAX_TOKENS + 5).map(|i| format!("f{}={}", i, i)).collect();
        let record = parse_result_line(&line.join(" "));
        assert_eq!(record.len(), MAX_TOKENS);
        assert_eq!(record.get(&format!("f{}", MAX_TOKENS)), NA);
    }

    #[test]
    fn failed_record_is_all_na() {
        let record = ResultRecord::failed();
        assert!(record.is_empty());
        assert!(crate::schema::SCHEMA.iter().all(|f| record.get(f) == NA));
    }
}
