//! Parser configuration consumed from engine settings.

use serde::{Deserialize, Serialize};

/// Syntax configuration for one parser instance.
///
/// Most front-ends keep the defaults: `--long` / `-s` flag prefixes,
/// `:` / `=` / whitespace flag-value separators, and `[a,b,c]` collection
/// syntax. The two flag prefixes may be merged into one string (e.g. `/` for
/// DOS-style switches); the parser then tries a long-name match before
/// falling back to short-cluster rules.
///
/// # Examples
///
/// ```
/// use argtree_core::options::ParserOptions;
///
/// let options = ParserOptions::default();
/// assert_eq!(options.long_flag_prefix, "--");
/// assert_eq!(options.short_flag_prefix, "-");
/// assert!(options.allows_whitespace_separator());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserOptions {
    /// Prefix introducing a long flag name.
    pub long_flag_prefix: String,
    /// Prefix introducing a short flag or short-flag cluster.
    pub short_flag_prefix: String,
    /// Accepted flag/value separators. The single-space entry stands for
    /// "any whitespace"; all other entries are matched literally.
    pub value_separators: Vec<String>,
    /// Opening delimiter of a surrounded collection literal.
    pub collection_prefix: String,
    /// Closing delimiter of a surrounded collection literal.
    pub collection_suffix: String,
    /// Separator between collection elements.
    pub collection_separator: String,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            long_flag_prefix: "--".to_string(),
            short_flag_prefix: "-".to_string(),
            value_separators: vec![":".to_string(), "=".to_string(), " ".to_string()],
            collection_prefix: "[".to_string(),
            collection_suffix: "]".to_string(),
            collection_separator: ",".to_string(),
        }
    }
}

impl ParserOptions {
    /// Whether whitespace is accepted as a flag/value separator.
    pub fn allows_whitespace_separator(&self) -> bool {
        self.value_separators.iter().any(|s| s == " ")
    }

    /// The literal (non-whitespace) separators, e.g. `:` and `=`.
    pub fn symbol_separators(&self) -> impl Iterator<Item = &str> {
        self.value_separators
            .iter()
            .map(String::as_str)
            .filter(|s| *s != " ")
    }

    /// Whether the long and short prefixes are the same string.
    pub fn merged_prefixes(&self) -> bool {
        self.long_flag_prefix == self.short_flag_prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_separators() {
        let options = ParserOptions::default();
        let symbols: Vec<&str> = options.symbol_separators().collect();
        assert_eq!(symbols, vec![":", "="]);
        assert!(options.allows_whitespace_separator());
        assert!(!options.merged_prefixes());
    }

    #[test]
    fn test_options_round_trip_through_json() {
        let mut options = ParserOptions::default();
        options.long_flag_prefix = "/".to_string();
        options.short_flag_prefix = "/".to_string();

        let json = serde_json::to_string(&options).unwrap();
        let back: ParserOptions = serde_json::from_str(&json).unwrap();
        assert!(back.merged_prefixes());
        assert_eq!(back, options);
    }
}
