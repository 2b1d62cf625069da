//! Configuration file loading
//!
//! The YAML file is parsed first, then `${VAR}` and `${VAR:default}`
//! references inside string values are replaced from the environment.
//! Keys and non-string scalars are left alone.

use anyhow::{Context, Result};
use dynzone_core::UpdaterConfig;
use regex::{Captures, Regex};
use serde_yaml::Value;
use std::path::Path;
use tracing::warn;

/// `${NAME}` or `${NAME:default}`
const VAR_PATTERN: &str = r"\$\{([A-Za-z0-9_-]+)(?::([^}]*))?\}";

/// Load and expand the updater configuration
///
/// Suspicious settings (empty tokens, no accounts) are logged as warnings;
/// only unreadable or structurally invalid files are errors.
pub fn load(path: &Path) -> Result<UpdaterConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    let config = parse(&text, |name| std::env::var(name).ok())
        .with_context(|| format!("Invalid config file {}", path.display()))?;

    for warning in config.warnings() {
        warn!("{}", warning);
    }

    Ok(config)
}

/// Parse configuration text, resolving variables through `lookup`
pub fn parse<F>(text: &str, lookup: F) -> Result<UpdaterConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let expander = VarExpander::new(lookup)?;

    let mut value: Value = serde_yaml::from_str(text).context("Malformed YAML")?;
    expander.expand_value(&mut value);

    serde_yaml::from_value(value).context("Unexpected configuration structure")
}

/// Replaces `${NAME}` / `${NAME:default}` references
///
/// An unset variable without a default is left verbatim, as is anything
/// that does not form a valid reference.
pub struct VarExpander<F> {
    pattern: Regex,
    lookup: F,
}

impl<F> VarExpander<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn new(lookup: F) -> Result<Self> {
        let pattern = Regex::new(VAR_PATTERN).context("Invalid variable pattern")?;
        Ok(Self { pattern, lookup })
    }

    /// Expand every reference in `input`
    pub fn expand(&self, input: &str) -> String {
        self.pattern
            .replace_all(input, |caps: &Captures| {
                let name = &caps[1];
                (self.lookup)(name)
                    .or_else(|| caps.get(2).map(|default| default.as_str().to_string()))
                    .unwrap_or_else(|| caps[0].to_string())
            })
            .into_owned()
    }

    /// Expand string scalars in place; keys and other scalars are untouched
    fn expand_value(&self, value: &mut Value) {
        match value {
            Value::String(s) => *s = self.expand(s),
            Value::Sequence(items) => {
                for item in items {
                    self.expand_value(item);
                }
            }
            Value::Mapping(map) => {
                for (_, item) in map.iter_mut() {
                    self.expand_value(item);
                }
            }
            Value::Tagged(tagged) => self.expand_value(&mut tagged.value),
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const SAMPLE: &str = r#"
auth_tokens:
  - desc: "Personal account"
    token: ${CF_TOKEN}
    domains:
      - zone_name: example.com
        records:
          - name: home
          - name: vpn
            proxied: true
            ttl: 300
  - description: ${WORK_DESC:Work}
    token: "static-token"
    domains:
      - zone_name: example.org
        records:
          - name: office
            type: A
"#;

    #[test]
    fn expands_plain_reference() {
        let expander = VarExpander::new(env(&[("TOKEN", "abc123")])).unwrap();
        assert_eq!(expander.expand("${TOKEN}"), "abc123");
        assert_eq!(expander.expand("Bearer ${TOKEN}!"), "Bearer abc123!");
    }

    #[test]
    fn uses_default_when_unset() {
        let expander = VarExpander::new(env(&[])).unwrap();
        assert_eq!(expander.expand("${ZONE:example.com}"), "example.com");
        assert_eq!(expander.expand("${EMPTY:}"), "");
    }

    #[test]
    fn set_variable_beats_default() {
        let expander = VarExpander::new(env(&[("ZONE", "example.net")])).unwrap();
        assert_eq!(expander.expand("${ZONE:example.com}"), "example.net");
    }

    #[test]
    fn unset_without_default_is_left_verbatim() {
        let expander = VarExpander::new(env(&[])).unwrap();
        assert_eq!(expander.expand("${MISSING}"), "${MISSING}");
        assert_eq!(expander.expand("a-${MISSING}-b"), "a-${MISSING}-b");
    }

    #[test]
    fn malformed_references_are_untouched() {
        let expander = VarExpander::new(env(&[("A", "x")])).unwrap();
        assert_eq!(expander.expand("${"), "${");
        assert_eq!(expander.expand("${}"), "${}");
        assert_eq!(expander.expand("${A"), "${A");
        assert_eq!(expander.expand("${A B}"), "${A B}");
        assert_eq!(expander.expand("$A ${A}"), "$A x");
    }

    #[test]
    fn names_may_contain_dashes_and_digits() {
        let expander = VarExpander::new(env(&[("cf-token_2", "t")])).unwrap();
        assert_eq!(expander.expand("${cf-token_2}"), "t");
    }

    #[test]
    fn parses_sample_configuration() {
        let config = parse(SAMPLE, env(&[("CF_TOKEN", "secret-token")])).unwrap();

        assert_eq!(config.auth_tokens.len(), 2);
        assert_eq!(config.record_count(), 3);

        let personal = &config.auth_tokens[0];
        assert_eq!(personal.description, "Personal account");
        assert_eq!(personal.token.expose(), "secret-token");

        let records = &personal.domains[0].records;
        assert_eq!(records[0].record_type, "A");
        assert!(!records[0].proxied);
        assert_eq!(records[0].ttl, 1);
        assert!(records[1].proxied);
        assert_eq!(records[1].ttl, 300);

        let work = &config.auth_tokens[1];
        assert_eq!(work.description, "Work");
        assert_eq!(work.domains[0].zone_name, "example.org");
    }

    #[test]
    fn empty_token_keeps_other_accounts() {
        let text = "auth_tokens:\n  - desc: broken\n    token: \"${UNSET_TOKEN:}\"\n  - desc: good\n    token: t0k\n    domains:\n      - zone_name: example.com\n        records:\n          - name: home\n";
        let config = parse(text, env(&[])).unwrap();

        assert_eq!(config.auth_tokens.len(), 2);
        assert!(config.auth_tokens[0].token.is_empty());
        assert_eq!(config.auth_tokens[1].token.expose(), "t0k");
        assert_eq!(config.warnings(), vec!["Token for 'broken' is empty"]);
    }

    #[test]
    fn empty_account_list_is_accepted() {
        let config = parse("auth_tokens: []\n", env(&[])).unwrap();
        assert!(config.auth_tokens.is_empty());
    }

    #[test]
    fn wrong_structure_is_rejected() {
        assert!(parse("auth_tokens:\n  - desc: no token here\n", env(&[])).is_err());
    }

    #[test]
    fn malformed_yaml_is_rejected() {
        assert!(parse("auth_tokens: [\n", env(&[])).is_err());
    }

    #[test]
    fn numbers_are_not_expanded() {
        let text = "auth_tokens:\n  - desc: x\n    token: t\n    domains:\n      - zone_name: example.com\n        records:\n          - name: home\n            ttl: 120\n";
        let config = parse(text, env(&[])).unwrap();
        assert_eq!(config.auth_tokens[0].domains[0].records[0].ttl, 120);
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "auth_tokens:\n  - desc: file\n    token: from-file").unwrap();

        let config = load(file.path()).unwrap();
        assert_eq!(config.auth_tokens[0].description, "file");
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("nope.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
