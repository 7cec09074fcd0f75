//! Modifier-aggregation table loader.

use std::collections::HashMap;
use std::path::Path;

use effect_core::{ModifierRegistry, ModifierRule};

use crate::loaders::{LoadResult, read_file};

/// Loader for modifier-aggregation tables from TOML files.
///
/// Each table entry registers one modifier key:
///
/// ```toml
/// [speed_mult]
/// default = 1.0
/// aggregation = "multiplicative"
/// min = 0.0
/// max = 10.0
///
/// [armor]
/// default = 0.0
/// aggregation = "additive"
/// ```
pub struct ModifierTableLoader;

impl ModifierTableLoader {
    /// Load a modifier-aggregation table from a TOML file.
    pub fn load(path: &Path) -> LoadResult<ModifierRegistry> {
        let content = read_file(path)?;
        Self::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to load modifier table {}: {}", path.display(), e)
        })
    }

    /// Parse a modifier-aggregation table from TOML text.
    pub fn from_str(content: &str) -> LoadResult<ModifierRegistry> {
        let rules: HashMap<String, ModifierRule> = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse modifier table TOML: {}", e))?;
        Ok(ModifierRegistry::from_rules(rules))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use effect_core::AggregationRule;
    use std::io::Write;

    const TABLE: &str = r#"
[speed_mult]
default = 1.0
aggregation = "multiplicative"
min = 0.0
max = 10.0

[armor]
default = 0.0
aggregation = "additive"

[tint]
default = 0.0
aggregation = "last_wins"
"#;

    #[test]
    fn parses_rules_and_bounds() {
        let registry = ModifierTableLoader::from_str(TABLE).unwrap();

        let rule = registry.rule("speed_mult").unwrap();
        assert_eq!(rule.aggregation, AggregationRule::Multiplicative);
        assert_eq!(rule.min, Some(0.0));
        assert_eq!(rule.max, Some(10.0));

        let rule = registry.rule("armor").unwrap();
        assert_eq!(rule.aggregation, AggregationRule::Additive);
        assert_eq!(rule.min, None);

        assert_eq!(
            registry.rule("tint").unwrap().aggregation,
            AggregationRule::LastWins
        );
    }

    #[test]
    fn defaults_cover_all_keys() {
        let registry = ModifierTableLoader::from_str(TABLE).unwrap();
        let defaults = registry.defaults();
        assert_eq!(defaults.len(), 3);
        assert_eq!(defaults.get("speed_mult"), Some(1.0));
    }

    #[test]
    fn unknown_aggregation_rule_fails() {
        let table = "[speed]\ndefault = 1.0\naggregation = \"median\"\n";
        assert!(ModifierTableLoader::from_str(table).is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TABLE.as_bytes()).unwrap();

        let registry = ModifierTableLoader::load(file.path()).unwrap();
        assert!(registry.rule("armor").is_some());
    }
}
