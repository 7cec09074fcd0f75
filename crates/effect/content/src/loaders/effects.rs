//! Effect-type table loader.

use std::collections::HashMap;
use std::path::Path;

use effect_core::{EffectCatalog, EffectTypeDefinition};

use crate::loaders::{LoadResult, read_file};

/// Loader for effect-type tables from RON files.
///
/// The file is a map from dot-hierarchical type id to definition:
///
/// ```ron
/// #![enable(implicit_some)]
/// {
///     "fire": (
///         duration: 3000.0,
///         periodic: (interval: 500.0, damage: 3.0),
///     ),
///     "fire.major": (
///         parent: "fire",
///         duration: 5000.0,
///     ),
/// }
/// ```
pub struct EffectTableLoader;

impl EffectTableLoader {
    /// Load and validate an effect-type table from a RON file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the RON file containing the type table
    ///
    /// # Returns
    ///
    /// Returns a validated catalog; unknown parents and parent cycles are
    /// load errors.
    pub fn load(path: &Path) -> LoadResult<EffectCatalog> {
        let content = read_file(path)?;
        Self::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to load effect table {}: {}", path.display(), e))
    }

    /// Parse and validate an effect-type table from RON text.
    pub fn from_str(content: &str) -> LoadResult<EffectCatalog> {
        let definitions: HashMap<String, EffectTypeDefinition> = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse effect table RON: {}", e))?;
        EffectCatalog::from_definitions(definitions)
            .map_err(|e| anyhow::anyhow!("Invalid effect table: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TABLE: &str = r##"
#![enable(implicit_some)]
{
    "fire": (
        duration: 3000.0,
        targets: (player: true, enemies: false),
        periodic: (interval: 500.0, damage: 3.0, apply_on_enter: true),
        visual: { "color": "#ff4400" },
    ),
    "fire.major": (
        parent: "fire",
        duration: 5000.0,
    ),
    "poison": (
        duration: 10000.0,
        stacking: (max_stacks: 5, rule: additive),
        periodic: (interval: 1000.0, damage: 3.0),
    ),
}
"##;

    #[test]
    fn parses_and_resolves_inheritance() {
        let catalog = EffectTableLoader::from_str(TABLE).unwrap();
        assert_eq!(catalog.len(), 3);

        let resolved = catalog.resolve("fire.major").unwrap();
        assert_eq!(resolved.duration, Some(5000.0));
        assert!(!resolved.targets.enemies);
        let periodic = resolved.periodic.unwrap();
        assert_eq!(periodic.interval, 500.0);
        assert!(periodic.apply_on_enter);
    }

    #[test]
    fn parses_stacking_rules() {
        let catalog = EffectTableLoader::from_str(TABLE).unwrap();
        let resolved = catalog.resolve("poison").unwrap();
        assert_eq!(resolved.max_stacks, 5);
        assert_eq!(resolved.stack_rule, effect_core::StackRule::Additive);
    }

    #[test]
    fn unknown_parent_fails_at_load() {
        let table = r#"{ "fire.major": (parent: Some("fire")) }"#;
        assert!(EffectTableLoader::from_str(table).is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(TABLE.as_bytes()).unwrap();

        let catalog = EffectTableLoader::load(file.path()).unwrap();
        assert!(catalog.contains("fire"));
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(EffectTableLoader::load(Path::new("/no/such/table.ron")).is_err());
    }
}
