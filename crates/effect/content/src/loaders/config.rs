//! Engine configuration loader.

use std::path::Path;

use effect_core::EngineConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for engine configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML file containing EngineConfig
    ///
    /// # Returns
    ///
    /// Returns an EngineConfig.
    pub fn load(path: &Path) -> LoadResult<EngineConfig> {
        let content = read_file(path)?;
        let config: EngineConfig = toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_tunable_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"max_catchup_ticks = 8\n").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.max_catchup_ticks, Some(8));
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config, EngineConfig::default());
    }
}
