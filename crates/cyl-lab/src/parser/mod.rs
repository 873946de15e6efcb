//! Config loader: parses machine documents into `MachineConfig`
//!
//! ## Supported Formats
//!
//! - JSON (`.json`)
//! - YAML (`.yaml`, `.yml`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! let loader = ConfigLoader::new();
//! let config = loader.load("machines/fruit.yaml")?;
//! ```
//!
//! Every document is validated before it is returned.

use std::path::Path;

use crate::config::MachineConfig;
use crate::error::{ConfigError, ConfigResult};

/// Machine document loader
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Validation limits
    pub limits: LoaderLimits,
}

/// Size limits for loaded documents
#[derive(Debug, Clone)]
pub struct LoaderLimits {
    pub max_symbols: usize,
    pub max_reels: usize,
    pub max_rows: usize,
    pub max_strip_len: usize,
    pub max_patterns: usize,
}

impl Default for LoaderLimits {
    fn default() -> Self {
        Self {
            max_symbols: 64,
            max_reels: 10,
            max_rows: 10,
            max_strip_len: 256,
            max_patterns: 100,
        }
    }
}

impl ConfigLoader {
    /// Create a new loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Create loader with custom limits
    pub fn with_limits(limits: LoaderLimits) -> Self {
        Self { limits }
    }

    /// Parse a JSON machine document
    pub fn parse_json(&self, json: &str) -> ConfigResult<MachineConfig> {
        let config: MachineConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Json(e.to_string()))?;
        self.checked(config)
    }

    /// Parse a YAML machine document
    pub fn parse_yaml(&self, yaml: &str) -> ConfigResult<MachineConfig> {
        let config: MachineConfig =
            serde_yml::from_str(yaml).map_err(|e| ConfigError::Yaml(e.to_string()))?;
        self.checked(config)
    }

    /// Load a document, choosing the format by extension
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<MachineConfig> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        let text = std::fs::read_to_string(path)?;

        let config = match extension.as_str() {
            "json" => self.parse_json(&text)?,
            "yaml" | "yml" => self.parse_yaml(&text)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        log::info!(
            "loaded machine '{}' from {} ({} reels, {} patterns)",
            config.name,
            path.display(),
            config.reels.len(),
            config.patterns.len()
        );
        Ok(config)
    }

    /// Check limits, then every cross reference
    pub fn validate(&self, config: &MachineConfig) -> ConfigResult<()> {
        let limits = &self.limits;
        check_limit("symbols", limits.max_symbols, config.symbols.len())?;
        check_limit("reels", limits.max_reels, config.reels.len())?;
        check_limit("rows", limits.max_rows, config.visible_rows)?;
        check_limit("patterns", limits.max_patterns, config.patterns.len())?;
        for reel in &config.reels {
            check_limit("strip symbols", limits.max_strip_len, reel.len())?;
        }
        config.validate()
    }

    fn checked(&self, config: MachineConfig) -> ConfigResult<MachineConfig> {
        if let Err(e) = self.validate(&config) {
            log::warn!("rejected machine '{}': {}", config.name, e);
            return Err(e);
        }
        Ok(config)
    }
}

fn check_limit(what: &'static str, limit: usize, actual: usize) -> ConfigResult<()> {
    if actual > limit {
        return Err(ConfigError::LimitExceeded {
            what,
            limit,
            actual,
        });
    }
    Ok(())
}

/// Export a machine as pretty JSON
pub fn to_json(config: &MachineConfig) -> ConfigResult<String> {
    serde_json::to_string_pretty(config).map_err(|e| ConfigError::Json(e.to_string()))
}

/// Export a machine as YAML
pub fn to_yaml(config: &MachineConfig) -> ConfigResult<String> {
    serde_yml::to_string(config).map_err(|e| ConfigError::Yaml(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetriggerPolicy;
    use crate::pattern::{PartialRunHighlight, PatternTier};
    use crate::symbols::SymbolId;
    use crate::timing::TimingProfile;

    const MINIMAL_JSON: &str = r#"{
        "name": "cherries",
        "visible_rows": 1,
        "symbols": [{"id": "Cherry"}, {"id": "Plum", "sprite": "plum.png"}],
        "rewards": {"Cherry": {"2": 1, "3": 2}},
        "reels": [
            {"symbols": ["Cherry", "Plum"]},
            {"symbols": ["Cherry", "Plum"], "radius": 2.5},
            {"symbols": ["Plum", "Cherry"], "angle_offset": 180.0}
        ],
        "patterns": [{"name": "line", "tier": "linear", "indices": [0, 1, 2]}],
        "retrigger": "queue"
    }"#;

    const MINIMAL_YAML: &str = r#"
name: cherries
visible_rows: 1
symbols:
  - id: Cherry
  - id: Plum
rewards:
  Cherry:
    2: 1
    3: 2
reels:
  - symbols: [Cherry, Plum]
  - symbols: [Cherry, Plum]
  - symbols: [Plum, Cherry]
patterns:
  - name: line
    tier: linear
    indices: [0, 1, 2]
  - name: all
    tier: wild
    indices: [0, 1, 2]
partial_run_highlight: keep
timing:
  profile: instant
  delay_between_reels: 0.0
  hold: { min: 0.0, max: 0.0 }
  reel_spin: { min: 0.0, max: 0.0 }
  spin_speed: 90.0
seed: 7
"#;

    #[test]
    fn test_parse_json() {
        let config = ConfigLoader::new().parse_json(MINIMAL_JSON).unwrap();
        assert_eq!(config.name, "cherries");
        assert_eq!(config.grid_len(), 3);
        assert_eq!(config.reels[1].radius, 2.5);
        assert_eq!(config.reels[0].radius, 3.0);
        assert_eq!(config.retrigger, RetriggerPolicy::Queue);
        assert_eq!(config.timing.profile, TimingProfile::Normal);
        assert_eq!(config.rewards.reward(&SymbolId::new("Cherry"), 3), 2);
    }

    #[test]
    fn test_parse_yaml() {
        let config = ConfigLoader::new().parse_yaml(MINIMAL_YAML).unwrap();
        assert_eq!(config.patterns[1].tier, PatternTier::Wild);
        assert_eq!(config.partial_run_highlight, PartialRunHighlight::Keep);
        assert_eq!(config.timing.profile, TimingProfile::Instant);
        assert_eq!(config.timing.spin_speed, 90.0);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.retrigger, RetriggerPolicy::Ignore);
    }

    #[test]
    fn test_parse_errors() {
        let loader = ConfigLoader::new();
        assert!(matches!(loader.parse_json("{"), Err(ConfigError::Json(_))));
        assert!(matches!(loader.parse_yaml("reels: ["), Err(ConfigError::Yaml(_))));

        let unknown = MINIMAL_JSON.replace(r#"["Plum", "Cherry"]"#, r#"["Plum", "Seven"]"#);
        assert!(matches!(
            loader.parse_json(&unknown),
            Err(ConfigError::UnknownReelSymbol { reel: 2, .. })
        ));
    }

    #[test]
    fn test_limits() {
        let loader = ConfigLoader::with_limits(LoaderLimits {
            max_reels: 2,
            ..Default::default()
        });
        assert!(matches!(
            loader.parse_json(MINIMAL_JSON),
            Err(ConfigError::LimitExceeded {
                what: "reels",
                limit: 2,
                actual: 3
            })
        ));
    }

    #[test]
    fn test_export_reloads() {
        let reference = MachineConfig::reference().with_seed(9);
        let loader = ConfigLoader::new();
        assert_eq!(loader.parse_json(&to_json(&reference).unwrap()).unwrap(), reference);
        assert_eq!(loader.parse_yaml(&to_yaml(&reference).unwrap()).unwrap(), reference);
    }

    #[test]
    fn test_load_by_extension() {
        let dir = std::env::temp_dir().join(format!("cyl-lab-loader-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let yaml_path = dir.join("machine.yml");
        std::fs::write(&yaml_path, MINIMAL_YAML).unwrap();
        assert_eq!(ConfigLoader::new().load(&yaml_path).unwrap().name, "cherries");

        let txt_path = dir.join("machine.txt");
        std::fs::write(&txt_path, MINIMAL_JSON).unwrap();
        assert!(matches!(
            ConfigLoader::new().load(&txt_path),
            Err(ConfigError::UnsupportedFormat(ext)) if ext == "txt"
        ));

        assert!(matches!(
            ConfigLoader::new().load(dir.join("missing.json")),
            Err(ConfigError::Io(_))
        ));

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
