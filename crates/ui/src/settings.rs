use std::fs;
use std::path::Path;

use ai::{MoveOrdering, SearchConfig, TerminalScoring};
use anyhow::Context;
use serde::Deserialize;

/// Contents of the optional TOML settings file. Every key has a default, so
/// an empty file is valid.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub network: NetworkSettings,
    pub engine: EngineSettings,
    pub display: DisplaySettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkSettings {
    pub bind: String,
    pub port: u16,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: net::DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ordering {
    #[default]
    Native,
    CapturesFirst,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineSettings {
    pub depth: u32,
    pub ordering: Ordering,
    pub pruning: bool,
    pub mate_aware: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            depth: 2,
            ordering: Ordering::Native,
            pruning: true,
            mate_aware: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplaySettings {
    /// Largest square edge in points; the board shrinks to fit the window.
    pub square_size: f32,
    /// Moves shown in the sidebar.
    pub move_list_len: usize,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            square_size: 80.0,
            move_list_len: 10,
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let settings = Self::from_toml(&text).with_context(|| format!("parsing {}", path.display()))?;
        log::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn search_config(&self) -> SearchConfig {
        SearchConfig {
            depth: self.engine.depth,
            ordering: match self.engine.ordering {
                Ordering::Native => MoveOrdering::Native,
                Ordering::CapturesFirst => MoveOrdering::CapturesFirst,
            },
            pruning: self.engine.pruning,
            terminal: if self.engine.mate_aware {
                TerminalScoring::MateAware
            } else {
                TerminalScoring::Material
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let settings = Settings::from_toml("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.network.port, 5555);
        assert_eq!(settings.search_config(), SearchConfig::default());
    }

    #[test]
    fn reads_every_section() {
        let settings = Settings::from_toml(
            r#"
            [network]
            bind = "127.0.0.1"
            port = 6000

            [engine]
            depth = 4
            ordering = "captures_first"
            pruning = false
            mate_aware = true

            [display]
            square_size = 64.0
            move_list_len = 20
            "#,
        )
        .unwrap();

        assert_eq!(settings.network.bind, "127.0.0.1");
        assert_eq!(settings.network.port, 6000);
        assert_eq!(settings.display.square_size, 64.0);
        assert_eq!(settings.display.move_list_len, 20);
        assert_eq!(
            settings.search_config(),
            SearchConfig {
                depth: 4,
                ordering: MoveOrdering::CapturesFirst,
                pruning: false,
                terminal: TerminalScoring::MateAware,
            }
        );
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let settings = Settings::from_toml("[engine]\ndepth = 3\n").unwrap();
        assert_eq!(settings.engine.depth, 3);
        assert!(settings.engine.pruning);
        assert_eq!(settings.network, NetworkSettings::default());
    }

    #[test]
    fn unknown_keys_are_errors() {
        assert!(Settings::from_toml("[engine]\nhash_mb = 16\n").is_err());
        assert!(Settings::from_toml("[engine]\nordering = \"random\"\n").is_err());
    }

    #[test]
    fn missing_file_is_reported() {
        let err = Settings::load(Path::new("/nonexistent/chess.toml")).unwrap_err();
        assert!(err.to_string().contains("reading"));
    }
}
