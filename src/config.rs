// Configuration module for reading Tron.toml
// All tunable search, scoring and budget constants live here

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::TronError;

/// Main configuration structure containing all tunable parameters
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub search: SearchConfig,
    pub budget: BudgetConfig,
    pub scores: ScoresConfig,
    pub flood_fill: FloodFillConfig,
    pub server: ServerConfig,
    pub debug: DebugConfig,
}

/// Node budget sizing
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SearchConfig {
    /// The first turn's budget is `budget_cells / (width * height) + 1`
    pub budget_cells: usize,
}

impl SearchConfig {
    /// Node budget for the first turn on a board with `cells` cells
    pub fn initial_budget(&self, cells: usize) -> usize {
        self.budget_cells / cells.max(1) + 1
    }
}

/// Integer scaling factor, applied as `value * numerator / denominator`
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Ratio {
    pub numerator: usize,
    pub denominator: usize,
}

impl Ratio {
    pub fn apply(&self, value: usize) -> usize {
        value.saturating_mul(self.numerator) / self.denominator.max(1)
    }
}

/// Adaptive budget policy, thresholds in remaining-clock units
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct BudgetConfig {
    pub generous_time: i64,
    pub moderate_time: i64,
    pub scarce_time: i64,
    pub generous_growth: Ratio,
    pub moderate_growth: Ratio,
    pub scarce_shrink: Ratio,
    pub increment: usize,
}

/// Evaluation and backup constants
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ScoresConfig {
    /// Sentinel for "no continuation seen yet" while folding children
    pub max_score: i64,
    /// Sentinel for a line where our agent is eliminated
    pub min_score: i64,
    /// Added to every child score for surviving one more turn
    pub survival_bonus: i64,
    pub coin_weight: i64,
    /// Own territory is weighted by `num_players + self_weight_extra`
    pub self_weight_extra: i64,
    pub max_enemy_weight: i64,
}

/// Territory flood fill limits
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct FloodFillConfig {
    /// Maximum frontier cells processed per evaluation
    pub iteration_limit: usize,
}

/// HTTP server settings
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// Turn clock assumed when a request carries no `remaining_time`
    pub turn_time_ms: i64,
}

/// Debug configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct DebugConfig {
    pub enabled: bool,
    pub log_file_path: String,
}

impl Config {
    /// Loads configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TronError> {
        let contents = fs::read_to_string(path.as_ref()).map_err(|e| TronError::Io {
            path: path.as_ref().display().to_string(),
            source: e,
        })?;

        Ok(toml::from_str(&contents)?)
    }

    /// Loads default configuration from Tron.toml in the project root
    pub fn load_default() -> Result<Self, TronError> {
        Self::from_file("Tron.toml")
    }

    /// Creates a configuration with hardcoded default values as fallback
    /// This should match the constants defined in Tron.toml
    pub fn default_hardcoded() -> Self {
        Config {
            search: SearchConfig {
                budget_cells: 10_000,
            },
            budget: BudgetConfig {
                generous_time: 92,
                moderate_time: 80,
                scarce_time: 60,
                generous_growth: Ratio {
                    numerator: 3,
                    denominator: 2,
                },
                moderate_growth: Ratio {
                    numerator: 4,
                    denominator: 3,
                },
                scarce_shrink: Ratio {
                    numerator: 2,
                    denominator: 3,
                },
                increment: 1,
            },
            scores: ScoresConfig {
                max_score: 100_000_000,
                min_score: -100_000_000,
                survival_bonus: 10,
                coin_weight: 10,
                self_weight_extra: 2,
                max_enemy_weight: 2,
            },
            flood_fill: FloodFillConfig {
                iteration_limit: 2000,
            },
            server: ServerConfig { turn_time_ms: 100 },
            debug: DebugConfig {
                enabled: false,
                log_file_path: "tron_debug.jsonl".to_string(),
            },
        }
    }

    /// Attempts to load from file, falls back to hardcoded defaults on error
    pub fn load_or_default() -> Self {
        Self::load_default().unwrap_or_else(|e| {
            log::warn!("Could not load Tron.toml ({}), using hardcoded defaults", e);
            Self::default_hardcoded()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_budget_scales_with_board() {
        let config = Config::default_hardcoded();
        assert_eq!(config.search.initial_budget(100), 101);
        assert_eq!(config.search.initial_budget(50 * 50), 5);
        assert_eq!(config.search.initial_budget(200 * 200), 1);
    }

    #[test]
    fn test_ratio_apply_truncates() {
        let r = Ratio {
            numerator: 4,
            denominator: 3,
        };
        assert_eq!(r.apply(100), 133);
        assert_eq!(r.apply(0), 0);
    }

    #[test]
    fn test_tron_toml_can_be_parsed() {
        let result = Config::from_file("Tron.toml");
        assert!(result.is_ok(), "Failed to parse Tron.toml: {:?}", result.err());
    }

    #[test]
    fn test_tron_toml_matches_hardcoded_defaults() {
        let file_config = Config::from_file("Tron.toml").expect("Tron.toml should be parseable");
        assert_eq!(file_config, Config::default_hardcoded());
    }

    #[test]
    fn test_missing_file_returns_error() {
        let result = Config::from_file("nonexistent.toml");
        assert!(matches!(result, Err(TronError::Io { .. })));
    }

    #[test]
    fn test_invalid_toml_returns_parse_error() {
        let result: Result<Config, TronError> =
            toml::from_str::<Config>("[search]\nbudget_cells = \"many\"").map_err(Into::into);
        assert!(matches!(result, Err(TronError::ConfigParse(_))));
    }
}
