// Configuration loading and parsing (league.toml).

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::player::Position;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level tables in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: LeagueConfig,
    #[serde(default)]
    timers: TimerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeagueConfig {
    pub name: String,
    pub num_teams: usize,
    /// Per-team starting budget in dollars.
    pub budget: u32,
    /// Position -> slot count mapping, e.g. `{ QB = 2, RB = 5, ... }`.
    pub roster: HashMap<String, usize>,
    /// Static team definitions (id -> display name). When omitted, teams
    /// are generated as `team_1..team_N`.
    #[serde(default)]
    pub teams: HashMap<String, String>,
}

impl LeagueConfig {
    /// Total roster slots per team (every slot must eventually be filled).
    pub fn roster_size(&self) -> usize {
        self.roster.values().sum()
    }

    /// The (team_id, team_name) pairs for this league, sorted by id.
    ///
    /// Uses the `[league.teams]` table when present; otherwise generates
    /// placeholder teams numbered 1..=num_teams.
    pub fn team_list(&self) -> Vec<(String, String)> {
        let mut teams: Vec<(String, String)> = if self.teams.is_empty() {
            (1..=self.num_teams)
                .map(|i| (format!("team_{i}"), format!("Team {i}")))
                .collect()
        } else {
            self.teams
                .iter()
                .map(|(id, name)| (id.clone(), name.clone()))
                .collect()
        };
        teams.sort_by(|a, b| a.0.cmp(&b.0));
        teams
    }

    /// Target slot counts per concrete position (FLEX and bench excluded),
    /// used by the allocation planner for fill tracking.
    pub fn position_requirements(&self) -> HashMap<Position, usize> {
        let mut reqs = HashMap::new();
        for (pos_str, &count) in &self.roster {
            if let Some(pos) = Position::from_str_pos(pos_str) {
                if !matches!(pos, Position::Flex | Position::Bench) {
                    *reqs.entry(pos).or_insert(0) += count;
                }
            }
        }
        reqs
    }
}

/// Phase timer durations in seconds. Defaults match the live-draft rules:
/// 10s nomination window, 30s opening bid window, 10s reset after each bid,
/// 3s each for going-once and going-twice.
#[derive(Debug, Clone, Deserialize)]
pub struct TimerConfig {
    #[serde(default = "default_nomination_secs")]
    pub nomination_secs: u64,
    #[serde(default = "default_bidding_secs")]
    pub bidding_secs: u64,
    #[serde(default = "default_bid_reset_secs")]
    pub bid_reset_secs: u64,
    #[serde(default = "default_going_once_secs")]
    pub going_once_secs: u64,
    #[serde(default = "default_going_twice_secs")]
    pub going_twice_secs: u64,
}

fn default_nomination_secs() -> u64 {
    10
}
fn default_bidding_secs() -> u64 {
    30
}
fn default_bid_reset_secs() -> u64 {
    10
}
fn default_going_once_secs() -> u64 {
    3
}
fn default_going_twice_secs() -> u64 {
    3
}

impl Default for TimerConfig {
    fn default() -> Self {
        TimerConfig {
            nomination_secs: default_nomination_secs(),
            bidding_secs: default_bidding_secs(),
            bid_reset_secs: default_bid_reset_secs(),
            going_once_secs: default_going_once_secs(),
            going_twice_secs: default_going_twice_secs(),
        }
    }
}

/// The assembled configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub timers: TimerConfig,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml` relative to
/// the given `base_dir`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let league_path = base_dir.join("config").join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;

    let config = Config {
        league: league_file.league,
        timers: league_file.timers,
    };

    validate(&config)?;

    Ok(config)
}

/// Convenience wrapper: loads config relative to the current working directory.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    load_config_from(&cwd)
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    let league = &config.league;

    if league.num_teams == 0 {
        return Err(ConfigError::ValidationError {
            field: "league.num_teams".into(),
            message: "must be greater than 0".into(),
        });
    }

    if league.budget == 0 {
        return Err(ConfigError::ValidationError {
            field: "league.budget".into(),
            message: "must be greater than 0".into(),
        });
    }

    if league.roster.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "league.roster".into(),
            message: "must define at least one roster slot".into(),
        });
    }

    for pos_str in league.roster.keys() {
        if Position::from_str_pos(pos_str).is_none() {
            return Err(ConfigError::ValidationError {
                field: format!("league.roster.{pos_str}"),
                message: "unknown position".into(),
            });
        }
    }

    // Every slot must be fillable at $1 minimum.
    let roster_size = league.roster_size() as u32;
    if league.budget < roster_size {
        return Err(ConfigError::ValidationError {
            field: "league.budget".into(),
            message: format!(
                "budget ${} cannot fill {} roster slots at $1 each",
                league.budget, roster_size
            ),
        });
    }

    if !league.teams.is_empty() && league.teams.len() != league.num_teams {
        return Err(ConfigError::ValidationError {
            field: "league.teams".into(),
            message: format!(
                "defines {} teams but num_teams is {}",
                league.teams.len(),
                league.num_teams
            ),
        });
    }

    let timers = &config.timers;
    let timer_fields: &[(&str, u64)] = &[
        ("timers.nomination_secs", timers.nomination_secs),
        ("timers.bidding_secs", timers.bidding_secs),
        ("timers.bid_reset_secs", timers.bid_reset_secs),
        ("timers.going_once_secs", timers.going_once_secs),
        ("timers.going_twice_secs", timers.going_twice_secs),
    ];
    for (name, val) in timer_fields {
        if *val == 0 {
            return Err(ConfigError::ValidationError {
                field: name.to_string(),
                message: "must be > 0".into(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
