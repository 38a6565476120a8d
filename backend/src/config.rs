//! Scheduler configuration file support.
//!
//! Configuration is read from a TOML file. Every section has defaults, so an
//! empty file (or no file at all) yields the standard Melbourne setup:
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [repository]
//! type = "local"
//! seed_file = "data/seed.json"
//!
//! [business_hours]
//! open = "07:00"
//! close = "19:00"
//!
//! [scheduling]
//! travel_buffer_minutes = 15
//! home_base = "Melbourne"
//!
//! [slots.inspection]
//! anchor = "09:00"
//! granularity_minutes = 120
//! window_end = "17:00"
//!
//! [scoring]
//! capacity_bookings = 6
//!
//! [suburbs]
//! "Mornington" = 55
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{clock, BusinessHours};
use crate::scheduling::{ScoringWeights, SlotGrid};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV_VAR: &str = "SCHEDULER_CONFIG";

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Top-level scheduler configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub server: ServerSettings,
    pub repository: RepositorySettings,
    pub business_hours: BusinessHours,
    pub scheduling: SchedulingRules,
    pub slots: SlotSettings,
    pub scoring: ScoringWeights,
    /// Extra or overriding suburb travel values (minutes from the CBD).
    pub suburbs: BTreeMap<String, u32>,
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Storage backend selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositorySettings {
    #[serde(rename = "type")]
    pub repo_type: String,
    /// JSON file with technicians and leads to preload into the local store.
    pub seed_file: Option<PathBuf>,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            repo_type: "local".to_string(),
            seed_file: None,
        }
    }
}

/// Fixed rules of the scheduling engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulingRules {
    /// Minimum gap between consecutive appointments on top of raw travel time.
    pub travel_buffer_minutes: u32,
    /// Travel value assumed for suburbs missing from the table.
    pub unknown_suburb_minutes: u32,
    /// Duration used when a request does not specify one.
    pub default_duration_minutes: u32,
    /// Threshold for the "nearby suburbs" hint on conflict reports.
    pub nearby_suburb_minutes: u32,
    /// Maximum number of suggested alternatives per conflict report.
    pub max_alternatives: usize,
    /// Offsets (hours) tried around a conflicting request, each both later and earlier.
    pub alternative_offsets_hours: Vec<i64>,
    /// Where technicians start the day.
    pub home_base: String,
}

impl Default for SchedulingRules {
    fn default() -> Self {
        Self {
            travel_buffer_minutes: 15,
            unknown_suburb_minutes: 30,
            default_duration_minutes: 60,
            nearby_suburb_minutes: 20,
            max_alternatives: 3,
            alternative_offsets_hours: vec![1, 2, 3, 4],
            home_base: "Melbourne".to_string(),
        }
    }
}

/// Slot grids offered to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotSettings {
    /// Grid for general availability queries.
    pub general: SlotGrid,
    /// Grid for the inspection slot picker.
    pub inspection: SlotGrid,
}

impl Default for SlotSettings {
    fn default() -> Self {
        Self {
            general: SlotGrid::new(clock(7, 0), 30, clock(19, 0)),
            inspection: SlotGrid::new(clock(9, 0), 120, clock(17, 0)),
        }
    }
}

impl SchedulerConfig {
    /// Parse configuration from TOML text and validate it.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: SchedulerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// A relative `repository.seed_file` is resolved against the file's directory.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;
        let resolved = match (&config.repository.seed_file, path.parent()) {
            (Some(seed), Some(dir)) if seed.is_relative() => Some(dir.join(seed)),
            _ => None,
        };
        if resolved.is_some() {
            config.repository.seed_file = resolved;
        }
        Ok(config)
    }

    /// Resolve the configuration for this process.
    ///
    /// Order: explicit path, `SCHEDULER_CONFIG`, then `scheduler.toml` in the
    /// current directory, `backend/` or the parent directory. Falls back to the
    /// defaults when no file exists. `HOST` and `PORT` override the server section.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match env::var(CONFIG_ENV_VAR) {
                Ok(path) => Self::from_file(path)?,
                Err(_) => Self::from_default_location()?,
            },
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load `scheduler.toml` from the standard search paths, or the defaults.
    pub fn from_default_location() -> Result<Self, ConfigError> {
        let search_paths = [
            PathBuf::from("scheduler.toml"),
            PathBuf::from("backend/scheduler.toml"),
            PathBuf::from("../scheduler.toml"),
        ];

        match search_paths.iter().find(|path| path.exists()) {
            Some(path) => {
                log::info!("Loading scheduler configuration from {}", path.display());
                Self::from_file(path)
            }
            None => {
                log::info!("No scheduler.toml found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }

    /// Apply `HOST` / `PORT` environment overrides.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| ConfigError::Invalid(format!("PORT must be a valid port number, got '{}'", port)))?;
        }
        Ok(())
    }

    /// Reject configurations the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.business_hours.close <= self.business_hours.open {
            return Err(ConfigError::Invalid(
                "business_hours.close must be later than business_hours.open".to_string(),
            ));
        }
        for (name, grid) in [("general", &self.slots.general), ("inspection", &self.slots.inspection)] {
            if grid.granularity_minutes == 0 {
                return Err(ConfigError::Invalid(format!(
                    "slots.{}.granularity_minutes must be positive",
                    name
                )));
            }
        }
        if self.scheduling.default_duration_minutes == 0 {
            return Err(ConfigError::Invalid(
                "scheduling.default_duration_minutes must be positive".to_string(),
            ));
        }
        if self.scoring.capacity_bookings == 0 || self.scoring.busy_bookings > self.scoring.capacity_bookings {
            return Err(ConfigError::Invalid(
                "scoring.busy_bookings must not exceed a positive scoring.capacity_bookings".to_string(),
            ));
        }
        if self.scoring.travel_near_minutes > self.scoring.travel_mid_minutes {
            return Err(ConfigError::Invalid(
                "scoring.travel_near_minutes must not exceed scoring.travel_mid_minutes".to_string(),
            ));
        }
        if self.repository.repo_type.to_lowercase() != "local" {
            return Err(ConfigError::Invalid(format!(
                "Unknown repository type: {}",
                self.repository.repo_type
            )));
        }
        Ok(())
    }
}
