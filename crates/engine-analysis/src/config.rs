//! Analysis configuration from environment variables

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AnalysisError;

/// How the last position of a run is searched.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FinalPositionPolicy {
    /// Re-search the second-to-last position and attribute its score to the
    /// last record.
    #[default]
    RepeatPrevious,
    /// Search the last position itself.
    SearchFinal,
}

impl FromStr for FinalPositionPolicy {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "repeat-previous" => Ok(Self::RepeatPrevious),
            "search-final" => Ok(Self::SearchFinal),
            _ => Err(AnalysisError::Config(
                "FINAL_POSITION_POLICY must be 'repeat-previous' or 'search-final'",
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Path to the UCI engine binary
    pub engine_path: String,

    /// Value sent as `setoption name Threads`
    pub threads: usize,

    /// Upper bound for a single search (and for the startup handshake)
    pub search_timeout: Duration,

    /// Emit a progress notice every this many positions
    pub progress_interval: usize,

    pub final_position: FinalPositionPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            engine_path: "stockfish".to_string(),
            threads: num_cpus::get(),
            search_timeout: Duration::from_secs(60),
            progress_interval: 5,
            final_position: FinalPositionPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn load() -> Result<Self, AnalysisError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AnalysisError> {
        let defaults = Self::default();

        let engine_path = lookup("STOCKFISH_PATH").unwrap_or(defaults.engine_path);

        let threads = match lookup("ENGINE_THREADS") {
            Some(v) => v
                .parse()
                .ok()
                .filter(|&n: &usize| n > 0)
                .ok_or(AnalysisError::Config("ENGINE_THREADS must be a positive integer"))?,
            None => defaults.threads,
        };

        let search_timeout = match lookup("SEARCH_TIMEOUT_SECS") {
            Some(v) => v
                .parse()
                .ok()
                .filter(|&secs: &u64| secs > 0)
                .map(Duration::from_secs)
                .ok_or(AnalysisError::Config("SEARCH_TIMEOUT_SECS must be a positive integer"))?,
            None => defaults.search_timeout,
        };

        let progress_interval = match lookup("PROGRESS_INTERVAL") {
            Some(v) => v
                .parse()
                .ok()
                .filter(|&n: &usize| n > 0)
                .ok_or(AnalysisError::Config("PROGRESS_INTERVAL must be a positive integer"))?,
            None => defaults.progress_interval,
        };

        let final_position = match lookup("FINAL_POSITION_POLICY") {
            Some(v) => v.parse()?,
            None => defaults.final_position,
        };

        Ok(Self {
            engine_path,
            threads,
            search_timeout,
            progress_interval,
            final_position,
        })
    }
}
