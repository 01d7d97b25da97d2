use std::path::PathBuf;

use thiserror::Error;

use super::supply::DemandModeType;
use super::{StopId, TripId};


/// Per-search failures.  None of these are fatal to the process; each maps to a distinct
/// status code that the caller can record for the traveler.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    #[error("zone {0} has no access or egress links")]
    NoAccessLinks(StopId),

    #[error("no weights configured for user class {user_class:?}, purpose {purpose:?}, \
             {mode_type} mode {demand_mode:?}")]
    NoWeightsConfigured {
        user_class: String,
        purpose: String,
        mode_type: DemandModeType,
        demand_mode: String,
    },

    #[error("zone {0} could not be reached")]
    DestinationUnreachable(StopId),

    #[error("no paths were generated in {0} attempts")]
    NoPathsGenerated(usize),

    #[error("integerized path probabilities sum to zero")]
    ZeroPathProbability,
}

impl SearchError {
    /// Status code reported to callers; 0 is reserved for success.
    pub fn status_code(&self) -> i32 {
        match self {
            SearchError::NoAccessLinks(_) => 1,
            SearchError::NoWeightsConfigured { .. } => 2,
            SearchError::DestinationUnreachable(_) => 3,
            SearchError::NoPathsGenerated(_) => 4,
            SearchError::ZeroPathProbability => 5,
        }
    }
}

/// Malformed network supply.  These are detected once when the supply is validated and
/// should stop the assignment run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SupplyError {
    #[error("trip {0} has no stop times")]
    EmptyTrip(TripId),

    #[error("trip {trip_id} has stop sequence {found} where {expected} was expected")]
    SequenceGap { trip_id: TripId, expected: u32, found: u32 },

    #[error("trip {trip_id} departs stop sequence {seq} before arriving there")]
    DepartsBeforeArrival { trip_id: TripId, seq: u32 },

    #[error("trip {trip_id} arrives at stop sequence {seq} before leaving the previous stop")]
    TimeTravel { trip_id: TripId, seq: u32 },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config as yaml: {0}")]
    Yaml(#[from] yaml_rust::ScanError),

    #[error("config file contains no yaml document")]
    Empty,

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}
