// imports of other modules from this crate
mod config_utils;

mod error;
pub use error::{ConfigError, SearchError, SupplyError};

mod config;
pub use config::PathfinderConfig;

mod leg;
pub use leg::{CandidateLeg, LegKey, LegMode};

mod cost;
pub use cost::{Attributes, CostModel, Weights};

mod fare;
pub use fare::{FarePeriod, FareTable, FareTransferType};

mod supply;
pub use supply::{AccessLink, DemandModeType, NetworkSupply, StopInfo, TransitSupply, TripInfo,
                 TripStopTime};

mod request;
pub use request::{Direction, SearchRequest};

mod hyperlink;
pub use hyperlink::{Hyperlink, HyperlinkParams};

mod label_queue;
pub use label_queue::{LabelEntry, LabelQueue};

mod path;
pub use path::{Path, PathInfo, PathSet};

mod enumerator;
pub use enumerator::PathEnumerator;

mod trace;
pub use trace::{CsvLabelTrace, LogTrace, NoTrace, TraceSink};

mod pathfinder;
pub use pathfinder::{PathFinder, PerformanceInfo, SearchResult};

#[cfg(test)]
mod test_utils;


/// Numeric id of a stop or a zone.  Zones and stops share one id space.
pub type StopId = u32;
pub type TripId = u32;
/// Numeric id of a supply mode (e.g. walk access, local bus, transfer).
pub type ModeId = u32;
pub type RouteId = u32;
/// Fare zone number attached to a stop.
pub type FareZoneId = u32;
/// Index of a fare period in the supply's fare table.
pub type FarePeriodId = usize;

/// Number of minutes in a day, used to wrap clock times when matching time windows.
pub const MINUTES_PER_DAY: f64 = 1440.;
