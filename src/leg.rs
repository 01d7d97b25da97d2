use std::fmt;

use super::{FarePeriodId, StopId, TripId};


#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum LegMode {
    Access,
    Egress,
    Transfer,
    Transit,
}

impl LegMode {
    pub fn is_transit(&self) -> bool {
        return *self == LegMode::Transit;
    }
}

impl fmt::Display for LegMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            LegMode::Access => "access",
            LegMode::Egress => "egress",
            LegMode::Transfer => "transfer",
            LegMode::Transit => "transit",
        };
        write!(f, "{}", name)
    }
}

/// Identifies the link a leg travels on, independent of its times and costs.  A bucket
/// holds at most one leg per key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct LegKey {
    pub mode: LegMode,
    pub trip_id: TripId,
    pub succpred: StopId,
    pub seq: Option<u32>,
    pub seq_succpred: Option<u32>,
}

/// One way of continuing from a stop, as stored in a hyperlink.
///
/// Legs are built during labeling, whose direction decides the meaning of the time fields.
/// When labeling outbound (backwards from the destination) `deparr_time` is the departure
/// from the stop the leg is stored at and `succpred` is the successor stop; when labeling
/// inbound (forwards from the origin) `deparr_time` is the arrival at the stop and
/// `succpred` is the predecessor.  `arrdep_time` is the time at the other end.
#[derive(Clone, PartialEq, Debug)]
pub struct CandidateLeg {
    pub deparr_time: f64,
    pub mode: LegMode,
    /// the trip id for transit legs, the supply mode id otherwise
    pub trip_id: TripId,
    pub succpred: StopId,
    /// stop sequence of this end of a transit leg
    pub seq: Option<u32>,
    /// stop sequence of the other end of a transit leg
    pub seq_succpred: Option<u32>,
    /// minutes; for transit legs this is in-vehicle time plus wait
    pub link_time: f64,
    pub link_fare: f64,
    pub link_cost: f64,
    pub link_dist: f64,
    /// in-vehicle time weight used to turn fare into generalized cost
    pub link_ivtwt: f64,
    /// cumulative cost to the end of the search, including this leg
    pub cost: f64,
    pub iteration: u32,
    pub arrdep_time: f64,
    pub fare_period: Option<FarePeriodId>,
}

impl CandidateLeg {
    pub fn key(&self) -> LegKey {
        return LegKey {
            mode: self.mode,
            trip_id: self.trip_id,
            succpred: self.succpred,
            seq: self.seq,
            seq_succpred: self.seq_succpred,
        };
    }

    pub fn is_trip(&self) -> bool {
        return self.mode.is_transit();
    }

    /// The stop this leg leaves from, given the stop it is stored at.
    pub fn from_stop(&self, stored_at: StopId, outbound: bool) -> StopId {
        if outbound {
            return stored_at;
        }
        return self.succpred;
    }

    pub fn to_stop(&self, stored_at: StopId, outbound: bool) -> StopId {
        if outbound {
            return self.succpred;
        }
        return stored_at;
    }

    pub fn departure_time(&self, outbound: bool) -> f64 {
        if outbound {
            return self.deparr_time;
        }
        return self.arrdep_time;
    }

    pub fn arrival_time(&self, outbound: bool) -> f64 {
        if outbound {
            return self.arrdep_time;
        }
        return self.deparr_time;
    }

    pub fn set_times(&mut self, departure: f64, arrival: f64, outbound: bool) {
        if outbound {
            self.deparr_time = departure;
            self.arrdep_time = arrival;
        } else {
            self.deparr_time = arrival;
            self.arrdep_time = departure;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::walk_leg;

    #[test]
    fn test_endpoints() {
        // outbound: stored at the from-stop, succpred is the to-stop
        let mut leg = walk_leg(LegMode::Transfer, 20, 100., 105., 5.);
        assert_eq!(leg.from_stop(10, true), 10);
        assert_eq!(leg.to_stop(10, true), 20);
        assert_eq!(leg.departure_time(true), 100.);
        assert_eq!(leg.arrival_time(true), 105.);

        // inbound: stored at the to-stop, succpred is the from-stop
        leg.deparr_time = 105.;
        leg.arrdep_time = 100.;
        assert_eq!(leg.from_stop(10, false), 20);
        assert_eq!(leg.to_stop(10, false), 10);
        assert_eq!(leg.departure_time(false), 100.);
        assert_eq!(leg.arrival_time(false), 105.);

        leg.set_times(110., 115., false);
        assert_eq!(leg.deparr_time, 115.);
        assert_eq!(leg.departure_time(false), 110.);
    }

    #[test]
    fn test_key_ignores_times() {
        let aa = walk_leg(LegMode::Access, 1, 95., 100., 5.);
        let mut bb = aa.clone();
        bb.deparr_time = 80.;
        bb.cost = 12.;
        assert_eq!(aa.key(), bb.key());
        bb.succpred = 2;
        assert_ne!(aa.key(), bb.key());
        assert!(!aa.is_trip());
    }
}
