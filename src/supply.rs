use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::cost::{Attributes, Weights};
use super::error::SupplyError;
use super::fare::{FarePeriod, FareTable, FareTransferType};
use super::{FarePeriodId, FareZoneId, ModeId, RouteId, StopId, TripId, MINUTES_PER_DAY};


#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DemandModeType {
    Access,
    Egress,
    Transit,
    Transfer,
}

impl fmt::Display for DemandModeType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            DemandModeType::Access => "access",
            DemandModeType::Egress => "egress",
            DemandModeType::Transit => "transit",
            DemandModeType::Transfer => "transfer",
        };
        write!(f, "{}", name)
    }
}

/// One scheduled visit of a trip to a stop.  Times are minutes after midnight.
#[derive(Clone, Debug, PartialEq)]
pub struct TripStopTime {
    /// 1-based position in the trip
    pub seq: u32,
    pub stop_id: StopId,
    pub arrive_time: f64,
    pub depart_time: f64,
    pub shape_dist_traveled: f64,
    /// positive when the vehicle is over capacity on departure from this stop
    pub overcap: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TripInfo {
    pub supply_mode: ModeId,
    pub route_id: RouteId,
    pub attributes: Attributes,
}

/// A link between a zone and a stop, usable within a time-of-day window.
#[derive(Clone, Debug, PartialEq)]
pub struct AccessLink {
    pub stop_id: StopId,
    pub start_time: f64,
    pub end_time: f64,
    pub attributes: Attributes,
}

impl AccessLink {
    pub fn is_valid_at(&self, time: f64) -> bool {
        let time = time.rem_euclid(MINUTES_PER_DAY);
        if self.start_time <= self.end_time {
            return self.start_time <= time && time < self.end_time;
        }
        return time >= self.start_time || time < self.end_time;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct StopInfo {
    pub name: String,
    pub fare_zone: Option<FareZoneId>,
}

/// Read-only view of the transit network that the path-finder searches over.
pub trait NetworkSupply {
    /// The schedule of a trip, ordered by sequence number.
    fn trip_stop_times(&self, trip_id: TripId) -> Option<&[TripStopTime]>;

    /// Every (trip, sequence) visiting a stop.
    fn trips_at_stop(&self, stop_id: StopId) -> &[(TripId, u32)];

    fn trip_info(&self, trip_id: TripId) -> Option<&TripInfo>;

    fn access_egress_links(&self, zone: StopId, supply_mode: ModeId) -> &[AccessLink];

    fn has_access_egress_links(&self, zone: StopId) -> bool;

    /// Transfer links leaving a stop, keyed by the stop they lead to.
    fn transfers_from(&self, stop_id: StopId) -> Option<&BTreeMap<StopId, Attributes>>;

    /// Transfer links arriving at a stop, keyed by the stop they leave from.
    fn transfers_to(&self, stop_id: StopId) -> Option<&BTreeMap<StopId, Attributes>>;

    /// Weights per supply mode for one demand mode.
    fn weights(&self, user_class: &str, purpose: &str, mode_type: DemandModeType,
               demand_mode: &str) -> Option<&BTreeMap<ModeId, Weights>>;

    fn fare_period(&self, route_id: RouteId, origin_zone: Option<FareZoneId>,
                   destination_zone: Option<FareZoneId>, time: f64) -> Option<FarePeriodId>;

    fn fare_period_info(&self, period_id: FarePeriodId) -> Option<&FarePeriod>;

    fn fare_transfer_rule(&self, from: FarePeriodId, to: FarePeriodId)
                          -> Option<FareTransferType>;

    /// The latest time a bumped rider was left waiting to board this trip at this stop.
    fn bumped_rider_time(&self, trip_id: TripId, seq: u32, stop_id: StopId) -> Option<f64>;

    fn stop_info(&self, stop_id: StopId) -> Option<&StopInfo>;
}


type WeightKey = (String, String, DemandModeType, String);

/// The network supply held in memory, filled by the caller through the `add_*` methods.
#[derive(Clone, Debug, Default)]
pub struct TransitSupply {
    stops: HashMap<StopId, StopInfo>,
    trips: HashMap<TripId, (TripInfo, Vec<TripStopTime>)>,
    trips_by_stop: HashMap<StopId, Vec<(TripId, u32)>>,
    access_links: HashMap<(StopId, ModeId), Vec<AccessLink>>,
    transfers_from: HashMap<StopId, BTreeMap<StopId, Attributes>>,
    transfers_to: HashMap<StopId, BTreeMap<StopId, Attributes>>,
    weights: HashMap<WeightKey, BTreeMap<ModeId, Weights>>,
    fares: FareTable,
    bumped_riders: HashMap<(TripId, u32, StopId), f64>,
}

impl TransitSupply {
    pub fn new() -> TransitSupply {
        return TransitSupply::default();
    }

    pub fn add_stop(&mut self, stop_id: StopId, name: &str, fare_zone: Option<FareZoneId>) {
        self.stops.insert(stop_id, StopInfo {
            name: name.to_string(),
            fare_zone,
        });
    }

    /// Adds a trip.  Stop times are sorted by sequence; gaps are reported by `validate`.
    pub fn add_trip(&mut self, trip_id: TripId, info: TripInfo,
                    mut stop_times: Vec<TripStopTime>) {
        stop_times.sort_by_key(|st| st.seq);
        if let Some((_, old_times)) = self.trips.get(&trip_id) {
            for st in old_times {
                if let Some(visits) = self.trips_by_stop.get_mut(&st.stop_id) {
                    visits.retain(|(tid, _)| *tid != trip_id);
                }
            }
        }
        for st in &stop_times {
            self.trips_by_stop.entry(st.stop_id).or_insert(vec![]).push((trip_id, st.seq));
        }
        self.trips.insert(trip_id, (info, stop_times));
    }

    pub fn add_access_egress_link(&mut self, zone: StopId, supply_mode: ModeId,
                                  link: AccessLink) {
        let links = self.access_links.entry((zone, supply_mode)).or_insert(vec![]);
        let pos = links.iter().position(|ll| ll.start_time > link.start_time)
            .unwrap_or(links.len());
        links.insert(pos, link);
    }

    pub fn add_transfer(&mut self, from: StopId, to: StopId, attributes: Attributes) {
        self.transfers_from.entry(from).or_insert(BTreeMap::new())
            .insert(to, attributes.clone());
        self.transfers_to.entry(to).or_insert(BTreeMap::new()).insert(from, attributes);
    }

    pub fn add_weights(&mut self, user_class: &str, purpose: &str, mode_type: DemandModeType,
                       demand_mode: &str, supply_mode: ModeId, weights: Weights) {
        let key = (user_class.to_string(), purpose.to_string(), mode_type,
                   demand_mode.to_string());
        self.weights.entry(key).or_insert(BTreeMap::new()).insert(supply_mode, weights);
    }

    pub fn fares(&self) -> &FareTable {
        return &self.fares;
    }

    pub fn fares_mut(&mut self) -> &mut FareTable {
        return &mut self.fares;
    }

    /// Records a rider who could not board.  The latest recorded time wins.
    pub fn add_bumped_rider(&mut self, trip_id: TripId, seq: u32, stop_id: StopId,
                            time: f64) {
        let entry = self.bumped_riders.entry((trip_id, seq, stop_id)).or_insert(time);
        if time > *entry {
            *entry = time;
        }
    }

    pub fn clear_bumped_riders(&mut self) {
        self.bumped_riders.clear();
    }

    pub fn num_trips(&self) -> usize {
        return self.trips.len();
    }

    /// Checks that every trip's schedule is numbered 1..n without gaps and never goes back
    /// in time.
    pub fn validate(&self) -> Result<(), SupplyError> {
        let mut trip_ids: Vec<&TripId> = self.trips.keys().collect();
        trip_ids.sort();
        for trip_id in trip_ids {
            let stop_times = &self.trips[trip_id].1;
            if stop_times.is_empty() {
                return Err(SupplyError::EmptyTrip(*trip_id));
            }
            let mut prev_depart: Option<f64> = None;
            for (ii, st) in stop_times.iter().enumerate() {
                let expected = ii as u32 + 1;
                if st.seq != expected {
                    return Err(SupplyError::SequenceGap {
                        trip_id: *trip_id,
                        expected,
                        found: st.seq,
                    });
                }
                if st.depart_time < st.arrive_time {
                    return Err(SupplyError::DepartsBeforeArrival {
                        trip_id: *trip_id,
                        seq: st.seq,
                    });
                }
                if let Some(pd) = prev_depart {
                    if st.arrive_time < pd {
                        return Err(SupplyError::TimeTravel {
                            trip_id: *trip_id,
                            seq: st.seq,
                        });
                    }
                }
                prev_depart = Some(st.depart_time);
            }
        }
        log::debug!("validated {} trips over {} stops", self.trips.len(),
                    self.trips_by_stop.len());
        return Ok(());
    }
}

impl NetworkSupply for TransitSupply {
    fn trip_stop_times(&self, trip_id: TripId) -> Option<&[TripStopTime]> {
        return self.trips.get(&trip_id).map(|(_, sts)| sts.as_slice());
    }

    fn trips_at_stop(&self, stop_id: StopId) -> &[(TripId, u32)] {
        match self.trips_by_stop.get(&stop_id) {
            Some(visits) => visits.as_slice(),
            None => &[],
        }
    }

    fn trip_info(&self, trip_id: TripId) -> Option<&TripInfo> {
        return self.trips.get(&trip_id).map(|(info, _)| info);
    }

    fn access_egress_links(&self, zone: StopId, supply_mode: ModeId) -> &[AccessLink] {
        match self.access_links.get(&(zone, supply_mode)) {
            Some(links) => links.as_slice(),
            None => &[],
        }
    }

    fn has_access_egress_links(&self, zone: StopId) -> bool {
        return self.access_links.iter()
            .any(|((zz, _), links)| *zz == zone && !links.is_empty());
    }

    fn transfers_from(&self, stop_id: StopId) -> Option<&BTreeMap<StopId, Attributes>> {
        return self.transfers_from.get(&stop_id);
    }

    fn transfers_to(&self, stop_id: StopId) -> Option<&BTreeMap<StopId, Attributes>> {
        return self.transfers_to.get(&stop_id);
    }

    fn weights(&self, user_class: &str, purpose: &str, mode_type: DemandModeType,
               demand_mode: &str) -> Option<&BTreeMap<ModeId, Weights>> {
        let key = (user_class.to_string(), purpose.to_string(), mode_type,
                   demand_mode.to_string());
        return self.weights.get(&key);
    }

    fn fare_period(&self, route_id: RouteId, origin_zone: Option<FareZoneId>,
                   destination_zone: Option<FareZoneId>, time: f64) -> Option<FarePeriodId> {
        return self.fares.fare_period(route_id, origin_zone, destination_zone, time);
    }

    fn fare_period_info(&self, period_id: FarePeriodId) -> Option<&FarePeriod> {
        return self.fares.period(period_id);
    }

    fn fare_transfer_rule(&self, from: FarePeriodId, to: FarePeriodId)
                          -> Option<FareTransferType> {
        return self.fares.transfer_rule(from, to);
    }

    fn bumped_rider_time(&self, trip_id: TripId, seq: u32, stop_id: StopId) -> Option<f64> {
        return self.bumped_riders.get(&(trip_id, seq, stop_id)).copied();
    }

    fn stop_info(&self, stop_id: StopId) -> Option<&StopInfo> {
        return self.stops.get(&stop_id);
    }
}
