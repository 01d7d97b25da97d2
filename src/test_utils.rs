use std::collections::HashMap;
use std::fmt::Debug;

use crate::cost::{Attributes, Weights, DIST, IN_VEHICLE_TIME, TIME_MIN, WAIT_TIME};
use crate::fare::FarePeriod;
use crate::leg::{CandidateLeg, LegMode};
use crate::supply::{AccessLink, DemandModeType, TransitSupply, TripInfo, TripStopTime};
use crate::{FareZoneId, ModeId, RouteId, StopId, TripId};


pub const ORIGIN: StopId = 1;
pub const DESTINATION: StopId = 2;
pub const STOP_A: StopId = 10;
pub const STOP_B: StopId = 20;
pub const WALK_ACCESS: ModeId = 1;
pub const WALK_EGRESS: ModeId = 2;
pub const WALK_TRANSFER: ModeId = 3;
pub const LOCAL_BUS: ModeId = 100;


/// Checks that the contents of two hashmaps are the same.
pub fn compare_hashmaps<KK, VV>(query_map: &HashMap<KK, VV>, true_map: &HashMap<KK, VV>)
    where KK: Debug + Eq + std::hash::Hash,
    VV: Debug + PartialEq,
{
    assert_eq!(query_map.len(), true_map.len());
    for (true_key, true_val) in true_map {
        match query_map.get(true_key) {
            Some(val) => assert_eq!(val, true_val),
            None => assert!(false, "Key {:?} missing!", true_key),
        }
    }
}

pub fn weights_from(pairs: &[(&str, f64)]) -> Weights {
    return pairs.iter().map(|(name, value)| (name.to_string(), *value)).collect();
}

pub fn walk_leg(mode: LegMode, succpred: StopId, deparr_time: f64, arrdep_time: f64,
                cost: f64) -> CandidateLeg {
    return CandidateLeg {
        deparr_time,
        mode,
        trip_id: 1,
        succpred,
        seq: None,
        seq_succpred: None,
        link_time: (arrdep_time - deparr_time).abs(),
        link_fare: 0.,
        link_cost: cost,
        link_dist: 0.,
        link_ivtwt: 0.,
        cost,
        iteration: 0,
        arrdep_time,
        fare_period: None,
    };
}

pub fn transit_leg(trip_id: TripId, succpred: StopId, deparr_time: f64, arrdep_time: f64,
                   cost: f64) -> CandidateLeg {
    return CandidateLeg {
        deparr_time,
        mode: LegMode::Transit,
        trip_id,
        succpred,
        seq: Some(1),
        seq_succpred: Some(2),
        link_time: (arrdep_time - deparr_time).abs(),
        link_fare: 0.,
        link_cost: cost,
        link_dist: 0.,
        link_ivtwt: 1.,
        cost,
        iteration: 0,
        arrdep_time,
        fare_period: None,
    };
}

pub fn fare_period(name: &str, route_id: Option<RouteId>,
                   zones: Option<(FareZoneId, FareZoneId)>, price: f64) -> FarePeriod {
    return FarePeriod {
        name: name.to_string(),
        route_id,
        origin_zone: zones.map(|(oz, _)| oz),
        destination_zone: zones.map(|(_, dz)| dz),
        price,
        start_time: 0.,
        end_time: 1440.,
        transfers: 0,
        transfer_duration: None,
    };
}

pub fn stop_time(seq: u32, stop_id: StopId, arrive_time: f64, depart_time: f64)
                 -> TripStopTime {
    return TripStopTime {
        seq,
        stop_id,
        arrive_time,
        depart_time,
        shape_dist_traveled: (seq - 1) as f64 * 2.,
        overcap: 0.,
    };
}

pub fn trip_info(supply_mode: ModeId, route_id: RouteId) -> TripInfo {
    return TripInfo {
        supply_mode,
        route_id,
        attributes: Attributes::new(),
    };
}

pub fn walk_link(stop_id: StopId, time_min: f64) -> AccessLink {
    let mut attributes = Attributes::new();
    attributes.insert(TIME_MIN.to_string(), time_min);
    attributes.insert(DIST.to_string(), time_min / 20.);
    return AccessLink {
        stop_id,
        start_time: 0.,
        end_time: 1440.,
        attributes,
    };
}

/// Weights of one for in-vehicle time, wait time and walk time, for every demand mode.
pub fn add_unit_weights(supply: &mut TransitSupply) {
    let weights = weights_from(&[(IN_VEHICLE_TIME, 1.), (WAIT_TIME, 1.), (TIME_MIN, 1.)]);
    let modes = vec![
        (DemandModeType::Access, "walk", WALK_ACCESS),
        (DemandModeType::Egress, "walk", WALK_EGRESS),
        (DemandModeType::Transfer, "transfer", WALK_TRANSFER),
        (DemandModeType::Transit, "transit", LOCAL_BUS),
    ];
    for (mode_type, demand_mode, supply_mode) in modes {
        supply.add_weights("all", "other", mode_type, demand_mode, supply_mode,
                           weights.clone());
    }
}

/// Origin zone 1 walks 5 minutes to stop A, trip 1000 runs A (100) to B (120), and stop B
/// walks 5 minutes to destination zone 2.
pub fn two_stop_supply() -> TransitSupply {
    let mut supply = TransitSupply::new();
    supply.add_stop(ORIGIN, "Origin", None);
    supply.add_stop(DESTINATION, "Destination", None);
    supply.add_stop(STOP_A, "A", Some(1));
    supply.add_stop(STOP_B, "B", Some(1));
    supply.add_trip(1000, trip_info(LOCAL_BUS, 500),
                    vec![stop_time(1, STOP_A, 100., 100.), stop_time(2, STOP_B, 120., 120.)]);
    supply.add_access_egress_link(ORIGIN, WALK_ACCESS, walk_link(STOP_A, 5.));
    supply.add_access_egress_link(DESTINATION, WALK_EGRESS, walk_link(STOP_B, 5.));
    add_unit_weights(&mut supply);
    return supply;
}
