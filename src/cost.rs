use std::collections::HashMap;

use super::ModeId;


/// Attribute name to weight, for one supply mode.
pub type Weights = HashMap<String, f64>;
/// Attribute name to value, for one link.
pub type Attributes = HashMap<String, f64>;

pub const TIME_MIN: &str = "time_min";
pub const DIST: &str = "dist";
pub const IN_VEHICLE_TIME: &str = "in_vehicle_time";
pub const WAIT_TIME: &str = "wait_time";
pub const OVERCAP: &str = "overcap";
pub const FARE: &str = "fare";
pub const TRANSFER_PENALTY: &str = "transfer_penalty";


/// Generalized cost of links.  Costs are linear in weighted attributes, with fare
/// converted to minutes of in-vehicle time through the traveler's value of time.
#[derive(Clone, Debug)]
pub struct CostModel {
    zero_walk_transfer: Attributes,
}

impl CostModel {
    pub fn new() -> CostModel {
        let mut zero_walk_transfer = Attributes::new();
        zero_walk_transfer.insert(TIME_MIN.to_string(), 0.);
        zero_walk_transfer.insert(DIST.to_string(), 0.);
        zero_walk_transfer.insert(TRANSFER_PENALTY.to_string(), 1.);
        return CostModel {
            zero_walk_transfer,
        };
    }

    /// Attributes of the transfer from a stop to itself.
    pub fn zero_walk_transfer_attributes(&self) -> &Attributes {
        return &self.zero_walk_transfer;
    }

    /// Sums weight * value over the configured weights.  Weighted attributes missing from
    /// the link count as zero.  A fare attribute is converted with the in-vehicle time
    /// weight rather than its own.
    pub fn tally_link_cost(&self, supply_mode: ModeId, weights: &Weights,
                           attributes: &Attributes, value_of_time: f64) -> f64 {
        let mut cost = 0.;
        for (name, weight) in weights {
            if name == FARE {
                continue;
            }
            match attributes.get(name) {
                Some(value) => cost += weight * value,
                None => log::warn!("supply mode {} has no attribute {} for weight {}",
                                   supply_mode, name, weight),
            }
        }

        if let (Some(fare), Some(ivt_weight)) = (attributes.get(FARE),
                                                 weights.get(IN_VEHICLE_TIME)) {
            cost += CostModel::fare_to_cost(*fare, *ivt_weight, value_of_time);
        }
        return cost;
    }

    /// Fare in currency units to generalized cost.  Value of time is per hour.
    pub fn fare_to_cost(fare: f64, ivt_weight: f64, value_of_time: f64) -> f64 {
        return (60. / value_of_time) * ivt_weight * fare;
    }
}

impl Default for CostModel {
    fn default() -> CostModel {
        CostModel::new()
    }
}
