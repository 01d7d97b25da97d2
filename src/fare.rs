use std::collections::HashMap;

use super::{FarePeriodId, FareZoneId, RouteId, MINUTES_PER_DAY};


#[derive(Clone, Debug, PartialEq)]
pub struct FarePeriod {
    pub name: String,
    pub route_id: Option<RouteId>,
    pub origin_zone: Option<FareZoneId>,
    pub destination_zone: Option<FareZoneId>,
    pub price: f64,
    /// minutes after midnight; the window may wrap past midnight when end < start
    pub start_time: f64,
    pub end_time: f64,
    /// number of free transfers within this fare period
    pub transfers: u32,
    /// minutes after the first boarding during which free transfers apply.  None = any time.
    pub transfer_duration: Option<f64>,
}

impl FarePeriod {
    pub fn is_valid_at(&self, time: f64) -> bool {
        let time = time.rem_euclid(MINUTES_PER_DAY);
        if self.start_time <= self.end_time {
            return self.start_time <= time && time < self.end_time;
        }
        return time >= self.start_time || time < self.end_time;
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FareTransferType {
    Free,
    Discount(f64),
    Surcharge(f64),
}

impl FareTransferType {
    /// The price of the second boarding under this rule.  Never negative.
    pub fn apply(&self, price: f64) -> f64 {
        let fare = match self {
            FareTransferType::Free => 0.,
            FareTransferType::Discount(amount) => price - amount,
            FareTransferType::Surcharge(amount) => price + amount,
        };
        return fare.max(0.);
    }
}

type FareKey = (Option<RouteId>, Option<FareZoneId>, Option<FareZoneId>);

/// Fare periods indexed by (route, origin zone, destination zone), where None is a wildcard,
/// plus the transfer rules between periods.
#[derive(Clone, Debug, Default)]
pub struct FareTable {
    periods: Vec<FarePeriod>,
    by_key: HashMap<FareKey, Vec<FarePeriodId>>,
    transfer_rules: HashMap<(FarePeriodId, FarePeriodId), FareTransferType>,
}

impl FareTable {
    pub fn new() -> FareTable {
        return FareTable::default();
    }

    pub fn add_period(&mut self, period: FarePeriod) -> FarePeriodId {
        let id = self.periods.len();
        let key = (period.route_id, period.origin_zone, period.destination_zone);
        self.by_key.entry(key).or_insert(vec![]).push(id);
        self.periods.push(period);
        return id;
    }

    pub fn add_transfer_rule(&mut self, from: FarePeriodId, to: FarePeriodId,
                             rule: FareTransferType) {
        self.transfer_rules.insert((from, to), rule);
    }

    pub fn period(&self, id: FarePeriodId) -> Option<&FarePeriod> {
        return self.periods.get(id);
    }

    pub fn transfer_rule(&self, from: FarePeriodId, to: FarePeriodId)
                         -> Option<FareTransferType> {
        return self.transfer_rules.get(&(from, to)).copied();
    }

    pub fn len(&self) -> usize {
        return self.periods.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.periods.is_empty();
    }

    /// Finds the fare period for a ride, trying the most specific key first:
    /// route and zones, then route only, then zones only, then the general fare.
    pub fn fare_period(&self, route_id: RouteId, origin_zone: Option<FareZoneId>,
                       destination_zone: Option<FareZoneId>, time: f64)
                       -> Option<FarePeriodId> {
        let mut keys = vec![];
        if origin_zone.is_some() && destination_zone.is_some() {
            keys.push((Some(route_id), origin_zone, destination_zone));
        }
        keys.push((Some(route_id), None, None));
        if origin_zone.is_some() && destination_zone.is_some() {
            keys.push((None, origin_zone, destination_zone));
        }
        keys.push((None, None, None));

        for key in keys {
            if let Some(ids) = self.by_key.get(&key) {
                let found = ids.iter().find(|&&id| self.periods[id].is_valid_at(time));
                if let Some(id) = found {
                    return Some(*id);
                }
            }
        }
        return None;
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fare_period;

    #[test]
    fn test_fallback_order() {
        let mut table = FareTable::new();
        let general = table.add_period(fare_period("general", None, None, 1.));
        let zones = table.add_period(fare_period("zones", None, Some((1, 2)), 2.));
        let route = table.add_period(fare_period("route", Some(500), None, 3.));
        let exact = table.add_period(fare_period("exact", Some(500), Some((1, 2)), 4.));

        assert_eq!(table.fare_period(500, Some(1), Some(2), 480.), Some(exact));
        assert_eq!(table.fare_period(500, Some(2), Some(1), 480.), Some(route));
        assert_eq!(table.fare_period(500, None, Some(2), 480.), Some(route));
        assert_eq!(table.fare_period(600, Some(1), Some(2), 480.), Some(zones));
        assert_eq!(table.fare_period(600, Some(3), Some(2), 480.), Some(general));
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_time_windows() {
        let mut table = FareTable::new();
        let mut peak = fare_period("peak", Some(500), None, 3.);
        peak.start_time = 360.;
        peak.end_time = 540.;
        let peak = table.add_period(peak);
        let mut night = fare_period("night", Some(500), None, 1.);
        night.start_time = 1320.;
        night.end_time = 300.;
        let night = table.add_period(night);

        assert_eq!(table.fare_period(500, None, None, 400.), Some(peak));
        // times past midnight wrap around the service day
        assert_eq!(table.fare_period(500, None, None, 1440. + 400.), Some(peak));
        assert_eq!(table.fare_period(500, None, None, 1400.), Some(night));
        assert_eq!(table.fare_period(500, None, None, 60.), Some(night));
        assert_eq!(table.fare_period(500, None, None, -60.), Some(night));
        assert_eq!(table.fare_period(500, None, None, 600.), None);
    }

    #[test]
    fn test_transfer_rules() {
        assert_eq!(FareTransferType::Free.apply(2.5), 0.);
        assert_eq!(FareTransferType::Discount(1.).apply(2.5), 1.5);
        assert_eq!(FareTransferType::Discount(4.).apply(2.5), 0.);
        assert_eq!(FareTransferType::Surcharge(0.5).apply(2.5), 3.);

        let mut table = FareTable::new();
        let aa = table.add_period(fare_period("aa", Some(1), None, 2.));
        let bb = table.add_period(fare_period("bb", Some(2), None, 2.));
        table.add_transfer_rule(aa, bb, FareTransferType::Discount(1.));
        assert_eq!(table.transfer_rule(aa, bb), Some(FareTransferType::Discount(1.)));
        assert_eq!(table.transfer_rule(bb, aa), None);
    }
}
