use std::fmt;

use itertools::Itertools;

use super::config::PathfinderConfig;
use super::cost::CostModel;
use super::error::SearchError;
use super::hyperlink::PROB_SCALE;
use super::leg::{CandidateLeg, LegKey, LegMode};
use super::supply::NetworkSupply;
use super::{StopId, TripId};


/// A sequence of legs from the origin zone to the destination zone.  Each leg is paired
/// with the stop whose hyperlink it was taken from.
#[derive(Clone, Debug, PartialEq)]
pub struct Path {
    outbound: bool,
    legs: Vec<(StopId, CandidateLeg)>,
    cost: f64,
    fare: f64,
}

impl Path {
    pub fn new(outbound: bool) -> Path {
        return Path {
            outbound,
            legs: vec![],
            cost: 0.,
            fare: 0.,
        };
    }

    pub fn push(&mut self, stop_id: StopId, leg: CandidateLeg) {
        self.legs.push((stop_id, leg));
    }

    pub fn legs(&self) -> &[(StopId, CandidateLeg)] {
        return &self.legs;
    }

    pub fn len(&self) -> usize {
        return self.legs.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.legs.is_empty();
    }

    pub fn outbound(&self) -> bool {
        return self.outbound;
    }

    /// Total generalized cost.  Set by `calculate_cost`.
    pub fn cost(&self) -> f64 {
        return self.cost;
    }

    pub fn fare(&self) -> f64 {
        return self.fare;
    }

    pub fn uses_trip(&self, trip_id: TripId) -> bool {
        return self.legs.iter().any(|(_, ll)| ll.mode == LegMode::Transit
                                    && ll.trip_id == trip_id);
    }

    /// Identifies the path by the links it uses, ignoring times and costs.
    pub fn key(&self) -> Vec<(StopId, LegKey)> {
        return self.legs.iter().map(|(stop, ll)| (*stop, ll.key())).collect();
    }

    /// Stops visited in travel order, from the origin zone to the destination zone.
    pub fn stop_sequence(&self) -> Vec<StopId> {
        let mut stops = vec![];
        if let Some((stop, leg)) = self.legs.first() {
            stops.push(leg.from_stop(*stop, self.outbound));
        }
        for (stop, leg) in &self.legs {
            stops.push(leg.to_stop(*stop, self.outbound));
        }
        return stops;
    }

    pub fn trips(&self) -> Vec<TripId> {
        return self.legs.iter()
            .filter(|(_, ll)| ll.mode == LegMode::Transit)
            .map(|(_, ll)| ll.trip_id)
            .collect();
    }

    /// Puts the legs in travel order.  Paths enumerated from the destination come out
    /// reversed.
    pub fn finalize(&mut self) {
        let first_mode = self.legs.first().map(|(_, ll)| ll.mode);
        if first_mode == Some(LegMode::Egress) {
            self.legs.reverse();
        }
        self.retime_walk_legs();
    }

    /// Walk legs carry the times they were labeled with, which need not line up with the
    /// trips chosen around them.  Moves each walk leg to meet its neighbouring trips: the
    /// first leg arrives as the first trip leaves, later walks leave as the previous leg
    /// arrives.
    fn retime_walk_legs(&mut self) {
        let outbound = self.outbound;
        for ii in 0..self.legs.len() {
            if self.legs[ii].1.mode == LegMode::Transit {
                continue;
            }
            let duration = self.legs[ii].1.link_time;
            let departure = if ii == 0 {
                match self.legs.get(1) {
                    Some((_, next)) if next.mode == LegMode::Transit => {
                        next.departure_time(outbound) - duration
                    }
                    _ => continue,
                }
            } else {
                self.legs[ii - 1].1.arrival_time(outbound)
            };
            self.legs[ii].1.set_times(departure, departure + duration, outbound);
        }
    }

    /// Sums the legs' costs after charging each boarding its fare in light of the
    /// boardings before it.  The legs must be in travel order.
    pub fn calculate_cost<S>(&mut self, supply: &S, value_of_time: f64)
        where S: NetworkSupply + ?Sized {
        let mut cost = 0.;
        let mut total_fare = 0.;
        for ii in 0..self.legs.len() {
            let is_fared = self.legs[ii].1.mode == LegMode::Transit
                && self.legs[ii].1.fare_period.is_some();
            if is_fared {
                let (earlier, rest) = self.legs.split_at_mut(ii);
                let leg = &mut rest[0].1;
                let fare = fare_with_transfer(supply, earlier, leg, self.outbound);
                leg.link_cost += CostModel::fare_to_cost(fare - leg.link_fare, leg.link_ivtwt,
                                                         value_of_time);
                leg.link_cost = leg.link_cost.max(0.);
                leg.link_fare = fare;
            }
            cost += self.legs[ii].1.link_cost;
            total_fare += self.legs[ii].1.link_fare;
        }
        self.cost = cost;
        self.fare = total_fare;
    }

    /// A readable rendering of the path using stop names where the supply knows them.
    pub fn describe<S>(&self, supply: &S) -> String where S: NetworkSupply + ?Sized {
        let name = |stop: StopId| match supply.stop_info(stop) {
            Some(info) => info.name.clone(),
            None => stop.to_string(),
        };
        let mut parts = vec![];
        for (stop, leg) in &self.legs {
            let from = name(leg.from_stop(*stop, self.outbound));
            let to = name(leg.to_stop(*stop, self.outbound));
            let how = match leg.mode {
                LegMode::Transit => format!("trip {}", leg.trip_id),
                mode => format!("{} mode {}", mode, leg.trip_id),
            };
            parts.push(format!("{} -> {} by {} ({:.1}-{:.1}, cost {:.2})", from, to, how,
                               leg.departure_time(self.outbound),
                               leg.arrival_time(self.outbound), leg.link_cost));
        }
        return format!("{}; total cost {:.2}", parts.join(", "), self.cost);
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let stops = self.stop_sequence().iter().map(|ss| ss.to_string()).join(" -> ");
        write!(f, "[{}] trips {:?} cost {:.2}", stops, self.trips(), self.cost)
    }
}

/// The fare charged for boarding `leg` after the boardings in `earlier`, which precede
/// it in travel order.
///
/// A transfer rule between the previous boarding's fare period and this one applies
/// first.  Failing that, staying within the same fare period is free while its transfer
/// allowance and duration last.  Otherwise the full price is charged.
pub fn fare_with_transfer<S>(supply: &S, earlier: &[(StopId, CandidateLeg)],
                             leg: &CandidateLeg, outbound: bool) -> f64
    where S: NetworkSupply + ?Sized {
    let period_id = match leg.fare_period {
        Some(pid) => pid,
        None => return 0.,
    };
    let period = match supply.fare_period_info(period_id) {
        Some(period) => period,
        None => return leg.link_fare,
    };

    let mut boardings = earlier.iter().rev()
        .filter(|(_, ll)| ll.mode == LegMode::Transit)
        .map(|(_, ll)| ll);
    let prev = match boardings.next() {
        Some(prev) => prev,
        None => return period.price,
    };
    let prev_period = match prev.fare_period {
        Some(pid) => pid,
        None => return period.price,
    };
    if let Some(rule) = supply.fare_transfer_rule(prev_period, period_id) {
        return rule.apply(period.price);
    }
    if prev_period != period_id {
        return period.price;
    }

    // walk back to the boarding that paid for this fare period
    let mut transfers_used = 1;
    let mut first_board = prev.departure_time(outbound);
    let mut paid = prev.link_fare > 0.;
    for ll in boardings {
        if paid || ll.fare_period != Some(period_id) {
            break;
        }
        transfers_used += 1;
        first_board = ll.departure_time(outbound);
        paid = ll.link_fare > 0.;
    }
    let within_duration = match period.transfer_duration {
        Some(duration) => leg.departure_time(outbound) - first_board <= duration,
        None => true,
    };
    if transfers_used <= period.transfers && within_duration {
        return 0.;
    }
    return period.price;
}


/// A distinct path in a path set, with how often it was drawn and its choice probability.
#[derive(Clone, Debug, PartialEq)]
pub struct PathInfo {
    pub path: Path,
    pub count: u32,
    pub probability: f64,
    /// integerized cumulative probability, used to draw from the set
    pub cum_prob_i: u64,
}

impl PathInfo {
    pub fn new(path: Path) -> PathInfo {
        return PathInfo {
            path,
            count: 1,
            probability: 0.,
            cum_prob_i: 0,
        };
    }
}

/// Distinct paths ordered by descending probability.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PathSet {
    paths: Vec<PathInfo>,
}

impl PathSet {
    pub fn new() -> PathSet {
        return PathSet::default();
    }

    /// A set holding one path that is chosen with certainty.
    pub fn single(path: Path) -> PathSet {
        let mut info = PathInfo::new(path);
        info.probability = 1.;
        info.cum_prob_i = PROB_SCALE as u64;
        return PathSet {
            paths: vec![info],
        };
    }

    /// Assigns logit probabilities over the distinct paths, sorts them most likely first
    /// and drops the tail.  A path is only dropped once `max_num_paths` are kept and its
    /// probability is below `min_path_probability`; the kept probabilities are not
    /// rescaled.
    pub fn from_candidates(candidates: Vec<PathInfo>, config: &PathfinderConfig)
                           -> Result<PathSet, SearchError> {
        let theta = config.stochastic_dispersion;
        let min_cost = candidates.iter().map(|pi| pi.path.cost()).fold(f64::INFINITY,
                                                                        f64::min);
        let weights: Vec<f64> = candidates.iter()
            .map(|pi| (-theta * (pi.path.cost() - min_cost)).exp())
            .collect();
        let total: f64 = weights.iter().sum();

        let ranked = candidates.into_iter().zip(weights.into_iter())
            .map(|(mut pi, ww)| {
                pi.probability = ww / total;
                pi
            })
            .sorted_by(|aa, bb| bb.probability.partial_cmp(&aa.probability)
                       .unwrap_or(std::cmp::Ordering::Equal));

        let mut paths: Vec<PathInfo> = vec![];
        let mut cum = 0;
        for mut info in ranked {
            if let Some(max_paths) = config.max_num_paths {
                if paths.len() >= max_paths && info.probability < config.min_path_probability {
                    break;
                }
            }
            cum += (info.probability * PROB_SCALE) as u64;
            info.cum_prob_i = cum;
            paths.push(info);
        }

        if cum == 0 {
            return Err(SearchError::ZeroPathProbability);
        }
        return Ok(PathSet { paths });
    }

    pub fn len(&self) -> usize {
        return self.paths.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.paths.is_empty();
    }

    pub fn iter(&self) -> std::slice::Iter<PathInfo> {
        return self.paths.iter();
    }

    pub fn get(&self, index: usize) -> Option<&PathInfo> {
        return self.paths.get(index);
    }

    /// The most probable path.
    pub fn best(&self) -> Option<&Path> {
        return self.paths.first().map(|pi| &pi.path);
    }

    pub fn total_probability(&self) -> f64 {
        return self.paths.iter().map(|pi| pi.probability).sum();
    }

    /// Picks a path with a draw from [0, total integerized probability).
    pub fn choose(&self, draw: u64) -> Option<&Path> {
        let pos = self.paths.partition_point(|pi| pi.cum_prob_i <= draw);
        return self.paths.get(pos).map(|pi| &pi.path);
    }
}
