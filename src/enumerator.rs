use std::collections::HashMap;

use rand::Rng;

use super::config::PathfinderConfig;
use super::error::SearchError;
use super::hyperlink::Hyperlink;
use super::leg::{CandidateLeg, LegMode};
use super::path::{Path, PathInfo, PathSet};
use super::request::SearchRequest;
use super::supply::NetworkSupply;
use super::{StopId, TripId};


/// Allowance for floating-point noise when comparing clock times.
const TIME_EPSILON: f64 = 1e-6;


/// Extracts paths from a labeled hyperlink table, starting at the zone where labeling
/// ended and following each leg's successor or predecessor stop.
pub struct PathEnumerator<'a, S: NetworkSupply + ?Sized> {
    config: &'a PathfinderConfig,
    request: &'a SearchRequest,
    supply: &'a S,
}

/// What the walk so far requires of the next trip boarded.
struct WalkState {
    /// None while the walk has only used walk legs, whose times can slide freely
    time_bound: Option<f64>,
    trips_used: Vec<TripId>,
}

impl<'a, S: NetworkSupply + ?Sized> PathEnumerator<'a, S> {
    pub fn new(config: &'a PathfinderConfig, request: &'a SearchRequest, supply: &'a S)
               -> PathEnumerator<'a, S> {
        return PathEnumerator {
            config,
            request,
            supply,
        };
    }

    fn final_mode(&self) -> LegMode {
        if self.request.outbound() {
            return LegMode::Egress;
        }
        return LegMode::Access;
    }

    /// A trip leg may be taken if it was not already ridden on this path and the traveler
    /// can make it in time.  Walk legs are always feasible.
    fn is_feasible(&self, leg: &CandidateLeg, state: &WalkState) -> bool {
        if leg.mode != LegMode::Transit {
            return true;
        }
        if state.trips_used.contains(&leg.trip_id) {
            return false;
        }
        match state.time_bound {
            None => true,
            Some(bound) if self.request.outbound() => leg.deparr_time >= bound - TIME_EPSILON,
            Some(bound) => leg.deparr_time <= bound + TIME_EPSILON,
        }
    }

    /// Carries the time constraint through a chosen leg.  Enumerating outbound moves
    /// forward in time from the origin; inbound moves backward from the destination.
    fn advance(&self, state: &mut WalkState, stop_id: StopId, leg: &CandidateLeg) {
        let outbound = self.request.outbound();
        if leg.mode == LegMode::Transit {
            state.trips_used.push(leg.trip_id);
            let mut bound = leg.arrdep_time;
            if !outbound && !self.request.hyperpath {
                // a bumped rider at the boarding stop means arriving earlier than the bus
                let bumped = leg.seq_succpred.and_then(|seq| {
                    self.supply.bumped_rider_time(leg.trip_id, seq, leg.succpred)
                });
                if let Some(bump_time) = bumped {
                    bound = bound.min(bump_time - self.config.bump_buffer);
                }
            }
            state.time_bound = Some(bound);
        } else {
            let walk = leg.link_time;
            state.time_bound = state.time_bound.map(|tt| if outbound {
                tt + walk
            } else {
                tt - walk
            });
        }
        log::trace!("enumerated {} leg at stop {}", leg.mode, stop_id);
    }

    /// Follows the lowest-cost feasible leg from each bucket.
    pub fn deterministic_path(&self, hyperlinks: &HashMap<StopId, Hyperlink>)
                              -> Result<Path, SearchError> {
        let start = self.request.end_zone();
        let unreachable = SearchError::DestinationUnreachable(start);
        let final_mode = self.final_mode();
        let mut path = Path::new(self.request.outbound());
        let mut state = WalkState { time_bound: None, trips_used: vec![] };
        let mut stop_id = start;
        let mut is_trip = false;

        loop {
            if path.len() >= self.config.max_path_legs {
                return Err(unreachable);
            }
            let hyperlink = match hyperlinks.get(&stop_id) {
                Some(hl) => hl,
                None => return Err(unreachable),
            };
            let leg = match hyperlink.lowest_cost_where(is_trip,
                                                        |ll| self.is_feasible(ll, &state)) {
                Some(leg) => leg.clone(),
                None => return Err(unreachable),
            };
            self.advance(&mut state, stop_id, &leg);
            let next_stop = leg.succpred;
            let done = leg.mode == final_mode;
            is_trip = !leg.is_trip();
            path.push(stop_id, leg);
            if done {
                break;
            }
            stop_id = next_stop;
        }

        path.finalize();
        path.calculate_cost(self.supply, self.request.value_of_time);
        return Ok(path);
    }

    /// One randomized walk.  None if it reaches a stop with no feasible continuation.
    fn sample_path<R: Rng>(&self, hyperlinks: &mut HashMap<StopId, Hyperlink>, rng: &mut R)
                           -> Option<Path> {
        let final_mode = self.final_mode();
        let mut path = Path::new(self.request.outbound());
        let mut state = WalkState { time_bound: None, trips_used: vec![] };
        let mut stop_id = self.request.end_zone();
        let mut is_trip = false;

        loop {
            if path.len() >= self.config.max_path_legs {
                return None;
            }
            let hyperlink = hyperlinks.get_mut(&stop_id)?;
            let total = hyperlink.setup_probabilities(is_trip,
                                                      |ll| self.is_feasible(ll, &state));
            if total == 0 {
                return None;
            }
            let draw = rng.gen_range(0..total);
            let leg = hyperlink.choose_state(is_trip, draw)?.clone();
            self.advance(&mut state, stop_id, &leg);
            let next_stop = leg.succpred;
            let done = leg.mode == final_mode;
            is_trip = !leg.is_trip();
            path.push(stop_id, leg);
            if done {
                break;
            }
            stop_id = next_stop;
        }

        path.finalize();
        path.calculate_cost(self.supply, self.request.value_of_time);
        return Some(path);
    }

    /// Draws `stochastic_pathset_size` paths and turns the distinct ones into a path set.
    pub fn stochastic_path_set<R: Rng>(&self, hyperlinks: &mut HashMap<StopId, Hyperlink>,
                                       rng: &mut R) -> Result<PathSet, SearchError> {
        let start = self.request.end_zone();
        if !hyperlinks.contains_key(&start) {
            return Err(SearchError::DestinationUnreachable(start));
        }

        let attempts = self.config.stochastic_pathset_size;
        let mut candidates: Vec<PathInfo> = vec![];
        let mut index_by_key = HashMap::new();
        let mut dead_ends = 0;
        for _ in 0..attempts {
            let path = match self.sample_path(hyperlinks, rng) {
                Some(path) => path,
                None => {
                    dead_ends += 1;
                    continue;
                }
            };
            let key = path.key();
            match index_by_key.get(&key) {
                Some(&idx) => {
                    let info: &mut PathInfo = &mut candidates[idx];
                    info.count += 1;
                }
                None => {
                    index_by_key.insert(key, candidates.len());
                    candidates.push(PathInfo::new(path));
                }
            }
        }
        log::debug!("{} distinct paths from {} attempts, {} dead ends", candidates.len(),
                    attempts, dead_ends);

        if candidates.is_empty() {
            return Err(SearchError::NoPathsGenerated(attempts));
        }
        return PathSet::from_candidates(candidates, self.config);
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::hyperlink::HyperlinkParams;
    use crate::request::Direction;
    use crate::test_utils::{transit_leg, two_stop_supply, walk_leg};
    use rand::SeedableRng;
    use rand_isaac::Isaac64Rng;

    /// Labels for the two-stop network as inbound labeling leaves them, with a second,
    /// slower trip that is cheaper.
    fn inbound_hyperlinks(hyperpath: bool) -> HashMap<StopId, Hyperlink> {
        let params = HyperlinkParams {
            outbound: false,
            hyperpath,
            time_window: 30.,
            dispersion: 1.,
        };
        let mut hyperlinks = HashMap::new();
        let mut stop_a = Hyperlink::new(10, params);
        stop_a.add(walk_leg(LegMode::Access, 1, 100., 95., 5.));
        hyperlinks.insert(10, stop_a);

        let mut stop_b = Hyperlink::new(20, params);
        stop_b.add(transit_leg(1000, 10, 120., 100., 25.));
        stop_b.add(transit_leg(1001, 10, 125., 110., 22.));
        hyperlinks.insert(20, stop_b);

        let mut dest = Hyperlink::new(2, params);
        let label = hyperlinks[&20].label(true);
        dest.add(walk_leg(LegMode::Egress, 20, 125., 120., label + 5.));
        hyperlinks.insert(2, dest);
        return hyperlinks;
    }

    #[test]
    fn test_deterministic_walk() {
        let supply = two_stop_supply();
        let config = PathfinderConfig::default();
        let request = SearchRequest::new(1, 2, Direction::Inbound, 95.);
        let enumerator = PathEnumerator::new(&config, &request, &supply);
        let hyperlinks = inbound_hyperlinks(false);
        let path = enumerator.deterministic_path(&hyperlinks).unwrap();
        assert_eq!(path.stop_sequence(), vec![1, 10, 20, 2]);
        // the cheaper trip wins
        assert_eq!(path.trips(), vec![1001]);
    }

    #[test]
    fn test_missing_start_is_unreachable() {
        let supply = two_stop_supply();
        let config = PathfinderConfig::default();
        let request = SearchRequest::new(1, 3, Direction::Inbound, 95.);
        let enumerator = PathEnumerator::new(&config, &request, &supply);
        let mut hyperlinks = inbound_hyperlinks(true);
        assert_eq!(enumerator.deterministic_path(&hyperlinks).err(),
                   Some(SearchError::DestinationUnreachable(3)));
        let mut rng = Isaac64Rng::seed_from_u64(1);
        assert_eq!(enumerator.stochastic_path_set(&mut hyperlinks, &mut rng).err(),
                   Some(SearchError::DestinationUnreachable(3)));
    }

    #[test]
    fn test_stochastic_set() {
        let supply = two_stop_supply();
        let mut config = PathfinderConfig::default();
        config.stochastic_pathset_size = 1000;
        let mut request = SearchRequest::new(1, 2, Direction::Inbound, 95.);
        request.hyperpath = true;
        let enumerator = PathEnumerator::new(&config, &request, &supply);
        let mut hyperlinks = inbound_hyperlinks(true);
        let mut rng = Isaac64Rng::seed_from_u64(100);
        let set = enumerator.stochastic_path_set(&mut hyperlinks, &mut rng).unwrap();
        assert_eq!(set.len(), 2);
        let draws: u32 = set.iter().map(|pi| pi.count).sum();
        assert_eq!(draws, 1000);
        assert_eq!(set.best().map(|pp| pp.trips()), Some(vec![1001]));
        approx::assert_relative_eq!(set.total_probability(), 1., epsilon = 1e-12);
    }

    #[test]
    fn test_dead_ends() {
        let supply = two_stop_supply();
        let mut config = PathfinderConfig::default();
        config.stochastic_pathset_size = 10;
        let request = SearchRequest::new(1, 2, Direction::Inbound, 95.);
        let enumerator = PathEnumerator::new(&config, &request, &supply);
        let mut hyperlinks = inbound_hyperlinks(true);
        // nothing leads on from stop A
        hyperlinks.remove(&10);
        let mut rng = Isaac64Rng::seed_from_u64(1);
        assert_eq!(enumerator.stochastic_path_set(&mut hyperlinks, &mut rng).err(),
                   Some(SearchError::NoPathsGenerated(10)));
        assert_eq!(enumerator.deterministic_path(&hyperlinks).err(),
                   Some(SearchError::DestinationUnreachable(2)));
    }
}
