use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_isaac::Isaac64Rng;
use rayon::prelude::*;

use super::config::PathfinderConfig;
use super::cost::{self, Attributes, CostModel, Weights};
use super::enumerator::PathEnumerator;
use super::error::SearchError;
use super::hyperlink::{Hyperlink, HyperlinkParams};
use super::label_queue::LabelQueue;
use super::leg::{CandidateLeg, LegMode};
use super::path::PathSet;
use super::request::SearchRequest;
use super::supply::{DemandModeType, NetworkSupply, TripStopTime};
use super::trace::{LogTrace, NoTrace, TraceSink};
use super::{ModeId, StopId, TripId};


static RAND_SEED: u64 = 100;
/// Labeling stops once the popped label exceeds this multiple of the best terminal bound.
const TERMINAL_COST_FACTOR: f64 = 2.;


#[derive(Clone, Debug, Default, PartialEq)]
pub struct PerformanceInfo {
    pub label_iterations: u32,
    pub num_labeled_stops: usize,
    pub max_process_count: u32,
    pub num_queue_pushes: usize,
    pub labeling_time: Duration,
    pub enumeration_time: Duration,
}

#[derive(Clone, Debug)]
pub struct SearchResult {
    pub error: Option<SearchError>,
    pub path_set: PathSet,
    pub performance: PerformanceInfo,
}

impl SearchResult {
    fn failed(error: SearchError, performance: PerformanceInfo) -> SearchResult {
        return SearchResult {
            error: Some(error),
            path_set: PathSet::new(),
            performance,
        };
    }

    /// 0 on success, otherwise the error's status code.
    pub fn status_code(&self) -> i32 {
        match &self.error {
            Some(err) => err.status_code(),
            None => 0,
        }
    }

    pub fn is_ok(&self) -> bool {
        return self.error.is_none();
    }

    pub fn into_result(self) -> Result<PathSet, SearchError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.path_set),
        }
    }
}


/// Finds paths through a transit network for one traveler at a time.
#[derive(Clone, Debug)]
pub struct PathFinder {
    config: PathfinderConfig,
    cost_model: CostModel,
}

impl PathFinder {
    pub fn new(config: PathfinderConfig) -> PathFinder {
        return PathFinder {
            config,
            cost_model: CostModel::new(),
        };
    }

    pub fn config(&self) -> &PathfinderConfig {
        return &self.config;
    }

    /// Runs one search.  Traced requests log their labeling and paths at debug level.
    pub fn find_path_set<S>(&self, request: &SearchRequest, supply: &S) -> SearchResult
        where S: NetworkSupply + ?Sized {
        if request.trace {
            let mut trace = LogTrace::new(&request.person_id);
            return self.find_path_set_with_trace(request, supply, &mut trace);
        }
        return self.find_path_set_with_trace(request, supply, &mut NoTrace);
    }

    /// Runs one search, reporting events to `trace` if the request asks for tracing.
    pub fn find_path_set_with_trace<S, T>(&self, request: &SearchRequest, supply: &S,
                                          trace: &mut T) -> SearchResult
        where S: NetworkSupply + ?Sized, T: TraceSink {
        let mut performance = PerformanceInfo::default();
        let labeling_start = Instant::now();
        let hyperlinks = {
            let mut labeler = match Labeler::new(&self.config, &self.cost_model, request,
                                                 supply, trace) {
                Ok(labeler) => labeler,
                Err(err) => {
                    log::info!("search for {} from {} to {} failed: {}", request.person_id,
                               request.origin_zone, request.destination_zone, err);
                    return SearchResult::failed(err, performance);
                }
            };
            labeler.run();
            performance.label_iterations = labeler.label_iteration;
            performance.num_queue_pushes = labeler.queue.num_pushes();
            labeler.hyperlinks
        };
        performance.num_labeled_stops = hyperlinks.len();
        performance.max_process_count = hyperlinks.values()
            .map(|hl| hl.process_count(true).max(hl.process_count(false)))
            .max()
            .unwrap_or(0);
        performance.labeling_time = labeling_start.elapsed();

        let enumeration_start = Instant::now();
        let enumerator = PathEnumerator::new(&self.config, request, supply);
        let path_set = if request.hyperpath {
            let mut hyperlinks = hyperlinks;
            let mut rng = Isaac64Rng::seed_from_u64(RAND_SEED);
            enumerator.stochastic_path_set(&mut hyperlinks, &mut rng)
        } else {
            enumerator.deterministic_path(&hyperlinks).map(PathSet::single)
        };
        performance.enumeration_time = enumeration_start.elapsed();

        let path_set = match path_set {
            Ok(path_set) => path_set,
            Err(err) => {
                log::info!("search for {} from {} to {} failed: {}", request.person_id,
                           request.origin_zone, request.destination_zone, err);
                return SearchResult::failed(err, performance);
            }
        };
        if request.trace {
            for info in path_set.iter() {
                trace.path_found(&info.path, info.probability);
            }
        }
        log::debug!("search for {} found {} paths in {} label iterations", request.person_id,
                    path_set.len(), performance.label_iterations);
        return SearchResult {
            error: None,
            path_set,
            performance,
        };
    }

    /// Runs independent searches in parallel over a shared supply.  Results are in the
    /// order of the requests.
    pub fn find_path_sets<S>(&self, requests: &[SearchRequest], supply: &S)
                             -> Vec<SearchResult>
        where S: NetworkSupply + Sync + ?Sized {
        return requests.par_iter()
            .map(|request| self.find_path_set(request, supply))
            .collect();
    }
}


/// Weights for the request's demand modes, by supply mode.
struct ModeWeights<'a> {
    access: &'a BTreeMap<ModeId, Weights>,
    egress: &'a BTreeMap<ModeId, Weights>,
    transit: &'a BTreeMap<ModeId, Weights>,
    transfer: Option<&'a BTreeMap<ModeId, Weights>>,
}

impl<'a> ModeWeights<'a> {
    fn resolve<S>(request: &SearchRequest, supply: &'a S)
                  -> Result<ModeWeights<'a>, SearchError> where S: NetworkSupply + ?Sized {
        let lookup = |mode_type: DemandModeType, demand_mode: &str| {
            supply.weights(&request.user_class, &request.purpose, mode_type, demand_mode)
                .ok_or_else(|| SearchError::NoWeightsConfigured {
                    user_class: request.user_class.clone(),
                    purpose: request.purpose.clone(),
                    mode_type,
                    demand_mode: demand_mode.to_string(),
                })
        };
        let access = lookup(DemandModeType::Access, &request.access_mode)?;
        let egress = lookup(DemandModeType::Egress, &request.egress_mode)?;
        let transit = lookup(DemandModeType::Transit, &request.transit_mode)?;
        let transfer = lookup(DemandModeType::Transfer, "transfer").ok();
        if transfer.is_none() {
            log::warn!("no transfer weights for user class {}, purpose {}; transfers are \
                        disabled", request.user_class, request.purpose);
        }
        return Ok(ModeWeights {
            access,
            egress,
            transit,
            transfer,
        });
    }
}

/// The per-search labeling state.
struct Labeler<'a, S: NetworkSupply + ?Sized, T: TraceSink> {
    config: &'a PathfinderConfig,
    cost_model: &'a CostModel,
    request: &'a SearchRequest,
    supply: &'a S,
    trace: &'a mut T,
    weights: ModeWeights<'a>,
    params: HyperlinkParams,
    hyperlinks: HashMap<StopId, Hyperlink>,
    queue: LabelQueue,
    label_iteration: u32,
    est_max_path_cost: f64,
}

impl<'a, S: NetworkSupply + ?Sized, T: TraceSink> Labeler<'a, S, T> {
    fn new(config: &'a PathfinderConfig, cost_model: &'a CostModel,
           request: &'a SearchRequest, supply: &'a S, trace: &'a mut T)
           -> Result<Labeler<'a, S, T>, SearchError> {
        for zone in [request.start_zone(), request.end_zone()].iter() {
            if !supply.has_access_egress_links(*zone) {
                return Err(SearchError::NoAccessLinks(*zone));
            }
        }
        let weights = ModeWeights::resolve(request, supply)?;
        let params = HyperlinkParams {
            outbound: request.outbound(),
            hyperpath: request.hyperpath,
            time_window: config.time_window,
            dispersion: config.stochastic_dispersion,
        };
        return Ok(Labeler {
            config,
            cost_model,
            request,
            supply,
            trace,
            weights,
            params,
            hyperlinks: HashMap::new(),
            queue: LabelQueue::new(),
            label_iteration: 0,
            est_max_path_cost: f64::INFINITY,
        });
    }

    fn outbound(&self) -> bool {
        return self.request.outbound();
    }

    /// Offers a leg to a stop's hyperlink and queues the bucket if its label changed.
    fn add_leg(&mut self, stop_id: StopId, leg: CandidateLeg, queue: bool) -> bool {
        let params = self.params;
        let hyperlink = self.hyperlinks.entry(stop_id)
            .or_insert_with(|| Hyperlink::new(stop_id, params));
        let is_trip = leg.is_trip();
        let traced = if self.request.trace { Some(leg.clone()) } else { None };
        let changed = hyperlink.add(leg);
        let label = hyperlink.label(is_trip);
        if let Some(leg) = traced {
            self.trace.leg_added(self.label_iteration, stop_id, &leg, changed);
        }
        if changed && queue {
            self.queue.push(stop_id, is_trip, label);
        }
        return changed;
    }

    fn run(&mut self) {
        self.initialize_stop_states();
        let mut last_popped: Option<(StopId, bool)> = None;
        while let Some(entry) = self.queue.pop() {
            let bucket = (entry.stop_id, entry.is_trip);
            if last_popped == Some(bucket) {
                continue;
            }
            last_popped = Some(bucket);

            let hyperlink = match self.hyperlinks.get_mut(&entry.stop_id) {
                Some(hl) => hl,
                None => continue,
            };
            let label = hyperlink.label(entry.is_trip);
            if label > TERMINAL_COST_FACTOR * self.est_max_path_cost {
                log::debug!("label {:.4} exceeds the useful cost bound {:.4}; done labeling",
                            label, self.est_max_path_cost);
                break;
            }
            if self.request.hyperpath {
                if let Some(max_count) = self.config.stochastic_max_stop_process_count {
                    if hyperlink.process_count(entry.is_trip) >= max_count {
                        continue;
                    }
                }
            }
            hyperlink.increment_process_count(entry.is_trip);

            self.label_iteration += 1;
            if self.request.trace {
                self.trace.label_popped(self.label_iteration, &entry);
            }
            if entry.is_trip {
                self.update_stop_states_for_transfers(entry.stop_id);
                self.update_stop_states_for_final_links(entry.stop_id);
            } else {
                self.update_stop_states_for_trips(entry.stop_id);
            }
        }
        log::debug!("labeled {} stops in {} iterations", self.hyperlinks.len(),
                    self.label_iteration);
    }

    /// Seeds the search with the links of the starting zone: egress links when labeling
    /// outbound from the destination, access links when labeling inbound from the origin.
    fn initialize_stop_states(&mut self) {
        let outbound = self.outbound();
        let zone = self.request.start_zone();
        let pref_time = self.request.preferred_time;
        let (mode_weights, mode) = if outbound {
            (self.weights.egress, LegMode::Egress)
        } else {
            (self.weights.access, LegMode::Access)
        };

        for (supply_mode, weights) in mode_weights {
            for link in self.supply.access_egress_links(zone, *supply_mode) {
                let time_min = link.attributes.get(cost::TIME_MIN).copied().unwrap_or(0.);
                let deparr_time = if outbound {
                    pref_time - time_min
                } else {
                    pref_time + time_min
                };
                // the time the traveler is at the stop
                if !link.is_valid_at(deparr_time) {
                    continue;
                }
                let link_cost = self.cost_model.tally_link_cost(
                    *supply_mode, weights, &link.attributes, self.request.value_of_time);
                let leg = CandidateLeg {
                    deparr_time,
                    mode,
                    trip_id: *supply_mode,
                    succpred: zone,
                    seq: None,
                    seq_succpred: None,
                    link_time: time_min,
                    link_fare: 0.,
                    link_cost,
                    link_dist: link.attributes.get(cost::DIST).copied().unwrap_or(0.),
                    link_ivtwt: 0.,
                    cost: link_cost,
                    iteration: self.label_iteration,
                    arrdep_time: pref_time,
                    fare_period: None,
                };
                self.add_leg(link.stop_id, leg, true);
            }
        }
    }

    /// The time and cost a bucket continues with: its lowest-cost leg in deterministic
    /// mode, its extremal time and logsum label in hyperpath mode.
    fn reference_state(&self, stop_id: StopId, is_trip: bool) -> Option<(f64, f64)> {
        let hyperlink = self.hyperlinks.get(&stop_id)?;
        if self.request.hyperpath {
            let extremal = hyperlink.time_extremal(is_trip)?;
            return Some((extremal.deparr_time, hyperlink.label(is_trip)));
        }
        let lowest = hyperlink.lowest_cost(is_trip)?;
        return Some((lowest.deparr_time, lowest.cost));
    }

    /// Walks from the boarding side of `stop_id` to its neighbours: links into the stop
    /// when labeling outbound, links out of it inbound, plus staying at the stop itself.
    fn update_stop_states_for_transfers(&mut self, stop_id: StopId) {
        let outbound = self.outbound();
        let (ref_time, base_cost) = match self.reference_state(stop_id, true) {
            Some(state) => state,
            None => return,
        };
        let (transfer_mode, weights) = match self.weights.transfer
            .and_then(|tw| tw.iter().next()) {
            Some(found) => found,
            None => return,
        };

        let mut neighbours: Vec<(StopId, &Attributes)> =
            vec![(stop_id, self.cost_model.zero_walk_transfer_attributes())];
        let links = if outbound {
            self.supply.transfers_to(stop_id)
        } else {
            self.supply.transfers_from(stop_id)
        };
        if let Some(links) = links {
            neighbours.extend(links.iter().map(|(other, attrs)| (*other, attrs)));
        }

        let zones = [self.request.origin_zone, self.request.destination_zone];
        let mut new_legs = vec![];
        for (other, attrs) in neighbours {
            if other != stop_id && zones.contains(&other) {
                continue;
            }
            let mut attributes = attrs.clone();
            attributes.entry(cost::TRANSFER_PENALTY.to_string()).or_insert(1.);
            let time_min = attributes.get(cost::TIME_MIN).copied().unwrap_or(0.);
            let link_cost = self.cost_model.tally_link_cost(
                *transfer_mode, weights, &attributes, self.request.value_of_time);
            let deparr_time = if outbound { ref_time - time_min } else { ref_time + time_min };
            new_legs.push((other, CandidateLeg {
                deparr_time,
                mode: LegMode::Transfer,
                trip_id: *transfer_mode,
                succpred: stop_id,
                seq: None,
                seq_succpred: None,
                link_time: time_min,
                link_fare: 0.,
                link_cost,
                link_dist: attributes.get(cost::DIST).copied().unwrap_or(0.),
                link_ivtwt: 0.,
                cost: base_cost + link_cost,
                iteration: self.label_iteration,
                arrdep_time: ref_time,
                fare_period: None,
            }));
        }
        for (other, leg) in new_legs {
            self.add_leg(other, leg, true);
        }
    }

    /// Connects `stop_id` to the zone where labeling ends, if they are linked, and
    /// tightens the bound on useful path costs.
    fn update_stop_states_for_final_links(&mut self, stop_id: StopId) {
        let outbound = self.outbound();
        let zone = self.request.end_zone();
        let (ref_time, base_cost) = match self.reference_state(stop_id, true) {
            Some(state) => state,
            None => return,
        };
        let (mode_weights, mode) = if outbound {
            (self.weights.access, LegMode::Access)
        } else {
            (self.weights.egress, LegMode::Egress)
        };

        let mut new_legs = vec![];
        for (supply_mode, weights) in mode_weights {
            let links = self.supply.access_egress_links(zone, *supply_mode);
            for link in links.iter().filter(|ll| ll.stop_id == stop_id) {
                if !link.is_valid_at(ref_time) {
                    continue;
                }
                let time_min = link.attributes.get(cost::TIME_MIN).copied().unwrap_or(0.);
                let link_cost = self.cost_model.tally_link_cost(
                    *supply_mode, weights, &link.attributes, self.request.value_of_time);
                let deparr_time = if outbound {
                    ref_time - time_min
                } else {
                    ref_time + time_min
                };
                new_legs.push(CandidateLeg {
                    deparr_time,
                    mode,
                    trip_id: *supply_mode,
                    succpred: stop_id,
                    seq: None,
                    seq_succpred: None,
                    link_time: time_min,
                    link_fare: 0.,
                    link_cost,
                    link_dist: link.attributes.get(cost::DIST).copied().unwrap_or(0.),
                    link_ivtwt: 0.,
                    cost: base_cost + link_cost,
                    iteration: self.label_iteration,
                    arrdep_time: ref_time,
                    fare_period: None,
                });
            }
        }

        for leg in new_legs {
            // the terminal zone is never expanded, so it is not queued
            self.add_leg(zone, leg, false);
            if let Some(terminal) = self.hyperlinks.get(&zone) {
                let mut bound = terminal.label(false);
                if self.request.hyperpath {
                    let theta = self.config.stochastic_dispersion;
                    bound += (1. / self.config.min_path_probability).ln() / theta;
                }
                if bound < self.est_max_path_cost {
                    self.est_max_path_cost = bound;
                }
            }
        }
    }

    /// Rides trips serving `stop_id` within the time window: backward to the stops they
    /// visited earlier when labeling outbound, forward to later stops inbound.
    fn update_stop_states_for_trips(&mut self, stop_id: StopId) {
        let outbound = self.outbound();
        let hyperpath = self.request.hyperpath;
        let window = self.config.time_window;
        let (ref_time, base_cost) = match self.reference_state(stop_id, false) {
            Some(state) => state,
            None => return,
        };

        let mut new_legs = vec![];
        for (trip_id, seq) in self.supply.trips_at_stop(stop_id) {
            let (trip_id, seq) = (*trip_id, *seq);
            let info = match self.supply.trip_info(trip_id) {
                Some(info) => info,
                None => continue,
            };
            // a supply mode without weights is not available to this traveler
            let weights = match self.weights.transit.get(&info.supply_mode) {
                Some(weights) => weights,
                None => continue,
            };
            let stop_times = match self.supply.trip_stop_times(trip_id) {
                Some(sts) => sts,
                None => continue,
            };
            let here_idx = match seq.checked_sub(1) {
                Some(idx) => idx as usize,
                None => continue,
            };
            let here = match stop_times.get(here_idx) {
                Some(here) => here,
                None => continue,
            };

            let vehicle_time = if outbound { here.arrive_time } else { here.depart_time };
            let in_window = if outbound {
                vehicle_time <= ref_time && vehicle_time >= ref_time - window
            } else {
                vehicle_time >= ref_time && vehicle_time <= ref_time + window
            };
            if !in_window {
                continue;
            }

            // what the traveler does at this stop after (or before) riding
            let (cont_time, cont_cost) = if hyperpath {
                let guess = self.hyperlinks.get(&stop_id)
                    .and_then(|hl| hl.best_guess(false, vehicle_time));
                match guess {
                    Some(leg) => (leg.deparr_time, base_cost),
                    None => continue,
                }
            } else {
                (ref_time, base_cost)
            };
            let wait_here = if outbound {
                cont_time - vehicle_time
            } else {
                vehicle_time - cont_time
            };

            if !outbound && !hyperpath {
                if let Some(bump_time) = self.supply.bumped_rider_time(trip_id, seq, stop_id) {
                    if cont_time > bump_time - self.config.bump_buffer {
                        continue;
                    }
                }
            }

            let others: &[TripStopTime] = if outbound {
                &stop_times[..here_idx]
            } else {
                &stop_times[here_idx + 1..]
            };
            for other in others {
                if other.stop_id == stop_id {
                    continue;
                }
                let (board, alight) = if outbound { (other, here) } else { (here, other) };
                if let Some(leg) = self.build_transit_leg(trip_id, board, alight, wait_here,
                                                          cont_cost, weights) {
                    new_legs.push((other.stop_id, leg));
                }
            }
        }

        for (other, leg) in new_legs {
            self.add_leg(other, leg, true);
        }
    }

    /// A ride on `trip_id` from `board` to `alight`.  The leg is stored at the boarding
    /// stop when labeling outbound and at the alighting stop inbound.
    fn build_transit_leg(&self, trip_id: TripId, board: &TripStopTime, alight: &TripStopTime,
                         wait: f64, cont_cost: f64, weights: &Weights) -> Option<CandidateLeg> {
        let outbound = self.outbound();
        let info = self.supply.trip_info(trip_id)?;
        let in_vehicle_time = alight.arrive_time - board.depart_time;
        let mut wait_time = wait;
        let mut board_time = board.depart_time;

        if outbound && !self.request.hyperpath {
            let bumped = self.supply.bumped_rider_time(trip_id, board.seq, board.stop_id);
            if let Some(bump_time) = bumped {
                let latest = bump_time - self.config.bump_buffer;
                if board_time > latest {
                    wait_time += board_time - latest;
                    board_time = latest;
                }
            }
        }

        let zone_of = |stop: StopId| self.supply.stop_info(stop).and_then(|si| si.fare_zone);
        let fare_period = self.supply.fare_period(info.route_id, zone_of(board.stop_id),
                                                  zone_of(alight.stop_id), board.depart_time);
        let fare = fare_period
            .and_then(|pid| self.supply.fare_period_info(pid))
            .map_or(0., |period| period.price);

        let mut attributes = info.attributes.clone();
        attributes.insert(cost::IN_VEHICLE_TIME.to_string(), in_vehicle_time);
        attributes.insert(cost::WAIT_TIME.to_string(), wait_time);
        attributes.insert(cost::OVERCAP.to_string(), board.overcap.max(0.));
        attributes.insert(cost::FARE.to_string(), fare);
        let link_cost = self.cost_model.tally_link_cost(
            info.supply_mode, weights, &attributes, self.request.value_of_time);

        let (here, other) = if outbound { (board, alight) } else { (alight, board) };
        return Some(CandidateLeg {
            deparr_time: if outbound { board_time } else { alight.arrive_time },
            mode: LegMode::Transit,
            trip_id,
            succpred: other.stop_id,
            seq: Some(here.seq),
            seq_succpred: Some(other.seq),
            link_time: in_vehicle_time + wait_time,
            link_fare: fare,
            link_cost,
            link_dist: (alight.shape_dist_traveled - board.shape_dist_traveled).abs(),
            link_ivtwt: weights.get(cost::IN_VEHICLE_TIME).copied().unwrap_or(0.),
            cost: cont_cost + link_cost,
            iteration: self.label_iteration,
            arrdep_time: if outbound { alight.arrive_time } else { board.depart_time },
            fare_period,
        });
    }
}
