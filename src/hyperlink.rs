use super::leg::CandidateLeg;
use super::StopId;


/// Changes in label smaller than this are not worth re-queueing a stop for.
const LABEL_EPSILON: f64 = 1e-9;
/// Integerized probabilities are scaled to this value.
pub const PROB_SCALE: f64 = 2147483647.;


#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HyperlinkParams {
    pub outbound: bool,
    pub hyperpath: bool,
    pub time_window: f64,
    pub dispersion: f64,
}

/// One bucket of legs, kept sorted by `deparr_time`.
#[derive(Clone, Debug)]
struct LinkSet {
    legs: Vec<CandidateLeg>,
    cum_probs: Vec<u64>,
    label: f64,
    process_count: u32,
}

impl LinkSet {
    fn new() -> LinkSet {
        return LinkSet {
            legs: vec![],
            cum_probs: vec![],
            label: f64::INFINITY,
            process_count: 0,
        };
    }

    /// The time at the edge of the window: the latest departure when labeling outbound,
    /// the earliest arrival when labeling inbound.
    fn extremal(&self, outbound: bool) -> Option<&CandidateLeg> {
        if outbound {
            return self.legs.last();
        }
        return self.legs.first();
    }

    fn insert(&mut self, leg: CandidateLeg, params: &HyperlinkParams) {
        self.cum_probs.clear();
        let key = leg.key();
        if let Some(pos) = self.legs.iter().position(|ll| ll.key() == key) {
            let existing = &self.legs[pos];
            if existing.cost == leg.cost && existing.deparr_time == leg.deparr_time {
                return;
            }
            self.legs.remove(pos);
        }

        let window = params.time_window;
        let outbound = params.outbound;
        if let Some(ext) = self.extremal(outbound) {
            let too_far = if outbound {
                leg.deparr_time < ext.deparr_time - window
            } else {
                leg.deparr_time > ext.deparr_time + window
            };
            if too_far {
                return;
            }
        }

        let is_dominated = self.legs.iter().any(|ll| dominates(ll, &leg, params));
        if is_dominated {
            return;
        }

        self.legs.retain(|ll| !dominates(&leg, ll, params));
        let pos = self.legs.partition_point(|ll| ll.deparr_time <= leg.deparr_time);
        self.legs.insert(pos, leg);

        // the extremal time may have moved, leaving old members outside the window
        if let Some(ext_time) = self.extremal(outbound).map(|ll| ll.deparr_time) {
            if outbound {
                self.legs.retain(|ll| ll.deparr_time >= ext_time - window);
            } else {
                self.legs.retain(|ll| ll.deparr_time <= ext_time + window);
            }
        }
    }

    fn compute_label(&self, params: &HyperlinkParams) -> f64 {
        let min_cost = self.legs.iter().map(|ll| ll.cost).fold(f64::INFINITY, f64::min);
        if !params.hyperpath || self.legs.len() < 2 {
            return min_cost;
        }
        // shifted by the minimum so the exponentials cannot underflow to zero
        let theta = params.dispersion;
        let sum: f64 = self.legs.iter().map(|ll| (-theta * (ll.cost - min_cost)).exp()).sum();
        return min_cost - sum.ln() / theta;
    }
}

/// `aa` dominates `bb` if it lies within the window of `bb`, costs no more, and is at least
/// as good in time: leaves no earlier when labeling outbound, arrives no later inbound.
fn dominates(aa: &CandidateLeg, bb: &CandidateLeg, params: &HyperlinkParams) -> bool {
    if (aa.deparr_time - bb.deparr_time).abs() > params.time_window {
        return false;
    }
    if aa.cost > bb.cost {
        return false;
    }
    if params.outbound {
        return aa.deparr_time >= bb.deparr_time;
    }
    return aa.deparr_time <= bb.deparr_time;
}


/// The labeled state of one stop or zone: the legs that continue from it, split into legs
/// that ride a trip and legs that do not.
#[derive(Clone, Debug)]
pub struct Hyperlink {
    stop_id: StopId,
    params: HyperlinkParams,
    trip_set: LinkSet,
    nontrip_set: LinkSet,
}

impl Hyperlink {
    pub fn new(stop_id: StopId, params: HyperlinkParams) -> Hyperlink {
        return Hyperlink {
            stop_id,
            params,
            trip_set: LinkSet::new(),
            nontrip_set: LinkSet::new(),
        };
    }

    fn linkset(&self, is_trip: bool) -> &LinkSet {
        if is_trip {
            return &self.trip_set;
        }
        return &self.nontrip_set;
    }

    fn linkset_mut(&mut self, is_trip: bool) -> &mut LinkSet {
        if is_trip {
            return &mut self.trip_set;
        }
        return &mut self.nontrip_set;
    }

    pub fn stop_id(&self) -> StopId {
        return self.stop_id;
    }

    /// Adds a leg to its bucket, subject to the window and dominance rules.  Returns whether
    /// the bucket's label changed.
    pub fn add(&mut self, leg: CandidateLeg) -> bool {
        let params = self.params;
        let linkset = self.linkset_mut(leg.is_trip());
        let old_label = linkset.label;
        linkset.insert(leg, &params);
        linkset.label = linkset.compute_label(&params);
        if old_label.is_infinite() || linkset.label.is_infinite() {
            return old_label != linkset.label;
        }
        return (linkset.label - old_label).abs() > LABEL_EPSILON;
    }

    pub fn legs(&self, is_trip: bool) -> &[CandidateLeg] {
        return &self.linkset(is_trip).legs;
    }

    pub fn is_empty(&self, is_trip: bool) -> bool {
        return self.linkset(is_trip).legs.is_empty();
    }

    /// The logsum of the bucket's costs in hyperpath mode, the lowest cost otherwise.
    /// Infinite when the bucket is empty.
    pub fn label(&self, is_trip: bool) -> f64 {
        return self.linkset(is_trip).label;
    }

    pub fn lowest_cost(&self, is_trip: bool) -> Option<&CandidateLeg> {
        return self.linkset(is_trip).legs.iter()
            .fold(None, |best: Option<&CandidateLeg>, ll| match best {
                Some(bb) if bb.cost <= ll.cost => Some(bb),
                _ => Some(ll),
            });
    }

    /// The lowest-cost member that satisfies `is_feasible`.
    pub fn lowest_cost_where<F>(&self, is_trip: bool, is_feasible: F) -> Option<&CandidateLeg>
        where F: Fn(&CandidateLeg) -> bool {
        return self.linkset(is_trip).legs.iter()
            .filter(|ll| is_feasible(ll))
            .fold(None, |best: Option<&CandidateLeg>, ll| match best {
                Some(bb) if bb.cost <= ll.cost => Some(bb),
                _ => Some(ll),
            });
    }

    pub fn time_extremal(&self, is_trip: bool) -> Option<&CandidateLeg> {
        return self.linkset(is_trip).extremal(self.params.outbound);
    }

    /// The member a traveler at `target_time` would most plausibly continue with: the
    /// earliest departure at or after it when labeling outbound, the latest arrival at or
    /// before it when labeling inbound.
    pub fn best_guess(&self, is_trip: bool, target_time: f64) -> Option<&CandidateLeg> {
        let legs = &self.linkset(is_trip).legs;
        if self.params.outbound {
            let pos = legs.partition_point(|ll| ll.deparr_time < target_time);
            return legs.get(pos);
        }
        let pos = legs.partition_point(|ll| ll.deparr_time <= target_time);
        if pos == 0 {
            return None;
        }
        return legs.get(pos - 1);
    }

    pub fn process_count(&self, is_trip: bool) -> u32 {
        return self.linkset(is_trip).process_count;
    }

    pub fn increment_process_count(&mut self, is_trip: bool) -> u32 {
        let linkset = self.linkset_mut(is_trip);
        linkset.process_count += 1;
        return linkset.process_count;
    }

    /// Assigns each member a slice of the integerized probability range in proportion to
    /// exp(-theta * cost), over the members passing `is_feasible`.  Infeasible members get
    /// an empty slice.  Returns the total; zero means no member can be chosen.
    pub fn setup_probabilities<F>(&mut self, is_trip: bool, is_feasible: F) -> u64
        where F: Fn(&CandidateLeg) -> bool {
        let theta = self.params.dispersion;
        let linkset = self.linkset_mut(is_trip);
        let feasible: Vec<bool> = linkset.legs.iter().map(|ll| is_feasible(ll)).collect();
        let min_cost = linkset.legs.iter().zip(feasible.iter())
            .filter(|(_, ff)| **ff)
            .map(|(ll, _)| ll.cost)
            .fold(f64::INFINITY, f64::min);

        linkset.cum_probs.clear();
        if min_cost.is_infinite() {
            linkset.cum_probs.resize(linkset.legs.len(), 0);
            return 0;
        }

        let weights: Vec<f64> = linkset.legs.iter().zip(feasible.iter())
            .map(|(ll, ff)| if *ff { (-theta * (ll.cost - min_cost)).exp() } else { 0. })
            .collect();
        let total: f64 = weights.iter().sum();
        let mut cum = 0;
        for ww in weights {
            cum += (ww / total * PROB_SCALE) as u64;
            linkset.cum_probs.push(cum);
        }
        return cum;
    }

    /// Picks the member whose probability slice contains `draw`, which must be below the
    /// total returned by `setup_probabilities`.
    pub fn choose_state(&self, is_trip: bool, draw: u64) -> Option<&CandidateLeg> {
        let linkset = self.linkset(is_trip);
        let pos = linkset.cum_probs.partition_point(|&cp| cp <= draw);
        return linkset.legs.get(pos);
    }
}
