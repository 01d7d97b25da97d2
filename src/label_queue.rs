use std::cmp::Ordering;

use priority_queue::PriorityQueue;

use super::StopId;


#[derive(Clone, Copy, Debug)]
struct LabelPriority {
    label: f64,
    stop_id: StopId,
    is_trip: bool,
}

impl Ord for LabelPriority {
    fn cmp(&self, other: &Self) -> Ordering {
        // reverse the ordering so the priority queue pops the lowest label first.
        // NaN labels sort last.
        match (self.label.is_nan(), other.label.is_nan()) {
            (true, true) => (),
            (true, false) => return Ordering::Less,
            (false, true) => return Ordering::Greater,
            (false, false) => {
                if self.label < other.label {
                    return Ordering::Greater;
                } else if self.label > other.label {
                    return Ordering::Less;
                }
            }
        }
        // break ties by stop id, then non-trip buckets before trip buckets
        return other.stop_id.cmp(&self.stop_id)
            .then_with(|| other.is_trip.cmp(&self.is_trip));
    }
}

// Implementing Ord requires all of the below traits
impl PartialOrd for LabelPriority {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        return Some(self.cmp(other));
    }
}

impl PartialEq for LabelPriority {
    fn eq(&self, other: &Self) -> bool {
        return self.cmp(other) == Ordering::Equal;
    }
}

impl Eq for LabelPriority {}


#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelEntry {
    pub label: f64,
    pub stop_id: StopId,
    pub is_trip: bool,
}

/// Min-priority queue of stop buckets waiting to be processed.  A bucket is queued again
/// every time its label changes, so it may be present several times with different labels;
/// the labeler re-reads the current label when an entry is popped.
pub struct LabelQueue {
    // keyed by push order so repeated pushes of one bucket are separate entries
    queue: PriorityQueue<usize, LabelPriority>,
    num_pushes: usize,
}

impl LabelQueue {
    pub fn new() -> LabelQueue {
        return LabelQueue {
            queue: PriorityQueue::new(),
            num_pushes: 0,
        };
    }

    pub fn push(&mut self, stop_id: StopId, is_trip: bool, label: f64) {
        let priority = LabelPriority { label, stop_id, is_trip };
        self.queue.push(self.num_pushes, priority);
        self.num_pushes += 1;
    }

    pub fn pop(&mut self) -> Option<LabelEntry> {
        return self.queue.pop().map(|(_, pp)| LabelEntry {
            label: pp.label,
            stop_id: pp.stop_id,
            is_trip: pp.is_trip,
        });
    }

    pub fn len(&self) -> usize {
        return self.queue.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.queue.is_empty();
    }

    /// Total pushes over the queue's lifetime.
    pub fn num_pushes(&self) -> usize {
        return self.num_pushes;
    }
}

impl Default for LabelQueue {
    fn default() -> LabelQueue {
        LabelQueue::new()
    }
}
