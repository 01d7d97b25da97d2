use super::StopId;


#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Direction {
    /// the preferred time is the arrival at the destination; labeling starts there
    Outbound,
    /// the preferred time is the departure from the origin; labeling starts there
    Inbound,
}

/// One traveler's path-finding query.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchRequest {
    /// used only to label trace output
    pub person_id: String,
    pub trip_list_id: u32,
    pub origin_zone: StopId,
    pub destination_zone: StopId,
    pub direction: Direction,
    /// true for a stochastic hyperpath search, false for a deterministic one
    pub hyperpath: bool,
    /// minutes after midnight
    pub preferred_time: f64,
    /// currency units per hour
    pub value_of_time: f64,
    pub user_class: String,
    pub purpose: String,
    pub access_mode: String,
    pub transit_mode: String,
    pub egress_mode: String,
    pub trace: bool,
    pub iteration: u32,
    pub pathfinding_iteration: u32,
}

impl SearchRequest {
    pub fn new(origin_zone: StopId, destination_zone: StopId, direction: Direction,
               preferred_time: f64) -> SearchRequest {
        return SearchRequest {
            person_id: String::new(),
            trip_list_id: 0,
            origin_zone,
            destination_zone,
            direction,
            hyperpath: false,
            preferred_time,
            value_of_time: 10.,
            user_class: "all".to_string(),
            purpose: "other".to_string(),
            access_mode: "walk".to_string(),
            transit_mode: "transit".to_string(),
            egress_mode: "walk".to_string(),
            trace: false,
            iteration: 1,
            pathfinding_iteration: 1,
        };
    }

    pub fn outbound(&self) -> bool {
        return self.direction == Direction::Outbound;
    }

    /// The zone labeling starts from.
    pub fn start_zone(&self) -> StopId {
        match self.direction {
            Direction::Outbound => self.destination_zone,
            Direction::Inbound => self.origin_zone,
        }
    }

    /// The zone labeling ends at, and where path enumeration begins.
    pub fn end_zone(&self) -> StopId {
        match self.direction {
            Direction::Outbound => self.origin_zone,
            Direction::Inbound => self.destination_zone,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_zones() {
        let mut req = SearchRequest::new(1, 2, Direction::Outbound, 125.);
        assert!(req.outbound());
        assert_eq!(req.start_zone(), 2);
        assert_eq!(req.end_zone(), 1);

        req.direction = Direction::Inbound;
        assert!(!req.outbound());
        assert_eq!(req.start_zone(), 1);
        assert_eq!(req.end_zone(), 2);
    }
}
