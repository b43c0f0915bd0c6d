use crate::aircraft::{AircraftKind, Callsign, Fleet};
use std::collections::VecDeque;

/// Fuel-remaining percentage at or below which landing becomes urgent.
pub const CRITICAL_FUEL_PERCENT: f64 = 20.0;

/// A queue of aircraft, identified by callsign.
///
/// The two implementations share the container contract but not the
/// ordering policy: the takeoff queue is strict FIFO, the landing queue
/// re-evaluates urgency on every read. Read operations take the fleet
/// because urgency depends on live aircraft state.
pub trait AircraftQueue {
    /// Queue type name as used in the machine-readable encoding.
    fn kind_name(&self) -> &'static str;

    fn add(&mut self, callsign: Callsign);

    /// Removes and returns the aircraft at the front of the queue.
    fn remove(&mut self, fleet: &Fleet) -> Option<Callsign>;

    /// The aircraft that `remove` would return, without removing it.
    fn peek(&self, fleet: &Fleet) -> Option<Callsign>;

    /// Snapshot of the whole queue, front to back, in removal order.
    /// Mutating the returned list does not affect the queue.
    fn in_order(&self, fleet: &Fleet) -> Vec<Callsign>;

    fn contains(&self, callsign: &str) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Human-readable form: `QueueType [cs1, cs2, ..., csN]`.
    fn render(&self, fleet: &Fleet) -> String {
        format!("{} [{}]", self.kind_name(), self.in_order(fleet).join(", "))
    }

    /// Machine-readable form: `QueueType:numAircraft`, followed by a
    /// comma-joined callsign line only when the queue is non-empty.
    fn encode(&self, fleet: &Fleet) -> String {
        let members = self.in_order(fleet);
        let mut encoded = format!("{}:{}", self.kind_name(), members.len());
        if !members.is_empty() {
            encoded.push('\n');
            encoded.push_str(&members.join(","));
        }
        encoded
    }
}

/// Strict FIFO queue of aircraft waiting to take off.
#[derive(Debug, Default)]
pub struct TakeoffQueue {
    queue: VecDeque<Callsign>,
}

impl TakeoffQueue {
    pub fn new() -> TakeoffQueue {
        TakeoffQueue::default()
    }
}

impl AircraftQueue for TakeoffQueue {
    fn kind_name(&self) -> &'static str {
        "TakeoffQueue"
    }

    fn add(&mut self, callsign: Callsign) {
        self.queue.push_back(callsign);
    }

    fn remove(&mut self, _fleet: &Fleet) -> Option<Callsign> {
        self.queue.pop_front()
    }

    fn peek(&self, _fleet: &Fleet) -> Option<Callsign> {
        self.queue.front().cloned()
    }

    fn in_order(&self, _fleet: &Fleet) -> Vec<Callsign> {
        self.queue.iter().cloned().collect()
    }

    fn contains(&self, callsign: &str) -> bool {
        self.queue.iter().any(|cs| &**cs == callsign)
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}

/// Urgency-ordered queue of aircraft waiting in the air to land.
///
/// The front of the queue is recomputed on every read: the first aircraft
/// (by insertion order) in the highest non-empty urgency bucket wins.
/// Buckets, highest first: declared emergency, critically low fuel,
/// passenger aircraft, then plain FIFO.
#[derive(Debug, Default)]
pub struct LandingQueue {
    queue: Vec<Callsign>,
}

impl LandingQueue {
    pub fn new() -> LandingQueue {
        LandingQueue::default()
    }

    /// Index of the aircraft `remove` would return next, over an arbitrary
    /// slice of queued callsigns.
    fn front_of(queue: &[Callsign], fleet: &Fleet) -> Option<usize> {
        if queue.is_empty() {
            return None;
        }
        let position = |pred: &dyn Fn(&crate::aircraft::Aircraft) -> bool| {
            queue
                .iter()
                .position(|cs| fleet.get(cs).is_some_and(pred))
        };
        position(&|a| a.has_emergency())
            .or_else(|| position(&|a| a.fuel_percent_remaining() <= CRITICAL_FUEL_PERCENT))
            .or_else(|| position(&|a| a.kind() == AircraftKind::Passenger))
            .or(Some(0))
    }
}

impl AircraftQueue for LandingQueue {
    fn kind_name(&self) -> &'static str {
        "LandingQueue"
    }

    fn add(&mut self, callsign: Callsign) {
        self.queue.push(callsign);
    }

    fn remove(&mut self, fleet: &Fleet) -> Option<Callsign> {
        Self::front_of(&self.queue, fleet).map(|i| self.queue.remove(i))
    }

    fn peek(&self, fleet: &Fleet) -> Option<Callsign> {
        Self::front_of(&self.queue, fleet).map(|i| self.queue[i].clone())
    }

    /// Linearizes the queue by repeatedly peeling the current winner off a
    /// scratch copy, so duplicate entries each get their own slot.
    fn in_order(&self, fleet: &Fleet) -> Vec<Callsign> {
        let mut scratch = self.queue.clone();
        let mut ordered = Vec::with_capacity(scratch.len());
        while let Some(i) = Self::front_of(&scratch, fleet) {
            ordered.push(scratch.remove(i));
        }
        ordered
    }

    fn contains(&self, callsign: &str) -> bool {
        self.queue.iter().any(|cs| &**cs == callsign)
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aircraft::{Aircraft, AircraftModel};
    use crate::tasks::{Task, TaskList, TaskType};
    use std::sync::Arc;

    fn landing_tasks() -> TaskList {
        let mut list = TaskList::new(vec![
            Task::new(TaskType::Away),
            Task::new(TaskType::Land),
            Task::new(TaskType::Wait),
            Task::load(60),
            Task::new(TaskType::Takeoff),
        ])
        .unwrap();
        list.advance(); // LAND
        list
    }

    fn add_aircraft(fleet: &mut Fleet, callsign: &str, model: AircraftModel, fuel_percent: f64) {
        let fuel = model.fuel_capacity() * fuel_percent / 100.0;
        fleet.insert(Aircraft::new(
            Arc::from(callsign),
            model,
            landing_tasks(),
            fuel,
            0,
        ));
    }

    fn cs(s: &str) -> Callsign {
        Arc::from(s)
    }

    #[test]
    fn test_takeoff_queue_is_fifo_regardless_of_attributes() {
        let mut fleet = Fleet::new();
        add_aircraft(&mut fleet, "X", AircraftModel::Boeing747_8F, 5.0);
        add_aircraft(&mut fleet, "Y", AircraftModel::AirbusA320, 100.0);
        add_aircraft(&mut fleet, "Z", AircraftModel::RobinsonR44, 50.0);
        fleet.get_mut("Y").unwrap().declare_emergency();

        let mut queue = TakeoffQueue::new();
        for callsign in ["X", "Y", "Z"] {
            queue.add(cs(callsign));
        }
        assert_eq!(queue.peek(&fleet).as_deref(), Some("X"));
        assert_eq!(queue.remove(&fleet).as_deref(), Some("X"));
        assert_eq!(queue.remove(&fleet).as_deref(), Some("Y"));
        assert_eq!(queue.remove(&fleet).as_deref(), Some("Z"));
        assert_eq!(queue.remove(&fleet), None);
    }

    #[test]
    fn test_landing_priority_precedence() {
        // freight emergency, then low-fuel freight, then passenger,
        // then plain freight: removal order must follow the buckets.
        let mut fleet = Fleet::new();
        add_aircraft(&mut fleet, "A", AircraftModel::Boeing747_8F, 90.0);
        add_aircraft(&mut fleet, "B", AircraftModel::SikorskySkycrane, 15.0);
        add_aircraft(&mut fleet, "C", AircraftModel::AirbusA320, 80.0);
        add_aircraft(&mut fleet, "D", AircraftModel::Boeing747_8F, 70.0);
        fleet.get_mut("A").unwrap().declare_emergency();

        let mut queue = LandingQueue::new();
        // inserted in a deliberately unhelpful order
        for callsign in ["D", "C", "B", "A"] {
            queue.add(cs(callsign));
        }
        assert_eq!(queue.remove(&fleet).as_deref(), Some("A"));
        assert_eq!(queue.remove(&fleet).as_deref(), Some("B"));
        assert_eq!(queue.remove(&fleet).as_deref(), Some("C"));
        assert_eq!(queue.remove(&fleet).as_deref(), Some("D"));
    }

    #[test]
    fn test_landing_fifo_within_emergency_bucket() {
        let mut fleet = Fleet::new();
        add_aircraft(&mut fleet, "E1", AircraftModel::AirbusA320, 90.0);
        add_aircraft(&mut fleet, "E2", AircraftModel::AirbusA320, 90.0);
        fleet.get_mut("E1").unwrap().declare_emergency();
        fleet.get_mut("E2").unwrap().declare_emergency();

        let mut queue = LandingQueue::new();
        queue.add(cs("E2"));
        queue.add(cs("E1"));
        // E2 was inserted first; both are emergencies
        assert_eq!(queue.peek(&fleet).as_deref(), Some("E2"));
    }

    #[test]
    fn test_landing_peek_does_not_mutate() {
        let mut fleet = Fleet::new();
        add_aircraft(&mut fleet, "A", AircraftModel::AirbusA320, 90.0);
        let mut queue = LandingQueue::new();
        queue.add(cs("A"));
        assert_eq!(queue.peek(&fleet).as_deref(), Some("A"));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_priority_recomputed_per_call() {
        let mut fleet = Fleet::new();
        add_aircraft(&mut fleet, "A", AircraftModel::Boeing747_8F, 90.0);
        add_aircraft(&mut fleet, "B", AircraftModel::Boeing747_8F, 90.0);
        let mut queue = LandingQueue::new();
        queue.add(cs("A"));
        queue.add(cs("B"));
        assert_eq!(queue.peek(&fleet).as_deref(), Some("A"));
        // B declares an emergency while queued
        fleet.get_mut("B").unwrap().declare_emergency();
        assert_eq!(queue.peek(&fleet).as_deref(), Some("B"));
    }

    #[test]
    fn test_in_order_handles_duplicates() {
        let mut fleet = Fleet::new();
        add_aircraft(&mut fleet, "A", AircraftModel::AirbusA320, 90.0);
        add_aircraft(&mut fleet, "B", AircraftModel::Boeing747_8F, 90.0);
        let mut queue = LandingQueue::new();
        queue.add(cs("B"));
        queue.add(cs("A"));
        queue.add(cs("A"));
        let ordered = queue.in_order(&fleet);
        let names: Vec<&str> = ordered.iter().map(|c| &**c).collect();
        // A is a passenger aircraft: both copies outrank the freighter
        assert_eq!(names, ["A", "A", "B"]);
        // the real queue is untouched
        assert_eq!(queue.len(), 3);
    }

    #[test]
    fn test_empty_queues() {
        let fleet = Fleet::new();
        let mut landing = LandingQueue::new();
        let mut takeoff = TakeoffQueue::new();
        assert_eq!(landing.peek(&fleet), None);
        assert_eq!(landing.remove(&fleet), None);
        assert!(landing.in_order(&fleet).is_empty());
        assert_eq!(takeoff.peek(&fleet), None);
        assert_eq!(takeoff.remove(&fleet), None);
        assert!(!landing.contains("A"));
        assert!(!takeoff.contains("A"));
    }

    #[test]
    fn test_encode_and_render() {
        let mut fleet = Fleet::new();
        add_aircraft(&mut fleet, "ABC123", AircraftModel::AirbusA320, 90.0);
        add_aircraft(&mut fleet, "XYZ987", AircraftModel::Boeing747_8F, 90.0);
        let mut queue = TakeoffQueue::new();
        assert_eq!(queue.encode(&fleet), "TakeoffQueue:0");
        assert_eq!(queue.render(&fleet), "TakeoffQueue []");
        queue.add(cs("ABC123"));
        queue.add(cs("XYZ987"));
        assert_eq!(queue.encode(&fleet), "TakeoffQueue:2\nABC123,XYZ987");
        assert_eq!(queue.render(&fleet), "TakeoffQueue [ABC123, XYZ987]");
    }
}
