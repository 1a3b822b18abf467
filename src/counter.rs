use crate::event::{Event, EVENTS, EVENT_COUNT};
use serde::{Serialize, Serializer};

/// One counter reading.
///
/// `Missing` is what perf reports as `<not supported>` / `<not counted>`, or
/// any token that is not a count. It serializes as null, never as a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CounterValue {
    Present(u64),
    #[default]
    Missing,
}

impl CounterValue {
    /// Parse a perf count token such as `12,345`.
    pub fn parse(token: &str) -> Self {
        let digits: String = token.chars().filter(|&c| c != ',').collect();
        match digits.parse::<u64>() {
            Ok(v) => CounterValue::Present(v),
            Err(_) => CounterValue::Missing,
        }
    }

    pub fn get(self) -> Option<u64> {
        match self {
            CounterValue::Present(v) => Some(v),
            CounterValue::Missing => None,
        }
    }

    pub fn is_missing(self) -> bool {
        self == CounterValue::Missing
    }
}

impl Serialize for CounterValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.get().serialize(serializer)
    }
}

/// Readings of every sampled event from one run, in `EVENTS` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CounterVector([CounterValue; EVENT_COUNT]);

impl CounterVector {
    pub fn new(values: [CounterValue; EVENT_COUNT]) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[CounterValue; EVENT_COUNT] {
        &self.0
    }

    /// Reading for the event named `name`, if it is one of ours.
    pub fn get(&self, name: &str) -> Option<CounterValue> {
        EVENTS
            .iter()
            .position(|e| e.name == name)
            .map(|i| self.0[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static Event, CounterValue)> + '_ {
        EVENTS.iter().zip(self.0.iter().copied())
    }

    pub fn missing(&self) -> impl Iterator<Item = &'static Event> + '_ {
        self.iter().filter(|(_, v)| v.is_missing()).map(|(e, _)| e)
    }
}
