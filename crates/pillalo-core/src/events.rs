//! Bounded usage log and the admin statistics derived from it.

use std::collections::{BTreeMap, HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Search,
    OrderLink,
    CartCheckout,
    CatalogRefresh,
}

#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub at: DateTime<Utc>,
    pub kind: EventKind,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchTerm {
    pub term: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct UsageStats {
    pub total_events: usize,
    /// Events dropped because the log was full.
    pub evicted_events: u64,
    pub counts: BTreeMap<EventKind, usize>,
    pub top_searches: Vec<SearchTerm>,
    pub first_event_at: Option<DateTime<Utc>>,
    pub last_event_at: Option<DateTime<Utc>>,
}

/// Events kept by [`EventLog::new`].
pub const DEFAULT_EVENT_CAPACITY: usize = 10_000;

/// In-memory event log holding at most `capacity` events. Once full, the
/// oldest event is dropped for each new one.
#[derive(Debug)]
pub struct EventLog {
    events: VecDeque<Event>,
    capacity: usize,
    evicted: u64,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A log that keeps the most recent `capacity` events (at least one).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
            evicted: 0,
        }
    }

    pub fn record(&mut self, kind: EventKind, detail: impl Into<String>) {
        self.record_at(Utc::now(), kind, detail);
    }

    pub fn record_at(&mut self, at: DateTime<Utc>, kind: EventKind, detail: impl Into<String>) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.evicted += 1;
        }
        self.events.push_back(Event {
            at,
            kind,
            detail: detail.into(),
        });
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Summarizes the log. Search terms are lowercased and trimmed before
    /// counting; the `top_n` most frequent are returned, ties broken
    /// alphabetically.
    #[must_use]
    pub fn stats(&self, top_n: usize) -> UsageStats {
        let mut counts: BTreeMap<EventKind, usize> = BTreeMap::new();
        let mut terms: HashMap<String, usize> = HashMap::new();

        for event in &self.events {
            *counts.entry(event.kind).or_default() += 1;
            if event.kind == EventKind::Search {
                let term = event.detail.trim().to_lowercase();
                if !term.is_empty() {
                    *terms.entry(term).or_default() += 1;
                }
            }
        }

        let mut top_searches: Vec<SearchTerm> = terms
            .into_iter()
            .map(|(term, count)| SearchTerm { term, count })
            .collect();
        top_searches.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));
        top_searches.truncate(top_n);

        UsageStats {
            total_events: self.events.len(),
            evicted_events: self.evicted,
            counts,
            top_searches,
            first_event_at: self.events.iter().map(|e| e.at).min(),
            last_event_at: self.events.iter().map(|e| e.at).max(),
        }
    }
}
