//! Test event stores — mock `EventStore` implementations for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use eventroot_core::error::StoreError;
use eventroot_core::event::DomainEvent;
use eventroot_core::repository::EventStore;

type AppendCall<E> = (String, u64, Vec<E>);

/// An event store that keeps streams in memory, enforces the optimistic
/// concurrency contract, and records every successful `append_events` call.
#[derive(Debug)]
pub struct InMemoryEventStore<E> {
    streams: Mutex<HashMap<String, Vec<E>>>,
    appended: Mutex<Vec<AppendCall<E>>>,
}

impl<E: DomainEvent> InMemoryEventStore<E> {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            streams: Mutex::new(HashMap::new()),
            appended: Mutex::new(Vec::new()),
        }
    }

    /// Create a store with one pre-existing stream. Seeding is not recorded as
    /// an append.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_stream(aggregate_id: impl Into<String>, events: Vec<E>) -> Self {
        let store = Self::new();
        store
            .streams
            .lock()
            .unwrap()
            .insert(aggregate_id.into(), events);
        store
    }

    /// Returns a snapshot of the stream stored for `aggregate_id`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn stream(&self, aggregate_id: &str) -> Vec<E> {
        self.streams
            .lock()
            .unwrap()
            .get(aggregate_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns a snapshot of all successful appends as
    /// `(aggregate_id, expected_version, events)`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn appended_events(&self) -> Vec<AppendCall<E>> {
        self.appended.lock().unwrap().clone()
    }
}

impl<E: DomainEvent> Default for InMemoryEventStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: DomainEvent> EventStore<E> for InMemoryEventStore<E> {
    async fn load_events(&self, aggregate_id: &str) -> Result<Vec<E>, StoreError> {
        Ok(self.stream(aggregate_id))
    }

    async fn append_events(
        &self,
        aggregate_id: &str,
        expected_version: u64,
        events: &[E],
    ) -> Result<(), StoreError> {
        let mut streams = self.streams.lock().unwrap();
        let stream = streams.entry(aggregate_id.to_owned()).or_default();
        let actual = stream.len() as u64;
        if actual != expected_version {
            return Err(StoreError::ConcurrencyConflict {
                aggregate_id: aggregate_id.to_owned(),
                expected: expected_version,
                actual,
            });
        }
        stream.extend_from_slice(events);
        self.appended
            .lock()
            .unwrap()
            .push((aggregate_id.to_owned(), expected_version, events.to_vec()));
        Ok(())
    }
}

/// An event store that always returns an infrastructure error. Useful for
/// testing error-handling paths.
#[derive(Debug)]
pub struct FailingEventStore;

#[async_trait]
impl<E: DomainEvent> EventStore<E> for FailingEventStore {
    async fn load_events(&self, _aggregate_id: &str) -> Result<Vec<E>, StoreError> {
        Err(StoreError::Infrastructure("connection refused".into()))
    }

    async fn append_events(
        &self,
        _aggregate_id: &str,
        _expected_version: u64,
        _events: &[E],
    ) -> Result<(), StoreError> {
        Err(StoreError::Infrastructure("connection refused".into()))
    }
}
