//! Event store abstraction and aggregate load/save helpers.
//!
//! Storage is a collaborator: this module only states what the core needs
//! from it. Streams are keyed by the aggregate identity's canonical string,
//! and the aggregate's `version` is the optimistic concurrency token.

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::aggregate::AggregateRoot;
use crate::error::{RepositoryError, StoreError};
use crate::event::DomainEvent;

/// Repository trait for loading and appending an aggregate's event stream.
#[async_trait]
pub trait EventStore<E: DomainEvent>: Send + Sync {
    /// Load all events for a given aggregate, in the order they were appended.
    async fn load_events(&self, aggregate_id: &str) -> Result<Vec<E>, StoreError>;

    /// Append new events to an aggregate stream with optimistic concurrency.
    ///
    /// `expected_version` is the number of events the writer loaded.
    /// Implementations must reject the append with
    /// `StoreError::ConcurrencyConflict` when the stream has a different
    /// length.
    async fn append_events(
        &self,
        aggregate_id: &str,
        expected_version: u64,
        events: &[E],
    ) -> Result<(), StoreError>;
}

/// Loads an aggregate by replaying its stored history.
///
/// # Errors
///
/// Returns `StoreError::AggregateNotFound` if the stream is empty, any other
/// store error unchanged, and `ReplayError` if the history cannot be replayed.
#[instrument(skip_all, fields(aggregate_type = A::aggregate_type(), aggregate_id = %id))]
pub async fn load_aggregate<A, S>(store: &S, id: A::Id) -> Result<A, RepositoryError<A::Event>>
where
    A: AggregateRoot,
    S: EventStore<A::Event> + ?Sized,
{
    let key = id.to_string();
    let history = store.load_events(&key).await?;
    if history.is_empty() {
        return Err(StoreError::AggregateNotFound(key).into());
    }
    debug!(events = history.len(), "loaded event stream");
    A::build_from_history(id, history).map_err(RepositoryError::from)
}

/// Appends the aggregate's pending events and commits them.
///
/// Returns the number of events saved. Nothing is appended when no events
/// are pending.
///
/// # Errors
///
/// Returns the store's error. The pending events stay uncommitted so the
/// caller can decide how to abort the unit of work.
#[instrument(skip_all, fields(aggregate_type = A::aggregate_type(), aggregate_id = %aggregate.id()))]
pub async fn save_aggregate<A, S>(store: &S, aggregate: &mut A) -> Result<usize, StoreError>
where
    A: AggregateRoot,
    S: EventStore<A::Event> + ?Sized,
{
    let pending = aggregate.new_events().len();
    if pending == 0 {
        return Ok(0);
    }

    store
        .append_events(
            &aggregate.id().to_string(),
            aggregate.version(),
            aggregate.new_events(),
        )
        .await?;
    aggregate.commit_events();

    debug!(saved = pending, version = aggregate.version(), "saved pending events");
    Ok(pending)
}
