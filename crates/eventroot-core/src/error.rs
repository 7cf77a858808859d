//! Error types for event dispatch, history replay and event storage.

use thiserror::Error;

use crate::event::DomainEvent;

/// Boxed cause carried by aggregate errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The dispatch stage at which applying an event failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackFailure {
    /// The aggregate declares no handler for the event variant.
    MissingHandler,
    /// The handler ran and returned an error.
    Invocation,
}

impl CallbackFailure {
    /// Human-readable description of the failure stage.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            CallbackFailure::MissingHandler => "aggregate has no handler for event",
            CallbackFailure::Invocation => "handler invocation failed",
        }
    }
}

/// Applying an event to an aggregate failed.
///
/// The offending event is returned to the caller inside the error; it was
/// not recorded as pending.
#[derive(Debug, Error)]
#[error("{message}: {event_type} on {aggregate_type} {aggregate_id} (version {version})")]
pub struct EventCallbackError<E: DomainEvent> {
    aggregate_type: &'static str,
    aggregate_id: String,
    version: u64,
    pending: usize,
    event_type: &'static str,
    event: E,
    failure: CallbackFailure,
    message: &'static str,
    #[source]
    source: Option<BoxError>,
}

impl<E: DomainEvent> EventCallbackError<E> {
    pub(crate) fn new(
        aggregate_type: &'static str,
        aggregate_id: String,
        version: u64,
        pending: usize,
        event: E,
        failure: CallbackFailure,
        source: Option<BoxError>,
    ) -> Self {
        Self {
            aggregate_type,
            aggregate_id,
            version,
            pending,
            event_type: event.event_type(),
            event,
            failure,
            message: failure.message(),
            source,
        }
    }

    /// Type name of the aggregate that rejected the event.
    #[must_use]
    pub fn aggregate_type(&self) -> &'static str {
        self.aggregate_type
    }

    /// Canonical string of the aggregate's identity.
    #[must_use]
    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    /// Committed version of the aggregate when the event was rejected.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Number of pending events on the aggregate when the event was rejected.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// The rejected event.
    #[must_use]
    pub fn event(&self) -> &E {
        &self.event
    }

    /// Consumes the error, handing back the rejected event.
    #[must_use]
    pub fn into_event(self) -> E {
        self.event
    }

    /// Stage at which dispatch failed.
    #[must_use]
    pub fn failure(&self) -> CallbackFailure {
        self.failure
    }

    /// Description of the failure stage.
    #[must_use]
    pub fn message(&self) -> &'static str {
        self.message
    }
}

/// A blank aggregate could not be created for history replay.
#[derive(Debug, Error)]
#[error("{message}: {aggregate_type} {aggregate_id}")]
pub struct HistoryBuildError<E: DomainEvent> {
    aggregate_type: &'static str,
    aggregate_id: String,
    message: &'static str,
    history: Vec<E>,
    #[source]
    source: Option<BoxError>,
}

impl<E: DomainEvent> HistoryBuildError<E> {
    pub(crate) fn new(
        aggregate_type: &'static str,
        aggregate_id: String,
        message: &'static str,
        history: Vec<E>,
        source: Option<BoxError>,
    ) -> Self {
        Self {
            aggregate_type,
            aggregate_id,
            message,
            history,
            source,
        }
    }

    /// Type name of the aggregate being rebuilt.
    #[must_use]
    pub fn aggregate_type(&self) -> &'static str {
        self.aggregate_type
    }

    /// Canonical string of the requested identity.
    #[must_use]
    pub fn aggregate_id(&self) -> &str {
        &self.aggregate_id
    }

    /// Why the blank aggregate was unusable.
    #[must_use]
    pub fn message(&self) -> &'static str {
        self.message
    }

    /// The events that were going to be replayed.
    #[must_use]
    pub fn history(&self) -> &[E] {
        &self.history
    }
}

/// Replaying history into a new aggregate failed.
#[derive(Debug, Error)]
pub enum ReplayError<E: DomainEvent> {
    /// The blank aggregate could not be created.
    #[error(transparent)]
    HistoryBuild(#[from] HistoryBuildError<E>),

    /// An event in the history could not be applied.
    #[error(transparent)]
    EventCallback(#[from] EventCallbackError<E>),
}

/// Errors reported by an event store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No events exist for the aggregate.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(String),

    /// Optimistic concurrency conflict.
    #[error(
        "concurrency conflict on aggregate {aggregate_id}: expected version {expected}, found {actual}"
    )]
    ConcurrencyConflict {
        /// The aggregate that had the conflict.
        aggregate_id: String,
        /// The version the writer loaded.
        expected: u64,
        /// The version found in the store.
        actual: u64,
    },

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

/// Loading an aggregate through an event store failed.
#[derive(Debug, Error)]
pub enum RepositoryError<E: DomainEvent> {
    /// The event store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The loaded stream could not be replayed.
    #[error(transparent)]
    Replay(#[from] ReplayError<E>),
}

/// Identifier parsing errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The string is not a valid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}
