//! Aggregate root abstraction.
//!
//! An aggregate embeds an [`AggregateBase`] and implements [`AggregateRoot`]
//! by supplying two things: a blank factory used by history replay, and an
//! exhaustive `handle_event` match that routes each event variant to its
//! state-mutation handler. Everything else (apply, commit, replay) is
//! provided.

use tracing::{debug, instrument, trace};

use crate::error::{
    BoxError, CallbackFailure, EventCallbackError, HistoryBuildError, ReplayError,
};
use crate::event::DomainEvent;
use crate::identity::Identity;

/// Outcome of routing an event to the aggregate's handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Dispatch {
    /// A handler for the event's variant ran successfully.
    Handled,
    /// The aggregate has no handler for the event's variant.
    Unhandled,
}

/// Identity, version and pending events of one aggregate instance.
#[derive(Debug, Clone)]
pub struct AggregateBase<I, E> {
    id: I,
    version: u64,
    new_events: Vec<E>,
}

impl<I: Identity, E: DomainEvent> AggregateBase<I, E> {
    /// Creates blank bookkeeping: version 0, nothing pending.
    #[must_use]
    pub fn new(id: I) -> Self {
        Self {
            id,
            version: 0,
            new_events: Vec::new(),
        }
    }

    /// Identity assigned at construction.
    #[must_use]
    pub fn id(&self) -> &I {
        &self.id
    }

    /// Number of events committed so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Events applied since the last commit, in application order.
    #[must_use]
    pub fn new_events(&self) -> &[E] {
        &self.new_events
    }

    fn record(&mut self, event: E) {
        self.new_events.push(event);
    }

    /// Folds pending events into the version. Returns how many were folded.
    fn commit(&mut self) -> usize {
        let committed = self.new_events.len();
        self.version += committed as u64;
        self.new_events.clear();
        committed
    }
}

/// Mutable handle on an aggregate's bookkeeping.
///
/// Aggregates hand this out from [`AggregateRoot::base_mut`]. It exposes no
/// way to overwrite the wrapped base, so identity and version can only move
/// through `apply` and `commit_events`:
///
/// ```compile_fail
/// use eventroot_core::aggregate::{AggregateBase, AggregateRoot};
/// use eventroot_test_support::{MockAggregate, MockGuid};
///
/// let mut aggregate = MockAggregate::new(MockGuid::new("mock-guid"));
/// aggregate.commit_events();
/// *aggregate.base_mut() = AggregateBase::new(MockGuid::new("other"));
/// ```
#[derive(Debug)]
pub struct BaseMut<'a, I, E>(&'a mut AggregateBase<I, E>);

impl<'a, I: Identity, E: DomainEvent> BaseMut<'a, I, E> {
    /// Wraps the aggregate's own base.
    #[must_use]
    pub fn new(base: &'a mut AggregateBase<I, E>) -> Self {
        Self(base)
    }

    pub(crate) fn record(&mut self, event: E) {
        self.0.record(event);
    }

    pub(crate) fn commit(&mut self) -> usize {
        self.0.commit()
    }
}

/// Trait for aggregate roots whose state is a fold over domain events.
pub trait AggregateRoot: Sized {
    /// Identity type of this aggregate.
    type Id: Identity;

    /// Closed set of events this aggregate produces and consumes.
    type Event: DomainEvent;

    /// Error returned by handlers and by the blank factory.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the aggregate's bookkeeping.
    fn base(&self) -> &AggregateBase<Self::Id, Self::Event>;

    /// Returns a handle through which the provided methods update the
    /// bookkeeping. Implementations return `BaseMut::new(&mut self.base)`.
    fn base_mut(&mut self) -> BaseMut<'_, Self::Id, Self::Event>;

    /// Creates the blank state replay starts from.
    ///
    /// Must not apply any event: the result has to be at version 0 with
    /// nothing pending and carry `id`. Constructors that originate events
    /// (such as a "created" event) are a separate code path.
    ///
    /// # Errors
    ///
    /// Returns `Self::Error` if this aggregate type cannot be blank-created.
    fn blank(id: Self::Id) -> Result<Self, Self::Error>;

    /// Routes `event` to the handler for its variant and runs it.
    ///
    /// Implementations match exhaustively on the event enum. A handler that
    /// fails must do so before mutating state.
    ///
    /// # Errors
    ///
    /// Returns the handler's error if the handler rejects the event.
    fn handle_event(&mut self, event: &Self::Event) -> Result<Dispatch, Self::Error>;

    /// Name of the aggregate type used in diagnostics.
    #[must_use]
    fn aggregate_type() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Identity of this aggregate.
    #[must_use]
    fn id(&self) -> &Self::Id {
        self.base().id()
    }

    /// Number of events committed so far; the optimistic concurrency token.
    #[must_use]
    fn version(&self) -> u64 {
        self.base().version()
    }

    /// Events applied but not yet committed.
    #[must_use]
    fn new_events(&self) -> &[Self::Event] {
        self.base().new_events()
    }

    /// Marks all pending events as persisted.
    fn commit_events(&mut self) {
        let committed = self.base_mut().commit();
        trace!(
            aggregate_type = Self::aggregate_type(),
            aggregate_id = %self.id(),
            committed,
            version = self.version(),
            "committed events"
        );
    }

    /// Applies `event`: runs its handler, then records it as pending.
    ///
    /// Meant to be called from the aggregate's own command methods, which
    /// decide what happened and then apply the resulting event.
    ///
    /// # Errors
    ///
    /// Returns `EventCallbackError` if the aggregate has no handler for the
    /// event or the handler fails. The event is not recorded in either case.
    fn apply(&mut self, event: Self::Event) -> Result<(), EventCallbackError<Self::Event>> {
        let (failure, source) = match self.handle_event(&event) {
            Ok(Dispatch::Handled) => {
                trace!(
                    aggregate_type = Self::aggregate_type(),
                    aggregate_id = %self.id(),
                    event_type = event.event_type(),
                    "applied event"
                );
                self.base_mut().record(event);
                return Ok(());
            }
            Ok(Dispatch::Unhandled) => (CallbackFailure::MissingHandler, None),
            Err(e) => (CallbackFailure::Invocation, Some(BoxError::from(e))),
        };

        debug!(
            aggregate_type = Self::aggregate_type(),
            aggregate_id = %self.id(),
            event_type = event.event_type(),
            reason = failure.message(),
            "event rejected"
        );
        Err(EventCallbackError::new(
            Self::aggregate_type(),
            self.id().to_string(),
            self.version(),
            self.new_events().len(),
            event,
            failure,
            source,
        ))
    }

    /// Rebuilds an aggregate from its committed history.
    ///
    /// Starts from [`AggregateRoot::blank`], applies every event in order and
    /// commits once, so the result is at version `history.len()` with nothing
    /// pending.
    ///
    /// # Errors
    ///
    /// Returns `ReplayError::HistoryBuild` if the blank aggregate cannot be
    /// created or is not blank, and `ReplayError::EventCallback` for the first
    /// event that cannot be applied.
    #[instrument(skip_all, fields(aggregate_type = Self::aggregate_type(), aggregate_id = %id))]
    fn build_from_history<H>(id: Self::Id, history: H) -> Result<Self, ReplayError<Self::Event>>
    where
        H: IntoIterator<Item = Self::Event>,
    {
        let aggregate_id = id.to_string();
        let history = history.into_iter();

        let mut aggregate = match Self::blank(id) {
            Ok(aggregate) => aggregate,
            Err(e) => {
                return Err(HistoryBuildError::new(
                    Self::aggregate_type(),
                    aggregate_id,
                    "failed to create blank aggregate",
                    history.collect(),
                    Some(BoxError::from(e)),
                )
                .into());
            }
        };

        let problem = if aggregate.version() != 0 || !aggregate.new_events().is_empty() {
            Some("blank aggregate is not empty")
        } else if aggregate.id().to_string() != aggregate_id {
            Some("blank aggregate has a different identity")
        } else {
            None
        };
        if let Some(message) = problem {
            return Err(HistoryBuildError::new(
                Self::aggregate_type(),
                aggregate_id,
                message,
                history.collect(),
                None,
            )
            .into());
        }

        for event in history {
            aggregate.apply(event)?;
        }
        aggregate.commit_events();

        debug!(version = aggregate.version(), "rebuilt aggregate from history");
        Ok(aggregate)
    }
}

#[cfg(test)]
mod tests {
    use core::fmt;

    use thiserror::Error;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct CounterId(&'static str);

    impl fmt::Display for CounterId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(self.0)
        }
    }

    impl Identity for CounterId {}

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum CounterEvent {
        Added(u32),
        Halved,
        Audited,
    }

    impl DomainEvent for CounterEvent {
        fn event_type(&self) -> &'static str {
            match self {
                CounterEvent::Added(_) => "counter.added",
                CounterEvent::Halved => "counter.halved",
                CounterEvent::Audited => "counter.audited",
            }
        }
    }

    #[derive(Debug, Error, PartialEq, Eq)]
    enum CounterError {
        #[error("cannot halve an odd total {0}")]
        OddTotal(u32),
    }

    #[derive(Debug)]
    struct Counter {
        base: AggregateBase<CounterId, CounterEvent>,
        total: u32,
    }

    impl Counter {
        fn new(id: CounterId) -> Self {
            Self {
                base: AggregateBase::new(id),
                total: 0,
            }
        }
    }

    impl AggregateRoot for Counter {
        type Id = CounterId;
        type Event = CounterEvent;
        type Error = CounterError;

        fn base(&self) -> &AggregateBase<CounterId, CounterEvent> {
            &self.base
        }

        fn base_mut(&mut self) -> BaseMut<'_, CounterId, CounterEvent> {
            BaseMut::new(&mut self.base)
        }

        fn blank(id: CounterId) -> Result<Self, CounterError> {
            Ok(Self::new(id))
        }

        fn handle_event(&mut self, event: &CounterEvent) -> Result<Dispatch, CounterError> {
            match event {
                CounterEvent::Added(amount) => self.total += amount,
                CounterEvent::Halved => {
                    if self.total % 2 != 0 {
                        return Err(CounterError::OddTotal(self.total));
                    }
                    self.total /= 2;
                }
                CounterEvent::Audited => return Ok(Dispatch::Unhandled),
            }
            Ok(Dispatch::Handled)
        }
    }

    #[test]
    fn test_apply_records_event_without_changing_version() {
        // Arrange
        let mut counter = Counter::new(CounterId("c-1"));

        // Act
        counter.apply(CounterEvent::Added(4)).unwrap();

        // Assert
        assert_eq!(counter.total, 4);
        assert_eq!(counter.version(), 0);
        assert_eq!(counter.new_events(), &[CounterEvent::Added(4)]);
    }

    #[test]
    fn test_commit_events_folds_pending_into_version() {
        // Arrange
        let mut counter = Counter::new(CounterId("c-1"));
        counter.apply(CounterEvent::Added(1)).unwrap();
        counter.apply(CounterEvent::Added(2)).unwrap();

        // Act
        counter.commit_events();
        counter.commit_events();

        // Assert
        assert_eq!(counter.version(), 2);
        assert!(counter.new_events().is_empty());
    }

    #[test]
    fn test_commit_events_on_empty_buffer_is_noop() {
        // Arrange
        let mut counter = Counter::new(CounterId("c-1"));

        // Act
        counter.commit_events();

        // Assert
        assert_eq!(counter.version(), 0);
    }

    #[test]
    fn test_handler_failure_leaves_state_and_pending_untouched() {
        // Arrange
        let mut counter = Counter::new(CounterId("c-1"));
        counter.apply(CounterEvent::Added(3)).unwrap();

        // Act
        let error = counter.apply(CounterEvent::Halved).unwrap_err();

        // Assert
        assert_eq!(error.failure(), CallbackFailure::Invocation);
        assert_eq!(error.message(), "handler invocation failed");
        assert_eq!(error.event(), &CounterEvent::Halved);
        assert_eq!(error.pending(), 1);
        assert_eq!(counter.total, 3);
        assert_eq!(counter.new_events(), &[CounterEvent::Added(3)]);
    }

    #[test]
    fn test_unhandled_variant_is_reported_as_missing_handler() {
        // Arrange
        let mut counter = Counter::new(CounterId("c-1"));

        // Act
        let error = counter.apply(CounterEvent::Audited).unwrap_err();

        // Assert
        assert_eq!(error.failure(), CallbackFailure::MissingHandler);
        assert_eq!(error.aggregate_id(), "c-1");
        assert!(error.aggregate_type().ends_with("Counter"));
        assert!(counter.new_events().is_empty());
    }

    #[test]
    fn test_base_mut_handle_only_moves_bookkeeping_forward() {
        // Arrange
        let mut counter = Counter::new(CounterId("c-1"));
        counter.apply(CounterEvent::Added(2)).unwrap();

        // Act
        let committed = counter.base_mut().commit();

        // Assert
        assert_eq!(committed, 1);
        assert_eq!(counter.version(), 1);
        assert_eq!(counter.id(), &CounterId("c-1"));
    }

    #[test]
    fn test_build_from_history_replays_and_commits() {
        // Act
        let counter = Counter::build_from_history(
            CounterId("c-1"),
            [CounterEvent::Added(6), CounterEvent::Halved],
        )
        .unwrap();

        // Assert
        assert_eq!(counter.id(), &CounterId("c-1"));
        assert_eq!(counter.total, 3);
        assert_eq!(counter.version(), 2);
        assert!(counter.new_events().is_empty());
    }

    #[test]
    fn test_build_from_empty_history_yields_blank_aggregate() {
        // Act
        let counter = Counter::build_from_history(CounterId("c-1"), []).unwrap();

        // Assert
        assert_eq!(counter.version(), 0);
        assert_eq!(counter.total, 0);
    }

    #[test]
    fn test_build_from_history_aborts_on_first_failing_event() {
        // Act
        let result = Counter::build_from_history(
            CounterId("c-1"),
            [
                CounterEvent::Added(1),
                CounterEvent::Halved,
                CounterEvent::Added(1),
            ],
        );

        // Assert
        match result {
            Err(ReplayError::EventCallback(error)) => {
                assert_eq!(error.event(), &CounterEvent::Halved);
                assert_eq!(error.version(), 0);
                assert_eq!(error.pending(), 1);
            }
            other => panic!("expected EventCallback, got {other:?}"),
        }
    }
}
