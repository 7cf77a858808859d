//! Test aggregates — mock `AggregateRoot` implementations for tests.

use eventroot_core::aggregate::{AggregateBase, AggregateRoot, BaseMut, Dispatch};
use eventroot_core::error::EventCallbackError;
use eventroot_core::event::DomainEvent;
use thiserror::Error;

use crate::identity::MockGuid;

/// Emitted when a `MockAggregate` is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockAggregateCreated;

/// Emitted when a `MockAggregate` is deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockAggregateDeleted;

/// An event `MockAggregate` deliberately has no handler for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockAggregateRenamed {
    /// The requested name.
    pub name: String,
}

/// Event variants for the mock aggregates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    Created(MockAggregateCreated),
    Deleted(MockAggregateDeleted),
    Renamed(MockAggregateRenamed),
}

impl DomainEvent for MockEvent {
    fn event_type(&self) -> &'static str {
        match self {
            MockEvent::Created(_) => "mock.created",
            MockEvent::Deleted(_) => "mock.deleted",
            MockEvent::Renamed(_) => "mock.renamed",
        }
    }
}

/// Errors raised by the mock aggregates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MockAggregateError {
    /// A second `Deleted` event was applied.
    #[error("aggregate {0} is already deleted")]
    AlreadyDeleted(String),

    /// The aggregate type refuses blank creation.
    #[error("{0} is abstract and cannot be instantiated")]
    Abstract(&'static str),
}

/// An aggregate that records a `Created` event on construction and can be
/// deleted once.
#[derive(Debug)]
pub struct MockAggregate {
    base: AggregateBase<MockGuid, MockEvent>,
    deleted: bool,
}

impl MockAggregate {
    /// Creates a new aggregate, applying a `Created` event.
    ///
    /// # Panics
    ///
    /// Never in practice: the `Created` handler cannot fail.
    #[must_use]
    pub fn new(id: MockGuid) -> Self {
        let mut aggregate = Self {
            base: AggregateBase::new(id),
            deleted: false,
        };
        aggregate
            .apply(MockEvent::Created(MockAggregateCreated))
            .expect("created event is always handled");
        aggregate
    }

    /// Deletes the aggregate, applying a `Deleted` event.
    ///
    /// # Errors
    ///
    /// Returns `EventCallbackError` if the aggregate is already deleted.
    pub fn delete(&mut self) -> Result<(), EventCallbackError<MockEvent>> {
        self.apply(MockEvent::Deleted(MockAggregateDeleted))
    }

    /// Attempts a rename. There is no handler for `Renamed`, so this always
    /// fails.
    ///
    /// # Errors
    ///
    /// Always returns `EventCallbackError` with a missing-handler failure.
    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), EventCallbackError<MockEvent>> {
        self.apply(MockEvent::Renamed(MockAggregateRenamed { name: name.into() }))
    }

    /// Whether a `Deleted` event has been applied.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    fn on_created(&mut self) {
        self.deleted = false;
    }

    fn on_deleted(&mut self) -> Result<(), MockAggregateError> {
        if self.deleted {
            return Err(MockAggregateError::AlreadyDeleted(self.base.id().to_string()));
        }
        self.deleted = true;
        Ok(())
    }
}

impl AggregateRoot for MockAggregate {
    type Id = MockGuid;
    type Event = MockEvent;
    type Error = MockAggregateError;

    fn base(&self) -> &AggregateBase<MockGuid, MockEvent> {
        &self.base
    }

    fn base_mut(&mut self) -> BaseMut<'_, MockGuid, MockEvent> {
        BaseMut::new(&mut self.base)
    }

    fn blank(id: MockGuid) -> Result<Self, MockAggregateError> {
        Ok(Self {
            base: AggregateBase::new(id),
            deleted: false,
        })
    }

    fn handle_event(&mut self, event: &MockEvent) -> Result<Dispatch, MockAggregateError> {
        match event {
            MockEvent::Created(_) => self.on_created(),
            MockEvent::Deleted(_) => self.on_deleted()?,
            MockEvent::Renamed(_) => return Ok(Dispatch::Unhandled),
        }
        Ok(Dispatch::Handled)
    }
}

/// An aggregate type with no blank state: replaying into it always fails.
#[derive(Debug)]
pub struct AbstractMockAggregate {
    base: AggregateBase<MockGuid, MockEvent>,
}

impl AggregateRoot for AbstractMockAggregate {
    type Id = MockGuid;
    type Event = MockEvent;
    type Error = MockAggregateError;

    fn base(&self) -> &AggregateBase<MockGuid, MockEvent> {
        &self.base
    }

    fn base_mut(&mut self) -> BaseMut<'_, MockGuid, MockEvent> {
        BaseMut::new(&mut self.base)
    }

    fn blank(_id: MockGuid) -> Result<Self, MockAggregateError> {
        Err(MockAggregateError::Abstract("AbstractMockAggregate"))
    }

    fn handle_event(&mut self, _event: &MockEvent) -> Result<Dispatch, MockAggregateError> {
        Ok(Dispatch::Unhandled)
    }
}
