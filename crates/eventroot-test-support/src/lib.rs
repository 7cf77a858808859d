//! Shared test mocks and utilities for eventroot aggregates.

mod aggregate;
mod identity;
mod store;
mod subscriber;

pub use aggregate::{
    AbstractMockAggregate, MockAggregate, MockAggregateCreated, MockAggregateDeleted,
    MockAggregateError, MockAggregateRenamed, MockEvent,
};
pub use identity::MockGuid;
pub use store::{FailingEventStore, InMemoryEventStore};
pub use subscriber::init_tracing;
