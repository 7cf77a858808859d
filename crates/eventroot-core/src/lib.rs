//! Eventroot Core — event-sourced aggregate root abstractions.
//!
//! Aggregates derive their state by folding an ordered sequence of domain
//! events. This crate provides the bookkeeping every such aggregate carries
//! (identity, version, pending events), the apply/commit protocol, and
//! deterministic replay from history. It contains no storage code; the
//! event store is a collaborator described by [`repository::EventStore`].

pub mod aggregate;
pub mod error;
pub mod event;
pub mod identity;
pub mod repository;

pub use aggregate::{AggregateBase, AggregateRoot, BaseMut, Dispatch};
pub use error::{
    CallbackFailure, EventCallbackError, HistoryBuildError, IdentityError, ReplayError,
    RepositoryError, StoreError,
};
pub use event::DomainEvent;
pub use identity::{AggregateId, Identity};
