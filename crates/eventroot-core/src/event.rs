//! Domain event abstractions.

/// Trait that all domain events implement.
///
/// Each aggregate declares its events as one closed enum. The variant is the
/// dispatch key: the aggregate's `handle_event` matches on it exhaustively.
pub trait DomainEvent: Clone + std::fmt::Debug + Send + Sync + 'static {
    /// Returns the event type name of this variant (used for logging and
    /// error diagnostics).
    fn event_type(&self) -> &'static str;
}
