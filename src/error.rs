//! Error types shared by the containers and the state machine.

use thiserror::Error;

/// The backing slot array could not be allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("failed to allocate {capacity} slots")]
pub struct AllocError {
    /// Slot count that was requested.
    pub capacity: usize,
}

/// Why an `add`/`quick_add` did not store its entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InsertError {
    /// An equal key is already stored; the container is unchanged.
    #[error("key is already present")]
    DuplicateKey,
    /// A full probe cycle found no empty or tombstone slot.
    #[error("no free slot after probing all {capacity} slots")]
    CapacityExhausted { capacity: usize },
    /// The pre-insert grow failed; the container is unchanged.
    #[error(transparent)]
    Alloc(#[from] AllocError),
}

/// Why a union/intersection/difference produced no result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SetOpError {
    /// The operands were built with different key adapter configurations.
    #[error("operands use different key adapter configurations")]
    AdapterMismatch,
    #[error(transparent)]
    Alloc(#[from] AllocError),
    #[error(transparent)]
    Insert(#[from] InsertError),
}

/// Why a state machine run stopped before reaching an end state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RunError {
    #[error("no start state registered")]
    NoStartState,
    #[error("more than one start state registered")]
    MultipleStartStates,
    /// The machine reached a state that has no registered transition.
    #[error("state `{0}` has no transition")]
    UnknownState(&'static str),
    /// A transition function declined to produce a next state.
    #[error("transition out of `{0}` failed")]
    TransitionFailed(&'static str),
}
