//! A small state machine driven by a pointer-keyed transition table.
//!
//! States are caller-owned descriptors; the machine stores references to
//! them, keyed by identity (same name pointer and same kind), mapping each
//! to the transition function that picks the next state.

use crate::adapter::Pointer;
use crate::error::{AllocError, InsertError, RunError};
use crate::hash_table::{HashTable, PointerHashTable};
use log::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Start,
    Internal,
    End,
}

/// A state descriptor. Two descriptors are the same state only if they
/// share the same name allocation and kind.
#[derive(Debug)]
pub struct State {
    name: &'static str,
    kind: StateKind,
}

impl State {
    pub const fn new(name: &'static str, kind: StateKind) -> Self {
        Self { name, kind }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> StateKind {
        self.kind
    }
}

impl PartialEq for State {
    fn eq(&self, other: &Self) -> bool {
        state_identity(self, other)
    }
}

impl Eq for State {}

fn state_span(state: &State) -> &[u8] {
    state.name.as_bytes()
}

fn state_identity(a: &State, b: &State) -> bool {
    core::ptr::eq(a.name, b.name) && a.kind == b.kind
}

/// Picks the next state from the input buffer and the caller's context.
/// `None` aborts the run.
pub type Transition<'s, C> = fn(&[u8], &mut C) -> Option<&'s State>;

pub struct StateMachine<'s, 'b, C> {
    input: &'b [u8],
    context: C,
    transitions: PointerHashTable<'s, State, Transition<'s, C>>,
}

impl<'s, 'b, C> StateMachine<'s, 'b, C> {
    pub fn new(input: &'b [u8], context: C) -> Result<Self, AllocError> {
        Ok(Self {
            input,
            context,
            transitions: HashTable::with_adapter(Pointer::new(state_span, state_identity), 8)?,
        })
    }

    /// Register `state` with the function that leaves it. End states stop the
    /// run before any lookup and need not be registered.
    pub fn add_state(&mut self, state: &'s State, transition: Transition<'s, C>) -> Result<(), InsertError> {
        self.transitions.add(state, transition)
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn into_context(self) -> C {
        self.context
    }

    /// Run from the single start state until an end state is reached.
    pub fn run(&mut self) -> Result<&'s State, RunError> {
        let mut starts = self
            .transitions
            .iter()
            .map(|e| *e.key)
            .filter(|s| s.kind == StateKind::Start);
        let mut current = starts.next().ok_or(RunError::NoStartState)?;
        if starts.next().is_some() {
            return Err(RunError::MultipleStartStates);
        }

        debug!("running state machine from `{}`", current.name);
        while current.kind != StateKind::End {
            let Some(&transition) = self.transitions.get(current) else {
                return Err(RunError::UnknownState(current.name));
            };
            let next = transition(self.input, &mut self.context)
                .ok_or(RunError::TransitionFailed(current.name))?;
            trace!("`{}` -> `{}`", current.name, next.name);
            current = next;
        }
        Ok(current)
    }
}
