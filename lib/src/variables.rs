/*! This module implements the [`Variable`] type and the memory actions
that operate on it.

A [`Variable`] is a named capture buffer owned by an automaton. Edges in
the automaton carry [`MemoryAction`]s that open, close, or reset a
variable when the edge is traversed. The variables stored in a compiled
automaton are templates: every match operation works on its own private
copies, so concurrent matches against the same automaton never interfere.
*/

use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::slice::Slice;

/// Errors returned while querying the content of capture variables.
#[derive(Error, Debug, Eq, PartialEq)]
pub enum VariableError {
    /// The pattern contains no variable with the given name.
    #[error("unknown variable `{0}`")]
    UnknownName(String),

    /// The pattern contains no variable with the given occurrence index.
    /// Occurrence indexes are 1-based.
    #[error("unknown variable index {0}")]
    UnknownIndex(usize),
}

/// The kind of operation a memory action performs on its variable.
#[derive(Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Debug)]
pub enum Action {
    /// Begin capturing into the variable, if it is not already open.
    Open,
    /// Stop capturing into the variable. The captured content is kept.
    Close,
    /// Clear the variable's buffered content, if the variable is open.
    Reset,
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Open => write!(f, "open"),
            Action::Close => write!(f, "close"),
            Action::Reset => write!(f, "reset"),
        }
    }
}

/// A memory action attached to an edge: an [`Action`] applied to a named
/// variable when the edge is traversed.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug)]
pub struct MemoryAction {
    /// Name of the variable the action operates on.
    pub variable: String,
    /// The operation performed on the variable.
    pub action: Action,
}

impl MemoryAction {
    /// Creates a memory action applying `action` to the variable named
    /// `variable`.
    pub fn new<S: Into<String>>(variable: S, action: Action) -> Self {
        Self { variable: variable.into(), action }
    }
}

impl Display for MemoryAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // Rendered as `kind(variable)`, the form used when dumping an
        // automaton's structure.
        write!(f, "{}({})", self.action, self.variable)
    }
}

/// The set of memory actions carried by a single edge. Almost always 0–2
/// actions, hence the inline capacity.
pub type MemoryActions = SmallVec<[MemoryAction; 2]>;

/// A named capture variable.
///
/// Holds an open/closed flag, a [`Slice`] buffer with the currently
/// captured content, and a 1-based occurrence index assigned at compile
/// time in first-seen order, mirroring positional backreference numbering.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Variable {
    name: String,
    occurrence: usize,
    #[serde(skip)]
    open: bool,
    #[serde(skip)]
    content: Slice,
}

impl Variable {
    /// Creates a new closed, empty variable. The occurrence index is
    /// assigned later by the compiler's numbering pass.
    pub(crate) fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            occurrence: 0,
            open: false,
            content: Slice::default(),
        }
    }

    /// The variable's name.
    #[inline]
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// The variable's 1-based occurrence index.
    #[inline]
    pub fn occurrence(&self) -> usize {
        self.occurrence
    }

    pub(crate) fn set_occurrence(&mut self, occurrence: usize) {
        self.occurrence = occurrence;
    }

    /// True if the variable is currently capturing.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// The currently captured content.
    #[inline]
    pub fn content(&self) -> Slice {
        self.content
    }

    /// Resets the variable to its closed, empty state. Done once per
    /// match attempt.
    pub(crate) fn reset(&mut self) {
        self.open = false;
        self.content = Slice::default();
    }

    /// Applies a memory action to the variable. `pos` is the current
    /// cursor position, where a freshly opened or reset buffer starts.
    pub(crate) fn apply(&mut self, action: Action, pos: usize) {
        match action {
            Action::Open => {
                if !self.open {
                    self.open = true;
                    self.content = Slice::empty_at(pos);
                }
            }
            Action::Close => {
                self.open = false;
            }
            Action::Reset => {
                if self.open {
                    self.content = Slice::empty_at(pos);
                }
            }
        }
    }

    /// Appends `n` consumed code points to the buffer of an open variable.
    /// Buffers only ever grow contiguously, so this is a zero-copy
    /// extension of the underlying slice view.
    pub(crate) fn feed(&mut self, n: usize) {
        debug_assert!(self.open);
        self.content.extend(n);
    }
}
