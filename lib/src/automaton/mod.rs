/*! This module implements the memory occurrence automaton (MOA).

A MOA is a finite-state machine extended with named capture variables and
memory actions on edges. States, not edges, carry the matching criterion:
an edge from `a` to `b` consumes whatever `b` matches: a fixed label for
literal states, a predicate over one token for set states, nothing for
boundary states, and the live content of a capture variable for
backreference states.

An automaton starts out mutable: [`Automaton::add_state`] and
[`Automaton::add_edge`] grow the graph. [`Automaton::freeze`] then builds
the per-state edge indices used for dispatch during matching, runs the
[determinism check](crate::automaton::determinism), and marks the
automaton immutable. All matching operations require a frozen automaton;
all edits require an unfrozen one. Violating either is a programming
error and panics.
*/

use std::fmt::{Display, Formatter};

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::variables::{MemoryActions, Variable};

pub(crate) mod determinism;


/// Identifies a state within its automaton. States are arena-allocated;
/// the identifier is an index into the arena.
pub type StateId = usize;

/// The source sentinel state. Every automaton allocates it at handle 0.
/// It has no incoming edges and every match attempt starts here.
pub const SRC: StateId = 0;

/// The sink sentinel state. Every automaton allocates it at handle 1.
/// It has no outgoing edges; its label is the empty string, so entering
/// it consumes nothing. Reaching it means the automaton accepts.
pub const SNK: StateId = 1;

/// The error returned by [`Automaton::freeze`] when the automaton's edge
/// structure is not deterministic.
#[derive(Error, Debug, Eq, PartialEq)]
#[error("the automaton is not deterministic")]
pub struct DeterminismError;

/// A predicate over a single token, the matching criterion of set states.
///
/// Classes follow ASCII semantics: `\d` is `[0-9]`, `\w` is
/// `[0-9A-Za-z_]` and `\s` is ASCII whitespace.
#[derive(Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Debug)]
pub enum CharClass {
    /// An ASCII decimal digit, `\d`.
    Digit,
    /// Anything but an ASCII decimal digit, `\D`.
    NotDigit,
    /// An ASCII word character (alphanumeric or underscore), `\w`.
    Word,
    /// Anything but a word character, `\W`.
    NotWord,
    /// An ASCII whitespace character, `\s`.
    Space,
    /// Anything but a whitespace character, `\S`.
    NotSpace,
    /// An inclusive code point range, like `[a-f]`.
    Range {
        /// First code point in the range.
        start: char,
        /// Last code point in the range, inclusive.
        end: char,
    },
    /// Any code point except a newline, `.`.
    Any,
}

impl CharClass {
    /// True if the class contains the given code point.
    pub fn contains(&self, c: char) -> bool {
        match self {
            CharClass::Digit => c.is_ascii_digit(),
            CharClass::NotDigit => !c.is_ascii_digit(),
            CharClass::Word => c == '_' || c.is_ascii_alphanumeric(),
            CharClass::NotWord => !(c == '_' || c.is_ascii_alphanumeric()),
            CharClass::Space => c.is_ascii_whitespace(),
            CharClass::NotSpace => !c.is_ascii_whitespace(),
            CharClass::Range { start, end } => (*start..=*end).contains(&c),
            CharClass::Any => c != '\n',
        }
    }
}

impl Display for CharClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CharClass::Digit => write!(f, r"\d"),
            CharClass::NotDigit => write!(f, r"\D"),
            CharClass::Word => write!(f, r"\w"),
            CharClass::NotWord => write!(f, r"\W"),
            CharClass::Space => write!(f, r"\s"),
            CharClass::NotSpace => write!(f, r"\S"),
            CharClass::Range { start, end } => write!(f, "[{start}-{end}]"),
            CharClass::Any => write!(f, "."),
        }
    }
}

/// The matching context available to boundary states.
pub(crate) struct BoundaryContext<'s> {
    /// The subject sequence being matched.
    pub subject: &'s [char],
    /// Current cursor position within the subject.
    pub pos: usize,
    /// Where the previous match ended, if any.
    pub last_match_end: Option<usize>,
}

/// A zero-width matching criterion, the matching criterion of boundary
/// states.
#[derive(Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Debug)]
pub enum BoundaryKind {
    /// The position before the first code point, `\A`.
    StartOfInput,
    /// The position after the last code point, `\z`.
    EndOfInput,
    /// The start of the input or the position right after a newline, `^`.
    StartOfLine,
    /// The end of the input or the position of a newline, `$`.
    EndOfLine,
    /// The position where the previous match ended, `\G`. When no match
    /// has been found yet this is the start of the input.
    LastMatchEnd,
}

impl BoundaryKind {
    /// True if the boundary holds in the given context.
    pub(crate) fn is_satisfied(&self, ctx: &BoundaryContext) -> bool {
        match self {
            BoundaryKind::StartOfInput => ctx.pos == 0,
            BoundaryKind::EndOfInput => ctx.pos == ctx.subject.len(),
            BoundaryKind::StartOfLine => {
                ctx.pos == 0 || ctx.subject[ctx.pos - 1] == '\n'
            }
            BoundaryKind::EndOfLine => {
                ctx.pos == ctx.subject.len() || ctx.subject[ctx.pos] == '\n'
            }
            BoundaryKind::LastMatchEnd => {
                ctx.pos == ctx.last_match_end.unwrap_or(0)
            }
        }
    }
}

impl Display for BoundaryKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BoundaryKind::StartOfInput => write!(f, r"\A"),
            BoundaryKind::EndOfInput => write!(f, r"\z"),
            BoundaryKind::StartOfLine => write!(f, "^"),
            BoundaryKind::EndOfLine => write!(f, "$"),
            BoundaryKind::LastMatchEnd => write!(f, r"\G"),
        }
    }
}

/// A state of the automaton.
///
/// The state's kind determines what an edge *into* the state consumes.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug)]
pub enum State {
    /// Matches input equal to its label. A label of `None` is the empty
    /// label: entering the state consumes nothing. The two sentinel
    /// states are empty-labeled literal states.
    Literal {
        /// The code point the state matches, or `None` for the empty
        /// label.
        label: Option<char>,
    },
    /// Matches any token of the given length satisfying the predicate.
    Set {
        /// Number of code points consumed when entering the state.
        len: usize,
        /// The predicate a token must satisfy.
        class: CharClass,
    },
    /// Zero-width: matches based on the surrounding context instead of
    /// consuming a token.
    Boundary {
        /// The context predicate.
        kind: BoundaryKind,
    },
    /// Matches the current captured content of a named variable. Length
    /// and content are resolved at traversal time.
    Backref {
        /// Name of the referenced variable.
        variable: String,
    },
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            State::Literal { label: Some(c) } => write!(f, "literal `{c}`"),
            State::Literal { label: None } => write!(f, "literal ``"),
            State::Set { len, class } => write!(f, "set {class} x{len}"),
            State::Boundary { kind } => write!(f, "boundary {kind}"),
            State::Backref { variable } => write!(f, "backref \\k<{variable}>"),
        }
    }
}

/// A transition between two states, carrying the memory actions applied
/// when the edge is traversed.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug)]
pub struct Edge {
    /// The state the edge departs from.
    pub from: StateId,
    /// The state the edge arrives at. This state's kind determines what
    /// traversing the edge consumes.
    pub to: StateId,
    /// Memory actions applied when the edge is traversed.
    pub actions: MemoryActions,
}

/// Per-state lookup structures built when the automaton is frozen.
///
/// Each field holds positions into the state's outgoing edge list,
/// partitioned by the destination state's kind. This is what makes edge
/// dispatch O(1) for literal and backreference destinations and O(k) for
/// the (tiny) boundary and set lists.
#[derive(Debug, Clone, Default)]
pub(crate) struct EdgeIndex {
    /// Edges whose destination is a literal state, keyed by label.
    pub literals: FxHashMap<char, usize>,
    /// The edge whose destination has the empty label (the sink), if any.
    pub empty_literal: Option<usize>,
    /// Edges whose destination is a set state.
    pub sets: Vec<usize>,
    /// Edges whose destination is a boundary state.
    pub boundaries: Vec<usize>,
    /// The edge whose destination is a backreference state, if any.
    pub backref: Option<usize>,
}

/// A memory occurrence automaton.
///
/// Owns the full edge graph and the variable map. See the [module
/// docs](self) for the mutable/frozen lifecycle.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Automaton {
    states: Vec<State>,
    /// Outgoing edges per state, indexed by [`StateId`].
    edges: Vec<Vec<Edge>>,
    variables: IndexMap<String, Variable>,
    frozen: bool,
    #[serde(skip)]
    indices: Vec<EdgeIndex>,
}

impl Default for Automaton {
    fn default() -> Self {
        Self::new()
    }
}

impl Automaton {
    /// Creates a new, mutable automaton containing only the two sentinel
    /// states [`SRC`] and [`SNK`].
    pub fn new() -> Self {
        let sentinels = vec![
            State::Literal { label: None }, // SRC
            State::Literal { label: None }, // SNK
        ];
        Self {
            edges: vec![Vec::new(); sentinels.len()],
            states: sentinels,
            variables: IndexMap::new(),
            frozen: false,
            indices: Vec::new(),
        }
    }

    /// True once [`Automaton::freeze`] has completed successfully.
    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Adds a state and returns its handle.
    ///
    /// # Panics
    ///
    /// If the automaton is frozen.
    pub fn add_state(&mut self, state: State) -> StateId {
        assert!(!self.frozen, "add_state called on a frozen automaton");
        self.states.push(state);
        self.edges.push(Vec::new());
        self.states.len() - 1
    }

    /// Adds an edge from `from` to `to` carrying the given memory
    /// actions.
    ///
    /// # Panics
    ///
    /// If the automaton is frozen, if either state does not exist, or if
    /// the edge would enter [`SRC`] or leave [`SNK`].
    pub fn add_edge(
        &mut self,
        from: StateId,
        to: StateId,
        actions: MemoryActions,
    ) {
        assert!(!self.frozen, "add_edge called on a frozen automaton");
        assert!(from < self.states.len(), "unknown state {from}");
        assert!(to < self.states.len(), "unknown state {to}");
        assert!(to != SRC, "the source state can't have incoming edges");
        assert!(from != SNK, "the sink state can't have outgoing edges");
        self.edges[from].push(Edge { from, to, actions });
    }

    /// Declares a capture variable with the given name, if it doesn't
    /// exist yet.
    ///
    /// # Panics
    ///
    /// If the automaton is frozen.
    pub fn declare_variable(&mut self, name: &str) {
        assert!(!self.frozen, "declare_variable called on a frozen automaton");
        if !self.variables.contains_key(name) {
            self.variables.insert(name.to_string(), Variable::new(name));
        }
    }

    /// Replaces the automaton's variable map. Used by the compiler, which
    /// tracks variables itself while traversing the AST.
    pub(crate) fn set_variables(
        &mut self,
        variables: IndexMap<String, Variable>,
    ) {
        assert!(!self.frozen, "set_variables called on a frozen automaton");
        self.variables = variables;
    }

    /// Freezes the automaton: builds the per-state edge indices, runs the
    /// determinism check, and marks the automaton immutable. Idempotent:
    /// freezing a frozen automaton is a no-op.
    ///
    /// On a determinism failure the automaton is left unfrozen and an
    /// error is returned.
    pub fn freeze(&mut self) -> Result<(), DeterminismError> {
        if self.frozen {
            return Ok(());
        }
        debug_assert!(self.all_reachable(), "unreachable states in automaton");
        if !determinism::check(self) {
            return Err(DeterminismError);
        }
        self.build_indices();
        self.frozen = true;
        Ok(())
    }

    /// The states of the automaton, indexed by [`StateId`].
    #[inline]
    pub fn states(&self) -> &[State] {
        self.states.as_slice()
    }

    /// The state with the given handle.
    ///
    /// # Panics
    ///
    /// If no such state exists.
    #[inline]
    pub fn state(&self, id: StateId) -> &State {
        &self.states[id]
    }

    /// Number of states in the automaton, sentinels included.
    #[inline]
    pub fn state_count(&self) -> usize {
        self.states.len()
    }

    /// The outgoing edges of the given state.
    #[inline]
    pub fn edges(&self, state: StateId) -> &[Edge] {
        self.edges[state].as_slice()
    }

    /// Iterates over all edges of the automaton.
    pub fn all_edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter().flatten()
    }

    /// Iterates over the automaton's capture variables in first-seen
    /// order.
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    /// The variable map, in first-seen order.
    #[inline]
    pub(crate) fn variable_map(&self) -> &IndexMap<String, Variable> {
        &self.variables
    }

    /// The edge index for the given state.
    ///
    /// # Panics
    ///
    /// If the automaton is not frozen.
    #[inline]
    pub(crate) fn index(&self, state: StateId) -> &EdgeIndex {
        assert!(self.frozen, "edge indices require a frozen automaton");
        &self.indices[state]
    }

    /// Rebuilds the edge indices of an automaton that was serialized in
    /// frozen form. Deserialized automata were deterministic when frozen,
    /// so the check is not repeated.
    pub(crate) fn rebuild_indices(&mut self) {
        debug_assert!(self.frozen);
        self.build_indices();
    }

    fn build_indices(&mut self) {
        self.indices = self
            .edges
            .iter()
            .map(|edges| {
                let mut index = EdgeIndex::default();
                for (i, edge) in edges.iter().enumerate() {
                    match &self.states[edge.to] {
                        State::Literal { label: Some(c) } => {
                            index.literals.insert(*c, i);
                        }
                        State::Literal { label: None } => {
                            index.empty_literal = Some(i);
                        }
                        State::Set { .. } => index.sets.push(i),
                        State::Boundary { .. } => index.boundaries.push(i),
                        State::Backref { .. } => index.backref = Some(i),
                    }
                }
                index
            })
            .collect();
    }

    /// True if every state is reachable from [`SRC`].
    fn all_reachable(&self) -> bool {
        let mut reached = vec![false; self.states.len()];
        let mut pending = vec![SRC];
        reached[SRC] = true;
        while let Some(s) = pending.pop() {
            for edge in self.edges[s].iter() {
                if !reached[edge.to] {
                    reached[edge.to] = true;
                    pending.push(edge.to);
                }
            }
        }
        reached.into_iter().all(|r| r)
    }
}
