/*! Runs a compiled pattern against a subject.

A [`Matcher`] is created by [`Pattern::matcher`] and borrows the frozen
automaton; the subject and the matcher's own copies of the capture
variables live inside the matcher, so any number of matchers can run
against the same pattern concurrently.

Matching is a single deterministic ride through the automaton. At each
state at most one outgoing edge can accept the next piece of input, by
construction, so there is nothing to backtrack into: the matcher either
advances or the attempt is over. What an edge consumes is decided by the
state it leads *to*; when several edges leave the current state they are
probed in a fixed order:

1. an edge into a boundary state, consuming nothing;
2. an edge into a literal state labeled with the next code point;
3. an edge into a set state whose predicate accepts the next token;
4. an edge into a backreference state whose variable's current content
   is the next token;
5. the edge into the empty-labeled sink, consuming nothing.

The one exception is at the end of the subject, where the sink edge is
preferred over a backreference: with no input left, an empty-content
backreference and the sink edge would otherwise be indistinguishable,
and the ride must be allowed to finish.
*/

use std::ops::Range;

use indexmap::IndexMap;

use crate::automaton::{Automaton, BoundaryContext, State, StateId, SNK, SRC};
use crate::compiler::Pattern;
use crate::variables::{Variable, VariableError};

/// What a single step through the automaton did.
#[derive(Debug, Eq, PartialEq)]
enum StepOutcome {
    /// A consuming edge was traversed; the token had this many code
    /// points (zero for the edge into the sink).
    Consumed(usize),
    /// A boundary edge was traversed. Nothing was consumed.
    NotConsumed,
    /// No outgoing edge accepts the input at the cursor.
    Rejected,
}

/// Matches a compiled [`Pattern`] against a subject.
pub struct Matcher<'r> {
    pattern: &'r Pattern,
    subject: Vec<char>,
    /// The state the ride is currently at.
    state: StateId,
    /// Position in the subject, in code points.
    cursor: usize,
    /// This matcher's private copies of the pattern's variables.
    variables: IndexMap<String, Variable>,
    /// Span of the most recent match, if any.
    matched: Option<Range<usize>>,
    /// Where [`Matcher::next_match`] starts its next scan.
    scan_pos: usize,
    match_count: usize,
}

impl<'r> Matcher<'r> {
    pub(crate) fn new(pattern: &'r Pattern, subject: &str) -> Self {
        Self {
            pattern,
            subject: subject.chars().collect(),
            state: SRC,
            cursor: 0,
            variables: pattern.automaton().variable_map().clone(),
            matched: None,
            scan_pos: 0,
            match_count: 0,
        }
    }

    #[inline]
    fn automaton(&self) -> &Automaton {
        self.pattern.automaton()
    }

    /// True if the pattern matches the whole subject.
    ///
    /// Resets the matcher first; any search state from previous calls to
    /// [`Matcher::next_match`] is discarded.
    pub fn matches(&mut self) -> bool {
        self.reset();
        if self.ride() && self.cursor == self.subject.len() {
            self.matched = Some(0..self.subject.len());
            self.match_count = 1;
            true
        } else {
            false
        }
    }

    /// Advances to the next match of the pattern within the subject and
    /// returns true if one was found. The match's span is then available
    /// through [`Matcher::start`], [`Matcher::end`] and
    /// [`Matcher::span`].
    ///
    /// Matches are found leftmost-first. A failed attempt restarts one
    /// position after the attempt's start, never at the cursor where it
    /// failed; an empty match advances the scan by one position so the
    /// search always terminates.
    pub fn next_match(&mut self) -> bool {
        let len = self.subject.len();
        let mut start = self.scan_pos;
        while start <= len {
            self.start_attempt(start);
            if self.ride() {
                let end = self.cursor;
                self.matched = Some(start..end);
                self.match_count += 1;
                self.scan_pos = if end > start { end } else { end + 1 };
                return true;
            }
            start += 1;
        }
        self.scan_pos = len + 1;
        false
    }

    /// Start of the most recent match, in code points.
    #[inline]
    pub fn start(&self) -> Option<usize> {
        self.matched.as_ref().map(|m| m.start)
    }

    /// End of the most recent match (exclusive), in code points.
    #[inline]
    pub fn end(&self) -> Option<usize> {
        self.matched.as_ref().map(|m| m.end)
    }

    /// Span of the most recent match, in code points.
    #[inline]
    pub fn span(&self) -> Option<Range<usize>> {
        self.matched.clone()
    }

    /// Text of the most recent match.
    pub fn matched_text(&self) -> Option<String> {
        self.matched
            .clone()
            .map(|m| self.subject[m].iter().collect())
    }

    /// Number of matches found so far.
    #[inline]
    pub fn match_count(&self) -> usize {
        self.match_count
    }

    /// Content captured by the variable with the given name during the
    /// most recent match attempt.
    pub fn variable_content(
        &self,
        name: &str,
    ) -> Result<String, VariableError> {
        let var = self
            .variables
            .get(name)
            .ok_or_else(|| VariableError::UnknownName(name.to_string()))?;
        Ok(var.content().resolve(&self.subject).iter().collect())
    }

    /// Content captured by the variable with the given 1-based occurrence
    /// index during the most recent match attempt.
    pub fn variable_content_by_index(
        &self,
        index: usize,
    ) -> Result<String, VariableError> {
        let var = self
            .variables
            .values()
            .find(|v| v.occurrence() == index)
            .ok_or(VariableError::UnknownIndex(index))?;
        Ok(var.content().resolve(&self.subject).iter().collect())
    }

    /// Returns a copy of the subject in which the first match of the
    /// pattern is replaced by `replacement`. The subject itself is not
    /// modified.
    pub fn replace_first(&mut self, replacement: &str) -> String {
        self.reset();
        let mut result = String::with_capacity(self.subject.len());
        if self.next_match() {
            let span = self.matched.clone().unwrap();
            result.extend(&self.subject[..span.start]);
            result.push_str(replacement);
            result.extend(&self.subject[span.end..]);
        } else {
            result.extend(self.subject.iter());
        }
        result
    }

    /// Returns a copy of the subject in which every match of the pattern
    /// is replaced by `replacement`. The subject itself is not modified.
    pub fn replace_all(&mut self, replacement: &str) -> String {
        self.reset();
        let mut result = String::with_capacity(self.subject.len());
        let mut copied = 0;
        while self.next_match() {
            let span = self.matched.clone().unwrap();
            result.extend(&self.subject[copied..span.start]);
            result.push_str(replacement);
            copied = span.end;
        }
        result.extend(&self.subject[copied..]);
        result
    }

    /// Puts the matcher back in its initial state, forgetting any match
    /// found so far.
    pub fn reset(&mut self) {
        self.matched = None;
        self.scan_pos = 0;
        self.match_count = 0;
        self.start_attempt(0);
    }

    fn start_attempt(&mut self, pos: usize) {
        self.state = SRC;
        self.cursor = pos;
        for var in self.variables.values_mut() {
            var.reset();
        }
    }

    /// Rides the automaton from the current state until the sink is
    /// reached or the attempt fails.
    fn ride(&mut self) -> bool {
        let mut stalled = 0;
        while self.state != SNK {
            match self.step() {
                StepOutcome::Rejected => return false,
                StepOutcome::Consumed(n) if n > 0 => {
                    self.cursor += n;
                    stalled = 0;
                }
                _ => {
                    stalled += 1;
                    // A cycle of zero-width transitions revisits some
                    // state without consuming anything and would spin
                    // forever.
                    if stalled > self.automaton().state_count() {
                        return false;
                    }
                }
            }
        }
        true
    }

    fn step(&mut self) -> StepOutcome {
        match self.matching_edge() {
            Some((pos, consumed, consuming)) => {
                self.traverse(pos, consumed, consuming)
            }
            None => StepOutcome::Rejected,
        }
    }

    /// Finds the outgoing edge of the current state that accepts the
    /// input at the cursor. Returns its position in the state's edge
    /// list, the length of the token it consumes, and whether it is a
    /// consuming edge at all. See the [module docs](self) for the probe
    /// order.
    fn matching_edge(&self) -> Option<(usize, usize, bool)> {
        let automaton = self.automaton();
        let index = automaton.index(self.state);
        let edges = automaton.edges(self.state);
        let remaining = &self.subject[self.cursor..];

        for &i in index.boundaries.iter() {
            if let State::Boundary { kind } = automaton.state(edges[i].to) {
                let ctx = BoundaryContext {
                    subject: &self.subject,
                    pos: self.cursor,
                    last_match_end: self.matched.as_ref().map(|m| m.end),
                };
                if kind.is_satisfied(&ctx) {
                    return Some((i, 0, false));
                }
            }
        }

        if let Some(c) = remaining.first() {
            if let Some(&i) = index.literals.get(c) {
                return Some((i, 1, true));
            }
        }

        for &i in index.sets.iter() {
            if let State::Set { len, class } = automaton.state(edges[i].to) {
                if remaining.len() >= *len
                    && remaining[..*len].iter().all(|c| class.contains(*c))
                {
                    return Some((i, *len, true));
                }
            }
        }

        let backref = index.backref.and_then(|i| {
            if let State::Backref { variable } = automaton.state(edges[i].to) {
                let content = self.variables[variable.as_str()]
                    .content()
                    .resolve(&self.subject);
                if remaining.starts_with(content) {
                    return Some((i, content.len(), true));
                }
            }
            None
        });
        let empty = index.empty_literal.map(|i| (i, 0, true));

        if remaining.is_empty() {
            empty.or(backref)
        } else {
            backref.or(empty)
        }
    }

    /// Traverses the edge at `edge_pos`: applies its memory actions, then
    /// feeds the consumed token to every open variable and moves to the
    /// destination state.
    fn traverse(
        &mut self,
        edge_pos: usize,
        consumed: usize,
        consuming: bool,
    ) -> StepOutcome {
        let edge = &self.automaton().edges(self.state)[edge_pos];
        let to = edge.to;
        let actions = edge.actions.clone();

        for action in actions {
            // Declared by the compiler, present by construction.
            let var =
                self.variables.get_mut(action.variable.as_str()).unwrap();
            var.apply(action.action, self.cursor);
        }

        self.state = to;

        if consuming {
            for var in self.variables.values_mut() {
                if var.is_open() {
                    var.feed(consumed);
                }
            }
            StepOutcome::Consumed(consumed)
        } else {
            StepOutcome::NotConsumed
        }
    }

    /// Upper bound on the number of code points the next step can
    /// consume: zero when a boundary edge leaves the current state, the
    /// longest of the literal, set and backreference token lengths
    /// otherwise, clamped to the remaining input.
    pub fn max_next_token_len(&self) -> usize {
        let automaton = self.automaton();
        let index = automaton.index(self.state);
        let edges = automaton.edges(self.state);

        if !index.boundaries.is_empty() {
            return 0;
        }

        let mut max = 0;
        if !index.literals.is_empty() {
            max = 1;
        }
        for &i in index.sets.iter() {
            if let State::Set { len, .. } = automaton.state(edges[i].to) {
                max = max.max(*len);
            }
        }
        if let Some(i) = index.backref {
            if let State::Backref { variable } =
                automaton.state(edges[i].to)
            {
                max = max.max(
                    self.variables[variable.as_str()].content().len(),
                );
            }
        }
        max.min(self.subject.len() - self.cursor)
    }
}
