/*! Structural determinism check for memory occurrence automata.

The check runs once, when an automaton is frozen. It is a pure function
of the edge graph: for every state, the outgoing edges are partitioned by
the kind of their destination state, and a set of rules guarantees that
at most one edge can legally match any given next input. This is what
lets the matcher run without backtracking.
*/

use rustc_hash::FxHashSet;

use super::{Automaton, CharClass, State, SNK};

/// Returns true if the automaton's edge structure is deterministic.
pub(crate) fn check(automaton: &Automaton) -> bool {
    (0..automaton.state_count()).all(|s| check_state(automaton, s))
}

fn check_state(automaton: &Automaton, state: usize) -> bool {
    let edges = automaton.edges(state);

    // Two edges sharing the exact same destination are already a
    // determinism violation.
    let mut destinations = FxHashSet::default();
    if !edges.iter().all(|e| destinations.insert(e.to)) {
        return false;
    }

    let mut literals: Vec<(Option<char>, usize)> = Vec::new();
    let mut sets: Vec<CharClass> = Vec::new();
    let mut boundaries = 0;
    let mut backrefs = 0;

    for edge in edges {
        match automaton.state(edge.to) {
            State::Literal { label } => literals.push((*label, edge.to)),
            State::Set { class, .. } => sets.push(*class),
            State::Boundary { .. } => boundaries += 1,
            State::Backref { .. } => backrefs += 1,
        }
    }

    if backrefs > 1 || boundaries > 1 {
        return false;
    }

    // Literal destinations must have pairwise-distinct labels.
    let mut labels = FxHashSet::default();
    if !literals.iter().all(|(label, _)| labels.insert(*label)) {
        return false;
    }

    // Set destinations must not cover any literal label, and set pairs
    // must not intersect anywhere in the alphabet.
    for class in sets.iter() {
        if literals
            .iter()
            .any(|(label, _)| matches!(label, Some(c) if class.contains(*c)))
        {
            return false;
        }
    }
    for (i, a) in sets.iter().enumerate() {
        for b in sets.iter().skip(i + 1) {
            if intersect(a, b) {
                return false;
            }
        }
    }

    // A backreference destination tolerates exactly one other edge: a
    // literal edge into the sink, which consumes nothing. This covers
    // backreference-or-nothing at the very end of the input; any other
    // combination is ambiguous.
    if backrefs > 0 {
        if !sets.is_empty() || boundaries > 0 {
            return false;
        }
        match literals.as_slice() {
            [] => {}
            [(None, to)] if *to == SNK => {}
            _ => return false,
        }
    }

    // A boundary destination can't coexist with literal or set
    // destinations.
    if boundaries > 0 && (!literals.is_empty() || !sets.is_empty()) {
        return false;
    }

    true
}

/// True if two class predicates accept a common code point, established
/// by probing every character value. This runs at most once per pair of
/// set edges at a state, at freeze time only.
fn intersect(a: &CharClass, b: &CharClass) -> bool {
    (0..=char::MAX as u32)
        .filter_map(char::from_u32)
        .any(|c| a.contains(c) && b.contains(c))
}
