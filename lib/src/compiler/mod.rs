/*! Compiles a pattern [`Ast`] into a memory occurrence automaton.

The compiler works in two passes over the AST. The first pass allocates
one automaton state per consuming leaf (literals, classes, boundaries and
backreferences), in pre-order. The second pass builds, bottom-up, the
edge set of the subgraph recognizing each node. Every subgraph is framed
by the automaton's shared [`SRC`] and [`SNK`] handles, so composing two
subgraphs never re-plumbs states; it only fuses edges:

* concatenation fuses every edge of the left subgraph reaching the sink
  with every edge of the right subgraph leaving the source;
* `one-or-more` fuses every edge reaching the sink with every edge
  leaving the source of the *same* subgraph, closing the loop;
* a capture group doesn't add edges at all, it decorates the subgraph's
  border edges with the open/close/reset actions for its variable.

The result is frozen before being returned, which is where determinism
is enforced: a pattern whose automaton would need two distinguishable
ways out of some state is rejected as a whole.
*/

use indexmap::IndexMap;

use crate::ast::Ast;
use crate::automaton::{
    Automaton, DeterminismError, Edge, State, StateId, SNK, SRC,
};
use crate::variables::{Action, MemoryAction, MemoryActions, Variable};

mod errors;
mod patterns;


pub use errors::*;
pub use patterns::*;

/// Compiles an AST into an automaton.
pub(crate) struct Compiler {
    automaton: Automaton,
    variables: IndexMap<String, Variable>,
    /// States allocated by the first pass, in pre-order.
    state_ids: Vec<StateId>,
    /// Cursor into `state_ids`, consumed by the second pass, which visits
    /// the leaves in the same order.
    next_state: usize,
}

impl Compiler {
    pub(crate) fn new() -> Self {
        Self {
            automaton: Automaton::new(),
            variables: IndexMap::new(),
            state_ids: Vec::new(),
            next_state: 0,
        }
    }

    /// Compiles `ast` into a frozen automaton.
    pub(crate) fn compile(
        mut self,
        ast: &Ast,
    ) -> Result<Automaton, DeterminismError> {
        self.allocate_states(ast);
        for edge in self.subgraph(ast) {
            self.automaton.add_edge(edge.from, edge.to, edge.actions);
        }

        // Capture groups get their 1-based occurrence index in pre-order;
        // variables that appear only in backreferences are numbered after
        // them, in first-mention order.
        let mut next_occurrence = 1;
        self.number_bindings(ast, &mut next_occurrence);
        for var in self.variables.values_mut() {
            if var.occurrence() == 0 {
                var.set_occurrence(next_occurrence);
                next_occurrence += 1;
            }
        }

        let Compiler { mut automaton, variables, .. } = self;
        automaton.set_variables(variables);
        automaton.freeze()?;
        Ok(automaton)
    }

    fn allocate_states(&mut self, ast: &Ast) {
        match ast {
            Ast::Empty => {}
            Ast::Literal(c) => {
                let id = self
                    .automaton
                    .add_state(State::Literal { label: Some(*c) });
                self.state_ids.push(id);
            }
            Ast::Class(class) => {
                let id = self
                    .automaton
                    .add_state(State::Set { len: 1, class: *class });
                self.state_ids.push(id);
            }
            Ast::Boundary(kind) => {
                let id =
                    self.automaton.add_state(State::Boundary { kind: *kind });
                self.state_ids.push(id);
            }
            Ast::Backref(name) => {
                self.declare_variable(name);
                let id = self
                    .automaton
                    .add_state(State::Backref { variable: name.clone() });
                self.state_ids.push(id);
            }
            Ast::Concat(a, b) | Ast::Choice(a, b) => {
                self.allocate_states(a);
                self.allocate_states(b);
            }
            Ast::OneOrMore(inner) => self.allocate_states(inner),
            Ast::Capture { name, inner } => {
                self.declare_variable(name);
                self.allocate_states(inner);
            }
        }
    }

    fn declare_variable(&mut self, name: &str) {
        if !self.variables.contains_key(name) {
            self.variables.insert(name.to_string(), Variable::new(name));
        }
    }

    /// Returns the edges of the subgraph recognizing `ast`, framed by the
    /// shared [`SRC`] and [`SNK`] handles.
    fn subgraph(&mut self, ast: &Ast) -> Vec<Edge> {
        match ast {
            Ast::Empty => {
                vec![Edge { from: SRC, to: SNK, actions: MemoryActions::new() }]
            }
            Ast::Literal(_)
            | Ast::Class(_)
            | Ast::Boundary(_)
            | Ast::Backref(_) => {
                let s = self.state_ids[self.next_state];
                self.next_state += 1;
                vec![
                    Edge { from: SRC, to: s, actions: MemoryActions::new() },
                    Edge { from: s, to: SNK, actions: MemoryActions::new() },
                ]
            }
            Ast::Concat(a, b) => {
                let a = self.subgraph(a);
                let b = self.subgraph(b);
                splice(a, b)
            }
            Ast::Choice(a, b) => {
                let mut edges = self.subgraph(a);
                for edge in self.subgraph(b) {
                    push_unique(&mut edges, edge);
                }
                edges
            }
            Ast::OneOrMore(inner) => {
                let mut edges = self.subgraph(inner);
                close_loop(&mut edges);
                edges
            }
            Ast::Capture { name, inner } => {
                let mut edges = self.subgraph(inner);
                bind(&mut edges, name);
                edges
            }
        }
    }

    fn number_bindings(&mut self, ast: &Ast, next: &mut usize) {
        match ast {
            Ast::Capture { name, inner } => {
                let var = self.variables.get_mut(name.as_str()).unwrap();
                if var.occurrence() == 0 {
                    var.set_occurrence(*next);
                    *next += 1;
                }
                self.number_bindings(inner, next);
            }
            Ast::Concat(a, b) | Ast::Choice(a, b) => {
                self.number_bindings(a, next);
                self.number_bindings(b, next);
            }
            Ast::OneOrMore(inner) => self.number_bindings(inner, next),
            _ => {}
        }
    }
}

/// Appends `edge` unless an identical edge is already present. Identical
/// edges describe the same transition, and keeping a single copy is what
/// lets patterns like `(a+)+` or `(a|)|(b|)` pass the determinism check.
fn push_unique(edges: &mut Vec<Edge>, edge: Edge) {
    if !edges.contains(&edge) {
        edges.push(edge);
    }
}

/// Connects subgraph `a` before subgraph `b`. Inner edges of both are
/// kept as they are; every edge of `a` into the sink is fused pairwise
/// with every edge of `b` out of the source, and the fused edge carries
/// the merged actions of both.
fn splice(a: Vec<Edge>, b: Vec<Edge>) -> Vec<Edge> {
    let mut edges = Vec::with_capacity(a.len() + b.len());
    for edge in a.iter().filter(|e| e.to != SNK) {
        push_unique(&mut edges, edge.clone());
    }
    for edge in b.iter().filter(|e| e.from != SRC) {
        push_unique(&mut edges, edge.clone());
    }
    for ea in a.iter().filter(|e| e.to == SNK) {
        for eb in b.iter().filter(|e| e.from == SRC) {
            push_unique(
                &mut edges,
                Edge {
                    from: ea.from,
                    to: eb.to,
                    actions: merge_actions(&ea.actions, &eb.actions),
                },
            );
        }
    }
    edges
}

/// Adds the repetition edges of `one-or-more`: every way of finishing an
/// iteration is fused with every way of starting the next one.
fn close_loop(edges: &mut Vec<Edge>) {
    let finishing: Vec<Edge> =
        edges.iter().filter(|e| e.to == SNK).cloned().collect();
    let starting: Vec<Edge> =
        edges.iter().filter(|e| e.from == SRC).cloned().collect();
    for ef in finishing.iter() {
        for es in starting.iter() {
            push_unique(
                edges,
                Edge {
                    from: ef.from,
                    to: es.to,
                    actions: merge_actions(&ef.actions, &es.actions),
                },
            );
        }
    }
}

/// Merges the action lists of two fused edges. Every action of the second
/// edge survives. An action of the first edge survives only if the second
/// edge doesn't open or reset its variable, as the new capture supersedes
/// whatever the first edge did with it. Surviving first-edge actions run
/// before the second edge's, and exact duplicates are kept once.
fn merge_actions(
    first: &MemoryActions,
    second: &MemoryActions,
) -> MemoryActions {
    let mut merged = MemoryActions::new();
    for action in first {
        let superseded = second.iter().any(|a| {
            a.variable == action.variable
                && matches!(a.action, Action::Open | Action::Reset)
        });
        if !superseded && !merged.contains(action) {
            merged.push(action.clone());
        }
    }
    for action in second {
        if !merged.contains(action) {
            merged.push(action.clone());
        }
    }
    merged
}

/// Decorates a subgraph's border edges with the capture actions for
/// `name`. Edges leaving the source open the variable; when such an edge
/// goes straight to the sink the group matched the empty string and the
/// variable is reset instead. Edges reaching the sink from an inner state
/// close it.
fn bind(edges: &mut Vec<Edge>, name: &str) {
    for edge in edges.iter_mut() {
        if edge.from == SRC {
            let action =
                if edge.to == SNK { Action::Reset } else { Action::Open };
            let action = MemoryAction::new(name, action);
            if !edge.actions.contains(&action) {
                edge.actions.insert(0, action);
            }
        }
    }
    for edge in edges.iter_mut() {
        if edge.to == SNK && edge.from != SRC {
            let action = MemoryAction::new(name, Action::Close);
            if !edge.actions.contains(&action) {
                edge.actions.push(action);
            }
        }
    }
}
