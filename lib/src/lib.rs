/*! A deterministic regular expression engine with capturing groups and
backreferences.

Backreferences usually force a regex engine to backtrack, with the
well-known pathological running times that come with it. This crate
takes a different route: a pattern is compiled into a *memory occurrence
automaton*, a finite-state machine whose edges carry actions that open,
close, and reset named capture variables, and whose backreference
transitions consume the live content of those variables. The automaton
is required to be deterministic, so matching is a single forward pass
with no backtracking at all. Patterns that can't be represented
deterministically are rejected at compile time; a pattern that compiles
is guaranteed to match in linear rides.

Patterns are built programmatically as an [`Ast`] (this crate doesn't
include a parser for regex syntax) and compiled with [`compile`]:

```
use moa_regex::Ast;

// (?<x>a*)b\k<x>
let pattern = moa_regex::compile(&Ast::seq([
    Ast::capture("x", Ast::star(Ast::literal('a'))),
    Ast::literal('b'),
    Ast::backref("x"),
]))
.unwrap();

let mut matcher = pattern.matcher("aba");

assert!(matcher.matches());
assert_eq!(matcher.variable_content("x").unwrap(), "a");

assert!(!pattern.matcher("abaa").matches());
```

Compiled patterns can be serialized with [`Pattern::serialize`] and
loaded back with [`Pattern::deserialize`], skipping compilation
entirely.
*/

#![deny(missing_docs)]

pub use crate::ast::*;
pub use crate::automaton::*;
pub use crate::compiler::*;
pub use crate::matcher::*;
pub use crate::slice::*;
pub use crate::variables::*;

mod ast;
mod automaton;
mod compiler;
mod matcher;
mod slice;
mod variables;

#[cfg(test)]
mod tests;

/// Compiles a pattern AST into a [`Pattern`]. Shorthand for
/// [`Pattern::compile`].
pub fn compile(ast: &Ast) -> Result<Pattern, CompileError> {
    Pattern::compile(ast)
}
