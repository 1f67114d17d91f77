/*! The pattern AST consumed by the compiler.

This crate does not parse regex syntax; an external parser is expected to
produce an [`Ast`] and hand it to [`compile`](crate::compile). The
builder functions on [`Ast`] make it straightforward to assemble patterns
programmatically:

```
use moa_regex::{Ast, CharClass};

// (?<x>\d+)-\k<x>
let ast = Ast::seq([
    Ast::capture("x", Ast::plus(Ast::class(CharClass::Digit))),
    Ast::literal('-'),
    Ast::backref("x"),
]);
```

There is no dedicated node for `zero-or-more`: [`Ast::star`] desugars to
`one-or-more | empty`, and [`Ast::opt`] to `inner | empty`.
*/

use std::fmt::{Display, Formatter};

use crate::automaton::{BoundaryKind, CharClass};

/// A node of the pattern AST.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Ast {
    /// The empty pattern, matching the empty string.
    Empty,
    /// A single code point.
    Literal(char),
    /// A character class, like `\d` or `[a-f]`.
    Class(CharClass),
    /// A zero-width assertion, like `^` or `\z`.
    Boundary(BoundaryKind),
    /// Two patterns in sequence.
    Concat(Box<Ast>, Box<Ast>),
    /// Alternation between two patterns.
    Choice(Box<Ast>, Box<Ast>),
    /// One or more repetitions of a pattern.
    OneOrMore(Box<Ast>),
    /// A named capturing group, `(?<name>...)`.
    Capture {
        /// Name of the capture variable bound by the group.
        name: String,
        /// The group's body.
        inner: Box<Ast>,
    },
    /// A backreference to a named capture, `\k<name>`.
    Backref(String),
}

impl Ast {
    /// The empty pattern.
    pub fn empty() -> Ast {
        Ast::Empty
    }

    /// A single code point.
    pub fn literal(c: char) -> Ast {
        Ast::Literal(c)
    }

    /// A sequence of code points, as a concatenation of literals.
    pub fn text(s: &str) -> Ast {
        Ast::seq(s.chars().map(Ast::Literal))
    }

    /// A character class.
    pub fn class(class: CharClass) -> Ast {
        Ast::Class(class)
    }

    /// A zero-width assertion.
    pub fn boundary(kind: BoundaryKind) -> Ast {
        Ast::Boundary(kind)
    }

    /// `a` followed by `b`.
    pub fn concat(a: Ast, b: Ast) -> Ast {
        Ast::Concat(Box::new(a), Box::new(b))
    }

    /// A sequence of patterns. An empty sequence is the empty pattern.
    pub fn seq<I: IntoIterator<Item = Ast>>(items: I) -> Ast {
        let mut items = items.into_iter();
        let first = match items.next() {
            Some(first) => first,
            None => return Ast::Empty,
        };
        items.fold(first, Ast::concat)
    }

    /// Either `a` or `b`.
    pub fn choice(a: Ast, b: Ast) -> Ast {
        Ast::Choice(Box::new(a), Box::new(b))
    }

    /// One or more repetitions of `inner`.
    pub fn plus(inner: Ast) -> Ast {
        Ast::OneOrMore(Box::new(inner))
    }

    /// Zero or more repetitions of `inner`, expressed as
    /// `one-or-more | empty`.
    pub fn star(inner: Ast) -> Ast {
        Ast::choice(Ast::plus(inner), Ast::Empty)
    }

    /// Zero or one occurrence of `inner`, expressed as `inner | empty`.
    pub fn opt(inner: Ast) -> Ast {
        Ast::choice(inner, Ast::Empty)
    }

    /// A capturing group binding the variable `name` over `inner`.
    pub fn capture<S: Into<String>>(name: S, inner: Ast) -> Ast {
        Ast::Capture { name: name.into(), inner: Box::new(inner) }
    }

    /// A backreference to the variable `name`.
    pub fn backref<S: Into<String>>(name: S) -> Ast {
        Ast::Backref(name.into())
    }
}

/// Code points with a meaning in regex syntax, escaped when a literal is
/// rendered.
const METACHARS: &[char] =
    &['\\', '(', ')', '|', '+', '*', '?', '.', '^', '$', '[', ']'];

impl Display for Ast {
    /// Renders an approximate textual form of the pattern. Used in error
    /// messages; not guaranteed to round-trip through a parser.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Ast::Empty => Ok(()),
            Ast::Literal(c) => {
                if METACHARS.contains(c) {
                    write!(f, "\\{c}")
                } else {
                    write!(f, "{c}")
                }
            }
            Ast::Class(class) => write!(f, "{class}"),
            Ast::Boundary(kind) => write!(f, "{kind}"),
            Ast::Concat(a, b) => write!(f, "{a}{b}"),
            Ast::Choice(a, b) => write!(f, "({a}|{b})"),
            Ast::OneOrMore(inner) => write!(f, "({inner})+"),
            Ast::Capture { name, inner } => {
                write!(f, "(?<{name}>{inner})")
            }
            Ast::Backref(name) => write!(f, "\\k<{name}>"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::Ast;
    use crate::automaton::{BoundaryKind, CharClass};

    #[test]
    fn builders() {
        assert_eq!(Ast::seq([]), Ast::Empty);
        assert_eq!(Ast::text(""), Ast::Empty);
        assert_eq!(
            Ast::text("ab"),
            Ast::concat(Ast::Literal('a'), Ast::Literal('b'))
        );
        assert_eq!(
            Ast::star(Ast::literal('a')),
            Ast::choice(Ast::plus(Ast::literal('a')), Ast::Empty)
        );
    }

    #[test]
    fn rendering() {
        let ast = Ast::seq([
            Ast::boundary(BoundaryKind::StartOfLine),
            Ast::capture("x", Ast::star(Ast::class(CharClass::Digit))),
            Ast::literal('-'),
            Ast::backref("x"),
        ]);
        assert_eq!(ast.to_string(), r"^(?<x>((\d)+|))-\k<x>");
        assert_eq!(Ast::literal('+').to_string(), r"\+");
    }
}
