use std::io::{BufWriter, Read, Write};
#[cfg(feature = "logging")]
use std::time::Instant;

use bincode::Options;
#[cfg(feature = "logging")]
use log::*;
use serde::{Deserialize, Serialize};

use crate::ast::Ast;
use crate::automaton::Automaton;
use crate::compiler::{CompileError, Compiler, SerializationError};
use crate::matcher::Matcher;

/// File header that precedes a serialized [`Pattern`].
const MAGIC: &[u8; 6] = b"MOA-RX";

/// A compiled pattern.
///
/// Holds the frozen automaton produced by the compiler, ready for
/// matching. A `Pattern` is immutable and can be shared freely; every
/// call to [`Pattern::matcher`] gets its own private matching state.
#[derive(Serialize, Deserialize, Debug)]
pub struct Pattern {
    automaton: Automaton,
    source: String,
}

impl Pattern {
    /// Compiles the given AST into a pattern.
    ///
    /// Fails if the pattern doesn't compile to a deterministic
    /// automaton. In that case no pattern is produced at all; there is
    /// no partially usable result.
    pub fn compile(ast: &Ast) -> Result<Self, CompileError> {
        #[cfg(feature = "logging")]
        let start = Instant::now();

        let automaton = Compiler::new().compile(ast).map_err(|_| {
            CompileError::NonDeterministic { pattern: ast.to_string() }
        })?;

        #[cfg(feature = "logging")]
        info!("pattern compile time: {:?}", Instant::elapsed(&start));

        Ok(Self { automaton, source: ast.to_string() })
    }

    /// A textual rendering of the pattern.
    #[inline]
    pub fn source(&self) -> &str {
        self.source.as_str()
    }

    /// The underlying automaton.
    #[inline]
    pub fn automaton(&self) -> &Automaton {
        &self.automaton
    }

    /// Creates a [`Matcher`] that runs this pattern against `subject`.
    pub fn matcher<'r>(&'r self, subject: &str) -> Matcher<'r> {
        Matcher::new(self, subject)
    }

    /// Serializes the pattern into a vector of bytes.
    pub fn serialize(&self) -> Result<Vec<u8>, SerializationError> {
        let mut bytes = Vec::new();
        self.serialize_into(&mut bytes)?;
        Ok(bytes)
    }

    /// Serializes the pattern into a writer.
    pub fn serialize_into<W>(
        &self,
        writer: W,
    ) -> Result<(), SerializationError>
    where
        W: Write,
    {
        let mut writer = BufWriter::new(writer);
        writer.write_all(MAGIC)?;
        Ok(bincode::DefaultOptions::new()
            .with_varint_encoding()
            .serialize_into(writer, self)?)
    }

    /// Deserializes a pattern from a slice of bytes produced by
    /// [`Pattern::serialize`].
    pub fn deserialize<S>(bytes: S) -> Result<Self, SerializationError>
    where
        S: AsRef<[u8]>,
    {
        Self::deserialize_from(bytes.as_ref())
    }

    /// Deserializes a pattern from a reader.
    pub fn deserialize_from<R>(
        mut reader: R,
    ) -> Result<Self, SerializationError>
    where
        R: Read,
    {
        #[cfg(feature = "logging")]
        let start = Instant::now();

        let mut magic = [0_u8; MAGIC.len()];
        reader.read_exact(&mut magic)?;

        if &magic != MAGIC {
            return Err(SerializationError::InvalidFormat);
        }

        let mut pattern: Pattern = bincode::DefaultOptions::new()
            .with_varint_encoding()
            .deserialize_from(reader)?;

        // The edge indices are not serialized. The automaton passed the
        // determinism check when it was frozen, so only the lookup
        // structures need rebuilding.
        pattern.automaton.rebuild_indices();

        #[cfg(feature = "logging")]
        info!("pattern deserialization time: {:?}", Instant::elapsed(&start));

        Ok(pattern)
    }
}
