// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use crate::netlist::scan::{Pos, TokenKind};

/// What the parser required at the point a syntax error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Token(TokenKind),
    EndOfFile,
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Token(kind) => write!(f, "{}", kind),
            Expected::EndOfFile => write!(f, "end of file"),
        }
    }
}

/// Error produced while scanning, parsing, or counting a netlist.
///
/// Every variant is fatal: the stage that raised it stops immediately and no
/// partial result is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetlistError {
    /// A character that does not begin any token.
    UnexpectedCharacter { ch: char, pos: Pos },
    /// The underlying reader failed; `pos` is where scanning stopped.
    Read { message: String, pos: Pos },
    /// An integer literal that does not fit in 32 bits.
    NumberOutOfRange { text: String, pos: Pos },
    /// The token stream did not match the grammar. `pos` is the start of the
    /// last token that was successfully consumed.
    Syntax {
        expected: Expected,
        found: Option<TokenKind>,
        pos: Pos,
    },
    DuplicateModule { name: String, pos: Pos },
    UnknownModule { name: String },
    /// A module instantiates itself, directly or through other modules.
    /// `path` starts and ends with the same module name.
    CyclicHierarchy { path: Vec<String> },
    /// A flattened count of `module` does not fit in a `u64`.
    CountOverflow { module: String },
}

impl NetlistError {
    /// Source position the error refers to, if any.
    pub fn pos(&self) -> Option<Pos> {
        match self {
            NetlistError::UnexpectedCharacter { pos, .. }
            | NetlistError::Read { pos, .. }
            | NetlistError::NumberOutOfRange { pos, .. }
            | NetlistError::Syntax { pos, .. }
            | NetlistError::DuplicateModule { pos, .. } => Some(*pos),
            NetlistError::UnknownModule { .. }
            | NetlistError::CyclicHierarchy { .. }
            | NetlistError::CountOverflow { .. } => None,
        }
    }

    pub fn is_lexical(&self) -> bool {
        matches!(
            self,
            NetlistError::UnexpectedCharacter { .. } | NetlistError::NumberOutOfRange { .. }
        )
    }
}

impl fmt::Display for NetlistError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetlistError::UnexpectedCharacter { ch, pos } => write!(
                f,
                "unexpected character {:?} on column {} of line {}",
                ch, pos.colno, pos.lineno
            ),
            NetlistError::Read { message, pos } => write!(
                f,
                "read error on column {} of line {}: {}",
                pos.colno, pos.lineno, message
            ),
            NetlistError::NumberOutOfRange { text, pos } => write!(
                f,
                "integer literal {} out of range on column {} of line {}",
                text, pos.colno, pos.lineno
            ),
            NetlistError::Syntax {
                expected,
                found,
                pos,
            } => {
                write!(
                    f,
                    "expected {} on column {} of line {}",
                    expected, pos.colno, pos.lineno
                )?;
                match found {
                    Some(kind) => write!(f, "; found {}", kind),
                    None => write!(f, "; found end of file"),
                }
            }
            NetlistError::DuplicateModule { name, pos } => write!(
                f,
                "module '{}' redefined on column {} of line {}",
                name, pos.colno, pos.lineno
            ),
            NetlistError::UnknownModule { name } => {
                write!(f, "module '{}' is not defined in the design", name)
            }
            NetlistError::CyclicHierarchy { path } => {
                write!(f, "cyclic module hierarchy: {}", path.join(" -> "))
            }
            NetlistError::CountOverflow { module } => write!(
                f,
                "instance count of module '{}' exceeds {}",
                module,
                u64::MAX
            ),
        }
    }
}

impl std::error::Error for NetlistError {}
