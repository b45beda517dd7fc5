// SPDX-License-Identifier: Apache-2.0

//! Token scanner for structural Verilog netlists.
//!
//! The scanner pulls bytes from any `Read` source on demand and yields one
//! token at a time, so a caller never materializes the full token list.
//! Comments, newlines and horizontal whitespace are consumed but never
//! produced as tokens.

use std::fmt;
use std::io::{BufRead, BufReader, Read};

use crate::netlist::error::NetlistError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Module,
    Endmodule,
    Input,
    Output,
    Wire,
}

impl Keyword {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "module" => Some(Keyword::Module),
            "endmodule" => Some(Keyword::Endmodule),
            "input" => Some(Keyword::Input),
            "output" => Some(Keyword::Output),
            "wire" => Some(Keyword::Wire),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Module => "module",
            Keyword::Endmodule => "endmodule",
            Keyword::Input => "input",
            Keyword::Output => "output",
            Keyword::Wire => "wire",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenPayload {
    Identifier(String),
    Number(u32),
    Keyword(Keyword),
    OParen,
    CParen,
    OBrack,
    CBrack,
    Colon,
    Dot,
    Comma,
    Semi,
}

/// Payload-free classification of a token, used by the parser to accept or
/// expect the next token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Identifier,
    Number,
    Keyword(Keyword),
    OParen,
    CParen,
    OBrack,
    CBrack,
    Colon,
    Dot,
    Comma,
    Semi,
}

impl TokenPayload {
    pub fn kind(&self) -> TokenKind {
        match self {
            TokenPayload::Identifier(_) => TokenKind::Identifier,
            TokenPayload::Number(_) => TokenKind::Number,
            TokenPayload::Keyword(kw) => TokenKind::Keyword(*kw),
            TokenPayload::OParen => TokenKind::OParen,
            TokenPayload::CParen => TokenKind::CParen,
            TokenPayload::OBrack => TokenKind::OBrack,
            TokenPayload::CBrack => TokenKind::CBrack,
            TokenPayload::Colon => TokenKind::Colon,
            TokenPayload::Dot => TokenKind::Dot,
            TokenPayload::Comma => TokenKind::Comma,
            TokenPayload::Semi => TokenKind::Semi,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Identifier => write!(f, "identifier"),
            TokenKind::Number => write!(f, "number"),
            TokenKind::Keyword(kw) => write!(f, "'{}'", kw.as_str()),
            TokenKind::OParen => write!(f, "'('"),
            TokenKind::CParen => write!(f, "')'"),
            TokenKind::OBrack => write!(f, "'['"),
            TokenKind::CBrack => write!(f, "']'"),
            TokenKind::Colon => write!(f, "':'"),
            TokenKind::Dot => write!(f, "'.'"),
            TokenKind::Comma => write!(f, "','"),
            TokenKind::Semi => write!(f, "';'"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pos {
    pub lineno: u32,
    pub colno: u32,
}

impl Pos {
    pub const START: Pos = Pos {
        lineno: 1,
        colno: 1,
    };
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.lineno, self.colno)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub limit: Pos,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub payload: TokenPayload,
    pub span: Span,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        self.payload.kind()
    }
}

pub struct TokenScanner<R: Read> {
    reader: BufReader<R>,
    pub pos: Pos,
    /// Set once the input is exhausted or an error has been reported; no
    /// further tokens are produced afterwards.
    done: bool,
    /// Reader failure, reported in place of the next token.
    read_error: Option<NetlistError>,
}

impl<R: Read> TokenScanner<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            pos: Pos::START,
            done: false,
            read_error: None,
        }
    }
}

impl<'a> TokenScanner<&'a [u8]> {
    /// Construct a TokenScanner over an in-memory string.
    pub fn from_str(input: &'a str) -> Self {
        Self::new(input.as_bytes())
    }
}

impl<R: Read> TokenScanner<R> {
    #[inline]
    fn peekb(&mut self) -> Option<u8> {
        if self.done {
            return None;
        }
        match self.reader.fill_buf() {
            Ok(buf) => buf.first().copied(),
            Err(e) => {
                log::debug!("TokenScanner: read error at {}: {}", self.pos, e);
                self.done = true;
                self.read_error = Some(NetlistError::Read {
                    message: e.to_string(),
                    pos: self.pos,
                });
                None
            }
        }
    }

    #[inline]
    fn popb(&mut self) -> Option<u8> {
        let b = self.peekb()?;
        if b == b'\n' {
            self.pos.lineno += 1;
            self.pos.colno = 1;
        } else {
            self.pos.colno += 1;
        }
        self.reader.consume(1);
        Some(b)
    }

    /// Pops the (possibly multi-byte) character starting with `lead` so that
    /// errors can name it.
    fn pop_char(&mut self, lead: u8) -> char {
        self.popb();
        let width = match lead {
            0x00..=0x7f => return lead as char,
            0xc0..=0xdf => 2,
            0xe0..=0xef => 3,
            0xf0..=0xf7 => 4,
            _ => 1,
        };
        let mut bytes = vec![lead];
        while bytes.len() < width {
            match self.peekb() {
                Some(b) if b & 0xc0 == 0x80 => {
                    self.reader.consume(1);
                    bytes.push(b);
                }
                _ => break,
            }
        }
        String::from_utf8_lossy(&bytes)
            .chars()
            .next()
            .unwrap_or(char::REPLACEMENT_CHARACTER)
    }

    fn pop_word(&mut self) -> String {
        let mut word = String::new();
        while let Some(b) = self.peekb() {
            if b.is_ascii_alphanumeric() || b == b'_' {
                self.popb();
                word.push(b as char);
            } else {
                break;
            }
        }
        word
    }

    fn pop_number(&mut self, start: Pos) -> Result<Token, NetlistError> {
        let mut digits = String::new();
        while let Some(b) = self.peekb() {
            if b.is_ascii_digit() {
                self.popb();
                digits.push(b as char);
            } else {
                break;
            }
        }
        let value = digits.parse::<u32>().map_err(|_| {
            self.done = true;
            NetlistError::NumberOutOfRange {
                text: digits.clone(),
                pos: start,
            }
        })?;
        Ok(Token {
            payload: TokenPayload::Number(value),
            span: Span {
                start,
                limit: self.pos,
            },
        })
    }

    fn pop_identifier(&mut self, start: Pos) -> Token {
        let ident = self.pop_word();
        let payload = match Keyword::from_str(&ident) {
            Some(kw) => TokenPayload::Keyword(kw),
            None => TokenPayload::Identifier(ident),
        };
        Token {
            payload,
            span: Span {
                start,
                limit: self.pos,
            },
        }
    }

    fn skip_line_comment(&mut self) {
        while let Some(b) = self.popb() {
            if b == b'\n' {
                break;
            }
        }
    }

    fn unexpected_character(&mut self, lead: u8, start: Pos) -> NetlistError {
        let ch = self.pop_char(lead);
        self.done = true;
        log::debug!("TokenScanner: unexpected character {:?} at {}", ch, start);
        NetlistError::UnexpectedCharacter { ch, pos: start }
    }

    pub fn next_token(&mut self) -> Result<Option<Token>, NetlistError> {
        if let Some(err) = self.read_error.take() {
            return Err(err);
        }
        loop {
            let start = self.pos;
            let b = match self.peekb() {
                Some(b) => b,
                None => return self.read_error.take().map_or(Ok(None), Err),
            };
            match b {
                b'/' => {
                    self.popb();
                    if self.peekb() == Some(b'/') {
                        self.skip_line_comment();
                        continue;
                    }
                    self.done = true;
                    return Err(NetlistError::UnexpectedCharacter {
                        ch: '/',
                        pos: start,
                    });
                }
                b'\n' | b' ' | b'\t' | b'\r' => {
                    self.popb();
                    continue;
                }
                b'0'..=b'9' => return self.pop_number(start).map(Some),
                b'A'..=b'Z' | b'a'..=b'z' | b'_' => return Ok(Some(self.pop_identifier(start))),
                _ => {}
            }
            let payload = match b {
                b'(' => TokenPayload::OParen,
                b')' => TokenPayload::CParen,
                b'[' => TokenPayload::OBrack,
                b']' => TokenPayload::CBrack,
                b':' => TokenPayload::Colon,
                b'.' => TokenPayload::Dot,
                b',' => TokenPayload::Comma,
                b';' => TokenPayload::Semi,
                _ => return Err(self.unexpected_character(b, start)),
            };
            self.popb();
            return Ok(Some(Token {
                payload,
                span: Span {
                    start,
                    limit: self.pos,
                },
            }));
        }
    }
}

impl<R: Read> Iterator for TokenScanner<R> {
    type Item = Result<Token, NetlistError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done && self.read_error.is_none() {
            return None;
        }
        self.next_token().transpose()
    }
}
