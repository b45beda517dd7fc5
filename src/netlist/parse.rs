// SPDX-License-Identifier: Apache-2.0

//! Recursive descent parser for structural netlists.
//!
//! Grammar, one method per nonterminal:
//!
//! ```text
//! file      = { "module" IDENTIFIER "(" params ")" ";" nets instances "endmodule" }
//! params    = IDENTIFIER { "," IDENTIFIER }
//! nets      = { ("input" | "output" | "wire") dims IDENTIFIER ";" }
//! dims      = [ "[" NUMBER ":" NUMBER "]" ]
//! instances = { IDENTIFIER IDENTIFIER "(" args ")" ";" }
//! args      = arg { "," arg }
//! arg       = "." IDENTIFIER "(" IDENTIFIER [ "[" NUMBER [ ":" NUMBER ] "]" ] ")"
//! ```

use std::io::Read;

use crate::netlist::design::{
    Argument, Design, Instance, Module, NameId, NameInterner, Net, NetKind,
};
use crate::netlist::error::{Expected, NetlistError};
use crate::netlist::scan::{Keyword, Pos, Token, TokenKind, TokenPayload, TokenScanner};

/// One-token lookahead over a token stream.
///
/// `current` is the most recently consumed token (`None` before the first
/// one) and `lookahead` the next unconsumed token (`None` at end of stream).
pub struct TokenCursor<I>
where
    I: Iterator<Item = Result<Token, NetlistError>>,
{
    tokens: I,
    current: Option<Token>,
    lookahead: Option<Token>,
}

impl<I> TokenCursor<I>
where
    I: Iterator<Item = Result<Token, NetlistError>>,
{
    /// Primes the lookahead with the first token of `tokens`.
    pub fn new(tokens: I) -> Result<Self, NetlistError> {
        let mut cursor = Self {
            tokens,
            current: None,
            lookahead: None,
        };
        cursor.advance()?;
        Ok(cursor)
    }

    pub fn current(&self) -> Option<&Token> {
        self.current.as_ref()
    }

    pub fn lookahead(&self) -> Option<&Token> {
        self.lookahead.as_ref()
    }

    pub fn at_end(&self) -> bool {
        self.lookahead.is_none()
    }

    /// Shifts the lookahead into `current` and pulls the next token.
    pub fn advance(&mut self) -> Result<(), NetlistError> {
        self.current = self.lookahead.take();
        self.lookahead = self.tokens.next().transpose()?;
        Ok(())
    }

    /// Consumes the lookahead if it is of kind `kind`.
    pub fn accept(&mut self, kind: TokenKind) -> Result<bool, NetlistError> {
        match &self.lookahead {
            Some(tok) if tok.kind() == kind => {
                self.advance()?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Like `accept`, but a mismatch is a syntax error.
    pub fn expect(&mut self, kind: TokenKind) -> Result<(), NetlistError> {
        if self.accept(kind)? {
            Ok(())
        } else {
            Err(self.syntax_error(Expected::Token(kind)))
        }
    }

    pub fn expect_identifier(&mut self) -> Result<&str, NetlistError> {
        self.expect(TokenKind::Identifier)?;
        match self.current.as_ref().map(|t| &t.payload) {
            Some(TokenPayload::Identifier(s)) => Ok(s.as_str()),
            _ => Err(self.syntax_error(Expected::Token(TokenKind::Identifier))),
        }
    }

    pub fn expect_number(&mut self) -> Result<u32, NetlistError> {
        self.expect(TokenKind::Number)?;
        match self.current.as_ref().map(|t| &t.payload) {
            Some(TokenPayload::Number(n)) => Ok(*n),
            _ => Err(self.syntax_error(Expected::Token(TokenKind::Number))),
        }
    }

    /// Syntax error located at the last consumed token.
    pub fn syntax_error(&self, expected: Expected) -> NetlistError {
        let pos = self
            .current
            .as_ref()
            .map(|t| t.span.start)
            .unwrap_or(Pos::START);
        let found = self.lookahead.as_ref().map(Token::kind);
        log::debug!(
            "TokenCursor: expected {} at {}, found {:?}",
            expected,
            pos,
            found
        );
        NetlistError::Syntax {
            expected,
            found,
            pos,
        }
    }

    fn current_pos(&self) -> Pos {
        self.current
            .as_ref()
            .map(|t| t.span.start)
            .unwrap_or(Pos::START)
    }
}

pub struct Parser<R: Read> {
    scanner: TokenScanner<R>,
    interner: NameInterner,
}

impl<R: Read> Parser<R> {
    pub fn new(scanner: TokenScanner<R>) -> Self {
        Self {
            scanner,
            interner: NameInterner::new(),
        }
    }

    /// Parses the whole token stream into a `Design`.
    ///
    /// The parser is consumed: a token stream is read exactly once.
    pub fn parse_design(self) -> Result<Design, NetlistError> {
        let mut state = ParseState {
            cursor: TokenCursor::new(self.scanner)?,
            interner: self.interner,
        };
        let modules = state.parse_file()?;
        if !state.cursor.at_end() {
            return Err(state.cursor.syntax_error(Expected::EndOfFile));
        }
        log::debug!(
            "parse_design: {} modules, {} instances",
            modules.len(),
            modules.iter().map(|m| m.instances.len()).sum::<usize>()
        );
        Design::new(state.interner, modules)
    }
}

/// Parses netlist text held in memory.
pub fn parse_netlist_str(text: &str) -> Result<Design, NetlistError> {
    Parser::new(TokenScanner::from_str(text)).parse_design()
}

struct ParseState<I>
where
    I: Iterator<Item = Result<Token, NetlistError>>,
{
    cursor: TokenCursor<I>,
    interner: NameInterner,
}

impl<I> ParseState<I>
where
    I: Iterator<Item = Result<Token, NetlistError>>,
{
    fn expect_name(&mut self) -> Result<NameId, NetlistError> {
        let s = self.cursor.expect_identifier()?;
        Ok(self.interner.get_or_intern(s))
    }

    fn parse_file(&mut self) -> Result<Vec<Module>, NetlistError> {
        let mut modules = Vec::new();
        while self.cursor.accept(TokenKind::Keyword(Keyword::Module))? {
            let name = self.expect_name()?;
            let pos = self.cursor.current_pos();
            log::trace!(
                "parse_file: module {} at {}",
                self.interner.resolve(name).unwrap_or("<unknown>"),
                pos
            );
            self.cursor.expect(TokenKind::OParen)?;
            let params = self.parse_params()?;
            self.cursor.expect(TokenKind::CParen)?;
            self.cursor.expect(TokenKind::Semi)?;
            let nets = self.parse_nets()?;
            let instances = self.parse_instances()?;
            self.cursor.expect(TokenKind::Keyword(Keyword::Endmodule))?;
            modules.push(Module::new(name, params, nets, instances, pos));
        }
        Ok(modules)
    }

    fn parse_params(&mut self) -> Result<Vec<NameId>, NetlistError> {
        let mut params = vec![self.expect_name()?];
        while self.cursor.accept(TokenKind::Comma)? {
            params.push(self.expect_name()?);
        }
        Ok(params)
    }

    fn accept_net_kind(&mut self) -> Result<Option<NetKind>, NetlistError> {
        for (keyword, kind) in [
            (Keyword::Input, NetKind::Input),
            (Keyword::Output, NetKind::Output),
            (Keyword::Wire, NetKind::Wire),
        ] {
            if self.cursor.accept(TokenKind::Keyword(keyword))? {
                return Ok(Some(kind));
            }
        }
        Ok(None)
    }

    fn parse_nets(&mut self) -> Result<Vec<Net>, NetlistError> {
        let mut nets = Vec::new();
        while let Some(kind) = self.accept_net_kind()? {
            let (msb, lsb) = self.parse_dims()?;
            let name = self.expect_name()?;
            self.cursor.expect(TokenKind::Semi)?;
            nets.push(Net {
                kind,
                name,
                msb,
                lsb,
            });
        }
        Ok(nets)
    }

    /// Returns `(0, 0)` when no range is present.
    fn parse_dims(&mut self) -> Result<(u32, u32), NetlistError> {
        if !self.cursor.accept(TokenKind::OBrack)? {
            return Ok((0, 0));
        }
        let msb = self.cursor.expect_number()?;
        self.cursor.expect(TokenKind::Colon)?;
        let lsb = self.cursor.expect_number()?;
        self.cursor.expect(TokenKind::CBrack)?;
        Ok((msb, lsb))
    }

    fn parse_instances(&mut self) -> Result<Vec<Instance>, NetlistError> {
        let mut instances = Vec::new();
        while self.cursor.accept(TokenKind::Identifier)? {
            let type_name = match self.cursor.current().map(|t| &t.payload) {
                Some(TokenPayload::Identifier(s)) => self.interner.get_or_intern(s.as_str()),
                _ => {
                    return Err(self
                        .cursor
                        .syntax_error(Expected::Token(TokenKind::Identifier)));
                }
            };
            let instance_name = self.expect_name()?;
            let pos = self.cursor.current_pos();
            self.cursor.expect(TokenKind::OParen)?;
            let args = self.parse_args()?;
            self.cursor.expect(TokenKind::CParen)?;
            self.cursor.expect(TokenKind::Semi)?;
            instances.push(Instance {
                type_name,
                instance_name,
                args,
                pos,
            });
        }
        Ok(instances)
    }

    fn parse_args(&mut self) -> Result<Vec<Argument>, NetlistError> {
        let mut args = vec![self.parse_arg()?];
        while self.cursor.accept(TokenKind::Comma)? {
            args.push(self.parse_arg()?);
        }
        Ok(args)
    }

    /// A single index `[n]` selects bit `n`, so both `msb` and `lsb` are `n`.
    fn parse_arg(&mut self) -> Result<Argument, NetlistError> {
        self.cursor.expect(TokenKind::Dot)?;
        let param = self.expect_name()?;
        self.cursor.expect(TokenKind::OParen)?;
        let arg = self.expect_name()?;
        let (mut msb, mut lsb) = (0, 0);
        if self.cursor.accept(TokenKind::OBrack)? {
            msb = self.cursor.expect_number()?;
            lsb = msb;
            if self.cursor.accept(TokenKind::Colon)? {
                lsb = self.cursor.expect_number()?;
            }
            self.cursor.expect(TokenKind::CBrack)?;
        }
        self.cursor.expect(TokenKind::CParen)?;
        Ok(Argument {
            param,
            arg,
            msb,
            lsb,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use test_case::test_case;

    fn syntax_error(src: &str) -> (Expected, Option<TokenKind>, Pos) {
        match parse_netlist_str(src) {
            Err(NetlistError::Syntax {
                expected,
                found,
                pos,
            }) => (expected, found, pos),
            other => panic!("expected syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_cursor_accept_and_expect() {
        let scanner = TokenScanner::from_str("module m ;");
        let mut cursor = TokenCursor::new(scanner).unwrap();
        assert!(cursor.current().is_none());
        assert!(!cursor.accept(TokenKind::Identifier).unwrap());
        assert!(cursor.current().is_none());
        assert!(cursor.accept(TokenKind::Keyword(Keyword::Module)).unwrap());
        assert_eq!(cursor.expect_identifier().unwrap(), "m");
        let err = cursor.expect(TokenKind::Comma).unwrap_err();
        assert_eq!(
            err,
            NetlistError::Syntax {
                expected: Expected::Token(TokenKind::Comma),
                found: Some(TokenKind::Semi),
                pos: Pos {
                    lineno: 1,
                    colno: 8
                },
            }
        );
        cursor.expect(TokenKind::Semi).unwrap();
        assert!(cursor.at_end());
        assert!(!cursor.accept(TokenKind::Semi).unwrap());
    }

    #[test]
    fn test_cursor_surfaces_lexical_error_on_advance() {
        let scanner = TokenScanner::from_str("a @");
        let mut cursor = TokenCursor::new(scanner).unwrap();
        let err = cursor.accept(TokenKind::Identifier).unwrap_err();
        assert!(err.is_lexical());
    }

    #[test]
    fn test_parse_empty_input() {
        let design = parse_netlist_str("// nothing here\n").unwrap();
        assert!(design.is_empty());
    }

    #[test]
    fn test_parse_module_structure() {
        let src = "
module adder(a, b, sum);
  input [7:0] a;
  input [7:0] b;
  output [8:0] sum;
  wire carry;
  FA fa0(.A(a[0]), .B(b[0]), .S(sum[0]), .CO(carry));
  HA ha0(.A(carry), .S(sum[8:7]));
endmodule
";
        let design = parse_netlist_str(src).unwrap();
        assert_eq!(design.len(), 1);
        let m = design.module("adder").unwrap();
        let params: Vec<&str> = m.params.iter().map(|p| design.resolve(*p)).collect();
        assert_eq!(params, vec!["a", "b", "sum"]);
        let nets: Vec<(NetKind, &str, u32, u32)> = m
            .nets
            .iter()
            .map(|n| (n.kind, design.resolve(n.name), n.msb, n.lsb))
            .collect();
        assert_eq!(
            nets,
            vec![
                (NetKind::Input, "a", 7, 0),
                (NetKind::Input, "b", 7, 0),
                (NetKind::Output, "sum", 8, 0),
                (NetKind::Wire, "carry", 0, 0),
            ]
        );
        assert_eq!(m.instances.len(), 2);
        let fa0 = &m.instances[0];
        assert_eq!(design.resolve(fa0.type_name), "FA");
        assert_eq!(design.resolve(fa0.instance_name), "fa0");
        assert_eq!(fa0.args.len(), 4);
        assert_eq!(
            fa0.pos,
            Pos {
                lineno: 7,
                colno: 6
            }
        );
        let ha0 = &m.instances[1];
        assert_eq!(design.resolve(ha0.args[1].param), "S");
        assert_eq!(design.resolve(ha0.args[1].arg), "sum");
        assert_eq!((ha0.args[1].msb, ha0.args[1].lsb), (8, 7));
    }

    #[test_case(".A(x[3])", 3, 3; "single bit select")]
    #[test_case(".A(x[3:1])", 3, 1; "part select")]
    #[test_case(".A(x)", 0, 0; "no select")]
    #[test_case(".A(x[0:5])", 0, 5; "ascending part select")]
    fn test_parse_arg_bit_select(arg: &str, msb: u32, lsb: u32) {
        let src = format!("module m(x); input [7:0] x; BUF u0({}); endmodule", arg);
        let design = parse_netlist_str(&src).unwrap();
        let a = &design.module("m").unwrap().instances[0].args[0];
        assert_eq!(design.resolve(a.param), "A");
        assert_eq!(design.resolve(a.arg), "x");
        assert_eq!((a.msb, a.lsb), (msb, lsb));
    }

    #[test]
    fn test_parse_module_order_is_preserved() {
        let src = "module z(a); endmodule module y(a); endmodule module x(a); endmodule";
        let design = parse_netlist_str(src).unwrap();
        let names: Vec<&str> = design
            .modules()
            .iter()
            .map(|m| design.resolve(m.name))
            .collect();
        assert_eq!(names, vec!["z", "y", "x"]);
    }

    #[test]
    fn test_missing_semicolon_after_net() {
        let src = "module m(a);\n  wire a\n  wire b;\nendmodule\n";
        let (expected, found, pos) = syntax_error(src);
        assert_eq!(expected, Expected::Token(TokenKind::Semi));
        assert_eq!(found, Some(TokenKind::Keyword(Keyword::Wire)));
        // Position of the last good token: the net name `a`.
        assert_eq!(pos, Pos { lineno: 2, colno: 8 });
    }

    #[test]
    fn test_missing_endmodule() {
        let (expected, found, _pos) = syntax_error("module m(a); wire a;");
        assert_eq!(expected, Expected::Token(TokenKind::Keyword(Keyword::Endmodule)));
        assert_eq!(found, None);
    }

    #[test]
    fn test_empty_param_list_is_error() {
        let (expected, found, pos) = syntax_error("module m(); endmodule");
        assert_eq!(expected, Expected::Token(TokenKind::Identifier));
        assert_eq!(found, Some(TokenKind::CParen));
        assert_eq!(pos, Pos { lineno: 1, colno: 9 });
    }

    #[test]
    fn test_net_range_requires_colon() {
        let (expected, _, _) = syntax_error("module m(a); wire [3] a; endmodule");
        assert_eq!(expected, Expected::Token(TokenKind::Colon));
    }

    #[test]
    fn test_positional_connection_is_error() {
        let (expected, found, _) = syntax_error("module m(a); INV u0(a); endmodule");
        assert_eq!(expected, Expected::Token(TokenKind::Dot));
        assert_eq!(found, Some(TokenKind::Identifier));
    }

    #[test]
    fn test_trailing_input_is_error() {
        let (expected, found, pos) = syntax_error("module m(a); endmodule\nwire");
        assert_eq!(expected, Expected::EndOfFile);
        assert_eq!(found, Some(TokenKind::Keyword(Keyword::Wire)));
        assert_eq!(pos, Pos { lineno: 1, colno: 14 });
    }

    #[test]
    fn test_trailing_input_without_modules() {
        let (expected, found, pos) = syntax_error("foo");
        assert_eq!(expected, Expected::EndOfFile);
        assert_eq!(found, Some(TokenKind::Identifier));
        assert_eq!(pos, Pos::START);
    }

    #[test]
    fn test_lexical_error_inside_module() {
        let src = "module m(a);\n  wire a;\n  INV u0(.A(a)) @;\nendmodule\n";
        assert_eq!(
            parse_netlist_str(src).unwrap_err(),
            NetlistError::UnexpectedCharacter {
                ch: '@',
                pos: Pos {
                    lineno: 3,
                    colno: 17
                },
            }
        );
    }

    #[test]
    fn test_duplicate_module_definition() {
        let src = "module m(a); endmodule\nmodule m(b); endmodule\n";
        assert_eq!(
            parse_netlist_str(src).unwrap_err(),
            NetlistError::DuplicateModule {
                name: "m".to_string(),
                pos: Pos { lineno: 2, colno: 8 },
            }
        );
    }

    #[test]
    fn test_nets_after_instances_are_rejected() {
        // Net declarations must precede instances.
        let (expected, found, _) =
            syntax_error("module m(a); INV u0(.A(a)); wire b; endmodule");
        assert_eq!(
            expected,
            Expected::Token(TokenKind::Keyword(Keyword::Endmodule))
        );
        assert_eq!(found, Some(TokenKind::Keyword(Keyword::Wire)));
    }
}
