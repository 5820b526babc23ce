pub mod ast;
pub mod error;

use ast::{
    Associativity, BinOp, BinOpKind, Binary, Call, Expr, LitInt, LitRadix, LitSym, Literal,
    Paren, Precedence, Unary, UnaryOp, UnaryOpKind, DIGITS,
};
use error::{
    EmptyParenthesis, EmptyRadixLiteral, Error, ExpectedEof, InvalidRadixDigit,
    UnclosedParenthesis, UnexpectedEof, UnexpectedToken,
};
use super::tokenizer::{tokenize_complete, Token, TokenKind};
use std::ops::Range;

/// The tokens that can begin a primary expression. Used for error reporting and to detect
/// implicit multiplication.
const PRIMARY_STARTERS: &[TokenKind] = &[
    TokenKind::Int,
    TokenKind::Name,
    TokenKind::OpenParen,
    TokenKind::Bin,
    TokenKind::Oct,
    TokenKind::Hex,
];

/// An operator found by peeking ahead in the token stream.
enum PeekedOp {
    /// An explicit operator token.
    Op(BinOpKind),

    /// No operator, but a primary expression follows; this is implicit multiplication, as in
    /// `2a` or `x(x + 1)`.
    Implicit,
}

impl PeekedOp {
    fn precedence(&self) -> Precedence {
        match self {
            PeekedOp::Op(kind) => kind.precedence(),
            PeekedOp::Implicit => Precedence::Factor,
        }
    }

    fn associativity(&self) -> Associativity {
        match self {
            PeekedOp::Op(kind) => kind.associativity(),
            PeekedOp::Implicit => Associativity::Left,
        }
    }
}

/// A high-level parser for the expression language. This is the type to use to parse an arbitrary
/// piece of text into an abstract syntax tree.
#[derive(Debug, Clone)]
pub struct Parser<'source> {
    /// The tokens that this parser is currently parsing.
    tokens: Box<[Token<'source>]>,

    /// The index of the **next** token to be parsed.
    cursor: usize,
}

impl<'source> Parser<'source> {
    /// Create a new parser for the given source.
    pub fn new(source: &'source str) -> Self {
        Self {
            tokens: tokenize_complete(source),
            cursor: 0,
        }
    }

    /// Creates an error that points at the current token, or the end of the source code if the
    /// cursor is at the end of the stream.
    fn error(&self, kind: impl canon_error::ErrorKind + 'static) -> Error {
        Error::new(vec![self.span()], kind)
    }

    /// Returns a span pointing at the end of the source code.
    fn eof_span(&self) -> Range<usize> {
        self.tokens.last().map_or(0..0, |token| token.span.end..token.span.end)
    }

    /// Returns the span of the current token, or the end of the source code if the cursor is at
    /// the end of the stream.
    fn span(&self) -> Range<usize> {
        self.tokens
            .get(self.cursor)
            .map_or(self.eof_span(), |token| token.span.clone())
    }

    /// Returns the next non-whitespace token without consuming it.
    fn peek(&self) -> Option<&Token<'source>> {
        self.tokens[self.cursor..].iter().find(|token| !token.is_whitespace())
    }

    /// Returns the next token to be parsed, then advances the cursor. Whitespace tokens are
    /// skipped.
    ///
    /// Returns an EOF error if there are no more tokens.
    fn next_token(&mut self) -> Result<Token<'source>, Error> {
        while self.cursor < self.tokens.len() {
            let token = &self.tokens[self.cursor];
            self.cursor += 1;
            if token.is_whitespace() {
                continue;
            } else {
                // cloning is cheap: only Range<_> is cloned
                return Ok(token.clone());
            }
        }

        Err(self.error(UnexpectedEof))
    }

    /// Attempts to parse a full expression from the token stream. All the tokens must be consumed
    /// by the parser; if not, an error is returned.
    pub fn try_parse_full(&mut self) -> Result<Expr, Error> {
        let expr = self.parse_expr(Precedence::Any)?;
        match self.peek() {
            Some(_) => Err(self.error(ExpectedEof)),
            None => Ok(expr),
        }
    }

    /// Parses an expression, consuming operators whose precedence is at least `min`.
    fn parse_expr(&mut self, min: Precedence) -> Result<Expr, Error> {
        let lhs = self.parse_unary()?;
        self.parse_binary(lhs, min)
    }

    /// Peeks ahead for a binary operator, or a primary expression indicating implicit
    /// multiplication. The cursor is not moved.
    fn peek_op(&self) -> Option<PeekedOp> {
        let token = self.peek()?;
        let kind = match token.kind {
            TokenKind::Add => BinOpKind::Add,
            TokenKind::Sub => BinOpKind::Sub,
            TokenKind::Mul => BinOpKind::Mul,
            TokenKind::Div => BinOpKind::Div,
            TokenKind::Exp => BinOpKind::Exp,
            kind if PRIMARY_STARTERS.contains(&kind) => return Some(PeekedOp::Implicit),
            _ => return None,
        };
        Some(PeekedOp::Op(kind))
    }

    /// Precedence-climbing loop: repeatedly extends `lhs` with operators of precedence at least
    /// `min`.
    fn parse_binary(&mut self, mut lhs: Expr, min: Precedence) -> Result<Expr, Error> {
        loop {
            let Some(op) = self.peek_op() else { break };
            let prec = op.precedence();
            if prec < min {
                break;
            }

            // consume the operator token; implicit multiplication has no token of its own
            let (op_kind, implicit, op_span) = match op {
                PeekedOp::Op(kind) => {
                    let token = self.next_token()?;
                    (kind, false, token.span)
                },
                PeekedOp::Implicit => {
                    let at = lhs.span().end;
                    (BinOpKind::Mul, true, at..at)
                },
            };

            let mut rhs = self.parse_unary()?;

            // before creating the `lhs op rhs` node, check the precedence of the following
            // operator, if any: we cannot parse an expression like `3 + 4 * 5` as `(3 + 4) * 5`
            loop {
                let Some(next) = self.peek_op() else { break };
                let next_prec = next.precedence();
                if next_prec > prec
                    || (next_prec == prec && next.associativity() == Associativity::Right)
                {
                    rhs = self.parse_binary(rhs, next_prec)?;
                } else {
                    break;
                }
            }

            let span = lhs.span().start..rhs.span().end;
            lhs = Expr::Binary(Binary {
                lhs: Box::new(lhs),
                op: BinOp { kind: op_kind, implicit, span: op_span },
                rhs: Box::new(rhs),
                span,
            });
        }

        Ok(lhs)
    }

    /// Parses a unary expression, or a primary expression if no unary operator is present.
    fn parse_unary(&mut self) -> Result<Expr, Error> {
        match self.peek() {
            Some(token) if token.kind == TokenKind::Sub => {
                let op_token = self.next_token()?;
                let op = UnaryOp { kind: UnaryOpKind::Neg, span: op_token.span.clone() };

                // the operand binds exponentiation but nothing looser, so `-x^2` is `-(x^2)`
                // while `-2a` is `(-2) * a`
                let primary = self.parse_unary()?;
                let operand = self.parse_binary(primary, Precedence::Exp)?;

                let span = op_token.span.start..operand.span().end;
                Ok(Expr::Unary(Unary {
                    op,
                    operand: Box::new(operand),
                    span,
                }))
            },
            _ => self.parse_primary(),
        }
    }

    /// Parses a primary expression: a literal, a parenthesized expression, or a call.
    fn parse_primary(&mut self) -> Result<Expr, Error> {
        let token = self.next_token()?;
        match token.kind {
            TokenKind::Int => Ok(Expr::Literal(Literal::Integer(LitInt {
                value: token.lexeme.to_string(),
                span: token.span,
            }))),
            TokenKind::Name => self.parse_name(token),
            TokenKind::Bin => self.parse_radix(token, 2),
            TokenKind::Oct => self.parse_radix(token, 8),
            TokenKind::Hex => self.parse_radix(token, 16),
            TokenKind::OpenParen => self.parse_paren(token),
            TokenKind::CloseParen => Err(Error::new(
                vec![token.span],
                UnclosedParenthesis { opening: false },
            )),
            found => Err(Error::new(
                vec![token.span],
                UnexpectedToken { expected: PRIMARY_STARTERS, found },
            )),
        }
    }

    /// Parses the remainder of a name token: a call such as `conj(x)` if the name is followed by
    /// an opening parenthesis, or a plain symbol otherwise.
    ///
    /// Only `conj` is treated as a function name; any other name adjacent to a parenthesis is a
    /// symbol times a parenthesized expression.
    fn parse_name(&mut self, token: Token<'source>) -> Result<Expr, Error> {
        let name = LitSym {
            name: token.lexeme.to_string(),
            span: token.span.clone(),
        };

        if name.name == "conj"
            && self.peek().map(|t| t.kind) == Some(TokenKind::OpenParen)
        {
            let open = self.next_token()?;
            let mut args = vec![self.parse_expr(Precedence::Any)?];
            while self.peek().map(|t| t.kind) == Some(TokenKind::Comma) {
                self.next_token()?;
                args.push(self.parse_expr(Precedence::Any)?);
            }
            let close = match self.peek() {
                Some(t) if t.kind == TokenKind::CloseParen => self.next_token()?,
                _ => return Err(Error::new(
                    vec![open.span],
                    UnclosedParenthesis { opening: true },
                )),
            };

            let span = token.span.start..close.span.end;
            return Ok(Expr::Call(Call { name, args, span }));
        }

        Ok(Expr::Literal(Literal::Symbol(name)))
    }

    /// Parses the digits of a radix literal after its base prefix. Digit tokens must be adjacent
    /// to the prefix, so `0x ff` is an error while `0xff` is not.
    fn parse_radix(&mut self, prefix: Token<'source>, base: u8) -> Result<Expr, Error> {
        let allowed = &DIGITS[..base as usize];
        let mut value = String::new();
        let mut end = prefix.span.end;

        while let Some(token) = self.tokens.get(self.cursor) {
            if token.span.start != end
                || !matches!(token.kind, TokenKind::Int | TokenKind::Name)
            {
                break;
            }

            for (i, c) in token.lexeme.char_indices() {
                if !allowed.contains(&c) {
                    let at = token.span.start + i;
                    return Err(Error::new(
                        vec![at..at + 1],
                        InvalidRadixDigit { radix: base, allowed, digit: c },
                    ));
                }
            }

            value.push_str(token.lexeme);
            end = token.span.end;
            self.cursor += 1;
        }

        if value.is_empty() {
            return Err(Error::new(
                vec![prefix.span],
                EmptyRadixLiteral { radix: base },
            ));
        }

        Ok(Expr::Literal(Literal::Radix(LitRadix {
            base,
            value,
            span: prefix.span.start..end,
        })))
    }

    /// Parses the remainder of a parenthesized expression after the opening parenthesis.
    fn parse_paren(&mut self, open: Token<'source>) -> Result<Expr, Error> {
        if self.peek().map(|t| t.kind) == Some(TokenKind::CloseParen) {
            let close = self.next_token()?;
            return Err(Error::new(
                vec![open.span.start..close.span.end],
                EmptyParenthesis,
            ));
        }

        let inner = self.parse_expr(Precedence::Any)?;

        match self.peek() {
            Some(token) if token.kind == TokenKind::CloseParen => {
                let close = self.next_token()?;
                Ok(Expr::Paren(Paren {
                    inner: Box::new(inner),
                    span: open.span.start..close.span.end,
                }))
            },
            _ => Err(Error::new(
                vec![open.span],
                UnclosedParenthesis { opening: true },
            )),
        }
    }
}
