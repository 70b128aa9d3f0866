use serde_json::Value;

use super::ExprError;
use super::ast::{BinaryOp, Expr, UnaryOp};
use super::lexer::{Spanned, Token, tokenize, unescape};

/// Deepest nesting of parentheses and unary operators accepted.
pub const MAX_DEPTH: usize = 64;
/// Longest expression accepted, in tokens. Bounds evaluation work.
pub const MAX_TOKENS: usize = 512;

/// Name under which the whole value context can be addressed.
const CONTEXT_ROOT: &str = "values";
/// Accessor function reading one key from the context.
const GETTER: &str = "get";

/// Parses `source` into a syntax tree.
pub fn parse(source: &str) -> Result<Expr, ExprError> {
    let tokens = tokenize(source)?;
    if tokens.is_empty() {
        return Err(ExprError::Empty);
    }
    if tokens.len() > MAX_TOKENS {
        return Err(ExprError::TooLong { limit: MAX_TOKENS });
    }
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
        source_len: source.len(),
    };
    let expr = parser.parse_conditional()?;
    if let Some((token, span)) = parser.peek() {
        return Err(ExprError::UnexpectedToken {
            pos: span.start,
            found: token.to_string(),
        });
    }
    Ok(expr)
}

struct Parser<'src> {
    tokens: Vec<Spanned<'src>>,
    pos: usize,
    depth: usize,
    source_len: usize,
}

impl<'src> Parser<'src> {
    /// condition ? then : otherwise (lowest precedence, right associative)
    fn parse_conditional(&mut self) -> Result<Expr, ExprError> {
        let condition = self.parse_or()?;
        if !self.match_token(&Token::Question) {
            return Ok(condition);
        }
        self.enter()?;
        let then = self.parse_conditional()?;
        self.expect(&Token::Colon)?;
        let otherwise = self.parse_conditional()?;
        self.leave();
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then: Box::new(then),
            otherwise: Box::new(otherwise),
        })
    }

    fn parse_or(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_and()?;
        while self.match_token(&Token::OrOr) {
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_equality()?;
        while self.match_token(&Token::AndAnd) {
            let right = self.parse_equality()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::EqEq) => BinaryOp::Eq,
                Some(Token::NotEq) => BinaryOp::Ne,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = binary(op, left, right);
        }
    }

    fn parse_comparison(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::Lt) => BinaryOp::Lt,
                Some(Token::LtEq) => BinaryOp::Le,
                Some(Token::Gt) => BinaryOp::Gt,
                Some(Token::GtEq) => BinaryOp::Ge,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }
    }

    /// `+` chains that already involve a string literal fold into one
    /// `Concat` node; everything else stays a binary operation and decides
    /// between addition and concatenation at evaluation time.
    fn parse_additive(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = match (op, left) {
                (BinaryOp::Add, Expr::Concat(mut parts)) => {
                    parts.push(right);
                    Expr::Concat(parts)
                }
                (BinaryOp::Add, left) if left.is_string_literal() || right.is_string_literal() => {
                    Expr::Concat(vec![left, right])
                }
                (op, left) => binary(op, left, right),
            };
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, ExprError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_token() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(op, left, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Expr, ExprError> {
        let op = match self.peek_token() {
            Some(Token::Bang) => UnaryOp::Not,
            Some(Token::Minus) => UnaryOp::Neg,
            Some(Token::Plus) => UnaryOp::Plus,
            _ => return self.parse_primary(),
        };
        self.advance();
        self.enter()?;
        let operand = self.parse_unary()?;
        self.leave();
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, ExprError> {
        let Some((token, span)) = self.advance() else {
            return Err(ExprError::UnexpectedEnd);
        };
        match token {
            Token::Number(value) => number_literal(value, span.start),
            Token::Str(raw) => Ok(Expr::Literal(Value::String(unescape(raw)))),
            Token::True => Ok(Expr::Literal(Value::Bool(true))),
            Token::False => Ok(Expr::Literal(Value::Bool(false))),
            Token::Null => Ok(Expr::Literal(Value::Null)),
            Token::Ident(name) => self.parse_reference(name, span.start),
            Token::LParen => {
                self.enter()?;
                let inner = self.parse_conditional()?;
                self.expect(&Token::RParen)?;
                self.leave();
                Ok(inner)
            }
            other => Err(ExprError::UnexpectedToken {
                pos: span.start,
                found: other.to_string(),
            }),
        }
    }

    /// `key`, `values.key`, `values["key"]` and `get("key")` all read the
    /// same context slot. No other member access or call exists.
    fn parse_reference(&mut self, name: &str, pos: usize) -> Result<Expr, ExprError> {
        match (name, self.peek_token()) {
            (CONTEXT_ROOT, Some(Token::Dot)) => {
                self.advance();
                match self.advance() {
                    Some((Token::Ident(key), _)) => Ok(Expr::FieldRef(key.to_string())),
                    Some((other, span)) => Err(ExprError::UnexpectedToken {
                        pos: span.start,
                        found: other.to_string(),
                    }),
                    None => Err(ExprError::UnexpectedEnd),
                }
            }
            (CONTEXT_ROOT, Some(Token::LBracket)) => {
                self.advance();
                let key = self.expect_string()?;
                self.expect(&Token::RBracket)?;
                Ok(Expr::FieldRef(key))
            }
            (CONTEXT_ROOT, _) => Err(ExprError::UnsupportedReference {
                pos,
                name: CONTEXT_ROOT.to_string(),
            }),
            (GETTER, Some(Token::LParen)) => {
                self.advance();
                let key = self.expect_string()?;
                self.expect(&Token::RParen)?;
                Ok(Expr::FieldRef(key))
            }
            (_, Some(Token::LParen)) => Err(ExprError::UnsupportedReference {
                pos,
                name: format!("{name}()"),
            }),
            (_, Some(Token::Dot | Token::LBracket)) => Err(ExprError::UnsupportedReference {
                pos,
                name: format!("{name}.<member>"),
            }),
            _ => Ok(Expr::FieldRef(name.to_string())),
        }
    }

    fn enter(&mut self) -> Result<(), ExprError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ExprError::TooDeep { limit: MAX_DEPTH });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
    }

    fn peek(&self) -> Option<&Spanned<'src>> {
        self.tokens.get(self.pos)
    }

    fn peek_token(&self) -> Option<&Token<'src>> {
        self.peek().map(|(token, _)| token)
    }

    fn advance(&mut self) -> Option<Spanned<'src>> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn match_token(&mut self, expected: &Token<'_>) -> bool {
        if self.peek_token() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token<'_>) -> Result<(), ExprError> {
        if self.match_token(expected) {
            return Ok(());
        }
        Err(self.unexpected(expected.to_string()))
    }

    fn expect_string(&mut self) -> Result<String, ExprError> {
        if let Some(Token::Str(raw)) = self.peek_token() {
            let key = unescape(raw);
            self.pos += 1;
            return Ok(key);
        }
        Err(self.unexpected("a quoted key".to_string()))
    }

    fn unexpected(&self, expected: String) -> ExprError {
        match self.peek() {
            Some((token, span)) => ExprError::Expected {
                pos: span.start,
                expected,
                found: token.to_string(),
            },
            None => ExprError::Expected {
                pos: self.source_len,
                expected,
                found: "end of input".to_string(),
            },
        }
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

fn number_literal(value: f64, pos: usize) -> Result<Expr, ExprError> {
    super::eval::number_value(value)
        .map(Expr::Literal)
        .ok_or(ExprError::InvalidNumber { pos })
}
