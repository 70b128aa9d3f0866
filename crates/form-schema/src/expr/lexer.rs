use std::fmt;
use std::ops::Range;

use logos::Logos;

use super::ExprError;

/// Tokens of the expression language.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token<'src> {
    #[token("true")]
    True,

    #[token("false")]
    False,

    #[token("null")]
    Null,

    #[regex(r"[A-Za-z_$][A-Za-z0-9_$]*", |lex| lex.slice())]
    Ident(&'src str),

    #[regex(r"[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice())]
    #[regex(r"'([^'\\]|\\.)*'", |lex| lex.slice())]
    Str(&'src str),

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(".")]
    Dot,

    #[token(",")]
    Comma,

    #[token("?")]
    Question,

    #[token(":")]
    Colon,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("!")]
    Bang,

    #[token("==")]
    #[token("===")]
    EqEq,

    #[token("!=")]
    #[token("!==")]
    NotEq,

    #[token("<")]
    Lt,

    #[token("<=")]
    LtEq,

    #[token(">")]
    Gt,

    #[token(">=")]
    GtEq,

    #[token("&&")]
    AndAnd,

    #[token("||")]
    OrOr,
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::True => f.write_str("true"),
            Token::False => f.write_str("false"),
            Token::Null => f.write_str("null"),
            Token::Ident(name) => write!(f, "identifier '{name}'"),
            Token::Number(value) => write!(f, "number {value}"),
            Token::Str(raw) => write!(f, "string {raw}"),
            Token::LParen => f.write_str("'('"),
            Token::RParen => f.write_str("')'"),
            Token::LBracket => f.write_str("'['"),
            Token::RBracket => f.write_str("']'"),
            Token::Dot => f.write_str("'.'"),
            Token::Comma => f.write_str("','"),
            Token::Question => f.write_str("'?'"),
            Token::Colon => f.write_str("':'"),
            Token::Plus => f.write_str("'+'"),
            Token::Minus => f.write_str("'-'"),
            Token::Star => f.write_str("'*'"),
            Token::Slash => f.write_str("'/'"),
            Token::Percent => f.write_str("'%'"),
            Token::Bang => f.write_str("'!'"),
            Token::EqEq => f.write_str("'=='"),
            Token::NotEq => f.write_str("'!='"),
            Token::Lt => f.write_str("'<'"),
            Token::LtEq => f.write_str("'<='"),
            Token::Gt => f.write_str("'>'"),
            Token::GtEq => f.write_str("'>='"),
            Token::AndAnd => f.write_str("'&&'"),
            Token::OrOr => f.write_str("'||'"),
        }
    }
}

pub type Spanned<'src> = (Token<'src>, Range<usize>);

/// Splits `source` into tokens. Any character outside the language is an
/// error rather than being skipped.
pub fn tokenize(source: &str) -> Result<Vec<Spanned<'_>>, ExprError> {
    Token::lexer(source)
        .spanned()
        .map(|(result, span)| match result {
            Ok(token) => Ok((token, span)),
            Err(()) => Err(ExprError::UnexpectedChar {
                pos: span.start,
                found: source[span.clone()].to_string(),
            }),
        })
        .collect()
}

/// Decodes the body of a quoted string token.
pub fn unescape(raw: &str) -> String {
    let body = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token<'_>> {
        tokenize(source)
            .expect("tokenize")
            .into_iter()
            .map(|(token, _)| token)
            .collect()
    }

    #[test]
    fn comparison_operators_take_longest_match() {
        assert_eq!(
            kinds("a >= 18 && b !== 'x'"),
            vec![
                Token::Ident("a"),
                Token::GtEq,
                Token::Number(18.0),
                Token::AndAnd,
                Token::Ident("b"),
                Token::NotEq,
                Token::Str("'x'"),
            ]
        );
    }

    #[test]
    fn keywords_do_not_swallow_identifiers() {
        assert_eq!(
            kinds("true trueish null"),
            vec![Token::True, Token::Ident("trueish"), Token::Null]
        );
    }

    #[test]
    fn unknown_characters_are_errors() {
        let err = tokenize("a = 1").unwrap_err();
        assert!(matches!(err, ExprError::UnexpectedChar { pos: 2, .. }));
        assert!(tokenize("a; b").is_err());
    }

    #[test]
    fn unescape_handles_quotes_and_controls() {
        assert_eq!(unescape(r#""say \"hi\"\n""#), "say \"hi\"\n");
        assert_eq!(unescape(r"'it\'s'"), "it's");
    }
}
