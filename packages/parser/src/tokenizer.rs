use crate::ast::Span;
use crate::error::{ParseError, ParseResult};
use logos::Logos;
use std::fmt;

/// Token types for GraphQL documents.
///
/// Keywords (`query`, `type`, `on`, ...) are contextual in GraphQL, so they are
/// lexed as plain names and recognised by the parser.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n,]+")]
#[logos(skip r"#[^\r\n]*")]
pub enum Token<'src> {
    #[regex(r"[_A-Za-z][_0-9A-Za-z]*", |lex| lex.slice())]
    Name(&'src str),

    #[regex(r"-?(0|[1-9][0-9]*)", |lex| lex.slice())]
    Int(&'src str),

    #[regex(r"-?(0|[1-9][0-9]*)(\.[0-9]+([eE][+-]?[0-9]+)?|[eE][+-]?[0-9]+)", |lex| lex.slice())]
    Float(&'src str),

    // Raw slice including the quotes; decoded by the parser
    #[regex(r#""([^"\\\r\n]|\\.)*""#, |lex| lex.slice())]
    String(&'src str),

    #[token("\"\"\"", lex_block_string)]
    BlockString(&'src str),

    #[token("!")]
    Bang,

    #[token("$")]
    Dollar,

    #[token("&")]
    Amp,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("...")]
    Spread,

    #[token(":")]
    Colon,

    #[token("=")]
    Equals,

    #[token("@")]
    At,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("|")]
    Pipe,

    #[token("}")]
    RBrace,
}

/// Consume the body of a block string up to and including the closing `"""`.
fn lex_block_string<'src>(lex: &mut logos::Lexer<'src, Token<'src>>) -> Option<&'src str> {
    let bytes = lex.remainder().as_bytes();
    let mut i = 0;
    while i + 3 <= bytes.len() {
        if bytes[i..].starts_with(b"\\\"\"\"") {
            i += 4;
            continue;
        }
        if bytes[i..].starts_with(b"\"\"\"") {
            lex.bump(i + 3);
            return Some(lex.slice());
        }
        i += 1;
    }
    None
}

impl<'src> fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Name(s) => write!(f, "name '{}'", s),
            Token::Int(n) => write!(f, "int {}", n),
            Token::Float(n) => write!(f, "float {}", n),
            Token::String(s) => write!(f, "string {}", s),
            Token::BlockString(_) => write!(f, "block string"),
            Token::Bang => write!(f, "'!'"),
            Token::Dollar => write!(f, "'$'"),
            Token::Amp => write!(f, "'&'"),
            Token::LParen => write!(f, "'('"),
            Token::RParen => write!(f, "')'"),
            Token::Spread => write!(f, "'...'"),
            Token::Colon => write!(f, "':'"),
            Token::Equals => write!(f, "'='"),
            Token::At => write!(f, "'@'"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
            Token::LBrace => write!(f, "'{{'"),
            Token::Pipe => write!(f, "'|'"),
            Token::RBrace => write!(f, "'}}'"),
        }
    }
}

/// Tokenize a source string, failing on the first character the lexer rejects.
pub fn tokenize(source: &str) -> ParseResult<Vec<(Token<'_>, Span)>> {
    let mut tokens = Vec::new();
    for (result, range) in Token::lexer(source).spanned() {
        let span = Span::new(range.start, range.end);
        match result {
            Ok(token) => tokens.push((token, span)),
            Err(()) => return Err(ParseError::lexer_error(span)),
        }
    }
    Ok(tokens)
}

/// Decode a quoted string token (`"..."`) into its value.
pub fn unescape_string(raw: &str) -> Result<String, String> {
    let inner = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| "string literal is not quoted".to_string())?;

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('/') => out.push('/'),
            Some('b') => out.push('\u{0008}'),
            Some('f') => out.push('\u{000C}'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .ok_or_else(|| format!("invalid unicode escape \\u{}", hex))?;
                let ch = char::from_u32(code)
                    .ok_or_else(|| format!("invalid unicode code point \\u{}", hex))?;
                out.push(ch);
            }
            Some(other) => return Err(format!("invalid escape sequence \\{}", other)),
            None => return Err("unterminated escape sequence".to_string()),
        }
    }
    Ok(out)
}

/// Decode a block string token (`"""..."""`), removing common indentation and
/// leading/trailing blank lines.
pub fn block_string_value(raw: &str) -> String {
    let inner = raw
        .strip_prefix("\"\"\"")
        .and_then(|s| s.strip_suffix("\"\"\""))
        .unwrap_or(raw)
        .replace("\\\"\"\"", "\"\"\"");

    let lines: Vec<&str> = inner.lines().collect();

    let common_indent = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    let mut dedented: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                *line
            } else if line.trim().is_empty() {
                ""
            } else {
                &line[common_indent..]
            }
        })
        .collect();

    while dedented.first().is_some_and(|l| l.trim().is_empty()) {
        dedented.remove(0);
    }
    while dedented.last().is_some_and(|l| l.trim().is_empty()) {
        dedented.pop();
    }

    dedented.join("\n")
}
