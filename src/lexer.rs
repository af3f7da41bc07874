// ABOUTME: Tokenizer turning SIMPL source text into a stream of tokens using nom combinators

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{digit1, multispace1, one_of, satisfy},
    combinator::recognize,
    IResult, Parser,
};

use crate::error::SyntaxError;
use std::fmt;

/// Reserved words. `true`, `false`, `nil`, `ref`, `not`, `andalso` and
/// `orelse` are deliberately absent: they lex as identifiers and the
/// parser dispatches on their spelling.
const KEYWORDS: [&str; 10] = [
    "let", "in", "end", "if", "then", "else", "while", "do", "fn", "rec",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Int,
    Ident,
    Keyword,
    Symbol,
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    fn new(kind: TokenKind, text: &str) -> Self {
        Token {
            kind,
            text: text.to_string(),
        }
    }

    fn eof() -> Self {
        Token {
            kind: TokenKind::Eof,
            text: String::new(),
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_eof() {
            write!(f, "<end of input>")
        } else {
            write!(f, "{}", self.text)
        }
    }
}

/// Parse a block comment `(* ... *)`, nesting to arbitrary depth.
/// An unterminated comment swallows the remainder of the input.
fn block_comment(input: &str) -> IResult<&str, ()> {
    let (mut rest, _) = tag("(*")(input)?;
    let mut depth = 1usize;

    while depth > 0 {
        if rest.is_empty() {
            return Ok(("", ()));
        }
        if let Ok((r, _)) = tag::<_, _, nom::error::Error<&str>>("(*")(rest) {
            depth += 1;
            rest = r;
        } else if let Ok((r, _)) = tag::<_, _, nom::error::Error<&str>>("*)")(rest) {
            depth -= 1;
            rest = r;
        } else {
            let mut chars = rest.chars();
            chars.next();
            rest = chars.as_str();
        }
    }

    Ok((rest, ()))
}

/// Parse an identifier: letter or underscore, then letters, digits,
/// underscores, or apostrophes.
fn identifier(input: &str) -> IResult<&str, &str> {
    recognize((
        satisfy(|c| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '\''),
    ))
    .parse(input)
}

/// Parse a symbol, multi-character forms first so `:=` never splits
/// into `:` `=`.
fn symbol(input: &str) -> IResult<&str, &str> {
    alt((
        tag(":="),
        tag("::"),
        tag("<="),
        tag(">="),
        tag("<>"),
        tag("=>"),
        tag("->"),
        recognize(one_of("-+*/%~=<>!;,()")),
    ))
    .parse(input)
}

/// Tokenize a whole source file. Lexing never fails: comments and
/// whitespace are discarded and unrecognised characters are skipped.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut rest = source;
    let mut tokens = Vec::new();

    while !rest.is_empty() {
        if let Ok((r, _)) = block_comment(rest) {
            rest = r;
            continue;
        }
        if let Ok((r, _)) = multispace1::<_, nom::error::Error<&str>>(rest) {
            rest = r;
            continue;
        }
        if let Ok((r, text)) = digit1::<_, nom::error::Error<&str>>(rest) {
            tokens.push(Token::new(TokenKind::Int, text));
            rest = r;
            continue;
        }
        if let Ok((r, text)) = identifier(rest) {
            let kind = if KEYWORDS.contains(&text) {
                TokenKind::Keyword
            } else {
                TokenKind::Ident
            };
            tokens.push(Token::new(kind, text));
            rest = r;
            continue;
        }
        if let Ok((r, text)) = symbol(rest) {
            tokens.push(Token::new(TokenKind::Symbol, text));
            rest = r;
            continue;
        }

        // Unrecognised character: skip it.
        let mut chars = rest.chars();
        chars.next();
        rest = chars.as_str();
    }

    tokens
}

/// Token cursor with one-token lookahead and filtered consumption,
/// the contract the recursive-descent parser is written against.
#[derive(Debug)]
pub struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
    eof: Token,
}

impl TokenStream {
    pub fn new(tokens: Vec<Token>) -> Self {
        TokenStream {
            tokens,
            pos: 0,
            eof: Token::eof(),
        }
    }

    pub fn of_source(source: &str) -> Self {
        TokenStream::new(tokenize(source))
    }

    /// The next token, or the end-of-input sentinel.
    pub fn peek(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&self.eof)
    }

    pub fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Consume and return the next token. At the end of input the
    /// sentinel is returned and the cursor stays put.
    pub fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if !tok.is_eof() {
            self.pos += 1;
        }
        tok
    }

    /// Consume the next token only if it is the given symbol.
    pub fn eat_symbol(&mut self, sym: &str) -> bool {
        let tok = self.peek();
        if tok.kind == TokenKind::Symbol && tok.text == sym {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume the next token only if it is the given word operator
    /// (`andalso`, `orelse`, `not`, `ref`, ... lex as identifiers).
    pub fn eat_word(&mut self, word: &str) -> bool {
        let tok = self.peek();
        if tok.kind == TokenKind::Ident && tok.text == word {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume the next token only if it is the given keyword.
    pub fn eat_keyword(&mut self, kw: &str) -> bool {
        let tok = self.peek();
        if tok.kind == TokenKind::Keyword && tok.text == kw {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    pub fn expect_symbol(&mut self, sym: &str) -> Result<(), SyntaxError> {
        if self.eat_symbol(sym) {
            Ok(())
        } else {
            Err(self.expected(sym))
        }
    }

    pub fn expect_keyword(&mut self, kw: &str) -> Result<(), SyntaxError> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            Err(self.expected(kw))
        }
    }

    /// Consume an identifier token and return its spelling.
    pub fn expect_ident(&mut self) -> Result<String, SyntaxError> {
        let tok = self.peek();
        if tok.kind == TokenKind::Ident {
            let text = tok.text.clone();
            self.pos += 1;
            Ok(text)
        } else {
            Err(self.expected("identifier"))
        }
    }

    fn expected(&self, what: &str) -> SyntaxError {
        let found = self.peek();
        if found.is_eof() {
            SyntaxError::UnexpectedEof
        } else {
            SyntaxError::Expected {
                expected: what.to_string(),
                found: found.text.clone(),
            }
        }
    }
}
