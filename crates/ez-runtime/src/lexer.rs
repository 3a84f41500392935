//! Lexical analysis (tokenization)

use crate::diagnostic::Diagnostic;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Lexer state for tokenizing source code
pub struct Lexer<'a> {
    source: &'a str,
    chars: Vec<(usize, char)>,
    pos: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given source code
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.char_indices().collect(),
            pos: 0,
        }
    }

    /// Tokenize the source code.
    ///
    /// Always returns the tokens scanned so far, even when diagnostics are
    /// present; the final token is always `Eof`.
    pub fn tokenize(mut self) -> (Vec<Token>, Vec<Diagnostic>) {
        let mut tokens = Vec::new();
        let mut diagnostics = Vec::new();

        loop {
            self.skip_trivia();
            let start = self.offset();
            let Some(ch) = self.advance() else {
                tokens.push(Token::new(TokenKind::Eof, Span::new(start, start)));
                break;
            };

            let kind = match ch {
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                '{' => TokenKind::LBrace,
                '}' => TokenKind::RBrace,
                '[' => TokenKind::LBracket,
                ']' => TokenKind::RBracket,
                ',' => TokenKind::Comma,
                ';' => TokenKind::Semicolon,
                '+' => TokenKind::Plus,
                '-' => TokenKind::Minus,
                '*' => TokenKind::Star,
                '/' => TokenKind::Slash,
                '%' => TokenKind::Percent,
                '=' => {
                    if self.eat('=') {
                        TokenKind::Eq
                    } else {
                        TokenKind::Assign
                    }
                }
                '!' => {
                    if self.eat('=') {
                        TokenKind::Ne
                    } else {
                        TokenKind::Bang
                    }
                }
                '<' => {
                    if self.eat('=') {
                        TokenKind::Le
                    } else {
                        TokenKind::Lt
                    }
                }
                '>' => {
                    if self.eat('=') {
                        TokenKind::Ge
                    } else {
                        TokenKind::Gt
                    }
                }
                '&' => {
                    if self.eat('&') {
                        TokenKind::AndAnd
                    } else {
                        diagnostics.push(Diagnostic::error("unexpected character '&'", start));
                        continue;
                    }
                }
                '|' => {
                    if self.eat('|') {
                        TokenKind::OrOr
                    } else {
                        diagnostics.push(Diagnostic::error("unexpected character '|'", start));
                        continue;
                    }
                }
                '"' => match self.scan_string(start) {
                    Ok(kind) => kind,
                    Err(diag) => {
                        diagnostics.push(diag);
                        continue;
                    }
                },
                c if c.is_ascii_digit() => self.scan_number(start),
                c if c.is_alphabetic() || c == '_' => self.scan_ident(start),
                c => {
                    diagnostics.push(Diagnostic::error(
                        format!("unexpected character '{c}'"),
                        start,
                    ));
                    continue;
                }
            };

            tokens.push(Token::new(kind, Span::new(start, self.offset())));
        }

        (tokens, diagnostics)
    }

    fn offset(&self) -> usize {
        self.chars
            .get(self.pos)
            .map(|&(i, _)| i)
            .unwrap_or(self.source.len())
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).map(|&(_, c)| c)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += 1;
        Some(ch)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Skip whitespace and `//` line comments
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.pos += 1;
                }
                Some('/') if matches!(self.chars.get(self.pos + 1), Some(&(_, '/'))) => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
    }

    fn scan_number(&mut self, start: usize) -> TokenKind {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.pos += 1;
        }

        // A '.' followed by a digit makes this a float
        let mut is_float = false;
        if self.peek() == Some('.')
            && matches!(self.chars.get(self.pos + 1), Some(&(_, c)) if c.is_ascii_digit())
        {
            is_float = true;
            self.pos += 1;
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.pos += 1;
            }
        }

        let text = &self.source[start..self.offset()];
        if is_float {
            TokenKind::Float(text.parse().unwrap_or(0.0))
        } else {
            TokenKind::Int(text.parse().unwrap_or(0))
        }
    }

    fn scan_ident(&mut self, start: usize) -> TokenKind {
        while matches!(self.peek(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.pos += 1;
        }
        let text = &self.source[start..self.offset()];
        TokenKind::keyword(text).unwrap_or_else(|| TokenKind::Ident(text.to_string()))
    }

    fn scan_string(&mut self, start: usize) -> Result<TokenKind, Diagnostic> {
        let mut value = String::new();
        loop {
            match self.advance() {
                None => return Err(Diagnostic::error("unterminated string literal", start)),
                Some('"') => return Ok(TokenKind::String(value)),
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some(c) => {
                        return Err(Diagnostic::error(
                            format!("unknown escape sequence '\\{c}'"),
                            start,
                        ))
                    }
                    None => return Err(Diagnostic::error("unterminated string literal", start)),
                },
                Some(c) => value.push(c),
            }
        }
    }
}
