//! Tokenizer for material scripts

use std::iter::Peekable;
use std::str::Chars;

use crate::{MaterialError, SourceLocation};

/// Token categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or bare number (`singleton`, `Material`, `0`)
    Ident(String),
    /// Quoted string with escapes resolved
    Str(String),
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `=`
    Equals,
    /// `;`
    Semicolon,
}

impl TokenKind {
    /// Short description for error messages
    pub fn describe(&self) -> String {
        match self {
            Self::Ident(s) => format!("'{s}'"),
            Self::Str(s) => format!("string \"{s}\""),
            Self::LParen => "'('".to_string(),
            Self::RParen => "')'".to_string(),
            Self::LBrace => "'{'".to_string(),
            Self::RBrace => "'}'".to_string(),
            Self::LBracket => "'['".to_string(),
            Self::RBracket => "']'".to_string(),
            Self::Equals => "'='".to_string(),
            Self::Semicolon => "';'".to_string(),
        }
    }
}

/// A token with its 1-based position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// What was read
    pub kind: TokenKind,
    /// Line of the first character
    pub line: usize,
    /// Column of the first character
    pub column: usize,
}

/// Character-level scanner
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    origin: &'a str,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `source`; `origin` labels error locations
    pub fn new(source: &'a str, origin: &'a str) -> Self {
        let source = source.strip_prefix('\u{feff}').unwrap_or(source);
        Self {
            chars: source.chars().peekable(),
            origin,
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the whole source
    pub fn tokenize(source: &'a str, origin: &'a str) -> Result<Vec<Token>, MaterialError> {
        let mut lexer = Self::new(source, origin);
        let mut tokens = Vec::new();
        while let Some(token) = lexer.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Read the next token, `None` at end of input
    pub fn next_token(&mut self) -> Result<Option<Token>, MaterialError> {
        self.skip_trivia()?;

        let (line, column) = (self.line, self.column);
        let Some(c) = self.bump() else {
            return Ok(None);
        };

        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '=' => TokenKind::Equals,
            ';' => TokenKind::Semicolon,
            '"' => TokenKind::Str(self.read_string(line, column)?),
            c if is_ident_char(c) => {
                let mut ident = String::from(c);
                while let Some(&next) = self.chars.peek() {
                    if !is_ident_char(next) {
                        break;
                    }
                    ident.push(next);
                    self.bump();
                }
                TokenKind::Ident(ident)
            }
            other => {
                return Err(self.error_at(line, column, format!("unexpected character '{other}'")));
            }
        };

        Ok(Some(Token { kind, line, column }))
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) -> Result<(), MaterialError> {
        loop {
            match self.chars.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let (line, column) = (self.line, self.column);
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    match lookahead.next() {
                        Some('/') => {
                            while let Some(c) = self.bump() {
                                if c == '\n' {
                                    break;
                                }
                            }
                        }
                        Some('*') => {
                            self.bump();
                            self.bump();
                            self.skip_block_comment(line, column)?;
                        }
                        _ => return Ok(()),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn skip_block_comment(&mut self, line: usize, column: usize) -> Result<(), MaterialError> {
        let mut previous = '\0';
        while let Some(c) = self.bump() {
            if previous == '*' && c == '/' {
                return Ok(());
            }
            previous = c;
        }
        Err(self.error_at(line, column, "unterminated block comment"))
    }

    fn read_string(&mut self, line: usize, column: usize) -> Result<String, MaterialError> {
        let mut value = String::new();
        loop {
            match self.bump() {
                None | Some('\n') => return Err(self.error_at(line, column, "unterminated string")),
                Some('"') => return Ok(value),
                Some('\\') => match self.bump() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('"') => value.push('"'),
                    Some('\\') => value.push('\\'),
                    Some(other) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => return Err(self.error_at(line, column, "unterminated string")),
                },
                Some(c) => value.push(c),
            }
        }
    }

    fn error_at(&self, line: usize, column: usize, message: impl Into<String>) -> MaterialError {
        MaterialError::parse(SourceLocation::new(self.origin, line, column), message)
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
