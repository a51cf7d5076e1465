//! Material script parser
//!
//! Parses `materials.cs` files into raw records:
//!
//! ```text
//! singleton Material(IndstrialShack_01_conc01)
//! {
//!    mapTo = "conc01";
//!    diffuseMap[0] = "conc01";
//! };
//! ```
//!
//! Values stay as text here; [`Material::from_raw`](super::Material::from_raw)
//! decodes them.

use std::collections::HashMap;

use super::lexer::{Lexer, Token, TokenKind};
use super::property::PropertyKey;
use crate::{MaterialError, SourceLocation};

/// One `key = "value";` assignment as written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawProperty {
    /// Property name without the index
    pub name: String,
    /// Stage index from `name[index]`
    pub index: Option<usize>,
    /// Unquoted value text
    pub value: String,
    /// Location of the property name
    pub location: SourceLocation,
}

impl RawProperty {
    /// Key text as written, `name` or `name[index]`
    pub fn key_text(&self) -> String {
        match self.index {
            Some(index) => format!("{}[{index}]", self.name),
            None => self.name.clone(),
        }
    }

    /// Lowercase key identity; `diffuseMap` and `diffuseMap[0]` share one
    pub fn canonical_key(&self) -> String {
        PropertyKey::parse(&self.name, self.index)
            .map_or_else(|_| self.key_text(), |key| key.to_string())
            .to_ascii_lowercase()
    }
}

fn canonical_key_text(key_text: &str) -> String {
    key_text
        .parse::<PropertyKey>()
        .map_or_else(|_| key_text.trim().to_string(), |key| key.to_string())
        .to_ascii_lowercase()
}

/// One material declaration with its assignments in source order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMaterial {
    /// Material name from `Material(<name>)`
    pub name: String,
    /// Assignments in source order
    pub properties: Vec<RawProperty>,
    /// Location of the declaration keyword
    pub location: SourceLocation,
}

impl RawMaterial {
    /// Last value assigned to a key, matched case-insensitively
    ///
    /// An indexed key given without `[n]` matches stage 0.
    pub fn get(&self, key_text: &str) -> Option<&str> {
        let wanted = canonical_key_text(key_text);
        self.properties
            .iter()
            .rev()
            .find(|p| p.canonical_key() == wanted)
            .map(|p| p.value.as_str())
    }
}

/// Material script parser
pub struct MaterialScriptParser;

impl MaterialScriptParser {
    /// Parse script text, rejecting duplicate material names within it
    ///
    /// # Arguments
    /// * `source` - Script text
    /// * `origin` - Label used in error locations, usually the file path
    ///
    /// # Returns
    /// The records in declaration order
    pub fn parse(source: &str, origin: &str) -> Result<Vec<RawMaterial>, MaterialError> {
        let records = Self::parse_records(source, origin)?;

        let mut seen: HashMap<String, &SourceLocation> = HashMap::new();
        for record in &records {
            if let Some(first) = seen.insert(record.name.to_ascii_lowercase(), &record.location) {
                return Err(MaterialError::DuplicateName {
                    name: record.name.clone(),
                    first: first.clone(),
                    second: record.location.clone(),
                });
            }
        }

        Ok(records)
    }

    /// Parse script text without checking name uniqueness
    pub fn parse_records(source: &str, origin: &str) -> Result<Vec<RawMaterial>, MaterialError> {
        let tokens = Lexer::tokenize(source, origin)?;
        let mut cursor = Cursor {
            tokens: &tokens,
            pos: 0,
            origin,
        };

        let mut records = Vec::new();
        while !cursor.at_end() {
            records.push(cursor.parse_declaration()?);
        }

        log::trace!("Parsed {} material record(s) from {}", records.len(), origin);
        Ok(records)
    }
}

struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
    origin: &'a str,
}

impl<'a> Cursor<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self, expected: &str) -> Result<&'a Token, MaterialError> {
        let tokens: &'a [Token] = self.tokens;
        let token = tokens
            .get(self.pos)
            .ok_or_else(|| self.error_at_end(format!("unexpected end of input, expected {expected}")))?;
        self.pos += 1;
        Ok(token)
    }

    fn expect(&mut self, kind: &TokenKind, expected: &str) -> Result<&'a Token, MaterialError> {
        let token = self.next(expected)?;
        if &token.kind == kind {
            Ok(token)
        } else {
            Err(MaterialError::parse(
                location_of(self.origin, token),
                format!("expected {expected}, found {}", token.kind.describe()),
            ))
        }
    }

    fn expect_ident(&mut self, expected: &str) -> Result<(String, SourceLocation), MaterialError> {
        let token = self.next(expected)?;
        match &token.kind {
            TokenKind::Ident(name) => Ok((name.clone(), location_of(self.origin, token))),
            other => Err(MaterialError::parse(
                location_of(self.origin, token),
                format!("expected {expected}, found {}", other.describe()),
            )),
        }
    }

    /// `singleton Material(<name>) { <property>* };`
    fn parse_declaration(&mut self) -> Result<RawMaterial, MaterialError> {
        let (keyword, location) = self.expect_ident("'singleton' or 'new'")?;
        if !keyword.eq_ignore_ascii_case("singleton") && !keyword.eq_ignore_ascii_case("new") {
            return Err(MaterialError::parse(
                location,
                format!("expected 'singleton' or 'new', found '{keyword}'"),
            ));
        }

        let (class, class_location) = self.expect_ident("class name")?;
        if !class.eq_ignore_ascii_case("Material") {
            return Err(MaterialError::parse(
                class_location,
                format!("only Material declarations are supported, found '{class}'"),
            ));
        }

        self.expect(&TokenKind::LParen, "'('")?;
        let (name, _) = self.expect_ident("material name")?;
        self.expect(&TokenKind::RParen, "')'")?;
        self.expect(&TokenKind::LBrace, "'{'")?;

        let mut properties: Vec<RawProperty> = Vec::new();
        loop {
            match self.peek().map(|t| &t.kind) {
                Some(TokenKind::RBrace) => {
                    self.pos += 1;
                    break;
                }
                Some(_) => {
                    let property = self.parse_property()?;
                    let key = property.canonical_key();
                    if properties.iter().any(|p| p.canonical_key() == key) {
                        log::warn!(
                            "{}: '{}' assigned more than once in material '{}', last value wins",
                            property.location,
                            property.key_text(),
                            name
                        );
                    }
                    properties.push(property);
                }
                None => {
                    return Err(MaterialError::parse(
                        location.clone(),
                        format!("unbalanced braces: material '{name}' is never closed with '}}'"),
                    ));
                }
            }
        }

        self.expect(&TokenKind::Semicolon, "';' after '}'")?;

        Ok(RawMaterial {
            name,
            properties,
            location,
        })
    }

    /// `<name>[<index>]? = "<value>";`
    fn parse_property(&mut self) -> Result<RawProperty, MaterialError> {
        let (name, location) = self.expect_ident("property name")?;

        let mut index = None;
        if matches!(self.peek().map(|t| &t.kind), Some(TokenKind::LBracket)) {
            self.pos += 1;
            let (digits, index_location) = self.expect_ident("stage index")?;
            let value = digits.parse::<usize>().map_err(|_| {
                MaterialError::parse(index_location, format!("stage index '{digits}' is not a number"))
            })?;
            index = Some(value);
            self.expect(&TokenKind::RBracket, "']'")?;
        }

        self.expect(&TokenKind::Equals, "'='")?;

        let token = self.next("quoted value")?;
        let value = match &token.kind {
            TokenKind::Str(value) => value.clone(),
            other => {
                return Err(MaterialError::parse(
                    location_of(self.origin, token),
                    format!("expected quoted value, found {}", other.describe()),
                ));
            }
        };

        self.expect(&TokenKind::Semicolon, "';'")?;

        Ok(RawProperty {
            name,
            index,
            value,
            location,
        })
    }

    fn error_at_end(&self, message: String) -> MaterialError {
        let location = self
            .tokens
            .last()
            .map_or_else(|| SourceLocation::new(self.origin, 1, 1), |t| location_of(self.origin, t));
        MaterialError::parse(location, message)
    }
}

fn location_of(origin: &str, token: &Token) -> SourceLocation {
    SourceLocation::new(origin, token.line, token.column)
}
