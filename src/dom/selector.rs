//! CSS selector subset used by the adapter selector tables
//!
//! Supported: selector lists, descendant and child combinators, type and
//! universal selectors, `#id`, `.class`, attribute selectors with the
//! `=`, `~=`, `^=`, `$=`, `*=` operators (optionally ` i` case-insensitive)
//! and `:not(<compound>)`.

use crate::dom::document::Document;
use crate::dom::NodeId;
use crate::error::{PenError, Result};
use std::fmt;
use std::str::FromStr;

/// A parsed selector list
#[derive(Debug, Clone, PartialEq)]
pub struct Selector {
    source: String,
    alternatives: Vec<ComplexSelector>,
}

#[derive(Debug, Clone, PartialEq)]
struct ComplexSelector {
    /// Compounds left to right
    compounds: Vec<Compound>,
    /// `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`
    combinators: Vec<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    simples: Vec<Simple>,
}

#[derive(Debug, Clone, PartialEq)]
enum Simple {
    Id(String),
    Class(String),
    Attribute {
        name: String,
        matcher: Option<(AttrOp, String)>,
        case_insensitive: bool,
    },
    Not(Box<Compound>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttrOp {
    Equals,
    Includes,
    Prefix,
    Suffix,
    Substring,
}

impl Selector {
    /// Parse a selector list
    pub fn parse(source: &str) -> Result<Self> {
        let mut parser = Parser { source, chars: source.char_indices().peekable() };
        let alternatives = parser.parse_list()?;
        Ok(Self { source: source.to_string(), alternatives })
    }

    /// The selector text this was parsed from
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the element matches any selector of the list
    pub fn matches(&self, doc: &Document, element: NodeId) -> bool {
        if !doc.is_element(element) {
            return false;
        }
        self.alternatives
            .iter()
            .any(|complex| complex.matches_at(doc, element, complex.compounds.len() - 1))
    }
}

impl FromStr for Selector {
    type Err = PenError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl ComplexSelector {
    fn matches_at(&self, doc: &Document, element: NodeId, index: usize) -> bool {
        if !self.compounds[index].matches(doc, element) {
            return false;
        }
        if index == 0 {
            return true;
        }
        match self.combinators[index - 1] {
            Combinator::Child => doc
                .parent_element(element)
                .is_some_and(|parent| self.matches_at(doc, parent, index - 1)),
            Combinator::Descendant => {
                let mut current = doc.parent_element(element);
                while let Some(ancestor) = current {
                    if self.matches_at(doc, ancestor, index - 1) {
                        return true;
                    }
                    current = doc.parent_element(ancestor);
                }
                false
            }
        }
    }
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.simples.is_empty()
    }

    fn matches(&self, doc: &Document, element: NodeId) -> bool {
        let Some(data) = doc.element(element) else {
            return false;
        };
        if let Some(tag) = &self.tag {
            if tag != "*" && !data.tag_name.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        self.simples.iter().all(|simple| match simple {
            Simple::Id(id) => data.attributes.get("id").is_some_and(|v| v == id),
            Simple::Class(class) => data.has_class(class),
            Simple::Attribute { name, matcher, case_insensitive } => {
                let Some(actual) = data.attributes.get(name) else {
                    return false;
                };
                let Some((op, expected)) = matcher else {
                    return true;
                };
                let (actual, expected) = if *case_insensitive {
                    (actual.to_lowercase(), expected.to_lowercase())
                } else {
                    (actual.clone(), expected.clone())
                };
                match op {
                    AttrOp::Equals => actual == expected,
                    AttrOp::Includes => actual.split_whitespace().any(|w| w == expected),
                    AttrOp::Prefix => !expected.is_empty() && actual.starts_with(&expected),
                    AttrOp::Suffix => !expected.is_empty() && actual.ends_with(&expected),
                    AttrOp::Substring => !expected.is_empty() && actual.contains(&expected),
                }
            }
            Simple::Not(inner) => !inner.matches(doc, element),
        })
    }
}

struct Parser<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl Parser<'_> {
    fn error(&self, reason: impl Into<String>) -> PenError {
        PenError::InvalidSelector { selector: self.source.to_string(), reason: reason.into() }
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn bump(&mut self) -> Option<char> {
        self.chars.next().map(|(_, c)| c)
    }

    fn skip_whitespace(&mut self) -> bool {
        let mut skipped = false;
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
            skipped = true;
        }
        skipped
    }

    fn parse_list(&mut self) -> Result<Vec<ComplexSelector>> {
        let mut list = vec![self.parse_complex()?];
        while self.peek() == Some(',') {
            self.bump();
            list.push(self.parse_complex()?);
        }
        if let Some(c) = self.peek() {
            return Err(self.error(format!("unexpected '{}'", c)));
        }
        Ok(list)
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector> {
        self.skip_whitespace();
        let first = self.parse_compound()?;
        if first.is_empty() {
            return Err(self.error("expected a selector"));
        }
        let mut complex = ComplexSelector { compounds: vec![first], combinators: Vec::new() };

        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.bump();
                    self.skip_whitespace();
                    Combinator::Child
                }
                Some(_) if had_space => Combinator::Descendant,
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            };
            let compound = self.parse_compound()?;
            if compound.is_empty() {
                return Err(self.error("dangling combinator"));
            }
            complex.combinators.push(combinator);
            complex.compounds.push(compound);
        }

        Ok(complex)
    }

    fn parse_compound(&mut self) -> Result<Compound> {
        let mut compound = Compound::default();

        match self.peek() {
            Some('*') => {
                self.bump();
                compound.tag = Some("*".to_string());
            }
            Some(c) if is_ident_start(c) => {
                compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
            }
            _ => {}
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.simples.push(Simple::Id(self.parse_ident()?));
                }
                Some('.') => {
                    self.bump();
                    compound.simples.push(Simple::Class(self.parse_ident()?));
                }
                Some('[') => {
                    self.bump();
                    compound.simples.push(self.parse_attribute()?);
                }
                Some(':') => {
                    self.bump();
                    compound.simples.push(self.parse_pseudo()?);
                }
                _ => break,
            }
        }

        Ok(compound)
    }

    fn parse_ident(&mut self) -> Result<String> {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if is_ident_char(c) {
                ident.push(c);
                self.bump();
            } else {
                break;
            }
        }
        if ident.is_empty() {
            return Err(self.error("expected an identifier"));
        }
        Ok(ident)
    }

    fn parse_attribute(&mut self) -> Result<Simple> {
        self.skip_whitespace();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_whitespace();

        let op = match self.bump() {
            Some(']') => return Ok(Simple::Attribute { name, matcher: None, case_insensitive: false }),
            Some('=') => AttrOp::Equals,
            Some(c @ ('~' | '^' | '$' | '*')) => {
                if self.bump() != Some('=') {
                    return Err(self.error(format!("expected '=' after '{}'", c)));
                }
                match c {
                    '~' => AttrOp::Includes,
                    '^' => AttrOp::Prefix,
                    '$' => AttrOp::Suffix,
                    _ => AttrOp::Substring,
                }
            }
            Some(c) => return Err(self.error(format!("unexpected '{}' in attribute selector", c))),
            None => return Err(self.error("unterminated attribute selector")),
        };

        self.skip_whitespace();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let mut value = String::new();
                loop {
                    match self.bump() {
                        Some(c) if c == quote => break,
                        Some(c) => value.push(c),
                        None => return Err(self.error("unterminated string")),
                    }
                }
                value
            }
            _ => self.parse_ident()?,
        };

        self.skip_whitespace();
        let mut case_insensitive = false;
        if matches!(self.peek(), Some('i' | 'I')) {
            self.bump();
            case_insensitive = true;
            self.skip_whitespace();
        }

        match self.bump() {
            Some(']') => Ok(Simple::Attribute { name, matcher: Some((op, value)), case_insensitive }),
            _ => Err(self.error("unterminated attribute selector")),
        }
    }

    fn parse_pseudo(&mut self) -> Result<Simple> {
        let name = self.parse_ident()?.to_ascii_lowercase();
        if name != "not" {
            return Err(self.error(format!("unsupported pseudo-class ':{}'", name)));
        }
        if self.bump() != Some('(') {
            return Err(self.error("expected '(' after ':not'"));
        }
        self.skip_whitespace();
        let inner = self.parse_compound()?;
        self.skip_whitespace();
        if inner.is_empty() || self.bump() != Some(')') {
            return Err(self.error("malformed ':not()'"));
        }
        Ok(Simple::Not(Box::new(inner)))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '-'
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}
