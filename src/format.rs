//! Listing templates.
//!
//! A template is literal text with `{field}` placeholders. Only the fields in
//! [`FIELDS`] can be referenced; anything else is rejected when the template
//! is parsed, before any account is rendered. `{{` and `}}` produce literal
//! braces.

use std::str::FromStr;

use crate::account::AdminAccount;
use crate::error::{AdminError, Result};

pub const DEFAULT_TEMPLATE: &str = "{username}";
pub const LONG_TEMPLATE: &str = "{username}:{name}:{email}:{phone}:{mobile}";

/// Placeholder names a template may use.
pub const FIELDS: &[&str] = &["username", "name", "email", "phone", "mobile"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Username,
    Name,
    Email,
    Phone,
    Mobile,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "username" => Field::Username,
            "name" => Field::Name,
            "email" => Field::Email,
            "phone" => Field::Phone,
            "mobile" => Field::Mobile,
            _ => return None,
        })
    }

    fn write(self, account: &AdminAccount, out: &mut String) {
        match self {
            Field::Username => out.push_str(&account.username),
            Field::Name => out.push_str(&account.display_name()),
            Field::Email => out.push_str(&account.profile.email),
            Field::Phone => out.push_str(&account.profile.phone),
            Field::Mobile => out.push_str(&account.profile.mobile),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self> {
        let invalid = |msg: String| AdminError::InvalidFormat(format!("{msg} in template '{source}'"));

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(invalid("single '}'".to_string())),
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') => return Err(invalid("nested '{'".to_string())),
                            Some(ch) => name.push(ch),
                            None => return Err(invalid("unterminated field".to_string())),
                        }
                    }
                    let field = Field::from_name(&name).ok_or_else(|| {
                        invalid(format!(
                            "unknown field '{name}' (expected one of {})",
                            FIELDS.join(", ")
                        ))
                    })?;
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Field(field));
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Template { segments })
    }

    pub fn render(&self, account: &AdminAccount) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(field) => field.write(account, &mut out),
            }
        }
        out
    }
}

impl Default for Template {
    fn default() -> Self {
        Template {
            segments: vec![Segment::Field(Field::Username)],
        }
    }
}

impl FromStr for Template {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self> {
        Template::parse(s)
    }
}
