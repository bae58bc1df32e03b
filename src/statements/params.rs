// Copyright 2021 IOTA Stiftung
// SPDX-License-Identifier: Apache-2.0

use super::*;
use chrono::{
    DateTime,
    Utc,
};
use thiserror::Error;

/// A value bound to a `$n` placeholder of a compiled query.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum SqlParam {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
}

impl SqlParam {
    /// Render the value as a SQL literal.
    pub fn to_literal(&self) -> String {
        match self {
            Self::Null => "NULL".to_string(),
            Self::Bool(true) => "TRUE".to_string(),
            Self::Bool(false) => "FALSE".to_string(),
            Self::Int(i) if *i < 0 => format!("({})", i),
            Self::Int(i) => i.to_string(),
            Self::Float(f) if f.is_nan() => "'NaN'::float8".to_string(),
            Self::Float(f) if f.is_infinite() => {
                format!("'{}Infinity'::float8", if *f < 0.0 { "-" } else { "" })
            }
            Self::Float(f) if *f < 0.0 => format!("({:?})", f),
            Self::Float(f) => format!("{:?}", f),
            Self::Text(s) => quote_literal(s),
            Self::Timestamp(ts) => format!("{}::timestamptz", quote_literal(&ts.to_rfc3339())),
        }
    }
}

impl From<bool> for SqlParam {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for SqlParam {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for SqlParam {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<DateTime<Utc>> for SqlParam {
    fn from(v: DateTime<Utc>) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<SqlParam>> From<Option<T>> for SqlParam {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Self::Null)
    }
}

/// Quote a string as a standard-conforming SQL literal.
pub fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParamError {
    #[error("Placeholder ${index} has no bound value ({provided} provided)")]
    Missing { index: usize, provided: usize },
}

/// Replace every `$n` placeholder in `sql` with the literal form of `params[n - 1]`.
///
/// PostgreSQL does not accept bind parameters in utility statements such as
/// `CREATE VIEW ... AS`, so the compiled query has to be rendered in full.
/// Placeholders inside quoted literals, quoted identifiers, dollar-quoted
/// bodies and line comments are left alone.
pub fn inline_params(sql: &str, params: &[SqlParam]) -> Result<String, ParamError> {
    let mut out = String::with_capacity(sql.len());
    let mut rest = sql;
    let mut prev: Option<char> = None;
    while let Some(c) = rest.chars().next() {
        let consumed = match c {
            '\'' => closing_quote(rest, b'\'', matches!(prev, Some('E') | Some('e'))),
            '"' => closing_quote(rest, b'"', false),
            '-' if rest.starts_with("--") => rest.find('\n').map(|i| i + 1).unwrap_or(rest.len()),
            '$' if prev.map(is_ident_char).unwrap_or(false) => 1,
            '$' => {
                let digits = rest[1..].bytes().take_while(u8::is_ascii_digit).count();
                if digits > 0 {
                    let index = rest[1..=digits].parse::<usize>().unwrap_or(usize::MAX);
                    let param = index
                        .checked_sub(1)
                        .and_then(|i| params.get(i))
                        .ok_or(ParamError::Missing {
                            index,
                            provided: params.len(),
                        })?;
                    out.push_str(&param.to_literal());
                    rest = &rest[1 + digits..];
                    prev = None;
                    continue;
                } else if let Some(tag) = dollar_tag(rest) {
                    rest[tag.len()..]
                        .find(tag)
                        .map(|i| 2 * tag.len() + i)
                        .unwrap_or(rest.len())
                } else {
                    1
                }
            }
            _ => c.len_utf8(),
        };
        out.push_str(&rest[..consumed]);
        prev = rest[..consumed].chars().last();
        rest = &rest[consumed..];
    }
    Ok(out)
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Byte length of the quoted token at the start of `s`, closing quote included.
fn closing_quote(s: &str, quote: u8, backslash_escapes: bool) -> usize {
    let bytes = s.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if backslash_escapes => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    s.len()
}

/// The `$tag$` opening a dollar-quoted body at the start of `s`, if any.
fn dollar_tag(s: &str) -> Option<&str> {
    let len = s[1..]
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
        .count();
    if s[1 + len..].starts_with('$') {
        Some(&s[..len + 2])
    } else {
        None
    }
}
