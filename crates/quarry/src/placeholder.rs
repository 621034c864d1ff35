//! Named placeholder binding.
//!
//! Statements are written with `:name` placeholders; Postgres wants `$1, $2, ...`.
//! [`bind_named`] rewrites the text and collects the bound values in positional
//! order. It is a tokenizer, not a parser: it only knows enough to leave
//! `::type` casts, quoted strings (including `E'...'` escape strings and
//! `$tag$...$tag$` dollar quoting), quoted identifiers and comments alone.

use crate::error::{DbError, DbResult};
use crate::params::Params;
use crate::value::Value;
use tokio_postgres::types::ToSql;

/// A statement rewritten for positional binding.
#[derive(Debug)]
pub struct BoundSql<'p> {
    /// SQL text with `$N` placeholders.
    pub sql: String,
    /// Placeholder names, index `i` is `$i+1`.
    pub names: Vec<String>,
    /// Values in positional order.
    pub values: Vec<&'p Value>,
}

impl BoundSql<'_> {
    /// Get all values as references for tokio-postgres.
    pub fn as_refs(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values
            .iter()
            .map(|v| *v as &(dyn ToSql + Sync))
            .collect()
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Copy a quoted section (`'...'` or `"..."`) verbatim; doubled quotes are escapes.
fn copy_quoted(chars: &[char], mut i: usize, quote: char, out: &mut String) -> usize {
    out.push(quote);
    i += 1;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;
        if c == quote {
            if chars.get(i) == Some(&quote) {
                out.push(quote);
                i += 1;
            } else {
                break;
            }
        }
    }
    i
}

/// Copy an `E'...'` body starting at the opening quote; a backslash escapes the next char.
fn copy_escape_string(chars: &[char], mut i: usize, out: &mut String) -> usize {
    out.push('\'');
    i += 1;
    while i < chars.len() {
        let c = chars[i];
        out.push(c);
        i += 1;
        match c {
            '\\' => {
                if let Some(&next) = chars.get(i) {
                    out.push(next);
                    i += 1;
                }
            }
            '\'' if chars.get(i) == Some(&'\'') => {
                out.push('\'');
                i += 1;
            }
            '\'' => break,
            _ => {}
        }
    }
    i
}

/// End of a `$$` or `$tag$` opener at `i`, if there is one.
fn dollar_tag_end(chars: &[char], i: usize) -> Option<usize> {
    let mut end = i + 1;
    if chars.get(end).is_some_and(|&c| is_ident_start(c)) {
        while chars.get(end).is_some_and(|&c| is_ident_char(c)) {
            end += 1;
        }
    }
    (chars.get(end) == Some(&'$')).then_some(end + 1)
}

/// Copy a dollar-quoted body through its closing tag, or to the end of input.
fn copy_dollar_quoted(chars: &[char], i: usize, tag_end: usize, out: &mut String) -> usize {
    let tag = &chars[i..tag_end];
    let close = chars[tag_end..]
        .windows(tag.len())
        .position(|w| w == tag)
        .map_or(chars.len(), |pos| tag_end + pos + tag.len());
    out.extend(&chars[i..close]);
    close
}

/// Rewrite `:name` placeholders in `sql` into `$N` and collect their values.
///
/// A name that appears more than once maps to the same `$N`. Names without a
/// value in `params` fail with [`DbError::MissingParameter`]; values that are
/// never referenced are ignored.
pub fn bind_named<'p>(sql: &str, params: &'p Params) -> DbResult<BoundSql<'p>> {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len() + 8);
    let mut names: Vec<String> = Vec::new();
    let mut values: Vec<&'p Value> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let after_ident = i > 0 && (is_ident_char(chars[i - 1]) || chars[i - 1] == '$');
        match c {
            'E' | 'e' if chars.get(i + 1) == Some(&'\'') && !after_ident => {
                out.push(c);
                i = copy_escape_string(&chars, i + 1, &mut out);
            }
            '$' if !after_ident => match dollar_tag_end(&chars, i) {
                Some(tag_end) => i = copy_dollar_quoted(&chars, i, tag_end, &mut out),
                None => {
                    out.push(c);
                    i += 1;
                }
            },
            '\'' | '"' => {
                i = copy_quoted(&chars, i, c, &mut out);
            }
            '-' if chars.get(i + 1) == Some(&'-') => {
                while i < chars.len() && chars[i] != '\n' {
                    out.push(chars[i]);
                    i += 1;
                }
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                out.push_str("/*");
                i += 2;
                while i < chars.len() {
                    if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                        out.push_str("*/");
                        i += 2;
                        break;
                    }
                    out.push(chars[i]);
                    i += 1;
                }
            }
            ':' if chars.get(i + 1) == Some(&':') => {
                out.push_str("::");
                i += 2;
            }
            ':' if chars.get(i + 1).is_some_and(|&n| is_ident_start(n)) => {
                let start = i + 1;
                let mut end = start;
                while end < chars.len() && is_ident_char(chars[end]) {
                    end += 1;
                }
                let name: String = chars[start..end].iter().collect();
                let position = match names.iter().position(|n| *n == name) {
                    Some(pos) => pos,
                    None => {
                        let value = params
                            .get(&name)
                            .ok_or_else(|| DbError::MissingParameter(name.clone()))?;
                        names.push(name);
                        values.push(value);
                        names.len() - 1
                    }
                };
                out.push('$');
                out.push_str(&(position + 1).to_string());
                i = end;
            }
            _ => {
                out.push(c);
                i += 1;
            }
        }
    }

    Ok(BoundSql {
        sql: out,
        names,
        values,
    })
}
