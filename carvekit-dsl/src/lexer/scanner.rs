//! Line scanner: splits a raw dump into classified lines.

use super::token::*;
use crate::parser::ast::{ParseError, ParseErrorKind};
use once_cell::sync::Lazy;
use regex::Regex;
use std::iter::Enumerate;
use std::str::{FromStr, Lines};

static ARRAY_DECL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<ty>\S+) p(?P<name>\d+)\[(?P<size>\d+)\]$").expect("array declaration regex")
});

// ============================================================================
// SCANNER
// ============================================================================

/// Iterator over the non-empty lines of a dump.
///
/// Each line is `<marker><sep><expression>`: the first character is the
/// reached marker, the second is a separator, the rest is the expression.
pub struct Scanner<'a> {
    lines: Enumerate<Lines<'a>>,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines().enumerate(),
        }
    }

    /// Scan the entire source, stopping at the first malformed line.
    pub fn scan_all(self) -> Result<Vec<Line>, ParseError> {
        self.collect()
    }
}

impl Iterator for Scanner<'_> {
    type Item = Result<Line, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        for (idx, raw) in self.lines.by_ref() {
            if raw.trim().is_empty() {
                continue;
            }
            return Some(scan_line(raw, idx + 1));
        }
        None
    }
}

/// Classify one raw, non-empty line.
pub fn scan_line(raw: &str, line: usize) -> Result<Line, ParseError> {
    let raw = raw.trim_end();
    let mut chars = raw.chars();
    let reached = chars.next() == Some(REACHED_MARKER);
    chars.next();
    let expr = chars.as_str().trim();

    let kind = classify(expr).map_err(|kind| ParseError::new(line, kind))?;
    Ok(Line {
        kind,
        reached,
        line,
    })
}

/// Dispatch an expression to its grammar form, in priority order.
pub fn classify(expr: &str) -> Result<LineKind, ParseErrorKind> {
    if let Some(caps) = ARRAY_DECL.captures(expr) {
        return Ok(LineKind::ArrayDecl {
            ty: strip_type_prefix(&caps["ty"])?,
            name: parse_number(&caps["name"])?,
            size: parse_number(&caps["size"])?,
        });
    }

    if let Some(kind) = classify_offset(expr)? {
        return Ok(kind);
    }

    if let Some(rest) = expr.strip_prefix("PTR_BEGIN") {
        return Ok(LineKind::PtrBegin(parse_number(rest.trim())?));
    }
    if let Some(rest) = expr.strip_prefix("PTR_END") {
        return Ok(LineKind::PtrEnd(parse_number(rest.trim())?));
    }
    if let Some(rest) = expr.strip_prefix("PTR_IDX") {
        return Ok(LineKind::PtrIdx(parse_number(rest.trim())?));
    }
    if expr.starts_with("STRUCT_BEGIN") {
        return Ok(LineKind::StructBegin);
    }
    if expr.starts_with("STRUCT_END") {
        return Ok(LineKind::StructEnd);
    }

    if PRIMITIVE_TAGS.iter().any(|tag| expr.starts_with(tag)) {
        let (ty, value) = expr
            .split_once(' ')
            .ok_or_else(|| unknown_expression(expr))?;
        let value = if value == UNRESOLVED_VALUE {
            UNKNOWN_VALUE.to_string()
        } else {
            value.to_string()
        };
        return Ok(LineKind::Primitive {
            ty: strip_type_prefix(ty)?,
            value,
        });
    }

    Err(unknown_expression(expr))
}

/// `<type> *p<N>+<offset>`. Returns `None` when the left side is not a
/// pointer dereference, so `+` inside scalar values falls through.
fn classify_offset(expr: &str) -> Result<Option<LineKind>, ParseErrorKind> {
    let Some((left, right)) = expr.split_once('+') else {
        return Ok(None);
    };
    let Some(star) = left.rfind('*') else {
        return Ok(None);
    };
    let Some(digits) = left[star + 1..].trim().strip_prefix('p') else {
        return Ok(None);
    };

    Ok(Some(LineKind::PointerOffset {
        ty: strip_type_prefix(left[..star].trim())?,
        base: parse_number(digits.trim())?,
        offset: parse_number(right.trim())?,
    }))
}

/// Strip a dotted aggregate prefix; an unrecognized prefix is an error.
pub fn strip_type_prefix(ty: &str) -> Result<String, ParseErrorKind> {
    match ty.split_once('.') {
        None => Ok(ty.to_string()),
        Some((prefix, rest)) if TYPE_PREFIXES.contains(&prefix) => Ok(rest.to_string()),
        Some((prefix, _)) => Err(ParseErrorKind::UnknownTypePrefix {
            prefix: prefix.to_string(),
        }),
    }
}

fn parse_number<T: FromStr>(text: &str) -> Result<T, ParseErrorKind> {
    text.parse::<T>()
        .map_err(|_| ParseErrorKind::MalformedNumber {
            text: text.to_string(),
        })
}

fn unknown_expression(expr: &str) -> ParseErrorKind {
    ParseErrorKind::UnknownExpression {
        expr: expr.to_string(),
    }
}
