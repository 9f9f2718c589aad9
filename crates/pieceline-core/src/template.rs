//! # Path Templates
//!
//! Catalogs describe piece locations with a small template language, and
//! the catalog URL itself is configured the same way. A template is
//! compiled once into segments and then rendered as a pure function of its
//! variables.
//!
//! ## Grammar
//!
//! ```text
//! template    := (literal | placeholder)*
//! placeholder := "{" name "}"
//!              | "{SubString:" start "," end ",{" name "}}"
//! name        := [A-Za-z0-9_.-]+
//! ```
//!
//! `SubString` yields `value[start..end]`.
//!
//! ```
//! use pieceline_core::PathTemplate;
//!
//! let t = PathTemplate::parse("pieces/{SubString:0,2,{TargetDigest}}/{TargetDigest}.solidpiece").unwrap();
//! assert_eq!(
//!     t.render(&[("TargetDigest", "abcdef")]).unwrap(),
//!     "pieces/ab/abcdef.solidpiece"
//! );
//! ```

use std::str::FromStr;

use crate::error::TemplateError;

const SUBSTRING_PREFIX: &str = "SubString:";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable(String),
    Substring { start: usize, end: usize, name: String },
}

/// A compiled path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    /// Compile a template source string.
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let bytes = source.as_bytes();
        let mut segments = Vec::new();
        let mut literal_start = 0;
        let mut i = 0;

        while i < bytes.len() {
            match bytes[i] {
                b'{' => {
                    if literal_start < i {
                        segments.push(Segment::Literal(source[literal_start..i].to_string()));
                    }
                    let close = matching_brace(bytes, i).ok_or_else(|| {
                        TemplateError::UnbalancedBrace {
                            template: source.to_string(),
                            position: i,
                        }
                    })?;
                    segments.push(parse_placeholder(&source[i + 1..close])?);
                    i = close + 1;
                    literal_start = i;
                }
                b'}' => {
                    return Err(TemplateError::UnbalancedBrace {
                        template: source.to_string(),
                        position: i,
                    });
                }
                _ => i += 1,
            }
        }
        if literal_start < bytes.len() {
            segments.push(Segment::Literal(source[literal_start..].to_string()));
        }

        Ok(Self {
            source: source.to_string(),
            segments,
        })
    }

    /// The template source text.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Names of all variables the template references, in order of first use.
    pub fn variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            let name = match segment {
                Segment::Literal(_) => continue,
                Segment::Variable(name) | Segment::Substring { name, .. } => name.as_str(),
            };
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Check that every referenced variable is among `available`.
    pub fn ensure_resolvable(&self, available: &[&str]) -> Result<(), TemplateError> {
        match self.variables().into_iter().find(|n| !available.contains(n)) {
            Some(missing) => Err(TemplateError::UnresolvedVariable(missing.to_string())),
            None => Ok(()),
        }
    }

    /// Render the template with the given `(name, value)` pairs.
    pub fn render(&self, vars: &[(&str, &str)]) -> Result<String, TemplateError> {
        let lookup = |name: &str| {
            vars.iter()
                .find(|(n, _)| *n == name)
                .map(|(_, v)| *v)
                .ok_or_else(|| TemplateError::UnresolvedVariable(name.to_string()))
        };

        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Variable(name) => out.push_str(lookup(name)?),
                Segment::Substring { start, end, name } => {
                    let value = lookup(name)?;
                    let slice = value.get(*start..*end).ok_or_else(|| {
                        TemplateError::SubstringOutOfRange {
                            name: name.clone(),
                            start: *start,
                            end: *end,
                            len: value.len(),
                        }
                    })?;
                    out.push_str(slice);
                }
            }
        }
        Ok(out)
    }
}

impl FromStr for PathTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

/// Index of the `}` closing the `{` at `open`, honouring nesting.
fn matching_brace(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, b) in bytes[open..].iter().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

fn parse_placeholder(inner: &str) -> Result<Segment, TemplateError> {
    let malformed = |reason: &str| TemplateError::MalformedPlaceholder {
        placeholder: inner.to_string(),
        reason: reason.to_string(),
    };

    let Some(args) = inner.strip_prefix(SUBSTRING_PREFIX) else {
        return if is_valid_name(inner) {
            Ok(Segment::Variable(inner.to_string()))
        } else {
            Err(malformed("expected a variable name or SubString:start,end,{Name}"))
        };
    };

    let mut parts = args.splitn(3, ',');
    let (Some(start), Some(end), Some(var)) = (parts.next(), parts.next(), parts.next()) else {
        return Err(malformed("SubString takes three arguments"));
    };
    let start: usize = start
        .trim()
        .parse()
        .map_err(|_| malformed("start is not a non-negative integer"))?;
    let end: usize = end
        .trim()
        .parse()
        .map_err(|_| malformed("end is not a non-negative integer"))?;
    if start > end {
        return Err(malformed("start is greater than end"));
    }
    let name = var
        .trim()
        .strip_prefix('{')
        .and_then(|v| v.strip_suffix('}'))
        .filter(|n| is_valid_name(n))
        .ok_or_else(|| malformed("third argument must be {Name}"))?;

    Ok(Segment::Substring {
        start,
        end,
        name: name.to_string(),
    })
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'_' | b'-' | b'.'))
}
