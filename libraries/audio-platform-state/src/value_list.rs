//! Comma separated value lists and mapping tables
//!
//! Two small grammars appear as values in the configuration file:
//!
//! ```text
//! value-list    := entry ("," entry)*
//! entry         := literal | literal ":" code | code ":" literal
//! mapping-table := pair ("," pair)*
//! pair          := config-literal ":" domain-literal
//! code          := "0x" hex-digits | ["-"] decimal-digits
//! ```
//!
//! Empty entries are skipped and whitespace around entries and sides is
//! ignored. Errors carry the byte span of the offending entry.

use thiserror::Error;

/// Byte range of an entry inside the parsed text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Syntax errors in a value list or mapping table
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ListSyntaxError {
    /// One side of a `a:b` pair is empty
    #[error("empty side in pair {text:?} at {span}")]
    EmptySide { text: String, span: Span },

    /// More than one `:` in an entry
    #[error("too many ':' in {text:?} at {span}")]
    TooManySeparators { text: String, span: Span },

    /// Neither side of an explicit value pair is a numeric code
    #[error("no numeric code in {text:?} at {span}")]
    MissingCode { text: String, span: Span },

    /// Mapping entry without `:`
    #[error("expected config:domain pair, got {text:?} at {span}")]
    MissingSeparator { text: String, span: Span },

    /// Inclusive type with more implicit values than bits
    #[error("implicit value {text:?} at {span} exceeds 32 bits")]
    TooManyValues { text: String, span: Span },
}

/// One entry of a criterion type value list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeValue {
    /// Bare literal, code assigned from the running counter
    Implicit { literal: String, span: Span },
    /// Literal with an explicit code
    Explicit {
        literal: String,
        code: u32,
        span: Span,
    },
}

impl TypeValue {
    /// Literal of this entry
    pub fn literal(&self) -> &str {
        match self {
            Self::Implicit { literal, .. } | Self::Explicit { literal, .. } => literal,
        }
    }
}

/// One `config:domain` translation pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingPair {
    pub config: String,
    pub domain: String,
    pub span: Span,
}

/// Parse an explicit code: `0x` hexadecimal, or a signed decimal cast to unsigned
pub fn parse_code(text: &str) -> Option<u32> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        return u32::from_str_radix(hex, 16).ok();
    }
    text.parse::<i32>()
        .map(|signed| signed as u32)
        .ok()
        .or_else(|| text.parse::<u32>().ok())
}

/// Parse a criterion type value list
///
/// # Errors
/// Returns a `ListSyntaxError` on the first malformed entry
pub fn parse_type_values(input: &str) -> Result<Vec<TypeValue>, ListSyntaxError> {
    entries(input)
        .into_iter()
        .map(|(text, span)| match split_pair(text, span)? {
            None => Ok(TypeValue::Implicit {
                literal: text.to_string(),
                span,
            }),
            Some((left, right)) => {
                if let Some(code) = parse_code(right) {
                    Ok(TypeValue::Explicit {
                        literal: left.to_string(),
                        code,
                        span,
                    })
                } else if let Some(code) = parse_code(left) {
                    Ok(TypeValue::Explicit {
                        literal: right.to_string(),
                        code,
                        span,
                    })
                } else {
                    Err(ListSyntaxError::MissingCode {
                        text: text.to_string(),
                        span,
                    })
                }
            }
        })
        .collect()
}

/// Assign numeric codes to a parsed value list
///
/// Implicit entries take `1 << n` (inclusive) or `n` (exclusive) where `n`
/// counts the implicit entries seen so far. Explicit codes never move the
/// counter.
///
/// # Errors
/// Returns `ListSyntaxError::TooManyValues` when an inclusive type runs out of bits
pub fn assign_codes(
    values: &[TypeValue],
    inclusive: bool,
) -> Result<Vec<(u32, String)>, ListSyntaxError> {
    let mut index: u32 = 0;
    let mut assigned = Vec::with_capacity(values.len());
    for value in values {
        match value {
            TypeValue::Explicit { literal, code, .. } => assigned.push((*code, literal.clone())),
            TypeValue::Implicit { literal, span } => {
                let code = if inclusive {
                    1u32.checked_shl(index)
                        .ok_or_else(|| ListSyntaxError::TooManyValues {
                            text: literal.clone(),
                            span: *span,
                        })?
                } else {
                    index
                };
                assigned.push((code, literal.clone()));
                index += 1;
            }
        }
    }
    Ok(assigned)
}

/// Parse a mapping table
///
/// # Errors
/// Returns a `ListSyntaxError` on the first malformed pair
pub fn parse_mapping_table(input: &str) -> Result<Vec<MappingPair>, ListSyntaxError> {
    entries(input)
        .into_iter()
        .map(|(text, span)| match split_pair(text, span)? {
            Some((config, domain)) => Ok(MappingPair {
                config: config.to_string(),
                domain: domain.to_string(),
                span,
            }),
            None => Err(ListSyntaxError::MissingSeparator {
                text: text.to_string(),
                span,
            }),
        })
        .collect()
}

fn entries(input: &str) -> Vec<(&str, Span)> {
    let mut found = Vec::new();
    let mut offset = 0;
    for raw in input.split(',') {
        let leading = raw.len() - raw.trim_start().len();
        let text = raw.trim();
        if !text.is_empty() {
            let start = offset + leading;
            found.push((
                text,
                Span {
                    start,
                    end: start + text.len(),
                },
            ));
        }
        offset += raw.len() + 1;
    }
    found
}

fn split_pair(text: &str, span: Span) -> Result<Option<(&str, &str)>, ListSyntaxError> {
    let mut sides = text.split(':');
    let left = sides.next().unwrap_or_default().trim();
    let Some(right) = sides.next() else {
        return Ok(None);
    };
    if sides.next().is_some() {
        return Err(ListSyntaxError::TooManySeparators {
            text: text.to_string(),
            span,
        });
    }
    let right = right.trim();
    if left.is_empty() || right.is_empty() {
        return Err(ListSyntaxError::EmptySide {
            text: text.to_string(),
            span,
        });
    }
    Ok(Some((left, right)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn codes(input: &str, inclusive: bool) -> Vec<(u32, String)> {
        assign_codes(&parse_type_values(input).unwrap(), inclusive).unwrap()
    }

    #[test]
    fn test_implicit_inclusive_codes_are_bits() {
        assert_eq!(
            codes("a,b,c", true),
            vec![(1, "a".into()), (2, "b".into()), (4, "c".into())]
        );
    }

    #[test]
    fn test_implicit_exclusive_codes_are_indices() {
        assert_eq!(
            codes("Normal, RingTone ,InCall", false),
            vec![(0, "Normal".into()), (1, "RingTone".into()), (2, "InCall".into())]
        );
    }

    #[test]
    fn test_explicit_codes_do_not_move_counter() {
        assert_eq!(codes("x:0x10,y", false), vec![(16, "x".into()), (0, "y".into())]);
        assert_eq!(
            codes("a,x:0x80,b", true),
            vec![(1, "a".into()), (128, "x".into()), (2, "b".into())]
        );
    }

    #[test]
    fn test_negative_decimal_code_wraps() {
        assert_eq!(codes("all:-1", true), vec![(u32::MAX, "all".into())]);
    }

    #[test]
    fn test_legacy_code_first_orientation() {
        assert_eq!(codes("0x4:Speaker", true), vec![(4, "Speaker".into())]);
    }

    #[test]
    fn test_empty_entries_are_skipped() {
        assert_eq!(codes(",a,,b,", false), vec![(0, "a".into()), (1, "b".into())]);
        assert!(parse_type_values("").unwrap().is_empty());
    }

    #[test]
    fn test_value_list_errors_carry_span() {
        let err = parse_type_values("a,b:c").unwrap_err();
        assert_eq!(
            err,
            ListSyntaxError::MissingCode {
                text: "b:c".into(),
                span: Span { start: 2, end: 5 }
            }
        );

        let err = parse_type_values("ok, :3").unwrap_err();
        assert!(matches!(err, ListSyntaxError::EmptySide { span: Span { start: 4, end: 6 }, .. }));

        let err = parse_type_values("a:1:2").unwrap_err();
        assert!(matches!(err, ListSyntaxError::TooManySeparators { .. }));
    }

    #[test]
    fn test_inclusive_overflow() {
        let list: Vec<String> = (0..33).map(|i| format!("v{}", i)).collect();
        let values = parse_type_values(&list.join(",")).unwrap();
        let err = assign_codes(&values, true).unwrap_err();
        assert!(matches!(err, ListSyntaxError::TooManyValues { ref text, .. } if text == "v32"));
        assert_eq!(assign_codes(&values, false).unwrap().len(), 33);
    }

    #[test]
    fn test_mapping_table() {
        let pairs = parse_mapping_table("on:Enabled, off:Disabled").unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].config, "on");
        assert_eq!(pairs[0].domain, "Enabled");
        assert_eq!(pairs[1].span, Span { start: 12, end: 24 });
    }

    #[test]
    fn test_mapping_table_requires_pairs() {
        let err = parse_mapping_table("on:Enabled,off").unwrap_err();
        assert_eq!(
            err,
            ListSyntaxError::MissingSeparator {
                text: "off".into(),
                span: Span { start: 11, end: 14 }
            }
        );
    }

    #[test]
    fn test_parse_code() {
        assert_eq!(parse_code("0x10"), Some(16));
        assert_eq!(parse_code("12"), Some(12));
        assert_eq!(parse_code("-2"), Some(u32::MAX - 1));
        assert_eq!(parse_code("4294967295"), Some(u32::MAX));
        assert_eq!(parse_code("speaker"), None);
    }
}
