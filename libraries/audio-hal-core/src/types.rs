//! Value types shared between the platform state and its backing subsystems

use serde::{Deserialize, Serialize};

use crate::error::{HalError, Result};

/// One of the two independently addressable backing subsystems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    /// General-purpose subsystem, reached through the stream interface
    Audio,
    /// Routing subsystem, reached through the route connector
    Route,
}

impl Domain {
    /// Both domains, in load order
    pub const ALL: [Domain; 2] = [Domain::Audio, Domain::Route];

    /// Configuration tag of the domain's own section
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Audio => "audio",
            Self::Route => "route",
        }
    }

    /// Parse from a configuration tag
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "audio" => Some(Self::Audio),
            "route" => Some(Self::Route),
            _ => None,
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of value held by a rogue parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RogueKind {
    /// 32-bit unsigned integer (`uint`)
    UnsignedInteger,
    /// Free text (`string`)
    String,
    /// Finite double precision float (`double`)
    Double,
}

impl RogueKind {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnsignedInteger => "uint",
            Self::String => "string",
            Self::Double => "double",
        }
    }

    /// Parse from a configuration type tag
    ///
    /// `unsigned int` is accepted for older configuration files.
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "uint" | "unsigned int" => Some(Self::UnsignedInteger),
            "string" => Some(Self::String),
            "double" => Some(Self::Double),
            _ => None,
        }
    }
}

impl std::fmt::Display for RogueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A raw value written to a backing subsystem without criterion translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum RogueValue {
    /// Unsigned integer value
    UnsignedInteger(u32),
    /// Text value
    String(String),
    /// Floating point value
    Double(f64),
}

impl RogueValue {
    /// Kind of this value
    #[must_use]
    pub fn kind(&self) -> RogueKind {
        match self {
            Self::UnsignedInteger(_) => RogueKind::UnsignedInteger,
            Self::String(_) => RogueKind::String,
            Self::Double(_) => RogueKind::Double,
        }
    }

    /// Parse a literal into a value of the given kind
    ///
    /// Parsing never depends on the process locale. Unsigned integers accept a
    /// `0x` prefixed hexadecimal form, doubles must be finite.
    ///
    /// # Errors
    /// Returns `HalError::InvalidLiteral` if the literal does not convert
    pub fn parse(kind: RogueKind, literal: &str) -> Result<Self> {
        let invalid = || HalError::invalid_literal(kind, literal);
        match kind {
            RogueKind::UnsignedInteger => parse_unsigned(literal)
                .map(Self::UnsignedInteger)
                .ok_or_else(invalid),
            RogueKind::String => Ok(Self::String(literal.to_string())),
            RogueKind::Double => literal
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(Self::Double)
                .ok_or_else(invalid),
        }
    }
}

impl std::fmt::Display for RogueValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsignedInteger(v) => write!(f, "{}", v),
            Self::String(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
        }
    }
}

/// Parse an unsigned 32-bit value, decimal or `0x` hexadecimal
#[must_use]
pub fn parse_unsigned(literal: &str) -> Option<u32> {
    match literal
        .strip_prefix("0x")
        .or_else(|| literal.strip_prefix("0X"))
    {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => literal.parse::<u32>().ok(),
    }
}

/// Stream direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Capture
    Input,
    /// Playback
    Output,
}

impl Direction {
    /// Convert to string representation
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Output => "output",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Voice band negotiated for a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BandType {
    /// Narrowband (8 kHz)
    Narrow,
    /// Wideband (16 kHz)
    Wide,
    /// Super-wideband (32 kHz)
    SuperWide,
}

impl BandType {
    /// Numeric code used by the band criterion types
    #[must_use]
    pub fn code(&self) -> u32 {
        match self {
            Self::Narrow => 0,
            Self::Wide => 1,
            Self::SuperWide => 2,
        }
    }

    /// Band type from its numeric code
    #[must_use]
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Narrow),
            1 => Some(Self::Wide),
            2 => Some(Self::SuperWide),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unsigned_decimal_and_hex() {
        assert_eq!(parse_unsigned("42"), Some(42));
        assert_eq!(parse_unsigned("0x10"), Some(16));
        assert_eq!(parse_unsigned("0XfF"), Some(255));
        assert_eq!(parse_unsigned("-1"), None);
        assert_eq!(parse_unsigned("abc"), None);
        assert_eq!(parse_unsigned(""), None);
    }

    #[test]
    fn test_rogue_value_parse() {
        assert_eq!(
            RogueValue::parse(RogueKind::UnsignedInteger, "7").unwrap(),
            RogueValue::UnsignedInteger(7)
        );
        assert_eq!(
            RogueValue::parse(RogueKind::Double, "1.5").unwrap(),
            RogueValue::Double(1.5)
        );
        assert_eq!(
            RogueValue::parse(RogueKind::String, "on air").unwrap(),
            RogueValue::String("on air".to_string())
        );
    }

    #[test]
    fn test_rogue_value_rejects_bad_literals() {
        let err = RogueValue::parse(RogueKind::UnsignedInteger, "notanumber").unwrap_err();
        assert_eq!(
            err,
            HalError::invalid_literal(RogueKind::UnsignedInteger, "notanumber")
        );
        assert!(RogueValue::parse(RogueKind::Double, "nan").is_err());
        assert!(RogueValue::parse(RogueKind::Double, "1,5").is_err());
    }

    #[test]
    fn test_rogue_value_display_round_trips() {
        for (kind, literal) in [
            (RogueKind::UnsignedInteger, "12"),
            (RogueKind::Double, "0.25"),
            (RogueKind::String, "speaker"),
        ] {
            let value = RogueValue::parse(kind, literal).unwrap();
            assert_eq!(value.to_string(), literal);
            assert_eq!(value.kind(), kind);
        }
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(RogueKind::from_str("unsigned int"), Some(RogueKind::UnsignedInteger));
        assert_eq!(RogueKind::from_str("uint"), Some(RogueKind::UnsignedInteger));
        assert_eq!(RogueKind::from_str("float"), None);
        assert_eq!(Domain::from_str("route"), Some(Domain::Route));
        assert_eq!(Domain::Audio.to_string(), "audio");
    }

    #[test]
    fn test_band_codes() {
        for band in [BandType::Narrow, BandType::Wide, BandType::SuperWide] {
            assert_eq!(BandType::from_code(band.code()), Some(band));
        }
        assert_eq!(BandType::from_code(9), None);
    }
}
