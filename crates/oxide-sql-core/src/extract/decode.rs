//! Decoders for vendor encodings of flags, rules and keywords.

use serde::{Deserialize, Serialize};

use super::error::{ExtractError, Result};
use super::row::CatalogValue;
use crate::ast::SqlExpression;
use crate::model::ReferentialAction;

/// How a catalog spells boolean flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanEncoding {
    /// `1` and `0`.
    Numeric,
    /// `YES`/`NO` or `Y`/`N`.
    YesNo,
    /// `ENABLED` and `DISABLED`.
    EnableState,
}

impl BooleanEncoding {
    /// Decodes a flag. NULL reads as false; any other unknown value is fatal.
    pub fn decode(self, value: &CatalogValue) -> Result<bool> {
        let invalid = || ExtractError::InvalidBooleanValue {
            value: value.to_string(),
        };
        let text = match value {
            CatalogValue::Null => return Ok(false),
            CatalogValue::Integer(v) if self == Self::Numeric => {
                return match v {
                    1 => Ok(true),
                    0 => Ok(false),
                    _ => Err(invalid()),
                };
            }
            CatalogValue::Text(v) => v.trim(),
            CatalogValue::Integer(_) | CatalogValue::Real(_) => return Err(invalid()),
        };
        let upper = text.to_ascii_uppercase();
        match (self, upper.as_str()) {
            (_, "") => Ok(false),
            (Self::Numeric, "1") | (Self::YesNo, "YES" | "Y") | (Self::EnableState, "ENABLED") => {
                Ok(true)
            }
            (Self::Numeric, "0") | (Self::YesNo, "NO" | "N") | (Self::EnableState, "DISABLED") => {
                Ok(false)
            }
            _ => Err(invalid()),
        }
    }
}

/// Decodes a foreign key rule.
pub fn referential_action(value: Option<&str>) -> Result<ReferentialAction> {
    let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(ReferentialAction::NoAction);
    };
    let normalized = raw.to_ascii_uppercase().replace('_', " ");
    match normalized.as_str() {
        "NO ACTION" | "RESTRICT" => Ok(ReferentialAction::NoAction),
        "CASCADE" => Ok(ReferentialAction::Cascade),
        "SET NULL" => Ok(ReferentialAction::SetNull),
        "SET DEFAULT" => Ok(ReferentialAction::SetDefault),
        _ => Err(ExtractError::InvalidReferentialAction {
            value: raw.to_string(),
        }),
    }
}

/// Kind of a key constraint row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// PRIMARY KEY.
    Primary,
    /// UNIQUE.
    Unique,
}

impl KeyKind {
    /// Decodes `PRIMARY KEY`/`P` and `UNIQUE`/`U`.
    pub fn decode(value: &str) -> Result<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PRIMARY KEY" | "P" => Ok(Self::Primary),
            "UNIQUE" | "U" => Ok(Self::Unique),
            other => Err(ExtractError::UnknownConstraintType(other.to_string())),
        }
    }
}

/// Removes a leading keyword (case-insensitive, whole word) and trims.
#[must_use]
pub fn strip_keyword<'a>(text: &'a str, keyword: &str) -> &'a str {
    let text = text.trim();
    let Some(head) = text.get(..keyword.len()) else {
        return text;
    };
    let rest = &text[keyword.len()..];
    let at_boundary = rest
        .chars()
        .next()
        .map_or(true, |c| !c.is_alphanumeric() && c != '_');
    if head.eq_ignore_ascii_case(keyword) && at_boundary {
        rest.trim()
    } else {
        text
    }
}

/// Wraps raw default text as a native expression.
#[must_use]
pub fn native_default(text: &str) -> Option<SqlExpression> {
    let text = strip_keyword(text, "DEFAULT");
    (!text.is_empty()).then(|| SqlExpression::native(text))
}

/// Wraps raw check text as a native expression.
#[must_use]
pub fn native_check(text: &str) -> SqlExpression {
    SqlExpression::native(strip_keyword(text, "CHECK"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_flags() {
        let enc = BooleanEncoding::Numeric;
        assert!(enc.decode(&CatalogValue::from("1")).unwrap());
        assert!(!enc.decode(&CatalogValue::from("0")).unwrap());
        assert!(enc.decode(&CatalogValue::from(1)).unwrap());
        assert!(!enc.decode(&CatalogValue::Null).unwrap());
        let err = enc.decode(&CatalogValue::from("2")).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidBooleanValue { value } if value == "2"));
        assert!(enc.decode(&CatalogValue::from(2)).is_err());
    }

    #[test]
    fn yes_no_and_enable_state_flags() {
        assert!(BooleanEncoding::YesNo.decode(&"YES".into()).unwrap());
        assert!(!BooleanEncoding::YesNo.decode(&"n".into()).unwrap());
        assert!(BooleanEncoding::YesNo.decode(&"1".into()).is_err());
        assert!(BooleanEncoding::EnableState.decode(&"ENABLED".into()).unwrap());
        assert!(!BooleanEncoding::EnableState.decode(&"DISABLED".into()).unwrap());
        assert!(BooleanEncoding::EnableState.decode(&"YES".into()).is_err());
    }

    #[test]
    fn referential_actions() {
        assert_eq!(referential_action(None).unwrap(), ReferentialAction::NoAction);
        assert_eq!(referential_action(Some(" ")).unwrap(), ReferentialAction::NoAction);
        assert_eq!(referential_action(Some("RESTRICT")).unwrap(), ReferentialAction::NoAction);
        assert_eq!(referential_action(Some("cascade")).unwrap(), ReferentialAction::Cascade);
        assert_eq!(referential_action(Some("SET_NULL")).unwrap(), ReferentialAction::SetNull);
        assert_eq!(
            referential_action(Some("SET DEFAULT")).unwrap(),
            ReferentialAction::SetDefault
        );
        assert!(matches!(
            referential_action(Some("EXPLODE")),
            Err(ExtractError::InvalidReferentialAction { .. })
        ));
    }

    #[test]
    fn key_kinds() {
        assert_eq!(KeyKind::decode("PRIMARY KEY").unwrap(), KeyKind::Primary);
        assert_eq!(KeyKind::decode("u").unwrap(), KeyKind::Unique);
        assert!(matches!(
            KeyKind::decode("FOREIGN KEY"),
            Err(ExtractError::UnknownConstraintType(_))
        ));
    }

    #[test]
    fn keyword_stripping() {
        assert_eq!(strip_keyword("DEFAULT 'new'", "DEFAULT"), "'new'");
        assert_eq!(strip_keyword("  default 0 ", "DEFAULT"), "0");
        assert_eq!(strip_keyword("DEFAULTS", "DEFAULT"), "DEFAULTS");
        assert_eq!(strip_keyword("CHECK (qty > 0)", "CHECK"), "(qty > 0)");
        assert!(native_default("DEFAULT ").is_none());
        assert_eq!(native_default("now()"), Some(SqlExpression::native("now()")));
    }
}
