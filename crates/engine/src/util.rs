//! Internal helpers for model validation and conversion.
//!
//! These utilities are **not** part of the public API. They centralize
//! validation and mapping logic so the engine enforces consistent invariants.

use crate::{EngineError, MoneyCents, ResultEngine};

/// Declares an enumeration persisted by its symbolic name (`"INCOME"`,
/// `"EMERGENCY_FUND"`, ...).
///
/// Generates `as_str`, `ALL`, `Display` and a case-insensitive
/// `TryFrom<&str>` that reports unknown names as invalid input.
macro_rules! symbolic_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident ($label:literal) {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        $vis enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Symbolic name used in storage and on the wire.
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl TryFrom<&str> for $name {
            type Error = $crate::EngineError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                match value.trim().to_ascii_uppercase().as_str() {
                    $($text => Ok(Self::$variant),)+
                    other => Err($crate::EngineError::InvalidInput(format!(
                        concat!("invalid ", $label, ": {}"),
                        other
                    ))),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

pub(crate) use symbolic_enum;

/// Ids are positive integers; anything else is rejected before touching the
/// database.
pub(crate) fn validate_id(id: i64) -> ResultEngine<i64> {
    if id <= 0 {
        return Err(EngineError::InvalidInput("invalid id".to_string()));
    }
    Ok(id)
}

/// Trim a required text field, rejecting blank values.
pub(crate) fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::InvalidInput(format!("{label} is required")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn normalize_optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

/// Accepts amounts in `1..=MoneyCents::MAX_AMOUNT`.
pub(crate) fn require_positive(amount: MoneyCents, label: &str) -> ResultEngine<MoneyCents> {
    if !amount.is_positive() {
        return Err(EngineError::InvalidInput(format!(
            "{label} must be greater than zero"
        )));
    }
    if amount > MoneyCents::MAX_AMOUNT {
        return Err(EngineError::InvalidInput(format!(
            "{label} must not exceed {}",
            MoneyCents::MAX_AMOUNT
        )));
    }
    Ok(amount)
}
