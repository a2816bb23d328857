use std::{fmt, str::FromStr};

use crate::{EngineError, ResultEngine};

/// Money in integer minor units (cents).
///
/// Amounts, balance snapshots, goal targets and goal progress all use this
/// type. There are no arithmetic operators: ledger math goes through the
/// checked methods so an overflowing balance is reported as bad input
/// instead of wrapping or panicking.
///
/// ```rust
/// use engine::MoneyCents;
///
/// let amount = MoneyCents::new(12_34);
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// assert_eq!("10,5".parse::<MoneyCents>().unwrap().cents(), 1050);
/// assert!("12.345".parse::<MoneyCents>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct MoneyCents(i64);

/// Error for amounts or sums that do not fit the ledger.
pub(crate) fn amount_too_large() -> EngineError {
    EngineError::InvalidInput("amount too large".to_string())
}

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);

    /// Largest single amount the ledger accepts (one trillion units).
    pub const MAX_AMOUNT: MoneyCents = MoneyCents(100_000_000_000_000);

    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub fn checked_add(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_add(rhs.0).map(MoneyCents)
    }

    #[must_use]
    pub fn checked_sub(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_sub(rhs.0).map(MoneyCents)
    }

    /// `checked_add` reporting overflow as [`EngineError::InvalidInput`].
    pub fn try_add(self, rhs: MoneyCents) -> ResultEngine<MoneyCents> {
        self.checked_add(rhs).ok_or_else(amount_too_large)
    }

    /// `checked_sub` reporting overflow as [`EngineError::InvalidInput`].
    pub fn try_sub(self, rhs: MoneyCents) -> ResultEngine<MoneyCents> {
        self.checked_sub(rhs).ok_or_else(amount_too_large)
    }

    /// Clamping addition, for figures that are only displayed.
    #[must_use]
    pub fn saturating_add(self, rhs: MoneyCents) -> MoneyCents {
        MoneyCents(self.0.saturating_add(rhs.0))
    }

    /// Clamping subtraction, for figures that are only displayed.
    #[must_use]
    pub fn saturating_sub(self, rhs: MoneyCents) -> MoneyCents {
        MoneyCents(self.0.saturating_sub(rhs.0))
    }

    /// Divides by `parts`, rounding away from zero to the next cent.
    ///
    /// Returns `None` when `parts` is not positive.
    #[must_use]
    pub fn div_ceil(self, parts: i64) -> Option<MoneyCents> {
        if parts <= 0 {
            return None;
        }
        let quotient = self.0 / parts;
        let adjusted = match (self.0 % parts).signum() {
            1 => quotient + 1,
            -1 => quotient - 1,
            _ => quotient,
        };
        Some(MoneyCents(adjusted))
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

/// Parses the digits after the separator into cents (`"5"` is 50).
fn fraction_cents(frac: &str, raw: &str) -> ResultEngine<i64> {
    if !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(EngineError::InvalidInput(format!("invalid amount: {raw}")));
    }
    match frac.len() {
        0 => Ok(0),
        1 | 2 => {
            let value: i64 = frac
                .parse()
                .map_err(|_| EngineError::InvalidInput(format!("invalid amount: {raw}")))?;
            Ok(if frac.len() == 1 { value * 10 } else { value })
        }
        _ => Err(EngineError::InvalidInput(
            "amounts have at most 2 decimals".to_string(),
        )),
    }
}

impl FromStr for MoneyCents {
    type Err = EngineError;

    /// Parses `[+-]units[.|,]cents` with at most two fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidInput(format!("invalid amount: {s}"));

        let trimmed = s.trim();
        let (negative, body) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, trimmed[1..].trim()),
            Some(b'+') => (false, trimmed[1..].trim()),
            _ => (false, trimmed),
        };
        if body.is_empty() {
            return Err(EngineError::InvalidInput("empty amount".to_string()));
        }

        let (units, frac) = body.split_once(['.', ',']).unwrap_or((body, ""));
        if units.is_empty() || !units.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if frac.contains(['.', ',']) {
            return Err(invalid());
        }

        let frac = fraction_cents(frac, s)?;
        let units: i64 = units.parse().map_err(|_| amount_too_large())?;
        let cents = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(frac))
            .ok_or_else(amount_too_large)?;

        Ok(MoneyCents(if negative { -cents } else { cents }))
    }
}
