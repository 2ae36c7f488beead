//! Value objects shared across the storefront domain.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Money amount represented in paise to avoid floating point issues.
///
/// Serializes as a plain integer number of paise.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Money {
    /// Amount in paise (e.g., 49900 = ₹499.00)
    paise: i64,
}

impl Money {
    /// Creates a new Money amount from paise.
    pub fn from_paise(paise: i64) -> Self {
        Self { paise }
    }

    /// Creates a new Money amount from whole rupees.
    pub fn from_rupees(rupees: i64) -> Self {
        Self {
            paise: rupees * 100,
        }
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self { paise: 0 }
    }

    /// Returns the amount in paise.
    pub fn paise(&self) -> i64 {
        self.paise
    }

    /// Returns the rupee portion (whole number).
    pub fn rupees(&self) -> i64 {
        self.paise / 100
    }

    /// Returns the paise portion (remainder after rupees).
    pub fn paise_part(&self) -> i64 {
        self.paise.abs() % 100
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.paise > 0
    }

    /// Returns true if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.paise == 0
    }

    /// Adds another amount, failing on overflow.
    pub fn checked_add(&self, other: Money) -> Result<Money, DomainError> {
        self.paise
            .checked_add(other.paise)
            .map(Money::from_paise)
            .ok_or(DomainError::AmountOverflow)
    }

    /// Multiplies by a quantity, failing on overflow.
    pub fn checked_multiply(&self, quantity: Quantity) -> Result<Money, DomainError> {
        self.paise
            .checked_mul(i64::from(quantity.get()))
            .map(Money::from_paise)
            .ok_or(DomainError::AmountOverflow)
    }

    /// Parses a human-entered price such as `"₹499"`, `"1,299.50"` or `"Rs. 99.5"`.
    ///
    /// Currency symbols, letters, separators and whitespace are ignored. At most
    /// two fractional digits are accepted. Negative amounts are rejected.
    pub fn parse(raw: &str) -> Result<Money, DomainError> {
        let invalid = || DomainError::InvalidPrice(raw.to_string());

        if raw.contains('-') {
            return Err(invalid());
        }

        let cleaned: String = strip_currency(raw.trim())
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();

        let cleaned = cleaned.as_str();
        let (whole, fraction) = cleaned.split_once('.').unwrap_or((cleaned, ""));
        if (whole.is_empty() && fraction.is_empty())
            || fraction.len() > 2
            || !fraction.chars().all(|c| c.is_ascii_digit())
        {
            return Err(invalid());
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let fraction: i64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<i64>().map_err(|_| invalid())? * 10,
            _ => fraction.parse().map_err(|_| invalid())?,
        };

        whole
            .checked_mul(100)
            .and_then(|p| p.checked_add(fraction))
            .map(Money::from_paise)
            .ok_or_else(invalid)
    }
}

/// Drops a leading currency marker such as `₹`, `Rs.` or `INR`.
fn strip_currency(raw: &str) -> &str {
    const PREFIXES: [&str; 4] = ["₹", "rs.", "rs", "inr"];
    PREFIXES
        .iter()
        .find_map(|prefix| {
            raw.get(..prefix.len())
                .filter(|head| head.eq_ignore_ascii_case(prefix))
                .map(|_| &raw[prefix.len()..])
        })
        .unwrap_or(raw)
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.paise < 0 {
            write!(f, "-₹{}.{:02}", self.rupees().abs(), self.paise_part())
        } else {
            write!(f, "₹{}.{:02}", self.rupees(), self.paise_part())
        }
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money {
            paise: self.paise + rhs.paise,
        }
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.paise += rhs.paise;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// Serde adapter that writes [`Money`] as decimal rupees (`49900` paise → `499.0`).
///
/// Client-facing fields use this; `Money` on its own serializes as integer paise.
pub mod rupees {
    use serde::{Deserialize, Deserializer, Serializer, de};

    use super::Money;

    pub fn serialize<S: Serializer>(money: &Money, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(money.paise() as f64 / 100.0)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Money, D::Error> {
        let rupees = f64::deserialize(deserializer)?;
        if !rupees.is_finite() || rupees < 0.0 || rupees > (i64::MAX / 100) as f64 {
            return Err(de::Error::custom(format!("invalid rupee amount: {rupees}")));
        }
        Ok(Money::from_paise((rupees * 100.0).round() as i64))
    }
}

/// A strictly positive item quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// Largest quantity a single line may hold (fits a Postgres INTEGER).
    pub const MAX: u32 = i32::MAX as u32;

    /// Validates a raw quantity.
    pub fn new(value: i64) -> Result<Self, DomainError> {
        if value < 1 || value > i64::from(Self::MAX) {
            return Err(DomainError::InvalidQuantity(value));
        }
        Ok(Self(value as u32))
    }

    /// Returns the quantity as an unsigned integer.
    pub fn get(&self) -> u32 {
        self.0
    }

    /// Returns the quantity as a Postgres-compatible integer.
    pub fn as_i32(&self) -> i32 {
        // bounded by Self::MAX
        self.0 as i32
    }

    /// Adds two quantities, saturating at [`Quantity::MAX`].
    pub fn saturating_add(&self, other: Quantity) -> Quantity {
        Quantity(self.0.saturating_add(other.0).min(Self::MAX))
    }
}

impl TryFrom<i64> for Quantity {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

impl std::fmt::Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Returns the trimmed value if it is present and not blank.
pub(crate) fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
