use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Integer digits allowed before the decimal point (12 digits, 2 of them fractional).
const MAX_INTEGER_DIGITS: usize = 10;

/// A money amount with exactly two fractional digits, held as minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Price(i64);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PriceError {
    #[error("A valid number is required.")]
    Invalid,
    #[error("Ensure that there are no more than 2 decimal places.")]
    TooManyDecimals,
    #[error("Ensure that there are no more than 10 digits before the decimal point.")]
    TooManyDigits,
}

impl Price {
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Accepts a JSON number or a numeric string.
    pub fn from_json(value: &Value) -> Result<Self, PriceError> {
        match value {
            Value::String(raw) => raw.parse(),
            Value::Number(number) => number.to_string().parse(),
            _ => Err(PriceError::Invalid),
        }
    }
}

impl FromStr for Price {
    type Err = PriceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let (negative, unsigned) = match raw.as_bytes().first() {
            Some(b'-') => (true, &raw[1..]),
            Some(b'+') => (false, &raw[1..]),
            _ => (false, raw),
        };

        let (int_part, frac_part) = match unsigned.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (unsigned, ""),
        };

        if int_part.is_empty() && frac_part.is_empty() {
            return Err(PriceError::Invalid);
        }
        if !int_part.bytes().all(|b| b.is_ascii_digit())
            || !frac_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(PriceError::Invalid);
        }

        // Trailing zeros are not significant: "10.500" is still two places.
        let frac_part = frac_part.trim_end_matches('0');
        if frac_part.len() > 2 {
            return Err(PriceError::TooManyDecimals);
        }
        let int_part = int_part.trim_start_matches('0');
        if int_part.len() > MAX_INTEGER_DIGITS {
            return Err(PriceError::TooManyDigits);
        }

        let units: i64 = if int_part.is_empty() {
            0
        } else {
            int_part.parse().map_err(|_| PriceError::Invalid)?
        };
        let cents: i64 = match frac_part.len() {
            0 => 0,
            1 => frac_part.parse::<i64>().map_err(|_| PriceError::Invalid)? * 10,
            _ => frac_part.parse().map_err(|_| PriceError::Invalid)?,
        };

        let total = units * 100 + cents;
        Ok(Self(if negative { -total } else { total }))
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl Serialize for Price {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Price::from_json(&value).map_err(serde::de::Error::custom)
    }
}

/// The only user fields ever exposed to clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct UserPublic {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Ad {
    pub id: Uuid,
    pub owner: UserPublic,
    pub title: String,
    pub description: String,
    #[schema(value_type = String, example = "1500.00")]
    pub price: Price,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_owner: bool,
    pub is_favorited: bool,
    pub favorites_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct FavoriteStatus {
    pub is_favorited: bool,
    pub favorites_count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Message {
    pub message: String,
    pub timestamp: DateTime<Utc>,
}
