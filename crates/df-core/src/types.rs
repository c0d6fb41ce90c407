//! Identifier and period types shared by every Data Farming crate.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::SECONDS_PER_WEEK;
use crate::error::InputError;

/// Maximum number of hex digits after the `0x` prefix.
const MAX_ADDRESS_HEX_DIGITS: usize = 40;

/// Participant address, normalized to lowercase.
///
/// Accepts `0x` followed by 1 to 40 hex digits, in any case.
///
/// # Examples
///
/// ```
/// use df_core::types::Address;
/// let a: Address = "0xAbC1".parse().unwrap();
/// assert_eq!(a.as_str(), "0xabc1");
/// assert!("abc1".parse::<Address>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let digits = lower
            .strip_prefix("0x")
            .ok_or_else(|| InputError::InvalidAddress(s.to_string()))?;
        if digits.is_empty()
            || digits.len() > MAX_ADDRESS_HEX_DIGITS
            || !digits.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(InputError::InvalidAddress(s.to_string()));
        }
        Ok(Self(lower))
    }
}

impl TryFrom<String> for Address {
    type Error = InputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(addr: Address) -> Self {
        addr.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Market (prediction contract) identifier, normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MarketId(String);

impl MarketId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for MarketId {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(InputError::EmptyMarketId);
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for MarketId {
    type Error = InputError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MarketId> for String {
    fn from(id: MarketId) -> Self {
        id.0
    }
}

impl fmt::Display for MarketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Half-open scoring window `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct RewardPeriod {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawPeriod {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TryFrom<RawPeriod> for RewardPeriod {
    type Error = InputError;

    fn try_from(raw: RawPeriod) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl RewardPeriod {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, InputError> {
        if end < start {
            return Err(InputError::InvalidPeriod);
        }
        Ok(Self { start, end })
    }

    /// The seven-day window beginning at `start`.
    pub fn week_starting(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: start + Duration::seconds(SECONDS_PER_WEEK),
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whether a unix timestamp falls inside the window.
    pub fn contains_unix(&self, ts: i64) -> bool {
        self.start.timestamp() <= ts && ts < self.end.timestamp()
    }
}
