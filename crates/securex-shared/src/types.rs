use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

// Wallet account address. Comparison and hashing ignore ASCII case, since
// wallets report checksummed (mixed-case) addresses interchangeably with
// lowercase ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_string())
    }

    /// Parse and validate a `0x`-prefixed, 20-byte hex address.
    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let addr = Self::new(s);
        if addr.is_well_formed() {
            Ok(addr)
        } else {
            Err(TypeError::InvalidAddress(s.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn is_well_formed(&self) -> bool {
        match self.0.strip_prefix("0x").or_else(|| self.0.strip_prefix("0X")) {
            Some(body) => body.len() == 40 && hex::decode(body).is_ok(),
            None => false,
        }
    }

    /// Case-insensitive comparison against a raw address string.
    pub fn matches(&self, other: &str) -> bool {
        !self.0.is_empty() && self.0.eq_ignore_ascii_case(other.trim())
    }

    pub fn to_lowercase(&self) -> String {
        self.0.to_ascii_lowercase()
    }

    /// `0x1234…abcd` form used in log lines.
    pub fn short(&self) -> String {
        if self.0.len() <= 10 || !self.0.is_ascii() {
            return self.0.clone();
        }
        format!("{}…{}", &self.0[..6], &self.0[self.0.len() - 4..])
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Hash for Address {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// EVM network identifier.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl ChainId {
    /// `0x`-prefixed lowercase hex, the form wallet bridges exchange.
    pub fn to_hex(&self) -> String {
        format!("0x{:x}", self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        let body = s
            .trim()
            .strip_prefix("0x")
            .or_else(|| s.trim().strip_prefix("0X"))
            .ok_or_else(|| TypeError::InvalidChainId(s.to_string()))?;
        u64::from_str_radix(body, 16)
            .map(Self)
            .map_err(|_| TypeError::InvalidChainId(s.to_string()))
    }
}

impl FromStr for ChainId {
    type Err = TypeError;

    /// Accepts either hex (`0x13881`) or decimal (`80001`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.starts_with("0x") || trimmed.starts_with("0X") {
            return Self::from_hex(trimmed);
        }
        trimmed
            .parse::<u64>()
            .map(Self)
            .map_err(|_| TypeError::InvalidChainId(s.to_string()))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}
