//! Domain primitives: TimeSec, Address, TokenId, Direction.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Time in seconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeSec(pub i64);

impl TimeSec {
    /// Create a TimeSec from seconds.
    pub fn new(secs: i64) -> Self {
        TimeSec(secs)
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        TimeSec(chrono::Utc::now().timestamp())
    }

    /// Get the underlying seconds value.
    pub fn as_secs(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TimeSec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressParseError;

impl std::fmt::Display for AddressParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "address must be a non-empty string without whitespace")
    }
}

impl std::error::Error for AddressParseError {}

fn is_valid_identifier(s: &str) -> bool {
    !s.is_empty() && !s.chars().any(char::is_whitespace)
}

/// Wallet address (base58 or hex, kept verbatim).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    /// Create an Address from a string.
    pub fn new(addr: String) -> Self {
        Address(addr)
    }

    /// Get the address as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Address {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if !is_valid_identifier(trimmed) {
            return Err(AddressParseError);
        }
        Ok(Address(trimmed.to_string()))
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Token identifier (mint / contract address) as understood by the data provider.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenId(pub String);

impl TokenId {
    /// Create a TokenId from a string.
    pub fn new(token: String) -> Self {
        TokenId(token)
    }

    /// Get the token id as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for TokenId {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if !is_valid_identifier(trimmed) {
            return Err(AddressParseError);
        }
        Ok(TokenId(trimmed.to_string()))
    }
}

impl std::fmt::Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Direction of a token transfer relative to the wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Tokens received (a buy).
    In,
    /// Tokens sent away (a sell).
    Out,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::In => write!(f, "in"),
            Direction::Out => write!(f, "out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_serialization() {
        let json = serde_json::to_string(&Direction::In).unwrap();
        assert_eq!(json, "\"in\"");

        let json = serde_json::to_string(&Direction::Out).unwrap();
        assert_eq!(json, "\"out\"");
    }

    #[test]
    fn test_address_parse_trims_and_rejects_blank() {
        let addr = Address::from_str("  7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU ").unwrap();
        assert_eq!(addr.as_str(), "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU");

        assert!(Address::from_str("   ").is_err());
        assert!(Address::from_str("abc def").is_err());
    }

    #[test]
    fn test_token_id_display() {
        let token = TokenId::new("So11111111111111111111111111111111111111112".to_string());
        assert_eq!(token.to_string(), "So11111111111111111111111111111111111111112");
    }

    #[test]
    fn test_timesec_ordering() {
        let t1 = TimeSec::new(1000);
        let t2 = TimeSec::new(2000);
        assert!(t1 < t2);
        assert!(TimeSec::now() > t2);
    }
}
