//! Domain primitives: ContractAddress, TelegramId.

use serde::{Deserialize, Serialize};

/// Solana token contract (mint) address, base58 string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContractAddress(pub String);

impl ContractAddress {
    /// Create a ContractAddress from a string.
    pub fn new(addr: String) -> Self {
        ContractAddress(addr)
    }

    /// Get the address as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the address is empty or whitespace-only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Telegram user id of a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TelegramId(pub i64);

impl TelegramId {
    /// Create a TelegramId from an i64.
    pub fn new(id: i64) -> Self {
        TelegramId(id)
    }

    /// Get the underlying id value.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for TelegramId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_address_display() {
        let addr = ContractAddress::new("So11111111111111111111111111111111111111112".to_string());
        assert_eq!(
            addr.to_string(),
            "So11111111111111111111111111111111111111112"
        );
    }

    #[test]
    fn test_contract_address_is_blank() {
        assert!(ContractAddress::new("  ".to_string()).is_blank());
        assert!(!ContractAddress::new("abc".to_string()).is_blank());
    }

    #[test]
    fn test_telegram_id_ordering() {
        let a = TelegramId::new(100);
        let b = TelegramId::new(200);
        assert!(a < b);
        assert_eq!(a.as_i64(), 100);
    }
}
