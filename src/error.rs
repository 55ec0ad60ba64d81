/* This file is part of Sovereign Seas
 *
 * Copyright (C) 2024-2026 Sovereign Seas developers
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

// Hello developer. Please add your error to the according subsection
// that is commented, or make a new subsection. Keep it clean.

/// Main result type used throughout the codebase.
pub type Result<T> = std::result::Result<T, Error>;

/// General library errors used throughout the codebase.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    // ==============
    // Parsing errors
    // ==============
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error("TOML deserialization failed: {0}")]
    TomlDeserializeError(String),

    // =================
    // Validation errors
    // =================
    #[error("No wallet account is connected")]
    WalletNotConnected,

    #[error("Token swapper contract is not configured")]
    SwapperNotConfigured,

    #[error("Amount must be greater than zero")]
    NonPositiveAmount,

    #[error("Slippage of {0} bps is out of range (0-10000)")]
    SlippageOutOfRange(u32),

    #[error("The native currency is voted directly and cannot be swapped")]
    NativeTokenSwap,

    // ========================
    // Contract-related errors
    // ========================
    #[error("Contract read failed: {0}")]
    ContractReadFailed(String),

    #[error("Contract call failed: {0}")]
    ContractCallFailed(String),

    #[error("Transaction {0} was dropped from the mempool")]
    TransactionDropped(String),

    #[error("Transaction reverted: {0}")]
    TransactionReverted(String),

    // =============
    // Config errors
    // =============
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // ===================
    // IO & system errors
    // ===================
    #[error("IO error: {0}")]
    Io(String),

    #[error("Logger initialization failed: {0}")]
    LoggerError(String),

    // ==============
    // Catch-all
    // ==============
    #[error("{0}")]
    Custom(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Self::TomlDeserializeError(err.to_string())
    }
}

impl From<log::SetLoggerError> for Error {
    fn from(err: log::SetLoggerError) -> Self {
        Self::LoggerError(err.to_string())
    }
}

/// Translate raw provider error text into a message suitable for end
/// users. Known wallet/provider failures get a templated explanation,
/// anything else is passed through unchanged.
pub fn friendly_error(message: &str) -> String {
    let lower = message.to_lowercase();

    if lower.contains("insufficient funds") {
        return "Insufficient funds to cover the vote amount and network fees. \
                Top up your wallet and try again."
            .to_string()
    }

    if lower.contains("user rejected") || lower.contains("user denied") {
        return "The transaction was rejected in your wallet.".to_string()
    }

    if lower.contains("execution reverted") {
        return format!("The contract rejected the transaction: {message}")
    }

    message.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn friendly_error_templates() {
        let msg = friendly_error("err: insufficient funds for gas * price + value");
        assert!(msg.starts_with("Insufficient funds"));

        let msg = friendly_error("MetaMask Tx Signature: User denied transaction signature.");
        assert_eq!(msg, "The transaction was rejected in your wallet.");

        let msg = friendly_error("execution reverted: Campaign not active");
        assert!(msg.contains("Campaign not active"));

        assert_eq!(friendly_error("nonce too low"), "nonce too low");
    }
}
