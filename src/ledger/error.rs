use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Wallet not connected")]
    WalletNotConnected,
    #[error("Transaction signing was declined")]
    SigningDeclined,
    #[error("Transaction rejected: {0}")]
    Rejected(String),
    #[error("Ledger request failed: {0}")]
    Transport(String),
    #[error("Unexpected ledger response from {function}: {reason}")]
    Decode {
        function: &'static str,
        reason: String,
    },
}

impl LedgerError {
    pub fn decode(function: &'static str, reason: impl Into<String>) -> Self {
        Self::Decode {
            function,
            reason: reason.into(),
        }
    }
}

impl From<reqwest::Error> for LedgerError {
    fn from(err: reqwest::Error) -> Self {
        LedgerError::Transport(err.to_string())
    }
}
