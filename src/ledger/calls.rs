//! State-changing table calls and their entry-function encoding

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::secret::CommitHash;
use crate::table::types::{Address, Chips, SeatIndex};

/// Raw reveal bytes. Redacted from `Debug` and wiped on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecretBytes(Vec<u8>);

impl SecretBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SecretBytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretBytes(len={})", self.0.len())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TableCall {
    // hand lifecycle
    StartHand,
    SubmitCommit { hash: CommitHash },
    RevealSecret { secret: SecretBytes },
    HandleTimeout,
    // seat management
    LeaveTable,
    SitOut,
    SitIn,
    TopUp { amount: Chips },
    LeaveAfterHand,
    CancelLeaveAfterHand,
    // betting
    Fold,
    Check,
    Call,
    RaiseTo { amount: Chips },
    AllIn,
    Straddle,
    // admin
    PauseTable,
    ResumeTable,
    KickPlayer { seat: SeatIndex },
    ForceSitOut { seat: SeatIndex },
    ToggleAdminOnlyStart { enabled: bool },
    UpdateBlinds { small_blind: Chips, big_blind: Chips },
    UpdateBuyInLimits { min_buy_in: Chips, max_buy_in: Chips },
    CloseTable,
    EmergencyAbort,
}

impl TableCall {
    pub fn function_name(&self) -> &'static str {
        match self {
            TableCall::StartHand => "start_hand",
            TableCall::SubmitCommit { .. } => "submit_commit",
            TableCall::RevealSecret { .. } => "reveal_secret",
            TableCall::HandleTimeout => "handle_timeout",
            TableCall::LeaveTable => "leave_table",
            TableCall::SitOut => "sit_out",
            TableCall::SitIn => "sit_in",
            TableCall::TopUp { .. } => "top_up",
            TableCall::LeaveAfterHand => "leave_after_hand",
            TableCall::CancelLeaveAfterHand => "cancel_leave_after_hand",
            TableCall::Fold => "fold",
            TableCall::Check => "check",
            TableCall::Call => "call",
            TableCall::RaiseTo { .. } => "raise_to",
            TableCall::AllIn => "all_in",
            TableCall::Straddle => "straddle",
            TableCall::PauseTable => "pause_table",
            TableCall::ResumeTable => "resume_table",
            TableCall::KickPlayer { .. } => "kick_player",
            TableCall::ForceSitOut { .. } => "force_sit_out",
            TableCall::ToggleAdminOnlyStart { .. } => "toggle_admin_only_start",
            TableCall::UpdateBlinds { .. } => "update_blinds",
            TableCall::UpdateBuyInLimits { .. } => "update_buy_in_limits",
            TableCall::CloseTable => "close_table",
            TableCall::EmergencyAbort => "emergency_abort",
        }
    }

    pub fn requires_admin(&self) -> bool {
        matches!(
            self,
            TableCall::PauseTable
                | TableCall::ResumeTable
                | TableCall::KickPlayer { .. }
                | TableCall::ForceSitOut { .. }
                | TableCall::ToggleAdminOnlyStart { .. }
                | TableCall::UpdateBlinds { .. }
                | TableCall::UpdateBuyInLimits { .. }
                | TableCall::CloseTable
                | TableCall::EmergencyAbort
        )
    }

    /// Call-specific arguments following the table address. Integers go out as
    /// decimal strings and byte vectors as `0x` hex, matching the node's JSON
    /// argument encoding.
    pub fn extra_arguments(&self) -> Vec<Value> {
        match self {
            TableCall::SubmitCommit { hash } => vec![Value::String(hash.to_hex())],
            TableCall::RevealSecret { secret } => {
                vec![Value::String(format!("0x{}", hex::encode(secret.as_slice())))]
            }
            TableCall::TopUp { amount } | TableCall::RaiseTo { amount } => {
                vec![Value::String(amount.to_string())]
            }
            TableCall::KickPlayer { seat } | TableCall::ForceSitOut { seat } => {
                vec![Value::String(seat.to_string())]
            }
            TableCall::ToggleAdminOnlyStart { enabled } => vec![Value::Bool(*enabled)],
            TableCall::UpdateBlinds {
                small_blind,
                big_blind,
            } => vec![
                Value::String(small_blind.to_string()),
                Value::String(big_blind.to_string()),
            ],
            TableCall::UpdateBuyInLimits {
                min_buy_in,
                max_buy_in,
            } => vec![
                Value::String(min_buy_in.to_string()),
                Value::String(max_buy_in.to_string()),
            ],
            _ => Vec::new(),
        }
    }

    pub fn payload(&self, module: &str, table: &Address) -> EntryFunctionPayload {
        let mut arguments = vec![Value::String(table.as_str().to_string())];
        arguments.extend(self.extra_arguments());
        EntryFunctionPayload {
            function: format!("{module}::{}", self.function_name()),
            type_arguments: Vec::new(),
            arguments,
        }
    }
}

/// What a wallet signs and submits for one call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntryFunctionPayload {
    pub function: String,
    pub type_arguments: Vec<String>,
    pub arguments: Vec<Value>,
}
