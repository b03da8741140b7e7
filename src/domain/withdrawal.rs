use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Error, Money};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WithdrawalStatus {
    Pending,
    Processing,
    Completed,
    Rejected,
}

impl WithdrawalStatus {
    pub fn to_str(&self) -> &str {
        match self {
            WithdrawalStatus::Pending => "pending",
            WithdrawalStatus::Processing => "processing",
            WithdrawalStatus::Completed => "completed",
            WithdrawalStatus::Rejected => "rejected",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WithdrawalStatus::Completed | WithdrawalStatus::Rejected)
    }

    /// Pending and processing requests still hold reserved funds.
    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }

    pub fn can_transition_to(&self, next: WithdrawalStatus) -> bool {
        use WithdrawalStatus::*;
        matches!(
            (self, next),
            (Pending, Processing) | (Pending, Completed) | (Pending, Rejected)
                | (Processing, Completed) | (Processing, Rejected)
        )
    }
}

impl core::fmt::Display for WithdrawalStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Admin decision on an open request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Completed,
    Rejected,
}

impl From<Resolution> for WithdrawalStatus {
    fn from(resolution: Resolution) -> Self {
        match resolution {
            Resolution::Completed => WithdrawalStatus::Completed,
            Resolution::Rejected => WithdrawalStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalRequest {
    pub id: Uuid,
    pub account_id: Uuid,
    // snapshot taken at submission
    pub payment_number: String,
    pub display_name: String,
    pub amount: Money,
    pub status: WithdrawalStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl WithdrawalRequest {
    pub fn transition(&mut self, next: WithdrawalStatus, now: DateTime<Utc>) -> Result<(), Error> {
        if self.status.is_terminal() {
            return Err(Error::AlreadyResolved(self.id.to_string()));
        }
        if !self.status.can_transition_to(next) {
            return Err(Error::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }

        self.status = next;
        if next.is_terminal() {
            self.processed_at = Some(now);
        }
        Ok(())
    }
}
