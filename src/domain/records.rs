use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Money;

/// One completed ad view. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdWatchRecord {
    pub id: Uuid,
    pub account_id: Uuid,
    pub amount: Money,
    pub watched_at: DateTime<Utc>,
}

/// One referral event. `bonus` is zero for the signup link, the commission otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralRecord {
    pub id: Uuid,
    pub referrer_id: Uuid,
    pub referred_id: Uuid,
    pub bonus: Money,
    pub created_at: DateTime<Utc>,
}

impl ReferralRecord {
    pub fn is_link(&self) -> bool {
        self.bonus == Money::zero()
    }
}
