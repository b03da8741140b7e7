use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Money;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub payment_number: String,
    pub display_name: String,
    pub device_fingerprint: String,

    pub balance: Money,           // withdrawable funds, never negative
    pub total_earned: Money,      // lifetime ad rewards
    pub referral_earnings: Money, // commissions credited into balance

    pub referral_code: String,
    pub referred_by: Option<Uuid>,
    pub referral_count: u32,
    pub ads_watched: u32,

    pub created_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

impl Account {
    pub fn new(
        payment_number: String,
        display_name: String,
        device_fingerprint: String,
        referral_code: String,
        referred_by: Option<Uuid>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            payment_number,
            display_name,
            device_fingerprint,
            balance: Money::zero(),
            total_earned: Money::zero(),
            referral_earnings: Money::zero(),
            referral_code,
            referred_by,
            referral_count: 0,
            ads_watched: 0,
            created_at: now,
            last_active_at: now,
        }
    }
}

/// Partial update merged over a stored [`Account`]; `None` leaves the field as is.
///
/// Monetary and counter fields are crate-private: only the ledger and the
/// referral engine may set them.
#[derive(Debug, Default, Clone)]
pub struct AccountPatch {
    pub display_name: Option<String>,
    pub last_active_at: Option<DateTime<Utc>>,
    pub(crate) balance: Option<Money>,
    pub(crate) total_earned: Option<Money>,
    pub(crate) referral_earnings: Option<Money>,
    pub(crate) referral_count: Option<u32>,
    pub(crate) ads_watched: Option<u32>,
}

impl AccountPatch {
    pub fn display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    pub fn last_active_at(mut self, at: DateTime<Utc>) -> Self {
        self.last_active_at = Some(at);
        self
    }

    pub fn apply(self, account: &mut Account) {
        if let Some(name) = self.display_name {
            account.display_name = name;
        }
        if let Some(at) = self.last_active_at {
            account.last_active_at = at;
        }
        if let Some(balance) = self.balance {
            account.balance = balance;
        }
        if let Some(total) = self.total_earned {
            account.total_earned = total;
        }
        if let Some(earnings) = self.referral_earnings {
            account.referral_earnings = earnings;
        }
        if let Some(count) = self.referral_count {
            account.referral_count = count;
        }
        if let Some(ads) = self.ads_watched {
            account.ads_watched = ads;
        }
    }
}
