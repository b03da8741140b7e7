use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{AdWatchRecord, Clock, Error, KeyValueStore, Money, WithdrawalStatus};
use crate::platform::Platform;

/// Dashboard figures for one account.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    pub account_id: Uuid,
    pub balance: Money,
    pub total_earned: Money,
    pub total_withdrawn: Money,
    pub pending_withdrawal: Money,
    pub ads_watched_today: usize,
    pub referral_count: u32,
    pub referral_earnings: Money,
    /// Percent of the minimum withdrawal reached, capped at 100.
    pub withdrawal_progress: u8,
    pub can_withdraw: bool,
}

impl<S: KeyValueStore, C: Clock> Platform<S, C> {
    /// Watches of one account, newest first.
    pub fn ad_watches_of(&self, account_id: Uuid) -> Result<Vec<AdWatchRecord>, Error> {
        let mut watches: Vec<_> = self
            .repo
            .ad_watches()?
            .into_iter()
            .filter(|w| w.account_id == account_id)
            .collect();
        watches.sort_by(|a, b| b.watched_at.cmp(&a.watched_at));
        Ok(watches)
    }

    /// Watches recorded on `day` (UTC calendar date).
    pub fn ad_watches_on(&self, account_id: Uuid, day: NaiveDate) -> Result<Vec<AdWatchRecord>, Error> {
        Ok(self
            .ad_watches_of(account_id)?
            .into_iter()
            .filter(|w| w.watched_at.date_naive() == day)
            .collect())
    }

    pub fn account_summary(&self, account_id: Uuid) -> Result<AccountSummary, Error> {
        let account = self.require_account(account_id)?;
        let today = self.now().date_naive();
        let withdrawals = self.withdrawals_of(account_id)?;

        let total_withdrawn = withdrawals
            .iter()
            .filter(|w| w.status == WithdrawalStatus::Completed)
            .map(|w| w.amount)
            .sum();
        let pending_withdrawal = withdrawals
            .iter()
            .filter(|w| w.status.is_open())
            .map(|w| w.amount)
            .sum();
        let minimum = self.config.min_withdrawal;

        Ok(AccountSummary {
            account_id,
            balance: account.balance,
            total_earned: account.total_earned,
            total_withdrawn,
            pending_withdrawal,
            ads_watched_today: self.ad_watches_on(account_id, today)?.len(),
            referral_count: account.referral_count,
            referral_earnings: self.referral_earnings(account_id)?,
            withdrawal_progress: account.balance.percent_of(minimum),
            can_withdraw: account.balance >= minimum,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::config::LedgerConfig;
    use crate::domain::Resolution;
    use crate::platform::testing::{FixedClock, funded, noon, platform, register};
    use crate::storage::MemoryStore;

    #[test]
    fn summary_counts_only_todays_ads() {
        let yesterday = noon() - Duration::days(1);
        let mut p = Platform::with_clock(MemoryStore::new(), LedgerConfig::default(), FixedClock(yesterday))
            .unwrap();
        let account = register(&mut p, "081200000001", "fp_a", None);
        p.credit_ad_reward(account.id, Money(40)).unwrap();

        let store = p.into_store();
        let mut p = Platform::with_clock(store, LedgerConfig::default(), FixedClock(noon())).unwrap();
        p.credit_ad_reward(account.id, Money(45)).unwrap();
        p.credit_ad_reward(account.id, Money(50)).unwrap();

        let watches = p.ad_watches_of(account.id).unwrap();
        assert_eq!(watches.len(), 3);
        assert!(watches[0].watched_at >= watches[2].watched_at);

        let summary = p.account_summary(account.id).unwrap();
        assert_eq!(summary.ads_watched_today, 2);
        assert_eq!(summary.balance, Money(135));
        assert_eq!(summary.withdrawal_progress, 100);
        assert!(summary.can_withdraw);
    }

    #[test]
    fn summary_splits_withdrawn_and_pending() {
        let mut p = platform();
        let account = funded(&mut p, "081200000001", "fp_a", Money(300));

        let first = p.submit_withdrawal(account.id, Money(100)).unwrap();
        p.resolve_withdrawal(first.id, Resolution::Completed).unwrap();
        p.submit_withdrawal(account.id, Money(150)).unwrap();

        let summary = p.account_summary(account.id).unwrap();
        assert_eq!(summary.total_withdrawn, Money(100));
        assert_eq!(summary.pending_withdrawal, Money(150));
        assert_eq!(summary.balance, Money(50));
        assert_eq!(summary.withdrawal_progress, 50);
        assert!(!summary.can_withdraw);
    }
}
