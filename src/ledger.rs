//! Balance mutations. Nothing else in the crate writes `balance`,
//! `total_earned`, `referral_earnings` or `ads_watched`.
//!
//! Operations stage their effect on in-memory collections with the
//! `stage_*` helpers and persist it with a single [`Batch`] commit.

use rand::Rng;
use uuid::Uuid;

use crate::domain::{Account, AccountPatch, AdWatchRecord, Clock, Error, KeyValueStore, Money};
use crate::platform::Platform;
use crate::storage::Batch;

impl<S: KeyValueStore, C: Clock> Platform<S, C> {
    /// Uniform draw from the configured reward range, inclusive on both ends.
    pub fn sample_ad_reward(&self) -> Money {
        let (min, max) = (self.config.ad_reward_min, self.config.ad_reward_max);
        Money(rand::rng().random_range(min.amount()..=max.amount()))
    }

    /// Credits one ad view plus the referrer's commission. Either the whole
    /// effect is persisted or none of it.
    pub fn credit_ad_reward(&mut self, account_id: Uuid, amount: Money) -> Result<Account, Error> {
        let (min, max) = (self.config.ad_reward_min, self.config.ad_reward_max);
        if amount < min || amount > max {
            return Err(Error::RewardOutOfRange {
                amount: amount.amount(),
                min: min.amount(),
                max: max.amount(),
            });
        }

        let mut accounts = self.repo.accounts()?;
        let mut watches = self.repo.ad_watches()?;

        let account = account_mut(&mut accounts, account_id)?;
        stage_ad_reward(account, amount)?;
        let referred_by = account.referred_by;

        watches.push(AdWatchRecord {
            id: Uuid::new_v4(),
            account_id,
            amount,
            watched_at: self.now(),
        });
        let mut batch = Batch::default().ad_watches(&watches)?;

        if let Some(referrer_id) = referred_by {
            let mut referrals = self.repo.referrals()?;
            match self.stage_commission(&mut accounts, &mut referrals, referrer_id, account_id, amount) {
                Ok(Some(record)) => {
                    batch = batch.referrals(&referrals)?;
                    tracing::info!("commission {} staged for {}", record.bonus, referrer_id);
                }
                Ok(None) => {}
                Err(Error::NotFound(what)) => {
                    tracing::warn!("skipping commission, referrer {} missing", what)
                }
                Err(e) => return Err(e),
            }
        }

        let updated = account_mut(&mut accounts, account_id)?.clone();
        self.repo.commit(batch.accounts(&accounts)?)?;

        tracing::info!("credited ad reward {} to {}", amount, account_id);
        Ok(updated)
    }

    /// Sets the balance of a brand-new account to exactly `amount`. Refused
    /// once the account has earned, been credited or requested a withdrawal.
    pub fn credit_signup_bonus(&mut self, account_id: Uuid, amount: Money) -> Result<Account, Error> {
        if !self.withdrawals_of(account_id)?.is_empty() {
            return Err(Error::SignupBonusUnavailable);
        }
        let mut accounts = self.repo.accounts()?;
        let account = account_mut(&mut accounts, account_id)?;
        stage_signup_bonus(account, amount)?;
        let updated = account.clone();
        self.repo.save_accounts(&accounts)?;

        tracing::info!("signup bonus {} set for {}", amount, account_id);
        Ok(updated)
    }

    /// The only path that lowers a balance.
    pub fn debit_for_withdrawal(&mut self, account_id: Uuid, amount: Money) -> Result<Account, Error> {
        let mut accounts = self.repo.accounts()?;
        let account = account_mut(&mut accounts, account_id)?;
        stage_debit(account, amount)?;
        let updated = account.clone();
        self.repo.save_accounts(&accounts)?;

        tracing::info!("debited {} from {}", amount, account_id);
        Ok(updated)
    }

    pub fn refund_withdrawal(&mut self, account_id: Uuid, amount: Money) -> Result<Account, Error> {
        let mut accounts = self.repo.accounts()?;
        let account = account_mut(&mut accounts, account_id)?;
        stage_refund(account, amount)?;
        let updated = account.clone();
        self.repo.save_accounts(&accounts)?;

        tracing::info!("refunded {} to {}", amount, account_id);
        Ok(updated)
    }

    pub(crate) fn require_account(&self, account_id: Uuid) -> Result<Account, Error> {
        self.find_by_id(account_id)?
            .ok_or_else(|| Error::NotFound(format!("account {account_id}")))
    }
}

pub(crate) fn account_mut(accounts: &mut [Account], account_id: Uuid) -> Result<&mut Account, Error> {
    accounts
        .iter_mut()
        .find(|a| a.id == account_id)
        .ok_or_else(|| Error::NotFound(format!("account {account_id}")))
}

fn stage_ad_reward(account: &mut Account, amount: Money) -> Result<(), Error> {
    AccountPatch {
        balance: Some(checked_add(account.balance, amount)?),
        total_earned: Some(checked_add(account.total_earned, amount)?),
        ads_watched: Some(account.ads_watched.saturating_add(1)),
        ..AccountPatch::default()
    }
    .apply(account);
    Ok(())
}

pub(crate) fn stage_signup_bonus(account: &mut Account, amount: Money) -> Result<(), Error> {
    if amount < Money::zero() {
        return Err(Error::InvalidAmount(amount.amount()));
    }
    let fresh = account.balance == Money::zero()
        && account.total_earned == Money::zero()
        && account.referral_earnings == Money::zero()
        && account.ads_watched == 0;
    if !fresh {
        return Err(Error::SignupBonusUnavailable);
    }
    AccountPatch {
        balance: Some(amount),
        ..AccountPatch::default()
    }
    .apply(account);
    Ok(())
}

pub(crate) fn stage_debit(account: &mut Account, amount: Money) -> Result<(), Error> {
    if !amount.is_positive() {
        return Err(Error::InvalidAmount(amount.amount()));
    }
    let balance = account
        .balance
        .checked_sub(amount)
        .filter(|b| *b >= Money::zero())
        .ok_or(Error::InsufficientBalance {
            requested: amount.amount(),
            available: account.balance.amount(),
        })?;
    AccountPatch {
        balance: Some(balance),
        ..AccountPatch::default()
    }
    .apply(account);
    Ok(())
}

pub(crate) fn stage_refund(account: &mut Account, amount: Money) -> Result<(), Error> {
    if !amount.is_positive() {
        return Err(Error::InvalidAmount(amount.amount()));
    }
    AccountPatch {
        balance: Some(checked_add(account.balance, amount)?),
        ..AccountPatch::default()
    }
    .apply(account);
    Ok(())
}

/// Commission credit on behalf of the referral engine.
pub(crate) fn stage_referral_earnings(account: &mut Account, commission: Money) -> Result<(), Error> {
    AccountPatch {
        balance: Some(checked_add(account.balance, commission)?),
        referral_earnings: Some(checked_add(account.referral_earnings, commission)?),
        ..AccountPatch::default()
    }
    .apply(account);
    Ok(())
}

fn checked_add(a: Money, b: Money) -> Result<Money, Error> {
    a.checked_add(b).ok_or(Error::InvalidAmount(b.amount()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerConfig;
    use crate::platform::testing::{FixedClock, funded, noon, platform, register, shared_platform};
    use crate::storage::{MemoryStore, REFERRALS_KEY};

    #[test]
    fn ad_reward_updates_counters_and_logs_watch() {
        let mut p = platform();
        let account = register(&mut p, "081200000001", "fp_a", None);

        let updated = p.credit_ad_reward(account.id, Money(42)).unwrap();
        assert_eq!(updated.balance, Money(42));
        assert_eq!(updated.total_earned, Money(42));
        assert_eq!(updated.ads_watched, 1);

        let watches = p.repo.ad_watches().unwrap();
        assert_eq!(watches.len(), 1);
        assert_eq!(watches[0].amount, Money(42));
        assert_eq!(watches[0].account_id, account.id);
    }

    #[test]
    fn ad_reward_outside_range_is_rejected() {
        let mut p = platform();
        let account = register(&mut p, "081200000001", "fp_a", None);
        assert!(matches!(
            p.credit_ad_reward(account.id, Money(51)),
            Err(Error::RewardOutOfRange { .. })
        ));
        assert!(matches!(
            p.credit_ad_reward(account.id, Money(34)),
            Err(Error::RewardOutOfRange { .. })
        ));
        assert!(p.repo.ad_watches().unwrap().is_empty());
    }

    #[test]
    fn sampled_rewards_stay_in_range() {
        let p = platform();
        for _ in 0..200 {
            let reward = p.sample_ad_reward();
            assert!(reward >= Money(35) && reward <= Money(50));
        }
    }

    #[test]
    fn ad_reward_for_unknown_account() {
        let mut p = platform();
        assert!(matches!(
            p.credit_ad_reward(Uuid::new_v4(), Money(40)),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn signup_bonus_sets_fresh_balance() {
        let mut p = platform();
        let account = register(&mut p, "081200000001", "fp_a", None);
        let updated = p.credit_signup_bonus(account.id, Money(50)).unwrap();
        assert_eq!(updated.balance, Money(50));
        assert_eq!(updated.total_earned, Money::zero());

        assert!(matches!(
            p.credit_signup_bonus(account.id, Money(50)),
            Err(Error::SignupBonusUnavailable)
        ));
    }

    #[test]
    fn signup_bonus_cannot_reset_earned_funds() {
        let mut p = platform();
        let account = funded(&mut p, "081200000001", "fp_a", Money(100));
        assert!(matches!(
            p.credit_signup_bonus(account.id, Money(50)),
            Err(Error::SignupBonusUnavailable)
        ));
        assert_eq!(p.require_account(account.id).unwrap().balance, Money(100));
    }

    #[test]
    fn signup_bonus_refused_while_withdrawal_is_reserved() {
        let config = LedgerConfig {
            min_withdrawal: Money(50),
            ..LedgerConfig::default()
        };
        let mut p = Platform::with_clock(MemoryStore::new(), config, FixedClock(noon())).unwrap();
        let referrer = register(&mut p, "081200000001", "fp_r", None);
        let invitee = register(&mut p, "081200000002", "fp_i", Some(&referrer.referral_code));
        let request = p.submit_withdrawal(invitee.id, Money(50)).unwrap();
        assert_eq!(p.require_account(invitee.id).unwrap().balance, Money::zero());

        assert!(matches!(
            p.credit_signup_bonus(invitee.id, Money(50)),
            Err(Error::SignupBonusUnavailable)
        ));
        p.resolve_withdrawal(request.id, crate::domain::Resolution::Rejected).unwrap();
        assert_eq!(p.require_account(invitee.id).unwrap().balance, Money(50));
    }

    #[test]
    fn failed_commission_leaves_reward_unapplied() {
        let (mut p, store) = shared_platform();
        let referrer = register(&mut p, "081200000001", "fp_r", None);
        let invitee = register(&mut p, "081200000002", "fp_i", Some(&referrer.referral_code));
        store.corrupt(REFERRALS_KEY);

        assert!(matches!(
            p.credit_ad_reward(invitee.id, Money(40)),
            Err(Error::CorruptState(_))
        ));

        let invitee = p.require_account(invitee.id).unwrap();
        assert_eq!(invitee.balance, Money(50));
        assert_eq!(invitee.ads_watched, 0);
        assert_eq!(p.require_account(referrer.id).unwrap().balance, Money::zero());
        assert!(p.ad_watches_of(invitee.id).unwrap().is_empty());
    }

    #[test]
    fn failed_write_rolls_back_the_whole_reward() {
        let (mut p, store) = shared_platform();
        let referrer = register(&mut p, "081200000001", "fp_r", None);
        let invitee = register(&mut p, "081200000002", "fp_i", Some(&referrer.referral_code));
        store.fail_next_write(REFERRALS_KEY);

        assert!(matches!(p.credit_ad_reward(invitee.id, Money(40)), Err(Error::Io(_))));
        assert!(p.ad_watches_of(invitee.id).unwrap().is_empty());
        assert_eq!(p.referrals_of(referrer.id).unwrap().len(), 1);

        let credited = p.credit_ad_reward(invitee.id, Money(40)).unwrap();
        assert_eq!(credited.balance, Money(90));
        assert_eq!(p.require_account(referrer.id).unwrap().balance, Money(8));
    }

    #[test]
    fn debit_never_overdraws() {
        let mut p = platform();
        let account = funded(&mut p, "081200000001", "fp_a", Money(100));
        let err = p.debit_for_withdrawal(account.id, Money(101)).unwrap_err();
        assert!(matches!(
            err,
            Error::InsufficientBalance { requested: 101, available: 100 }
        ));

        let after = p.debit_for_withdrawal(account.id, Money(100)).unwrap();
        assert_eq!(after.balance, Money::zero());
        assert!(p.debit_for_withdrawal(account.id, Money(1)).is_err());
    }

    #[test]
    fn refund_restores_debit() {
        let mut p = platform();
        let account = funded(&mut p, "081200000001", "fp_a", Money(150));
        p.debit_for_withdrawal(account.id, Money(120)).unwrap();
        let refunded = p.refund_withdrawal(account.id, Money(120)).unwrap();
        assert_eq!(refunded.balance, account.balance);
    }

    #[test]
    fn non_positive_amounts_are_rejected() {
        let mut p = platform();
        let account = funded(&mut p, "081200000001", "fp_a", Money(100));
        assert!(matches!(
            p.debit_for_withdrawal(account.id, Money(-5)),
            Err(Error::InvalidAmount(-5))
        ));
        assert!(matches!(
            p.refund_withdrawal(account.id, Money(0)),
            Err(Error::InvalidAmount(0))
        ));
    }
}
