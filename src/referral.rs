use uuid::Uuid;

use crate::domain::{
    Account, AccountPatch, Clock, Error, KeyValueStore, Money, ReferralRecord,
};
use crate::ledger::{account_mut, stage_referral_earnings};
use crate::platform::Platform;
use crate::storage::Batch;

impl<S: KeyValueStore, C: Clock> Platform<S, C> {
    /// Records the signup link (bonus 0) and bumps the referrer's count.
    pub fn link_referral(&mut self, new_account_id: Uuid, referrer_id: Uuid) -> Result<(), Error> {
        let mut accounts = self.repo.accounts()?;
        let mut referrals = self.repo.referrals()?;
        self.stage_link(&mut accounts, &mut referrals, new_account_id, referrer_id)?;
        self.repo
            .commit(Batch::default().accounts(&accounts)?.referrals(&referrals)?)?;

        tracing::info!("linked {} to referrer {}", new_account_id, referrer_id);
        Ok(())
    }

    /// Pays `floor(base * rate)` to the referrer. A zero commission leaves no trace.
    ///
    /// Only the direct referrer is paid; commissions never cascade further up.
    pub fn credit_commission(
        &mut self,
        referrer_id: Uuid,
        referred_id: Uuid,
        base_amount: Money,
    ) -> Result<Option<ReferralRecord>, Error> {
        let mut accounts = self.repo.accounts()?;
        let mut referrals = self.repo.referrals()?;
        let record =
            self.stage_commission(&mut accounts, &mut referrals, referrer_id, referred_id, base_amount)?;

        if let Some(record) = &record {
            self.repo
                .commit(Batch::default().accounts(&accounts)?.referrals(&referrals)?)?;
            tracing::info!("commission {} paid to {}", record.bonus, referrer_id);
        }
        Ok(record)
    }

    pub(crate) fn stage_link(
        &self,
        accounts: &mut [Account],
        referrals: &mut Vec<ReferralRecord>,
        new_account_id: Uuid,
        referrer_id: Uuid,
    ) -> Result<(), Error> {
        let referrer = account_mut(accounts, referrer_id)?;
        AccountPatch {
            referral_count: Some(referrer.referral_count.saturating_add(1)),
            ..AccountPatch::default()
        }
        .apply(referrer);
        referrals.push(self.referral_record(referrer_id, new_account_id, Money::zero()));
        Ok(())
    }

    pub(crate) fn stage_commission(
        &self,
        accounts: &mut [Account],
        referrals: &mut Vec<ReferralRecord>,
        referrer_id: Uuid,
        referred_id: Uuid,
        base_amount: Money,
    ) -> Result<Option<ReferralRecord>, Error> {
        let commission = base_amount.commission(self.config.commission_rate);
        if !commission.is_positive() {
            return Ok(None);
        }

        stage_referral_earnings(account_mut(accounts, referrer_id)?, commission)?;
        let record = self.referral_record(referrer_id, referred_id, commission);
        referrals.push(record.clone());
        Ok(Some(record))
    }

    fn referral_record(&self, referrer_id: Uuid, referred_id: Uuid, bonus: Money) -> ReferralRecord {
        ReferralRecord {
            id: Uuid::new_v4(),
            referrer_id,
            referred_id,
            bonus,
            created_at: self.now(),
        }
    }

    /// Referral events earned by `referrer_id`, newest first.
    pub fn referrals_of(&self, referrer_id: Uuid) -> Result<Vec<ReferralRecord>, Error> {
        let mut records: Vec<_> = self
            .repo
            .referrals()?
            .into_iter()
            .filter(|r| r.referrer_id == referrer_id)
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }

    pub fn referral_earnings(&self, referrer_id: Uuid) -> Result<Money, Error> {
        Ok(self
            .referrals_of(referrer_id)?
            .into_iter()
            .map(|r| r.bonus)
            .sum())
    }
}
