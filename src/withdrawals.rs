use uuid::Uuid;

use crate::domain::{
    Clock, Error, KeyValueStore, Money, Resolution, WithdrawalRequest, WithdrawalStatus,
};
use crate::ledger::{account_mut, stage_debit, stage_refund};
use crate::platform::Platform;
use crate::storage::Batch;

impl<S: KeyValueStore, C: Clock> Platform<S, C> {
    /// Reserves `amount` immediately and opens a pending request.
    pub fn submit_withdrawal(
        &mut self,
        account_id: Uuid,
        amount: Money,
    ) -> Result<WithdrawalRequest, Error> {
        let minimum = self.config.min_withdrawal;
        if amount < minimum {
            return Err(Error::BelowMinimum {
                requested: amount.amount(),
                minimum: minimum.amount(),
            });
        }

        let mut accounts = self.repo.accounts()?;
        let mut withdrawals = self.repo.withdrawals()?;
        let account = account_mut(&mut accounts, account_id)?;
        if withdrawals
            .iter()
            .any(|w| w.account_id == account_id && w.status.is_open())
        {
            return Err(Error::ExistingPendingRequest);
        }

        stage_debit(account, amount)?;

        let request = WithdrawalRequest {
            id: Uuid::new_v4(),
            account_id,
            payment_number: account.payment_number.clone(),
            display_name: account.display_name.clone(),
            amount,
            status: WithdrawalStatus::Pending,
            created_at: self.now(),
            processed_at: None,
        };
        withdrawals.push(request.clone());
        self.repo.commit(
            Batch::default()
                .withdrawals(&withdrawals)?
                .accounts(&accounts)?,
        )?;

        tracing::info!("withdrawal {} of {} submitted by {}", request.id, amount, account_id);
        Ok(request)
    }

    /// Final admin decision. Rejection refunds the reserved amount; completion
    /// has no ledger effect since the funds left at submission. The status
    /// change and the refund are committed together.
    pub fn resolve_withdrawal(
        &mut self,
        request_id: Uuid,
        resolution: Resolution,
    ) -> Result<WithdrawalRequest, Error> {
        let now = self.now();
        let mut withdrawals = self.repo.withdrawals()?;
        let request = withdrawals
            .iter_mut()
            .find(|w| w.id == request_id)
            .ok_or_else(|| Error::NotFound(format!("withdrawal {request_id}")))?;

        request.transition(resolution.into(), now)?;
        let resolved = request.clone();

        let mut batch = Batch::default().withdrawals(&withdrawals)?;
        if resolution == Resolution::Rejected {
            let mut accounts = self.repo.accounts()?;
            stage_refund(account_mut(&mut accounts, resolved.account_id)?, resolved.amount)?;
            batch = batch.accounts(&accounts)?;
        }
        self.repo.commit(batch)?;

        tracing::info!("withdrawal {} {}", resolved.id, resolved.status);
        Ok(resolved)
    }

    pub fn mark_processing(&mut self, request_id: Uuid) -> Result<WithdrawalRequest, Error> {
        let now = self.now();
        let mut withdrawals = self.repo.withdrawals()?;
        let request = withdrawals
            .iter_mut()
            .find(|w| w.id == request_id)
            .ok_or_else(|| Error::NotFound(format!("withdrawal {request_id}")))?;

        request.transition(WithdrawalStatus::Processing, now)?;
        let updated = request.clone();
        self.repo.save_withdrawals(&withdrawals)?;

        tracing::info!("withdrawal {} processing", updated.id);
        Ok(updated)
    }

    pub fn find_withdrawal(&self, request_id: Uuid) -> Result<Option<WithdrawalRequest>, Error> {
        Ok(self
            .repo
            .withdrawals()?
            .into_iter()
            .find(|w| w.id == request_id))
    }

    /// Requests of one account, newest first.
    pub fn withdrawals_of(&self, account_id: Uuid) -> Result<Vec<WithdrawalRequest>, Error> {
        let mut withdrawals: Vec<_> = self
            .repo
            .withdrawals()?
            .into_iter()
            .filter(|w| w.account_id == account_id)
            .collect();
        withdrawals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(withdrawals)
    }

    /// Pending and processing requests across all accounts, newest first.
    pub fn open_withdrawals(&self) -> Result<Vec<WithdrawalRequest>, Error> {
        let mut withdrawals: Vec<_> = self
            .repo
            .withdrawals()?
            .into_iter()
            .filter(|w| w.status.is_open())
            .collect();
        withdrawals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(withdrawals)
    }
}
