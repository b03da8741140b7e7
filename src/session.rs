use crate::domain::{Account, AccountPatch, Clock, Error, KeyValueStore, Money, WithdrawalRequest};
use crate::identity::is_valid_payment_number;
use crate::platform::Platform;
use crate::quiz::QuizProvider;

impl<S: KeyValueStore, C: Clock> Platform<S, C> {
    /// Logs the account holding `payment_number` in from `fingerprint`.
    pub fn login(&mut self, payment_number: &str, fingerprint: &str) -> Result<Account, Error> {
        if !is_valid_payment_number(payment_number) {
            return Err(Error::Validation(
                "Payment number must be 10-13 digits".to_string(),
            ));
        }
        let account = self
            .find_by_payment_number(payment_number)?
            .ok_or_else(|| Error::NotFound(format!("account {payment_number}")))?;

        if self.is_blocked(fingerprint)? {
            tracing::warn!("login refused for {}: device blocked", account.id);
            return Err(Error::Blocked);
        }

        if let Some(previous) = self.repo.session()?.filter(|p| p.id != account.id) {
            self.unlocked_ads.remove(&previous.id);
        }

        let now = self.now();
        self.update(account.id, AccountPatch::default().last_active_at(now))?;
        let account = self.require_account(account.id)?;
        self.repo.save_session(&account)?;

        tracing::info!("account {} logged in", account.id);
        Ok(account)
    }

    pub fn logout(&mut self) -> Result<(), Error> {
        if let Some(account) = self.repo.session()? {
            self.unlocked_ads.remove(&account.id);
            tracing::info!("account {} logged out", account.id);
        }
        self.repo.clear_session()
    }

    /// The logged-in account, read fresh from the accounts collection.
    pub fn current_account(&self) -> Result<Option<Account>, Error> {
        match self.repo.session()? {
            Some(session) => self.find_by_id(session.id),
            None => Ok(None),
        }
    }

    fn session_account(&self) -> Result<Account, Error> {
        self.current_account()?.ok_or(Error::NotLoggedIn)
    }

    /// A correct answer unlocks exactly one ad view for the session account.
    pub fn answer_quiz<Q: QuizProvider>(
        &mut self,
        quiz: &Q,
        quiz_id: u32,
        answer: &str,
    ) -> Result<(), Error> {
        let account = self.session_account()?;
        if !quiz.is_correct(quiz_id, answer) {
            return Err(Error::WrongAnswer);
        }
        self.unlocked_ads.insert(account.id);
        Ok(())
    }

    pub fn has_unlocked_ad(&self, account: &Account) -> bool {
        self.unlocked_ads.contains(&account.id)
    }

    /// Credits a finished ad view and consumes the quiz unlock.
    pub fn complete_ad_view(&mut self, amount: Money) -> Result<Account, Error> {
        let account = self.session_account()?;
        if !self.unlocked_ads.contains(&account.id) {
            return Err(Error::AdLocked);
        }
        // consumed only once the reward is stored
        let updated = self.credit_ad_reward(account.id, amount)?;
        self.unlocked_ads.remove(&account.id);
        self.repo.save_session(&updated)?;
        Ok(updated)
    }

    /// Withdrawal on behalf of the session account.
    pub fn request_withdrawal(&mut self, amount: Money) -> Result<WithdrawalRequest, Error> {
        let account = self.session_account()?;
        let request = self.submit_withdrawal(account.id, amount)?;
        if let Some(updated) = self.find_by_id(account.id)? {
            self.repo.save_session(&updated)?;
        }
        Ok(request)
    }
}
