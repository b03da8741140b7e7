use rand::{Rng, distr::Alphanumeric};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::domain::{Account, AccountPatch, Clock, Error, KeyValueStore};
use crate::ledger::stage_signup_bonus;
use crate::platform::Platform;
use crate::storage::Batch;

const REFERRAL_CODE_SUFFIX_LEN: usize = 6;
const REFERRAL_CODE_ATTEMPTS: usize = 32;

#[derive(Validate, Debug, Clone)]
pub struct Registration {
    #[validate(custom = "validate_payment_number")]
    pub payment_number: String,

    #[validate(length(min = 3, message = "Display name must be at least 3 characters"))]
    pub display_name: String,

    #[validate(length(min = 1, message = "Device fingerprint is required"))]
    pub device_fingerprint: String,

    pub referral_code: Option<String>,
}

impl Registration {
    /// Trims the name and normalizes the referral code; an empty code means none.
    pub fn new(
        payment_number: impl Into<String>,
        display_name: impl AsRef<str>,
        device_fingerprint: impl Into<String>,
        referral_code: Option<&str>,
    ) -> Self {
        Self {
            payment_number: payment_number.into().trim().to_string(),
            display_name: display_name.as_ref().trim().to_string(),
            device_fingerprint: device_fingerprint.into(),
            referral_code: referral_code
                .map(|code| code.trim().to_uppercase())
                .filter(|code| !code.is_empty()),
        }
    }
}

pub fn is_valid_payment_number(number: &str) -> bool {
    (10..=13).contains(&number.len()) && number.bytes().all(|b| b.is_ascii_digit())
}

fn validate_payment_number(number: &str) -> Result<(), ValidationError> {
    if is_valid_payment_number(number) {
        Ok(())
    } else {
        let mut err = ValidationError::new("payment_number");
        err.message = Some("Payment number must be 10-13 digits".into());
        Err(err)
    }
}

/// Prefix followed by six uppercase alphanumerics, e.g. `ADX7K2QP`.
pub fn generate_referral_code(prefix: &str) -> String {
    let suffix = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(REFERRAL_CODE_SUFFIX_LEN)
        .map(char::from)
        .collect::<String>()
        .to_uppercase();
    format!("{prefix}{suffix}")
}

pub fn referral_link(base_url: &str, code: &str) -> String {
    format!("{}?ref={}", base_url.trim_end_matches('/'), code)
}

impl<S: KeyValueStore, C: Clock> Platform<S, C> {
    pub fn register(&mut self, registration: Registration) -> Result<Account, Error> {
        registration.validate()?;

        if self.config.block_on_register && self.is_blocked(&registration.device_fingerprint)? {
            tracing::warn!("registration refused for blocked device");
            return Err(Error::Blocked);
        }

        let mut accounts = self.repo.accounts()?;

        if accounts
            .iter()
            .any(|a| a.device_fingerprint == registration.device_fingerprint)
        {
            return Err(Error::DuplicateDevice);
        }
        if accounts
            .iter()
            .any(|a| a.payment_number == registration.payment_number)
        {
            return Err(Error::DuplicatePaymentNumber(registration.payment_number));
        }

        let referrer_id = match &registration.referral_code {
            Some(code) => Some(
                accounts
                    .iter()
                    .find(|a| &a.referral_code == code)
                    .map(|a| a.id)
                    .ok_or_else(|| Error::InvalidReferralCode(code.clone()))?,
            ),
            None => None,
        };

        let referral_code = self.unique_referral_code(&accounts)?;
        let mut account = Account::new(
            registration.payment_number,
            registration.display_name,
            registration.device_fingerprint,
            referral_code,
            referrer_id,
            self.now(),
        );
        let account_id = account.id;

        if referrer_id.is_some() {
            stage_signup_bonus(&mut account, self.config.referral_bonus)?;
        }
        accounts.push(account.clone());

        let mut batch = Batch::default();
        if let Some(referrer_id) = referrer_id {
            let mut referrals = self.repo.referrals()?;
            self.stage_link(&mut accounts, &mut referrals, account_id, referrer_id)?;
            batch = batch.referrals(&referrals)?;
        }
        self.repo.commit(batch.accounts(&accounts)?)?;

        tracing::info!("registered account {} (referred by {:?})", account_id, referrer_id);
        Ok(account)
    }

    fn unique_referral_code(&self, accounts: &[Account]) -> Result<String, Error> {
        for _ in 0..REFERRAL_CODE_ATTEMPTS {
            let code = generate_referral_code(&self.config.referral_prefix);
            if !accounts.iter().any(|a| a.referral_code == code) {
                return Ok(code);
            }
            tracing::debug!("referral code {} collided, retrying", code);
        }
        Err(Error::ReferralCodeSpaceExhausted)
    }

    pub fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, Error> {
        Ok(self.repo.accounts()?.into_iter().find(|a| a.id == id))
    }

    pub fn find_by_payment_number(&self, number: &str) -> Result<Option<Account>, Error> {
        Ok(self
            .repo
            .accounts()?
            .into_iter()
            .find(|a| a.payment_number == number))
    }

    pub fn find_by_device_fingerprint(&self, fingerprint: &str) -> Result<Option<Account>, Error> {
        Ok(self
            .repo
            .accounts()?
            .into_iter()
            .find(|a| a.device_fingerprint == fingerprint))
    }

    pub fn find_by_referral_code(&self, code: &str) -> Result<Option<Account>, Error> {
        Ok(self
            .repo
            .accounts()?
            .into_iter()
            .find(|a| a.referral_code == code))
    }

    /// Merges `patch` into the stored account. Unknown ids are a silent no-op.
    pub fn update(&mut self, id: Uuid, patch: AccountPatch) -> Result<(), Error> {
        let mut accounts = self.repo.accounts()?;
        match accounts.iter_mut().find(|a| a.id == id) {
            Some(account) => {
                patch.apply(account);
                self.repo.save_accounts(&accounts)
            }
            None => {
                tracing::debug!("update for unknown account {} ignored", id);
                Ok(())
            }
        }
    }
}
