use argon2::{Argon2, PasswordHash, PasswordVerifier};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{
    Account, Clock, Error, KeyValueStore, Money, Resolution, WithdrawalRequest, WithdrawalStatus,
};
use crate::platform::Platform;

/// Proof that the caller passed admin authentication. Only
/// [`AdminAuthenticator::authenticate`] can build one.
#[derive(Debug, Clone)]
pub struct AdminSession {
    authenticated_at: DateTime<Utc>,
}

impl AdminSession {
    pub fn authenticated_at(&self) -> DateTime<Utc> {
        self.authenticated_at
    }
}

/// Verifies admin passwords against an argon2 PHC string from configuration.
#[derive(Debug, Clone)]
pub struct AdminAuthenticator {
    password_hash: Option<String>,
}

impl AdminAuthenticator {
    pub fn new(password_hash: Option<String>) -> Result<Self, Error> {
        if let Some(hash) = &password_hash {
            PasswordHash::new(hash)
                .map_err(|e| Error::Config(format!("admin password hash: {e}")))?;
        }
        Ok(Self { password_hash })
    }

    pub fn is_enabled(&self) -> bool {
        self.password_hash.is_some()
    }

    pub fn authenticate(&self, password: &str, now: DateTime<Utc>) -> Result<AdminSession, Error> {
        let Some(hash) = &self.password_hash else {
            tracing::warn!("admin login attempted but no admin credential is configured");
            return Err(Error::Unauthorized);
        };
        let parsed = PasswordHash::new(hash).map_err(|_| Error::Unauthorized)?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| {
                tracing::warn!("admin login failed");
                Error::Unauthorized
            })?;

        Ok(AdminSession {
            authenticated_at: now,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalStats {
    pub total_paid: Money,
    pub pending_amount: Money,
    pub pending_count: usize,
    pub completed_count: usize,
    pub rejected_count: usize,
}

impl<S: KeyValueStore, C: Clock> Platform<S, C> {
    pub fn authenticate_admin(&self, password: &str) -> Result<AdminSession, Error> {
        let session = self.admin.authenticate(password, self.now())?;
        tracing::info!("admin authenticated");
        Ok(session)
    }

    pub fn accounts(&self, _admin: &AdminSession) -> Result<Vec<Account>, Error> {
        self.repo.accounts()
    }

    /// Case-insensitive match on name and referral code, substring match on payment number.
    pub fn search_accounts(&self, _admin: &AdminSession, term: &str) -> Result<Vec<Account>, Error> {
        let needle = term.trim().to_lowercase();
        Ok(self
            .repo
            .accounts()?
            .into_iter()
            .filter(|a| {
                a.display_name.to_lowercase().contains(&needle)
                    || a.payment_number.contains(&needle)
                    || a.referral_code.to_lowercase().contains(&needle)
            })
            .collect())
    }

    /// Every request, newest first.
    pub fn withdrawals(&self, _admin: &AdminSession) -> Result<Vec<WithdrawalRequest>, Error> {
        let mut withdrawals = self.repo.withdrawals()?;
        withdrawals.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(withdrawals)
    }

    pub fn withdrawal_stats(&self, _admin: &AdminSession) -> Result<WithdrawalStats, Error> {
        let withdrawals = self.repo.withdrawals()?;
        let completed = || {
            withdrawals
                .iter()
                .filter(|w| w.status == WithdrawalStatus::Completed)
        };
        let open = || withdrawals.iter().filter(|w| w.status.is_open());

        Ok(WithdrawalStats {
            total_paid: completed().map(|w| w.amount).sum(),
            pending_amount: open().map(|w| w.amount).sum(),
            pending_count: open().count(),
            completed_count: completed().count(),
            rejected_count: withdrawals
                .iter()
                .filter(|w| w.status == WithdrawalStatus::Rejected)
                .count(),
        })
    }

    pub fn admin_resolve(
        &mut self,
        _admin: &AdminSession,
        request_id: Uuid,
        resolution: Resolution,
    ) -> Result<WithdrawalRequest, Error> {
        self.resolve_withdrawal(request_id, resolution)
    }

    pub fn admin_mark_processing(
        &mut self,
        _admin: &AdminSession,
        request_id: Uuid,
    ) -> Result<WithdrawalRequest, Error> {
        self.mark_processing(request_id)
    }

    /// Blocks the device fingerprint stored on `account_id`.
    pub fn block_account_device(&mut self, _admin: &AdminSession, account_id: Uuid) -> Result<String, Error> {
        let account = self.require_account(account_id)?;
        self.block(&account.device_fingerprint)?;
        Ok(account.device_fingerprint)
    }
}

#[cfg(test)]
mod tests {
    use argon2::password_hash::{PasswordHasher, SaltString, rand_core::OsRng};

    use super::*;
    use crate::config::LedgerConfig;
    use crate::platform::testing::{FixedClock, funded, noon, register};
    use crate::storage::MemoryStore;

    fn hash(password: &str) -> String {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap()
            .to_string()
    }

    fn admin_platform() -> Platform<MemoryStore, FixedClock> {
        let config = LedgerConfig {
            admin_password_hash: Some(hash("correct horse")),
            ..LedgerConfig::default()
        };
        Platform::with_clock(MemoryStore::new(), config, FixedClock(noon())).unwrap()
    }

    #[test]
    fn disabled_without_configured_hash() {
        let auth = AdminAuthenticator::new(None).unwrap();
        assert!(!auth.is_enabled());
        assert!(matches!(auth.authenticate("anything", noon()), Err(Error::Unauthorized)));
    }

    #[test]
    fn malformed_hash_is_a_config_error() {
        assert!(matches!(
            AdminAuthenticator::new(Some("admin123".to_string())),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn wrong_password_is_unauthorized() {
        let p = admin_platform();
        assert!(matches!(p.authenticate_admin("admin123"), Err(Error::Unauthorized)));
        let session = p.authenticate_admin("correct horse").unwrap();
        assert_eq!(session.authenticated_at(), noon());
    }

    #[test]
    fn search_matches_name_number_and_code() {
        let mut p = admin_platform();
        let admin = p.authenticate_admin("correct horse").unwrap();
        let a = register(&mut p, "081200000001", "fp_a", None);
        register(&mut p, "089900000002", "fp_b", None);

        assert_eq!(p.search_accounts(&admin, "test user").unwrap().len(), 2);
        assert_eq!(p.search_accounts(&admin, "0899").unwrap().len(), 1);
        let by_code = p
            .search_accounts(&admin, &a.referral_code.to_lowercase())
            .unwrap();
        assert_eq!(by_code[0].id, a.id);
        assert_eq!(p.accounts(&admin).unwrap().len(), 2);
    }

    #[test]
    fn stats_and_blocking() {
        let mut p = admin_platform();
        let admin = p.authenticate_admin("correct horse").unwrap();
        let a = funded(&mut p, "081200000001", "fp_a", Money(250));
        let b = funded(&mut p, "081200000002", "fp_b", Money(100));

        let wa = p.submit_withdrawal(a.id, Money(200)).unwrap();
        p.submit_withdrawal(b.id, Money(100)).unwrap();
        p.admin_resolve(&admin, wa.id, Resolution::Completed).unwrap();

        let stats = p.withdrawal_stats(&admin).unwrap();
        assert_eq!(stats.total_paid, Money(200));
        assert_eq!(stats.pending_amount, Money(100));
        assert_eq!((stats.pending_count, stats.completed_count), (1, 1));
        assert_eq!(p.withdrawals(&admin).unwrap().len(), 2);

        let fingerprint = p.block_account_device(&admin, b.id).unwrap();
        assert_eq!(fingerprint, "fp_b");
        assert!(matches!(p.login("081200000002", "fp_b"), Err(Error::Blocked)));
    }
}
