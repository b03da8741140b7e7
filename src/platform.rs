use std::collections::HashSet;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::admin::AdminAuthenticator;
use crate::config::LedgerConfig;
use crate::domain::{Clock, Error, KeyValueStore, SystemClock};
use crate::storage::Repository;

/// The bookkeeping core. Identity, access control, ledger, referral,
/// withdrawal, session and admin operations live in their own modules as
/// separate `impl` blocks over this type.
///
/// Every operation takes `&mut self`, so a single `Platform` serializes all
/// balance mutations. Sharing one persisted store between several processes
/// is not guarded against lost updates.
#[derive(Debug)]
pub struct Platform<S: KeyValueStore, C: Clock = SystemClock> {
    pub(crate) repo: Repository<S>,
    pub(crate) config: LedgerConfig,
    pub(crate) clock: C,
    pub(crate) admin: AdminAuthenticator,
    // accounts that answered a quiz and may complete one ad view
    pub(crate) unlocked_ads: HashSet<Uuid>,
}

impl<S: KeyValueStore> Platform<S, SystemClock> {
    pub fn new(store: S, config: LedgerConfig) -> Result<Self, Error> {
        Self::with_clock(store, config, SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> Platform<S, C> {
    pub fn with_clock(store: S, config: LedgerConfig, clock: C) -> Result<Self, Error> {
        config.validate()?;
        let admin = AdminAuthenticator::new(config.admin_password_hash.clone())?;

        Ok(Self {
            repo: Repository::new(store, config.strict_storage),
            config,
            clock,
            admin,
            unlocked_ads: HashSet::new(),
        })
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn repository(&self) -> &Repository<S> {
        &self.repo
    }

    pub fn into_store(self) -> S {
        self.repo.into_inner()
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}
