use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::domain::{
    Account, AdWatchRecord, Error, KeyValueStore, ReferralRecord, WithdrawalRequest,
};

pub const ACCOUNTS_KEY: &str = "accounts";
pub const WITHDRAWALS_KEY: &str = "withdrawals";
pub const AD_WATCHES_KEY: &str = "ad_watches";
pub const REFERRALS_KEY: &str = "referrals";
pub const BLOCKED_DEVICES_KEY: &str = "blocked_devices";
pub const SESSION_KEY: &str = "current_session";

#[derive(Default, Debug)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), Error> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), Error> {
        self.entries.remove(key);
        Ok(())
    }
}

/// One `<key>.json` file per collection inside `dir`.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, Error> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error> {
        match fs::read_to_string(self.path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), Error> {
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&tmp, value)?;
        fs::rename(tmp, self.path(key))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), Error> {
        match fs::remove_file(self.path(key)) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// Collections staged for one [`Repository::commit`].
#[derive(Debug, Default)]
pub struct Batch {
    entries: Vec<(&'static str, String)>,
}

impl Batch {
    pub fn accounts(self, accounts: &[Account]) -> Result<Self, Error> {
        self.put(ACCOUNTS_KEY, accounts)
    }

    pub fn withdrawals(self, withdrawals: &[WithdrawalRequest]) -> Result<Self, Error> {
        self.put(WITHDRAWALS_KEY, withdrawals)
    }

    pub fn ad_watches(self, records: &[AdWatchRecord]) -> Result<Self, Error> {
        self.put(AD_WATCHES_KEY, records)
    }

    pub fn referrals(self, records: &[ReferralRecord]) -> Result<Self, Error> {
        self.put(REFERRALS_KEY, records)
    }

    fn put<T: Serialize + ?Sized>(mut self, key: &'static str, value: &T) -> Result<Self, Error> {
        let raw = serde_json::to_string(value)?;
        self.entries.retain(|(k, _)| *k != key);
        self.entries.push((key, raw));
        Ok(self)
    }
}

/// Typed access to the persisted collections over any [`KeyValueStore`].
#[derive(Debug)]
pub struct Repository<S: KeyValueStore> {
    store: S,
    strict: bool,
}

impl<S: KeyValueStore> Repository<S> {
    pub fn new(store: S, strict: bool) -> Self {
        Self { store, strict }
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    fn load<T: DeserializeOwned + Default>(&self, key: &str) -> Result<T, Error> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(T::default());
        };
        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(e) if self.strict => {
                tracing::error!("collection `{}` failed to parse: {}", key, e);
                Err(Error::CorruptState(key.to_string()))
            }
            Err(e) => {
                tracing::warn!("discarding corrupt collection `{}`: {}", key, e);
                Ok(T::default())
            }
        }
    }

    fn save<T: Serialize + ?Sized>(&mut self, key: &'static str, value: &T) -> Result<(), Error> {
        self.commit(Batch::default().put(key, value)?)
    }

    /// Writes every staged collection. When a write fails, collections
    /// already written in this batch are restored to their previous value.
    pub fn commit(&mut self, batch: Batch) -> Result<(), Error> {
        let mut previous = Vec::with_capacity(batch.entries.len());
        for (key, _) in &batch.entries {
            previous.push((*key, self.store.get(key)?));
        }

        for (written, (key, raw)) in batch.entries.into_iter().enumerate() {
            if let Err(e) = self.store.set(key, raw) {
                tracing::error!("write of `{}` failed, rolling back {} collection(s)", key, written);
                self.rollback(&previous[..written]);
                return Err(e);
            }
        }
        Ok(())
    }

    fn rollback(&mut self, previous: &[(&'static str, Option<String>)]) {
        for (key, raw) in previous.iter().rev() {
            let restored = match raw {
                Some(raw) => self.store.set(key, raw.clone()),
                None => self.store.remove(key),
            };
            if let Err(e) = restored {
                tracing::error!("could not restore `{}`: {}", key, e);
            }
        }
    }

    pub fn accounts(&self) -> Result<Vec<Account>, Error> {
        self.load(ACCOUNTS_KEY)
    }

    pub fn save_accounts(&mut self, accounts: &[Account]) -> Result<(), Error> {
        self.save(ACCOUNTS_KEY, accounts)
    }

    pub fn withdrawals(&self) -> Result<Vec<WithdrawalRequest>, Error> {
        self.load(WITHDRAWALS_KEY)
    }

    pub fn save_withdrawals(&mut self, withdrawals: &[WithdrawalRequest]) -> Result<(), Error> {
        self.save(WITHDRAWALS_KEY, withdrawals)
    }

    pub fn ad_watches(&self) -> Result<Vec<AdWatchRecord>, Error> {
        self.load(AD_WATCHES_KEY)
    }

    pub fn save_ad_watches(&mut self, records: &[AdWatchRecord]) -> Result<(), Error> {
        self.save(AD_WATCHES_KEY, records)
    }

    pub fn referrals(&self) -> Result<Vec<ReferralRecord>, Error> {
        self.load(REFERRALS_KEY)
    }

    pub fn save_referrals(&mut self, records: &[ReferralRecord]) -> Result<(), Error> {
        self.save(REFERRALS_KEY, records)
    }

    pub fn blocked_devices(&self) -> Result<Vec<String>, Error> {
        self.load(BLOCKED_DEVICES_KEY)
    }

    pub fn save_blocked_devices(&mut self, devices: &[String]) -> Result<(), Error> {
        self.save(BLOCKED_DEVICES_KEY, devices)
    }

    pub fn session(&self) -> Result<Option<Account>, Error> {
        self.load(SESSION_KEY)
    }

    pub fn save_session(&mut self, account: &Account) -> Result<(), Error> {
        self.save(SESSION_KEY, account)
    }

    pub fn clear_session(&mut self) -> Result<(), Error> {
        self.store.remove(SESSION_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::testing::{SharedStore, noon};

    #[test]
    fn missing_collection_loads_empty() {
        let repo = Repository::new(MemoryStore::new(), false);
        assert!(repo.accounts().unwrap().is_empty());
        assert!(repo.session().unwrap().is_none());
    }

    #[test]
    fn corrupt_collection_degrades_to_empty() {
        let mut store = MemoryStore::new();
        store.set(WITHDRAWALS_KEY, "{not json".to_string()).unwrap();
        let repo = Repository::new(store, false);
        assert!(repo.withdrawals().unwrap().is_empty());
    }

    #[test]
    fn strict_repository_surfaces_corruption() {
        let mut store = MemoryStore::new();
        store.set(BLOCKED_DEVICES_KEY, "[1, 2".to_string()).unwrap();
        let repo = Repository::new(store, true);
        assert!(matches!(
            repo.blocked_devices(),
            Err(Error::CorruptState(key)) if key == BLOCKED_DEVICES_KEY
        ));
    }

    #[test]
    fn failed_commit_restores_earlier_collections() {
        let store = SharedStore::default();
        let mut repo = Repository::new(store.clone(), true);
        repo.save_blocked_devices(&["fp_1".to_string()]).unwrap();
        let account = Account::new(
            "081200000001".to_string(),
            "Budi".to_string(),
            "fp_a".to_string(),
            "ADAAAAAA".to_string(),
            None,
            noon(),
        );

        store.fail_next_write(WITHDRAWALS_KEY);
        let batch = Batch::default()
            .accounts(&[account])
            .unwrap()
            .withdrawals(&[])
            .unwrap();
        assert!(matches!(repo.commit(batch), Err(Error::Io(_))));

        assert!(store.get(ACCOUNTS_KEY).unwrap().is_none());
        assert!(store.get(WITHDRAWALS_KEY).unwrap().is_none());
        assert_eq!(repo.blocked_devices().unwrap(), vec!["fp_1".to_string()]);
    }

    #[test]
    fn later_put_replaces_staged_collection() {
        let batch = Batch::default()
            .referrals(&[])
            .unwrap()
            .referrals(&[])
            .unwrap();
        assert_eq!(batch.entries.len(), 1);
    }

    #[test]
    fn file_store_persists_between_handles() {
        let dir = tempfile::tempdir().unwrap();
        {
            let mut repo = Repository::new(FileStore::open(dir.path()).unwrap(), false);
            repo.save_blocked_devices(&["fp_1".to_string()]).unwrap();
        }
        let repo = Repository::new(FileStore::open(dir.path()).unwrap(), false);
        assert_eq!(repo.blocked_devices().unwrap(), vec!["fp_1".to_string()]);
    }

    #[test]
    fn file_store_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path()).unwrap();
        store.remove(SESSION_KEY).unwrap();
        store.set(SESSION_KEY, "null".to_string()).unwrap();
        store.remove(SESSION_KEY).unwrap();
        assert!(store.get(SESSION_KEY).unwrap().is_none());
    }
}
