use crate::domain::{Clock, Error, KeyValueStore};
use crate::platform::Platform;

impl<S: KeyValueStore, C: Clock> Platform<S, C> {
    pub fn is_blocked(&self, fingerprint: &str) -> Result<bool, Error> {
        Ok(self
            .repo
            .blocked_devices()?
            .iter()
            .any(|blocked| blocked == fingerprint))
    }

    /// Adds `fingerprint` to the blocklist. Blocking twice is a no-op.
    pub fn block(&mut self, fingerprint: &str) -> Result<(), Error> {
        let mut blocked = self.repo.blocked_devices()?;
        if blocked.iter().any(|b| b == fingerprint) {
            return Ok(());
        }
        blocked.push(fingerprint.to_string());
        self.repo.save_blocked_devices(&blocked)?;
        tracing::info!("blocked device {}", fingerprint);
        Ok(())
    }

    pub fn blocked_devices(&self) -> Result<Vec<String>, Error> {
        self.repo.blocked_devices()
    }
}
