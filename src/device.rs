use crate::domain::{DeviceResolver, Error};

/// A fingerprint supplied by the caller, e.g. from a request header.
#[derive(Debug, Clone)]
pub struct StaticDevice(String);

impl StaticDevice {
    pub fn new(id: impl Into<String>) -> Result<Self, Error> {
        let id = id.into().trim().to_string();
        if id.is_empty() {
            return Err(Error::Validation("Device fingerprint is required".to_string()));
        }
        Ok(Self(id))
    }
}

impl DeviceResolver for StaticDevice {
    async fn device_id(&self) -> String {
        self.0.clone()
    }
}

/// Deterministic `fp_<hex>` hash over host attributes.
#[derive(Debug, Clone)]
pub struct EnvironmentFingerprint {
    attributes: Vec<String>,
}

impl EnvironmentFingerprint {
    pub fn new(attributes: Vec<String>) -> Self {
        Self { attributes }
    }

    pub fn from_host() -> Self {
        let env = |name: &str| std::env::var(name).unwrap_or_default();
        let cores = std::thread::available_parallelism()
            .map(|n| n.get().to_string())
            .unwrap_or_default();

        Self::new(vec![
            std::env::consts::OS.to_string(),
            std::env::consts::ARCH.to_string(),
            env("HOSTNAME"),
            env("USER"),
            env("LANG"),
            env("TZ"),
            cores,
        ])
    }

    pub fn fingerprint(&self) -> String {
        let data = self.attributes.join("|");
        let hash = data
            .chars()
            .fold(0i32, |h, c| h.wrapping_mul(31).wrapping_add(c as i32));
        format!("fp_{:x}", hash.unsigned_abs())
    }
}

impl DeviceResolver for EnvironmentFingerprint {
    async fn device_id(&self) -> String {
        self.fingerprint()
    }
}
