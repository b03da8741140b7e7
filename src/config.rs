use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;
use tracing_subscriber::filter::LevelFilter;

use crate::domain::{Error, Money};

const ENV_PREFIX: &str = "REWARD_LEDGER_";

#[derive(Debug, Clone)]
pub struct LedgerConfig {
    pub min_withdrawal: Money,
    pub ad_reward_min: Money,
    pub ad_reward_max: Money,
    pub referral_bonus: Money,
    pub commission_rate: Decimal,
    pub referral_prefix: String,
    /// Surface `CorruptState` instead of treating unreadable collections as empty.
    pub strict_storage: bool,
    pub block_on_register: bool,
    /// Argon2 PHC string; admin login is disabled when absent.
    pub admin_password_hash: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub log_level: LevelFilter,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            min_withdrawal: Money(100),
            ad_reward_min: Money(35),
            ad_reward_max: Money(50),
            referral_bonus: Money(50),
            commission_rate: Decimal::new(20, 2),
            referral_prefix: "AD".to_string(),
            strict_storage: false,
            block_on_register: true,
            admin_password_hash: None,
            data_dir: None,
            log_level: LevelFilter::INFO,
        }
    }
}

impl LedgerConfig {
    /// Reads `REWARD_LEDGER_*` variables, falling back to the defaults above.
    pub fn from_env() -> Result<Self, Error> {
        let defaults = Self::default();

        let config = Self {
            min_withdrawal: money_var("MIN_WITHDRAWAL", defaults.min_withdrawal)?,
            ad_reward_min: money_var("AD_REWARD_MIN", defaults.ad_reward_min)?,
            ad_reward_max: money_var("AD_REWARD_MAX", defaults.ad_reward_max)?,
            referral_bonus: money_var("REFERRAL_BONUS", defaults.referral_bonus)?,
            commission_rate: parsed_var("COMMISSION_RATE", defaults.commission_rate)?,
            referral_prefix: var("REFERRAL_PREFIX").unwrap_or(defaults.referral_prefix),
            strict_storage: parsed_var("STRICT_STORAGE", defaults.strict_storage)?,
            block_on_register: parsed_var("BLOCK_ON_REGISTER", defaults.block_on_register)?,
            admin_password_hash: var("ADMIN_PASSWORD_HASH"),
            data_dir: var("DATA_DIR").map(PathBuf::from),
            log_level: parsed_var("LOG", defaults.log_level)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !self.ad_reward_min.is_positive() || self.ad_reward_min > self.ad_reward_max {
            return Err(Error::Config(format!(
                "ad reward range {}..={} is empty or not positive",
                self.ad_reward_min, self.ad_reward_max
            )));
        }
        if !self.min_withdrawal.is_positive() {
            return Err(Error::Config("minimum withdrawal must be positive".to_string()));
        }
        if self.referral_bonus < Money::zero() {
            return Err(Error::Config("referral bonus cannot be negative".to_string()));
        }
        if self.commission_rate < Decimal::ZERO || self.commission_rate > Decimal::ONE {
            return Err(Error::Config(format!(
                "commission rate {} must be within 0..=1",
                self.commission_rate
            )));
        }
        if self.referral_prefix.len() != 2 || !self.referral_prefix.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(Error::Config(format!(
                "referral prefix `{}` must be two uppercase letters",
                self.referral_prefix
            )));
        }
        Ok(())
    }
}

fn var(name: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{name}"))
        .ok()
        .filter(|v| !v.trim().is_empty())
}

fn parsed_var<T: FromStr>(name: &str, default: T) -> Result<T, Error> {
    match var(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| Error::Config(format!("{ENV_PREFIX}{name}: cannot parse `{raw}`"))),
        None => Ok(default),
    }
}

fn money_var(name: &str, default: Money) -> Result<Money, Error> {
    parsed_var(name, default.amount()).map(Money)
}
