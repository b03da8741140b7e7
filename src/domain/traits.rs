use std::future::Future;

use chrono::{DateTime, Utc};
use futures::Stream;

use crate::domain::{Account, Command, Error};

pub trait CommandStream {
    type CmdStream: Stream<Item = Result<Command, Error>> + Send + Unpin + 'static;
    fn stream(&mut self) -> Self::CmdStream;
}

pub trait DeadLetterQueue {
    fn report(&self, error: &Error);
}

/// Destination for the final account table.
pub trait AccountReport {
    fn write_accounts(&mut self, accounts: &[Account]) -> Result<(), Error>;
}

/// String-keyed blob storage. Every collection is written whole under its key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, Error>;
    fn set(&mut self, key: &str, value: String) -> Result<(), Error>;
    fn remove(&mut self, key: &str) -> Result<(), Error>;
}

/// Best-effort device correlation key. Never fails; it is not an authentication factor.
pub trait DeviceResolver {
    fn device_id(&self) -> impl Future<Output = String> + Send;
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
