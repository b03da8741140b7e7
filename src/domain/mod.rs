pub mod account;
pub mod command;
pub mod error;
pub mod money;
pub mod records;
pub mod traits;
pub mod withdrawal;

pub use account::{Account, AccountPatch};
pub use command::{Command, CommandKind};
pub use error::Error;
pub use money::Money;
pub use records::{AdWatchRecord, ReferralRecord};
pub use traits::{
    AccountReport, Clock, CommandStream, DeadLetterQueue, DeviceResolver, KeyValueStore,
    SystemClock,
};
pub use withdrawal::{Resolution, WithdrawalRequest, WithdrawalStatus};
