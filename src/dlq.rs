use std::cell::Cell;

use crate::domain::{DeadLetterQueue, Error};

/// Logs rejected commands and keeps a running count; processing continues
/// with the next command.
#[derive(Default, Debug)]
pub struct LogDLQ {
    rejected: Cell<usize>,
}

impl LogDLQ {
    pub fn rejected(&self) -> usize {
        self.rejected.get()
    }
}

impl DeadLetterQueue for LogDLQ {
    fn report(&self, error: &Error) {
        let rejected = self.rejected.get() + 1;
        self.rejected.set(rejected);
        tracing::warn!(rejected, "command rejected: {}", error);
    }
}
