use crate::domain::Money;

#[derive(Debug, Clone, PartialEq)]
pub enum CommandKind {
    Register {
        display_name: String,
        referral_code: Option<String>,
    },
    Login,
    Logout,
    AnswerQuiz { quiz_id: u32, answer: String },
    WatchAd { amount: Option<Money> },
    Withdraw { amount: Money },
    AdminLogin { password: String },
    MarkProcessing,
    Complete,
    Reject,
    Block,
}

/// A single user or admin action read from the command script.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    pub kind: CommandKind,
    pub device: Option<String>,
    pub payment_number: Option<String>,
    pub line: u64,
}

impl core::fmt::Display for Command {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let name = match &self.kind {
            CommandKind::Register { .. } => "register",
            CommandKind::Login => "login",
            CommandKind::Logout => "logout",
            CommandKind::AnswerQuiz { .. } => "quiz",
            CommandKind::WatchAd { .. } => "ad",
            CommandKind::Withdraw { .. } => "withdraw",
            CommandKind::AdminLogin { .. } => "admin",
            CommandKind::MarkProcessing => "process",
            CommandKind::Complete => "complete",
            CommandKind::Reject => "reject",
            CommandKind::Block => "block",
        };
        match &self.payment_number {
            Some(number) => write!(f, "line {}: {},number={}", self.line, name, number),
            None => write!(f, "line {}: {}", self.line, name),
        }
    }
}
