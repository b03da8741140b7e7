#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("Ingestion failed with: {0}")]
    Ingestion(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Stored collection `{0}` is corrupt")]
    CorruptState(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("This device already has an account")]
    DuplicateDevice,

    #[error("Payment number {0} is already registered")]
    DuplicatePaymentNumber(String),

    #[error("Referral code {0} is not valid")]
    InvalidReferralCode(String),

    #[error("Could not allocate a unique referral code")]
    ReferralCodeSpaceExhausted,

    #[error("Access denied: device is blocked")]
    Blocked,

    #[error("{0} not found")]
    NotFound(String),

    #[error("Signup bonus only applies to a new account")]
    SignupBonusUnavailable,

    #[error("Amount must be positive, got {0}")]
    InvalidAmount(i64),

    #[error("Ad reward {amount} is outside {min}..={max}")]
    RewardOutOfRange { amount: i64, min: i64, max: i64 },

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: i64, available: i64 },

    #[error("Minimum withdrawal is {minimum}, requested {requested}")]
    BelowMinimum { requested: i64, minimum: i64 },

    #[error("Account already has an outstanding withdrawal request")]
    ExistingPendingRequest,

    #[error("Withdrawal request {0} is already resolved")]
    AlreadyResolved(String),

    #[error("Withdrawal request cannot move from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Wrong answer")]
    WrongAnswer,

    #[error("Answer a quiz question first to unlock an ad")]
    AdLocked,

    #[error("No account is logged in")]
    NotLoggedIn,

    #[error("Unauthorized")]
    Unauthorized,
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::Ingestion(err.to_string())
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errs: validator::ValidationErrors) -> Self {
        Error::Validation(errs.to_string())
    }
}
