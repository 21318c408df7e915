use thiserror::Error;

/// Schema and construction errors exposed by `chainledger-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[error("timestamp must be a calendar-valid MM/DD/YYYY HH:MM:SS: '{value}'")]
    InvalidTimestamp { value: String },
    #[error("timestamp year {year} is outside the supported range [2000, 2100]")]
    TimestampYearOutOfRange { year: i32 },

    #[error("value is not a valid decimal quantity: '{value}'")]
    InvalidDecimal { value: String },

    #[error("invalid category '{value}', expected one of open_position, close_position, funding_payment, staking_reward, slashing")]
    InvalidCategory { value: String },

    #[error("invalid mode '{value}', expected one of strict, assisted, partial, blocked")]
    InvalidMode { value: String },

    #[error("source id must be 1-32 lowercase alphanumeric characters starting with a letter: '{value}'")]
    InvalidSourceId { value: String },

    #[error("account cannot be empty or contain whitespace")]
    InvalidAccount,

    #[error("credentials api key cannot be empty")]
    EmptyApiKey,
}
