use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::SchemaError;

/// Canonical accounting-event category (closed set).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    OpenPosition,
    ClosePosition,
    FundingPayment,
    StakingReward,
    Slashing,
}

impl EventCategory {
    pub const ALL: [Self; 5] = [
        Self::OpenPosition,
        Self::ClosePosition,
        Self::FundingPayment,
        Self::StakingReward,
        Self::Slashing,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenPosition => "open_position",
            Self::ClosePosition => "close_position",
            Self::FundingPayment => "funding_payment",
            Self::StakingReward => "staking_reward",
            Self::Slashing => "slashing",
        }
    }

    /// Whether records of this category must name a settlement token.
    pub const fn requires_settlement_token(self) -> bool {
        !matches!(self, Self::OpenPosition)
    }
}

impl Display for EventCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventCategory {
    type Err = SchemaError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "open_position" => Ok(Self::OpenPosition),
            "close_position" => Ok(Self::ClosePosition),
            "funding_payment" => Ok(Self::FundingPayment),
            "staking_reward" => Ok(Self::StakingReward),
            "slashing" => Ok(Self::Slashing),
            other => Err(SchemaError::InvalidCategory {
                value: other.to_owned(),
            }),
        }
    }
}

/// Canonical accounting event.
///
/// Records are immutable once produced by an adapter: a correction means a
/// re-fetch, never a patch. The timestamp is carried in the shared display
/// form (`MM/DD/YYYY HH:MM:SS`, UTC) so the validation engine can report on
/// malformed values instead of making them unrepresentable upstream bugs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub timestamp: String,
    pub asset: String,
    pub amount: Decimal,
    pub fee: Decimal,
    pub realized_pnl: Decimal,
    pub settlement_token: Option<String>,
    pub notes: String,
    pub external_id: String,
    pub category: EventCategory,
}
