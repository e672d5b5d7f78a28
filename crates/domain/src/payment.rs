use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sealworks_core::AppError;

/// Payment lifecycle states tracked for admin adjustments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Intent created, not yet authorised.
    Pending,
    /// Funds reserved, awaiting capture.
    Authorized,
    /// Funds captured.
    Captured,
    /// Part of the captured amount was refunded.
    PartiallyRefunded,
    /// The captured amount was refunded in full.
    Refunded,
    /// The PSP declined the payment.
    Failed,
    /// The intent was voided.
    Canceled,
}

impl PaymentStatus {
    /// Returns the stable transport value for this status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Authorized => "authorized",
            Self::Captured => "captured",
            Self::PartiallyRefunded => "partially_refunded",
            Self::Refunded => "refunded",
            Self::Failed => "failed",
            Self::Canceled => "canceled",
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "authorized" => Ok(Self::Authorized),
            "captured" => Ok(Self::Captured),
            "partially_refunded" => Ok(Self::PartiallyRefunded),
            "refunded" => Ok(Self::Refunded),
            "failed" => Ok(Self::Failed),
            "canceled" => Ok(Self::Canceled),
            other => Err(AppError::Validation(format!(
                "unknown payment status '{other}'"
            ))),
        }
    }
}

/// Payment recorded against an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment identifier.
    pub id: String,
    /// PSP name, e.g. `stripe`.
    pub provider: String,
    /// PSP intent reference.
    pub intent_id: String,
    /// Current status.
    pub status: PaymentStatus,
    /// ISO currency code.
    pub currency: String,
    /// Authorised amount in minor units.
    pub amount: i64,
    /// Captured amount in minor units.
    pub captured_amount: i64,
    /// Refunded amount in minor units.
    pub refunded_amount: i64,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Capture time.
    pub captured_at: Option<DateTime<Utc>>,
    /// Last refund time.
    pub refunded_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Amount still refundable.
    #[must_use]
    pub fn refundable_amount(&self) -> i64 {
        (self.captured_amount - self.refunded_amount).max(0)
    }
}
