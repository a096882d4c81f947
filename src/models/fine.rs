//! Fine model

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use super::enums::PaymentStatus;

/// Fine issued to a member, optionally tied to a loan
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Fine {
    pub fine_id: i32,
    pub member_id: i32,
    pub transaction_id: Option<i32>,
    pub amount: Decimal,
    pub paid_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub reason: Option<String>,
    pub issued_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl Fine {
    /// Amount still owed
    pub fn balance(&self) -> Decimal {
        match self.payment_status {
            PaymentStatus::Paid => Decimal::ZERO,
            PaymentStatus::Unpaid => (self.amount - self.paid_amount).max(Decimal::ZERO),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fine(amount: i64, paid: i64, status: PaymentStatus) -> Fine {
        Fine {
            fine_id: 1,
            member_id: 1,
            transaction_id: None,
            amount: Decimal::new(amount, 2),
            paid_amount: Decimal::new(paid, 2),
            payment_status: status,
            reason: Some("Late return".into()),
            issued_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_balance() {
        assert_eq!(fine(500, 200, PaymentStatus::Unpaid).balance(), Decimal::new(300, 2));
        assert_eq!(fine(500, 200, PaymentStatus::Paid).balance(), Decimal::ZERO);
    }
}
