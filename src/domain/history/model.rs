//! History record domain entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::billing::{BillingBreakdown, Money};
use crate::domain::slot::ContactInfo;
use crate::shared::errors::{DomainError, DomainResult};

/// Payment status of a recorded session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Paid => "PAID",
        }
    }
}

impl std::str::FromStr for PaymentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "PAID" => Ok(Self::Paid),
            other => Err(DomainError::Validation(format!(
                "unknown payment status {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A session that has just left OCCUPIED and must be recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedSession {
    pub slot_id: i32,
    pub contact: ContactInfo,
    pub breakdown: BillingBreakdown,
}

/// Ledger entry for one completed session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRecord {
    pub id: i32,
    pub slot_id: i32,
    pub vehicle_number: String,
    pub user_email: String,
    pub user_phone: String,
    pub entry_time: i64,
    pub exit_time: i64,
    pub duration_minutes: i64,
    pub base_charge: Money,
    pub minute_charge: Money,
    pub total_amount: Money,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// New PENDING record for `session`
    pub fn from_session(id: i32, session: CompletedSession, created_at: DateTime<Utc>) -> Self {
        let CompletedSession {
            slot_id,
            contact,
            breakdown,
        } = session;
        Self {
            id,
            slot_id,
            vehicle_number: contact.vehicle_number,
            user_email: contact.user_email,
            user_phone: contact.user_phone,
            entry_time: breakdown.entry_time,
            exit_time: breakdown.exit_time,
            duration_minutes: breakdown.duration_minutes,
            base_charge: breakdown.base_charge,
            minute_charge: breakdown.minute_charge,
            total_amount: breakdown.total_amount,
            payment_status: PaymentStatus::Pending,
            created_at,
        }
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Paid
    }

    /// PENDING → PAID. Never reverses.
    pub fn mark_paid(&mut self) -> DomainResult<()> {
        if self.is_paid() {
            return Err(DomainError::AlreadyPaid(self.id));
        }
        self.payment_status = PaymentStatus::Paid;
        Ok(())
    }

    pub fn breakdown(&self) -> BillingBreakdown {
        BillingBreakdown {
            entry_time: self.entry_time,
            exit_time: self.exit_time,
            duration_minutes: self.duration_minutes,
            base_charge: self.base_charge,
            minute_charge: self.minute_charge,
            total_amount: self.total_amount,
        }
    }
}

/// Revenue over confirmed payments
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevenueStats {
    pub total_revenue: Money,
    pub total_sessions: u64,
}

impl RevenueStats {
    /// Sum over the PAID records in `records`; other statuses are ignored
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a HistoryRecord>) -> Self {
        records
            .into_iter()
            .filter(|r| r.is_paid())
            .fold(Self::default(), |mut acc, r| {
                acc.total_revenue += r.total_amount;
                acc.total_sessions += 1;
                acc
            })
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing;

    fn sample(id: i32, exit: i64) -> HistoryRecord {
        HistoryRecord::from_session(
            id,
            CompletedSession {
                slot_id: 2,
                contact: ContactInfo::new("TN-09-1", "a@b.c", "42"),
                breakdown: billing::compute(0, exit).unwrap(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn new_record_is_pending_with_breakdown() {
        let r = sample(1, 95);
        assert_eq!(r.payment_status, PaymentStatus::Pending);
        assert_eq!(r.vehicle_number, "TN-09-1");
        assert_eq!(r.breakdown(), billing::compute(0, 95).unwrap());
    }

    #[test]
    fn mark_paid_is_one_way() {
        let mut r = sample(7, 95);
        r.mark_paid().unwrap();
        assert!(r.is_paid());
        assert_eq!(r.mark_paid(), Err(DomainError::AlreadyPaid(7)));
        assert!(r.is_paid());
    }

    #[test]
    fn revenue_counts_only_paid() {
        let mut paid = sample(1, 95); // 130
        paid.mark_paid().unwrap();
        let pending = sample(2, 3_600);
        let mut paid_too = sample(3, 0); // 30
        paid_too.mark_paid().unwrap();

        let stats = RevenueStats::from_records([&paid, &pending, &paid_too]);
        assert_eq!(stats.total_sessions, 2);
        assert_eq!(stats.total_revenue, Money::from(160));
    }

    #[test]
    fn empty_revenue_is_zero() {
        let stats = RevenueStats::from_records(std::iter::empty());
        assert_eq!(stats, RevenueStats::default());
        assert_eq!(stats.total_revenue, Money::ZERO);
    }

    #[test]
    fn payment_status_roundtrip() {
        for s in [PaymentStatus::Pending, PaymentStatus::Paid] {
            assert_eq!(s.as_str().parse::<PaymentStatus>(), Ok(s));
        }
        assert!("REFUNDED".parse::<PaymentStatus>().is_err());
    }
}
