/*
[INPUT]:  Fee-credit coupons with remaining balances, required fee amount
[OUTPUT]: Per-coupon debits covering the fee, smallest balances first
[POS]:    Coupons - independent of keys and transactions
[UPDATE]: When the consumption order or usability rules change
*/

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{Result, WalletError};

/// Fee credit with a remaining balance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub code: String,
    pub remaining: Decimal,
}

impl Coupon {
    pub fn new(code: impl Into<String>, remaining: Decimal) -> Self {
        Self {
            code: code.into(),
            remaining,
        }
    }
}

/// Amount to take from one coupon
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponDebit {
    pub code: String,
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allocation {
    pub debits: Vec<CouponDebit>,
    pub covered: Decimal,
    /// Part of the requirement no coupon could cover
    pub shortfall: Decimal,
}

impl Allocation {
    pub fn is_covered(&self) -> bool {
        self.shortfall.is_zero()
    }

    /// Turns a shortfall into `InsufficientCouponBalance`
    pub fn ensure_covered(self) -> Result<Self> {
        if self.is_covered() {
            return Ok(self);
        }
        Err(WalletError::InsufficientCouponBalance {
            required: self.covered + self.shortfall,
            available: self.covered,
        })
    }
}

/// Debit coupons smallest-remaining first until `required` is met.
///
/// Ties keep input order. Running out is reported through
/// `Allocation::shortfall`, never as an error.
pub fn allocate(coupons: &[Coupon], required: Decimal) -> Allocation {
    if required <= Decimal::ZERO {
        return Allocation::default();
    }

    let mut ordered: Vec<&Coupon> = coupons.iter().filter(|c| c.remaining > Decimal::ZERO).collect();
    ordered.sort_by(|a, b| a.remaining.cmp(&b.remaining));

    let mut outstanding = required;
    let mut debits = Vec::new();
    for coupon in ordered {
        if outstanding <= Decimal::ZERO {
            break;
        }
        let amount = coupon.remaining.min(outstanding);
        outstanding -= amount;
        debits.push(CouponDebit {
            code: coupon.code.clone(),
            amount,
        });
    }

    Allocation {
        debits,
        covered: required - outstanding,
        shortfall: outstanding,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouponStatus {
    Active,
    Used,
    Expired,
    #[serde(other)]
    Unknown,
}

/// Coupon as the backend lists it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponRecord {
    pub code: String,
    pub remaining_amount: Decimal,
    pub expiry: DateTime<Utc>,
    pub status: CouponStatus,
}

impl CouponRecord {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.status == CouponStatus::Active && self.expiry > now
    }
}

/// `allocate` over the records that are active and unexpired at `now`
pub fn allocate_usable(records: &[CouponRecord], required: Decimal, now: DateTime<Utc>) -> Allocation {
    let usable: Vec<Coupon> = records
        .iter()
        .filter(|r| r.is_usable(now))
        .map(|r| Coupon::new(r.code.clone(), r.remaining_amount))
        .collect();
    allocate(&usable, required)
}
