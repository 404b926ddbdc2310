/*
[INPUT]:  Required fee and CODE=AMOUNT coupon arguments
[OUTPUT]: Printed coupon debits, error on shortfall
[POS]:    CLI layer - coupon allocation command
[UPDATE]: When coupon input format changes
*/

use std::str::FromStr;

use anyhow::Result;
use console::style;
use rust_decimal::Decimal;
use walletkit_core::{Coupon, allocate};

/// clap value parser for `CODE=AMOUNT`
pub fn parse_coupon(raw: &str) -> std::result::Result<Coupon, String> {
    let (code, amount) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected CODE=AMOUNT, got {raw:?}"))?;
    let code = code.trim();
    if code.is_empty() {
        return Err(format!("coupon code is empty in {raw:?}"));
    }
    let remaining = Decimal::from_str(amount.trim()).map_err(|e| format!("invalid amount in {raw:?}: {e}"))?;
    if remaining.is_sign_negative() {
        return Err(format!("coupon balance is negative in {raw:?}"));
    }
    Ok(Coupon::new(code, remaining))
}

pub fn run(required: Decimal, coupons: &[Coupon]) -> Result<()> {
    let allocation = allocate(coupons, required);

    for debit in &allocation.debits {
        println!("  {:<16} {}", style(&debit.code).bold(), debit.amount);
    }
    println!("{} {}", style("covered:").dim(), allocation.covered);

    if !allocation.is_covered() {
        println!("{} {}", style("shortfall:").yellow(), allocation.shortfall);
    }
    allocation.ensure_covered()?;
    Ok(())
}
