//! Constant-product bonding curve quotes
//!
//! Quotes are local previews against the last known pool. The trade service
//! is authoritative and may fill slightly differently when other trades land
//! first, so callers present these numbers as estimates.

use super::models::Pool;

/// Fee taken on every trade (0.3%)
pub const FEE: f64 = 0.003;

/// Estimated outcome of spending USD on tokens
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuyQuote {
    pub usd_in: f64,
    pub tokens_out: f64,
    /// Portion of `usd_in` kept as fee
    pub fee_paid: f64,
    pub pool_after: Pool,
    /// Spot price change caused by the trade, in percent
    pub price_impact_pct: f64,
}

/// Estimated outcome of selling tokens for USD
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SellQuote {
    pub token_in: f64,
    pub usd_out: f64,
    /// USD withheld from the gross proceeds as fee
    pub fee_paid: f64,
    pub pool_after: Pool,
    /// Spot price change caused by the trade, in percent (negative)
    pub price_impact_pct: f64,
}

fn price_impact_pct(before: &Pool, after: &Pool) -> f64 {
    match (before.price(), after.price()) {
        (Some(old), Some(new)) => (new - old) / old * 100.0,
        _ => 0.0,
    }
}

/// Quote buying with `usd_in` USD
///
/// `None` unless `usd_in > 0` and the pool is tradable.
pub fn quote_buy(pool: &Pool, usd_in: f64) -> Option<BuyQuote> {
    if !(usd_in.is_finite() && usd_in > 0.0) || !pool.is_tradable() {
        return None;
    }

    let k = pool.k();
    let effective = usd_in * (1.0 - FEE);
    let new_base = pool.base_reserve + effective;
    let new_token = k / new_base;
    let tokens_out = (pool.token_reserve - new_token).max(0.0);

    let pool_after = Pool::new(new_base, new_token);
    Some(BuyQuote {
        usd_in,
        tokens_out,
        fee_paid: usd_in - effective,
        price_impact_pct: price_impact_pct(pool, &pool_after),
        pool_after,
    })
}

/// Quote selling `token_in` tokens
///
/// `None` unless `token_in > 0` and the pool is tradable.
pub fn quote_sell(pool: &Pool, token_in: f64) -> Option<SellQuote> {
    if !(token_in.is_finite() && token_in > 0.0) || !pool.is_tradable() {
        return None;
    }

    let k = pool.k();
    let new_token = pool.token_reserve + token_in;
    let new_base = k / new_token;
    let gross = (pool.base_reserve - new_base).max(0.0);
    let usd_out = (gross * (1.0 - FEE)).max(0.0);

    let pool_after = Pool::new(new_base, new_token);
    Some(SellQuote {
        token_in,
        usd_out,
        fee_paid: gross - usd_out,
        price_impact_pct: price_impact_pct(pool, &pool_after),
        pool_after,
    })
}
