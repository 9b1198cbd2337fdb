use crate::curve::{pool_invariant, quote_buy, Reserves};
use crate::error::Error;
use crate::types::{Pool, PoolStatus, Quote};
use soroban_sdk::Env;

pub struct CapGuard;

impl CapGuard {
    /// Reject contributions to a pool that is not open for business
    ///
    /// A pool sitting at its cap answers `PoolFull` whatever its status,
    /// everything else that is not an unexpired `Active` pool answers
    /// `PoolNotActive`.
    pub fn ensure_open(pool: &Pool, now: u64) -> Result<(), Error> {
        if pool.is_capped() {
            return Err(Error::PoolFull);
        }
        if pool.status != PoolStatus::Active || pool.is_expired(now) {
            return Err(Error::PoolNotActive);
        }
        Ok(())
    }

    /// Quote a buy, clamping `eth_in` to the room left under the cap
    ///
    /// The clamped-off part is reported as `eth_refunded`.
    pub fn quote(env: &Env, pool: &Pool, eth_in: i128) -> Result<Quote, Error> {
        if eth_in <= 0 {
            return Err(Error::InvalidInput);
        }

        let room = pool
            .fixed_cap
            .checked_sub(pool.total_raised)
            .ok_or(Error::MathOverflow)?;
        let eth_accepted = eth_in.min(room);
        if eth_accepted <= 0 {
            return Err(Error::PoolFull);
        }

        let k = pool_invariant(env, pool)?;
        let tokens_out = quote_buy(env, eth_accepted, &Reserves::of(pool), &k)?;

        Ok(Quote {
            eth_accepted,
            eth_refunded: eth_in - eth_accepted,
            tokens_out,
        })
    }

    /// Post a curve quote to the pool's reserves and running totals
    ///
    /// Returns true when this settlement filled the pool.
    pub fn settle(pool: &mut Pool, quote: &Quote) -> Result<bool, Error> {
        let reserves = Reserves::of(pool).after_buy(quote.eth_accepted, quote.tokens_out)?;
        pool.virtual_base = reserves.base;
        pool.virtual_token = reserves.token;

        Self::record_sale(pool, quote.eth_accepted, quote.tokens_out)?;
        Ok(Self::fill_if_capped(pool))
    }

    /// Add a settled sale to `total_raised` / `total_sold`, refusing to
    /// cross either ceiling
    pub fn record_sale(pool: &mut Pool, eth: i128, tokens: i128) -> Result<(), Error> {
        let total_raised = pool
            .total_raised
            .checked_add(eth)
            .ok_or(Error::MathOverflow)?;
        let total_sold = pool
            .total_sold
            .checked_add(tokens)
            .ok_or(Error::MathOverflow)?;

        if total_raised > pool.fixed_cap {
            return Err(Error::PoolFull);
        }
        if total_sold > pool.sellable_tokens() {
            return Err(Error::PoolFull);
        }

        pool.total_raised = total_raised;
        pool.total_sold = total_sold;
        Ok(())
    }

    /// Move an active pool to `Full` once its cap is reached
    pub fn fill_if_capped(pool: &mut Pool) -> bool {
        if pool.status == PoolStatus::Active && pool.is_capped() {
            pool.status = PoolStatus::Full;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SaleMode;

    const E18: i128 = 1_000_000_000_000_000_000;

    #[test]
    fn test_pending_pool_rejected() {
        let env = Env::default();
        let mut pool = Pool::sample(&env, SaleMode::Instant);
        pool.status = PoolStatus::Pending;

        assert_eq!(CapGuard::ensure_open(&pool, 0), Err(Error::PoolNotActive));
    }

    #[test]
    fn test_expired_pool_rejected() {
        let env = Env::default();
        let pool = Pool::sample(&env, SaleMode::Instant);

        assert_eq!(
            CapGuard::ensure_open(&pool, pool.sale_end()),
            Err(Error::PoolNotActive)
        );
        assert_eq!(CapGuard::ensure_open(&pool, pool.sale_end() - 1), Ok(()));
    }

    #[test]
    fn test_clamps_to_cap_and_reports_refund() {
        let env = Env::default();
        let mut pool = Pool::sample(&env, SaleMode::Instant);
        pool.total_raised = 4 * E18;

        let quote = CapGuard::quote(&env, &pool, 3 * E18).unwrap();
        assert_eq!(quote.eth_accepted, 135 * E18 / 100);
        assert_eq!(quote.eth_refunded, 165 * E18 / 100);
    }

    #[test]
    fn test_quote_at_cap_is_full() {
        let env = Env::default();
        let mut pool = Pool::sample(&env, SaleMode::Instant);
        pool.total_raised = pool.fixed_cap;

        assert_eq!(CapGuard::quote(&env, &pool, E18), Err(Error::PoolFull));
    }

    #[test]
    fn test_settle_posts_exact_deltas() {
        let env = Env::default();
        let mut pool = Pool::sample(&env, SaleMode::Instant);

        let quote = CapGuard::quote(&env, &pool, E18).unwrap();
        let filled = CapGuard::settle(&mut pool, &quote).unwrap();

        assert!(!filled);
        assert_eq!(pool.total_raised, E18);
        assert_eq!(pool.total_sold, quote.tokens_out);
        assert_eq!(pool.virtual_base, pool.fixed_cap + E18);
        assert_eq!(pool.virtual_token, pool.token_for_sale - quote.tokens_out);
    }

    #[test]
    fn test_settle_to_cap_fills_pool() {
        let env = Env::default();
        let mut pool = Pool::sample(&env, SaleMode::Instant);

        let quote = CapGuard::quote(&env, &pool, 10 * E18).unwrap();
        let filled = CapGuard::settle(&mut pool, &quote).unwrap();

        assert!(filled);
        assert_eq!(pool.status, PoolStatus::Full);
        assert_eq!(pool.total_raised, pool.fixed_cap);
        assert_eq!(pool.total_sold, pool.token_for_sale / 2);
    }
}
