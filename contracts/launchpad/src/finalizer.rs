use crate::error::Error;
use crate::events::PoolFinalizedEvent;
use crate::storage::Storage;
use crate::types::{FinalizeReceipt, LaunchpadConfig, Pool, PoolStatus, BPS_DENOMINATOR};
use soroban_sdk::{log, token, vec, Env, IntoVal, Symbol};

/// How the raised base currency is divided at finalization
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RaiseSplit {
    pub platform_fee: i128,
    pub fixed_fee: i128,
    pub liquidity_base: i128,
}

/// Split the raise into fees and the liquidity leg
///
/// Formula:
/// - platform_fee = total_raised × platform_fee_bps / 10,000
/// - fixed_fee = min(fixed_fee, total_raised − platform_fee)
/// - liquidity_base = what is left
///
/// Example:
/// - total_raised: 5.35, platform_fee_bps: 100 (1%), fixed_fee: 0.01
/// - platform_fee: 0.0535, fixed_fee: 0.01, liquidity_base: 5.2865
pub fn split_raise(
    total_raised: i128,
    platform_fee_bps: i128,
    fixed_fee: i128,
) -> Result<RaiseSplit, Error> {
    let platform_fee = total_raised
        .checked_mul(platform_fee_bps)
        .ok_or(Error::MathOverflow)?
        / BPS_DENOMINATOR;
    let after_platform = total_raised - platform_fee;
    let fixed_fee = fixed_fee.max(0).min(after_platform);

    Ok(RaiseSplit {
        platform_fee,
        fixed_fee,
        liquidity_base: after_platform - fixed_fee,
    })
}

pub struct Finalizer;

impl Finalizer {
    /// Full pools, and active pools past their maximum sale duration
    pub fn is_due(pool: &Pool, now: u64) -> bool {
        match pool.status {
            PoolStatus::Full => true,
            PoolStatus::Active => pool.is_expired(now),
            _ => false,
        }
    }

    /// Close the sale: pay fees, seed liquidity, release airdrop and farm
    /// allocations, burn whatever the sale left unsold
    ///
    /// Calling it on a finalized pool returns the stored receipt and
    /// changes nothing.
    ///
    /// # Errors
    /// - `PoolNotActive`: pool pending or cancelled
    /// - `SaleNotEnded`: pool active, not full and not expired
    pub fn finalize(
        env: &Env,
        config: &LaunchpadConfig,
        pool: &mut Pool,
    ) -> Result<FinalizeReceipt, Error> {
        if pool.status == PoolStatus::Finalized {
            return Storage::get_settlement(env, &pool.sale_token).ok_or(Error::PoolNotActive);
        }

        let now = env.ledger().timestamp();
        match pool.status {
            PoolStatus::Pending | PoolStatus::Cancelled => return Err(Error::PoolNotActive),
            _ if !Self::is_due(pool, now) => return Err(Error::SaleNotEnded),
            _ => {}
        }

        let split = split_raise(pool.total_raised, pool.platform_fee_bps, pool.fixed_fee)?;
        let contract = env.current_contract_address();
        let base = token::Client::new(env, &config.base_token);
        let sale = token::Client::new(env, &pool.sale_token);

        if split.platform_fee > 0 {
            base.transfer(&contract, &config.platform, &split.platform_fee);
        }
        if split.fixed_fee > 0 {
            base.transfer(&contract, &config.fee_recipient, &split.fixed_fee);
        }

        let seeds_liquidity = split.liquidity_base > 0 && pool.token_for_add_lp > 0;
        let (liquidity_ref, liquidity_tokens) = if seeds_liquidity {
            sale.transfer(&contract, &config.router, &pool.token_for_add_lp);
            base.transfer(&contract, &config.router, &split.liquidity_base);

            let liquidity_ref: u64 = env.invoke_contract(
                &config.router,
                &Symbol::new(env, "add_liquidity"),
                vec![
                    env,
                    pool.sale_token.to_val(),
                    config.base_token.to_val(),
                    pool.token_for_add_lp.into_val(env),
                    split.liquidity_base.into_val(env),
                    pool.creator.to_val()
                ],
            );
            (liquidity_ref, pool.token_for_add_lp)
        } else {
            // Nothing to pair against: both legs go back to the creator
            if pool.token_for_add_lp > 0 {
                sale.transfer(&contract, &pool.creator, &pool.token_for_add_lp);
            }
            if split.liquidity_base > 0 {
                base.transfer(&contract, &pool.creator, &split.liquidity_base);
            }
            (0, 0)
        };

        if pool.token_for_airdrop > 0 {
            sale.transfer(&contract, &pool.airdrop_recipient, &pool.token_for_airdrop);
        }
        if pool.token_for_farm > 0 {
            sale.transfer(&contract, &pool.farm_recipient, &pool.token_for_farm);
        }

        let burned = pool.unsold_tokens();
        if burned > 0 {
            sale.burn(&contract, &burned);
        }

        pool.status = PoolStatus::Finalized;
        pool.finalized_at = now;
        pool.liquidity_ref = liquidity_ref;

        let receipt = FinalizeReceipt {
            platform_fee: split.platform_fee,
            fixed_fee: split.fixed_fee,
            liquidity_base: split.liquidity_base,
            liquidity_tokens,
            burned,
            liquidity_ref,
        };
        Storage::set_settlement(env, &pool.sale_token, &receipt);

        log!(env, "pool finalized", pool.sale_token, pool.total_raised, liquidity_ref);

        env.events().publish(
            (Symbol::new(env, "pool_finalized"), pool.sale_token.clone()),
            PoolFinalizedEvent {
                sale_token: pool.sale_token.clone(),
                total_raised: pool.total_raised,
                total_sold: pool.total_sold,
                liquidity_base: split.liquidity_base,
                liquidity_tokens,
                platform_fee: split.platform_fee,
                fixed_fee: split.fixed_fee,
                burned,
            },
        );

        Ok(receipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SaleMode;

    const E18: i128 = 1_000_000_000_000_000_000;

    #[test]
    fn test_split_raise() {
        let split = split_raise(535 * E18 / 100, 100, E18 / 100).unwrap();

        assert_eq!(split.platform_fee, 535 * E18 / 10_000);
        assert_eq!(split.fixed_fee, E18 / 100);
        assert_eq!(split.liquidity_base, 535 * E18 / 100 - 535 * E18 / 10_000 - E18 / 100);
    }

    #[test]
    fn test_fixed_fee_bounded_by_raise() {
        let split = split_raise(100, 0, 1_000).unwrap();

        assert_eq!(split.fixed_fee, 100);
        assert_eq!(split.liquidity_base, 0);
    }

    #[test]
    fn test_nothing_raised() {
        let split = split_raise(0, 250, E18).unwrap();

        assert_eq!(
            split,
            RaiseSplit {
                platform_fee: 0,
                fixed_fee: 0,
                liquidity_base: 0
            }
        );
    }

    #[test]
    fn test_is_due() {
        let env = Env::default();
        let mut pool = Pool::sample(&env, SaleMode::Instant);

        assert!(!Finalizer::is_due(&pool, pool.start_time));
        assert!(Finalizer::is_due(&pool, pool.sale_end()));

        pool.status = PoolStatus::Full;
        assert!(Finalizer::is_due(&pool, pool.start_time));

        pool.status = PoolStatus::Pending;
        assert!(!Finalizer::is_due(&pool, pool.sale_end()));
    }
}
