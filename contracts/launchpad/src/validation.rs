use crate::error::Error;
use crate::types::{LaunchpadConfig, PoolParams, SaleMode, BPS_DENOMINATOR};

pub struct Validator;

impl Validator {
    pub fn validate_config(config: &LaunchpadConfig) -> Result<(), Error> {
        if config.launch_fee < 0 || config.fixed_fee < 0 || config.min_cap < 0 {
            return Err(Error::InvalidInput);
        }
        if config.platform_fee_bps < 0 || config.platform_fee_bps > BPS_DENOMINATOR {
            return Err(Error::InvalidInput);
        }
        Ok(())
    }

    /// Check creator parameters before a pool is stored
    ///
    /// Returns the total sale-token supply the creator must deposit.
    pub fn validate_pool_params(params: &PoolParams, now: u64) -> Result<i128, Error> {
        if params.fixed_cap <= 0 || params.token_for_sale <= 0 {
            return Err(Error::InvalidPoolParams);
        }
        // The sellable half must hold at least one token
        if params.token_for_sale < 2 {
            return Err(Error::InvalidPoolParams);
        }
        if params.token_for_airdrop < 0 || params.token_for_farm < 0 || params.token_for_add_lp < 0 {
            return Err(Error::InvalidPoolParams);
        }
        if params.min_cap < 0 {
            return Err(Error::InvalidPoolParams);
        }

        if params.max_duration_sell == 0 || params.min_duration_sell > params.max_duration_sell {
            return Err(Error::InvalidPoolParams);
        }
        if params.start_time.checked_add(params.max_duration_sell).is_none() {
            return Err(Error::InvalidPoolParams);
        }
        if params.start_time.saturating_add(params.max_duration_sell) <= now {
            return Err(Error::InvalidPoolParams);
        }

        if params.mode == SaleMode::Lottery {
            if params.token_per_purchase <= 0 || params.max_repeat_purchase == 0 {
                return Err(Error::InvalidPoolParams);
            }
            let batches = (params.token_for_sale / 2) / params.token_per_purchase;
            if batches == 0 {
                return Err(Error::InvalidPoolParams);
            }
            // Batch pricing multiplies batch counts by the cap
            if batches.checked_mul(params.fixed_cap).is_none() {
                return Err(Error::InvalidPoolParams);
            }
        }

        params
            .token_for_sale
            .checked_add(params.token_for_airdrop)
            .and_then(|v| v.checked_add(params.token_for_farm))
            .and_then(|v| v.checked_add(params.token_for_add_lp))
            .ok_or(Error::InvalidPoolParams)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soroban_sdk::{testutils::Address as _, Address, Env, String};

    const E18: i128 = 1_000_000_000_000_000_000;

    fn params(env: &Env, mode: SaleMode) -> PoolParams {
        PoolParams {
            mode,
            fixed_cap: 5 * E18,
            token_for_sale: 750_000 * E18,
            token_for_airdrop: 10_000 * E18,
            token_for_farm: 40_000 * E18,
            token_for_add_lp: 200_000 * E18,
            airdrop_recipient: Address::generate(env),
            farm_recipient: Address::generate(env),
            start_time: 3_600,
            min_duration_sell: 86_400,
            max_duration_sell: 604_800,
            token_per_purchase: 100 * E18,
            max_repeat_purchase: 100,
            min_cap: 0,
            block_interval: 0,
            metadata: String::from_str(env, "Test Pool"),
        }
    }

    #[test]
    fn test_valid_params_return_supply() {
        let env = Env::default();
        let supply = Validator::validate_pool_params(&params(&env, SaleMode::Lottery), 0).unwrap();
        assert_eq!(supply, 1_000_000 * E18);
    }

    #[test]
    fn test_durations_must_be_ordered() {
        let env = Env::default();
        let mut p = params(&env, SaleMode::Instant);
        p.min_duration_sell = p.max_duration_sell + 1;
        assert_eq!(Validator::validate_pool_params(&p, 0), Err(Error::InvalidPoolParams));
    }

    #[test]
    fn test_window_already_closed() {
        let env = Env::default();
        let p = params(&env, SaleMode::Instant);
        let now = p.start_time + p.max_duration_sell;
        assert_eq!(Validator::validate_pool_params(&p, now), Err(Error::InvalidPoolParams));
    }

    #[test]
    fn test_lottery_needs_whole_batch() {
        let env = Env::default();
        let mut p = params(&env, SaleMode::Lottery);
        p.token_per_purchase = p.token_for_sale;
        assert_eq!(Validator::validate_pool_params(&p, 0), Err(Error::InvalidPoolParams));
    }

    #[test]
    fn test_instant_ignores_batch_fields() {
        let env = Env::default();
        let mut p = params(&env, SaleMode::Instant);
        p.token_per_purchase = 0;
        p.max_repeat_purchase = 0;
        assert!(Validator::validate_pool_params(&p, 0).is_ok());
    }

    #[test]
    fn test_zero_cap_rejected() {
        let env = Env::default();
        let mut p = params(&env, SaleMode::Instant);
        p.fixed_cap = 0;
        assert_eq!(Validator::validate_pool_params(&p, 0), Err(Error::InvalidPoolParams));
    }
}
