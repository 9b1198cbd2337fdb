use crate::error::Error;
use crate::types::Pool;
use soroban_sdk::{Env, U256};

/// Virtual reserve pair the curve prices against
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Reserves {
    pub base: i128,
    pub token: i128,
}

impl Reserves {
    /// Opening reserves: `fixed_cap` on the base side, `token_for_sale` on the token side
    pub fn initial(fixed_cap: i128, token_for_sale: i128) -> Self {
        Reserves {
            base: fixed_cap,
            token: token_for_sale,
        }
    }

    pub fn of(pool: &Pool) -> Self {
        Reserves {
            base: pool.virtual_base,
            token: pool.virtual_token,
        }
    }

    /// Reserves after a settled buy
    pub fn after_buy(&self, eth_in: i128, tokens_out: i128) -> Result<Self, Error> {
        Ok(Reserves {
            base: self.base.checked_add(eth_in).ok_or(Error::MathOverflow)?,
            token: self
                .token
                .checked_sub(tokens_out)
                .ok_or(Error::MathOverflow)?,
        })
    }
}

/// Curve constant `k = fixed_cap × token_for_sale`
///
/// Fixed at pool creation. Products of two 18-decimal amounts overflow
/// i128, so the whole curve works in 256 bits.
pub fn invariant(env: &Env, fixed_cap: i128, token_for_sale: i128) -> Result<U256, Error> {
    Ok(to_u256(env, fixed_cap)?.mul(&to_u256(env, token_for_sale)?))
}

pub fn pool_invariant(env: &Env, pool: &Pool) -> Result<U256, Error> {
    invariant(env, pool.fixed_cap, pool.token_for_sale)
}

/// Tokens bought for `eth_in`
///
/// Formula: tokens_out = TOK − ⌈k / (ETH + eth_in)⌉
///
/// Rounding up the post-trade token reserve keeps every truncation on the
/// pool's side, so `ETH × TOK ≥ k` after each step and the reserves stay
/// path independent.
///
/// Example:
/// - fixed_cap: 5.35, token_for_sale: 1,600,000,000
/// - eth_in: 1
/// - tokens_out: 1,600,000,000 × 1 / 6.35 = 251,968,503.937...
pub fn quote_buy(env: &Env, eth_in: i128, reserves: &Reserves, k: &U256) -> Result<i128, Error> {
    if eth_in <= 0 {
        return Err(Error::InvalidInput);
    }

    let new_base = reserves
        .base
        .checked_add(eth_in)
        .ok_or(Error::MathOverflow)?;
    let new_token = to_i128(&div_ceil(env, k, &to_u256(env, new_base)?))?;

    reserves
        .token
        .checked_sub(new_token)
        .filter(|out| *out >= 0)
        .ok_or(Error::MathOverflow)
}

/// Smallest `eth_in` for which `quote_buy` returns at least `tokens_out`
///
/// Formula: eth_in = ⌈k / (TOK − tokens_out)⌉ − ETH
pub fn quote_input(
    env: &Env,
    tokens_out: i128,
    reserves: &Reserves,
    k: &U256,
) -> Result<i128, Error> {
    if tokens_out <= 0 || tokens_out >= reserves.token {
        return Err(Error::InvalidInput);
    }

    let remaining = reserves.token - tokens_out;
    let needed_base = to_i128(&div_ceil(env, k, &to_u256(env, remaining)?))?;

    needed_base
        .checked_sub(reserves.base)
        .ok_or(Error::MathOverflow)
}

fn to_u256(env: &Env, value: i128) -> Result<U256, Error> {
    if value < 0 {
        return Err(Error::MathOverflow);
    }
    Ok(U256::from_u128(env, value as u128))
}

fn to_i128(value: &U256) -> Result<i128, Error> {
    value
        .to_u128()
        .and_then(|v| i128::try_from(v).ok())
        .ok_or(Error::MathOverflow)
}

fn div_ceil(env: &Env, numerator: &U256, denominator: &U256) -> U256 {
    numerator
        .add(&denominator.sub(&U256::from_u32(env, 1)))
        .div(denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    const E18: i128 = 1_000_000_000_000_000_000;

    fn opening(env: &Env) -> (Reserves, U256) {
        let fixed_cap = 535 * E18 / 100; // 5.35
        let token_for_sale = 1_600_000_000 * E18;
        (
            Reserves::initial(fixed_cap, token_for_sale),
            invariant(env, fixed_cap, token_for_sale).unwrap(),
        )
    }

    #[test]
    fn test_first_buy() {
        let env = Env::default();
        let (reserves, k) = opening(&env);

        let out = quote_buy(&env, E18, &reserves, &k).unwrap();

        // 1 × 1,600,000,000 / 6.35, truncated
        assert_eq!(out, 251_968_503_937_007_874_015_748_031);
    }

    #[test]
    fn test_quote_is_deterministic() {
        let env = Env::default();
        let (reserves, k) = opening(&env);

        let first = quote_buy(&env, 3 * E18, &reserves, &k).unwrap();
        let second = quote_buy(&env, 3 * E18, &reserves, &k).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_raising_cap_sells_half() {
        let env = Env::default();
        let (mut reserves, k) = opening(&env);
        let mut sold = 0;

        for eth_in in [E18, 3 * E18, 135 * E18 / 100] {
            let out = quote_buy(&env, eth_in, &reserves, &k).unwrap();
            reserves = reserves.after_buy(eth_in, out).unwrap();
            sold += out;
        }

        assert_eq!(reserves.base, 2 * 535 * E18 / 100);
        assert_eq!(sold, 800_000_000 * E18);
    }

    #[test]
    fn test_buys_are_path_independent() {
        let env = Env::default();
        let (reserves, k) = opening(&env);

        let single = quote_buy(&env, 2 * E18, &reserves, &k).unwrap();

        let first = quote_buy(&env, E18, &reserves, &k).unwrap();
        let after = reserves.after_buy(E18, first).unwrap();
        let second = quote_buy(&env, E18, &after, &k).unwrap();

        assert_eq!(first + second, single);
    }

    #[test]
    fn test_zero_input_rejected() {
        let env = Env::default();
        let (reserves, k) = opening(&env);

        assert_eq!(quote_buy(&env, 0, &reserves, &k), Err(Error::InvalidInput));
        assert_eq!(quote_buy(&env, -1, &reserves, &k), Err(Error::InvalidInput));
    }

    #[test]
    fn test_quote_input_is_minimal() {
        let env = Env::default();
        let (reserves, k) = opening(&env);
        let wanted = 100_000_000 * E18;

        let eth_in = quote_input(&env, wanted, &reserves, &k).unwrap();
        assert_eq!(eth_in, 356_666_666_666_666_667);

        assert!(quote_buy(&env, eth_in, &reserves, &k).unwrap() >= wanted);
        assert!(quote_buy(&env, eth_in - 1, &reserves, &k).unwrap() < wanted);
    }

    #[test]
    fn test_quote_input_rejects_whole_reserve() {
        let env = Env::default();
        let (reserves, k) = opening(&env);

        assert_eq!(
            quote_input(&env, reserves.token, &reserves, &k),
            Err(Error::InvalidInput)
        );
    }
}
