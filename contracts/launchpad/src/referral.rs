use crate::error::Error;
use crate::events::ReferrerBoundEvent;
use crate::storage::Storage;
use crate::types::{Pool, ReferralEdge};
use soroban_sdk::{Address, Env, Symbol};

pub struct ReferralLedger;

impl ReferralLedger {
    /// Resolve the referrer for a contribution, binding it on the buyer's
    /// first contribution to the pool
    ///
    /// # Errors
    /// - `InvalidReferrer`: self-referral, a referrer different from the one
    ///   already bound, or a referrer offered after the first contribution
    pub fn bind(
        env: &Env,
        sale_token: &Address,
        buyer: &Address,
        referrer: &Option<Address>,
        first_contribution: bool,
    ) -> Result<Option<Address>, Error> {
        let existing = Storage::get_referral(env, sale_token, buyer);

        match (existing, referrer) {
            (Some(edge), Some(offered)) if edge.referrer != *offered => Err(Error::InvalidReferrer),
            (Some(edge), _) => Ok(Some(edge.referrer)),
            (None, None) => Ok(None),
            (None, Some(offered)) => {
                if offered == buyer || !first_contribution {
                    return Err(Error::InvalidReferrer);
                }

                Storage::set_referral(
                    env,
                    sale_token,
                    buyer,
                    &ReferralEdge {
                        referrer: offered.clone(),
                        accrued: 0,
                    },
                );

                env.events().publish(
                    (Symbol::new(env, "referrer_bound"), sale_token.clone()),
                    ReferrerBoundEvent {
                        sale_token: sale_token.clone(),
                        buyer: buyer.clone(),
                        referrer: offered.clone(),
                    },
                );

                Ok(Some(offered.clone()))
            }
        }
    }

    /// Mirror a settled purchase into the bound referrer's `ref_balance`
    ///
    /// The bonus equals `tokens` one for one. Returns the credited amount,
    /// 0 when the buyer has no referrer.
    pub fn credit(env: &Env, pool: &mut Pool, buyer: &Address, tokens: i128) -> Result<i128, Error> {
        if tokens <= 0 {
            return Ok(0);
        }
        let Some(mut edge) = Storage::get_referral(env, &pool.sale_token, buyer) else {
            return Ok(0);
        };

        edge.accrued = edge.accrued.checked_add(tokens).ok_or(Error::MathOverflow)?;
        Storage::set_referral(env, &pool.sale_token, buyer, &edge);

        let mut position = Storage::get_user_position(env, &pool.sale_token, &edge.referrer);
        position.ref_balance = position
            .ref_balance
            .checked_add(tokens)
            .ok_or(Error::MathOverflow)?;
        Storage::set_user_position(env, &pool.sale_token, &edge.referrer, &position);

        pool.total_referral = pool
            .total_referral
            .checked_add(tokens)
            .ok_or(Error::MathOverflow)?;

        Ok(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SaleMode;
    use crate::Launchpad;
    use soroban_sdk::testutils::Address as _;

    // Storage access needs a contract context
    fn with_contract<T>(env: &Env, f: impl FnOnce() -> T) -> T {
        let contract_id = env.register(Launchpad, ());
        env.as_contract(&contract_id, f)
    }

    #[test]
    fn test_binds_on_first_contribution() {
        let env = Env::default();
        let pool = Address::generate(&env);
        let buyer = Address::generate(&env);
        let referrer = Address::generate(&env);

        let bound = with_contract(&env, || {
            ReferralLedger::bind(&env, &pool, &buyer, &Some(referrer.clone()), true)
        });
        assert_eq!(bound, Ok(Some(referrer)));
    }

    #[test]
    fn test_self_referral_rejected() {
        let env = Env::default();
        let pool = Address::generate(&env);
        let buyer = Address::generate(&env);

        let bound = with_contract(&env, || {
            ReferralLedger::bind(&env, &pool, &buyer, &Some(buyer.clone()), true)
        });
        assert_eq!(bound, Err(Error::InvalidReferrer));
    }

    #[test]
    fn test_late_referrer_rejected() {
        let env = Env::default();
        let pool = Address::generate(&env);
        let buyer = Address::generate(&env);
        let referrer = Address::generate(&env);

        let bound = with_contract(&env, || {
            ReferralLedger::bind(&env, &pool, &buyer, &Some(referrer.clone()), false)
        });
        assert_eq!(bound, Err(Error::InvalidReferrer));
    }

    #[test]
    fn test_rebind_rejected_and_original_kept() {
        let env = Env::default();
        let pool = Address::generate(&env);
        let buyer = Address::generate(&env);
        let first = Address::generate(&env);
        let second = Address::generate(&env);

        with_contract(&env, || {
            ReferralLedger::bind(&env, &pool, &buyer, &Some(first.clone()), true).unwrap();

            assert_eq!(
                ReferralLedger::bind(&env, &pool, &buyer, &Some(second.clone()), false),
                Err(Error::InvalidReferrer)
            );
            assert_eq!(
                ReferralLedger::bind(&env, &pool, &buyer, &None, false),
                Ok(Some(first.clone()))
            );
            assert_eq!(
                ReferralLedger::bind(&env, &pool, &buyer, &Some(first.clone()), false),
                Ok(Some(first.clone()))
            );
        });
    }

    #[test]
    fn test_credit_mirrors_tokens() {
        let env = Env::default();
        let mut pool = Pool::sample(&env, SaleMode::Instant);
        let buyer = Address::generate(&env);
        let referrer = Address::generate(&env);

        with_contract(&env, || {
            ReferralLedger::bind(&env, &pool.sale_token, &buyer, &Some(referrer.clone()), true)
                .unwrap();

            assert_eq!(ReferralLedger::credit(&env, &mut pool, &buyer, 500), Ok(500));
            assert_eq!(ReferralLedger::credit(&env, &mut pool, &buyer, 250), Ok(250));

            let position = Storage::get_user_position(&env, &pool.sale_token, &referrer);
            assert_eq!(position.ref_balance, 750);
            let edge = Storage::get_referral(&env, &pool.sale_token, &buyer).unwrap();
            assert_eq!(edge.accrued, 750);
        });
        assert_eq!(pool.total_referral, 750);
    }

    #[test]
    fn test_credit_without_referrer_is_noop() {
        let env = Env::default();
        let mut pool = Pool::sample(&env, SaleMode::Instant);
        let buyer = Address::generate(&env);

        let credited = with_contract(&env, || ReferralLedger::credit(&env, &mut pool, &buyer, 500));
        assert_eq!(credited, Ok(0));
        assert_eq!(pool.total_referral, 0);
    }
}
