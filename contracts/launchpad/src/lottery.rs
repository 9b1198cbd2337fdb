use crate::cap_guard::CapGuard;
use crate::error::Error;
use crate::events::{LotteryDepositedEvent, LotterySpunEvent, LotteryWinnerAllocatedEvent};
use crate::referral::ReferralLedger;
use crate::storage::Storage;
use crate::types::{LotteryRound, Participant, Pool, PoolStatus, SpinReceipt, MAX_PARTICIPANTS};
use soroban_sdk::{log, Address, Env, Symbol, Vec};

pub struct LotteryEngine;

impl LotteryEngine {
    /// Open the first round when the sale window opens
    pub fn open_round(env: &Env, pool: &Pool) {
        if Storage::get_lottery_round(env, &pool.sale_token).is_some() {
            return;
        }
        Storage::set_lottery_round(
            env,
            &pool.sale_token,
            &LotteryRound {
                round: 1,
                fund_deposit: 0,
                participants: Vec::new(env),
            },
        );
    }

    /// Add a deposit to the current round
    ///
    /// Repeated deposits from one user within a round sum into a single
    /// participant record.
    ///
    /// # Errors
    /// - `NotInLotteryPeriod`: outside [start_time, start_time + min_duration_sell]
    /// - `InvalidInput`: amount below the pool minimum, the user's pending
    ///   deposit would exceed the pool's cap, or cannot pay for one batch
    /// - `NoActiveRound`: pool was never activated
    /// - `RoundFull`: new participant beyond `MAX_PARTICIPANTS`
    pub fn deposit(
        env: &Env,
        pool: &Pool,
        user: &Address,
        eth_amount: i128,
    ) -> Result<LotteryRound, Error> {
        let now = env.ledger().timestamp();
        if now < pool.start_time || now > pool.lottery_end() {
            return Err(Error::NotInLotteryPeriod);
        }
        if eth_amount <= 0 || eth_amount < pool.min_cap {
            return Err(Error::InvalidInput);
        }

        let mut round =
            Storage::get_lottery_round(env, &pool.sale_token).ok_or(Error::NoActiveRound)?;

        let pending = match Self::position_of(&round, user) {
            Some(index) => {
                let mut participant = round
                    .participants
                    .get(index)
                    .ok_or(Error::NoActiveRound)?;
                participant.eth_amount = participant
                    .eth_amount
                    .checked_add(eth_amount)
                    .ok_or(Error::MathOverflow)?;
                let pending = participant.eth_amount;
                round.participants.set(index, participant);
                pending
            }
            None => {
                if round.participants.len() >= MAX_PARTICIPANTS {
                    return Err(Error::RoundFull);
                }
                round.participants.push_back(Participant {
                    user: user.clone(),
                    eth_amount,
                });
                eth_amount
            }
        };

        if pending > pool.fixed_cap {
            return Err(Error::InvalidInput);
        }
        // A seat that can never win would hold its round slot forever
        if batch_capacity(pending, pool.fixed_cap, pool.sellable_batches())? == 0 {
            return Err(Error::InvalidInput);
        }

        round.fund_deposit = round
            .fund_deposit
            .checked_add(eth_amount)
            .ok_or(Error::MathOverflow)?;
        Storage::set_lottery_round(env, &pool.sale_token, &round);

        env.events().publish(
            (Symbol::new(env, "lottery_deposited"), pool.sale_token.clone()),
            LotteryDepositedEvent {
                sale_token: pool.sale_token.clone(),
                user: user.clone(),
                eth_amount,
                round: round.round,
                fund_deposit: round.fund_deposit,
            },
        );

        Ok(round)
    }

    /// Resolve the current round into allocations
    ///
    /// One call unlocks at most `max_repeat_purchase` batches, however many
    /// intervals have passed. Participants keep whatever part of their
    /// deposit was not spent and carry it into the next round; a remainder
    /// too small for one batch leaves the round and becomes refundable.
    ///
    /// # Errors
    /// - `NoActiveRound`: no pending deposits
    /// - `SpinTooEarly`: less than `block_interval` ledgers since the last spin
    pub fn spin(env: &Env, pool: &mut Pool) -> Result<SpinReceipt, Error> {
        let mut round =
            Storage::get_lottery_round(env, &pool.sale_token).ok_or(Error::NoActiveRound)?;
        if round.fund_deposit <= 0 || round.participants.is_empty() {
            return Err(Error::NoActiveRound);
        }

        let sequence = env.ledger().sequence();
        let unlock_at = pool
            .last_spin_block
            .checked_add(pool.block_interval)
            .ok_or(Error::MathOverflow)?;
        if sequence < unlock_at {
            return Err(Error::SpinTooEarly);
        }

        let sellable = pool.sellable_batches();
        let remaining = sellable
            .checked_sub(pool.sold_batch)
            .ok_or(Error::MathOverflow)?;
        let available = remaining.min(pool.max_repeat_purchase as i128);

        let shares = allocate_batches(env, &round.participants, available, pool.fixed_cap, sellable)?;

        let mut carried = Vec::new(env);
        let mut fund_carried = 0i128;
        let mut winners = 0u32;
        let mut batches_allocated = 0i128;
        let mut tokens_allocated = 0i128;
        let mut eth_consumed = 0i128;

        for (index, participant) in round.participants.iter().enumerate() {
            let batches = shares.get(index as u32).unwrap_or(0);
            let mut left = participant.eth_amount;

            if batches > 0 {
                let sold_batch = pool
                    .sold_batch
                    .checked_add(batches)
                    .ok_or(Error::MathOverflow)?;
                let raised_after = batch_cost(sold_batch, pool.fixed_cap, sellable)?;
                let eth_spent = raised_after
                    .checked_sub(pool.total_raised)
                    .ok_or(Error::MathOverflow)?;
                let tokens = batches
                    .checked_mul(pool.token_per_purchase)
                    .ok_or(Error::MathOverflow)?;

                CapGuard::record_sale(pool, eth_spent, tokens)?;
                pool.sold_batch = sold_batch;

                let mut position = Storage::get_user_position(env, &pool.sale_token, &participant.user);
                position.balance = position
                    .balance
                    .checked_add(tokens)
                    .ok_or(Error::MathOverflow)?;
                position.eth_contributed = position
                    .eth_contributed
                    .checked_add(eth_spent)
                    .ok_or(Error::MathOverflow)?;
                Storage::set_user_position(env, &pool.sale_token, &participant.user, &position);

                ReferralLedger::credit(env, pool, &participant.user, tokens)?;

                left = left.checked_sub(eth_spent).ok_or(Error::MathOverflow)?;
                winners += 1;
                batches_allocated += batches;
                tokens_allocated += tokens;
                eth_consumed += eth_spent;

                env.events().publish(
                    (Symbol::new(env, "lottery_winner"), pool.sale_token.clone()),
                    LotteryWinnerAllocatedEvent {
                        sale_token: pool.sale_token.clone(),
                        user: participant.user.clone(),
                        round: round.round,
                        batches,
                        tokens,
                        eth_spent,
                    },
                );
            }

            if left <= 0 {
                continue;
            }
            if batch_capacity(left, pool.fixed_cap, sellable)? > 0 {
                fund_carried = fund_carried.checked_add(left).ok_or(Error::MathOverflow)?;
                carried.push_back(Participant {
                    user: participant.user.clone(),
                    eth_amount: left,
                });
            } else {
                let mut position = Storage::get_user_position(env, &pool.sale_token, &participant.user);
                position.refund_due = position
                    .refund_due
                    .checked_add(left)
                    .ok_or(Error::MathOverflow)?;
                Storage::set_user_position(env, &pool.sale_token, &participant.user, &position);
            }
        }

        round.fund_deposit = fund_carried;
        round.participants = carried;
        let resolved_round = round.round;
        round.round += 1;
        Storage::set_lottery_round(env, &pool.sale_token, &round);

        pool.last_spin_block = sequence;
        if pool.sold_batch >= sellable && pool.status == PoolStatus::Active {
            pool.status = PoolStatus::Full;
        } else {
            CapGuard::fill_if_capped(pool);
        }

        log!(env, "lottery round resolved", resolved_round, winners, batches_allocated);

        env.events().publish(
            (Symbol::new(env, "lottery_spun"), pool.sale_token.clone()),
            LotterySpunEvent {
                sale_token: pool.sale_token.clone(),
                round: resolved_round,
                winners,
                batches_allocated,
                fund_carried: round.fund_deposit,
            },
        );

        Ok(SpinReceipt {
            round: resolved_round,
            winners,
            batches_allocated,
            tokens_allocated,
            eth_consumed,
            status: pool.status,
        })
    }

    /// Remove the user's unspent deposit from the round and return it
    pub fn withdraw_pending(env: &Env, sale_token: &Address, user: &Address) -> Result<i128, Error> {
        let Some(mut round) = Storage::get_lottery_round(env, sale_token) else {
            return Ok(0);
        };
        let Some(index) = Self::position_of(&round, user) else {
            return Ok(0);
        };

        let participant = round
            .participants
            .get(index)
            .ok_or(Error::NothingToClaim)?;
        round.participants.remove(index);
        round.fund_deposit = round
            .fund_deposit
            .checked_sub(participant.eth_amount)
            .ok_or(Error::MathOverflow)?;
        Storage::set_lottery_round(env, sale_token, &round);

        Ok(participant.eth_amount)
    }

    pub fn pending_deposit(env: &Env, sale_token: &Address, user: &Address) -> i128 {
        Storage::get_lottery_round(env, sale_token)
            .and_then(|round| {
                Self::position_of(&round, user)
                    .and_then(|index| round.participants.get(index))
            })
            .map(|participant| participant.eth_amount)
            .unwrap_or(0)
    }

    fn position_of(round: &LotteryRound, user: &Address) -> Option<u32> {
        round
            .participants
            .iter()
            .position(|participant| participant.user == *user)
            .map(|index| index as u32)
    }
}

/// Base currency raised once `batches` of the sellable batches are sold
///
/// Formula: ⌈batches × fixed_cap / sellable_batches⌉
///
/// Charging the difference of two cumulative costs keeps per-winner
/// rounding on the pool's side while landing exactly on `fixed_cap` when
/// the last batch sells.
pub fn batch_cost(batches: i128, fixed_cap: i128, sellable_batches: i128) -> Result<i128, Error> {
    if sellable_batches <= 0 {
        return Err(Error::InvalidPoolParams);
    }
    let numerator = batches.checked_mul(fixed_cap).ok_or(Error::MathOverflow)?;
    Ok((numerator + sellable_batches - 1) / sellable_batches)
}

/// Whole batches a deposit can pay for
///
/// Formula: ⌊eth × sellable_batches / fixed_cap⌋
pub fn batch_capacity(eth: i128, fixed_cap: i128, sellable_batches: i128) -> Result<i128, Error> {
    if fixed_cap <= 0 {
        return Err(Error::InvalidPoolParams);
    }
    Ok(eth
        .checked_mul(sellable_batches)
        .ok_or(Error::MathOverflow)?
        / fixed_cap)
}

/// Split `available` batches across participants
///
/// When total demand fits, every participant gets what their deposit
/// covers. Otherwise each gets ⌊available × eth / fund⌋ and the remainder
/// goes to the largest depositor (earliest on ties), up to what that
/// deposit covers.
pub fn allocate_batches(
    env: &Env,
    participants: &Vec<Participant>,
    available: i128,
    fixed_cap: i128,
    sellable_batches: i128,
) -> Result<Vec<i128>, Error> {
    let mut capacities = Vec::new(env);
    let mut demand = 0i128;
    let mut fund = 0i128;

    for participant in participants.iter() {
        let capacity = batch_capacity(participant.eth_amount, fixed_cap, sellable_batches)?;
        capacities.push_back(capacity);
        demand = demand.checked_add(capacity).ok_or(Error::MathOverflow)?;
        fund = fund
            .checked_add(participant.eth_amount)
            .ok_or(Error::MathOverflow)?;
    }

    if demand <= available {
        return Ok(capacities);
    }

    let mut shares = Vec::new(env);
    let mut assigned = 0i128;
    let mut largest = 0u32;
    let mut largest_eth = i128::MIN;

    for (index, participant) in participants.iter().enumerate() {
        let share = available
            .checked_mul(participant.eth_amount)
            .ok_or(Error::MathOverflow)?
            / fund;
        shares.push_back(share);
        assigned += share;

        if participant.eth_amount > largest_eth {
            largest = index as u32;
            largest_eth = participant.eth_amount;
        }
    }

    let remainder = available - assigned;
    if remainder > 0 {
        if let (Some(share), Some(capacity)) = (shares.get(largest), capacities.get(largest)) {
            let extra = remainder.min(capacity - share);
            shares.set(largest, share + extra);
        }
    }

    Ok(shares)
}

#[cfg(test)]
mod tests {
    use super::*;
    use soroban_sdk::testutils::Address as _;

    const E18: i128 = 1_000_000_000_000_000_000;

    fn participants(env: &Env, deposits: &[i128]) -> Vec<Participant> {
        let mut list = Vec::new(env);
        for eth_amount in deposits {
            list.push_back(Participant {
                user: Address::generate(env),
                eth_amount: *eth_amount,
            });
        }
        list
    }

    #[test]
    fn test_proportional_split() {
        let env = Env::default();
        let list = participants(&env, &[E18, 2 * E18]);

        // 5 ETH cap over 3,750 batches
        let shares = allocate_batches(&env, &list, 100, 5 * E18, 3_750).unwrap();

        assert_eq!(shares.get(0), Some(33));
        assert_eq!(shares.get(1), Some(67));
    }

    #[test]
    fn test_remainder_goes_to_first_largest() {
        let env = Env::default();
        let list = participants(&env, &[E18, 2 * E18, 2 * E18]);

        let shares = allocate_batches(&env, &list, 101, 5 * E18, 3_750).unwrap();

        // 20 + 40 + 40 = 100, one left over
        assert_eq!(shares.get(0), Some(20));
        assert_eq!(shares.get(1), Some(41));
        assert_eq!(shares.get(2), Some(40));
    }

    #[test]
    fn test_demand_below_quota_fills_everyone() {
        let env = Env::default();
        let list = participants(&env, &[E18 / 100, E18 / 50]);

        // 0.01 ETH buys 7 batches, 0.02 ETH buys 15
        let shares = allocate_batches(&env, &list, 100, 5 * E18, 3_750).unwrap();

        assert_eq!(shares.get(0), Some(7));
        assert_eq!(shares.get(1), Some(15));
    }

    #[test]
    fn test_shares_never_exceed_deposit() {
        let env = Env::default();
        let list = participants(&env, &[E18 / 1_000, 3 * E18 / 1_000]);

        let shares = allocate_batches(&env, &list, 3, 5 * E18, 3_750).unwrap();
        let first = shares.get(0).unwrap();
        let second = shares.get(1).unwrap();

        assert!(first <= batch_capacity(E18 / 1_000, 5 * E18, 3_750).unwrap());
        assert!(second <= batch_capacity(3 * E18 / 1_000, 5 * E18, 3_750).unwrap());
        assert!(first + second <= 3);
    }

    #[test]
    fn test_batch_cost_is_cumulative() {
        assert_eq!(batch_cost(0, 5 * E18, 3_750).unwrap(), 0);
        assert_eq!(batch_cost(3_750, 5 * E18, 3_750).unwrap(), 5 * E18);

        // 67 batches cost 0.08933... ETH, rounded up
        assert_eq!(batch_cost(67, 5 * E18, 3_750).unwrap(), 89_333_333_333_333_334);
        assert!(batch_cost(67, 5 * E18, 3_750).unwrap() <= 2 * E18);
    }
}
