#![no_std]

mod cap_guard;
mod curve;
mod error;
mod events;
mod finalizer;
mod lottery;
mod referral;
mod storage;
mod types;
mod validation;


pub use error::Error;
pub use types::{
    BuyReceipt, ClaimReceipt, FinalizeReceipt, LaunchpadConfig, LotteryRound, Participant, Pool,
    PoolParams, PoolStatus, Quote, ReferralEdge, SaleMode, SpinReceipt, UserPosition,
};

use cap_guard::CapGuard;
use curve::{pool_invariant, quote_input, Reserves};
use events::*;
use finalizer::Finalizer;
use lottery::LotteryEngine;
use referral::ReferralLedger;
use storage::Storage;
use types::SCHEMA_VERSION;
use validation::Validator;

use soroban_sdk::{contract, contractimpl, log, token, Address, Env, Symbol};

#[contract]
pub struct Launchpad;

#[contractimpl]
impl Launchpad {
    // ============================================
    // INITIALIZATION & ADMIN
    // ============================================

    /// Initialize the launchpad
    ///
    /// # Errors
    /// - `AlreadyInitialized`: Contract already initialized
    /// - `InvalidInput`: Negative fee or minimum, fee bps above 10,000
    pub fn initialize(env: Env, config: LaunchpadConfig) -> Result<(), Error> {
        if Storage::is_initialized(&env) {
            return Err(Error::AlreadyInitialized);
        }

        config.admin.require_auth();
        Validator::validate_config(&config)?;

        Storage::mark_initialized(&env);
        Storage::set_config(&env, &config);
        Storage::set_schema_version(&env, SCHEMA_VERSION);
        Storage::set_paused(&env, false);

        Ok(())
    }

    /// Pause contract (emergency)
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    pub fn pause(env: Env) -> Result<(), Error> {
        let config = Storage::get_config(&env)?;
        config.admin.require_auth();

        Storage::set_paused(&env, true);
        Ok(())
    }

    /// Unpause contract
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    pub fn unpause(env: Env) -> Result<(), Error> {
        let config = Storage::get_config(&env)?;
        config.admin.require_auth();

        Storage::set_paused(&env, false);
        Ok(())
    }

    /// Replace the lottery operator
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    pub fn set_operator(env: Env, operator: Address) -> Result<(), Error> {
        let mut config = Storage::get_config(&env)?;
        config.admin.require_auth();

        config.operator = operator;
        Storage::set_config(&env, &config);
        Ok(())
    }

    // ============================================
    // POOL LIFECYCLE
    // ============================================

    /// Register a sale pool for `sale_token`
    ///
    /// Pulls the full sale, airdrop, farm and LP supply from the creator and
    /// charges the launch fee. The pool starts `Pending`.
    ///
    /// # Errors
    /// - `NotInitialized`: Contract not initialized
    /// - `ContractPaused`: Contract is paused
    /// - `PoolAlreadyExists`: A pool is already registered for this token
    /// - `InvalidPoolParams`: Parameters rejected by validation
    pub fn launch_pool(
        env: Env,
        creator: Address,
        sale_token: Address,
        params: PoolParams,
    ) -> Result<Pool, Error> {
        Self::check_not_paused(&env)?;
        creator.require_auth();

        let config = Storage::get_config(&env)?;
        if Storage::has_pool(&env, &sale_token) {
            return Err(Error::PoolAlreadyExists);
        }
        if sale_token == config.base_token {
            return Err(Error::InvalidPoolParams);
        }

        let now = env.ledger().timestamp();
        let supply = Validator::validate_pool_params(&params, now)?;

        let contract = env.current_contract_address();
        token::Client::new(&env, &sale_token).transfer(&creator, &contract, &supply);
        if config.launch_fee > 0 {
            token::Client::new(&env, &config.base_token).transfer(
                &creator,
                &config.platform,
                &config.launch_fee,
            );
        }

        let reserves = Reserves::initial(params.fixed_cap, params.token_for_sale);
        let pool = Pool {
            sale_token: sale_token.clone(),
            creator: creator.clone(),
            mode: params.mode,
            status: PoolStatus::Pending,
            fixed_cap: params.fixed_cap,
            total_raised: 0,
            token_for_sale: params.token_for_sale,
            token_for_airdrop: params.token_for_airdrop,
            token_for_farm: params.token_for_farm,
            token_for_add_lp: params.token_for_add_lp,
            total_sold: 0,
            total_referral: 0,
            virtual_base: reserves.base,
            virtual_token: reserves.token,
            start_time: params.start_time,
            min_duration_sell: params.min_duration_sell,
            max_duration_sell: params.max_duration_sell,
            block_interval: if params.block_interval > 0 {
                params.block_interval
            } else {
                config.block_interval
            },
            last_spin_block: 0,
            sold_batch: 0,
            min_cap: if params.min_cap > 0 {
                params.min_cap
            } else {
                config.min_cap
            },
            token_per_purchase: params.token_per_purchase,
            max_repeat_purchase: params.max_repeat_purchase,
            fixed_fee: config.fixed_fee,
            platform_fee_bps: config.platform_fee_bps,
            airdrop_recipient: params.airdrop_recipient,
            farm_recipient: params.farm_recipient,
            liquidity_ref: 0,
            finalized_at: 0,
            metadata: params.metadata,
        };

        Storage::set_pool(&env, &pool);

        env.events().publish(
            (Symbol::new(&env, "pool_launched"), sale_token.clone()),
            PoolLaunchedEvent {
                sale_token,
                creator,
                mode: pool.mode,
                fixed_cap: pool.fixed_cap,
                token_for_sale: pool.token_for_sale,
                start_time: pool.start_time,
            },
        );

        Ok(pool)
    }

    /// Open a pending pool for contributions
    ///
    /// Activating an already active pool is a no-op.
    ///
    /// # Errors
    /// - `Unauthorized`: Caller is neither admin nor creator
    /// - `PoolNotFound`: No pool for this token
    /// - `PoolNotActive`: Pool is past the pending state
    /// - `SaleNotStarted`: Start time not reached
    pub fn activate_pool(env: Env, caller: Address, sale_token: Address) -> Result<PoolStatus, Error> {
        Self::check_not_paused(&env)?;

        let config = Storage::get_config(&env)?;
        let mut pool = Storage::get_pool(&env, &sale_token)?;
        Self::require_admin_or_creator(&config, &pool, &caller)?;

        match pool.status {
            PoolStatus::Active => return Ok(PoolStatus::Active),
            PoolStatus::Pending => {}
            _ => return Err(Error::PoolNotActive),
        }

        let now = env.ledger().timestamp();
        if now < pool.start_time {
            return Err(Error::SaleNotStarted);
        }

        pool.status = PoolStatus::Active;
        pool.last_spin_block = env.ledger().sequence();
        if pool.mode == SaleMode::Lottery {
            LotteryEngine::open_round(&env, &pool);
        }
        Storage::set_pool(&env, &pool);

        log!(&env, "pool activated", sale_token);

        env.events().publish(
            (Symbol::new(&env, "pool_activated"), sale_token.clone()),
            PoolActivatedEvent {
                sale_token,
                activated_at: now,
            },
        );

        Ok(PoolStatus::Active)
    }

    /// Cancel a pool before anything settled and return the deposited
    /// supply to the creator
    ///
    /// Pending lottery deposits stay refundable through `claim_allocation`.
    ///
    /// # Errors
    /// - `Unauthorized`: Caller is neither admin nor creator
    /// - `PoolNotActive`: Pool already full, finalized or cancelled
    /// - `CancelNotAllowed`: Contributions already settled
    pub fn cancel_pool(env: Env, caller: Address, sale_token: Address) -> Result<(), Error> {
        let config = Storage::get_config(&env)?;
        let mut pool = Storage::get_pool(&env, &sale_token)?;
        Self::require_admin_or_creator(&config, &pool, &caller)?;

        if !matches!(pool.status, PoolStatus::Pending | PoolStatus::Active) {
            return Err(Error::PoolNotActive);
        }
        if pool.total_raised > 0 || pool.total_sold > 0 {
            return Err(Error::CancelNotAllowed);
        }

        let returned_tokens = pool.token_for_sale
            + pool.token_for_airdrop
            + pool.token_for_farm
            + pool.token_for_add_lp;
        token::Client::new(&env, &sale_token).transfer(
            &env.current_contract_address(),
            &pool.creator,
            &returned_tokens,
        );

        pool.status = PoolStatus::Cancelled;
        Storage::set_pool(&env, &pool);

        env.events().publish(
            (Symbol::new(&env, "pool_cancelled"), sale_token.clone()),
            PoolCancelledEvent {
                sale_token,
                returned_tokens,
            },
        );

        Ok(())
    }

    // ============================================
    // INSTANT BUY
    // ============================================

    /// Buy on the virtual curve
    ///
    /// Only the accepted part of `eth_in` is pulled from the buyer; the
    /// part above the cap comes back as `eth_refunded`. The buy that fills
    /// the cap leaves the pool `Full`, ready for `finalize`.
    ///
    /// # Errors
    /// - `ContractPaused`: Contract is paused
    /// - `InvalidInput`: Non-positive amount, below the pool minimum, or
    ///   buys zero tokens
    /// - `PoolNotFound`: No pool for this token
    /// - `WrongSaleMode`: Pool runs lottery rounds
    /// - `PoolNotActive`: Pool not active or past its sale window
    /// - `PoolFull`: Cap already reached
    /// - `InvalidReferrer`: Self-referral or referrer rebind
    pub fn buy(
        env: Env,
        buyer: Address,
        sale_token: Address,
        eth_in: i128,
        referrer: Option<Address>,
    ) -> Result<BuyReceipt, Error> {
        Self::check_not_paused(&env)?;

        if eth_in <= 0 {
            return Err(Error::InvalidInput);
        }

        buyer.require_auth();

        let config = Storage::get_config(&env)?;
        let mut pool = Storage::get_pool(&env, &sale_token)?;
        if pool.mode != SaleMode::Instant {
            return Err(Error::WrongSaleMode);
        }

        CapGuard::ensure_open(&pool, env.ledger().timestamp())?;
        if eth_in < pool.min_cap {
            return Err(Error::InvalidInput);
        }

        let quote = CapGuard::quote(&env, &pool, eth_in)?;
        if quote.tokens_out <= 0 {
            return Err(Error::InvalidInput);
        }

        let mut position = Storage::get_user_position(&env, &sale_token, &buyer);
        ReferralLedger::bind(&env, &sale_token, &buyer, &referrer, position.contributions == 0)?;

        token::Client::new(&env, &config.base_token).transfer(
            &buyer,
            &env.current_contract_address(),
            &quote.eth_accepted,
        );

        let filled = CapGuard::settle(&mut pool, &quote)?;

        position.balance = position
            .balance
            .checked_add(quote.tokens_out)
            .ok_or(Error::MathOverflow)?;
        position.eth_contributed = position
            .eth_contributed
            .checked_add(quote.eth_accepted)
            .ok_or(Error::MathOverflow)?;
        position.contributions += 1;
        Storage::set_user_position(&env, &sale_token, &buyer, &position);

        let referral_bonus = ReferralLedger::credit(&env, &mut pool, &buyer, quote.tokens_out)?;

        env.events().publish(
            (Symbol::new(&env, "buy_executed"), sale_token.clone(), buyer.clone()),
            BuyExecutedEvent {
                sale_token: sale_token.clone(),
                buyer,
                eth_accepted: quote.eth_accepted,
                eth_refunded: quote.eth_refunded,
                tokens_out: quote.tokens_out,
                total_raised: pool.total_raised,
                total_sold: pool.total_sold,
            },
        );

        if filled {
            Self::announce_full(&env, &pool);
        }
        Storage::set_pool(&env, &pool);

        Ok(BuyReceipt {
            eth_accepted: quote.eth_accepted,
            eth_refunded: quote.eth_refunded,
            tokens_out: quote.tokens_out,
            referral_bonus,
            status: pool.status,
        })
    }

    // ============================================
    // LOTTERY
    // ============================================

    /// Pledge base currency into the pool's current lottery round
    ///
    /// Returns the user's pending deposit in the round.
    ///
    /// # Errors
    /// - `ContractPaused`: Contract is paused
    /// - `InvalidInput`: Non-positive amount or below the pool minimum
    /// - `WrongSaleMode`: Pool sells on the curve
    /// - `PoolNotActive` / `PoolFull`: Pool not accepting contributions
    /// - `NotInLotteryPeriod`: Outside the deposit window
    /// - `RoundFull`: Round at its participant limit
    /// - `InvalidReferrer`: Self-referral or referrer rebind
    pub fn deposit_for_lottery(
        env: Env,
        user: Address,
        sale_token: Address,
        eth_amount: i128,
        referrer: Option<Address>,
    ) -> Result<i128, Error> {
        Self::check_not_paused(&env)?;

        if eth_amount <= 0 {
            return Err(Error::InvalidInput);
        }

        user.require_auth();

        let config = Storage::get_config(&env)?;
        let pool = Storage::get_pool(&env, &sale_token)?;
        if pool.mode != SaleMode::Lottery {
            return Err(Error::WrongSaleMode);
        }
        CapGuard::ensure_open(&pool, env.ledger().timestamp())?;

        let mut position = Storage::get_user_position(&env, &sale_token, &user);
        ReferralLedger::bind(&env, &sale_token, &user, &referrer, position.contributions == 0)?;

        LotteryEngine::deposit(&env, &pool, &user, eth_amount)?;

        token::Client::new(&env, &config.base_token).transfer(
            &user,
            &env.current_contract_address(),
            &eth_amount,
        );

        position.contributions += 1;
        Storage::set_user_position(&env, &sale_token, &user, &position);

        Ok(LotteryEngine::pending_deposit(&env, &sale_token, &user))
    }

    /// Resolve the current lottery round (operator only)
    ///
    /// # Errors
    /// - `ContractPaused`: Contract is paused
    /// - `WrongSaleMode`: Pool sells on the curve
    /// - `PoolNotActive` / `PoolFull`: Pool not accepting contributions
    /// - `NoActiveRound`: Round holds no deposits
    /// - `SpinTooEarly`: Block interval not elapsed since the last spin
    pub fn spin_lottery(env: Env, sale_token: Address) -> Result<SpinReceipt, Error> {
        Self::check_not_paused(&env)?;

        let config = Storage::get_config(&env)?;
        config.operator.require_auth();

        let mut pool = Storage::get_pool(&env, &sale_token)?;
        if pool.mode != SaleMode::Lottery {
            return Err(Error::WrongSaleMode);
        }
        CapGuard::ensure_open(&pool, env.ledger().timestamp())?;

        let mut receipt = LotteryEngine::spin(&env, &mut pool)?;

        if pool.status == PoolStatus::Full {
            Self::announce_full(&env, &pool);
        }
        Storage::set_pool(&env, &pool);

        receipt.status = pool.status;
        Ok(receipt)
    }

    // ============================================
    // FINALIZATION
    // ============================================

    /// Finalize a full or expired pool (can be called by anyone)
    ///
    /// Repeated calls return the first receipt without side effects.
    ///
    /// # Errors
    /// - `PoolNotFound`: No pool for this token
    /// - `PoolNotActive`: Pool pending or cancelled
    /// - `SaleNotEnded`: Pool neither full nor expired
    pub fn finalize(env: Env, sale_token: Address) -> Result<FinalizeReceipt, Error> {
        let config = Storage::get_config(&env)?;
        let mut pool = Storage::get_pool(&env, &sale_token)?;

        if pool.status == PoolStatus::Finalized {
            return Finalizer::finalize(&env, &config, &mut pool);
        }

        let receipt = Finalizer::finalize(&env, &config, &mut pool)?;
        Storage::set_pool(&env, &pool);
        Ok(receipt)
    }

    // ============================================
    // CLAIMS
    // ============================================

    /// Pay out purchased or allocated tokens, plus any lottery deposit
    /// left unspent
    ///
    /// On a cancelled pool only the unspent deposit is returned.
    ///
    /// # Errors
    /// - `ContractPaused`: Contract is paused
    /// - `PoolNotActive`: Pool neither finalized nor cancelled
    /// - `NothingToClaim`: Nothing owed
    pub fn claim_allocation(env: Env, user: Address, sale_token: Address) -> Result<ClaimReceipt, Error> {
        Self::check_not_paused(&env)?;
        user.require_auth();

        let config = Storage::get_config(&env)?;
        let pool = Storage::get_pool(&env, &sale_token)?;
        let mut position = Storage::get_user_position(&env, &sale_token, &user);

        let tokens = match pool.status {
            PoolStatus::Finalized => position.balance,
            PoolStatus::Cancelled => 0,
            _ => return Err(Error::PoolNotActive),
        };
        let refund = LotteryEngine::withdraw_pending(&env, &sale_token, &user)?
            .checked_add(position.refund_due)
            .ok_or(Error::MathOverflow)?;

        if tokens == 0 && refund == 0 {
            return Err(Error::NothingToClaim);
        }

        let contract = env.current_contract_address();
        if tokens > 0 {
            token::Client::new(&env, &sale_token).transfer(&contract, &user, &tokens);
        }
        if tokens > 0 || position.refund_due > 0 {
            position.balance = 0;
            position.refund_due = 0;
            Storage::set_user_position(&env, &sale_token, &user, &position);
        }
        if refund > 0 {
            token::Client::new(&env, &config.base_token).transfer(&contract, &user, &refund);
        }

        env.events().publish(
            (Symbol::new(&env, "claimed"), sale_token.clone(), user.clone()),
            ClaimedEvent {
                sale_token,
                user,
                tokens,
                refund,
            },
        );

        Ok(ClaimReceipt { tokens, refund })
    }

    /// Pay out referral bonus tokens
    ///
    /// # Errors
    /// - `ContractPaused`: Contract is paused
    /// - `PoolNotActive`: Pool not finalized
    /// - `NothingToClaim`: No bonus owed
    pub fn claim_reward(env: Env, user: Address, sale_token: Address) -> Result<i128, Error> {
        Self::check_not_paused(&env)?;
        user.require_auth();

        let pool = Storage::get_pool(&env, &sale_token)?;
        if pool.status != PoolStatus::Finalized {
            return Err(Error::PoolNotActive);
        }

        let mut position = Storage::get_user_position(&env, &sale_token, &user);
        let reward = position.ref_balance;
        if reward <= 0 {
            return Err(Error::NothingToClaim);
        }

        token::Client::new(&env, &sale_token).transfer(&env.current_contract_address(), &user, &reward);
        position.ref_balance = 0;
        Storage::set_user_position(&env, &sale_token, &user, &position);

        env.events().publish(
            (Symbol::new(&env, "claimed"), sale_token.clone(), user.clone()),
            ClaimedEvent {
                sale_token,
                user,
                tokens: reward,
                refund: 0,
            },
        );

        Ok(reward)
    }

    // ============================================
    // VIEW FUNCTIONS
    // ============================================

    /// Get contract configuration
    pub fn get_config(env: Env) -> Result<LaunchpadConfig, Error> {
        Storage::get_config(&env)
    }

    /// State schema version written at initialization
    pub fn schema_version(env: Env) -> u32 {
        Storage::get_schema_version(&env)
    }

    /// Get pool details
    pub fn get_pool(env: Env, sale_token: Address) -> Result<Pool, Error> {
        Storage::get_pool(&env, &sale_token)
    }

    /// Get user position in a pool
    pub fn get_user_position(env: Env, sale_token: Address, user: Address) -> UserPosition {
        Storage::get_user_position(&env, &sale_token, &user)
    }

    /// Get the referrer bound to a buyer, with the bonus accrued through them
    pub fn get_referral(env: Env, sale_token: Address, buyer: Address) -> Option<ReferralEdge> {
        Storage::get_referral(&env, &sale_token, &buyer)
    }

    /// Get the current lottery round
    pub fn get_lottery_round(env: Env, sale_token: Address) -> Result<LotteryRound, Error> {
        Storage::get_lottery_round(&env, &sale_token).ok_or(Error::NoActiveRound)
    }

    /// Unspent deposit a user holds in the current round
    pub fn pending_deposit(env: Env, sale_token: Address, user: Address) -> i128 {
        LotteryEngine::pending_deposit(&env, &sale_token, &user)
    }

    /// Quote a buy at the pool's current reserves, cap clamp included
    pub fn quote_buy(env: Env, sale_token: Address, eth_in: i128) -> Result<Quote, Error> {
        let pool = Storage::get_pool(&env, &sale_token)?;
        if pool.mode != SaleMode::Instant {
            return Err(Error::WrongSaleMode);
        }
        CapGuard::quote(&env, &pool, eth_in)
    }

    /// Base currency needed to buy `tokens_out` at the current reserves
    pub fn quote_cost(env: Env, sale_token: Address, tokens_out: i128) -> Result<i128, Error> {
        let pool = Storage::get_pool(&env, &sale_token)?;
        if pool.mode != SaleMode::Instant {
            return Err(Error::WrongSaleMode);
        }
        let left = pool.sellable_tokens() - pool.total_sold;
        if tokens_out > left {
            return Err(Error::PoolFull);
        }

        let k = pool_invariant(&env, &pool)?;
        quote_input(&env, tokens_out, &Reserves::of(&pool), &k)
    }

    // ============================================
    // INTERNAL HELPERS
    // ============================================

    fn check_not_paused(env: &Env) -> Result<(), Error> {
        if Storage::is_paused(env) {
            return Err(Error::ContractPaused);
        }
        Ok(())
    }

    fn require_admin_or_creator(
        config: &LaunchpadConfig,
        pool: &Pool,
        caller: &Address,
    ) -> Result<(), Error> {
        if *caller != config.admin && *caller != pool.creator {
            return Err(Error::Unauthorized);
        }
        caller.require_auth();
        Ok(())
    }

    fn announce_full(env: &Env, pool: &Pool) {
        env.events().publish(
            (Symbol::new(env, "pool_full"), pool.sale_token.clone()),
            PoolFullEvent {
                sale_token: pool.sale_token.clone(),
                total_raised: pool.total_raised,
                total_sold: pool.total_sold,
            },
        );
    }
}
