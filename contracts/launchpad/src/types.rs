use soroban_sdk::{contracttype, Address, String, Vec};

// Constants
pub const BPS_DENOMINATOR: i128 = 10_000; // 100% = 10,000 basis points
pub const MAX_PARTICIPANTS: u32 = 100;
pub const SCHEMA_VERSION: u32 = 1;

/// Contract-wide configuration written once by `initialize`
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LaunchpadConfig {
    /// Pauses the contract, sets the operator, activates or cancels any pool
    pub admin: Address,
    /// Only address allowed to spin lottery rounds
    pub operator: Address,
    /// Receives the launch fee and the proportional platform fee
    pub platform: Address,
    /// Receives the fixed finalization fee
    pub fee_recipient: Address,
    /// Base currency contributed by buyers
    pub base_token: Address,
    /// AMM router seeded at finalization
    pub router: Address,
    /// Flat base-currency fee charged by `launch_pool` (0 disables)
    pub launch_fee: i128,
    /// Fixed fee taken from raised funds at finalization
    pub fixed_fee: i128,
    /// Platform share of raised funds, in basis points
    pub platform_fee_bps: i128,
    /// Default lottery round length, in ledgers
    pub block_interval: u32,
    /// Default minimum contribution
    pub min_cap: i128,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PoolStatus {
    /// Launched, waiting for start time and activation
    Pending = 0,
    /// Accepting buys or lottery deposits
    Active = 1,
    /// Raise ceiling reached
    Full = 2,
    /// Liquidity seeded, claims open
    Finalized = 3,
    /// Cancelled before any settlement
    Cancelled = 4,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SaleMode {
    /// Instant purchase on the virtual bonding curve
    Instant = 0,
    /// Periodic batch allocation proportional to deposits
    Lottery = 1,
}

/// Creator-supplied launch parameters
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolParams {
    pub mode: SaleMode,
    pub fixed_cap: i128,
    pub token_for_sale: i128,
    pub token_for_airdrop: i128,
    pub token_for_farm: i128,
    pub token_for_add_lp: i128,
    pub airdrop_recipient: Address,
    pub farm_recipient: Address,
    pub start_time: u64,
    pub min_duration_sell: u64,
    pub max_duration_sell: u64,
    /// Tokens per lottery batch
    pub token_per_purchase: i128,
    /// Batches unlocked per lottery interval
    pub max_repeat_purchase: u32,
    /// Minimum contribution, 0 uses the contract default
    pub min_cap: i128,
    /// Lottery interval in ledgers, 0 uses the contract default
    pub block_interval: u32,
    pub metadata: String,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Pool {
    /// Sale token, also the pool key
    pub sale_token: Address,
    pub creator: Address,
    pub mode: SaleMode,
    pub status: PoolStatus,
    /// Immutable raise ceiling in base currency
    pub fixed_cap: i128,
    /// Base currency accepted so far (never above `fixed_cap`)
    pub total_raised: i128,
    pub token_for_sale: i128,
    pub token_for_airdrop: i128,
    pub token_for_farm: i128,
    pub token_for_add_lp: i128,
    /// Tokens allocated to buyers (never above half of `token_for_sale`)
    pub total_sold: i128,
    /// Tokens credited to referrers
    pub total_referral: i128,
    /// Virtual base reserve, starts at `fixed_cap`
    pub virtual_base: i128,
    /// Virtual token reserve, starts at `token_for_sale`
    pub virtual_token: i128,
    pub start_time: u64,
    pub min_duration_sell: u64,
    pub max_duration_sell: u64,
    pub block_interval: u32,
    /// Ledger sequence of activation or of the last spin
    pub last_spin_block: u32,
    /// Cumulative lottery batches allocated
    pub sold_batch: i128,
    pub min_cap: i128,
    pub token_per_purchase: i128,
    pub max_repeat_purchase: u32,
    pub fixed_fee: i128,
    pub platform_fee_bps: i128,
    pub airdrop_recipient: Address,
    pub farm_recipient: Address,
    /// Liquidity position returned by the router, 0 until finalized
    pub liquidity_ref: u64,
    pub finalized_at: u64,
    pub metadata: String,
}

impl Pool {
    /// End of the sale window
    pub fn sale_end(&self) -> u64 {
        self.start_time.saturating_add(self.max_duration_sell)
    }

    /// End of the lottery deposit window
    pub fn lottery_end(&self) -> u64 {
        self.start_time.saturating_add(self.min_duration_sell)
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.sale_end()
    }

    pub fn is_capped(&self) -> bool {
        self.total_raised >= self.fixed_cap
    }

    /// Half of the sale supply goes to buyers, the rest backs referral bonuses
    pub fn sellable_tokens(&self) -> i128 {
        self.token_for_sale / 2
    }

    pub fn sellable_batches(&self) -> i128 {
        if self.token_per_purchase <= 0 {
            return 0;
        }
        self.sellable_tokens() / self.token_per_purchase
    }

    /// Sale tokens neither sold nor credited to referrers
    pub fn unsold_tokens(&self) -> i128 {
        self.token_for_sale - self.total_sold - self.total_referral
    }
}

#[contracttype]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct UserPosition {
    /// Sale tokens bought or allocated, paid out on claim
    pub balance: i128,
    /// Referral bonus tokens, paid out on claim
    pub ref_balance: i128,
    /// Base currency accepted from this user
    pub eth_contributed: i128,
    /// Lottery deposit released from the round, refunded on claim
    pub refund_due: i128,
    /// Number of buys and deposits made
    pub contributions: u32,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ReferralEdge {
    pub referrer: Address,
    /// Bonus credited to the referrer through this buyer
    pub accrued: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Participant {
    pub user: Address,
    pub eth_amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LotteryRound {
    /// Incremented by every spin
    pub round: u32,
    /// Sum of pending deposits
    pub fund_deposit: i128,
    /// Unique per user, in order of first deposit
    pub participants: Vec<Participant>,
}

/// Curve quote after cap clamping
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Quote {
    pub eth_accepted: i128,
    pub eth_refunded: i128,
    pub tokens_out: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BuyReceipt {
    pub eth_accepted: i128,
    pub eth_refunded: i128,
    pub tokens_out: i128,
    pub referral_bonus: i128,
    pub status: PoolStatus,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SpinReceipt {
    pub round: u32,
    pub winners: u32,
    pub batches_allocated: i128,
    pub tokens_allocated: i128,
    pub eth_consumed: i128,
    pub status: PoolStatus,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FinalizeReceipt {
    pub platform_fee: i128,
    pub fixed_fee: i128,
    pub liquidity_base: i128,
    pub liquidity_tokens: i128,
    pub burned: i128,
    pub liquidity_ref: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClaimReceipt {
    pub tokens: i128,
    pub refund: i128,
}

#[cfg(test)]
impl Pool {
    /// Active pool with the 5.35 / 1.6B reference economics, lottery
    /// batches of 100,000 tokens
    pub fn sample(env: &soroban_sdk::Env, mode: SaleMode) -> Self {
        use soroban_sdk::testutils::Address as _;

        const E18: i128 = 1_000_000_000_000_000_000;
        let fixed_cap = 535 * E18 / 100;
        let token_for_sale = 1_600_000_000 * E18;

        Pool {
            sale_token: Address::generate(env),
            creator: Address::generate(env),
            mode,
            status: PoolStatus::Active,
            fixed_cap,
            total_raised: 0,
            token_for_sale,
            token_for_airdrop: 100_000_000 * E18,
            token_for_farm: 100_000_000 * E18,
            token_for_add_lp: 200_000_000 * E18,
            total_sold: 0,
            total_referral: 0,
            virtual_base: fixed_cap,
            virtual_token: token_for_sale,
            start_time: 1_000,
            min_duration_sell: 86_400,
            max_duration_sell: 604_800,
            block_interval: 2,
            last_spin_block: 10,
            sold_batch: 0,
            min_cap: 0,
            token_per_purchase: 100_000 * E18,
            max_repeat_purchase: 100,
            fixed_fee: E18 / 100,
            platform_fee_bps: 100,
            airdrop_recipient: Address::generate(env),
            farm_recipient: Address::generate(env),
            liquidity_ref: 0,
            finalized_at: 0,
            metadata: String::from_str(env, "sample"),
        }
    }
}
