use soroban_sdk::{contracttype, Address};

use crate::types::SaleMode;

#[contracttype]
#[derive(Clone, Debug)]
pub struct PoolLaunchedEvent {
    pub sale_token: Address,
    pub creator: Address,
    pub mode: SaleMode,
    pub fixed_cap: i128,
    pub token_for_sale: i128,
    pub start_time: u64,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct PoolActivatedEvent {
    pub sale_token: Address,
    pub activated_at: u64,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct BuyExecutedEvent {
    pub sale_token: Address,
    pub buyer: Address,
    pub eth_accepted: i128,
    pub eth_refunded: i128,
    pub tokens_out: i128,
    pub total_raised: i128,
    pub total_sold: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct ReferrerBoundEvent {
    pub sale_token: Address,
    pub buyer: Address,
    pub referrer: Address,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct LotteryDepositedEvent {
    pub sale_token: Address,
    pub user: Address,
    pub eth_amount: i128,
    pub round: u32,
    pub fund_deposit: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct LotteryWinnerAllocatedEvent {
    pub sale_token: Address,
    pub user: Address,
    pub round: u32,
    pub batches: i128,
    pub tokens: i128,
    pub eth_spent: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct LotterySpunEvent {
    pub sale_token: Address,
    pub round: u32,
    pub winners: u32,
    pub batches_allocated: i128,
    pub fund_carried: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct PoolFullEvent {
    pub sale_token: Address,
    pub total_raised: i128,
    pub total_sold: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct PoolFinalizedEvent {
    pub sale_token: Address,
    pub total_raised: i128,
    pub total_sold: i128,
    pub liquidity_base: i128,
    pub liquidity_tokens: i128,
    pub platform_fee: i128,
    pub fixed_fee: i128,
    pub burned: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct PoolCancelledEvent {
    pub sale_token: Address,
    pub returned_tokens: i128,
}

#[contracttype]
#[derive(Clone, Debug)]
pub struct ClaimedEvent {
    pub sale_token: Address,
    pub user: Address,
    pub tokens: i128,
    pub refund: i128,
}
