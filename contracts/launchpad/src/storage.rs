use crate::error::Error;
use crate::types::{
    FinalizeReceipt, LaunchpadConfig, LotteryRound, Pool, ReferralEdge, UserPosition,
};
use soroban_sdk::{contracttype, Address, Env};

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Initialized,
    Paused,
    SchemaVersion,
    Config,
    Pool(Address),                  // sale_token -> Pool
    UserPosition(Address, Address), // (sale_token, user)
    Referral(Address, Address),     // (sale_token, buyer) -> ReferralEdge
    Lottery(Address),               // sale_token -> LotteryRound
    Settlement(Address),            // sale_token -> FinalizeReceipt
}

pub struct Storage;

impl Storage {
    // Config
    pub fn is_initialized(env: &Env) -> bool {
        env.storage().instance().has(&DataKey::Initialized)
    }

    pub fn get_config(env: &Env) -> Result<LaunchpadConfig, Error> {
        env.storage()
            .instance()
            .get(&DataKey::Config)
            .ok_or(Error::NotInitialized)
    }

    pub fn set_config(env: &Env, config: &LaunchpadConfig) {
        env.storage().instance().set(&DataKey::Config, config);
    }

    pub fn set_schema_version(env: &Env, version: u32) {
        env.storage()
            .instance()
            .set(&DataKey::SchemaVersion, &version);
    }

    pub fn get_schema_version(env: &Env) -> u32 {
        env.storage()
            .instance()
            .get(&DataKey::SchemaVersion)
            .unwrap_or(0)
    }

    pub fn mark_initialized(env: &Env) {
        env.storage().instance().set(&DataKey::Initialized, &true);
    }

    pub fn is_paused(env: &Env) -> bool {
        env.storage()
            .instance()
            .get::<DataKey, bool>(&DataKey::Paused)
            .unwrap_or(false)
    }

    pub fn set_paused(env: &Env, paused: bool) {
        env.storage().instance().set(&DataKey::Paused, &paused);
    }

    // Pools
    pub fn has_pool(env: &Env, sale_token: &Address) -> bool {
        env.storage()
            .persistent()
            .has(&DataKey::Pool(sale_token.clone()))
    }

    pub fn get_pool(env: &Env, sale_token: &Address) -> Result<Pool, Error> {
        env.storage()
            .persistent()
            .get(&DataKey::Pool(sale_token.clone()))
            .ok_or(Error::PoolNotFound)
    }

    pub fn set_pool(env: &Env, pool: &Pool) {
        env.storage()
            .persistent()
            .set(&DataKey::Pool(pool.sale_token.clone()), pool);
    }

    // User positions
    pub fn get_user_position(env: &Env, sale_token: &Address, user: &Address) -> UserPosition {
        env.storage()
            .persistent()
            .get(&DataKey::UserPosition(sale_token.clone(), user.clone()))
            .unwrap_or_default()
    }

    pub fn set_user_position(
        env: &Env,
        sale_token: &Address,
        user: &Address,
        position: &UserPosition,
    ) {
        env.storage().persistent().set(
            &DataKey::UserPosition(sale_token.clone(), user.clone()),
            position,
        );
    }

    // Referral edges
    pub fn get_referral(env: &Env, sale_token: &Address, buyer: &Address) -> Option<ReferralEdge> {
        env.storage()
            .persistent()
            .get(&DataKey::Referral(sale_token.clone(), buyer.clone()))
    }

    pub fn set_referral(env: &Env, sale_token: &Address, buyer: &Address, edge: &ReferralEdge) {
        env.storage()
            .persistent()
            .set(&DataKey::Referral(sale_token.clone(), buyer.clone()), edge);
    }

    // Lottery rounds
    pub fn get_lottery_round(env: &Env, sale_token: &Address) -> Option<LotteryRound> {
        env.storage()
            .persistent()
            .get(&DataKey::Lottery(sale_token.clone()))
    }

    pub fn set_lottery_round(env: &Env, sale_token: &Address, round: &LotteryRound) {
        env.storage()
            .persistent()
            .set(&DataKey::Lottery(sale_token.clone()), round);
    }

    // Finalization receipts
    pub fn get_settlement(env: &Env, sale_token: &Address) -> Option<FinalizeReceipt> {
        env.storage()
            .persistent()
            .get(&DataKey::Settlement(sale_token.clone()))
    }

    pub fn set_settlement(env: &Env, sale_token: &Address, receipt: &FinalizeReceipt) {
        env.storage()
            .persistent()
            .set(&DataKey::Settlement(sale_token.clone()), receipt);
    }
}
