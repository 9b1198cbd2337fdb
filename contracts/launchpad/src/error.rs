use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // ============================================
    // INITIALIZATION ERRORS (1-5)
    // ============================================
    /// Contract already initialized
    AlreadyInitialized = 1,
    /// Contract not initialized
    NotInitialized = 2,

    // ============================================
    // AUTHORIZATION ERRORS (10-15)
    // ============================================
    /// Caller is neither admin nor the pool creator
    Unauthorized = 10,

    // ============================================
    // POOL LIFECYCLE ERRORS (20-29)
    // ============================================
    /// No pool registered for this sale token
    PoolNotFound = 20,
    /// A pool already exists for this sale token
    PoolAlreadyExists = 21,
    /// Pool is not in a state that accepts this operation
    PoolNotActive = 22,
    /// Fundraising cap already reached
    PoolFull = 23,
    /// Current time is before the pool's start time
    SaleNotStarted = 24,
    /// Pool is neither full nor past its maximum sale duration
    SaleNotEnded = 25,
    /// Contributions already settled; cancellation must go through refunds
    CancelNotAllowed = 26,
    /// Operation does not match the pool's sale mode
    WrongSaleMode = 27,

    // ============================================
    // AMOUNT ERRORS (30-39)
    // ============================================
    /// Amount is zero, negative, below the minimum or buys nothing
    InvalidInput = 30,
    /// Pool parameters rejected at launch
    InvalidPoolParams = 31,
    /// Checked arithmetic overflowed
    MathOverflow = 32,

    // ============================================
    // LOTTERY ERRORS (40-49)
    // ============================================
    /// Deposit outside [start_time, start_time + min_duration_sell]
    NotInLotteryPeriod = 40,
    /// Current round holds no deposits
    NoActiveRound = 41,
    /// One block interval has not elapsed since the previous spin
    SpinTooEarly = 42,
    /// Round already holds the maximum number of participants
    RoundFull = 43,

    // ============================================
    // REFERRAL ERRORS (50-59)
    // ============================================
    /// Self-referral or attempt to rebind an existing referrer
    InvalidReferrer = 50,

    // ============================================
    // CLAIM ERRORS (60-69)
    // ============================================
    /// No tokens or deposit owed to the caller
    NothingToClaim = 60,

    // ============================================
    // OPERATIONAL ERRORS (70-79)
    // ============================================
    /// Contract is paused
    ContractPaused = 70,
}
