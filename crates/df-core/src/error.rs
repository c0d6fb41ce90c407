//! Error types for the Data Farming engine.
use thiserror::Error;

/// Malformed caller input. Rejected before any computation; never clamped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InputError {
    #[error("invalid address: {0:?}")] InvalidAddress(String),
    #[error("empty market id")] EmptyMarketId,
    #[error("payout fraction outside [0, 1]: {0}")] PayoutOutOfRange(f64),
    #[error("negative stake: {0}")] NegativeStake(f64),
    #[error("non-finite {field}: {value}")] NonFinite { field: &'static str, value: f64 },
    #[error("negative budget: {0}")] NegativeBudget(f64),
    #[error("negative token amount: {0}")] NegativeAmount(f64),
    #[error("token amount too large: {0}")] AmountTooLarge(f64),
    #[error("unrecognized stream: {0:?}")] UnknownStream(String),
    #[error("negative elapsed time: {0}s")] NegativeElapsed(i64),
    #[error("zero half-life")] ZeroHalfLife,
    #[error("reward period ends before it starts")] InvalidPeriod,
    #[error("schedule thresholds not strictly ascending at index {0}")] UnsortedSchedule(usize),
}

/// Failure of an injected collaborator (market enumerator, decay oracle,
/// reward allocator).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CollaboratorError {
    #[error("unavailable: {0}")] Unavailable(String),
    #[error("invalid response: {0}")] InvalidResponse(String),
}

impl CollaboratorError {
    /// Whether the same call may succeed if attempted again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RewardError {
    #[error(transparent)] Input(#[from] InputError),
    #[error("market enumeration: {0}")] Collaborator(#[from] CollaboratorError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum VestingError {
    #[error(transparent)] Input(#[from] InputError),
    #[error("decay oracle: {0}")] Collaborator(#[from] CollaboratorError),
    #[error("arithmetic overflow")] ArithmeticOverflow,
    #[error("decay released negative amount: F(start)={start}, F(end)={end}")] NonMonotonicDecay { start: u128, end: u128 },
    #[error("predictoor stream {stream} exceeds active amount {active}")] StreamBudgetExceedsActive { stream: u128, active: u128 },
}

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("io: {0}")] Io(#[from] std::io::Error),
    #[error("directory does not exist: {0}")] MissingDir(String),
    #[error("refusing to overwrite {0}")] FileExists(String),
    #[error("bad header: expected {expected:?}, got {got:?}")] BadHeader { expected: String, got: String },
    #[error("malformed row at line {line}: {reason}")] MalformedRow { line: usize, reason: String },
    #[error("duplicate address at line {line}: {address}")] DuplicateAddress { line: usize, address: String },
    #[error(transparent)] Input(#[from] InputError),
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DispenseError {
    #[error("batch size must be positive")] ZeroBatchSize,
    #[error("max attempts must be positive")] ZeroAttempts,
    #[error("batch {number} out of range 1..={batches}")] InvalidBatchNumber { number: usize, batches: usize },
    #[error("approve failed: {0}")] Approval(CollaboratorError),
    #[error("total amount overflow")] AmountOverflow,
    #[error(transparent)] Input(#[from] InputError),
}

#[derive(Error, Debug)]
pub enum DfError {
    #[error(transparent)] Input(#[from] InputError),
    #[error(transparent)] Collaborator(#[from] CollaboratorError),
    #[error(transparent)] Reward(#[from] RewardError),
    #[error(transparent)] Vesting(#[from] VestingError),
    #[error(transparent)] Persistence(#[from] PersistenceError),
    #[error(transparent)] Dispense(#[from] DispenseError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_unavailable_is_retryable() {
        assert!(CollaboratorError::Unavailable("timeout".into()).is_retryable());
        assert!(!CollaboratorError::InvalidResponse("garbage".into()).is_retryable());
    }

    #[test]
    fn input_errors_lift_into_umbrella() {
        let err: DfError = InputError::UnknownStream("passive".into()).into();
        assert_eq!(err.to_string(), "unrecognized stream: \"passive\"");
    }

    #[test]
    fn collaborator_errors_stay_distinguishable_in_reward_error() {
        let err: RewardError = CollaboratorError::Unavailable("subgraph down".into()).into();
        assert!(matches!(err, RewardError::Collaborator(ref e) if e.is_retryable()));
    }
}
