// Constants for demand planning

/// Upper bound on planned slots; a plan that would exceed it is truncated and
/// continues in manual entry
pub const MAX_PLAN_SLOTS: usize = 1_000;

/// Prompt used when no literal prompt text is found; followed by the 1-based
/// site number
pub const PLACEHOLDER_PREFIX: &str = "Enter value";

/// Prompt shown in manual entry; followed by the 1-based value number
pub const MANUAL_PREFIX: &str = "Value";
