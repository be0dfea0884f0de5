use ethers::types::U256;
use ethers::utils::{format_ether, parse_ether};

/// Both tokens are assumed to carry 18 decimals. The synchronizer cross-checks
/// this against the contracts at session establishment.
pub const DECIMALS: u8 = 18;

pub fn wad() -> U256 {
    U256::exp10(DECIMALS as usize)
}

/// Parses a user-entered decimal amount into its WAD-scaled representation.
/// Malformed, empty, negative and zero inputs all return None.
pub fn parse_amount(input: &str) -> Option<U256> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        return None;
    }
    let parsed = parse_ether(trimmed).ok()?;
    (!parsed.is_zero()).then_some(parsed)
}

/// Formats a WAD-scaled amount for display, without trailing zeros.
pub fn format_amount(amount: U256) -> String {
    let raw = format_ether(amount);
    let trimmed = raw.trim_end_matches('0').trim_end_matches('.');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Expected RWD output for a GRN input at the given WAD-scaled rate. Overflow
/// yields None so callers can fail the amount instead of wrapping.
pub fn expected_output(amount_in: U256, rate: U256) -> Option<U256> {
    amount_in.checked_mul(rate).map(|v| v / wad())
}
