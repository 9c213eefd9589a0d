use {
    alloy_primitives::{U256, utils::format_units},
    anyhow::{Context, Result, ensure},
};

/// Returns `10^decimals` as a [`U256`].
pub fn exp10(decimals: u8) -> Result<U256> {
    U256::from(10)
        .checked_pow(U256::from(decimals))
        .with_context(|| format!("10^{decimals} overflows u256"))
}

/// Converts a notional token amount into base units.
///
/// Fractional notional amounts are floored first, so `1000.9` of a token with
/// 6 decimals becomes `1_000_000_000`.
pub fn to_base_units(amount: f64, decimals: u8) -> Result<U256> {
    ensure!(
        amount.is_finite() && amount >= 0.,
        "amount {amount} is not a finite non-negative number"
    );
    let whole = amount.floor();
    ensure!(whole < u128::MAX as f64, "amount {amount} is too large");
    // Truncation is exact here since `whole` has no fractional part and is in
    // range.
    let whole = U256::from(whole as u128);
    whole
        .checked_mul(exp10(decimals)?)
        .with_context(|| format!("{amount} with {decimals} decimals overflows u256"))
}

/// Converts an amount of base units into a human-scaled number using the
/// token's decimals.
pub fn to_human_units(amount: U256, decimals: u8) -> Result<f64> {
    let formatted = format_units(amount, decimals)
        .with_context(|| format!("cannot format {amount} with {decimals} decimals"))?;
    formatted
        .parse::<f64>()
        .with_context(|| format!("formatted amount {formatted:?} is not a float"))
}
