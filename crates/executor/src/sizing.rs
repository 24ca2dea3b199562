use rust_decimal::Decimal;

/// Truncates `quantity` to the largest multiple of `step_size` that does not
/// exceed it, rounding toward zero. Never rounds up, so a normalized order
/// can never spend more than the caller asked for.
///
/// A missing or non-positive step size leaves the quantity unchanged.
pub fn normalize_quantity(quantity: Decimal, step_size: Option<Decimal>) -> Decimal {
    match step_size {
        Some(step) if step > Decimal::ZERO => (quantity / step).floor() * step,
        _ => quantity,
    }
}
