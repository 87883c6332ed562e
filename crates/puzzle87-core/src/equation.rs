/// Number of digits in a candidate.
pub const DIGITS: usize = 9;

/// The value the equation must produce.
pub const TARGET: f64 = 87.0;

/// Evaluates `n1 + 13*n2/n3 + n4 + 12*n5 - n6 + (n7*n8)/n9` in double precision.
/// Returns `None` unless `numbers` holds exactly `DIGITS` values.
pub fn evaluate(numbers: &[i32]) -> Option<f64> {
    let &[n1, n2, n3, n4, n5, n6, n7, n8, n9] = numbers else {
        return None;
    };

    // Left-associative, in this exact grouping. Reordering changes which candidates round to 87.
    let result = f64::from(n1) + 13.0 * f64::from(n2) / f64::from(n3) + f64::from(n4)
        + f64::from(12i32.wrapping_mul(n5)) - f64::from(n6)
        + f64::from(n7.wrapping_mul(n8)) / f64::from(n9);
    Some(result)
}

/// The shortest decimal string that round-trips to `value`.
pub fn canonical_decimal(value: f64) -> String {
    format!("{:?}", value)
}

/// Whether `numbers` is a solution: the result must normalize to the same decimal as `TARGET`.
/// Distinct doubles never share a `canonical_decimal` form, so this is plain equality with
/// `TARGET` and no formatting happens per call. A zero divisor produces an infinity or NaN,
/// which never matches.
pub fn is_valid(numbers: &[i32]) -> bool {
    evaluate(numbers) == Some(TARGET)
}
