/// Index of the maximum value, breaking ties on the first index reached.
/// Returns 0 for an empty slice. `NaN` entries never win: any number
/// displaces a `NaN` occupying the running maximum.
pub fn max_index(values: &[f64]) -> usize {
    let mut max = 0;
    for i in 1..values.len() {
        if values[max].is_nan() || values[i] > values[max] {
            max = i;
        }
    }
    max
}
