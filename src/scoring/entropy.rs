use std::collections::HashMap;

/// Shannon entropy (base 2) of the character distribution of `text`.
///
/// High values point at identifiers and hashes rather than words.
pub fn entropy(text: &str) -> f64 {
    let mut counts: HashMap<char, usize> = HashMap::new();
    let mut total = 0usize;
    for c in text.chars() {
        *counts.entry(c).or_default() += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    let n = total as f64;
    let sum: f64 = counts
        .values()
        .map(|&count| {
            let p = count as f64 / n;
            p * p.log2()
        })
        .sum();
    // -0.0 for single-symbol strings
    (-sum).max(0.0)
}
