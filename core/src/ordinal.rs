/// English ordinal for a 1-based rank: 1st, 2nd, 3rd, 4th, 11th, 21st, ...
pub fn ordinal(n: usize) -> String {
    let suffix = match (n % 100, n % 10) {
        (11..=13, _) => "th",
        (_, 1) => "st",
        (_, 2) => "nd",
        (_, 3) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// Display label used in result listings, e.g. "2nd Rank".
pub fn rank_label(n: usize) -> String {
    format!("{} Rank", ordinal(n))
}
