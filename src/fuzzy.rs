//! Approximate string matching behind "did you mean" hints.

/// Default edit distance ceiling for a candidate to qualify.
pub const MAX_DISTANCE: usize = 3;
/// Cap on the number of candidates offered.
pub const MAX_SUGGESTIONS: usize = 3;

/// Levenshtein edit distance between `left` and `right`.
///
/// Iterative two-row form; cost is `O(left * right)` in characters.
pub fn edit_distance(left: &str, right: &str) -> usize {
    let left_chars: Vec<char> = left.chars().collect();
    let right_chars: Vec<char> = right.chars().collect();
    let m = left_chars.len();
    let n = right_chars.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0; n + 1];

    for i in 1..=m {
        curr[0] = i;
        for j in 1..=n {
            let cost = if left_chars[i - 1] == right_chars[j - 1] {
                0
            } else {
                1
            };
            curr[j] = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Nearest candidates to `token` within [`MAX_DISTANCE`], case-insensitively.
///
/// Candidates come back sorted by ascending distance; ties keep their input
/// order, and at most [`MAX_SUGGESTIONS`] survive.
pub fn rank(token: &str, candidates: &[String]) -> Vec<String> {
    rank_within(token, candidates, MAX_DISTANCE)
}

/// [`rank`] with a caller chosen distance ceiling.
pub fn rank_within(token: &str, candidates: &[String], max_distance: usize) -> Vec<String> {
    let needle = token.to_lowercase();
    let mut ranked: Vec<(usize, &String)> = Vec::new();

    for candidate in candidates {
        if ranked.iter().any(|(_, seen)| *seen == candidate) {
            continue;
        }

        let distance = edit_distance(&needle, &candidate.to_lowercase());

        // A distance covering the whole candidate is a rewrite, not a typo.
        if distance <= max_distance && distance < candidate.chars().count() {
            ranked.push((distance, candidate));
        }
    }

    ranked.sort_by_key(|(distance, _)| *distance);
    ranked
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, candidate)| candidate.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "", 0)]
    #[case("", "abc", 3)]
    #[case("abc", "", 3)]
    #[case("abc", "abc", 0)]
    #[case("abc", "abd", 1)]
    #[case("kitten", "sitting", 3)]
    #[case("flaw", "lawn", 2)]
    #[case("--verbose", "--verbose", 0)]
    fn distance(#[case] left: &str, #[case] right: &str, #[case] expected: usize) {
        assert_eq!(edit_distance(left, right), expected);
        assert_eq!(edit_distance(right, left), expected);
    }

    fn pool(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn rank_nearest_first_capped() {
        // Setup
        let candidates = pool(&["--branch", "--brand", "--bran", "--verbose", "--branchy"]);

        // Execute
        let ranked = rank("--branc", &candidates);

        // Verify
        assert_eq!(ranked, pool(&["--branch", "--brand", "--bran"]));
    }

    #[test]
    fn rank_case_insensitive() {
        // Setup
        let candidates = pool(&["--verbose"]);

        // Execute
        let ranked = rank("--VERBOS", &candidates);

        // Verify
        assert_eq!(ranked, pool(&["--verbose"]));
    }

    #[test]
    fn rank_rejects_full_rewrite() {
        // Setup
        let candidates = pool(&["xy"]);

        // Execute
        let ranked = rank("ab", &candidates);

        // Verify
        assert!(ranked.is_empty());
    }

    #[test]
    fn rank_deduplicates() {
        // Setup
        let candidates = pool(&["--force", "--force"]);

        // Execute
        let ranked = rank("--forc", &candidates);

        // Verify
        assert_eq!(ranked, pool(&["--force"]));
    }

    #[test]
    fn rank_within_tightened() {
        // Setup
        let candidates = pool(&["--branch"]);

        // Execute & verify
        assert_eq!(rank_within("--brxxxh", &candidates, 2), pool(&[]));
        assert_eq!(rank_within("--brxxxh", &candidates, 3), pool(&["--branch"]));
    }

    #[test]
    fn rank_empty_token_yields_nothing() {
        // Setup
        let candidates = pool(&["-v", "-q"]);

        // Execute
        let ranked = rank("", &candidates);

        // Verify
        assert!(ranked.is_empty());
    }
}
