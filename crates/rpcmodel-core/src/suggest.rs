//! Closest-match suggestions for misspelled field names.

/// Maximum number of suggestions attached to an error.
const MAX_SUGGESTIONS: usize = 3;

/// Minimum similarity (1 - distance / longer length) for a candidate to be
/// suggested at all.
const SIMILARITY_CUTOFF: f64 = 0.6;

/// Return the candidates closest to `target`, best first.
///
/// Candidates within the similarity cutoff are ranked by edit distance,
/// ties broken alphabetically, and capped at [`MAX_SUGGESTIONS`]. Matching
/// is case-sensitive; remote field names are expected to be lower-case.
pub fn closest_matches<'a, I>(target: &str, candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let target_chars: Vec<char> = target.chars().collect();
    let mut scored: Vec<(usize, String)> = Vec::new();

    for candidate in candidates {
        let candidate_len = candidate.chars().count();
        let longer = candidate_len.max(target_chars.len());
        if longer == 0 {
            continue;
        }
        // A distance above this bound would fall below the cutoff.
        let max_dist = (longer as f64 * (1.0 - SIMILARITY_CUTOFF)).floor() as usize;
        let dist = bounded_edit_distance(candidate, &target_chars, max_dist);
        if dist <= max_dist {
            scored.push((dist, candidate.to_string()));
        }
    }

    scored.sort();
    scored.truncate(MAX_SUGGESTIONS);
    scored.into_iter().map(|(_, name)| name).collect()
}

/// Levenshtein distance with an early-exit cap.
///
/// Returns the true distance when it is at most `max_dist`, otherwise
/// `max_dist + 1`. Two-row dynamic programming; the row minimum is tracked
/// so hopeless candidates bail out early.
fn bounded_edit_distance(value: &str, target: &[char], max_dist: usize) -> usize {
    let n = target.len();
    if n == 0 {
        return value.chars().count().min(max_dist + 1);
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr: Vec<usize> = vec![0; n + 1];

    for (i, c) in value.chars().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];

        for j in 1..=n {
            let cost = usize::from(c != target[j - 1]);
            let d = (prev[j] + 1)
                .min(curr[j - 1] + 1)
                .min(prev[j - 1] + cost);
            curr[j] = d;
            row_min = row_min.min(d);
        }

        if row_min > max_dist {
            return max_dist + 1;
        }

        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n].min(max_dist + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_match_comes_first() {
        let matches = closest_matches("name", ["name", "named", "game"]);
        assert_eq!(matches[0], "name");
    }

    #[test]
    fn near_miss_is_suggested() {
        let matches = closest_matches("custmer", ["customer", "amount", "state"]);
        assert_eq!(matches, vec!["customer"]);
    }

    #[test]
    fn unrelated_names_are_filtered() {
        let matches = closest_matches("zzzzz", ["customer", "amount", "state"]);
        assert!(matches.is_empty());
    }

    #[test]
    fn capped_at_three() {
        let matches = closest_matches("nam", ["name", "nam", "nams", "namo", "naml"]);
        assert_eq!(matches.len(), 3);
        assert_eq!(matches[0], "nam");
    }

    #[test]
    fn distance_cap_short_circuits() {
        let target: Vec<char> = "abcdef".chars().collect();
        assert_eq!(bounded_edit_distance("abcdef", &target, 2), 0);
        assert_eq!(bounded_edit_distance("abcdxf", &target, 2), 1);
        assert_eq!(bounded_edit_distance("zzzzzz", &target, 2), 3);
    }
}
