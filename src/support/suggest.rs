//! "Did you mean?" suggestions for misspelled token, modifier, and
//! context names.

/// Levenshtein edit distance between two strings.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let m = a_chars.len();
    let n = b_chars.len();

    let mut dp = vec![vec![0usize; n + 1]; m + 1];

    for (i, row) in dp.iter_mut().enumerate().take(m + 1) {
        row[0] = i;
    }
    for (j, cell) in dp[0].iter_mut().enumerate().take(n + 1) {
        *cell = j;
    }

    for i in 1..=m {
        for j in 1..=n {
            let cost = usize::from(a_chars[i - 1] != b_chars[j - 1]);
            dp[i][j] = (dp[i - 1][j] + 1)
                .min(dp[i][j - 1] + 1)
                .min(dp[i - 1][j - 1] + cost);
        }
    }

    dp[m][n]
}

/// The edit-distance threshold for a target name: at least 2, scaling up
/// for longer names.
fn threshold(target: &str) -> usize {
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let scaled = (0.4 * target.chars().count() as f64).ceil() as usize;
    scaled.max(2)
}

/// The closest candidate names to `target`, best first.
///
/// Distances are measured case-insensitively, exact matches are
/// excluded (the caller already knows the name exists), and at most
/// three are returned, ordered by distance with the name itself as
/// tie-break.
pub fn closest_matches<'a, I>(target: &str, candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let max = threshold(target);
    let target_lower = target.to_lowercase();
    let mut scored: Vec<(usize, &str)> = candidates
        .into_iter()
        .filter_map(|c| {
            let d = levenshtein(&target_lower, &c.to_lowercase());
            (c != target && d <= max).then_some((d, c))
        })
        .collect();
    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    scored.into_iter().take(3).map(|(_, c)| c.to_string()).collect()
}

/// Format a "did you mean" hint for error messages, or an empty string
/// when nothing is close enough.
pub fn did_you_mean<'a, I>(target: &str, candidates: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let matches = closest_matches(target, candidates);
    let Some(best) = matches.first() else {
        return String::new();
    };
    let mut hint = format!("Did you mean \"{best}\"?");
    if matches.len() > 1 {
        let rest: Vec<String> = matches[1..].iter().map(|m| format!("\"{m}\"")).collect();
        hint.push_str(&format!(" Other close matches: {}", rest.join(", ")));
    }
    hint
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_basics() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("same", "same"), 0);
        assert_eq!(levenshtein("", "abc"), 3);
    }

    #[test]
    fn finds_close_match() {
        let candidates = ["color.brand.primary", "color.brand.secondary", "spacing.sm"];
        let matches = closest_matches("color.brnd.primary", candidates);
        assert_eq!(matches[0], "color.brand.primary");
    }

    #[test]
    fn hint_quotes_best_match() {
        let hint = did_you_mean("color.brnd.primary", ["color.brand.primary"]);
        assert_eq!(hint, "Did you mean \"color.brand.primary\"?");
    }

    #[test]
    fn exact_match_is_not_a_suggestion() {
        assert!(closest_matches("theme", ["theme"]).is_empty());
    }

    #[test]
    fn distant_names_yield_nothing() {
        assert_eq!(did_you_mean("xyz", ["color.brand.primary"]), "");
    }

    #[test]
    fn at_most_three_suggestions() {
        let candidates = ["them", "thee", "teme", "heme", "therm"];
        assert_eq!(closest_matches("theme", candidates).len(), 3);
    }
}
