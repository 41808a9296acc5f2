//! Text normalization and fuzzy scoring.
//!
//! Tokens are lowercase and split on whitespace and punctuation, except that
//! interior underscores and commas survive: entity ids stay whole and offer
//! lists such as `100lum,50umb` stay one token.

use std::collections::BTreeMap;

/// Matched query token at one position.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchedToken {
    pub token: String,
    pub score: f64,
}

/// token index -> matched token.
pub type MatchedTokenPositions = BTreeMap<usize, MatchedToken>;

/// entity or vocabulary key -> matched token positions.
pub type TokenPositions = BTreeMap<String, MatchedTokenPositions>;

pub fn tokenize(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == ','))
        .map(|token| token.trim_matches(','))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FuzzyScore {
    pub is_match: bool,
    pub score: usize,
    pub normalized_score: f64,
}

/// Edit-distance budget scaled to the document word. Short documents must
/// match exactly, so "gan" never retrieves "gandalf".
pub fn max_edit_distance(document: &str) -> usize {
    let len = document.chars().count();
    if len <= 3 {
        0
    } else if len <= 4 {
        1
    } else if len <= 7 {
        2
    } else {
        3
    }
}

/// Banded Levenshtein with early termination once the budget is provably
/// blown. A pruned exit reports normalized score 0.
pub fn fuzzy_match(a: &str, b: &str, max_errors: usize) -> FuzzyScore {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let m = a.len();
    let n = b.len();

    if m == 0 {
        return FuzzyScore {
            is_match: n <= max_errors,
            score: n,
            normalized_score: if n == 0 { 1.0 } else { 0.0 },
        };
    }
    if n == 0 {
        return FuzzyScore {
            is_match: m <= max_errors,
            score: m,
            normalized_score: 0.0,
        };
    }
    let diff = m.abs_diff(n);
    if diff > max_errors {
        return FuzzyScore {
            is_match: false,
            score: diff,
            normalized_score: 0.0,
        };
    }

    let mut dp = vec![vec![0usize; n + 1]; m + 1];
    for (i, row) in dp.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=n {
        dp[0][j] = j;
    }

    for i in 1..=m {
        for j in 1..=n {
            dp[i][j] = if a[i - 1] == b[j - 1] {
                dp[i - 1][j - 1]
            } else {
                1 + dp[i - 1][j].min(dp[i][j - 1]).min(dp[i - 1][j - 1])
            };

            if dp[i][j] > max_errors {
                let remaining = (m - i) + (n - j);
                if dp[i][j] > max_errors + remaining {
                    return FuzzyScore {
                        is_match: false,
                        score: dp[i][j],
                        normalized_score: 0.0,
                    };
                }
            }
        }
    }

    let score = dp[m][n];
    let max_length = m.max(n);
    FuzzyScore {
        is_match: score <= max_errors,
        score,
        normalized_score: 1.0 - score as f64 / max_length as f64,
    }
}

/// Best score of `token` against any document token: 1.0 for an exact match,
/// else the first fuzzy match's normalized score, else 0.
fn token_match_any(token: &str, documents: &[String]) -> f64 {
    if documents.iter().any(|document| document == token) {
        return 1.0;
    }
    for document in documents {
        let result = fuzzy_match(token, document, max_edit_distance(document));
        if result.is_match {
            return result.normalized_score;
        }
    }
    0.0
}

/// Mean best-token score of the query against the document's words, capped
/// at 1.0. Records every query position whose token score clears 0.5.
pub fn document_score(query_tokens: &[String], document: &str) -> (MatchedTokenPositions, f64) {
    let document_tokens = tokenize(document);
    let denominator = document_tokens.len();
    let mut matched = MatchedTokenPositions::new();

    if denominator == 0 {
        return (matched, 0.0);
    }

    let mut numerator = 0.0;
    for (position, token) in query_tokens.iter().enumerate() {
        let token_score = token_match_any(token, &document_tokens);
        if token_score > 0.5 {
            matched.insert(
                position,
                MatchedToken {
                    token: token.clone(),
                    score: token_score,
                },
            );
        }
        numerator += token_score;
        if numerator >= denominator as f64 {
            return (matched, 1.0);
        }
    }
    (matched, numerator / denominator as f64)
}

/// Highest document score over several documents.
pub fn documents_score(query_tokens: &[String], documents: &[String]) -> (MatchedTokenPositions, f64) {
    let mut best = (MatchedTokenPositions::new(), 0.0);
    for document in documents {
        let result = document_score(query_tokens, document);
        if result.1 > best.1 {
            best = result;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(query: &str) -> Vec<String> {
        tokenize(query)
    }

    #[test]
    fn tokenize_is_deterministic_and_idempotent() {
        assert_eq!(tokenize("greet inn keeper"), vec!["greet", "inn", "keeper"]);
        assert_eq!(tokenize("greet  Inn-Keeper"), vec!["greet", "inn", "keeper"]);
        let once = tokenize("Take Item_WoodenClub_1!");
        assert_eq!(once, vec!["take", "item_woodenclub_1"]);
        let again = tokenize(&once.join(" "));
        assert_eq!(again, once);
    }

    #[test]
    fn tokenize_keeps_offer_lists_whole() {
        assert_eq!(
            tokenize("trade 100lum,50umb for item_sword_1"),
            vec!["trade", "100lum,50umb", "for", "item_sword_1"]
        );
        assert_eq!(tokenize("hello,"), vec!["hello"]);
    }

    #[test]
    fn identical_strings_are_perfect() {
        let result = fuzzy_match("gandalf", "gandalf", 1);
        assert!(result.is_match);
        assert_eq!(result.score, 0);
        assert!((result.normalized_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn bandage_is_not_gandalf_at_one_error() {
        let result = fuzzy_match("bandage", "gandalf", 1);
        assert!(!result.is_match);
        assert_eq!(result.score, 3);
    }

    #[test]
    fn bandage_matches_gandalf_at_three_errors() {
        let result = fuzzy_match("bandage", "gandalf", 3);
        assert!(result.is_match);
        assert_eq!(result.score, 3);
        assert!((result.normalized_score - (1.0 - 3.0 / 7.0)).abs() < 1e-9);
    }

    #[test]
    fn length_difference_beyond_budget_short_circuits() {
        let result = fuzzy_match("gan", "gandalf", 2);
        assert!(!result.is_match);
        assert_eq!(result.score, 4);
    }

    #[test]
    fn edit_budget_scales_with_document_length() {
        assert_eq!(max_edit_distance("gan"), 0);
        assert_eq!(max_edit_distance("door"), 1);
        assert_eq!(max_edit_distance("gandalf"), 2);
        assert_eq!(max_edit_distance("woodenclub"), 3);
    }

    #[test]
    fn document_score_caps_at_one() {
        let (matched, score) = document_score(&tokens("gandalf the grey"), "gandalf");
        assert!((score - 1.0).abs() < 1e-9);
        assert_eq!(matched.get(&0).expect("position 0").token, "gandalf");
    }

    #[test]
    fn short_query_never_matches_long_document() {
        let (_, score) = document_score(&tokens("gan"), "gandalf");
        assert!(score < 1e-9);
    }

    #[test]
    fn typo_still_scores_above_threshold() {
        let (matched, score) = document_score(&tokens("gandaf"), "gandalf");
        assert!(score > 0.6);
        assert!(matched.get(&0).expect("position 0").score > 0.5);
    }

    #[test]
    fn documents_score_takes_the_best() {
        let documents = vec!["woodenclub".to_string(), "Wooden Club".to_string()];
        let (_, score) = documents_score(&tokens("woodenclub"), &documents);
        assert!((score - 1.0).abs() < 1e-9);
    }
}
