use super::weights::RankingConfig;
use crate::StoredListing;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredCandidate {
    pub listing: StoredListing,
    pub score: u32,
    /// Prioritized terms that hit at least one field.
    pub match_count: u32,
}

/// Field-weighted scorer over a fixed set of prioritized terms.
///
/// Matching is case-insensitive substring containment; `"java"` hits
/// `"JavaScript"`. Terms are lowercased once up front.
pub struct FieldScorer {
    terms: Vec<String>,
    config: RankingConfig,
}

impl FieldScorer {
    pub fn new(terms: &[String], config: RankingConfig) -> Self {
        Self {
            terms: terms.iter().map(|term| term.to_lowercase()).collect(),
            config,
        }
    }

    pub fn score(&self, listing: StoredListing) -> ScoredCandidate {
        let title = listing.title.to_lowercase();
        let skills = listing.skills.to_lowercase();
        let detail = listing.detail.to_lowercase();
        let weights = self.config.weights;

        let mut base = 0;
        let mut match_count = 0;

        for term in &self.terms {
            let hits = [
                (title.contains(term.as_str()), weights.title),
                (skills.contains(term.as_str()), weights.skills),
                (detail.contains(term.as_str()), weights.detail),
            ];

            let term_score: u32 = hits.iter().filter(|(hit, _)| *hit).map(|(_, w)| w).sum();
            if hits.iter().any(|(hit, _)| *hit) {
                match_count += 1;
            }
            base += term_score;
        }

        ScoredCandidate {
            listing,
            score: base + match_count * self.config.breadth_bonus,
            match_count,
        }
    }

    /// Inclusive threshold on the final score.
    pub fn is_relevant(&self, candidate: &ScoredCandidate) -> bool {
        candidate.score >= self.config.min_score
    }

    /// Score every candidate and drop the ones under the threshold.
    pub fn score_and_filter(&self, listings: Vec<StoredListing>) -> Vec<ScoredCandidate> {
        listings
            .into_iter()
            .map(|listing| self.score(listing))
            .filter(|candidate| self.is_relevant(candidate))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terms(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    fn listing(title: &str, skills: &str, detail: &str) -> StoredListing {
        StoredListing {
            url: format!("https://example.com/{title}"),
            title: title.into(),
            skills: skills.into(),
            detail: detail.into(),
            source: "siteA".into(),
            ..StoredListing::default()
        }
    }

    #[test]
    fn title_hit_gets_weight_plus_bonus() {
        let scorer = FieldScorer::new(&terms(&["Java"]), RankingConfig::default());
        let scored = scorer.score(listing("Java backend role", "", ""));
        assert_eq!(scored.score, 7);
        assert_eq!(scored.match_count, 1);
        assert!(scorer.is_relevant(&scored));
    }

    #[test]
    fn lone_detail_hit_scores_three_and_is_dropped() {
        let scorer = FieldScorer::new(&terms(&["Java", "Spring", "AWS"]), RankingConfig::default());
        let scored = scorer.score(listing("Backend role", "", "We use Java daily"));
        assert_eq!(scored.score, 3);
        assert!(!scorer.is_relevant(&scored));
    }

    #[test]
    fn threshold_is_inclusive_at_four() {
        let config = RankingConfig {
            breadth_bonus: 3,
            ..RankingConfig::default()
        };
        let scorer = FieldScorer::new(&terms(&["Go"]), config);
        let scored = scorer.score(listing("Backend", "", "Go services"));
        assert_eq!(scored.score, 4);
        assert!(scorer.is_relevant(&scored));
    }

    #[test]
    fn all_three_fields_sum_for_one_term() {
        let scorer = FieldScorer::new(&terms(&["rust"]), RankingConfig::default());
        let scored = scorer.score(listing("Rust engineer", "Rust, Tokio", "Write Rust"));
        assert_eq!(scored.match_count, 1);
        assert_eq!(scored.score, 5 + 3 + 1 + 2);
    }

    #[test]
    fn breadth_bonus_counts_distinct_terms() {
        let scorer = FieldScorer::new(&terms(&["Go", "AWS"]), RankingConfig::default());
        let scored = scorer.score(listing("Platform", "AWS", "Go and Terraform"));
        assert_eq!(scored.match_count, 2);
        assert_eq!(scored.score, 3 + 1 + 2 * 2);
    }

    #[test]
    fn matching_ignores_case_and_word_boundaries() {
        let scorer = FieldScorer::new(&terms(&["java"]), RankingConfig::default());
        let scored = scorer.score(listing("JavaScript frontend", "", ""));
        assert_eq!(scored.score, 7);
    }

    #[test]
    fn duplicate_terms_double_count() {
        let scorer = FieldScorer::new(&terms(&["SQL", "SQL"]), RankingConfig::default());
        let scored = scorer.score(listing("", "PostgreSQL", ""));
        assert_eq!(scored.match_count, 2);
        assert_eq!(scored.score, 3 * 2 + 2 * 2);
    }

    #[test]
    fn non_matching_listing_scores_zero() {
        let scorer = FieldScorer::new(&terms(&["Elixir"]), RankingConfig::default());
        let kept = scorer.score_and_filter(vec![listing("Java", "Spring", "AWS")]);
        assert!(kept.is_empty());
    }
}
