use super::{
    diversify::{assemble, cap_per_source, diversify_scored, recency_order, relevance_order},
    prioritizer::{prioritize_skills, structured_skill_terms},
    scoring::FieldScorer,
    weights::{EqualDistributionConfig, RankingConfig},
};
use crate::{SkillProfile, StoredListing};

/// How a search turns a skill profile into search terms and ranks the
/// candidates the store returns for them.
pub trait RankingStrategy: Sync {
    fn name(&self) -> &'static str;

    /// Terms sent to the candidate query. Empty means "no search".
    fn search_terms(&self, profile: &SkillProfile) -> Vec<String>;

    fn rank(&self, terms: &[String], candidates: Vec<StoredListing>) -> Vec<StoredListing>;
}

/// Weighted key-skill ranking with per-source diversification.
#[derive(Debug, Clone, Default)]
pub struct PriorityRanking {
    config: RankingConfig,
}

impl PriorityRanking {
    pub fn new(config: RankingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }
}

impl RankingStrategy for PriorityRanking {
    fn name(&self) -> &'static str {
        "priority"
    }

    fn search_terms(&self, profile: &SkillProfile) -> Vec<String> {
        prioritize_skills(profile, self.config.max_priority_skills)
    }

    fn rank(&self, terms: &[String], candidates: Vec<StoredListing>) -> Vec<StoredListing> {
        let scorer = FieldScorer::new(terms, self.config);
        let relevant = scorer.score_and_filter(candidates);
        let diversified = diversify_scored(relevant, self.config.per_source_cap);

        assemble(diversified, relevance_order, self.config.result_cap)
            .into_iter()
            .map(|candidate| candidate.listing)
            .collect()
    }
}

/// Unweighted variant kept for older clients: every structured skill counts
/// the same, results are ordered by recency only.
#[derive(Debug, Clone, Default)]
pub struct EqualDistributionRanking {
    config: EqualDistributionConfig,
}

impl EqualDistributionRanking {
    pub fn new(config: EqualDistributionConfig) -> Self {
        Self { config }
    }
}

impl RankingStrategy for EqualDistributionRanking {
    fn name(&self) -> &'static str {
        "equal_distribution"
    }

    fn search_terms(&self, profile: &SkillProfile) -> Vec<String> {
        structured_skill_terms(profile)
    }

    fn rank(&self, _terms: &[String], candidates: Vec<StoredListing>) -> Vec<StoredListing> {
        let capped = cap_per_source(
            candidates,
            |listing| listing.source.as_str(),
            recency_order,
            self.config.per_source_cap,
        );
        assemble(capped, recency_order, self.config.result_cap)
    }
}
