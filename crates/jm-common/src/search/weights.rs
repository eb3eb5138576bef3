/// Per-field weights for a single skill term hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldWeights {
    pub title: u32,
    pub skills: u32,
    pub detail: u32,
}

/// Title hits dominate, the skill summary is secondary, body text is a weak signal.
pub const PRIORITY_FIELD_WEIGHTS: FieldWeights = FieldWeights {
    title: 5,
    skills: 3,
    detail: 1,
};

pub const MAX_PRIORITY_SKILLS: usize = 3;
pub const BREADTH_BONUS: u32 = 2;
pub const MIN_RELEVANCE_SCORE: u32 = 4;
pub const PER_SOURCE_CAP: usize = 3;
pub const RESULT_CAP: usize = 8;

pub const EQUAL_DISTRIBUTION_PER_SOURCE_CAP: usize = 4;
pub const EQUAL_DISTRIBUTION_RESULT_CAP: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankingConfig {
    pub weights: FieldWeights,
    /// Added once per distinct prioritized skill that hits any field.
    pub breadth_bonus: u32,
    /// Inclusive lower bound on the final score.
    pub min_score: u32,
    pub max_priority_skills: usize,
    pub per_source_cap: usize,
    pub result_cap: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            weights: PRIORITY_FIELD_WEIGHTS,
            breadth_bonus: BREADTH_BONUS,
            min_score: MIN_RELEVANCE_SCORE,
            max_priority_skills: MAX_PRIORITY_SKILLS,
            per_source_cap: PER_SOURCE_CAP,
            result_cap: RESULT_CAP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EqualDistributionConfig {
    pub per_source_cap: usize,
    pub result_cap: usize,
}

impl Default for EqualDistributionConfig {
    fn default() -> Self {
        Self {
            per_source_cap: EQUAL_DISTRIBUTION_PER_SOURCE_CAP,
            result_cap: EQUAL_DISTRIBUTION_RESULT_CAP,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_full_field_hit_clears_threshold() {
        let config = RankingConfig::default();
        assert_eq!(
            config.weights,
            FieldWeights {
                title: 5,
                skills: 3,
                detail: 1
            }
        );
        assert!(config.weights.detail + config.breadth_bonus < config.min_score);
        assert!(config.weights.skills + config.breadth_bonus >= config.min_score);
    }

    #[test]
    fn caps_bound_the_result() {
        let config = RankingConfig::default();
        assert!(config.per_source_cap <= config.result_cap);

        let legacy = EqualDistributionConfig::default();
        assert_eq!((legacy.per_source_cap, legacy.result_cap), (4, 12));
    }
}
