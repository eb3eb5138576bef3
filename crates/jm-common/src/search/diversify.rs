use std::{cmp::Ordering, collections::BTreeMap};

use super::scoring::ScoredCandidate;
use crate::StoredListing;

/// `(score desc, match_count desc, posted_at desc)`, then `url` asc so that
/// full ties always land in the same order.
pub fn relevance_order(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.match_count.cmp(&a.match_count))
        .then_with(|| recency_order(&a.listing, &b.listing))
}

/// `(posted_at desc, url asc)`.
pub fn recency_order(a: &StoredListing, b: &StoredListing) -> Ordering {
    b.posted_at
        .cmp(&a.posted_at)
        .then_with(|| a.url.cmp(&b.url))
}

/// Keep at most `cap` items per source, each partition ranked by `order`.
///
/// Partitions are emitted in source-name order; callers re-sort globally.
pub fn cap_per_source<T, K, C>(items: Vec<T>, source_of: K, order: C, cap: usize) -> Vec<T>
where
    K: Fn(&T) -> &str,
    C: Fn(&T, &T) -> Ordering,
{
    let mut partitions: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for item in items {
        partitions
            .entry(source_of(&item).to_string())
            .or_default()
            .push(item);
    }

    partitions
        .into_values()
        .flat_map(|mut partition| {
            partition.sort_by(&order);
            partition.truncate(cap);
            partition
        })
        .collect()
}

/// Global re-sort of the diversified survivors, truncated to `limit`.
pub fn assemble<T, C>(mut survivors: Vec<T>, order: C, limit: usize) -> Vec<T>
where
    C: Fn(&T, &T) -> Ordering,
{
    survivors.sort_by(order);
    survivors.truncate(limit);
    survivors
}

pub fn diversify_scored(candidates: Vec<ScoredCandidate>, per_source: usize) -> Vec<ScoredCandidate> {
    cap_per_source(
        candidates,
        |candidate| candidate.listing.source.as_str(),
        relevance_order,
        per_source,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn candidate(url: &str, source: &str, score: u32, match_count: u32, age_days: i64) -> ScoredCandidate {
        let base = Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap();
        ScoredCandidate {
            listing: StoredListing {
                url: url.into(),
                source: source.into(),
                posted_at: base - Duration::days(age_days),
                ..StoredListing::default()
            },
            score,
            match_count,
        }
    }

    fn urls(candidates: &[ScoredCandidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.listing.url.as_str()).collect()
    }

    #[test]
    fn single_source_keeps_top_three_by_score() {
        let candidates = vec![
            candidate("a", "siteA", 5, 1, 0),
            candidate("b", "siteA", 11, 1, 0),
            candidate("c", "siteA", 7, 1, 0),
            candidate("d", "siteA", 20, 2, 0),
            candidate("e", "siteA", 9, 1, 0),
        ];

        let kept = diversify_scored(candidates, 3);
        let ranked = assemble(kept, relevance_order, 8);
        assert_eq!(urls(&ranked), vec!["d", "b", "e"]);
    }

    #[test]
    fn ties_break_on_match_count_then_recency_then_url() {
        let mut candidates = vec![
            candidate("z", "siteA", 9, 1, 0),
            candidate("y", "siteA", 9, 2, 3),
            candidate("x", "siteA", 9, 1, 1),
            candidate("w", "siteA", 9, 1, 0),
        ];
        candidates.sort_by(relevance_order);
        assert_eq!(urls(&candidates), vec!["y", "w", "z", "x"]);
    }

    #[test]
    fn cap_applies_per_source_before_global_cut() {
        let mut candidates = Vec::new();
        for (i, source) in ["siteA", "siteB", "siteC", "siteD"].iter().enumerate() {
            for j in 0..5u32 {
                candidates.push(candidate(
                    &format!("{source}-{j}"),
                    source,
                    30 - (i as u32) - j * 4,
                    1,
                    0,
                ));
            }
        }

        let kept = diversify_scored(candidates, 3);
        assert_eq!(kept.len(), 12);

        let ranked = assemble(kept, relevance_order, 8);
        assert_eq!(ranked.len(), 8);
        for source in ["siteA", "siteB", "siteC", "siteD"] {
            let per_source = ranked.iter().filter(|c| c.listing.source == source).count();
            assert!(per_source <= 3);
        }
        assert!(ranked.windows(2).all(|w| relevance_order(&w[0], &w[1]) != Ordering::Greater));
    }

    #[test]
    fn resorting_ranked_output_is_a_no_op() {
        let candidates = vec![
            candidate("a", "siteA", 7, 1, 2),
            candidate("b", "siteB", 7, 1, 1),
            candidate("c", "siteC", 12, 2, 5),
            candidate("d", "siteA", 7, 1, 1),
        ];
        let ranked = assemble(diversify_scored(candidates, 3), relevance_order, 8);
        let resorted = assemble(ranked.clone(), relevance_order, 8);
        assert_eq!(ranked, resorted);
    }

    #[test]
    fn recency_order_prefers_newer_listings() {
        let older = candidate("a", "siteA", 0, 0, 3).listing;
        let newer = candidate("b", "siteA", 0, 0, 1).listing;
        assert_eq!(recency_order(&newer, &older), Ordering::Less);
    }
}
