use crate::error::TreeclustError;

use super::{partition, scorer, FitRule, ScoreRule, StubEvaluator};

#[test]
fn score_is_a_pure_function_of_membership() {
    let mut s = scorer(
        &[2, 3, 4],
        StubEvaluator::new(FitRule::OwnTaxon, ScoreRule::WidthSquared),
    );
    let p = partition(&[1, 1, 2]);
    let first = s.score(&p, false).unwrap();
    let cached = s.cached_artifacts();
    let second = s.score(&p, false).unwrap();
    assert_eq!(first, second);
    // second call hit the cache for every cluster
    assert_eq!(s.cached_artifacts(), cached);
}

#[test]
fn artifact_cache_keys_ignore_member_order() {
    let mut s = scorer(
        &[2, 3, 4],
        StubEvaluator::new(FitRule::OwnTaxon, ScoreRule::Width),
    );
    let a = s.artifact(&[2, 0]).unwrap().score;
    let before = s.cached_artifacts();
    let b = s.artifact(&[0, 2]).unwrap().score;
    assert_eq!(a, b);
    assert_eq!(s.cached_artifacts(), before);
}

#[test]
fn history_records_only_when_asked() {
    let mut s = scorer(
        &[1, 1, 1],
        StubEvaluator::new(FitRule::OwnTaxon, ScoreRule::Width),
    );
    let p = partition(&[1, 2, 2]);
    s.score(&p, false).unwrap();
    assert!(s.history().is_empty());
    s.score(&p, true).unwrap();
    s.score(&p, true).unwrap();
    assert_eq!(s.history().len(), 2);
    // MockClock ticks per read, so timestamps strictly increase
    assert!(s.history()[0].cpu_time < s.history()[1].cpu_time);
    assert_eq!(s.history()[0].partition, p);
}

#[test]
fn wrong_length_partition_is_rejected() {
    let mut s = scorer(
        &[1, 1, 1],
        StubEvaluator::new(FitRule::OwnTaxon, ScoreRule::Width),
    );
    let err = s.score(&partition(&[1, 2]), false).unwrap_err();
    assert!(matches!(err, TreeclustError::InvalidPartition(_)));
}

#[test]
fn cluster_density_normalises_by_sequence_length() {
    let mut s = scorer(
        &[2, 3],
        StubEvaluator::new(FitRule::OwnTaxon, ScoreRule::WidthSquared),
    );
    // members {0,1}: width 5, score 25, density 5
    let d = s.cluster_density(&[0, 1]).unwrap();
    assert!((d - 5.0).abs() < 1e-12);
}
