use super::*;
use crate::dataset::Dataset;
use crate::matching::MatchKind;

fn youth_dataset() -> Dataset {
    let csv = "\
title,description,funder,amount,award_date
Youth Climate Fund,Supporting youth climate action,Green Trust,5000,2022-03-01
Elderly Care Grant,Community care for older people,Care Foundation,3000,2021-07-15
Youth Sports Grant,Local youth sports clubs,Sport England,7000,2022-11-30
";
    Dataset::load_reader(csv.as_bytes()).expect("load")
}

#[test]
fn test_exact_blob_match_scores_maximum() {
    assert_eq!(score_text("Youth Climate Fund", "Youth Climate Fund"), MAX_SCORE);
    assert_eq!(score_text("youth climate fund", "Youth Climate Fund"), MAX_SCORE);
}

#[test]
fn test_youth_query_ranks_youth_grants_above_threshold() {
    let dataset = youth_dataset();
    let candidates: Vec<_> = dataset.records().iter().collect();
    let matcher = LexicalMatcher::default();

    let results = matcher.score("youth", &candidates);

    let ids: Vec<u64> = results.iter().map(|m| m.record_id).collect();
    assert!(ids.contains(&0), "Youth Climate Fund must match");
    assert!(ids.contains(&2), "Youth Sports Grant must match");
    assert!(!ids.contains(&1), "Elderly Care Grant must be excluded");
    assert!(results.iter().all(|m| m.kind == MatchKind::Lexical));
    assert!(results.iter().all(|m| m.score > DEFAULT_THRESHOLD));
}

#[test]
fn test_ties_broken_by_title_ascending() {
    let dataset = youth_dataset();
    let candidates: Vec<_> = dataset.records().iter().collect();
    let matcher = LexicalMatcher::default();

    // "youth" hits an exact token in records 0 and 2, so both score
    // identically and order must fall back to title.
    let results = matcher.score("youth", &candidates);
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].score, results[1].score);
    assert_eq!(results[0].record_id, 0); // "Youth Climate Fund" < "Youth Sports Grant"
    assert_eq!(results[1].record_id, 2);
}

#[test]
fn test_misspelled_query_still_matches() {
    let score = score_text("yooth", "Youth Climate Fund. Supporting youth climate action");
    assert!(score > DEFAULT_THRESHOLD, "got {score}");
}

#[test]
fn test_unrelated_query_scores_low() {
    let score = score_text("quantum", "Elderly Care Grant. Community care for older people");
    assert!(score <= DEFAULT_THRESHOLD, "got {score}");
}

#[test]
fn test_empty_query_yields_no_matches() {
    let dataset = youth_dataset();
    let candidates: Vec<_> = dataset.records().iter().collect();
    let matcher = LexicalMatcher::default();
    assert!(matcher.score("", &candidates).is_empty());
    assert!(matcher.score("   ", &candidates).is_empty());
}

#[test]
fn test_threshold_is_strict() {
    // A matcher with threshold 100 rejects even exact matches, since
    // acceptance requires strictly greater.
    let dataset = youth_dataset();
    let candidates: Vec<_> = dataset.records().iter().collect();
    let matcher = LexicalMatcher::new(MAX_SCORE);
    assert!(matcher.score("Youth Climate Fund", &candidates).is_empty());

    let permissive = LexicalMatcher::new(0.0);
    let results = permissive.score("youth", &candidates);
    assert_eq!(results.len(), 3);
    assert_eq!(results.last().map(|m| m.record_id), Some(1));
}

#[test]
fn test_word_order_does_not_matter() {
    let a = score_text("climate youth", "Youth Climate Fund");
    let b = score_text("youth climate", "Youth Climate Fund");
    assert_eq!(a, b);
    assert!(a > DEFAULT_THRESHOLD);
}
