use super::*;
use crate::filter::YearRange;

fn youth_csv() -> &'static str {
    "\
title,description,funder,amount,award_date
Youth Climate Fund,Supporting youth climate action,Green Trust,5000,2022-03-01
Elderly Care Grant,Community care for older people,Care Foundation,3000,2021-07-15
Youth Sports Grant,Local youth sports clubs,Sport England,7000,2022-11-30
"
}

fn youth_dataset() -> Dataset {
    Dataset::load_reader(youth_csv().as_bytes()).expect("load")
}

fn stub_pipeline() -> RankingPipeline {
    RankingPipeline::new_stub(Config::default())
}

fn unavailable_pipeline() -> RankingPipeline {
    let config = Config {
        model_dir: Some("/nonexistent/model/dir".into()),
        ..Default::default()
    };
    RankingPipeline::new(config)
}

#[test]
fn test_lexical_youth_scenario() {
    let dataset = youth_dataset();
    let pipeline = stub_pipeline();
    let request = QueryRequest::new("youth").with_strategy(Strategy::Lexical);

    let retrieval = pipeline.retrieve(&dataset, &request);

    assert_eq!(retrieval.rows_dropped_for_bad_date, 0);
    assert_eq!(retrieval.total_candidates, 3);
    assert_eq!(retrieval.matches_returned, 2);
    assert!(retrieval.semantic_fallback.is_none());
    assert!(retrieval.empty_reason.is_none());

    let titles: Vec<&str> = retrieval
        .results
        .iter()
        .map(|r| r.record.title())
        .collect();
    assert_eq!(titles, vec!["Youth Climate Fund", "Youth Sports Grant"]);
    assert!(retrieval
        .results
        .iter()
        .all(|r| r.kind == Some(MatchKind::Lexical)));
}

#[test]
fn test_browse_mode_returns_filtered_in_original_order() {
    let dataset = youth_dataset();
    let pipeline = stub_pipeline();
    let request = QueryRequest::new("")
        .with_filter(FilterSpec::new().with_years(YearRange::single(2022)));

    let retrieval = pipeline.retrieve(&dataset, &request);

    assert_eq!(retrieval.total_candidates, 2);
    assert_eq!(retrieval.matches_returned, 0);
    let titles: Vec<&str> = retrieval
        .results
        .iter()
        .map(|r| r.record.title())
        .collect();
    assert_eq!(titles, vec!["Youth Climate Fund", "Youth Sports Grant"]);
    assert!(retrieval.results.iter().all(|r| r.score.is_none()));
    assert!(retrieval.results.iter().all(|r| r.kind.is_none()));
}

#[test]
fn test_browse_mode_respects_limit() {
    let dataset = youth_dataset();
    let pipeline = stub_pipeline();
    let request = QueryRequest::new("").with_limit(1);

    let retrieval = pipeline.retrieve(&dataset, &request);
    assert_eq!(retrieval.results.len(), 1);
    assert_eq!(retrieval.results[0].record.title(), "Youth Climate Fund");
}

#[test]
fn test_unavailable_backend_falls_back_to_lexical() {
    let dataset = youth_dataset();
    let pipeline = unavailable_pipeline();
    let request = QueryRequest::new("youth").with_strategy(Strategy::Semantic);

    let retrieval = pipeline.retrieve(&dataset, &request);

    assert!(retrieval.semantic_fallback.is_some(), "fallback must be reported");
    assert_eq!(retrieval.matches_returned, 2);
    assert!(retrieval
        .results
        .iter()
        .all(|r| r.kind == Some(MatchKind::Lexical)));
}

#[test]
fn test_auto_uses_semantic_when_backend_loads() {
    let dataset = youth_dataset();
    let pipeline = stub_pipeline();
    let request = QueryRequest::new("youth").with_strategy(Strategy::Auto);

    let retrieval = pipeline.retrieve(&dataset, &request);

    assert!(retrieval.semantic_fallback.is_none());
    assert!(retrieval
        .results
        .iter()
        .all(|r| r.kind == Some(MatchKind::Semantic)));
    // Semantic top-K has no threshold: all three candidates come back.
    assert_eq!(retrieval.matches_returned, 3);
}

#[test]
fn test_semantic_results_capped_by_top_k() {
    let dataset = youth_dataset();
    let pipeline = stub_pipeline();
    let mut request = QueryRequest::new("youth").with_strategy(Strategy::Semantic);
    request.top_k = 1;

    let retrieval = pipeline.retrieve(&dataset, &request);
    assert_eq!(retrieval.matches_returned, 1);
}

#[test]
fn test_retrieve_is_deterministic() {
    let dataset = youth_dataset();
    let pipeline = stub_pipeline();

    for strategy in [Strategy::Lexical, Strategy::Semantic, Strategy::Hybrid] {
        let request = QueryRequest::new("youth climate").with_strategy(strategy);
        let first = pipeline.retrieve(&dataset, &request);
        let second = pipeline.retrieve(&dataset, &request);

        let ids = |r: &Retrieval| -> Vec<u64> {
            r.results.iter().map(|x| x.record.id()).collect()
        };
        let scores = |r: &Retrieval| -> Vec<Option<f64>> {
            r.results.iter().map(|x| x.score).collect()
        };
        assert_eq!(ids(&first), ids(&second), "{strategy} ids must be stable");
        assert_eq!(scores(&first), scores(&second), "{strategy} scores must be stable");
    }
}

#[test]
fn test_empty_reasons_are_distinguishable() {
    let dataset = youth_dataset();
    let pipeline = stub_pipeline();

    // Filters alone eliminate everything.
    let filtered_out = QueryRequest::new("youth")
        .with_strategy(Strategy::Lexical)
        .with_filter(FilterSpec::new().with_funder("Nobody"));
    let retrieval = pipeline.retrieve(&dataset, &filtered_out);
    assert_eq!(
        retrieval.empty_reason,
        Some(EmptyReason::NoCandidatesAfterFilter)
    );
    assert_eq!(retrieval.total_candidates, 0);

    // Candidates exist but nothing clears the lexical threshold.
    let no_match = QueryRequest::new("zzghxq").with_strategy(Strategy::Lexical);
    let retrieval = pipeline.retrieve(&dataset, &no_match);
    assert_eq!(retrieval.empty_reason, Some(EmptyReason::NoRelevantMatches));
    assert_eq!(retrieval.total_candidates, 3);

    // Browse mode over an empty candidate set is a filter emptiness, not a
    // relevance miss.
    let browse = QueryRequest::new("")
        .with_filter(FilterSpec::new().with_funder("Nobody"));
    let retrieval = pipeline.retrieve(&dataset, &browse);
    assert_eq!(
        retrieval.empty_reason,
        Some(EmptyReason::NoCandidatesAfterFilter)
    );
}

#[test]
fn test_hybrid_unions_by_record_id() {
    let dataset = youth_dataset();
    let pipeline = stub_pipeline();
    let request = QueryRequest::new("youth").with_strategy(Strategy::Hybrid);

    let retrieval = pipeline.retrieve(&dataset, &request);

    // Lexical contributes records 0 and 2; semantic top-K contributes all
    // three. The union has no duplicates.
    let ids: Vec<u64> = retrieval.results.iter().map(|r| r.record.id()).collect();
    let unique: std::collections::HashSet<u64> = ids.iter().copied().collect();
    assert_eq!(unique.len(), ids.len());
    assert_eq!(retrieval.matches_returned, 3);

    // Hybrid scores are normalized to [0, 1].
    assert!(retrieval
        .results
        .iter()
        .all(|r| r.score.is_some_and(|s| (0.0..=1.0).contains(&s))));

    // The exact lexical token matches (normalized 1.0 territory) outrank the
    // stub-embedding similarity of the unrelated record.
    let first_two: Vec<u64> = ids.iter().take(2).copied().collect();
    assert!(first_two.contains(&0));
    assert!(first_two.contains(&2));
}

#[test]
fn test_filters_and_query_compose() {
    let dataset = youth_dataset();
    let pipeline = stub_pipeline();
    let request = QueryRequest::new("youth")
        .with_strategy(Strategy::Lexical)
        .with_filter(FilterSpec::new().with_funder("Sport England"));

    let retrieval = pipeline.retrieve(&dataset, &request);

    assert_eq!(retrieval.total_candidates, 1);
    assert_eq!(retrieval.matches_returned, 1);
    assert_eq!(retrieval.results[0].record.title(), "Youth Sports Grant");
}

#[test]
fn test_limit_truncates_scored_results() {
    let dataset = youth_dataset();
    let pipeline = stub_pipeline();
    let request = QueryRequest::new("grant youth fund")
        .with_strategy(Strategy::Lexical)
        .with_limit(1);

    let retrieval = pipeline.retrieve(&dataset, &request);
    assert_eq!(retrieval.results.len(), 1);
    assert_eq!(retrieval.matches_returned, 1);
}

#[test]
fn test_zero_limit_clamped_not_reported_as_filter_miss() {
    let dataset = youth_dataset();
    let pipeline = stub_pipeline();

    let browse = pipeline.retrieve(&dataset, &QueryRequest::new("").with_limit(0));
    assert_eq!(browse.results.len(), 1);
    assert_eq!(browse.total_candidates, 3);
    assert!(browse.empty_reason.is_none());

    let scored = pipeline.retrieve(
        &dataset,
        &QueryRequest::new("youth")
            .with_strategy(Strategy::Lexical)
            .with_limit(0),
    );
    assert_eq!(scored.results.len(), 1);
    assert!(scored.empty_reason.is_none());
}

#[test]
fn test_rows_dropped_counter_propagates() {
    let csv = "\
title,description,funder,amount,award_date
A,youth things,F,1,2022-01-01
B,youth stuff,F,1,broken-date
";
    let dataset = Dataset::load_reader(csv.as_bytes()).expect("load");
    let pipeline = stub_pipeline();
    let request = QueryRequest::new("youth").with_strategy(Strategy::Lexical);

    let retrieval = pipeline.retrieve(&dataset, &request);
    assert_eq!(retrieval.rows_dropped_for_bad_date, 1);
    assert_eq!(retrieval.total_candidates, 1);
}

#[test]
fn test_semantic_scoring_warms_the_cache() {
    let dataset = youth_dataset();
    let pipeline = stub_pipeline();
    let request = QueryRequest::new("youth").with_strategy(Strategy::Semantic);

    assert!(pipeline.cache().is_empty());
    pipeline.retrieve(&dataset, &request);
    assert_eq!(pipeline.cache().len(), 3);

    // A different dataset invalidates wholesale and re-warms.
    let other = Dataset::load_reader(
        "title,description,funder,amount,award_date\nOnly Grant,d,F,1,2022-01-01\n".as_bytes(),
    )
    .expect("load");
    pipeline.retrieve(&other, &request);
    assert_eq!(pipeline.cache().len(), 1);
}
