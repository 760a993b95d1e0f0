//! End-to-end retrieval through the public API, using the stub embedder.

use std::sync::Arc;

use grantrank::{
    Config, Dataset, EmbedderConfig, EmbeddingCache, FilterSpec, LazyEmbedder, QueryRequest,
    RankingPipeline, Strategy, YearRange,
};

const GRANTS_CSV: &str = "\
Grant Title,Description of Grant,Funder,Amount Awarded,Award Date
Youth Climate Fund,Supporting youth climate action,Green Trust,5000,2022-03-01
Elderly Care Grant,Community care for older people,Care Foundation,3000,2021-07-15
Youth Sports Grant,Local youth sports clubs,Sport England,7000,2022-11-30
";

fn stub_pipeline(config: Config) -> RankingPipeline {
    RankingPipeline::with_parts(
        config,
        LazyEmbedder::new(EmbedderConfig::stub()),
        Arc::new(EmbeddingCache::new()),
    )
}

#[test]
fn lexical_search_over_historical_headers() {
    let dataset = Dataset::load_reader(GRANTS_CSV.as_bytes()).expect("load");
    let pipeline = stub_pipeline(Config::default());

    let request = QueryRequest::new("youth").with_strategy(Strategy::Lexical);
    let retrieval = pipeline.retrieve(&dataset, &request);

    assert_eq!(retrieval.rows_dropped_for_bad_date, 0);
    let titles: Vec<&str> = retrieval
        .results
        .iter()
        .map(|r| r.record.title())
        .collect();
    assert_eq!(titles, vec!["Youth Climate Fund", "Youth Sports Grant"]);
}

#[test]
fn filtered_browse_then_search() {
    let dataset = Dataset::load_reader(GRANTS_CSV.as_bytes()).expect("load");
    let pipeline = stub_pipeline(Config::default());
    let filter = FilterSpec::new().with_years(YearRange::single(2022));

    let browse = pipeline.retrieve(&dataset, &QueryRequest::new("").with_filter(filter.clone()));
    assert_eq!(browse.results.len(), 2);
    assert!(browse.results.iter().all(|r| r.score.is_none()));

    let search = pipeline.retrieve(
        &dataset,
        &QueryRequest::new("sports clubs")
            .with_strategy(Strategy::Lexical)
            .with_filter(filter),
    );
    assert_eq!(search.results.len(), 1);
    assert_eq!(search.results[0].record.title(), "Youth Sports Grant");
}

#[test]
fn cache_snapshot_survives_pipeline_restart() {
    let dir = tempfile::tempdir().expect("tempdir");
    let snapshot = dir.path().join("embeddings.json");
    let dataset = Dataset::load_reader(GRANTS_CSV.as_bytes()).expect("load");

    let config = Config {
        cache_location: Some(snapshot.clone()),
        ..Default::default()
    };

    let pipeline = stub_pipeline(config.clone());
    let request = QueryRequest::new("community support").with_strategy(Strategy::Semantic);
    pipeline.retrieve(&dataset, &request);
    assert_eq!(pipeline.cache().len(), 3);
    pipeline.save_cache().expect("save");

    // A fresh pipeline restores the snapshot instead of starting cold.
    let restored = RankingPipeline::new(config);
    assert_eq!(restored.cache().len(), 3);
    assert_eq!(
        restored.cache().get(
            0,
            dataset.fingerprint(),
            "stub"
        ),
        pipeline.cache().get(0, dataset.fingerprint(), "stub")
    );
}

#[test]
fn semantic_unavailable_degrades_not_fails() {
    let dataset = Dataset::load_reader(GRANTS_CSV.as_bytes()).expect("load");
    let config = Config {
        model_dir: Some("/nonexistent/model/dir".into()),
        strategy: Strategy::Semantic,
        ..Default::default()
    };
    let pipeline = RankingPipeline::new(config.clone());

    let request = QueryRequest::with_config("youth", &config);
    let retrieval = pipeline.retrieve(&dataset, &request);

    assert!(retrieval.semantic_fallback.is_some());
    assert_eq!(retrieval.matches_returned, 2);
}
