//! Engine property tests.
//!
//! Verifies that:
//! 1. Scores and factors stay inside each version's range
//! 2. Every version's canonical weights sum to 1.0
//! 3. Press impact strictly decreases with age
//! 4. No two entities in a snapshot share a final score
//! 5. Historical reconstruction is idempotent and excludes entities with no
//!    evidence as of the date
//! 6. Confidence and final score never drop when evidence is added
//! 7. The documented scenarios (no evidence, press recency, technical depth)

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::{Value, json};

use toolrank_models::{
    Entity, EvidenceBlob, EvidenceRecord, ImportanceTier, LifecycleStatus, MarketImpactTier,
    Mention, PressItem, PressKind, Relevance, Sentiment, WEIGHT_SUM_TOLERANCE,
};
use toolrank_scoring::news_impact::mention_impact;
use toolrank_scoring::{
    AlgorithmVersion, Engine, EngineConfig, HistoricalReconstructor, MonthPeriod, NewsConfig,
    PressIndex, RankRequest,
};
use toolrank_store::MemoryStore;

fn reference() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 30, 23, 59, 59).unwrap()
}

fn engine(version: AlgorithmVersion) -> Engine {
    let config = EngineConfig {
        workers: 2,
        ..EngineConfig::default()
    };
    Engine::new(version, version.default_weights(), config).unwrap()
}

fn entity(id: &str, name: &str, category: &str, blob: Value) -> Entity {
    Entity::new(id, name, category).with_evidence(EvidenceBlob::from_value(blob))
}

fn press(
    id: &str,
    entity_id: &str,
    days_old: i64,
    sentiment: Sentiment,
    relevance: Relevance,
) -> PressItem {
    PressItem {
        id: id.to_string(),
        published_at: reference() - Duration::days(days_old),
        kind: PressKind::ProductLaunch,
        importance: ImportanceTier::High,
        market_impact: MarketImpactTier::Medium,
        self_published: false,
        source: Some("example-news".to_string()),
        title: None,
        mentions: vec![Mention {
            entity_id: entity_id.to_string(),
            relevance,
            sentiment,
        }],
    }
}

fn catalog() -> Vec<Entity> {
    vec![
        entity(
            "cursor",
            "Cursor",
            "code-editor",
            json!({
                "metrics": {"users": "4M", "arr": 500_000_000, "github_stars": 30_000},
                "info": {
                    "technical": {"context_window": 200_000, "llm_providers": ["openai", "anthropic", "google"]},
                    "business": {"pricing_model": "freemium_with_paid", "valuation": 9_900_000_000u64},
                    "features": ["Agent mode", "Tab completion", "Multi-file edits"],
                    "description": "AI code editor with an autonomous agent",
                    "launch_date": "2023-03-14",
                    "company": "Anysphere"
                }
            }),
        ),
        entity(
            "claude-code",
            "Claude Code",
            "autonomous-agent",
            json!({
                "metrics": {"swe_bench": {"verified": 72.7}},
                "info": {"company": "Anthropic", "technical": {"context_window": 1_000_000}}
            }),
        ),
        entity(
            "aider",
            "Aider",
            "autonomous-agent",
            json!({
                "github": {"stars": "35k"},
                "open_source": true,
                "llm_providers": 8,
                "description": "AI pair programming in your terminal"
            }),
        ),
        entity("blank", "Blank", "other", json!({})),
        entity(
            "broken",
            "Broken",
            "ide-assistant",
            json!({"metrics": {"users": {"oops": true}}, "launch_date": "someday"}),
        ),
    ]
}

fn catalog_press() -> Vec<PressItem> {
    vec![
        press("p1", "cursor", 3, Sentiment::Positive, Relevance::Primary),
        press("p2", "cursor", 40, Sentiment::Mixed, Relevance::Secondary),
        press("p3", "aider", 12, Sentiment::Positive, Relevance::Mentioned),
        press("p4", "claude-code", 1, Sentiment::Positive, Relevance::Primary),
        press("p5", "broken", 100, Sentiment::Negative, Relevance::Primary),
    ]
}

// =============================================================================
// Bounds and weights
// =============================================================================

#[test]
fn test_scores_within_bounds_for_all_versions() {
    let entities = catalog();
    let items = catalog_press();
    for version in AlgorithmVersion::ALL {
        let e = engine(version);
        let max = version.profile().max_score;
        let snapshot = e.rank(
            &entities,
            &items,
            Vec::new(),
            &RankRequest::live("2025-06", reference()),
        );
        assert_eq!(snapshot.rankings.len(), entities.len());
        for row in &snapshot.rankings {
            assert!(row.score >= 0.0 && row.score < max, "{} {} = {}", version, row.entity_id, row.score);
            assert!(row.weighted_sum <= max + 1e-9);
            for (dim, value) in row.factor_scores.iter() {
                assert!((0.0..=max).contains(&value), "{} {} {} = {}", version, row.entity_id, dim, value);
            }
        }
    }
}

#[test]
fn test_canonical_weights_sum_to_one() {
    for version in AlgorithmVersion::ALL {
        let sum = version.default_weights().sum();
        assert!((sum - 1.0).abs() <= WEIGHT_SUM_TOLERANCE, "{} sums to {}", version, sum);
    }
}

// =============================================================================
// Press decay
// =============================================================================

#[test]
fn test_press_impact_strictly_decreasing_in_age() {
    let cfg = NewsConfig::default();
    for sentiment in [Sentiment::Positive, Sentiment::Neutral, Sentiment::Mixed] {
        let mut prev = f64::INFINITY;
        for days in [0, 2, 10, 45, 90, 180, 400, 900] {
            let item = press("p", "x", days, sentiment, Relevance::Primary);
            let impact = mention_impact(&item, &item.mentions[0], reference(), &cfg).unwrap();
            assert!(impact.weighted < prev);
            prev = impact.weighted;
        }
    }
}

#[test]
fn test_recent_positive_dominates_old_negative() {
    let subject = entity("subject", "Subject", "other", json!({}));
    let items = vec![
        press("fresh", "subject", 5, Sentiment::Positive, Relevance::Primary),
        press("stale", "subject", 200, Sentiment::Negative, Relevance::Secondary),
    ];
    let e = engine(AlgorithmVersion::V7_0);
    let index = PressIndex::build(&items, reference());
    let scored = e.score_entity(&subject, &index, reference());
    assert!(scored.news.net_impact > 0.0);
    assert!(scored.news.positive_impact > scored.news.negative_impact);
    assert!(scored.factor_scores.sentiment > 50.0);
}

#[test]
fn test_future_press_is_invisible() {
    let subject = entity("subject", "Subject", "other", json!({}));
    let mut item = press("later", "subject", 0, Sentiment::Positive, Relevance::Primary);
    item.published_at = reference() + Duration::days(3);
    let e = engine(AlgorithmVersion::V7_0);
    let index = PressIndex::build(std::slice::from_ref(&item), reference());
    let scored = e.score_entity(&subject, &index, reference());
    assert!(scored.news.is_empty());
    assert_eq!(scored.factor_scores.sentiment, 50.0);
}

// =============================================================================
// Tiebreak
// =============================================================================

#[test]
fn test_no_duplicate_final_scores() {
    // Identical evidence under different names: the base scores all tie.
    let entities: Vec<Entity> = (0..40)
        .map(|i| entity(&format!("tool-{:02}", i), &format!("Tool {:02}", i), "other", json!({})))
        .chain(catalog())
        .collect();
    for version in AlgorithmVersion::ALL {
        let snapshot = engine(version).rank(
            &entities,
            &catalog_press(),
            Vec::new(),
            &RankRequest::live("2025-06", reference()),
        );
        let mut bits: Vec<u64> = snapshot.rankings.iter().map(|r| r.score.to_bits()).collect();
        bits.sort_unstable();
        bits.dedup();
        assert_eq!(bits.len(), entities.len(), "duplicate score under {}", version);

        let ranks: Vec<u32> = snapshot.rankings.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, (1..=entities.len() as u32).collect::<Vec<_>>());
        assert!(snapshot.rankings.windows(2).all(|w| w[0].score > w[1].score));
    }
}

#[test]
fn test_alphabetical_order_breaks_exact_ties() {
    let entities = vec![
        entity("z", "Zeta", "other", json!({})),
        entity("a", "alpha", "other", json!({})),
    ];
    let snapshot = engine(AlgorithmVersion::V7_0).rank(
        &entities,
        &[],
        Vec::new(),
        &RankRequest::live("2025-06", reference()),
    );
    assert_eq!(snapshot.rankings[0].entity_id, "a");
    assert_eq!(snapshot.rankings[1].entity_id, "z");
}

// =============================================================================
// Confidence gate
// =============================================================================

#[test]
fn test_confidence_monotonic_in_evidence() {
    let layers = [
        json!({}),
        json!({"info": {"company": "Acme"}}),
        json!({"info": {"company": "Acme"}, "stars": 2_000}),
        json!({"info": {"company": "Acme"}, "stars": 2_000, "metrics": {"users": 10_000}}),
        json!({"info": {"company": "Acme"}, "stars": 2_000, "metrics": {"users": 10_000, "arr": 1e6},
               "benchmarks": {"swe_bench": 40}}),
    ];
    let e = engine(AlgorithmVersion::V7_1);
    let index = PressIndex::default();
    let mut prev = 0.0;
    for blob in layers {
        let scored = e.score_entity(&entity("x", "X", "other", blob), &index, reference());
        assert!(scored.confidence_multiplier >= prev);
        assert!((0.7..=1.0).contains(&scored.confidence_multiplier));
        prev = scored.confidence_multiplier;
    }
    assert!(prev > 0.7);
}

#[test]
fn test_final_score_monotonic_in_completeness() {
    // Each layer satisfies more checklist items without moving any factor:
    // no scorer keywords, a launch too old for a recency bonus, and a
    // benchmark below the capability heuristic.
    let layers = [
        json!({}),
        json!({"description": "Pair programming helper"}),
        json!({"description": "Pair programming helper", "launch_date": "2010-01-01"}),
        json!({"description": "Pair programming helper", "launch_date": "2010-01-01",
               "swe_bench_score": 10}),
    ];
    for version in AlgorithmVersion::ALL {
        let e = engine(version);
        let mut prev: Option<(f64, f64, f64)> = None;
        for blob in &layers {
            let snapshot = e.rank(
                &[entity("x", "X", "other", blob.clone())],
                &[],
                Vec::new(),
                &RankRequest::live("2025-06", reference()),
            );
            let row = &snapshot.rankings[0];
            if let Some((weighted_sum, completeness, score)) = prev {
                assert!((row.weighted_sum - weighted_sum).abs() < 1e-12, "{}", version);
                assert!(row.completeness > completeness, "{}", version);
                assert!(row.score >= score, "{}: {} < {}", version, row.score, score);
            }
            prev = Some((row.weighted_sum, row.completeness, row.score));
        }
    }
}

#[test]
fn test_historical_ignores_current_lifecycle_status() {
    let jan = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
    let store = MemoryStore::new()
        .with_entity(Entity::new("gone", "Gone", "ide-assistant").with_status(LifecycleStatus::Discontinued))
        .unwrap()
        .with_record(EvidenceRecord::new("gone", "metrics.users", json!(50_000)).at(jan));
    let e = engine(AlgorithmVersion::V7_0);
    let reconstructor = HistoricalReconstructor::new(&e, &store, &store);

    let feb = reconstructor
        .reconstruct_month("2024-02".parse().unwrap())
        .unwrap();
    let live = e
        .rank_current(&store, &store, &RankRequest::live("2025-06", reference()))
        .unwrap();
    let scale = e.profile().max_score / 100.0;
    assert_eq!(feb.entry("gone").unwrap().factor_scores.velocity, 50.0 * scale);
    assert!(live.entry("gone").unwrap().factor_scores.velocity < 50.0 * scale);
}

// =============================================================================
// Documented scenarios
// =============================================================================

#[test]
fn test_no_evidence_scenario_v7_0() {
    let e = engine(AlgorithmVersion::V7_0);
    let snapshot = e.rank(
        &[entity("blank", "Blank", "other", json!({}))],
        &[],
        Vec::new(),
        &RankRequest::live("2025-06", reference()),
    );
    let row = &snapshot.rankings[0];
    assert_eq!(row.factor_scores.adoption, 0.0);
    assert_eq!(row.factor_scores.market_traction, 0.0);
    assert_eq!(row.completeness, 0.0);
    assert_eq!(row.confidence_multiplier, 0.7);

    // 0.25×50 + 0.10×40 + 0.15×50 + 0.10×50 + 0.05×50 + 0.05×40
    assert!((row.weighted_sum - 33.5).abs() < 1e-9);
    let base = row.score - row.tiebreak.nudge;
    assert!((base - 33.5 * 0.7).abs() < 1e-6, "base = {}", base);
    assert!(row.tiebreak.nudge < e.profile().precision);
}

#[test]
fn test_top_technical_bucket_beats_default() {
    let e = engine(AlgorithmVersion::V7_0);
    let index = PressIndex::default();
    let big = e.score_entity(
        &entity("big", "Big", "other", json!({"context_window": 1_000_000})),
        &index,
        reference(),
    );
    let unknown = e.score_entity(&entity("u", "U", "other", json!({})), &index, reference());
    assert!(big.factor_scores.technical_depth > unknown.factor_scores.technical_depth);
    assert_eq!(unknown.factor_scores.technical_depth, 50.0);
}

#[test]
fn test_distributed_news_reaches_adoption_only_in_v7_1() {
    let subject = entity("subject", "Subject", "other", json!({}));
    // Small enough that neither sentiment adjustment saturates.
    let items = vec![press("p", "subject", 30, Sentiment::Positive, Relevance::Primary)];
    let index = PressIndex::build(&items, reference());
    let v70 = engine(AlgorithmVersion::V7_0).score_entity(&subject, &index, reference());
    let v71 = engine(AlgorithmVersion::V7_1).score_entity(&subject, &index, reference());
    assert!(v71.factor_scores.adoption > v70.factor_scores.adoption);
    assert!(v71.factor_scores.sentiment < v70.factor_scores.sentiment);
    assert_eq!(v70.factor_scores.capability, v71.factor_scores.capability);
}

// =============================================================================
// Historical reconstruction
// =============================================================================

fn history_store() -> MemoryStore {
    let jan = Utc.with_ymd_and_hms(2025, 1, 10, 0, 0, 0).unwrap();
    let mar = Utc.with_ymd_and_hms(2025, 3, 5, 12, 0, 0).unwrap();
    MemoryStore::new()
        .with_entity(Entity::new("early", "Early", "code-editor"))
        .and_then(|s| s.with_entity(Entity::new("late", "Late", "autonomous-agent")))
        .unwrap()
        .with_record(EvidenceRecord::new("early", "metrics.users", json!(20_000)).at(jan))
        .with_record(EvidenceRecord::new("early", "metrics.users", json!(2_000_000)).at(mar))
        .with_record(EvidenceRecord::new("late", "metrics.github_stars", json!(60_000)).at(mar))
        .with_press_item(press("recent", "early", 2, Sentiment::Positive, Relevance::Primary))
}

#[test]
fn test_historical_reconstruction_is_idempotent() {
    let store = history_store();
    let e = engine(AlgorithmVersion::V7_0);
    let reconstructor = HistoricalReconstructor::new(&e, &store, &store);
    let feb: MonthPeriod = "2025-02".parse().unwrap();

    let first = reconstructor.reconstruct_month(feb).unwrap();
    let second = reconstructor.reconstruct_month(feb).unwrap();
    assert_eq!(first.digest, second.digest);
    assert_eq!(first.snapshot_id, second.snapshot_id);
    for (a, b) in first.rankings.iter().zip(&second.rankings) {
        assert_eq!(a.score.to_bits(), b.score.to_bits());
        for ((_, x), (_, y)) in a.factor_scores.iter().zip(b.factor_scores.iter()) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
    }
    assert!(first.verify_digest());
}

#[test]
fn test_historical_uses_only_admissible_evidence() {
    let store = history_store();
    let e = engine(AlgorithmVersion::V7_0);
    let reconstructor = HistoricalReconstructor::new(&e, &store, &store);

    let feb = reconstructor
        .reconstruct_month("2025-02".parse().unwrap())
        .unwrap();
    assert_eq!(feb.rankings.len(), 1);
    assert_eq!(feb.rankings[0].entity_id, "early");
    assert_eq!(feb.excluded.len(), 1);
    assert_eq!(feb.excluded[0].entity_id, "late");
    // The June press item does not exist yet.
    assert!(feb.rankings[0].news.is_empty());

    let apr = reconstructor
        .reconstruct_month("2025-04".parse().unwrap())
        .unwrap();
    assert_eq!(apr.rankings.len(), 2);
    let early_feb = feb.entry("early").unwrap().factor_scores.adoption;
    let early_apr = apr.entry("early").unwrap().factor_scores.adoption;
    assert!(early_apr > early_feb);
}

#[test]
fn test_backtest_months_chronological_and_consistent() {
    let store = history_store();
    let e = engine(AlgorithmVersion::V7_1);
    let reconstructor = HistoricalReconstructor::new(&e, &store, &store);
    let from: MonthPeriod = "2024-12".parse().unwrap();
    let to: MonthPeriod = "2025-04".parse().unwrap();

    let snapshots = reconstructor.backtest_months(from, to).unwrap();
    let periods: Vec<&str> = snapshots.iter().map(|s| s.period.as_str()).collect();
    assert_eq!(periods, vec!["2024-12", "2025-01", "2025-02", "2025-03", "2025-04"]);
    assert!(snapshots[0].rankings.is_empty());
    assert_eq!(snapshots[0].excluded.len(), 2);

    let single = reconstructor
        .reconstruct_month("2025-03".parse().unwrap())
        .unwrap();
    assert_eq!(snapshots[3].digest, single.digest);
}

#[test]
fn test_previous_snapshot_movement() {
    let store = history_store();
    let e = engine(AlgorithmVersion::V7_0);
    let reconstructor = HistoricalReconstructor::new(&e, &store, &store);
    let mar = reconstructor
        .reconstruct_month("2025-03".parse().unwrap())
        .unwrap();

    let request = RankRequest::live("2025-06", reference()).with_previous(Some(&mar));
    let live = e.rank_current(&store, &store, &request).unwrap();
    for row in &live.rankings {
        let prev = mar.rank_of(&row.entity_id).unwrap();
        assert_eq!(row.previous_rank, Some(prev));
        assert_eq!(row.movement, Some(i64::from(prev) - i64::from(row.rank)));
    }
}
