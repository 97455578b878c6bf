//! Catalog configuration tests.

use idle_core::{
    config::{GameConfig, JobCatalog},
    money::Money,
    progression::Multiplier,
    GameError,
};

#[test]
fn shipped_catalog_file_matches_builtin() {
    let from_file = GameConfig::from_json(include_str!("../../data/catalog.json"))
        .unwrap()
        .catalog()
        .unwrap();
    assert_eq!(from_file, JobCatalog::default());
}

#[test]
fn builtin_catalog_has_unique_tier_one_jobs() {
    let catalog = JobCatalog::default();
    assert_eq!(catalog.len(), 6);
    let jobs = catalog.base_jobs();
    assert!(jobs.values().all(|j| j.level.tier == 1));
    assert_eq!(jobs[&2].level.cost, Money::from_units(500));
    assert_eq!(jobs[&2].level.earnings_per_cycle, Money::from_units(9));
    assert_eq!(jobs[&2].level.cycle_duration.as_secs(), 5);
    assert_eq!(catalog.click_reward(), &Money::from_units(1));
}

#[test]
fn multipliers_default_and_accept_fractions() {
    let config = GameConfig::from_json(
        r#"{"click_reward": "1", "jobs": [
            {"id": 1, "cost": "10", "earnings_per_cycle": "2", "cycle_duration_ms": 500},
            {"id": 2, "cost": "10", "earnings_per_cycle": "2", "cycle_duration_ms": 500,
             "earnings_multiplier": "5/4", "cost_multiplier": 2}
        ]}"#,
    )
    .unwrap();
    assert_eq!(config.jobs[0].cost_multiplier, Multiplier::integer(3));
    assert_eq!(config.jobs[1].earnings_multiplier, Multiplier::new(5, 4).unwrap());
}

fn rejects(json: &str) {
    assert!(
        matches!(GameConfig::from_json(json), Err(GameError::InvalidConfig { .. })),
        "should reject {json}"
    );
}

#[test]
fn invalid_catalogs_are_rejected() {
    // Duplicate ids.
    rejects(
        r#"{"click_reward": "1", "jobs": [
            {"id": 3, "cost": "1", "earnings_per_cycle": "1", "cycle_duration_ms": 1},
            {"id": 3, "cost": "1", "earnings_per_cycle": "1", "cycle_duration_ms": 1}
        ]}"#,
    );
    // Zero cycle.
    rejects(r#"{"click_reward": "1", "jobs": [{"id": 1, "cost": "1", "earnings_per_cycle": "1", "cycle_duration_ms": 0}]}"#);
    // Zero cost.
    rejects(r#"{"click_reward": "1", "jobs": [{"id": 1, "cost": "0", "earnings_per_cycle": "1", "cycle_duration_ms": 5}]}"#);
    // Zero earnings never grow.
    rejects(r#"{"click_reward": "1", "jobs": [{"id": 1, "cost": "1", "earnings_per_cycle": "0", "cycle_duration_ms": 5}]}"#);
    // No growth.
    rejects(
        r#"{"click_reward": "1", "jobs": [{"id": 1, "cost": "1", "earnings_per_cycle": "1", "cycle_duration_ms": 5, "cost_multiplier": 1}]}"#,
    );
    rejects(
        r#"{"click_reward": "1", "jobs": [{"id": 1, "cost": "1", "earnings_per_cycle": "1", "cycle_duration_ms": 5, "earnings_multiplier": "1/2"}]}"#,
    );
    // Negative click reward.
    rejects(r#"{"click_reward": "-1", "jobs": []}"#);
}

#[test]
fn load_reports_missing_file() {
    let err = GameConfig::load("/definitely/not/here.json").unwrap_err();
    assert!(err.to_string().contains("Cannot read"));
}
