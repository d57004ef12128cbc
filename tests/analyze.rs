//! End-to-end runs through the public API with a fixed reference clock

use chrono::{DateTime, TimeZone, Utc};
use churn_flux::advisor::Advisor;
use churn_flux::schema::{RawTable, TableAdapter};
use churn_flux::{
    summarize, ActivityEvent, ActivityTable, AnalysisError, AnalysisResult, ChurnEngine,
    CustomerTable, EngagementTier, EngineConfig, PatternSet, RecommendedAction, Trend,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn engine() -> ChurnEngine {
    init_logging();
    ChurnEngine::with_patterns(EngineConfig::new("TestCo", "ecommerce"), PatternSet::built_in())
}

fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 20, 0, 0, 0).unwrap()
}

fn find<'a>(results: &'a [AnalysisResult], id: &str) -> &'a AnalysisResult {
    results
        .iter()
        .find(|r| r.customer_id == id)
        .unwrap_or_else(|| panic!("no result for {id}"))
}

#[test]
fn scenario_mixed_tiers() {
    let customers = RawTable::parse_json(
        r#"[{"customer_id": "C1"}, {"customer_id": "C2"}, {"customer_id": "C3"}]"#,
    )
    .unwrap();
    let activities = RawTable::parse_json(
        r#"[
            {"customer_id": "C1", "date": "2024-03-01"},
            {"customer_id": "C1", "date": "2024-03-15"},
            {"customer_id": "C2", "date": "2024-02-01"}
        ]"#,
    )
    .unwrap();

    let results = engine()
        .analyze_tables(&customers, &activities, as_of())
        .unwrap();
    assert_eq!(results.len(), 3);

    let c1 = find(&results, "C1");
    assert_eq!(c1.engagement_level, EngagementTier::Casual);
    assert_eq!(c1.active_days, 2);
    assert_eq!(c1.recency_days, 5);
    assert_eq!(c1.churn_risk, 62.5);
    assert_eq!(c1.recommended_action, RecommendedAction::Medium);

    let c2 = find(&results, "C2");
    assert_eq!(c2.engagement_level, EngagementTier::TriedOnce);
    assert_eq!(c2.recency_days, 48);
    assert_eq!(c2.churn_risk, 100.0);

    let c3 = find(&results, "C3");
    assert_eq!(c3.engagement_level, EngagementTier::NeverActive);
    assert_eq!(c3.frequency_trend, Trend::Inactive);
    assert_eq!(c3.recency_days, 999);
    assert_eq!(c3.churn_risk, 100.0);
    assert_eq!(c3.predicted_ltv, 0.0);
    assert!(c3.urgent);
}

#[test]
fn undated_rows_do_not_refresh_recency() {
    let customers = RawTable::parse_json(r#"[{"customer_id": "C1"}]"#).unwrap();
    let activities = RawTable::parse_json(
        r#"[
            {"customer_id": "C1", "timestamp": "2024-01-01"},
            {"customer_id": "C1", "timestamp": null}
        ]"#,
    )
    .unwrap();

    let results = engine()
        .analyze_tables(&customers, &activities, as_of())
        .unwrap();

    let c1 = &results[0];
    assert_eq!(c1.total_activities, 2);
    assert_eq!(c1.active_days, 1);
    assert_eq!(c1.recency_days, 79);
    assert_eq!(c1.engagement_level, EngagementTier::Casual);
    assert_eq!(c1.churn_risk, 99.5);
    assert_eq!(c1.recommended_action, RecommendedAction::Urgent);
    assert!(c1.urgent);
}

#[test]
fn scenario_no_activity_table() {
    let customers = CustomerTable::from_ids(["X"]);
    let results = engine().analyze_at(&customers, &ActivityTable::default(), as_of());

    let x = &results[0];
    assert_eq!(x.engagement_level, EngagementTier::NeverActive);
    assert_eq!(x.frequency_trend, Trend::Unknown);
    assert_eq!(x.recency_days, 999);
    assert_eq!(x.churn_risk, 100.0);
    assert_eq!(x.recommended_action, RecommendedAction::Urgent);
    assert_eq!(x.avg_duration, None);
    assert_eq!(x.total_value, None);
}

#[test]
fn scenario_equal_windows_are_stable() {
    let customers = CustomerTable::from_ids(["C1"]);
    let events = [1, 2, 3, 17, 18, 19]
        .into_iter()
        .map(|d| ActivityEvent::new("C1", Utc.with_ymd_and_hms(2024, 3, d, 9, 0, 0).unwrap()))
        .collect();

    let results = engine().analyze_at(&customers, &ActivityTable::new(events), as_of());
    assert_eq!(results[0].frequency_trend, Trend::Stable);
    assert_eq!(results[0].engagement_level, EngagementTier::Loyal);
}

#[test]
fn scenario_super_customer_value() {
    assert_eq!(Advisor::predict_ltv(EngagementTier::SuperCustomer, 25.0), 472.5);
    assert_eq!(
        Advisor::recommend(25.0, EngagementTier::SuperCustomer),
        RecommendedAction::Vip
    );
    assert_eq!(
        Advisor::recommend(45.0, EngagementTier::SuperCustomer),
        RecommendedAction::Low
    );
}

#[test]
fn sample_business_run() {
    let customers = RawTable::parse_csv_str("customer_id\nC001\nC002\nC003\nC004\nC005\n").unwrap();
    let activities = RawTable::parse_csv_str(
        "customer_id,date,duration,value\n\
         C001,2024-03-01,10,50\n\
         C001,2024-03-15,5,30\n\
         C002,2024-02-01,20,100\n\
         C003,2024-03-01,15,75\n\
         C003,2024-03-10,25,120\n\
         C003,2024-03-20,30,200\n",
    )
    .unwrap();

    let results = engine()
        .analyze_tables(&customers, &activities, as_of())
        .unwrap();

    let c3 = find(&results, "C003");
    assert_eq!(c3.engagement_level, EngagementTier::Regular);
    assert_eq!(c3.recency_days, 0);
    assert_eq!(c3.frequency_trend, Trend::Stable);
    assert_eq!(c3.avg_duration, Some(70.0 / 3.0));
    assert_eq!(c3.total_value, Some(395.0));
    assert_eq!(c3.churn_risk, 40.0);
    assert_eq!(c3.predicted_ltv, 234.0);

    let summary = summarize(&results);
    assert_eq!(summary.total_customers, 5);
    // C002 (Tried Once, 48 days), C004 and C005 (no events)
    assert_eq!(summary.at_risk_customers, 3);
    assert_eq!(summary.urgent_customers, 3);
    assert_eq!(summary.potential_savings, 144.0);
    assert_eq!(summary.engagement_breakdown[&EngagementTier::NeverActive], 2);
}

#[test]
fn urgent_flag_matches_risk_threshold() {
    let customers = CustomerTable::from_ids((0..20).map(|i| format!("C{i}")));
    let events = (0..20)
        .flat_map(|i| {
            (0..i).map(move |n| {
                ActivityEvent::new(
                    format!("C{i}"),
                    as_of() - chrono::Duration::days((i * 7 + n * 3) as i64 % 90),
                )
            })
        })
        .collect();

    let results = engine().analyze_at(&customers, &ActivityTable::new(events), as_of());
    for r in &results {
        assert_eq!(r.urgent, r.churn_risk > 70.0, "{}", r.customer_id);
        assert!((0.0..=100.0).contains(&r.churn_risk));
    }

    let summary = summarize(&results);
    assert_eq!(summary.at_risk_customers, summary.urgent_customers);
}

#[test]
fn analysis_is_idempotent_for_fixed_clock() {
    let customers = CustomerTable::from_ids(["C1", "C2"]);
    let activities = ActivityTable::new(vec![
        ActivityEvent::new("C1", Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()).with_value(9.5),
        ActivityEvent::new("C1", Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap()),
    ]);

    let engine = engine();
    let first = engine.analyze_at(&customers, &activities, as_of());
    let second = engine.analyze_at(&customers, &activities, as_of());
    assert_eq!(first, second);
}

#[test]
fn missing_customer_id_column_is_fatal() {
    let customers = RawTable::parse_json(r#"[{"customer": "C1"}]"#).unwrap();
    let err = engine()
        .analyze_tables(&customers, &RawTable::default(), as_of())
        .unwrap_err();
    assert!(matches!(err, AnalysisError::MissingColumn { .. }));
}

#[test]
fn request_body_round_trip() {
    let (customers, activities) = TableAdapter::parse_request(
        r#"{
            "customers": [{"customer_id": "123"}],
            "activities": [{"customer_id": "123", "timestamp": "2024-03-19T08:00:00Z", "duration": 10}]
        }"#,
    )
    .unwrap();

    let report = engine().report_at(&customers, &activities, as_of());
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.results[0].engagement_level, EngagementTier::TriedOnce);
    assert_eq!(report.results[0].avg_duration, Some(10.0));
    assert_eq!(report.summary.total_customers, 1);
}
