use super::*;
use chrono::TimeZone;
use dora_metrics_developer_platforms::models::{
    DeploymentProvenance, DeploymentStatus, IncidentStatus, IncidentType, PullRequestState,
};
use proptest::prelude::*;

fn ts(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

fn deployment(id: &str, conducted_at: DateTime<Utc>) -> Deployment {
    Deployment {
        id: id.to_string(),
        repo_id: "repo".to_string(),
        head_branch: "main".to_string(),
        conducted_at,
        status: DeploymentStatus::Success,
        provenance: DeploymentProvenance::Workflow,
    }
}

fn interval(from: DateTime<Utc>, to: DateTime<Utc>) -> Interval {
    Interval::new(from, to).unwrap()
}

#[test]
fn test_floor_daily() {
    assert_eq!(Granularity::Daily.floor(ts(2024, 2, 29, 23)), ts(2024, 2, 29, 0));
}

#[test]
fn test_floor_weekly_on_monday_is_identity() {
    let monday = ts(2024, 5, 13, 0);
    assert_eq!(Granularity::Weekly.floor(monday), monday);
}

#[test]
fn test_floor_weekly_sunday_goes_back_six_days() {
    assert_eq!(Granularity::Weekly.floor(ts(2024, 5, 19, 22)), ts(2024, 5, 13, 0));
}

#[test]
fn test_floor_weekly_crosses_month_and_year() {
    // Wednesday 2025-01-01 belongs to the week starting Monday 2024-12-30
    assert_eq!(Granularity::Weekly.floor(ts(2025, 1, 1, 10)), ts(2024, 12, 30, 0));
}

#[test]
fn test_floor_monthly() {
    assert_eq!(Granularity::Monthly.floor(ts(2024, 2, 29, 12)), ts(2024, 2, 1, 0));
}

#[test]
fn test_next_monthly_handles_varying_lengths() {
    assert_eq!(Granularity::Monthly.next(ts(2024, 1, 1, 0)), Some(ts(2024, 2, 1, 0)));
    assert_eq!(Granularity::Monthly.next(ts(2024, 12, 1, 0)), Some(ts(2025, 1, 1, 0)));
}

#[test]
fn test_granularity_display_and_serde() {
    assert_eq!(Granularity::Weekly.to_string(), "weekly");
    let parsed: Granularity = serde_json::from_str("\"monthly\"").unwrap();
    assert_eq!(parsed, Granularity::Monthly);
}

#[test]
fn test_generate_expanded_buckets_prepopulates_empty_buckets() {
    let buckets = generate_expanded_buckets::<Deployment>(
        &[],
        &interval(ts(2024, 5, 1, 0), ts(2024, 5, 4, 12)),
        "conducted_at",
        Granularity::Daily,
    )
    .unwrap();

    let keys: Vec<_> = buckets.keys().copied().collect();
    assert_eq!(
        keys,
        vec![ts(2024, 5, 1, 0), ts(2024, 5, 2, 0), ts(2024, 5, 3, 0), ts(2024, 5, 4, 0)]
    );
    assert!(buckets.values().all(|v| v.is_empty()));
}

#[test]
fn test_generate_expanded_buckets_assigns_items_to_floor() {
    let items = vec![
        deployment("a", ts(2024, 5, 13, 9)),
        deployment("b", ts(2024, 5, 19, 23)),
        deployment("c", ts(2024, 5, 20, 0)),
    ];

    let buckets = generate_expanded_buckets(
        &items,
        &interval(ts(2024, 5, 13, 0), ts(2024, 5, 26, 0)),
        "conducted_at",
        Granularity::Weekly,
    )
    .unwrap();

    assert_eq!(buckets.len(), 2);
    let first: Vec<&str> = buckets[&ts(2024, 5, 13, 0)].iter().map(|d| d.id.as_str()).collect();
    let second: Vec<&str> = buckets[&ts(2024, 5, 20, 0)].iter().map(|d| d.id.as_str()).collect();
    assert_eq!(first, vec!["a", "b"]);
    assert_eq!(second, vec!["c"]);
}

#[test]
fn test_generate_expanded_buckets_widens_range_for_outlying_items() {
    let items = vec![
        deployment("before", ts(2024, 3, 30, 12)),
        deployment("after", ts(2024, 6, 2, 12)),
    ];

    let buckets = generate_expanded_buckets(
        &items,
        &interval(ts(2024, 4, 10, 0), ts(2024, 4, 20, 0)),
        "conducted_at",
        Granularity::Monthly,
    )
    .unwrap();

    let keys: Vec<_> = buckets.keys().copied().collect();
    assert_eq!(
        keys,
        vec![ts(2024, 3, 1, 0), ts(2024, 4, 1, 0), ts(2024, 5, 1, 0), ts(2024, 6, 1, 0)]
    );
    assert_eq!(buckets[&ts(2024, 3, 1, 0)].len(), 1);
    assert!(buckets[&ts(2024, 4, 1, 0)].is_empty());
    assert!(buckets[&ts(2024, 5, 1, 0)].is_empty());
    assert_eq!(buckets[&ts(2024, 6, 1, 0)].len(), 1);
}

#[test]
fn test_generate_expanded_buckets_rejects_non_temporal_field() {
    let items = vec![deployment("d1", ts(2024, 5, 13, 9))];

    let result = generate_expanded_buckets(
        &items,
        &interval(ts(2024, 5, 13, 0), ts(2024, 5, 14, 0)),
        "head_branch",
        Granularity::Daily,
    );

    assert_eq!(
        result,
        Err(MetricsError::NonTemporalField {
            field: "head_branch".to_string(),
            record: "d1".to_string(),
        })
    );
}

#[test]
fn test_generate_expanded_buckets_rejects_unset_optional_timestamp() {
    let incident = Incident {
        id: "inc-1".to_string(),
        title: String::new(),
        incident_type: IncidentType::Incident,
        creation_date: ts(2024, 5, 13, 9),
        resolved_date: None,
        status: IncidentStatus::Triggered,
    };

    let result = generate_expanded_buckets(
        &[incident],
        &interval(ts(2024, 5, 13, 0), ts(2024, 5, 14, 0)),
        "resolved_date",
        Granularity::Daily,
    );

    assert!(matches!(result, Err(MetricsError::NonTemporalField { .. })));
}

#[test]
fn test_expand_buckets_by_matches_named_field() {
    let items = vec![
        deployment("a", ts(2024, 5, 2, 9)),
        deployment("b", ts(2024, 5, 9, 9)),
    ];
    let range = interval(ts(2024, 5, 1, 0), ts(2024, 5, 10, 0));

    let by_name =
        generate_expanded_buckets(&items, &range, "conducted_at", Granularity::Daily).unwrap();
    let by_accessor = expand_buckets_by(&items, &range, Granularity::Daily, |d| d.conducted_at);

    assert_eq!(by_name, by_accessor);
    assert_eq!(by_accessor.len(), 10);
}

#[test]
fn test_pull_request_fields() {
    let pr = PullRequest {
        id: "pr-1".to_string(),
        number: 1,
        title: "t".to_string(),
        repo_id: "r".to_string(),
        base_branch: "main".to_string(),
        head_branch: "feature".to_string(),
        state: PullRequestState::Open,
        created_at: ts(2024, 1, 1, 0),
        state_changed_at: None,
        first_commit_to_open: None,
        first_response_time: None,
        rework_time: None,
        merge_time: None,
        merge_to_deploy: None,
    };

    assert_eq!(pr.field("created_at"), FieldValue::Timestamp(ts(2024, 1, 1, 0)));
    assert_eq!(pr.field("state_changed_at"), FieldValue::Missing);
    assert_eq!(pr.field("base_branch"), FieldValue::Text("main".to_string()));
    assert_eq!(pr.field("does_not_exist"), FieldValue::Missing);
}

#[test]
fn test_fill_missing_week_buckets_fills_gaps_with_default() {
    let mut sparse = BTreeMap::new();
    sparse.insert(ts(2024, 5, 20, 0), 3usize);

    let filled = fill_missing_week_buckets(
        sparse,
        &interval(ts(2024, 5, 15, 8), ts(2024, 6, 5, 8)),
        || 0usize,
    );

    let entries: Vec<_> = filled.into_iter().collect();
    assert_eq!(
        entries,
        vec![
            (ts(2024, 5, 13, 0), 0),
            (ts(2024, 5, 20, 0), 3),
            (ts(2024, 5, 27, 0), 0),
            (ts(2024, 6, 3, 0), 0),
        ]
    );
}

#[test]
fn test_fill_missing_week_buckets_with_none_default() {
    let filled = fill_missing_week_buckets(
        BTreeMap::<DateTime<Utc>, Option<f64>>::new(),
        &interval(ts(2024, 5, 13, 0), ts(2024, 5, 21, 0)),
        || None,
    );

    assert_eq!(filled.len(), 2);
    assert!(filled.values().all(Option::is_none));
}

#[test]
fn test_fill_missing_week_buckets_keeps_entries_outside_interval() {
    let mut sparse = BTreeMap::new();
    sparse.insert(ts(2024, 1, 1, 0), 9usize);

    let filled = fill_missing_week_buckets(
        sparse,
        &interval(ts(2024, 5, 13, 0), ts(2024, 5, 14, 0)),
        || 0usize,
    );

    assert_eq!(filled.len(), 2);
    assert_eq!(filled[&ts(2024, 1, 1, 0)], 9);
    assert_eq!(filled[&ts(2024, 5, 13, 0)], 0);
}

#[test]
fn test_start_of_week() {
    assert_eq!(start_of_week(ts(2024, 5, 16, 15)), ts(2024, 5, 13, 0));
}

fn granularity_strategy() -> impl Strategy<Value = Granularity> {
    prop_oneof![
        Just(Granularity::Daily),
        Just(Granularity::Weekly),
        Just(Granularity::Monthly),
    ]
}

proptest! {
    #[test]
    fn test_rebucketing_flattened_output_is_idempotent(
        offsets in prop::collection::vec(0i64..(24 * 120), 0..40),
        granularity in granularity_strategy(),
    ) {
        let base = ts(2024, 1, 10, 0);
        let items: Vec<Deployment> = offsets
            .iter()
            .enumerate()
            .map(|(i, h)| deployment(&format!("d{}", i), base + Duration::hours(*h)))
            .collect();
        let range = interval(base + Duration::days(10), base + Duration::days(40));

        let first = generate_expanded_buckets(&items, &range, "conducted_at", granularity).unwrap();
        let flattened: Vec<Deployment> = first.values().flatten().cloned().collect();
        let second =
            generate_expanded_buckets(&flattened, &range, "conducted_at", granularity).unwrap();

        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_every_item_lands_in_its_floor_bucket(
        offsets in prop::collection::vec(0i64..(24 * 60), 1..30),
    ) {
        let base = ts(2024, 2, 1, 0);
        let items: Vec<Deployment> = offsets
            .iter()
            .enumerate()
            .map(|(i, h)| deployment(&format!("d{}", i), base + Duration::hours(*h)))
            .collect();
        let range = interval(base, base + Duration::days(1));

        let buckets =
            generate_expanded_buckets(&items, &range, "conducted_at", Granularity::Weekly)
                .unwrap();

        let total: usize = buckets.values().map(Vec::len).sum();
        prop_assert_eq!(total, items.len());
        for (start, bucket) in &buckets {
            for item in bucket {
                prop_assert_eq!(Granularity::Weekly.floor(item.conducted_at), *start);
            }
        }
    }
}
