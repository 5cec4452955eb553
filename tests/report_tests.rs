use adreport::report::{DEFAULT_METRICS, DateParam};
use adreport::{ReportQuery, ad_client_filter, date_to_fields, escape_filter_parameter, trailing_window};
use chrono::NaiveDate;
use std::collections::BTreeMap;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn escapes_commas_and_backslashes() {
    assert_eq!(escape_filter_parameter("a,b"), "a\\,b");
    assert_eq!(escape_filter_parameter("a\\b"), "a\\\\b");
    assert_eq!(escape_filter_parameter("a\\,b"), "a\\\\\\,b");
    assert_eq!(escape_filter_parameter("ca-pub-123"), "ca-pub-123");
}

#[test]
fn ad_client_filter_embeds_escaped_id() {
    assert_eq!(ad_client_filter("ca-pub-1,2"), "AD_CLIENT_ID==ca-pub-1\\,2");
}

#[test]
fn date_fields_use_param_prefix() {
    let fields = date_to_fields("startDate", date(2024, 3, 5));
    let expected = BTreeMap::from([
        ("startDate.year".to_string(), 2024),
        ("startDate.month".to_string(), 3),
        ("startDate.day".to_string(), 5),
    ]);
    assert_eq!(fields, expected);
}

#[test]
fn date_param_splits_date() {
    let p = DateParam::from(date(2023, 12, 31));
    assert_eq!(
        p,
        DateParam {
            year: 2023,
            month: 12,
            day: 31
        }
    );
}

#[test]
fn trailing_week_ends_today() {
    let (start, end) = trailing_window(date(2024, 3, 8), 7).unwrap();
    assert_eq!(start, date(2024, 3, 1));
    assert_eq!(end, date(2024, 3, 8));
}

#[test]
fn trailing_window_crosses_year_boundary() {
    let (start, _) = trailing_window(date(2024, 1, 3), 7).unwrap();
    assert_eq!(start, date(2023, 12, 27));
}

#[test]
fn oversized_window_is_an_error() {
    let err = trailing_window(date(2024, 3, 8), 200_000_000).unwrap_err();
    assert!(err.to_string().contains("out of range"));
    assert!(ReportQuery::ad_client_daily("ca-pub-42", date(2024, 3, 8), u32::MAX).is_err());
}

#[test]
fn ad_client_daily_query_shape() {
    let q = ReportQuery::ad_client_daily("ca-pub-42", date(2024, 3, 8), 7).unwrap();
    assert_eq!(q.start_date(), date(2024, 3, 1));
    assert_eq!(q.end_date(), date(2024, 3, 8));
    assert_eq!(q.metric_ids().len(), DEFAULT_METRICS.len());
    assert_eq!(q.dimension_ids(), ["DATE"]);
    assert_eq!(q.filters(), ["AD_CLIENT_ID==ca-pub-42"]);
    assert_eq!(q.ordering(), ["+DATE"]);
}

#[test]
fn query_pairs_repeat_list_parameters() {
    let q = ReportQuery::new(date(2024, 3, 1), date(2024, 3, 8))
        .metrics(["CLICKS", "PAGE_VIEWS"])
        .dimensions(["DATE"])
        .filter("AD_CLIENT_ID==ca-pub-1")
        .order_by("+DATE");
    let pairs = q.to_query_pairs();
    let get = |k: &str| -> Vec<&str> {
        pairs
            .iter()
            .filter(|(key, _)| key == k)
            .map(|(_, v)| v.as_str())
            .collect()
    };

    assert_eq!(get("dateRange"), ["CUSTOM"]);
    assert_eq!(get("startDate.year"), ["2024"]);
    assert_eq!(get("startDate.month"), ["3"]);
    assert_eq!(get("startDate.day"), ["1"]);
    assert_eq!(get("endDate.day"), ["8"]);
    assert_eq!(get("metrics"), ["CLICKS", "PAGE_VIEWS"]);
    assert_eq!(get("dimensions"), ["DATE"]);
    assert_eq!(get("filters"), ["AD_CLIENT_ID==ca-pub-1"]);
    assert_eq!(get("orderBy"), ["+DATE"]);
}
