use std::collections::BTreeMap;

use anyhow::{Result, anyhow};
use chrono::{Datelike, Days, NaiveDate};
use serde::Deserialize;

/// Metrics requested by the standard ad client report, in column order.
pub const DEFAULT_METRICS: [&str; 8] = [
    "PAGE_VIEWS",
    "AD_REQUESTS",
    "AD_REQUESTS_COVERAGE",
    "CLICKS",
    "AD_REQUESTS_CTR",
    "COST_PER_CLICK",
    "AD_REQUESTS_RPM",
    "ESTIMATED_EARNINGS",
];

pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Escapes a value for use inside a report filter. Backslashes go first,
/// otherwise the backslash added before each comma would be doubled too.
pub fn escape_filter_parameter(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace(',', "\\,")
}

/// Filter clause restricting a report to one ad client.
pub fn ad_client_filter(reporting_dimension_id: &str) -> String {
    format!(
        "AD_CLIENT_ID=={}",
        escape_filter_parameter(reporting_dimension_id)
    )
}

/// A date split into the three fields the API takes instead of a date value.
/// Reports echo their range back in the same shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DateParam {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl From<NaiveDate> for DateParam {
    fn from(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }
}

impl DateParam {
    pub fn fields(&self, param_name: &str) -> BTreeMap<String, i32> {
        BTreeMap::from([
            (format!("{param_name}.year"), self.year),
            (format!("{param_name}.month"), self.month as i32),
            (format!("{param_name}.day"), self.day as i32),
        ])
    }
}

/// `startDate` + 2024-03-05 becomes `startDate.year=2024`, `startDate.month=3`,
/// `startDate.day=5`.
pub fn date_to_fields(param_name: &str, date: NaiveDate) -> BTreeMap<String, i32> {
    DateParam::from(date).fields(param_name)
}

/// `(today - days, today)`, both inclusive. Fails when the start would fall
/// outside the representable calendar.
pub fn trailing_window(today: NaiveDate, days: u32) -> Result<(NaiveDate, NaiveDate)> {
    let start = today
        .checked_sub_days(Days::new(u64::from(days)))
        .ok_or_else(|| anyhow!("a window of {days} days before {today} is out of range"))?;
    Ok((start, today))
}

/// Parameters of one report request. Built once, then only read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportQuery {
    filters: Vec<String>,
    metrics: Vec<String>,
    dimensions: Vec<String>,
    start_date: NaiveDate,
    end_date: NaiveDate,
    order_by: Vec<String>,
}

impl ReportQuery {
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            filters: Vec::new(),
            metrics: Vec::new(),
            dimensions: Vec::new(),
            start_date,
            end_date,
            order_by: Vec::new(),
        }
    }

    /// Daily report for one ad client over the `days` leading up to `today`.
    pub fn ad_client_daily(
        reporting_dimension_id: &str,
        today: NaiveDate,
        days: u32,
    ) -> Result<Self> {
        let (start, end) = trailing_window(today, days)?;
        Ok(Self::new(start, end)
            .metrics(DEFAULT_METRICS)
            .dimensions(["DATE"])
            .filter(ad_client_filter(reporting_dimension_id))
            .order_by("+DATE"))
    }

    pub fn metrics<I, S>(mut self, metrics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.metrics.extend(metrics.into_iter().map(Into::into));
        self
    }

    pub fn dimensions<I, S>(mut self, dimensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dimensions.extend(dimensions.into_iter().map(Into::into));
        self
    }

    pub fn filter(mut self, clause: impl Into<String>) -> Self {
        self.filters.push(clause.into());
        self
    }

    pub fn order_by(mut self, sort: impl Into<String>) -> Self {
        self.order_by.push(sort.into());
        self
    }

    pub fn filters(&self) -> &[String] {
        &self.filters
    }

    pub fn metric_ids(&self) -> &[String] {
        &self.metrics
    }

    pub fn dimension_ids(&self) -> &[String] {
        &self.dimensions
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end_date
    }

    pub fn ordering(&self) -> &[String] {
        &self.order_by
    }

    /// Query string pairs for `reports:generate`. List-valued parameters are
    /// repeated once per value.
    pub fn to_query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = vec![("dateRange".to_string(), "CUSTOM".to_string())];
        for (key, value) in date_to_fields("startDate", self.start_date)
            .into_iter()
            .chain(date_to_fields("endDate", self.end_date))
        {
            pairs.push((key, value.to_string()));
        }
        let repeated = [
            ("metrics", &self.metrics),
            ("dimensions", &self.dimensions),
            ("filters", &self.filters),
            ("orderBy", &self.order_by),
        ];
        for (key, values) in repeated {
            pairs.extend(values.iter().map(|v| (key.to_string(), v.clone())));
        }
        pairs
    }
}
