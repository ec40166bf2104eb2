use crate::bucket::TimeRange;
use crate::error::{DashboardError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One bucket's aggregate value for a single metric series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataPoint {
    #[schemars(description = "Bucket date in YYYY-MM-DD format")]
    pub date: NaiveDate,

    #[schemars(description = "Aggregate metric value for the bucket, never negative")]
    pub value: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Optional display label for the bucket")]
    pub label: Option<String>,
}

/// One cash flow bucket: gross movements plus the running balance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowDataPoint {
    #[schemars(description = "Bucket date in YYYY-MM-DD format")]
    pub date: NaiveDate,

    #[schemars(description = "Net flow for the bucket (inflow minus outflow), may be negative")]
    pub value: f64,

    #[schemars(description = "Total money in for the bucket")]
    pub inflow: f64,

    #[schemars(description = "Total money out for the bucket")]
    pub outflow: f64,

    #[schemars(description = "Running balance after this bucket's net flow")]
    pub balance: f64,

    #[serde(default)]
    #[schemars(
        description = "True for synthetic future buckets appended after all historical buckets"
    )]
    pub is_projected: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Full-bucket inflow estimate for paced or projected buckets")]
    pub expected_inflow: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Full-bucket outflow estimate for paced or projected buckets")]
    pub expected_outflow: Option<f64>,
}

/// Dashboard chart identifier, matching the kebab-case wire values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ChartType {
    #[schemars(description = "Composite cash flow chart with inflow, outflow and balance")]
    CashFlow,

    #[schemars(description = "Profit over time")]
    Profit,

    #[schemars(description = "Expenses over time")]
    Expenses,

    #[schemars(description = "Revenue over time")]
    Revenue,
}

/// The three plain value series next to the cash flow composite.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Profit,
    Expenses,
    Revenue,
}

impl ChartType {
    /// The plain metric behind this chart, if it is not the cash flow
    /// composite.
    pub fn metric(&self) -> Option<MetricKind> {
        match self {
            ChartType::CashFlow => None,
            ChartType::Profit => Some(MetricKind::Profit),
            ChartType::Expenses => Some(MetricKind::Expenses),
            ChartType::Revenue => Some(MetricKind::Revenue),
        }
    }
}

impl MetricKind {
    pub fn chart_type(&self) -> ChartType {
        match self {
            MetricKind::Profit => ChartType::Profit,
            MetricKind::Expenses => ChartType::Expenses,
            MetricKind::Revenue => ChartType::Revenue,
        }
    }
}

impl fmt::Display for ChartType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChartType::CashFlow => "cash-flow",
            ChartType::Profit => "profit",
            ChartType::Expenses => "expenses",
            ChartType::Revenue => "revenue",
        };
        f.write_str(label)
    }
}

impl FromStr for ChartType {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "cash-flow" => Ok(ChartType::CashFlow),
            "profit" => Ok(ChartType::Profit),
            "expenses" => Ok(ChartType::Expenses),
            "revenue" => Ok(ChartType::Revenue),
            other => Err(DashboardError::Validation(format!(
                "Unknown chart type: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MetricKind::Profit => "profit",
            MetricKind::Expenses => "expenses",
            MetricKind::Revenue => "revenue",
        };
        f.write_str(label)
    }
}

/// Explicit start and end dates for custom windows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomDateRange {
    #[schemars(description = "Inclusive start of the window")]
    pub start: NaiveDate,

    #[schemars(description = "Inclusive end of the window, never before start")]
    pub end: NaiveDate,
}

/// Chart data request consumed by the mock service.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataRequest {
    #[schemars(description = "Window to report over")]
    pub time_range: TimeRange,

    #[schemars(description = "Which dashboard chart to produce data for")]
    pub chart_type: ChartType,

    /// Accepted and shape-checked for forward compatibility; no generator
    /// consumes it yet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_date_range: Option<CustomDateRange>,
}

impl ChartDataRequest {
    pub fn new(time_range: TimeRange, chart_type: ChartType) -> Self {
        Self {
            time_range,
            chart_type,
            custom_date_range: None,
        }
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ChartDataRequest)
    }

    pub fn schema_as_json() -> Result<String> {
        let schema = Self::generate_json_schema();
        Ok(serde_json::to_string_pretty(&schema)?)
    }
}

/// Context travelling with every successful response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub time_range: TimeRange,

    #[schemars(description = "Number of points in the data array")]
    pub data_points: usize,

    #[schemars(description = "RFC 3339 timestamp of generation")]
    pub generated_at: DateTime<Utc>,
}

impl ResponseMetadata {
    fn new(time_range: TimeRange, data_points: usize) -> Self {
        Self {
            time_range,
            data_points,
            generated_at: Utc::now(),
        }
    }
}

/// Success envelope for plain metric series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChartDataResponse {
    pub success: bool,
    pub data: Vec<ChartDataPoint>,
    pub metadata: ResponseMetadata,
}

impl ChartDataResponse {
    pub fn new(data: Vec<ChartDataPoint>, time_range: TimeRange) -> Self {
        let metadata = ResponseMetadata::new(time_range, data.len());
        Self {
            success: true,
            data,
            metadata,
        }
    }
}

/// Success envelope for the cash flow series.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashFlowResponse {
    pub success: bool,
    pub data: Vec<CashFlowDataPoint>,
    pub metadata: ResponseMetadata,
}

impl CashFlowResponse {
    pub fn new(data: Vec<CashFlowDataPoint>, time_range: TimeRange) -> Self {
        let metadata = ResponseMetadata::new(time_range, data.len());
        Self {
            success: true,
            data,
            metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    #[schemars(description = "Stable machine-readable error code")]
    pub code: String,

    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Error envelope mirroring the success envelope's shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrorResponse {
    pub success: bool,
    pub error: ErrorBody,
}

impl ApiErrorResponse {
    pub fn from_error(err: &DashboardError) -> Self {
        Self {
            success: false,
            error: ErrorBody {
                code: err.code().to_string(),
                message: err.to_string(),
                details: None,
            },
        }
    }
}

/// Dashboard color theme.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
}

/// Persisted user-facing settings, not subject to cache expiry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserPreferences {
    #[schemars(description = "Default window applied when the dashboard opens")]
    pub time_range: TimeRange,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Theme>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<bool>,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            time_range: TimeRange::ThirtyDays,
            theme: None,
            notifications: None,
        }
    }
}

/// Shape checks on an incoming request before any generation runs.
pub fn validate_chart_request(request: &ChartDataRequest) -> Result<()> {
    if let Some(range) = &request.custom_date_range {
        if range.end < range.start {
            return Err(DashboardError::Validation(format!(
                "Custom date range ends {} before it starts {}",
                range.end, range.start
            )));
        }
    }
    Ok(())
}

/// Check a plain metric series: finite non-negative values and strictly
/// increasing dates.
pub fn validate_chart_series(points: &[ChartDataPoint]) -> Result<()> {
    for (i, point) in points.iter().enumerate() {
        if !point.value.is_finite() || point.value < 0.0 {
            return Err(DashboardError::Validation(format!(
                "Point {} ({}) has invalid value {}",
                i, point.date, point.value
            )));
        }
    }
    validate_ascending_dates(points.iter().map(|p| p.date))
}

/// Check a cash flow series: gross amounts, the net flow identity, the
/// running balance chain, date order and projected tail placement.
pub fn validate_cash_flow_series(points: &[CashFlowDataPoint]) -> Result<()> {
    const EPSILON: f64 = 1e-6;

    let mut seen_projected = false;
    for (i, point) in points.iter().enumerate() {
        if !point.inflow.is_finite() || point.inflow < 0.0 {
            return Err(DashboardError::Validation(format!(
                "Point {} ({}) has invalid inflow {}",
                i, point.date, point.inflow
            )));
        }
        if !point.outflow.is_finite() || point.outflow < 0.0 {
            return Err(DashboardError::Validation(format!(
                "Point {} ({}) has invalid outflow {}",
                i, point.date, point.outflow
            )));
        }
        if (point.value - (point.inflow - point.outflow)).abs() > EPSILON {
            return Err(DashboardError::Validation(format!(
                "Point {} ({}): net flow {} must equal inflow {} minus outflow {}",
                i, point.date, point.value, point.inflow, point.outflow
            )));
        }
        if i > 0 {
            let prior = &points[i - 1];
            if (point.balance - (prior.balance + point.value)).abs() > EPSILON {
                return Err(DashboardError::Validation(format!(
                    "Point {} ({}): balance {} must advance from {} by the net flow {}",
                    i, point.date, point.balance, prior.balance, point.value
                )));
            }
        }
        if point.is_projected {
            seen_projected = true;
        } else if seen_projected {
            return Err(DashboardError::Validation(format!(
                "Point {} ({}) is historical but follows a projected point",
                i, point.date
            )));
        }
    }
    validate_ascending_dates(points.iter().map(|p| p.date))
}

fn validate_ascending_dates(dates: impl Iterator<Item = NaiveDate>) -> Result<()> {
    let mut prev: Option<NaiveDate> = None;
    for date in dates {
        if let Some(prev) = prev {
            if date <= prev {
                return Err(DashboardError::Validation(format!(
                    "Dates must be strictly increasing: {} follows {}",
                    date, prev
                )));
            }
        }
        prev = Some(date);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn cash_flow_point(date: NaiveDate, inflow: f64, outflow: f64, balance: f64) -> CashFlowDataPoint {
        CashFlowDataPoint {
            date,
            value: inflow - outflow,
            inflow,
            outflow,
            balance,
            is_projected: false,
            expected_inflow: None,
            expected_outflow: None,
        }
    }

    #[test]
    fn test_request_wire_format() {
        let request = ChartDataRequest::new(TimeRange::SevenDays, ChartType::CashFlow);
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"timeRange\":\"7D\""));
        assert!(json.contains("\"chartType\":\"cash-flow\""));
        assert!(!json.contains("customDateRange"));
    }

    #[test]
    fn test_chart_type_round_trip() {
        for chart_type in [
            ChartType::CashFlow,
            ChartType::Profit,
            ChartType::Expenses,
            ChartType::Revenue,
        ] {
            let parsed: ChartType = chart_type.to_string().parse().unwrap();
            assert_eq!(parsed, chart_type);
        }
        assert!("bogus".parse::<ChartType>().is_err());
    }

    #[test]
    fn test_cash_flow_point_serialization() {
        let point = CashFlowDataPoint {
            date: day(2024, 6, 19),
            value: 3000.0,
            inflow: 10000.0,
            outflow: 7000.0,
            balance: 53000.0,
            is_projected: true,
            expected_inflow: Some(10500.0),
            expected_outflow: None,
        };

        let json = serde_json::to_string(&point).unwrap();
        assert!(json.contains("\"isProjected\":true"));
        assert!(json.contains("\"expectedInflow\":10500.0"));
        assert!(!json.contains("expectedOutflow"));

        // Older payloads without the projection fields still deserialize.
        let legacy = r#"{"date":"2024-06-19","value":3000.0,"inflow":10000.0,"outflow":7000.0,"balance":53000.0}"#;
        let parsed: CashFlowDataPoint = serde_json::from_str(legacy).unwrap();
        assert!(!parsed.is_projected);
        assert_eq!(parsed.expected_inflow, None);
    }

    #[test]
    fn test_envelope_wire_format() {
        let response = ChartDataResponse::new(
            vec![ChartDataPoint {
                date: day(2024, 6, 19),
                value: 8500.0,
                label: None,
            }],
            TimeRange::SevenDays,
        );

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"dataPoints\":1"));
        assert!(json.contains("\"generatedAt\""));
        assert!(json.contains("\"timeRange\":\"7D\""));
    }

    #[test]
    fn test_error_envelope_from_error() {
        let err = DashboardError::Validation("Unknown chart type: bogus".to_string());
        let envelope = ApiErrorResponse::from_error(&err);
        assert!(!envelope.success);
        assert_eq!(envelope.error.code, "VALIDATION_ERROR");

        let json = serde_json::to_string(&envelope).unwrap();
        assert!(json.contains("\"success\":false"));
        assert!(!json.contains("details"));
    }

    #[test]
    fn test_validate_chart_request_rejects_inverted_range() {
        let mut request = ChartDataRequest::new(TimeRange::Custom, ChartType::Profit);
        request.custom_date_range = Some(CustomDateRange {
            start: day(2024, 6, 19),
            end: day(2024, 6, 1),
        });

        assert!(validate_chart_request(&request).is_err());

        request.custom_date_range = Some(CustomDateRange {
            start: day(2024, 6, 1),
            end: day(2024, 6, 1),
        });
        assert!(validate_chart_request(&request).is_ok());
    }

    #[test]
    fn test_validate_chart_series() {
        let good = vec![
            ChartDataPoint {
                date: day(2024, 6, 18),
                value: 100.0,
                label: None,
            },
            ChartDataPoint {
                date: day(2024, 6, 19),
                value: 0.0,
                label: None,
            },
        ];
        assert!(validate_chart_series(&good).is_ok());

        let negative = vec![ChartDataPoint {
            date: day(2024, 6, 19),
            value: -1.0,
            label: None,
        }];
        assert!(validate_chart_series(&negative).is_err());

        let unordered = vec![good[1].clone(), good[0].clone()];
        assert!(validate_chart_series(&unordered).is_err());
    }

    #[test]
    fn test_validate_cash_flow_series_balance_chain() {
        let mut points = vec![
            cash_flow_point(day(2024, 6, 17), 10000.0, 7000.0, 53000.0),
            cash_flow_point(day(2024, 6, 18), 11000.0, 7600.0, 56400.0),
        ];
        assert!(validate_cash_flow_series(&points).is_ok());

        points[1].balance = 60000.0;
        assert!(
            validate_cash_flow_series(&points).is_err(),
            "broken balance chain must be rejected"
        );
    }

    #[test]
    fn test_validate_cash_flow_series_net_identity() {
        let mut points = vec![cash_flow_point(day(2024, 6, 17), 10000.0, 7000.0, 53000.0)];
        points[0].value = 2000.0;
        assert!(validate_cash_flow_series(&points).is_err());
    }

    #[test]
    fn test_validate_cash_flow_series_projected_tail() {
        let mut points = vec![
            cash_flow_point(day(2024, 6, 17), 10000.0, 7000.0, 53000.0),
            cash_flow_point(day(2024, 6, 18), 11000.0, 7600.0, 56400.0),
            cash_flow_point(day(2024, 6, 19), 10200.0, 7700.0, 58900.0),
        ];
        points[1].is_projected = true;

        assert!(
            validate_cash_flow_series(&points).is_err(),
            "historical point after a projected one must be rejected"
        );

        points[2].is_projected = true;
        assert!(validate_cash_flow_series(&points).is_ok());
    }

    #[test]
    fn test_user_preferences_round_trip() {
        let preferences = UserPreferences {
            time_range: TimeRange::SevenDays,
            theme: Some(Theme::Dark),
            notifications: Some(true),
        };

        let json = serde_json::to_string(&preferences).unwrap();
        assert!(json.contains("\"timeRange\":\"7D\""));
        assert!(json.contains("\"theme\":\"dark\""));

        let parsed: UserPreferences = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, preferences);

        let minimal: UserPreferences = serde_json::from_str(r#"{"timeRange":"30D"}"#).unwrap();
        assert_eq!(minimal, UserPreferences::default());
    }

    #[test]
    fn test_schema_generation() {
        let schema_json = ChartDataRequest::schema_as_json().unwrap();
        assert!(schema_json.contains("timeRange"));
        assert!(schema_json.contains("chartType"));
        assert!(schema_json.contains("customDateRange"));
    }
}
