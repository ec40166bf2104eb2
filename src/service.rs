use crate::delta::{compare_series, MetricDeltas};
use crate::engine::SeriesGenerator;
use crate::error::{DashboardError, Result};
use crate::schema::{
    validate_chart_request, validate_chart_series, ApiErrorResponse, CashFlowDataPoint,
    CashFlowResponse, ChartDataPoint, ChartDataRequest, ChartDataResponse, ChartType, MetricKind,
};
use crate::bucket::TimeRange;
use log::{error, info};
use std::time::Duration;
use tokio::time::sleep;

/// Default simulated network latency.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(15);

/// Request-validating facade over the generators, behaving like a remote
/// chart API: a short artificial delay, success envelopes on the way out and
/// coded errors on the way back.
pub struct MockDataService {
    generator: SeriesGenerator,
    delay: Duration,
}

impl Default for MockDataService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDataService {
    pub fn new() -> Self {
        Self::with_generator(SeriesGenerator::default())
    }

    pub fn with_generator(generator: SeriesGenerator) -> Self {
        Self {
            generator,
            delay: DEFAULT_DELAY,
        }
    }

    /// Replace the simulated latency; tests usually pass zero.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Validate, generate and wrap a chart series for any chart type.
    ///
    /// Cash flow requested through this endpoint is flattened to plain chart
    /// points carrying the net flow per bucket.
    pub async fn get_chart_data(&self, request: &ChartDataRequest) -> Result<ChartDataResponse> {
        validate_chart_request(request)?;
        sleep(self.delay).await;

        let data = match request.chart_type {
            ChartType::CashFlow => {
                let cash_flow = self.generator.generate_cash_flow(request.time_range)?;
                flatten_cash_flow(&cash_flow)
            }
            ChartType::Profit => self
                .generator
                .generate_metric(MetricKind::Profit, request.time_range)?,
            ChartType::Expenses => self
                .generator
                .generate_metric(MetricKind::Expenses, request.time_range)?,
            ChartType::Revenue => self
                .generator
                .generate_metric(MetricKind::Revenue, request.time_range)?,
        };

        validate_chart_series(&data)?;
        info!(
            "Served {} chart data for {} ({} points)",
            request.chart_type,
            request.time_range,
            data.len()
        );
        Ok(ChartDataResponse::new(data, request.time_range))
    }

    /// Generate and wrap the full cash flow series, projections included.
    pub async fn get_cash_flow_data(&self, time_range: TimeRange) -> Result<CashFlowResponse> {
        sleep(self.delay).await;

        let data = self.generator.generate_cash_flow(time_range)?;
        info!(
            "Served cash flow data for {} ({} points)",
            time_range,
            data.len()
        );
        Ok(CashFlowResponse::new(data, time_range))
    }

    /// Fetch all four dashboard series concurrently. Each result stands on
    /// its own so one failure does not discard the other three.
    pub async fn get_all_chart_data(&self, time_range: TimeRange) -> AllChartData {
        let profit_request = ChartDataRequest::new(time_range, ChartType::Profit);
        let expenses_request = ChartDataRequest::new(time_range, ChartType::Expenses);
        let revenue_request = ChartDataRequest::new(time_range, ChartType::Revenue);
        let (cash_flow, profit, expenses, revenue) = futures::join!(
            self.get_cash_flow_data(time_range),
            self.get_chart_data(&profit_request),
            self.get_chart_data(&expenses_request),
            self.get_chart_data(&revenue_request),
        );

        AllChartData {
            cash_flow,
            profit,
            expenses,
            revenue,
        }
    }

    /// Period-over-period comparisons for all four metrics. Cash flow is
    /// compared on realized buckets only, so the projected tail cannot skew
    /// the delta.
    pub fn delta_comparisons(&self, time_range: TimeRange) -> Result<MetricDeltas> {
        let (cash_current, cash_previous) = self.generator.cash_flow_pair(time_range)?;
        let realized: Vec<CashFlowDataPoint> = cash_current
            .into_iter()
            .filter(|p| !p.is_projected)
            .collect();

        let (profit_current, profit_previous) =
            self.generator.metric_pair(MetricKind::Profit, time_range)?;
        let (expenses_current, expenses_previous) =
            self.generator.metric_pair(MetricKind::Expenses, time_range)?;
        let (revenue_current, revenue_previous) =
            self.generator.metric_pair(MetricKind::Revenue, time_range)?;

        Ok(MetricDeltas {
            cash_flow: compare_series(&realized, &cash_previous),
            profit: compare_series(&profit_current, &profit_previous),
            expenses: compare_series(&expenses_current, &expenses_previous),
            revenue: compare_series(&revenue_current, &revenue_previous),
        })
    }

    /// Error envelope for a failed call, logged the way a remote API would.
    pub fn error_envelope(err: &DashboardError) -> ApiErrorResponse {
        error!("Mock API error: {}", err);
        ApiErrorResponse::from_error(err)
    }
}

/// Carry the net flow over to the plain chart point shape.
fn flatten_cash_flow(points: &[CashFlowDataPoint]) -> Vec<ChartDataPoint> {
    points
        .iter()
        .map(|p| ChartDataPoint {
            date: p.date,
            value: p.value,
            label: None,
        })
        .collect()
}

/// Results of one concurrent fetch of all four dashboard series.
#[derive(Debug)]
pub struct AllChartData {
    pub cash_flow: Result<CashFlowResponse>,
    pub profit: Result<ChartDataResponse>,
    pub expenses: Result<ChartDataResponse>,
    pub revenue: Result<ChartDataResponse>,
}
