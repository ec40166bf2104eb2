use crate::bucket::{BucketSpec, TimeRange};
use crate::error::{DashboardError, Result};
use crate::schema::{
    validate_cash_flow_series, validate_chart_series, CashFlowDataPoint, ChartDataPoint,
    MetricKind,
};
use crate::seasonality::{monthly_factor, weekend_factor, TrigVariation, VariationStrategy};
use chrono::{NaiveDate, Utc};
use log::debug;

/// Tunables for the mock generators.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Balance carried into the first historical cash flow bucket.
    pub starting_balance: f64,

    /// Starting balance used for previous-window cash flow series.
    pub previous_starting_balance: f64,

    /// Pin the reference date; `None` uses the current UTC date.
    pub today: Option<NaiveDate>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            starting_balance: 50_000.0,
            previous_starting_balance: 45_000.0,
            today: None,
        }
    }
}

impl GeneratorConfig {
    pub fn validate(&self) -> Result<()> {
        if !self.starting_balance.is_finite() || !self.previous_starting_balance.is_finite() {
            return Err(DashboardError::Validation(
                "Starting balances must be finite".to_string(),
            ));
        }
        Ok(())
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }
}

/// Deterministic generator for metric and cash flow series.
pub struct SeriesGenerator {
    config: GeneratorConfig,
    variation: Box<dyn VariationStrategy>,
}

impl Default for SeriesGenerator {
    fn default() -> Self {
        Self {
            config: GeneratorConfig::default(),
            variation: Box::new(TrigVariation),
        }
    }
}

impl SeriesGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self> {
        Self::with_variation(config, Box::new(TrigVariation))
    }

    pub fn with_variation(
        config: GeneratorConfig,
        variation: Box<dyn VariationStrategy>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, variation })
    }

    /// Build one metric series for the requested window, oldest bucket first.
    pub fn generate_metric(
        &self,
        metric: MetricKind,
        time_range: TimeRange,
    ) -> Result<Vec<ChartDataPoint>> {
        let today = self.config.today();
        let spec = time_range.resolve(today);
        let series = self.metric_series(metric, spec, today, false)?;

        debug!(
            "Generated {} {} points for {}",
            series.len(),
            metric,
            time_range
        );
        Ok(series)
    }

    /// The metric series one full window earlier, mildly dampened, for
    /// period-over-period comparisons.
    pub fn previous_metric(
        &self,
        metric: MetricKind,
        time_range: TimeRange,
    ) -> Result<Vec<ChartDataPoint>> {
        let today = self.config.today();
        let spec = time_range.resolve(today);
        self.metric_series(metric, spec, spec.previous_window(today), true)
    }

    /// Current and previous window series for one metric.
    pub fn metric_pair(
        &self,
        metric: MetricKind,
        time_range: TimeRange,
    ) -> Result<(Vec<ChartDataPoint>, Vec<ChartDataPoint>)> {
        Ok((
            self.generate_metric(metric, time_range)?,
            self.previous_metric(metric, time_range)?,
        ))
    }

    fn metric_series(
        &self,
        metric: MetricKind,
        spec: BucketSpec,
        reference: NaiveDate,
        dampened: bool,
    ) -> Result<Vec<ChartDataPoint>> {
        let base = base_value(metric);
        let mut series = Vec::with_capacity(spec.count);

        for i in 0..spec.count {
            let date = spec.bucket_date(i, reference);

            // 1. Base level, 2. weekend and mid-month seasonality,
            // 3. per-bucket variation, 4. bucket-length scaling.
            let mut value = base
                * weekend_factor(date, spec.period)
                * monthly_factor(date)
                * self.variation.variation(i)
                * spec.period.multiplier();
            if dampened {
                value *= self.dampening(i);
            }

            series.push(ChartDataPoint {
                date,
                value: value.round(),
                label: None,
            });
        }

        validate_chart_series(&series)?;
        Ok(series)
    }

    /// Dampening factor keeping previous-window values slightly below the
    /// current ones.
    fn dampening(&self, index: usize) -> f64 {
        (0.95 * self.variation.variation(index)).clamp(0.85, 1.05)
    }

    /// Build the cash flow series: historical buckets, a paced current bucket
    /// and a short projected tail.
    pub fn generate_cash_flow(&self, time_range: TimeRange) -> Result<Vec<CashFlowDataPoint>> {
        let today = self.config.today();
        let spec = time_range.resolve(today);
        let projected = time_range.projected_buckets();

        let mut series = cash_flow_history(spec, today, self.config.starting_balance);
        if !series.is_empty() {
            pace_current_bucket(&mut series, spec, today, self.config.starting_balance);
            append_projections(&mut series, spec, projected);
        }

        validate_cash_flow_series(&series)?;
        debug!(
            "Generated {} cash flow points for {} ({} projected)",
            series.len(),
            time_range,
            projected
        );
        Ok(series)
    }

    /// Cash flow history one full window earlier, without pacing or
    /// projections, for period-over-period comparisons.
    pub fn previous_cash_flow(&self, time_range: TimeRange) -> Result<Vec<CashFlowDataPoint>> {
        let today = self.config.today();
        let spec = time_range.resolve(today);
        let series = cash_flow_history(
            spec,
            spec.previous_window(today),
            self.config.previous_starting_balance,
        );

        validate_cash_flow_series(&series)?;
        Ok(series)
    }

    /// Current and previous window cash flow series.
    pub fn cash_flow_pair(
        &self,
        time_range: TimeRange,
    ) -> Result<(Vec<CashFlowDataPoint>, Vec<CashFlowDataPoint>)> {
        Ok((
            self.generate_cash_flow(time_range)?,
            self.previous_cash_flow(time_range)?,
        ))
    }
}

fn base_value(metric: MetricKind) -> f64 {
    match metric {
        MetricKind::Profit => 8_500.0,
        MetricKind::Expenses => 4_500.0,
        MetricKind::Revenue => 15_000.0,
    }
}

fn cash_flow_history(
    spec: BucketSpec,
    reference: NaiveDate,
    starting_balance: f64,
) -> Vec<CashFlowDataPoint> {
    let multiplier = spec.period.multiplier();
    let mut balance = starting_balance;
    let mut series = Vec::with_capacity(spec.count);

    for i in 0..spec.count {
        // Fixed index patterns keep every bucket's net flow positive.
        let inflow = ((10_000 + (i % 3) * 1_000 + (i % 7) * 200) as f64 * multiplier).round();
        let outflow = ((7_000 + (i % 4) * 600 + (i % 5) * 100) as f64 * multiplier).round();
        let net = inflow - outflow;
        balance += net;

        series.push(CashFlowDataPoint {
            date: spec.bucket_date(i, reference),
            value: net,
            inflow,
            outflow,
            balance,
            is_projected: false,
            expected_inflow: None,
            expected_outflow: None,
        });
    }

    series
}

/// Rescale the newest bucket to its elapsed fraction and attach full-bucket
/// expectations blended from trailing averages and the live pace.
fn pace_current_bucket(
    series: &mut [CashFlowDataPoint],
    spec: BucketSpec,
    today: NaiveDate,
    starting_balance: f64,
) {
    let last = series.len() - 1;
    let progress = spec.period.progress(today);

    // Trailing basis: up to three buckets before the current one. A window
    // with no prior buckets falls back to the current bucket's own full
    // values.
    let trailing = &series[last.saturating_sub(3)..last];
    let (avg_inflow, avg_outflow) = if trailing.is_empty() {
        (series[last].inflow, series[last].outflow)
    } else {
        let n = trailing.len() as f64;
        (
            trailing.iter().map(|p| p.inflow).sum::<f64>() / n,
            trailing.iter().map(|p| p.outflow).sum::<f64>() / n,
        )
    };

    let scaled_inflow = (series[last].inflow * progress).round();
    let scaled_outflow = (series[last].outflow * progress).round();
    let net = scaled_inflow - scaled_outflow;
    let prior_balance = if last == 0 {
        starting_balance
    } else {
        series[last - 1].balance
    };

    let point = &mut series[last];
    point.inflow = scaled_inflow;
    point.outflow = scaled_outflow;
    point.value = net;
    point.balance = prior_balance + net;
    point.expected_inflow = Some(expected_full_value(scaled_inflow, avg_inflow, progress));
    point.expected_outflow = Some(expected_full_value(scaled_outflow, avg_outflow, progress));
}

/// Append synthetic future buckets extending the recent net flow trend.
fn append_projections(series: &mut Vec<CashFlowDataPoint>, spec: BucketSpec, projected: usize) {
    if projected == 0 {
        return;
    }

    let tail = &series[series.len().saturating_sub(3)..];
    let avg_net = tail.iter().map(|p| p.value).sum::<f64>() / tail.len() as f64;

    let last = &series[series.len() - 1];
    let (inflow, outflow) = split_net_flow(avg_net, last.inflow, last.outflow);
    let net = inflow - outflow;

    let mut date = last.date;
    let mut balance = last.balance;
    for _ in 0..projected {
        date = spec.period.advance(date);
        balance += net;
        series.push(CashFlowDataPoint {
            date,
            value: net,
            inflow,
            outflow,
            balance,
            is_projected: true,
            expected_inflow: Some(inflow),
            expected_outflow: Some(outflow),
        });
    }
}

/// Full-bucket estimate for a partially elapsed bucket: blend the trailing
/// average with the live pace extrapolation, quadratically favoring the pace
/// as the bucket completes. Bounded to 60..140% of the trailing average and
/// never below the realized actual.
fn expected_full_value(actual: f64, trailing_avg: f64, progress: f64) -> f64 {
    let pace = actual / progress.max(0.1);
    let weight = progress * progress;
    let blended = trailing_avg * (1.0 - weight) + pace * weight;

    blended
        .clamp(trailing_avg * 0.6, trailing_avg * 1.4)
        .max(actual)
        .round()
}

/// Split a projected net flow into gross inflow and outflow using the last
/// bucket's mix, with the inflow to outflow ratio capped at 1.5.
fn split_net_flow(net: f64, last_inflow: f64, last_outflow: f64) -> (f64, f64) {
    if last_outflow > 0.0 {
        let ratio = (last_inflow / last_outflow).min(1.5);
        if (ratio - 1.0).abs() > 1e-3 {
            let outflow = net / (ratio - 1.0);
            if outflow > 0.0 {
                return ((ratio * outflow).round(), outflow.round());
            }
        }
    }

    // Degenerate mix: hold the outflow level and absorb the net into inflow.
    let outflow = last_outflow.max(0.0);
    let inflow = (outflow + net).max(0.0);
    (inflow.round(), outflow.round())
}
