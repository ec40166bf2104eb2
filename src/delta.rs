use crate::schema::{CashFlowDataPoint, ChartDataPoint};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Direction of a period-over-period change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

/// Relative change between the current and previous window of one metric.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeltaComparison {
    #[schemars(description = "Aggregate value over the current window")]
    pub current: f64,

    #[schemars(description = "Aggregate value over the previous window")]
    pub previous: f64,

    #[schemars(description = "Magnitude of the change in percent, never negative")]
    pub percentage: f64,

    pub trend: Trend,
}

impl DeltaComparison {
    /// Display label with an explicit sign, e.g. `+12.3%` or `-4.0%`.
    pub fn signed_label(&self) -> String {
        match self.trend {
            Trend::Up => format!("+{:.1}%", self.percentage),
            Trend::Down => format!("-{:.1}%", self.percentage),
            Trend::Neutral => format!("{:.1}%", self.percentage),
        }
    }
}

/// Deltas for the four dashboard metrics, computed over one window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetricDeltas {
    pub cash_flow: DeltaComparison,
    pub profit: DeltaComparison,
    pub expenses: DeltaComparison,
    pub revenue: DeltaComparison,
}

/// The value a series point contributes to a window aggregate.
pub trait SeriesValue {
    fn series_value(&self) -> f64;
}

impl SeriesValue for ChartDataPoint {
    fn series_value(&self) -> f64 {
        self.value
    }
}

impl SeriesValue for CashFlowDataPoint {
    /// Cash flow aggregates compare net flows, not gross movements.
    fn series_value(&self) -> f64 {
        self.value
    }
}

/// Compare two window aggregates. A zero previous value yields a neutral
/// percentage; the trend still follows the direct comparison.
pub fn compare_totals(current: f64, previous: f64) -> DeltaComparison {
    let percentage = if previous == 0.0 {
        0.0
    } else {
        ((current - previous) / previous * 100.0).abs()
    };

    let trend = if current > previous {
        Trend::Up
    } else if current < previous {
        Trend::Down
    } else {
        Trend::Neutral
    };

    DeltaComparison {
        current,
        previous,
        percentage,
        trend,
    }
}

/// Sum both series and compare the totals.
pub fn compare_series<P: SeriesValue>(current: &[P], previous: &[P]) -> DeltaComparison {
    let current_total: f64 = current.iter().map(SeriesValue::series_value).sum();
    let previous_total: f64 = previous.iter().map(SeriesValue::series_value).sum();
    compare_totals(current_total, previous_total)
}
