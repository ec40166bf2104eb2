//! # Financial Dashboard Data
//!
//! Mock data engine for a financial analytics dashboard: deterministic
//! time-series generation for profit, expenses and revenue, a cash flow
//! generator with current-bucket pacing and projected future buckets,
//! period-over-period delta comparisons, and a TTL cache with pluggable
//! storage.
//!
//! ## Core Concepts
//!
//! - **Bucket**: one discrete time slot (day, week or month) represented by
//!   a single data point. A [`TimeRange`] resolves to a bucket count and
//!   granularity against a reference date.
//! - **Net flow**: inflow minus outflow for one cash flow bucket. The
//!   running balance accumulates net flows from a fixed starting balance.
//! - **Pacing**: the newest cash flow bucket is scaled to its elapsed
//!   fraction and carries a full-bucket expectation blended from trailing
//!   averages and the live pace.
//! - **Projected point**: a synthetic future bucket appended after all
//!   historical buckets, extending the recent net flow trend.
//! - **Delta**: relative change between the current and previous window's
//!   aggregate, with an up/down/neutral trend.
//!
//! ## Example
//!
//! ```rust,ignore
//! use financial_dashboard_data::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let service = MockDataService::new();
//!
//!     let request = ChartDataRequest::new(TimeRange::SevenDays, ChartType::Profit);
//!     let profit = service.get_chart_data(&request).await?;
//!     assert_eq!(profit.data.len(), 7);
//!
//!     let cash_flow = service.get_cash_flow_data(TimeRange::ThirtyDays).await?;
//!     let projected = cash_flow.data.iter().filter(|p| p.is_projected).count();
//!     assert_eq!(projected, 3);
//!
//!     let deltas = service.delta_comparisons(TimeRange::ThirtyDays)?;
//!     println!("profit: {}", deltas.profit.signed_label());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod bucket;
pub mod cache;
pub mod delta;
pub mod engine;
pub mod error;
pub mod schema;
pub mod seasonality;
pub mod service;
pub mod store;
pub mod utils;

pub use api::{handle_cash_flow_request, handle_charts_request, ApiReply};
pub use bucket::{BucketSpec, Period, TimeRange};
pub use cache::{
    metric_key, CacheLookup, CacheStore, FileStorage, MemoryStorage, StorageBackend, CACHE_TTL_MS,
    CASH_FLOW_KEY, EXPENSES_KEY, PROFIT_KEY, REVENUE_KEY, USER_PREFERENCES_KEY,
};
pub use delta::{
    compare_series, compare_totals, DeltaComparison, MetricDeltas, SeriesValue, Trend,
};
pub use engine::{GeneratorConfig, SeriesGenerator};
pub use error::{DashboardError, Result};
pub use schema::*;
pub use seasonality::{
    monthly_factor, weekend_factor, GaussianVariation, TrigVariation, VariationStrategy,
};
pub use service::{AllChartData, MockDataService, DEFAULT_DELAY};
pub use store::DashboardStore;
pub use utils::*;

/// One-shot chart data fetch through a default service.
pub async fn fetch_chart_data(request: &ChartDataRequest) -> Result<ChartDataResponse> {
    MockDataService::new().get_chart_data(request).await
}

/// One-shot cash flow fetch through a default service.
pub async fn fetch_cash_flow_data(time_range: TimeRange) -> Result<CashFlowResponse> {
    MockDataService::new().get_cash_flow_data(time_range).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::time::Duration;

    fn pinned_service() -> MockDataService {
        let config = GeneratorConfig {
            today: Some(NaiveDate::from_ymd_opt(2024, 6, 19).unwrap()),
            ..GeneratorConfig::default()
        };
        MockDataService::with_generator(SeriesGenerator::new(config).unwrap())
            .with_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_end_to_end_seven_day_profit() {
        let service = pinned_service();
        let request = ChartDataRequest::new(TimeRange::SevenDays, ChartType::Profit);

        let response = service.get_chart_data(&request).await.unwrap();
        assert!(response.success);
        assert_eq!(response.data.len(), 7);
        assert_eq!(response.metadata.data_points, 7);
        assert!(
            response.data.iter().all(|p| p.value >= 0.0),
            "metric series never go negative"
        );
        assert!(validate_chart_series(&response.data).is_ok());
    }

    #[tokio::test]
    async fn test_end_to_end_thirty_day_cash_flow() {
        let service = pinned_service();

        let response = service
            .get_cash_flow_data(TimeRange::ThirtyDays)
            .await
            .unwrap();
        assert_eq!(response.data.len(), 33);
        assert!(validate_cash_flow_series(&response.data).is_ok());

        let projected = response.data.iter().filter(|p| p.is_projected).count();
        assert_eq!(projected, 3, "30D appends three projected buckets");

        for window in response.data.windows(2) {
            let expected = window[0].balance + window[1].value;
            assert!(
                (window[1].balance - expected).abs() < 1e-6,
                "balance on {} should be {}, got {}",
                window[1].date,
                expected,
                window[1].balance
            );
        }
    }

    #[tokio::test]
    async fn test_end_to_end_store_cycle() {
        let service = pinned_service();
        let cache = CacheStore::new(Box::new(MemoryStorage::new()));
        let mut store = DashboardStore::new(service, cache);

        store.ensure_initialized().await.unwrap();
        assert_eq!(store.cash_flow_data().len(), 33);
        assert!(store.deltas().is_some());

        store.refresh_all().await.unwrap();
        assert!(!store.is_loading());
        assert_eq!(store.profit_data().len(), 30);
    }

    #[tokio::test]
    async fn test_one_shot_fetch_helpers() {
        // The free functions spin up a default service per call, clocked on
        // the real date, so only date-independent shapes are asserted.
        let request = ChartDataRequest::new(TimeRange::SevenDays, ChartType::Profit);
        let profit = fetch_chart_data(&request).await.unwrap();
        assert!(profit.success);
        assert_eq!(profit.data.len(), 7);
        assert!(profit.data.iter().all(|p| p.value >= 0.0));

        let cash_flow = fetch_cash_flow_data(TimeRange::ThirtyDays).await.unwrap();
        assert_eq!(cash_flow.data.len(), 33);
        assert!(validate_cash_flow_series(&cash_flow.data).is_ok());
    }
}
