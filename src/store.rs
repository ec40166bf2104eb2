use crate::cache::CacheStore;
use crate::delta::MetricDeltas;
use crate::error::{DashboardError, Result};
use crate::schema::{
    CashFlowDataPoint, ChartDataPoint, ChartDataRequest, CustomDateRange, MetricKind,
    UserPreferences,
};
use crate::service::MockDataService;
use crate::bucket::TimeRange;
use log::{debug, info, warn};

/// Owns the dashboard's data, filters and loading state in one place instead
/// of a bag of ambient globals.
///
/// Loads are cache-first: a fresh cached entry matching the active time range
/// is used as-is, anything else goes through the service. When a fetch fails,
/// the store falls back to the last stored payload regardless of freshness
/// before giving up.
pub struct DashboardStore {
    service: MockDataService,
    cache: CacheStore,
    time_range: TimeRange,
    custom_date_range: Option<CustomDateRange>,
    cash_flow_data: Vec<CashFlowDataPoint>,
    profit_data: Vec<ChartDataPoint>,
    expenses_data: Vec<ChartDataPoint>,
    revenue_data: Vec<ChartDataPoint>,
    deltas: Option<MetricDeltas>,
    loading: bool,
    initialized: bool,
}

enum MetricFetch {
    Cached(Vec<ChartDataPoint>),
    Generated(Result<Vec<ChartDataPoint>>),
}

enum CashFlowFetch {
    Cached(Vec<CashFlowDataPoint>),
    Generated(Result<Vec<CashFlowDataPoint>>),
}

impl DashboardStore {
    pub fn new(service: MockDataService, cache: CacheStore) -> Self {
        Self {
            service,
            cache,
            time_range: TimeRange::ThirtyDays,
            custom_date_range: None,
            cash_flow_data: Vec::new(),
            profit_data: Vec::new(),
            expenses_data: Vec::new(),
            revenue_data: Vec::new(),
            deltas: None,
            loading: false,
            initialized: false,
        }
    }

    pub fn time_range(&self) -> TimeRange {
        self.time_range
    }

    /// Change the active window. Callers refresh afterwards; the old data
    /// stays visible until the refresh lands.
    pub fn set_time_range(&mut self, time_range: TimeRange) {
        if self.time_range != time_range {
            debug!("Time range changed to {}", time_range);
            self.time_range = time_range;
        }
    }

    pub fn custom_date_range(&self) -> Option<CustomDateRange> {
        self.custom_date_range
    }

    pub fn set_custom_date_range(&mut self, range: Option<CustomDateRange>) {
        self.custom_date_range = range;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn cash_flow_data(&self) -> &[CashFlowDataPoint] {
        &self.cash_flow_data
    }

    pub fn profit_data(&self) -> &[ChartDataPoint] {
        &self.profit_data
    }

    pub fn expenses_data(&self) -> &[ChartDataPoint] {
        &self.expenses_data
    }

    pub fn revenue_data(&self) -> &[ChartDataPoint] {
        &self.revenue_data
    }

    pub fn deltas(&self) -> Option<&MetricDeltas> {
        self.deltas.as_ref()
    }

    pub fn clear_cache(&self) -> Result<()> {
        self.cache.clear()
    }

    /// First load: serve from cache where possible, generate the rest. Later
    /// calls are no-ops once a load has succeeded.
    pub async fn ensure_initialized(&mut self) -> Result<()> {
        if self.initialized {
            return Ok(());
        }

        info!("Initializing dashboard data for {}", self.time_range);
        self.loading = true;
        let result = self.load_all(false).await;
        self.loading = false;
        self.initialized = result.is_ok();
        result
    }

    /// Regenerate all four series concurrently and recompute deltas. The
    /// loading flag is cleared even when a fetch fails.
    pub async fn refresh_all(&mut self) -> Result<()> {
        info!("Refreshing all dashboard data for {}", self.time_range);
        self.loading = true;
        let result = self.load_all(true).await;
        self.loading = false;
        result
    }

    /// Fetch the cash flow series on its own, cache-first unless forced.
    pub async fn fetch_cash_flow_data(&mut self, force_refresh: bool) -> Result<()> {
        let cached = if force_refresh {
            None
        } else {
            self.cached_cash_flow()
        };
        let fetch = cash_flow_fetch(&self.service, self.time_range, cached).await;
        self.apply_cash_flow(fetch)
    }

    /// Fetch one metric series on its own, cache-first unless forced.
    pub async fn fetch_metric_data(&mut self, metric: MetricKind, force_refresh: bool) -> Result<()> {
        let cached = if force_refresh {
            None
        } else {
            self.cached_metric(metric)
        };
        let fetch = metric_fetch(&self.service, metric, self.time_range, cached).await;
        self.apply_metric(metric, fetch)
    }

    /// Apply the persisted default time range, if any.
    pub fn load_preferences(&mut self) -> Result<()> {
        if let Some(preferences) = self.cache.load_user_preferences()? {
            debug!("Applying persisted time range {}", preferences.time_range);
            self.time_range = preferences.time_range;
        }
        Ok(())
    }

    pub fn save_preferences(&self, preferences: &UserPreferences) -> Result<()> {
        self.cache.save_user_preferences(preferences)
    }

    async fn load_all(&mut self, force_refresh: bool) -> Result<()> {
        let time_range = self.time_range;

        // Cache reads are synchronous; resolve them before the fetches so
        // only already-missing series hit the service.
        let (cached_cash_flow, cached_profit, cached_expenses, cached_revenue) = if force_refresh {
            (None, None, None, None)
        } else {
            (
                self.cached_cash_flow(),
                self.cached_metric(MetricKind::Profit),
                self.cached_metric(MetricKind::Expenses),
                self.cached_metric(MetricKind::Revenue),
            )
        };

        let service = &self.service;
        let (cash_flow, profit, expenses, revenue) = futures::join!(
            cash_flow_fetch(service, time_range, cached_cash_flow),
            metric_fetch(service, MetricKind::Profit, time_range, cached_profit),
            metric_fetch(service, MetricKind::Expenses, time_range, cached_expenses),
            metric_fetch(service, MetricKind::Revenue, time_range, cached_revenue),
        );

        // Apply every successful series before reporting the first failure,
        // so one broken metric does not blank the rest of the dashboard.
        let mut first_error = None;
        if let Err(err) = self.apply_cash_flow(cash_flow) {
            note_error(&mut first_error, err);
        }
        if let Err(err) = self.apply_metric(MetricKind::Profit, profit) {
            note_error(&mut first_error, err);
        }
        if let Err(err) = self.apply_metric(MetricKind::Expenses, expenses) {
            note_error(&mut first_error, err);
        }
        if let Err(err) = self.apply_metric(MetricKind::Revenue, revenue) {
            note_error(&mut first_error, err);
        }

        match first_error {
            Some(err) => Err(err),
            None => {
                self.deltas = Some(self.service.delta_comparisons(time_range)?);
                Ok(())
            }
        }
    }

    fn cached_cash_flow(&self) -> Option<Vec<CashFlowDataPoint>> {
        match self.cache.load_cash_flow_data() {
            Ok(lookup) => match lookup.fresh() {
                Some((data, time_range)) if time_range == self.time_range => {
                    debug!("Using cached cash flow data");
                    Some(data)
                }
                _ => None,
            },
            Err(err) => {
                warn!("Cache read failed for cash flow data: {}", err);
                None
            }
        }
    }

    fn cached_metric(&self, metric: MetricKind) -> Option<Vec<ChartDataPoint>> {
        match self.cache.load_chart_data(metric) {
            Ok(lookup) => match lookup.fresh() {
                Some((data, time_range)) if time_range == self.time_range => {
                    debug!("Using cached {} data", metric);
                    Some(data)
                }
                _ => None,
            },
            Err(err) => {
                warn!("Cache read failed for {} data: {}", metric, err);
                None
            }
        }
    }

    fn apply_cash_flow(&mut self, fetch: CashFlowFetch) -> Result<()> {
        let data = match fetch {
            CashFlowFetch::Cached(data) => data,
            CashFlowFetch::Generated(Ok(data)) => {
                if let Err(err) = self.cache.save_cash_flow_data(&data, self.time_range) {
                    warn!("Failed to cache cash flow data: {}", err);
                }
                data
            }
            CashFlowFetch::Generated(Err(err)) => match self.fallback_cash_flow() {
                Some(data) => {
                    warn!("Using stored cash flow data after fetch failure: {}", err);
                    data
                }
                None => return Err(err),
            },
        };

        self.cash_flow_data = data;
        Ok(())
    }

    fn apply_metric(&mut self, metric: MetricKind, fetch: MetricFetch) -> Result<()> {
        let data = match fetch {
            MetricFetch::Cached(data) => data,
            MetricFetch::Generated(Ok(data)) => {
                if let Err(err) = self.cache.save_chart_data(metric, &data, self.time_range) {
                    warn!("Failed to cache {} data: {}", metric, err);
                }
                data
            }
            MetricFetch::Generated(Err(err)) => match self.fallback_metric(metric) {
                Some(data) => {
                    warn!("Using stored {} data after fetch failure: {}", metric, err);
                    data
                }
                None => return Err(err),
            },
        };

        *self.metric_slot(metric) = data;
        Ok(())
    }

    /// Last stored cash flow payload regardless of freshness.
    fn fallback_cash_flow(&self) -> Option<Vec<CashFlowDataPoint>> {
        self.cache
            .load_cash_flow_data()
            .ok()
            .and_then(|lookup| lookup.any())
            .map(|(data, _)| data)
    }

    /// Last stored metric payload regardless of freshness.
    fn fallback_metric(&self, metric: MetricKind) -> Option<Vec<ChartDataPoint>> {
        self.cache
            .load_chart_data(metric)
            .ok()
            .and_then(|lookup| lookup.any())
            .map(|(data, _)| data)
    }

    fn metric_slot(&mut self, metric: MetricKind) -> &mut Vec<ChartDataPoint> {
        match metric {
            MetricKind::Profit => &mut self.profit_data,
            MetricKind::Expenses => &mut self.expenses_data,
            MetricKind::Revenue => &mut self.revenue_data,
        }
    }
}

async fn cash_flow_fetch(
    service: &MockDataService,
    time_range: TimeRange,
    cached: Option<Vec<CashFlowDataPoint>>,
) -> CashFlowFetch {
    match cached {
        Some(data) => CashFlowFetch::Cached(data),
        None => CashFlowFetch::Generated(
            service
                .get_cash_flow_data(time_range)
                .await
                .map(|response| response.data),
        ),
    }
}

async fn metric_fetch(
    service: &MockDataService,
    metric: MetricKind,
    time_range: TimeRange,
    cached: Option<Vec<ChartDataPoint>>,
) -> MetricFetch {
    match cached {
        Some(data) => MetricFetch::Cached(data),
        None => MetricFetch::Generated(
            service
                .get_chart_data(&ChartDataRequest::new(time_range, metric.chart_type()))
                .await
                .map(|response| response.data),
        ),
    }
}

fn note_error(slot: &mut Option<DashboardError>, err: DashboardError) {
    if slot.is_none() {
        *slot = Some(err);
    } else {
        warn!("Additional refresh failure: {}", err);
    }
}
