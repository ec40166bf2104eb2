use crate::bucket::Period;
use crate::error::{DashboardError, Result};
use chrono::{Datelike, NaiveDate, Weekday};
use rand::thread_rng;
use rand_distr::{Distribution, Normal};
use std::f64::consts::PI;

/// Weekend dampening, applied to daily buckets only. Weekly and monthly
/// buckets already average the weekend away.
pub fn weekend_factor(date: NaiveDate, period: Period) -> f64 {
    if period == Period::Daily && matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
        0.7
    } else {
        1.0
    }
}

/// Mid-month swell: peaks around the 15th, returns to baseline at the edges.
pub fn monthly_factor(date: NaiveDate) -> f64 {
    1.0 + (date.day() as f64 / 30.0 * PI).sin() * 0.1
}

/// Per-bucket variation applied on top of the seasonal factors.
///
/// The default [`TrigVariation`] is seeded purely by the bucket index, so a
/// given window always produces the same series. Swap in
/// [`GaussianVariation`] for data that should differ between runs, or a fixed
/// implementation in tests.
pub trait VariationStrategy: Send + Sync {
    fn variation(&self, index: usize) -> f64;
}

/// Index-seeded trigonometric variation, the deterministic default.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrigVariation;

impl VariationStrategy for TrigVariation {
    fn variation(&self, index: usize) -> f64 {
        let i = index as f64;
        1.0 + (i * 0.3).sin() * 0.1 + (i * 0.7).cos() * 0.05
    }
}

/// Gaussian noise around 1.0 for demo data that changes per run.
#[derive(Debug, Clone, Copy)]
pub struct GaussianVariation {
    normal: Normal<f64>,
}

impl GaussianVariation {
    pub fn new(noise_factor: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&noise_factor) {
            return Err(DashboardError::InvalidNoiseFactor(noise_factor));
        }

        let normal = Normal::new(0.0, noise_factor)
            .map_err(|_| DashboardError::InvalidNoiseFactor(noise_factor))?;
        Ok(Self { normal })
    }
}

impl VariationStrategy for GaussianVariation {
    fn variation(&self, _index: usize) -> f64 {
        1.0 + self.normal.sample(&mut thread_rng())
    }
}
