use crate::error::{DashboardError, Result};
use crate::utils::{days_back, days_forward, days_in_month, month_start_back, month_start_forward};
use chrono::{Datelike, NaiveDate};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Reporting window selectable from the dashboard's range filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum TimeRange {
    #[serde(rename = "7D")]
    #[schemars(description = "Last seven days, one bucket per day")]
    SevenDays,

    #[serde(rename = "30D")]
    #[schemars(description = "Last thirty days, one bucket per day")]
    ThirtyDays,

    #[serde(rename = "3M")]
    #[schemars(description = "Last three months, approximated as twelve weekly buckets")]
    ThreeMonths,

    #[serde(rename = "YTD")]
    #[schemars(description = "Calendar year to date, one bucket per elapsed month")]
    YearToDate,

    #[serde(rename = "custom")]
    #[schemars(description = "Caller-supplied date range, currently bucketed like 30D")]
    Custom,
}

/// Granularity of a single bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Daily,
    Weekly,
    Monthly,
}

impl Period {
    /// Scale factor keeping bucket totals proportional to bucket length.
    pub fn multiplier(&self) -> f64 {
        match self {
            Period::Daily => 1.0,
            Period::Weekly => 7.0,
            Period::Monthly => 30.0,
        }
    }

    /// Fraction of the bucket containing `date` that has already elapsed.
    pub fn progress(&self, date: NaiveDate) -> f64 {
        match self {
            Period::Daily => 1.0,
            Period::Weekly => {
                f64::max(date.weekday().num_days_from_sunday() as f64, 1.0) / 7.0
            }
            Period::Monthly => {
                let length = days_in_month(date.year(), date.month()) as f64;
                f64::max(date.day() as f64 / length, 0.1)
            }
        }
    }

    /// Step one bucket forward from `date`.
    pub fn advance(&self, date: NaiveDate) -> NaiveDate {
        match self {
            Period::Daily => days_forward(date, 1),
            Period::Weekly => days_forward(date, 7),
            Period::Monthly => month_start_forward(date, 1),
        }
    }
}

/// How many buckets a time range spans and at what granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketSpec {
    pub count: usize,
    pub period: Period,
}

impl BucketSpec {
    /// Date of the bucket at `index` (0 is the oldest), stepping back from
    /// `today`. Monthly buckets are normalized to the first of the month.
    pub fn bucket_date(&self, index: usize, today: NaiveDate) -> NaiveDate {
        let back = (self.count - index - 1) as u64;
        match self.period {
            Period::Daily => days_back(today, back),
            Period::Weekly => days_back(today, back * 7),
            Period::Monthly => month_start_back(today, back as u32),
        }
    }

    /// The `today` equivalent one full window earlier, for previous-period
    /// series.
    pub fn previous_window(&self, today: NaiveDate) -> NaiveDate {
        match self.period {
            Period::Daily => days_back(today, self.count as u64),
            Period::Weekly => days_back(today, self.count as u64 * 7),
            Period::Monthly => month_start_back(today, self.count as u32),
        }
    }
}

impl TimeRange {
    /// Bucket layout for this range, evaluated against `today`.
    pub fn resolve(&self, today: NaiveDate) -> BucketSpec {
        match self {
            TimeRange::SevenDays => BucketSpec {
                count: 7,
                period: Period::Daily,
            },
            TimeRange::ThirtyDays => BucketSpec {
                count: 30,
                period: Period::Daily,
            },
            // Twelve weeks approximates a quarter.
            TimeRange::ThreeMonths => BucketSpec {
                count: 12,
                period: Period::Weekly,
            },
            TimeRange::YearToDate => BucketSpec {
                count: today.month() as usize,
                period: Period::Monthly,
            },
            // Custom ranges fall back to the 30D layout.
            TimeRange::Custom => BucketSpec {
                count: 30,
                period: Period::Daily,
            },
        }
    }

    /// How many synthetic future buckets cash flow series append.
    pub fn projected_buckets(&self) -> usize {
        match self {
            TimeRange::ThirtyDays => 3,
            _ => 2,
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TimeRange::SevenDays => "7D",
            TimeRange::ThirtyDays => "30D",
            TimeRange::ThreeMonths => "3M",
            TimeRange::YearToDate => "YTD",
            TimeRange::Custom => "custom",
        };
        f.write_str(label)
    }
}

impl FromStr for TimeRange {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "7D" => Ok(TimeRange::SevenDays),
            "30D" => Ok(TimeRange::ThirtyDays),
            "3M" => Ok(TimeRange::ThreeMonths),
            "YTD" => Ok(TimeRange::YearToDate),
            "custom" => Ok(TimeRange::Custom),
            other => Err(DashboardError::Validation(format!(
                "Unknown time range: {}",
                other
            ))),
        }
    }
}
