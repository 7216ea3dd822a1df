use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use log::info;
use schemars::JsonSchema;
use serde::Serialize;

use crate::bands::BandReport;
use crate::mapper::ImportedRecord;
use crate::merger::MergedProduct;

/// One calendar date of trading, classified into its weekday.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub total: f64,
    pub tickets: u32,
    pub weekday: Weekday,
}

/// Per-weekday figures derived across the imported range.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekdayStat {
    pub weekday: Weekday,
    /// Sum of daily totals for this weekday.
    pub total: f64,
    /// Calendar months that contain at least one day of data for this
    /// weekday. Months without one do not deflate the average.
    pub months_with_data: usize,
    pub average: f64,
    /// This weekday's total per contributing month, calendar order.
    pub monthly_totals: Vec<f64>,
}

/// The derived headline figures for the analytics views. Pure value,
/// recomputed on demand.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct AnalyticsSummary {
    pub best_day: Option<String>,
    pub worst_day: Option<String>,
    pub most_consistent_day: Option<String>,
    pub best_band: Option<String>,
    pub worst_band: Option<String>,
    pub growth_pct: Option<f64>,
    pub total_sales: f64,
    pub total_tickets: u32,
}

/// Weekday labels in the application's fixed locale.
pub fn weekday_label(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Dilluns",
        Weekday::Tue => "Dimarts",
        Weekday::Wed => "Dimecres",
        Weekday::Thu => "Dijous",
        Weekday::Fri => "Divendres",
        Weekday::Sat => "Dissabte",
        Weekday::Sun => "Diumenge",
    }
}

/// Collapse daily-sales records into one aggregate per calendar date.
/// Records whose date stayed opaque text are left out; amounts coalesce to
/// zero here, at aggregation time.
pub fn daily_aggregates(records: &[ImportedRecord]) -> Vec<DailyAggregate> {
    let mut by_date: BTreeMap<NaiveDate, (f64, u32)> = BTreeMap::new();

    for record in records {
        let date = match record.date("data") {
            Some(d) => d,
            None => continue,
        };
        let entry = by_date.entry(date).or_insert((0.0, 0));
        entry.0 += record.number("import").unwrap_or(0.0);
        entry.1 += record.number("tiquets").unwrap_or(0.0).max(0.0) as u32;
    }

    by_date
        .into_iter()
        .map(|(date, (total, tickets))| DailyAggregate {
            date,
            total,
            tickets,
            weekday: date.weekday(),
        })
        .collect()
}

/// Monetary totals per calendar month, keyed `(year, month)`.
pub fn monthly_totals(days: &[DailyAggregate]) -> BTreeMap<(i32, u32), f64> {
    let mut totals: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for day in days {
        *totals.entry((day.date.year(), day.date.month())).or_insert(0.0) += day.total;
    }
    totals
}

/// Month-over-month growth between the first and last month with data,
/// as a percentage. Guarded: zero when the first month is zero, undefined
/// with fewer than two distinct months.
pub fn growth_percentage(monthly: &BTreeMap<(i32, u32), f64>) -> Option<f64> {
    if monthly.len() < 2 {
        return None;
    }
    let first = *monthly.values().next().unwrap();
    let last = *monthly.values().next_back().unwrap();
    if first == 0.0 {
        return Some(0.0);
    }
    Some((last - first) / first * 100.0)
}

/// Weekday figures across the range. A weekday's average divides by the
/// number of months that actually contain data for it, so a weekday traded
/// in only one of two imported months keeps its real level.
pub fn weekday_stats(days: &[DailyAggregate]) -> Vec<WeekdayStat> {
    const WEEKDAYS: [Weekday; 7] = [
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ];

    WEEKDAYS
        .iter()
        .filter_map(|&weekday| {
            let mut per_month: BTreeMap<(i32, u32), f64> = BTreeMap::new();
            for day in days.iter().filter(|d| d.weekday == weekday) {
                *per_month
                    .entry((day.date.year(), day.date.month()))
                    .or_insert(0.0) += day.total;
            }
            if per_month.is_empty() {
                return None;
            }

            let monthly: Vec<f64> = per_month.into_values().collect();
            let total: f64 = monthly.iter().sum();
            let months_with_data = monthly.len();

            Some(WeekdayStat {
                weekday,
                total,
                months_with_data,
                average: total / months_with_data as f64,
                monthly_totals: monthly,
            })
        })
        .collect()
}

/// Population standard deviation over mean, across the non-zero values.
/// Needs more than one non-zero observation and a non-zero mean.
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let observed: Vec<f64> = values.iter().copied().filter(|v| *v != 0.0).collect();
    if observed.len() < 2 {
        return None;
    }

    let mean = observed.iter().sum::<f64>() / observed.len() as f64;
    if mean == 0.0 {
        return None;
    }

    let variance =
        observed.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / observed.len() as f64;
    Some(variance.sqrt() / mean.abs())
}

/// Ranking metric for product top-N views.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductMetric {
    /// Twelve-month monetary total.
    Amount,
    /// Twelve-month unit count.
    Units,
    /// Realized average unit price.
    UnitPrice,
}

impl ProductMetric {
    fn value(&self, product: &MergedProduct) -> f64 {
        match self {
            ProductMetric::Amount => product.importe.total,
            ProductMetric::Units => product.cantidad.total,
            ProductMetric::UnitPrice => product.unit_price(),
        }
    }
}

/// Top `n` products by the given metric: stable descending sort, ties keep
/// their incoming order.
pub fn top_products(
    products: &[MergedProduct],
    metric: ProductMetric,
    n: usize,
) -> Vec<MergedProduct> {
    let mut ranked: Vec<MergedProduct> = products.to_vec();
    ranked.sort_by(|a, b| {
        metric
            .value(b)
            .partial_cmp(&metric.value(a))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(n);
    ranked
}

/// Assemble the headline summary from the daily and band aggregates.
pub fn build_summary(days: &[DailyAggregate], bands: &BandReport) -> AnalyticsSummary {
    let stats = weekday_stats(days);

    let best_day = stats
        .iter()
        .max_by(|a, b| a.average.partial_cmp(&b.average).unwrap_or(std::cmp::Ordering::Equal))
        .map(|s| weekday_label(s.weekday).to_string());
    let worst_day = stats
        .iter()
        .min_by(|a, b| a.average.partial_cmp(&b.average).unwrap_or(std::cmp::Ordering::Equal))
        .map(|s| weekday_label(s.weekday).to_string());

    // Lowest variability wins; weekdays with a single observation cannot be
    // ranked here but stay eligible for best/worst above.
    let most_consistent_day = stats
        .iter()
        .filter_map(|s| coefficient_of_variation(&s.monthly_totals).map(|cv| (s, cv)))
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(s, _)| weekday_label(s.weekday).to_string());

    // Bands are ranked among those that saw any activity; the empty
    // overnight windows would otherwise always win "worst".
    let active = || bands.bands.iter().filter(|b| b.tickets > 0);
    let best_band = active()
        .max_by(|a, b| a.ventas.partial_cmp(&b.ventas).unwrap_or(std::cmp::Ordering::Equal))
        .map(|b| b.label.clone());
    let worst_band = active()
        .min_by(|a, b| a.ventas.partial_cmp(&b.ventas).unwrap_or(std::cmp::Ordering::Equal))
        .map(|b| b.label.clone());

    let monthly = monthly_totals(days);
    let growth_pct = growth_percentage(&monthly);

    let summary = AnalyticsSummary {
        best_day,
        worst_day,
        most_consistent_day,
        best_band,
        worst_band,
        growth_pct,
        total_sales: days.iter().map(|d| d.total).sum(),
        total_tickets: days.iter().map(|d| d.tickets).sum(),
    };

    info!(
        "analytics summary over {} days, {} months: growth {:?}",
        days.len(),
        monthly.len(),
        summary.growth_pct
    );

    summary
}
