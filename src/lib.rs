//! # Botiga Analytics
//!
//! A library for importing loosely-structured retail sales exports
//! (spreadsheets re-exported from a point-of-sale package) into a normalized
//! model and deriving the time-bucketed and product-ranked analytics behind
//! the reporting views.
//!
//! ## Core Concepts
//!
//! - **RawGrid**: the 2-D grid of primitive cells an external decoder
//!   produces from an uploaded file
//! - **Header location**: the exports carry no fixed layout, so each kind's
//!   header row is found by fuzzy keyword scoring against a per-kind spec
//! - **Imported records**: validated rows coerced into typed values; missing
//!   data stays missing (never silently zero) until aggregation time
//! - **Merged products**: the by-amount and by-quantity exports describe the
//!   same products and are merged on the product code
//! - **Time bands**: 18 fixed hour ranges partitioning the day, used to
//!   bucket register lines for time-of-day analysis
//!
//! ## Example
//!
//! ```rust,ignore
//! use botiga_analytics::*;
//!
//! // grids come from the spreadsheet decoder collaborator
//! let daily = import_grid(&DAILY_SALES, &daily_grid)?;
//! let hourly = import_grid(&HOURLY_SALES, &hourly_grid)?;
//! let amounts = import_grid(&PRODUCT_BY_AMOUNT, &amount_grid)?;
//! let quantities = import_grid(&PRODUCT_BY_QUANTITY, &quantity_grid)?;
//!
//! let mut store = MemoryStore::new();
//! replace_dataset(&mut store, ImportKind::DailySales, &daily.persist_rows())?;
//!
//! let analytics = run_analytics(
//!     &daily.records,
//!     &hourly.records,
//!     &amounts.records,
//!     &quantities.records,
//! )?;
//! println!("best day: {:?}", analytics.summary.best_day);
//! ```

pub mod bands;
pub mod cell;
pub mod dataset;
pub mod error;
pub mod header;
pub mod ingest;
pub mod mapper;
pub mod merger;
pub mod stats;
pub mod store;

#[cfg(feature = "xlsx")]
pub mod excel;

pub use bands::{aggregate, band_table, validate_partition, BandReport, BandTag, TimeBand};
pub use cell::{Cell, RawGrid};
pub use dataset::{
    DatasetSpec, ImportKind, DAILY_SALES, HOURLY_SALES, MONTH_FIELDS, PRODUCT_BY_AMOUNT,
    PRODUCT_BY_QUANTITY,
};
pub use error::{ImportError, Result};
pub use header::{HeaderLocation, HeaderSpec};
pub use ingest::{import_grid, import_kind, ImportOutcome, ImportReport};
pub use mapper::{FieldDef, FieldKind, ImportedRecord, Value};
pub use merger::{merge, rank_by_amount, MergedProduct, MonthSeries};
pub use stats::{
    build_summary, coefficient_of_variation, daily_aggregates, growth_percentage, monthly_totals,
    top_products, weekday_label, weekday_stats, AnalyticsSummary, DailyAggregate, ProductMetric,
    WeekdayStat,
};
pub use store::{replace_dataset, MemoryStore, PersistRow, SalesStore};

use log::info;
use std::collections::BTreeMap;

/// Everything the analytics views read, derived in one pass over the
/// imported records. Owned by the caller; the engine keeps no state between
/// runs.
#[derive(Debug, Clone)]
pub struct SalesAnalytics {
    pub products: BTreeMap<String, MergedProduct>,
    pub ranked_products: Vec<MergedProduct>,
    pub days: Vec<DailyAggregate>,
    pub bands: BandReport,
    pub summary: AnalyticsSummary,
}

/// Derive the full analytics state from the four imported record sets.
///
/// Each input is consumed read-only and the output is a plain value;
/// re-running with the same inputs yields the same analytics.
pub fn run_analytics(
    daily: &[ImportedRecord],
    hourly: &[ImportedRecord],
    by_amount: &[ImportedRecord],
    by_quantity: &[ImportedRecord],
) -> Result<SalesAnalytics> {
    info!(
        "deriving analytics: {} daily, {} hourly, {}+{} product records",
        daily.len(),
        hourly.len(),
        by_amount.len(),
        by_quantity.len()
    );

    let products = merge(by_amount, by_quantity);
    let ranked_products = rank_by_amount(&products);
    let days = daily_aggregates(daily);
    let bands = aggregate(hourly)?;
    let summary = build_summary(&days, &bands);

    Ok(SalesAnalytics {
        products,
        ranked_products,
        days,
        bands,
        summary,
    })
}
