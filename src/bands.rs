use chrono::Timelike;
use log::debug;
use schemars::JsonSchema;
use serde::Serialize;

use crate::cell;
use crate::error::{ImportError, Result};
use crate::mapper::{ImportedRecord, Value};

/// Display grouping for a band. Aggregation math never looks at this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BandTag {
    Business,
    Correction,
    Prep,
    Closing,
}

/// One fixed `[start, end)` hour range with its running totals.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct TimeBand {
    pub label: String,
    pub start_hour: u32,
    pub end_hour: u32,
    pub tag: BandTag,
    pub ventas: f64,
    pub tickets: u32,
}

impl TimeBand {
    fn new(start_hour: u32, end_hour: u32, tag: BandTag) -> Self {
        Self {
            label: format!("{:02}:00-{:02}:00", start_hour, end_hour),
            start_hour,
            end_hour,
            tag,
            ventas: 0.0,
            tickets: 0,
        }
    }

    pub fn contains_hour(&self, hour: u32) -> bool {
        (self.start_hour..self.end_hour).contains(&hour)
    }
}

/// The fixed 18-band day: overnight corrections, three prep hours before
/// opening, twelve one-hour business bands, the closing hour, and the
/// late-evening correction window. Fresh (zeroed) on every call; band totals
/// are never persisted.
pub fn band_table() -> Vec<TimeBand> {
    let mut bands = Vec::with_capacity(18);
    bands.push(TimeBand::new(0, 6, BandTag::Correction));
    for hour in 6..9 {
        bands.push(TimeBand::new(hour, hour + 1, BandTag::Prep));
    }
    for hour in 9..21 {
        bands.push(TimeBand::new(hour, hour + 1, BandTag::Business));
    }
    bands.push(TimeBand::new(21, 22, BandTag::Closing));
    bands.push(TimeBand::new(22, 24, BandTag::Correction));
    bands
}

/// Structural invariant: the bands partition `[0, 24)`, every hour covered
/// by exactly one band. Checked once per run, not per record.
pub fn validate_partition(bands: &[TimeBand]) -> Result<()> {
    let mut coverage = [0usize; 24];

    for band in bands {
        if band.start_hour >= band.end_hour || band.end_hour > 24 {
            return Err(ImportError::InvalidBandTable(format!(
                "band {} has an invalid range {}..{}",
                band.label, band.start_hour, band.end_hour
            )));
        }
        for hour in band.start_hour..band.end_hour {
            coverage[hour as usize] += 1;
        }
    }

    for (hour, count) in coverage.iter().enumerate() {
        if *count != 1 {
            return Err(ImportError::InvalidBandTable(format!(
                "hour {} covered {} times",
                hour, count
            )));
        }
    }

    Ok(())
}

/// Band totals for one analytics run, plus how many records had no usable
/// time and were left out.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct BandReport {
    pub bands: Vec<TimeBand>,
    pub skipped: usize,
}

/// Accumulate hourly-sales records into the fixed band table.
///
/// A record lands in exactly one band (the partition is validated first);
/// its amount coalesces to zero only here, at accumulation time. Records
/// whose `hora` is absent or unparseable are counted and skipped, never
/// guessed.
pub fn aggregate(records: &[ImportedRecord]) -> Result<BandReport> {
    let mut bands = band_table();
    validate_partition(&bands)?;

    let mut skipped = 0usize;

    for record in records {
        let hour = match record_hour(record) {
            Some(h) => h,
            None => {
                skipped += 1;
                continue;
            }
        };

        let amount = record.number("total").unwrap_or(0.0);
        // Partition guarantees exactly one match
        if let Some(band) = bands.iter_mut().find(|b| b.contains_hour(hour)) {
            band.ventas += amount;
            band.tickets += 1;
        }
    }

    if skipped > 0 {
        debug!("band aggregation skipped {} records without a time", skipped);
    }

    Ok(BandReport { bands, skipped })
}

/// Hour 0–23 of a record's `hora` field, whichever shape mapping left it in.
fn record_hour(record: &ImportedRecord) -> Option<u32> {
    match record.get("hora")? {
        Value::Time(t) => Some(t.hour()),
        Value::Text(s) => cell::parse_time_str(s)
            .map(|t| t.hour())
            .or_else(|| hour_prefix(s)),
        Value::Number(n) => {
            if (0.0..1.0).contains(n) {
                Some((n * 24.0).floor() as u32)
            } else {
                None
            }
        }
        Value::Date(_) => None,
    }
}

/// Fallback for truncated time strings like "9" or "09h".
fn hour_prefix(s: &str) -> Option<u32> {
    let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse::<u32>().ok().filter(|h| *h < 24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::Value;

    fn sale(hora: Value, total: f64) -> ImportedRecord {
        ImportedRecord::from_values([("hora", hora), ("total", Value::Number(total))])
    }

    #[test]
    fn test_table_partitions_the_day() {
        let bands = band_table();
        assert_eq!(bands.len(), 18);
        assert!(validate_partition(&bands).is_ok());
    }

    #[test]
    fn test_every_hour_hits_exactly_one_band() {
        let bands = band_table();
        for hour in 0..24 {
            let hits = bands.iter().filter(|b| b.contains_hour(hour)).count();
            assert_eq!(hits, 1, "hour {} hit {} bands", hour, hits);
        }
    }

    #[test]
    fn test_overlap_is_rejected() {
        let mut bands = band_table();
        bands.push(TimeBand::new(9, 10, BandTag::Business));
        assert!(validate_partition(&bands).is_err());
    }

    #[test]
    fn test_gap_is_rejected() {
        let mut bands = band_table();
        bands.pop();
        assert!(validate_partition(&bands).is_err());
    }

    #[test]
    fn test_record_accumulates_into_its_band() {
        let report = aggregate(&[sale(Value::Text("09:30:00".into()), 42.0)]).unwrap();

        let morning = report
            .bands
            .iter()
            .find(|b| b.label == "09:00-10:00")
            .unwrap();
        assert_eq!(morning.ventas, 42.0);
        assert_eq!(morning.tickets, 1);

        let touched = report
            .bands
            .iter()
            .filter(|b| b.tickets > 0 || b.ventas != 0.0)
            .count();
        assert_eq!(touched, 1);
        assert_eq!(report.skipped, 0);
    }

    #[test]
    fn test_fractional_day_time() {
        // 0.875 of a day is 21:00, the closing band
        let report = aggregate(&[sale(Value::Number(0.875), 10.0)]).unwrap();
        let closing = report.bands.iter().find(|b| b.tag == BandTag::Closing).unwrap();
        assert_eq!(closing.tickets, 1);
        assert_eq!(closing.ventas, 10.0);
    }

    #[test]
    fn test_unparseable_time_is_skipped_and_counted() {
        let records = vec![
            sale(Value::Text("??".into()), 5.0),
            sale(Value::Text("10:00:00".into()), 7.0),
            ImportedRecord::from_values([("total", Value::Number(3.0))]),
        ];
        let report = aggregate(&records).unwrap();
        assert_eq!(report.skipped, 2);
        let total: f64 = report.bands.iter().map(|b| b.ventas).sum();
        assert_eq!(total, 7.0);
    }

    #[test]
    fn test_absent_amount_counts_ticket_with_zero_sales() {
        let report = aggregate(&[ImportedRecord::from_values([(
            "hora",
            Value::Text("12:15:00".into()),
        )])])
        .unwrap();
        let noon = report.bands.iter().find(|b| b.label == "12:00-13:00").unwrap();
        assert_eq!(noon.tickets, 1);
        assert_eq!(noon.ventas, 0.0);
    }

    #[test]
    fn test_truncated_hour_string() {
        let report = aggregate(&[sale(Value::Text("9".into()), 1.0)]).unwrap();
        let morning = report.bands.iter().find(|b| b.label == "09:00-10:00").unwrap();
        assert_eq!(morning.tickets, 1);
    }
}
