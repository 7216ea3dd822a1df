use std::collections::BTreeMap;

use log::debug;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::dataset::MONTH_FIELDS;
use crate::mapper::ImportedRecord;

/// Twelve month values in calendar order plus their precomputed sum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MonthSeries {
    pub months: [f64; 12],
    pub total: f64,
}

impl MonthSeries {
    fn from_record(record: &ImportedRecord) -> Self {
        let mut months = [0.0; 12];
        for (idx, field) in MONTH_FIELDS.iter().enumerate() {
            // Missing month columns default to zero here, explicitly: by the
            // time a product is merged, "no column" and "no sales" read the same.
            months[idx] = record.number(field).unwrap_or(0.0);
        }
        Self {
            months,
            total: 0.0,
        }
    }

    fn freeze(&mut self) {
        self.total = self.months.iter().sum();
    }
}

/// One product assembled from the two parallel exports, keyed on its code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MergedProduct {
    pub codi: String,
    pub descripcio: String,
    /// Monetary series, fed by the by-amount export.
    pub importe: MonthSeries,
    /// Unit-count series, fed by the by-quantity export.
    pub cantidad: MonthSeries,
}

impl MergedProduct {
    /// Realized average unit price across the year; 0 when nothing was sold
    /// by count.
    pub fn unit_price(&self) -> f64 {
        if self.cantidad.total == 0.0 {
            0.0
        } else {
            self.importe.total / self.cantidad.total
        }
    }
}

enum Series {
    Amount,
    Quantity,
}

/// Combine the by-amount and by-quantity product records into one record per
/// product code.
///
/// The accumulator map is the one mutable structure in the pipeline; it is
/// scoped to this call and discarded afterward. Records without a
/// usable `codi` are skipped. Each dataset writes only its own series, so
/// `merge(a, b)` and `merge(b, a)` agree whenever neither dataset repeats a
/// key; a repeated key within one dataset is last-write-wins.
pub fn merge(
    by_amount: &[ImportedRecord],
    by_quantity: &[ImportedRecord],
) -> BTreeMap<String, MergedProduct> {
    let mut products: BTreeMap<String, MergedProduct> = BTreeMap::new();

    fold(&mut products, by_amount, Series::Amount);
    fold(&mut products, by_quantity, Series::Quantity);

    for product in products.values_mut() {
        product.importe.freeze();
        product.cantidad.freeze();
    }

    products
}

fn fold(products: &mut BTreeMap<String, MergedProduct>, records: &[ImportedRecord], series: Series) {
    let mut skipped = 0usize;

    for record in records {
        let codi = match record.text("codi").map(str::trim) {
            Some(c) if !c.is_empty() => c.to_string(),
            _ => {
                skipped += 1;
                continue;
            }
        };

        let entry = products.entry(codi.clone()).or_insert_with(|| MergedProduct {
            codi,
            ..MergedProduct::default()
        });

        if entry.descripcio.is_empty() {
            if let Some(desc) = record.text("descripcio") {
                entry.descripcio = desc.to_string();
            }
        }

        let months = MonthSeries::from_record(record);
        match series {
            Series::Amount => entry.importe.months = months.months,
            Series::Quantity => entry.cantidad.months = months.months,
        }
    }

    if skipped > 0 {
        debug!("merge skipped {} records without a product code", skipped);
    }
}

/// Presentation order: descending monetary total, stable for equal totals.
pub fn rank_by_amount(products: &BTreeMap<String, MergedProduct>) -> Vec<MergedProduct> {
    let mut ranked: Vec<MergedProduct> = products.values().cloned().collect();
    ranked.sort_by(|a, b| {
        b.importe
            .total
            .partial_cmp(&a.importe.total)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::Value;

    fn product(codi: &str, desc: &str, months: &[(usize, f64)]) -> ImportedRecord {
        let mut values = vec![
            ("codi", Value::Text(codi.to_string())),
            ("descripcio", Value::Text(desc.to_string())),
        ];
        for (idx, amount) in months {
            values.push((MONTH_FIELDS[*idx], Value::Number(*amount)));
        }
        ImportedRecord::from_values(values)
    }

    #[test]
    fn test_same_code_from_both_sources_yields_one_product() {
        let amounts = vec![product("A1", "Barra", &[(0, 40.0), (1, 60.0)])];
        let quantities = vec![product("A1", "Barra", &[(0, 20.0), (1, 30.0)])];

        let merged = merge(&amounts, &quantities);
        assert_eq!(merged.len(), 1);

        let a1 = merged.get("A1").unwrap();
        assert_eq!(a1.importe.total, 100.0);
        assert_eq!(a1.cantidad.total, 50.0);
        assert_eq!(a1.importe.months[0], 40.0);
        assert_eq!(a1.cantidad.months[1], 30.0);
    }

    #[test]
    fn test_merge_is_order_independent() {
        let amounts = vec![
            product("A1", "Barra", &[(0, 100.0)]),
            product("B2", "Croissant", &[(5, 25.0)]),
        ];
        let quantities = vec![
            product("B2", "Croissant", &[(5, 50.0)]),
            product("C3", "Coca", &[(11, 8.0)]),
        ];

        let forward = merge(&amounts, &quantities);
        let reversed = merge(&quantities, &amounts);

        // Same keys, same series content; only which fold touched each
        // series differs, and that must not be observable
        assert_eq!(forward.len(), reversed.len());
        for (codi, fwd) in &forward {
            let rev = reversed.get(codi).unwrap();
            assert_eq!(fwd.descripcio, rev.descripcio);
            // Series swap roles when the argument order swaps
            assert_eq!(fwd.importe.months, rev.cantidad.months);
            assert_eq!(fwd.cantidad.months, rev.importe.months);
        }
    }

    #[test]
    fn test_missing_months_default_to_zero() {
        let merged = merge(&[product("A1", "Barra", &[(3, 10.0)])], &[]);
        let a1 = merged.get("A1").unwrap();
        assert_eq!(a1.importe.months[0], 0.0);
        assert_eq!(a1.importe.total, 10.0);
        assert_eq!(a1.cantidad.total, 0.0);
    }

    #[test]
    fn test_blank_code_is_skipped() {
        let records = vec![
            product("", "Sense codi", &[(0, 5.0)]),
            product("A1", "Barra", &[(0, 5.0)]),
        ];
        let merged = merge(&records, &[]);
        assert_eq!(merged.len(), 1);
        assert!(merged.contains_key("A1"));
    }

    #[test]
    fn test_duplicate_key_in_one_dataset_is_last_write_wins() {
        let records = vec![
            product("A1", "Barra", &[(0, 10.0)]),
            product("A1", "Barra", &[(0, 99.0)]),
        ];
        let merged = merge(&records, &[]);
        assert_eq!(merged.get("A1").unwrap().importe.months[0], 99.0);
    }

    #[test]
    fn test_rank_by_amount_descending_and_stable() {
        let amounts = vec![
            product("A1", "Barra", &[(0, 10.0)]),
            product("B2", "Croissant", &[(0, 200.0)]),
            product("C3", "Coca", &[(0, 10.0)]),
        ];
        let ranked = rank_by_amount(&merge(&amounts, &[]));
        assert_eq!(ranked[0].codi, "B2");
        // Equal totals keep map order (A1 before C3)
        assert_eq!(ranked[1].codi, "A1");
        assert_eq!(ranked[2].codi, "C3");
    }

    #[test]
    fn test_unit_price_guard() {
        let merged = merge(&[product("A1", "Barra", &[(0, 100.0)])], &[]);
        assert_eq!(merged.get("A1").unwrap().unit_price(), 0.0);
    }
}
