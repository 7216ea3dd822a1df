use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::header::HeaderSpec;
use crate::mapper::{FieldDef, FieldKind};

/// The four supported export layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    DailySales,
    HourlySales,
    ProductByAmount,
    ProductByQuantity,
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ImportKind::DailySales => "daily sales",
            ImportKind::HourlySales => "hourly sales",
            ImportKind::ProductByAmount => "product-by-amount",
            ImportKind::ProductByQuantity => "product-by-quantity",
        };
        f.write_str(name)
    }
}

/// Everything needed to ingest one export kind: how to find its header and
/// which canonical fields to pull out of the data rows.
#[derive(Debug, Clone, Copy)]
pub struct DatasetSpec {
    pub kind: ImportKind,
    pub header: HeaderSpec,
    pub fields: &'static [FieldDef],
}

impl DatasetSpec {
    pub fn for_kind(kind: ImportKind) -> &'static DatasetSpec {
        match kind {
            ImportKind::DailySales => &DAILY_SALES,
            ImportKind::HourlySales => &HOURLY_SALES,
            ImportKind::ProductByAmount => &PRODUCT_BY_AMOUNT,
            ImportKind::ProductByQuantity => &PRODUCT_BY_QUANTITY,
        }
    }

    /// The canonical column contract persisted rows follow, in order.
    pub fn column_contract(&self) -> Vec<&'static str> {
        self.fields.iter().map(|f| f.name).collect()
    }
}

/// Month column names shared by both product layouts, calendar order.
pub const MONTH_FIELDS: [&str; 12] = [
    "gener",
    "febrer",
    "marc",
    "abril",
    "maig",
    "juny",
    "juliol",
    "agost",
    "setembre",
    "octubre",
    "novembre",
    "desembre",
];

const fn field(name: &'static str, keyword: &'static str, kind: FieldKind, signal: bool) -> FieldDef {
    FieldDef {
        name,
        keyword,
        kind,
        signal,
    }
}

/// Daily register summary: one row per calendar date.
pub static DAILY_SALES: DatasetSpec = DatasetSpec {
    kind: ImportKind::DailySales,
    header: HeaderSpec {
        keywords: &[
            "data", "dia", "ven", "botiga", "import", "tiquets", "kgs", "unit", "mitja",
        ],
        min_score: 4,
        search_window: 10,
        paired_rows: false,
        column_offset: 0,
    },
    fields: &[
        field("data", "data", FieldKind::Date, true),
        field("dia_setmana", "dia", FieldKind::Text, false),
        field("c_ven", "ven", FieldKind::Text, false),
        field("nom_botiga", "botiga", FieldKind::Text, false),
        field("import", "import", FieldKind::Number, true),
        field("tiquets", "tiquets", FieldKind::Number, true),
        field("kgs", "kgs", FieldKind::Number, false),
        field("unit", "unit", FieldKind::Number, false),
        field("mitja_tiq", "mitja", FieldKind::Number, false),
    ],
};

/// Ticket-level hourly summary: one row per register line.
pub static HOURLY_SALES: DatasetSpec = DatasetSpec {
    kind: ImportKind::HourlySales,
    header: HeaderSpec {
        keywords: &["data", "hora", "total", "tiquets"],
        min_score: 2,
        search_window: 10,
        paired_rows: false,
        column_offset: 0,
    },
    fields: &[
        field("data", "data", FieldKind::Date, true),
        field("hora", "hora", FieldKind::Time, true),
        field("total", "total", FieldKind::Number, true),
        field("tiquets", "tiquets", FieldKind::Number, false),
    ],
};

const PRODUCT_KEYWORDS: &[&str] = &[
    "codi",
    "descrip",
    "gener",
    "febrer",
    "mar",
    "abril",
    "maig",
    "juny",
    "juliol",
    "agost",
    "setembre",
    "octubre",
    "novembre",
    "desembre",
    "total",
];

const PRODUCT_FIELDS: &[FieldDef] = &[
    field("codi", "codi", FieldKind::Text, true),
    field("descripcio", "descrip", FieldKind::Text, false),
    field("gener", "gener", FieldKind::Number, false),
    field("febrer", "febrer", FieldKind::Number, false),
    field("marc", "mar", FieldKind::Number, false),
    field("abril", "abril", FieldKind::Number, false),
    field("maig", "maig", FieldKind::Number, false),
    field("juny", "juny", FieldKind::Number, false),
    field("juliol", "juliol", FieldKind::Number, false),
    field("agost", "agost", FieldKind::Number, false),
    field("setembre", "setembre", FieldKind::Number, false),
    field("octubre", "octubre", FieldKind::Number, false),
    field("novembre", "novembre", FieldKind::Number, false),
    field("desembre", "desembre", FieldKind::Number, false),
    field("total", "total", FieldKind::Number, true),
];

/// Per-product monetary totals, pivoted by month. The export splits the
/// logical header across two physical rows and pads the left edge with one
/// decorative column.
pub static PRODUCT_BY_AMOUNT: DatasetSpec = DatasetSpec {
    kind: ImportKind::ProductByAmount,
    header: HeaderSpec {
        keywords: PRODUCT_KEYWORDS,
        min_score: 5,
        search_window: 10,
        paired_rows: true,
        column_offset: 1,
    },
    fields: PRODUCT_FIELDS,
};

/// Per-product unit counts, same physical layout as the amount export.
pub static PRODUCT_BY_QUANTITY: DatasetSpec = DatasetSpec {
    kind: ImportKind::ProductByQuantity,
    header: HeaderSpec {
        keywords: PRODUCT_KEYWORDS,
        min_score: 5,
        search_window: 10,
        paired_rows: true,
        column_offset: 1,
    },
    fields: PRODUCT_FIELDS,
};
