use chrono::{Duration, NaiveDate, NaiveTime};

/// A single spreadsheet cell after decoding.
///
/// The decoder collaborator hands the engine untyped primitives; everything
/// downstream works on this tagged form so the fuzzy string checks happen in
/// exactly one place per value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Bool(bool),
    Blank,
}

/// One decoded worksheet: rows of cells, possibly ragged.
pub type RawGrid = Vec<Vec<Cell>>;

/// Placeholder strings the exports use to mean "no data".
pub const PLACEHOLDERS: [&str; 4] = ["", "-", "--", "+"];

/// Spreadsheet day zero. Serial day offsets in the exports count from here.
fn spreadsheet_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).unwrap()
}

impl Cell {
    pub fn is_blank(&self) -> bool {
        match self {
            Cell::Blank => true,
            Cell::Text(t) => t.trim().is_empty(),
            _ => false,
        }
    }

    /// True when the cell carries no usable value: blank or a sentinel
    /// placeholder string.
    pub fn is_placeholder(&self) -> bool {
        match self {
            Cell::Blank => true,
            Cell::Text(t) => is_placeholder_str(t),
            _ => false,
        }
    }

    /// The cell's text content, lowercased and trimmed. Numbers render with
    /// their natural formatting; blanks render empty.
    pub fn lower_text(&self) -> String {
        match self {
            Cell::Text(t) => t.trim().to_lowercase(),
            Cell::Number(n) => format_number(*n),
            Cell::Bool(b) => b.to_string(),
            Cell::Blank => String::new(),
        }
    }
}

pub fn is_placeholder_str(s: &str) -> bool {
    PLACEHOLDERS.contains(&s.trim())
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Parse a date cell: a numeric cell is a serial day offset, a text cell is
/// tried as `DD/MM/YYYY`. Anything else is left to the caller.
pub fn parse_date(cell: &Cell) -> Option<NaiveDate> {
    match cell {
        Cell::Number(n) => parse_serial_date(*n),
        Cell::Text(t) => parse_date_str(t),
        _ => None,
    }
}

/// Serial day offset (days since 1899-12-30) to a calendar date.
pub fn parse_serial_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 0.0 || serial > 200_000.0 {
        return None;
    }
    spreadsheet_epoch().checked_add_signed(Duration::days(serial.trunc() as i64))
}

/// `DD/MM/YYYY` string to a calendar date.
pub fn parse_date_str(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%d/%m/%Y").ok()
}

/// Parse a time cell: a numeric cell is a fraction of a day, a text cell is
/// tried as `HH:MM:SS` then `HH:MM`.
pub fn parse_time(cell: &Cell) -> Option<NaiveTime> {
    match cell {
        Cell::Number(n) => parse_fraction_time(*n),
        Cell::Text(t) => parse_time_str(t),
        _ => None,
    }
}

/// Fraction-of-day to a time, rounded to the nearest second.
pub fn parse_fraction_time(fraction: f64) -> Option<NaiveTime> {
    if !fraction.is_finite() || !(0.0..1.0).contains(&fraction) {
        return None;
    }
    let seconds = (fraction * 86_400.0).round() as u32;
    // 0.999995 rounds up to 86400, which wraps to midnight
    let seconds = seconds % 86_400;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)
}

pub fn parse_time_str(s: &str) -> Option<NaiveTime> {
    let t = s.trim();
    NaiveTime::parse_from_str(t, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
        .ok()
}

/// Defensive numeric parse. Accepts numeric cells directly and numeric
/// strings, including the Catalan-locale comma decimal separator. Placeholder
/// sentinels and unparseable text yield `None`, never zero.
pub fn parse_number(cell: &Cell) -> Option<f64> {
    match cell {
        Cell::Number(n) if n.is_finite() => Some(*n),
        Cell::Text(t) => parse_number_str(t),
        _ => None,
    }
}

pub fn parse_number_str(s: &str) -> Option<f64> {
    let t = s.trim();
    if is_placeholder_str(t) {
        return None;
    }
    let normalized = if t.contains(',') && !t.contains('.') {
        t.replace(',', ".")
    } else {
        t.replace(' ', "")
    };
    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Trimmed text content, with placeholder sentinels collapsed to `None`.
pub fn clean_text(cell: &Cell) -> Option<String> {
    let text = match cell {
        Cell::Text(t) => t.trim().to_string(),
        Cell::Number(n) => format_number(*n),
        _ => return None,
    };
    if is_placeholder_str(&text) {
        None
    } else {
        Some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serial_date() {
        // 2023-01-15 is 44941 days after 1899-12-30
        assert_eq!(
            parse_serial_date(44941.0),
            Some(NaiveDate::from_ymd_opt(2023, 1, 15).unwrap())
        );
        assert_eq!(parse_serial_date(-3.0), None);
        assert_eq!(parse_serial_date(f64::NAN), None);
    }

    #[test]
    fn test_date_str() {
        assert_eq!(
            parse_date_str("15/01/2023"),
            Some(NaiveDate::from_ymd_opt(2023, 1, 15).unwrap())
        );
        assert_eq!(parse_date_str("2023-01-15"), None);
        assert_eq!(parse_date_str("gener"), None);
    }

    #[test]
    fn test_fraction_time_rounds_to_second() {
        // 09:30:00 is 0.395833...
        let t = parse_fraction_time(9.5 / 24.0).unwrap();
        assert_eq!(t, NaiveTime::from_hms_opt(9, 30, 0).unwrap());

        let almost_midnight = parse_fraction_time(0.9999999).unwrap();
        assert_eq!(almost_midnight, NaiveTime::from_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_number_locale() {
        assert_eq!(parse_number(&Cell::Number(42.5)), Some(42.5));
        assert_eq!(parse_number(&Cell::Text("12,75".into())), Some(12.75));
        assert_eq!(parse_number(&Cell::Text("1234.5".into())), Some(1234.5));
        assert_eq!(parse_number(&Cell::Text("--".into())), None);
        assert_eq!(parse_number(&Cell::Blank), None);
    }

    #[test]
    fn test_placeholders() {
        assert!(Cell::Text("-".into()).is_placeholder());
        assert!(Cell::Text("  ".into()).is_placeholder());
        assert!(Cell::Blank.is_placeholder());
        assert!(!Cell::Number(0.0).is_placeholder());
        assert_eq!(clean_text(&Cell::Text(" + ".into())), None);
        assert_eq!(
            clean_text(&Cell::Text(" Pa de pagès ".into())),
            Some("Pa de pagès".into())
        );
    }
}
