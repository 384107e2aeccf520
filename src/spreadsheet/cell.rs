use crate::helpers::reference::index_to_reference;
use crate::spreadsheet::SpreadsheetError;
use crate::table::Value;
use chrono::Duration;
use chrono::NaiveDate;
use chrono::NaiveDateTime;

/// Day count past which no serial can land on a representable calendar date.
const MAX_SERIAL_DAYS: f64 = 1.0e8;

/// Storage kinds of a raw worksheet cell.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub(crate) enum CellType {
    #[default]
    Empty,
    /// Boolean values stored as "1"/"0"
    Boolean,
    Number,
    /// Serial date/time numbers counted from the 1900 epoch
    NumberDateTime1900,
    NumberDate1900,
    NumberTime1900,
    /// Serial date/time numbers counted from the 1904 epoch
    NumberDateTime1904,
    NumberDate1904,
    NumberTime1904,
    /// ISO 8601 date/time strings (t="d")
    IsoDateTime,
    InlineString,
    /// Index into the shared string table
    SharedString,
    Error,
}

impl CellType {
    /// Maps built-in number format ids that denote dates and times.
    pub(crate) fn parse_builtin_number_format_id(id: &str, is_1904: bool) -> Option<Self> {
        match id {
            "22" => Some(if is_1904 { Self::NumberDateTime1904 } else { Self::NumberDateTime1900 }),
            "14" | "15" | "16" | "17" => Some(if is_1904 { Self::NumberDate1904 } else { Self::NumberDate1900 }),
            "18" | "19" | "20" | "21" | "45" | "46" | "47" => {
                Some(if is_1904 { Self::NumberTime1904 } else { Self::NumberTime1900 })
            }
            _ => None,
        }
    }

    /// Classifies a custom format code by the date/time tokens outside literals and brackets.
    pub(crate) fn parse_custom_number_format(format: &str, is_1904: bool) -> Self {
        let mut is_escaped = false;
        let mut is_literal = false;
        let mut is_date = false;
        let mut is_time = false;
        let mut is_color = false;
        for character in format.chars() {
            match character {
                _ if is_escaped => is_escaped = false,
                '_' | '\\' => is_escaped = true,

                '"' if is_literal => is_literal = false,
                '"' if !is_color => is_literal = true,

                ']' if is_color => is_color = false,
                '[' if !is_literal => is_color = true,
                _ if is_literal || is_color => (),

                'Y' | 'y' | 'D' | 'd' => is_date = true,
                'H' | 'h' | 'S' | 's' => is_time = true,
                _ => (),
            }
        }

        match (is_date, is_time, is_1904) {
            (true, true, false) => Self::NumberDateTime1900,
            (true, true, true) => Self::NumberDateTime1904,
            (true, false, false) => Self::NumberDate1900,
            (true, false, true) => Self::NumberDate1904,
            (false, true, false) => Self::NumberTime1900,
            (false, true, true) => Self::NumberTime1904,
            (false, false, _) => Self::Number,
        }
    }

    fn is_1904(&self) -> bool {
        matches!(self, Self::NumberDateTime1904 | Self::NumberDate1904 | Self::NumberTime1904)
    }
}

/// A raw worksheet cell: position, storage kind and the text found in the XML.
#[derive(Clone, Debug)]
pub(crate) struct Cell {
    /// Row index (0-based)
    pub(crate) row: usize,
    /// Column index (0-based)
    pub(crate) col: usize,
    pub(crate) kind: CellType,
    pub(crate) value: String,
}

impl Cell {
    /// Returns the A1-style reference of the cell.
    pub(crate) fn reference(&self) -> String {
        index_to_reference(self.row, self.col)
    }

    /// Converts the stored text to a tagged table value.
    pub(crate) fn to_value(&self, shared_strings: &[String]) -> Result<Value, SpreadsheetError> {
        let value = match self.kind {
            CellType::Empty => Value::Empty,
            CellType::Boolean => Value::Boolean(self.value == "1" || self.value.eq_ignore_ascii_case("true")),
            CellType::Number => self.to_number()?,
            CellType::NumberDate1900 | CellType::NumberDate1904 => Value::Date(self.to_date()?),
            CellType::NumberDateTime1900 | CellType::NumberDateTime1904 => Value::DateTime(self.to_datetime()?),
            CellType::NumberTime1900 | CellType::NumberTime1904 => {
                Value::Text(self.to_datetime()?.time().format("%H:%M:%S").to_string())
            }
            CellType::IsoDateTime => self.parse_iso()?,
            CellType::InlineString => Value::Text(self.value.to_owned()),
            CellType::SharedString => {
                let index = self.value.parse::<usize>().map_err(|_| self.invalid("not a shared string index"))?;
                let text = shared_strings.get(index).ok_or_else(|| self.invalid("shared string index out of range"))?;
                Value::Text(text.to_owned())
            }
            CellType::Error => Value::Text(self.value.to_owned()),
        };
        Ok(value)
    }

    fn to_double(&self) -> Result<f64, SpreadsheetError> {
        self.value.parse::<f64>().map_err(|_| self.invalid("not a number"))
    }

    fn to_number(&self) -> Result<Value, SpreadsheetError> {
        if let Ok(integer) = self.value.parse::<i64>() {
            Ok(Value::Integer(integer))
        } else {
            Ok(Value::Float(self.to_double()?))
        }
    }

    /// Serial day number to calendar date, honouring the Lotus 1-2-3 leap year bug.
    fn to_date(&self) -> Result<NaiveDate, SpreadsheetError> {
        let serial = self.to_double()?.trunc();
        if !serial.is_finite() || serial.abs() > MAX_SERIAL_DAYS {
            return Err(self.invalid("date out of range"));
        }
        let days = serial as i64;
        let offset = if self.kind.is_1904() {
            1462
        } else if days < 60 {
            1
        } else {
            0
        };
        let epoch = NaiveDate::from_ymd_opt(1899, 12, 30).ok_or_else(|| self.invalid("epoch"))?;
        days.checked_add(offset)
            .and_then(Duration::try_days)
            .and_then(|delta| epoch.checked_add_signed(delta))
            .ok_or_else(|| self.invalid("date out of range"))
    }

    fn to_datetime(&self) -> Result<NaiveDateTime, SpreadsheetError> {
        let serial = self.to_double()?;
        let date = self.to_date()?;
        let milliseconds = (serial.fract() * 86_400_000f64).round() as i64;
        date.and_hms_opt(0, 0, 0)
            .ok_or_else(|| self.invalid("midnight"))?
            .checked_add_signed(Duration::milliseconds(milliseconds))
            .ok_or_else(|| self.invalid("datetime out of range"))
    }

    fn parse_iso(&self) -> Result<Value, SpreadsheetError> {
        if self.value.contains('T') {
            NaiveDateTime::parse_from_str(&self.value, "%Y-%m-%dT%H:%M:%S%.f")
                .map(Value::DateTime)
                .map_err(|_| self.invalid("not an ISO 8601 datetime"))
        } else {
            NaiveDate::parse_from_str(&self.value, "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|_| self.invalid("not an ISO 8601 date"))
        }
    }

    fn invalid(&self, message: &str) -> SpreadsheetError {
        SpreadsheetError::CellValueError(self.reference(), format!("'{}' {}", self.value, message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(kind: CellType, value: &str) -> Cell {
        Cell { row: 1, col: 2, kind, value: value.to_owned() }
    }

    #[test]
    fn custom_formats_detect_dates() {
        assert_eq!(CellType::parse_custom_number_format("yyyy-mm-dd", false), CellType::NumberDate1900);
        assert_eq!(CellType::parse_custom_number_format("hh:mm", true), CellType::NumberTime1904);
        assert_eq!(CellType::parse_custom_number_format("[Red]0.00", false), CellType::Number);
        assert_eq!(CellType::parse_custom_number_format("\"day\" 0", false), CellType::Number);
    }

    #[test]
    fn numbers_keep_integer_form() {
        assert_eq!(cell(CellType::Number, "17").to_value(&[]).unwrap(), Value::Integer(17));
        assert_eq!(cell(CellType::Number, "1.5").to_value(&[]).unwrap(), Value::Float(1.5));
        assert!(cell(CellType::Number, "abc").to_value(&[]).is_err());
    }

    #[test]
    fn serial_dates_convert() {
        let date = cell(CellType::NumberDate1900, "45292").to_value(&[]).unwrap();
        assert_eq!(date, Value::Date(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()));

        let datetime = cell(CellType::NumberDateTime1900, "45292.5").to_value(&[]).unwrap();
        assert_eq!(datetime.canonical(), "2024-01-01 12:00:00");
    }

    #[test]
    fn huge_serials_are_rejected() {
        for kind in [CellType::NumberDate1900, CellType::NumberDate1904, CellType::NumberDateTime1900] {
            let error = cell(kind, "1e20").to_value(&[]).unwrap_err();
            assert!(error.to_string().contains("date out of range"));
        }
        assert!(cell(CellType::NumberDate1900, "-1e20").to_value(&[]).is_err());
        assert!(cell(CellType::NumberDate1904, "inf").to_value(&[]).is_err());
        assert!(cell(CellType::NumberDate1900, "NaN").to_value(&[]).is_err());
    }

    #[test]
    fn shared_strings_resolve() {
        let strings = vec!["id".to_owned(), "email".to_owned()];
        assert_eq!(cell(CellType::SharedString, "1").to_value(&strings).unwrap(), Value::from("email"));
        let error = cell(CellType::SharedString, "5").to_value(&strings).unwrap_err();
        assert!(error.to_string().contains("C2"));
    }
}
