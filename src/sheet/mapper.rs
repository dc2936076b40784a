//! Row to record conversion with coerce-or-default semantics
//!
//! A malformed or missing cell degrades to the attribute's default:
//! `None` for text and dates, zero for amounts.

use calamine::Data;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;

use super::columns::Field;
use super::header::HeaderIndex;
use crate::types::MedicationRecord;

/// Converts raw rows of one sheet into [`MedicationRecord`]s.
///
/// Column positions are resolved once against the sheet's header.
#[derive(Debug, Clone)]
pub struct RecordMapper {
    columns: HashMap<Field, usize>,
    /// Column checked to detect blank trailer rows
    sentinel: usize,
}

impl RecordMapper {
    pub fn new(index: &HeaderIndex) -> Self {
        let columns = Field::ALL
            .iter()
            .filter_map(|field| Some((*field, index.resolve(field.aliases())?)))
            .collect();

        Self {
            columns,
            sentinel: index.first_labelled_column().unwrap_or(0),
        }
    }

    /// Column position resolved for `field`, if any alias matched
    pub fn column(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).copied()
    }

    /// Fields none of whose aliases appear in the header
    pub fn unresolved(&self) -> Vec<Field> {
        Field::ALL
            .iter()
            .copied()
            .filter(|field| !self.columns.contains_key(field))
            .collect()
    }

    /// True when the first labelled column of `row` holds nothing
    pub fn is_blank(&self, row: &[Data]) -> bool {
        row.get(self.sentinel).map_or(true, is_empty_cell)
    }

    fn cell<'r>(&self, row: &'r [Data], field: Field) -> Option<&'r Data> {
        row.get(self.column(field)?)
    }

    pub fn text(&self, row: &[Data], field: Field) -> Option<String> {
        self.cell(row, field).and_then(cell_text)
    }

    pub fn decimal(&self, row: &[Data], field: Field) -> Decimal {
        self.cell(row, field).map_or(Decimal::ZERO, cell_decimal)
    }

    pub fn date(&self, row: &[Data], field: Field) -> Option<NaiveDate> {
        self.cell(row, field).and_then(cell_date)
    }

    /// Build a record from one data row. Never fails.
    pub fn map_row(&self, row: &[Data]) -> MedicationRecord {
        MedicationRecord {
            disease_group: self.text(row, Field::DiseaseGroup),
            international_code: self.text(row, Field::InternationalCode),
            international_name: self.text(row, Field::InternationalName),
            dose: self.text(row, Field::Dose),
            commercial_code: self.text(row, Field::CommercialCode),
            compensation_amount_with_tax: self.decimal(row, Field::CompensationAmountWithTax),
            compensation_amount_without_tax: self.decimal(row, Field::CompensationAmountWithoutTax),
            commercial_name: self.text(row, Field::CommercialName),
            pharmaceutical_form: self.text(row, Field::PharmaceuticalForm),
            pack_size: self.text(row, Field::PackSize),
            country: self.text(row, Field::Country),
            manufacturer: self.text(row, Field::Manufacturer),
            registration_number: self.text(row, Field::RegistrationNumber),
            registration_date: self.date(row, Field::RegistrationDate),
            atc_code: self.text(row, Field::AtcCode),
            medication_code: self.text(row, Field::MedicationCode),
            price_approval_date: self.text(row, Field::PriceApprovalDate),
            ..MedicationRecord::default()
        }
    }
}

fn is_empty_cell(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Textual form of a cell; `None` for empty and error cells.
pub fn cell_text(cell: &Data) -> Option<String> {
    let text = match cell {
        Data::Empty | Data::Error(_) => return None,
        Data::String(s) => s.trim().to_string(),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) => value.format("%d.%m.%Y").to_string(),
            None => cell.to_string(),
        },
        other => other.to_string(),
    };

    (!text.is_empty()).then_some(text)
}

/// Amount parsed with `.` as decimal point; zero when unparseable.
pub fn cell_decimal(cell: &Data) -> Decimal {
    match cell {
        Data::Int(i) => Decimal::from(*i),
        Data::Float(f) => f.to_string().parse().unwrap_or(Decimal::ZERO),
        Data::String(s) => s.trim().parse().unwrap_or(Decimal::ZERO),
        _ => Decimal::ZERO,
    }
}

/// Date from a `dd.mm.yyyy` text cell; `None` for anything else,
/// including cells the workbook already stores as dates.
pub fn cell_date(cell: &Data) -> Option<NaiveDate> {
    match cell {
        Data::String(s) => parse_dotted_date(s),
        _ => None,
    }
}

/// Strict `dd.mm.yyyy` parse; surrounding whitespace is ignored.
pub fn parse_dotted_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    let bytes = text.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            2 | 5 => *b == b'.',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return None;
    }
    NaiveDate::parse_from_str(text, "%d.%m.%Y").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn header() -> HeaderIndex {
        HeaderIndex::build([
            "Grupa maladiilor pentru compensare",
            "Cod DCI",
            "Suma fixă compensată per unitate de măsură inclusiv TVA",
            "Țara",
            "Data înregistrării",
        ])
    }

    fn s(text: &str) -> Data {
        Data::String(text.to_string())
    }

    #[test]
    fn test_decimal_uses_invariant_point() {
        assert_eq!(cell_decimal(&s("12.50")), Decimal::from_str("12.50").unwrap());
        assert_eq!(cell_decimal(&s("n/a")), Decimal::ZERO);
        assert_eq!(cell_decimal(&s("12,50")), Decimal::ZERO);
        assert_eq!(cell_decimal(&Data::Float(3.75)), Decimal::from_str("3.75").unwrap());
        assert_eq!(cell_decimal(&Data::Int(4)), Decimal::from(4));
        assert_eq!(cell_decimal(&Data::Empty), Decimal::ZERO);
        assert_eq!(cell_decimal(&Data::Bool(true)), Decimal::ZERO);
    }

    #[test]
    fn test_date_is_strict() {
        assert_eq!(
            cell_date(&s("15.03.2024")),
            NaiveDate::from_ymd_opt(2024, 3, 15)
        );
        assert_eq!(cell_date(&s(" 01.12.2020 ")), NaiveDate::from_ymd_opt(2020, 12, 1));
        assert_eq!(cell_date(&s("2024-03-15")), None);
        assert_eq!(cell_date(&s("1.3.2024")), None);
        assert_eq!(cell_date(&s("31.02.2024")), None);
        assert_eq!(cell_date(&s("")), None);
        assert_eq!(cell_date(&Data::Float(45366.0)), None);
    }

    #[test]
    fn test_text_of_various_cells() {
        assert_eq!(cell_text(&s("  Paracetamol ")), Some("Paracetamol".to_string()));
        assert_eq!(cell_text(&s("   ")), None);
        assert_eq!(cell_text(&Data::Empty), None);
        assert_eq!(cell_text(&Data::Int(12345)), Some("12345".to_string()));
        assert_eq!(cell_text(&Data::Float(500.0)), Some("500".to_string()));
    }

    #[test]
    fn test_alias_resolves_comma_below_country() {
        let mapper = RecordMapper::new(&header());
        assert_eq!(mapper.column(Field::Country), Some(3));
    }

    #[test]
    fn test_missing_column_yields_default() {
        let mapper = RecordMapper::new(&header());
        let row = vec![s("Diabet"), s("A10"), s("n/a"), s("Germania"), s("garbage")];
        let record = mapper.map_row(&row);

        assert_eq!(record.disease_group.as_deref(), Some("Diabet"));
        assert_eq!(record.country.as_deref(), Some("Germania"));
        assert_eq!(record.compensation_amount_with_tax, Decimal::ZERO);
        assert_eq!(record.compensation_amount_without_tax, Decimal::ZERO);
        assert_eq!(record.registration_date, None);
        assert_eq!(record.manufacturer, None);
        assert!(mapper.unresolved().contains(&Field::Manufacturer));
    }

    #[test]
    fn test_short_row_yields_defaults() {
        let mapper = RecordMapper::new(&header());
        let record = mapper.map_row(&[s("Diabet")]);
        assert_eq!(record.disease_group.as_deref(), Some("Diabet"));
        assert_eq!(record.international_code, None);
        assert_eq!(record.registration_date, None);
    }

    #[test]
    fn test_blank_row_detection() {
        let mapper = RecordMapper::new(&header());
        assert!(mapper.is_blank(&[]));
        assert!(mapper.is_blank(&[Data::Empty, s("A10")]));
        assert!(mapper.is_blank(&[s("  ")]));
        assert!(!mapper.is_blank(&[s("Diabet")]));
    }
}
