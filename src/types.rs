//! Core types for the compensated-medicines pipeline

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::IngestError;

// ============================================================================
// Category
// ============================================================================

/// One of the medication lists published in the source workbook.
///
/// Each category is bound to one sheet of the workbook and to an
/// independent cache entry with its own time-to-live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Medicines compensated in full
    FullyCompensated,
    /// Medicines compensated partially
    PartiallyCompensated,
    /// Time-bounded pandemic list
    Pandemic,
}

impl Category {
    /// All categories, in sheet order of the default layout
    pub const ALL: [Category; 3] = [
        Category::FullyCompensated,
        Category::PartiallyCompensated,
        Category::Pandemic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FullyCompensated => "fully_compensated",
            Self::PartiallyCompensated => "partially_compensated",
            Self::Pandemic => "pandemic",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "fully_compensated" | "FullCompensated" => Ok(Self::FullyCompensated),
            "partially_compensated" | "PartialCompensated" => Ok(Self::PartiallyCompensated),
            "pandemic" | "Covid19" => Ok(Self::Pandemic),
            other => Err(IngestError::UnknownCategory(other.to_string())),
        }
    }
}

// ============================================================================
// Medication Record
// ============================================================================

/// One normalized row of the published list.
///
/// Every field is either a parsed value or its default; a malformed cell
/// never leaves the record half-built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationRecord {
    /// Generated on construction, not derived from source data
    pub id: Uuid,
    pub disease_group: Option<String>,
    pub international_code: Option<String>,
    pub international_name: Option<String>,
    pub dose: Option<String>,
    pub commercial_code: Option<String>,
    /// Fixed compensated amount per unit, VAT included
    pub compensation_amount_with_tax: Decimal,
    /// Fixed compensated amount per unit, VAT excluded
    pub compensation_amount_without_tax: Decimal,
    pub commercial_name: Option<String>,
    pub pharmaceutical_form: Option<String>,
    pub pack_size: Option<String>,
    pub country: Option<String>,
    pub manufacturer: Option<String>,
    pub registration_number: Option<String>,
    /// `None` when the cell is absent or not a `dd.mm.yyyy` string
    pub registration_date: Option<NaiveDate>,
    pub atc_code: Option<String>,
    pub medication_code: Option<String>,
    /// Raw text; the source mixes date formats in this column
    pub price_approval_date: Option<String>,
}

impl Default for MedicationRecord {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            disease_group: None,
            international_code: None,
            international_name: None,
            dose: None,
            commercial_code: None,
            compensation_amount_with_tax: Decimal::ZERO,
            compensation_amount_without_tax: Decimal::ZERO,
            commercial_name: None,
            pharmaceutical_form: None,
            pack_size: None,
            country: None,
            manufacturer: None,
            registration_number: None,
            registration_date: None,
            atc_code: None,
            medication_code: None,
            price_approval_date: None,
        }
    }
}
