//! Spreadsheet decoding and row normalization
//!
//! The published workbook is hand-maintained: column order shifts between
//! republications, headers are duplicated or respelled, and cells are often
//! blank or malformed. Parsing therefore goes through three layers:
//! - `HeaderIndex`: label-to-position mapping built from the header row
//! - `RecordMapper`: alias lookup and coerce-or-default cell conversion
//! - `SpreadsheetParser`: workbook decoding and the row loop

pub mod columns;
pub mod header;
pub mod mapper;

pub use columns::Field;
pub use header::HeaderIndex;
pub use mapper::RecordMapper;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;
use tracing::{debug, warn};

use crate::error::{IngestError, IngestResult};
use crate::types::MedicationRecord;

/// Parses the published workbook into records
#[derive(Debug, Clone, Copy, Default)]
pub struct SpreadsheetParser;

impl SpreadsheetParser {
    /// Decode `document` (legacy `.xls` or `.xlsx`, detected by content) and
    /// parse the sheet at position `sheet`.
    pub fn parse(&self, document: &[u8], sheet: usize) -> IngestResult<Vec<MedicationRecord>> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(document))
            .map_err(|e| IngestError::MalformedDocument(format!("cannot decode workbook: {}", e)))?;

        let sheet_count = workbook.sheet_names().len();
        let range = workbook
            .worksheet_range_at(sheet)
            .ok_or_else(|| {
                IngestError::MalformedDocument(format!(
                    "sheet {} not present, workbook has {} sheet(s)",
                    sheet, sheet_count
                ))
            })?
            .map_err(|e| IngestError::MalformedDocument(format!("cannot read sheet {}: {}", sheet, e)))?;

        debug!(sheet, rows = range.height(), columns = range.width(), "Decoded sheet");
        Ok(self.parse_rows(range.rows()))
    }

    /// Parse already-decoded rows: the first row is the header, every
    /// following non-blank row becomes one record, in source order.
    pub fn parse_rows<'a, I>(&self, rows: I) -> Vec<MedicationRecord>
    where
        I: IntoIterator<Item = &'a [Data]>,
    {
        let mut rows = rows.into_iter();
        let Some(header_row) = rows.next() else {
            return Vec::new();
        };

        let index = HeaderIndex::build(
            header_row
                .iter()
                .map(|cell| mapper::cell_text(cell).unwrap_or_default()),
        );
        let mapper = RecordMapper::new(&index);

        let unresolved = mapper.unresolved();
        if !unresolved.is_empty() {
            warn!(?unresolved, "Columns missing from header, using defaults");
        }

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for row in rows {
            if mapper.is_blank(row) {
                skipped += 1;
                continue;
            }
            records.push(mapper.map_row(row));
        }

        debug!(records = records.len(), skipped, "Parsed sheet rows");
        records
    }
}
