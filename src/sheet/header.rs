//! Column label to position mapping built from a sheet's header row

use std::collections::HashMap;

/// Maps each header label to its column position.
///
/// Duplicate labels are renamed `"<label> 2"`, `"<label> 3"`, ... (first
/// unused suffix), so every column stays addressable.
#[derive(Debug, Clone, Default)]
pub struct HeaderIndex {
    positions: HashMap<String, usize>,
    /// Label of each column, in column order
    labels: Vec<String>,
}

impl HeaderIndex {
    /// Build the index from raw header cell texts, left to right.
    pub fn build<I, S>(header_row: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut index = Self::default();

        for (column, raw) in header_row.into_iter().enumerate() {
            let base = raw.as_ref().trim();
            let mut label = base.to_string();
            if index.positions.contains_key(&label) {
                let mut suffix = 2;
                while index.positions.contains_key(&format!("{} {}", base, suffix)) {
                    suffix += 1;
                }
                label = format!("{} {}", base, suffix);
            }
            index.positions.insert(label.clone(), column);
            index.labels.push(label);
        }

        index
    }

    /// Column position of an exact label
    pub fn get(&self, label: &str) -> Option<usize> {
        self.positions.get(label).copied()
    }

    /// Column position of the first alias that resolves.
    ///
    /// Exact matches are tried for every alias before falling back to a
    /// folded comparison (see [`fold_label`]).
    pub fn resolve(&self, aliases: &[&str]) -> Option<usize> {
        if let Some(column) = aliases.iter().find_map(|alias| self.get(alias)) {
            return Some(column);
        }

        let folded: Vec<String> = aliases.iter().map(|a| fold_label(a)).collect();
        self.labels
            .iter()
            .position(|label| {
                let label = fold_label(label);
                folded.iter().any(|alias| *alias == label)
            })
    }

    /// Leftmost column with a non-empty label
    pub fn first_labelled_column(&self) -> Option<usize> {
        self.labels.iter().position(|label| !label.trim().is_empty())
    }

    /// Labels in column order, after disambiguation
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Normalize a header label for tolerant comparison.
///
/// Unifies the cedilla and comma-below forms of Romanian `ş`/`ţ`, lowercases,
/// and collapses whitespace.
pub fn fold_label(label: &str) -> String {
    let unified: String = label
        .chars()
        .map(|c| match c {
            'Ş' | 'Ș' | 'ş' | 'ș' => 'ș',
            'Ţ' | 'Ț' | 'ţ' | 'ț' => 'ț',
            other => other,
        })
        .collect();

    unified
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
