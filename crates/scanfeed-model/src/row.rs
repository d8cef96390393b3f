//! Decoded report rows.

/// One decoded record: ordered `(column, value)` cells plus the verbatim
/// source text the cells were decoded from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
    cells: Vec<(String, String)>,
    raw: String,
    line: u64,
}

impl Row {
    pub fn new(cells: Vec<(String, String)>, raw: impl Into<String>, line: u64) -> Self {
        Self {
            cells,
            raw: raw.into(),
            line,
        }
    }

    /// Builds a row from `(column, value)` pairs; the raw text is the
    /// comma-joined values. Handy in tests.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let cells: Vec<(String, String)> = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let raw = cells
            .iter()
            .map(|(_, v)| v.as_str())
            .collect::<Vec<_>>()
            .join(",");
        Self {
            cells,
            raw,
            line: 0,
        }
    }

    /// Value of `column`, or `None` when the column does not exist.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn contains(&self, column: &str) -> bool {
        self.cells.iter().any(|(name, _)| name == column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().map(|(name, _)| name.as_str())
    }

    pub fn cells(&self) -> &[(String, String)] {
        &self.cells
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// 1-based line number of the record in its report (0 if unknown).
    pub fn line(&self) -> u64 {
        self.line
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
