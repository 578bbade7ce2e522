use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One named result set of an upstream response: column headers plus rows of
/// positionally keyed cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultSet {
    pub name: String,
    pub headers: Vec<String>,
    #[serde(rename = "rowSet")]
    pub row_set: Vec<Vec<Value>>,
}

/// Envelope of every upstream statistics response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub resource: String,
    #[serde(default)]
    pub parameters: Value,
    #[serde(rename = "resultSets")]
    pub result_sets: Vec<ResultSet>,
}

impl StatsResponse {
    /// Takes the result set with the given name out of the response.
    pub fn take_table(&mut self, name: &str) -> Option<RawTable> {
        let idx = self.result_sets.iter().position(|rs| rs.name == name)?;
        Some(RawTable::from(self.result_sets.remove(idx)))
    }

    /// Takes the first result set out of the response.
    pub fn take_first_table(&mut self) -> Option<RawTable> {
        if self.result_sets.is_empty() {
            None
        } else {
            Some(RawTable::from(self.result_sets.remove(0)))
        }
    }
}

/// A raw upstream table: an ordered sequence of rows of heterogeneous typed
/// cells, keyed by upstream column headers. Row order is significant (the
/// box-score display order is derived from it) and must be preserved.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RawTable {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl From<ResultSet> for RawTable {
    fn from(rs: ResultSet) -> Self {
        RawTable {
            name: rs.name,
            headers: rs.headers,
            rows: rs.row_set,
        }
    }
}

impl RawTable {
    /// Index of an upstream column header, if present.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Cell lookup by row index and header.
    pub fn cell(&self, row: usize, header: &str) -> Option<&Value> {
        let col = self.column_index(header)?;
        self.rows.get(row)?.get(col)
    }

    /// Appends the rows of another fetch of the same table shape.
    ///
    /// Accumulation across per-entity fetches requires identical headers;
    /// a mismatch means upstream changed schema mid-batch.
    pub fn extend_rows(&mut self, other: RawTable) -> Result<(), String> {
        if self.headers.is_empty() {
            self.headers = other.headers;
            self.name = other.name;
            self.rows.extend(other.rows);
            return Ok(());
        }
        if self.headers != other.headers {
            return Err(format!(
                "header mismatch while accumulating '{}' rows",
                self.name
            ));
        }
        self.rows.extend(other.rows);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
