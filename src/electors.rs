use anyhow::{anyhow, Context, Result};
use csv::ReaderBuilder;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

/// One CSV row for a constituency, e.g. a candidate and their vote count.
pub type ElectorRow = BTreeMap<String, String>;

/// Elector information keyed by `(year, jurisdiction code)`.
#[derive(Debug, Clone, Default)]
pub struct ElectorsTable {
    rows: HashMap<(String, String), Vec<ElectorRow>>,
}

impl ElectorsTable {
    pub fn load(path: &Path, code_column: &str) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open electors CSV: {:?}", path))?;
        let table = Self::from_reader(file, code_column)
            .with_context(|| format!("Failed to read electors CSV: {:?}", path))?;
        info!(constituencies = table.rows.len(), "loaded electors table");
        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R, code_column: &str) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = rdr.headers()?.clone();

        let year_idx = headers
            .iter()
            .position(|h| h == "year")
            .ok_or_else(|| anyhow!("Column 'year' not found in electors CSV"))?;
        let code_idx = headers
            .iter()
            .position(|h| h == code_column)
            .ok_or_else(|| anyhow!("Column '{}' not found in electors CSV", code_column))?;

        let mut rows: HashMap<(String, String), Vec<ElectorRow>> = HashMap::new();
        for result in rdr.records() {
            let record = result?;
            let year = record.get(year_idx).unwrap_or("");
            let code = record.get(code_idx).unwrap_or("");
            if year.is_empty() || code.is_empty() {
                continue;
            }

            let row: ElectorRow = headers
                .iter()
                .zip(record.iter())
                .enumerate()
                .filter(|(i, _)| *i != year_idx && *i != code_idx)
                .map(|(_, (h, v))| (h.to_string(), v.to_string()))
                .collect();

            rows.entry((year.to_string(), code.to_string()))
                .or_default()
                .push(row);
        }

        Ok(Self { rows })
    }

    pub fn lookup(&self, year: &str, code: &str) -> &[ElectorRow] {
        self.rows
            .get(&(year.to_string(), code.to_string()))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
