use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use crate::error::{Result, SurvError};

/// cell values read as missing in numeric columns
const MISSING_TOKENS: [&str; 6] = ["", "NA", "NaN", "nan", "N/A", "null"];

/// flat string table w/ a header row - cells stay text until asked for numbers
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// build a table from headers and rows, every row must be as wide as the header
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for name in &headers {
            if !seen.insert(name.as_str()) {
                return Err(SurvError::invalid_table(format!("duplicate column '{}'", name)));
            }
        }

        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != headers.len()) {
            return Err(SurvError::invalid_dimensions(format!(
                "row {} has {} cells, header has {}",
                i,
                row.len(),
                headers.len()
            )));
        }

        Ok(Self { headers, rows })
    }

    /// read a comma separated file w/ a header row
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let table = Self::from_reader(BufReader::new(file), b',')?;
        log::debug!(
            "read {} rows x {} columns from {}",
            table.n_rows(),
            table.n_cols(),
            path.display()
        );
        Ok(table)
    }

    /// read delimited text w/ a header row from any reader
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .trim(csv::Trim::Headers)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Self::new(headers, rows)
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.headers.len()
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| SurvError::column_not_found(name))
    }

    /// raw cells of one column, in row order
    pub fn column(&self, name: &str) -> Result<Vec<&str>> {
        let j = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[j].as_str()).collect())
    }

    /// numeric view of a column - missing cells become NaN, junk is an error
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>> {
        let j = self.column_index(name)?;
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let cell = row[j].trim();
                if MISSING_TOKENS.contains(&cell) {
                    return Ok(f64::NAN);
                }
                cell.parse::<f64>().map_err(|_| {
                    SurvError::invalid_table(format!(
                        "column '{}' row {}: '{}' is not a number",
                        name, i, cell
                    ))
                })
            })
            .collect()
    }

    /// new table w/ just the given rows, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Result<Self> {
        if indices.iter().any(|&i| i >= self.n_rows()) {
            return Err(SurvError::invalid_dimensions("row index out of bounds"));
        }

        Ok(Self {
            headers: self.headers.clone(),
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        })
    }

    /// inner join on `self[left_on] == other[right_on]`
    ///
    /// output keeps the left table's row order, a left row matching k right rows
    /// yields k rows, unmatched left rows are dropped. colliding column names get
    /// `_x` / `_y` suffixes unless they're the shared key.
    pub fn inner_join(&self, other: &Table, left_on: &str, right_on: &str) -> Result<Table> {
        let left_key = self.column_index(left_on)?;
        let right_key = other.column_index(right_on)?;
        let shared_key = left_on == right_on;

        let mut index: HashMap<&str, Vec<usize>> = HashMap::new();
        for (i, row) in other.rows.iter().enumerate() {
            index.entry(row[right_key].trim()).or_default().push(i);
        }

        // a shared key column only shows up once (from the left side)
        let right_cols: Vec<usize> = (0..other.n_cols())
            .filter(|&j| !(shared_key && j == right_key))
            .collect();

        let left_names: HashSet<&str> = self.headers.iter().map(String::as_str).collect();
        let right_names: HashSet<&str> = right_cols
            .iter()
            .map(|&j| other.headers[j].as_str())
            .collect();

        let mut headers = Vec::with_capacity(self.n_cols() + right_cols.len());
        for name in &self.headers {
            if right_names.contains(name.as_str()) {
                headers.push(format!("{}_x", name));
            } else {
                headers.push(name.clone());
            }
        }
        for &j in &right_cols {
            let name = &other.headers[j];
            if left_names.contains(name.as_str()) {
                headers.push(format!("{}_y", name));
            } else {
                headers.push(name.clone());
            }
        }

        let mut rows = Vec::new();
        let mut dropped = 0usize;
        for row in &self.rows {
            match index.get(row[left_key].trim()) {
                Some(matches) => {
                    for &m in matches {
                        let mut joined = row.clone();
                        joined.extend(right_cols.iter().map(|&j| other.rows[m][j].clone()));
                        rows.push(joined);
                    }
                }
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            log::warn!(
                "{} of {} rows had no '{}' match in '{}' and were dropped",
                dropped,
                self.n_rows(),
                left_on,
                right_on
            );
        }
        log::debug!("join produced {} rows", rows.len());

        Table::new(headers, rows)
    }

    /// distinct values of a column in first-appearance order
    pub fn unique(&self, name: &str) -> Result<Vec<String>> {
        let j = self.column_index(name)?;
        let mut seen = HashSet::new();
        Ok(self
            .rows
            .iter()
            .filter(|row| seen.insert(row[j].as_str()))
            .map(|row| row[j].clone())
            .collect())
    }

    /// split into one table per distinct label, labels in first-appearance order
    pub fn group_by(&self, name: &str) -> Result<Vec<(String, Table)>> {
        let j = self.column_index(name)?;

        let mut slots: HashMap<&str, usize> = HashMap::new();
        let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
        for (i, row) in self.rows.iter().enumerate() {
            let label = row[j].as_str();
            let slot = *slots.entry(label).or_insert_with(|| {
                groups.push((label.to_string(), Vec::new()));
                groups.len() - 1
            });
            groups[slot].1.push(i);
        }

        groups
            .into_iter()
            .map(|(label, indices)| Ok((label, self.select_rows(&indices)?)))
            .collect()
    }

    /// write back out as csv w/ a header row
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }
}
