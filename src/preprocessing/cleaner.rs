//! Schema gate and basic cleaning for historical training data.
//!
//! Malformed exports must fail loudly here rather than silently lose rows
//! further down the pipeline.

use crate::error::{PipelineError, Result};
use crate::types::record::{columns, ApplicantRecord};
use tracing::debug;

/// Raw columns every training batch must carry
pub const REQUIRED_COLUMNS: [&str; 12] = [
    columns::GRANT_YEAR,
    columns::SCHOLARSHIP_TYPE,
    columns::SEX,
    columns::RACE,
    columns::BIRTH_DATE,
    columns::DISABILITY,
    columns::REGION,
    columns::STATE,
    columns::MUNICIPALITY,
    columns::MODALITY,
    columns::COURSE,
    columns::SHIFT,
];

/// Tokens treated as missing after trimming
pub const NULL_LIKE_TOKENS: [&str; 5] = ["", "NA", "N/A", "NULL", "None"];

/// Untyped tabular batch: header names plus string cells
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }
}

/// Trim a cell and map null-like tokens to `None`.
pub fn clean_value(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if NULL_LIKE_TOKENS.contains(&trimmed) {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Parse a grant year cell. Accepts integral floats such as `"2020.0"`.
pub fn parse_grant_year(raw: &str) -> Option<i32> {
    let value = clean_value(raw)?;
    if let Ok(year) = value.parse::<i32>() {
        return Some(year);
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|y| y.is_finite() && y.fract() == 0.0)
        .map(|y| y as i32)
}

/// Return the required columns absent from `headers`, in schema order.
pub fn missing_columns(headers: &[String]) -> Vec<String> {
    REQUIRED_COLUMNS
        .iter()
        .filter(|required| !headers.iter().any(|h| h.trim() == **required))
        .map(|c| c.to_string())
        .collect()
}

/// Validate the schema, keep only the required columns and normalize
/// empty-like cells to missing.
pub fn basic_clean(table: &RawTable) -> Result<Vec<ApplicantRecord>> {
    let missing = missing_columns(&table.headers);
    if !missing.is_empty() {
        return Err(PipelineError::MissingColumns(missing));
    }

    // Every lookup succeeds after the schema check above.
    let idx = |name: &str| table.column_index(name).unwrap_or(usize::MAX);
    let positions: [usize; 12] = REQUIRED_COLUMNS.map(idx);

    let cell = |row: &[String], pos: usize| -> Option<String> {
        row.get(pos).and_then(|v| clean_value(v))
    };

    let records: Vec<ApplicantRecord> = table
        .rows
        .iter()
        .map(|row| ApplicantRecord {
            grant_year: row.get(positions[0]).and_then(|v| parse_grant_year(v)),
            scholarship_type: cell(row, positions[1]),
            sex: cell(row, positions[2]),
            race: cell(row, positions[3]),
            birth_date: cell(row, positions[4]),
            disability: cell(row, positions[5]),
            region: cell(row, positions[6]),
            state: cell(row, positions[7]),
            municipality: cell(row, positions[8]),
            modality: cell(row, positions[9]),
            course: cell(row, positions[10]),
            shift: cell(row, positions[11]),
        })
        .collect();

    debug!(
        rows = records.len(),
        dropped_columns = table.headers.len().saturating_sub(REQUIRED_COLUMNS.len()),
        "Basic cleaning complete"
    );

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers() -> Vec<String> {
        let mut h: Vec<String> = REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect();
        h.push("CPF_BENEFICIARIO".to_string());
        h
    }

    fn row(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_missing_columns_named_exactly() {
        let table = RawTable::new(
            vec!["ANO_CONCESSAO_BOLSA".to_string(), "SEXO_BENEFICIARIO".to_string()],
            vec![],
        );
        match basic_clean(&table) {
            Err(PipelineError::MissingColumns(cols)) => {
                assert_eq!(cols.len(), 10);
                assert!(cols.contains(&"TIPO_BOLSA".to_string()));
                assert!(!cols.contains(&"SEXO_BENEFICIARIO".to_string()));
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn test_clean_maps_null_like_tokens_and_drops_extra_columns() {
        let table = RawTable::new(
            headers(),
            vec![row(&[
                "2020",
                "BOLSA INTEGRAL",
                " F ",
                "NA",
                "2000-01-01",
                "N",
                "SUDESTE",
                "SP",
                "N/A",
                "PRESENCIAL",
                "DIREITO",
                "",
                "123.456.789-00",
            ])],
        );
        let records = basic_clean(&table).unwrap();
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.grant_year, Some(2020));
        assert_eq!(r.sex.as_deref(), Some("F"));
        assert_eq!(r.race, None);
        assert_eq!(r.municipality, None);
        assert_eq!(r.shift, None);
        assert_eq!(r.scholarship_type.as_deref(), Some("BOLSA INTEGRAL"));
    }

    #[test]
    fn test_column_order_independent() {
        let mut h = headers();
        h.reverse();
        let mut values = vec![
            "2019", "PARCIAL", "M", "BRANCA", "1999-05-05", "N", "SUL", "PR", "CURITIBA",
            "EAD", "MEDICINA", "NOTURNO", "x",
        ];
        values.reverse();
        let table = RawTable::new(h, vec![row(&values)]);
        let records = basic_clean(&table).unwrap();
        assert_eq!(records[0].grant_year, Some(2019));
        assert_eq!(records[0].course.as_deref(), Some("MEDICINA"));
        assert_eq!(records[0].state.as_deref(), Some("PR"));
    }

    #[test]
    fn test_parse_grant_year() {
        assert_eq!(parse_grant_year("2020"), Some(2020));
        assert_eq!(parse_grant_year(" 2020.0 "), Some(2020));
        assert_eq!(parse_grant_year("2020.5"), None);
        assert_eq!(parse_grant_year("NULL"), None);
        assert_eq!(parse_grant_year("abc"), None);
    }
}
