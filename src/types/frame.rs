//! Columnar batch of feature records, addressed by column name

use crate::types::record::FeatureRecord;

/// Column payload. Missing cells are `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureColumn {
    Text(Vec<Option<String>>),
    Numeric(Vec<Option<f64>>),
}

impl FeatureColumn {
    pub fn len(&self) -> usize {
        match self {
            FeatureColumn::Text(v) => v.len(),
            FeatureColumn::Numeric(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_text(&self) -> Option<&[Option<String>]> {
        match self {
            FeatureColumn::Text(v) => Some(v),
            FeatureColumn::Numeric(_) => None,
        }
    }

    pub fn as_numeric(&self) -> Option<&[Option<f64>]> {
        match self {
            FeatureColumn::Numeric(v) => Some(v),
            FeatureColumn::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureFrame {
    columns: Vec<(String, FeatureColumn)>,
    rows: usize,
}

impl FeatureFrame {
    pub fn new(rows: usize) -> Self {
        Self {
            columns: Vec::new(),
            rows,
        }
    }

    /// Build a frame from feature records using the given column names:
    /// categorical names in record order, then grant year and age names.
    pub fn from_records(
        records: &[FeatureRecord],
        categorical_names: &[&str],
        grant_year_name: &str,
        age_name: &str,
    ) -> Self {
        let mut frame = Self::new(records.len());

        for (i, name) in categorical_names.iter().enumerate() {
            let values = records
                .iter()
                .map(|r| r.categorical.get(i).cloned().flatten())
                .collect();
            frame.insert(name, FeatureColumn::Text(values));
        }

        frame.insert(
            grant_year_name,
            FeatureColumn::Numeric(records.iter().map(|r| r.grant_year.map(f64::from)).collect()),
        );
        frame.insert(
            age_name,
            FeatureColumn::Numeric(records.iter().map(|r| r.age.map(f64::from)).collect()),
        );

        frame
    }

    /// Insert or replace a column. Column length must match the frame.
    pub fn insert(&mut self, name: &str, column: FeatureColumn) {
        debug_assert_eq!(column.len(), self.rows, "column {} has wrong length", name);
        match self.columns.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = column,
            None => self.columns.push((name.to_string(), column)),
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<FeatureColumn> {
        let pos = self.columns.iter().position(|(n, _)| n == name)?;
        Some(self.columns.remove(pos).1)
    }

    pub fn column(&self, name: &str) -> Option<&FeatureColumn> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, c)| c)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// New frame holding only the given row indices, in that order.
    pub fn select_rows(&self, indices: &[usize]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|(name, column)| {
                let picked = match column {
                    FeatureColumn::Text(v) => {
                        FeatureColumn::Text(indices.iter().map(|&i| v[i].clone()).collect())
                    }
                    FeatureColumn::Numeric(v) => {
                        FeatureColumn::Numeric(indices.iter().map(|&i| v[i]).collect())
                    }
                };
                (name.clone(), picked)
            })
            .collect();

        Self {
            columns,
            rows: indices.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> FeatureFrame {
        let mut f = FeatureFrame::new(3);
        f.insert(
            "COURSE",
            FeatureColumn::Text(vec![Some("A".into()), None, Some("C".into())]),
        );
        f.insert("AGE", FeatureColumn::Numeric(vec![Some(20.0), Some(30.0), None]));
        f
    }

    #[test]
    fn test_lookup_and_names() {
        let f = frame();
        assert_eq!(f.column_names(), vec!["COURSE", "AGE"]);
        assert!(f.contains("AGE"));
        assert!(f.column("AGE").unwrap().as_text().is_none());
        assert_eq!(f.len(), 3);
    }

    #[test]
    fn test_select_rows() {
        let picked = frame().select_rows(&[2, 0]);
        assert_eq!(picked.len(), 2);
        assert_eq!(
            picked.column("COURSE").unwrap().as_text().unwrap(),
            &[Some("C".to_string()), Some("A".to_string())]
        );
        assert_eq!(
            picked.column("AGE").unwrap().as_numeric().unwrap(),
            &[None, Some(20.0)]
        );
    }

    #[test]
    fn test_remove() {
        let mut f = frame();
        assert!(f.remove("AGE").is_some());
        assert!(!f.contains("AGE"));
        assert!(f.remove("AGE").is_none());
    }
}
