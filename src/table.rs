use serde::{Deserialize, Serialize};

/// A single typed cell from a fetched sheet range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Type a raw cell that has no converter: empty is null, then integer, then
    /// finite float, otherwise text.
    pub fn infer(raw: &str) -> Self {
        if raw.is_empty() {
            return CellValue::Null;
        }
        if let Ok(i) = raw.parse::<i64>() {
            return CellValue::Int(i);
        }
        match raw.parse::<f64>() {
            Ok(f) if f.is_finite() => CellValue::Float(f),
            _ => CellValue::Text(raw.to_string()),
        }
    }

    /// String view used when matching zone names against geometry ids
    pub fn as_match_key(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Int(i) => Some(i.to_string()),
            CellValue::Float(f) => Some(f.to_string()),
            CellValue::Text(s) => Some(s.clone()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<CellValue> for serde_json::Value {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Null => serde_json::Value::Null,
            CellValue::Int(i) => serde_json::Value::from(i),
            CellValue::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            CellValue::Text(s) => serde_json::Value::String(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<CellValue>,
}

/// Rectangular table with named columns, stored column-wise.
///
/// All columns have the same length; `push_row` pads short rows with nulls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowTable {
    columns: Vec<Column>,
    row_count: usize,
}

impl RowTable {
    pub fn new(names: &[String]) -> Self {
        Self {
            columns: names
                .iter()
                .map(|name| Column {
                    name: name.clone(),
                    values: Vec::new(),
                })
                .collect(),
            row_count: 0,
        }
    }

    /// Build a table from `(column, values)` pairs. Columns are padded to the longest one.
    pub fn from_columns<N, I>(columns: I) -> Self
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Vec<CellValue>)>,
    {
        let mut columns: Vec<Column> = columns
            .into_iter()
            .map(|(name, values)| Column {
                name: name.into(),
                values,
            })
            .collect();
        let row_count = columns.iter().map(|c| c.values.len()).max().unwrap_or(0);
        for column in &mut columns {
            column.values.resize(row_count, CellValue::Null);
        }
        Self { columns, row_count }
    }

    pub fn push_row(&mut self, mut cells: Vec<CellValue>) {
        cells.resize(self.columns.len(), CellValue::Null);
        for (column, cell) in self.columns.iter_mut().zip(cells) {
            column.values.push(cell);
        }
        self.row_count += 1;
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    pub fn is_empty(&self) -> bool {
        self.row_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_row_pads_short_rows() {
        let mut table = RowTable::new(&["a".to_string(), "b".to_string()]);
        table.push_row(vec![CellValue::from("x")]);

        assert_eq!(table.row_count(), 1);
        assert_eq!(table.column("b").unwrap().values, vec![CellValue::Null]);
    }

    #[test]
    fn test_push_row_ignores_extra_cells() {
        let mut table = RowTable::new(&["a".to_string()]);
        table.push_row(vec![CellValue::from("x"), CellValue::from("y")]);

        assert_eq!(table.columns().len(), 1);
        assert_eq!(table.column("a").unwrap().values, vec![CellValue::from("x")]);
    }

    #[test]
    fn test_from_columns_pads_to_longest() {
        let table = RowTable::from_columns(vec![
            ("a", vec![CellValue::Int(1), CellValue::Int(2)]),
            ("b", vec![CellValue::Int(3)]),
        ]);

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column("b").unwrap().values[1], CellValue::Null);
    }

    #[test]
    fn test_cell_value_serializes_untagged() {
        let cells = vec![
            CellValue::Null,
            CellValue::Int(3),
            CellValue::Float(0.25),
            CellValue::from("Lerkendal"),
        ];
        let json = serde_json::to_string(&cells).unwrap();
        assert_eq!(json, r#"[null,3,0.25,"Lerkendal"]"#);
    }

    #[test]
    fn test_infer_cell_types() {
        assert_eq!(CellValue::infer(""), CellValue::Null);
        assert_eq!(CellValue::infer("120"), CellValue::Int(120));
        assert_eq!(CellValue::infer("2.5"), CellValue::Float(2.5));
        assert_eq!(CellValue::infer("±2"), CellValue::from("±2"));
        assert_eq!(CellValue::infer("1,5"), CellValue::from("1,5"));
        assert_eq!(CellValue::infer("NaN"), CellValue::from("NaN"));
    }

    #[test]
    fn test_match_key() {
        assert_eq!(CellValue::Int(12).as_match_key().as_deref(), Some("12"));
        assert_eq!(CellValue::Null.as_match_key(), None);
    }
}
