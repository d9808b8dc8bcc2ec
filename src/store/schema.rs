//! Table definitions and their SQLite DDL.

/// Column storage class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    String,
    Boolean,
    Integer,
    DateTime,
}

impl DataType {
    /// Declared SQLite type. Booleans live in INTEGER cells, datetimes in TEXT.
    pub fn sql_type(self) -> &'static str {
        match self {
            DataType::String | DataType::DateTime => "TEXT",
            DataType::Boolean | DataType::Integer => "INTEGER",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    pub primary_key: bool,
    pub not_null: bool,
}

impl ColumnDef {
    pub fn new(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            primary_key: false,
            not_null: false,
        }
    }

    /// Primary keys are always declared NOT NULL.
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.not_null = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    fn ddl(&self) -> String {
        let mut ddl = format!("{} {}", quote_ident(&self.name), self.data_type.sql_type());
        if self.not_null {
            ddl.push_str(" NOT NULL");
        }
        if self.primary_key {
            ddl.push_str(" PRIMARY KEY");
        }
        ddl
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn new(name: &str, columns: Vec<ColumnDef>) -> Self {
        Self {
            name: name.to_string(),
            columns,
        }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn primary_key(&self) -> Option<&ColumnDef> {
        self.columns.iter().find(|c| c.primary_key)
    }

    pub(crate) fn create_sql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(ColumnDef::ddl).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_ident(&self.name),
            columns.join(", ")
        )
    }

    /// Compare against the rows of `PRAGMA table_info`. Returns a description
    /// of the first difference found.
    pub(crate) fn diff(&self, existing: &[ExistingColumn]) -> Option<String> {
        if existing.len() != self.columns.len() {
            return Some(format!(
                "table '{}' has {} columns, definition has {}",
                self.name,
                existing.len(),
                self.columns.len()
            ));
        }

        for column in &self.columns {
            let Some(found) = existing.iter().find(|e| e.name == column.name) else {
                return Some(format!(
                    "table '{}' is missing column '{}'",
                    self.name, column.name
                ));
            };
            if !found.declared_type.eq_ignore_ascii_case(column.data_type.sql_type()) {
                return Some(format!(
                    "column '{}.{}' is declared {}, definition expects {}",
                    self.name,
                    column.name,
                    found.declared_type,
                    column.data_type.sql_type()
                ));
            }
            if found.not_null != column.not_null {
                return Some(format!(
                    "column '{}.{}' nullability differs",
                    self.name, column.name
                ));
            }
            if found.primary_key != column.primary_key {
                return Some(format!(
                    "column '{}.{}' primary key flag differs",
                    self.name, column.name
                ));
            }
        }

        None
    }
}

/// A named set of tables initialized together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSchema {
    pub name: String,
    pub tables: Vec<TableSchema>,
}

impl DatabaseSchema {
    pub fn new(name: &str, tables: Vec<TableSchema>) -> Self {
        Self {
            name: name.to_string(),
            tables,
        }
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// Column as reported by SQLite for a table already on disk.
#[derive(Debug, Clone)]
pub(crate) struct ExistingColumn {
    pub name: String,
    pub declared_type: String,
    pub not_null: bool,
    pub primary_key: bool,
}

/// Double-quoted SQL identifier; `option` is a keyword.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option_table() -> TableSchema {
        TableSchema::new(
            "option",
            vec![
                ColumnDef::new("key", DataType::String).primary_key(),
                ColumnDef::new("option", DataType::String),
            ],
        )
    }

    fn existing(name: &str, ty: &str, not_null: bool, pk: bool) -> ExistingColumn {
        ExistingColumn {
            name: name.to_string(),
            declared_type: ty.to_string(),
            not_null,
            primary_key: pk,
        }
    }

    #[test]
    fn test_create_sql() {
        assert_eq!(
            option_table().create_sql(),
            r#"CREATE TABLE IF NOT EXISTS "option" ("key" TEXT NOT NULL PRIMARY KEY, "option" TEXT)"#
        );
    }

    #[test]
    fn test_diff_accepts_matching_table() {
        let on_disk = vec![
            existing("key", "TEXT", true, true),
            existing("option", "text", false, false),
        ];
        assert!(option_table().diff(&on_disk).is_none());
    }

    #[test]
    fn test_diff_reports_type_change() {
        let on_disk = vec![
            existing("key", "TEXT", true, true),
            existing("option", "INTEGER", false, false),
        ];
        let diff = option_table().diff(&on_disk).unwrap();
        assert!(diff.contains("option.option"), "{diff}");
    }

    #[test]
    fn test_diff_reports_missing_column() {
        let on_disk = vec![
            existing("key", "TEXT", true, true),
            existing("value", "TEXT", false, false),
        ];
        assert!(option_table().diff(&on_disk).unwrap().contains("missing"));
    }

    #[test]
    fn test_quote_ident_escapes_quotes() {
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }
}
