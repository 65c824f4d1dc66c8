use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};
use crate::keys::{ForeignKey, PrimaryKey};

/// Abstract column type tag, covering the standard SQL families.
///
/// `Array`, `Struct` and `Other` are ambiguous buckets; the underlying
/// type name string on the [`Column`] disambiguates them at dispatch time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TypeTag {
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Decimal,
    Char,
    VarChar,
    Text,
    Binary,
    VarBinary,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Boolean,
    Array,
    Struct,
    Blob,
    Clob,
    Other,
}

impl TypeTag {
    /// All tags, in declaration order. Used by dispatch-completeness checks.
    pub const ALL: [TypeTag; 21] = [
        TypeTag::SmallInt,
        TypeTag::Integer,
        TypeTag::BigInt,
        TypeTag::Real,
        TypeTag::Double,
        TypeTag::Decimal,
        TypeTag::Char,
        TypeTag::VarChar,
        TypeTag::Text,
        TypeTag::Binary,
        TypeTag::VarBinary,
        TypeTag::Date,
        TypeTag::Time,
        TypeTag::Timestamp,
        TypeTag::TimestampTz,
        TypeTag::Boolean,
        TypeTag::Array,
        TypeTag::Struct,
        TypeTag::Blob,
        TypeTag::Clob,
        TypeTag::Other,
    ];
}

/// Fully qualified column identity: catalog, schema, table and column name.
///
/// Identity is case-insensitive (names are folded to lowercase on
/// construction), usable as a map key, and the seed source for
/// deterministic generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ColumnId {
    catalog: String,
    schema: String,
    table: String,
    column: String,
}

impl ColumnId {
    pub fn new(catalog: &str, schema: &str, table: &str, column: &str) -> Self {
        Self {
            catalog: catalog.to_lowercase(),
            schema: schema.to_lowercase(),
            table: table.to_lowercase(),
            column: column.to_lowercase(),
        }
    }

    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Stable FNV-1a hash of the identity, used to seed key streams.
    ///
    /// Must not depend on `std::hash::Hasher` internals: the same column
    /// has to produce the same seed across processes and builds.
    pub fn seed(&self) -> u64 {
        let mut hash: u64 = 0xcbf29ce484222325;
        for part in [&self.catalog, &self.schema, &self.table, &self.column] {
            for byte in part.as_bytes() {
                hash ^= u64::from(*byte);
                hash = hash.wrapping_mul(0x100000001b3);
            }
            // Separator keeps ("a", "bc") and ("ab", "c") distinct.
            hash ^= u64::from(b'.');
            hash = hash.wrapping_mul(0x100000001b3);
        }
        hash
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.schema, self.table, self.column)
    }
}

/// Column metadata for a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Column {
    id: ColumnId,
    pub type_tag: TypeTag,
    /// Backend type name as reported by the catalog (e.g. `varchar`, `_int4`).
    pub type_name: String,
    pub max_size: Option<u32>,
    /// Maximum fractional digits for decimal/numeric columns.
    pub max_digits: Option<u16>,
    pub nullable: bool,
    pub auto_increment: bool,
    pub ordinal_position: i16,
    pub default: Option<String>,
}

impl Column {
    pub fn new(id: ColumnId, type_tag: TypeTag, type_name: &str, ordinal_position: i16) -> Self {
        Self {
            id,
            type_tag,
            type_name: type_name.to_string(),
            max_size: None,
            max_digits: None,
            nullable: true,
            auto_increment: false,
            ordinal_position,
            default: None,
        }
    }

    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = Some(max_size);
        self
    }

    pub fn with_max_digits(mut self, max_digits: u16) -> Self {
        self.max_digits = Some(max_digits);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    pub fn id(&self) -> &ColumnId {
        &self.id
    }

    pub fn name(&self) -> &str {
        self.id.column()
    }
}

/// Columns are equal iff their identity matches.
impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Column {}

impl std::hash::Hash for Column {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// A table: columns in ordinal order, at most one primary key, any number
/// of foreign keys.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    primary_key: Option<PrimaryKey>,
    foreign_keys: Vec<ForeignKey>,
}

impl Table {
    /// Assemble and validate a table. Every column referenced by a key must
    /// appear in the column list, and composite foreign keys must pair up
    /// positionally with the key they reference.
    pub fn new(
        name: &str,
        mut columns: Vec<Column>,
        primary_key: Option<PrimaryKey>,
        foreign_keys: Vec<ForeignKey>,
    ) -> Result<Self> {
        columns.sort_by_key(|column| column.ordinal_position);
        let known: HashSet<&str> = columns.iter().map(|column| column.name()).collect();

        if let Some(pk) = &primary_key {
            for key_column in pk.columns() {
                if !known.contains(key_column.column().name()) {
                    return Err(SchemaError::UnknownKeyColumn {
                        table: name.to_string(),
                        column: key_column.column().name().to_string(),
                    });
                }
            }
        }
        for fk in &foreign_keys {
            if fk.columns().len() != fk.references().columns().len() {
                return Err(SchemaError::KeyArityMismatch {
                    table: name.to_string(),
                    referencing: fk.columns().len(),
                    referenced: fk.references().columns().len(),
                });
            }
            for key_column in fk.columns() {
                if !known.contains(key_column.column().name()) {
                    return Err(SchemaError::UnknownKeyColumn {
                        table: name.to_string(),
                        column: key_column.column().name().to_string(),
                    });
                }
            }
        }

        Ok(Self {
            name: name.to_string(),
            columns,
            primary_key,
            foreign_keys,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Columns in ordinal-position order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        let name = name.to_lowercase();
        self.columns.iter().find(|column| column.name() == name)
    }

    pub fn primary_key(&self) -> Option<&PrimaryKey> {
        self.primary_key.as_ref()
    }

    pub fn foreign_keys(&self) -> &[ForeignKey] {
        &self.foreign_keys
    }

    /// The foreign key a column participates in, if any.
    pub fn foreign_key_for(&self, column: &str) -> Option<&ForeignKey> {
        let column = column.to_lowercase();
        self.foreign_keys.iter().find(|fk| {
            fk.columns()
                .iter()
                .any(|key_column| key_column.column().name() == column)
        })
    }

    /// Whether a column is part of the primary key.
    pub fn is_primary_key_column(&self, column: &str) -> bool {
        let column = column.to_lowercase();
        self.primary_key
            .as_ref()
            .map(|pk| {
                pk.columns()
                    .iter()
                    .any(|key_column| key_column.column().name() == column)
            })
            .unwrap_or(false)
    }
}

/// An introspected database: one catalog/schema pair and its tables.
///
/// Built once per fill by the metadata provider and treated as read-only
/// for the duration of the fill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    catalog: String,
    schema: String,
    tables: Vec<Table>,
}

impl Database {
    /// Assemble and validate a database. Table names must be unique when
    /// compared case-insensitively.
    pub fn new(catalog: &str, schema: &str, tables: Vec<Table>) -> Result<Self> {
        let mut seen = HashSet::new();
        for table in &tables {
            if !seen.insert(table.name().to_lowercase()) {
                return Err(SchemaError::DuplicateTable(table.name().to_string()));
            }
        }
        Ok(Self {
            catalog: catalog.to_string(),
            schema: schema.to_string(),
            tables,
        })
    }

    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Tables in discovery order.
    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn table(&self, name: &str) -> Option<&Table> {
        let name = name.to_lowercase();
        self.tables
            .iter()
            .find(|table| table.name().to_lowercase() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(table: &str, name: &str, ordinal: i16) -> Column {
        Column::new(
            ColumnId::new("bench", "public", table, name),
            TypeTag::Integer,
            "int4",
            ordinal,
        )
    }

    #[test]
    fn column_identity_is_case_insensitive() {
        let left = ColumnId::new("Bench", "Public", "Orders", "ID");
        let right = ColumnId::new("bench", "public", "orders", "id");
        assert_eq!(left, right);
        assert_eq!(left.seed(), right.seed());
    }

    #[test]
    fn column_seed_is_stable_and_distinct() {
        let id = ColumnId::new("bench", "public", "orders", "id");
        assert_eq!(id.seed(), id.seed());
        let other = ColumnId::new("bench", "public", "orders", "customer_id");
        assert_ne!(id.seed(), other.seed());
    }

    #[test]
    fn columns_are_equal_by_identity_only() {
        let left = column("orders", "id", 1).not_null();
        let right = column("orders", "id", 7);
        assert_eq!(left, right);
    }

    #[test]
    fn table_sorts_columns_by_ordinal() {
        let table = Table::new(
            "orders",
            vec![column("orders", "b", 2), column("orders", "a", 1)],
            None,
            Vec::new(),
        )
        .unwrap();
        let names: Vec<&str> = table.columns().iter().map(Column::name).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn duplicate_table_names_are_rejected() {
        let tables = vec![
            Table::new("orders", vec![column("orders", "id", 1)], None, Vec::new()).unwrap(),
            Table::new("ORDERS", vec![column("orders", "id", 1)], None, Vec::new()).unwrap(),
        ];
        let err = Database::new("bench", "public", tables).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateTable(_)));
    }
}
