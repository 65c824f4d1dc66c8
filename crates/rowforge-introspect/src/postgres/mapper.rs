//! Catalog row → schema graph mapping.

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use rowforge_core::{
    Column, ColumnId, Database, ForeignKey, KeyColumn, PrimaryKey, Table, TypeTag,
};

use crate::error::Result;
use crate::postgres::queries::{RawColumn, RawForeignKeyColumn, RawKeyColumn};

/// One table's worth of raw catalog reads.
#[derive(Debug)]
pub struct RawTable {
    pub name: String,
    pub columns: Vec<RawColumn>,
    pub primary_key: Vec<RawKeyColumn>,
    pub foreign_keys: Vec<RawForeignKeyColumn>,
}

/// Map a Postgres type to the abstract tag. `udt_name` disambiguates the
/// `ARRAY` and `USER-DEFINED` buckets downstream, so it is carried on the
/// column verbatim.
pub fn type_tag_for(data_type: &str, udt_name: &str) -> TypeTag {
    if data_type.eq_ignore_ascii_case("array") || udt_name.starts_with('_') {
        return TypeTag::Array;
    }
    match udt_name.to_lowercase().as_str() {
        "int2" => TypeTag::SmallInt,
        "int4" => TypeTag::Integer,
        "int8" => TypeTag::BigInt,
        "float4" => TypeTag::Real,
        "float8" => TypeTag::Double,
        "numeric" => TypeTag::Decimal,
        "bpchar" => TypeTag::Char,
        "varchar" => TypeTag::VarChar,
        "text" | "name" => TypeTag::Text,
        "bytea" => TypeTag::VarBinary,
        "date" => TypeTag::Date,
        "time" | "timetz" => TypeTag::Time,
        "timestamp" => TypeTag::Timestamp,
        "timestamptz" => TypeTag::TimestampTz,
        "bool" => TypeTag::Boolean,
        "record" => TypeTag::Struct,
        "oid" => TypeTag::Blob,
        _ => TypeTag::Other,
    }
}

pub fn map_column(catalog: &str, schema: &str, table: &str, raw: &RawColumn) -> Column {
    let id = ColumnId::new(catalog, schema, table, &raw.column_name);
    let tag = type_tag_for(&raw.data_type, &raw.udt_name);
    let mut column = Column::new(id, tag, &raw.udt_name, raw.ordinal_position as i16);

    if let Some(max) = raw.character_maximum_length.filter(|max| *max > 0) {
        column = column.with_max_size(max as u32);
    } else if tag == TypeTag::Decimal {
        if let Some(precision) = raw.numeric_precision.filter(|precision| *precision > 0) {
            column = column.with_max_size(precision as u32);
        }
    }
    if let Some(scale) = raw.numeric_scale.filter(|scale| *scale > 0) {
        column = column.with_max_digits(scale as u16);
    }
    if raw.is_nullable != "YES" {
        column = column.not_null();
    }
    let identity = raw.is_identity == "YES"
        || raw
            .column_default
            .as_deref()
            .map(|default| default.starts_with("nextval("))
            .unwrap_or(false);
    if identity {
        column = column.auto_increment();
    }
    if let Some(default) = &raw.column_default {
        column = column.with_default(default);
    }
    column
}

/// Assemble the full schema graph from raw per-table reads.
///
/// Foreign keys referencing tables outside the introspected set are
/// dropped with a warning rather than failing the whole read.
pub fn assemble(catalog: &str, schema: &str, raw_tables: Vec<RawTable>) -> Result<Database> {
    let mut columns_by_table: HashMap<String, Vec<Column>> = HashMap::new();
    for raw in &raw_tables {
        let columns = raw
            .columns
            .iter()
            .map(|raw_column| map_column(catalog, schema, &raw.name, raw_column))
            .collect();
        columns_by_table.insert(raw.name.to_lowercase(), columns);
    }

    let find_column = |table: &str, name: &str| -> Option<Column> {
        columns_by_table
            .get(&table.to_lowercase())?
            .iter()
            .find(|column| column.name() == name.to_lowercase())
            .cloned()
    };

    let mut tables = Vec::with_capacity(raw_tables.len());
    for raw in &raw_tables {
        let columns = columns_by_table
            .get(&raw.name.to_lowercase())
            .cloned()
            .unwrap_or_default();

        let primary_key = if raw.primary_key.is_empty() {
            None
        } else {
            let key_columns: Vec<KeyColumn> = raw
                .primary_key
                .iter()
                .filter_map(|key| {
                    find_column(&raw.name, &key.column_name)
                        .map(|column| KeyColumn::new(column, key.ordinal_position as u16))
                })
                .collect();
            Some(PrimaryKey::new(&raw.name, key_columns))
        };

        let mut grouped: BTreeMap<String, Vec<&RawForeignKeyColumn>> = BTreeMap::new();
        for fk_column in &raw.foreign_keys {
            grouped
                .entry(fk_column.constraint_name.clone())
                .or_default()
                .push(fk_column);
        }

        let mut foreign_keys = Vec::new();
        'constraints: for (constraint, members) in grouped {
            let mut referencing = Vec::with_capacity(members.len());
            let mut referenced = Vec::with_capacity(members.len());
            for (index, member) in members.iter().enumerate() {
                let sequence = index as u16 + 1;
                let Some(child_column) = find_column(&raw.name, &member.column_name) else {
                    warn!(constraint, table = %raw.name, column = %member.column_name,
                        "dropping foreign key with unknown referencing column");
                    continue 'constraints;
                };
                let Some(parent_column) =
                    find_column(&member.referenced_table, &member.referenced_column)
                else {
                    warn!(constraint, table = %raw.name, referenced = %member.referenced_table,
                        "dropping foreign key into a table outside the introspected schema");
                    continue 'constraints;
                };
                referencing.push(KeyColumn::new(child_column, sequence));
                referenced.push(KeyColumn::new(parent_column, sequence));
            }
            let parent_table = members
                .first()
                .map(|member| member.referenced_table.clone())
                .unwrap_or_default();
            foreign_keys.push(ForeignKey::new(
                referencing,
                PrimaryKey::new(&parent_table, referenced),
            ));
        }

        tables.push(Table::new(&raw.name, columns, primary_key, foreign_keys)?);
    }

    Ok(Database::new(catalog, schema, tables)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_column(name: &str, ordinal: i32, udt: &str, data_type: &str) -> RawColumn {
        RawColumn {
            ordinal_position: ordinal,
            column_name: name.to_string(),
            data_type: data_type.to_string(),
            udt_name: udt.to_string(),
            character_maximum_length: None,
            numeric_precision: None,
            numeric_scale: None,
            is_nullable: "NO".to_string(),
            column_default: None,
            is_identity: "NO".to_string(),
        }
    }

    #[test]
    fn maps_the_common_type_names() {
        assert_eq!(type_tag_for("integer", "int4"), TypeTag::Integer);
        assert_eq!(type_tag_for("numeric", "numeric"), TypeTag::Decimal);
        assert_eq!(type_tag_for("ARRAY", "_text"), TypeTag::Array);
        assert_eq!(type_tag_for("USER-DEFINED", "uuid"), TypeTag::Other);
        assert_eq!(
            type_tag_for("timestamp with time zone", "timestamptz"),
            TypeTag::TimestampTz
        );
    }

    #[test]
    fn nextval_defaults_mark_auto_increment() {
        let mut raw = raw_column("id", 1, "int4", "integer");
        raw.column_default = Some("nextval('orders_id_seq'::regclass)".to_string());
        let column = map_column("bench", "public", "orders", &raw);
        assert!(column.auto_increment);
    }

    #[test]
    fn assembles_tables_with_keys() {
        let customers = RawTable {
            name: "customers".to_string(),
            columns: vec![raw_column("id", 1, "int4", "integer")],
            primary_key: vec![RawKeyColumn {
                column_name: "id".to_string(),
                ordinal_position: 1,
            }],
            foreign_keys: Vec::new(),
        };
        let orders = RawTable {
            name: "orders".to_string(),
            columns: vec![
                raw_column("id", 1, "int4", "integer"),
                raw_column("customer_id", 2, "int4", "integer"),
            ],
            primary_key: vec![RawKeyColumn {
                column_name: "id".to_string(),
                ordinal_position: 1,
            }],
            foreign_keys: vec![RawForeignKeyColumn {
                constraint_name: "orders_customer_id_fkey".to_string(),
                column_name: "customer_id".to_string(),
                ordinal_position: 1,
                referenced_table: "customers".to_string(),
                referenced_column: "id".to_string(),
            }],
        };

        let database = assemble("bench", "public", vec![customers, orders]).unwrap();
        let orders = database.table("orders").unwrap();
        assert_eq!(orders.foreign_keys().len(), 1);
        let fk = orders.foreign_key_for("customer_id").unwrap();
        assert_eq!(fk.references().table(), "customers");
        assert_eq!(fk.referenced_for("customer_id").unwrap().column().name(), "id");
    }

    #[test]
    fn foreign_keys_to_unknown_tables_are_dropped() {
        let orders = RawTable {
            name: "orders".to_string(),
            columns: vec![
                raw_column("id", 1, "int4", "integer"),
                raw_column("region_id", 2, "int4", "integer"),
            ],
            primary_key: Vec::new(),
            foreign_keys: vec![RawForeignKeyColumn {
                constraint_name: "orders_region_id_fkey".to_string(),
                column_name: "region_id".to_string(),
                ordinal_position: 1,
                referenced_table: "regions".to_string(),
                referenced_column: "id".to_string(),
            }],
        };

        let database = assemble("bench", "public", vec![orders]).unwrap();
        assert!(database.table("orders").unwrap().foreign_keys().is_empty());
    }
}
