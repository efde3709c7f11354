use anyhow::{bail, Result};
use rusqlite::types::Value;

use crate::rows::{EdgeRow, Partition, Record, Relation, TypeFlags};

pub const SCHEMA_VERSION: &str = "tdb.schema.v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaLayout {
    #[default]
    Partitioned,
    Unified,
}

impl SchemaLayout {
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "partitioned" | "namespace" => Ok(Self::Partitioned),
            "unified" | "full_name" | "fullname" => Ok(Self::Unified),
            other => bail!(
                "Unsupported TDB_EXPORT_LAYOUT `{other}`. Supported: partitioned, unified."
            ),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Partitioned => "partitioned",
            Self::Unified => "unified",
        }
    }

    pub fn partitions(&self) -> &'static [Partition] {
        match self {
            Self::Partitioned => &[Partition::Static, Partition::Instance],
            Self::Unified => &[Partition::Unified],
        }
    }

    pub fn ddl(&self) -> String {
        let mut sql = String::from(
            "
            CREATE TABLE Meta (
                Key TEXT PRIMARY KEY,
                Value TEXT NOT NULL
            );
            ",
        );

        match self {
            Self::Partitioned => sql.push_str(
                "
                CREATE TABLE Type (
                    Id INTEGER PRIMARY KEY,
                    Name TEXT NOT NULL,
                    Namespace TEXT
                );
                ",
            ),
            Self::Unified => sql.push_str(
                "
                CREATE TABLE Type (
                    Id INTEGER PRIMARY KEY,
                    Name TEXT NOT NULL,
                    FullName TEXT,
                    IsValueType INTEGER NOT NULL,
                    IsEnum INTEGER NOT NULL
                );
                ",
            ),
        }

        sql.push_str(
            "
            CREATE TABLE TypeParentHierarchy (
                TypeId INTEGER NOT NULL REFERENCES Type(Id),
                ParentId INTEGER NOT NULL REFERENCES Type(Id),
                PRIMARY KEY (TypeId, ParentId)
            );
            CREATE TABLE TypeDeclaringHierarchy (
                TypeId INTEGER NOT NULL REFERENCES Type(Id),
                DeclaringId INTEGER NOT NULL REFERENCES Type(Id),
                PRIMARY KEY (TypeId, DeclaringId)
            );
            CREATE INDEX idx_type_parent ON TypeParentHierarchy(ParentId);
            CREATE INDEX idx_type_declaring ON TypeDeclaringHierarchy(DeclaringId);
            ",
        );

        for partition in self.partitions() {
            sql.push_str(&member_ddl(*self, *partition));
        }
        sql
    }
}

fn prefix(partition: Partition) -> &'static str {
    match partition {
        Partition::Static => "Static",
        Partition::Instance | Partition::Unified => "",
    }
}

fn member_ddl(layout: SchemaLayout, partition: Partition) -> String {
    let p = prefix(partition);
    let lower = p.to_ascii_lowercase();
    let (field_flags, method_flags) = match layout {
        SchemaLayout::Partitioned => ("", ""),
        SchemaLayout::Unified => (
            ",\n    IsStatic INTEGER NOT NULL,\n    IsLiteral INTEGER NOT NULL",
            ",\n    IsStatic INTEGER NOT NULL",
        ),
    };

    format!(
        "
CREATE TABLE {p}Field (
    Id INTEGER PRIMARY KEY,
    Name TEXT NOT NULL{field_flags}
);
CREATE TABLE {p}FieldValueTypeMapping (
    FieldId INTEGER PRIMARY KEY REFERENCES {p}Field(Id),
    TypeId INTEGER NOT NULL REFERENCES Type(Id)
);
CREATE TABLE Type{p}FieldAssociation (
    TypeId INTEGER NOT NULL REFERENCES Type(Id),
    FieldId INTEGER NOT NULL REFERENCES {p}Field(Id),
    PRIMARY KEY (TypeId, FieldId)
);
CREATE TABLE {p}Method (
    Id INTEGER PRIMARY KEY,
    Name TEXT NOT NULL{method_flags}
);
CREATE TABLE {p}MethodReturnTypeMapping (
    MethodId INTEGER PRIMARY KEY REFERENCES {p}Method(Id),
    TypeId INTEGER NOT NULL REFERENCES Type(Id)
);
CREATE TABLE Type{p}MethodAssociation (
    TypeId INTEGER NOT NULL REFERENCES Type(Id),
    MethodId INTEGER NOT NULL REFERENCES {p}Method(Id),
    PRIMARY KEY (TypeId, MethodId)
);
CREATE TABLE {p}MethodParameter (
    Id INTEGER PRIMARY KEY,
    Name TEXT NOT NULL
);
CREATE TABLE {p}MethodParameterTypeMapping (
    MethodParameterId INTEGER PRIMARY KEY REFERENCES {p}MethodParameter(Id),
    TypeId INTEGER NOT NULL REFERENCES Type(Id)
);
CREATE TABLE {p}MethodParameterAssociation (
    MethodId INTEGER NOT NULL REFERENCES {p}Method(Id),
    ParameterId INTEGER NOT NULL UNIQUE REFERENCES {p}MethodParameter(Id),
    ParameterIndex INTEGER NOT NULL,
    PRIMARY KEY (MethodId, ParameterIndex)
);
CREATE INDEX idx_{lower}field_value_type ON {p}FieldValueTypeMapping(TypeId);
CREATE INDEX idx_type_{lower}field_field ON Type{p}FieldAssociation(FieldId);
CREATE INDEX idx_{lower}method_return_type ON {p}MethodReturnTypeMapping(TypeId);
CREATE INDEX idx_type_{lower}method_method ON Type{p}MethodAssociation(MethodId);
CREATE INDEX idx_{lower}parameter_type ON {p}MethodParameterTypeMapping(TypeId);
"
    )
}

#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: String,
    pub columns: &'static [&'static str],
    pub values: Vec<Value>,
}

impl Insert {
    pub fn sql(&self) -> String {
        let placeholders = (1..=self.columns.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(",");
        format!(
            "INSERT INTO {}({}) VALUES({placeholders})",
            self.table,
            self.columns.join(",")
        )
    }
}

pub fn table_for(layout: SchemaLayout, record: &Record) -> String {
    insert_for(layout, record).table
}

pub fn insert_for(layout: SchemaLayout, record: &Record) -> Insert {
    match record {
        Record::Type(row) => match layout {
            SchemaLayout::Partitioned => Insert {
                table: "Type".to_string(),
                columns: &["Id", "Name", "Namespace"],
                values: vec![
                    Value::Integer(row.id),
                    Value::Text(row.name.clone()),
                    optional_text(&row.qualifier),
                ],
            },
            SchemaLayout::Unified => {
                let flags = row.flags.unwrap_or(TypeFlags {
                    is_value_type: false,
                    is_enum: false,
                });
                Insert {
                    table: "Type".to_string(),
                    columns: &["Id", "Name", "FullName", "IsValueType", "IsEnum"],
                    values: vec![
                        Value::Integer(row.id),
                        Value::Text(row.name.clone()),
                        optional_text(&row.qualifier),
                        flag(flags.is_value_type),
                        flag(flags.is_enum),
                    ],
                }
            }
        },
        Record::Field(row) => {
            let table = format!("{}Field", prefix(row.partition));
            match layout {
                SchemaLayout::Partitioned => Insert {
                    table,
                    columns: &["Id", "Name"],
                    values: vec![Value::Integer(row.id), Value::Text(row.name.clone())],
                },
                SchemaLayout::Unified => Insert {
                    table,
                    columns: &["Id", "Name", "IsStatic", "IsLiteral"],
                    values: vec![
                        Value::Integer(row.id),
                        Value::Text(row.name.clone()),
                        flag(row.is_static.unwrap_or(false)),
                        flag(row.is_literal.unwrap_or(false)),
                    ],
                },
            }
        }
        Record::Method(row) => {
            let table = format!("{}Method", prefix(row.partition));
            match layout {
                SchemaLayout::Partitioned => Insert {
                    table,
                    columns: &["Id", "Name"],
                    values: vec![Value::Integer(row.id), Value::Text(row.name.clone())],
                },
                SchemaLayout::Unified => Insert {
                    table,
                    columns: &["Id", "Name", "IsStatic"],
                    values: vec![
                        Value::Integer(row.id),
                        Value::Text(row.name.clone()),
                        flag(row.is_static.unwrap_or(false)),
                    ],
                },
            }
        }
        Record::Parameter(row) => Insert {
            table: format!("{}MethodParameter", prefix(row.partition)),
            columns: &["Id", "Name"],
            values: vec![Value::Integer(row.id), Value::Text(row.name.clone())],
        },
        Record::Edge(edge) => edge_insert(edge),
        Record::ParameterLink(link) => Insert {
            table: format!("{}MethodParameterAssociation", prefix(link.partition)),
            columns: &["MethodId", "ParameterId", "ParameterIndex"],
            values: vec![
                Value::Integer(link.method_id),
                Value::Integer(link.parameter_id),
                Value::Integer(link.position),
            ],
        },
    }
}

fn edge_insert(edge: &EdgeRow) -> Insert {
    let p = prefix(edge.partition);
    let (table, columns): (String, &'static [&'static str]) = match edge.relation {
        Relation::TypeParent => ("TypeParentHierarchy".to_string(), &["TypeId", "ParentId"]),
        Relation::TypeDeclaring => (
            "TypeDeclaringHierarchy".to_string(),
            &["TypeId", "DeclaringId"],
        ),
        Relation::FieldValueType => (format!("{p}FieldValueTypeMapping"), &["FieldId", "TypeId"]),
        Relation::TypeField => (format!("Type{p}FieldAssociation"), &["TypeId", "FieldId"]),
        Relation::MethodReturnType => (
            format!("{p}MethodReturnTypeMapping"),
            &["MethodId", "TypeId"],
        ),
        Relation::TypeMethod => (format!("Type{p}MethodAssociation"), &["TypeId", "MethodId"]),
        Relation::ParameterType => (
            format!("{p}MethodParameterTypeMapping"),
            &["MethodParameterId", "TypeId"],
        ),
    };
    Insert {
        table,
        columns,
        values: vec![Value::Integer(edge.from), Value::Integer(edge.to)],
    }
}

fn optional_text(value: &Option<String>) -> Value {
    match value {
        Some(text) => Value::Text(text.clone()),
        None => Value::Null,
    }
}

fn flag(value: bool) -> Value {
    Value::Integer(i64::from(value))
}

#[cfg(test)]
mod tests {
    use rusqlite::{params_from_iter, Connection};

    use super::*;
    use crate::rows::{FieldRow, MethodRow, ParameterLink, ParameterRow, TypeRow};

    #[test]
    fn layout_parse_accepts_aliases_and_rejects_unknown() {
        assert_eq!(SchemaLayout::parse(" Partitioned ").unwrap(), SchemaLayout::Partitioned);
        assert_eq!(SchemaLayout::parse("full_name").unwrap(), SchemaLayout::Unified);
        let err = SchemaLayout::parse("columnar").unwrap_err();
        assert!(err.to_string().contains("columnar"));
    }

    #[test]
    fn partitioned_ddl_creates_static_and_instance_tables() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&SchemaLayout::Partitioned.ddl()).unwrap();
        let mut stmt = conn
            .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
            .unwrap();
        let tables: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        for expected in [
            "Meta",
            "Type",
            "TypeParentHierarchy",
            "TypeDeclaringHierarchy",
            "StaticField",
            "StaticFieldValueTypeMapping",
            "TypeStaticFieldAssociation",
            "Field",
            "FieldValueTypeMapping",
            "TypeFieldAssociation",
            "StaticMethod",
            "StaticMethodParameterAssociation",
            "Method",
            "MethodParameter",
            "MethodParameterTypeMapping",
            "MethodParameterAssociation",
        ] {
            assert!(tables.iter().any(|t| t == expected), "missing {expected}");
        }
    }

    #[test]
    fn every_unified_insert_binds_against_its_table() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(&SchemaLayout::Unified.ddl()).unwrap();

        let records = [
            Record::Type(TypeRow {
                id: 0,
                name: "Vector3".to_string(),
                qualifier: Some("via.Vector3".to_string()),
                flags: Some(TypeFlags {
                    is_value_type: true,
                    is_enum: false,
                }),
            }),
            Record::Field(FieldRow {
                partition: Partition::Unified,
                id: 0,
                name: "x".to_string(),
                is_static: Some(false),
                is_literal: Some(false),
            }),
            Record::Edge(EdgeRow {
                relation: Relation::FieldValueType,
                partition: Partition::Unified,
                from: 0,
                to: 0,
            }),
            Record::Edge(EdgeRow {
                relation: Relation::TypeField,
                partition: Partition::Unified,
                from: 0,
                to: 0,
            }),
            Record::Method(MethodRow {
                partition: Partition::Unified,
                id: 3,
                name: "Normalize".to_string(),
                is_static: Some(false),
            }),
            Record::Parameter(ParameterRow {
                partition: Partition::Unified,
                id: 7,
                name: "epsilon".to_string(),
            }),
            Record::ParameterLink(ParameterLink {
                partition: Partition::Unified,
                method_id: 3,
                parameter_id: 7,
                position: 0,
            }),
        ];

        for record in &records {
            let insert = insert_for(SchemaLayout::Unified, record);
            conn.execute(&insert.sql(), params_from_iter(insert.values))
                .unwrap();
        }

        let full_name: String = conn
            .query_row("SELECT FullName FROM Type WHERE Id = 0", [], |row| row.get(0))
            .unwrap();
        assert_eq!(full_name, "via.Vector3");
        let violations: i64 = conn
            .query_row("SELECT COUNT(*) FROM pragma_foreign_key_check", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(violations, 0);
    }

    #[test]
    fn hierarchy_rows_reference_type_ids() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        conn.execute_batch(&SchemaLayout::Partitioned.ddl()).unwrap();
        let edge = insert_for(
            SchemaLayout::Partitioned,
            &Record::Edge(EdgeRow {
                relation: Relation::TypeParent,
                partition: Partition::Unified,
                from: 0,
                to: 1,
            }),
        );
        assert!(conn
            .execute(&edge.sql(), params_from_iter(edge.values))
            .is_err());
    }

    #[test]
    fn static_partition_routes_to_static_tables() {
        let link = Record::ParameterLink(ParameterLink {
            partition: Partition::Static,
            method_id: 0,
            parameter_id: 0,
            position: 0,
        });
        assert_eq!(
            table_for(SchemaLayout::Partitioned, &link),
            "StaticMethodParameterAssociation"
        );

        let owner = Record::Edge(EdgeRow {
            relation: Relation::TypeMethod,
            partition: Partition::Instance,
            from: 1,
            to: 2,
        });
        let insert = insert_for(SchemaLayout::Partitioned, &owner);
        assert_eq!(
            insert.sql(),
            "INSERT INTO TypeMethodAssociation(TypeId,MethodId) VALUES(?1,?2)"
        );
    }
}
