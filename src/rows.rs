use std::collections::BTreeMap;

use crate::{error::ExportError, schema::{self, SchemaLayout}};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Partition {
    Static,
    Instance,
    Unified,
}

impl Partition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Instance => "instance",
            Self::Unified => "unified",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Relation {
    /// child type → parent type
    TypeParent,
    /// nested type → enclosing type
    TypeDeclaring,
    /// field → value type
    FieldValueType,
    /// declaring type → field
    TypeField,
    /// method → return type
    MethodReturnType,
    /// declaring type → method
    TypeMethod,
    /// parameter → parameter type
    ParameterType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeFlags {
    pub is_value_type: bool,
    pub is_enum: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRow {
    pub id: i64,
    pub name: String,
    pub qualifier: Option<String>,
    pub flags: Option<TypeFlags>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRow {
    pub partition: Partition,
    pub id: i64,
    pub name: String,
    pub is_static: Option<bool>,
    pub is_literal: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRow {
    pub partition: Partition,
    pub id: i64,
    pub name: String,
    pub is_static: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterRow {
    pub partition: Partition,
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeRow {
    pub relation: Relation,
    pub partition: Partition,
    pub from: i64,
    pub to: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterLink {
    pub partition: Partition,
    pub method_id: i64,
    pub parameter_id: i64,
    pub position: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
    Type(TypeRow),
    Field(FieldRow),
    Method(MethodRow),
    Parameter(ParameterRow),
    Edge(EdgeRow),
    ParameterLink(ParameterLink),
}

pub trait RowSink {
    fn emit(&mut self, record: Record) -> Result<(), ExportError>;
}

#[derive(Debug, Default, Clone)]
pub struct Dataset {
    pub records: Vec<Record>,
}

impl RowSink for Dataset {
    fn emit(&mut self, record: Record) -> Result<(), ExportError> {
        self.records.push(record);
        Ok(())
    }
}

impl Dataset {
    pub fn types(&self) -> impl Iterator<Item = &TypeRow> {
        self.records.iter().filter_map(|record| match record {
            Record::Type(row) => Some(row),
            _ => None,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldRow> {
        self.records.iter().filter_map(|record| match record {
            Record::Field(row) => Some(row),
            _ => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodRow> {
        self.records.iter().filter_map(|record| match record {
            Record::Method(row) => Some(row),
            _ => None,
        })
    }

    pub fn parameters(&self) -> impl Iterator<Item = &ParameterRow> {
        self.records.iter().filter_map(|record| match record {
            Record::Parameter(row) => Some(row),
            _ => None,
        })
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeRow> {
        self.records.iter().filter_map(|record| match record {
            Record::Edge(row) => Some(row),
            _ => None,
        })
    }

    pub fn edges_of(&self, relation: Relation) -> impl Iterator<Item = &EdgeRow> {
        self.edges().filter(move |edge| edge.relation == relation)
    }

    pub fn parameter_links(&self) -> impl Iterator<Item = &ParameterLink> {
        self.records.iter().filter_map(|record| match record {
            Record::ParameterLink(row) => Some(row),
            _ => None,
        })
    }

    pub fn table_counts(&self, layout: SchemaLayout) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(schema::table_for(layout, record)).or_insert(0) += 1;
        }
        counts
    }
}
