use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::ExportError,
    reflection::{EntityKind, ParameterInfo, ReflectionSurface},
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataDump {
    #[serde(default)]
    pub types: Vec<Option<TypeEntry>>,
    #[serde(default)]
    pub fields: Vec<Option<FieldEntry>>,
    #[serde(default)]
    pub methods: Vec<Option<MethodEntry>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeEntry {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_value_type: bool,
    #[serde(default)]
    pub is_enum: bool,
    #[serde(default)]
    pub parent: Option<usize>,
    #[serde(default)]
    pub declaring: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldEntry {
    pub name: String,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_literal: bool,
    #[serde(default, rename = "type")]
    pub ty: Option<usize>,
    #[serde(default)]
    pub declaring: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodEntry {
    pub name: String,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub return_type: Option<usize>,
    #[serde(default)]
    pub declaring: Option<usize>,
    #[serde(default)]
    pub params: Vec<ParamEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParamEntry {
    pub name: String,
    #[serde(default, rename = "type")]
    pub ty: Option<usize>,
}

impl TypeEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn parent(mut self, slot: usize) -> Self {
        self.parent = Some(slot);
        self
    }

    pub fn declaring(mut self, slot: usize) -> Self {
        self.declaring = Some(slot);
        self
    }
}

impl FieldEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn of_type(mut self, slot: usize) -> Self {
        self.ty = Some(slot);
        self
    }

    pub fn declaring(mut self, slot: usize) -> Self {
        self.declaring = Some(slot);
        self
    }
}

impl MethodEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    pub fn returns(mut self, slot: usize) -> Self {
        self.return_type = Some(slot);
        self
    }

    pub fn declaring(mut self, slot: usize) -> Self {
        self.declaring = Some(slot);
        self
    }

    pub fn param(mut self, name: impl Into<String>, ty: Option<usize>) -> Self {
        self.params.push(ParamEntry {
            name: name.into(),
            ty,
        });
        self
    }
}

impl MetadataDump {
    pub fn from_json_str(raw: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let raw = fs::read_to_string(path)
            .map_err(|err| ExportError::io("Failed reading", path, err))?;
        Self::from_json_str(&raw)
    }

    pub fn push_type(&mut self, entry: Option<TypeEntry>) -> usize {
        self.types.push(entry);
        self.types.len() - 1
    }

    pub fn push_field(&mut self, entry: Option<FieldEntry>) -> usize {
        self.fields.push(entry);
        self.fields.len() - 1
    }

    pub fn push_method(&mut self, entry: Option<MethodEntry>) -> usize {
        self.methods.push(entry);
        self.methods.len() - 1
    }

    fn type_entry(&self, slot: usize) -> Option<&TypeEntry> {
        self.types.get(slot).and_then(Option::as_ref)
    }

    fn field_entry(&self, slot: usize) -> Option<&FieldEntry> {
        self.fields.get(slot).and_then(Option::as_ref)
    }

    fn method_entry(&self, slot: usize) -> Option<&MethodEntry> {
        self.methods.get(slot).and_then(Option::as_ref)
    }
}

impl ReflectionSurface for MetadataDump {
    type TypeHandle = usize;
    type FieldHandle = usize;
    type MethodHandle = usize;

    fn count(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Type => self.types.len(),
            EntityKind::Field => self.fields.len(),
            EntityKind::Method => self.methods.len(),
        }
    }

    fn type_at(&self, index: usize) -> Option<usize> {
        self.type_entry(index).map(|_| index)
    }

    fn field_at(&self, index: usize) -> Option<usize> {
        self.field_entry(index).map(|_| index)
    }

    fn method_at(&self, index: usize) -> Option<usize> {
        self.method_entry(index).map(|_| index)
    }

    fn type_name(&self, ty: usize) -> String {
        self.type_entry(ty)
            .map(|entry| entry.name.clone())
            .unwrap_or_default()
    }

    fn type_namespace(&self, ty: usize) -> Option<String> {
        self.type_entry(ty).and_then(|entry| entry.namespace.clone())
    }

    fn type_full_name(&self, ty: usize) -> Option<String> {
        let entry = self.type_entry(ty)?;
        if let Some(full_name) = &entry.full_name {
            return Some(full_name.clone());
        }
        match entry.namespace.as_deref() {
            Some(namespace) if !namespace.is_empty() => {
                Some(format!("{namespace}.{}", entry.name))
            }
            _ => Some(entry.name.clone()),
        }
    }

    fn type_is_value_type(&self, ty: usize) -> bool {
        self.type_entry(ty).is_some_and(|entry| entry.is_value_type)
    }

    fn type_is_enum(&self, ty: usize) -> bool {
        self.type_entry(ty).is_some_and(|entry| entry.is_enum)
    }

    fn type_parent(&self, ty: usize) -> Option<usize> {
        self.type_entry(ty).and_then(|entry| entry.parent)
    }

    fn type_declaring(&self, ty: usize) -> Option<usize> {
        self.type_entry(ty).and_then(|entry| entry.declaring)
    }

    fn field_name(&self, field: usize) -> String {
        self.field_entry(field)
            .map(|entry| entry.name.clone())
            .unwrap_or_default()
    }

    fn field_is_static(&self, field: usize) -> bool {
        self.field_entry(field).is_some_and(|entry| entry.is_static)
    }

    fn field_is_literal(&self, field: usize) -> bool {
        self.field_entry(field).is_some_and(|entry| entry.is_literal)
    }

    fn field_type(&self, field: usize) -> Option<usize> {
        self.field_entry(field).and_then(|entry| entry.ty)
    }

    fn field_declaring(&self, field: usize) -> Option<usize> {
        self.field_entry(field).and_then(|entry| entry.declaring)
    }

    fn method_name(&self, method: usize) -> String {
        self.method_entry(method)
            .map(|entry| entry.name.clone())
            .unwrap_or_default()
    }

    fn method_is_static(&self, method: usize) -> bool {
        self.method_entry(method).is_some_and(|entry| entry.is_static)
    }

    fn method_return_type(&self, method: usize) -> Option<usize> {
        self.method_entry(method).and_then(|entry| entry.return_type)
    }

    fn method_declaring(&self, method: usize) -> Option<usize> {
        self.method_entry(method).and_then(|entry| entry.declaring)
    }

    fn method_params(&self, method: usize) -> Vec<ParameterInfo<usize>> {
        self.method_entry(method)
            .map(|entry| {
                entry
                    .params
                    .iter()
                    .map(|param| ParameterInfo {
                        name: param.name.clone(),
                        ty: param.ty,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_null_slots_and_type_keys() {
        let dump = MetadataDump::from_json_str(
            r#"{
                "types": [
                    {"name": "Object", "namespace": "System"},
                    null,
                    {"name": "Player", "namespace": "app", "parent": 0, "isValueType": false}
                ],
                "fields": [{"name": "hp", "type": 0, "declaring": 2}],
                "methods": [{"name": "Tick", "isStatic": true, "params": [{"name": "dt"}]}]
            }"#,
        )
        .unwrap();

        assert_eq!(dump.count(EntityKind::Type), 3);
        assert_eq!(dump.type_at(1), None);
        assert_eq!(dump.type_at(2), Some(2));
        assert_eq!(dump.type_parent(2), Some(0));
        assert_eq!(dump.field_type(0), Some(0));
        assert!(dump.method_is_static(0));
        assert_eq!(
            dump.method_params(0),
            vec![ParameterInfo {
                name: "dt".to_string(),
                ty: None
            }]
        );
    }

    #[test]
    fn full_name_falls_back_to_namespace_and_name() {
        let mut dump = MetadataDump::default();
        let global = dump.push_type(Some(TypeEntry::new("Program")));
        let nested = dump.push_type(Some(TypeEntry::new("Player").namespace("app.actors")));
        assert_eq!(dump.type_full_name(global).as_deref(), Some("Program"));
        assert_eq!(dump.type_full_name(nested).as_deref(), Some("app.actors.Player"));
    }

    #[test]
    fn out_of_range_slots_are_absent() {
        let dump = MetadataDump::default();
        assert_eq!(dump.type_at(7), None);
        assert_eq!(dump.field_at(0), None);
        assert!(dump.method_params(3).is_empty());
    }

    #[test]
    fn malformed_json_is_a_dump_error() {
        let err = MetadataDump::from_json_str("{\"types\": 3}").unwrap_err();
        assert!(matches!(err, ExportError::Dump(_)));
    }
}
