use std::hash::Hash;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Type,
    Field,
    Method,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Field => "field",
            Self::Method => "method",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterInfo<T> {
    pub name: String,
    pub ty: Option<T>,
}

/// Read-only view of the host type database. `*_at` returns `None` for empty
/// slots, and reference accessors return `None` when the host has no value.
pub trait ReflectionSurface {
    type TypeHandle: Copy + Eq + Hash;
    type FieldHandle: Copy + Eq + Hash;
    type MethodHandle: Copy + Eq + Hash;

    fn count(&self, kind: EntityKind) -> usize;

    fn type_at(&self, index: usize) -> Option<Self::TypeHandle>;
    fn field_at(&self, index: usize) -> Option<Self::FieldHandle>;
    fn method_at(&self, index: usize) -> Option<Self::MethodHandle>;

    fn type_name(&self, ty: Self::TypeHandle) -> String;
    fn type_namespace(&self, ty: Self::TypeHandle) -> Option<String>;
    fn type_full_name(&self, ty: Self::TypeHandle) -> Option<String>;
    fn type_is_value_type(&self, ty: Self::TypeHandle) -> bool;
    fn type_is_enum(&self, ty: Self::TypeHandle) -> bool;
    fn type_parent(&self, ty: Self::TypeHandle) -> Option<Self::TypeHandle>;
    fn type_declaring(&self, ty: Self::TypeHandle) -> Option<Self::TypeHandle>;

    fn field_name(&self, field: Self::FieldHandle) -> String;
    fn field_is_static(&self, field: Self::FieldHandle) -> bool;
    fn field_is_literal(&self, field: Self::FieldHandle) -> bool;
    fn field_type(&self, field: Self::FieldHandle) -> Option<Self::TypeHandle>;
    fn field_declaring(&self, field: Self::FieldHandle) -> Option<Self::TypeHandle>;

    fn method_name(&self, method: Self::MethodHandle) -> String;
    fn method_is_static(&self, method: Self::MethodHandle) -> bool;
    fn method_return_type(&self, method: Self::MethodHandle) -> Option<Self::TypeHandle>;
    fn method_declaring(&self, method: Self::MethodHandle) -> Option<Self::TypeHandle>;
    fn method_params(&self, method: Self::MethodHandle) -> Vec<ParameterInfo<Self::TypeHandle>>;
}
