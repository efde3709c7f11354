use std::{collections::HashMap, hash::Hash};

use crate::{
    reflection::{EntityKind, ReflectionSurface},
    rows::Partition,
    schema::SchemaLayout,
};

#[derive(Debug, Clone)]
pub struct IdSpace<H> {
    handles: Vec<H>,
    ids: HashMap<H, i64>,
}

impl<H: Copy + Eq + Hash> IdSpace<H> {
    pub fn new() -> Self {
        Self {
            handles: Vec::new(),
            ids: HashMap::new(),
        }
    }

    /// Returns the id of `handle`, assigning the next one on first sight.
    pub fn assign(&mut self, handle: H) -> i64 {
        if let Some(id) = self.ids.get(&handle) {
            return *id;
        }
        let id = self.handles.len() as i64;
        self.handles.push(handle);
        self.ids.insert(handle, id);
        id
    }

    pub fn id_of(&self, handle: &H) -> Option<i64> {
        self.ids.get(handle).copied()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, H)> + '_ {
        self.handles
            .iter()
            .enumerate()
            .map(|(id, handle)| (id as i64, *handle))
    }
}

impl<H: Copy + Eq + Hash> Default for IdSpace<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub enum MemberIds<H> {
    Partitioned {
        statics: IdSpace<H>,
        instances: IdSpace<H>,
    },
    Unified(IdSpace<H>),
}

impl<H: Copy + Eq + Hash> MemberIds<H> {
    pub fn new(layout: SchemaLayout) -> Self {
        match layout {
            SchemaLayout::Partitioned => Self::Partitioned {
                statics: IdSpace::new(),
                instances: IdSpace::new(),
            },
            SchemaLayout::Unified => Self::Unified(IdSpace::new()),
        }
    }

    pub fn is_partitioned(&self) -> bool {
        matches!(self, Self::Partitioned { .. })
    }

    pub fn assign(&mut self, handle: H, is_static: bool) -> (Partition, i64) {
        match self {
            Self::Partitioned { statics, .. } if is_static => {
                (Partition::Static, statics.assign(handle))
            }
            Self::Partitioned { instances, .. } => (Partition::Instance, instances.assign(handle)),
            Self::Unified(space) => (Partition::Unified, space.assign(handle)),
        }
    }

    pub fn partition(&self, partition: Partition) -> Option<&IdSpace<H>> {
        match (self, partition) {
            (Self::Partitioned { statics, .. }, Partition::Static) => Some(statics),
            (Self::Partitioned { instances, .. }, Partition::Instance) => Some(instances),
            (Self::Unified(space), Partition::Unified) => Some(space),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotSizes {
    pub types: usize,
    pub fields: Vec<(Partition, usize)>,
    pub methods: Vec<(Partition, usize)>,
}

pub struct Snapshot<S: ReflectionSurface> {
    pub layout: SchemaLayout,
    pub types: IdSpace<S::TypeHandle>,
    pub fields: MemberIds<S::FieldHandle>,
    pub methods: MemberIds<S::MethodHandle>,
}

impl<S: ReflectionSurface> Snapshot<S> {
    pub fn build(surface: &S, layout: SchemaLayout) -> Self {
        let mut types = IdSpace::new();
        for index in 0..surface.count(EntityKind::Type) {
            if let Some(ty) = surface.type_at(index) {
                types.assign(ty);
            }
        }

        let mut fields = MemberIds::new(layout);
        for index in 0..surface.count(EntityKind::Field) {
            if let Some(field) = surface.field_at(index) {
                let is_static = fields.is_partitioned() && surface.field_is_static(field);
                fields.assign(field, is_static);
            }
        }

        let mut methods = MemberIds::new(layout);
        for index in 0..surface.count(EntityKind::Method) {
            if let Some(method) = surface.method_at(index) {
                let is_static = methods.is_partitioned() && surface.method_is_static(method);
                methods.assign(method, is_static);
            }
        }

        Self {
            layout,
            types,
            fields,
            methods,
        }
    }

    pub fn type_id(&self, ty: &S::TypeHandle) -> Option<i64> {
        self.types.id_of(ty)
    }

    pub fn sizes(&self) -> SnapshotSizes {
        let partitions = self.layout.partitions();
        SnapshotSizes {
            types: self.types.len(),
            fields: partitions
                .iter()
                .map(|p| (*p, self.fields.partition(*p).map_or(0, IdSpace::len)))
                .collect(),
            methods: partitions
                .iter()
                .map(|p| (*p, self.methods.partition(*p).map_or(0, IdSpace::len)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::{FieldEntry, MetadataDump, MethodEntry, TypeEntry};

    fn sample() -> MetadataDump {
        let mut dump = MetadataDump::default();
        dump.push_type(None);
        dump.push_type(Some(TypeEntry::new("A")));
        dump.push_type(None);
        dump.push_type(Some(TypeEntry::new("B")));
        dump.push_type(Some(TypeEntry::new("C")));

        dump.push_field(Some(FieldEntry::new("s0").with_static(true)));
        dump.push_field(Some(FieldEntry::new("i0")));
        dump.push_field(None);
        dump.push_field(Some(FieldEntry::new("i1")));
        dump.push_field(Some(FieldEntry::new("s1").with_static(true)));

        dump.push_method(Some(MethodEntry::new("i0")));
        dump.push_method(None);
        dump.push_method(Some(MethodEntry::new("s0").with_static(true)));
        dump
    }

    #[test]
    fn null_slots_consume_no_ids() {
        let dump = sample();
        let snapshot = Snapshot::build(&dump, SchemaLayout::Partitioned);

        assert_eq!(snapshot.types.len(), 3);
        assert_eq!(snapshot.type_id(&1), Some(0));
        assert_eq!(snapshot.type_id(&3), Some(1));
        assert_eq!(snapshot.type_id(&4), Some(2));
        assert_eq!(snapshot.type_id(&0), None);
        assert_eq!(snapshot.type_id(&2), None);
        let ids: Vec<i64> = snapshot.types.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn partitions_number_independently_from_zero() {
        let dump = sample();
        let snapshot = Snapshot::build(&dump, SchemaLayout::Partitioned);

        let statics = snapshot.fields.partition(Partition::Static).unwrap();
        let instances = snapshot.fields.partition(Partition::Instance).unwrap();
        assert_eq!(statics.id_of(&0), Some(0));
        assert_eq!(statics.id_of(&4), Some(1));
        assert_eq!(instances.id_of(&1), Some(0));
        assert_eq!(instances.id_of(&3), Some(1));
        assert!(snapshot.fields.partition(Partition::Unified).is_none());

        let static_methods = snapshot.methods.partition(Partition::Static).unwrap();
        assert_eq!(static_methods.id_of(&2), Some(0));
        assert_eq!(
            snapshot.sizes(),
            SnapshotSizes {
                types: 3,
                fields: vec![(Partition::Static, 2), (Partition::Instance, 2)],
                methods: vec![(Partition::Static, 1), (Partition::Instance, 1)],
            }
        );
    }

    #[test]
    fn unified_layout_uses_one_counter_per_kind() {
        let dump = sample();
        let snapshot = Snapshot::build(&dump, SchemaLayout::Unified);

        let fields = snapshot.fields.partition(Partition::Unified).unwrap();
        let order: Vec<(i64, usize)> = fields.iter().collect();
        assert_eq!(order, vec![(0, 0), (1, 1), (2, 3), (3, 4)]);
        assert_eq!(snapshot.sizes().methods, vec![(Partition::Unified, 2)]);
    }

    #[test]
    fn repeated_handle_keeps_its_first_id() {
        let mut space = IdSpace::new();
        assert_eq!(space.assign("a"), 0);
        assert_eq!(space.assign("b"), 1);
        assert_eq!(space.assign("a"), 0);
        assert_eq!(space.len(), 2);
    }
}
