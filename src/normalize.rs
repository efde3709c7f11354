use tracing::debug;

use crate::{
    error::ExportError,
    reflection::ReflectionSurface,
    rows::{
        EdgeRow, FieldRow, MethodRow, ParameterLink, ParameterRow, Partition, Record, Relation,
        RowSink, TypeFlags, TypeRow,
    },
    schema::SchemaLayout,
    snapshot::{Snapshot, SnapshotSizes},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeSummary {
    pub types: u64,
    pub fields: u64,
    pub methods: u64,
    pub parameters: u64,
    pub edges: u64,
    pub parameter_links: u64,
}

impl NormalizeSummary {
    fn count(&mut self, record: &Record) {
        match record {
            Record::Type(_) => self.types += 1,
            Record::Field(_) => self.fields += 1,
            Record::Method(_) => self.methods += 1,
            Record::Parameter(_) => self.parameters += 1,
            Record::Edge(_) => self.edges += 1,
            Record::ParameterLink(_) => self.parameter_links += 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Outgoing,
    Owner,
}

struct EdgeSpec<T> {
    relation: Relation,
    target: Option<T>,
    direction: Direction,
}

impl<T> EdgeSpec<T> {
    fn outgoing(relation: Relation, target: Option<T>) -> Self {
        Self {
            relation,
            target,
            direction: Direction::Outgoing,
        }
    }

    fn owner(relation: Relation, target: Option<T>) -> Self {
        Self {
            relation,
            target,
            direction: Direction::Owner,
        }
    }
}

pub struct Normalizer<'s, S: ReflectionSurface> {
    surface: &'s S,
    snapshot: Snapshot<S>,
    next_parameter_id: i64,
    summary: NormalizeSummary,
}

impl<'s, S: ReflectionSurface> Normalizer<'s, S> {
    pub fn new(surface: &'s S, layout: SchemaLayout) -> Self {
        Self {
            surface,
            snapshot: Snapshot::build(surface, layout),
            next_parameter_id: 0,
            summary: NormalizeSummary::default(),
        }
    }

    pub fn layout(&self) -> SchemaLayout {
        self.snapshot.layout
    }

    pub fn sizes(&self) -> SnapshotSizes {
        self.snapshot.sizes()
    }

    pub fn run<K: RowSink>(mut self, sink: &mut K) -> Result<NormalizeSummary, ExportError> {
        self.emit_types(sink)?;
        for partition in self.snapshot.layout.partitions() {
            self.emit_fields(sink, *partition)?;
            self.emit_methods(sink, *partition)?;
        }
        debug!(summary = ?self.summary, "Normalization finished");
        Ok(self.summary)
    }

    fn emit_types<K: RowSink>(&mut self, sink: &mut K) -> Result<(), ExportError> {
        let surface = self.surface;
        let layout = self.snapshot.layout;
        let types: Vec<_> = self.snapshot.types.iter().collect();
        for (id, ty) in types {
            let row = match layout {
                SchemaLayout::Partitioned => TypeRow {
                    id,
                    name: surface.type_name(ty),
                    qualifier: surface.type_namespace(ty),
                    flags: None,
                },
                SchemaLayout::Unified => TypeRow {
                    id,
                    name: surface.type_name(ty),
                    qualifier: surface.type_full_name(ty),
                    flags: Some(TypeFlags {
                        is_value_type: surface.type_is_value_type(ty),
                        is_enum: surface.type_is_enum(ty),
                    }),
                },
            };
            self.emit_entity(
                sink,
                Record::Type(row),
                id,
                Partition::Unified,
                [
                    EdgeSpec::outgoing(Relation::TypeParent, surface.type_parent(ty)),
                    EdgeSpec::outgoing(Relation::TypeDeclaring, surface.type_declaring(ty)),
                ],
            )?;
        }
        Ok(())
    }

    fn emit_fields<K: RowSink>(
        &mut self,
        sink: &mut K,
        partition: Partition,
    ) -> Result<(), ExportError> {
        let surface = self.surface;
        let unified = self.snapshot.layout == SchemaLayout::Unified;
        let Some(space) = self.snapshot.fields.partition(partition) else {
            return Ok(());
        };
        let fields: Vec<_> = space.iter().collect();
        for (id, field) in fields {
            let row = FieldRow {
                partition,
                id,
                name: surface.field_name(field),
                is_static: unified.then(|| surface.field_is_static(field)),
                is_literal: unified.then(|| surface.field_is_literal(field)),
            };
            self.emit_entity(
                sink,
                Record::Field(row),
                id,
                partition,
                [
                    EdgeSpec::outgoing(Relation::FieldValueType, surface.field_type(field)),
                    EdgeSpec::owner(Relation::TypeField, surface.field_declaring(field)),
                ],
            )?;
        }
        Ok(())
    }

    fn emit_methods<K: RowSink>(
        &mut self,
        sink: &mut K,
        partition: Partition,
    ) -> Result<(), ExportError> {
        let surface = self.surface;
        let unified = self.snapshot.layout == SchemaLayout::Unified;
        let Some(space) = self.snapshot.methods.partition(partition) else {
            return Ok(());
        };
        let methods: Vec<_> = space.iter().collect();
        for (id, method) in methods {
            let row = MethodRow {
                partition,
                id,
                name: surface.method_name(method),
                is_static: unified.then(|| surface.method_is_static(method)),
            };
            self.emit_entity(
                sink,
                Record::Method(row),
                id,
                partition,
                [
                    EdgeSpec::outgoing(
                        Relation::MethodReturnType,
                        surface.method_return_type(method),
                    ),
                    EdgeSpec::owner(Relation::TypeMethod, surface.method_declaring(method)),
                ],
            )?;

            for (position, param) in surface.method_params(method).into_iter().enumerate() {
                let parameter_id = self.next_parameter_id;
                self.next_parameter_id += 1;

                self.emit_entity(
                    sink,
                    Record::Parameter(ParameterRow {
                        partition,
                        id: parameter_id,
                        name: param.name,
                    }),
                    parameter_id,
                    partition,
                    [EdgeSpec::outgoing(Relation::ParameterType, param.ty)],
                )?;
                self.emit(
                    sink,
                    Record::ParameterLink(ParameterLink {
                        partition,
                        method_id: id,
                        parameter_id,
                        position: position as i64,
                    }),
                )?;
            }
        }
        Ok(())
    }

    /// Emits the entity row, then one row per edge whose target is mapped.
    fn emit_entity<K: RowSink, const N: usize>(
        &mut self,
        sink: &mut K,
        record: Record,
        id: i64,
        partition: Partition,
        edges: [EdgeSpec<S::TypeHandle>; N],
    ) -> Result<(), ExportError> {
        self.emit(sink, record)?;
        for edge in edges {
            let Some(target) = edge.target else {
                continue;
            };
            let Some(target_id) = self.snapshot.type_id(&target) else {
                continue;
            };
            let (from, to) = match edge.direction {
                Direction::Outgoing => (id, target_id),
                Direction::Owner => (target_id, id),
            };
            self.emit(
                sink,
                Record::Edge(EdgeRow {
                    relation: edge.relation,
                    partition,
                    from,
                    to,
                }),
            )?;
        }
        Ok(())
    }

    fn emit<K: RowSink>(&mut self, sink: &mut K, record: Record) -> Result<(), ExportError> {
        self.summary.count(&record);
        sink.emit(record)
    }
}

pub fn normalize<S: ReflectionSurface, K: RowSink>(
    surface: &S,
    layout: SchemaLayout,
    sink: &mut K,
) -> Result<NormalizeSummary, ExportError> {
    Normalizer::new(surface, layout).run(sink)
}
