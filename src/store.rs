use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, DatabaseName};
use tracing::{debug, info};

use crate::{
    error::ExportError,
    normalize::{NormalizeSummary, Normalizer},
    reflection::ReflectionSurface,
    rows::{Record, RowSink},
    schema::{self, SchemaLayout, SCHEMA_VERSION},
};

pub struct SqliteSink<'c> {
    conn: &'c Connection,
    layout: SchemaLayout,
    rows: BTreeMap<String, usize>,
}

impl<'c> SqliteSink<'c> {
    pub fn new(conn: &'c Connection, layout: SchemaLayout) -> Self {
        Self {
            conn,
            layout,
            rows: BTreeMap::new(),
        }
    }

    pub fn table_counts(&self) -> &BTreeMap<String, usize> {
        &self.rows
    }
}

impl RowSink for SqliteSink<'_> {
    fn emit(&mut self, record: Record) -> Result<(), ExportError> {
        let insert = schema::insert_for(self.layout, &record);
        let mut stmt = self.conn.prepare_cached(&insert.sql())?;
        stmt.execute(params_from_iter(insert.values))?;
        *self.rows.entry(insert.table).or_insert(0) += 1;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct BuildReport {
    pub path: PathBuf,
    pub layout: SchemaLayout,
    pub summary: NormalizeSummary,
    pub elapsed_ms: u128,
}

/// Schema, rows and metadata go in one transaction. Foreign keys are checked
/// at commit, since a type may reference one enumerated after it.
pub fn populate<S: ReflectionSurface>(
    conn: &mut Connection,
    normalizer: Normalizer<'_, S>,
) -> Result<NormalizeSummary, ExportError> {
    let layout = normalizer.layout();
    let tx = conn.transaction()?;
    tx.execute_batch("PRAGMA defer_foreign_keys = ON;")?;
    tx.execute_batch(&layout.ddl())?;

    let summary = {
        let mut sink = SqliteSink::new(&tx, layout);
        let summary = normalizer.run(&mut sink)?;
        for (table, rows) in sink.table_counts() {
            info!(table = table.as_str(), rows = *rows, "TDB: Table populated");
        }
        summary
    };

    let generator = format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    let meta: [(&str, String); 10] = [
        ("schema_version", SCHEMA_VERSION.to_string()),
        ("schema_layout", layout.as_str().to_string()),
        ("generator", generator),
        ("generated_at", Utc::now().to_rfc3339()),
        ("type_count", summary.types.to_string()),
        ("field_count", summary.fields.to_string()),
        ("method_count", summary.methods.to_string()),
        ("parameter_count", summary.parameters.to_string()),
        ("edge_count", summary.edges.to_string()),
        ("parameter_link_count", summary.parameter_links.to_string()),
    ];
    for (key, value) in meta {
        tx.execute(
            "INSERT INTO Meta(Key,Value) VALUES(?1,?2)",
            params![key, value],
        )?;
    }

    tx.commit()?;
    Ok(summary)
}

pub fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".partial");
    destination.with_file_name(name)
}

// Backup goes to a sibling `.partial` file that is renamed into place.
pub fn persist(conn: &Connection, destination: &Path) -> Result<(), ExportError> {
    let partial = partial_path(destination);
    match fs::remove_file(&partial) {
        Ok(()) => debug!(path = %partial.display(), "Removed stale partial database"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(ExportError::io("Failed removing", &partial, err)),
    }

    if let Err(err) = conn.backup(DatabaseName::Main, &partial, None) {
        let _ = fs::remove_file(&partial);
        return Err(err.into());
    }

    fs::rename(&partial, destination).map_err(|err| {
        let _ = fs::remove_file(&partial);
        ExportError::io("Failed moving database to", destination, err)
    })
}

pub fn write_database<S: ReflectionSurface>(
    normalizer: Normalizer<'_, S>,
    destination: &Path,
) -> Result<BuildReport, ExportError> {
    let started = Instant::now();
    let layout = normalizer.layout();

    let mut conn = Connection::open_in_memory()?;
    let summary = populate(&mut conn, normalizer)?;
    info!(
        types = summary.types,
        fields = summary.fields,
        methods = summary.methods,
        parameters = summary.parameters,
        edges = summary.edges,
        "TDB: Rows written"
    );

    persist(&conn, destination)?;

    Ok(BuildReport {
        path: destination.to_path_buf(),
        layout,
        summary,
        elapsed_ms: started.elapsed().as_millis(),
    })
}
