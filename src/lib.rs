pub mod config;
pub mod discovery;
pub mod dump;
pub mod error;
pub mod logging;
pub mod normalize;
pub mod plugin;
pub mod reflection;
pub mod rows;
pub mod schema;
mod snapshot;
pub mod store;

pub use config::Config;
pub use error::ExportError;
pub use normalize::{normalize, NormalizeSummary};
pub use plugin::{initialize, BuildOutcome};
pub use reflection::{EntityKind, ParameterInfo, ReflectionSurface};
pub use schema::SchemaLayout;
pub use snapshot::SnapshotSizes;
