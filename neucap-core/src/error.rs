//! Error types for neucap-core.

use thiserror::Error;

/// Result type alias for neucap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for neucap operations.
///
/// Input-shape and schema errors abort the current event only; the
/// caller decides whether to continue with the next event.
#[derive(Error, Debug)]
pub enum Error {
    /// Parallel hit arrays with diverging lengths.
    #[error("parallel array length mismatch: {column} has {actual} entries, expected {expected}")]
    LengthMismatch {
        column: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A sensor id with no entry in the geometry table.
    #[error("sensor id out of range: {sensor_id} (geometry holds {table_size} sensors)")]
    SensorIdOutOfRange { sensor_id: u32, table_size: usize },

    /// A geometry table with no sensors at all.
    #[error("geometry table is empty")]
    EmptyGeometry,

    /// A candidate whose feature names diverge from the event schema.
    #[error("feature schema violation: {0}")]
    SchemaViolation(String),

    /// A classifier input missing an expected feature name.
    #[error("classifier input is missing feature {0:?}")]
    MissingFeature(String),

    /// Invalid threshold or window configuration.
    #[error("configuration error: {0}")]
    Config(String),
}
