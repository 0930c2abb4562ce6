//! Read-only view of the versioned model store.
//!
//! The accelerator never writes. It opens one session per build, reads
//! revision metadata, resolves schema types and streams elements. A session
//! is released when it is dropped, which happens on every exit path of a
//! build.

pub mod query;

use thiserror::Error;

use crate::selection::Density;
use crate::spatial::Bounds;
use crate::types::identifiers::{ElementId, GeometryDataId, RevisionId};

pub use query::{ElementQuery, GeometryField, TypeHandle};

#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Could not open a read session: {0}")]
    SessionUnavailable(String),
    #[error("Revision not found: {0}")]
    RevisionNotFound(RevisionId),
    #[error("Read error: {0}")]
    Read(String),
}

/// Revision metadata needed by the accelerator.
#[derive(Debug, Clone, PartialEq)]
pub struct Revision {
    pub id: RevisionId,
    /// Name of the modeling schema of the revision's project.
    pub schema: String,
    pub bounds_mm: Bounds,
    /// Density histogram, densest entry first.
    pub densities: Vec<Density>,
}

/// Geometry attached to an element. Optional parts are only present when the
/// query asked for them.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometrySummary {
    pub density: f32,
    pub data_id: GeometryDataId,
    pub primitive_count: u32,
    /// Triangles saved when the shared geometry is instanced.
    pub saveable_triangles: u64,
    pub bounds_mm: Option<Bounds>,
    pub data_bounds_mm: Option<Bounds>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementRecord {
    pub element_id: ElementId,
    pub revision_id: RevisionId,
    pub geometry: Option<GeometrySummary>,
}

/// Lazy sequence of query results.
pub type ElementStream<'s> = Box<dyn Iterator<Item = Result<ElementRecord, StoreError>> + 's>;

pub trait ReadSession {
    fn revision(&self, id: RevisionId) -> Result<Revision, StoreError>;

    /// `Ok(None)` if the schema has no type called `type_name`.
    fn resolve_type(&self, schema: &str, type_name: &str) -> Result<Option<TypeHandle>, StoreError>;

    fn query(&self, query: &ElementQuery) -> Result<ElementStream<'_>, StoreError>;
}

pub trait ModelStore {
    type Session: ReadSession;

    fn open_read_session(&self) -> Result<Self::Session, StoreError>;
}
