use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::types::identifiers::RevisionId;

/// Schema type resolved by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeHandle(u32);

impl TypeHandle {
    pub const fn new(raw: u32) -> Self {
        TypeHandle(raw)
    }

    pub fn raw(&self) -> u32 {
        self.0
    }
}

/// Parts of an element's geometry the store should resolve into each record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GeometryField {
    /// Density, shared geometry id and counts.
    Geometry,
    /// The element's own bounding box.
    GeometryBounds,
    /// The shared geometry blob the element points at.
    GeometryData,
    /// Bounding box around every placement of the shared geometry blob.
    GeometryDataBounds,
}

/// Selects elements of `base_type`, subtypes included, in a set of revisions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementQuery {
    schema: String,
    base_type: TypeHandle,
    excluded_types: BTreeSet<TypeHandle>,
    revision_ids: BTreeSet<RevisionId>,
    fields: BTreeSet<GeometryField>,
}

impl ElementQuery {
    pub fn new(schema: impl Into<String>, base_type: TypeHandle, revision_ids: BTreeSet<RevisionId>) -> Self {
        Self {
            schema: schema.into(),
            base_type,
            excluded_types: BTreeSet::new(),
            revision_ids,
            fields: BTreeSet::new(),
        }
    }

    pub fn exclude(mut self, types: impl IntoIterator<Item = TypeHandle>) -> Self {
        self.excluded_types.extend(types);
        self
    }

    pub fn include(mut self, field: GeometryField) -> Self {
        self.fields.insert(field);
        self
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn base_type(&self) -> TypeHandle {
        self.base_type
    }

    pub fn excluded_types(&self) -> &BTreeSet<TypeHandle> {
        &self.excluded_types
    }

    pub fn revision_ids(&self) -> &BTreeSet<RevisionId> {
        &self.revision_ids
    }

    pub fn includes(&self, field: GeometryField) -> bool {
        self.fields.contains(&field)
    }
}
