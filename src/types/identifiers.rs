use std::fmt;

use serde::{Deserialize, Serialize};

/// Object id of a stored model revision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(i64);

impl RevisionId {
    pub const fn new(raw: i64) -> Self {
        RevisionId(raw)
    }

    pub fn raw(&self) -> i64 {
        self.0
    }
}

/// Object id of a model element (a spatial product in the schema).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(i64);

impl ElementId {
    pub const fn new(raw: i64) -> Self {
        ElementId(raw)
    }

    pub fn raw(&self) -> i64 {
        self.0
    }
}

/// Object id of a geometry data blob. Several elements may point at the same blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeometryDataId(i64);

impl GeometryDataId {
    pub const fn new(raw: i64) -> Self {
        GeometryDataId(raw)
    }

    pub fn raw(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl fmt::Display for GeometryDataId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}
