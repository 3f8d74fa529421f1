use std::fmt;

use serde::{Deserialize, Serialize};

/// Catalog-assigned identity of one shape variant.
///
/// Equal to the variant's position in the catalog's flat list, so it is stable
/// for a given set of base definitions and cheap to compare during replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(u16);

impl ShapeId {
    pub fn new(id: u16) -> Self {
        Self(id)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl From<u16> for ShapeId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

impl From<ShapeId> for u16 {
    fn from(id: ShapeId) -> Self {
        id.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
