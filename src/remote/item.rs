use std::fmt::{Debug, Formatter, Result};

use serde::{Deserialize, Serialize};

/// A saved item as returned by a listing, including the size of its content.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDescriptor {
    id: i64,
    access_hash: i64,
    file_reference: Vec<u8>,
    size: i64,
}

impl ItemDescriptor {
    #[cfg(test)]
    pub fn new(id: i64, access_hash: i64, file_reference: Vec<u8>, size: i64) -> Self {
        Self {
            id,
            access_hash,
            file_reference,
            size,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn input_ref(&self) -> InputRef {
        InputRef::from(self)
    }
}

impl Debug for ItemDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("ItemDescriptor")
            .field("id", &self.id)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// The part of an [`ItemDescriptor`] needed to change its saved state.
///
/// File references rotate, so these are derived from the listing they were
/// returned in and only kept for as long as one collection run.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputRef {
    id: i64,
    access_hash: i64,
    file_reference: Vec<u8>,
}

impl InputRef {
    pub fn id(&self) -> i64 {
        self.id
    }
}

impl From<&ItemDescriptor> for InputRef {
    fn from(item: &ItemDescriptor) -> Self {
        Self {
            id: item.id,
            access_hash: item.access_hash,
            file_reference: item.file_reference.clone(),
        }
    }
}

impl Debug for InputRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.debug_struct("InputRef")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}
