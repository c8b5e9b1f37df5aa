//! Identifiers and the allocator for scene objects and toggles.

use serde::{Deserialize, Serialize};
use toggle_api_core::ObjectId;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ToggleId(pub u32);

/// Monotonic allocator for ObjectId and ToggleId.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_object: u32,
    next_toggle: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_object(&mut self) -> ObjectId {
        let id = ObjectId(self.next_object);
        self.next_object = self.next_object.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_toggle(&mut self) -> ToggleId {
        let id = ToggleId(self.next_toggle);
        self.next_toggle = self.next_toggle.wrapping_add(1);
        id
    }

    /// Keep future object ids clear of an id chosen by a document.
    #[inline]
    pub fn reserve_object(&mut self, id: ObjectId) {
        self.next_object = self.next_object.max(id.0.wrapping_add(1));
    }
}
