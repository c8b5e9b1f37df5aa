use thiserror::Error;
use toggle_api_core::ObjectId;
use toggle_property_core::PropertyError;

use crate::ids::ToggleId;

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("unknown object {0:?}")]
    UnknownObject(ObjectId),
    #[error("object {0:?} already exists")]
    DuplicateObject(ObjectId),
    #[error("unknown toggle {0:?}")]
    UnknownToggle(ToggleId),
    #[error("object {0:?} already carries a toggle")]
    DuplicateToggle(ObjectId),
    #[error("no component type named '{0}'")]
    UnknownComponent(String),
    #[error("parenting {child:?} under {parent:?} would create a cycle")]
    HierarchyCycle { child: ObjectId, parent: ObjectId },
    #[error("slot {index} is out of range for a toggle of {count} elements")]
    SlotOutOfRange { index: usize, count: i32 },
    #[error(transparent)]
    Property(#[from] PropertyError),
    #[error("invalid scene document: {0}")]
    Document(#[from] serde_json::Error),
}
