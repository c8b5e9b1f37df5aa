//! Composite toggle state and the bitmask math behind its views.
//!
//! The stored value is a non-negative `i32` bitmask. Boolean and Index toggles
//! read it as the position of the lowest set bit, Count toggles as the number
//! of contiguous low set bits, Flag toggles as the raw mask. All mutation goes
//! through [`crate::ToggleWorld::set_mask_value`]; this module only holds data.

use std::fmt;

use serde::{Deserialize, Serialize};
use toggle_api_core::{MethodId, ObjectId, ValueKind};
use toggle_property_core::{MethodHandle, Property};

use crate::ids::ToggleId;

/// Upper bound of a toggle's element count.
pub const MAX_COUNT: i32 = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    Boolean,
    Index,
    Count,
    Flag,
}

impl ValueType {
    /// Only Boolean and Index toggles drive per-index bindings.
    pub fn drives_bindings(self) -> bool {
        matches!(self, ValueType::Boolean | ValueType::Index)
    }
}

/// Number of trailing zero bits; `-1` for 0.
pub fn trailing_zero_count(x: i32) -> i32 {
    if x == 0 {
        -1
    } else {
        x.trailing_zeros() as i32
    }
}

/// Mask selecting index `k`; indices outside `0..=30` select nothing.
pub fn index_mask(k: i32) -> i32 {
    if (0..MAX_COUNT).contains(&k) {
        1 << k
    } else {
        0
    }
}

/// Mask with the low `k` bits set, saturating at 31 bits.
pub fn count_mask(k: i32) -> i32 {
    if k <= 0 {
        0
    } else if k >= MAX_COUNT {
        i32::MAX
    } else {
        (1 << k) - 1
    }
}

/// Element count after normalization: 2 for Boolean, else clamped to 0..=31.
pub fn normalized_count(value_type: ValueType, count: i32) -> i32 {
    match value_type {
        ValueType::Boolean => 2,
        _ => count.clamp(0, MAX_COUNT),
    }
}

/// One persistent call of a per-index action: `property` invoked at index 0
/// on the matching component of `target`.
#[derive(Debug)]
pub struct ToggleAction {
    pub target: Option<ObjectId>,
    pub property: Property,
}

/// Value-changed subscriber: a method invoked with an argument derived from
/// the toggle's current value.
pub struct ValueChangedListener {
    pub target: Option<ObjectId>,
    pub method_id: MethodId,
    pub(crate) resolved: Option<(ValueKind, MethodHandle)>,
}

impl ValueChangedListener {
    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }
}

impl fmt::Debug for ValueChangedListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueChangedListener")
            .field("target", &self.target)
            .field("method_id", &self.method_id)
            .field("resolved", &self.resolved.as_ref().map(|(kind, _)| *kind))
            .finish()
    }
}

#[derive(Debug)]
pub struct CompositeToggle {
    pub(crate) object: ObjectId,
    pub(crate) value_type: ValueType,
    pub(crate) count: i32,
    pub(crate) value: i32,
    pub(crate) reset_value_on_init: bool,
    pub(crate) ignore_parent: bool,
    pub(crate) force_notify_next: bool,

    pub(crate) parent: Option<ToggleId>,
    pub(crate) children: Vec<ToggleId>,
    pub(crate) synced: Vec<Option<ToggleId>>,
    pub(crate) grouped: Vec<Option<ToggleId>>,
    pub(crate) group_parent: Option<ToggleId>,

    pub(crate) activate_objects: Vec<Option<ObjectId>>,
    pub(crate) comments: Vec<String>,
    pub(crate) actions: Vec<Vec<ToggleAction>>,
    pub(crate) properties: Vec<Property>,
    pub(crate) listeners: Vec<ValueChangedListener>,
}

impl CompositeToggle {
    /// `count` is normalized for `value_type` right away.
    pub fn new(object: ObjectId, value_type: ValueType, count: i32) -> Self {
        Self {
            object,
            value_type,
            count: normalized_count(value_type, count),
            value: 1,
            reset_value_on_init: false,
            ignore_parent: false,
            force_notify_next: false,
            parent: None,
            children: Vec::new(),
            synced: Vec::new(),
            grouped: Vec::new(),
            group_parent: None,
            activate_objects: Vec::new(),
            comments: Vec::new(),
            actions: Vec::new(),
            properties: Vec::new(),
            listeners: Vec::new(),
        }
    }

    pub fn object(&self) -> ObjectId {
        self.object
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn count(&self) -> i32 {
        self.count
    }

    pub fn mask_value(&self) -> i32 {
        self.value
    }

    /// True for any mask above 1, so false/true are stored as 1/2.
    pub fn boolean_value(&self) -> bool {
        self.value > 1
    }

    pub fn index_value(&self) -> i32 {
        trailing_zero_count(self.value)
    }

    pub fn count_value(&self) -> i32 {
        trailing_zero_count(!self.value)
    }

    /// Count for Count toggles, the raw mask for Flag toggles, the index otherwise.
    pub fn value_as_float(&self) -> f32 {
        match self.value_type {
            ValueType::Count => self.count_value() as f32,
            ValueType::Flag => self.value as f32,
            ValueType::Boolean | ValueType::Index => self.index_value() as f32,
        }
    }

    /// Mask a `value_as_float` write resolves to.
    pub fn mask_for_float(&self, value: f32) -> i32 {
        let v = value as i32;
        match self.value_type {
            ValueType::Count => count_mask(v),
            ValueType::Flag => v,
            ValueType::Boolean | ValueType::Index => index_mask(v),
        }
    }

    pub fn reset_value_on_init(&self) -> bool {
        self.reset_value_on_init
    }

    pub fn ignore_parent(&self) -> bool {
        self.ignore_parent
    }

    pub fn force_notify_next(&self) -> bool {
        self.force_notify_next
    }

    pub fn parent(&self) -> Option<ToggleId> {
        self.parent
    }

    pub fn children(&self) -> &[ToggleId] {
        &self.children
    }

    pub fn synced_toggles(&self) -> &[Option<ToggleId>] {
        &self.synced
    }

    pub fn grouped_toggles(&self) -> &[Option<ToggleId>] {
        &self.grouped
    }

    pub fn group_parent(&self) -> Option<ToggleId> {
        self.group_parent
    }

    pub fn activate_objects(&self) -> &[Option<ObjectId>] {
        &self.activate_objects
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn comments_mut(&mut self) -> &mut [String] {
        &mut self.comments
    }

    pub fn actions(&self) -> &[Vec<ToggleAction>] {
        &self.actions
    }

    pub fn properties(&self) -> &[Property] {
        &self.properties
    }

    pub fn properties_mut(&mut self) -> &mut [Property] {
        &mut self.properties
    }

    pub fn listeners(&self) -> &[ValueChangedListener] {
        &self.listeners
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_mask(value_type: ValueType, value: i32) -> CompositeToggle {
        let mut t = CompositeToggle::new(ObjectId(0), value_type, 4);
        t.value = value;
        t
    }

    #[test]
    fn index_view_is_lowest_set_bit() {
        assert_eq!(with_mask(ValueType::Index, 0b0101).index_value(), 0);
        assert_eq!(with_mask(ValueType::Index, 0b0110).index_value(), 1);
        assert_eq!(with_mask(ValueType::Index, 0).index_value(), -1);
    }

    #[test]
    fn count_view_is_low_run_length() {
        assert_eq!(with_mask(ValueType::Count, 0b0111).count_value(), 3);
        assert_eq!(with_mask(ValueType::Count, 0).count_value(), 0);
        assert_eq!(with_mask(ValueType::Count, i32::MAX).count_value(), 31);
    }

    #[test]
    fn new_normalizes_the_element_count() {
        let t = |vt, n| CompositeToggle::new(ObjectId(0), vt, n).count();
        assert_eq!(t(ValueType::Index, 40), MAX_COUNT);
        assert_eq!(t(ValueType::Count, -3), 0);
        assert_eq!(t(ValueType::Boolean, 5), 2);
        assert_eq!(t(ValueType::Flag, 12), 12);
    }

    #[test]
    fn boolean_view_threshold() {
        assert!(!with_mask(ValueType::Boolean, 1).boolean_value());
        assert!(with_mask(ValueType::Boolean, 2).boolean_value());
        assert!(with_mask(ValueType::Boolean, 3).boolean_value());
    }

    #[test]
    fn mask_builders_saturate() {
        assert_eq!(index_mask(3), 8);
        assert_eq!(index_mask(31), 0);
        assert_eq!(index_mask(-1), 0);
        assert_eq!(count_mask(3), 7);
        assert_eq!(count_mask(0), 0);
        assert_eq!(count_mask(40), i32::MAX);
    }

    #[test]
    fn float_view_follows_value_type() {
        assert_eq!(with_mask(ValueType::Index, 4).value_as_float(), 2.0);
        assert_eq!(with_mask(ValueType::Count, 7).value_as_float(), 3.0);
        assert_eq!(with_mask(ValueType::Flag, 5).value_as_float(), 5.0);
        let t = with_mask(ValueType::Count, 0);
        assert_eq!(t.mask_for_float(2.9), 3);
    }

    #[test]
    fn boolean_count_is_always_two() {
        assert_eq!(normalized_count(ValueType::Boolean, 9), 2);
        assert_eq!(normalized_count(ValueType::Flag, 40), 31);
        assert_eq!(normalized_count(ValueType::Index, -2), 0);
    }
}
