//! Minimal object hierarchy the toggles live in.
//!
//! Objects own their components; toggles and activation targets only refer to
//! objects by id. This is not a transform hierarchy: it tracks names,
//! parent/child links, an active flag and components, nothing else.

use std::collections::BTreeMap;

use toggle_api_core::ObjectId;
use toggle_property_core::Component;

use crate::error::WorldError;

#[derive(Debug)]
pub struct SceneObject {
    pub name: String,
    parent: Option<ObjectId>,
    children: Vec<ObjectId>,
    active: bool,
    components: Vec<Box<dyn Component>>,
}

impl SceneObject {
    fn new(name: String) -> Self {
        Self {
            name,
            parent: None,
            children: Vec::new(),
            active: true,
            components: Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
pub struct Scene {
    objects: BTreeMap<ObjectId, SceneObject>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a root object under `id`.
    pub fn insert(&mut self, id: ObjectId, name: impl Into<String>) -> Result<(), WorldError> {
        if self.objects.contains_key(&id) {
            return Err(WorldError::DuplicateObject(id));
        }
        self.objects.insert(id, SceneObject::new(name.into()));
        Ok(())
    }

    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.get(&id)
    }

    pub fn name(&self, id: ObjectId) -> Option<&str> {
        self.objects.get(&id).map(|o| o.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn ids(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.objects.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn parent(&self, id: ObjectId) -> Option<ObjectId> {
        self.objects.get(&id).and_then(|o| o.parent)
    }

    pub fn children(&self, id: ObjectId) -> &[ObjectId] {
        self.objects
            .get(&id)
            .map(|o| o.children.as_slice())
            .unwrap_or(&[])
    }

    /// Re-link `child` under `parent` (`None` makes it a root).
    pub fn set_parent(&mut self, child: ObjectId, parent: Option<ObjectId>) -> Result<(), WorldError> {
        if !self.contains(child) {
            return Err(WorldError::UnknownObject(child));
        }
        if let Some(p) = parent {
            if !self.contains(p) {
                return Err(WorldError::UnknownObject(p));
            }
            if p == child || self.ancestors(p).contains(&child) {
                return Err(WorldError::HierarchyCycle { child, parent: p });
            }
        }
        let old = self.parent(child);
        if old == parent {
            return Ok(());
        }
        if let Some(old) = old.and_then(|o| self.objects.get_mut(&o)) {
            old.children.retain(|c| *c != child);
        }
        if let Some(new) = parent.and_then(|p| self.objects.get_mut(&p)) {
            new.children.push(child);
        }
        if let Some(obj) = self.objects.get_mut(&child) {
            obj.parent = parent;
        }
        Ok(())
    }

    /// Parent chain of `id`, nearest first, excluding `id`.
    pub fn ancestors(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        let mut cursor = self.parent(id);
        while let Some(p) = cursor {
            if out.contains(&p) {
                break;
            }
            out.push(p);
            cursor = self.parent(p);
        }
        out
    }

    /// `id` and every descendant, depth first.
    pub fn subtree(&self, id: ObjectId) -> Vec<ObjectId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Returns the previous flag, or `None` for unknown objects.
    pub fn set_active(&mut self, id: ObjectId, active: bool) -> Option<bool> {
        self.objects
            .get_mut(&id)
            .map(|o| std::mem::replace(&mut o.active, active))
    }

    /// The object's own flag.
    pub fn is_active_self(&self, id: ObjectId) -> bool {
        self.objects.get(&id).is_some_and(|o| o.active)
    }

    /// Active itself and along the whole parent chain.
    pub fn is_active(&self, id: ObjectId) -> bool {
        self.is_active_self(id) && self.ancestors(id).iter().all(|a| self.is_active_self(*a))
    }

    pub fn add_component(&mut self, id: ObjectId, component: Box<dyn Component>) -> Result<(), WorldError> {
        let obj = self
            .objects
            .get_mut(&id)
            .ok_or(WorldError::UnknownObject(id))?;
        obj.components.push(component);
        Ok(())
    }

    pub fn components(&self, id: ObjectId) -> &[Box<dyn Component>] {
        self.objects
            .get(&id)
            .map(|o| o.components.as_slice())
            .unwrap_or(&[])
    }

    pub fn components_mut(&mut self, id: ObjectId) -> &mut [Box<dyn Component>] {
        match self.objects.get_mut(&id) {
            Some(o) => o.components.as_mut_slice(),
            None => &mut [],
        }
    }

    /// First component on `id` whose registered type name is `type_name`.
    pub fn component_by_name_mut(&mut self, id: ObjectId, type_name: &str) -> Option<&mut dyn Component> {
        self.components_mut(id)
            .iter_mut()
            .find(|c| c.type_name() == type_name)
            .map(|c| &mut **c)
    }

    pub fn component<T: Component>(&self, id: ObjectId) -> Option<&T> {
        self.components(id)
            .iter()
            .find_map(|c| c.as_any().downcast_ref::<T>())
    }

    pub fn component_mut<T: Component>(&mut self, id: ObjectId) -> Option<&mut T> {
        self.components_mut(id)
            .iter_mut()
            .find_map(|c| c.as_any_mut().downcast_mut::<T>())
    }

    /// Remove `id` and its subtree; returns the removed ids.
    pub fn destroy(&mut self, id: ObjectId) -> Vec<ObjectId> {
        let removed = self.subtree(id);
        if let Some(parent) = self.parent(id).and_then(|p| self.objects.get_mut(&p)) {
            parent.children.retain(|c| *c != id);
        }
        for r in &removed {
            self.objects.remove(r);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toggle_property_core::components::{Image, Text};

    fn scene() -> Scene {
        let mut s = Scene::new();
        for i in 0..4 {
            s.insert(ObjectId(i), format!("obj{i}")).unwrap();
        }
        s.set_parent(ObjectId(1), Some(ObjectId(0))).unwrap();
        s.set_parent(ObjectId(2), Some(ObjectId(1))).unwrap();
        s.set_parent(ObjectId(3), Some(ObjectId(0))).unwrap();
        s
    }

    #[test]
    fn hierarchy_links_both_ways() {
        let s = scene();
        assert_eq!(s.children(ObjectId(0)), &[ObjectId(1), ObjectId(3)]);
        assert_eq!(s.ancestors(ObjectId(2)), vec![ObjectId(1), ObjectId(0)]);
        assert_eq!(
            s.subtree(ObjectId(0)),
            vec![ObjectId(0), ObjectId(1), ObjectId(2), ObjectId(3)]
        );
    }

    #[test]
    fn rejects_cycles() {
        let mut s = scene();
        assert!(matches!(
            s.set_parent(ObjectId(0), Some(ObjectId(2))),
            Err(WorldError::HierarchyCycle { .. })
        ));
        assert!(s.set_parent(ObjectId(1), Some(ObjectId(1))).is_err());
    }

    #[test]
    fn activity_follows_the_parent_chain() {
        let mut s = scene();
        assert_eq!(s.set_active(ObjectId(1), false), Some(true));
        assert!(!s.is_active(ObjectId(2)));
        assert!(s.is_active_self(ObjectId(2)));
    }

    #[test]
    fn components_by_type() {
        let mut s = scene();
        s.add_component(ObjectId(2), Box::new(Text::default())).unwrap();
        s.add_component(ObjectId(2), Box::new(Image::default())).unwrap();
        s.component_mut::<Image>(ObjectId(2)).unwrap().fill_amount = 0.5;
        assert_eq!(s.component::<Image>(ObjectId(2)).unwrap().fill_amount, 0.5);
        assert!(s.component_by_name_mut(ObjectId(2), "Text").is_some());
        assert!(s.component_by_name_mut(ObjectId(2), "Camera").is_none());
    }

    #[test]
    fn destroy_removes_subtree() {
        let mut s = scene();
        let removed = s.destroy(ObjectId(1));
        assert_eq!(removed, vec![ObjectId(1), ObjectId(2)]);
        assert_eq!(s.children(ObjectId(0)), &[ObjectId(3)]);
        assert!(!s.contains(ObjectId(2)));
    }
}
