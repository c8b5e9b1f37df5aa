//! The toggle world: scene, toggle arena, relation graph and value state machine.
//!
//! Every toggle mutation funnels through [`ToggleWorld::set_mask_value`]. A
//! committed change drives grouped children and activation objects bit by bit,
//! replays the property bindings and action of the selected index, notifies
//! listeners, then propagates the value to synced toggles and structural
//! children. A toggle that is already inside its own `set_mask_value` ignores
//! nested writes, which is what terminates sync cycles.

use std::borrow::Cow;

use hashbrown::{HashMap, HashSet};
use log::{debug, error};
use toggle_api_core::coercion::coerce;
use toggle_api_core::{MethodId, ObjectId, Value, ValueKind};
use toggle_property_core::{
    Component, MethodHandle, Property, PropertyError, Registry, Style, StyleAssetRecord,
    StyleLibrary,
};

use crate::config::Config;
use crate::document::{
    ActionRecord, ListenerRecord, ObjectRecord, SceneDocument, StyleRecord, ToggleRecord,
};
use crate::error::WorldError;
use crate::events::{Outputs, ToggleEvent};
use crate::ids::{IdAllocator, ToggleId};
use crate::scene::Scene;
use crate::toggle::{
    count_mask, index_mask, normalized_count, CompositeToggle, ToggleAction,
    ValueChangedListener, ValueType, MAX_COUNT,
};

fn resolve_listener(
    registry: &Registry,
    method_id: &MethodId,
) -> Result<(ValueKind, MethodHandle), PropertyError> {
    let info = registry.types.resolve_type(method_id.target_type())?;
    let kind = registry.types.resolve_kind(method_id.argument_type())?;
    let handle = info
        .method(method_id.method_name(), method_id.argument_type())
        .ok_or_else(|| PropertyError::UnresolvableMethod {
            type_name: method_id.target_type().to_string(),
            argument_type: method_id.argument_type().to_string(),
            method_name: method_id.method_name().to_string(),
        })?;
    Ok((kind, handle))
}

fn fit<T>(items: &mut Vec<T>, len: usize, make: impl FnMut() -> T) {
    items.truncate(len);
    items.resize_with(len, make);
}

#[derive(Debug)]
pub struct ToggleWorld {
    cfg: Config,
    ids: IdAllocator,
    registry: Cow<'static, Registry>,
    scene: Scene,
    toggles: HashMap<ToggleId, CompositeToggle>,
    by_object: HashMap<ObjectId, ToggleId>,
    locked: HashSet<ToggleId>,
    styles: HashMap<ObjectId, Style>,
    style_library: StyleLibrary,
    outputs: Outputs,
}

impl Default for ToggleWorld {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl ToggleWorld {
    /// World backed by the built-in registry.
    pub fn new(cfg: Config) -> Self {
        Self::from_registry(cfg, Cow::Borrowed(Registry::global()))
    }

    /// World resolving bindings against a host supplied registry.
    pub fn with_registry(cfg: Config, registry: Registry) -> Self {
        Self::from_registry(cfg, Cow::Owned(registry))
    }

    fn from_registry(cfg: Config, registry: Cow<'static, Registry>) -> Self {
        Self {
            cfg,
            ids: IdAllocator::new(),
            registry,
            scene: Scene::new(),
            toggles: HashMap::new(),
            by_object: HashMap::new(),
            locked: HashSet::new(),
            styles: HashMap::new(),
            style_library: StyleLibrary::new(),
            outputs: Outputs::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    // Scene objects

    pub fn spawn_object(&mut self, name: &str, parent: Option<ObjectId>) -> Result<ObjectId, WorldError> {
        if let Some(p) = parent {
            if !self.scene.contains(p) {
                return Err(WorldError::UnknownObject(p));
            }
        }
        let mut id = self.ids.alloc_object();
        while self.scene.contains(id) {
            id = self.ids.alloc_object();
        }
        self.scene.insert(id, name)?;
        if parent.is_some() {
            self.set_object_parent(id, parent)?;
        }
        Ok(id)
    }

    fn insert_object(&mut self, id: ObjectId, name: &str) -> Result<(), WorldError> {
        self.scene.insert(id, name)?;
        self.ids.reserve_object(id);
        Ok(())
    }

    pub fn add_component(&mut self, object: ObjectId, component: Box<dyn Component>) -> Result<(), WorldError> {
        self.scene.add_component(object, component)
    }

    /// Instantiate a registered component type on `object`.
    pub fn add_component_by_name(&mut self, object: ObjectId, type_name: &str) -> Result<(), WorldError> {
        let component = self
            .registry
            .types
            .create(type_name)
            .ok_or_else(|| WorldError::UnknownComponent(type_name.to_string()))?;
        self.scene.add_component(object, component)
    }

    pub fn component<T: Component>(&self, object: ObjectId) -> Option<&T> {
        self.scene.component::<T>(object)
    }

    pub fn component_mut<T: Component>(&mut self, object: ObjectId) -> Option<&mut T> {
        self.scene.component_mut::<T>(object)
    }

    /// Reparent a scene object, then re-run parent discovery for every toggle
    /// in the moved subtree.
    pub fn set_object_parent(&mut self, object: ObjectId, parent: Option<ObjectId>) -> Result<(), WorldError> {
        self.scene.set_parent(object, parent)?;
        for o in self.scene.subtree(object) {
            if let Some(&t) = self.by_object.get(&o) {
                self.on_hierarchy_parent_changed(t);
            }
        }
        Ok(())
    }

    /// Set an object's own active flag. Styles in a subtree that becomes
    /// active are re-applied.
    pub fn set_object_active(&mut self, object: ObjectId, active: bool) -> Result<(), WorldError> {
        let was_active = self.scene.is_active(object);
        self.scene
            .set_active(object, active)
            .ok_or(WorldError::UnknownObject(object))?;
        if self.cfg.load_styles_on_attach && !was_active && self.scene.is_active(object) {
            for o in self.scene.subtree(object) {
                if self.styles.contains_key(&o) && self.scene.is_active(o) {
                    self.load_style(o);
                }
            }
        }
        Ok(())
    }

    /// Destroy an object subtree together with its toggles and styles.
    pub fn destroy_object(&mut self, object: ObjectId) -> Result<Vec<ObjectId>, WorldError> {
        if !self.scene.contains(object) {
            return Err(WorldError::UnknownObject(object));
        }
        let doomed: Vec<ToggleId> = self
            .scene
            .subtree(object)
            .into_iter()
            .filter_map(|o| self.by_object.get(&o).copied())
            .collect();
        let removed = self.scene.destroy(object);
        for t in doomed {
            self.remove_toggle(t)?;
        }
        for o in &removed {
            self.styles.remove(o);
        }
        Ok(removed)
    }

    // Styles

    pub fn style_library(&self) -> &StyleLibrary {
        &self.style_library
    }

    pub fn style_library_mut(&mut self) -> &mut StyleLibrary {
        &mut self.style_library
    }

    pub fn add_style_asset(&mut self, record: StyleAssetRecord) {
        self.style_library.insert_record(record, &self.registry);
    }

    /// Attach `style` to `object`; applied right away when the object is active.
    pub fn set_style(&mut self, object: ObjectId, style: Style) -> Result<(), WorldError> {
        if !self.scene.contains(object) {
            return Err(WorldError::UnknownObject(object));
        }
        self.styles.insert(object, style);
        if self.cfg.load_styles_on_attach && self.scene.is_active(object) {
            self.load_style(object);
        }
        Ok(())
    }

    pub fn style(&self, object: ObjectId) -> Option<&Style> {
        self.styles.get(&object)
    }

    pub fn remove_style(&mut self, object: ObjectId) -> Option<Style> {
        self.styles.remove(&object)
    }

    /// Apply the style attached to `object`; returns how many bindings ran.
    pub fn load_style(&mut self, object: ObjectId) -> usize {
        let Some(style) = self.styles.get(&object) else {
            return 0;
        };
        style.load_style(&self.style_library, self.scene.components_mut(object))
    }

    // Toggle lifecycle

    /// Create a toggle from `record` and wake it up.
    pub fn add_toggle(&mut self, record: ToggleRecord) -> Result<ToggleId, WorldError> {
        let id = self.create_toggle(&record)?;
        self.link_references(id, &record);
        self.awake(id);
        Ok(id)
    }

    fn create_toggle(&mut self, record: &ToggleRecord) -> Result<ToggleId, WorldError> {
        if !self.scene.contains(record.object) {
            return Err(WorldError::UnknownObject(record.object));
        }
        if self.by_object.contains_key(&record.object) {
            return Err(WorldError::DuplicateToggle(record.object));
        }
        let mut toggle = CompositeToggle::new(record.object, record.value_type, record.count);
        toggle.value = record.value.max(0);
        toggle.reset_value_on_init = record.reset_value_on_init;
        toggle.ignore_parent = record.ignore_parent;
        toggle.activate_objects = record.activate_objects.clone();
        toggle.comments = record.comments.clone();
        toggle.properties = record
            .properties
            .iter()
            .map(|p| Property::from_record(p.clone(), &self.registry))
            .collect();
        toggle.actions = record
            .actions
            .iter()
            .map(|calls| {
                calls
                    .iter()
                    .map(|a| ToggleAction {
                        target: a.target,
                        property: Property::from_record(a.call.clone(), &self.registry),
                    })
                    .collect()
            })
            .collect();
        toggle.listeners = record
            .listeners
            .iter()
            .map(|l| {
                let resolved = match resolve_listener(&self.registry, &l.method) {
                    Ok(r) => Some(r),
                    Err(e) => {
                        error!("listener {} is inert: {e}", l.method.display_name());
                        None
                    }
                };
                ValueChangedListener {
                    target: l.target,
                    method_id: l.method.clone(),
                    resolved,
                }
            })
            .collect();

        let id = self.ids.alloc_toggle();
        self.toggles.insert(id, toggle);
        self.by_object.insert(record.object, id);
        Ok(id)
    }

    /// Resolve synced and grouped references, stored as object ids.
    fn link_references(&mut self, id: ToggleId, record: &ToggleRecord) {
        let grouped: Vec<Option<ToggleId>> = record
            .grouped
            .iter()
            .map(|o| {
                o.and_then(|o| self.by_object.get(&o).copied())
                    .filter(|g| *g != id)
            })
            .collect();
        if let Some(t) = self.toggles.get_mut(&id) {
            t.grouped = grouped;
        }
        for other in record.synced.iter().flatten() {
            if let Some(&s) = self.by_object.get(other) {
                self.add_synced(id, s);
            }
        }
    }

    /// Parent discovery for the toggle and the toggles below it, refresh, then
    /// re-assert the stored value.
    fn awake(&mut self, id: ToggleId) {
        let Some(object) = self.toggles.get(&id).map(|t| t.object) else {
            return;
        };
        for o in self.scene.subtree(object) {
            let Some(&t) = self.by_object.get(&o) else {
                continue;
            };
            if t == id || self.toggles.get(&t).is_some_and(|x| !x.ignore_parent) {
                self.on_hierarchy_parent_changed(t);
            }
        }
        self.refresh(id);
        let Some(toggle) = self.toggles.get_mut(&id) else {
            return;
        };
        toggle.force_notify_next = toggle.reset_value_on_init;
        let value = toggle.value;
        self.set_mask_value(id, value);
    }

    /// Remove a toggle and clear it from every relation.
    pub fn remove_toggle(&mut self, id: ToggleId) -> Result<CompositeToggle, WorldError> {
        if !self.toggles.contains_key(&id) {
            return Err(WorldError::UnknownToggle(id));
        }
        self.set_parent(id, None);
        let removed = self
            .toggles
            .remove(&id)
            .ok_or(WorldError::UnknownToggle(id))?;
        self.by_object.remove(&removed.object);
        self.locked.remove(&id);
        for t in self.toggles.values_mut() {
            t.children.retain(|c| *c != id);
            t.synced.retain(|s| *s != Some(id));
            for slot in t.grouped.iter_mut().filter(|g| **g == Some(id)) {
                *slot = None;
            }
            if t.parent == Some(id) {
                t.parent = None;
            }
            if t.group_parent == Some(id) {
                t.group_parent = None;
            }
        }
        for c in &removed.children {
            self.on_hierarchy_parent_changed(*c);
        }
        Ok(removed)
    }

    pub fn get(&self, id: ToggleId) -> Option<&CompositeToggle> {
        self.toggles.get(&id)
    }

    pub fn toggle_of(&self, object: ObjectId) -> Option<ToggleId> {
        self.by_object.get(&object).copied()
    }

    /// Toggle ids in allocation order.
    pub fn toggle_ids(&self) -> Vec<ToggleId> {
        let mut ids: Vec<ToggleId> = self.toggles.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    // Value views

    pub fn mask_value(&self, id: ToggleId) -> Option<i32> {
        self.get(id).map(CompositeToggle::mask_value)
    }

    pub fn index_value(&self, id: ToggleId) -> Option<i32> {
        self.get(id).map(CompositeToggle::index_value)
    }

    pub fn count_value(&self, id: ToggleId) -> Option<i32> {
        self.get(id).map(CompositeToggle::count_value)
    }

    pub fn boolean_value(&self, id: ToggleId) -> Option<bool> {
        self.get(id).map(CompositeToggle::boolean_value)
    }

    pub fn value_as_float(&self, id: ToggleId) -> Option<f32> {
        self.get(id).map(CompositeToggle::value_as_float)
    }

    pub fn count(&self, id: ToggleId) -> Option<i32> {
        self.get(id).map(CompositeToggle::count)
    }

    pub fn value_type(&self, id: ToggleId) -> Option<ValueType> {
        self.get(id).map(CompositeToggle::value_type)
    }

    pub fn set_index_value(&mut self, id: ToggleId, index: i32) {
        self.set_mask_value(id, index_mask(index));
    }

    pub fn set_count_value(&mut self, id: ToggleId, count: i32) {
        self.set_mask_value(id, count_mask(count));
    }

    pub fn set_boolean_value(&mut self, id: ToggleId, value: bool) {
        self.set_mask_value(id, if value { 2 } else { 1 });
    }

    pub fn set_value_as_float(&mut self, id: ToggleId, value: f32) {
        if let Some(mask) = self.get(id).map(|t| t.mask_for_float(value)) {
            self.set_mask_value(id, mask);
        }
    }

    pub fn set_count(&mut self, id: ToggleId, count: i32) {
        if let Some(t) = self.toggles.get_mut(&id) {
            t.count = count;
            self.refresh(id);
        }
    }

    pub fn set_value_type(&mut self, id: ToggleId, value_type: ValueType) {
        if let Some(t) = self.toggles.get_mut(&id) {
            t.value_type = value_type;
            self.refresh(id);
        }
    }

    pub fn set_reset_value_on_init(&mut self, id: ToggleId, reset: bool) {
        if let Some(t) = self.toggles.get_mut(&id) {
            t.reset_value_on_init = reset;
        }
    }

    /// Make the next `set_mask_value` run side effects even if the value is unchanged.
    pub fn set_force_notify_next(&mut self, id: ToggleId, force: bool) {
        if let Some(t) = self.toggles.get_mut(&id) {
            t.force_notify_next = force;
        }
    }

    // State machine

    /// The single mutation entry point.
    pub fn set_mask_value(&mut self, id: ToggleId, value: i32) {
        if self.locked.contains(&id) {
            return;
        }
        let Some(toggle) = self.toggles.get_mut(&id) else {
            return;
        };
        let value = value.max(0);
        let changed = toggle.force_notify_next || toggle.value != value;
        if changed {
            toggle.force_notify_next = false;
            toggle.value = value;
        }
        self.locked.insert(id);
        if changed {
            self.on_value_committed(id);
        }

        let (committed, synced, children) = match self.toggles.get(&id) {
            Some(t) => (
                t.value,
                t.synced.iter().flatten().copied().collect::<Vec<_>>(),
                t.children.clone(),
            ),
            None => {
                self.locked.remove(&id);
                return;
            }
        };
        for s in synced {
            if s != id && self.toggles.contains_key(&s) && !self.has_group_parent(s) {
                self.set_mask_value(s, committed);
            }
        }
        for c in children {
            let follows = self.toggles.get(&c).is_some_and(|t| !t.ignore_parent);
            if c != id && follows && !self.has_group_parent(c) {
                self.set_mask_value(c, committed);
            }
        }
        self.locked.remove(&id);
    }

    /// Whether `id` is grouped under a toggle that still exists.
    fn has_group_parent(&self, id: ToggleId) -> bool {
        self.toggles
            .get(&id)
            .and_then(|t| t.group_parent)
            .is_some_and(|g| self.toggles.contains_key(&g))
    }

    fn on_value_committed(&mut self, id: ToggleId) {
        let Some(t) = self.toggles.get(&id) else {
            return;
        };
        let value = t.value;
        let count = t.count.clamp(0, MAX_COUNT) as usize;
        let index = t.index_value();
        let grouped = t.grouped.clone();
        let activate = t.activate_objects.clone();

        for i in 0..count {
            let bit = value & (1 << i) != 0;
            if let Some(&Some(g)) = grouped.get(i) {
                if g != id && self.toggles.contains_key(&g) {
                    self.set_boolean_value(g, bit);
                }
            }
            if let Some(&Some(object)) = activate.get(i) {
                if self.scene.contains(object) {
                    // Known object: cannot fail.
                    let _ = self.set_object_active(object, bit);
                }
            }
        }

        self.invoke_toggle_target(id, index);
        self.notify_value_changed(id);
    }

    /// Replay the property bindings and the action of `index` without
    /// changing the value. Only Boolean and Index toggles drive bindings.
    pub fn invoke_toggle_target(&mut self, id: ToggleId, index: i32) {
        let Some(t) = self.toggles.get(&id) else {
            return;
        };
        if index < 0 || index >= t.count || !t.value_type.drives_bindings() {
            return;
        }
        let slot = index as usize;
        let mut failures = Vec::new();

        let components = self.scene.components_mut(t.object);
        for property in &t.properties {
            let target = components
                .iter_mut()
                .find(|c| c.type_name() == property.target_type());
            match target {
                Some(c) => {
                    if let Err(e) = property.try_invoke(&mut **c, slot) {
                        error!("toggle {id:?}: property {} failed: {e}", property.key());
                        failures.push((property.key().to_string(), e.to_string()));
                    }
                }
                None => debug!(
                    "toggle {id:?}: no {} component for {}",
                    property.target_type(),
                    property.display_name()
                ),
            }
        }

        for call in t.actions.get(slot).into_iter().flatten() {
            let Some(object) = call.target else {
                continue;
            };
            let target = self
                .scene
                .component_by_name_mut(object, call.property.target_type());
            match target {
                Some(c) => {
                    if let Err(e) = call.property.try_invoke(c, 0) {
                        error!("toggle {id:?}: action {} failed: {e}", call.property.key());
                        failures.push((call.property.key().to_string(), e.to_string()));
                    }
                }
                None => debug!(
                    "toggle {id:?}: action target {object:?} has no {} component",
                    call.property.target_type()
                ),
            }
        }

        for (method_id, message) in failures {
            self.emit(ToggleEvent::InvocationFailed {
                toggle: id,
                method_id,
                message,
            });
        }
    }

    fn notify_value_changed(&mut self, id: ToggleId) {
        let Some(t) = self.toggles.get(&id) else {
            return;
        };
        let as_float = t.value_as_float();
        let boolean = t.boolean_value();
        let mut failures = Vec::new();

        for listener in &t.listeners {
            let (Some((kind, handle)), Some(object)) = (&listener.resolved, listener.target) else {
                continue;
            };
            let arg = match kind {
                ValueKind::Bool => Some(Value::Bool(boolean)),
                other => coerce(&Value::Float(as_float), *other),
            };
            let Some(arg) = arg else {
                failures.push((
                    listener.method_id.to_string(),
                    format!("no {kind} argument can be derived from a toggle value"),
                ));
                continue;
            };
            match self
                .scene
                .component_by_name_mut(object, listener.method_id.target_type())
            {
                Some(c) => {
                    if let Err(e) = handle(c, &arg) {
                        error!("toggle {id:?}: listener {} failed: {e}", listener.method_id);
                        failures.push((listener.method_id.to_string(), e.to_string()));
                    }
                }
                None => debug!(
                    "toggle {id:?}: listener target {object:?} has no {} component",
                    listener.method_id.target_type()
                ),
            }
        }

        let event = ToggleEvent::ValueChanged {
            toggle: id,
            object: t.object,
            value: t.value,
        };
        for (method_id, message) in failures {
            self.emit(ToggleEvent::InvocationFailed {
                toggle: id,
                method_id,
                message,
            });
        }
        self.emit(event);
    }

    /// Single-step advance: next index for Boolean/Index, next count for
    /// Count (wrapping through `count + 1` states), nothing for Flag.
    pub fn toggle(&mut self, id: ToggleId) {
        let Some(t) = self.get(id) else {
            return;
        };
        if t.count <= 0 {
            return;
        }
        match t.value_type {
            ValueType::Boolean | ValueType::Index => {
                let next = (t.index_value() + 1) % t.count;
                self.set_index_value(id, next);
            }
            ValueType::Count => {
                let next = (t.count_value() + 1) % (t.count + 1);
                self.set_count_value(id, next);
            }
            ValueType::Flag => {}
        }
    }

    /// Re-normalize the element count and fit every per-index collection to it,
    /// re-applying group exclusivity to grouped children recursively.
    pub fn refresh(&mut self, id: ToggleId) {
        let mut visited = HashSet::new();
        self.refresh_inner(id, &mut visited);
    }

    fn refresh_inner(&mut self, id: ToggleId, visited: &mut HashSet<ToggleId>) {
        if !visited.insert(id) {
            return;
        }
        let Some(t) = self.toggles.get_mut(&id) else {
            return;
        };
        t.count = normalized_count(t.value_type, t.count);
        let len = t.count as usize;

        let mut dropped = Vec::new();
        if !t.grouped.is_empty() {
            if t.grouped.len() > len {
                dropped.extend(t.grouped.drain(len..).flatten());
            }
            fit(&mut t.grouped, len, || None);
        }
        if !t.activate_objects.is_empty() {
            fit(&mut t.activate_objects, len, || None);
        }
        if !t.actions.is_empty() {
            fit(&mut t.actions, len, Vec::new);
        }
        fit(&mut t.comments, len, String::new);
        for property in &mut t.properties {
            property.resize(len);
        }
        let grouped: Vec<ToggleId> = t.grouped.iter().flatten().copied().collect();

        for d in dropped {
            if let Some(child) = self.toggles.get_mut(&d) {
                if child.group_parent == Some(id) {
                    child.group_parent = None;
                }
            }
        }
        for g in grouped {
            if g == id {
                continue;
            }
            let Some(child) = self.toggles.get_mut(&g) else {
                continue;
            };
            child.value_type = ValueType::Boolean;
            child.reset_value_on_init = false;
            child.synced.clear();
            self.set_group_parent(g, Some(id));
            self.refresh_inner(g, visited);
        }
    }

    // Relation graph

    /// Link `id` under `new_parent`, keeping the parent's children list in step.
    /// Linking a toggle to itself leaves its parent unchanged.
    pub fn set_parent(&mut self, id: ToggleId, new_parent: Option<ToggleId>) {
        let Some(current) = self.toggles.get(&id).map(|t| t.parent) else {
            return;
        };
        let new_parent = new_parent.filter(|p| self.toggles.contains_key(p));
        let mut parent = current;
        if current != new_parent && new_parent != Some(id) {
            if let Some(old) = current {
                if let Some(old_toggle) = self.toggles.get_mut(&old) {
                    old_toggle.children.retain(|c| *c != id);
                }
                self.prune_children(old);
            }
            if let Some(t) = self.toggles.get_mut(&id) {
                t.parent = new_parent;
            }
            parent = new_parent;
        }
        if let Some(p) = parent.and_then(|p| self.toggles.get_mut(&p)) {
            if !p.children.contains(&id) {
                p.children.push(id);
            }
        }
    }

    fn prune_children(&mut self, owner: ToggleId) {
        let Some(children) = self.toggles.get(&owner).map(|t| t.children.clone()) else {
            return;
        };
        let live: Vec<ToggleId> = children
            .into_iter()
            .filter(|c| self.toggles.contains_key(c))
            .collect();
        if let Some(t) = self.toggles.get_mut(&owner) {
            t.children = live;
        }
    }

    /// Re-discover the structural parent: the nearest ancestor object carrying
    /// a toggle, or none when the toggle ignores its parent.
    pub fn on_hierarchy_parent_changed(&mut self, id: ToggleId) {
        let Some(t) = self.toggles.get(&id) else {
            return;
        };
        let new_parent = if t.ignore_parent {
            None
        } else {
            self.scene
                .ancestors(t.object)
                .into_iter()
                .find_map(|o| self.by_object.get(&o).copied())
        };
        self.set_parent(id, new_parent);
    }

    pub fn set_ignore_parent(&mut self, id: ToggleId, ignore: bool) {
        let Some(t) = self.toggles.get_mut(&id) else {
            return;
        };
        if t.ignore_parent == ignore {
            return;
        }
        t.ignore_parent = ignore;
        self.on_hierarchy_parent_changed(id);
    }

    /// Returns false for self links, unknown toggles and duplicates.
    pub fn add_synced(&mut self, id: ToggleId, other: ToggleId) -> bool {
        if id == other || !self.toggles.contains_key(&other) {
            return false;
        }
        let Some(t) = self.toggles.get_mut(&id) else {
            return false;
        };
        if t.synced.contains(&Some(other)) {
            return false;
        }
        t.synced.push(Some(other));
        true
    }

    pub fn remove_synced(&mut self, id: ToggleId, other: ToggleId) -> bool {
        let Some(t) = self.toggles.get_mut(&id) else {
            return false;
        };
        let before = t.synced.len();
        t.synced.retain(|s| *s != Some(other));
        t.synced.len() != before
    }

    /// Grouping excludes structural parenting: a grouped toggle has no parent
    /// and ignores the hierarchy.
    pub fn set_group_parent(&mut self, id: ToggleId, owner: Option<ToggleId>) {
        if owner == Some(id) {
            return;
        }
        match owner {
            Some(owner) => {
                self.set_parent(id, None);
                if let Some(t) = self.toggles.get_mut(&id) {
                    t.ignore_parent = true;
                    t.group_parent = Some(owner);
                }
            }
            None => {
                if let Some(t) = self.toggles.get_mut(&id) {
                    t.group_parent = None;
                }
            }
        }
    }

    /// Replace the grouped slots of `owner` and refresh it. Toggles leaving
    /// the group are released.
    pub fn set_grouped_toggles(&mut self, owner: ToggleId, grouped: Vec<Option<ToggleId>>) {
        let Some(t) = self.toggles.get_mut(&owner) else {
            return;
        };
        let previous = std::mem::replace(&mut t.grouped, grouped);
        let current = t.grouped.clone();
        for p in previous.into_iter().flatten() {
            if current.contains(&Some(p)) {
                continue;
            }
            if let Some(child) = self.toggles.get_mut(&p) {
                if child.group_parent == Some(owner) {
                    child.group_parent = None;
                }
            }
        }
        self.refresh(owner);
    }

    /// Position of `id` among its group owner's slots, or -1. A group parent
    /// that no longer lists the toggle is cleared.
    pub fn index_in_group(&mut self, id: ToggleId) -> i32 {
        let Some(owner) = self.toggles.get(&id).and_then(|t| t.group_parent) else {
            return -1;
        };
        let position = self
            .toggles
            .get(&owner)
            .and_then(|o| o.grouped.iter().position(|g| *g == Some(id)));
        if let Some(i) = position {
            return i as i32;
        }
        if let Some(t) = self.toggles.get_mut(&id) {
            t.group_parent = None;
        }
        -1
    }

    pub fn parent(&self, id: ToggleId) -> Option<ToggleId> {
        self.get(id)
            .and_then(|t| t.parent)
            .filter(|p| self.toggles.contains_key(p))
    }

    pub fn children(&self, id: ToggleId) -> Vec<ToggleId> {
        self.get(id)
            .map(|t| {
                t.children
                    .iter()
                    .copied()
                    .filter(|c| self.toggles.contains_key(c))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn group_parent(&self, id: ToggleId) -> Option<ToggleId> {
        self.get(id)
            .and_then(|t| t.group_parent)
            .filter(|g| self.toggles.contains_key(g))
    }

    pub fn grouped_toggles(&self, id: ToggleId) -> Vec<Option<ToggleId>> {
        self.get(id).map(|t| t.grouped.clone()).unwrap_or_default()
    }

    pub fn synced_toggles(&self, id: ToggleId) -> Vec<ToggleId> {
        self.get(id)
            .map(|t| t.synced.iter().flatten().copied().collect())
            .unwrap_or_default()
    }

    // Bindings, actions, listeners

    /// Append a binding, sized to the toggle's element count.
    pub fn add_property(&mut self, id: ToggleId, mut property: Property) -> Result<(), WorldError> {
        let t = self
            .toggles
            .get_mut(&id)
            .ok_or(WorldError::UnknownToggle(id))?;
        property.resize(t.count.max(0) as usize);
        t.properties.push(property);
        Ok(())
    }

    /// Append a persistent call to the action of `index`.
    pub fn add_action(
        &mut self,
        id: ToggleId,
        index: usize,
        target: ObjectId,
        property: Property,
    ) -> Result<(), WorldError> {
        let t = self
            .toggles
            .get_mut(&id)
            .ok_or(WorldError::UnknownToggle(id))?;
        if index >= t.count.max(0) as usize {
            return Err(WorldError::SlotOutOfRange {
                index,
                count: t.count,
            });
        }
        if t.actions.len() < t.count as usize {
            t.actions.resize_with(t.count as usize, Vec::new);
        }
        t.actions[index].push(ToggleAction {
            target: Some(target),
            property,
        });
        Ok(())
    }

    /// Bind the active flag of `object` to bit `index`.
    pub fn set_activate_object(
        &mut self,
        id: ToggleId,
        index: usize,
        object: Option<ObjectId>,
    ) -> Result<(), WorldError> {
        let t = self
            .toggles
            .get_mut(&id)
            .ok_or(WorldError::UnknownToggle(id))?;
        if index >= t.count.max(0) as usize {
            return Err(WorldError::SlotOutOfRange {
                index,
                count: t.count,
            });
        }
        if t.activate_objects.len() < t.count as usize {
            t.activate_objects.resize(t.count as usize, None);
        }
        t.activate_objects[index] = object;
        Ok(())
    }

    pub fn set_comment(&mut self, id: ToggleId, index: usize, comment: &str) -> Result<(), WorldError> {
        let t = self
            .toggles
            .get_mut(&id)
            .ok_or(WorldError::UnknownToggle(id))?;
        let count = t.count;
        let slot = t
            .comments
            .get_mut(index)
            .ok_or(WorldError::SlotOutOfRange { index, count })?;
        *slot = comment.to_string();
        Ok(())
    }

    /// Subscribe `method_id` on `target` to value changes. The method must
    /// resolve against the registry.
    pub fn add_value_changed_listener(
        &mut self,
        id: ToggleId,
        target: ObjectId,
        method_id: MethodId,
    ) -> Result<(), WorldError> {
        let resolved = resolve_listener(&self.registry, &method_id)?;
        let t = self
            .toggles
            .get_mut(&id)
            .ok_or(WorldError::UnknownToggle(id))?;
        t.listeners.push(ValueChangedListener {
            target: Some(target),
            method_id,
            resolved: Some(resolved),
        });
        Ok(())
    }

    // Documents

    /// Load objects, style assets, styles and toggles. All toggles are created
    /// and linked, then refreshed, before any of them is woken up: waking one
    /// toggle may push values into the others.
    pub fn load_document(&mut self, doc: SceneDocument) -> Result<Vec<ToggleId>, WorldError> {
        for o in &doc.objects {
            self.insert_object(o.id, &o.name)?;
        }
        for o in &doc.objects {
            if o.parent.is_some() {
                self.scene.set_parent(o.id, o.parent)?;
            }
            self.scene.set_active(o.id, o.active);
            for c in &o.components {
                self.add_component_by_name(o.id, c)?;
            }
        }
        for asset in doc.style_assets {
            self.add_style_asset(asset);
        }
        for s in doc.styles {
            self.set_style(s.object, s.style)?;
        }

        let mut ids = Vec::with_capacity(doc.toggles.len());
        for record in &doc.toggles {
            ids.push(self.create_toggle(record)?);
        }
        for (id, record) in ids.iter().zip(&doc.toggles) {
            self.link_references(*id, record);
        }
        for id in &ids {
            self.refresh(*id);
        }
        for id in &ids {
            self.awake(*id);
        }
        Ok(ids)
    }

    pub fn load_document_json(&mut self, json: &str) -> Result<Vec<ToggleId>, WorldError> {
        let doc = SceneDocument::from_json(json)?;
        self.load_document(doc)
    }

    pub fn toggle_record(&self, id: ToggleId) -> Option<ToggleRecord> {
        let t = self.get(id)?;
        let object_of = |r: &Option<ToggleId>| r.and_then(|r| self.get(r)).map(|x| x.object);
        Some(ToggleRecord {
            object: t.object,
            value_type: t.value_type,
            count: t.count,
            value: t.value,
            reset_value_on_init: t.reset_value_on_init,
            ignore_parent: t.ignore_parent,
            synced: t.synced.iter().map(object_of).collect(),
            grouped: t.grouped.iter().map(object_of).collect(),
            activate_objects: t.activate_objects.clone(),
            comments: t.comments.clone(),
            actions: t
                .actions
                .iter()
                .map(|calls| {
                    calls
                        .iter()
                        .map(|a| ActionRecord {
                            target: a.target,
                            call: a.property.to_record(),
                        })
                        .collect()
                })
                .collect(),
            properties: t.properties.iter().map(Property::to_record).collect(),
            listeners: t
                .listeners
                .iter()
                .map(|l| ListenerRecord {
                    target: l.target,
                    method: l.method_id.clone(),
                })
                .collect(),
        })
    }

    /// Snapshot of the whole world in document form.
    pub fn to_document(&self) -> SceneDocument {
        let objects = self
            .scene
            .ids()
            .map(|id| ObjectRecord {
                id,
                name: self.scene.name(id).unwrap_or_default().to_string(),
                parent: self.scene.parent(id),
                active: self.scene.is_active_self(id),
                components: self
                    .scene
                    .components(id)
                    .iter()
                    .map(|c| c.type_name().to_string())
                    .collect(),
            })
            .collect();
        let style_assets = self
            .style_library
            .ids()
            .filter_map(|id| self.style_library.to_record(id))
            .collect();
        let mut styles: Vec<StyleRecord> = self
            .styles
            .iter()
            .map(|(object, style)| StyleRecord {
                object: *object,
                style: style.clone(),
            })
            .collect();
        styles.sort_by_key(|s| s.object);
        let toggles = self
            .toggle_ids()
            .into_iter()
            .filter_map(|id| self.toggle_record(id))
            .collect();
        SceneDocument {
            objects,
            style_assets,
            styles,
            toggles,
        }
    }

    // Outputs

    fn emit(&mut self, event: ToggleEvent) {
        if self.cfg.emit_events {
            self.outputs.push_event(event, self.cfg.max_events);
        }
    }

    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    pub fn drain_events(&mut self) -> Vec<ToggleEvent> {
        self.outputs.drain()
    }
}
