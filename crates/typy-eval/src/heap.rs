//! Object model: class descriptors and the instance arena.
//!
//! Instances live in a slot arena and are addressed by [`ObjectId`] handles,
//! so shared and cyclic object graphs need no ownership discipline.
//! Unreachable instances are reclaimed by [`Heap::collect_garbage`], a
//! mark-and-sweep pass over the arena from a caller-supplied root set.

use crate::error::{EvalError, EvalResult};
use crate::value::Value;
use std::collections::HashMap;
use std::rc::Rc;
use typy_types::ast::FunctionDef;

/// Handle to an instance in the arena. Equality is object identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(usize);

impl ObjectId {
    /// Returns the raw slot index.
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }

    #[cfg(test)]
    pub(crate) fn from_raw(index: usize) -> Self {
        Self(index)
    }
}

/// Index of a class in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(usize);

/// A declared field and the default copied into every new instance.
#[derive(Debug, Clone)]
pub struct FieldSlot {
    pub name: String,
    pub default: Value,
}

/// Immutable class template shared by all of its instances.
#[derive(Debug)]
pub struct ClassDescriptor {
    pub name: String,
    pub fields: Vec<FieldSlot>,
    methods: HashMap<String, Rc<FunctionDef>>,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>, fields: Vec<FieldSlot>, methods: Vec<FunctionDef>) -> Self {
        Self {
            name: name.into(),
            fields,
            methods: methods
                .into_iter()
                .map(|m| (m.name.name.clone(), Rc::new(m)))
                .collect(),
        }
    }

    /// Position of a field in every instance's field vector.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn method(&self, name: &str) -> Option<&Rc<FunctionDef>> {
        self.methods.get(name)
    }
}

/// A live object: its class and one value per declared field.
#[derive(Debug, Clone)]
pub struct Instance {
    pub class: ClassId,
    pub fields: Vec<Value>,
}

/// Class registry plus instance arena.
#[derive(Debug, Default)]
pub struct Heap {
    classes: Vec<Rc<ClassDescriptor>>,
    class_names: HashMap<String, ClassId>,
    entries: Vec<Option<Instance>>,
    free_list: Vec<ObjectId>,
    allocations_since_gc: usize,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Classes ─────────────────────────────────────────────────────────

    /// Register a class. A later definition with the same name replaces the
    /// earlier one for lookups; existing instances keep their descriptor.
    pub fn define_class(&mut self, class: ClassDescriptor) -> ClassId {
        let id = ClassId(self.classes.len());
        self.class_names.insert(class.name.clone(), id);
        self.classes.push(Rc::new(class));
        id
    }

    pub fn class_id(&self, name: &str) -> Option<ClassId> {
        self.class_names.get(name).copied()
    }

    pub fn class(&self, id: ClassId) -> &Rc<ClassDescriptor> {
        &self.classes[id.0]
    }

    // ── Instances ───────────────────────────────────────────────────────

    /// Allocate a new instance with its fields set to the class defaults.
    pub fn instantiate(&mut self, class: ClassId) -> ObjectId {
        let fields = self.classes[class.0]
            .fields
            .iter()
            .map(|f| f.default.clone())
            .collect();
        let instance = Instance { class, fields };
        self.allocations_since_gc += 1;
        if let Some(id) = self.free_list.pop() {
            self.entries[id.0] = Some(instance);
            id
        } else {
            self.entries.push(Some(instance));
            ObjectId(self.entries.len() - 1)
        }
    }

    pub fn instance(&self, id: ObjectId) -> EvalResult<&Instance> {
        self.entries
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or_else(|| dangling(id))
    }

    fn instance_mut(&mut self, id: ObjectId) -> EvalResult<&mut Instance> {
        self.entries
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or_else(|| dangling(id))
    }

    /// The class of a live instance.
    pub fn class_of(&self, id: ObjectId) -> EvalResult<&Rc<ClassDescriptor>> {
        let class = self.instance(id)?.class;
        Ok(self.class(class))
    }

    pub fn get_field(&self, id: ObjectId, name: &str) -> EvalResult<Value> {
        let instance = self.instance(id)?;
        let class = self.class(instance.class);
        let slot = class.field_index(name).ok_or_else(|| {
            EvalError::NoSuchField(format!("'{}' object has no field '{name}'", class.name))
        })?;
        Ok(instance.fields[slot].clone())
    }

    pub fn set_field(&mut self, id: ObjectId, name: &str, value: Value) -> EvalResult<()> {
        let class = self.class_of(id)?;
        let slot = class.field_index(name).ok_or_else(|| {
            EvalError::NoSuchField(format!("'{}' object has no field '{name}'", class.name))
        })?;
        self.instance_mut(id)?.fields[slot] = value;
        Ok(())
    }

    /// Look up `name` on the receiver's class.
    pub fn find_method(&self, id: ObjectId, name: &str) -> EvalResult<Rc<FunctionDef>> {
        let class = self.class_of(id)?;
        class.method(name).cloned().ok_or_else(|| {
            EvalError::NoSuchMethod(format!("'{}' object has no method '{name}'", class.name))
        })
    }

    // ── Reclamation ─────────────────────────────────────────────────────

    pub fn live_objects(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    /// Whether enough allocations happened since the last collection.
    pub fn should_collect(&self, threshold: usize) -> bool {
        self.allocations_since_gc >= threshold
    }

    /// Mark everything reachable from `roots`, free the rest.
    ///
    /// Every handle that can still be observed by the program must be in
    /// `roots` (directly or through a field); class field defaults are
    /// always roots. Returns the number of freed instances.
    pub fn collect_garbage(&mut self, roots: impl IntoIterator<Item = ObjectId>) -> usize {
        let mut reachable = vec![false; self.entries.len()];
        let mut work_list: Vec<ObjectId> = roots.into_iter().collect();
        // Field defaults are shared by every future instance.
        work_list.extend(
            self.classes
                .iter()
                .flat_map(|c| c.fields.iter())
                .filter_map(|f| match f.default {
                    Value::Object(id) => Some(id),
                    _ => None,
                }),
        );

        while let Some(id) = work_list.pop() {
            let idx = id.index();
            if idx >= reachable.len() || reachable[idx] {
                continue;
            }
            reachable[idx] = true;
            if let Some(Some(instance)) = self.entries.get(idx) {
                work_list.extend(instance.fields.iter().filter_map(|v| match v {
                    Value::Object(child) => Some(*child),
                    _ => None,
                }));
            }
        }

        let mut freed = 0;
        for (idx, entry) in self.entries.iter_mut().enumerate() {
            if !reachable[idx] && entry.take().is_some() {
                self.free_list.push(ObjectId(idx));
                freed += 1;
            }
        }
        self.allocations_since_gc = 0;
        freed
    }
}

fn dangling(id: ObjectId) -> EvalError {
    EvalError::NoneDereference(format!("reference to reclaimed object #{}", id.index()))
}
