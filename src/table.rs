//! The hook table: hook registrations, pristine class file cache, and
//! shadow class registry.
//!
//! Pure in-memory state, no I/O, and deliberately not synchronized: the
//! engine serializes access, and during a mutation window every other
//! runtime thread is suspended (see the engine module). Keys are class
//! names in internal form (`java/lang/String`); methods are keyed by
//! name + descriptor, never by raw handle, because redefinition changes
//! handle identity but not logical identity.

use std::collections::HashMap;
use std::os::raw::c_void;

use crate::classfile::{AccessFlags, ClassFile};
use crate::runtime::NativeFn;

/// Logical identity of a method, captured once at resolve time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodIdentity {
    pub name: String,
    pub descriptor: String,
    pub access_flags: AccessFlags,
}

impl MethodIdentity {
    pub fn is_static(&self) -> bool {
        self.access_flags.contains(AccessFlags::STATIC)
    }

    /// Identity match is name + descriptor; access flags are carried along
    /// but do not participate.
    pub fn matches(&self, name: &str, descriptor: &str) -> bool {
        self.name == name && self.descriptor == descriptor
    }
}

/// One active hook: method identity, the native redirect, and an opaque
/// argument the dispatch glue hands back to the callback.
#[derive(Debug, Clone)]
pub struct HookRegistration {
    pub method: MethodIdentity,
    pub native_fn: NativeFn,
    pub user_data: *mut c_void,
}

/// A renamed copy of a class loaded separately into the runtime, kept so
/// the unmodified implementation stays callable after the live class has
/// been patched.
#[derive(Debug, Clone)]
pub struct ShadowClass<C> {
    pub handle: C,
    pub name: String,
}

/// Process-wide registry behind the engine's init/shutdown lifecycle.
///
/// Generic over the runtime's class handle type so it can be exercised
/// without a live JVM.
#[derive(Debug)]
pub struct HookTable<C> {
    hooks: HashMap<String, Vec<HookRegistration>>,
    classfiles: HashMap<String, ClassFile>,
    shadows: HashMap<String, ShadowClass<C>>,
}

impl<C> Default for HookTable<C> {
    fn default() -> Self {
        Self {
            hooks: HashMap::new(),
            classfiles: HashMap::new(),
            shadows: HashMap::new(),
        }
    }
}

impl<C> HookTable<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a registration to the class's hook list (insertion order).
    pub fn add_hook(&mut self, class_name: &str, registration: HookRegistration) {
        self.hooks
            .entry(class_name.to_string())
            .or_default()
            .push(registration);
    }

    /// Removes and returns the most recently added registration. Used to
    /// roll back a registration that is not reflected in the live class.
    pub fn pop_hook(&mut self, class_name: &str) -> Option<HookRegistration> {
        self.hooks.get_mut(class_name)?.pop()
    }

    /// Removes the first registration whose method identity matches
    /// name + descriptor. Callback identity never participates.
    pub fn remove_hook(
        &mut self,
        class_name: &str,
        name: &str,
        descriptor: &str,
    ) -> Option<HookRegistration> {
        let list = self.hooks.get_mut(class_name)?;
        let pos = list.iter().position(|h| h.method.matches(name, descriptor))?;
        Some(list.remove(pos))
    }

    pub fn hooks_for(&self, class_name: &str) -> &[HookRegistration] {
        self.hooks.get(class_name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_hooks(&self, class_name: &str) -> bool {
        !self.hooks_for(class_name).is_empty()
    }

    pub fn clear_hooks(&mut self, class_name: &str) {
        if let Some(list) = self.hooks.get_mut(class_name) {
            list.clear();
        }
    }

    /// The pristine parsed class file, cached on first reload delivery and
    /// never mutated afterwards.
    pub fn classfile(&self, class_name: &str) -> Option<&ClassFile> {
        self.classfiles.get(class_name)
    }

    /// First write wins: a later delivery for an already-cached class is
    /// ignored, so the cache always holds the original bytes.
    pub fn cache_classfile(&mut self, class_name: &str, classfile: ClassFile) {
        self.classfiles
            .entry(class_name.to_string())
            .or_insert(classfile);
    }

    /// Class names with a cached pristine class file.
    pub fn cached_classes(&self) -> Vec<String> {
        self.classfiles.keys().cloned().collect()
    }

    pub fn shadow(&self, class_name: &str) -> Option<&ShadowClass<C>> {
        self.shadows.get(class_name)
    }

    pub fn insert_shadow(&mut self, class_name: &str, shadow: ShadowClass<C>) {
        self.shadows.entry(class_name.to_string()).or_insert(shadow);
    }

    /// Drains every registry. Shadow class handles are dropped, not
    /// unloaded; the runtime offers no way to unload a defined class.
    pub fn clear(&mut self) {
        self.hooks.clear();
        self.classfiles.clear();
        self.shadows.clear();
    }
}
