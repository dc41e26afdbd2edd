//! The hook engine: attach, detach, shutdown.
//!
//! Per method the engine moves through a small state machine
//! (`Unhooked -> Hooking -> Hooked -> Unhooking -> Unhooked`); a failure
//! mid-`Hooking`/`Unhooking` rolls the method back to `Unhooked`. The hook
//! table is only ever mutated inside a mutation window in which every other
//! runtime thread is suspended, so no thread can observe a torn class.
//!
//! Patching always starts from the cached pristine [`ClassFile`], never
//! from a previously patched copy, so unrelated hooks on the same class
//! cannot accumulate drift: each redefinition carries exactly the currently
//! active hook set and nothing else.

use std::os::raw::c_void;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, warn};

use crate::classfile::{AccessFlags, ClassFile, CpInfo, ATTR_CODE, ATTR_SOURCE_FILE};
use crate::error::HookError;
use crate::runtime::{NativeFn, Runtime};
use crate::table::{HookRegistration, HookTable, ShadowClass};

/// Suspends every runtime thread except the caller and resumes exactly the
/// suspended set when dropped, on every exit path. Replaces manual
/// suspend/resume bookkeeping with scoped acquisition: a thread is never
/// resumed twice and never left suspended behind an early error return.
struct SuspendGuard<'a, R: Runtime> {
    runtime: &'a R,
    suspended: Vec<R::Thread>,
}

impl<'a, R: Runtime> SuspendGuard<'a, R> {
    fn suspend_all(runtime: &'a R) -> Result<Self, HookError> {
        let current = runtime.current_thread()?;
        let threads = runtime.all_threads()?;
        let mut suspended = Vec::with_capacity(threads.len());
        for thread in threads {
            if runtime.is_same_thread(thread, current) {
                continue;
            }
            match runtime.suspend_thread(thread) {
                Ok(()) => suspended.push(thread),
                // A thread that exits between enumeration and suspension is
                // not an error; it cannot observe the mutation either.
                Err(err) => debug!("thread refused suspension: {err}"),
            }
        }
        Ok(Self { runtime, suspended })
    }
}

impl<R: Runtime> Drop for SuspendGuard<'_, R> {
    fn drop(&mut self) {
        for &thread in &self.suspended {
            if let Err(err) = self.runtime.resume_thread(thread) {
                warn!("failed to resume suspended thread: {err}");
            }
        }
    }
}

/// The dynamic-instrumentation engine.
///
/// One engine owns one [`HookTable`] and one runtime connection. The
/// attach/detach API itself is single-threaded by design; what is made safe
/// against concurrency is the *runtime*'s threads observing a mutation,
/// via the suspension window.
pub struct HookEngine<R: Runtime> {
    runtime: R,
    table: HookTable<R::Class>,
    shadow_seq: u64,
    initialized: bool,
}

impl<R: Runtime> HookEngine<R> {
    /// Wraps an initialized runtime connection. For the JVMTI runtime the
    /// fallible part (capabilities, callbacks) happens in
    /// [`crate::jvmti_runtime::JvmtiRuntime::new`].
    pub fn new(runtime: R) -> Self {
        Self {
            runtime,
            table: HookTable::new(),
            shadow_seq: 0,
            initialized: true,
        }
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// The shadow ("original") class handle for a hooked class, if one has
    /// been defined.
    pub fn original_class(&self, class_name: &str) -> Option<R::Class> {
        self.table.shadow(class_name).map(|s| s.handle)
    }

    /// The opaque argument registered with a hook, for dispatch glue.
    pub fn hook_argument(&self, class_name: &str, name: &str, descriptor: &str) -> Option<*mut c_void> {
        self.table
            .hooks_for(class_name)
            .iter()
            .find(|h| h.method.matches(name, descriptor))
            .map(|h| h.user_data)
    }

    /// Redirects `method` to `native_fn` and returns a handle to the
    /// original implementation, resolved from the class's shadow copy.
    ///
    /// `user_data` is stored with the registration and surfaced through
    /// [`HookEngine::hook_argument`].
    pub fn attach(
        &mut self,
        method: R::Method,
        native_fn: NativeFn,
        user_data: *mut c_void,
    ) -> Result<R::Method, HookError> {
        if !self.initialized {
            return Err(HookError::Uninitialized);
        }

        let class = self.runtime.method_declaring_class(method)?;
        let class_name = self.runtime.class_name(class)?;
        let identity = self.runtime.method_identity(method)?;
        debug!("attach {}.{}{}", class_name, identity.name, identity.descriptor);

        let registration = HookRegistration {
            method: identity.clone(),
            native_fn,
            user_data,
        };

        if self.table.classfile(&class_name).is_none() {
            self.cache_classfile(class, &class_name, &registration)?;
        }

        if self.table.shadow(&class_name).is_none() {
            self.define_shadow(class, &class_name)?;
        }

        // Resolve the original before mutating anything; resolution is the
        // last fallible step that cannot be rolled back cheaply.
        let shadow_class = self
            .table
            .shadow(&class_name)
            .ok_or(HookError::ClassCache)?
            .handle;
        let original = self.runtime.resolve_method(
            shadow_class,
            &identity.name,
            &identity.descriptor,
            identity.is_static(),
        )?;

        let guard = SuspendGuard::suspend_all(&self.runtime)?;

        self.table.add_hook(&class_name, registration);
        if let Err(err) = self.reapply_class(class, &class_name) {
            self.table.pop_hook(&class_name);
            return Err(err);
        }

        if let Err(err) =
            self.runtime
                .register_native(class, &identity.name, &identity.descriptor, native_fn)
        {
            self.table.pop_hook(&class_name);
            // Put the live class back in its previous state; the reduced
            // hook set is exactly what was active before this attach.
            if let Err(restore) = self.reapply_class(class, &class_name) {
                warn!("rollback redefinition failed for {class_name}: {restore}");
            }
            return Err(err);
        }

        drop(guard);
        Ok(original)
    }

    /// Removes the hook for `method` and restores the class's remaining
    /// hook set. Detaching a method that is not hooked is a no-op success.
    /// When the last hook goes, the live class reverts byte-for-byte to its
    /// pristine bytecode.
    pub fn detach(&mut self, method: R::Method) -> Result<(), HookError> {
        if !self.initialized {
            return Err(HookError::Uninitialized);
        }

        let class = self.runtime.method_declaring_class(method)?;
        let class_name = self.runtime.class_name(class)?;
        if !self.table.has_hooks(&class_name) {
            return Ok(());
        }
        let identity = self.runtime.method_identity(method)?;
        debug!("detach {}.{}{}", class_name, identity.name, identity.descriptor);

        // Suspend symmetrically with attach; redefinition tears method
        // metadata either way.
        let guard = SuspendGuard::suspend_all(&self.runtime)?;

        let removed =
            match self
                .table
                .remove_hook(&class_name, &identity.name, &identity.descriptor)
            {
                Some(removed) => removed,
                None => return Ok(()),
            };

        if let Err(err) = self.reapply_class(class, &class_name) {
            // Keep table and live class consistent: the hook is still
            // applied, so its registration stays.
            self.table.add_hook(&class_name, removed);
            return Err(err);
        }

        drop(guard);
        Ok(())
    }

    /// Restores every touched class to its pristine bytecode and drains all
    /// registries. Shadow classes are forgotten, not unloaded; the runtime
    /// cannot unload a defined class, so their handles simply live until
    /// process exit.
    pub fn shutdown(&mut self) -> Result<(), HookError> {
        if !self.initialized {
            return Err(HookError::Uninitialized);
        }

        for class_name in self.table.cached_classes() {
            self.table.clear_hooks(&class_name);

            let Some(class) = self.runtime.find_class(&class_name) else {
                continue;
            };
            // Reapplying with an empty hook set is a byte-for-byte restore.
            if let Err(err) = self.reapply_class(class, &class_name) {
                warn!("failed to restore {class_name} at shutdown: {err}");
            }
        }

        self.table.clear();

        if let Err(err) = self.runtime.set_load_hook_enabled(false) {
            warn!("failed to disable class load hook at shutdown: {err}");
        }
        self.runtime.teardown()?;
        self.initialized = false;
        Ok(())
    }

    /// Forces the runtime to hand over the class's true bytes by
    /// retransforming it while the reload sink is armed. The pending hook
    /// is registered only for the duration of the call: the sink ignores
    /// classes without registrations, but a registration left behind after
    /// a failed attach would patch the class on the next attach without a
    /// native implementation bound, which the VM punishes with
    /// `UnsatisfiedLinkError`.
    fn cache_classfile(
        &mut self,
        class: R::Class,
        class_name: &str,
        pending: &HookRegistration,
    ) -> Result<(), HookError> {
        self.runtime.set_load_hook_enabled(true)?;
        self.table.add_hook(class_name, pending.clone());

        let Self { runtime, table, .. } = self;
        let result = runtime.retransform_class(class, &mut |name, bytes| {
            if !table.has_hooks(name) || table.classfile(name).is_some() {
                return;
            }
            match ClassFile::parse(bytes) {
                Ok(classfile) => table.cache_classfile(name, classfile),
                Err(err) => warn!("ignoring undecodable bytes for {name}: {err}"),
            }
        });

        self.table.pop_hook(class_name);
        // Leaving the hook notification enabled breaks DefineClass for the
        // shadow step, so it stays on only while a retransform is pending.
        self.runtime.set_load_hook_enabled(false)?;
        result?;

        if self.table.classfile(class_name).is_none() {
            return Err(HookError::ClassCache);
        }
        Ok(())
    }

    /// Builds and defines the class's shadow copy: the pristine class file,
    /// renamed to a fresh name, loaded under the original class's loader.
    fn define_shadow(&mut self, class: R::Class, class_name: &str) -> Result<(), HookError> {
        let mut copy = self
            .table
            .classfile(class_name)
            .ok_or(HookError::ClassCache)?
            .clone();

        let shadow_name = self.fresh_shadow_name(class_name);
        rename_class(&mut copy, class_name, &shadow_name)?;
        finalize_shadow_methods(&mut copy);

        let bytes = copy.serialize();
        let handle = self.runtime.define_class(&shadow_name, class, &bytes)?;
        debug!("defined shadow class {shadow_name}");

        self.table.insert_shadow(
            class_name,
            ShadowClass { handle, name: shadow_name },
        );
        Ok(())
    }

    /// Patches the pristine class file with the class's currently active
    /// hook set and redefines the live class in one call, so all of a
    /// class's hooks flip atomically and there is never an intermediate
    /// state with only some of them applied.
    fn reapply_class(&self, class: R::Class, class_name: &str) -> Result<(), HookError> {
        let pristine = self
            .table
            .classfile(class_name)
            .ok_or(HookError::ClassCache)?;
        let mut patched = pristine.clone();
        patch_class(&mut patched, self.table.hooks_for(class_name));
        self.runtime.redefine_class(class, &patched.serialize())
    }

    /// Collision-free alternate name for the shadow copy.
    fn fresh_shadow_name(&mut self, class_name: &str) -> String {
        self.shadow_seq += 1;
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        format!("{class_name}$hk{}_{nanos:x}", self.shadow_seq)
    }
}

impl<R: Runtime> Drop for HookEngine<R> {
    fn drop(&mut self) {
        if self.initialized {
            if let Err(err) = self.shutdown() {
                warn!("engine shutdown on drop failed: {err}");
            }
        }
    }
}

/// Rewrites every method matching an active registration: `NATIVE` is set
/// and the `Code` attribute removed, leaving every other method and
/// attribute byte-identical to the pristine copy.
fn patch_class(classfile: &mut ClassFile, hooks: &[HookRegistration]) {
    let cp = &classfile.constant_pool;
    for method in classfile.methods.iter_mut() {
        let name = match cp.utf8_at(method.name_index) {
            Ok(name) => name,
            Err(_) => continue,
        };
        let descriptor = match cp.utf8_at(method.descriptor_index) {
            Ok(descriptor) => descriptor,
            Err(_) => continue,
        };
        if !hooks.iter().any(|h| h.method.matches(name, descriptor)) {
            continue;
        }

        method.access_flags |= AccessFlags::NATIVE;
        method
            .attributes
            .retain(|attr| cp.utf8_at(attr.name_index).map_or(true, |n| n != ATTR_CODE));
    }
}

/// Gives the shadow copy a new identity: every Utf8 constant equal to the
/// old name, every `L<old>;`/`L<old>$` occurrence inside NameAndType
/// descriptors, and the SourceFile attribute's target.
fn rename_class(classfile: &mut ClassFile, old: &str, new: &str) -> Result<(), HookError> {
    let mut exact = Vec::new();
    let mut descriptor_indices = Vec::new();
    for (index, entry) in classfile.constant_pool.iter() {
        match entry {
            CpInfo::Utf8(bytes) if bytes.as_slice() == old.as_bytes() => exact.push(index),
            CpInfo::NameAndType { descriptor_index, .. } => {
                descriptor_indices.push(*descriptor_index)
            }
            _ => {}
        }
    }

    for index in exact {
        classfile
            .constant_pool
            .set_utf8(index, new.as_bytes().to_vec())?;
    }

    // Inner/nested type references embed the class name inside descriptor
    // strings rather than naming it outright.
    for index in descriptor_indices {
        let rewritten = match classfile.constant_pool.utf8_at(index) {
            Ok(descriptor) => {
                let r = rewrite_descriptor(descriptor, old, new);
                if r == descriptor {
                    None
                } else {
                    Some(r)
                }
            }
            Err(_) => None,
        };
        if let Some(descriptor) = rewritten {
            classfile.constant_pool.set_utf8(index, descriptor.into_bytes())?;
        }
    }

    rewrite_source_file(classfile, new)?;
    Ok(())
}

fn rewrite_descriptor(descriptor: &str, old: &str, new: &str) -> String {
    descriptor
        .replace(&format!("L{old};"), &format!("L{new};"))
        .replace(&format!("L{old}$"), &format!("L{new}$"))
}

/// Points the SourceFile attribute at the shadow's name. Some compilers
/// emit a degenerate attribute whose payload equals its own name index;
/// that case is left alone.
fn rewrite_source_file(classfile: &mut ClassFile, new: &str) -> Result<(), HookError> {
    let mut target = None;
    for attr in &classfile.attributes {
        let is_source_file = classfile
            .constant_pool
            .utf8_at(attr.name_index)
            .map_or(false, |n| n == ATTR_SOURCE_FILE);
        if !is_source_file || attr.info.len() != 2 {
            continue;
        }
        let index = u16::from_be_bytes([attr.info[0], attr.info[1]]);
        if index == attr.name_index {
            continue;
        }
        target = Some(index);
        break;
    }

    if let Some(index) = target {
        let simple = new.rsplit('/').next().unwrap_or(new);
        classfile
            .constant_pool
            .set_utf8(index, format!("{simple}.java").into_bytes())?;
    }
    Ok(())
}

/// Marks the shadow's methods final (constructors and the class initializer
/// excepted), mirroring what the live class can no longer guarantee once
/// its own methods are rewritten.
fn finalize_shadow_methods(classfile: &mut ClassFile) {
    let cp = &classfile.constant_pool;
    for method in classfile.methods.iter_mut() {
        let name = match cp.utf8_at(method.name_index) {
            Ok(name) => name,
            Err(_) => continue,
        };
        if name == "<init>" || name == "<clinit>" {
            continue;
        }
        method.access_flags |= AccessFlags::FINAL;
    }
}
