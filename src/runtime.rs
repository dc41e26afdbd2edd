//! The runtime collaborator interface.
//!
//! The hook engine never talks to JVMTI or JNI directly; everything it
//! needs from the host VM goes through this trait. The production
//! implementation is [`crate::jvmti_runtime::JvmtiRuntime`]; tests drive
//! the engine with an in-process mock instead of a live JVM.
//!
//! Handle types are opaque and `Copy` (in the JVMTI implementation they are
//! `jclass`/`jmethodID`/`jthread` pointers). Handles must not be used as
//! logical identity: redefining a class invalidates method handles without
//! changing the method's (class, name, descriptor) identity, which is why
//! the engine keys everything by name instead.

use crate::error::HookError;
use crate::table::MethodIdentity;

/// The native redirect registered for a hooked method. The pointed-to
/// function must match the JNI calling convention for the hooked method's
/// signature (`extern "system" fn(env, this_or_class, args...)`).
pub type NativeFn = *const std::os::raw::c_void;

/// Receives the class name (internal form) and raw class bytes the VM
/// delivers while a retransformation is in flight. The sink may ignore a
/// delivery; it must not assume it is called exactly once.
pub type ReloadSink<'a> = dyn FnMut(&str, &[u8]) + 'a;

/// What the engine requires from the host VM.
pub trait Runtime {
    type Class: Copy;
    type Method: Copy;
    type Thread: Copy;

    // --- Identity resolution ---

    fn method_declaring_class(&self, method: Self::Method) -> Result<Self::Class, HookError>;

    /// Internal-form name (`java/lang/String`) of a class.
    fn class_name(&self, class: Self::Class) -> Result<String, HookError>;

    fn method_identity(&self, method: Self::Method) -> Result<MethodIdentity, HookError>;

    /// Looks up a live class by internal name. `None` when the class is
    /// not findable (any pending exception is cleared, not propagated).
    fn find_class(&self, class_name: &str) -> Option<Self::Class>;

    // --- Class reload and redefinition ---

    /// Enables or disables delivery of class bytes to the reload sink.
    fn set_load_hook_enabled(&self, enabled: bool) -> Result<(), HookError>;

    /// Forces the VM to re-run the load pipeline for `class`, delivering
    /// the class's true current bytes to `sink`.
    fn retransform_class(
        &self,
        class: Self::Class,
        sink: &mut ReloadSink<'_>,
    ) -> Result<(), HookError>;

    /// Replaces a loaded class's bytecode in place.
    fn redefine_class(&self, class: Self::Class, bytes: &[u8]) -> Result<(), HookError>;

    /// Defines a new class from bytes under the same loader as
    /// `loader_of`. The returned handle must stay valid until shutdown.
    fn define_class(
        &self,
        class_name: &str,
        loader_of: Self::Class,
        bytes: &[u8],
    ) -> Result<Self::Class, HookError>;

    // --- Method resolution and native registration ---

    /// Resolves a method on `class` by name + descriptor. A Java exception
    /// raised during resolution is cleared and reported as
    /// [`HookError::JavaException`].
    fn resolve_method(
        &self,
        class: Self::Class,
        name: &str,
        descriptor: &str,
        is_static: bool,
    ) -> Result<Self::Method, HookError>;

    /// Registers `native_fn` as the implementation the VM binds for the
    /// named native method of `class`.
    fn register_native(
        &self,
        class: Self::Class,
        name: &str,
        descriptor: &str,
        native_fn: NativeFn,
    ) -> Result<(), HookError>;

    // --- Threads ---

    fn current_thread(&self) -> Result<Self::Thread, HookError>;
    fn all_threads(&self) -> Result<Vec<Self::Thread>, HookError>;
    fn is_same_thread(&self, a: Self::Thread, b: Self::Thread) -> bool;
    fn suspend_thread(&self, thread: Self::Thread) -> Result<(), HookError>;
    fn resume_thread(&self, thread: Self::Thread) -> Result<(), HookError>;

    // --- Lifecycle ---

    /// Called once by engine shutdown, after every class has been restored
    /// and the load hook disabled. Unregisters callbacks.
    fn teardown(&self) -> Result<(), HookError> {
        Ok(())
    }
}
