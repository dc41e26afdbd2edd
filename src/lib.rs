//! # jvmhook
//!
//! Method hooking for the JVM in pure Rust.
//!
//! This crate intercepts calls to an already-loaded Java method and
//! redirects them to native code you supply, while keeping the original
//! implementation callable. It does so the way a debugger would not: the
//! live class is redefined with the hooked method rewritten as `native`
//! (its `Code` attribute removed), your function is bound with
//! `RegisterNatives`, and a renamed "shadow" copy of the pristine class is
//! defined alongside so the original bytecode stays invokable.
//!
//! ## Quick Start
//!
//! Build your agent crate as a `cdylib` and drive the engine from
//! `Agent_OnLoad` (or a thread you inject):
//!
//! ```rust,ignore
//! use jvmhook::prelude::*;
//!
//! static mut ORIGINAL_F: jni::jmethodID = std::ptr::null_mut();
//!
//! unsafe extern "system" fn hooked_f(
//!     env: *mut jni::JNIEnv,
//!     class: jni::jclass,
//!     x: jni::jint,
//! ) -> jni::jint {
//!     let jni = JniEnv::from_raw(env);
//!     let args = [jni::jvalue { i: x }];
//!     jni.call_static_int_method(class, ORIGINAL_F, &args) + 1
//! }
//!
//! unsafe fn install(vm: *mut jni::JavaVM, target: jni::jmethodID) -> Result<(), HookError> {
//!     let runtime = JvmtiRuntime::new(vm)?;
//!     let mut engine = HookEngine::new(runtime);
//!     ORIGINAL_F = engine.attach(target, hooked_f as NativeFn, std::ptr::null_mut())?;
//!     Ok(())
//! }
//! ```
//!
//! Detaching restores the remaining hook set; removing the last hook of a
//! class restores its pristine bytecode byte-for-byte. Dropping or
//! shutting down the engine restores every touched class.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                     Your Hook Code                       │
//! │      extern "system" fn hooked(...) -> jvalue kinds      │
//! ├─────────────────────────────────────────────────────────┤
//! │                 Hook Engine (engine module)              │
//! │   attach / detach / shutdown, suspension window,         │
//! │   shadow classes, rollback                               │
//! ├──────────────────────────────┬──────────────────────────┤
//! │   ClassFile Codec            │  Hook Table              │
//! │   parse / patch / serialize  │  hooks, pristine cache,  │
//! │   (classfile module)         │  shadows (table module)  │
//! ├──────────────────────────────┴──────────────────────────┤
//! │          Runtime trait (runtime module)                  │
//! │   JvmtiRuntime: JVMTI/JNI impl (jvmti_runtime module)    │
//! ├─────────────────────────────────────────────────────────┤
//! │     High-Level Wrappers: env::Jvmti, env::JniEnv         │
//! ├─────────────────────────────────────────────────────────┤
//! │     Raw FFI Bindings: sys::jni, sys::jvmti               │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`engine`] | `HookEngine`: attach, detach, shutdown |
//! | [`classfile`] | Byte-exact class file parse/serialize |
//! | [`table`] | Hook registrations, pristine cache, shadow registry |
//! | [`runtime`] | What the engine needs from the VM, as a trait |
//! | [`jvmti_runtime`] | The live-VM `Runtime` implementation |
//! | [`env`] | High-level `Jvmti` / `JniEnv` wrappers |
//! | [`sys`] | Raw JNI/JVMTI vtables |
//!
//! ## Hooked-method calling convention
//!
//! The function you attach is bound through `RegisterNatives`, so it must
//! follow the JNI native convention for the hooked method's descriptor:
//! `env` pointer, then the receiver (`jobject`) for instance methods or
//! the class (`jclass`) for static ones, then the declared arguments as
//! JNI types, returning the declared return type. Inside the hook, call
//! the handle `attach` returned (resolved against the shadow class) to run
//! the original implementation.
//!
//! ## Threading
//!
//! The attach/detach API is single-threaded by design: serialize calls
//! yourself. What the engine does guarantee is that no *runtime* thread
//! can observe a half-patched class: every other thread is suspended for
//! the patch→redefine→register window and resumed on every exit path.
//!
//! ## Logging
//!
//! The crate logs through the [`log`] facade (`debug!` for progress,
//! `warn!` for best-effort cleanup failures). Install whatever logger your
//! agent prefers before attaching.

pub mod sys;

pub mod env;

// Implementation modules (use `env` module for the wrapper API)
#[doc(hidden)]
pub mod jni_wrapper;
#[doc(hidden)]
pub mod jvmti_wrapper;

pub mod classfile;
pub mod engine;
pub mod error;
pub mod jvmti_runtime;
pub mod prelude;
pub mod runtime;
pub mod table;

pub use crate::engine::HookEngine;
pub use crate::error::HookError;
pub use crate::jvmti_runtime::JvmtiRuntime;
pub use crate::runtime::{NativeFn, Runtime};
