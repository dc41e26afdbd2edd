//! High-level environment wrappers for JVMTI and JNI.
//!
//! [`Jvmti`] wraps the JVMTI environment: capabilities, the class file load
//! hook, thread suspension, identity queries and class redefinition.
//! [`JniEnv`] wraps the JNI environment: class definition and lookup,
//! method resolution, native registration, exceptions, references and the
//! `jvalue`-array call family.
//!
//! Hook callbacks receive a raw `*mut jni::JNIEnv` from the VM; wrap it
//! with [`JniEnv::from_raw`] to call the original implementation through
//! the handle returned by attach:
//!
//! ```rust,ignore
//! use jvmhook::env::JniEnv;
//! use jvmhook::sys::jni;
//!
//! unsafe extern "system" fn hooked_f(
//!     env: *mut jni::JNIEnv,
//!     class: jni::jclass,
//!     x: jni::jint,
//! ) -> jni::jint {
//!     let jni = JniEnv::from_raw(env);
//!     let args = [jni::jvalue { i: x }];
//!     // ORIGINAL_F was returned by HookEngine::attach
//!     jni.call_static_int_method(class, ORIGINAL_F, &args) * 2
//! }
//! ```
//!
//! `LocalRef`/`GlobalRef` are RAII guards that delete their reference when
//! dropped.

// Re-export the JVMTI wrapper
mod jvmti_impl {
    pub use crate::jvmti_wrapper::Jvmti;
}

// Re-export the JNI wrapper
mod jni_impl {
    pub use crate::jni_wrapper::{GlobalRef, JniEnv, LocalRef};
}

pub use jni_impl::{GlobalRef, JniEnv, LocalRef};
pub use jvmti_impl::Jvmti;
