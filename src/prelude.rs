//! Common imports for building hooks.
//!
//! This prelude is intentionally small. It covers the types most hook
//! agents use while avoiding over-broad re-exports.

pub use crate::classfile::{AccessFlags, ClassFile, CpInfo, FormatError};
pub use crate::engine::HookEngine;
pub use crate::env::{GlobalRef, JniEnv, Jvmti, LocalRef};
pub use crate::error::HookError;
pub use crate::jvmti_runtime::JvmtiRuntime;
pub use crate::runtime::{NativeFn, Runtime};
pub use crate::sys::{jni, jvmti};
pub use crate::table::{HookRegistration, MethodIdentity};
