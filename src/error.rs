//! Error taxonomy for hook operations.

use thiserror::Error;

use crate::classfile::FormatError;

/// Failure of an engine operation. Every variant is terminal for the
/// operation that produced it: partially-applied state has already been
/// rolled back by the time the error is returned, and nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HookError {
    /// The class bytes delivered by the VM could not be parsed, or a
    /// patched class could not be resolved against its constant pool.
    #[error("malformed class file: {0}")]
    Format(#[from] FormatError),

    /// Method or class identity lookup failed.
    #[error("failed to resolve method or class identity")]
    Resolve,

    /// Forcing a class reload did not populate the class file cache.
    #[error("class reload did not populate the class file cache")]
    ClassCache,

    /// A JVMTI operation (capability request, retransform, redefine,
    /// suspend) failed with the given JVMTI error code.
    #[error("JVMTI operation failed with error {0}")]
    Jvmti(u32),

    /// A JNI operation (class definition, native registration) failed with
    /// the given JNI return code.
    #[error("JNI operation failed with code {0}")]
    Jni(i32),

    /// The runtime raised a Java exception during a collaborator call. The
    /// exception has been cleared before this error is returned.
    #[error("the runtime raised a Java exception")]
    JavaException,

    /// The engine has been shut down (or was never initialized).
    #[error("hook engine is not initialized")]
    Uninitialized,
}
