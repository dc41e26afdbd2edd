//! Raw FFI bindings to JNI and JVMTI.
//!
//! These are hand-maintained vtable definitions matched against the JDK
//! headers. Only the functions this crate actually calls are typed; every
//! other slot is kept as a reserved pointer so the struct layout stays
//! byte-compatible with the JVM's tables.

pub mod jni;
pub mod jvmti;
