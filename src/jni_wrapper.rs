//! Safe wrapper around the JNI environment.
//!
//! Covers the slice of JNI the hook engine needs: class definition and
//! lookup, method resolution, native-method registration, exception
//! handling, references, and the `jvalue`-array call family a hook
//! callback uses to invoke the original implementation.
//!
//! # Example
//!
//! ```rust,ignore
//! use jvmhook::env::JniEnv;
//! use jvmhook::sys::jni;
//!
//! fn check(env: *mut jni::JNIEnv) {
//!     let jni = unsafe { JniEnv::from_raw(env) };
//!     if jni.exception_check() {
//!         jni.exception_describe();
//!         jni.exception_clear();
//!     }
//! }
//! ```

use crate::sys::jni;
use std::ffi::{CStr, CString};

/// Safe wrapper around a JNI environment pointer.
///
/// # Thread Safety
///
/// A `JniEnv` is tied to a specific thread and cannot be sent across
/// threads. Each JVM thread has its own JNI environment.
pub struct JniEnv {
    env: *mut jni::JNIEnv,
}

impl JniEnv {
    /// Creates a JniEnv wrapper from a raw pointer.
    ///
    /// # Safety
    ///
    /// The caller must ensure the pointer is valid and comes from the
    /// current thread.
    pub unsafe fn from_raw(env: *mut jni::JNIEnv) -> Self {
        JniEnv { env }
    }

    /// Obtains the current thread's JNI environment from the VM.
    pub fn from_vm(vm: *mut jni::JavaVM) -> Result<Self, jni::jint> {
        let mut env_ptr: *mut std::ffi::c_void = std::ptr::null_mut();
        unsafe {
            let get_env_fn = (**vm).GetEnv;
            let res = get_env_fn(vm, &mut env_ptr, jni::JNI_VERSION_1_8);
            if res != jni::JNI_OK {
                return Err(res);
            }
        }
        Ok(JniEnv { env: env_ptr as *mut jni::JNIEnv })
    }

    /// Returns the raw JNI environment pointer.
    pub fn raw(&self) -> *mut jni::JNIEnv {
        self.env
    }

    // =========================================================================
    // Class Operations
    // =========================================================================

    /// Finds a class by its fully qualified name ('/' separated).
    pub fn find_class(&self, name: &str) -> Option<jni::jclass> {
        let c_name = CString::new(name).ok()?;
        unsafe {
            let vtable = *self.env;
            let cls = ((*vtable).FindClass)(self.env, c_name.as_ptr());
            if cls.is_null() { None } else { Some(cls) }
        }
    }

    /// Defines a new class from raw class bytes under the given loader.
    /// Returns `None` when the VM rejects the definition (a pending
    /// exception is left for the caller to inspect).
    pub fn define_class(&self, name: &str, loader: jni::jobject, bytes: &[u8]) -> Option<jni::jclass> {
        let c_name = CString::new(name).ok()?;
        unsafe {
            let vtable = *self.env;
            let cls = ((*vtable).DefineClass)(
                self.env,
                c_name.as_ptr(),
                loader,
                bytes.as_ptr() as *const jni::jbyte,
                bytes.len() as jni::jsize,
            );
            if cls.is_null() { None } else { Some(cls) }
        }
    }

    /// Gets the class of an object.
    pub fn get_object_class(&self, obj: jni::jobject) -> jni::jclass {
        unsafe {
            let vtable = *self.env;
            ((*vtable).GetObjectClass)(self.env, obj)
        }
    }

    // =========================================================================
    // Exception Handling
    // =========================================================================

    /// Checks if an exception is pending.
    pub fn exception_check(&self) -> bool {
        unsafe {
            let vtable = *self.env;
            ((*vtable).ExceptionCheck)(self.env) != 0
        }
    }

    /// Clears any pending exception.
    pub fn exception_clear(&self) {
        unsafe {
            let vtable = *self.env;
            ((*vtable).ExceptionClear)(self.env)
        }
    }

    /// Prints the pending exception and stack trace to stderr.
    pub fn exception_describe(&self) {
        unsafe {
            let vtable = *self.env;
            ((*vtable).ExceptionDescribe)(self.env)
        }
    }

    /// Returns the pending exception, if any.
    pub fn exception_occurred(&self) -> Option<jni::jthrowable> {
        unsafe {
            let vtable = *self.env;
            let exc = ((*vtable).ExceptionOccurred)(self.env);
            if exc.is_null() { None } else { Some(exc) }
        }
    }

    // =========================================================================
    // References
    // =========================================================================

    pub fn new_global_ref(&self, obj: jni::jobject) -> jni::jobject {
        unsafe {
            let vtable = *self.env;
            ((*vtable).NewGlobalRef)(self.env, obj)
        }
    }

    pub fn delete_global_ref(&self, obj: jni::jobject) {
        unsafe {
            let vtable = *self.env;
            ((*vtable).DeleteGlobalRef)(self.env, obj)
        }
    }

    pub fn delete_local_ref(&self, obj: jni::jobject) {
        unsafe {
            let vtable = *self.env;
            ((*vtable).DeleteLocalRef)(self.env, obj)
        }
    }

    pub fn is_same_object(&self, ref1: jni::jobject, ref2: jni::jobject) -> bool {
        unsafe {
            let vtable = *self.env;
            ((*vtable).IsSameObject)(self.env, ref1, ref2) != 0
        }
    }

    pub fn push_local_frame(&self, capacity: jni::jint) -> Result<(), jni::jint> {
        unsafe {
            let vtable = *self.env;
            let res = ((*vtable).PushLocalFrame)(self.env, capacity);
            if res == jni::JNI_OK { Ok(()) } else { Err(res) }
        }
    }

    pub fn pop_local_frame(&self, result: jni::jobject) -> jni::jobject {
        unsafe {
            let vtable = *self.env;
            ((*vtable).PopLocalFrame)(self.env, result)
        }
    }

    // =========================================================================
    // Method Resolution
    // =========================================================================

    pub fn get_method_id(&self, cls: jni::jclass, name: &str, sig: &str) -> Option<jni::jmethodID> {
        let c_name = CString::new(name).ok()?;
        let c_sig = CString::new(sig).ok()?;
        unsafe {
            let vtable = *self.env;
            let id = ((*vtable).GetMethodID)(self.env, cls, c_name.as_ptr(), c_sig.as_ptr());
            if id.is_null() { None } else { Some(id) }
        }
    }

    pub fn get_static_method_id(&self, cls: jni::jclass, name: &str, sig: &str) -> Option<jni::jmethodID> {
        let c_name = CString::new(name).ok()?;
        let c_sig = CString::new(sig).ok()?;
        unsafe {
            let vtable = *self.env;
            let id = ((*vtable).GetStaticMethodID)(self.env, cls, c_name.as_ptr(), c_sig.as_ptr());
            if id.is_null() { None } else { Some(id) }
        }
    }

    // =========================================================================
    // Native Method Registration
    // =========================================================================

    pub fn register_natives(
        &self,
        cls: jni::jclass,
        methods: &[jni::JNINativeMethod],
    ) -> Result<(), jni::jint> {
        unsafe {
            let vtable = *self.env;
            let res = ((*vtable).RegisterNatives)(
                self.env,
                cls,
                methods.as_ptr(),
                methods.len() as jni::jint,
            );
            if res == jni::JNI_OK { Ok(()) } else { Err(res) }
        }
    }

    pub fn unregister_natives(&self, cls: jni::jclass) -> Result<(), jni::jint> {
        unsafe {
            let vtable = *self.env;
            let res = ((*vtable).UnregisterNatives)(self.env, cls);
            if res == jni::JNI_OK { Ok(()) } else { Err(res) }
        }
    }

    // =========================================================================
    // Method Calls (jvalue-array variants, for invoking the original
    // implementation through the shadow class)
    // =========================================================================

    pub fn call_object_method(&self, obj: jni::jobject, method_id: jni::jmethodID, args: &[jni::jvalue]) -> jni::jobject {
        unsafe {
            let vtable = *self.env;
            ((*vtable).CallObjectMethodA)(self.env, obj, method_id, args.as_ptr())
        }
    }

    pub fn call_boolean_method(&self, obj: jni::jobject, method_id: jni::jmethodID, args: &[jni::jvalue]) -> bool {
        unsafe {
            let vtable = *self.env;
            ((*vtable).CallBooleanMethodA)(self.env, obj, method_id, args.as_ptr()) != 0
        }
    }

    pub fn call_int_method(&self, obj: jni::jobject, method_id: jni::jmethodID, args: &[jni::jvalue]) -> jni::jint {
        unsafe {
            let vtable = *self.env;
            ((*vtable).CallIntMethodA)(self.env, obj, method_id, args.as_ptr())
        }
    }

    pub fn call_long_method(&self, obj: jni::jobject, method_id: jni::jmethodID, args: &[jni::jvalue]) -> jni::jlong {
        unsafe {
            let vtable = *self.env;
            ((*vtable).CallLongMethodA)(self.env, obj, method_id, args.as_ptr())
        }
    }

    pub fn call_void_method(&self, obj: jni::jobject, method_id: jni::jmethodID, args: &[jni::jvalue]) {
        unsafe {
            let vtable = *self.env;
            ((*vtable).CallVoidMethodA)(self.env, obj, method_id, args.as_ptr())
        }
    }

    pub fn call_static_object_method(&self, cls: jni::jclass, method_id: jni::jmethodID, args: &[jni::jvalue]) -> jni::jobject {
        unsafe {
            let vtable = *self.env;
            ((*vtable).CallStaticObjectMethodA)(self.env, cls, method_id, args.as_ptr())
        }
    }

    pub fn call_static_boolean_method(&self, cls: jni::jclass, method_id: jni::jmethodID, args: &[jni::jvalue]) -> bool {
        unsafe {
            let vtable = *self.env;
            ((*vtable).CallStaticBooleanMethodA)(self.env, cls, method_id, args.as_ptr()) != 0
        }
    }

    pub fn call_static_int_method(&self, cls: jni::jclass, method_id: jni::jmethodID, args: &[jni::jvalue]) -> jni::jint {
        unsafe {
            let vtable = *self.env;
            ((*vtable).CallStaticIntMethodA)(self.env, cls, method_id, args.as_ptr())
        }
    }

    pub fn call_static_long_method(&self, cls: jni::jclass, method_id: jni::jmethodID, args: &[jni::jvalue]) -> jni::jlong {
        unsafe {
            let vtable = *self.env;
            ((*vtable).CallStaticLongMethodA)(self.env, cls, method_id, args.as_ptr())
        }
    }

    pub fn call_static_void_method(&self, cls: jni::jclass, method_id: jni::jmethodID, args: &[jni::jvalue]) {
        unsafe {
            let vtable = *self.env;
            ((*vtable).CallStaticVoidMethodA)(self.env, cls, method_id, args.as_ptr())
        }
    }

    // =========================================================================
    // Strings
    // =========================================================================

    pub fn new_string_utf(&self, s: &str) -> Option<jni::jstring> {
        let c_str = CString::new(s).ok()?;
        unsafe {
            let vtable = *self.env;
            let obj = ((*vtable).NewStringUTF)(self.env, c_str.as_ptr());
            if obj.is_null() { None } else { Some(obj) }
        }
    }

    pub fn get_string_utf(&self, s: jni::jstring) -> Option<String> {
        unsafe {
            let vtable = *self.env;
            let chars = ((*vtable).GetStringUTFChars)(self.env, s, std::ptr::null_mut());
            if chars.is_null() {
                return None;
            }
            let owned = CStr::from_ptr(chars).to_string_lossy().into_owned();
            ((*vtable).ReleaseStringUTFChars)(self.env, s, chars);
            Some(owned)
        }
    }
}

/// RAII guard that deletes a local reference when dropped.
pub struct LocalRef<'a> {
    env: &'a JniEnv,
    obj: jni::jobject,
}

impl<'a> LocalRef<'a> {
    pub fn new(env: &'a JniEnv, obj: jni::jobject) -> Self {
        Self { env, obj }
    }

    pub fn get(&self) -> jni::jobject {
        self.obj
    }
}

impl Drop for LocalRef<'_> {
    fn drop(&mut self) {
        if !self.obj.is_null() {
            self.env.delete_local_ref(self.obj);
        }
    }
}

/// RAII guard that deletes a global reference when dropped.
pub struct GlobalRef<'a> {
    env: &'a JniEnv,
    obj: jni::jobject,
}

impl<'a> GlobalRef<'a> {
    /// Promotes a (usually local) reference to a global one.
    pub fn new(env: &'a JniEnv, obj: jni::jobject) -> Self {
        let global = env.new_global_ref(obj);
        Self { env, obj: global }
    }

    pub fn get(&self) -> jni::jobject {
        self.obj
    }

    /// Releases ownership without deleting the global reference.
    pub fn into_inner(self) -> jni::jobject {
        let obj = self.obj;
        std::mem::forget(self);
        obj
    }
}

impl Drop for GlobalRef<'_> {
    fn drop(&mut self) {
        if !self.obj.is_null() {
            self.env.delete_global_ref(self.obj);
        }
    }
}
