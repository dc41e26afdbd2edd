//! JVMTI/JNI-backed implementation of the [`Runtime`] collaborator.
//!
//! This is where the engine's abstract operations meet the real VM:
//! capability requests, the `ClassFileLoadHook` trampoline, thread
//! suspension, `RetransformClasses`/`RedefineClasses`, `DefineClass` and
//! `RegisterNatives`.
//!
//! The class-bytes delivery path deserves a note. JVMTI only offers a
//! process-global event callback, but the engine wants deliveries scoped to
//! one retransform call. `retransform_class` arms a thread-local sink
//! pointer for the duration of the `RetransformClasses` call; the VM
//! delivers `ClassFileLoadHook` for a requested retransformation on the
//! requesting thread, so the trampoline finds the sink there. Deliveries
//! with no armed sink (other threads loading classes while the hook is
//! enabled) are ignored, which also keeps them safe against a concurrent
//! mutation window for a different class.

use std::cell::Cell;
use std::ffi::CStr;
use std::os::raw::{c_char, c_uchar, c_void};
use std::ptr;

use log::{debug, warn};

use crate::classfile::AccessFlags;
use crate::error::HookError;
use crate::jni_wrapper::{JniEnv, LocalRef};
use crate::jvmti_wrapper::Jvmti;
use crate::runtime::{NativeFn, ReloadSink, Runtime};
use crate::sys::{jni, jvmti};
use crate::table::MethodIdentity;

type ErasedSink = *mut (dyn FnMut(&str, &[u8]) + 'static);

thread_local! {
    static ACTIVE_SINK: Cell<Option<ErasedSink>> = const { Cell::new(None) };
}

unsafe extern "system" fn class_file_load_hook(
    _jvmti_env: *mut jvmti::jvmtiEnv,
    _jni_env: *mut jni::JNIEnv,
    _class_being_redefined: jni::jclass,
    _loader: jni::jobject,
    name: *const c_char,
    _protection_domain: jni::jobject,
    class_data_len: jni::jint,
    class_data: *const c_uchar,
    _new_class_data_len: *mut jni::jint,
    _new_class_data: *mut *mut c_uchar,
) {
    let Some(sink) = ACTIVE_SINK.with(|s| s.get()) else {
        return;
    };
    if name.is_null() || class_data.is_null() || class_data_len < 0 {
        return;
    }
    let name = match CStr::from_ptr(name).to_str() {
        Ok(name) => name,
        Err(_) => return,
    };
    let bytes = std::slice::from_raw_parts(class_data, class_data_len as usize);
    (*sink)(name, bytes);
}

/// Live-VM runtime connection.
pub struct JvmtiRuntime {
    vm: *mut jni::JavaVM,
    jvmti: Jvmti,
}

impl JvmtiRuntime {
    /// Connects to the VM, requests the capabilities the engine depends on
    /// (redefine, retransform, suspend) and installs the class file load
    /// hook trampoline. Notification stays disabled until the engine needs
    /// a delivery.
    pub fn new(vm: *mut jni::JavaVM) -> Result<Self, HookError> {
        let jvmti = Jvmti::new(vm).map_err(HookError::Jni)?;

        let mut caps = jvmti::jvmtiCapabilities::default();
        caps.set_can_redefine_classes(true);
        caps.set_can_redefine_any_class(true);
        caps.set_can_retransform_classes(true);
        caps.set_can_retransform_any_class(true);
        caps.set_can_suspend(true);
        jvmti.add_capabilities(&caps).map_err(jvmti_err)?;

        let mut callbacks = jvmti::jvmtiEventCallbacks::default();
        callbacks.ClassFileLoadHook = Some(class_file_load_hook);
        jvmti.set_event_callbacks(callbacks).map_err(jvmti_err)?;

        Ok(Self { vm, jvmti })
    }

    /// The current thread's JNI environment.
    fn jni(&self) -> Result<JniEnv, HookError> {
        JniEnv::from_vm(self.vm).map_err(HookError::Jni)
    }

    /// Clears and reports a pending Java exception, if any.
    fn check_exception(&self, jni: &JniEnv) -> Result<(), HookError> {
        if jni.exception_check() {
            jni.exception_clear();
            return Err(HookError::JavaException);
        }
        Ok(())
    }
}

fn jvmti_err(err: jvmti::jvmtiError) -> HookError {
    HookError::Jvmti(err.0)
}

impl crate::engine::HookEngine<JvmtiRuntime> {
    /// One-call initialization against a live VM: connect, request
    /// capabilities, install callbacks, and wrap the engine.
    pub fn from_vm(vm: *mut jni::JavaVM) -> Result<Self, HookError> {
        Ok(Self::new(JvmtiRuntime::new(vm)?))
    }
}

impl Runtime for JvmtiRuntime {
    type Class = jni::jclass;
    type Method = jni::jmethodID;
    type Thread = jni::jthread;

    fn method_declaring_class(&self, method: Self::Method) -> Result<Self::Class, HookError> {
        self.jvmti
            .get_method_declaring_class(method)
            .map_err(|_| HookError::Resolve)
    }

    fn class_name(&self, class: Self::Class) -> Result<String, HookError> {
        let (signature, _) = self
            .jvmti
            .get_class_signature(class)
            .map_err(|_| HookError::Resolve)?;
        // "Ljava/lang/String;" -> "java/lang/String". Arrays and primitives
        // cannot declare methods, so only the L-form matters here.
        let name = signature
            .strip_prefix('L')
            .and_then(|s| s.strip_suffix(';'))
            .ok_or(HookError::Resolve)?;
        Ok(name.to_string())
    }

    fn method_identity(&self, method: Self::Method) -> Result<MethodIdentity, HookError> {
        let (name, descriptor, _) = self
            .jvmti
            .get_method_name(method)
            .map_err(|_| HookError::Resolve)?;
        let modifiers = self
            .jvmti
            .get_method_modifiers(method)
            .map_err(|_| HookError::Resolve)?;
        Ok(MethodIdentity {
            name,
            descriptor,
            access_flags: AccessFlags::from_bits_retain(modifiers as u16),
        })
    }

    fn find_class(&self, class_name: &str) -> Option<Self::Class> {
        let jni = self.jni().ok()?;
        match jni.find_class(class_name) {
            Some(class) => Some(class),
            None => {
                jni.exception_clear();
                None
            }
        }
    }

    fn set_load_hook_enabled(&self, enabled: bool) -> Result<(), HookError> {
        self.jvmti
            .set_event_notification_mode(
                enabled,
                jvmti::JVMTI_EVENT_CLASS_FILE_LOAD_HOOK,
                ptr::null_mut(),
            )
            .map_err(jvmti_err)
    }

    fn retransform_class(
        &self,
        class: Self::Class,
        sink: &mut ReloadSink<'_>,
    ) -> Result<(), HookError> {
        // Erase the sink's lifetime for the thread-local slot; it is only
        // reachable while the RetransformClasses call below is on the
        // stack, and the slot is cleared before this frame returns.
        let erased: ErasedSink = unsafe { std::mem::transmute(sink as *mut ReloadSink<'_>) };
        ACTIVE_SINK.with(|s| s.set(Some(erased)));
        let result = self.jvmti.retransform_classes(&[class]);
        ACTIVE_SINK.with(|s| s.set(None));
        result.map_err(jvmti_err)
    }

    fn redefine_class(&self, class: Self::Class, bytes: &[u8]) -> Result<(), HookError> {
        let definition = jvmti::jvmtiClassDefinition {
            klass: class,
            class_byte_count: bytes.len() as jni::jint,
            class_bytes: bytes.as_ptr(),
        };
        self.jvmti.redefine_classes(&[definition]).map_err(|err| {
            warn!("RedefineClasses failed: {err:?}");
            jvmti_err(err)
        })
    }

    fn define_class(
        &self,
        class_name: &str,
        loader_of: Self::Class,
        bytes: &[u8],
    ) -> Result<Self::Class, HookError> {
        let loader = self.jvmti.get_class_loader(loader_of).map_err(jvmti_err)?;
        let jni = self.jni()?;

        let Some(local) = jni.define_class(class_name, loader, bytes) else {
            if jni.exception_check() {
                jni.exception_describe();
                jni.exception_clear();
            }
            return Err(HookError::Jni(jni::JNI_ERR));
        };

        // Pin the defined class for the life of the process; the local ref
        // dies with this frame.
        let local = LocalRef::new(&jni, local);
        let global = jni.new_global_ref(local.get());
        debug!("defined class {class_name}");
        Ok(global)
    }

    fn resolve_method(
        &self,
        class: Self::Class,
        name: &str,
        descriptor: &str,
        is_static: bool,
    ) -> Result<Self::Method, HookError> {
        let jni = self.jni()?;
        let method = if is_static {
            jni.get_static_method_id(class, name, descriptor)
        } else {
            jni.get_method_id(class, name, descriptor)
        };
        match method {
            Some(method) => {
                self.check_exception(&jni)?;
                Ok(method)
            }
            None => {
                self.check_exception(&jni)?;
                Err(HookError::Resolve)
            }
        }
    }

    fn register_native(
        &self,
        class: Self::Class,
        name: &str,
        descriptor: &str,
        native_fn: NativeFn,
    ) -> Result<(), HookError> {
        let jni = self.jni()?;
        let c_name = std::ffi::CString::new(name).map_err(|_| HookError::Resolve)?;
        let c_descriptor = std::ffi::CString::new(descriptor).map_err(|_| HookError::Resolve)?;

        let native_method = jni::JNINativeMethod {
            name: c_name.as_ptr(),
            signature: c_descriptor.as_ptr(),
            fnPtr: native_fn as *mut c_void,
        };

        jni.register_natives(class, &[native_method]).map_err(|code| {
            if jni.exception_check() {
                jni.exception_clear();
            }
            HookError::Jni(code)
        })
    }

    fn current_thread(&self) -> Result<Self::Thread, HookError> {
        self.jvmti.get_current_thread().map_err(jvmti_err)
    }

    fn all_threads(&self) -> Result<Vec<Self::Thread>, HookError> {
        self.jvmti.get_all_threads().map_err(jvmti_err)
    }

    fn is_same_thread(&self, a: Self::Thread, b: Self::Thread) -> bool {
        match self.jni() {
            Ok(jni) => jni.is_same_object(a, b),
            Err(_) => a == b,
        }
    }

    fn suspend_thread(&self, thread: Self::Thread) -> Result<(), HookError> {
        self.jvmti.suspend_thread(thread).map_err(jvmti_err)
    }

    fn resume_thread(&self, thread: Self::Thread) -> Result<(), HookError> {
        self.jvmti.resume_thread(thread).map_err(jvmti_err)
    }

    fn teardown(&self) -> Result<(), HookError> {
        self.jvmti
            .set_event_callbacks(jvmti::jvmtiEventCallbacks::default())
            .map_err(jvmti_err)
    }
}
