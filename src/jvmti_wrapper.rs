// jvmhook/src/jvmti_wrapper.rs
use crate::sys::jni;
use crate::sys::jvmti;
use std::ptr;

/// A safe wrapper around the raw JVMTI environment pointer, covering the
/// slice of JVMTI the hook engine needs: capabilities, the class file load
/// hook, threads, identity queries, and class redefinition.
pub struct Jvmti {
    // Kept private so the user can't mess with raw pointers directly.
    env: *mut jvmti::jvmtiEnv,
}

impl Jvmti {
    /// Connects to the JVM and retrieves the JVMTI environment.
    pub fn new(vm: *mut jni::JavaVM) -> Result<Self, jni::jint> {
        let mut env_ptr: *mut std::ffi::c_void = ptr::null_mut();

        unsafe {
            // vm: *mut JavaVM = *mut *const JNIInvokeInterface_
            let get_env_fn = (**vm).GetEnv;
            let res = get_env_fn(vm, &mut env_ptr, jvmti::JVMTI_VERSION_1_2);
            if res != jni::JNI_OK {
                return Err(res);
            }
        }

        Ok(Jvmti {
            env: env_ptr as *mut jvmti::jvmtiEnv,
        })
    }

    /// Create a Jvmti wrapper from a raw jvmtiEnv pointer.
    ///
    /// # Safety
    /// The caller must ensure the pointer is valid for the duration of use.
    pub unsafe fn from_raw(env: *mut jvmti::jvmtiEnv) -> Self {
        Jvmti { env }
    }

    /// Get the raw jvmtiEnv pointer.
    pub fn raw(&self) -> *mut jvmti::jvmtiEnv {
        self.env
    }

    pub fn get_potential_capabilities(
        &self,
    ) -> Result<jvmti::jvmtiCapabilities, jvmti::jvmtiError> {
        let mut caps = jvmti::jvmtiCapabilities::default();

        unsafe {
            let get_pot_caps_fn = (*(*self.env).functions).GetPotentialCapabilities.unwrap();
            let err = get_pot_caps_fn(self.env, &mut caps);
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }
        }

        Ok(caps)
    }

    pub fn add_capabilities(
        &self,
        new_caps: &jvmti::jvmtiCapabilities,
    ) -> Result<(), jvmti::jvmtiError> {
        unsafe {
            // If this panics, AddCapabilities is null, which only happens on
            // a broken vtable definition.
            let add_caps_fn = (*(*self.env).functions).AddCapabilities.unwrap();
            let err = add_caps_fn(self.env, new_caps);
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn set_event_callbacks(
        &self,
        callbacks: jvmti::jvmtiEventCallbacks,
    ) -> Result<(), jvmti::jvmtiError> {
        unsafe {
            let set_callbacks_fn = (*(*self.env).functions).SetEventCallbacks.unwrap();
            let size = std::mem::size_of::<jvmti::jvmtiEventCallbacks>() as i32;

            let err = set_callbacks_fn(self.env, &callbacks, size);
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn set_event_notification_mode(
        &self,
        enable: bool,
        event_type: u32,
        thread: jni::jthread,
    ) -> Result<(), jvmti::jvmtiError> {
        unsafe {
            let set_mode_fn = (*(*self.env).functions).SetEventNotificationMode.unwrap();
            let mode = if enable { jvmti::JVMTI_ENABLE } else { jvmti::JVMTI_DISABLE };

            // thread can be null (all threads)
            let err = set_mode_fn(self.env, mode, event_type, thread);
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn get_all_threads(&self) -> Result<Vec<jni::jthread>, jvmti::jvmtiError> {
        let mut threads_count: jni::jint = 0;
        let mut threads_ptr: *mut jni::jthread = ptr::null_mut();

        unsafe {
            let get_all_threads_fn = (*(*self.env).functions).GetAllThreads.unwrap();
            let err = get_all_threads_fn(self.env, &mut threads_count, &mut threads_ptr);
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }

            let threads = std::slice::from_raw_parts(threads_ptr, threads_count as usize).to_vec();
            self.deallocate(threads_ptr as *mut u8)?;

            Ok(threads)
        }
    }

    pub fn get_current_thread(&self) -> Result<jni::jthread, jvmti::jvmtiError> {
        let mut thread: jni::jthread = ptr::null_mut();

        unsafe {
            let get_current_thread_fn = (*(*self.env).functions).GetCurrentThread.unwrap();
            let err = get_current_thread_fn(self.env, &mut thread);
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }
        }

        Ok(thread)
    }

    pub fn suspend_thread(&self, thread: jni::jthread) -> Result<(), jvmti::jvmtiError> {
        unsafe {
            let suspend_fn = (*(*self.env).functions).SuspendThread.unwrap();
            let err = suspend_fn(self.env, thread);
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn resume_thread(&self, thread: jni::jthread) -> Result<(), jvmti::jvmtiError> {
        unsafe {
            let resume_fn = (*(*self.env).functions).ResumeThread.unwrap();
            let err = resume_fn(self.env, thread);
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn deallocate(&self, mem: *mut u8) -> Result<(), jvmti::jvmtiError> {
        if mem.is_null() {
            return Ok(());
        }
        unsafe {
            let deallocate_fn = (*(*self.env).functions).Deallocate.unwrap();
            let err = deallocate_fn(self.env, mem);
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }
        }
        Ok(())
    }

    /// Returns the class signature (e.g. `Ljava/lang/String;`) and, when
    /// present, the generic signature.
    pub fn get_class_signature(
        &self,
        klass: jni::jclass,
    ) -> Result<(String, Option<String>), jvmti::jvmtiError> {
        let mut sig_ptr: *mut std::os::raw::c_char = ptr::null_mut();
        let mut gen_ptr: *mut std::os::raw::c_char = ptr::null_mut();

        unsafe {
            let get_class_sig_fn = (*(*self.env).functions).GetClassSignature.unwrap();
            let err = get_class_sig_fn(self.env, klass, &mut sig_ptr, &mut gen_ptr);
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }

            let signature = std::ffi::CStr::from_ptr(sig_ptr).to_string_lossy().into_owned();
            let generic = if !gen_ptr.is_null() {
                Some(std::ffi::CStr::from_ptr(gen_ptr).to_string_lossy().into_owned())
            } else {
                None
            };

            self.deallocate(sig_ptr as *mut u8)?;
            if !gen_ptr.is_null() {
                self.deallocate(gen_ptr as *mut u8)?;
            }

            Ok((signature, generic))
        }
    }

    pub fn get_class_loader(&self, klass: jni::jclass) -> Result<jni::jobject, jvmti::jvmtiError> {
        let mut loader: jni::jobject = ptr::null_mut();

        unsafe {
            let get_loader_fn = (*(*self.env).functions).GetClassLoader.unwrap();
            let err = get_loader_fn(self.env, klass, &mut loader);
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }
        }

        Ok(loader)
    }

    /// Returns (name, descriptor, generic descriptor) for a method.
    pub fn get_method_name(
        &self,
        method: jni::jmethodID,
    ) -> Result<(String, String, Option<String>), jvmti::jvmtiError> {
        let mut name_ptr: *mut std::os::raw::c_char = ptr::null_mut();
        let mut sig_ptr: *mut std::os::raw::c_char = ptr::null_mut();
        let mut gen_ptr: *mut std::os::raw::c_char = ptr::null_mut();

        unsafe {
            let get_method_name_fn = (*(*self.env).functions).GetMethodName.unwrap();
            let err = get_method_name_fn(self.env, method, &mut name_ptr, &mut sig_ptr, &mut gen_ptr);
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }

            let name = std::ffi::CStr::from_ptr(name_ptr).to_string_lossy().into_owned();
            let signature = std::ffi::CStr::from_ptr(sig_ptr).to_string_lossy().into_owned();
            let generic = if !gen_ptr.is_null() {
                Some(std::ffi::CStr::from_ptr(gen_ptr).to_string_lossy().into_owned())
            } else {
                None
            };

            self.deallocate(name_ptr as *mut u8)?;
            self.deallocate(sig_ptr as *mut u8)?;
            if !gen_ptr.is_null() {
                self.deallocate(gen_ptr as *mut u8)?;
            }

            Ok((name, signature, generic))
        }
    }

    pub fn get_method_declaring_class(
        &self,
        method: jni::jmethodID,
    ) -> Result<jni::jclass, jvmti::jvmtiError> {
        let mut klass: jni::jclass = ptr::null_mut();

        unsafe {
            let get_declaring_fn = (*(*self.env).functions).GetMethodDeclaringClass.unwrap();
            let err = get_declaring_fn(self.env, method, &mut klass);
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }
        }

        Ok(klass)
    }

    pub fn get_method_modifiers(
        &self,
        method: jni::jmethodID,
    ) -> Result<jni::jint, jvmti::jvmtiError> {
        let mut modifiers: jni::jint = 0;

        unsafe {
            let get_modifiers_fn = (*(*self.env).functions).GetMethodModifiers.unwrap();
            let err = get_modifiers_fn(self.env, method, &mut modifiers);
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }
        }

        Ok(modifiers)
    }

    pub fn redefine_classes(
        &self,
        class_definitions: &[jvmti::jvmtiClassDefinition],
    ) -> Result<(), jvmti::jvmtiError> {
        unsafe {
            let redefine_classes_fn = (*(*self.env).functions).RedefineClasses.unwrap();
            let err = redefine_classes_fn(
                self.env,
                class_definitions.len() as jni::jint,
                class_definitions.as_ptr(),
            );
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }
        }
        Ok(())
    }

    pub fn retransform_classes(&self, classes: &[jni::jclass]) -> Result<(), jvmti::jvmtiError> {
        unsafe {
            let retransform_fn = (*(*self.env).functions).RetransformClasses.unwrap();
            let err = retransform_fn(self.env, classes.len() as jni::jint, classes.as_ptr());
            if err != jvmti::jvmtiError::NONE {
                return Err(err);
            }
        }
        Ok(())
    }
}
