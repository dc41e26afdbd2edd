// jvmhook/src/sys/jvmti.rs
//
// JVMTI (JVM Tool Interface) bindings, matched against the JDK 27 jvmti.h
// header and compatible with JDK 8+.
//
// The function table keeps every slot in header order (reserved slots:
// 1, 105, 113, 117, 141). Only the functions this crate calls are typed;
// the rest are `*mut c_void` placeholders with the header's slot names.

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(dead_code)]

use std::os::raw::{c_char, c_uchar, c_void};

use crate::sys::jni::{jclass, jint, jmethodID, jobject, jthread, JNIEnv};

// --- Constants ---
pub const JVMTI_VERSION_1_0: jint = 0x30010000;
pub const JVMTI_VERSION_1_1: jint = 0x30010100;
pub const JVMTI_VERSION_1_2: jint = 0x30010200;
pub const JVMTI_VERSION_9: jint = 0x30090000;
pub const JVMTI_VERSION_11: jint = 0x300B0000;
pub const JVMTI_VERSION_21: jint = 0x30150000;

pub const JVMTI_ENABLE: jint = 1;
pub const JVMTI_DISABLE: jint = 0;

// --- Event numbers (full range is 50-82; this crate only enables 54) ---
pub const JVMTI_EVENT_VM_INIT: u32 = 50;
pub const JVMTI_EVENT_VM_DEATH: u32 = 51;
pub const JVMTI_EVENT_CLASS_FILE_LOAD_HOOK: u32 = 54;
pub const JVMTI_EVENT_CLASS_LOAD: u32 = 55;
pub const JVMTI_EVENT_CLASS_PREPARE: u32 = 56;

// --- Error Codes ---
//
// JVMTI reports errors as a C enum, but the JVM may return any value in the
// spec'd range, so this is a transparent newtype rather than a Rust enum
// (an out-of-range discriminant in a fieldless enum would be UB).
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct jvmtiError(pub u32);

impl jvmtiError {
    pub const NONE: jvmtiError = jvmtiError(0);
    pub const INVALID_THREAD: jvmtiError = jvmtiError(10);
    pub const THREAD_NOT_SUSPENDED: jvmtiError = jvmtiError(13);
    pub const THREAD_SUSPENDED: jvmtiError = jvmtiError(14);
    pub const INVALID_CLASS: jvmtiError = jvmtiError(21);
    pub const INVALID_CLASS_FORMAT: jvmtiError = jvmtiError(60);
    pub const FAILS_VERIFICATION: jvmtiError = jvmtiError(62);
    pub const UNSUPPORTED_REDEFINITION_METHOD_ADDED: jvmtiError = jvmtiError(63);
    pub const NOT_AVAILABLE: jvmtiError = jvmtiError(98);
    pub const MUST_POSSESS_CAPABILITY: jvmtiError = jvmtiError(99);
    pub const NULL_POINTER: jvmtiError = jvmtiError(100);
    pub const ABSENT_INFORMATION: jvmtiError = jvmtiError(101);
}

// --- Class definition for RedefineClasses ---
#[repr(C)]
#[derive(Copy, Clone, Debug)]
pub struct jvmtiClassDefinition {
    pub klass: jclass,
    pub class_byte_count: jint,
    pub class_bytes: *const c_uchar,
}

// --- Capabilities ---
//
// 128-bit bitfield; bit offsets match the jvmtiCapabilities C bitfield.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct jvmtiCapabilities {
    bits: [u32; 4],
}

impl Default for jvmtiCapabilities {
    fn default() -> Self {
        Self { bits: [0; 4] }
    }
}

impl jvmtiCapabilities {
    fn set_bit(&mut self, bit_offset: usize, value: bool) {
        let word_index = bit_offset / 32;
        let bit_index = bit_offset % 32;
        if value {
            self.bits[word_index] |= 1 << bit_index;
        } else {
            self.bits[word_index] &= !(1 << bit_index);
        }
    }

    fn get_bit(&self, bit_offset: usize) -> bool {
        let word_index = bit_offset / 32;
        let bit_index = bit_offset % 32;
        (self.bits[word_index] & (1 << bit_index)) != 0
    }

    // [9]
    pub fn set_can_redefine_classes(&mut self, v: bool) { self.set_bit(9, v); }
    pub fn can_redefine_classes(&self) -> bool { self.get_bit(9) }

    // [11]
    pub fn set_can_suspend(&mut self, v: bool) { self.set_bit(11, v); }
    pub fn can_suspend(&self) -> bool { self.get_bit(11) }

    // [21]
    pub fn set_can_redefine_any_class(&mut self, v: bool) { self.set_bit(21, v); }
    pub fn can_redefine_any_class(&self) -> bool { self.get_bit(21) }

    // [26]
    pub fn set_can_generate_all_class_hook_events(&mut self, v: bool) { self.set_bit(26, v); }
    pub fn can_generate_all_class_hook_events(&self) -> bool { self.get_bit(26) }

    // [37]
    pub fn set_can_retransform_classes(&mut self, v: bool) { self.set_bit(37, v); }
    pub fn can_retransform_classes(&self) -> bool { self.get_bit(37) }

    // [38]
    pub fn set_can_retransform_any_class(&mut self, v: bool) { self.set_bit(38, v); }
    pub fn can_retransform_any_class(&self) -> bool { self.get_bit(38) }
}

// --- Event callback signatures ---

pub type JvmtiClassFileLoadHookFn = unsafe extern "system" fn(
    jvmti_env: *mut jvmtiEnv,
    jni_env: *mut JNIEnv,
    class_being_redefined: jclass,
    loader: jobject,
    name: *const c_char,
    protection_domain: jobject,
    class_data_len: jint,
    class_data: *const c_uchar,
    new_class_data_len: *mut jint,
    new_class_data: *mut *mut c_uchar,
);

// --- Event callbacks table ---
//
// Field order matches jvmtiEventCallbacks in jvmti.h, one slot per event
// number 50..86 including the reserved gaps (72, 77-79, 85). Only
// ClassFileLoadHook is typed; the remaining events are never enabled by
// this crate.
#[repr(C)]
pub struct jvmtiEventCallbacks {
    pub VMInit: *mut c_void,
    pub VMDeath: *mut c_void,
    pub ThreadStart: *mut c_void,
    pub ThreadEnd: *mut c_void,
    pub ClassFileLoadHook: Option<JvmtiClassFileLoadHookFn>,
    pub ClassLoad: *mut c_void,
    pub ClassPrepare: *mut c_void,
    pub VMStart: *mut c_void,
    pub Exception: *mut c_void,
    pub ExceptionCatch: *mut c_void,
    pub SingleStep: *mut c_void,
    pub FramePop: *mut c_void,
    pub Breakpoint: *mut c_void,
    pub FieldAccess: *mut c_void,
    pub FieldModification: *mut c_void,
    pub MethodEntry: *mut c_void,
    pub MethodExit: *mut c_void,
    pub NativeMethodBind: *mut c_void,
    pub CompiledMethodLoad: *mut c_void,
    pub CompiledMethodUnload: *mut c_void,
    pub DynamicCodeGenerated: *mut c_void,
    pub DataDumpRequest: *mut c_void,
    pub reserved72: *mut c_void,
    pub MonitorWait: *mut c_void,
    pub MonitorWaited: *mut c_void,
    pub MonitorContendedEnter: *mut c_void,
    pub MonitorContendedEntered: *mut c_void,
    pub reserved77: *mut c_void,
    pub reserved78: *mut c_void,
    pub reserved79: *mut c_void,
    pub ResourceExhausted: *mut c_void,
    pub GarbageCollectionStart: *mut c_void,
    pub GarbageCollectionFinish: *mut c_void,
    pub ObjectFree: *mut c_void,
    pub VMObjectAlloc: *mut c_void,
    pub reserved85: *mut c_void,
    pub SampledObjectAlloc: *mut c_void,
}

impl Default for jvmtiEventCallbacks {
    fn default() -> Self {
        // Safety: the struct is all nullable pointers; all-zero is the
        // "no callbacks installed" state the JVMTI spec expects.
        unsafe { std::mem::zeroed() }
    }
}

// --- The JVMTI function table ---
//
// A jvmtiEnv points at a struct whose first member is a pointer to this
// table. Slots are numbered from 1 in the JVMTI spec; reserved1 occupies
// slot 1.
#[repr(C)]
pub struct jvmtiInterface_1_ {
    pub reserved1: *mut c_void,

    // 2: SetEventNotificationMode
    pub SetEventNotificationMode: Option<
        unsafe extern "system" fn(
            env: *mut jvmtiEnv,
            mode: jint,
            event_type: u32,
            event_thread: jthread,
        ) -> jvmtiError,
    >,

    // 3: GetAllModules (JDK 9+)
    pub GetAllModules: *mut c_void,

    // 4-6: Threads
    pub GetAllThreads: Option<
        unsafe extern "system" fn(
            env: *mut jvmtiEnv,
            threads_count_ptr: *mut jint,
            threads_ptr: *mut *mut jthread,
        ) -> jvmtiError,
    >,
    pub SuspendThread:
        Option<unsafe extern "system" fn(env: *mut jvmtiEnv, thread: jthread) -> jvmtiError>,
    pub ResumeThread:
        Option<unsafe extern "system" fn(env: *mut jvmtiEnv, thread: jthread) -> jvmtiError>,

    // 7-17
    pub StopThread: *mut c_void,
    pub InterruptThread: *mut c_void,
    pub GetThreadInfo: *mut c_void,
    pub GetOwnedMonitorInfo: *mut c_void,
    pub GetCurrentContendedMonitor: *mut c_void,
    pub RunAgentThread: *mut c_void,
    pub GetTopThreadGroups: *mut c_void,
    pub GetThreadGroupInfo: *mut c_void,
    pub GetThreadGroupChildren: *mut c_void,
    pub GetFrameCount: *mut c_void,
    pub GetThreadState: *mut c_void,

    // 18: GetCurrentThread
    pub GetCurrentThread: Option<
        unsafe extern "system" fn(env: *mut jvmtiEnv, thread_ptr: *mut jthread) -> jvmtiError,
    >,

    // 19-45
    pub GetFrameLocation: *mut c_void,
    pub NotifyFramePop: *mut c_void,
    pub GetLocalObject: *mut c_void,
    pub GetLocalInt: *mut c_void,
    pub GetLocalLong: *mut c_void,
    pub GetLocalFloat: *mut c_void,
    pub GetLocalDouble: *mut c_void,
    pub SetLocalObject: *mut c_void,
    pub SetLocalInt: *mut c_void,
    pub SetLocalLong: *mut c_void,
    pub SetLocalFloat: *mut c_void,
    pub SetLocalDouble: *mut c_void,
    pub CreateRawMonitor: *mut c_void,
    pub DestroyRawMonitor: *mut c_void,
    pub RawMonitorEnter: *mut c_void,
    pub RawMonitorExit: *mut c_void,
    pub RawMonitorWait: *mut c_void,
    pub RawMonitorNotify: *mut c_void,
    pub RawMonitorNotifyAll: *mut c_void,
    pub SetBreakpoint: *mut c_void,
    pub ClearBreakpoint: *mut c_void,
    pub GetNamedModule: *mut c_void,
    pub SetFieldAccessWatch: *mut c_void,
    pub ClearFieldAccessWatch: *mut c_void,
    pub SetFieldModificationWatch: *mut c_void,
    pub ClearFieldModificationWatch: *mut c_void,
    pub IsModifiableClass: *mut c_void,

    // 46-47: Memory
    pub Allocate: *mut c_void,
    pub Deallocate:
        Option<unsafe extern "system" fn(env: *mut jvmtiEnv, mem: *mut c_uchar) -> jvmtiError>,

    // 48: GetClassSignature
    pub GetClassSignature: Option<
        unsafe extern "system" fn(
            env: *mut jvmtiEnv,
            klass: jclass,
            signature_ptr: *mut *mut c_char,
            generic_ptr: *mut *mut c_char,
        ) -> jvmtiError,
    >,

    // 49-56
    pub GetClassStatus: *mut c_void,
    pub GetSourceFileName: *mut c_void,
    pub GetClassModifiers: *mut c_void,
    pub GetClassMethods: *mut c_void,
    pub GetClassFields: *mut c_void,
    pub GetImplementedInterfaces: *mut c_void,
    pub IsInterface: *mut c_void,
    pub IsArrayClass: *mut c_void,

    // 57: GetClassLoader
    pub GetClassLoader: Option<
        unsafe extern "system" fn(
            env: *mut jvmtiEnv,
            klass: jclass,
            classloader_ptr: *mut jobject,
        ) -> jvmtiError,
    >,

    // 58-63
    pub GetObjectHashCode: *mut c_void,
    pub GetObjectMonitorUsage: *mut c_void,
    pub GetFieldName: *mut c_void,
    pub GetFieldDeclaringClass: *mut c_void,
    pub GetFieldModifiers: *mut c_void,
    pub IsFieldSynthetic: *mut c_void,

    // 64-66: Methods
    pub GetMethodName: Option<
        unsafe extern "system" fn(
            env: *mut jvmtiEnv,
            method: jmethodID,
            name_ptr: *mut *mut c_char,
            signature_ptr: *mut *mut c_char,
            generic_ptr: *mut *mut c_char,
        ) -> jvmtiError,
    >,
    pub GetMethodDeclaringClass: Option<
        unsafe extern "system" fn(
            env: *mut jvmtiEnv,
            method: jmethodID,
            declaring_class_ptr: *mut jclass,
        ) -> jvmtiError,
    >,
    pub GetMethodModifiers: Option<
        unsafe extern "system" fn(
            env: *mut jvmtiEnv,
            method: jmethodID,
            modifiers_ptr: *mut jint,
        ) -> jvmtiError,
    >,

    // 67-86
    pub ClearAllFramePops: *mut c_void,
    pub GetMaxLocals: *mut c_void,
    pub GetArgumentsSize: *mut c_void,
    pub GetLineNumberTable: *mut c_void,
    pub GetMethodLocation: *mut c_void,
    pub GetLocalVariableTable: *mut c_void,
    pub SetNativeMethodPrefix: *mut c_void,
    pub SetNativeMethodPrefixes: *mut c_void,
    pub GetBytecodes: *mut c_void,
    pub IsMethodNative: *mut c_void,
    pub IsMethodSynthetic: *mut c_void,
    pub GetLoadedClasses: *mut c_void,
    pub GetClassLoaderClasses: *mut c_void,
    pub PopFrame: *mut c_void,
    pub ForceEarlyReturnObject: *mut c_void,
    pub ForceEarlyReturnInt: *mut c_void,
    pub ForceEarlyReturnLong: *mut c_void,
    pub ForceEarlyReturnFloat: *mut c_void,
    pub ForceEarlyReturnDouble: *mut c_void,
    pub ForceEarlyReturnVoid: *mut c_void,

    // 87: RedefineClasses
    pub RedefineClasses: Option<
        unsafe extern "system" fn(
            env: *mut jvmtiEnv,
            class_count: jint,
            class_definitions: *const jvmtiClassDefinition,
        ) -> jvmtiError,
    >,

    // 88-121
    pub GetVersionNumber: *mut c_void,
    pub GetCapabilities: *mut c_void,
    pub GetSourceDebugExtension: *mut c_void,
    pub IsMethodObsolete: *mut c_void,
    pub SuspendThreadList: *mut c_void,
    pub ResumeThreadList: *mut c_void,
    pub AddModuleReads: *mut c_void,
    pub AddModuleExports: *mut c_void,
    pub AddModuleOpens: *mut c_void,
    pub AddModuleUses: *mut c_void,
    pub AddModuleProvides: *mut c_void,
    pub IsModifiableModule: *mut c_void,
    pub GetAllStackTraces: *mut c_void,
    pub GetThreadListStackTraces: *mut c_void,
    pub GetThreadLocalStorage: *mut c_void,
    pub SetThreadLocalStorage: *mut c_void,
    pub GetStackTrace: *mut c_void,
    pub reserved105: *mut c_void,
    pub GetTag: *mut c_void,
    pub SetTag: *mut c_void,
    pub ForceGarbageCollection: *mut c_void,
    pub IterateOverObjectsReachableFromObject: *mut c_void,
    pub IterateOverReachableObjects: *mut c_void,
    pub IterateOverHeap: *mut c_void,
    pub IterateOverInstancesOfClass: *mut c_void,
    pub reserved113: *mut c_void,
    pub GetObjectsWithTags: *mut c_void,
    pub FollowReferences: *mut c_void,
    pub IterateThroughHeap: *mut c_void,
    pub reserved117: *mut c_void,
    pub SuspendAllVirtualThreads: *mut c_void,
    pub ResumeAllVirtualThreads: *mut c_void,
    pub SetJNIFunctionTable: *mut c_void,
    pub GetJNIFunctionTable: *mut c_void,

    // 122: SetEventCallbacks
    pub SetEventCallbacks: Option<
        unsafe extern "system" fn(
            env: *mut jvmtiEnv,
            callbacks: *const jvmtiEventCallbacks,
            size_of_callbacks: jint,
        ) -> jvmtiError,
    >,

    // 123-126
    pub GenerateEvents: *mut c_void,
    pub GetExtensionFunctions: *mut c_void,
    pub GetExtensionEvents: *mut c_void,
    pub SetExtensionEventCallback: *mut c_void,

    // 127: DisposeEnvironment
    pub DisposeEnvironment: Option<unsafe extern "system" fn(env: *mut jvmtiEnv) -> jvmtiError>,

    // 128-139
    pub GetErrorName: *mut c_void,
    pub GetJLocationFormat: *mut c_void,
    pub GetSystemProperties: *mut c_void,
    pub GetSystemProperty: *mut c_void,
    pub SetSystemProperty: *mut c_void,
    pub GetPhase: *mut c_void,
    pub GetCurrentThreadCpuTimerInfo: *mut c_void,
    pub GetCurrentThreadCpuTime: *mut c_void,
    pub GetThreadCpuTimerInfo: *mut c_void,
    pub GetThreadCpuTime: *mut c_void,
    pub GetTimerInfo: *mut c_void,
    pub GetTime: *mut c_void,

    // 140: GetPotentialCapabilities
    pub GetPotentialCapabilities: Option<
        unsafe extern "system" fn(
            env: *mut jvmtiEnv,
            capabilities_ptr: *mut jvmtiCapabilities,
        ) -> jvmtiError,
    >,

    pub reserved141: *mut c_void,

    // 142: AddCapabilities
    pub AddCapabilities: Option<
        unsafe extern "system" fn(
            env: *mut jvmtiEnv,
            capabilities_ptr: *const jvmtiCapabilities,
        ) -> jvmtiError,
    >,

    // 143-151
    pub RelinquishCapabilities: *mut c_void,
    pub GetAvailableProcessors: *mut c_void,
    pub GetClassVersionNumbers: *mut c_void,
    pub GetConstantPool: *mut c_void,
    pub GetEnvironmentLocalStorage: *mut c_void,
    pub SetEnvironmentLocalStorage: *mut c_void,
    pub AddToBootstrapClassLoaderSearch: *mut c_void,
    pub SetVerboseFlag: *mut c_void,
    pub AddToSystemClassLoaderSearch: *mut c_void,

    // 152: RetransformClasses
    pub RetransformClasses: Option<
        unsafe extern "system" fn(
            env: *mut jvmtiEnv,
            class_count: jint,
            classes: *const jclass,
        ) -> jvmtiError,
    >,

    // 153-156
    pub GetOwnedMonitorStackDepthInfo: *mut c_void,
    pub GetObjectSize: *mut c_void,
    pub GetLocalInstance: *mut c_void,
    pub SetHeapSamplingInterval: *mut c_void,
}

// --- jvmtiEnv ---
//
// Like JNIEnv, a jvmtiEnv is a pointer to a struct whose first member is
// the function table pointer.
#[repr(C)]
pub struct jvmtiEnv {
    pub functions: *const jvmtiInterface_1_,
}
