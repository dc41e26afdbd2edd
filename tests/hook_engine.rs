//! Engine behavior against a mock runtime.
//!
//! The mock implements the [`Runtime`] collaborator over plain byte
//! buffers: classes are entries in a vector, handles are indices, and
//! "redefinition" swaps the live bytes after a parse check, the same way
//! the VM would reject malformed input. This exercises the whole
//! attach/detach/shutdown pipeline, including rollback and the suspension
//! window, without a JVM.

use std::cell::RefCell;
use std::os::raw::c_void;

use jvmhook::classfile::{AccessFlags, ClassFile, ATTR_CODE};
use jvmhook::engine::HookEngine;
use jvmhook::error::HookError;
use jvmhook::runtime::{NativeFn, ReloadSink, Runtime};
use jvmhook::table::MethodIdentity;

// ---------------------------------------------------------------------------
// Class byte builder
// ---------------------------------------------------------------------------

fn u2(out: &mut Vec<u8>, v: u16) {
    out.extend_from_slice(&v.to_be_bytes());
}

fn u4(out: &mut Vec<u8>, v: u32) {
    out.extend_from_slice(&v.to_be_bytes());
}

struct Pool {
    entries: Vec<Vec<u8>>,
}

impl Pool {
    fn utf8(&mut self, s: &str) -> u16 {
        let mut entry = vec![1];
        u2(&mut entry, s.len() as u16);
        entry.extend_from_slice(s.as_bytes());
        self.entries.push(entry);
        self.entries.len() as u16
    }

    fn class(&mut self, name_index: u16) -> u16 {
        let mut entry = vec![7];
        u2(&mut entry, name_index);
        self.entries.push(entry);
        self.entries.len() as u16
    }

    fn name_and_type(&mut self, name_index: u16, descriptor_index: u16) -> u16 {
        let mut entry = vec![12];
        u2(&mut entry, name_index);
        u2(&mut entry, descriptor_index);
        self.entries.push(entry);
        self.entries.len() as u16
    }

    fn methodref(&mut self, class_index: u16, name_and_type_index: u16) -> u16 {
        let mut entry = vec![10];
        u2(&mut entry, class_index);
        u2(&mut entry, name_and_type_index);
        self.entries.push(entry);
        self.entries.len() as u16
    }
}

/// Builds a class named `name` whose methods each carry a minimal `Code`
/// attribute, a `SourceFile` attribute, and a self-referential methodref
/// (so rename has a NameAndType descriptor to rewrite when a method
/// descriptor mentions the class).
fn build_class(name: &str, methods: &[(&str, &str, u16)]) -> Vec<u8> {
    let mut cp = Pool { entries: Vec::new() };

    let utf_name = cp.utf8(name);
    let utf_object = cp.utf8("java/lang/Object");
    let class_this = cp.class(utf_name);
    let class_object = cp.class(utf_object);
    let utf_code = cp.utf8("Code");
    let utf_source_file = cp.utf8("SourceFile");
    let simple = name.rsplit('/').next().unwrap_or(name);
    let utf_source = cp.utf8(&format!("{simple}.java"));

    let member_indices: Vec<(u16, u16)> = methods
        .iter()
        .map(|(m_name, m_desc, _)| (cp.utf8(m_name), cp.utf8(m_desc)))
        .collect();

    // Self-referential member ref on the last method, sharing its
    // descriptor Utf8 so a rename that rewrites NameAndType descriptors
    // is observable.
    let (last_name, last_desc) = *member_indices.last().unwrap();
    let nat = cp.name_and_type(last_name, last_desc);
    let _mref = cp.methodref(class_this, nat);

    let mut bytes = Vec::new();
    u4(&mut bytes, 0xCAFEBABE);
    u2(&mut bytes, 0);
    u2(&mut bytes, 52);
    u2(&mut bytes, cp.entries.len() as u16 + 1);
    for entry in &cp.entries {
        bytes.extend_from_slice(entry);
    }

    u2(&mut bytes, 0x0021);
    u2(&mut bytes, class_this);
    u2(&mut bytes, class_object);

    u2(&mut bytes, 0); // interfaces
    u2(&mut bytes, 0); // fields

    u2(&mut bytes, methods.len() as u16);
    for ((_, _, flags), (name_index, descriptor_index)) in methods.iter().zip(&member_indices) {
        u2(&mut bytes, *flags);
        u2(&mut bytes, *name_index);
        u2(&mut bytes, *descriptor_index);
        u2(&mut bytes, 1);
        u2(&mut bytes, utf_code);
        let mut code = Vec::new();
        u2(&mut code, 1);
        u2(&mut code, 1);
        u4(&mut code, 1);
        code.push(0xb1);
        u2(&mut code, 0);
        u2(&mut code, 0);
        u4(&mut bytes, code.len() as u32);
        bytes.extend_from_slice(&code);
    }

    u2(&mut bytes, 1); // class attributes
    u2(&mut bytes, utf_source_file);
    u4(&mut bytes, 2);
    u2(&mut bytes, utf_source);

    bytes
}

// ---------------------------------------------------------------------------
// Mock runtime
// ---------------------------------------------------------------------------

const ALL_THREADS: [usize; 3] = [1, 2, 3];
const CURRENT_THREAD: usize = 1;

const ACC_PUBLIC: u16 = 0x0001;
const ACC_STATIC: u16 = 0x0008;

struct MockClass {
    name: String,
    live: Vec<u8>,
    pristine: Vec<u8>,
}

#[derive(Clone)]
struct MockMethod {
    class: usize,
    name: String,
    descriptor: String,
    flags: u16,
}

#[derive(Default)]
struct VmState {
    classes: Vec<MockClass>,
    methods: Vec<MockMethod>,
    natives: Vec<(usize, String, String)>,
    suspended: Vec<usize>,
    resumed: Vec<usize>,
    redefinitions: Vec<(usize, Vec<u8>)>,
    load_hook_enabled: bool,
    fail_redefines: usize,
    fail_register_native: bool,
    withhold_reload_bytes: bool,
}

#[derive(Default)]
struct MockVm {
    state: RefCell<VmState>,
}

impl MockVm {
    fn load_class(&self, name: &str, methods: &[(&str, &str, u16)]) -> usize {
        let bytes = build_class(name, methods);
        let mut st = self.state.borrow_mut();
        st.classes.push(MockClass {
            name: name.to_string(),
            live: bytes.clone(),
            pristine: bytes,
        });
        st.classes.len() - 1
    }

    fn method_handle(&self, class: usize, name: &str, descriptor: &str, flags: u16) -> usize {
        let mut st = self.state.borrow_mut();
        st.methods.push(MockMethod {
            class,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            flags,
        });
        st.methods.len() - 1
    }

    fn live_bytes(&self, class: usize) -> Vec<u8> {
        self.state.borrow().classes[class].live.clone()
    }

    fn pristine_bytes(&self, class: usize) -> Vec<u8> {
        self.state.borrow().classes[class].pristine.clone()
    }

    fn method_class(&self, method: usize) -> usize {
        self.state.borrow().methods[method].class
    }
}

impl Runtime for MockVm {
    type Class = usize;
    type Method = usize;
    type Thread = usize;

    fn method_declaring_class(&self, method: usize) -> Result<usize, HookError> {
        Ok(self.state.borrow().methods[method].class)
    }

    fn class_name(&self, class: usize) -> Result<String, HookError> {
        Ok(self.state.borrow().classes[class].name.clone())
    }

    fn method_identity(&self, method: usize) -> Result<MethodIdentity, HookError> {
        let m = self.state.borrow().methods[method].clone();
        Ok(MethodIdentity {
            name: m.name,
            descriptor: m.descriptor,
            access_flags: AccessFlags::from_bits_retain(m.flags),
        })
    }

    fn find_class(&self, class_name: &str) -> Option<usize> {
        self.state
            .borrow()
            .classes
            .iter()
            .position(|c| c.name == class_name)
    }

    fn set_load_hook_enabled(&self, enabled: bool) -> Result<(), HookError> {
        self.state.borrow_mut().load_hook_enabled = enabled;
        Ok(())
    }

    fn retransform_class(&self, class: usize, sink: &mut ReloadSink<'_>) -> Result<(), HookError> {
        let (name, bytes, deliver) = {
            let st = self.state.borrow();
            let c = &st.classes[class];
            (
                c.name.clone(),
                c.live.clone(),
                st.load_hook_enabled && !st.withhold_reload_bytes,
            )
        };
        if deliver {
            sink(&name, &bytes);
        }
        Ok(())
    }

    fn redefine_class(&self, class: usize, bytes: &[u8]) -> Result<(), HookError> {
        let mut st = self.state.borrow_mut();
        if st.fail_redefines > 0 {
            st.fail_redefines -= 1;
            return Err(HookError::Jvmti(62));
        }
        // The VM verifies redefinition input; reject what it cannot parse.
        ClassFile::parse(bytes).map_err(|_| HookError::Jvmti(60))?;
        st.classes[class].live = bytes.to_vec();
        st.redefinitions.push((class, bytes.to_vec()));
        Ok(())
    }

    fn define_class(&self, class_name: &str, _loader_of: usize, bytes: &[u8]) -> Result<usize, HookError> {
        let parsed = ClassFile::parse(bytes).map_err(|_| HookError::Jni(-1))?;
        if parsed.class_name().ok() != Some(class_name) {
            return Err(HookError::Jni(-1));
        }
        let mut st = self.state.borrow_mut();
        st.classes.push(MockClass {
            name: class_name.to_string(),
            live: bytes.to_vec(),
            pristine: bytes.to_vec(),
        });
        Ok(st.classes.len() - 1)
    }

    fn resolve_method(
        &self,
        class: usize,
        name: &str,
        descriptor: &str,
        is_static: bool,
    ) -> Result<usize, HookError> {
        let bytes = self.state.borrow().classes[class].live.clone();
        let parsed = ClassFile::parse(&bytes).map_err(|_| HookError::Resolve)?;
        let found = parsed.methods.iter().any(|m| {
            parsed.constant_pool.utf8_at(m.name_index) == Ok(name)
                && parsed.constant_pool.utf8_at(m.descriptor_index) == Ok(descriptor)
                && m.access_flags.contains(AccessFlags::STATIC) == is_static
        });
        if !found {
            return Err(HookError::Resolve);
        }
        let mut st = self.state.borrow_mut();
        st.methods.push(MockMethod {
            class,
            name: name.to_string(),
            descriptor: descriptor.to_string(),
            flags: if is_static { ACC_STATIC } else { 0 },
        });
        Ok(st.methods.len() - 1)
    }

    fn register_native(
        &self,
        class: usize,
        name: &str,
        descriptor: &str,
        _native_fn: NativeFn,
    ) -> Result<(), HookError> {
        let mut st = self.state.borrow_mut();
        if st.fail_register_native {
            return Err(HookError::Jni(-1));
        }
        st.natives.push((class, name.to_string(), descriptor.to_string()));
        Ok(())
    }

    fn current_thread(&self) -> Result<usize, HookError> {
        Ok(CURRENT_THREAD)
    }

    fn all_threads(&self) -> Result<Vec<usize>, HookError> {
        Ok(ALL_THREADS.to_vec())
    }

    fn is_same_thread(&self, a: usize, b: usize) -> bool {
        a == b
    }

    fn suspend_thread(&self, thread: usize) -> Result<(), HookError> {
        self.state.borrow_mut().suspended.push(thread);
        Ok(())
    }

    fn resume_thread(&self, thread: usize) -> Result<(), HookError> {
        self.state.borrow_mut().resumed.push(thread);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

extern "system" fn hook_stub() {}

fn stub() -> NativeFn {
    hook_stub as NativeFn
}

const TARGET: &str = "demo/Target";
const F_DESC: &str = "(ILjava/lang/String;)I";

fn target_methods() -> Vec<(&'static str, &'static str, u16)> {
    vec![
        ("<init>", "()V", ACC_PUBLIC),
        ("f", F_DESC, ACC_PUBLIC | ACC_STATIC),
        ("g", "()V", ACC_PUBLIC),
        ("same", "(Ldemo/Target;)Ldemo/Target;", ACC_PUBLIC),
    ]
}

fn method_by_name<'a>(classfile: &'a ClassFile, name: &str) -> &'a jvmhook::classfile::MethodInfo {
    classfile
        .methods
        .iter()
        .find(|m| classfile.constant_pool.utf8_at(m.name_index) == Ok(name))
        .unwrap_or_else(|| panic!("method {name} not found"))
}

fn has_code(classfile: &ClassFile, name: &str) -> bool {
    method_by_name(classfile, name)
        .attributes
        .iter()
        .any(|a| classfile.constant_pool.utf8_at(a.name_index) == Ok(ATTR_CODE))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn attach_patches_only_the_hooked_method() {
    let vm = MockVm::default();
    let class = vm.load_class(TARGET, &target_methods());
    let method = vm.method_handle(class, "f", F_DESC, ACC_PUBLIC | ACC_STATIC);

    let mut engine = HookEngine::new(vm);
    engine.attach(method, stub(), std::ptr::null_mut()).expect("attach");

    let vm = engine.runtime();
    let live = ClassFile::parse(&vm.live_bytes(class)).unwrap();
    let pristine = ClassFile::parse(&vm.pristine_bytes(class)).unwrap();

    let f = method_by_name(&live, "f");
    assert!(f.access_flags.contains(AccessFlags::NATIVE));
    assert!(!has_code(&live, "f"));

    // Every other method is byte-identical to the pristine copy.
    for name in ["<init>", "g", "same"] {
        assert_eq!(method_by_name(&live, name), method_by_name(&pristine, name));
    }
    // The pool itself is untouched by patching.
    assert_eq!(live.constant_pool, pristine.constant_pool);

    assert_eq!(
        vm.state.borrow().natives,
        vec![(class, "f".to_string(), F_DESC.to_string())]
    );
}

#[test]
fn attach_returns_a_method_on_the_shadow_class() {
    let vm = MockVm::default();
    let class = vm.load_class(TARGET, &target_methods());
    let method = vm.method_handle(class, "f", F_DESC, ACC_PUBLIC | ACC_STATIC);

    let mut engine = HookEngine::new(vm);
    let original = engine.attach(method, stub(), std::ptr::null_mut()).expect("attach");

    let shadow = engine.original_class(TARGET).expect("shadow class");
    assert_ne!(shadow, class);
    assert_eq!(engine.runtime().method_class(original), shadow);

    // The shadow still carries the original bytecode for f.
    let shadow_cf = ClassFile::parse(&engine.runtime().live_bytes(shadow)).unwrap();
    assert!(has_code(&shadow_cf, "f"));
    assert!(!method_by_name(&shadow_cf, "f").access_flags.contains(AccessFlags::NATIVE));
}

#[test]
fn shadow_is_a_renamed_final_copy() {
    let vm = MockVm::default();
    let class = vm.load_class(TARGET, &target_methods());
    let method = vm.method_handle(class, "f", F_DESC, ACC_PUBLIC | ACC_STATIC);

    let mut engine = HookEngine::new(vm);
    engine.attach(method, stub(), std::ptr::null_mut()).expect("attach");

    let shadow = engine.original_class(TARGET).unwrap();
    let shadow_cf = ClassFile::parse(&engine.runtime().live_bytes(shadow)).unwrap();

    let shadow_name = shadow_cf.class_name().unwrap().to_string();
    assert!(shadow_name.starts_with("demo/Target$hk"), "got {shadow_name}");

    // Methods picked up FINAL, constructors excepted.
    assert!(method_by_name(&shadow_cf, "f").access_flags.contains(AccessFlags::FINAL));
    assert!(method_by_name(&shadow_cf, "g").access_flags.contains(AccessFlags::FINAL));
    assert!(!method_by_name(&shadow_cf, "<init>").access_flags.contains(AccessFlags::FINAL));

    // The self-referential NameAndType descriptor follows the rename.
    let nat_descriptor = shadow_cf
        .constant_pool
        .iter()
        .find_map(|(_, e)| match e {
            jvmhook::classfile::CpInfo::NameAndType { descriptor_index, .. } => {
                Some(shadow_cf.constant_pool.utf8_at(*descriptor_index).unwrap().to_string())
            }
            _ => None,
        })
        .expect("NameAndType entry");
    assert_eq!(nat_descriptor, format!("(L{shadow_name};)L{shadow_name};"));

    // SourceFile points at the shadow's name now.
    let source_attr = shadow_cf
        .attributes
        .iter()
        .find(|a| shadow_cf.constant_pool.utf8_at(a.name_index) == Ok("SourceFile"))
        .expect("SourceFile attribute");
    let index = u16::from_be_bytes([source_attr.info[0], source_attr.info[1]]);
    let source = shadow_cf.constant_pool.utf8_at(index).unwrap();
    assert!(source.starts_with("Target$hk") && source.ends_with(".java"), "got {source}");
}

#[test]
fn second_attach_reuses_cache_and_shadow() {
    let vm = MockVm::default();
    let class = vm.load_class(TARGET, &target_methods());
    let f = vm.method_handle(class, "f", F_DESC, ACC_PUBLIC | ACC_STATIC);
    let g = vm.method_handle(class, "g", "()V", ACC_PUBLIC);

    let mut engine = HookEngine::new(vm);
    engine.attach(f, stub(), std::ptr::null_mut()).expect("attach f");
    let class_count = engine.runtime().state.borrow().classes.len();

    engine.attach(g, stub(), std::ptr::null_mut()).expect("attach g");
    // No second shadow was defined.
    assert_eq!(engine.runtime().state.borrow().classes.len(), class_count);
}

#[test]
fn all_hooks_of_a_class_ride_one_redefinition() {
    let vm = MockVm::default();
    let class = vm.load_class(TARGET, &target_methods());
    let f = vm.method_handle(class, "f", F_DESC, ACC_PUBLIC | ACC_STATIC);
    let g = vm.method_handle(class, "g", "()V", ACC_PUBLIC);

    let mut engine = HookEngine::new(vm);
    engine.attach(f, stub(), std::ptr::null_mut()).expect("attach f");
    engine.attach(g, stub(), std::ptr::null_mut()).expect("attach g");

    let vm = engine.runtime();
    let st = vm.state.borrow();
    // One redefinition per attach, each carrying the full active set.
    assert_eq!(st.redefinitions.len(), 2);

    let last = ClassFile::parse(&st.redefinitions[1].1).unwrap();
    for name in ["f", "g"] {
        assert!(method_by_name(&last, name).access_flags.contains(AccessFlags::NATIVE));
        assert!(!has_code(&last, name));
    }
    assert!(has_code(&last, "<init>"));
}

#[test]
fn detach_of_last_hook_restores_pristine_bytes() {
    let vm = MockVm::default();
    let class = vm.load_class(TARGET, &target_methods());
    let f = vm.method_handle(class, "f", F_DESC, ACC_PUBLIC | ACC_STATIC);

    let mut engine = HookEngine::new(vm);
    engine.attach(f, stub(), std::ptr::null_mut()).expect("attach");
    assert_ne!(engine.runtime().live_bytes(class), engine.runtime().pristine_bytes(class));

    engine.detach(f).expect("detach");
    assert_eq!(engine.runtime().live_bytes(class), engine.runtime().pristine_bytes(class));
}

#[test]
fn detach_keeps_remaining_hooks_applied() {
    let vm = MockVm::default();
    let class = vm.load_class(TARGET, &target_methods());
    let f = vm.method_handle(class, "f", F_DESC, ACC_PUBLIC | ACC_STATIC);
    let g = vm.method_handle(class, "g", "()V", ACC_PUBLIC);

    let mut engine = HookEngine::new(vm);
    engine.attach(f, stub(), std::ptr::null_mut()).expect("attach f");
    engine.attach(g, stub(), std::ptr::null_mut()).expect("attach g");
    engine.detach(f).expect("detach f");

    let live = ClassFile::parse(&engine.runtime().live_bytes(class)).unwrap();
    assert!(!method_by_name(&live, "f").access_flags.contains(AccessFlags::NATIVE));
    assert!(has_code(&live, "f"));
    assert!(method_by_name(&live, "g").access_flags.contains(AccessFlags::NATIVE));
    assert!(!has_code(&live, "g"));
}

#[test]
fn detach_without_hook_is_a_noop_success() {
    let vm = MockVm::default();
    let class = vm.load_class(TARGET, &target_methods());
    let f = vm.method_handle(class, "f", F_DESC, ACC_PUBLIC | ACC_STATIC);

    let mut engine = HookEngine::new(vm);
    engine.detach(f).expect("detach on unhooked class");

    let st = engine.runtime().state.borrow();
    assert!(st.redefinitions.is_empty());
    assert!(st.suspended.is_empty());
    drop(st);

    // Same for a class that has hooks, but a method that does not.
    let g = {
        let vm = engine.runtime();
        vm.method_handle(class, "g", "()V", ACC_PUBLIC)
    };
    engine.attach(f, stub(), std::ptr::null_mut()).expect("attach f");
    let before = engine.runtime().live_bytes(class);
    engine.detach(g).expect("detach unhooked method");
    assert_eq!(engine.runtime().live_bytes(class), before);
}

#[test]
fn redefine_failure_rolls_back_registration() {
    let vm = MockVm::default();
    let class = vm.load_class(TARGET, &target_methods());
    let f = vm.method_handle(class, "f", F_DESC, ACC_PUBLIC | ACC_STATIC);
    vm.state.borrow_mut().fail_redefines = 1;

    let mut engine = HookEngine::new(vm);
    let err = engine.attach(f, stub(), std::ptr::null_mut()).unwrap_err();
    assert_eq!(err, HookError::Jvmti(62));

    // The registration is gone, the live class untouched, nothing bound.
    assert!(engine.hook_argument(TARGET, "f", F_DESC).is_none());
    assert_eq!(engine.runtime().live_bytes(class), engine.runtime().pristine_bytes(class));
    assert!(engine.runtime().state.borrow().natives.is_empty());

    // And the engine is still usable: the same attach now succeeds.
    engine.attach(f, stub(), std::ptr::null_mut()).expect("attach after rollback");
}

#[test]
fn register_native_failure_restores_previous_live_state() {
    let vm = MockVm::default();
    let class = vm.load_class(TARGET, &target_methods());
    let f = vm.method_handle(class, "f", F_DESC, ACC_PUBLIC | ACC_STATIC);
    vm.state.borrow_mut().fail_register_native = true;

    let mut engine = HookEngine::new(vm);
    let err = engine.attach(f, stub(), std::ptr::null_mut()).unwrap_err();
    assert_eq!(err, HookError::Jni(-1));

    // Redefined to the patched form, then redefined back.
    {
        let st = engine.runtime().state.borrow();
        assert_eq!(st.redefinitions.len(), 2);
        assert_eq!(st.redefinitions[1].1, engine.runtime().pristine_bytes(class));
    }
    assert_eq!(engine.runtime().live_bytes(class), engine.runtime().pristine_bytes(class));
    assert!(engine.hook_argument(TARGET, "f", F_DESC).is_none());

    engine.runtime().state.borrow_mut().fail_register_native = false;
    engine.attach(f, stub(), std::ptr::null_mut()).expect("attach after rollback");
}

#[test]
fn suspension_window_excludes_the_calling_thread() {
    let vm = MockVm::default();
    let class = vm.load_class(TARGET, &target_methods());
    let f = vm.method_handle(class, "f", F_DESC, ACC_PUBLIC | ACC_STATIC);

    let mut engine = HookEngine::new(vm);
    engine.attach(f, stub(), std::ptr::null_mut()).expect("attach");

    {
        let st = engine.runtime().state.borrow();
        assert_eq!(st.suspended, vec![2, 3]);
        assert_eq!(st.resumed, vec![2, 3]);
    }

    // Detach suspends symmetrically.
    engine.detach(f).expect("detach");
    let st = engine.runtime().state.borrow();
    assert_eq!(st.suspended, vec![2, 3, 2, 3]);
    assert_eq!(st.resumed, vec![2, 3, 2, 3]);
}

#[test]
fn threads_are_resumed_on_the_failure_path_too() {
    let vm = MockVm::default();
    let class = vm.load_class(TARGET, &target_methods());
    let f = vm.method_handle(class, "f", F_DESC, ACC_PUBLIC | ACC_STATIC);
    vm.state.borrow_mut().fail_redefines = 1;

    let mut engine = HookEngine::new(vm);
    engine.attach(f, stub(), std::ptr::null_mut()).unwrap_err();

    let st = engine.runtime().state.borrow();
    assert_eq!(st.suspended, st.resumed);
    assert!(!st.suspended.is_empty());
}

#[test]
fn missing_reload_delivery_is_a_cache_error() {
    let vm = MockVm::default();
    let class = vm.load_class(TARGET, &target_methods());
    let f = vm.method_handle(class, "f", F_DESC, ACC_PUBLIC | ACC_STATIC);
    vm.state.borrow_mut().withhold_reload_bytes = true;

    let mut engine = HookEngine::new(vm);
    let err = engine.attach(f, stub(), std::ptr::null_mut()).unwrap_err();
    assert_eq!(err, HookError::ClassCache);

    // The temporary registration did not leak.
    assert!(engine.hook_argument(TARGET, "f", F_DESC).is_none());
    assert_eq!(engine.runtime().live_bytes(class), engine.runtime().pristine_bytes(class));
    // The load hook is disabled again outside the retransform window.
    assert!(!engine.runtime().state.borrow().load_hook_enabled);
}

#[test]
fn hook_argument_is_retrievable_by_identity() {
    let vm = MockVm::default();
    let class = vm.load_class(TARGET, &target_methods());
    let f = vm.method_handle(class, "f", F_DESC, ACC_PUBLIC | ACC_STATIC);

    let mut engine = HookEngine::new(vm);
    let user_data = 0x5151usize as *mut c_void;
    engine.attach(f, stub(), user_data).expect("attach");

    assert_eq!(engine.hook_argument(TARGET, "f", F_DESC), Some(user_data));
    assert!(engine.hook_argument(TARGET, "g", "()V").is_none());
}

#[test]
fn shutdown_restores_every_hooked_class() {
    let vm = MockVm::default();
    let mut handles = Vec::new();
    for i in 0..3 {
        let name = format!("demo/Target{i}");
        let class = vm.load_class(&name, &target_methods());
        let method = vm.method_handle(class, "f", F_DESC, ACC_PUBLIC | ACC_STATIC);
        handles.push((name, class, method));
    }

    let mut engine = HookEngine::new(vm);
    for (_, _, method) in &handles {
        engine.attach(*method, stub(), std::ptr::null_mut()).expect("attach");
    }

    engine.shutdown().expect("shutdown");

    for (name, class, _) in &handles {
        assert_eq!(
            engine.runtime().live_bytes(*class),
            engine.runtime().pristine_bytes(*class),
            "{name} not restored"
        );
        assert!(engine.original_class(name).is_none(), "{name} shadow not cleared");
        assert!(engine.hook_argument(name, "f", F_DESC).is_none());
    }
    assert!(!engine.runtime().state.borrow().load_hook_enabled);

    // Operations after shutdown report the engine as uninitialized.
    let (_, _, method) = &handles[0];
    assert_eq!(
        engine.attach(*method, stub(), std::ptr::null_mut()).unwrap_err(),
        HookError::Uninitialized
    );
    assert_eq!(engine.detach(*method).unwrap_err(), HookError::Uninitialized);
}
