//! Class file codec for Java 8 through 27.
//!
//! Parses a raw `.class` byte buffer into a mutable in-memory structure and
//! serializes it back, byte-identical for untouched fields. Redefinition is
//! unforgiving: the JVM rejects (or crashes on) a malformed class, so the
//! round-trip contract here is exact, not best-effort.
//!
//! Attributes are deliberately opaque: each one is captured as its
//! `name_index` plus raw payload bytes. The hook engine only ever inspects
//! the `"Code"` and `"SourceFile"` attributes, and everything else must
//! survive the trip untouched, so the codec does not model attribute
//! semantics at all.

use bitflags::bitflags;
use thiserror::Error;

/// First four bytes of every class file.
pub const MAGIC: u32 = 0xCAFEBABE;

/// Attribute names the hook engine interprets.
pub const ATTR_CODE: &str = "Code";
pub const ATTR_SOURCE_FILE: &str = "SourceFile";

bitflags! {
    /// Class, field and method access flags.
    ///
    /// `from_bits_retain` is used on parse so flag bits this crate does not
    /// know about round-trip unchanged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AccessFlags: u16 {
        const PUBLIC       = 0x0001;
        const PRIVATE      = 0x0002;
        const PROTECTED    = 0x0004;
        const STATIC       = 0x0008;
        const FINAL        = 0x0010;
        const SUPER        = 0x0020;
        const VOLATILE     = 0x0040;
        const TRANSIENT    = 0x0080;
        const NATIVE       = 0x0100;
        const INTERFACE    = 0x0200;
        const ABSTRACT     = 0x0400;
        const STRICT       = 0x0800;
        const SYNTHETIC    = 0x1000;
        const ANNOTATION   = 0x2000;
        const ENUM         = 0x4000;
    }
}

/// Parse/serialize failure. Parsing is all-or-nothing; a partial structure
/// is never returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatError {
    #[error("unexpected end of class data")]
    UnexpectedEof,
    #[error("invalid magic: {0:#010x}")]
    InvalidMagic(u32),
    #[error("unknown constant pool tag {tag} at index {index}")]
    UnknownTag { tag: u8, index: u16 },
    #[error("invalid constant pool index: {0}")]
    InvalidIndex(u16),
    #[error("constant pool entry {0} is not valid UTF-8")]
    InvalidUtf8(u16),
}

/// One constant pool entry.
///
/// The second slot occupied by a `Long` or `Double` entry is represented as
/// `None` in the pool and must never be dereferenced, but it counts towards
/// `constant_pool_count`.
#[derive(Debug, Clone, PartialEq)]
pub enum CpInfo {
    /// Raw bytes, not `String`: class files use "modified UTF-8", which is
    /// not always valid Rust UTF-8 and must be preserved verbatim.
    Utf8(Vec<u8>),
    Integer(i32),
    /// Raw IEEE-754 bit pattern; NaN payloads round-trip exactly.
    Float(u32),
    Long(i64),
    /// Raw IEEE-754 bit pattern.
    Double(u64),
    Class { name_index: u16 },
    String { string_index: u16 },
    Fieldref { class_index: u16, name_and_type_index: u16 },
    Methodref { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodref { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
}

impl CpInfo {
    pub fn tag(&self) -> u8 {
        match self {
            CpInfo::Utf8(_) => 1,
            CpInfo::Integer(_) => 3,
            CpInfo::Float(_) => 4,
            CpInfo::Long(_) => 5,
            CpInfo::Double(_) => 6,
            CpInfo::Class { .. } => 7,
            CpInfo::String { .. } => 8,
            CpInfo::Fieldref { .. } => 9,
            CpInfo::Methodref { .. } => 10,
            CpInfo::InterfaceMethodref { .. } => 11,
            CpInfo::NameAndType { .. } => 12,
            CpInfo::MethodHandle { .. } => 15,
            CpInfo::MethodType { .. } => 16,
            CpInfo::InvokeDynamic { .. } => 18,
        }
    }
}

/// The constant pool, 1-indexed. Slot 0 is reserved and unused.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantPool {
    entries: Vec<Option<CpInfo>>,
}

impl ConstantPool {
    /// The value written as `constant_pool_count`: highest used index + 1,
    /// including the unusable slots after 8-byte constants.
    pub fn count(&self) -> u16 {
        self.entries.len() as u16
    }

    pub fn get(&self, index: u16) -> Result<&CpInfo, FormatError> {
        if index == 0 {
            return Err(FormatError::InvalidIndex(index));
        }
        self.entries
            .get(index as usize)
            .and_then(|e| e.as_ref())
            .ok_or(FormatError::InvalidIndex(index))
    }

    /// Lends a `&str` view of a Utf8 entry.
    pub fn utf8_at(&self, index: u16) -> Result<&str, FormatError> {
        match self.get(index)? {
            CpInfo::Utf8(bytes) => {
                std::str::from_utf8(bytes).map_err(|_| FormatError::InvalidUtf8(index))
            }
            _ => Err(FormatError::InvalidIndex(index)),
        }
    }

    /// Replaces the contents of an existing Utf8 entry.
    pub fn set_utf8(&mut self, index: u16, value: Vec<u8>) -> Result<(), FormatError> {
        match self
            .entries
            .get_mut(index as usize)
            .and_then(|e| e.as_mut())
        {
            Some(CpInfo::Utf8(bytes)) => {
                *bytes = value;
                Ok(())
            }
            _ => Err(FormatError::InvalidIndex(index)),
        }
    }

    /// Iterates over used slots as `(index, entry)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (u16, &CpInfo)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|entry| (i as u16, entry)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub access_flags: AccessFlags,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<AttributeInfo>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub access_flags: AccessFlags,
    pub name_index: u16,
    pub descriptor_index: u16,
    pub attributes: Vec<AttributeInfo>,
}

/// An attribute captured as its name index plus opaque payload.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    pub name_index: u16,
    pub info: Vec<u8>,
}

/// Parsed form of one binary class definition.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
    pub magic: u32,
    pub minor_version: u16,
    pub major_version: u16,
    pub constant_pool: ConstantPool,
    pub access_flags: AccessFlags,
    pub this_class: u16,
    pub super_class: u16,
    pub interfaces: Vec<u16>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub attributes: Vec<AttributeInfo>,
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn read_u1(&mut self) -> Result<u8, FormatError> {
        if self.remaining() < 1 {
            return Err(FormatError::UnexpectedEof);
        }
        let v = self.data[self.pos];
        self.pos += 1;
        Ok(v)
    }

    fn read_u2(&mut self) -> Result<u16, FormatError> {
        if self.remaining() < 2 {
            return Err(FormatError::UnexpectedEof);
        }
        let v = u16::from_be_bytes([self.data[self.pos], self.data[self.pos + 1]]);
        self.pos += 2;
        Ok(v)
    }

    fn read_u4(&mut self) -> Result<u32, FormatError> {
        if self.remaining() < 4 {
            return Err(FormatError::UnexpectedEof);
        }
        let v = u32::from_be_bytes([
            self.data[self.pos],
            self.data[self.pos + 1],
            self.data[self.pos + 2],
            self.data[self.pos + 3],
        ]);
        self.pos += 4;
        Ok(v)
    }

    fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], FormatError> {
        if self.remaining() < len {
            return Err(FormatError::UnexpectedEof);
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }
}

struct Writer {
    out: Vec<u8>,
}

impl Writer {
    fn new() -> Self {
        Self { out: Vec::new() }
    }

    fn write_u1(&mut self, v: u8) {
        self.out.push(v);
    }

    fn write_u2(&mut self, v: u16) {
        self.out.extend_from_slice(&v.to_be_bytes());
    }

    fn write_u4(&mut self, v: u32) {
        self.out.extend_from_slice(&v.to_be_bytes());
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        self.out.extend_from_slice(bytes);
    }
}

impl ClassFile {
    /// Parses a class file. All-or-nothing: any truncation, bad magic or
    /// unknown constant pool tag fails the whole parse.
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        let mut r = Reader::new(bytes);

        let magic = r.read_u4()?;
        if magic != MAGIC {
            return Err(FormatError::InvalidMagic(magic));
        }

        let minor_version = r.read_u2()?;
        let major_version = r.read_u2()?;

        let constant_pool = parse_constant_pool(&mut r)?;

        let access_flags = AccessFlags::from_bits_retain(r.read_u2()?);
        let this_class = r.read_u2()?;
        let super_class = r.read_u2()?;

        let interfaces_count = r.read_u2()?;
        let mut interfaces = Vec::with_capacity(interfaces_count as usize);
        for _ in 0..interfaces_count {
            interfaces.push(r.read_u2()?);
        }

        let fields_count = r.read_u2()?;
        let mut fields = Vec::with_capacity(fields_count as usize);
        for _ in 0..fields_count {
            let access_flags = AccessFlags::from_bits_retain(r.read_u2()?);
            let name_index = r.read_u2()?;
            let descriptor_index = r.read_u2()?;
            let attributes = parse_attributes(&mut r)?;
            fields.push(FieldInfo { access_flags, name_index, descriptor_index, attributes });
        }

        let methods_count = r.read_u2()?;
        let mut methods = Vec::with_capacity(methods_count as usize);
        for _ in 0..methods_count {
            let access_flags = AccessFlags::from_bits_retain(r.read_u2()?);
            let name_index = r.read_u2()?;
            let descriptor_index = r.read_u2()?;
            let attributes = parse_attributes(&mut r)?;
            methods.push(MethodInfo { access_flags, name_index, descriptor_index, attributes });
        }

        let attributes = parse_attributes(&mut r)?;

        Ok(Self {
            magic,
            minor_version,
            major_version,
            constant_pool,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            attributes,
        })
    }

    /// Serializes back to bytes. Every count is recomputed from the current
    /// sequence lengths; stored counts are never trusted, since patches
    /// change attribute counts.
    pub fn serialize(&self) -> Vec<u8> {
        let mut w = Writer::new();

        w.write_u4(self.magic);
        w.write_u2(self.minor_version);
        w.write_u2(self.major_version);

        w.write_u2(self.constant_pool.count());
        for (_, entry) in self.constant_pool.iter() {
            write_cp_info(&mut w, entry);
        }

        w.write_u2(self.access_flags.bits());
        w.write_u2(self.this_class);
        w.write_u2(self.super_class);

        w.write_u2(self.interfaces.len() as u16);
        for &iface in &self.interfaces {
            w.write_u2(iface);
        }

        w.write_u2(self.fields.len() as u16);
        for field in &self.fields {
            w.write_u2(field.access_flags.bits());
            w.write_u2(field.name_index);
            w.write_u2(field.descriptor_index);
            write_attributes(&mut w, &field.attributes);
        }

        w.write_u2(self.methods.len() as u16);
        for method in &self.methods {
            w.write_u2(method.access_flags.bits());
            w.write_u2(method.name_index);
            w.write_u2(method.descriptor_index);
            write_attributes(&mut w, &method.attributes);
        }

        write_attributes(&mut w, &self.attributes);

        w.out
    }

    /// The class's internal name (e.g. `java/lang/String`), resolved through
    /// `this_class`.
    pub fn class_name(&self) -> Result<&str, FormatError> {
        match self.constant_pool.get(self.this_class)? {
            CpInfo::Class { name_index } => self.constant_pool.utf8_at(*name_index),
            _ => Err(FormatError::InvalidIndex(self.this_class)),
        }
    }
}

fn parse_constant_pool(r: &mut Reader) -> Result<ConstantPool, FormatError> {
    let count = r.read_u2()? as usize;
    let mut entries: Vec<Option<CpInfo>> = Vec::with_capacity(count);
    entries.push(None); // index 0 is reserved

    let mut i = 1;
    while i < count {
        let tag = r.read_u1()?;
        let entry = match tag {
            1 => {
                let len = r.read_u2()? as usize;
                CpInfo::Utf8(r.read_bytes(len)?.to_vec())
            }
            3 => CpInfo::Integer(r.read_u4()? as i32),
            4 => CpInfo::Float(r.read_u4()?),
            5 => {
                let high = r.read_u4()? as u64;
                let low = r.read_u4()? as u64;
                entries.push(Some(CpInfo::Long(((high << 32) | low) as i64)));
                entries.push(None); // second slot of an 8-byte constant
                i += 2;
                continue;
            }
            6 => {
                let high = r.read_u4()? as u64;
                let low = r.read_u4()? as u64;
                entries.push(Some(CpInfo::Double((high << 32) | low)));
                entries.push(None);
                i += 2;
                continue;
            }
            7 => CpInfo::Class { name_index: r.read_u2()? },
            8 => CpInfo::String { string_index: r.read_u2()? },
            9 => CpInfo::Fieldref { class_index: r.read_u2()?, name_and_type_index: r.read_u2()? },
            10 => CpInfo::Methodref { class_index: r.read_u2()?, name_and_type_index: r.read_u2()? },
            11 => CpInfo::InterfaceMethodref {
                class_index: r.read_u2()?,
                name_and_type_index: r.read_u2()?,
            },
            12 => CpInfo::NameAndType { name_index: r.read_u2()?, descriptor_index: r.read_u2()? },
            15 => CpInfo::MethodHandle { reference_kind: r.read_u1()?, reference_index: r.read_u2()? },
            16 => CpInfo::MethodType { descriptor_index: r.read_u2()? },
            18 => CpInfo::InvokeDynamic {
                bootstrap_method_attr_index: r.read_u2()?,
                name_and_type_index: r.read_u2()?,
            },
            _ => return Err(FormatError::UnknownTag { tag, index: i as u16 }),
        };

        entries.push(Some(entry));
        i += 1;
    }

    Ok(ConstantPool { entries })
}

fn parse_attributes(r: &mut Reader) -> Result<Vec<AttributeInfo>, FormatError> {
    let count = r.read_u2()? as usize;
    let mut attrs = Vec::with_capacity(count);
    for _ in 0..count {
        let name_index = r.read_u2()?;
        let length = r.read_u4()? as usize;
        let info = r.read_bytes(length)?.to_vec();
        attrs.push(AttributeInfo { name_index, info });
    }
    Ok(attrs)
}

fn write_cp_info(w: &mut Writer, entry: &CpInfo) {
    w.write_u1(entry.tag());
    match entry {
        CpInfo::Utf8(bytes) => {
            w.write_u2(bytes.len() as u16);
            w.write_bytes(bytes);
        }
        CpInfo::Integer(v) => w.write_u4(*v as u32),
        CpInfo::Float(bits) => w.write_u4(*bits),
        CpInfo::Long(v) => {
            let v = *v as u64;
            w.write_u4((v >> 32) as u32);
            w.write_u4(v as u32);
        }
        CpInfo::Double(bits) => {
            w.write_u4((bits >> 32) as u32);
            w.write_u4(*bits as u32);
        }
        CpInfo::Class { name_index } => w.write_u2(*name_index),
        CpInfo::String { string_index } => w.write_u2(*string_index),
        CpInfo::Fieldref { class_index, name_and_type_index }
        | CpInfo::Methodref { class_index, name_and_type_index }
        | CpInfo::InterfaceMethodref { class_index, name_and_type_index } => {
            w.write_u2(*class_index);
            w.write_u2(*name_and_type_index);
        }
        CpInfo::NameAndType { name_index, descriptor_index } => {
            w.write_u2(*name_index);
            w.write_u2(*descriptor_index);
        }
        CpInfo::MethodHandle { reference_kind, reference_index } => {
            w.write_u1(*reference_kind);
            w.write_u2(*reference_index);
        }
        CpInfo::MethodType { descriptor_index } => w.write_u2(*descriptor_index),
        CpInfo::InvokeDynamic { bootstrap_method_attr_index, name_and_type_index } => {
            w.write_u2(*bootstrap_method_attr_index);
            w.write_u2(*name_and_type_index);
        }
    }
}

fn write_attributes(w: &mut Writer, attrs: &[AttributeInfo]) {
    w.write_u2(attrs.len() as u16);
    for attr in attrs {
        w.write_u2(attr.name_index);
        w.write_u4(attr.info.len() as u32);
        w.write_bytes(&attr.info);
    }
}
