#![allow(dead_code)]

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};
use flate2::{write::ZlibEncoder, Compression};

/// Default archive version of fixtures; 50 byte record headers and no export filler
pub const VERSION: u32 = 8;

/// From this version headers and export bodies carry 3 opaque bytes
const VERSION_FILLER: u32 = 9;

const RECORD_HEADER: usize = 50;
const COMPRESSED_PREAMBLE: usize = 23;
const COMPRESSION_NAME: usize = 32;

/// Version dependent parts of a fixture package
#[derive(Debug, Clone)]
pub struct Layout {
    pub version: u32,
    pub chunk_ids: Vec<i32>,
}

impl Default for Layout {
    fn default() -> Self {
        Layout {
            version: VERSION,
            chunk_ids: Vec::new(),
        }
    }
}

impl Layout {
    fn export_filler(&self) -> usize {
        if self.version >= VERSION_FILLER {
            3
        } else {
            0
        }
    }
}

pub fn fstring(out: &mut Vec<u8>, value: &str) {
    if value.is_empty() {
        out.write_i32::<LittleEndian>(0).unwrap();
        return;
    }
    out.write_i32::<LittleEndian>(value.len() as i32 + 1).unwrap();
    out.extend(value.as_bytes());
    out.push(0);
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Name table of a fixture package
pub struct Names(Vec<String>);

impl Names {
    pub fn new(names: &[&str]) -> Names {
        let mut all = vec!["None".to_owned()];
        all.extend(names.iter().map(|name| name.to_string()));
        Names(all)
    }

    pub fn index(&self, name: &str) -> u32 {
        self.0
            .iter()
            .position(|entry| entry == name)
            .unwrap_or_else(|| panic!("{name} is not in the fixture name table")) as u32
    }

    pub fn fname(&self, name: &str) -> Vec<u8> {
        let mut out = Vec::new();
        out.write_u32::<LittleEndian>(self.index(name)).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out
    }
}

/// Writer for property streams
pub struct Tags<'n> {
    names: &'n Names,
    out: Vec<u8>,
}

impl<'n> Tags<'n> {
    pub fn new(names: &'n Names) -> Tags<'n> {
        Tags {
            names,
            out: Vec::new(),
        }
    }

    /// Tag whose declared size is the length of `value`
    pub fn tag(self, name: &str, property_type: &str, tag_data: &[u8], value: &[u8]) -> Self {
        let size = value.len() as i32;
        self.sized(name, property_type, size, tag_data, value)
    }

    pub fn sized(
        mut self,
        name: &str,
        property_type: &str,
        size: i32,
        tag_data: &[u8],
        value: &[u8],
    ) -> Self {
        let name = self.names.fname(name);
        let property_type = self.names.fname(property_type);
        self.out.extend(name);
        self.out.extend(property_type);
        self.out.write_i32::<LittleEndian>(size).unwrap();
        self.out.write_i32::<LittleEndian>(0).unwrap();
        self.out.extend(tag_data);
        self.out.push(0);
        self.out.extend(value);
        self
    }

    pub fn int(self, name: &str, value: i32) -> Self {
        self.tag(name, "IntProperty", &[], &value.to_le_bytes())
    }

    pub fn float(self, name: &str, value: f32) -> Self {
        self.tag(name, "FloatProperty", &[], &value.to_le_bytes())
    }

    /// Struct tag data: struct type then a zero GUID
    pub fn struct_data(&self, struct_type: &str) -> Vec<u8> {
        let mut out = self.names.fname(struct_type);
        out.extend([0u8; 16]);
        out
    }

    pub fn fname(&self, name: &str) -> Vec<u8> {
        self.names.fname(name)
    }

    /// Terminate the list and return its bytes
    pub fn finish(mut self) -> Vec<u8> {
        let none = self.names.fname("None");
        self.out.extend(none);
        self.out
    }
}

pub struct Import {
    pub class_package: &'static str,
    pub class_name: &'static str,
    pub outer: i32,
    pub object_name: &'static str,
}

pub struct Export {
    pub class: i32,
    pub template: i32,
    pub outer: i32,
    pub name: &'static str,
    pub body: Vec<u8>,
}

impl Export {
    pub fn new(name: &'static str, body: Vec<u8>) -> Export {
        Export {
            class: 0,
            template: 0,
            outer: 0,
            name,
            body,
        }
    }
}

fn engine_version(out: &mut Vec<u8>) {
    out.write_u16::<LittleEndian>(4).unwrap();
    out.write_u16::<LittleEndian>(22).unwrap();
    out.write_u16::<LittleEndian>(3).unwrap();
    out.write_u32::<LittleEndian>(12345).unwrap();
    fstring(out, "++UE4+Release-4.22");
}

struct Header<'p> {
    layout: &'p Layout,
    compressed: bool,
    total_header_size: i32,
    offsets: &'p [i64],
}

fn summary(names: &Names, imports: &[Import], exports: &[Export], header: &Header) -> Vec<u8> {
    let layout = header.layout;
    let mut out = Vec::new();
    out.write_u32::<LittleEndian>(0x9E2A83C1).unwrap();
    out.write_i32::<LittleEndian>(-7).unwrap();
    out.write_i32::<LittleEndian>(0).unwrap();
    out.write_i32::<LittleEndian>(516).unwrap();
    out.write_i32::<LittleEndian>(0).unwrap();
    // one custom version
    out.write_u32::<LittleEndian>(1).unwrap();
    out.extend([7u8; 16]);
    out.write_i32::<LittleEndian>(3).unwrap();
    if layout.version >= VERSION_FILLER && !header.compressed {
        out.extend([0xAAu8; 3]);
    }
    out.write_i32::<LittleEndian>(header.total_header_size).unwrap();
    fstring(&mut out, "None");
    out.write_u32::<LittleEndian>(0x8000_0000).unwrap();
    out.write_u32::<LittleEndian>(names.0.len() as u32).unwrap();
    out.write_i32::<LittleEndian>(0).unwrap();
    out.write_i32::<LittleEndian>(0).unwrap();
    out.write_i32::<LittleEndian>(0).unwrap();
    out.write_u32::<LittleEndian>(exports.len() as u32).unwrap();
    out.write_i32::<LittleEndian>(0).unwrap();
    out.write_u32::<LittleEndian>(imports.len() as u32).unwrap();
    for _ in 0..6 {
        out.write_i32::<LittleEndian>(0).unwrap();
    }
    out.extend([1u8; 16]);
    out.write_u32::<LittleEndian>(1).unwrap();
    out.write_i32::<LittleEndian>(exports.len() as i32).unwrap();
    out.write_i32::<LittleEndian>(names.0.len() as i32).unwrap();
    engine_version(&mut out);
    engine_version(&mut out);
    out.write_u32::<LittleEndian>(0).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();
    out.write_u32::<LittleEndian>(0).unwrap();
    out.write_i32::<LittleEndian>(0).unwrap();
    out.write_i32::<LittleEndian>(0).unwrap();
    out.write_i32::<LittleEndian>(0).unwrap();
    out.write_u32::<LittleEndian>(layout.chunk_ids.len() as u32).unwrap();
    for id in &layout.chunk_ids {
        out.write_i32::<LittleEndian>(*id).unwrap();
    }
    out.extend([0xBBu8; 4]);
    out.write_i32::<LittleEndian>(0).unwrap();
    out.write_i32::<LittleEndian>(0).unwrap();

    for name in &names.0 {
        fstring(&mut out, name);
        out.write_u16::<LittleEndian>(0).unwrap();
        out.write_u16::<LittleEndian>(0).unwrap();
    }
    for import in imports {
        out.extend(names.fname(import.class_package));
        out.extend(names.fname(import.class_name));
        out.write_i32::<LittleEndian>(import.outer).unwrap();
        out.extend(names.fname(import.object_name));
    }
    for (export, offset) in exports.iter().zip(header.offsets) {
        out.write_i32::<LittleEndian>(export.class).unwrap();
        out.write_i32::<LittleEndian>(0).unwrap();
        out.write_i32::<LittleEndian>(export.template).unwrap();
        out.write_i32::<LittleEndian>(export.outer).unwrap();
        out.extend(names.fname(export.name));
        out.write_u32::<LittleEndian>(0).unwrap();
        let serial_size = layout.export_filler() + export.body.len();
        out.write_i64::<LittleEndian>(serial_size as i64).unwrap();
        out.write_i64::<LittleEndian>(*offset).unwrap();
        for _ in 0..3 {
            out.write_i32::<LittleEndian>(0).unwrap();
        }
        out.extend([0u8; 16]);
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_i32::<LittleEndian>(0).unwrap();
        out.write_i32::<LittleEndian>(1).unwrap();
        out.write_i32::<LittleEndian>(-1).unwrap();
        for _ in 0..4 {
            out.write_i32::<LittleEndian>(0).unwrap();
        }
    }
    out
}

/// The `.uasset` and `.uexp` data of one package
pub fn package(names: &Names, imports: &[Import], exports: &[Export]) -> (Vec<u8>, Vec<u8>) {
    package_with(&Layout::default(), false, names, imports, exports)
}

/// Like [`package`], for a `.uasset` stored `compressed` in an archive of `layout.version`
pub fn package_with(
    layout: &Layout,
    compressed: bool,
    names: &Names,
    imports: &[Import],
    exports: &[Export],
) -> (Vec<u8>, Vec<u8>) {
    let placeholder = vec![0; exports.len()];
    let mut header = Header {
        layout,
        compressed,
        total_header_size: 0,
        offsets: &placeholder,
    };
    let header_size = summary(names, imports, exports, &header).len() as i64;

    let mut offsets = Vec::new();
    let mut uexp = Vec::new();
    for export in exports {
        offsets.push(header_size + uexp.len() as i64);
        uexp.extend(vec![0xCCu8; layout.export_filler()]);
        uexp.extend(&export.body);
    }
    // package file tag closes every .uexp
    uexp.write_u32::<LittleEndian>(0x9E2A83C1).unwrap();

    header.total_header_size = header_size as i32;
    header.offsets = &offsets;
    let uasset = summary(names, imports, exports, &header);
    (uasset, uexp)
}

pub struct Record {
    pub name: String,
    pub data: Vec<u8>,
    pub compressed: bool,
}

impl Record {
    pub fn stored(name: &str, data: Vec<u8>) -> Record {
        Record {
            name: name.to_owned(),
            data,
            compressed: false,
        }
    }

    pub fn compressed(name: &str, data: Vec<u8>) -> Record {
        Record {
            name: name.to_owned(),
            data,
            compressed: true,
        }
    }
}

/// A version 8 archive with a legacy index
///
/// Compressed records hold one zlib block behind the record header and a 23 byte preamble.
pub fn archive(records: &[Record]) -> Vec<u8> {
    archive_with(VERSION, records)
}

/// Like [`archive`] for versions 8 and 9; version 9 adds the frozen index byte and the
/// compression method names after the footer.
pub fn archive_with(version: u32, records: &[Record]) -> Vec<u8> {
    let mut out = Vec::new();
    let mut index = Vec::new();
    fstring(&mut index, "../../../");
    index.write_u32::<LittleEndian>(records.len() as u32).unwrap();

    for record in records {
        let offset = out.len() as u64;
        out.extend([0u8; RECORD_HEADER]);

        fstring(&mut index, &record.name);
        index.write_u64::<LittleEndian>(offset).unwrap();
        if record.compressed {
            let packed = zlib(&record.data);
            out.extend([0u8; COMPRESSED_PREAMBLE]);
            out.extend(&packed);

            let start = (RECORD_HEADER + COMPRESSED_PREAMBLE) as u64;
            index.write_u64::<LittleEndian>(packed.len() as u64).unwrap();
            index.write_u64::<LittleEndian>(record.data.len() as u64).unwrap();
            index.push(1);
            index.extend([0u8; 20]);
            index.write_u32::<LittleEndian>(1).unwrap();
            index.write_u64::<LittleEndian>(start).unwrap();
            index.write_u64::<LittleEndian>(start + packed.len() as u64).unwrap();
            index.push(0);
            index.write_u32::<LittleEndian>(record.data.len() as u32).unwrap();
        } else {
            out.extend(&record.data);

            index.write_u64::<LittleEndian>(record.data.len() as u64).unwrap();
            index.write_u64::<LittleEndian>(record.data.len() as u64).unwrap();
            index.push(0);
            index.extend([0u8; 20]);
            index.push(0);
            index.write_u32::<LittleEndian>(0).unwrap();
        }
    }

    let index_offset = out.len() as u64;
    let index_size = index.len() as u64;
    out.extend(index);

    out.extend([0u8; 16]);
    out.push(0);
    out.write_u32::<LittleEndian>(0x5A6F12E1).unwrap();
    out.write_u32::<LittleEndian>(version).unwrap();
    out.write_u64::<LittleEndian>(index_offset).unwrap();
    out.write_u64::<LittleEndian>(index_size).unwrap();
    out.extend([0u8; 20]);

    if version >= VERSION_FILLER {
        out.push(0);
        let mut zlib_name = b"Zlib".to_vec();
        zlib_name.resize(COMPRESSION_NAME, 0);
        out.extend(zlib_name);
        out.extend([0u8; COMPRESSION_NAME * 4]);
    }
    out
}

/// An archive holding one package per `(path, names, imports, exports)`
pub fn package_archive(packages: &[(&str, &Names, &[Import], &[Export])]) -> Vec<u8> {
    let mut records = Vec::new();
    for (path, names, imports, exports) in packages {
        let (uasset, uexp) = package(names, imports, exports);
        records.push(Record::stored(&format!("{path}.uasset"), uasset));
        records.push(Record::stored(&format!("{path}.uexp"), uexp));
    }
    archive(&records)
}
