//! Tagged property streams: the serialized state of every export.
//!
//! A property list is a run of tags terminated by the name `None`. Each tag names the property,
//! its type and the size of its value, followed by type specific tag data and the value itself.

use std::fmt;

use binrw::BinRead;
use byteorder::{LittleEndian, ReadBytesExt};
use tracing::{debug, trace, warn};
use uepak_archive::PakCursor;

use crate::{
    class::ClassValue,
    codec::{name_at, read_fname, read_le, Guid, ScriptDelegate, SoftObjectPath, Text},
    error::{Error, Result},
    package_index::PackageIndex,
    registry::{Registry, StructContext, StructDecoder},
    structs::StructValue,
    summary::{ObjectExport, PackageSummary},
};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Name that terminates a property list
pub const NONE_NAME: &str = "None";

/// Deepest nesting of property lists that is decoded
pub const MAX_NESTING_DEPTH: usize = 64;

/// Width hint used for map keys, which carry no size of their own
const MAP_KEY_SIZE_HINT: i32 = 8;

/// Width hint used for map values
const MAP_VALUE_SIZE_HINT: i32 = -4;

/// Width hint used for array and set elements
const ELEMENT_SIZE_HINT: i32 = -1;

/// Known property types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(into = "String"))]
pub enum PropertyType {
    Bool,
    Int8,
    Int16,
    Int,
    Int64,
    Byte,
    UInt16,
    UInt32,
    UInt64,
    Float,
    Double,
    Str,
    Name,
    Text,
    Object,
    SoftObject,
    Interface,
    Delegate,
    Enum,
    Struct,
    Array,
    Map,
    Set,
    /// Type without a decoder, holding its name
    Unknown(String),
}

impl PropertyType {
    pub fn as_str(&self) -> &str {
        match self {
            PropertyType::Bool => "BoolProperty",
            PropertyType::Int8 => "Int8Property",
            PropertyType::Int16 => "Int16Property",
            PropertyType::Int => "IntProperty",
            PropertyType::Int64 => "Int64Property",
            PropertyType::Byte => "ByteProperty",
            PropertyType::UInt16 => "UInt16Property",
            PropertyType::UInt32 => "UInt32Property",
            PropertyType::UInt64 => "UInt64Property",
            PropertyType::Float => "FloatProperty",
            PropertyType::Double => "DoubleProperty",
            PropertyType::Str => "StrProperty",
            PropertyType::Name => "NameProperty",
            PropertyType::Text => "TextProperty",
            PropertyType::Object => "ObjectProperty",
            PropertyType::SoftObject => "SoftObjectProperty",
            PropertyType::Interface => "InterfaceProperty",
            PropertyType::Delegate => "DelegateProperty",
            PropertyType::Enum => "EnumProperty",
            PropertyType::Struct => "StructProperty",
            PropertyType::Array => "ArrayProperty",
            PropertyType::Map => "MapProperty",
            PropertyType::Set => "SetProperty",
            PropertyType::Unknown(name) => name,
        }
    }
}

impl From<&str> for PropertyType {
    fn from(value: &str) -> Self {
        match value.trim_end_matches('\0') {
            "BoolProperty" => PropertyType::Bool,
            "Int8Property" => PropertyType::Int8,
            "Int16Property" => PropertyType::Int16,
            "IntProperty" => PropertyType::Int,
            "Int64Property" => PropertyType::Int64,
            "ByteProperty" => PropertyType::Byte,
            "UInt16Property" => PropertyType::UInt16,
            "UInt32Property" => PropertyType::UInt32,
            "UInt64Property" => PropertyType::UInt64,
            "FloatProperty" => PropertyType::Float,
            "DoubleProperty" => PropertyType::Double,
            "StrProperty" => PropertyType::Str,
            "NameProperty" => PropertyType::Name,
            "TextProperty" => PropertyType::Text,
            "ObjectProperty" => PropertyType::Object,
            "SoftObjectProperty" => PropertyType::SoftObject,
            "InterfaceProperty" => PropertyType::Interface,
            "DelegateProperty" => PropertyType::Delegate,
            "EnumProperty" => PropertyType::Enum,
            "StructProperty" => PropertyType::Struct,
            "ArrayProperty" => PropertyType::Array,
            "MapProperty" => PropertyType::Map,
            "SetProperty" => PropertyType::Set,
            other => PropertyType::Unknown(other.to_owned()),
        }
    }
}

impl From<PropertyType> for String {
    fn from(value: PropertyType) -> Self {
        value.as_str().to_owned()
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type specific data stored in a tag ahead of the value
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum TagData {
    Struct { type_name: String, guid: Guid },
    /// The value of a bool property, which has no value region
    Bool(bool),
    /// Enum of a byte or enum property
    EnumName(String),
    /// Element type of an array or set
    InnerType(String),
    Map { key_type: String, value_type: String },
}

/// Header and value of one property
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct PropertyTag {
    pub name: String,
    pub property_type: PropertyType,
    /// Declared size of the value region
    pub size: i32,
    pub array_index: i32,
    pub tag_data: Option<TagData>,
    pub property_guid: Option<Guid>,
    pub value: Option<PropertyValue>,
}

/// Elements of an array property
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ArrayValue {
    /// Tag shared by every element of a struct array
    pub inner_tag: Option<Box<PropertyTag>>,
    pub elements: Vec<PropertyValue>,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct MapEntry {
    pub key: PropertyValue,
    pub value: Option<PropertyValue>,
}

/// Decoded property value
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(untagged))]
pub enum PropertyValue {
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int(i32),
    Int64(i64),
    Byte(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    Str(String),
    Name(String),
    Text(Text),
    Object(PackageIndex),
    SoftObject(SoftObjectPath),
    Interface(u32),
    Delegate(ScriptDelegate),
    Struct(StructValue),
    Array(ArrayValue),
    Map(Vec<MapEntry>),
    Set(Vec<PropertyValue>),
}

/// What a value decoder knows about the value in front of it
#[derive(Debug, Clone, Copy)]
struct ValueContext<'t> {
    name: Option<&'t str>,
    /// Declared size, or a width hint when not declared
    size: i32,
    declared: bool,
    tag_data: Option<&'t TagData>,
}

impl<'t> ValueContext<'t> {
    fn implied(size: i32, tag_data: Option<&'t TagData>) -> Self {
        ValueContext {
            name: None,
            size,
            declared: false,
            tag_data,
        }
    }

    fn property(&self) -> String {
        self.name.unwrap_or_default().to_owned()
    }
}

/// Reads property streams of one package
///
/// Name references are resolved against the package's name table, struct and class payloads
/// go through the registry.
pub struct PropertyReader<'a> {
    cursor: &'a mut PakCursor,
    summary: &'a PackageSummary,
    registry: &'a Registry,
}

impl<'a> PropertyReader<'a> {
    pub fn new(
        cursor: &'a mut PakCursor,
        summary: &'a PackageSummary,
        registry: &'a Registry,
    ) -> PropertyReader<'a> {
        PropertyReader {
            cursor,
            summary,
            registry,
        }
    }

    /// The cursor, positioned at the next unread byte
    pub fn cursor(&mut self) -> &mut PakCursor {
        self.cursor
    }

    pub fn summary(&self) -> &'a PackageSummary {
        self.summary
    }

    pub fn registry(&self) -> &'a Registry {
        self.registry
    }

    /// Read a name reference
    pub fn read_name(&mut self) -> Result<String> {
        read_fname(self.cursor, &self.summary.names)
    }

    pub fn read_package_index(&mut self) -> Result<PackageIndex> {
        Ok(PackageIndex(self.cursor.read_i32::<LittleEndian>()?))
    }

    /// Read a property list up to and including its terminator
    pub fn read_properties(&mut self) -> Result<Vec<PropertyTag>> {
        self.read_property_list(0)
    }

    /// Payload of `class_name` read by its registered class resolver
    pub(crate) fn read_class_payload(
        &mut self,
        export: &ObjectExport,
        class_name: &str,
        size: u64,
    ) -> Result<Option<ClassValue>> {
        let registry = self.registry;
        let start = self.cursor.track();

        let value = match registry.class_resolver(class_name) {
            None => {
                warn!(
                    export = %export.object_name,
                    class = class_name,
                    size,
                    "unknown export class type"
                );
                None
            }
            Some(resolver) => match resolver(self, export, size) {
                Ok(Some(value)) => Some(value),
                Ok(None) => {
                    warn!(class = class_name, size, "unread class payload");
                    None
                }
                Err(e) if e.is_recoverable() => {
                    warn!(class = class_name, size, error = %e, "skipping class payload");
                    None
                }
                Err(e) => return Err(e),
            },
        };

        // leave the cursor at the end of the payload
        let consumed = self.cursor.untrack(start);
        if consumed < size {
            self.cursor.skip(size - consumed)?;
        }
        Ok(value)
    }

    fn read_property_list(&mut self, depth: usize) -> Result<Vec<PropertyTag>> {
        if depth > MAX_NESTING_DEPTH {
            return Err(Error::InvalidLength {
                context: "property nesting depth",
                value: depth as i64,
            });
        }

        let mut properties = Vec::new();
        while let Some(tag) = self.read_tag(true, depth)? {
            properties.push(tag);
        }
        Ok(properties)
    }

    /// Read one tag, and its value when `read_data` is set
    ///
    /// Returns `None` at the terminator of a property list. The value never consumes more than
    /// the declared size, and always consumes all of it.
    pub fn read_tag(&mut self, read_data: bool, depth: usize) -> Result<Option<PropertyTag>> {
        let names = &self.summary.names;
        let index = self.cursor.read_u32::<LittleEndian>()?;
        let number = self.cursor.read_u32::<LittleEndian>()?;
        // the terminator ends the list whatever its instance number
        match names.get(index as usize) {
            Some(entry) if entry.name == NONE_NAME => return Ok(None),
            _ => {}
        }
        let name = name_at(names, index, number)?;

        let property_type = PropertyType::from(self.read_name()?.as_str());
        let size = self.cursor.read_i32::<LittleEndian>()?;
        let array_index = self.cursor.read_i32::<LittleEndian>()?;
        trace!(depth, %name, %property_type, size, "reading property");

        let tag_data = match property_type {
            PropertyType::Struct => Some(TagData::Struct {
                type_name: self.read_name()?,
                guid: read_le(self.cursor)?,
            }),
            PropertyType::Bool => Some(TagData::Bool(self.cursor.read_u8()? != 0)),
            PropertyType::Byte | PropertyType::Enum => Some(TagData::EnumName(self.read_name()?)),
            PropertyType::Array | PropertyType::Set => {
                Some(TagData::InnerType(self.read_name()?))
            }
            PropertyType::Map => Some(TagData::Map {
                key_type: self.read_name()?,
                value_type: self.read_name()?,
            }),
            _ => None,
        };

        let property_guid = match self.cursor.read_u8()? {
            0 => None,
            _ => Some(read_le(self.cursor)?),
        };

        let mut tag = PropertyTag {
            name,
            property_type,
            size,
            array_index,
            tag_data,
            property_guid,
            value: None,
        };

        if read_data && (size > 0 || tag.property_type == PropertyType::Bool) {
            tag.value = self.read_declared_value(&tag, depth)?;
        }

        Ok(Some(tag))
    }

    fn read_declared_value(
        &mut self,
        tag: &PropertyTag,
        depth: usize,
    ) -> Result<Option<PropertyValue>> {
        let declared = tag.size.max(0) as u64;
        self.cursor.preload(declared as usize)?;
        let start = self.cursor.track();

        let context = ValueContext {
            name: Some(&tag.name),
            size: tag.size,
            declared: true,
            tag_data: tag.tag_data.as_ref(),
        };
        let value = match self.read_value(&tag.property_type, &context, depth) {
            Ok(value) => value,
            Err(e) if e.is_recoverable() => {
                warn!(
                    depth,
                    property = %tag.name,
                    property_type = %tag.property_type,
                    size = tag.size,
                    error = %e,
                    "skipping property"
                );
                None
            }
            Err(e) => return Err(e),
        };

        let consumed = self.cursor.untrack(start);
        if consumed > declared {
            return Err(Error::Overconsumed {
                name: tag.name.clone(),
                declared: tag.size,
                consumed,
            });
        }
        if consumed < declared {
            if value.is_some() {
                warn!(
                    depth,
                    property = %tag.name,
                    property_type = %tag.property_type,
                    consumed,
                    declared,
                    "property not read completely"
                );
            }
            self.cursor.skip(declared - consumed)?;
        }

        Ok(value)
    }

    fn read_value(
        &mut self,
        property_type: &PropertyType,
        context: &ValueContext<'_>,
        depth: usize,
    ) -> Result<Option<PropertyValue>> {
        let cursor = &mut *self.cursor;
        let value = match property_type {
            PropertyType::Bool => match context.tag_data {
                Some(TagData::Bool(value)) => PropertyValue::Bool(*value),
                _ => PropertyValue::Bool(cursor.read_u8()? != 0),
            },
            PropertyType::Int8 => PropertyValue::Int8(cursor.read_i8()?),
            PropertyType::Int16 => PropertyValue::Int16(cursor.read_i16::<LittleEndian>()?),
            PropertyType::Int => PropertyValue::Int(cursor.read_i32::<LittleEndian>()?),
            PropertyType::Int64 => PropertyValue::Int64(cursor.read_i64::<LittleEndian>()?),
            PropertyType::UInt16 => PropertyValue::UInt16(cursor.read_u16::<LittleEndian>()?),
            PropertyType::UInt32 => PropertyValue::UInt32(cursor.read_u32::<LittleEndian>()?),
            PropertyType::UInt64 => PropertyValue::UInt64(cursor.read_u64::<LittleEndian>()?),
            PropertyType::Float => PropertyValue::Float(read_finite(cursor)?),
            PropertyType::Double => PropertyValue::Double(cursor.read_f64::<LittleEndian>()?),
            PropertyType::Str => PropertyValue::Str(cursor.read_fstring()?),
            PropertyType::Name => PropertyValue::Name(self.read_name()?),
            PropertyType::Text => PropertyValue::Text(Text::read(cursor)?),
            PropertyType::Object => PropertyValue::Object(self.read_package_index()?),
            PropertyType::SoftObject => PropertyValue::SoftObject(SoftObjectPath::read_le_args(
                cursor,
                (self.summary.names.as_slice(),),
            )?),
            PropertyType::Interface => {
                PropertyValue::Interface(cursor.read_u32::<LittleEndian>()?)
            }
            PropertyType::Delegate => PropertyValue::Delegate(ScriptDelegate::read_le_args(
                cursor,
                (self.summary.names.as_slice(),),
            )?),
            PropertyType::Enum if context.declared && context.size == 0 => return Ok(None),
            PropertyType::Enum if !context.declared => PropertyValue::Name(self.read_name()?),
            PropertyType::Byte | PropertyType::Enum => match context.size {
                4 | -4 => PropertyValue::UInt32(cursor.read_u32::<LittleEndian>()?),
                n if n >= 8 => PropertyValue::Name(self.read_name()?),
                _ => PropertyValue::Byte(cursor.read_u8()?),
            },
            PropertyType::Struct => return self.read_struct(context, depth),
            PropertyType::Array => self.read_array(context, depth)?,
            PropertyType::Map => self.read_map(context, depth)?,
            PropertyType::Set => self.read_set(context, depth)?,
            PropertyType::Unknown(name) => {
                if !context.declared {
                    return Err(Error::UnsupportedProperty(name.clone()));
                }
                debug!(depth, property_type = %name, size = context.size, "unread property type");
                cursor.skip(context.size.max(0) as u64)?;
                return Ok(None);
            }
        };

        Ok(Some(value))
    }

    fn read_struct(
        &mut self,
        context: &ValueContext<'_>,
        depth: usize,
    ) -> Result<Option<PropertyValue>> {
        if let Some(TagData::Struct { type_name, .. }) = context.tag_data {
            trace!(depth, struct_type = %type_name, "reading struct");

            let registry = self.registry;
            match registry.struct_decoder(type_name) {
                Some(StructDecoder::Decode(resolver)) => {
                    let struct_context = StructContext {
                        type_name,
                        size: context.declared.then_some(context.size),
                    };
                    return match resolver(self, &struct_context)? {
                        Some(value) => Ok(Some(PropertyValue::Struct(value))),
                        None => Err(Error::UnsupportedStruct(type_name.clone())),
                    };
                }
                Some(StructDecoder::Unsupported) => {
                    return Err(Error::UnsupportedStruct(type_name.clone()));
                }
                None => {}
            }
        }

        let properties = self.read_property_list(depth + 1)?;
        Ok(Some(PropertyValue::Struct(StructValue::Properties(
            properties,
        ))))
    }

    fn read_array(&mut self, context: &ValueContext<'_>, depth: usize) -> Result<PropertyValue> {
        let Some(TagData::InnerType(inner)) = context.tag_data else {
            return Err(Error::UnsupportedArrayElement(String::new()));
        };
        let inner = PropertyType::from(inner.as_str());
        let count = self.read_count("array length")?;

        let inner_tag = match inner {
            PropertyType::Struct => match self.read_tag(false, depth + 1)? {
                Some(tag) => Some(Box::new(tag)),
                None => return Err(Error::MissingTemplateTag(context.property())),
            },
            _ => None,
        };
        let inner_data = inner_tag.as_ref().and_then(|tag| tag.tag_data.as_ref());

        let mut elements = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            elements.push(self.read_element(&inner, context.size - 4, count, inner_data, depth)?);
        }

        Ok(PropertyValue::Array(ArrayValue {
            inner_tag,
            elements,
        }))
    }

    fn read_set(&mut self, context: &ValueContext<'_>, depth: usize) -> Result<PropertyValue> {
        let Some(TagData::InnerType(inner)) = context.tag_data else {
            return Err(Error::UnsupportedArrayElement(String::new()));
        };
        let inner = PropertyType::from(inner.as_str());

        let removed = self.cursor.read_u32::<LittleEndian>()?;
        if removed != 0 {
            return Err(Error::UnsupportedMapRemoval(removed));
        }
        let count = self.read_count("set length")?;

        let mut elements = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            elements.push(self.read_element(&inner, context.size - 8, count, None, depth)?);
        }

        Ok(PropertyValue::Set(elements))
    }

    /// Element of an array or set; `payload` is the size left after the container's counts
    fn read_element(
        &mut self,
        inner: &PropertyType,
        payload: i32,
        count: usize,
        inner_data: Option<&TagData>,
        depth: usize,
    ) -> Result<PropertyValue> {
        let value = match inner {
            PropertyType::Bool => PropertyValue::Bool(self.cursor.read_u8()? != 0),
            PropertyType::Byte => {
                if i64::from(payload) / count as i64 == 1 {
                    PropertyValue::Byte(self.cursor.read_u8()?)
                } else {
                    PropertyValue::Name(self.read_name()?)
                }
            }
            PropertyType::Enum | PropertyType::Name => PropertyValue::Name(self.read_name()?),
            PropertyType::Struct => {
                let context = ValueContext::implied(ELEMENT_SIZE_HINT, inner_data);
                match self.read_struct(&context, depth + 1)? {
                    Some(value) => value,
                    None => return Err(Error::UnsupportedArrayElement(inner.to_string())),
                }
            }
            PropertyType::Int8
            | PropertyType::Int16
            | PropertyType::Int
            | PropertyType::Int64
            | PropertyType::UInt16
            | PropertyType::UInt32
            | PropertyType::UInt64
            | PropertyType::Float
            | PropertyType::Double
            | PropertyType::Str
            | PropertyType::Text
            | PropertyType::Object
            | PropertyType::SoftObject
            | PropertyType::Interface
            | PropertyType::Delegate => {
                let context = ValueContext::implied(ELEMENT_SIZE_HINT, None);
                match self.read_value(inner, &context, depth + 1)? {
                    Some(value) => value,
                    None => return Err(Error::UnsupportedArrayElement(inner.to_string())),
                }
            }
            PropertyType::Array
            | PropertyType::Map
            | PropertyType::Set
            | PropertyType::Unknown(_) => {
                return Err(Error::UnsupportedArrayElement(inner.to_string()))
            }
        };
        Ok(value)
    }

    fn read_map(&mut self, context: &ValueContext<'_>, depth: usize) -> Result<PropertyValue> {
        let Some(TagData::Map {
            key_type,
            value_type,
        }) = context.tag_data
        else {
            return Err(Error::UnsupportedMapKey {
                property: context.property(),
            });
        };

        let mut key_type = PropertyType::from(key_type.as_str());
        let mut value_type = PropertyType::from(value_type.as_str());
        let mut key_data = None;
        let mut value_data = None;

        let registry = self.registry;
        let map_override = context
            .name
            .and_then(|name| registry.map_property_override(name));
        if let Some(map_override) = map_override {
            match key_type {
                PropertyType::Struct => key_data = Some(map_override.key_data()),
                _ => key_type = PropertyType::from(map_override.key_type.as_str()),
            }
            match value_type {
                PropertyType::Struct => value_data = Some(map_override.value_data()),
                _ => value_type = PropertyType::from(map_override.value_type.as_str()),
            }
        }

        if key_type == PropertyType::Struct && key_data.is_none() {
            return Err(Error::UnsupportedMapKey {
                property: context.property(),
            });
        }
        trace!(depth, size = context.size, %key_type, %value_type, "reading map");

        let removed = self.cursor.read_u32::<LittleEndian>()?;
        if removed != 0 {
            return Err(Error::UnsupportedMapRemoval(removed));
        }
        let count = self.read_count("map length")?;

        let key_context = ValueContext::implied(MAP_KEY_SIZE_HINT, key_data.as_ref());
        let value_context = ValueContext::implied(MAP_VALUE_SIZE_HINT, value_data.as_ref());

        let mut entries = Vec::with_capacity(count.min(1024));
        for _ in 0..count {
            let Some(key) = self.read_value(&key_type, &key_context, depth + 1)? else {
                return Err(Error::UnsupportedMapKey {
                    property: context.property(),
                });
            };
            let value = self.read_value(&value_type, &value_context, depth + 1)?;
            entries.push(MapEntry { key, value });
        }

        Ok(PropertyValue::Map(entries))
    }

    fn read_count(&mut self, context: &'static str) -> Result<usize> {
        let count = self.cursor.read_i32::<LittleEndian>()?;
        usize::try_from(count).map_err(|_| Error::InvalidLength {
            context,
            value: count.into(),
        })
    }
}

fn read_finite(cursor: &mut PakCursor) -> Result<f32> {
    let value = cursor.read_f32::<LittleEndian>()?;
    if !value.is_finite() {
        return Err(Error::NonFiniteFloat(value));
    }
    Ok(value)
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use std::io::Cursor;

    use byteorder::ReadBytesExt;
    use uepak_archive::PakCursor;

    use crate::{
        error::Result,
        property::{PropertyReader, PropertyType},
        registry::Registry,
        summary::{ObjectExport, PackageSummary},
    };

    #[test]
    fn property_type_names() {
        for name in ["IntProperty", "StructProperty", "SetProperty", "DoubleProperty"] {
            assert_eq!(PropertyType::from(name).as_str(), name);
        }
        assert_eq!(PropertyType::from("BoolProperty\0"), PropertyType::Bool);
        assert_eq!(
            PropertyType::from("FieldPathProperty"),
            PropertyType::Unknown("FieldPathProperty".into())
        );
    }

    #[test]
    fn class_payload_is_consumed_entirely() -> Result<()> {
        let summary = PackageSummary::default();
        let export = ObjectExport::default();
        let mut registry = Registry::new();
        registry.register_class_resolver("Partial", |reader, _, _| {
            reader.cursor().read_u16::<byteorder::LittleEndian>()?;
            Ok(None)
        });

        let mut cursor = PakCursor::with_preload(Cursor::new(vec![0u8; 16]), false);
        let mut reader = PropertyReader::new(&mut cursor, &summary, &registry);
        assert_eq!(reader.read_class_payload(&export, "Texture2D", 6)?, None);
        assert_eq!(reader.read_class_payload(&export, "Partial", 6)?, None);
        assert_eq!(cursor.position(), 12);

        Ok(())
    }
}
