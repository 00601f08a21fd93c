//! Native payloads that follow the property list of an export.

use byteorder::{LittleEndian, ReadBytesExt};
use indexmap::IndexMap;

use crate::{
    package_index::PackageIndex,
    property::{PropertyTag, PropertyValue},
    registry::Registry,
};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Bytes in front of the reference of a reference property class
const REFERENCE_PREAMBLE: u64 = 24;

/// Bytes in front of the flag of a bool property class
const BOOL_PREAMBLE: u64 = 25;

/// Decoded class payload
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(untagged))]
pub enum ClassValue {
    /// Rows of a data table by row name
    DataTable(IndexMap<String, Vec<PropertyTag>>),
    /// Target of an object, struct or delegate property class
    Reference(PackageIndex),
    Bool(bool),
    /// Fields produced by a resolver registered by the caller
    Custom(IndexMap<String, PropertyValue>),
}

pub(crate) fn register_builtin_classes(registry: &mut Registry) {
    registry.register_class_resolver("DataTable", |reader, _, _| {
        reader.cursor().skip(4)?;
        let count = reader.cursor().read_u32::<LittleEndian>()?;

        let mut rows = IndexMap::new();
        for _ in 0..count {
            let name = reader.read_name()?;
            let properties = reader.read_properties()?;
            rows.insert(name, properties);
        }
        Ok(Some(ClassValue::DataTable(rows)))
    });

    for class in ["ObjectProperty", "StructProperty", "DelegateProperty"] {
        registry.register_class_resolver(class, |reader, _, _| {
            reader.cursor().skip(REFERENCE_PREAMBLE)?;
            Ok(Some(ClassValue::Reference(reader.read_package_index()?)))
        });
    }

    registry.register_class_resolver("BoolProperty", |reader, _, _| {
        reader.cursor().skip(BOOL_PREAMBLE)?;
        Ok(Some(ClassValue::Bool(reader.cursor().read_u8()? != 0)))
    });
}
