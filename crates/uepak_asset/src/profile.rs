//! Per game registrations.

use binrw::BinRead;
use indexmap::IndexMap;

use crate::{
    codec::read_le,
    package_index::PackageIndex,
    property::PropertyValue,
    registry::{GameProfile, Registry},
    structs::StructValue,
};

/// Profiles selectable by name
pub fn profile_by_name(name: &str) -> Option<Box<dyn GameProfile>> {
    match name.to_ascii_lowercase().as_str() {
        "satisfactory" => Some(Box::new(Satisfactory)),
        _ => None,
    }
}

/// Satisfactory by Coffee Stain Studios
#[derive(Debug, Default, Clone, Copy)]
pub struct Satisfactory;

#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[br(little)]
struct InventoryItem {
    item_class: PackageIndex,
    item_state: i32,
}

impl GameProfile for Satisfactory {
    fn name(&self) -> &str {
        "satisfactory"
    }

    fn register(&self, registry: &mut Registry) {
        registry.register_map_property_override(
            "ChildrenAndRoads_34_758C9E0D4F09DAF4BBAD309358952A0A",
            "IntVector2D",
            "MAMTree_RoadPoints",
        );

        registry.register_struct_resolver("InventoryItem", |reader, _| {
            let item: InventoryItem = read_le(reader.cursor())?;
            let mut fields = IndexMap::new();
            fields.insert("item_class".to_owned(), PropertyValue::Object(item.item_class));
            fields.insert("item_state".to_owned(), PropertyValue::Int(item.item_state));
            Ok(Some(StructValue::Custom(fields)))
        });
    }
}
