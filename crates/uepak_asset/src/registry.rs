//! Decoders for natively serialized structs and class payloads, looked up by type name.
//!
//! A [`Registry`] starts out with the engine's built-in decoders. Games add their own types
//! through [`Registry::register_struct_resolver`] and friends, usually bundled as a
//! [`GameProfile`].

use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    class::{register_builtin_classes, ClassValue},
    codec::Guid,
    error::Result,
    property::{PropertyReader, TagData},
    structs::{register_builtin_structs, StructValue},
    summary::ObjectExport,
};

/// Map properties whose struct keys or values are described by name
const BUILTIN_MAP_OVERRIDES: &[(&str, &str, &str)] = &[
    (
        "BindingIdToReferences",
        "Guid",
        "LevelSequenceBindingReferenceArray",
    ),
    (
        "Tracks",
        "MovieSceneTrackIdentifier",
        "MovieSceneEvaluationTrack",
    ),
    (
        "SubTemplateSerialNumbers",
        "MovieSceneSequenceID",
        "UInt32Property",
    ),
    (
        "SubSequences",
        "MovieSceneSequenceID",
        "MovieSceneSubSequenceData",
    ),
    (
        "Hierarchy",
        "MovieSceneSequenceID",
        "MovieSceneSequenceHierarchyNode",
    ),
    (
        "TrackSignatureToTrackIdentifier",
        "Guid",
        "MovieSceneTrackIdentifier",
    ),
    ("SubSectionRanges", "Guid", "MovieSceneFrameRange"),
];

/// Decodes the payload after the properties of an export, given the payload size
pub type ClassResolver = Arc<
    dyn Fn(&mut PropertyReader<'_>, &ObjectExport, u64) -> Result<Option<ClassValue>>
        + Send
        + Sync,
>;

/// Decodes a struct value; `Ok(None)` means the struct is known but this instance is not
/// decodable, and the enclosing property is skipped
pub type StructResolver = Arc<
    dyn Fn(&mut PropertyReader<'_>, &StructContext<'_>) -> Result<Option<StructValue>>
        + Send
        + Sync,
>;

/// What a struct resolver is told about the value it decodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructContext<'t> {
    pub type_name: &'t str,
    /// Declared size, absent for array elements and map entries
    pub size: Option<i32>,
}

#[derive(Clone)]
pub enum StructDecoder {
    Decode(StructResolver),
    /// Known native layout without a decoder
    Unsupported,
}

impl fmt::Debug for StructDecoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructDecoder::Decode(_) => f.write_str("Decode"),
            StructDecoder::Unsupported => f.write_str("Unsupported"),
        }
    }
}

/// Key and value types to use for a map property, by property name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapOverride {
    pub key_type: String,
    pub value_type: String,
}

impl MapOverride {
    pub fn new(key_type: impl Into<String>, value_type: impl Into<String>) -> MapOverride {
        MapOverride {
            key_type: key_type.into(),
            value_type: value_type.into(),
        }
    }

    pub(crate) fn key_data(&self) -> TagData {
        TagData::Struct {
            type_name: self.key_type.clone(),
            guid: Guid::default(),
        }
    }

    pub(crate) fn value_data(&self) -> TagData {
        TagData::Struct {
            type_name: self.value_type.clone(),
            guid: Guid::default(),
        }
    }
}

/// Extension point for one game's types
pub trait GameProfile {
    /// Short name to select the profile by
    fn name(&self) -> &str;

    fn register(&self, registry: &mut Registry);
}

/// Resolver tables consulted while decoding
///
/// Registrations replace earlier ones of the same name. The registry is only read during
/// decoding, so one instance can be shared between threads.
#[derive(Clone)]
pub struct Registry {
    classes: HashMap<String, ClassResolver>,
    structs: HashMap<String, StructDecoder>,
    map_overrides: HashMap<String, MapOverride>,
}

impl Default for Registry {
    fn default() -> Self {
        Registry::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("classes", &self.classes.len())
            .field("structs", &self.structs.len())
            .field("map_overrides", &self.map_overrides)
            .finish()
    }
}

impl Registry {
    /// Registry holding the built-in decoders
    pub fn new() -> Registry {
        let mut registry = Registry::empty();
        register_builtin_classes(&mut registry);
        register_builtin_structs(&mut registry);
        for (property, key_type, value_type) in BUILTIN_MAP_OVERRIDES {
            registry.register_map_property_override(*property, *key_type, *value_type);
        }
        registry
    }

    /// Registry without any decoders
    pub fn empty() -> Registry {
        Registry {
            classes: HashMap::new(),
            structs: HashMap::new(),
            map_overrides: HashMap::new(),
        }
    }

    pub fn with_game_profile(mut self, profile: &dyn GameProfile) -> Registry {
        profile.register(&mut self);
        self
    }

    pub fn register_class_resolver<F>(&mut self, class: impl Into<String>, resolver: F) -> &mut Self
    where
        F: Fn(&mut PropertyReader<'_>, &ObjectExport, u64) -> Result<Option<ClassValue>>
            + Send
            + Sync
            + 'static,
    {
        self.classes.insert(class.into(), Arc::new(resolver));
        self
    }

    pub fn register_struct_resolver<F>(
        &mut self,
        struct_type: impl Into<String>,
        resolver: F,
    ) -> &mut Self
    where
        F: Fn(&mut PropertyReader<'_>, &StructContext<'_>) -> Result<Option<StructValue>>
            + Send
            + Sync
            + 'static,
    {
        self.structs
            .insert(struct_type.into(), StructDecoder::Decode(Arc::new(resolver)));
        self
    }

    /// Mark a struct as known but not decodable, so its properties are skipped
    pub fn register_unsupported_struct(&mut self, struct_type: impl Into<String>) -> &mut Self {
        self.structs
            .insert(struct_type.into(), StructDecoder::Unsupported);
        self
    }

    pub fn register_map_property_override(
        &mut self,
        property: impl Into<String>,
        key_type: impl Into<String>,
        value_type: impl Into<String>,
    ) -> &mut Self {
        self.map_overrides
            .insert(property.into(), MapOverride::new(key_type, value_type));
        self
    }

    pub fn class_resolver(&self, class: &str) -> Option<&ClassResolver> {
        self.classes.get(class)
    }

    pub fn struct_decoder(&self, struct_type: &str) -> Option<&StructDecoder> {
        self.structs.get(struct_type)
    }

    pub fn map_property_override(&self, property: &str) -> Option<&MapOverride> {
        self.map_overrides.get(property)
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use crate::registry::{MapOverride, Registry, StructDecoder};

    #[test]
    fn registrations_replace_builtins() {
        let mut registry = Registry::new();
        assert!(matches!(
            registry.struct_decoder("Vector"),
            Some(StructDecoder::Decode(_))
        ));

        registry
            .register_unsupported_struct("Vector")
            .register_map_property_override("Tracks", "Guid", "IntProperty");

        assert!(matches!(
            registry.struct_decoder("Vector"),
            Some(StructDecoder::Unsupported)
        ));
        assert_eq!(
            registry.map_property_override("Tracks"),
            Some(&MapOverride::new("Guid", "IntProperty"))
        );
    }

    #[test]
    fn empty_registry() {
        let registry = Registry::empty();
        assert!(registry.class_resolver("DataTable").is_none());
        assert!(registry.map_property_override("Hierarchy").is_none());
        assert!(Registry::new().class_resolver("DataTable").is_some());
    }
}
