//! Struct values and the natively serialized structs every registry knows.

use binrw::BinRead;
use indexmap::IndexMap;

use crate::{
    codec::{
        read_le, BoundingBox, BoundingBox2D, Color, ExpressionInput, FrameNumber, FrameRange, Guid,
        IntPoint, IntVector, LinearColor, MovieSceneEvaluationKey, MovieSceneFloatValue,
        MovieSceneSegmentIdentifier, MovieSceneSequenceId, MovieSceneTrackIdentifier, Quat,
        RichCurveKey, Rotator, Vector, Vector2D, Vector4,
    },
    property::{PropertyTag, PropertyValue},
    registry::Registry,
};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Serialized size of a [`Guid`] struct property
const GUID_SIZE: i32 = 16;

/// Serialized size of an [`ExpressionInput`] struct property
const EXPRESSION_INPUT_SIZE: i32 = 40;

/// Structs that have a native layout no decoder exists for
const UNSUPPORTED_STRUCTS: &[&str] = &[
    "VectorMaterialInput",
    "ScalarMaterialInput",
    "ColorMaterialInput",
    "PerPlatformFloat",
    "SkeletalMeshSamplingLODBuiltData",
    "PointerToUberGraphFrame",
    "FontData",
    "FontCharacter",
    "MaterialAttributesInput",
    "MovieSceneByteChannel",
    "MovieSceneEventParameters",
    "SoftClassPath",
    "MovieSceneParticleChannel",
    "SmartName",
    "PerPlatformInt",
    "MovieSceneSegment",
    "SectionEvaluationDataTree",
    "MovieSceneEvalTemplatePtr",
    "MovieSceneTrackImplementationPtr",
    "MovieSceneEvaluationTrack",
    "MovieSceneFloatChannel",
    "LevelSequenceBindingReferenceArray",
];

/// Decoded struct property
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(untagged))]
pub enum StructValue {
    Vector(Vector),
    Vector2D(Vector2D),
    Vector4(Vector4),
    IntPoint(IntPoint),
    IntVector(IntVector),
    Rotator(Rotator),
    Quat(Quat),
    LinearColor(LinearColor),
    Color(Color),
    Box(BoundingBox),
    Box2D(BoundingBox2D),
    Guid(Guid),
    FrameNumber(FrameNumber),
    MovieSceneSequenceId(MovieSceneSequenceId),
    MovieSceneTrackIdentifier(MovieSceneTrackIdentifier),
    MovieSceneEvaluationKey(MovieSceneEvaluationKey),
    MovieSceneSegmentIdentifier(MovieSceneSegmentIdentifier),
    MovieSceneFloatValue(MovieSceneFloatValue),
    MovieSceneFrameRange(FrameRange),
    RichCurveKey(RichCurveKey),
    ExpressionInput(ExpressionInput),
    /// Struct serialized as an ordinary property list
    Properties(Vec<PropertyTag>),
    /// Fields produced by a resolver registered by the caller
    Custom(IndexMap<String, PropertyValue>),
}

impl StructValue {
    /// Nested properties, for structs serialized as property lists
    pub fn properties(&self) -> Option<&[PropertyTag]> {
        match self {
            StructValue::Properties(properties) => Some(properties),
            _ => None,
        }
    }
}

fn register_fixed<T>(registry: &mut Registry, name: &str, wrap: fn(T) -> StructValue)
where
    T: for<'a> BinRead<Args<'a> = ()> + 'static,
{
    registry.register_struct_resolver(name, move |reader, _| {
        Ok(Some(wrap(read_le(reader.cursor())?)))
    });
}

pub(crate) fn register_builtin_structs(registry: &mut Registry) {
    register_fixed(registry, "Vector", StructValue::Vector);
    register_fixed(registry, "Vector2D", StructValue::Vector2D);
    register_fixed(registry, "Vector4", StructValue::Vector4);
    register_fixed(registry, "IntPoint", StructValue::IntPoint);
    register_fixed(registry, "IntVector", StructValue::IntVector);
    register_fixed(registry, "Rotator", StructValue::Rotator);
    register_fixed(registry, "Quat", StructValue::Quat);
    register_fixed(registry, "LinearColor", StructValue::LinearColor);
    register_fixed(registry, "Color", StructValue::Color);
    register_fixed(registry, "Box", StructValue::Box);
    register_fixed(registry, "Box2D", StructValue::Box2D);
    register_fixed(registry, "FrameNumber", StructValue::FrameNumber);
    register_fixed(
        registry,
        "MovieSceneSequenceID",
        StructValue::MovieSceneSequenceId,
    );
    register_fixed(
        registry,
        "MovieSceneTrackIdentifier",
        StructValue::MovieSceneTrackIdentifier,
    );
    register_fixed(
        registry,
        "MovieSceneEvaluationKey",
        StructValue::MovieSceneEvaluationKey,
    );
    register_fixed(
        registry,
        "MovieSceneSegmentIdentifier",
        StructValue::MovieSceneSegmentIdentifier,
    );
    register_fixed(
        registry,
        "MovieSceneFloatValue",
        StructValue::MovieSceneFloatValue,
    );
    register_fixed(
        registry,
        "MovieSceneFrameRange",
        StructValue::MovieSceneFrameRange,
    );
    register_fixed(registry, "RichCurveKey", StructValue::RichCurveKey);

    // Only the native layouts are decoded, other sizes are property lists of older versions
    registry.register_struct_resolver("Guid", |reader, context| match context.size {
        None | Some(GUID_SIZE) => Ok(Some(StructValue::Guid(read_le(reader.cursor())?))),
        Some(_) => Ok(None),
    });
    registry.register_struct_resolver("ExpressionInput", |reader, context| {
        match context.size {
            None | Some(EXPRESSION_INPUT_SIZE) => {
                let names = reader.summary().names.as_slice();
                let input = ExpressionInput::read_le_args(reader.cursor(), (names,))?;
                Ok(Some(StructValue::ExpressionInput(input)))
            }
            Some(_) => Ok(None),
        }
    });

    for name in UNSUPPORTED_STRUCTS {
        registry.register_unsupported_struct(*name);
    }
}

#[cfg(test)]
mod test {
    use crate::registry::{Registry, StructDecoder};

    #[test]
    fn builtin_struct_table() {
        let registry = Registry::new();

        assert!(matches!(
            registry.struct_decoder("Vector"),
            Some(StructDecoder::Decode(_))
        ));
        assert!(matches!(
            registry.struct_decoder("SmartName"),
            Some(StructDecoder::Unsupported)
        ));
        assert!(registry.struct_decoder("SomeGameplayStruct").is_none());
    }
}
