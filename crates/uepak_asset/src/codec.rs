//! Fixed layout values shared by package headers, property values and struct decoders.

use std::io::{Read, Seek};

use binrw::{BinRead, BinResult, Endian};
use byteorder::{LittleEndian, ReadBytesExt};
use uepak_archive::string::read_fstring;

use crate::{
    error::{Error, Result},
    package_index::PackageIndex,
    summary::NameEntry,
};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Look up a name reference, appending the instance number when there is one
pub fn name_at(names: &[NameEntry], index: u32, number: u32) -> Result<String> {
    let entry = names
        .get(index as usize)
        .ok_or(Error::InvalidNameIndex(index))?;
    Ok(match number {
        0 => entry.name.clone(),
        n => format!("{}_{}", entry.name, n - 1),
    })
}

/// Read a name reference: table index then instance number
pub fn read_fname<R: Read>(reader: &mut R, names: &[NameEntry]) -> Result<String> {
    let index = reader.read_u32::<LittleEndian>()?;
    let number = reader.read_u32::<LittleEndian>()?;
    name_at(names, index, number)
}

#[binrw::parser(reader)]
pub(crate) fn fstring() -> BinResult<String> {
    let pos = reader.stream_position()?;
    read_fstring(reader).map_err(|err| match err {
        uepak_archive::error::Error::UnexpectedEof => {
            binrw::Error::Io(std::io::ErrorKind::UnexpectedEof.into())
        }
        err => binrw::Error::Custom {
            pos,
            err: Box::new(err),
        },
    })
}

#[binrw::parser(reader, endian)]
pub(crate) fn fname(names: &[NameEntry]) -> BinResult<String> {
    let pos = reader.stream_position()?;
    let index = u32::read_options(reader, endian, ())?;
    let number = u32::read_options(reader, endian, ())?;
    name_at(names, index, number).map_err(|err| binrw::Error::Custom {
        pos,
        err: Box::new(err),
    })
}

/// Read any little endian value of this module from a plain reader
pub(crate) fn read_le<T, R>(reader: &mut R) -> Result<T>
where
    T: for<'a> BinRead<Args<'a> = ()>,
    R: Read + Seek,
{
    Ok(T::read_options(reader, Endian::Little, ())?)
}

/// 128-bit globally unique identifier
#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Guid {
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub d: u32,
}

impl Guid {
    /// Whether every part is zero
    pub fn is_zero(&self) -> bool {
        (self.a | self.b | self.c | self.d) == 0
    }
}

impl std::fmt::Display for Guid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:08X}{:08X}{:08X}{:08X}", self.a, self.b, self.c, self.d)
    }
}

#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Vector2D {
    pub x: f32,
    pub y: f32,
}

#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Vector4 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct IntPoint {
    pub x: i32,
    pub y: i32,
}

#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct IntVector {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

/// Euler rotation in degrees
#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct LinearColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

/// 8-bit color, stored in RGBA order
#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

/// Axis aligned box, the validity flag comes last
#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BoundingBox {
    pub min: Vector,
    pub max: Vector,
    pub is_valid: u8,
}

/// Two dimensional box, the validity flag comes first
#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct BoundingBox2D {
    pub is_valid: u8,
    pub min: Vector2D,
    pub max: Vector2D,
}

#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct FrameNumber {
    pub value: i32,
}

#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct MovieSceneSequenceId {
    pub value: u32,
}

#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct MovieSceneTrackIdentifier {
    pub value: u32,
}

#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct MovieSceneSegmentIdentifier {
    pub index: i32,
}

#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct MovieSceneEvaluationKey {
    pub sequence_id: MovieSceneSequenceId,
    pub track_identifier: MovieSceneTrackIdentifier,
    pub section_index: u32,
}

#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct MovieSceneFloatValue {
    pub value: f32,
}

/// One end of an integer range
#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RangeBound {
    /// 0 exclusive, 1 inclusive, 2 open
    pub bound_type: u8,
    pub value: i32,
}

#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct FrameRange {
    pub lower: RangeBound,
    pub upper: RangeBound,
}

#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct RichCurveKey {
    pub interp_mode: u8,
    pub tangent_mode: u8,
    pub tangent_weight_mode: u8,
    pub time: f32,
    pub arrive_tangent: f32,
    pub arrive_tangent_weight: f32,
    pub leave_tangent: f32,
    pub leave_tangent_weight: f32,
}

/// Material expression input, 40 bytes on disk
#[derive(BinRead, Debug, Default, Clone, PartialEq, Eq)]
#[br(little, import(names: &[NameEntry]))]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ExpressionInput {
    pub expression: u32,
    #[br(parse_with = fname, args(names))]
    pub expression_name: String,
    pub mask: i32,
    pub mask_r: i32,
    pub mask_g: i32,
    pub mask_b: i32,
    pub mask_a: i32,
    pub output_index: i32,
}

/// Path to an asset that is loaded on demand
#[derive(BinRead, Debug, Default, Clone, PartialEq, Eq)]
#[br(little, import(names: &[NameEntry]))]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SoftObjectPath {
    #[br(parse_with = fname, args(names))]
    pub asset_path_name: String,
    #[br(parse_with = fstring)]
    pub sub_path: String,
}

/// Bound function: target object and function name
#[derive(BinRead, Debug, Default, Clone, PartialEq, Eq)]
#[br(little, import(names: &[NameEntry]))]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct ScriptDelegate {
    pub object: PackageIndex,
    #[br(parse_with = fname, args(names))]
    pub function_name: String,
}

/// Localizable text
///
/// Only the base history carries strings; every other history stops after its type byte.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Text {
    pub flags: u32,
    pub history_type: i8,
    pub namespace: Option<String>,
    pub key: Option<String>,
    pub source_string: Option<String>,
}

impl Text {
    pub fn read<R: Read>(reader: &mut R) -> Result<Text> {
        let flags = reader.read_u32::<LittleEndian>()?;
        let history_type = reader.read_i8()?;
        let mut text = Text {
            flags,
            history_type,
            ..Default::default()
        };
        if history_type == 0 {
            text.namespace = Some(read_fstring(reader)?);
            text.key = Some(read_fstring(reader)?);
            text.source_string = Some(read_fstring(reader)?);
        }
        Ok(text)
    }
}

/// Engine version stamp
#[derive(BinRead, Debug, Default, Clone, PartialEq, Eq)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct EngineVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
    pub changelist: u32,
    #[br(parse_with = fstring)]
    pub branch: String,
}

impl std::fmt::Display for EngineVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{}.{}-{}+{}",
            self.major, self.minor, self.patch, self.changelist, self.branch
        )
    }
}

#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct GenerationInfo {
    pub export_count: i32,
    pub name_count: i32,
}

/// Chunk of the legacy whole-package compression scheme
#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CompressedChunk {
    pub uncompressed_offset: i32,
    pub uncompressed_size: i32,
    pub compressed_offset: i32,
    pub compressed_size: i32,
}

/// Version of a custom serialization scheme used when the package was saved
#[derive(BinRead, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[br(little)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct CustomVersion {
    pub key: Guid,
    pub version: i32,
}

#[cfg(test)]
mod test {
    use std::io::Cursor;

    use binrw::BinRead;
    use pretty_assertions::assert_eq;

    use crate::codec::{
        read_fname, BoundingBox2D, EngineVersion, ExpressionInput, RichCurveKey, Text, Vector2D,
    };
    use crate::error::{Error, Result};
    use crate::summary::NameEntry;

    fn names() -> Vec<NameEntry> {
        ["None", "Mesh", "ExpressionName"]
            .into_iter()
            .map(|name| NameEntry {
                name: name.into(),
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn fname_instance_numbers() -> Result<()> {
        #[rustfmt::skip]
        let mut input = Cursor::new(vec![
            0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
            0x01, 0x00, 0x00, 0x00, 0x03, 0x00, 0x00, 0x00,
            0x07, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
        ]);
        let names = names();

        assert_eq!(read_fname(&mut input, &names)?, "Mesh");
        assert_eq!(read_fname(&mut input, &names)?, "Mesh_2");
        assert!(matches!(
            read_fname(&mut input, &names),
            Err(Error::InvalidNameIndex(7))
        ));

        Ok(())
    }

    #[test]
    fn box2d_flag_first() -> Result<()> {
        #[rustfmt::skip]
        let mut input = Cursor::new(vec![
            0x01,
            0x00, 0x00, 0x80, 0x3F, 0x00, 0x00, 0x00, 0x40,
            0x00, 0x00, 0x40, 0x40, 0x00, 0x00, 0x80, 0x40,
        ]);

        let value = BoundingBox2D::read(&mut input)?;
        assert_eq!(value.is_valid, 1);
        assert_eq!(value.min, Vector2D { x: 1.0, y: 2.0 });
        assert_eq!(value.max, Vector2D { x: 3.0, y: 4.0 });

        Ok(())
    }

    #[test]
    fn rich_curve_key_modes_first() -> Result<()> {
        let mut input = vec![0x01, 0x02, 0x03];
        for value in [0.5f32, 1.0, 0.0, -1.0, 0.0] {
            input.extend(value.to_le_bytes());
        }

        let key = RichCurveKey::read(&mut Cursor::new(input))?;
        assert_eq!((key.interp_mode, key.tangent_mode, key.tangent_weight_mode), (1, 2, 3));
        assert_eq!(key.time, 0.5);
        assert_eq!(key.leave_tangent, -1.0);

        Ok(())
    }

    #[test]
    fn expression_input_with_name() -> Result<()> {
        let mut input = vec![0x09, 0x00, 0x00, 0x00];
        input.extend([0x02, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
        for value in [1i32, 1, 0, 0, 1, 2] {
            input.extend(value.to_le_bytes());
        }
        assert_eq!(input.len(), 40);

        let names = names();
        let value = ExpressionInput::read_le_args(&mut Cursor::new(input), (names.as_slice(),))?;
        assert_eq!(value.expression, 9);
        assert_eq!(value.expression_name, "ExpressionName");
        assert_eq!(value.mask_a, 1);
        assert_eq!(value.output_index, 2);

        Ok(())
    }

    #[test]
    fn text_histories() -> Result<()> {
        #[rustfmt::skip]
        let mut input = Cursor::new(vec![
            0x02, 0x00, 0x00, 0x00, 0xFF,
            0x01, 0x00, 0x00, 0x00, 0x00,
            0x00, 0x00, 0x00, 0x00,
            0x02, 0x00, 0x00, 0x00, 0x4B, 0x00,
            0x03, 0x00, 0x00, 0x00, 0x48, 0x69, 0x00,
        ]);

        let none = Text::read(&mut input)?;
        assert_eq!(none.history_type, -1);
        assert_eq!(none.source_string, None);

        let base = Text::read(&mut input)?;
        assert_eq!(base.flags, 1);
        assert_eq!(base.namespace.as_deref(), Some(""));
        assert_eq!(base.key.as_deref(), Some("K"));
        assert_eq!(base.source_string.as_deref(), Some("Hi"));

        Ok(())
    }

    #[test]
    fn engine_version_branch() -> Result<()> {
        #[rustfmt::skip]
        let mut input = Cursor::new(vec![
            0x04, 0x00, 0x16, 0x00, 0x03, 0x00,
            0x39, 0x30, 0x00, 0x00,
            0x05, 0x00, 0x00, 0x00, 0x2B, 0x55, 0x45, 0x34, 0x00,
        ]);

        let version = EngineVersion::read(&mut input)?;
        assert_eq!(version.to_string(), "4.22.3-12345++UE4");

        Ok(())
    }

    #[test]
    fn engine_version_truncated_branch() {
        #[rustfmt::skip]
        let mut input = Cursor::new(vec![
            0x04, 0x00, 0x16, 0x00, 0x03, 0x00,
            0x39, 0x30, 0x00, 0x00,
            0x09, 0x00, 0x00, 0x00, 0x2B,
        ]);

        let err = Error::from(EngineVersion::read(&mut input).unwrap_err());
        assert!(matches!(
            err,
            Error::Archive(uepak_archive::error::Error::UnexpectedEof)
        ));
    }
}
