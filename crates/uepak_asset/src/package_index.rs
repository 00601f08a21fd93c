//! Signed references into a package's import and export tables.

use binrw::BinRead;
use derive_more::derive::{Constructor, Display, From};

#[cfg(feature = "serde")]
use serde::Serialize;

/// Reference to an object of a package
///
/// `0` means no object, negative values `-i` name import `i - 1`, positive values `i` name
/// export `i - 1`.
#[derive(
    BinRead, Constructor, Display, From, Debug, Default, Clone, Copy, PartialEq, Eq, Hash,
)]
#[br(little)]
#[display("{_0}")]
#[cfg_attr(feature = "serde", derive(Serialize), serde(transparent))]
pub struct PackageIndex(pub i32);

/// Table slot a [`PackageIndex`] points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum ObjectRef {
    /// Position in the import table
    Import(usize),
    /// Position in the export table
    Export(usize),
}

impl PackageIndex {
    /// Whether this is the null reference
    pub fn is_null(&self) -> bool {
        self.0 == 0
    }

    /// Table slot named by the raw value, without any bounds check
    pub fn slot(&self) -> Option<ObjectRef> {
        let index = i64::from(self.0);
        match index {
            0 => None,
            i if i < 0 => Some(ObjectRef::Import((-i - 1) as usize)),
            i => Some(ObjectRef::Export((i - 1) as usize)),
        }
    }

    /// Resolve against tables of the given lengths
    ///
    /// Out of range references resolve to `None`.
    pub fn resolve(&self, imports: usize, exports: usize) -> Option<ObjectRef> {
        self.slot().filter(|slot| match *slot {
            ObjectRef::Import(i) => i < imports,
            ObjectRef::Export(i) => i < exports,
        })
    }
}
