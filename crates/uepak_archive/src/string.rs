//! Length-prefixed strings as stored throughout pak indexes and packages.

use std::io::Read;

use byteorder::{LittleEndian, ReadBytesExt};
use widestring::U16String;

use crate::error::{Error, Result};

/// Read a length-prefixed string
///
/// A positive length counts single-byte characters, a negative length counts UTF-16LE code
/// units and zero is the empty string. The stored terminator and any other trailing NULs are
/// stripped from the result.
pub fn read_fstring<R: Read>(reader: &mut R) -> Result<String> {
    let length = reader.read_i32::<LittleEndian>()?;

    let value = match length {
        0 => return Ok(String::new()),
        n if n > 0 => {
            let raw = read_exact_vec(reader, n as u64)?;
            String::from_utf8_lossy(&raw).into_owned()
        }
        n => {
            let units = n.unsigned_abs() as u64;
            let raw = read_exact_vec(reader, units * 2)?;
            let wide = raw
                .chunks_exact(2)
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
                .collect::<Vec<_>>();
            U16String::from_vec(wide).to_string_lossy()
        }
    };

    Ok(value.trim_end_matches('\0').to_owned())
}

fn read_exact_vec<R: Read>(reader: &mut R, len: u64) -> Result<Vec<u8>> {
    let mut raw = Vec::new();
    reader.take(len).read_to_end(&mut raw)?;
    if (raw.len() as u64) < len {
        return Err(Error::UnexpectedEof);
    }
    Ok(raw)
}

#[cfg(test)]
mod test {
    use std::io::{Cursor, Read};

    use pretty_assertions::assert_eq;

    use crate::error::{Error, Result};
    use crate::string::read_fstring;

    #[test]
    fn read_ascii() -> Result<()> {
        #[rustfmt::skip]
        let mut input = Cursor::new(vec![
            0x06, 0x00, 0x00, 0x00,
            0x2F, 0x47, 0x61, 0x6D, 0x65, 0x00,
            0xFF,
        ]);

        assert_eq!(read_fstring(&mut input)?, "/Game");
        assert_eq!(input.position(), 10);

        Ok(())
    }

    #[test]
    fn read_utf16() -> Result<()> {
        #[rustfmt::skip]
        let mut input = Cursor::new(vec![
            0xFD, 0xFF, 0xFF, 0xFF,
            0x48, 0x00, 0xE9, 0x00, 0x00, 0x00,
        ]);

        assert_eq!(read_fstring(&mut input)?, "H\u{e9}");
        assert_eq!(input.position(), 10);

        Ok(())
    }

    #[test]
    fn read_empty() -> Result<()> {
        let mut input = Cursor::new(vec![0x00, 0x00, 0x00, 0x00, 0x41]);

        assert_eq!(read_fstring(&mut input)?, "");
        assert_eq!(input.position(), 4);

        let mut rest = Vec::new();
        input.read_to_end(&mut rest)?;
        assert_eq!(rest, vec![0x41]);

        Ok(())
    }

    #[test]
    fn read_truncated() {
        let mut input = Cursor::new(vec![0x10, 0x00, 0x00, 0x00, 0x41, 0x42]);
        assert!(matches!(read_fstring(&mut input), Err(Error::UnexpectedEof)));
    }
}
