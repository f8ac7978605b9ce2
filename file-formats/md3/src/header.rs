use std::io::{Read, Write};

use crate::common::{read_fixed_string, write_fixed_string};
use crate::error::{Md3Error, Result};
use crate::io_ext::{ReadExt, WriteExt};

/// Magic signature for MD3 files ("IDP3")
pub const MD3_MAGIC: [u8; 4] = *b"IDP3";

/// The only MD3 format version id ever shipped
pub const MD3_VERSION: i32 = 15;

/// Maximum length of internal path strings (QPATH)
pub const MAX_QPATH: usize = 64;
/// Maximum number of animation frames in one model
pub const MAX_FRAMES: usize = 1024;
/// Maximum number of tags per frame
pub const MAX_TAGS: usize = 16;
/// Maximum number of surfaces in one model
pub const MAX_SURFACES: usize = 32;

/// On-disk size of the fixed header in bytes
pub const HEADER_SIZE: usize = 108;

/// MD3 model header
///
/// The header carries the record counts and the absolute byte offsets of the
/// three data sections (frame bounds, tag frames, surfaces).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Md3Header {
    /// Format version (always 15)
    pub version: i32,
    /// Internal model path, e.g. `models/players/sarge/upper.md3`
    pub name: String,
    /// Flag word carried through decode (zero in all known assets)
    pub flags: i32,
    /// Number of animation frames
    pub num_frames: i32,
    /// Number of tags per frame
    pub num_tags: i32,
    /// Number of surfaces
    pub num_surfaces: i32,
    /// Number of inline skin records (unused by the player pipeline)
    pub num_skins: i32,
    /// Offset of the frame bounds array from the start of the file
    pub ofs_frames: i32,
    /// Offset of the tag frame array
    pub ofs_tags: i32,
    /// Offset of the first surface
    pub ofs_surfaces: i32,
    /// Offset one past the last surface
    pub ofs_end: i32,
}

impl Md3Header {
    /// Parse a header from a reader
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;

        if magic != MD3_MAGIC {
            return Err(Md3Error::InvalidMagic {
                expected: String::from_utf8_lossy(&MD3_MAGIC).to_string(),
                actual: String::from_utf8_lossy(&magic).to_string(),
            });
        }

        let version = reader.read_i32_le()?;
        if version != MD3_VERSION {
            return Err(Md3Error::UnsupportedVersion(version));
        }

        let name = read_fixed_string(reader, MAX_QPATH)?;
        let flags = reader.read_i32_le()?;
        let num_frames = reader.read_i32_le()?;
        let num_tags = reader.read_i32_le()?;
        let num_surfaces = reader.read_i32_le()?;
        let num_skins = reader.read_i32_le()?;
        let ofs_frames = reader.read_i32_le()?;
        let ofs_tags = reader.read_i32_le()?;
        let ofs_surfaces = reader.read_i32_le()?;
        let ofs_end = reader.read_i32_le()?;

        let header = Self {
            version,
            name,
            flags,
            num_frames,
            num_tags,
            num_surfaces,
            num_skins,
            ofs_frames,
            ofs_tags,
            ofs_surfaces,
            ofs_end,
        };

        header.validate()?;

        Ok(header)
    }

    /// Write the header to a writer
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&MD3_MAGIC)?;
        writer.write_i32_le(self.version)?;
        write_fixed_string(writer, &self.name, MAX_QPATH)?;
        writer.write_i32_le(self.flags)?;
        writer.write_i32_le(self.num_frames)?;
        writer.write_i32_le(self.num_tags)?;
        writer.write_i32_le(self.num_surfaces)?;
        writer.write_i32_le(self.num_skins)?;
        writer.write_i32_le(self.ofs_frames)?;
        writer.write_i32_le(self.ofs_tags)?;
        writer.write_i32_le(self.ofs_surfaces)?;
        writer.write_i32_le(self.ofs_end)?;

        Ok(())
    }

    /// Check counts and offsets against the format limits
    pub fn validate(&self) -> Result<()> {
        if self.num_frames < 1 || self.num_frames as usize > MAX_FRAMES {
            return Err(Md3Error::Validation(format!(
                "frame count {} outside 1..={}",
                self.num_frames, MAX_FRAMES
            )));
        }

        if self.num_tags < 0 || self.num_tags as usize > MAX_TAGS {
            return Err(Md3Error::Validation(format!(
                "tag count {} outside 0..={}",
                self.num_tags, MAX_TAGS
            )));
        }

        if self.num_surfaces < 0 || self.num_surfaces as usize > MAX_SURFACES {
            return Err(Md3Error::Validation(format!(
                "surface count {} outside 0..={}",
                self.num_surfaces, MAX_SURFACES
            )));
        }

        let min_ofs = HEADER_SIZE as i32;
        for (section, ofs) in [
            ("frames", self.ofs_frames),
            ("tags", self.ofs_tags),
            ("surfaces", self.ofs_surfaces),
            ("end", self.ofs_end),
        ] {
            if ofs < min_ofs {
                return Err(Md3Error::Validation(format!(
                    "{section} offset {ofs} points inside the header"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn test_header() -> Md3Header {
        Md3Header {
            version: MD3_VERSION,
            name: "models/players/sarge/upper.md3".to_string(),
            flags: 0,
            num_frames: 153,
            num_tags: 3,
            num_surfaces: 2,
            num_skins: 0,
            ofs_frames: HEADER_SIZE as i32,
            ofs_tags: HEADER_SIZE as i32 + 153 * 56,
            ofs_surfaces: HEADER_SIZE as i32 + 153 * 56 + 153 * 3 * 112,
            ofs_end: 500_000,
        }
    }

    #[test]
    fn test_header_roundtrip() {
        let header = test_header();

        let mut buf = Vec::new();
        header.write(&mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_SIZE);

        let parsed = Md3Header::parse(&mut Cursor::new(buf)).unwrap();
        assert_eq!(parsed, header);
    }

    #[test]
    fn test_header_rejects_bad_magic() {
        let mut buf = Vec::new();
        test_header().write(&mut buf).unwrap();
        buf[0..4].copy_from_slice(b"IDP2");

        let result = Md3Header::parse(&mut Cursor::new(buf));
        assert!(matches!(result, Err(Md3Error::InvalidMagic { .. })));
    }

    #[test]
    fn test_header_rejects_bad_version() {
        let mut header = test_header();
        header.version = 16;

        let mut buf = Vec::new();
        header.write(&mut buf).unwrap();

        let result = Md3Header::parse(&mut Cursor::new(buf));
        assert!(matches!(result, Err(Md3Error::UnsupportedVersion(16))));
    }

    #[test]
    fn test_header_rejects_excess_counts() {
        let mut header = test_header();
        header.num_frames = MAX_FRAMES as i32 + 1;
        assert!(matches!(header.validate(), Err(Md3Error::Validation(_))));

        let mut header = test_header();
        header.num_tags = MAX_TAGS as i32 + 1;
        assert!(matches!(header.validate(), Err(Md3Error::Validation(_))));

        let mut header = test_header();
        header.num_surfaces = -1;
        assert!(matches!(header.validate(), Err(Md3Error::Validation(_))));
    }

    #[test]
    fn test_header_rejects_truncated_input() {
        let mut buf = Vec::new();
        test_header().write(&mut buf).unwrap();
        buf.truncate(40);

        let result = Md3Header::parse(&mut Cursor::new(buf));
        assert!(matches!(result, Err(Md3Error::Io(_))));
    }
}
