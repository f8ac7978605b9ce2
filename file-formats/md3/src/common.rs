use crate::error::Result;
use crate::io_ext::{ReadExt, WriteExt};
use std::io::{Read, Write};

/// A vector in 3D space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct C3Vector {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl C3Vector {
    /// Parse a C3Vector from a reader
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let x = reader.read_f32_le()?;
        let y = reader.read_f32_le()?;
        let z = reader.read_f32_le()?;

        Ok(Self { x, y, z })
    }

    /// Write a C3Vector to a writer
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_f32_le(self.x)?;
        writer.write_f32_le(self.y)?;
        writer.write_f32_le(self.z)?;

        Ok(())
    }

    /// Convert to a glam vector for easier math operations
    pub fn to_glam(&self) -> glam::Vec3 {
        glam::Vec3::new(self.x, self.y, self.z)
    }

    /// Create from a glam vector
    pub fn from_glam(v: glam::Vec3) -> Self {
        Self {
            x: v.x,
            y: v.y,
            z: v.z,
        }
    }
}

/// A vector in 2D space (texture coordinates)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct C2Vector {
    pub x: f32,
    pub y: f32,
}

impl C2Vector {
    /// Parse a C2Vector from a reader
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let x = reader.read_f32_le()?;
        let y = reader.read_f32_le()?;

        Ok(Self { x, y })
    }

    /// Write a C2Vector to a writer
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_f32_le(self.x)?;
        writer.write_f32_le(self.y)?;

        Ok(())
    }

    /// Convert to a glam vector for easier math operations
    pub fn to_glam(&self) -> glam::Vec2 {
        glam::Vec2::new(self.x, self.y)
    }
}

/// Read a fixed-width, NUL-padded string and truncate at the first NUL
pub fn read_fixed_string<R: Read>(reader: &mut R, len: usize) -> Result<String> {
    let mut data = vec![0u8; len];
    reader.read_exact(&mut data)?;

    let null_pos = data.iter().position(|&b| b == 0).unwrap_or(len);
    data.truncate(null_pos);

    Ok(String::from_utf8_lossy(&data).to_string())
}

/// Write a string as a fixed-width, NUL-padded field, truncating if too long
pub fn write_fixed_string<W: Write>(writer: &mut W, value: &str, len: usize) -> Result<()> {
    let mut data = value.as_bytes().to_vec();
    data.resize(len, 0);
    writer.write_all(&data)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_c3vector_parse() {
        let data = [
            0x00, 0x00, 0x80, 0x3F, // x = 1.0
            0x00, 0x00, 0x00, 0x40, // y = 2.0
            0x00, 0x00, 0x40, 0x40, // z = 3.0
        ];

        let mut cursor = Cursor::new(data);
        let vector = C3Vector::parse(&mut cursor).unwrap();

        assert_eq!(vector.x, 1.0);
        assert_eq!(vector.y, 2.0);
        assert_eq!(vector.z, 3.0);
    }

    #[test]
    fn test_c3vector_roundtrip() {
        let vector = C3Vector {
            x: -4.5,
            y: 0.25,
            z: 1024.0,
        };

        let mut buf = Vec::new();
        vector.write(&mut buf).unwrap();
        let parsed = C3Vector::parse(&mut Cursor::new(buf)).unwrap();

        assert_eq!(parsed, vector);
    }

    #[test]
    fn test_c2vector_parse() {
        let data = [
            0x00, 0x00, 0x80, 0x3F, // x = 1.0
            0x00, 0x00, 0x00, 0x40, // y = 2.0
        ];

        let mut cursor = Cursor::new(data);
        let vector = C2Vector::parse(&mut cursor).unwrap();

        assert_eq!(vector.x, 1.0);
        assert_eq!(vector.y, 2.0);
    }

    #[test]
    fn test_fixed_string_truncates_at_nul() {
        let data = [b'T', b'e', b's', b't', 0, b'x', 0, 0];

        let mut cursor = Cursor::new(data);
        let string = read_fixed_string(&mut cursor, 8).unwrap();

        assert_eq!(string, "Test");
    }

    #[test]
    fn test_fixed_string_roundtrip() {
        let mut buf = Vec::new();
        write_fixed_string(&mut buf, "tag_weapon", 64).unwrap();
        assert_eq!(buf.len(), 64);

        let parsed = read_fixed_string(&mut Cursor::new(buf), 64).unwrap();
        assert_eq!(parsed, "tag_weapon");
    }

    #[test]
    fn test_fixed_string_truncates_long_values() {
        let mut buf = Vec::new();
        write_fixed_string(&mut buf, "abcdef", 4).unwrap();
        assert_eq!(buf, b"abcd");
    }
}
