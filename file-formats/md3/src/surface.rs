//! MD3 surface decoding
//!
//! A surface is one named sub-mesh: a shader name table, a triangle index
//! list, per-vertex texture coordinates, and one packed vertex buffer per
//! animation frame. Vertices are stored as `i16[4]`: three position
//! components at 1/64 unit precision plus a 16-bit packed normal encoded as
//! two 8-bit latitude/longitude angles.

use std::f32::consts::TAU;
use std::io::{Read, Seek, SeekFrom, Write};

use crate::common::{C2Vector, read_fixed_string, write_fixed_string};
use crate::error::{Md3Error, Result};
use crate::header::{MAX_QPATH, MD3_MAGIC};
use crate::io_ext::{ReadExt, WriteExt};

/// Maximum number of shader entries per surface
pub const MAX_SHADERS: usize = 256;
/// Maximum number of vertices per surface
pub const MAX_VERTS: usize = 4096;
/// Maximum number of triangles per surface
pub const MAX_TRIANGLES: usize = 8192;

/// Scale applied to packed `i16` vertex positions
pub const XYZ_SCALE: f32 = 1.0 / 64.0;

/// Floats per decoded vertex: position xyz plus unit normal xyz
pub const VERTEX_FLOATS: usize = 6;

/// On-disk size of the fixed surface header in bytes
pub const SURFACE_HEADER_SIZE: usize = 108;
const SHADER_SIZE: usize = MAX_QPATH + 4;
const TRIANGLE_SIZE: usize = 12;
const ST_SIZE: usize = 8;
const PACKED_VERTEX_SIZE: usize = 8;

/// One shader (material) reference of a surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shader {
    /// Shader or texture path
    pub name: String,
    /// Index assigned by the original toolchain (carried through unchanged)
    pub shader_index: i32,
}

/// One named sub-mesh of a model
#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    /// Surface name, e.g. `u_torso`
    pub name: String,
    /// Flag word carried through decode
    pub flags: i32,
    /// Shader name table
    pub shaders: Vec<Shader>,
    /// Triangle corner indices, three per triangle
    pub triangle_indices: Vec<u16>,
    /// Per-vertex texture coordinates
    pub uv: Vec<C2Vector>,
    /// Per frame: interleaved position + unit normal floats,
    /// [`VERTEX_FLOATS`] per vertex
    pub frames_xyzn: Vec<Vec<f32>>,
}

impl Surface {
    /// Parse a surface from its start position
    ///
    /// The reader is left positioned at the surface's `ofs_end`, i.e. at the
    /// start of the next surface.
    pub fn parse<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let start = reader.stream_position()?;

        let mut ident = [0u8; 4];
        reader.read_exact(&mut ident)?;
        if ident != MD3_MAGIC {
            log::warn!(
                "surface ident {:?} differs from expected {:?}",
                String::from_utf8_lossy(&ident),
                String::from_utf8_lossy(&MD3_MAGIC)
            );
        }

        let name = read_fixed_string(reader, MAX_QPATH)?;
        let flags = reader.read_i32_le()?;
        let num_frames = reader.read_i32_le()?;
        let num_shaders = reader.read_i32_le()?;
        let num_verts = reader.read_i32_le()?;
        let num_triangles = reader.read_i32_le()?;
        let ofs_triangles = reader.read_i32_le()?;
        let ofs_shaders = reader.read_i32_le()?;
        let ofs_st = reader.read_i32_le()?;
        let ofs_xyznormal = reader.read_i32_le()?;
        let ofs_end = reader.read_i32_le()?;

        if num_frames < 0 {
            return Err(Md3Error::Validation(format!(
                "surface '{name}' has negative frame count {num_frames}"
            )));
        }
        if num_shaders < 0 || num_shaders as usize > MAX_SHADERS {
            return Err(Md3Error::Validation(format!(
                "surface '{name}' shader count {num_shaders} outside 0..={MAX_SHADERS}"
            )));
        }
        if num_verts < 0 || num_verts as usize > MAX_VERTS {
            return Err(Md3Error::Validation(format!(
                "surface '{name}' vertex count {num_verts} outside 0..={MAX_VERTS}"
            )));
        }
        if num_triangles < 0 || num_triangles as usize > MAX_TRIANGLES {
            return Err(Md3Error::Validation(format!(
                "surface '{name}' triangle count {num_triangles} outside 0..={MAX_TRIANGLES}"
            )));
        }
        for (section, ofs) in [
            ("triangles", ofs_triangles),
            ("shaders", ofs_shaders),
            ("st", ofs_st),
            ("xyznormal", ofs_xyznormal),
            ("end", ofs_end),
        ] {
            if ofs < 0 {
                return Err(Md3Error::Validation(format!(
                    "surface '{name}' has negative {section} offset {ofs}"
                )));
            }
        }

        // Shader table
        reader.seek(SeekFrom::Start(start + ofs_shaders as u64))?;
        let mut shaders = Vec::with_capacity(num_shaders as usize);
        for _ in 0..num_shaders {
            let name = read_fixed_string(reader, MAX_QPATH)?;
            let shader_index = reader.read_i32_le()?;
            shaders.push(Shader { name, shader_index });
        }

        // Triangle indices, stored as i32 on disk and narrowed to u16
        reader.seek(SeekFrom::Start(start + ofs_triangles as u64))?;
        let mut triangle_indices = Vec::with_capacity(num_triangles as usize * 3);
        for _ in 0..num_triangles * 3 {
            let index = reader.read_i32_le()?;
            if index < 0 || index >= num_verts {
                return Err(Md3Error::Validation(format!(
                    "surface '{name}' triangle index {index} outside vertex range 0..{num_verts}"
                )));
            }
            triangle_indices.push(index as u16);
        }

        // Texture coordinates
        reader.seek(SeekFrom::Start(start + ofs_st as u64))?;
        let mut uv = Vec::with_capacity(num_verts as usize);
        for _ in 0..num_verts {
            uv.push(C2Vector::parse(reader)?);
        }

        // Packed vertex buffers, one per frame
        reader.seek(SeekFrom::Start(start + ofs_xyznormal as u64))?;
        let mut frames_xyzn = Vec::with_capacity(num_frames as usize);
        for _ in 0..num_frames {
            let mut xyzn = Vec::with_capacity(num_verts as usize * VERTEX_FLOATS);
            for _ in 0..num_verts {
                let x = reader.read_i16_le()?;
                let y = reader.read_i16_le()?;
                let z = reader.read_i16_le()?;
                let packed = reader.read_u16_le()?;

                xyzn.push(f32::from(x) * XYZ_SCALE);
                xyzn.push(f32::from(y) * XYZ_SCALE);
                xyzn.push(f32::from(z) * XYZ_SCALE);

                let (nx, ny, nz) = decode_normal(packed);
                xyzn.push(nx);
                xyzn.push(ny);
                xyzn.push(nz);
            }
            frames_xyzn.push(xyzn);
        }

        reader.seek(SeekFrom::Start(start + ofs_end as u64))?;

        Ok(Self {
            name,
            flags,
            shaders,
            triangle_indices,
            uv,
            frames_xyzn,
        })
    }

    /// Write the surface, re-packing vertices and recomputing sub-offsets
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        let num_frames = self.frames_xyzn.len() as i32;
        let num_shaders = self.shaders.len() as i32;
        let num_verts = self.vertex_count() as i32;
        let num_triangles = self.triangle_count() as i32;

        let ofs_shaders = SURFACE_HEADER_SIZE as i32;
        let ofs_triangles = ofs_shaders + num_shaders * SHADER_SIZE as i32;
        let ofs_st = ofs_triangles + num_triangles * TRIANGLE_SIZE as i32;
        let ofs_xyznormal = ofs_st + num_verts * ST_SIZE as i32;
        let ofs_end = ofs_xyznormal + num_frames * num_verts * PACKED_VERTEX_SIZE as i32;

        writer.write_all(&MD3_MAGIC)?;
        write_fixed_string(writer, &self.name, MAX_QPATH)?;
        writer.write_i32_le(self.flags)?;
        writer.write_i32_le(num_frames)?;
        writer.write_i32_le(num_shaders)?;
        writer.write_i32_le(num_verts)?;
        writer.write_i32_le(num_triangles)?;
        writer.write_i32_le(ofs_triangles)?;
        writer.write_i32_le(ofs_shaders)?;
        writer.write_i32_le(ofs_st)?;
        writer.write_i32_le(ofs_xyznormal)?;
        writer.write_i32_le(ofs_end)?;

        for shader in &self.shaders {
            write_fixed_string(writer, &shader.name, MAX_QPATH)?;
            writer.write_i32_le(shader.shader_index)?;
        }

        for &index in &self.triangle_indices {
            writer.write_i32_le(i32::from(index))?;
        }

        for st in &self.uv {
            st.write(writer)?;
        }

        for xyzn in &self.frames_xyzn {
            for vertex in xyzn.chunks_exact(VERTEX_FLOATS) {
                for &component in &vertex[..3] {
                    let packed = (component / XYZ_SCALE).round();
                    writer.write_i16_le(packed.clamp(f32::from(i16::MIN), f32::from(i16::MAX))
                        as i16)?;
                }
                writer.write_u16_le(encode_normal(vertex[3], vertex[4], vertex[5]))?;
            }
        }

        Ok(())
    }

    /// Number of vertices (constant across all frames)
    pub fn vertex_count(&self) -> usize {
        self.uv.len()
    }

    /// Number of triangles
    pub fn triangle_count(&self) -> usize {
        self.triangle_indices.len() / 3
    }

    /// On-disk size of this surface in bytes
    pub fn disk_size(&self) -> usize {
        SURFACE_HEADER_SIZE
            + self.shaders.len() * SHADER_SIZE
            + self.triangle_count() * TRIANGLE_SIZE
            + self.vertex_count() * ST_SIZE
            + self.frames_xyzn.len() * self.vertex_count() * PACKED_VERTEX_SIZE
    }

    /// Check internal consistency of the decoded buffers
    pub fn validate(&self) -> Result<()> {
        if self.triangle_indices.len() % 3 != 0 {
            return Err(Md3Error::Validation(format!(
                "surface '{}' index count {} is not a multiple of 3",
                self.name,
                self.triangle_indices.len()
            )));
        }

        let expected = self.vertex_count() * VERTEX_FLOATS;
        for (frame, xyzn) in self.frames_xyzn.iter().enumerate() {
            if xyzn.len() != expected {
                return Err(Md3Error::Validation(format!(
                    "surface '{}' frame {} has {} floats, expected {}",
                    self.name,
                    frame,
                    xyzn.len(),
                    expected
                )));
            }
        }

        let num_verts = self.vertex_count();
        if let Some(&index) = self
            .triangle_indices
            .iter()
            .find(|&&index| usize::from(index) >= num_verts)
        {
            return Err(Md3Error::Validation(format!(
                "surface '{}' triangle index {index} outside vertex range 0..{num_verts}",
                self.name
            )));
        }

        Ok(())
    }
}

/// Decode a 16-bit packed normal into a unit vector
///
/// The high byte is latitude, the low byte longitude, each mapped to
/// `[0, 2π)` in 255 steps.
pub fn decode_normal(packed: u16) -> (f32, f32, f32) {
    let lat = f32::from((packed >> 8) & 0xFF) * (TAU / 255.0);
    let lng = f32::from(packed & 0xFF) * (TAU / 255.0);

    (lat.cos() * lng.sin(), lat.sin() * lng.sin(), lng.cos())
}

/// Pack a unit normal into the 16-bit latitude/longitude encoding
pub fn encode_normal(x: f32, y: f32, z: f32) -> u16 {
    let lng = z.clamp(-1.0, 1.0).acos();
    let lat = y.atan2(x).rem_euclid(TAU);

    let lat_byte = (lat * 255.0 / TAU).round() as u16 & 0xFF;
    let lng_byte = (lng * 255.0 / TAU).round() as u16 & 0xFF;

    (lat_byte << 8) | lng_byte
}

/// Normalized lookup key for a surface name: trimmed, lowercased, with any
/// trailing `_<digits>` variant suffix removed
pub fn normalize_surface_name(name: &str) -> String {
    let trimmed = name.trim().trim_end_matches('\0').trim();

    let base = match trimmed.rfind('_') {
        Some(idx)
            if idx + 1 < trimmed.len()
                && trimmed[idx + 1..].chars().all(|c| c.is_ascii_digit()) =>
        {
            &trimmed[..idx]
        }
        _ => trimmed,
    };

    base.to_ascii_lowercase()
}
