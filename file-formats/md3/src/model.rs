//! MD3 model file parsing
//!
//! A model file holds a fixed header, one bounding volume per animation
//! frame, a per-frame array of named tag transforms, and a list of surfaces.
//! Decode order follows the section offsets recorded in the header; the
//! decoded model is immutable and self-consistent or parsing fails.

use std::fs;
use std::io::{Cursor, Read, Seek, SeekFrom, Write};
use std::path::Path;

use glam::Mat4;

use crate::common::{C3Vector, read_fixed_string, write_fixed_string};
use crate::error::{Md3Error, Result};
use crate::header::{HEADER_SIZE, MAX_QPATH, MD3_VERSION, Md3Header};
use crate::io_ext::{ReadExt, WriteExt};
use crate::surface::Surface;

/// Maximum length of a frame name
pub const MAX_FRAME_NAME: usize = 16;

/// On-disk size of one frame record
const FRAME_SIZE: usize = 56;
/// On-disk size of one tag record
const TAG_SIZE: usize = 112;

/// Per-frame bounding volume and local origin
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub min_bounds: C3Vector,
    pub max_bounds: C3Vector,
    pub local_origin: C3Vector,
    pub radius: f32,
    pub name: String,
}

impl Frame {
    /// Parse a frame record from a reader
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let min_bounds = C3Vector::parse(reader)?;
        let max_bounds = C3Vector::parse(reader)?;
        let local_origin = C3Vector::parse(reader)?;
        let radius = reader.read_f32_le()?;
        let name = read_fixed_string(reader, MAX_FRAME_NAME)?;

        Ok(Self {
            min_bounds,
            max_bounds,
            local_origin,
            radius,
            name,
        })
    }

    /// Write a frame record to a writer
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.min_bounds.write(writer)?;
        self.max_bounds.write(writer)?;
        self.local_origin.write(writer)?;
        writer.write_f32_le(self.radius)?;
        write_fixed_string(writer, &self.name, MAX_FRAME_NAME)?;

        Ok(())
    }
}

/// A named attachment point: origin plus an orthonormal basis, per frame
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    pub name: String,
    pub origin: C3Vector,
    pub x_axis: C3Vector,
    pub y_axis: C3Vector,
    pub z_axis: C3Vector,
}

impl Tag {
    /// Parse a tag record from a reader
    pub fn parse<R: Read>(reader: &mut R) -> Result<Self> {
        let name = read_fixed_string(reader, MAX_QPATH)?;
        let origin = C3Vector::parse(reader)?;
        let x_axis = C3Vector::parse(reader)?;
        let y_axis = C3Vector::parse(reader)?;
        let z_axis = C3Vector::parse(reader)?;

        Ok(Self {
            name,
            origin,
            x_axis,
            y_axis,
            z_axis,
        })
    }

    /// Write a tag record to a writer
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        write_fixed_string(writer, &self.name, MAX_QPATH)?;
        self.origin.write(writer)?;
        self.x_axis.write(writer)?;
        self.y_axis.write(writer)?;
        self.z_axis.write(writer)?;

        Ok(())
    }

    /// Rigid transform with the tag axes as columns and the origin as
    /// translation
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_cols(
            self.x_axis.to_glam().extend(0.0),
            self.y_axis.to_glam().extend(0.0),
            self.z_axis.to_glam().extend(0.0),
            self.origin.to_glam().extend(1.0),
        )
    }
}

/// A decoded MD3 model
#[derive(Debug, Clone, PartialEq)]
pub struct Md3Model {
    pub header: Md3Header,
    /// One bounding volume per animation frame
    pub frames: Vec<Frame>,
    /// Outer index: animation frame; inner index: tag slot
    pub tag_frames: Vec<Vec<Tag>>,
    pub surfaces: Vec<Surface>,
}

impl Md3Model {
    /// Parse a model from a reader positioned at the file start
    pub fn parse<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let base = reader.stream_position()?;
        let header = Md3Header::parse(reader)?;

        reader.seek(SeekFrom::Start(base + header.ofs_frames as u64))?;
        let mut frames = Vec::with_capacity(header.num_frames as usize);
        for _ in 0..header.num_frames {
            frames.push(Frame::parse(reader)?);
        }

        reader.seek(SeekFrom::Start(base + header.ofs_tags as u64))?;
        let mut tag_frames = Vec::with_capacity(header.num_frames as usize);
        for _ in 0..header.num_frames {
            let mut tags = Vec::with_capacity(header.num_tags as usize);
            for _ in 0..header.num_tags {
                tags.push(Tag::parse(reader)?);
            }
            tag_frames.push(tags);
        }

        // Surfaces are contiguous; each parse leaves the reader at its own
        // ofs_end, which is the next surface's start
        reader.seek(SeekFrom::Start(base + header.ofs_surfaces as u64))?;
        let mut surfaces = Vec::with_capacity(header.num_surfaces as usize);
        for _ in 0..header.num_surfaces {
            surfaces.push(Surface::parse(reader)?);
        }

        let model = Self {
            header,
            frames,
            tag_frames,
            surfaces,
        };
        model.validate()?;

        log::debug!(
            "parsed MD3 model '{}': {} frames, {} tags, {} surfaces",
            model.header.name,
            model.frames.len(),
            model.header.num_tags,
            model.surfaces.len()
        );

        Ok(model)
    }

    /// Parse a model from an in-memory buffer
    pub fn parse_bytes(data: &[u8]) -> Result<Self> {
        Self::parse(&mut Cursor::new(data))
    }

    /// Load a model from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path)?;
        Self::parse_bytes(&data)
    }

    /// Write the model, recomputing all section offsets and counts
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        let num_frames = self.frames.len() as i32;
        let num_tags = self.tag_frames.first().map_or(0, Vec::len) as i32;
        let num_surfaces = self.surfaces.len() as i32;

        let ofs_frames = HEADER_SIZE as i32;
        let ofs_tags = ofs_frames + num_frames * FRAME_SIZE as i32;
        let ofs_surfaces = ofs_tags + num_frames * num_tags * TAG_SIZE as i32;
        let surfaces_size: usize = self.surfaces.iter().map(Surface::disk_size).sum();
        let ofs_end = ofs_surfaces + surfaces_size as i32;

        let header = Md3Header {
            version: MD3_VERSION,
            name: self.header.name.clone(),
            flags: self.header.flags,
            num_frames,
            num_tags,
            num_surfaces,
            num_skins: self.header.num_skins,
            ofs_frames,
            ofs_tags,
            ofs_surfaces,
            ofs_end,
        };
        header.write(writer)?;

        for frame in &self.frames {
            frame.write(writer)?;
        }
        for tags in &self.tag_frames {
            for tag in tags {
                tag.write(writer)?;
            }
        }
        for surface in &self.surfaces {
            surface.write(writer)?;
        }

        Ok(())
    }

    /// Save the model to a file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut buf = Vec::new();
        self.write(&mut buf)?;
        fs::write(path, buf)?;

        Ok(())
    }

    /// Check the cross-section invariants of the decoded model
    pub fn validate(&self) -> Result<()> {
        if self.tag_frames.len() != self.frames.len() {
            return Err(Md3Error::Validation(format!(
                "{} tag frames but {} bound frames",
                self.tag_frames.len(),
                self.frames.len()
            )));
        }

        let num_tags = self.tag_frames.first().map_or(0, Vec::len);
        if let Some(frame) = self
            .tag_frames
            .iter()
            .position(|tags| tags.len() != num_tags)
        {
            return Err(Md3Error::Validation(format!(
                "tag frame {frame} has {} tags, expected {num_tags}",
                self.tag_frames[frame].len()
            )));
        }

        for surface in &self.surfaces {
            if surface.frames_xyzn.len() != self.frames.len() {
                return Err(Md3Error::Validation(format!(
                    "surface '{}' has {} vertex frames but the model has {} frames",
                    surface.name,
                    surface.frames_xyzn.len(),
                    self.frames.len()
                )));
            }
            surface.validate()?;
        }

        Ok(())
    }

    /// Number of animation frames
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Look up a tag by name at the given frame
    ///
    /// The frame index is clamped into range, matching the forgiving
    /// lookup the player pipeline expects near clip boundaries.
    pub fn tag(&self, frame: usize, name: &str) -> Option<&Tag> {
        let tags = match self.tag_frames.get(frame) {
            Some(tags) => tags,
            None => self.tag_frames.last()?,
        };
        tags.iter().find(|tag| tag.name == name)
    }

    /// Names of the tags carried by this model (from the first frame)
    pub fn tag_names(&self) -> Vec<&str> {
        self.tag_frames
            .first()
            .map(|tags| tags.iter().map(|tag| tag.name.as_str()).collect())
            .unwrap_or_default()
    }

    /// Minimum z bound of the given frame, with the index clamped into range
    pub fn min_bounds_z(&self, frame: usize) -> f32 {
        if self.frames.is_empty() {
            return 0.0;
        }
        let index = frame.min(self.frames.len() - 1);
        self.frames[index].min_bounds.z
    }
}
