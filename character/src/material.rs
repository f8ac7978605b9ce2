//! Texture path cache and surface render hints
//!
//! The core never decodes images. It resolves surface names to image paths
//! through the skin mapping, dedupes those paths in an explicit, injected
//! cache, and derives per-surface render hints from the image name alone.
//! The renderer owns pixels, uploads and draw state.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bitflags::bitflags;
use md3::SkinFile;

/// Opaque handle to a cached texture path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(u32);

impl TextureHandle {
    /// Reserved plain-white placeholder for unmapped or hidden surfaces
    pub const WHITE: Self = Self(0);

    pub fn index(self) -> u32 {
        self.0
    }
}

bitflags! {
    /// Render-stage hints derived from a skin image name, passed through to
    /// the renderer untouched
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct SurfaceHints: u32 {
        /// Surface is not drawn at all (mapped to null.tga)
        const HIDDEN = 0x01;
        /// Additive blend stage without depth writes
        const ADDITIVE = 0x02;
        /// Scrolling additive beam stage
        const LASER = 0x04;
        /// Muzzle-flash stage faded by the owner's additive alpha
        const FLASH = 0x08;
    }
}

impl SurfaceHints {
    /// Derive hints from an image file name
    pub fn for_image(image_name: &str) -> Self {
        let name = image_name.trim().to_ascii_lowercase();

        if name == "null.tga" {
            return Self::HIDDEN;
        }
        if name.ends_with("shotgun_laser.tga") || name.ends_with("shotgun_laser") {
            return Self::ADDITIVE | Self::LASER;
        }
        if name.starts_with("f_") && name.ends_with(".tga") {
            return Self::ADDITIVE | Self::FLASH;
        }

        Self::empty()
    }

    /// UV scroll rate in texture units per second for scrolling stages
    pub fn uv_scroll(self) -> (f32, f32) {
        if self.contains(Self::LASER) {
            (0.75, 0.0)
        } else {
            (0.0, 0.0)
        }
    }
}

/// One resolved texture path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextureEntry {
    pub dir: PathBuf,
    pub file_name: String,
}

/// Explicit texture path cache keyed by (directory, file name)
///
/// The first insert wins and entries are never mutated after population,
/// so handles stay valid for the life of the pool. Callers hold an explicit
/// reference to the pool; there is no process-wide instance.
#[derive(Debug)]
pub struct TexturePool {
    entries: Vec<TextureEntry>,
    by_key: HashMap<(PathBuf, String), TextureHandle>,
}

impl TexturePool {
    pub fn new() -> Self {
        Self {
            entries: vec![TextureEntry {
                dir: PathBuf::new(),
                file_name: "__white__".to_string(),
            }],
            by_key: HashMap::new(),
        }
    }

    /// The reserved placeholder handle
    pub fn white(&self) -> TextureHandle {
        TextureHandle::WHITE
    }

    /// Return the handle for a path, inserting it on first sight
    pub fn get_or_insert(&mut self, dir: &Path, file_name: &str) -> TextureHandle {
        let key = (dir.to_path_buf(), file_name.to_string());
        if let Some(&handle) = self.by_key.get(&key) {
            return handle;
        }

        let handle = TextureHandle(self.entries.len() as u32);
        self.entries.push(TextureEntry {
            dir: key.0.clone(),
            file_name: key.1.clone(),
        });
        self.by_key.insert(key, handle);

        handle
    }

    pub fn entry(&self, handle: TextureHandle) -> Option<&TextureEntry> {
        self.entries.get(handle.0 as usize)
    }

    /// Number of entries including the placeholder
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TexturePool {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolved appearance of one surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceMaterial {
    pub texture: TextureHandle,
    pub hints: SurfaceHints,
}

/// Resolve a surface's texture handle and hints through a skin mapping
///
/// Unmapped and hidden surfaces get the white placeholder so rendering can
/// always proceed.
pub fn resolve_surface(
    pool: &mut TexturePool,
    skin: &SkinFile,
    dir: &Path,
    surface_name: &str,
) -> SurfaceMaterial {
    match skin.entry_for(surface_name) {
        Some(entry) => {
            let hints = SurfaceHints::for_image(&entry.image_name);
            let texture = if hints.contains(SurfaceHints::HIDDEN) {
                pool.white()
            } else {
                pool.get_or_insert(dir, &entry.image_path)
            };
            SurfaceMaterial { texture, hints }
        }
        None => SurfaceMaterial {
            texture: pool.white(),
            hints: SurfaceHints::empty(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_insert_wins_and_handles_are_stable() {
        let mut pool = TexturePool::new();
        let dir = Path::new("models/players/sarge");

        let a = pool.get_or_insert(dir, "default.tga");
        let b = pool.get_or_insert(dir, "default.tga");
        let c = pool.get_or_insert(dir, "visor.tga");

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, pool.white());
        assert_eq!(pool.len(), 3);

        assert_eq!(pool.entry(a).unwrap().file_name, "default.tga");
        assert_eq!(pool.entry(pool.white()).unwrap().file_name, "__white__");
    }

    #[test]
    fn same_name_in_different_dirs_is_distinct() {
        let mut pool = TexturePool::new();

        let a = pool.get_or_insert(Path::new("models/players/sarge"), "default.tga");
        let b = pool.get_or_insert(Path::new("models/players/grunt"), "default.tga");

        assert_ne!(a, b);
    }

    #[test]
    fn hints_from_image_names() {
        assert_eq!(SurfaceHints::for_image("null.tga"), SurfaceHints::HIDDEN);
        assert_eq!(SurfaceHints::for_image("NULL.TGA"), SurfaceHints::HIDDEN);
        assert_eq!(SurfaceHints::for_image("default.tga"), SurfaceHints::empty());

        let laser = SurfaceHints::for_image("shotgun_laser.tga");
        assert!(laser.contains(SurfaceHints::ADDITIVE | SurfaceHints::LASER));
        assert_eq!(laser.uv_scroll(), (0.75, 0.0));

        let flash = SurfaceHints::for_image("f_shotgun.tga");
        assert!(flash.contains(SurfaceHints::ADDITIVE | SurfaceHints::FLASH));
        assert!(!flash.contains(SurfaceHints::LASER));
        assert_eq!(flash.uv_scroll(), (0.0, 0.0));

        // The f_ prefix only applies to tga images
        assert_eq!(SurfaceHints::for_image("f_oo"), SurfaceHints::empty());
    }

    #[test]
    fn resolve_through_skin_mapping() {
        let mut pool = TexturePool::new();
        let skin = SkinFile::parse(
            "u_torso,models/players/sarge/default.tga\nh_blink,null.tga\n",
        );
        let dir = Path::new("models/players/sarge");

        let torso = resolve_surface(&mut pool, &skin, dir, "u_torso");
        assert_eq!(torso.hints, SurfaceHints::empty());
        assert_eq!(
            pool.entry(torso.texture).unwrap().file_name,
            "models/players/sarge/default.tga"
        );

        // Variant surfaces share the base entry and therefore the handle
        let variant = resolve_surface(&mut pool, &skin, dir, "u_torso_2");
        assert_eq!(variant.texture, torso.texture);

        let hidden = resolve_surface(&mut pool, &skin, dir, "h_blink");
        assert!(hidden.hints.contains(SurfaceHints::HIDDEN));
        assert_eq!(hidden.texture, pool.white());

        let unmapped = resolve_surface(&mut pool, &skin, dir, "u_unknown");
        assert_eq!(unmapped.texture, pool.white());
        assert_eq!(unmapped.hints, SurfaceHints::empty());
    }
}
