//! Text `.skin` files mapping surface names to texture images
//!
//! Each non-comment line is `surfacename,image/path.tga`. The special image
//! `null.tga` hides a surface. Lookups fall back from the exact surface name
//! to a normalized key so mesh variants (`h_head_1`) share the base entry.

use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::surface::normalize_surface_name;

/// One surface-to-image mapping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkinEntry {
    /// Surface name as written
    pub surface: String,
    /// Full image path with backslashes normalized
    pub image_path: String,
    /// Directory part of the image path (empty if none), with trailing slash
    pub image_dir: String,
    /// File name part of the image path
    pub image_name: String,
}

/// A parsed `.skin` mapping file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkinFile {
    pub entries: Vec<SkinEntry>,
}

impl SkinFile {
    /// Parse skin mapping text
    ///
    /// Unusable lines are skipped; an empty or malformed file parses to an
    /// empty map (callers substitute a placeholder texture).
    pub fn parse(text: &str) -> Self {
        let mut entries = Vec::new();

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with("//") {
                continue;
            }

            let mut parts = line.splitn(2, ',');
            let surface = parts.next().map(str::trim).unwrap_or_default();
            let image = parts.next().map(str::trim).unwrap_or_default();
            if surface.is_empty() || image.is_empty() {
                continue;
            }

            let image_path = image.replace('\\', "/");
            let (image_dir, image_name) = match image_path.rfind('/') {
                Some(idx) => (
                    image_path[..=idx].to_string(),
                    image_path[idx + 1..].to_string(),
                ),
                None => (String::new(), image_path.clone()),
            };

            entries.push(SkinEntry {
                surface: surface.to_string(),
                image_path,
                image_dir,
                image_name,
            });
        }

        Self { entries }
    }

    /// Load and parse a skin file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// Find the entry for a surface: exact (case-insensitive) match first,
    /// then by normalized name so `_1`/`_2` variants alias the base entry.
    /// The first matching entry wins.
    pub fn entry_for(&self, surface_name: &str) -> Option<&SkinEntry> {
        let exact = surface_name.trim().to_ascii_lowercase();
        if let Some(entry) = self
            .entries
            .iter()
            .find(|entry| entry.surface.trim().to_ascii_lowercase() == exact)
        {
            return Some(entry);
        }

        let normalized = normalize_surface_name(surface_name);
        self.entries
            .iter()
            .find(|entry| normalize_surface_name(&entry.surface) == normalized)
    }

    /// Whether the skin maps this surface to `null.tga` (hidden)
    pub fn is_hidden(&self, surface_name: &str) -> bool {
        self.entry_for(surface_name)
            .is_some_and(|entry| entry.image_name.eq_ignore_ascii_case("null.tga"))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SARGE_UPPER: &str = "\
u_torso,models/players/sarge/default.tga
u_arms,models/players/sarge/default.tga
// visor variants map to the same sheet
u_visor,models\\players\\sarge\\visor.tga

tag_head,
h_blink,null.tga
";

    #[test]
    fn test_parse_entries() {
        let skin = SkinFile::parse(SARGE_UPPER);

        // tag_head has no image and is skipped
        assert_eq!(skin.len(), 4);
        assert_eq!(skin.entries[0].surface, "u_torso");
        assert_eq!(skin.entries[0].image_name, "default.tga");
        assert_eq!(skin.entries[0].image_dir, "models/players/sarge/");
    }

    #[test]
    fn test_backslashes_normalized() {
        let skin = SkinFile::parse(SARGE_UPPER);

        let entry = skin.entry_for("u_visor").unwrap();
        assert_eq!(entry.image_path, "models/players/sarge/visor.tga");
        assert_eq!(entry.image_name, "visor.tga");
    }

    #[test]
    fn test_variant_suffix_aliases_base_entry() {
        let skin = SkinFile::parse(SARGE_UPPER);

        let entry = skin.entry_for("u_torso_1").unwrap();
        assert_eq!(entry.surface, "u_torso");

        let entry = skin.entry_for("U_Torso").unwrap();
        assert_eq!(entry.surface, "u_torso");
    }

    #[test]
    fn test_hidden_surface() {
        let skin = SkinFile::parse(SARGE_UPPER);

        assert!(skin.is_hidden("h_blink"));
        assert!(!skin.is_hidden("u_torso"));
        assert!(!skin.is_hidden("unmapped"));
    }

    #[test]
    fn test_empty_input() {
        let skin = SkinFile::parse("// only a comment\n\n");
        assert!(skin.is_empty());
        assert!(skin.entry_for("u_torso").is_none());
    }
}
