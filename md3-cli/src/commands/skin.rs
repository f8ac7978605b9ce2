//! Skin mapping command implementation

use anyhow::{Context, Result};
use std::path::Path;

use md3::SkinFile;
use md3_character::SurfaceHints;

fn hint_label(hints: SurfaceHints) -> &'static str {
    if hints.contains(SurfaceHints::HIDDEN) {
        "hidden"
    } else if hints.contains(SurfaceHints::LASER) {
        "additive, scrolling"
    } else if hints.contains(SurfaceHints::FLASH) {
        "additive, flash"
    } else {
        "opaque"
    }
}

pub fn print_mapping(file: &Path) -> Result<()> {
    let skin = SkinFile::load(file)
        .with_context(|| format!("failed to load skin file {}", file.display()))?;

    if skin.is_empty() {
        println!("no surface mappings");
        return Ok(());
    }

    for entry in &skin.entries {
        let hints = SurfaceHints::for_image(&entry.image_name);
        println!(
            "{:<16} -> {:<40} [{}]",
            entry.surface,
            entry.image_path,
            hint_label(hints)
        );
    }

    Ok(())
}
