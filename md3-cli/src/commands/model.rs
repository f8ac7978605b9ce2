//! MD3 model file command implementations

use anyhow::{Context, Result};
use std::path::Path;

use md3::Md3Model;

pub fn info(file: &Path, detailed: bool) -> Result<()> {
    let model = Md3Model::load(file)
        .with_context(|| format!("failed to load MD3 file {}", file.display()))?;

    println!("MD3 model: {}", model.header.name);
    println!("  Version:  {}", model.header.version);
    println!("  Frames:   {}", model.frame_count());
    println!("  Tags:     {}", model.header.num_tags);
    println!("  Surfaces: {}", model.surfaces.len());

    if detailed {
        if !model.tag_names().is_empty() {
            println!();
            println!("Tags:");
            for name in model.tag_names() {
                println!("  {name}");
            }
        }

        println!();
        println!("Surfaces:");
        for surface in &model.surfaces {
            println!(
                "  {}: {} vertices, {} triangles, {} shaders",
                surface.name,
                surface.vertex_count(),
                surface.triangle_count(),
                surface.shaders.len()
            );
            for shader in &surface.shaders {
                println!("    shader: {}", shader.name);
            }
        }

        if let Some(frame) = model.frames.first() {
            println!();
            println!("First frame bounds:");
            println!(
                "  min ({:.2}, {:.2}, {:.2})",
                frame.min_bounds.x, frame.min_bounds.y, frame.min_bounds.z
            );
            println!(
                "  max ({:.2}, {:.2}, {:.2})",
                frame.max_bounds.x, frame.max_bounds.y, frame.max_bounds.z
            );
            println!("  radius {:.2}", frame.radius);
        }
    }

    Ok(())
}

pub fn tree(file: &Path) -> Result<()> {
    let model = Md3Model::load(file)
        .with_context(|| format!("failed to load MD3 file {}", file.display()))?;

    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| file.display().to_string());

    println!("{file_name} ({} v{})", model.header.name, model.header.version);
    println!("├── frames: {}", model.frame_count());

    let tag_names = model.tag_names();
    if tag_names.is_empty() {
        println!("├── tags: none");
    } else {
        println!("├── tags: {}", tag_names.len());
        for (i, name) in tag_names.iter().enumerate() {
            let branch = if i + 1 == tag_names.len() {
                "└──"
            } else {
                "├──"
            };
            println!("│   {branch} {name}");
        }
    }

    println!("└── surfaces: {}", model.surfaces.len());
    for (i, surface) in model.surfaces.iter().enumerate() {
        let branch = if i + 1 == model.surfaces.len() {
            "└──"
        } else {
            "├──"
        };
        println!(
            "    {branch} {}: {} verts, {} tris, {} frames",
            surface.name,
            surface.vertex_count(),
            surface.triangle_count(),
            surface.frames_xyzn.len()
        );
    }

    Ok(())
}
