//! Clip directory command implementation

use anyhow::Result;
use std::path::Path;

use md3_character::{ClipSet, Region};

pub fn print_table(file: &Path) -> Result<()> {
    let set = ClipSet::load(file);

    for (region, label) in [(Region::Torso, "upper"), (Region::Legs, "lower")] {
        println!("{label} mesh clips:");
        println!(
            "  {:<14} {:>5} {:>6} {:>6} {:>4}",
            "name", "first", "count", "loop", "fps"
        );

        for name in set.names(region) {
            if let Some(clip) = set.get(region, name) {
                println!(
                    "  {:<14} {:>5} {:>6} {:>6} {:>4}",
                    clip.name, clip.first_frame, clip.num_frames, clip.loop_frames, clip.fps
                );
            }
        }
        println!();
    }

    Ok(())
}
