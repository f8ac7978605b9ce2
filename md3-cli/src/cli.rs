//! Command line interface definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "md3-cli",
    about = "Inspect Quake III MD3 models and player animation data",
    version
)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Display information about an MD3 model file
    Info {
        /// Path to the MD3 file
        file: PathBuf,

        /// Show detailed information
        #[arg(short, long)]
        detailed: bool,
    },

    /// Display an MD3 file's structure as a tree
    Tree {
        /// Path to the MD3 file
        file: PathBuf,
    },

    /// Display the clip table of an animation.cfg in both frame spaces
    Clips {
        /// Path to the animation.cfg file
        file: PathBuf,
    },

    /// Display a .skin surface-to-image mapping with render hints
    Skin {
        /// Path to the .skin file
        file: PathBuf,
    },
}
