// Re-export main components
pub mod action;
pub mod character;
pub mod clip;
pub mod crossfade;
pub mod error;
pub mod loader;
pub mod material;
pub mod node;

// Re-export common types
pub use character::{Part, PlayerModel};
pub use clip::{Clip, ClipSet, FramePair, Region};
pub use crossfade::Crossfade;
pub use error::{CharacterError, Result};
pub use loader::{LoadTicket, LoadedVariant, VariantLoader};
pub use material::{SurfaceHints, SurfaceMaterial, TextureHandle, TexturePool};
pub use node::{MeshPose, NodeRef, SceneNode};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
