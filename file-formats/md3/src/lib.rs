// Re-export main components
pub mod common;
pub mod error;
pub mod header;
pub mod io_ext;
pub mod model;
pub mod skin;
pub mod surface;

// Re-export common types
pub use error::{Md3Error, Result};
pub use header::Md3Header;
pub use model::{Frame, Md3Model, Tag};
pub use skin::{SkinEntry, SkinFile};
pub use surface::Surface;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
