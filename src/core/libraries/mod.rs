pub mod hotfix;
pub mod model;
pub mod natives;
pub mod resolver;

pub use model::{Artifact, Library, LibraryOrigin, RuntimeLibrary};
pub use natives::extract_natives;
pub use resolver::{resolve_libraries, LibrarySet, ResolvedLibrary};
