mod repository;
mod specifier;

pub use repository::MavenRepository;
pub use specifier::LibrarySpecifier;
