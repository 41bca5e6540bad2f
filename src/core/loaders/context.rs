use crate::core::cache::ResourceCache;
use crate::core::state::EngineConfig;

/// Everything a loader strategy needs to resolve its metadata.
#[derive(Clone, Copy)]
pub struct ResolveContext<'a> {
    /// Concrete game version id, aliases already resolved.
    pub game_version: &'a str,
    /// Requested loader version or `"latest"`.
    pub loader_version: &'a str,
    pub config: &'a EngineConfig,
    pub cache: &'a ResourceCache,
}

impl ResolveContext<'_> {
    pub fn wants_latest(&self) -> bool {
        self.loader_version.is_empty() || self.loader_version.eq_ignore_ascii_case("latest")
    }
}
