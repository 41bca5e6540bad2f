pub mod core;

use tracing_subscriber::EnvFilter;

pub use crate::core::auth::Session;
pub use crate::core::engine::{Engine, EventSink, InstallEvent, InstallRequest, Resolution};
pub use crate::core::error::{LauncherError, LauncherResult};
pub use crate::core::launch::{LaunchEnvironment, LaunchOptions};
pub use crate::core::loaders::LoaderKind;
pub use crate::core::state::EngineConfig;

/// Installs a `tracing` subscriber honouring `RUST_LOG`. Safe to call more
/// than once; later calls are ignored.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,blocklaunch_lib=debug")),
        )
        .try_init();
}
