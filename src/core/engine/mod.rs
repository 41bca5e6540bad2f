// ─── Engine ───
// Orchestrates metadata, installer, library and asset stages under the root lock.

pub mod events;

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

pub use events::{EventSink, InstallEvent};

use self::events::emit;
use crate::core::assets::{resolve_assets, AssetSet};
use crate::core::auth::Session;
use crate::core::cache::{acquire_root_lock, ResourceCache, RootLockGuard};
use crate::core::downloader::{CancelToken, Downloader};
use crate::core::error::{LauncherError, LauncherResult, ResultExt};
use crate::core::http::build_http_client;
use crate::core::java::{check_java_major, required_java_for_minecraft_version, resolve_java_binary};
use crate::core::launch::{LaunchEnvironment, LaunchInputs, LaunchOptions};
use crate::core::libraries::{extract_natives, resolve_libraries, LibrarySet};
use crate::core::loaders::{resolve_metadata, LoaderKind};
use crate::core::processors::{InstallerPipeline, JavaProcessorRunner, PipelineOutcome, ProcessorRunner};
use crate::core::state::EngineConfig;
use crate::core::version::{Platform, VersionMetadata};

/// What to install: a game version (or `release`/`snapshot`) plus an
/// optional loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallRequest {
    pub game_version: String,
    #[serde(default)]
    pub loader: LoaderKind,
    /// Concrete loader version or `latest`. Ignored for vanilla.
    #[serde(default)]
    pub loader_version: String,
}

impl InstallRequest {
    pub fn vanilla(game_version: impl Into<String>) -> Self {
        Self::new(game_version, LoaderKind::Vanilla, "")
    }

    pub fn new(
        game_version: impl Into<String>,
        loader: LoaderKind,
        loader_version: impl Into<String>,
    ) -> Self {
        Self {
            game_version: game_version.into(),
            loader,
            loader_version: loader_version.into(),
        }
    }
}

/// Classified install plan for one request.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub metadata: VersionMetadata,
    pub libraries: LibrarySet,
    pub assets: AssetSet,
    /// Outcome of the installer processors, for loaders that have them.
    pub installer: Option<PipelineOutcome>,
}

impl Resolution {
    /// True when nothing is left to download.
    pub fn is_complete(&self) -> bool {
        self.libraries.required_count() == 0 && self.assets.required_count() == 0
    }
}

pub struct Engine {
    config: EngineConfig,
    cache: ResourceCache,
    platform: Platform,
    runner: Arc<dyn ProcessorRunner>,
    events: Option<EventSink>,
}

impl Engine {
    /// An engine for the host platform that runs processors with the
    /// configured Java.
    pub fn new(config: EngineConfig) -> LauncherResult<Self> {
        let downloader = Downloader::new(build_http_client()?)
            .with_concurrency(config.settings.effective_concurrency());
        let runner = JavaProcessorRunner::new(
            resolve_java_binary(&config.settings),
            config.paths.libraries.clone(),
        );
        Ok(Self {
            cache: ResourceCache::new(downloader),
            platform: Platform::current(),
            runner: Arc::new(runner),
            events: None,
            config,
        })
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    pub fn with_runner(mut self, runner: Arc<dyn ProcessorRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        let downloader = self.cache.downloader().clone().with_cancel(cancel);
        self.cache = ResourceCache::new(downloader);
        self
    }

    /// Delivers progress events to `sink`, download progress included.
    pub fn with_events(mut self, sink: EventSink) -> Self {
        let progress_sink = sink.clone();
        let downloader = self
            .cache
            .downloader()
            .clone()
            .with_progress(Arc::new(move |completed, total| {
                progress_sink(InstallEvent::Downloading { completed, total })
            }));
        self.cache = ResourceCache::new(downloader);
        self.events = Some(sink);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache(&self) -> &ResourceCache {
        &self.cache
    }

    pub fn cancel_token(&self) -> &CancelToken {
        self.cache.downloader().cancel_token()
    }

    /// Resolves and classifies everything `request` needs without
    /// downloading libraries or assets. Installer processors do run, since
    /// later stages depend on their output.
    #[instrument(skip(self), fields(version = %request.game_version, loader = %request.loader))]
    pub async fn resolve(&self, request: &InstallRequest) -> LauncherResult<Resolution> {
        let _lock = self.lock().await?;
        self.resolve_unlocked(request).await
    }

    /// Resolves, then downloads every required library and asset. The
    /// returned classification is the one found before downloading.
    #[instrument(skip(self), fields(version = %request.game_version, loader = %request.loader))]
    pub async fn install(&self, request: &InstallRequest) -> LauncherResult<Resolution> {
        let _lock = self.lock().await?;
        self.install_unlocked(request).await
    }

    /// Installs, extracts natives and builds the launch command line.
    pub async fn prepare_launch(
        &self,
        request: &InstallRequest,
        session: &Session,
        options: &LaunchOptions,
    ) -> LauncherResult<LaunchEnvironment> {
        let _lock = self.lock().await?;
        let resolution = self.install_unlocked(request).await?;
        let paths = &self.config.paths;
        let metadata = &resolution.metadata;

        let natives_dir = extract_natives(&resolution.libraries, paths, &metadata.id)
            .await
            .stage("extract natives")?;

        let java = resolve_java_binary(&self.config.settings);
        let required = metadata
            .java_major
            .unwrap_or_else(|| required_java_for_minecraft_version(&metadata.id));
        check_java_major(&java, required).await;

        let env = LaunchEnvironment::build(LaunchInputs {
            metadata,
            classpath: resolution.libraries.classpath(paths),
            natives_dir,
            java,
            session,
            options,
            paths,
            platform: &self.platform,
        })?;
        tokio::fs::create_dir_all(&env.working_dir)
            .await
            .map_err(|e| LauncherError::io(&env.working_dir, e))?;
        Ok(env)
    }

    async fn lock(&self) -> LauncherResult<RootLockGuard> {
        acquire_root_lock(&self.config.paths.lock_file(), self.cancel_token())
            .await
            .stage("acquire root lock")
    }

    async fn resolve_unlocked(&self, request: &InstallRequest) -> LauncherResult<Resolution> {
        let events = self.events.as_ref();
        let resolved = resolve_metadata(
            &self.config,
            &self.cache,
            request.loader,
            &request.game_version,
            &request.loader_version,
        )
        .await?;
        emit(
            events,
            InstallEvent::MetadataResolved {
                version_id: resolved.metadata.id.clone(),
                loader: request.loader,
            },
        );

        let installer = match &resolved.installer {
            Some(bundle) => Some(
                InstallerPipeline::new(&self.config, &self.cache, self.runner.as_ref())
                    .with_events(events)
                    .run(bundle, &resolved.base)
                    .await
                    .stage("run installer")?,
            ),
            None => None,
        };

        let libraries = resolve_libraries(&self.config, &self.cache, &self.platform, &resolved.metadata)
            .await
            .stage("resolve libraries")?;
        emit(
            events,
            InstallEvent::LibrariesResolved {
                total: libraries.len(),
                required: libraries.required_count(),
            },
        );

        let assets = resolve_assets(&self.config, &self.cache, &resolved.metadata.asset_index)
            .await
            .stage("resolve assets")?;
        emit(
            events,
            InstallEvent::AssetsResolved {
                total: assets.len(),
                required: assets.required_count(),
            },
        );

        Ok(Resolution {
            metadata: resolved.metadata,
            libraries,
            assets,
            installer,
        })
    }

    async fn install_unlocked(&self, request: &InstallRequest) -> LauncherResult<Resolution> {
        let resolution = self.resolve_unlocked(request).await?;
        let paths = &self.config.paths;

        let mut tasks = resolution.libraries.download_tasks(paths);
        tasks.extend(
            resolution
                .assets
                .download_tasks(paths, &self.config.endpoints().resources),
        );

        if !tasks.is_empty() {
            info!("Downloading {} files for {}", tasks.len(), resolution.metadata.id);
            self.cache
                .downloader()
                .download_batch(tasks)
                .await
                .into_result()
                .stage("download required files")?;
        }

        emit(
            self.events.as_ref(),
            InstallEvent::Finished {
                version_id: resolution.metadata.id.clone(),
            },
        );
        Ok(resolution)
    }
}
