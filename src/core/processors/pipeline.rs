// ─── Installer Pipeline ───
// Provisions installer inputs, then plans and runs client processors in order.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::archive::{read_main_class, InstallerArchive};
use super::profile::{InstallerBundle, ProcessorStep};
use super::tokens::{classify_data, substitute, DataValue};
use crate::core::cache::ResourceCache;
use crate::core::downloader::sha1_file;
use crate::core::engine::events::{emit, EventSink, InstallEvent};
use crate::core::error::{LauncherError, LauncherResult, ResultExt};
use crate::core::libraries::Library;
use crate::core::maven::LibrarySpecifier;
use crate::core::state::{EngineConfig, LauncherPaths};
use crate::core::version::{client_jar_path, VersionMetadata};

/// One fully planned processor run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorInvocation {
    /// Coordinate of the processor jar, for logs and errors.
    pub name: String,
    pub jar: PathBuf,
    pub main_class: String,
    /// Classpath entries excluding the processor jar itself.
    pub classpath: Vec<PathBuf>,
    pub args: Vec<String>,
    /// Expected output files and their SHA-1.
    pub outputs: Vec<(PathBuf, String)>,
}

impl ProcessorInvocation {
    /// Arguments for `java`: `-cp <classpath> <main> <args...>`.
    pub fn java_args(&self) -> Vec<String> {
        let separator = if cfg!(windows) { ";" } else { ":" };
        let classpath = self
            .classpath
            .iter()
            .chain(std::iter::once(&self.jar))
            .map(|p| p.to_string_lossy().to_string())
            .collect::<Vec<_>>()
            .join(separator);

        let mut args = vec!["-cp".to_string(), classpath, self.main_class.clone()];
        args.extend(self.args.iter().cloned());
        args
    }
}

/// Executes processor invocations. Swappable so tests never spawn a JVM.
#[async_trait]
pub trait ProcessorRunner: Send + Sync {
    async fn run(&self, invocation: &ProcessorInvocation) -> LauncherResult<()>;
}

/// Runs processors with a local Java binary.
pub struct JavaProcessorRunner {
    java: PathBuf,
    working_dir: PathBuf,
}

impl JavaProcessorRunner {
    pub fn new(java: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            java: java.into(),
            working_dir: working_dir.into(),
        }
    }
}

#[async_trait]
impl ProcessorRunner for JavaProcessorRunner {
    async fn run(&self, invocation: &ProcessorInvocation) -> LauncherResult<()> {
        let output = tokio::process::Command::new(&self.java)
            .args(invocation.java_args())
            .current_dir(&self.working_dir)
            .output()
            .await
            .map_err(|e| LauncherError::io(&self.java, e))?;

        if !output.status.success() {
            return Err(LauncherError::ProcessorExecutionFailed {
                jar: invocation.name.clone(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        debug!(
            "Processor {} finished: {}",
            invocation.name,
            String::from_utf8_lossy(&output.stdout).trim()
        );
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// The patched client already exists.
    Skipped,
    Completed { processors: usize },
}

pub struct InstallerPipeline<'a> {
    config: &'a EngineConfig,
    cache: &'a ResourceCache,
    runner: &'a dyn ProcessorRunner,
    events: Option<&'a EventSink>,
}

impl<'a> InstallerPipeline<'a> {
    pub fn new(
        config: &'a EngineConfig,
        cache: &'a ResourceCache,
        runner: &'a dyn ProcessorRunner,
    ) -> Self {
        Self {
            config,
            cache,
            runner,
            events: None,
        }
    }

    pub fn with_events(mut self, events: Option<&'a EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Runs the installer for `bundle` on top of the base game `base`.
    pub async fn run(
        &self,
        bundle: &InstallerBundle,
        base: &VersionMetadata,
    ) -> LauncherResult<PipelineOutcome> {
        let paths = &self.config.paths;

        let patched_target = bundle
            .profile
            .patched_output()?
            .map(|patched| paths.library_file(&patched.path()));
        if let Some(target) = &patched_target {
            if tokio::fs::try_exists(target).await.unwrap_or(false) {
                info!("{} {} already patched, skipping processors", bundle.kind, bundle.version);
                emit(
                    self.events,
                    InstallEvent::InstallerSkipped {
                        version: bundle.version.clone(),
                    },
                );
                return Ok(PipelineOutcome::Skipped);
            }
        }

        self.provision(bundle, base)
            .await
            .stage("provision installer inputs")?;

        let scratch = paths.tmp.join(format!("{}-{}", bundle.kind, bundle.version));
        let result = self.execute(bundle, base, &scratch).await;
        if result.is_err() {
            // The patched client doubles as the completion marker.
            if let Some(target) = &patched_target {
                discard_output(target).await;
            }
        }

        if let Err(e) = tokio::fs::remove_dir_all(&scratch).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to clean up {:?}: {}", scratch, e);
            }
        }
        result
    }

    async fn execute(
        &self,
        bundle: &InstallerBundle,
        base: &VersionMetadata,
        scratch: &Path,
    ) -> LauncherResult<PipelineOutcome> {
        let vars = build_variables(bundle, base, &self.config.paths, scratch)
            .await
            .stage("build processor variables")?;

        let library_map = bundle.profile.library_map();
        let steps: Vec<&ProcessorStep> = bundle.profile.client_processors().collect();
        let mut plan = Vec::with_capacity(steps.len());
        for step in steps {
            plan.push(plan_invocation(step, &library_map, &vars, &self.config.paths)?);
        }

        if let Err(err) = self.run_plan(&plan).await {
            for (path, _) in plan.iter().flat_map(|invocation| &invocation.outputs) {
                discard_output(path).await;
            }
            return Err(err);
        }
        Ok(PipelineOutcome::Completed {
            processors: plan.len(),
        })
    }

    async fn run_plan(&self, plan: &[ProcessorInvocation]) -> LauncherResult<()> {
        let total = plan.len();
        let cancel = self.cache.downloader().cancel_token();
        for (index, invocation) in plan.iter().enumerate() {
            cancel.check()?;
            info!(
                "Running processor {}/{}: {} ({})",
                index + 1,
                total,
                invocation.name,
                invocation.main_class
            );
            emit(
                self.events,
                InstallEvent::ProcessorStarted {
                    index,
                    total,
                    jar: invocation.name.clone(),
                },
            );
            self.runner.run(invocation).await?;
            verify_outputs(invocation).await?;
        }
        Ok(())
    }

    /// Downloads the base client and every profile library that is not
    /// already satisfied.
    async fn provision(&self, bundle: &InstallerBundle, base: &VersionMetadata) -> LauncherResult<()> {
        let paths = &self.config.paths;
        let mut artifacts: Vec<_> = base.client.iter().cloned().collect();
        artifacts.extend(
            bundle
                .profile
                .libraries()
                .into_iter()
                .filter_map(|l| l.artifact),
        );

        let mut tasks = Vec::new();
        for artifact in artifacts {
            if ResourceCache::installed(&artifact.cache_entry(paths)).await? {
                continue;
            }
            if let Some(task) = artifact.download_task(paths) {
                tasks.push(task);
            }
        }

        if tasks.is_empty() {
            return Ok(());
        }
        info!("Provisioning {} installer inputs", tasks.len());
        self.cache
            .downloader()
            .download_batch(tasks)
            .await
            .into_result()
            .map(|_| ())
    }
}

/// Runtime variables plus the profile's client `data` values.
async fn build_variables(
    bundle: &InstallerBundle,
    base: &VersionMetadata,
    paths: &LauncherPaths,
    scratch: &Path,
) -> LauncherResult<BTreeMap<String, String>> {
    let display = |p: &Path| p.to_string_lossy().to_string();

    let mut vars = BTreeMap::new();
    vars.insert("SIDE".to_string(), "client".to_string());
    vars.insert(
        "MINECRAFT_JAR".to_string(),
        display(&paths.library_file(&client_jar_path(&base.id))),
    );
    vars.insert("MINECRAFT_VERSION".to_string(), base.id.clone());
    vars.insert("ROOT".to_string(), display(&paths.root));
    vars.insert("INSTALLER".to_string(), display(&bundle.archive));
    vars.insert("LIBRARY_DIR".to_string(), display(&paths.libraries));

    let mut embedded = Vec::new();
    for (name, entry) in &bundle.profile.data {
        let value = match classify_data(&entry.client)? {
            DataValue::Library(spec) => display(&paths.library_file(&spec.path())),
            DataValue::Literal(value) | DataValue::Plain(value) => value,
            DataValue::Embedded(file) => {
                let relative = Path::new(file.trim_start_matches('/'));
                let contained = relative.components().next().is_some()
                    && relative
                        .components()
                        .all(|c| matches!(c, Component::Normal(_)));
                if !contained {
                    return Err(LauncherError::InvalidProcessorArgument(format!(
                        "embedded entry {file} leaves the extraction directory"
                    )));
                }
                let dest = scratch.join(relative);
                let value = display(&dest);
                embedded.push((file, dest));
                value
            }
        };
        vars.insert(name.clone(), value);
    }

    if !embedded.is_empty() {
        let archive_path = bundle.archive.clone();
        tokio::task::spawn_blocking(move || -> LauncherResult<()> {
            let mut archive = InstallerArchive::open(&archive_path)?;
            for (entry, dest) in embedded {
                archive.extract_to(&entry, &dest)?;
            }
            Ok(())
        })
        .await
        .map_err(|e| LauncherError::Other(format!("extraction task failed: {e}")))??;
    }

    Ok(vars)
}

fn plan_invocation(
    step: &ProcessorStep,
    libraries: &BTreeMap<LibrarySpecifier, Library>,
    vars: &BTreeMap<String, String>,
    paths: &LauncherPaths,
) -> LauncherResult<ProcessorInvocation> {
    let locate = |spec: &LibrarySpecifier| -> LauncherResult<PathBuf> {
        let library = libraries
            .get(spec)
            .ok_or_else(|| LauncherError::UnresolvedLibrarySpecifier(spec.to_string()))?;
        Ok(match &library.artifact {
            Some(artifact) => artifact.runtime_path(paths),
            None => paths.library_file(&spec.path()),
        })
    };

    let jar = locate(&step.jar)?;
    let classpath = step
        .classpath
        .iter()
        .map(locate)
        .collect::<LauncherResult<Vec<_>>>()?;
    let main_class = read_main_class(&jar)?;

    let args = step
        .args
        .iter()
        .map(|arg| substitute(arg, vars, paths))
        .collect::<LauncherResult<Vec<_>>>()?;

    let mut outputs = Vec::with_capacity(step.outputs.len());
    for (file, sha1) in &step.outputs {
        outputs.push((
            PathBuf::from(substitute(file, vars, paths)?),
            substitute(sha1, vars, paths)?,
        ));
    }

    Ok(ProcessorInvocation {
        name: step.jar.to_string(),
        jar,
        main_class,
        classpath,
        args,
        outputs,
    })
}

/// Removes a partial processor output so the next run starts over.
async fn discard_output(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!("Discarded processor output {:?}", path),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!("Failed to discard processor output {:?}: {}", path, e),
    }
}

async fn verify_outputs(invocation: &ProcessorInvocation) -> LauncherResult<()> {
    for (path, expected) in &invocation.outputs {
        let actual = sha1_file(path).await?;
        if !actual.eq_ignore_ascii_case(expected) {
            return Err(LauncherError::ChecksumMismatch {
                path: path.clone(),
                expected: expected.clone(),
                actual,
            });
        }
    }
    Ok(())
}
