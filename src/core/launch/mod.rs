// ─── Launch ───
// Turns a resolved install into a ready-to-spawn Java command line.

pub mod arguments;

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};
use tracing::debug;

pub use arguments::{substitute_game_args, substitute_jvm_args, LaunchVariables};

use crate::core::auth::Session;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::state::LauncherPaths;
use crate::core::version::{expand_templates, Platform, VersionMetadata};

const LAUNCHER_NAME: &str = "Blocklaunch";

/// Per-launch knobs that are not part of the game metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchOptions {
    /// Defaults to `instances/<version id>`.
    pub game_dir: Option<PathBuf>,
    pub max_memory_mb: u32,
    pub min_memory_mb: u32,
    pub extra_jvm_args: Vec<String>,
    pub window: Option<(u32, u32)>,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            game_dir: None,
            max_memory_mb: 2048,
            min_memory_mb: 512,
            extra_jvm_args: Vec::new(),
            window: None,
        }
    }
}

/// Everything needed to start the game. Spawning is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchEnvironment {
    pub java: PathBuf,
    pub main_class: String,
    pub classpath: Vec<PathBuf>,
    pub jvm_args: Vec<String>,
    pub game_args: Vec<String>,
    pub working_dir: PathBuf,
    pub natives_dir: PathBuf,
}

/// Inputs for [`LaunchEnvironment::build`].
pub struct LaunchInputs<'a> {
    pub metadata: &'a VersionMetadata,
    pub classpath: Vec<PathBuf>,
    pub natives_dir: PathBuf,
    pub java: PathBuf,
    pub session: &'a Session,
    pub options: &'a LaunchOptions,
    pub paths: &'a LauncherPaths,
    pub platform: &'a Platform,
}

impl LaunchEnvironment {
    pub fn build(inputs: LaunchInputs<'_>) -> LauncherResult<Self> {
        let LaunchInputs {
            metadata,
            classpath,
            natives_dir,
            java,
            session,
            options,
            paths,
            platform,
        } = inputs;

        if classpath.is_empty() {
            return Err(LauncherError::Other(format!(
                "empty classpath for {}",
                metadata.id
            )));
        }

        let working_dir = options
            .game_dir
            .clone()
            .unwrap_or_else(|| paths.instances.join(&metadata.id));
        let joined = join_classpath(&classpath);

        let mut vars = LaunchVariables::new();
        vars.set("natives_directory", display(&natives_dir))
            .set("library_directory", display(&paths.libraries))
            .set("classpath", joined)
            .set("classpath_separator", classpath_separator())
            .set("game_directory", display(&working_dir))
            .set("assets_root", display(&paths.assets))
            .set("game_assets", display(&paths.assets))
            .set("assets_index_name", metadata.asset_index.id.clone())
            .set("version_name", metadata.loader_id.clone().unwrap_or_else(|| metadata.id.clone()))
            .set("version_type", metadata.version_type.clone())
            .set("launcher_name", LAUNCHER_NAME)
            .set("launcher_version", env!("CARGO_PKG_VERSION"))
            .set("auth_player_name", session.username.clone())
            .set("auth_uuid", session.uuid.clone())
            .set("auth_access_token", session.access_token.clone())
            .set("auth_session", session.access_token.clone())
            .set("auth_xuid", "0")
            .set("clientid", "")
            .set("user_type", session.user_type())
            .set("user_properties", "{}");

        let mut jvm_args = vec![
            format!("-Xmx{}M", options.max_memory_mb),
            format!("-Xms{}M", options.min_memory_mb),
        ];
        jvm_args.extend(substitute_jvm_args(
            &expand_templates(&metadata.jvm_args, platform)?,
            &vars,
        ));
        jvm_args.extend(options.extra_jvm_args.iter().cloned());

        let mut game_args =
            substitute_game_args(&expand_templates(&metadata.game_args, platform)?, &vars);
        if let Some((width, height)) = options.window {
            game_args.extend([
                "--width".to_string(),
                width.to_string(),
                "--height".to_string(),
                height.to_string(),
            ]);
        }

        Ok(Self {
            java,
            main_class: metadata.main_class.clone(),
            classpath,
            jvm_args,
            game_args,
            working_dir,
            natives_dir,
        })
    }

    /// Full argument list after the java binary.
    pub fn args(&self) -> Vec<String> {
        let mut args = self.jvm_args.clone();
        args.push("-cp".to_string());
        args.push(join_classpath(&self.classpath));
        args.push(self.main_class.clone());
        args.extend(self.game_args.iter().cloned());
        args
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.java);
        cmd.args(self.args()).current_dir(&self.working_dir);
        configure_native_library_env(&mut cmd, &self.natives_dir);
        debug!("Launch command: {:?}", cmd);
        cmd
    }
}

fn classpath_separator() -> &'static str {
    if cfg!(windows) {
        ";"
    } else {
        ":"
    }
}

fn join_classpath(entries: &[PathBuf]) -> String {
    entries
        .iter()
        .map(|p| display(p))
        .collect::<Vec<_>>()
        .join(classpath_separator())
}

fn display(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn configure_native_library_env(cmd: &mut Command, natives_dir: &Path) {
    let var = if cfg!(target_os = "windows") {
        "PATH"
    } else if cfg!(target_os = "macos") {
        "DYLD_LIBRARY_PATH"
    } else {
        "LD_LIBRARY_PATH"
    };
    cmd.env(var, prepend_env_path(var, &display(natives_dir)));
}

fn prepend_env_path(var_name: &str, value: &str) -> String {
    match std::env::var(var_name) {
        Ok(existing) if !existing.trim().is_empty() => {
            format!("{}{}{}", value, classpath_separator(), existing)
        }
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::loaders::LoaderKind;
    use crate::core::version::rules::{Arch, OsName};
    use crate::core::version::{AssetIndexRef, ArgumentTemplate};

    fn metadata() -> VersionMetadata {
        let plain = |s: &str| ArgumentTemplate::Plain(s.to_string());
        VersionMetadata {
            id: "1.20.1".into(),
            version_type: "release".into(),
            main_class: "net.minecraft.client.main.Main".into(),
            jvm_args: vec![
                plain("-Djava.library.path=${natives_directory}"),
                plain("-cp"),
                plain("${classpath}"),
            ],
            game_args: vec![
                plain("--username"),
                plain("${auth_player_name}"),
                plain("--assetIndex"),
                plain("${assets_index_name}"),
                plain("--uuid"),
                plain("${auth_uuid}"),
            ],
            asset_index: AssetIndexRef {
                id: "5".into(),
                url: "http://unused".into(),
                sha1: "0".repeat(40),
                size: None,
                total_size: None,
            },
            client: None,
            libraries: Vec::new(),
            loader: LoaderKind::Vanilla,
            loader_id: None,
            java_major: Some(17),
        }
    }

    #[test]
    fn builds_command_line_with_injected_classpath() {
        let paths = LauncherPaths::new("/data");
        let session = Session::offline("Steve");
        let options = LaunchOptions {
            window: Some((854, 480)),
            ..Default::default()
        };
        let env = LaunchEnvironment::build(LaunchInputs {
            metadata: &metadata(),
            classpath: vec![PathBuf::from("/data/libraries/a.jar")],
            natives_dir: PathBuf::from("/data/natives/1.20.1"),
            java: PathBuf::from("java"),
            session: &session,
            options: &options,
            paths: &paths,
            platform: &Platform::new(OsName::Linux, Arch::X86_64),
        })
        .unwrap();

        assert_eq!(
            env.jvm_args,
            vec![
                "-Xmx2048M",
                "-Xms512M",
                "-Djava.library.path=/data/natives/1.20.1"
            ]
        );
        assert_eq!(
            env.game_args,
            vec![
                "--username".to_string(),
                "Steve".to_string(),
                "--assetIndex".to_string(),
                "5".to_string(),
                "--uuid".to_string(),
                session.uuid.clone(),
                "--width".to_string(),
                "854".to_string(),
                "--height".to_string(),
                "480".to_string(),
            ]
        );
        assert_eq!(env.working_dir, PathBuf::from("/data/instances/1.20.1"));

        let args = env.args();
        let cp = args.iter().position(|a| a == "-cp").unwrap();
        assert_eq!(args[cp + 1], "/data/libraries/a.jar");
        assert_eq!(args[cp + 2], "net.minecraft.client.main.Main");
    }

    #[test]
    fn empty_classpath_is_rejected() {
        let paths = LauncherPaths::new("/data");
        let err = LaunchEnvironment::build(LaunchInputs {
            metadata: &metadata(),
            classpath: Vec::new(),
            natives_dir: PathBuf::from("/n"),
            java: PathBuf::from("java"),
            session: &Session::default(),
            options: &LaunchOptions::default(),
            paths: &paths,
            platform: &Platform::current(),
        })
        .unwrap_err();
        assert!(matches!(err, LauncherError::Other(_)));
    }
}
