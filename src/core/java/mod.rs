// ─── Java ───
// Locating the Java binary used for installer processors and launches.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::state::LauncherSettings;

fn java_exe() -> &'static str {
    if cfg!(windows) {
        "java.exe"
    } else {
        "java"
    }
}

/// Configured path, then `$JAVA_HOME/bin/java`, then `java` from `PATH`.
pub fn resolve_java_binary(settings: &LauncherSettings) -> PathBuf {
    if let Some(path) = &settings.java_path {
        return path.clone();
    }
    if let Some(home) = std::env::var_os("JAVA_HOME") {
        let candidate = Path::new(&home).join("bin").join(java_exe());
        if candidate.is_file() {
            return candidate;
        }
        debug!("JAVA_HOME set but {:?} is missing", candidate);
    }
    PathBuf::from(java_exe())
}

/// Java major a game version needs when its metadata does not say.
pub fn required_java_for_minecraft_version(minecraft_version: &str) -> u32 {
    let lower = minecraft_version.to_ascii_lowercase();
    if let Some(week_pos) = lower.find('w') {
        let year_hint = &lower[..week_pos];
        if let Ok(year) = year_hint.parse::<u32>() {
            return if year >= 24 { 21 } else { 17 };
        }
    }

    let mut parts = minecraft_version
        .split('.')
        .map(|p| p.parse::<u32>().ok());
    let major = parts.next().flatten().unwrap_or(1);
    let minor = parts.next().flatten().unwrap_or(20);
    let patch = parts.next().flatten().unwrap_or(0);

    if major > 1 || minor >= 21 || (minor == 20 && patch >= 5) {
        21
    } else if minor >= 17 {
        17
    } else {
        8
    }
}

/// Major version from a `java -version` string such as `17.0.8` or
/// `1.8.0_392`.
pub fn parse_major_version(version: &str) -> Option<u32> {
    let mut parts = version.split(['.', '_', '+', '-']);
    let first: u32 = parts.next()?.parse().ok()?;
    if first == 1 {
        parts.next()?.parse().ok()
    } else {
        Some(first)
    }
}

/// Runs `java -version` and returns the reported major, if it can be read.
pub async fn probe_java_major(java: &Path) -> Option<u32> {
    let output = tokio::process::Command::new(java)
        .arg("-version")
        .output()
        .await
        .ok()?;
    let text = format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stderr),
        String::from_utf8_lossy(&output.stdout)
    );
    let quoted = text.lines().find_map(|line| {
        let start = line.find('"')?;
        let end = line[start + 1..].find('"')?;
        Some(line[start + 1..start + 1 + end].to_string())
    })?;
    parse_major_version(&quoted)
}

/// Logs a warning when the binary is older than `required`.
pub async fn check_java_major(java: &Path, required: u32) {
    match probe_java_major(java).await {
        Some(major) if major < required => {
            warn!("{:?} is Java {}, but {} is required", java, major, required)
        }
        Some(major) => debug!("{:?} is Java {}", java, major),
        None => warn!("Could not determine Java version of {:?}", java),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_modern_and_legacy_majors() {
        assert_eq!(parse_major_version("17.0.8"), Some(17));
        assert_eq!(parse_major_version("21"), Some(21));
        assert_eq!(parse_major_version("1.8.0_392"), Some(8));
        assert_eq!(parse_major_version("garbage"), None);
    }

    #[test]
    fn java_required_by_minecraft_version() {
        assert_eq!(required_java_for_minecraft_version("1.16.5"), 8);
        assert_eq!(required_java_for_minecraft_version("1.20.4"), 17);
        assert_eq!(required_java_for_minecraft_version("1.20.5"), 21);
        assert_eq!(required_java_for_minecraft_version("24w14a"), 21);
        assert_eq!(required_java_for_minecraft_version("23w31a"), 17);
    }

    #[test]
    fn configured_path_wins() {
        let settings = LauncherSettings {
            java_path: Some(PathBuf::from("/opt/jdk/bin/java")),
            ..Default::default()
        };
        assert_eq!(
            resolve_java_binary(&settings),
            PathBuf::from("/opt/jdk/bin/java")
        );
    }
}
