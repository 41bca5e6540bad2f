// ─── Platform Rules ───
// Evaluates Mojang-style allow/disallow rules against a target platform.

use serde::{Deserialize, Serialize};

use crate::core::error::{LauncherError, LauncherResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OsName {
    Windows,
    MacOs,
    Linux,
}

impl OsName {
    /// Accepts the names used across Mojang and loader metadata. `osx` is the
    /// legacy spelling of macOS.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "windows" => Some(Self::Windows),
            "osx" | "macos" | "darwin" => Some(Self::MacOs),
            "linux" => Some(Self::Linux),
            _ => None,
        }
    }

    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else {
            Self::Linux
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86,
    X86_64,
    Aarch64,
    Other,
}

impl Arch {
    pub fn current() -> Self {
        match std::env::consts::ARCH {
            "x86" => Self::X86,
            "x86_64" => Self::X86_64,
            "aarch64" => Self::Aarch64,
            _ => Self::Other,
        }
    }

    /// Value substituted for `${arch}` in legacy native classifiers.
    pub fn pointer_width(&self) -> &'static str {
        match self {
            Self::X86 => "32",
            _ => "64",
        }
    }

    fn matches(&self, raw: &str) -> bool {
        match raw {
            "x86" => *self == Self::X86,
            "x86_64" | "amd64" => *self == Self::X86_64,
            "arm64" | "aarch64" => *self == Self::Aarch64,
            _ => false,
        }
    }
}

/// The operating system and architecture libraries are resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    pub os: OsName,
    pub arch: Arch,
}

impl Platform {
    pub fn new(os: OsName, arch: Arch) -> Self {
        Self { os, arch }
    }

    pub fn current() -> Self {
        Self {
            os: OsName::current(),
            arch: Arch::current(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformRule {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<OsRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OsRule {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub arch: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl PlatformRule {
    pub fn allow_os(name: &str) -> Self {
        Self {
            action: "allow".into(),
            os: Some(OsRule {
                name: Some(name.into()),
                arch: None,
                version: None,
            }),
            features: None,
        }
    }

    fn allows(&self) -> LauncherResult<bool> {
        match self.action.as_str() {
            "allow" => Ok(true),
            "disallow" => Ok(false),
            other => Err(LauncherError::UnsupportedPlatformRule(format!(
                "unknown action {other:?}"
            ))),
        }
    }

    fn applies_to(&self, platform: &Platform) -> bool {
        // Feature flags (demo mode, custom resolution) are never enabled.
        if self.features.as_ref().is_some_and(|f| !f.is_empty()) {
            return false;
        }
        let Some(os) = &self.os else {
            return true;
        };
        if let Some(name) = &os.name {
            if OsName::parse(name) != Some(platform.os) {
                return false;
            }
        }
        if let Some(arch) = &os.arch {
            if !platform.arch.matches(arch) {
                return false;
            }
        }
        true
    }
}

/// Rules are read top to bottom; the last rule that applies decides.
/// An empty list always allows.
pub fn rules_allow(rules: &[PlatformRule], platform: &Platform) -> LauncherResult<bool> {
    if rules.is_empty() {
        return Ok(true);
    }

    let mut allowed = false;
    for rule in rules {
        let action = rule.allows()?;
        if rule.applies_to(platform) {
            allowed = action;
        }
    }
    Ok(allowed)
}
