// ─── Library Hotfixes ───
// Swaps known-broken platform natives for working builds.

use std::cmp::Ordering;

use semver::{Version, VersionReq};
use tracing::{info, warn};

use super::model::{Artifact, LibraryOrigin, RuntimeLibrary};
use crate::core::cache::ResourceCache;
use crate::core::maven::{LibrarySpecifier, MavenRepository};
use crate::core::state::EngineConfig;
use crate::core::version::rules::{Arch, OsName, Platform};

const ARM64_BINARIES: &str = "theofficialgman/lwjgl3-binaries-arm64";

/// What to do with one library on the current platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hotfix {
    Keep,
    /// Same library, different download.
    Replace(Artifact),
    /// Look the given coordinate up on Maven Central instead.
    MavenCentral(LibrarySpecifier),
}

/// Picks the fix for an LWJGL `natives-linux` jar on linux/aarch64. Upstream
/// only ships x86_64 binaries under that classifier.
pub fn select_hotfix(library: &RuntimeLibrary, platform: &Platform) -> Hotfix {
    let spec = &library.specifier;
    if platform.os != OsName::Linux
        || platform.arch != Arch::Aarch64
        || spec.group != "org.lwjgl"
        || spec.classifier.as_deref() != Some("natives-linux")
    {
        return Hotfix::Keep;
    }

    let Some(version) = parse_lenient(&spec.version) else {
        return Hotfix::Keep;
    };

    if spec.artifact == "lwjgl-jemalloc" && matches_req(">=3.0.0, <3.3.2", &version) {
        return Hotfix::Replace(Artifact {
            path: library.artifact.path.clone(),
            url: Some(format!(
                "https://raw.githubusercontent.com/{ARM64_BINARIES}/refs/heads/lwjgl-{version}/lwjgl-jemalloc-patched-natives-linux-arm64.jar"
            )),
            sha1: None,
            size: None,
        });
    }

    // 3.2.0 never had a combined build.
    if matches_req(">=3.1.6, <=3.2.2", &version) && version != Version::new(3, 2, 0) {
        return Hotfix::Replace(Artifact {
            path: library.artifact.path.clone(),
            url: Some(format!(
                "https://github.com/{ARM64_BINARIES}/raw/refs/heads/lwjgl-combined/{}",
                library.artifact.path
            )),
            sha1: None,
            size: None,
        });
    }

    Hotfix::MavenCentral(spec.with_classifier("natives-linux-arm64"))
}

/// Applies [`select_hotfix`], resolving Maven Central lookups through the
/// cache. A failed lookup keeps the original library.
pub async fn apply_hotfix(
    library: RuntimeLibrary,
    platform: &Platform,
    config: &EngineConfig,
    cache: &ResourceCache,
) -> RuntimeLibrary {
    match select_hotfix(&library, platform) {
        Hotfix::Keep => library,
        Hotfix::Replace(artifact) => {
            info!("Hotfix: {} -> {:?}", library.specifier, artifact.url);
            RuntimeLibrary { artifact, ..library }
        }
        Hotfix::MavenCentral(specifier) => {
            let repo = MavenRepository::new(&config.endpoints().maven_central);
            match repo.checksum(cache, &config.paths, &specifier).await {
                Ok(sha1) => {
                    info!("Hotfix: {} -> {}", library.specifier, specifier);
                    RuntimeLibrary {
                        artifact: Artifact {
                            path: specifier.path(),
                            url: Some(repo.artifact_url(&specifier)),
                            sha1: Some(sha1),
                            size: None,
                        },
                        specifier,
                        ..library
                    }
                }
                Err(e) => {
                    warn!("No arm64 build for {} ({}), keeping original", specifier, e);
                    library
                }
            }
        }
    }
}

/// Fabric has shipped `org.ow2.asm:asm` alongside an older copy. Only the
/// newest loader-supplied entry survives.
pub fn drop_redundant_asm(libraries: &mut Vec<super::model::Library>) {
    let newest = libraries
        .iter()
        .filter(|l| l.origin == LibraryOrigin::Loader && l.specifier.is("org.ow2.asm", "asm"))
        .map(|l| l.specifier.version.clone())
        .max_by(|a, b| compare_versions(a, b));

    let Some(newest) = newest else {
        return;
    };

    let mut kept = false;
    libraries.retain(|l| {
        if l.origin != LibraryOrigin::Loader || !l.specifier.is("org.ow2.asm", "asm") {
            return true;
        }
        if !kept && l.specifier.version == newest {
            kept = true;
            return true;
        }
        info!("Dropping redundant {}", l.specifier);
        false
    });
}

/// Parses a Maven version as semver, padding `3.2` to `3.2.0`.
fn parse_lenient(raw: &str) -> Option<Version> {
    if let Ok(v) = Version::parse(raw) {
        return Some(v);
    }
    let (core, rest) = match raw.find(['-', '+']) {
        Some(idx) => raw.split_at(idx),
        None => (raw, ""),
    };
    let padded = match core.split('.').count() {
        1 => format!("{core}.0.0{rest}"),
        2 => format!("{core}.0{rest}"),
        _ => return None,
    };
    Version::parse(&padded).ok()
}

fn matches_req(req: &str, version: &Version) -> bool {
    VersionReq::parse(req).is_ok_and(|r| r.matches(version))
}

fn parse_numeric_version_parts(raw: &str) -> Vec<u32> {
    raw.split(|c: char| !c.is_ascii_digit())
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| segment.parse::<u32>().ok())
        .collect()
}

fn compare_versions(a: &str, b: &str) -> Ordering {
    let a_parts = parse_numeric_version_parts(a);
    let b_parts = parse_numeric_version_parts(b);

    let max_len = a_parts.len().max(b_parts.len());
    for idx in 0..max_len {
        let a_val = a_parts.get(idx).copied().unwrap_or(0);
        let b_val = b_parts.get(idx).copied().unwrap_or(0);
        match a_val.cmp(&b_val) {
            Ordering::Equal => continue,
            non_eq => return non_eq,
        }
    }

    a.cmp(b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::libraries::model::Library;

    const ARM_LINUX: Platform = Platform {
        os: OsName::Linux,
        arch: Arch::Aarch64,
    };

    fn natives(artifact: &str, version: &str) -> RuntimeLibrary {
        let specifier =
            LibrarySpecifier::parse(&format!("org.lwjgl:{artifact}:{version}:natives-linux")).unwrap();
        RuntimeLibrary {
            artifact: Artifact {
                path: specifier.path(),
                url: Some(specifier.url("https://libraries.minecraft.net")),
                sha1: Some("00".repeat(20)),
                size: Some(1),
            },
            specifier,
            origin: LibraryOrigin::Base,
            native: false,
        }
    }

    #[test]
    fn jemalloc_in_range_gets_patched_jar() {
        let lib = natives("lwjgl-jemalloc", "3.3.1");
        let Hotfix::Replace(artifact) = select_hotfix(&lib, &ARM_LINUX) else {
            panic!("expected replacement");
        };
        assert_eq!(artifact.path, lib.artifact.path);
        assert!(artifact
            .url
            .unwrap()
            .ends_with("/lwjgl-3.3.1/lwjgl-jemalloc-patched-natives-linux-arm64.jar"));
        assert_eq!(artifact.sha1, None);
    }

    #[test]
    fn combined_range_excludes_3_2_0() {
        let lib = natives("lwjgl", "3.2.1");
        assert!(matches!(select_hotfix(&lib, &ARM_LINUX), Hotfix::Replace(_)));

        let lib = natives("lwjgl", "3.2.0");
        assert!(matches!(
            select_hotfix(&lib, &ARM_LINUX),
            Hotfix::MavenCentral(s) if s.classifier.as_deref() == Some("natives-linux-arm64")
        ));
    }

    #[test]
    fn short_versions_are_padded() {
        let lib = natives("lwjgl-jemalloc", "3.3");
        let Hotfix::Replace(artifact) = select_hotfix(&lib, &ARM_LINUX) else {
            panic!("expected replacement");
        };
        assert!(artifact.url.unwrap().contains("/lwjgl-3.3.0/"));
    }

    #[test]
    fn other_platforms_and_bad_versions_pass_through() {
        let lib = natives("lwjgl", "3.3.3");
        let x86 = Platform::new(OsName::Linux, Arch::X86_64);
        assert_eq!(select_hotfix(&lib, &x86), Hotfix::Keep);

        let lib = natives("lwjgl", "nightly");
        assert_eq!(select_hotfix(&lib, &ARM_LINUX), Hotfix::Keep);
    }

    #[test]
    fn newest_loader_asm_survives() {
        let lib = |coord: &str, origin| {
            let spec = LibrarySpecifier::parse(coord).unwrap();
            let artifact = Artifact {
                path: spec.path(),
                url: None,
                sha1: None,
                size: None,
            };
            Library::simple(spec, artifact, origin)
        };
        let mut libs = vec![
            lib("org.ow2.asm:asm:9.3", LibraryOrigin::Loader),
            lib("org.ow2.asm:asm-tree:9.6", LibraryOrigin::Loader),
            lib("org.ow2.asm:asm:9.6", LibraryOrigin::Loader),
        ];
        drop_redundant_asm(&mut libs);
        let names: Vec<String> = libs.iter().map(|l| l.specifier.to_string()).collect();
        assert_eq!(names, vec!["org.ow2.asm:asm-tree:9.6", "org.ow2.asm:asm:9.6"]);
    }
}
