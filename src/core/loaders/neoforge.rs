use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::context::ResolveContext;
use super::fabric::not_found_as_invalid;
use super::forge::load_installer;
use super::strategy::{LoaderResolution, LoaderStrategy};
use super::LoaderKind;
use crate::core::cache::CacheEntry;
use crate::core::error::{LauncherError, LauncherResult, ResultExt};

/// Response of the NeoForged Maven "latest version" API.
#[derive(Debug, Deserialize)]
struct LatestVersion {
    version: String,
}

/// NeoForge, published as `net.neoforged:neoforge`. Builds for 1.20.1 still
/// used the legacy `net.neoforged:forge` coordinate.
pub struct NeoForgeStrategy;

#[async_trait]
impl LoaderStrategy for NeoForgeStrategy {
    async fn resolve(&self, ctx: ResolveContext<'_>) -> LauncherResult<Option<LoaderResolution>> {
        let version = if ctx.wants_latest() {
            latest_neoforge_version(&ctx)
                .await
                .stage("resolve latest neoforge")?
        } else {
            ctx.loader_version.to_string()
        };
        info!("Using NeoForge {} for Minecraft {}", version, ctx.game_version);

        let base = ctx.config.endpoints().neoforge_maven.trim_end_matches('/');
        let urls = [
            format!(
                "{}/net/neoforged/neoforge/{v}/neoforge-{v}-installer.jar",
                base,
                v = version
            ),
            format!(
                "{}/net/neoforged/forge/{v}/forge-{v}-installer.jar",
                base,
                v = version
            ),
        ];
        load_installer(&ctx, LoaderKind::NeoForge, &version, &urls)
            .await
            .map(Some)
    }
}

/// Query URL for the newest NeoForge release of `game_version`.
///
/// NeoForge versions drop the leading `1.` of the game version (`1.20.4` is
/// served by `20.4.x`), so the filter is the remaining components.
pub fn latest_query_url(endpoint: &str, game_version: &str) -> LauncherResult<String> {
    let endpoint = endpoint.trim_end_matches('/');
    let parts: Vec<&str> = game_version.split('.').collect();
    if parts.len() < 2 {
        return Err(LauncherError::InvalidVersion(format!(
            "cannot derive a NeoForge filter from {game_version:?}"
        )));
    }

    if game_version == "1.20.1" {
        return Ok(format!("{endpoint}/net/neoforged/forge?filter=1.20.1-"));
    }
    Ok(format!(
        "{endpoint}/net/neoforged/neoforge?filter={}",
        parts[1..].join(".")
    ))
}

async fn latest_neoforge_version(ctx: &ResolveContext<'_>) -> LauncherResult<String> {
    let url = latest_query_url(&ctx.config.endpoints().neoforge_latest, ctx.game_version)?;
    let entry = CacheEntry::best_effort(
        ctx.config
            .paths
            .cache_file(&format!("neoforge/latest-{}.json", ctx.game_version)),
        url,
    );
    let latest: LatestVersion = ctx
        .cache
        .resolve_json(&entry)
        .await
        .map_err(not_found_as_invalid(ctx.game_version))?;
    Ok(latest.version)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cache::ResourceCache;
    use crate::core::downloader::Downloader;
    use crate::core::http::build_http_client;
    use crate::core::loaders::forge::tests::installer_jar;
    use crate::core::state::{EngineConfig, Endpoints, LauncherPaths, LauncherSettings};

    #[test]
    fn latest_query_strips_major_component() {
        assert_eq!(
            latest_query_url("https://m/api/", "1.20.4").unwrap(),
            "https://m/api/net/neoforged/neoforge?filter=20.4"
        );
        assert_eq!(
            latest_query_url("https://m/api", "1.21").unwrap(),
            "https://m/api/net/neoforged/neoforge?filter=21"
        );
        assert_eq!(
            latest_query_url("https://m/api", "1.20.1").unwrap(),
            "https://m/api/net/neoforged/forge?filter=1.20.1-"
        );
        assert!(matches!(
            latest_query_url("https://m/api", "24w14a"),
            Err(LauncherError::InvalidVersion(_))
        ));
    }

    #[tokio::test]
    async fn falls_back_to_legacy_coordinate() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/neoforge/api/maven/latest/version/releases/net/neoforged/forge")
            .match_query(mockito::Matcher::UrlEncoded("filter".into(), "1.20.1-".into()))
            .with_body(r#"{"isSnapshot": false, "version": "1.20.1-47.1.106"}"#)
            .create_async()
            .await;
        let primary = server
            .mock(
                "GET",
                "/neoforge-maven/net/neoforged/neoforge/1.20.1-47.1.106/neoforge-1.20.1-47.1.106-installer.jar",
            )
            .with_status(404)
            .expect(1)
            .create_async()
            .await;
        server
            .mock(
                "GET",
                "/neoforge-maven/net/neoforged/forge/1.20.1-47.1.106/forge-1.20.1-47.1.106-installer.jar",
            )
            .with_body(installer_jar("1.20.1-forge-47.1.106"))
            .create_async()
            .await;

        let mut settings = LauncherSettings::default();
        settings.endpoints = Endpoints::mirrored(&server.url());
        let config = EngineConfig::new(LauncherPaths::new(dir.path()), settings);
        let cache = ResourceCache::new(Downloader::new(build_http_client().unwrap()));
        let ctx = ResolveContext {
            game_version: "1.20.1",
            loader_version: "latest",
            config: &config,
            cache: &cache,
        };

        let resolution = NeoForgeStrategy.resolve(ctx).await.unwrap().unwrap();
        primary.assert_async().await;
        let bundle = resolution.installer.unwrap();
        assert_eq!(bundle.kind, LoaderKind::NeoForge);
        assert_eq!(bundle.version, "1.20.1-47.1.106");
        assert!(bundle
            .archive
            .ends_with("caches/neoforge/forge-1.20.1-47.1.106-installer.jar"));
    }

    #[tokio::test]
    async fn missing_release_for_game_version_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/neoforge/api/maven/latest/version/releases/net/neoforged/neoforge")
            .match_query(mockito::Matcher::Any)
            .with_status(404)
            .create_async()
            .await;

        let mut settings = LauncherSettings::default();
        settings.endpoints = Endpoints::mirrored(&server.url());
        let config = EngineConfig::new(LauncherPaths::new(dir.path()), settings);
        let cache = ResourceCache::new(Downloader::new(build_http_client().unwrap()));
        let ctx = ResolveContext {
            game_version: "1.99.9",
            loader_version: "",
            config: &config,
            cache: &cache,
        };

        let err = NeoForgeStrategy.resolve(ctx).await.unwrap_err();
        assert!(matches!(err.root(), LauncherError::InvalidVersion(_)));
    }
}
