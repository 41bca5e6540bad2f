#![allow(dead_code)]

use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use blocklaunch_lib::core::state::{Endpoints, LauncherPaths, LauncherSettings};
use blocklaunch_lib::core::version::{Arch, OsName, Platform};
use blocklaunch_lib::{Engine, EngineConfig, InstallEvent};
use mockito::{Mock, ServerGuard};
use serde_json::json;
use sha1::{Digest, Sha1};

pub const GAME: &str = "1.20.1";
pub const FORGE: &str = "1.20.1-47.2.0";
pub const CLIENT_JAR: &[u8] = b"official client jar";
pub const CORE_LIB: &[u8] = b"core library jar";

pub fn sha1_hex(bytes: &[u8]) -> String {
    hex::encode(Sha1::digest(bytes))
}

/// An in-memory zip, good enough to stand in for jars and installers.
pub fn jar(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut bytes = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut bytes);
        for (name, body) in entries {
            zip.start_file(*name, zip::write::SimpleFileOptions::default())
                .unwrap();
            zip.write_all(body).unwrap();
        }
        zip.finish().unwrap();
    }
    bytes.into_inner()
}

pub struct Asset {
    pub name: &'static str,
    pub body: &'static [u8],
}

/// Two names share one object, so three entries map to two downloads.
pub const ASSETS: &[Asset] = &[
    Asset {
        name: "minecraft/lang/en_us.json",
        body: b"{\"menu.quit\": \"Quit Game\"}",
    },
    Asset {
        name: "icons/icon_16x16.png",
        body: b"png bytes",
    },
    Asset {
        name: "minecraft/lang/en_gb.json",
        body: b"{\"menu.quit\": \"Quit Game\"}",
    },
];

/// A mock mirror of every upstream service plus a fresh launcher root.
pub struct Mirror {
    pub server: ServerGuard,
    pub root: tempfile::TempDir,
    /// Mocks for immutable content; each must be fetched exactly once.
    pub content: Vec<Mock>,
    pub events: Arc<Mutex<Vec<InstallEvent>>>,
}

impl Mirror {
    pub async fn vanilla() -> Self {
        let server = mockito::Server::new_async().await;
        let mut mirror = Self {
            server,
            root: tempfile::tempdir().unwrap(),
            content: Vec::new(),
            events: Arc::new(Mutex::new(Vec::new())),
        };
        mirror.serve_base_game().await;
        mirror
    }

    pub fn url(&self) -> String {
        self.server.url()
    }

    pub fn config(&self) -> EngineConfig {
        let settings = LauncherSettings {
            java_path: Some(PathBuf::from("/nonexistent/jdk/bin/java")),
            endpoints: Endpoints::mirrored(&self.url()),
            ..LauncherSettings::default()
        };
        EngineConfig::new(LauncherPaths::new(self.root.path()), settings)
    }

    pub fn engine(&self) -> Engine {
        let events = self.events.clone();
        Engine::new(self.config())
            .unwrap()
            .with_platform(Platform::new(OsName::Linux, Arch::X86_64))
            .with_events(Arc::new(move |event| events.lock().unwrap().push(event)))
    }

    pub fn paths(&self) -> LauncherPaths {
        LauncherPaths::new(self.root.path())
    }

    pub fn take_events(&self) -> Vec<InstallEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }

    pub async fn assert_content_fetched_once(&self) {
        for mock in &self.content {
            mock.assert_async().await;
        }
    }

    /// Serves `body` at `path`, expected to be requested exactly once.
    pub async fn serve_once(&mut self, path: &str, body: Vec<u8>) {
        let mock = self
            .server
            .mock("GET", path)
            .with_body(body)
            .expect(1)
            .create_async()
            .await;
        self.content.push(mock);
    }

    /// Serves `body` at `path` any number of times.
    pub async fn serve_always(&mut self, path: &str, body: Vec<u8>) {
        self.server
            .mock("GET", path)
            .with_body(body)
            .expect_at_least(1)
            .create_async()
            .await;
    }

    async fn serve_base_game(&mut self) {
        let url = self.url();

        let mut objects = serde_json::Map::new();
        let mut served = std::collections::HashSet::new();
        for asset in ASSETS {
            let hash = sha1_hex(asset.body);
            objects.insert(
                asset.name.to_string(),
                json!({"hash": hash, "size": asset.body.len()}),
            );
            if served.insert(hash.clone()) {
                self.serve_once(&format!("/resources/{}/{}", &hash[..2], hash), asset.body.to_vec())
                    .await;
            }
        }
        let index = json!({"objects": objects}).to_string().into_bytes();
        let index_sha = sha1_hex(&index);
        self.serve_once("/indexes/5.json", index).await;

        self.serve_once("/maven/com/example/core/1.0/core-1.0.jar", CORE_LIB.to_vec())
            .await;
        self.serve_once("/objects/client.jar", CLIENT_JAR.to_vec()).await;

        let version = json!({
            "id": GAME,
            "type": "release",
            "mainClass": "net.minecraft.client.main.Main",
            "assetIndex": {"id": "5", "url": format!("{url}/indexes/5.json"), "sha1": index_sha, "totalSize": 0},
            "downloads": {
                "client": {"url": format!("{url}/objects/client.jar"), "sha1": sha1_hex(CLIENT_JAR), "size": CLIENT_JAR.len()}
            },
            "javaVersion": {"component": "java-runtime-gamma", "majorVersion": 17},
            "arguments": {
                "game": [
                    "--username", "${auth_player_name}",
                    "--version", "${version_name}",
                    "--gameDir", "${game_directory}",
                    "--assetsDir", "${assets_root}",
                    "--assetIndex", "${assets_index_name}",
                    "--uuid", "${auth_uuid}",
                    "--accessToken", "${auth_access_token}",
                    {"rules": [{"action": "allow", "features": {"is_demo_user": true}}], "value": "--demo"}
                ],
                "jvm": [
                    "-Djava.library.path=${natives_directory}",
                    "-cp", "${classpath}"
                ]
            },
            "libraries": [
                {"name": "com.example:core:1.0",
                 "downloads": {"artifact": {"path": "com/example/core/1.0/core-1.0.jar",
                                            "url": format!("{url}/maven/com/example/core/1.0/core-1.0.jar"),
                                            "sha1": sha1_hex(CORE_LIB), "size": CORE_LIB.len()}}},
                {"name": "com.example:mac-only:1.0",
                 "rules": [{"action": "allow", "os": {"name": "osx"}}],
                 "downloads": {"artifact": {"path": "com/example/mac-only/1.0/mac-only-1.0.jar",
                                            "url": format!("{url}/maven/com/example/mac-only/1.0/mac-only-1.0.jar"),
                                            "sha1": "0".repeat(40), "size": 1}}}
            ]
        })
        .to_string()
        .into_bytes();
        let version_sha = sha1_hex(&version);
        self.serve_once("/packages/1.20.1.json", version).await;

        let manifest = json!({
            "latest": {"release": GAME, "snapshot": GAME},
            "versions": [
                {"id": GAME, "type": "release", "url": format!("{url}/packages/1.20.1.json"),
                 "sha1": version_sha, "releaseTime": "2023-06-12T13:25:51+00:00"}
            ]
        })
        .to_string()
        .into_bytes();
        self.serve_always("/mc/game/version_manifest_v2.json", manifest)
            .await;
    }
}
