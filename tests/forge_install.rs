mod common;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use blocklaunch_lib::core::error::LauncherResult;
use blocklaunch_lib::core::libraries::LibraryOrigin;
use blocklaunch_lib::core::processors::{PipelineOutcome, ProcessorInvocation, ProcessorRunner};
use blocklaunch_lib::{InstallEvent, InstallRequest, LoaderKind};
use common::{jar, sha1_hex, Mirror, FORGE, GAME};
use serde_json::json;

const TOOLS_MAIN: &str = "net.minecraftforge.installertools.ConsoleTool";

/// Stands in for `java`: records invocations and writes the patched client.
struct PatchingRunner {
    patched: PathBuf,
    runs: Mutex<Vec<ProcessorInvocation>>,
}

#[async_trait]
impl ProcessorRunner for PatchingRunner {
    async fn run(&self, invocation: &ProcessorInvocation) -> LauncherResult<()> {
        // Inputs must be in place before any processor starts.
        assert!(invocation.jar.is_file());
        let input = invocation.args.iter().position(|a| a == "--input").unwrap();
        assert!(PathBuf::from(&invocation.args[input + 1]).is_file());

        self.runs.lock().unwrap().push(invocation.clone());
        std::fs::create_dir_all(self.patched.parent().unwrap()).unwrap();
        std::fs::write(&self.patched, b"patched client").unwrap();
        Ok(())
    }
}

async fn forge_mirror() -> Mirror {
    let mut mirror = Mirror::vanilla().await;
    let url = mirror.url();

    mirror
        .serve_always(
            "/forge/promotions_slim.json",
            json!({"homepage": "https://files.minecraftforge.net",
                   "promos": {"1.20.1-latest": "47.2.0", "1.20.1-recommended": "47.1.0"}})
            .to_string()
            .into_bytes(),
        )
        .await;

    let tools = jar(&[(
        "META-INF/MANIFEST.MF",
        format!("Manifest-Version: 1.0\nMain-Class: {TOOLS_MAIN}\n").as_bytes(),
    )]);
    let tools_sha = sha1_hex(&tools);
    mirror
        .serve_once(
            "/forge-maven/net/minecraftforge/installertools/1.4.1/installertools-1.4.1.jar",
            tools,
        )
        .await;

    let fmlloader = b"fmlloader jar".to_vec();
    let fmlloader_sha = sha1_hex(&fmlloader);
    mirror
        .serve_once(
            "/forge-maven/net/minecraftforge/fmlloader/1.20.1-47.2.0/fmlloader-1.20.1-47.2.0.jar",
            fmlloader,
        )
        .await;

    let profile = json!({
        "version": "1.20.1-forge-47.2.0",
        "minecraft": GAME,
        "json": "/version.json",
        "data": {
            "MC_OFF": {"client": "[net.minecraft:client:1.20.1:official]", "server": ""},
            "PATCHED": {"client": "[net.minecraftforge:forge:1.20.1-47.2.0:client]", "server": ""},
            "BINPATCH": {"client": "/data/client.lzma", "server": "/data/server.lzma"}
        },
        "processors": [
            {"sides": ["server"], "jar": "net.minecraftforge:installertools:1.4.1",
             "args": ["--task", "SERVER_ONLY"]},
            {"jar": "net.minecraftforge:installertools:1.4.1",
             "args": ["--task", "PATCH", "--input", "{MINECRAFT_JAR}",
                      "--patch", "{BINPATCH}", "--output", "{PATCHED}"]}
        ],
        "libraries": [
            {"name": "net.minecraftforge:installertools:1.4.1",
             "downloads": {"artifact": {
                 "path": "net/minecraftforge/installertools/1.4.1/installertools-1.4.1.jar",
                 "url": format!("{url}/forge-maven/net/minecraftforge/installertools/1.4.1/installertools-1.4.1.jar"),
                 "sha1": tools_sha}}}
        ]
    });
    let version = json!({
        "id": "1.20.1-forge-47.2.0",
        "inheritsFrom": GAME,
        "mainClass": "cpw.mods.bootstraplauncher.BootstrapLauncher",
        "arguments": {
            "game": ["--launchTarget", "forgeclient"],
            "jvm": ["-DlibraryDirectory=${library_directory}"]
        },
        "libraries": [
            {"name": "net.minecraftforge:fmlloader:1.20.1-47.2.0",
             "downloads": {"artifact": {
                 "path": "net/minecraftforge/fmlloader/1.20.1-47.2.0/fmlloader-1.20.1-47.2.0.jar",
                 "url": format!("{url}/forge-maven/net/minecraftforge/fmlloader/1.20.1-47.2.0/fmlloader-1.20.1-47.2.0.jar"),
                 "sha1": fmlloader_sha}}}
        ]
    });
    let installer = jar(&[
        ("install_profile.json", profile.to_string().as_bytes()),
        ("version.json", version.to_string().as_bytes()),
        ("data/client.lzma", b"binary patch"),
    ]);
    mirror
        .serve_once(
            "/forge-maven/net/minecraftforge/forge/1.20.1-47.2.0/forge-1.20.1-47.2.0-installer.jar",
            installer,
        )
        .await;

    mirror
}

#[tokio::test]
async fn latest_forge_installs_once_then_skips_processors() {
    let mirror = forge_mirror().await;
    let patched = mirror
        .paths()
        .library_file("net/minecraftforge/forge/1.20.1-47.2.0/forge-1.20.1-47.2.0-client.jar");
    let runner = Arc::new(PatchingRunner {
        patched: patched.clone(),
        runs: Mutex::new(Vec::new()),
    });
    let engine = mirror.engine().with_runner(runner.clone());
    let request = InstallRequest::new(GAME, LoaderKind::Forge, "latest");

    let first = engine.install(&request).await.unwrap();
    assert_eq!(first.installer, Some(PipelineOutcome::Completed { processors: 1 }));
    assert!(patched.is_file());

    let metadata = &first.metadata;
    assert_eq!(metadata.id, GAME);
    assert_eq!(metadata.loader, LoaderKind::Forge);
    assert_eq!(metadata.loader_id.as_deref(), Some("1.20.1-forge-47.2.0"));
    assert_eq!(metadata.main_class, "cpw.mods.bootstraplauncher.BootstrapLauncher");

    {
        let runs = runner.runs.lock().unwrap();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].main_class, TOOLS_MAIN);
        let output = runs[0].args.iter().position(|a| a == "--output").unwrap();
        assert_eq!(PathBuf::from(&runs[0].args[output + 1]), patched);
        let patch = runs[0].args.iter().position(|a| a == "--patch").unwrap();
        assert!(runs[0].args[patch + 1].ends_with("client.lzma"));
    }

    // Installer-only libraries never reach the launch classpath.
    let classpath = first.libraries.classpath(&mirror.paths());
    assert!(classpath.iter().all(|p| !p.to_string_lossy().contains("installertools")));
    assert!(first
        .libraries
        .entries()
        .iter()
        .any(|e| e.library.origin == LibraryOrigin::Installer && e.installed));

    let events = mirror.take_events();
    assert!(events.contains(&InstallEvent::ProcessorStarted {
        index: 0,
        total: 1,
        jar: "net.minecraftforge:installertools:1.4.1".to_string(),
    }));

    let second = engine.install(&request).await.unwrap();
    assert_eq!(second.installer, Some(PipelineOutcome::Skipped));
    assert!(second.is_complete());
    assert_eq!(runner.runs.lock().unwrap().len(), 1);
    assert!(mirror.take_events().contains(&InstallEvent::InstallerSkipped {
        version: FORGE.to_string()
    }));

    mirror.assert_content_fetched_once().await;
    assert!(!mirror.paths().tmp.join(format!("forge-{FORGE}")).exists());
}
