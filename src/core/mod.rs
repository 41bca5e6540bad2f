// ─── Blocklaunch Core ───
// Resolution and installation engine for the Minecraft Java client.
//
// Layout:
//   core/
//     cache/      — Remote resource cache + root lock
//     downloader/ — Concurrent downloads with SHA-1 validation
//     version/    — Manifest, version JSON, platform rules, merged metadata
//     maven/      — Library specifiers and repository URLs
//     libraries/  — Library classification, hotfixes, natives
//     assets/     — Asset index + object classification
//     loaders/    — Vanilla, Fabric, Quilt, Forge, NeoForge strategies
//     processors/ — Forge/NeoForge installer pipeline
//     engine/     — Orchestration, events
//     launch/     — Argument substitution + command line
//     java/       — Java binary lookup
//     state/      — Paths, settings, endpoints

pub mod assets;
pub mod auth;
pub mod cache;
pub mod downloader;
pub mod engine;
pub mod error;
pub mod http;
pub mod java;
pub mod launch;
pub mod libraries;
pub mod loaders;
pub mod maven;
pub mod processors;
pub mod state;
pub mod version;
