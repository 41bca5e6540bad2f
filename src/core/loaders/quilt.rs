use async_trait::async_trait;

use super::context::ResolveContext;
use super::fabric::{resolve_profile, MetaFlavor};
use super::strategy::{LoaderResolution, LoaderStrategy};
use super::LoaderKind;
use crate::core::error::LauncherResult;

/// Quilt Meta mirrors the Fabric Meta API under `/v3`.
pub const QUILT: MetaFlavor = MetaFlavor {
    kind: LoaderKind::Quilt,
    name: "quilt",
    loader_artifact: "org.quiltmc:quilt-loader",
    loader_maven: "https://maven.quiltmc.org/repository/release/",
};

pub struct QuiltStrategy;

#[async_trait]
impl LoaderStrategy for QuiltStrategy {
    async fn resolve(&self, ctx: ResolveContext<'_>) -> LauncherResult<Option<LoaderResolution>> {
        resolve_profile(ctx, QUILT, &ctx.config.endpoints().quilt_meta)
            .await
            .map(Some)
    }
}
