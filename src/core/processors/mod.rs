// ─── Installer Processors ───
// Forge/NeoForge installer archives, their profiles and the processor pipeline.

pub mod archive;
pub mod pipeline;
pub mod profile;
pub mod tokens;

pub use archive::{read_main_class, InstallerArchive};
pub use pipeline::{
    InstallerPipeline, JavaProcessorRunner, PipelineOutcome, ProcessorInvocation, ProcessorRunner,
};
pub use profile::{DataEntry, InstallProfile, InstallerBundle, ProcessorStep};
