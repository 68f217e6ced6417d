//! Native model implementations and registry.

pub mod architectures;
pub mod artifacts;
pub mod registry;
pub mod shared;
pub mod translit;

#[cfg(test)]
pub(crate) mod test_support;

pub use architectures::seq2seq;
pub use artifacts::{scan_languages, LanguageArtifacts};
pub use registry::{ModelRegistry, RegistryStats, TransliterationOutcome};
pub use shared::device::{DeviceKind, DeviceProfile, DeviceSelector};
pub use translit::TransliterationModel;
