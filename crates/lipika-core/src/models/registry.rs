//! Model registry to ensure each language model is loaded once and shared
//! across requests.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{OnceCell, RwLock};
use tracing::{debug, info};

use crate::catalog::LanguageCode;
use crate::config::{EngineConfig, EvictionPolicy, DEFAULT_MAX_SEQUENCE_LENGTH};
use crate::error::{Error, Result};
use crate::runtime::types::TokenProvenance;

use super::artifacts::{scan_languages, LanguageArtifacts};
use super::shared::device::{DeviceProfile, DeviceSelector};
use super::translit::TransliterationModel;

/// Result of asking the registry to transliterate one word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransliterationOutcome {
    Translated {
        text: String,
        provenance: TokenProvenance,
    },
    /// No complete artifact set exists for the language.
    Unavailable,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub loads: u64,
    pub load_failures: u64,
    pub evictions: u64,
    pub resident: usize,
}

struct ModelSlot {
    cell: OnceCell<Arc<TransliterationModel>>,
    last_used: AtomicU64,
}

impl ModelSlot {
    fn new() -> Self {
        Self {
            cell: OnceCell::new(),
            last_used: AtomicU64::new(0),
        }
    }
}

#[derive(Default)]
struct Counters {
    loads: AtomicU64,
    load_failures: AtomicU64,
    evictions: AtomicU64,
    clock: AtomicU64,
}

#[derive(Clone)]
pub struct ModelRegistry {
    models_dir: PathBuf,
    device: DeviceProfile,
    max_len: usize,
    eviction: EvictionPolicy,
    models: Arc<RwLock<HashMap<LanguageCode, Arc<ModelSlot>>>>,
    counters: Arc<Counters>,
}

impl ModelRegistry {
    pub fn new(models_dir: PathBuf, device: DeviceProfile) -> Self {
        Self {
            models_dir,
            device,
            max_len: DEFAULT_MAX_SEQUENCE_LENGTH,
            eviction: EvictionPolicy::Never,
            models: Arc::new(RwLock::new(HashMap::new())),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        let device = DeviceSelector::detect_with_preference(Some(config.device.as_str()))?;
        info!(
            "Model registry at {} (device: {}, max_len: {}, eviction: {:?})",
            config.models_dir.display(),
            device.kind.as_str(),
            config.max_sequence_length,
            config.eviction
        );
        Ok(Self::new(config.models_dir.clone(), device)
            .with_max_len(config.max_sequence_length)
            .with_eviction(config.eviction))
    }

    pub fn with_max_len(mut self, max_len: usize) -> Self {
        self.max_len = max_len;
        self
    }

    pub fn with_eviction(mut self, eviction: EvictionPolicy) -> Self {
        self.eviction = eviction;
        self
    }

    pub fn device(&self) -> &DeviceProfile {
        &self.device
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Transliterate one word with the model for `lang`, loading it on first
    /// use. Missing artifacts are reported as `Unavailable`; load and
    /// inference failures are errors.
    pub async fn transliterate(
        &self,
        text: &str,
        lang: &LanguageCode,
    ) -> Result<TransliterationOutcome> {
        let model = match self.get(lang).await {
            Some(model) => model,
            None => match LanguageArtifacts::locate(&self.models_dir, lang) {
                Some(artifacts) => self.load_from(lang, artifacts).await?,
                None => {
                    debug!(
                        "No artifacts for {} in {}",
                        lang,
                        self.models_dir.display()
                    );
                    return Ok(TransliterationOutcome::Unavailable);
                }
            },
        };

        let word = text.to_string();
        let text = tokio::task::spawn_blocking(move || model.transliterate(&word))
            .await
            .map_err(|e| Error::InferenceError(e.to_string()))??;

        Ok(TransliterationOutcome::Translated {
            text,
            provenance: TokenProvenance::MlLocal,
        })
    }

    /// Load the model for `lang` without running it.
    pub async fn load(&self, lang: &LanguageCode) -> Result<Arc<TransliterationModel>> {
        if let Some(model) = self.get(lang).await {
            return Ok(model);
        }
        let artifacts = LanguageArtifacts::ensure(&self.models_dir, lang)?;
        self.load_from(lang, artifacts).await
    }

    async fn load_from(
        &self,
        lang: &LanguageCode,
        artifacts: LanguageArtifacts,
    ) -> Result<Arc<TransliterationModel>> {
        let slot = {
            let mut guard = self.models.write().await;
            guard
                .entry(lang.clone())
                .or_insert_with(|| Arc::new(ModelSlot::new()))
                .clone()
        };

        let model = slot
            .cell
            .get_or_try_init({
                let language = lang.clone();
                let device = self.device.clone();
                let max_len = self.max_len;
                let counters = self.counters.clone();
                move || async move {
                    info!(
                        "Loading {} transliteration model from {:?}",
                        language, artifacts.weights_path
                    );
                    let loaded = tokio::task::spawn_blocking(move || {
                        TransliterationModel::load(language, &artifacts, device, max_len)
                    })
                    .await
                    .map_err(|e| Error::ModelLoadError(e.to_string()))
                    .and_then(|inner| inner)
                    .map(Arc::new);

                    let counter = if loaded.is_ok() {
                        &counters.loads
                    } else {
                        &counters.load_failures
                    };
                    counter.fetch_add(1, Ordering::Relaxed);
                    loaded
                }
            })
            .await?
            .clone();

        self.touch(&slot);
        self.enforce_capacity(lang).await;
        Ok(model)
    }

    /// Resident model for `lang`, if loaded. Never touches the filesystem.
    pub async fn get(&self, lang: &LanguageCode) -> Option<Arc<TransliterationModel>> {
        let guard = self.models.read().await;
        let slot = guard.get(lang)?;
        let model = slot.cell.get().cloned()?;
        self.touch(slot);
        Some(model)
    }

    /// Drop the resident model for `lang`. In-flight users keep their handle.
    /// A slot that is still loading is left in place and `false` is returned.
    pub async fn unload(&self, lang: &LanguageCode) -> bool {
        let mut guard = self.models.write().await;
        let resident = guard
            .get(lang)
            .is_some_and(|slot| slot.cell.initialized());
        if resident {
            guard.remove(lang);
            info!("Unloaded {lang} transliteration model");
        }
        resident
    }

    /// Languages with a complete artifact set on disk.
    pub fn available_languages(&self) -> Result<Vec<LanguageCode>> {
        scan_languages(&self.models_dir)
    }

    pub async fn resident_languages(&self) -> Vec<LanguageCode> {
        let guard = self.models.read().await;
        let mut langs: Vec<LanguageCode> = guard
            .iter()
            .filter(|(_, slot)| slot.cell.initialized())
            .map(|(code, _)| code.clone())
            .collect();
        langs.sort();
        langs
    }

    pub async fn stats(&self) -> RegistryStats {
        let resident = {
            let guard = self.models.read().await;
            guard.values().filter(|slot| slot.cell.initialized()).count()
        };
        RegistryStats {
            loads: self.counters.loads.load(Ordering::Relaxed),
            load_failures: self.counters.load_failures.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            resident,
        }
    }

    fn touch(&self, slot: &ModelSlot) {
        let tick = self.counters.clock.fetch_add(1, Ordering::Relaxed) + 1;
        slot.last_used.store(tick, Ordering::Relaxed);
    }

    async fn enforce_capacity(&self, keep: &LanguageCode) {
        let EvictionPolicy::Lru { capacity } = self.eviction else {
            return;
        };

        let mut guard = self.models.write().await;
        loop {
            let resident = guard.values().filter(|slot| slot.cell.initialized()).count();
            if resident <= capacity {
                break;
            }
            let victim: Option<LanguageCode> = guard
                .iter()
                .filter(|(code, slot)| *code != keep && slot.cell.initialized())
                .min_by_key(|(_, slot)| slot.last_used.load(Ordering::Relaxed))
                .map(|(code, _)| code.clone());
            let Some(victim) = victim else {
                break;
            };
            guard.remove(&victim);
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
            info!("Evicted {victim} transliteration model (LRU capacity {capacity})");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::test_support::{write_language, write_mismatched_language, Behavior};

    fn code(raw: &str) -> LanguageCode {
        LanguageCode::parse(raw).unwrap()
    }

    fn registry(dir: &Path) -> ModelRegistry {
        ModelRegistry::new(dir.to_path_buf(), DeviceProfile::cpu())
    }

    fn translated(outcome: TransliterationOutcome) -> String {
        match outcome {
            TransliterationOutcome::Translated { text, provenance } => {
                assert_eq!(provenance, TokenProvenance::MlLocal);
                text
            }
            TransliterationOutcome::Unavailable => panic!("expected a translation"),
        }
    }

    #[tokio::test]
    async fn missing_language_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());

        let outcome = registry.transliterate("ghar", &code("xx")).await.unwrap();
        assert_eq!(outcome, TransliterationOutcome::Unavailable);
        assert_eq!(registry.stats().await, RegistryStats::default());
        assert!(matches!(
            registry.load(&code("xx")).await,
            Err(Error::ModelNotFound(_))
        ));
    }

    #[tokio::test]
    async fn repeated_calls_load_once() {
        let dir = tempfile::tempdir().unwrap();
        write_language(dir.path(), "te", Behavior::Chain(vec!['హ']));
        let registry = registry(dir.path());

        for _ in 0..5 {
            let out = registry.transliterate("ha", &code("te")).await.unwrap();
            assert_eq!(translated(out), "హ");
        }

        let stats = registry.stats().await;
        assert_eq!(stats.loads, 1);
        assert_eq!(stats.resident, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_first_calls_share_one_load() {
        let dir = tempfile::tempdir().unwrap();
        write_language(dir.path(), "te", Behavior::Chain(vec!['హ']));
        let registry = Arc::new(registry(dir.path()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                tokio::spawn(async move { registry.transliterate("ha", &code("te")).await })
            })
            .collect();
        for handle in handles {
            let out = handle.await.unwrap().unwrap();
            assert_eq!(translated(out), "హ");
        }

        assert_eq!(registry.stats().await.loads, 1);
    }

    #[tokio::test]
    async fn load_failures_are_errors_and_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        write_mismatched_language(dir.path(), "ta");
        write_language(dir.path(), "te", Behavior::Chain(vec!['హ']));
        let registry = registry(dir.path());

        let err = registry.transliterate("amma", &code("ta")).await.unwrap_err();
        assert!(err.is_load_failure());
        assert!(registry.transliterate("amma", &code("ta")).await.is_err());

        let out = registry.transliterate("ha", &code("te")).await.unwrap();
        assert_eq!(translated(out), "హ");

        let stats = registry.stats().await;
        assert_eq!(stats.load_failures, 2);
        assert_eq!(stats.loads, 1);
        assert_eq!(registry.resident_languages().await, vec![code("te")]);
    }

    #[tokio::test]
    async fn artifacts_added_later_are_picked_up() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path());

        assert_eq!(
            registry.transliterate("ha", &code("te")).await.unwrap(),
            TransliterationOutcome::Unavailable
        );
        write_language(dir.path(), "te", Behavior::Chain(vec!['హ']));
        let out = registry.transliterate("ha", &code("te")).await.unwrap();
        assert_eq!(translated(out), "హ");
    }

    #[tokio::test]
    async fn lru_evicts_least_recently_used() {
        let dir = tempfile::tempdir().unwrap();
        for lang in ["te", "hi", "ta"] {
            write_language(dir.path(), lang, Behavior::Chain(vec!['హ']));
        }
        let registry = registry(dir.path()).with_eviction(EvictionPolicy::Lru { capacity: 2 });

        registry.load(&code("te")).await.unwrap();
        registry.load(&code("hi")).await.unwrap();
        assert!(registry.get(&code("te")).await.is_some());
        registry.load(&code("ta")).await.unwrap();

        assert_eq!(
            registry.resident_languages().await,
            vec![code("ta"), code("te")]
        );
        let stats = registry.stats().await;
        assert_eq!(stats.evictions, 1);
        assert_eq!(stats.resident, 2);
    }

    #[tokio::test]
    async fn evicted_model_stays_usable_for_holders() {
        let dir = tempfile::tempdir().unwrap();
        for lang in ["te", "hi"] {
            write_language(dir.path(), lang, Behavior::Chain(vec!['హ']));
        }
        let registry = registry(dir.path()).with_eviction(EvictionPolicy::Lru { capacity: 1 });

        let held = registry.load(&code("te")).await.unwrap();
        registry.load(&code("hi")).await.unwrap();

        assert!(registry.get(&code("te")).await.is_none());
        assert_eq!(held.transliterate("ha").unwrap(), "హ");
    }

    #[tokio::test]
    async fn unload_then_reload() {
        let dir = tempfile::tempdir().unwrap();
        write_language(dir.path(), "te", Behavior::Chain(vec!['హ']));
        let registry = registry(dir.path());

        registry.load(&code("te")).await.unwrap();
        assert!(registry.unload(&code("te")).await);
        assert!(!registry.unload(&code("te")).await);
        assert!(registry.get(&code("te")).await.is_none());

        registry.load(&code("te")).await.unwrap();
        assert_eq!(registry.stats().await.loads, 2);
    }

    #[tokio::test]
    async fn unload_leaves_a_loading_slot_in_place() {
        let dir = tempfile::tempdir().unwrap();
        write_language(dir.path(), "te", Behavior::Chain(vec!['హ']));
        let registry = registry(dir.path());

        // Slot registered by a load that has not finished yet.
        let pending = Arc::new(ModelSlot::new());
        registry
            .models
            .write()
            .await
            .insert(code("te"), pending.clone());

        assert!(!registry.unload(&code("te")).await);
        {
            let guard = registry.models.read().await;
            let slot = guard.get(&code("te")).unwrap();
            assert!(Arc::ptr_eq(slot, &pending));
        }

        registry.load(&code("te")).await.unwrap();
        assert!(pending.cell.initialized());
        assert!(registry.get(&code("te")).await.is_some());
        assert_eq!(registry.stats().await.loads, 1);
    }

    #[tokio::test]
    async fn available_languages_scans_models_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_language(dir.path(), "te", Behavior::Chain(vec!['హ']));
        write_language(dir.path(), "hi", Behavior::Chain(vec!['హ']));
        let registry = registry(dir.path());

        assert_eq!(
            registry.available_languages().unwrap(),
            vec![code("hi"), code("te")]
        );
        assert!(registry.resident_languages().await.is_empty());
    }
}
