// ============================================================
// Layer 6 — Checkpoint Manager
// ============================================================
// Saves and restores everything needed to resume training or
// generate text later.
//
// Files in the checkpoint directory:
//   <model_name>.mpk   — model parameters (full precision)
//   <optim_name>.mpk   — Adam moments for every parameter
//   progress.json      — format version + epochs completed
//   train_config.json  — hyperparameters, to rebuild the model
//
// Model and optimiser are separate files and are loaded
// independently. Full precision keeps a reload bit-identical.
//
// Every file is first written under a `staged-` name and then
// renamed over the live one. `save_checkpoint` stages all three
// files before renaming any, and renames progress.json last, so a
// crash while staging leaves the previous epoch's set untouched.
// Only a crash between the renames can mix two epochs.
//
// Reference: Burn Book §5 (Records and Checkpointing)

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use burn::{
    module::AutodiffModule,
    optim::Optimizer,
    prelude::*,
    record::{FullPrecisionSettings, NamedMpkFileRecorder, Recorder},
    tensor::backend::AutodiffBackend,
};

use crate::application::train_use_case::TrainConfig;
use crate::domain::error::LmError;

/// Bumped whenever the layout of checkpoint files changes.
pub const CHECKPOINT_FORMAT_VERSION: u32 = 1;

type FullRecorder = NamedMpkFileRecorder<FullPrecisionSettings>;

/// How far a checkpointed run got.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingProgress {
    pub format_version:   u32,
    pub epochs_completed: usize,
}

impl TrainingProgress {
    pub fn new(epochs_completed: usize) -> Self {
        Self { format_version: CHECKPOINT_FORMAT_VERSION, epochs_completed }
    }
}

pub struct CheckpointManager {
    dir:        PathBuf,
    model_name: String,
    optim_name: String,
}

impl CheckpointManager {
    /// Creates the directory if it doesn't already exist.
    /// Files are named `model1` and `optim1` unless overridden.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Cannot create checkpoint directory '{}'", dir.display()))?;
        Ok(Self { dir, model_name: "model1".to_string(), optim_name: "optim1".to_string() })
    }

    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    pub fn with_optim_name(mut self, name: impl Into<String>) -> Self {
        self.optim_name = name.into();
        self
    }

    // The recorder adds the .mpk extension itself
    fn model_path(&self) -> PathBuf {
        self.dir.join(&self.model_name)
    }

    fn optim_path(&self) -> PathBuf {
        self.dir.join(&self.optim_name)
    }

    fn progress_path(&self) -> PathBuf {
        self.dir.join("progress.json")
    }

    /// Save model, optimiser and progress as one epoch's checkpoint.
    pub fn save_checkpoint<B, M, O>(&self, model: &M, optim: &O, progress: &TrainingProgress) -> Result<()>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B>,
        O: Optimizer<M, B>,
    {
        let model_stage = staged(&self.model_path());
        let optim_stage = staged(&self.optim_path());
        let progress_stage = staged(&self.progress_path());

        record_model::<B, M>(model, &model_stage)?;
        record_optimizer::<B, M, O>(optim, &optim_stage)?;
        write_json(&progress_stage, progress)?;

        commit(&model_stage.with_extension("mpk"), &self.model_path().with_extension("mpk"))?;
        commit(&optim_stage.with_extension("mpk"), &self.optim_path().with_extension("mpk"))?;
        commit(&progress_stage, &self.progress_path())?;

        tracing::debug!(
            "Checkpoint for {} epochs written to '{}'",
            progress.epochs_completed,
            self.dir.display()
        );
        Ok(())
    }

    /// Load parameters into `model`, which must have the saved architecture.
    pub fn load_model<B: Backend, M: Module<B>>(&self, model: M, device: &B::Device) -> Result<M, LmError> {
        let path   = self.model_path();
        let record = <FullRecorder as Recorder<B>>::load(&FullRecorder::new(), path.clone(), device)
            .map_err(|e| LmError::checkpoint(path.display().to_string(), format!("{e:?}")))?;

        tracing::info!("Loaded model parameters from '{}'", path.display());
        Ok(model.load_record(record))
    }

    pub fn load_optimizer<B, M, O>(&self, optim: O, device: &B::Device) -> Result<O, LmError>
    where
        B: AutodiffBackend,
        M: AutodiffModule<B>,
        O: Optimizer<M, B>,
    {
        let path   = self.optim_path();
        let record = <FullRecorder as Recorder<B>>::load(&FullRecorder::new(), path.clone(), device)
            .map_err(|e| LmError::checkpoint(path.display().to_string(), format!("{e:?}")))?;

        tracing::info!("Loaded optimizer state from '{}'", path.display());
        Ok(optim.load_record(record))
    }

    /// Fails if the file is missing or was written by another format version.
    pub fn load_progress(&self) -> Result<TrainingProgress, LmError> {
        let path = self.progress_path();
        let progress: TrainingProgress = read_json(&path)?;

        if progress.format_version != CHECKPOINT_FORMAT_VERSION {
            return Err(LmError::checkpoint(
                path.display().to_string(),
                format!(
                    "format version {} is not supported (expected {})",
                    progress.format_version, CHECKPOINT_FORMAT_VERSION
                ),
            ));
        }
        Ok(progress)
    }

    pub fn save_config(&self, cfg: &TrainConfig) -> Result<()> {
        let path  = self.dir.join("train_config.json");
        let stage = staged(&path);
        write_json(&stage, cfg)?;
        commit(&stage, &path)?;

        tracing::debug!("Saved training config to '{}'", path.display());
        Ok(())
    }

    pub fn load_config(&self) -> Result<TrainConfig, LmError> {
        read_json(&self.dir.join("train_config.json"))
    }
}

/// `dir/name` → `dir/staged-name`, the temporary twin of a checkpoint file.
fn staged(path: &Path) -> PathBuf {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
    path.with_file_name(format!("staged-{name}"))
}

fn commit(stage: &Path, live: &Path) -> Result<()> {
    fs::rename(stage, live)
        .with_context(|| format!("Cannot move '{}' into place at '{}'", stage.display(), live.display()))
}

fn record_model<B: Backend, M: Module<B>>(model: &M, path: &Path) -> Result<()> {
    <FullRecorder as Recorder<B>>::record(&FullRecorder::new(), model.clone().into_record(), path.to_path_buf())
        .map_err(|e| anyhow::anyhow!("{e:?}"))
        .with_context(|| format!("Failed to save model to '{}'", path.display()))
}

fn record_optimizer<B, M, O>(optim: &O, path: &Path) -> Result<()>
where
    B: AutodiffBackend,
    M: AutodiffModule<B>,
    O: Optimizer<M, B>,
{
    <FullRecorder as Recorder<B>>::record(&FullRecorder::new(), optim.to_record(), path.to_path_buf())
        .map_err(|e| anyhow::anyhow!("{e:?}"))
        .with_context(|| format!("Failed to save optimizer to '{}'", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    fs::write(path, serde_json::to_string_pretty(value)?)
        .with_context(|| format!("Cannot write '{}'", path.display()))
}

/// Read and parse a JSON checkpoint file.
pub(crate) fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, LmError> {
    let json = fs::read_to_string(path)
        .map_err(|e| LmError::checkpoint(path.display().to_string(), e))?;
    serde_json::from_str(&json).map_err(|e| LmError::checkpoint(path.display().to_string(), e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::model::{LanguageModel, LanguageModelConfig, SequenceModel};
    use burn::backend::{Autodiff, NdArray};
    use burn::optim::{AdamConfig, GradientsParams};
    use tempfile::TempDir;

    type TestBackend = Autodiff<NdArray>;
    type TestModel   = LanguageModel<TestBackend>;

    fn manager(dir: &TempDir) -> CheckpointManager {
        CheckpointManager::new(dir.path())
            .unwrap()
            .with_model_name("model_a")
            .with_optim_name("optim_a")
    }

    fn config() -> LanguageModelConfig {
        LanguageModelConfig::new(7).with_d_model(8).with_num_layers(2)
    }

    fn adam() -> impl Optimizer<TestModel, TestBackend> {
        AdamConfig::new().init::<TestBackend, TestModel>()
    }

    // Evaluated without autodiff so dropout is off
    fn logits(model: &LanguageModel<TestBackend>) -> Vec<f32> {
        let model  = model.valid();
        let device = Default::default();
        let input  = Tensor::<NdArray, 1, Int>::from_ints([1, 4, 2, 6].as_slice(), &device).reshape([2, 2]);
        let (out, _) = model.forward(input, model.init_state(2, &device));
        out.into_data().convert::<f32>().to_vec().unwrap()
    }

    fn save<O: Optimizer<TestModel, TestBackend>>(ckpt: &CheckpointManager, model: &TestModel, optim: &O, epochs: usize) {
        ckpt.save_checkpoint::<TestBackend, TestModel, _>(
            model,
            optim,
            &TrainingProgress::new(epochs),
        )
        .unwrap();
    }

    #[test]
    fn test_model_round_trip_is_bit_identical() {
        let dir    = TempDir::new().unwrap();
        let ckpt   = manager(&dir);
        let device = Default::default();

        let original: LanguageModel<TestBackend> = config().init(&device);
        save(&ckpt, &original, &adam(), 1);

        let fresh: LanguageModel<TestBackend> = config().init(&device);
        assert_ne!(logits(&original), logits(&fresh));

        let restored = ckpt.load_model::<TestBackend, _>(fresh, &device).unwrap();
        assert_eq!(logits(&original), logits(&restored));
    }

    #[test]
    fn test_missing_model_is_checkpoint_error() {
        let dir    = TempDir::new().unwrap();
        let device = Default::default();
        let model: LanguageModel<TestBackend> = config().init(&device);

        let err = manager(&dir).load_model::<TestBackend, _>(model, &device).unwrap_err();
        assert!(matches!(err, LmError::CheckpointLoad { .. }));
    }

    #[test]
    fn test_optimizer_round_trip() {
        let dir    = TempDir::new().unwrap();
        let ckpt   = manager(&dir);
        let device = Default::default();

        let model: LanguageModel<TestBackend> = config().init(&device);
        let mut optim = adam();

        // One step so the optimiser has moments to save
        let input = Tensor::<TestBackend, 1, Int>::from_ints([1, 2].as_slice(), &device).reshape([1, 2]);
        let (out, _) = model.forward(input, model.init_state(1, &device));
        let grads = GradientsParams::from_grads(out.mean().backward(), &model);
        let model = optim.step(1e-3, model, grads);

        save(&ckpt, &model, &optim, 1);
        assert!(ckpt
            .load_optimizer::<TestBackend, LanguageModel<TestBackend>, _>(adam(), &device)
            .is_ok());
    }

    #[test]
    fn test_progress_round_trip() {
        let dir   = TempDir::new().unwrap();
        let ckpt  = manager(&dir);
        let model: LanguageModel<TestBackend> = config().init(&Default::default());

        save(&ckpt, &model, &adam(), 4);
        assert_eq!(ckpt.load_progress().unwrap().epochs_completed, 4);
    }

    #[test]
    fn test_checkpoint_leaves_no_staged_files() {
        let dir   = TempDir::new().unwrap();
        let ckpt  = manager(&dir);
        let model: LanguageModel<TestBackend> = config().init(&Default::default());

        save(&ckpt, &model, &adam(), 1);
        save(&ckpt, &model, &adam(), 2);

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, vec!["model_a.mpk", "optim_a.mpk", "progress.json"]);
        assert_eq!(ckpt.load_progress().unwrap().epochs_completed, 2);
    }

    #[test]
    fn test_interrupted_save_keeps_previous_checkpoint() {
        let dir    = TempDir::new().unwrap();
        let ckpt   = manager(&dir);
        let device = Default::default();

        let saved: LanguageModel<TestBackend> = config().init(&device);
        save(&ckpt, &saved, &adam(), 3);

        // A crash mid-save leaves only partial staged files behind
        fs::write(dir.path().join("staged-model_a.mpk"), b"partial").unwrap();
        fs::write(dir.path().join("staged-progress.json"), b"{").unwrap();

        assert_eq!(ckpt.load_progress().unwrap().epochs_completed, 3);
        let fresh: LanguageModel<TestBackend> = config().init(&device);
        let restored = ckpt.load_model::<TestBackend, _>(fresh, &device).unwrap();
        assert_eq!(logits(&saved), logits(&restored));
    }

    #[test]
    fn test_progress_version_mismatch() {
        let dir  = TempDir::new().unwrap();
        let ckpt = manager(&dir);

        let stale = TrainingProgress { format_version: 0, epochs_completed: 2 };
        fs::write(dir.path().join("progress.json"), serde_json::to_string(&stale).unwrap()).unwrap();
        assert!(matches!(ckpt.load_progress(), Err(LmError::CheckpointLoad { .. })));
    }

    #[test]
    fn test_missing_progress_is_checkpoint_error() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(manager(&dir).load_progress(), Err(LmError::CheckpointLoad { .. })));
    }

    #[test]
    fn test_config_round_trip() {
        let dir  = TempDir::new().unwrap();
        let ckpt = manager(&dir);
        let cfg  = TrainConfig { epochs: 3, sequence_length: 5, ..TrainConfig::default() };

        ckpt.save_config(&cfg).unwrap();
        let loaded = ckpt.load_config().unwrap();
        assert_eq!(loaded.epochs, 3);
        assert_eq!(loaded.sequence_length, 5);
    }
}
