use std::{
    fs, io,
    path::{Path, PathBuf},
    process::Command,
};

use thiserror::Error;

use super::model::NaiveBayesModel;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model artifact not found at {0}")]
    Missing(PathBuf),
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("model artifact is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("model artifact is inconsistent: {0}")]
    Invalid(String),
    #[error("training collaborator failed: {0}")]
    Production(String),
}

/// Produces a fresh model artifact at a destination path. Training lives outside this crate.
pub trait ArtifactProducer {
    fn produce(&self, destination: &Path) -> Result<(), ModelError>;
}

#[derive(Debug, Clone)]
pub struct CommandProducer {
    program: String,
    args: Vec<String>,
}

impl CommandProducer {
    pub fn from_command_line(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl ArtifactProducer for CommandProducer {
    fn produce(&self, destination: &Path) -> Result<(), ModelError> {
        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| ModelError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        tracing::info!(
            target: "classifier",
            program = %self.program,
            destination = %destination.display(),
            "running training command"
        );
        let status = Command::new(&self.program)
            .args(&self.args)
            .env("MODEL_PATH", destination)
            .status()
            .map_err(|err| ModelError::Production(format!("failed to start {}: {err}", self.program)))?;

        if !status.success() {
            return Err(ModelError::Production(format!(
                "{} exited with {status}",
                self.program
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ModelStore {
    path: PathBuf,
}

impl ModelStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn resolve(&self) -> Result<NaiveBayesModel, ModelError> {
        if !self.path.is_file() {
            return Err(ModelError::Missing(self.path.clone()));
        }
        tracing::info!(target: "classifier", path = %self.path.display(), "loading model");
        let json = fs::read_to_string(&self.path).map_err(|source| ModelError::Io {
            path: self.path.clone(),
            source,
        })?;
        let model = NaiveBayesModel::from_json(&json)?;
        tracing::debug!(
            target: "classifier",
            labels = model.labels().len(),
            features = model.vocabulary_size(),
            "model ready"
        );
        Ok(model)
    }

    /// Resolves the artifact, asking `producer` for one exactly once if it is missing.
    pub fn resolve_or_produce(
        &self,
        producer: &dyn ArtifactProducer,
    ) -> Result<NaiveBayesModel, ModelError> {
        match self.resolve() {
            Err(ModelError::Missing(path)) => {
                tracing::warn!(
                    target: "classifier",
                    path = %path.display(),
                    "model artifact missing; producing a new one"
                );
                producer.produce(&path)?;
                let model = self.resolve()?;
                tracing::info!(target: "classifier", path = %path.display(), "new model artifact loaded");
                Ok(model)
            }
            other => other,
        }
    }
}
