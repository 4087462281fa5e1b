use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::config::DirectoryConfig;

#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub logs_dir: PathBuf,
    pub data_dir: PathBuf,
    pub rules_path: PathBuf,
    pub credentials_path: PathBuf,
}

/// Creates the log directory and the model artifact's parent so training can write
/// into it. The data directory and its files are inputs and may be absent.
pub fn ensure_directories(cfg: &DirectoryConfig, model_path: &Path) -> Result<ResolvedPaths> {
    let logs_dir = create_dir(Path::new(&cfg.logs_dir))?;
    if let Some(model_dir) = model_path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        create_dir(model_dir)?;
    }

    let data_dir = absolute(PathBuf::from(&cfg.data_dir));
    Ok(ResolvedPaths {
        logs_dir,
        rules_path: data_dir.join(&cfg.rules_filename),
        credentials_path: data_dir.join(&cfg.credentials_filename),
        data_dir,
    })
}

fn create_dir(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create directory {}", dir.display()))?;
    Ok(absolute(dir.to_path_buf()))
}

fn absolute(path: PathBuf) -> PathBuf {
    path.canonicalize().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(root: &Path) -> DirectoryConfig {
        DirectoryConfig {
            logs_dir: root.join("logs").display().to_string(),
            data_dir: root.join("data").display().to_string(),
            rules_filename: "keep_data.csv".to_string(),
            credentials_filename: "email_data.json".to_string(),
        }
    }

    #[test]
    fn creates_output_dirs_and_leaves_inputs_alone() {
        let root = tempfile::tempdir().unwrap();
        let model = root.path().join("models").join("spam_classifier.json");

        let paths = ensure_directories(&config(root.path()), &model).unwrap();

        assert!(paths.logs_dir.is_dir());
        assert!(root.path().join("models").is_dir());
        assert!(!model.exists());
        assert!(!paths.data_dir.exists());
        assert!(paths.rules_path.ends_with("data/keep_data.csv"));
        assert!(paths.credentials_path.ends_with("data/email_data.json"));
    }

    #[test]
    fn bare_model_filename_needs_no_directory() {
        let root = tempfile::tempdir().unwrap();
        let paths = ensure_directories(&config(root.path()), Path::new("model.json")).unwrap();
        assert!(paths.logs_dir.is_dir());
    }
}
