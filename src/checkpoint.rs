//! Checkpoint bootstrapper
//!
//! Ensures the model checkpoints exist locally before the model loads. Warm
//! starts return immediately; cold starts download the checkpoint repository
//! into a staging directory and relocate its nested `checkpoints/` subtree
//! into the expected layout.
//!
//! The nested subtree is a contract: a repository without a top-level
//! `checkpoints/` directory fails the bootstrap loudly rather than being
//! guessed around. Every failure path removes the staging directory and any
//! target tree created by this call, so a partial download is never mistaken
//! for a ready checkpoint later.

use std::fs;
use std::path::{Path, PathBuf};

use hf_hub::api::sync::ApiBuilder;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::config::{WorkerConfig, READY_MARKER, TOKEN_ENV_VAR};
use crate::error::{Result, WorkerError};

/// Prefix inside the checkpoint repository that holds the actual weights tree.
const NESTED_SUBTREE: &str = "checkpoints";

/// Ensure the checkpoint tree for the configured tag exists and return it.
///
/// `token` is the hub access token; it is only required (and only consulted)
/// when the checkpoints are absent.
pub fn ensure_checkpoints(config: &WorkerConfig, token: Option<&str>) -> Result<PathBuf> {
    let target = config.checkpoint_dir();
    if config.pipeline_config().exists() {
        return Ok(target);
    }

    let token = token.ok_or_else(|| WorkerError::MissingCredential {
        variable: TOKEN_ENV_VAR.to_string(),
    })?;

    let staging = config
        .checkpoint_root
        .join(format!("{}-download", config.model_tag));
    let target_preexisting = target.exists();

    info!(
        repo = %config.checkpoint_repo,
        staging = %staging.display(),
        "checkpoints absent, downloading"
    );

    let outcome = download_and_relocate(config, token, &staging, &target);
    if outcome.is_err() {
        remove_quietly(&staging);
        if !target_preexisting {
            remove_quietly(&target);
        }
    } else {
        remove_quietly(&staging);
    }
    outcome?;

    if !config.pipeline_config().exists() {
        // Relocation succeeded but the tree is not usable; treat it the same
        // as a failed download so the next call starts clean.
        if !target_preexisting {
            remove_quietly(&target);
        }
        return Err(WorkerError::Bootstrap {
            reason: format!(
                "downloaded checkpoint tree is missing {}",
                config.pipeline_config().display()
            ),
        });
    }

    info!(target = %target.display(), "checkpoints ready");
    Ok(target)
}

fn download_and_relocate(
    config: &WorkerConfig,
    token: &str,
    staging: &Path,
    target: &Path,
) -> Result<()> {
    let repo_dir = staging.join("repo");
    fs::create_dir_all(&repo_dir)?;

    let api = ApiBuilder::new()
        .with_token(Some(token.to_string()))
        .with_cache_dir(staging.join("cache"))
        .build()
        .map_err(|e| WorkerError::Bootstrap {
            reason: format!("failed to initialise hub client: {e}"),
        })?;
    let repo = api.model(config.checkpoint_repo.clone());

    let listing = repo.info().map_err(|e| WorkerError::Bootstrap {
        reason: format!("failed to list {}: {e}", config.checkpoint_repo),
    })?;

    let nested_prefix = format!("{NESTED_SUBTREE}/");
    let wanted: Vec<&str> = listing
        .siblings
        .iter()
        .map(|s| s.rfilename.as_str())
        .filter(|name| name.starts_with(&nested_prefix))
        .collect();

    if wanted.is_empty() {
        return Err(WorkerError::Bootstrap {
            reason: format!(
                "unexpected repository layout: {} has no '{NESTED_SUBTREE}/' subtree",
                config.checkpoint_repo
            ),
        });
    }

    for name in &wanted {
        let cached = repo.get(name).map_err(|e| WorkerError::Bootstrap {
            reason: format!("failed to download {name}: {e}"),
        })?;
        let dest = repo_dir.join(name);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&cached, &dest)?;
    }

    relocate_nested(&repo_dir, target)
}

/// Move the nested `checkpoints/` subtree of a staged repository into the
/// final layout.
///
/// The ready marker is moved last, and any entries moved by this call are
/// rolled back on failure, so a target that already held files before the
/// call can never pass the warm-start check off the back of a partial
/// relocation.
pub(crate) fn relocate_nested(repo_dir: &Path, target: &Path) -> Result<()> {
    let nested = repo_dir.join(NESTED_SUBTREE);
    if !nested.is_dir() {
        return Err(WorkerError::Bootstrap {
            reason: format!(
                "unexpected repository layout: staged download has no '{NESTED_SUBTREE}/' subtree"
            ),
        });
    }

    fs::create_dir_all(target)?;
    let mut entries: Vec<fs::DirEntry> = fs::read_dir(&nested)?.collect::<std::io::Result<_>>()?;
    entries.sort_by_key(|entry| entry.file_name() == READY_MARKER);

    let mut moved: Vec<PathBuf> = Vec::new();
    for entry in &entries {
        let dest = target.join(entry.file_name());
        if let Err(err) = move_tree(&entry.path(), &dest) {
            for dest in &moved {
                remove_entry_quietly(dest);
            }
            return Err(err);
        }
        moved.push(dest);
    }
    Ok(())
}

/// Move a file or directory, falling back to copy + remove when a rename
/// crosses filesystems.
fn move_tree(src: &Path, dst: &Path) -> Result<()> {
    if fs::rename(src, dst).is_ok() {
        return Ok(());
    }

    if src.is_dir() {
        for entry in WalkDir::new(src) {
            let entry = entry.map_err(|e| WorkerError::Bootstrap {
                reason: format!("failed to walk {}: {e}", src.display()),
            })?;
            let relative = entry
                .path()
                .strip_prefix(src)
                .expect("walkdir yields paths under its root");
            let dest = dst.join(relative);
            if entry.file_type().is_dir() {
                fs::create_dir_all(&dest)?;
            } else {
                if let Some(parent) = dest.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::copy(entry.path(), &dest)?;
            }
        }
        fs::remove_dir_all(src)?;
    } else {
        if let Some(parent) = dst.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src, dst)?;
        fs::remove_file(src)?;
    }
    Ok(())
}

fn remove_quietly(path: &Path) {
    if path.exists() {
        if let Err(e) = fs::remove_dir_all(path) {
            warn!(path = %path.display(), error = %e, "failed to remove directory");
        }
    }
}

fn remove_entry_quietly(path: &Path) {
    let outcome = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    if let Err(e) = outcome {
        warn!(path = %path.display(), error = %e, "failed to roll back relocated entry");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::BackendKind;

    fn test_config(root: &Path) -> WorkerConfig {
        WorkerConfig {
            checkpoint_root: root.to_path_buf(),
            model_tag: "hf".to_string(),
            checkpoint_repo: "example/recon-model".to_string(),
            fetch_timeout: Duration::from_secs(5),
            inference_timeout: Duration::from_secs(5),
            backend: BackendKind::Mock,
        }
    }

    #[test]
    fn test_warm_start_needs_no_token() {
        let root = tempfile::tempdir().unwrap();
        let config = test_config(root.path());
        fs::create_dir_all(config.checkpoint_dir()).unwrap();
        fs::write(config.pipeline_config(), "pipeline: {}\n").unwrap();

        let path = ensure_checkpoints(&config, None).unwrap();
        assert_eq!(path, config.checkpoint_dir());
    }

    #[test]
    fn test_cold_start_without_token_creates_nothing() {
        let root = tempfile::tempdir().unwrap();
        let config = test_config(root.path());

        let err = ensure_checkpoints(&config, None).unwrap_err();
        assert_eq!(err.error_code(), "MISSING_CREDENTIAL");

        // No staging dir, no partial target.
        assert!(!config.checkpoint_dir().exists());
        assert!(!root.path().join("hf-download").exists());
    }

    #[test]
    fn test_relocate_rejects_missing_subtree() {
        let dir = tempfile::tempdir().unwrap();
        let repo_dir = dir.path().join("repo");
        fs::create_dir_all(repo_dir.join("weights")).unwrap();
        fs::write(repo_dir.join("weights/model.bin"), b"w").unwrap();

        let err = relocate_nested(&repo_dir, &dir.path().join("hf")).unwrap_err();
        assert_eq!(err.error_code(), "BOOTSTRAP_FAILED");
        assert!(err.to_string().contains("checkpoints"));
    }

    #[test]
    fn test_relocate_moves_nested_tree() {
        let dir = tempfile::tempdir().unwrap();
        let repo_dir = dir.path().join("repo");
        fs::create_dir_all(repo_dir.join("checkpoints/weights")).unwrap();
        fs::write(repo_dir.join("checkpoints/pipeline.yaml"), "pipeline: {}\n").unwrap();
        fs::write(repo_dir.join("checkpoints/weights/model.bin"), b"w").unwrap();

        let target = dir.path().join("hf");
        relocate_nested(&repo_dir, &target).unwrap();

        assert!(target.join("pipeline.yaml").is_file());
        assert!(target.join("weights/model.bin").is_file());
        assert!(!repo_dir.join("checkpoints/pipeline.yaml").exists());
    }

    #[test]
    fn test_failed_relocation_into_preexisting_target_leaves_no_ready_marker() {
        let dir = tempfile::tempdir().unwrap();
        let repo_dir = dir.path().join("repo");
        fs::create_dir_all(repo_dir.join("checkpoints/weights")).unwrap();
        fs::write(repo_dir.join("checkpoints/pipeline.yaml"), "pipeline: {}\n").unwrap();
        fs::write(repo_dir.join("checkpoints/weights/model.bin"), b"w").unwrap();
        fs::write(repo_dir.join("checkpoints/vocab.json"), b"{}").unwrap();

        // The target already exists, with a file sitting where the weights
        // directory has to land. The move of that entry fails part-way
        // through the relocation.
        let target = dir.path().join("hf");
        fs::create_dir_all(&target).unwrap();
        fs::write(target.join("weights"), b"in the way").unwrap();

        relocate_nested(&repo_dir, &target).unwrap_err();

        // Whatever was moved before the failure has been rolled back, and the
        // ready marker in particular never landed. A later warm-start check
        // on this tree must still see it as absent.
        assert!(!target.join("pipeline.yaml").exists());
        assert!(!target.join("vocab.json").exists());
        assert_eq!(fs::read(target.join("weights")).unwrap(), b"in the way");
        assert!(repo_dir.join("checkpoints/pipeline.yaml").is_file());
    }

    #[test]
    fn test_move_tree_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.bin");
        fs::write(&src, b"payload").unwrap();

        let dst = dir.path().join("nested/b.bin");
        move_tree(&src, &dst).unwrap();

        assert!(!src.exists());
        assert_eq!(fs::read(&dst).unwrap(), b"payload");
    }
}
