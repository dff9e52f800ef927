use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

use super::parsing::env_optional;

/// Reads the persisted signing key or creates one so tokens survive restarts.
pub(super) fn load_or_create_secret_key() -> String {
    load_or_create_at(&secret_file_path())
}

fn load_or_create_at(path: &Path) -> String {
    if let Some(existing) = read_key(path) {
        return existing;
    }

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        if let Err(err) = fs::create_dir_all(parent) {
            tracing::warn!(
                error = %err,
                path = %parent.display(),
                "Failed to create secret key directory"
            );
        }
    }

    let new_key = generate_secret_key();

    match fs::OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;

                if let Err(err) = file.set_permissions(fs::Permissions::from_mode(0o600)) {
                    tracing::warn!(
                        error = %err,
                        path = %path.display(),
                        "Failed to set secret key file permissions"
                    );
                }
            }

            if let Err(err) = file.write_all(new_key.as_bytes()) {
                tracing::warn!(error = %err, path = %path.display(), "Failed to write secret key file");
            }
            new_key
        }
        // Another process won the race; use its key.
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            read_key(path).unwrap_or(new_key)
        }
        Err(err) => {
            tracing::warn!(error = %err, path = %path.display(), "Failed to create secret key file");
            new_key
        }
    }
}

fn read_key(path: &Path) -> Option<String> {
    fs::read_to_string(path)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn generate_secret_key() -> String {
    let mut bytes = [0u8; 64];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

fn secret_file_path() -> PathBuf {
    env_optional("EXAMHUB_SECRET_FILE")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(".examhub_secret"))
}
