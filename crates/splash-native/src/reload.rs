use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{anyhow, Context};
use splash_core::SimConfig;

/// Apply the keys present in `json` on top of `base`. Keys the file leaves
/// out keep their current value.
pub fn overlay(base: &SimConfig, json: &str) -> anyhow::Result<SimConfig> {
    let patch: serde_json::Value = serde_json::from_str(json).context("parsing config")?;
    let serde_json::Value::Object(patch) = patch else {
        return Err(anyhow!("config must be a JSON object"));
    };
    let mut merged = serde_json::to_value(base)?;
    if let serde_json::Value::Object(fields) = &mut merged {
        for (key, value) in patch {
            if !fields.contains_key(&key) {
                log::warn!("[config] unknown key {key:?}");
                continue;
            }
            fields.insert(key, value);
        }
    }
    Ok(serde_json::from_value(merged)?)
}

/// Re-reads a JSON config overlay whenever its modification time changes.
pub struct ConfigWatcher {
    path: PathBuf,
    modified: Option<SystemTime>,
}

impl ConfigWatcher {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            modified: None,
        }
    }

    /// Returns the merged config when the file changed since the last call.
    /// Read or parse failures are logged and leave `current` in effect.
    pub fn poll(&mut self, current: &SimConfig) -> Option<SimConfig> {
        let modified = match std::fs::metadata(&self.path).and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(e) => {
                if self.modified.take().is_some() {
                    log::warn!("[config] {}: {e}", self.path.display());
                }
                return None;
            }
        };
        if self.modified == Some(modified) {
            return None;
        }
        self.modified = Some(modified);
        let result = std::fs::read_to_string(&self.path)
            .context("reading config")
            .and_then(|text| overlay(current, &text));
        match result {
            Ok(config) => {
                log::info!("[config] loaded {}", self.path.display());
                Some(config)
            }
            Err(e) => {
                log::error!("[config] {}: {e:#}", self.path.display());
                None
            }
        }
    }
}
