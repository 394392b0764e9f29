use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};

use eyre::{Context as _, Error};
use log::{info, warn};
use model::session::SessionState;

/// Single-slot store for the browser session. Failures are logged, never returned.
#[derive(Clone)]
pub struct SessionStore {
    path: Arc<PathBuf>,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SessionStore {
            path: Arc::new(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Option<SessionState> {
        match fs::read(self.path.as_path()) {
            Ok(bytes) if bytes.is_empty() => None,
            Ok(bytes) => {
                info!("Loaded session state from {}", self.path.display());
                Some(SessionState::new(bytes))
            }
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                warn!(
                    "Failed to read session state {}: {}",
                    self.path.display(),
                    err
                );
                None
            }
        }
    }

    pub fn save(&self, state: &SessionState) {
        if let Err(err) = self.write(state) {
            warn!("Failed to save session state: {:#}", err);
        }
    }

    fn write(&self, state: &SessionState) -> Result<(), Error> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(self.path.as_path(), state.as_bytes())
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }
}
