pub mod credentials;
pub mod session;
pub mod workbook;

use std::path::PathBuf;

use credentials::KeyringStore;
use session::SessionStore;

const KEYRING_SERVICE: &str = "lesson-sync";

#[derive(Clone)]
pub struct Storage {
    pub sessions: SessionStore,
    pub keyring: KeyringStore,
}

impl Storage {
    pub fn new(session_path: impl Into<PathBuf>) -> Self {
        Storage {
            sessions: SessionStore::new(session_path),
            keyring: KeyringStore::new(KEYRING_SERVICE),
        }
    }
}
