use std::fmt::{self, Debug};

/// Serialized browser cookies and storage. Opaque outside the page driver.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionState(Vec<u8>);

impl SessionState {
    pub fn new(bytes: Vec<u8>) -> Self {
        SessionState(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionState({} bytes)", self.0.len())
    }
}
