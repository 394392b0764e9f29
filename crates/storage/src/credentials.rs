use std::sync::Arc;

use eyre::{Context as _, Error};
use keyring::Entry;
use log::{info, warn};
use model::credentials::Credentials;

const KEYRING_USER: &str = "portal";

pub trait CredentialProvider: Send + Sync {
    fn load(&self) -> Option<Credentials>;
}

/// Credentials passed through the environment. Both values must be present.
pub struct EnvCredentials {
    username: Option<String>,
    password: Option<String>,
}

impl EnvCredentials {
    pub fn new(username: Option<&str>, password: Option<&str>) -> Self {
        EnvCredentials {
            username: username.map(ToOwned::to_owned),
            password: password.map(ToOwned::to_owned),
        }
    }
}

impl CredentialProvider for EnvCredentials {
    fn load(&self) -> Option<Credentials> {
        let creds = Credentials::new(self.username.as_deref()?, self.password.as_deref()?);
        creds.is_complete().then_some(creds)
    }
}

/// OS keychain entry holding `username\npassword`.
#[derive(Clone)]
pub struct KeyringStore {
    service: Arc<String>,
}

impl KeyringStore {
    pub fn new(service: &str) -> Self {
        KeyringStore {
            service: Arc::new(service.to_owned()),
        }
    }

    fn entry(&self) -> Result<Entry, Error> {
        Entry::new(&self.service, KEYRING_USER)
            .with_context(|| format!("Failed to open keyring entry for {}", self.service))
    }

    pub fn store(&self, creds: &Credentials) -> Result<(), Error> {
        info!("Storing portal credentials");
        self.entry()?
            .set_password(&encode(creds))
            .context("Failed to write credentials to keyring")
    }

    /// Returns false when nothing was stored.
    pub fn clear(&self) -> Result<bool, Error> {
        match self.entry()?.delete_credential() {
            Ok(()) => Ok(true),
            Err(keyring::Error::NoEntry) => Ok(false),
            Err(err) => Err(err).context("Failed to delete credentials from keyring"),
        }
    }
}

impl CredentialProvider for KeyringStore {
    fn load(&self) -> Option<Credentials> {
        let entry = match self.entry() {
            Ok(entry) => entry,
            Err(err) => {
                warn!("{:#}", err);
                return None;
            }
        };
        match entry.get_password() {
            Ok(secret) => decode(&secret),
            Err(keyring::Error::NoEntry) => None,
            Err(err) => {
                warn!("Failed to read credentials from keyring: {}", err);
                None
            }
        }
    }
}

/// First provider with complete credentials wins.
pub struct CredentialChain {
    providers: Vec<Box<dyn CredentialProvider>>,
}

impl CredentialChain {
    pub fn new(providers: Vec<Box<dyn CredentialProvider>>) -> Self {
        CredentialChain { providers }
    }
}

impl CredentialProvider for CredentialChain {
    fn load(&self) -> Option<Credentials> {
        self.providers.iter().find_map(|provider| provider.load())
    }
}

fn encode(creds: &Credentials) -> String {
    format!("{}\n{}", creds.username, creds.password)
}

fn decode(secret: &str) -> Option<Credentials> {
    let (username, password) = secret.split_once('\n')?;
    let creds = Credentials::new(username, password);
    creds.is_complete().then_some(creds)
}
