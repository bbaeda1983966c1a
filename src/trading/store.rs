use std::{
    fs,
    io::{self, Write as _},
    path::{Path, PathBuf},
    sync::Mutex,
};

use tracing::{debug, instrument, warn};

use crate::{error::MarketBotError, trading::ledger::Account};

/// Durable home of one `Account`.
pub trait StateStore: Send + Sync {
    /// Returns the stored account, or a fresh one at `initial_balance` when
    /// nothing usable is stored yet.
    fn load(&self, initial_balance: f64) -> Result<Account, MarketBotError>;

    fn save(&self, account: &Account) -> Result<(), MarketBotError>;
}

/// Pretty-printed JSON on disk, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "state".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl StateStore for JsonFileStore {
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn load(&self, initial_balance: f64) -> Result<Account, MarketBotError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No state file yet, starting a fresh account");
                return Ok(Account::new(initial_balance));
            }
            Err(e) => return Err(MarketBotError::persistence(self.path.display(), e)),
        };

        match serde_json::from_str(&contents) {
            Ok(account) => Ok(account),
            Err(e) => {
                warn!("State file is not a valid account ({}), starting fresh", e);
                Ok(Account::new(initial_balance))
            }
        }
    }

    #[instrument(level = "debug", skip_all, fields(path = %self.path.display()))]
    fn save(&self, account: &Account) -> Result<(), MarketBotError> {
        let json = serde_json::to_string_pretty(account)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| MarketBotError::persistence(self.path.display(), e))?;
        }

        let temp = self.temp_path();
        let write = || -> io::Result<()> {
            let mut file = fs::File::create(&temp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
            fs::rename(&temp, &self.path)
        };
        write().map_err(|e| {
            let _ = fs::remove_file(&temp);
            MarketBotError::persistence(self.path.display(), e)
        })?;
        debug!(trades = account.trades.len(), "Saved account");
        Ok(())
    }
}

/// Keeps the account in memory only.
#[derive(Debug, Default)]
pub struct MemoryStore {
    account: Mutex<Option<Account>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn load(&self, initial_balance: f64) -> Result<Account, MarketBotError> {
        let account = self
            .account
            .lock()
            .map_err(|e| MarketBotError::persistence("memory", e))?;
        Ok(account
            .clone()
            .unwrap_or_else(|| Account::new(initial_balance)))
    }

    fn save(&self, account: &Account) -> Result<(), MarketBotError> {
        let mut stored = self
            .account
            .lock()
            .map_err(|e| MarketBotError::persistence("memory", e))?;
        *stored = Some(account.clone());
        Ok(())
    }
}
