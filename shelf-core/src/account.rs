//! Accounts and their persistence
//!
//! An [`Account`] binds one driver to a root folder plus ordering preferences.
//! Drivers validate accounts in [`Driver::save`](crate::Driver::save) and
//! commit them through an [`AccountStore`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tokio::fs;
use tokio::sync::RwLock;

use crate::error::{ShelfError, ShelfResult};

/// Status written by a successful save
pub const STATUS_WORK: &str = "work";

/// Sort key for listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderBy {
    #[default]
    Name,
    Size,
    UpdatedAt,
}

impl OrderBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderBy::Name => "name",
            OrderBy::Size => "size",
            OrderBy::UpdatedAt => "updated_at",
        }
    }
}

impl FromStr for OrderBy {
    type Err = ShelfError;

    fn from_str(s: &str) -> ShelfResult<Self> {
        match s {
            "name" => Ok(OrderBy::Name),
            "size" => Ok(OrderBy::Size),
            "updated_at" => Ok(OrderBy::UpdatedAt),
            other => Err(ShelfError::ConfigInvalid(format!("unknown order_by: {other}"))),
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort direction for listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

impl FromStr for OrderDirection {
    type Err = ShelfError;

    fn from_str(s: &str) -> ShelfResult<Self> {
        match s.to_ascii_uppercase().as_str() {
            "ASC" => Ok(OrderDirection::Asc),
            "DESC" => Ok(OrderDirection::Desc),
            _ => Err(ShelfError::ConfigInvalid(format!("unknown order_direction: {s}"))),
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A configured driver instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: String,
    /// Driver type name, e.g. "Native"
    pub driver: String,
    pub root_folder: String,
    #[serde(default)]
    pub order_by: OrderBy,
    #[serde(default)]
    pub order_direction: OrderDirection,
    /// Downloads must be streamed through the service instead of redirected
    #[serde(default)]
    pub proxy: bool,
    /// Last save result: "work" or the reason validation failed
    #[serde(default)]
    pub status: String,
}

impl Account {
    pub fn new(name: impl Into<String>, driver: impl Into<String>, root_folder: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            driver: driver.into(),
            root_folder: root_folder.into(),
            order_by: OrderBy::default(),
            order_direction: OrderDirection::default(),
            proxy: false,
            status: String::new(),
        }
    }

    pub fn with_order(mut self, order_by: OrderBy, order_direction: OrderDirection) -> Self {
        self.order_by = order_by;
        self.order_direction = order_direction;
        self
    }

    pub fn is_working(&self) -> bool {
        self.status == STATUS_WORK
    }
}

/// Persistence for accounts, including failed configurations
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn load(&self, name: &str) -> ShelfResult<Option<Account>>;
    async fn save(&self, account: &Account) -> ShelfResult<()>;
    async fn list(&self) -> ShelfResult<Vec<Account>>;
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<BTreeMap<String, Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn load(&self, name: &str) -> ShelfResult<Option<Account>> {
        Ok(self.accounts.read().await.get(name).cloned())
    }

    async fn save(&self, account: &Account) -> ShelfResult<()> {
        self.accounts
            .write()
            .await
            .insert(account.name.clone(), account.clone());
        Ok(())
    }

    async fn list(&self) -> ShelfResult<Vec<Account>> {
        Ok(self.accounts.read().await.values().cloned().collect())
    }
}

/// All accounts in a single JSON file
///
/// Writes go to a sibling temp file which is then renamed over the original.
#[derive(Debug)]
pub struct JsonAccountStore {
    path: PathBuf,
    lock: RwLock<()>,
}

impl JsonAccountStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: RwLock::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> ShelfResult<BTreeMap<String, Account>> {
        match fs::read(&self.path).await {
            Ok(data) if data.is_empty() => Ok(BTreeMap::new()),
            Ok(data) => Ok(serde_json::from_slice(&data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(ShelfError::Io(e)),
        }
    }

    async fn write_all(&self, accounts: &BTreeMap<String, Account>) -> ShelfResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let data = serde_json::to_vec_pretty(accounts)?;
        let mut temp = self.path.clone().into_os_string();
        temp.push(".tmp");
        let temp = PathBuf::from(temp);
        fs::write(&temp, &data).await?;
        fs::rename(&temp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for JsonAccountStore {
    async fn load(&self, name: &str) -> ShelfResult<Option<Account>> {
        let _guard = self.lock.read().await;
        Ok(self.read_all().await?.remove(name))
    }

    async fn save(&self, account: &Account) -> ShelfResult<()> {
        let _guard = self.lock.write().await;
        let mut accounts = self.read_all().await?;
        accounts.insert(account.name.clone(), account.clone());
        self.write_all(&accounts).await
    }

    async fn list(&self) -> ShelfResult<Vec<Account>> {
        let _guard = self.lock.read().await;
        Ok(self.read_all().await?.into_values().collect())
    }
}
