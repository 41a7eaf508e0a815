// SPDX-License-Identifier: AGPL-3.0-or-later
//! CLI command implementations

use chrono::{DateTime, Utc};
use console::style;
use shelf_core::{
    Account, AccountStore, Driver, File, FileStream, FileType, JsonAccountStore, OrderBy,
    OrderDirection, Resolved, ShelfError, ShelfResult,
};
use shelf_drivers::{DriverRegistry, NativeDriver};
use std::path::Path;
use std::sync::Arc;
use tabled::{Table, Tabled};

use crate::config::Config;

/// Name of the unsaved account built from `--root`
const ADHOC_ACCOUNT: &str = "adhoc";

/// Account selection flags
pub struct AccountArgs {
    pub account: Option<String>,
    pub root: Option<String>,
    pub order_by: Option<OrderBy>,
    pub direction: Option<OrderDirection>,
}

/// Everything a command needs: drivers, the account store and the selected account
pub struct Context {
    registry: DriverRegistry,
    store: JsonAccountStore,
    default_account: Option<String>,
    args: AccountArgs,
}

impl Context {
    pub fn new(config_path: Option<&Path>, store_path: Option<&Path>, args: AccountArgs) -> ShelfResult<Self> {
        let config = Config::load(config_path)?;
        let store = JsonAccountStore::new(config.store_path(store_path));
        tracing::debug!("account store: {}", store.path().display());
        Ok(Self {
            registry: DriverRegistry::with_defaults(Arc::new(config.listing)),
            store,
            default_account: config.default_account,
            args,
        })
    }

    /// The account selected on the command line, with order overrides applied
    async fn account(&self) -> ShelfResult<Account> {
        let mut account = match (&self.args.account, &self.args.root) {
            (_, Some(root)) => Account::new(ADHOC_ACCOUNT, NativeDriver::NAME, root.as_str()),
            (Some(name), None) => self.stored(name).await?,
            (None, None) => match &self.default_account {
                Some(name) => self.stored(name).await?,
                None => {
                    return Err(ShelfError::ConfigInvalid(
                        "no account selected: pass --account or --root".into(),
                    ))
                }
            },
        };
        if let Some(order_by) = self.args.order_by {
            account.order_by = order_by;
        }
        if let Some(direction) = self.args.direction {
            account.order_direction = direction;
        }
        Ok(account)
    }

    async fn stored(&self, name: &str) -> ShelfResult<Account> {
        self.store
            .load(name)
            .await?
            .ok_or_else(|| ShelfError::ConfigInvalid(format!("unknown account: {name}")))
    }

    async fn driver(&self) -> ShelfResult<(Arc<dyn Driver>, Account)> {
        let account = self.account().await?;
        let driver = self.registry.for_account(&account)?;
        Ok((driver, account))
    }
}

/// Format a timestamp for display
fn format_time(dt: Option<DateTime<Utc>>) -> String {
    dt.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Format file size
fn format_size(file: &File, human: bool) -> String {
    if file.is_dir() {
        "-".to_string()
    } else if human {
        bytesize::ByteSize(file.size).to_string()
    } else {
        file.size.to_string()
    }
}

/// Format file type
fn format_type(file_type: FileType) -> String {
    match file_type {
        FileType::Folder => style("folder").cyan().to_string(),
        other => other.to_string(),
    }
}

#[derive(Tabled)]
struct LsEntry {
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Size")]
    size: String,
    #[tabled(rename = "Modified")]
    modified: String,
    #[tabled(rename = "Name")]
    name: String,
}

impl LsEntry {
    fn new(file: &File, human: bool) -> Self {
        Self {
            kind: format_type(file.file_type),
            size: format_size(file, human),
            modified: format_time(file.updated_at),
            name: file.name.clone(),
        }
    }
}

/// List a folder, or describe a single file
pub async fn ls(ctx: &Context, path: &str, long: bool, human: bool) -> ShelfResult<()> {
    let (driver, account) = ctx.driver().await?;
    tracing::debug!("listing {} on [{}]", path, account.name);

    let files = match driver.path(path, &account).await? {
        Resolved::File(file) => vec![file],
        Resolved::Folder { children, .. } => children,
    };

    if files.is_empty() {
        println!("(empty folder)");
    } else if long {
        let entries: Vec<LsEntry> = files.iter().map(|f| LsEntry::new(f, human)).collect();
        println!("{}", Table::new(entries));
    } else {
        for file in &files {
            if file.is_dir() {
                println!("{}/", style(&file.name).cyan());
            } else {
                println!("{}", file.name);
            }
        }
    }

    Ok(())
}

/// Show file/folder information
pub async fn stat(ctx: &Context, path: &str) -> ShelfResult<()> {
    let (driver, account) = ctx.driver().await?;
    let file = driver.file(path, &account).await?;

    println!("  Name: {}", file.name);
    println!("  Type: {}", file.file_type);
    if !file.is_dir() {
        println!("  Size: {} ({})", file.size, bytesize::ByteSize(file.size));
    }
    println!("  Modified: {}", format_time(file.updated_at));
    println!("  Driver: {}", file.driver);

    Ok(())
}

/// Print the direct location of a file
pub async fn link(ctx: &Context, path: &str) -> ShelfResult<()> {
    let (driver, account) = ctx.driver().await?;
    println!("{}", driver.link(path, &account).await?);
    Ok(())
}

/// Create folders
pub async fn mkdir(ctx: &Context, paths: &[String]) -> ShelfResult<()> {
    let (driver, account) = ctx.driver().await?;
    for path in paths {
        driver.make_dir(path, &account).await?;
        println!("Created {}", path);
    }
    Ok(())
}

/// Move/rename
pub async fn mv(ctx: &Context, source: &str, dest: &str) -> ShelfResult<()> {
    let (driver, account) = ctx.driver().await?;
    driver.rename(source, dest, &account).await?;
    println!("Moved {} -> {}", source, dest);
    Ok(())
}

/// Copy files or folders
pub async fn cp(ctx: &Context, source: &str, dest: &str) -> ShelfResult<()> {
    let (driver, account) = ctx.driver().await?;
    driver.copy(source, dest, &account).await?;
    println!("Copied {} -> {}", source, dest);
    Ok(())
}

/// Remove files or folders
pub async fn rm(ctx: &Context, paths: &[String]) -> ShelfResult<()> {
    let (driver, account) = ctx.driver().await?;
    for path in paths {
        driver.delete(path, &account).await?;
        println!("Removed {}", path);
    }
    Ok(())
}

/// Upload a local file
pub async fn put(ctx: &Context, local: &Path, dest: &str, name: Option<String>) -> ShelfResult<()> {
    let (driver, account) = ctx.driver().await?;
    let name = match name {
        Some(name) => name,
        None => local
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| ShelfError::InvalidPath(local.display().to_string()))?,
    };

    let data = tokio::fs::read(local)
        .await
        .map_err(|e| ShelfError::io(e, local.display().to_string()))?;
    let size = data.len() as u64;
    let stream = FileStream::from_bytes(dest, &name, data);
    let target = stream.target();

    driver.upload(stream, &account).await?;
    println!("Uploaded {} ({}) -> {}", local.display(), bytesize::ByteSize(size), target);
    Ok(())
}

/// Describe registered drivers
pub fn drivers(ctx: &Context, json: bool) -> ShelfResult<()> {
    if json {
        let schema: serde_json::Map<String, serde_json::Value> = ctx
            .registry
            .names()
            .into_iter()
            .filter_map(|name| ctx.registry.get(name))
            .map(|driver| {
                let config = driver.config();
                let value = serde_json::json!({
                    "config": config,
                    "items": driver.items(),
                });
                (config.name, value)
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    for name in ctx.registry.names() {
        let Some(driver) = ctx.registry.get(name) else { continue };
        let config = driver.config();
        let proxy = if config.only_proxy { " (proxy only)" } else { "" };
        println!("{}{}", style(&config.name).bold(), proxy);
        for item in driver.items() {
            let required = if item.required { style("required").yellow().to_string() } else { "optional".to_string() };
            if item.values.is_empty() {
                println!("  {:<18} {} [{}]", item.name, item.label, required);
            } else {
                println!("  {:<18} {} [{}] one of: {}", item.name, item.label, required, item.values.join(", "));
            }
        }
    }
    Ok(())
}

#[derive(Tabled)]
struct AccountRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Driver")]
    driver: String,
    #[tabled(rename = "Root")]
    root: String,
    #[tabled(rename = "Order")]
    order: String,
    #[tabled(rename = "Status")]
    status: String,
}

/// List stored accounts
pub async fn accounts(ctx: &Context) -> ShelfResult<()> {
    let accounts = ctx.store.list().await?;
    if accounts.is_empty() {
        println!("(no accounts in {})", ctx.store.path().display());
        return Ok(());
    }

    let rows: Vec<AccountRow> = accounts
        .into_iter()
        .map(|a| AccountRow {
            status: if a.is_working() {
                style(&a.status).green().to_string()
            } else {
                style(&a.status).red().to_string()
            },
            order: format!("{} {}", a.order_by, a.order_direction),
            name: a.name,
            driver: a.driver,
            root: a.root_folder,
        })
        .collect();
    println!("{}", Table::new(rows));
    Ok(())
}

/// Create or update an account through its driver
pub async fn save(ctx: &Context, name: &str, driver_name: &str, root_folder: &str) -> ShelfResult<()> {
    let driver = ctx.registry.get_or_err(driver_name)?;
    let old = ctx.store.load(name).await?;

    let mut account = Account::new(name, driver_name, root_folder);
    if let Some(old) = &old {
        account.order_by = old.order_by;
        account.order_direction = old.order_direction;
    }
    if let Some(order_by) = ctx.args.order_by {
        account.order_by = order_by;
    }
    if let Some(direction) = ctx.args.direction {
        account.order_direction = direction;
    }

    let result = driver.save(&mut account, old.as_ref(), &ctx.store).await;
    match &result {
        Ok(()) => println!("Saved {}: {}", name, style(&account.status).green()),
        Err(_) => println!("Saved {}: {}", name, style(&account.status).red()),
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(store: &Path, args: AccountArgs) -> Context {
        let config = Config::default();
        Context {
            registry: DriverRegistry::with_defaults(Arc::new(config.listing)),
            store: JsonAccountStore::new(store),
            default_account: None,
            args,
        }
    }

    fn no_args() -> AccountArgs {
        AccountArgs { account: None, root: None, order_by: None, direction: None }
    }

    #[tokio::test]
    async fn test_adhoc_account_from_root() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(
            &dir.path().join("accounts.json"),
            AccountArgs {
                root: Some("/srv/media".into()),
                direction: Some(OrderDirection::Desc),
                ..no_args()
            },
        );
        let account = ctx.account().await.unwrap();
        assert_eq!(account.driver, "Native");
        assert_eq!(account.root_folder, "/srv/media");
        assert_eq!(account.order_direction, OrderDirection::Desc);
    }

    #[tokio::test]
    async fn test_no_account_selected() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir.path().join("accounts.json"), no_args());
        assert!(matches!(ctx.account().await, Err(ShelfError::ConfigInvalid(_))));
    }

    #[tokio::test]
    async fn test_save_then_use_stored_account() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("accounts.json");
        let root = dir.path().join("root");
        std::fs::create_dir(&root).unwrap();
        std::fs::write(root.join("a.txt"), b"abc").unwrap();

        let ctx = context(&store, no_args());
        save(&ctx, "media", "Native", &root.to_string_lossy()).await.unwrap();

        let ctx = context(&store, AccountArgs { account: Some("media".into()), ..no_args() });
        let (driver, account) = ctx.driver().await.unwrap();
        assert!(account.is_working());
        assert_eq!(driver.file("a.txt", &account).await.unwrap().size, 3);
    }

    #[tokio::test]
    async fn test_failed_save_is_stored() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("accounts.json");
        let ctx = context(&store, no_args());

        assert!(save(&ctx, "broken", "Native", "/no/such/root").await.is_err());
        let stored = ctx.store.load("broken").await.unwrap().unwrap();
        assert_eq!(stored.status, "[/no/such/root] not exist");
    }

    #[tokio::test]
    async fn test_unknown_driver() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir.path().join("accounts.json"), no_args());
        let err = save(&ctx, "x", "Dropbox", "/").await.unwrap_err();
        assert!(matches!(err, ShelfError::DriverNotFound(_)));
    }
}
