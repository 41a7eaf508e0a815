//! Local filesystem driver

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use shelf_core::{
    account::{Account, AccountStore, STATUS_WORK},
    driver::{Driver, DriverConfig, Item},
    error::{is_missing, ShelfError, ShelfResult},
    file::{ByteStream, File, FileStream},
    listing::{sort_files, ListingRules},
    RelativePath,
};
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Serves an account's `root_folder` from the local filesystem
#[derive(Debug, Clone)]
pub struct NativeDriver {
    rules: Arc<ListingRules>,
}

impl NativeDriver {
    pub const NAME: &'static str = "Native";

    pub fn new(rules: Arc<ListingRules>) -> Self {
        Self { rules }
    }

    fn resolve(&self, path: &str, account: &Account) -> ShelfResult<(RelativePath, PathBuf)> {
        if account.root_folder.is_empty() {
            return Err(ShelfError::ConfigInvalid(format!(
                "account {} has no root folder",
                account.name
            )));
        }
        let rel = RelativePath::parse(path)?;
        let full = rel.within(&account.root_folder);
        Ok((rel, full))
    }

    /// Metadata following symlinks; a dangling link reports itself.
    async fn metadata(full: &Path, rel: &RelativePath) -> ShelfResult<Metadata> {
        match fs::metadata(full).await {
            Ok(meta) => Ok(meta),
            Err(e) if is_missing(&e) => fs::symlink_metadata(full)
                .await
                .map_err(|e| ShelfError::io(e, rel.to_string())),
            Err(e) => Err(ShelfError::io(e, rel.to_string())),
        }
    }

    fn to_file(&self, name: String, meta: &Metadata) -> File {
        let updated_at = meta.modified().ok().map(DateTime::<Utc>::from);
        if meta.is_dir() {
            return File::folder(name, updated_at, Self::NAME);
        }
        File {
            file_type: self.rules.classify(&name, false),
            name,
            size: meta.len(),
            updated_at,
            driver: Self::NAME.to_string(),
        }
    }

    /// Where `src` ends up when copied or moved to `dst`.
    ///
    /// An existing folder at `dst` receives `src` under its own name. Nothing
    /// is ever overwritten.
    async fn destination(
        &self,
        src: &RelativePath,
        dst: &str,
        account: &Account,
    ) -> ShelfResult<(RelativePath, PathBuf)> {
        let (dst_rel, dst_full) = self.resolve(dst, account)?;
        let target = match fs::metadata(&dst_full).await {
            Ok(meta) if meta.is_dir() => {
                let name = src
                    .name()
                    .ok_or_else(|| ShelfError::InvalidPath("the root folder has no name".into()))?;
                dst_rel.join(name)?
            }
            Ok(_) => return Err(ShelfError::NotSupported(format!("{dst_rel} already exists"))),
            Err(e) if is_missing(&e) => dst_rel,
            Err(e) => return Err(ShelfError::io(e, dst_rel.to_string())),
        };

        if target.starts_with(src) {
            return Err(ShelfError::InvalidPath(format!("can't place {src} inside itself")));
        }
        let full = target.within(&account.root_folder);
        if fs::symlink_metadata(&full).await.is_ok() {
            return Err(ShelfError::NotSupported(format!("{target} already exists")));
        }
        Ok((target, full))
    }

    async fn check_root(root: &str) -> Result<(), String> {
        if root.is_empty() {
            return Err("root folder is required".to_string());
        }
        match fs::metadata(root).await {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(format!("[{root}] is not a folder")),
            Err(_) => Err(format!("[{root}] not exist")),
        }
    }

    async fn create_parent(full: &Path) -> ShelfResult<()> {
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    async fn write_upload(
        &self,
        path: &str,
        name: &str,
        size: Option<u64>,
        body: &mut ByteStream,
        account: &Account,
    ) -> ShelfResult<u64> {
        let folder = RelativePath::parse(path)?;
        let rel = folder.join(name)?;
        if rel.name() != Some(name) || rel.parent().as_ref() != Some(&folder) {
            return Err(ShelfError::InvalidPath(format!("bad file name: {name}")));
        }
        let (rel, full) = self.resolve(&rel.to_path_string(), account)?;

        if fs::symlink_metadata(&full).await.is_ok() {
            return Err(ShelfError::Conflict(format!("{rel} already exists")));
        }
        Self::create_parent(&full).await?;

        let temp = full.with_file_name(self.rules.hide(&format!("{name}.{}.part", temp_suffix())));
        let written = match write_body(&temp, size, body).await {
            Ok(written) => written,
            Err(e) => {
                let _ = fs::remove_file(&temp).await;
                return Err(e);
            }
        };

        // hard_link never replaces an existing target, unlike rename
        let committed = fs::hard_link(&temp, &full).await;
        let _ = fs::remove_file(&temp).await;
        match committed {
            Ok(()) => Ok(written),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(ShelfError::Conflict(format!("{rel} already exists")))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl Default for NativeDriver {
    fn default() -> Self {
        Self::new(Arc::new(ListingRules::default()))
    }
}

/// Copy `body` into a freshly created file at `temp`, checking the declared size.
async fn write_body(temp: &Path, size: Option<u64>, body: &mut ByteStream) -> ShelfResult<u64> {
    let mut out = fs::File::create(temp).await?;
    let mut written = 0u64;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        out.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    out.flush().await?;
    match size {
        Some(expected) if expected != written => Err(ShelfError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            format!("expected {expected} bytes, received {written}"),
        ))),
        _ => Ok(written),
    }
}

/// Consume what is left of an upload body, stopping at the first error.
async fn drain(body: &mut ByteStream) {
    while let Some(Ok(_)) = body.next().await {}
}

fn temp_suffix() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};

    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();

    format!("{:x}{:x}", duration.as_secs(), duration.subsec_nanos())
}

/// Recursive copy, run on a blocking thread.
///
/// Links inside the tree are recreated as links, so a link to somewhere
/// outside the root never pulls that content in.
fn copy_tree(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(std::io::Error::from)?;
        let relative = entry.path().strip_prefix(src).map_err(std::io::Error::other)?;
        let target = dst.join(relative);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            std::fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            copy_link(entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_link(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(std::fs::read_link(src)?, dst)
}

#[cfg(not(unix))]
fn copy_link(src: &Path, dst: &Path) -> std::io::Result<()> {
    std::fs::copy(src, dst).map(|_| ())
}

#[async_trait]
impl Driver for NativeDriver {
    fn config(&self) -> DriverConfig {
        DriverConfig {
            name: Self::NAME.to_string(),
            only_proxy: true,
        }
    }

    fn items(&self) -> Vec<Item> {
        vec![
            Item::string("root_folder", "root folder path", true),
            Item::select("order_by", "order_by", &["name", "size", "updated_at"], false),
            Item::select("order_direction", "order_direction", &["ASC", "DESC"], false),
        ]
    }

    async fn save(&self, account: &mut Account, old: Option<&Account>, store: &dyn AccountStore) -> ShelfResult<()> {
        debug!("save account: [{}]", account.name);
        if let Some(old) = old.filter(|old| old.root_folder != account.root_folder) {
            debug!("root folder changed: {} -> {}", old.root_folder, account.root_folder);
        }

        if let Err(reason) = Self::check_root(&account.root_folder).await {
            warn!("account [{}] failed validation: {}", account.name, reason);
            account.status = reason.clone();
            if let Err(e) = store.save(account).await {
                warn!("could not persist status of [{}]: {}", account.name, e);
            }
            return Err(ShelfError::ConfigInvalid(reason));
        }

        account.status = STATUS_WORK.to_string();
        account.proxy = true;
        store.save(account).await?;
        info!("account [{}] is ready at {}", account.name, account.root_folder);
        Ok(())
    }

    async fn file(&self, path: &str, account: &Account) -> ShelfResult<File> {
        let (rel, full) = self.resolve(path, account)?;
        let meta = Self::metadata(&full, &rel).await?;
        let name = match rel.name() {
            Some(name) => name.to_string(),
            None => full
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "/".to_string()),
        };
        Ok(self.to_file(name, &meta))
    }

    async fn files(&self, path: &str, account: &Account) -> ShelfResult<Vec<File>> {
        let (rel, full) = self.resolve(path, account)?;
        debug!("native list: {}", rel);
        let meta = Self::metadata(&full, &rel).await?;
        if !meta.is_dir() {
            return Err(ShelfError::NotFound(format!("{rel} is not a folder")));
        }

        let mut files = Vec::new();
        let mut read_dir = fs::read_dir(&full)
            .await
            .map_err(|e| ShelfError::io(e, rel.to_string()))?;

        while let Some(entry) = read_dir.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.rules.is_hidden(&name) {
                continue;
            }
            match Self::metadata(&entry.path(), &rel).await {
                Ok(meta) => files.push(self.to_file(name, &meta)),
                // removed since read_dir saw it
                Err(ShelfError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }

        sort_files(&mut files, account.order_by, account.order_direction);
        Ok(files)
    }

    async fn link(&self, path: &str, account: &Account) -> ShelfResult<String> {
        let (rel, full) = self.resolve(path, account)?;
        let meta = Self::metadata(&full, &rel).await?;
        if meta.is_dir() {
            return Err(ShelfError::NotSupported(format!("can't link a folder: {rel}")));
        }
        Ok(full.to_string_lossy().into_owned())
    }

    async fn make_dir(&self, path: &str, account: &Account) -> ShelfResult<()> {
        let (rel, full) = self.resolve(path, account)?;
        debug!("native mkdir: {}", rel);
        fs::create_dir_all(&full).await?;
        Ok(())
    }

    async fn rename(&self, src: &str, dst: &str, account: &Account) -> ShelfResult<()> {
        let (src_rel, src_full) = self.resolve(src, account)?;
        if src_rel.is_root() {
            return Err(ShelfError::InvalidPath("can't move the root folder".into()));
        }
        fs::symlink_metadata(&src_full)
            .await
            .map_err(|e| ShelfError::io(e, src_rel.to_string()))?;

        let (dst_rel, dst_full) = self.destination(&src_rel, dst, account).await?;
        debug!("native move: {} -> {}", src_rel, dst_rel);
        Self::create_parent(&dst_full).await?;
        fs::rename(&src_full, &dst_full).await?;
        Ok(())
    }

    async fn copy(&self, src: &str, dst: &str, account: &Account) -> ShelfResult<()> {
        let (src_rel, src_full) = self.resolve(src, account)?;
        let src_meta = Self::metadata(&src_full, &src_rel).await?;

        let (dst_rel, dst_full) = self.destination(&src_rel, dst, account).await?;
        debug!("native copy: {} -> {}", src_rel, dst_rel);
        Self::create_parent(&dst_full).await?;

        if src_meta.is_dir() {
            tokio::task::spawn_blocking(move || copy_tree(&src_full, &dst_full))
                .await
                .map_err(std::io::Error::other)??;
        } else {
            fs::copy(&src_full, &dst_full).await?;
        }
        Ok(())
    }

    async fn delete(&self, path: &str, account: &Account) -> ShelfResult<()> {
        let (rel, full) = self.resolve(path, account)?;
        if rel.is_root() {
            return Err(ShelfError::InvalidPath("can't delete the root folder".into()));
        }
        let meta = fs::symlink_metadata(&full)
            .await
            .map_err(|e| ShelfError::io(e, rel.to_string()))?;

        debug!("native delete: {}", rel);
        if meta.is_dir() {
            fs::remove_dir_all(&full).await?;
        } else {
            fs::remove_file(&full).await?;
        }
        Ok(())
    }

    async fn upload(&self, stream: FileStream, account: &Account) -> ShelfResult<()> {
        let FileStream { path, name, size, mut body } = stream;
        debug!("native upload: {}/{}", path, name);

        let result = self.write_upload(&path, &name, size, &mut body, account).await;
        if result.is_err() {
            drain(&mut body).await;
        }
        let written = result?;
        debug!("uploaded {} bytes to {}/{}", written, path, name);
        Ok(())
    }
}
