//! Driver trait
//!
//! Every backend implements [`Driver`]. Callers hold an `Arc<dyn Driver>`
//! picked by the account's driver name and never see the concrete type.
//!
//! Paths passed to a driver are root-relative strings; drivers parse them
//! with [`RelativePath::parse`](crate::RelativePath::parse) so that `..`
//! cannot leave the account root.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{
    account::{Account, AccountStore},
    error::{ShelfError, ShelfResult},
    file::{File, FileStream},
};

/// Static description of a driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    pub name: String,
    /// Downloads must always go through the service, never a redirect
    pub only_proxy: bool,
}

/// Field kind in a driver's configuration schema
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    String,
    Select,
}

/// One configuration field a driver asks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub label: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    /// Allowed values for [`ItemType::Select`]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
    pub required: bool,
}

impl Item {
    pub fn string(name: impl Into<String>, label: impl Into<String>, required: bool) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            item_type: ItemType::String,
            values: Vec::new(),
            required,
        }
    }

    pub fn select(name: impl Into<String>, label: impl Into<String>, values: &[&str], required: bool) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            item_type: ItemType::Select,
            values: values.iter().map(|v| v.to_string()).collect(),
            required,
        }
    }
}

/// Outcome of resolving a path: a file, or a folder with its children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolved {
    File(File),
    Folder { folder: File, children: Vec<File> },
}

impl Resolved {
    /// The node the path named
    pub fn file(&self) -> &File {
        match self {
            Resolved::File(file) => file,
            Resolved::Folder { folder, .. } => folder,
        }
    }

    pub fn children(&self) -> Option<&[File]> {
        match self {
            Resolved::File(_) => None,
            Resolved::Folder { children, .. } => Some(children),
        }
    }
}

/// A read request the service is about to proxy to the backend
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyRequest {
    /// Location obtained from [`Driver::link`]
    pub url: String,
    pub headers: BTreeMap<String, String>,
}

impl ProxyRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into(), headers: BTreeMap::new() }
    }
}

/// Driver trait
#[async_trait]
pub trait Driver: Send + Sync {
    fn config(&self) -> DriverConfig;

    /// Ordered configuration schema
    fn items(&self) -> Vec<Item>;

    /// Validate `account` and commit it to `store`.
    ///
    /// The account is persisted on failure too, with `status` describing why,
    /// and the error is returned. On success `status` is `"work"`.
    async fn save(&self, account: &mut Account, old: Option<&Account>, store: &dyn AccountStore) -> ShelfResult<()>;

    /// The node at `path`
    async fn file(&self, path: &str, account: &Account) -> ShelfResult<File>;

    /// Visible children of the folder at `path`, in account order
    async fn files(&self, path: &str, account: &Account) -> ShelfResult<Vec<File>>;

    /// A file, or a folder together with its children
    async fn path(&self, path: &str, account: &Account) -> ShelfResult<Resolved> {
        let file = self.file(path, account).await?;
        if !file.is_dir() {
            return Ok(Resolved::File(file));
        }
        let children = self.files(path, account).await?;
        Ok(Resolved::Folder { folder: file, children })
    }

    /// Location the caller can read the content from directly
    async fn link(&self, path: &str, account: &Account) -> ShelfResult<String>;

    /// Adjust a proxied read before the service forwards it
    async fn proxy(&self, _request: &mut ProxyRequest, _account: &Account) -> ShelfResult<()> {
        Ok(())
    }

    async fn preview(&self, _path: &str, _account: &Account) -> ShelfResult<serde_json::Value> {
        Err(ShelfError::NotSupported(format!("{} has no preview", self.config().name)))
    }

    async fn make_dir(&self, path: &str, account: &Account) -> ShelfResult<()>;
    async fn rename(&self, src: &str, dst: &str, account: &Account) -> ShelfResult<()>;
    async fn copy(&self, src: &str, dst: &str, account: &Account) -> ShelfResult<()>;
    async fn delete(&self, path: &str, account: &Account) -> ShelfResult<()>;
    async fn upload(&self, stream: FileStream, account: &Account) -> ShelfResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_schema_json() {
        let items = vec![
            Item::string("root_folder", "root folder path", true),
            Item::select("order_direction", "order_direction", &["ASC", "DESC"], false),
        ];
        let json = serde_json::to_value(&items).unwrap();
        assert_eq!(json[0]["type"], "string");
        assert!(json[0].get("values").is_none());
        assert_eq!(json[1]["type"], "select");
        assert_eq!(json[1]["values"], serde_json::json!(["ASC", "DESC"]));
        assert_eq!(json[1]["required"], false);
    }

    #[test]
    fn test_resolved_accessors() {
        let folder = File::folder("b", None, "Native");
        let resolved = Resolved::Folder { folder: folder.clone(), children: Vec::new() };
        assert_eq!(resolved.file(), &folder);
        assert_eq!(resolved.children().map(|c| c.len()), Some(0));

        let file = File {
            size: 3,
            file_type: crate::FileType::Text,
            ..File::folder("a.txt", None, "Native")
        };
        let resolved = Resolved::File(file);
        assert!(resolved.children().is_none());
    }
}
