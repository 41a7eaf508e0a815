//! Shelf Core
//!
//! Driver contract, entity model, path resolution and listing rules shared
//! by every storage driver.

pub mod account;
pub mod driver;
pub mod error;
pub mod file;
pub mod listing;
pub mod path;

pub use account::{Account, AccountStore, JsonAccountStore, MemoryAccountStore, OrderBy, OrderDirection};
pub use driver::{Driver, DriverConfig, Item, ItemType, ProxyRequest, Resolved};
pub use error::{is_missing, ShelfError, ShelfResult};
pub use file::{ByteStream, File, FileStream, FileType};
pub use listing::{sort_files, ListingRules};
pub use path::RelativePath;
