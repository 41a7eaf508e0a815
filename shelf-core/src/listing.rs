//! Listing rules: hidden entries, type classification and ordering
//!
//! [`ListingRules`] is loaded once at startup and shared by every driver as
//! an `Arc`. The defaults match what a stock deployment shows; a `[listing]`
//! table in the config file replaces them.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::account::{OrderBy, OrderDirection};
use crate::file::{File, FileType};
use crate::path::extension_of;

const OFFICE: &[&str] = &["doc", "docx", "xls", "xlsx", "ppt", "pptx", "pdf"];
const VIDEO: &[&str] = &["mp4", "mkv", "avi", "mov", "rmvb", "webm", "flv", "m3u8"];
const AUDIO: &[&str] = &["mp3", "flac", "ogg", "m4a", "wav", "opus", "wma"];
const TEXT: &[&str] = &[
    "txt", "htm", "html", "xml", "java", "properties", "sql", "js", "md", "json", "conf", "ini",
    "vue", "php", "py", "bat", "gitignore", "yml", "go", "sh", "c", "cpp", "h", "hpp", "tsx",
    "rs", "toml", "css", "ts", "log",
];
const IMAGE: &[&str] = &["jpg", "tiff", "jpeg", "png", "gif", "bmp", "svg", "ico", "swf", "webp"];

/// Hidden prefixes and extension table used by every driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingRules {
    /// Entries whose name starts with any of these are never listed
    pub hidden_prefixes: Vec<String>,
    /// Lower-case extension (no dot) to content type
    pub types: BTreeMap<String, FileType>,
}

impl Default for ListingRules {
    fn default() -> Self {
        let mut types = BTreeMap::new();
        for (exts, file_type) in [
            (OFFICE, FileType::Office),
            (VIDEO, FileType::Video),
            (AUDIO, FileType::Audio),
            (TEXT, FileType::Text),
            (IMAGE, FileType::Image),
        ] {
            for ext in exts {
                types.insert((*ext).to_string(), file_type);
            }
        }
        Self {
            hidden_prefixes: vec![".".to_string()],
            types,
        }
    }
}

impl ListingRules {
    pub fn is_hidden(&self, name: &str) -> bool {
        self.hidden_prefixes
            .iter()
            .any(|prefix| !prefix.is_empty() && name.starts_with(prefix.as_str()))
    }

    /// Folder for directories, otherwise looked up by extension
    pub fn classify(&self, name: &str, is_dir: bool) -> FileType {
        if is_dir {
            return FileType::Folder;
        }
        extension_of(name)
            .and_then(|ext| self.types.get(&ext.to_ascii_lowercase()).copied())
            .unwrap_or(FileType::Unknown)
    }

    /// `name` with the first non-empty hidden prefix in front, so listings
    /// skip it. Unchanged when nothing is hidden.
    pub fn hide(&self, name: &str) -> String {
        match self.hidden_prefixes.iter().find(|prefix| !prefix.is_empty()) {
            Some(prefix) => format!("{prefix}{name}"),
            None => name.to_string(),
        }
    }
}

/// Order `files` by `order_by` in `direction`; ties fall back to name ascending.
pub fn sort_files(files: &mut [File], order_by: OrderBy, direction: OrderDirection) {
    files.sort_by(|a, b| compare(a, b, order_by, direction));
}

fn compare(a: &File, b: &File, order_by: OrderBy, direction: OrderDirection) -> Ordering {
    let key = match order_by {
        OrderBy::Name => a.name.cmp(&b.name),
        OrderBy::Size => a.size.cmp(&b.size),
        OrderBy::UpdatedAt => a.updated_at.cmp(&b.updated_at),
    };
    let key = match direction {
        OrderDirection::Asc => key,
        OrderDirection::Desc => key.reverse(),
    };
    key.then_with(|| a.name.cmp(&b.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn file(name: &str, size: u64, secs: Option<i64>) -> File {
        File {
            name: name.into(),
            size,
            file_type: FileType::Unknown,
            updated_at: secs.map(|s| Utc.timestamp_opt(s, 0).unwrap()),
            driver: "Native".into(),
        }
    }

    fn names(files: &[File]) -> Vec<&str> {
        files.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_hidden() {
        let rules = ListingRules::default();
        assert!(rules.is_hidden(".git"));
        assert!(!rules.is_hidden("git"));

        let rules = ListingRules {
            hidden_prefixes: vec![".".into(), "_".into(), String::new()],
            ..Default::default()
        };
        assert!(rules.is_hidden("_drafts"));
        assert!(!rules.is_hidden("drafts"));
    }

    #[test]
    fn test_hide_uses_configured_prefix() {
        let rules = ListingRules::default();
        assert_eq!(rules.hide("a.part"), ".a.part");

        let rules = ListingRules {
            hidden_prefixes: vec![String::new(), "~".into(), ".".into()],
            ..Default::default()
        };
        let hidden = rules.hide("a.part");
        assert_eq!(hidden, "~a.part");
        assert!(rules.is_hidden(&hidden));

        let rules = ListingRules {
            hidden_prefixes: Vec::new(),
            ..Default::default()
        };
        assert_eq!(rules.hide("a.part"), "a.part");
    }

    #[test]
    fn test_classify() {
        let rules = ListingRules::default();
        assert_eq!(rules.classify("movie.MKV", false), FileType::Video);
        assert_eq!(rules.classify("song.flac", false), FileType::Audio);
        assert_eq!(rules.classify("report.pdf", false), FileType::Office);
        assert_eq!(rules.classify("main.rs", false), FileType::Text);
        assert_eq!(rules.classify("cat.webp", false), FileType::Image);
        assert_eq!(rules.classify("blob.bin", false), FileType::Unknown);
        assert_eq!(rules.classify("README", false), FileType::Unknown);
        assert_eq!(rules.classify(".gitignore", false), FileType::Text);
        assert_eq!(rules.classify(".bashrc", false), FileType::Unknown);
        assert_eq!(rules.classify("photos.png", true), FileType::Folder);
    }

    #[test]
    fn test_sort_by_name() {
        let mut files = vec![file("b", 1, None), file("C", 1, None), file("a", 1, None)];
        sort_files(&mut files, OrderBy::Name, OrderDirection::Asc);
        assert_eq!(names(&files), vec!["C", "a", "b"]);
        sort_files(&mut files, OrderBy::Name, OrderDirection::Desc);
        assert_eq!(names(&files), vec!["b", "a", "C"]);
    }

    #[test]
    fn test_sort_by_size_breaks_ties_by_name() {
        let mut files = vec![
            file("z", 5, None),
            file("m", 1, None),
            file("b", 5, None),
            file("a", 9, None),
        ];
        sort_files(&mut files, OrderBy::Size, OrderDirection::Asc);
        assert_eq!(names(&files), vec!["m", "b", "z", "a"]);

        sort_files(&mut files, OrderBy::Size, OrderDirection::Desc);
        assert_eq!(names(&files), vec!["a", "b", "z", "m"]);
    }

    #[test]
    fn test_sort_by_updated_at() {
        let mut files = vec![file("new", 0, Some(300)), file("unknown", 0, None), file("old", 0, Some(100))];
        sort_files(&mut files, OrderBy::UpdatedAt, OrderDirection::Asc);
        assert_eq!(names(&files), vec!["unknown", "old", "new"]);
    }

    #[test]
    fn test_direction_reverses_without_ties() {
        let mut asc = vec![file("a", 3, None), file("b", 1, None), file("c", 2, None)];
        let mut desc = asc.clone();
        sort_files(&mut asc, OrderBy::Size, OrderDirection::Asc);
        sort_files(&mut desc, OrderBy::Size, OrderDirection::Desc);
        desc.reverse();
        assert_eq!(asc, desc);
    }

    #[test]
    fn test_rules_from_toml() {
        let rules: ListingRules = toml::from_str(
            r#"
            hidden_prefixes = ["~"]
            [types]
            heic = "image"
            "#,
        )
        .unwrap();
        assert!(rules.is_hidden("~lock"));
        assert!(!rules.is_hidden(".env"));
        assert_eq!(rules.classify("IMG_1.HEIC", false), FileType::Image);
        assert_eq!(rules.classify("a.png", false), FileType::Unknown);
    }
}
