// SPDX-License-Identifier: AGPL-3.0-or-later
//! Fuzz target for RelativePath parsing and containment

#![no_main]

use libfuzzer_sys::fuzz_target;
use shelf_core::path::RelativePath;
use std::path::{Component, Path};

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(path) = RelativePath::parse(input) else {
        return;
    };

    // A parsed path never climbs out of the root it is resolved against
    let root = Path::new("/srv/root");
    let full = path.within(root);
    assert!(full.starts_with(root));
    assert!(!full.components().any(|c| matches!(c, Component::ParentDir)));

    // Re-parsing the normalized form is stable
    let again = RelativePath::parse(path.to_path_string()).expect("normalized path parses");
    assert_eq!(again, path);

    let _ = path.name();
    let _ = path.extension();
    let _ = path.parent();
    if let Some(prefix) = input.get(..10) {
        let _ = path.join(prefix);
    }
});
