//! Stage illustration lookup
//!
//! Illustrations live under `IMAGES_DIR` with relative paths baked into the
//! stage views. A missing file falls back to a shared placeholder; if even
//! the placeholder is absent the screen goes out as plain text.

use std::path::{Path, PathBuf};

use crate::core::config;

const PLACEHOLDER: &str = "placeholder.jpg";

/// Resolves a stage illustration to a file on disk, if any.
pub fn resolve(image: &str) -> Option<PathBuf> {
    resolve_in(Path::new(config::IMAGES_DIR.as_str()), image)
}

fn resolve_in(root: &Path, image: &str) -> Option<PathBuf> {
    if !image.is_empty() {
        let path = root.join(image);
        if path.is_file() {
            return Some(path);
        }
        log::debug!("illustration not found: {}", path.display());
    }
    let placeholder = root.join(PLACEHOLDER);
    placeholder.is_file().then_some(placeholder)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn falls_back_to_placeholder_then_to_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(resolve_in(dir.path(), "tutorial/missing.jpg"), None);

        fs::write(dir.path().join(PLACEHOLDER), b"jpg").unwrap();
        assert_eq!(
            resolve_in(dir.path(), "tutorial/missing.jpg"),
            Some(dir.path().join(PLACEHOLDER))
        );

        fs::create_dir_all(dir.path().join("tutorial")).unwrap();
        fs::write(dir.path().join("tutorial/shop.jpg"), b"jpg").unwrap();
        assert_eq!(
            resolve_in(dir.path(), "tutorial/shop.jpg"),
            Some(dir.path().join("tutorial/shop.jpg"))
        );
    }
}
