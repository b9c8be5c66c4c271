use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::Error;

/// Ordered (or shuffled) traversal over the photo library.
///
/// The cursor points at the photo that the next slide change will display.
/// Advancing past the last entry regenerates the set by rescanning the
/// directory, so files added during a cycle appear in the next one; the order
/// is reshuffled when shuffling is enabled, otherwise it is sorted and stable
/// across cycles.
pub struct PhotoQueue {
    root: PathBuf,
    shuffle: bool,
    items: Vec<PathBuf>,
    cursor: usize,
}

impl PhotoQueue {
    pub fn new(root: impl Into<PathBuf>, shuffle: bool) -> Result<Self, Error> {
        let root = root.into();
        if !root.is_dir() {
            return Err(Error::BadDir(format!(
                "{} is not a directory",
                root.display()
            )));
        }
        let items = scan(&root, shuffle)?;
        info!(count = items.len(), root = %root.display(), "photo library scanned");
        Ok(Self {
            root,
            shuffle,
            items,
            cursor: 0,
        })
    }

    /// The photo the next slide change will display. No side effects.
    pub fn current(&self) -> &Path {
        &self.items[self.cursor]
    }

    /// The photo one past the cursor, if this cycle has one.
    ///
    /// At the last slot the follow-up photo belongs to the not-yet-regenerated
    /// next cycle, so there is nothing to report (or prefetch) until the wrap
    /// happens.
    pub fn peek_next(&self) -> Option<&Path> {
        self.items.get(self.cursor + 1).map(PathBuf::as_path)
    }

    /// Step the cursor forward, regenerating the set when it wraps.
    pub fn advance_forward(&mut self) -> Result<(), Error> {
        self.cursor += 1;
        if self.cursor >= self.items.len() {
            self.items = scan(&self.root, self.shuffle)?;
            self.cursor = 0;
            debug!(
                count = self.items.len(),
                shuffled = self.shuffle,
                "photo set regenerated at wrap"
            );
        }
        Ok(())
    }

    /// Step the cursor backward, clamped at the first photo. Never wraps and
    /// never regenerates.
    pub fn advance_backward(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Always false: construction and regeneration both fail on an empty scan.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

fn scan(root: &Path, shuffle: bool) -> Result<Vec<PathBuf>, Error> {
    let mut items = Vec::new();
    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
    {
        let path = entry.path().to_path_buf();
        if is_image(&path) && !is_hidden(&path) {
            items.push(path);
        }
    }
    if items.is_empty() {
        return Err(Error::EmptyScan(root.to_path_buf()));
    }
    if shuffle {
        items.shuffle(&mut rand::rng());
    } else {
        items.sort();
    }
    Ok(items)
}

#[inline]
fn is_image(p: &Path) -> bool {
    matches!(
        p.extension()
            .and_then(OsStr::to_str)
            .map(|s| s.to_ascii_lowercase()),
        Some(ref e) if ["jpg", "jpeg", "png", "webp"].contains(&e.as_str())
    )
}

#[inline]
fn is_hidden(p: &Path) -> bool {
    p.file_name()
        .and_then(OsStr::to_str)
        .is_some_and(|name| name.starts_with('.'))
}
