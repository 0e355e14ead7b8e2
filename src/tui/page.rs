//! # Pages
//!
//! The terminal host's views. Each destination names a markdown file in the
//! pages directory (`<dir>/<destination>.md`), loaded asynchronously and
//! rendered once; the router caches the result.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use log::debug;
use ratatui::style::Color;
use ratatui::text::Text;

use crate::core::route::Destination;
use crate::core::view::{ViewError, ViewFactory};
use crate::tui::markdown;

/// A rendered page, ready to display.
#[derive(Debug)]
pub struct Page {
    pub destination: Destination,
    pub title: String,
    pub body: Text<'static>,
}

/// Builds pages from markdown files in a directory.
pub struct PageFactory {
    dir: PathBuf,
}

impl PageFactory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The file backing a destination, if the destination can name one.
    fn page_path(&self, destination: &Destination) -> Option<PathBuf> {
        let name = match destination {
            Destination::Text(name) => name.clone(),
            Destination::Integer(i) => i.to_string(),
            _ => return None,
        };
        if !is_page_name(&name) {
            return None;
        }
        Some(self.dir.join(format!("{name}.md")))
    }
}

/// Only plain file stems: no separators, no parent references.
fn is_page_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

#[async_trait]
impl ViewFactory for PageFactory {
    type View = Page;

    async fn init_view(&self, destination: &Destination) -> Result<Page, ViewError> {
        let path = self
            .page_path(destination)
            .ok_or_else(|| ViewError::NotFound(destination.clone()))?;
        debug!("Loading page {} from {}", destination, path.display());

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ViewError::NotFound(destination.clone()));
            }
            Err(e) => return Err(ViewError::Io(e)),
        };

        let rendered = markdown::render(&content, Color::Reset);
        Ok(Page {
            destination: destination.clone(),
            title: rendered.title.unwrap_or_else(|| destination.to_string()),
            body: rendered.text,
        })
    }
}

/// Page names available in `dir`, sorted. Used for Tab cycling.
pub fn list_pages(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!("Cannot list pages in {}: {}", dir.display(), e);
            return Vec::new();
        }
    };
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
        .filter_map(|path| path.file_stem()?.to_str().map(str::to_string))
        .filter(|name| is_page_name(name))
        .collect();
    names.sort();
    names
}

/// The page `step` positions away from `current`, wrapping around.
/// Unknown or missing `current` starts from the first page.
pub fn cycle<'a>(pages: &'a [String], current: Option<&str>, step: isize) -> Option<&'a str> {
    if pages.is_empty() {
        return None;
    }
    let len = pages.len() as isize;
    let next = match current.and_then(|c| pages.iter().position(|p| p == c)) {
        Some(idx) => (idx as isize + step).rem_euclid(len),
        None => 0,
    };
    Some(pages[next as usize].as_str())
}
