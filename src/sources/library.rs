//! Local music library: every file under the music directory, in path order.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryEntry {
    pub path: PathBuf,
    pub name: String,
}

pub struct MusicLibrary {
    root: PathBuf,
}

impl MusicLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Walks the library recursively. Directories themselves are not entries.
    pub async fn scan(&self) -> Result<Vec<LibraryEntry>> {
        let mut entries = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut read_dir = fs::read_dir(&dir)
                .await
                .with_context(|| format!("no se pudo leer {}", dir.display()))?;

            while let Some(entry) = read_dir.next_entry().await? {
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(entry.path());
                } else if file_type.is_file() {
                    entries.push(LibraryEntry {
                        name: entry.file_name().to_string_lossy().into_owned(),
                        path: entry.path(),
                    });
                }
            }
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        debug!("📁 {} archivos en {}", entries.len(), self.root.display());
        Ok(entries)
    }

    /// 1-based lookup, matching the numbers shown by `library list`.
    pub async fn get(&self, index: usize) -> Result<Option<LibraryEntry>> {
        let entries = self.scan().await?;
        Ok(index
            .checked_sub(1)
            .and_then(|i| entries.into_iter().nth(i)))
    }
}

/// One page of the library listing. Numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryPage {
    pub items: Vec<(usize, String)>,
    pub current_page: usize,
    pub total_pages: usize,
}

impl LibraryPage {
    pub fn new(entries: &[LibraryEntry], page: usize, per_page: usize) -> Self {
        let safe_page = page.max(1);
        let per_page = per_page.max(1);
        let start = (safe_page - 1).saturating_mul(per_page);

        let items = entries
            .iter()
            .enumerate()
            .skip(start)
            .take(per_page)
            .map(|(i, entry)| (i + 1, entry.name.clone()))
            .collect();

        Self {
            items,
            current_page: safe_page,
            total_pages: entries.len().div_ceil(per_page).max(1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn render(&self) -> String {
        self.items
            .iter()
            .map(|(number, name)| format!("{number}) {name}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entries(n: usize) -> Vec<LibraryEntry> {
        (0..n)
            .map(|i| LibraryEntry {
                path: PathBuf::from(format!("./audio/{i:02}.opus")),
                name: format!("{i:02}.opus"),
            })
            .collect()
    }

    #[tokio::test]
    async fn scan_is_recursive_and_sorted() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("memes")).unwrap();
        std::fs::write(dir.path().join("stal.opus"), b"").unwrap();
        std::fs::write(dir.path().join("bruh.opus"), b"").unwrap();
        std::fs::write(dir.path().join("memes").join("nani.opus"), b"").unwrap();

        let library = MusicLibrary::new(dir.path());
        let names: Vec<_> = library
            .scan()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();

        assert_eq!(names, vec!["bruh.opus", "nani.opus", "stal.opus"]);
        assert_eq!(
            library.get(2).await.unwrap().map(|e| e.path),
            Some(dir.path().join("memes").join("nani.opus"))
        );
        assert_eq!(library.get(0).await.unwrap(), None);
        assert_eq!(library.get(4).await.unwrap(), None);
    }

    #[tokio::test]
    async fn missing_directory_is_an_error() {
        let library = MusicLibrary::new("/definitely/not/here");
        assert!(library.scan().await.is_err());
    }

    #[test]
    fn pages_are_numbered_from_one() {
        let all = entries(23);

        let first = LibraryPage::new(&all, 1, 10);
        assert_eq!(first.items.first(), Some(&(1, "00.opus".to_string())));
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.total_pages, 3);

        let last = LibraryPage::new(&all, 3, 10);
        assert_eq!(last.items, vec![
            (21, "20.opus".to_string()),
            (22, "21.opus".to_string()),
            (23, "22.opus".to_string()),
        ]);
        assert_eq!(last.render(), "21) 20.opus\n22) 21.opus\n23) 22.opus");
    }

    #[test]
    fn page_past_the_end_is_empty() {
        let page = LibraryPage::new(&entries(5), 2, 10);
        assert!(page.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(LibraryPage::new(&[], 1, 10).total_pages, 1);
    }
}
