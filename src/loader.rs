//! Repository loader: walks a directory and hands source files to the engine

use coderank_core::SourceFile;
use ignore::WalkBuilder;
use std::path::Path;

/// Files larger than this are skipped.
pub const MAX_FILE_BYTES: u64 = 1024 * 1024;

/// Collect every readable text file under `root`, honouring `.gitignore`
/// and skipping hidden entries. Paths are relative to `root`, sorted.
pub fn load_repository(root: &Path) -> anyhow::Result<Vec<SourceFile>> {
    if !root.is_dir() {
        anyhow::bail!("not a directory: {}", root.display());
    }

    let mut files = Vec::new();
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .require_git(false)
        .build();

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Cannot read entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let path = entry.path();
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let relative = relative.to_string_lossy();

        if let Ok(meta) = entry.metadata()
            && meta.len() > MAX_FILE_BYTES
        {
            tracing::debug!("Skipping large file: {}", relative);
            continue;
        }

        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Cannot read {}: {}", relative, e);
                continue;
            }
        };
        // Binary content and invalid UTF-8 are not analyzable.
        if bytes.contains(&0) {
            continue;
        }
        let Ok(text) = String::from_utf8(bytes) else {
            tracing::debug!("Skipping non UTF-8 file: {}", relative);
            continue;
        };

        files.push(SourceFile::detect(relative.into_owned(), text));
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    let source = files.iter().filter(|f| f.language.is_source()).count();
    tracing::info!(
        files = files.len(),
        source,
        "loaded repository {}",
        root.display()
    );
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use coderank_core::Language;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_repository_relative_sorted() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("pkg")).unwrap();
        fs::write(dir.path().join("pkg/b.py"), "def f():\n    pass\n").unwrap();
        fs::write(dir.path().join("a.py"), "import pkg.b\n").unwrap();
        fs::write(dir.path().join("README.md"), "# readme\n").unwrap();

        let files = load_repository(dir.path()).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["README.md", "a.py", "pkg/b.py"]);
        assert_eq!(files[1].language, Language::Python);
        assert_eq!(files[0].language, Language::Markdown);
    }

    #[test]
    fn test_load_repository_skips_binary_and_hidden() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("blob.bin"), [0u8, 1, 2, 3]).unwrap();
        fs::create_dir_all(dir.path().join(".hidden")).unwrap();
        fs::write(dir.path().join(".hidden/x.py"), "x = 1\n").unwrap();
        fs::write(dir.path().join("main.go"), "package main\n").unwrap();

        let files = load_repository(dir.path()).unwrap();
        let paths: Vec<&str> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["main.go"]);
    }

    #[test]
    fn test_load_repository_missing_root() {
        let dir = TempDir::new().unwrap();
        assert!(load_repository(&dir.path().join("absent")).is_err());
    }
}
