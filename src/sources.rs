// SPDX-License-Identifier: MIT
//! Target list loading.
//!
//! The target list is a plain text file with one URL per line. Any common
//! line-ending convention is accepted; blank lines are dropped. Order and
//! duplicates are preserved as given — the operator decides what gets
//! audited, and how often.

use std::path::Path;

use thiserror::Error;

/// Error reading the target list. Fatal: no audit can proceed without targets.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("could not read target list '{path}': {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Read the newline-delimited target list at `path`.
///
/// CRLF and bare CR are normalized to LF before splitting. Lines are
/// trimmed; empty lines are excluded.
pub async fn read_targets(path: &Path) -> Result<Vec<String>, SourceError> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| SourceError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;
    Ok(split_targets(&raw))
}

fn split_targets(raw: &str) -> Vec<String> {
    raw.replace("\r\n", "\n")
        .replace('\r', "\n")
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn splits_on_every_line_ending_convention() {
        let raw = "https://a.example/\r\nhttps://b.example/\rhttps://c.example/\nhttps://d.example/";
        let targets = split_targets(raw);
        assert_eq!(
            targets,
            vec![
                "https://a.example/",
                "https://b.example/",
                "https://c.example/",
                "https://d.example/",
            ]
        );
    }

    #[test]
    fn drops_blank_and_whitespace_lines() {
        let raw = "https://a.example/\n\n   \n\thttps://b.example/\t\n\n";
        let targets = split_targets(raw);
        assert_eq!(targets, vec!["https://a.example/", "https://b.example/"]);
    }

    #[test]
    fn preserves_order_and_duplicates() {
        let raw = "https://x.example/\nhttps://y.example/\nhttps://x.example/\n";
        let targets = split_targets(raw);
        assert_eq!(
            targets,
            vec!["https://x.example/", "https://y.example/", "https://x.example/"]
        );
    }

    #[test]
    fn empty_input_yields_no_targets() {
        assert!(split_targets("").is_empty());
        assert!(split_targets("\r\n\n\r").is_empty());
    }

    #[tokio::test]
    async fn reads_targets_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "https://a.example/\r\nhttps://b.example/\n").unwrap();
        let targets = read_targets(file.path()).await.unwrap();
        assert_eq!(targets.len(), 2);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let err = read_targets(Path::new("/nonexistent/urls.txt"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/urls.txt"));
    }
}
