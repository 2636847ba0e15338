use std::{collections::HashSet, path::Path};

use tracing::info;

use crate::{
    error::Result,
    grammar::{MarkerGrammar, ResponseGrammar},
    types::VideoRecord,
};

/// Records carried over from an earlier run's CSV output.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct PreviousResults {
    pub records: Vec<VideoRecord>,
}

impl PreviousResults {
    /// Read completed rows from `path`. Rows without both a description and
    /// tags, and error rows, are left out so those videos get another try.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let previous = Self::from_csv(&content);
        info!(
            "Found {} completed videos in {}",
            previous.records.len(),
            path.display()
        );
        Ok(previous)
    }

    /// Rows the reader cannot decode are skipped like incomplete ones.
    pub fn from_csv(content: &str) -> Self {
        let grammar = MarkerGrammar::default();
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(content.as_bytes());

        let records = reader
            .records()
            .filter_map(|row| row.ok())
            .filter_map(|row| {
                let filename = row.get(0).filter(|f| !f.is_empty())?;
                let description = row.get(1).filter(|d| !d.is_empty())?;
                let tags = row.get(2).filter(|t| !t.is_empty())?;
                if description.starts_with("ERROR:") {
                    return None;
                }
                // Reuse the reply grammar so both `[a, b]` and bare lists parse.
                Some(VideoRecord {
                    filename: filename.to_string(),
                    description: description.to_string(),
                    tags: grammar.parse(&format!("Tags: {tags}")).tags,
                    error: None,
                })
            })
            .collect();

        Self { records }
    }

    pub fn filenames(&self) -> HashSet<&str> {
        self.records.iter().map(|r| r.filename.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        format::{OutputFormat, render},
        types::Analysis,
    };

    #[test]
    fn test_keeps_only_completed_rows() {
        let csv = "Filename,Description,Tags\n\
                   a.mp4,A man speaking,\"[man, speaking]\"\n\
                   b.mp4,ERROR: Transfer failed,\n\
                   c.mp4,,\"[x]\"\n\
                   d.mp4,\"Sunset, beach\",\"[\"\"sun\"\", beach]\"\n";
        let previous = PreviousResults::from_csv(csv);
        assert_eq!(previous.records.len(), 2);
        assert_eq!(previous.records[0].filename, "a.mp4");
        assert_eq!(previous.records[0].tags, vec!["man", "speaking"]);
        assert_eq!(previous.records[1].description, "Sunset, beach");
        assert_eq!(previous.records[1].tags, vec!["sun", "beach"]);
        assert!(previous.filenames().contains("d.mp4"));
        assert!(!previous.filenames().contains("b.mp4"));
    }

    #[test]
    fn test_reads_back_written_results() {
        let written = render(
            &[
                VideoRecord::new(
                    "a.mp4",
                    Analysis {
                        description: "Rain, wind and \"thunder\"".to_string(),
                        tags: vec!["storm".to_string(), "night".to_string()],
                    },
                ),
                VideoRecord::failed("b.mp4", "Transfer failed"),
            ],
            OutputFormat::Csv,
        )
        .unwrap();

        let previous = PreviousResults::from_csv(&written);
        assert_eq!(previous.records.len(), 1);
        assert_eq!(previous.records[0].description, "Rain, wind and \"thunder\"");
        assert_eq!(previous.records[0].tags, vec!["storm", "night"]);
    }

    #[test]
    fn test_short_rows_are_skipped() {
        let csv = "Filename,Description,Tags\na.mp4\nb.mp4,Only a description\r\nc.mp4,Done,[x]";
        let previous = PreviousResults::from_csv(csv);
        assert_eq!(previous.records.len(), 1);
        assert_eq!(previous.records[0].filename, "c.mp4");
        assert_eq!(previous.records[0].tags, vec!["x"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(PreviousResults::from_csv("").is_empty());
        assert!(PreviousResults::from_csv("Filename,Description,Tags\n").is_empty());
    }

    #[tokio::test]
    async fn test_load_missing_file_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(
            PreviousResults::load(&dir.path().join("results.csv"))
                .await
                .is_err()
        );
    }
}
