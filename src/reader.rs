use std::fs;

use anyhow::{Context, Result};
use tracing::{error, warn};

use crate::config::InputSource;
use crate::types::BlobDeleteRequest;

const EXPECTED_FIELD_COUNT: usize = 3;

/// Reads a delimited work list and produces the blob delete requests it
/// describes.
///
/// Malformed lines never abort the read: empty lines are skipped with a
/// warning, lines that are missing fields or carry blank fields are skipped
/// with an error trace. Only a source that cannot be read at all (for
/// example a missing file) is a hard failure.
pub struct DeleteRequestReader {
    source: InputSource,
    separator: String,
    has_header: bool,
}

impl DeleteRequestReader {
    pub fn new(source: InputSource, separator: impl Into<String>, has_header: bool) -> Self {
        Self {
            source,
            separator: separator.into(),
            has_header,
        }
    }

    /// Human readable description of the source, for traces and errors.
    pub fn source_description(&self) -> String {
        match &self.source {
            InputSource::File(path) => format!("file '{}'", path.display()),
            InputSource::Inline(_) => "inline data".to_string(),
        }
    }

    /// Read the whole work list, in source order.
    pub fn read_all(&self) -> Result<Vec<BlobDeleteRequest>> {
        let content = match &self.source {
            InputSource::File(path) => fs::read_to_string(path)
                .with_context(|| format!("failed to read input file '{}'", path.display()))?,
            InputSource::Inline(data) => data.clone(),
        };

        let mut requests = Vec::new();
        let mut line_number: u64 = 0;
        let mut lines = content.lines();

        if self.has_header && lines.next().is_some() {
            line_number += 1;
        }

        for raw_line in lines {
            line_number += 1;
            if let Some(request) = self.parse_line(raw_line, line_number) {
                requests.push(request);
            }
        }

        Ok(requests)
    }

    fn parse_line(&self, raw_line: &str, line_number: u64) -> Option<BlobDeleteRequest> {
        let trimmed = raw_line.trim();
        if trimmed.is_empty() {
            warn!(line_number = line_number, "skipping empty line.");
            return None;
        }

        let tokens: Vec<&str> = trimmed.split(self.separator.as_str()).collect();
        if tokens.len() < EXPECTED_FIELD_COUNT {
            error!(
                line_number = line_number,
                line = raw_line,
                "skipping malformed line: expected at least 3 fields."
            );
            return None;
        }

        let account = strip_quotes(tokens[0]);
        let container = strip_quotes(tokens[1]);
        let blob = strip_quotes(tokens[2]);

        if account.is_empty() || container.is_empty() || blob.is_empty() {
            error!(
                line_number = line_number,
                line = raw_line,
                "skipping line with blank account, container or blob name."
            );
            return None;
        }

        Some(BlobDeleteRequest::new(
            account,
            container,
            blob,
            line_number,
            raw_line,
        ))
    }
}

fn strip_quotes(token: &str) -> String {
    token.replace('"', "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::init_dummy_tracing_subscriber;

    use std::io::Write;

    fn inline_reader(content: &str, has_header: bool) -> DeleteRequestReader {
        DeleteRequestReader::new(InputSource::Inline(content.to_string()), ",", has_header)
    }

    #[test]
    fn reads_simple_work_list() {
        init_dummy_tracing_subscriber();

        let reader = inline_reader(
            "account,container,blob\n\
             account1,container1,blob1.dat\n\
             account2,container2,dir/blob2.dat\n",
            true,
        );
        let requests = reader.read_all().unwrap();

        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].account, "account1");
        assert_eq!(requests[0].container, "container1");
        assert_eq!(requests[0].blob, "blob1.dat");
        assert_eq!(requests[0].line_number, 2);
        assert_eq!(requests[1].blob, "dir/blob2.dat");
        assert_eq!(requests[1].line_number, 3);
    }

    #[test]
    fn header_row_is_not_skipped_without_header_flag() {
        init_dummy_tracing_subscriber();

        let reader = inline_reader("account1,container1,blob1.dat\n", false);
        let requests = reader.read_all().unwrap();

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].line_number, 1);
    }

    #[test]
    fn empty_and_whitespace_lines_are_skipped() {
        init_dummy_tracing_subscriber();

        let reader = inline_reader(
            "account1,container1,blob1\n\n   \naccount2,container2,blob2\n",
            false,
        );
        let requests = reader.read_all().unwrap();

        assert_eq!(requests.len(), 2);
        assert_eq!(requests[1].line_number, 4);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        init_dummy_tracing_subscriber();

        let reader = inline_reader(
            "account1,container1\naccount2,container2,blob2\nonly-one-field\n",
            false,
        );
        let requests = reader.read_all().unwrap();

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].account, "account2");
    }

    #[test]
    fn blank_fields_are_skipped() {
        init_dummy_tracing_subscriber();

        let reader = inline_reader(
            "account1,,blob1\n,container2,blob2\naccount3,container3,\naccount4,container4,blob4\n",
            false,
        );
        let requests = reader.read_all().unwrap();

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].account, "account4");
    }

    #[test]
    fn quotes_and_padding_are_stripped() {
        init_dummy_tracing_subscriber();

        let reader = inline_reader("\"account1\" , \"container1\", \"blob 1.dat\"\n", false);
        let requests = reader.read_all().unwrap();

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].account, "account1");
        assert_eq!(requests[0].container, "container1");
        assert_eq!(requests[0].blob, "blob 1.dat");
    }

    #[test]
    fn extra_fields_are_ignored() {
        init_dummy_tracing_subscriber();

        let reader = inline_reader("account1,container1,blob1,extra,fields\n", false);
        let requests = reader.read_all().unwrap();

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].blob, "blob1");
    }

    #[test]
    fn custom_separator() {
        init_dummy_tracing_subscriber();

        let reader = DeleteRequestReader::new(
            InputSource::Inline("account1;container1;blob1\n".to_string()),
            ";",
            false,
        );
        let requests = reader.read_all().unwrap();

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].container, "container1");
    }

    #[test]
    fn raw_line_is_preserved() {
        init_dummy_tracing_subscriber();

        let reader = inline_reader("\"account1\",container1,blob1\n", false);
        let requests = reader.read_all().unwrap();

        assert_eq!(requests[0].raw_line, "\"account1\",container1,blob1");
    }

    #[test]
    fn reads_from_file() {
        init_dummy_tracing_subscriber();

        let dir = std::env::temp_dir();
        let path = dir.join(format!("blobrm-reader-test-{}.csv", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "account,container,blob").unwrap();
        writeln!(file, "account1,container1,blob1").unwrap();
        drop(file);

        let reader = DeleteRequestReader::new(InputSource::File(path.clone()), ",", true);
        let requests = reader.read_all().unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].account, "account1");
    }

    #[test]
    fn missing_file_is_an_error() {
        init_dummy_tracing_subscriber();

        let reader = DeleteRequestReader::new(
            InputSource::File(std::path::PathBuf::from("/nonexistent/blobrm.csv")),
            ",",
            true,
        );
        assert!(reader.read_all().is_err());
    }
}
