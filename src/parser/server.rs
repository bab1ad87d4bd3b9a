//! The parse server loop run by `scala-parse-server`.

use std::fs;
use std::io::{BufRead, Write};
use std::time::Instant;

use tracing::{debug, warn};

use super::{File, ParseRequest, ParseResponse, ParserReady, scanner};
use crate::error::Result;

/// Print the ready line, then answer each request line with one response
/// line until `input` is exhausted.
pub fn serve(input: impl BufRead, mut output: impl Write) -> Result<()> {
    writeln!(output, "{}", serde_json::to_string(&ParserReady { ready: true })?)?;
    output.flush()?;

    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<ParseRequest>(&line) {
            Ok(request) => handle(&request),
            Err(err) => {
                warn!(%err, "malformed request");
                ParseResponse {
                    error: Some(format!("invalid request: {err}")),
                    ..Default::default()
                }
            }
        };
        writeln!(output, "{}", serde_json::to_string(&response)?)?;
        output.flush()?;
    }
    Ok(())
}

/// Scan every file of `request`. Unreadable files come back with their
/// `parse_error` set.
pub fn handle(request: &ParseRequest) -> ParseResponse {
    let start = Instant::now();
    let files = request
        .filenames
        .iter()
        .map(|filename| match fs::read_to_string(filename) {
            Ok(source) => scanner::scan(filename, &source),
            Err(err) => File {
                filename: filename.clone(),
                parse_error: err.to_string(),
                ..Default::default()
            },
        })
        .collect::<Vec<_>>();
    let elapsed_ms = start.elapsed().as_millis() as i64;
    debug!(files = files.len(), elapsed_ms, "parsed");
    ParseResponse {
        files,
        error: None,
        elapsed_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_serve_answers_each_request() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("A.scala");
        fs::write(&path, "package a\nclass A\n").unwrap();

        let request = serde_json::to_string(&ParseRequest {
            filenames: vec![path.display().to_string()],
        })
        .unwrap();
        let input = format!("{request}\n\nnot json\n");
        let mut output = Vec::new();
        serve(Cursor::new(input), &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        let ready: ParserReady = serde_json::from_str(lines[0]).unwrap();
        assert!(ready.ready);

        let response: ParseResponse = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(response.files.len(), 1);
        assert_eq!(response.files[0].classes, vec!["a.A"]);
        assert!(response.error.is_none());

        let bad: ParseResponse = serde_json::from_str(lines[2]).unwrap();
        assert!(bad.error.unwrap().starts_with("invalid request"));
    }

    #[test]
    fn test_unreadable_file_sets_parse_error() {
        let response = handle(&ParseRequest {
            filenames: vec!["/nonexistent/B.scala".into()],
        });
        assert_eq!(response.files.len(), 1);
        assert!(!response.files[0].parse_error.is_empty());
    }
}
