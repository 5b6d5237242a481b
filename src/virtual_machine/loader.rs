//! Program image loader.
//!
//! A program image is a text file with one byte per line written as a binary
//! literal. Blank lines and lines whose first non-space character is `#` are
//! skipped, and anything after a `#` is a comment:
//!
//! ```text
//! # print8
//! 10000010 # LDI R0,8
//! 00000000
//! 00001000
//! 01000111 # PRN R0
//! 00000000
//! 00000001 # HLT
//! ```
//!
//! A malformed line is reported and skipped; the rest of the file still loads.

use crate::virtual_machine::errors::LoaderError;
use crate::virtual_machine::state::MachineState;
use std::fs;
use std::io;
use std::path::Path;

const COMMENT_CHAR: char = '#';
const MAX_DIGITS: usize = 8;

/// Bytes parsed from an image, plus the lines that had to be skipped.
#[derive(Debug, Default)]
pub struct ProgramImage {
    /// Parsed bytes in file order, destined for address 0 onward.
    pub bytes: Vec<u8>,
    /// One [`LoaderError::MalformedLiteral`] per skipped line.
    pub skipped: Vec<LoaderError>,
}

impl ProgramImage {
    /// Builds the initial machine state with this image in memory.
    pub fn into_machine(self) -> Result<MachineState, LoaderError> {
        MachineState::with_program(&self.bytes)
    }
}

/// Parses the literal on one line.
///
/// Returns `None` for blank and comment lines.
pub fn parse_line(line_no: usize, line: &str) -> Option<Result<u8, LoaderError>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(COMMENT_CHAR) {
        return None;
    }

    let text = line.split(COMMENT_CHAR).next().unwrap_or_default().trim();
    let well_formed = !text.is_empty()
        && text.len() <= MAX_DIGITS
        && text.bytes().all(|b| b == b'0' || b == b'1');

    let parsed = if well_formed {
        u8::from_str_radix(text, 2).ok()
    } else {
        None
    };

    Some(parsed.ok_or_else(|| LoaderError::MalformedLiteral {
        line: line_no,
        text: text.to_string(),
    }))
}

/// Parses a whole image, skipping (and logging) malformed lines.
pub fn parse_image(source: &str) -> ProgramImage {
    let mut image = ProgramImage::default();
    for (idx, line) in source.lines().enumerate() {
        match parse_line(idx + 1, line) {
            None => {}
            Some(Ok(byte)) => image.bytes.push(byte),
            Some(Err(err)) => {
                crate::warn!("{err}");
                image.skipped.push(err);
            }
        }
    }
    image
}

/// Reads and parses the image at `path`.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<ProgramImage, LoaderError> {
    let path = path.as_ref();
    let source = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => LoaderError::FileNotFound {
            path: path.display().to_string(),
        },
        _ => LoaderError::Io {
            path: path.display().to_string(),
            source: e,
        },
    })?;
    Ok(parse_image(&source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::utils::write_program;
    use tempfile::tempdir;

    #[test]
    fn blank_and_comment_lines_are_ignored() {
        assert!(parse_line(1, "").is_none());
        assert!(parse_line(1, "    ").is_none());
        assert!(parse_line(1, "# a comment").is_none());
        assert!(parse_line(1, "   # indented comment").is_none());
    }

    #[test]
    fn literal_with_trailing_comment() {
        assert_eq!(parse_line(1, "10000010 # LDI R0,8").unwrap().unwrap(), 0b1000_0010);
        assert_eq!(parse_line(1, "  00000001  ").unwrap().unwrap(), 1);
        assert_eq!(parse_line(1, "11111111").unwrap().unwrap(), 255);
    }

    #[test]
    fn malformed_literals() {
        for bad in ["0000000a", "2", "100000000", "+1", "0b0001", "LDI R0"] {
            assert!(
                matches!(
                    parse_line(4, bad),
                    Some(Err(LoaderError::MalformedLiteral { line: 4, .. }))
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn malformed_line_does_not_stop_loading() {
        let image = parse_image("10000010\nnope\n00000000\n\n# c\n00001000\n");
        assert_eq!(image.bytes, vec![0b1000_0010, 0, 8]);
        assert_eq!(image.skipped.len(), 1);
        assert!(matches!(
            &image.skipped[0],
            LoaderError::MalformedLiteral { line: 2, text } if text == "nope"
        ));
    }

    #[test]
    fn load_from_file() {
        let dir = tempdir().unwrap();
        let path = write_program(dir.path(), "hlt.ls8", &["# halt only", "00000001"]);
        let image = load_file(&path).unwrap();
        assert_eq!(image.bytes, vec![1]);
        assert!(image.skipped.is_empty());

        let state = image.into_machine().unwrap();
        assert_eq!(state.read(0).unwrap(), 1);
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempdir().unwrap();
        let err = load_file(dir.path().join("missing.ls8")).unwrap_err();
        assert!(matches!(err, LoaderError::FileNotFound { .. }));
    }

    #[test]
    fn oversized_image_is_rejected() {
        let source = "00000000\n".repeat(300);
        let image = parse_image(&source);
        assert_eq!(image.bytes.len(), 300);
        assert!(matches!(
            image.into_machine(),
            Err(LoaderError::ProgramTooLarge { len: 300, .. })
        ));
    }
}
