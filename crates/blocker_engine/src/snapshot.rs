use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to decode snapshot with {encoding}")]
    Decode { encoding: String },
}

/// A saved feed page decoded to UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub html: String,
    pub encoding_label: String,
}

pub fn load_snapshot(path: &Path) -> Result<Snapshot, SnapshotError> {
    let bytes = fs::read(path).map_err(|source| SnapshotError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    decode_snapshot(&bytes)
}

/// Decodes page bytes: BOM first, then chardetng (which honours `<meta charset>`).
pub fn decode_snapshot(bytes: &[u8]) -> Result<Snapshot, SnapshotError> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_with(bytes, detector.guess(None, true))
}

fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> Result<Snapshot, SnapshotError> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(SnapshotError::Decode {
            encoding: encoding.name().to_string(),
        });
    }
    Ok(Snapshot {
        html: text.into_owned(),
        encoding_label: encoding.name().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utf8_bom_is_honoured() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("<p>屏蔽</p>".as_bytes());
        let snapshot = decode_snapshot(&bytes).unwrap();
        assert_eq!(snapshot.encoding_label, "UTF-8");
        assert_eq!(snapshot.html, "<p>屏蔽</p>");
    }

    #[test]
    fn plain_ascii_decodes() {
        let snapshot = decode_snapshot(b"<p>Block</p>").unwrap();
        assert_eq!(snapshot.html, "<p>Block</p>");
    }
}
