use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// How many leading bytes are examined for magic numbers.
const SNIFF_WINDOW: u64 = 512;

const ZIP_LOCAL_HEADER: &[u8] = b"PK\x03\x04";
const ZIP_EMPTY_ARCHIVE: &[u8] = b"PK\x05\x06";
const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Detect a media type from a file's leading bytes.
///
/// `name` is the file's own name and only refines ambiguous containers: the
/// ZIP family shares one magic number, so `.jar`/`.war`/`.ear`/`.aar` pick
/// the archive flavor while anything else stays `application/zip`. XML is
/// recognized by its prolog or a leading element tag. Everything else is
/// `application/octet-stream`.
pub fn detect(head: &[u8], name: &str) -> &'static str {
    if head.starts_with(ZIP_LOCAL_HEADER) || head.starts_with(ZIP_EMPTY_ARCHIVE) {
        return refine_zip(name);
    }

    let text = skip_leading_noise(head);
    if text.starts_with(b"<?xml") {
        return "application/xml";
    }
    if text.len() >= 2 && text[0] == b'<' && text[1].is_ascii_alphabetic() {
        return "application/xml";
    }

    "application/octet-stream"
}

/// Read the detection window from `path` and run [`detect`].
pub fn sniff_path(path: &Path, name: &str) -> io::Result<String> {
    let file = File::open(path)?;
    let mut head = Vec::with_capacity(SNIFF_WINDOW as usize);
    file.take(SNIFF_WINDOW).read_to_end(&mut head)?;
    Ok(detect(&head, name).to_string())
}

fn refine_zip(name: &str) -> &'static str {
    let lower = name.to_ascii_lowercase();
    match lower.rsplit_once('.').map(|(_, ext)| ext) {
        Some("jar") => "application/java-archive",
        Some("war") => "application/x-war",
        Some("ear") => "application/x-ear",
        Some("aar") => "application/x-aar",
        _ => "application/zip",
    }
}

fn skip_leading_noise(head: &[u8]) -> &[u8] {
    let head = head.strip_prefix(UTF8_BOM).unwrap_or(head);
    let start = head
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(head.len());
    &head[start..]
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn zip_magic_refined_by_extension() {
        assert_eq!(detect(b"PK\x03\x04rest", "widget-1.0.jar"), "application/java-archive");
        assert_eq!(detect(b"PK\x03\x04rest", "app.war"), "application/x-war");
        assert_eq!(detect(b"PK\x03\x04rest", "app.EAR"), "application/x-ear");
        assert_eq!(detect(b"PK\x03\x04rest", "lib.aar"), "application/x-aar");
        assert_eq!(detect(b"PK\x03\x04rest", "bundle.zip"), "application/zip");
        assert_eq!(detect(b"PK\x03\x04rest", "noext"), "application/zip");
    }

    #[test]
    fn empty_archive_magic_is_still_zip_family() {
        assert_eq!(detect(b"PK\x05\x06", "widget.jar"), "application/java-archive");
    }

    #[test]
    fn xml_prolog_detected() {
        assert_eq!(
            detect(b"<?xml version=\"1.0\"?><project/>", "widget-1.0.pom"),
            "application/xml"
        );
    }

    #[test]
    fn xml_detected_after_bom_and_whitespace() {
        let mut head = vec![0xEF, 0xBB, 0xBF];
        head.extend_from_slice(b"\n  <?xml version=\"1.0\"?>");
        assert_eq!(detect(&head, "widget.pom"), "application/xml");
    }

    #[test]
    fn bare_root_element_counts_as_xml() {
        assert_eq!(detect(b"<project xmlns=\"x\">", "widget.pom"), "application/xml");
    }

    #[test]
    fn unknown_bytes_fall_back_to_octet_stream() {
        assert_eq!(detect(b"\x7fELF\x02\x01", "tool"), "application/octet-stream");
        assert_eq!(detect(b"", "empty"), "application/octet-stream");
        assert_eq!(detect(b"plain text", "notes.txt"), "application/octet-stream");
    }

    #[test]
    fn sniff_path_reads_the_window() {
        let td = tempdir().expect("tempdir");
        let path = td.path().join("widget-1.0.jar");
        fs::write(&path, b"PK\x03\x04payload").expect("write");

        let detected = sniff_path(&path, "widget-1.0.jar").expect("sniff");
        assert_eq!(detected, "application/java-archive");
    }

    #[test]
    fn sniff_path_propagates_io_errors() {
        let td = tempdir().expect("tempdir");
        let missing = td.path().join("absent.jar");
        assert!(sniff_path(&missing, "absent.jar").is_err());
    }
}
