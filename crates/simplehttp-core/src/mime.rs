//! Content-type resolution for binary payloads

/// Resolve a MIME type from the extension of `path`
///
/// The extension is whatever follows the last `.` of the whole string,
/// compared case-insensitively. Returns `None` when there is no `.` or the
/// extension is not one of the served document and image types.
pub fn resolve(path: &str) -> Option<&'static str> {
    let (_, ext) = path.rsplit_once('.')?;

    match ext.to_ascii_lowercase().as_str() {
        // Documents
        "xml" => Some("application/xml"),
        "pdf" => Some("application/pdf"),

        // Images
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_types() {
        assert_eq!(resolve("/document.xml"), Some("application/xml"));
        assert_eq!(resolve("testdata/image1.png"), Some("image/png"));
        assert_eq!(resolve("photo.jpg"), Some("image/jpeg"));
        assert_eq!(resolve("photo.jpeg"), Some("image/jpeg"));
        assert_eq!(resolve("manual.pdf"), Some("application/pdf"));
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(resolve("some/dir/doc.XML"), Some("application/xml"));
        assert_eq!(resolve("IMAGE.Png"), Some("image/png"));
        assert_eq!(resolve("a.JPEG"), Some("image/jpeg"));
    }

    #[test]
    fn test_unresolved() {
        assert_eq!(resolve("noext"), None);
        assert_eq!(resolve("notes.txt"), None);
        assert_eq!(resolve("archive.tar.gz"), None);
        assert_eq!(resolve("trailing."), None);
    }

    #[test]
    fn test_last_dot_wins() {
        assert_eq!(resolve("report.xml.pdf"), Some("application/pdf"));
        assert_eq!(resolve("dir.png/file"), None);
    }
}
