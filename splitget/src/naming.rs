//! Target file names and published URLs.

use std::path::Path;

use url::Url;

/// Name used when the URL path has no final segment.
pub const FALLBACK_FILENAME: &str = "downloaded_file";

/// Last path segment of `url`, or [`FALLBACK_FILENAME`].
///
/// The segment is returned as it appears in the URL; percent-escapes are not
/// decoded.
pub fn original_filename(url: &str) -> String {
    last_segment(url)
        .as_deref()
        .and_then(bare_name)
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_FILENAME.to_string())
}

/// Extension of the URL's file name including the leading dot, or empty.
pub fn url_extension(url: &str) -> String {
    last_segment(url)
        .as_deref()
        .map(extension_of)
        .unwrap_or_default()
}

/// Choose the file name an artifact is saved under.
///
/// Without `requested` the URL's file name is used. A requested name is cut
/// down to its last path component, so it always lands inside the working and
/// destination directories; one with no extension of its own inherits the
/// URL's.
pub fn resolve_target_name(url: &str, requested: Option<&str>) -> String {
    match requested.and_then(bare_name) {
        None => original_filename(url),
        Some(name) if extension_of(name).is_empty() => format!("{}{}", name, url_extension(url)),
        Some(name) => name.to_string(),
    }
}

/// Last component of `name` across both separator styles, or `None` when
/// nothing usable as a plain file name is left.
fn bare_name(name: &str) -> Option<&str> {
    let last = name.rsplit(['/', '\\']).next()?.trim();
    match last {
        "" | "." | ".." => None,
        _ => Some(last),
    }
}

/// Public URL of an artifact: `base_url` with `file_name` appended verbatim.
pub fn published_url(base_url: &str, file_name: &str) -> String {
    format!("{}{}", base_url, file_name)
}

fn last_segment(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.last()?;
    Some(segment.to_string())
}

fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_original_filename() {
        assert_eq!(original_filename("https://example.com/files/a.zip"), "a.zip");
        assert_eq!(
            original_filename("https://example.com/files/a.zip?token=1#frag"),
            "a.zip"
        );
        assert_eq!(original_filename("https://example.com/"), FALLBACK_FILENAME);
        assert_eq!(original_filename("https://example.com"), FALLBACK_FILENAME);
        assert_eq!(original_filename("not a url"), FALLBACK_FILENAME);
    }

    #[test]
    fn test_original_filename_keeps_escapes() {
        assert_eq!(
            original_filename("https://example.com/my%20file.iso"),
            "my%20file.iso"
        );
    }

    #[test]
    fn test_url_extension() {
        assert_eq!(url_extension("https://example.com/a.tar.gz"), ".gz");
        assert_eq!(url_extension("https://example.com/README"), "");
        assert_eq!(url_extension("https://example.com/"), "");
    }

    #[test]
    fn test_resolve_target_name() {
        let url = "https://example.com/dist/tool-1.2.zip";
        assert_eq!(resolve_target_name(url, None), "tool-1.2.zip");
        assert_eq!(resolve_target_name(url, Some("tool")), "tool.zip");
        assert_eq!(resolve_target_name(url, Some("tool.tgz")), "tool.tgz");
        assert_eq!(resolve_target_name(url, Some("  ")), "tool-1.2.zip");
        assert_eq!(
            resolve_target_name("https://example.com/bin", Some("mine")),
            "mine"
        );
    }

    #[test]
    fn test_requested_name_cannot_leave_directory() {
        let url = "https://example.com/dist/tool.zip";
        assert_eq!(resolve_target_name(url, Some("../../etc/passwd")), "passwd.zip");
        assert_eq!(resolve_target_name(url, Some("/abs/name.bin")), "name.bin");
        assert_eq!(resolve_target_name(url, Some("dir\\win.exe")), "win.exe");
        assert_eq!(resolve_target_name(url, Some("..")), "tool.zip");
        assert_eq!(resolve_target_name(url, Some("nested/")), "tool.zip");
    }

    #[test]
    fn test_published_url_is_plain_concatenation() {
        assert_eq!(published_url("http://cdn/files/", "a.zip"), "http://cdn/files/a.zip");
        assert_eq!(published_url("http://cdn", "a.zip"), "http://cdna.zip");
        assert_eq!(published_url("", "a.zip"), "a.zip");
    }
}
