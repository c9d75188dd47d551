//! Text encodings used by table files.

use encoding_rs::Encoding;

/// Maps a DOS/Windows code page stored in a table header to an encoding.
///
/// Returns `None` for pages without a codec (437, 850 and unknown pages);
/// callers fall back to the configured charset.
pub fn encoding_for_code_page(code_page: u16) -> Option<&'static Encoding> {
    let label = match code_page {
        866 => "ibm866",
        874 => "windows-874",
        932 => "shift_jis",
        936 => "gbk",
        949 => "euc-kr",
        950 => "big5",
        1250..=1258 => return Encoding::for_label(format!("windows-{code_page}").as_bytes()),
        _ => return None,
    };
    Encoding::for_label(label.as_bytes())
}

/// Resolves a charset label such as `windows-1252` or `utf8`.
pub fn resolve_charset(label: &str) -> Option<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
}

/// Decodes bytes up to the first NUL; trailing padding is dropped.
pub fn decode_text(encoding: &'static Encoding, bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    let (text, _, _) = encoding.decode(&bytes[..end]);
    text.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_page_mapping() {
        assert_eq!(encoding_for_code_page(1252), Some(encoding_rs::WINDOWS_1252));
        assert_eq!(encoding_for_code_page(1251), Some(encoding_rs::WINDOWS_1251));
        assert_eq!(encoding_for_code_page(866), Some(encoding_rs::IBM866));
        assert_eq!(encoding_for_code_page(932), Some(encoding_rs::SHIFT_JIS));
        assert_eq!(encoding_for_code_page(437), None);
    }

    #[test]
    fn test_decode_text_stops_at_nul() {
        let text = decode_text(encoding_rs::WINDOWS_1252, b"Caf\xe9\0\0\0");
        assert_eq!(text, "Café");
        assert_eq!(decode_text(encoding_rs::WINDOWS_1252, b"\0\0"), "");
    }

    #[test]
    fn test_resolve_charset() {
        assert_eq!(resolve_charset("utf8"), Some(encoding_rs::UTF_8));
        assert!(resolve_charset("no-such-charset").is_none());
    }
}
