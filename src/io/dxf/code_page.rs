//! `$DWGCODEPAGE` names → text encodings
//!
//! Drawings saved before AutoCAD 2007 store text in the code page named by the
//! header; later versions are always UTF-8 and never consult this table.

use ahash::AHashMap;
use encoding_rs::Encoding;
use once_cell::sync::Lazy;

static CODE_PAGES: Lazy<AHashMap<&'static str, &'static Encoding>> = Lazy::new(|| {
    let mut map: AHashMap<&'static str, &'static Encoding> = AHashMap::new();
    let table: &[(&[&'static str], &'static Encoding)] = &[
        (&["ansi_874"], encoding_rs::WINDOWS_874),
        (&["ansi_932"], encoding_rs::SHIFT_JIS),
        (&["ansi_936", "gb2312"], encoding_rs::GBK),
        (&["ansi_949", "korean", "johab"], encoding_rs::EUC_KR),
        (&["ansi_950", "big5"], encoding_rs::BIG5),
        (&["ansi_1250", "dos852", "iso8859-2"], encoding_rs::WINDOWS_1250),
        (&["ansi_1251", "iso8859-5"], encoding_rs::WINDOWS_1251),
        (
            &["ansi_1252", "dos850", "dos860", "dos863", "dos865", "iso8859-1"],
            encoding_rs::WINDOWS_1252,
        ),
        (&["ansi_1253", "dos869", "iso8859-7"], encoding_rs::WINDOWS_1253),
        (&["ansi_1254", "dos857", "iso8859-9"], encoding_rs::WINDOWS_1254),
        (&["ansi_1255", "iso8859-8"], encoding_rs::WINDOWS_1255),
        (&["ansi_1256", "iso8859-6"], encoding_rs::WINDOWS_1256),
        (&["ansi_1257"], encoding_rs::WINDOWS_1257),
        (&["ansi_1258"], encoding_rs::WINDOWS_1258),
        (&["dos866", "dos855"], encoding_rs::IBM866),
        (&["koi8-r"], encoding_rs::KOI8_R),
        (&["koi8-u"], encoding_rs::KOI8_U),
        (&["iso8859-15"], encoding_rs::ISO_8859_15),
    ];
    for (names, encoding) in table {
        for name in names.iter() {
            map.insert(*name, *encoding);
        }
    }
    map
});

/// Encoding for a header code page name, case-insensitive
///
/// `None` means the text is already UTF-8 (or ASCII). Unknown names fall back
/// to Windows-1252, the code page of most Western drawings.
pub fn encoding_from_code_page(code_page: &str) -> Option<&'static Encoding> {
    let name = code_page.trim().to_ascii_lowercase().replace("iso_", "iso");
    match name.as_str() {
        "" | "ascii" | "utf-8" | "utf8" | "unicode" => None,
        other => Some(
            CODE_PAGES
                .get(other)
                .copied()
                .unwrap_or(encoding_rs::WINDOWS_1252),
        ),
    }
}
