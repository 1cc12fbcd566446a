use std::ffi::OsStr;
use std::path::Path;
use url::Url;
use uuid::Uuid;

pub const SUPPORTED_EXTENSIONS: [&str; 4] = ["wav", "mp3", "ogg", "flac"];
pub const FALLBACK_EXTENSION: &str = "wav";

/// Picks the storage filename for `url`.
///
/// The last path segment, percent-decoded, is kept when it carries a
/// supported audio extension (case-insensitive). Anything else gets a fresh
/// token with a `.wav` extension, whatever the real encoding of the bytes
/// turns out to be.
pub fn derive_filename(url: &Url) -> String {
    let raw = url
        .path_segments()
        .and_then(|segments| segments.last())
        .unwrap_or("");

    match urlencoding::decode(raw) {
        Ok(candidate) if is_plain_file_name(&candidate) && has_supported_extension(&candidate) => {
            candidate.into_owned()
        }
        _ => generated_filename(),
    }
}

pub fn generated_filename() -> String {
    format!("{}.{FALLBACK_EXTENSION}", Uuid::new_v4().simple())
}

fn has_supported_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(OsStr::to_str)
        .map(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
        .unwrap_or(false)
}

// A segment must name a file directly under the storage dir.
fn is_plain_file_name(name: &str) -> bool {
    !name.contains(['/', '\\']) && Path::new(name).file_name() == Some(OsStr::new(name))
}
