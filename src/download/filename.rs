//! Destination naming for selected images.
//!
//! `<category dir>/<NN>_<slug>.<ext>`, where `NN` is the 1-based position in
//! the category, `slug` is the title without its `File:` prefix reduced to
//! lowercase ASCII alphanumeric runs joined by `_` (at most 80 characters),
//! and `ext` comes from the URL, then the MIME type, then `.img`.

use std::path::{Path, PathBuf};

use url::Url;

use crate::metadata::FILE_TITLE_PREFIX;

/// Maximum length of the title slug.
pub const MAX_SLUG_LEN: usize = 80;

/// Extension used when neither URL nor MIME type yields a known one.
pub const FALLBACK_EXTENSION: &str = ".img";

/// Slug used for titles with no alphanumeric content.
const EMPTY_SLUG: &str = "category";

/// URL suffixes accepted as-is.
const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".webp", ".tif", ".tiff", ".gif", ".bmp",
];

/// Builds the destination path for the `index`-th (1-based) image of a category.
#[must_use]
pub fn destination_path(
    category_dir: &Path,
    index: usize,
    title: &str,
    file_url: &str,
    mime: &str,
) -> PathBuf {
    let bare_title = title.strip_prefix(FILE_TITLE_PREFIX).unwrap_or(title);
    let slug: String = slugify(bare_title).chars().take(MAX_SLUG_LEN).collect();
    let extension = choose_extension(file_url, mime);
    category_dir.join(format!("{index:02}_{slug}{extension}"))
}

/// Lowercases `value` and joins its ASCII alphanumeric runs with `_`.
#[must_use]
pub fn slugify(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut pending_sep = false;
    for ch in value.trim().chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('_');
            }
            out.push(ch);
            pending_sep = false;
        } else {
            pending_sep = true;
        }
    }
    if out.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        out
    }
}

/// Picks the file extension: the URL's own suffix when it is a known image
/// extension, else one mapped from `mime`, else [`FALLBACK_EXTENSION`].
#[must_use]
pub fn choose_extension(file_url: &str, mime: &str) -> &'static str {
    extension_from_url(file_url)
        .or_else(|| extension_from_mime(mime))
        .unwrap_or(FALLBACK_EXTENSION)
}

fn extension_from_url(file_url: &str) -> Option<&'static str> {
    let path = match Url::parse(file_url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => file_url.split(['?', '#']).next().unwrap_or("").to_string(),
    };
    let last_segment = path.rsplit('/').next()?;
    let dot_index = last_segment.rfind('.')?;
    let ext = last_segment[dot_index..].to_ascii_lowercase();
    IMAGE_EXTENSIONS.iter().copied().find(|known| *known == ext)
}

fn extension_from_mime(mime: &str) -> Option<&'static str> {
    let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" => Some(".jpg"),
        "image/png" => Some(".png"),
        "image/webp" => Some(".webp"),
        "image/gif" => Some(".gif"),
        "image/tiff" => Some(".tif"),
        "image/bmp" => Some(".bmp"),
        _ => None,
    }
}
