//! Category table: ordered `(key, query)` pairs.
//!
//! The key names the output folder; the query is sent to the search API.
//! Iteration order is the file (or table) order.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config_syntax::{self, SyntaxError};

/// Built-in table used when no categories file is given.
const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("broken_window", "broken window"),
    ("cracked_screen", "cracked screen phone"),
    ("pothole", "pothole road"),
    ("broken_chair", "broken chair"),
    ("rust_corrosion", "rust corrosion metal"),
    ("broken_pipe", "broken pipe leak"),
    ("damaged_sign", "damaged road sign"),
    ("broken_sidewalk", "cracked sidewalk pavement"),
    ("broken_keyboard", "broken keyboard"),
    ("broken_appliance", "broken washing machine appliance"),
];

/// One configured category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    key: String,
    query: String,
}

impl Category {
    /// Creates a category after checking the key is usable as a folder name.
    ///
    /// # Errors
    ///
    /// Returns [`CategoryError::InvalidKey`] for empty keys or keys with
    /// characters outside `[a-z0-9_-]`, and [`CategoryError::EmptyQuery`]
    /// for a blank query.
    pub fn new(key: impl Into<String>, query: impl Into<String>) -> Result<Self, CategoryError> {
        let key = key.into();
        let query = query.into();
        if !is_valid_key(&key) {
            return Err(CategoryError::InvalidKey { key });
        }
        if query.trim().is_empty() {
            return Err(CategoryError::EmptyQuery { key });
        }
        Ok(Self { key, query })
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }
}

fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
}

/// Errors from building or loading the category table.
#[derive(Debug, Error)]
pub enum CategoryError {
    #[error("invalid category key `{key}`: expected non-empty [a-z0-9_-]")]
    InvalidKey { key: String },

    #[error("category `{key}` has an empty query")]
    EmptyQuery { key: String },

    #[error("duplicate category key `{key}` on line {line}")]
    DuplicateKey { key: String, line: usize },

    #[error(transparent)]
    Malformed(SyntaxError),

    #[error("invalid value on line {line}: {source}")]
    Syntax {
        line: usize,
        #[source]
        source: SyntaxError,
    },

    #[error("categories file {path} defines no categories")]
    Empty { path: PathBuf },

    #[error("failed to read categories file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The built-in ten-entry table.
#[must_use]
pub fn default_categories() -> Vec<Category> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(key, query)| Category {
            key: (*key).to_string(),
            query: (*query).to_string(),
        })
        .collect()
}

/// Parses `key = "query"` lines.
///
/// # Errors
///
/// Returns [`CategoryError`] on malformed lines, invalid keys or duplicates.
pub fn parse_categories_str(raw: &str) -> Result<Vec<Category>, CategoryError> {
    let mut categories = Vec::new();
    let mut keys = HashSet::new();

    for assignment in config_syntax::assignments(raw) {
        let assignment = assignment.map_err(CategoryError::Malformed)?;

        let query = config_syntax::parse_string_literal(assignment.value).map_err(|source| {
            CategoryError::Syntax {
                line: assignment.line,
                source,
            }
        })?;

        if !keys.insert(assignment.key.to_string()) {
            return Err(CategoryError::DuplicateKey {
                key: assignment.key.to_string(),
                line: assignment.line,
            });
        }
        categories.push(Category::new(assignment.key, query)?);
    }

    Ok(categories)
}

/// Reads and parses a categories file. An empty table is an error.
///
/// # Errors
///
/// Returns [`CategoryError`] if the file cannot be read or parsed, or defines
/// no categories.
pub fn load_categories_file(path: &Path) -> Result<Vec<Category>, CategoryError> {
    let raw = std::fs::read_to_string(path).map_err(|source| CategoryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let categories = parse_categories_str(&raw)?;
    if categories.is_empty() {
        return Err(CategoryError::Empty {
            path: path.to_path_buf(),
        });
    }
    Ok(categories)
}
