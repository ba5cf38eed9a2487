//! Loader for RON arena files.

use std::fs;
use std::path::Path;

use bevy::prelude::*;
use ron::Options;
use thiserror::Error;

use super::data::ArenaDef;

/// Error type for content loading failures.
#[derive(Debug, Error)]
pub enum ContentLoadError {
    #[error("failed to read {file}: {source}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {file}: {source}")]
    Parse {
        file: String,
        #[source]
        source: ron::error::SpannedError,
    },
}

/// Create RON options with extensions enabled for more flexible parsing.
fn ron_options() -> Options {
    Options::default().with_default_extension(ron::extensions::Extensions::IMPLICIT_SOME)
}

/// Parse an arena from RON text. `file` only labels errors.
pub fn parse_arena(contents: &str, file: &str) -> Result<ArenaDef, ContentLoadError> {
    ron_options()
        .from_str(contents)
        .map_err(|source| ContentLoadError::Parse {
            file: file.to_string(),
            source,
        })
}

pub fn load_arena(path: &Path) -> Result<ArenaDef, ContentLoadError> {
    let file = path.display().to_string();
    let contents = fs::read_to_string(path).map_err(|source| ContentLoadError::Io {
        file: file.clone(),
        source,
    })?;

    let arena = parse_arena(&contents, &file)?;
    info!(
        "Loaded arena '{}' from {}: {} static boxes, {} crates, {} script steps",
        arena.name,
        file,
        arena.static_boxes.len(),
        arena.crates.len(),
        arena.script.len()
    );
    Ok(arena)
}
