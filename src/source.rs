use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;

pub const EXTENSION: &str = "jif";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Jiffy files must have extension .jif, got {}", .path.display())]
    WrongExtension { path: PathBuf },

    #[error("Could not read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// What a console entry refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Inline(String),
    File(PathBuf),
}

/// Text starting with a function declaration is a program, anything else
/// names a program file.
pub fn classify(entry: &str) -> Entry {
    if entry.starts_with("fun ") {
        Entry::Inline(entry.to_owned())
    } else {
        Entry::File(PathBuf::from(entry.trim()))
    }
}

/// Reads a whole program file. The extension is checked before the file is
/// touched.
pub fn load_program(path: impl AsRef<Path>) -> Result<String, SourceError> {
    let path = path.as_ref();
    if path.extension().map_or(true, |extension| extension != EXTENSION) {
        return Err(SourceError::WrongExtension { path: path.to_owned() });
    }

    std::fs::read_to_string(path).map_err(|source| SourceError::Io { path: path.to_owned(), source })
}

pub fn read_entry(entry: &str) -> Result<String, SourceError> {
    match classify(entry) {
        Entry::Inline(program) => Ok(program),
        Entry::File(path) => load_program(path),
    }
}
