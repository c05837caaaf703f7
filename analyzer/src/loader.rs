// loader.rs — Loading modules from their JSON interchange form
//
// The JSON form is a direct serde mapping of `HloModule`; see the type
// definitions in `hlo.rs`, `shape.rs`, `sharding.rs` and `alias.rs` for the
// field names.

use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use crate::hlo::HloModule;

/// Errors that can occur while loading a module.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: invalid module: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse a module from JSON text.
pub fn parse_module(text: &str) -> Result<HloModule, serde_json::Error> {
    serde_json::from_str(text)
}

/// A loaded module together with the exact text it was parsed from.
#[derive(Debug)]
pub struct LoadedModule {
    pub module: HloModule,
    pub source: String,
}

/// Read and parse a module file.
pub fn load_module(path: &Path) -> Result<LoadedModule, LoadError> {
    let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let module = parse_module(&source).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        "loaded module '{}' from {} ({} computation(s))",
        module.name,
        path.display(),
        module.computations.len()
    );
    Ok(LoadedModule { module, source })
}
