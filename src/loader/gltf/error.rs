use std::{error::Error, io, path::PathBuf};

use thiserror::Error;

use crate::scene::SceneError;

use super::{scheme::SchemeError, ParseState};

/// Fatal glTF parse failures. Recoverable problems are logged and the
/// affected data is left out instead.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("parser is in state {0}, reset it before parsing again")]
    NotReset(ParseState),
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("bad GLB container: {0}")]
    Glb(#[from] ::gltf::Error),
    #[error("bad glTF document: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bad URI of buffer #{index}: {source}")]
    Scheme {
        index: usize,
        #[source]
        source: SchemeError,
    },
    #[error("failed to fetch buffer #{index} from {uri}: {source}")]
    Fetch {
        index: usize,
        uri: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    #[error("{context} references missing node #{node}")]
    MissingNode { context: String, node: usize },
    #[error(transparent)]
    Scene(#[from] SceneError),
}
