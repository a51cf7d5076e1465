//! Error types shared by the parser, loader and registry

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Position of a token or record inside a script source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceLocation {
    /// File path or other label of the source text
    pub origin: String,
    /// 1-based line number
    pub line: usize,
    /// 1-based column number
    pub column: usize,
}

impl SourceLocation {
    /// Create a new location
    pub fn new(origin: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            origin: origin.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.origin, self.line, self.column)
    }
}

/// Material script errors
#[derive(Debug, Error)]
pub enum MaterialError {
    /// Malformed script text
    #[error("{location}: parse error: {message}")]
    Parse {
        /// Where the problem was found
        location: SourceLocation,
        /// Description of the problem
        message: String,
    },

    /// Property key outside the recognized set
    #[error("{location}: unknown property '{key}' in material '{material}'")]
    UnknownProperty {
        /// Material declaring the property
        material: String,
        /// Key as written in the script
        key: String,
        /// Location of the assignment
        location: SourceLocation,
    },

    /// Property value that does not decode to the key's type
    #[error("{location}: invalid value \"{value}\" for '{key}' in material '{material}': {reason}")]
    InvalidValue {
        /// Material declaring the property
        material: String,
        /// Key as written in the script
        key: String,
        /// Raw value text
        value: String,
        /// Why decoding failed
        reason: String,
        /// Location of the assignment
        location: SourceLocation,
    },

    /// Material name declared more than once
    #[error("duplicate material '{name}' at {second} (first declared at {first})")]
    DuplicateName {
        /// Material name
        name: String,
        /// Location of the first declaration
        first: SourceLocation,
        /// Location of the conflicting declaration
        second: SourceLocation,
    },

    /// Lookup of a name that is not registered
    #[error("material '{0}' not found")]
    NotFound(String),

    /// Filesystem failure
    #[error("IO error on {path:?}: {source}")]
    Io {
        /// Path being accessed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

impl MaterialError {
    /// Build a parse error at the given location
    pub fn parse(location: SourceLocation, message: impl Into<String>) -> Self {
        Self::Parse {
            location,
            message: message.into(),
        }
    }

    /// Build an IO error for a path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Source location the error points at, when it has one
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            Self::Parse { location, .. }
            | Self::UnknownProperty { location, .. }
            | Self::InvalidValue { location, .. } => Some(location),
            Self::DuplicateName { second, .. } => Some(second),
            Self::NotFound(_) | Self::Io { .. } => None,
        }
    }
}
