//! Target emitters for compiled Ix units.
//!
//! An emitter walks a [`UnitCollection`][ix_ast::UnitCollection] and
//! produces the output files for one target language. The only
//! supported target is C, which produces a header and an implementation
//! file per invocation; the design admits additional emitters behind
//! the [`Target`] selector.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use ix_ast::UnitCollection;

pub mod c;

/// Represents an error raised while writing emitter output.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An output directory could not be created.
    #[error("failed to create output directory `{path}`", path = .path.display())]
    CreateDir {
        /// The directory that could not be created.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// An output file could not be written.
    #[error("failed to write output file `{path}`", path = .path.display())]
    WriteFile {
        /// The file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
}

/// The paths of the files written by an emitter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedFiles {
    /// The path of the emitted header file.
    pub header: PathBuf,
    /// The path of the emitted implementation file.
    pub implementation: PathBuf,
}

/// Represents a target language.
///
/// Targets are selected by exact name match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The C target.
    C,
}

impl FromStr for Target {
    type Err = UnsupportedTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "C" => Ok(Self::C),
            _ => Err(UnsupportedTarget(s.to_string())),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::C => write!(f, "C"),
        }
    }
}

/// The error returned when a target language is not supported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported target language `{0}`")]
pub struct UnsupportedTarget(pub String);

/// Emits the collection for the given target into the output directory.
pub fn emit(
    target: Target,
    collection: &UnitCollection,
    output_dir: &std::path::Path,
) -> Result<EmittedFiles, Error> {
    match target {
        Target::C => c::emit(collection, output_dir),
    }
}
