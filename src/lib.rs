//! The Ix compiler driver.
//!
//! The driver validates the command line configuration, runs each input
//! file through the pipeline (lex, parse, extract a
//! [`SourceUnit`][ix_ast::SourceUnit]), merges the units into a
//! [`UnitCollection`][ix_ast::UnitCollection], and hands the collection
//! to the selected target emitter.
//!
//! Syntax diagnostics are rendered to standard output and are never
//! fatal; configuration and I/O errors are fatal and map to exit code
//! 255 (POSIX -1) in the binary.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use clap::Parser;
use codespan_reporting::files::SimpleFile;
use codespan_reporting::term;
use codespan_reporting::term::termcolor::ColorChoice;
use codespan_reporting::term::termcolor::StandardStream;
use ix_ast::SourceUnit;
use ix_ast::UnitCollection;
use ix_emit::Target;
use ix_grammar::Diagnostic;

/// A source-to-source compiler for the Ix language.
#[derive(Parser, Debug, Default)]
#[command(name = "ixc", version)]
pub struct Args {
    /// The directory to write the generated sources into.
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// The target language to emit (only `C` is supported).
    #[arg(long = "target-language", value_name = "LANG")]
    pub target_language: Option<String>,

    /// Parse and analyze the sources without writing any output.
    #[arg(long = "dry-run")]
    pub dry_run: bool,

    /// The Ix source files to compile.
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

/// Represents a fatal driver error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No output directory was provided.
    #[error("no output directory was provided")]
    MissingOutputDir,
    /// No target language was provided.
    #[error("no target language was provided")]
    MissingTargetLanguage,
    /// The output directory does not exist or is not writable.
    #[error("output directory `{path}` does not exist or is not writable", path = .0.display())]
    BadOutputDir(PathBuf),
    /// The requested target language is not supported.
    #[error(transparent)]
    UnsupportedTarget(#[from] ix_emit::UnsupportedTarget),
    /// No source files were provided.
    #[error("no source files were provided")]
    NoSourceFiles,
    /// A source file could not be read.
    #[error("source file `{path}` could not be read", path = .path.display())]
    UnreadableSource {
        /// The path of the unreadable file.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// The emitter could not write its output.
    #[error(transparent)]
    Emit(#[from] ix_emit::Error),
}

/// Runs a compilation with the given arguments.
pub fn run(args: &Args) -> Result<(), Error> {
    let output_dir = args.output_dir.as_ref().ok_or(Error::MissingOutputDir)?;
    let target: Target = args
        .target_language
        .as_ref()
        .ok_or(Error::MissingTargetLanguage)?
        .parse()?;

    if !is_writable_dir(output_dir) {
        return Err(Error::BadOutputDir(output_dir.clone()));
    }

    if args.files.is_empty() {
        return Err(Error::NoSourceFiles);
    }

    let mut collection = UnitCollection::new();
    for path in &args.files {
        let source = fs::read_to_string(path).map_err(|source| Error::UnreadableSource {
            path: path.clone(),
            source,
        })?;

        let (unit, diagnostics) = SourceUnit::parse(path, &source);
        tracing::debug!(
            path = %path.display(),
            unit = %unit.full_name(),
            diagnostics = diagnostics.len(),
            "parsed source unit"
        );
        report_diagnostics(path, &source, &diagnostics);
        collection.add(unit);
    }

    if args.dry_run {
        tracing::info!("dry run requested; skipping emission");
        return Ok(());
    }

    let emitted = ix_emit::emit(target, &collection, output_dir)?;
    tracing::info!(
        header = %emitted.header.display(),
        implementation = %emitted.implementation.display(),
        "emission complete"
    );

    Ok(())
}

/// Determines if the path is an existing, writable directory.
fn is_writable_dir(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(metadata) => metadata.is_dir() && !metadata.permissions().readonly(),
        Err(_) => false,
    }
}

/// Renders parse diagnostics for a file to standard output.
fn report_diagnostics(path: &Path, source: &str, diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }

    let file = SimpleFile::new(path.display().to_string(), source);
    let config = term::Config::default();
    let writer = StandardStream::stdout(ColorChoice::Auto);
    let mut writer = writer.lock();
    for diagnostic in diagnostics {
        if term::emit(&mut writer, &config, &file, &diagnostic.to_codespan()).is_err() {
            break;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Creates arguments for a compilation into the given directory.
    fn args(output_dir: &Path, files: Vec<PathBuf>) -> Args {
        Args {
            output_dir: Some(output_dir.to_path_buf()),
            target_language: Some("C".to_string()),
            dry_run: false,
            files,
        }
    }

    /// Writes a source file under `<root>/source/ix.base/`.
    fn write_source(root: &Path, name: &str, contents: &str) -> PathBuf {
        let dir = root.join("source").join("ix.base");
        fs::create_dir_all(&dir).expect("should create the source directory");
        let path = dir.join(name);
        fs::write(&path, contents).expect("should write the source file");
        path
    }

    #[test]
    fn missing_output_dir() {
        let result = run(&Args::default());
        assert!(matches!(result, Err(Error::MissingOutputDir)));
    }

    #[test]
    fn missing_target_language() {
        let dir = tempfile::tempdir().expect("should create a temporary directory");
        let result = run(&Args {
            output_dir: Some(dir.path().to_path_buf()),
            ..Args::default()
        });
        assert!(matches!(result, Err(Error::MissingTargetLanguage)));
    }

    #[test]
    fn unsupported_target_language() {
        let dir = tempfile::tempdir().expect("should create a temporary directory");
        let result = run(&Args {
            output_dir: Some(dir.path().to_path_buf()),
            target_language: Some("Rust".to_string()),
            ..Args::default()
        });
        assert!(matches!(result, Err(Error::UnsupportedTarget(_))));
    }

    #[test]
    fn nonexistent_output_dir() {
        let dir = tempfile::tempdir().expect("should create a temporary directory");
        let missing = dir.path().join("missing");
        let result = run(&args(&missing, vec![]));
        assert!(matches!(result, Err(Error::BadOutputDir(_))));
    }

    #[test]
    fn no_source_files() {
        let dir = tempfile::tempdir().expect("should create a temporary directory");
        let result = run(&args(dir.path(), vec![]));
        assert!(matches!(result, Err(Error::NoSourceFiles)));
    }

    #[test]
    fn missing_source_file() {
        let dir = tempfile::tempdir().expect("should create a temporary directory");
        let result = run(&args(dir.path(), vec![dir.path().join("missing.ix")]));
        assert!(matches!(result, Err(Error::UnreadableSource { .. })));
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = tempfile::tempdir().expect("should create a temporary directory");
        let source = write_source(dir.path(), "Thing.ix", "public class { }\n");
        let out = dir.path().join("out");
        fs::create_dir_all(&out).expect("should create the output directory");

        let result = run(&Args {
            dry_run: true,
            ..args(&out, vec![source])
        });
        assert!(result.is_ok(), "dry run failed: {result:?}");
        assert!(!out.join("include").exists());
        assert!(!out.join("c").exists());
    }

    #[test]
    fn compilation_writes_both_files() {
        let dir = tempfile::tempdir().expect("should create a temporary directory");
        let source = write_source(
            dir.path(),
            "Thing.ix",
            "public class { @name: string* }\npublic get( ): string*\n{\n return @name\n}\n",
        );
        let out = dir.path().join("out");
        fs::create_dir_all(&out).expect("should create the output directory");

        run(&args(&out, vec![source])).expect("compilation should succeed");

        let header = fs::read_to_string(out.join("include").join("ix.base.h"))
            .expect("header should exist");
        assert!(header.contains("typedef struct _ix_base_Thing ix_base_Thing;"));
        assert!(header.contains("ix_base_Thing__get"));

        let implementation =
            fs::read_to_string(out.join("c").join("ix.base.c")).expect("source should exist");
        assert!(
            implementation.contains("\treturn self->name;\n"),
            "implementation was:\n{implementation}"
        );
    }
}
