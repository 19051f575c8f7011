//! CLI orchestrator: enumerates `.package` archives under a path, recompresses
//! or decompresses each one, and replaces it in place on success. Never halts
//! the batch on a single file's failure.

use clap::Parser;
use dbpf_recomp::archive::{Archive, Mode};
use dbpf_recomp::error::ArchiveError;
use dbpf_recomp::{reader, validator, writer};
use memmap2::Mmap;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

/// Recompresses or decompresses resources inside DBPF game-asset archives.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// A `.package` file, or a directory to walk recursively.
    path: PathBuf,

    /// Strip compression instead of recompressing.
    #[arg(short = 'd', long)]
    decompress: bool,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    if !cli.path.exists() {
        eprintln!("{}: no such file or directory", cli.path.display());
        std::process::exit(1);
    }

    let mode = if cli.decompress {
        Mode::Decompress
    } else {
        Mode::Recompress
    };

    let candidates = match enumerate(&cli.path) {
        Ok(candidates) => candidates,
        Err(err) => {
            eprintln!("{}: {err}", cli.path.display());
            std::process::exit(1);
        }
    };

    for path in candidates {
        process_one(&path, mode);
    }
}

fn enumerate(path: &Path) -> std::io::Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut out = Vec::new();
    for entry in WalkDir::new(path) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        let is_package = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("package"));
        if is_package {
            out.push(entry.into_path());
        }
    }
    Ok(out)
}

fn process_one(path: &Path, mode: Mode) {
    let display_path = path.display().to_string();
    let span = tracing::info_span!("archive", path = %display_path);
    let _enter = span.enter();

    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) => return report_io_error(&display_path, &err),
    };
    let mmap = match unsafe { Mmap::map(&file) } {
        Ok(mmap) => mmap,
        Err(err) => return report_io_error(&display_path, &err),
    };
    let source: &[u8] = &mmap;

    let archive = reader::read(source, mode, &display_path);
    if !archive.unpacked {
        println!("{display_path}: failed to parse as a DBPF archive");
        return;
    }

    if mode == Mode::Recompress && archive.signature_present {
        println!("{display_path}: nothing to do");
        return;
    }

    match rewrite(path, source, &archive, mode) {
        Ok((old_size, new_size)) => {
            let delta = if old_size > 0 {
                (new_size as f64 - old_size as f64) / old_size as f64 * 100.0
            } else {
                0.0
            };
            println!("{display_path}: {old_size} -> {new_size} ({delta:+.1}%)");
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to rewrite archive");
            eprintln!("{display_path}: {err}");
        }
    }
}

fn rewrite(path: &Path, source: &[u8], archive: &Archive, mode: Mode) -> Result<(u64, u64), ArchiveError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut temp = NamedTempFile::new_in(dir)?;

    writer::write(&mut temp, source, archive, mode)?;
    temp.flush()?;

    let new_bytes = std::fs::read(temp.path())?;
    validator::validate(&new_bytes, source, archive, mode)?;

    let old_size = source.len() as u64;
    let new_size = new_bytes.len() as u64;
    temp.persist(path).map_err(|err| ArchiveError::Io(err.error))?;

    Ok((old_size, new_size))
}

fn report_io_error(display_path: &str, err: &std::io::Error) {
    tracing::error!(error = %err, "failed to open archive");
    eprintln!("{display_path}: {err}");
}
