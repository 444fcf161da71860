//! `crcgen` — reads CRC models from stdin (or a file), generates a
//! standalone Rust source per model, and writes `<outdir>/<slug>.rs` for
//! each. Thin driver over [`crc_rocksoft::parse`] and
//! [`crc_rocksoft::codegen`]; see §6.3 of the design doc for the CLI
//! contract this mirrors.

use clap::Parser;
use crc_rocksoft::codegen::{self, GenOptions, WordBits};
use crc_rocksoft::model::Model;
use crc_rocksoft::parse::{self, Leniency, ParseError};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;

/// Generate standalone CRC implementations from a catalogue of models.
#[derive(Debug, Parser)]
#[clap(name = "crcgen", version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Directory to write generated `<slug>.rs` files into.
    #[clap(long, short, default_value = "out")]
    outdir: PathBuf,

    /// Input file of `name=value ...` model lines; reads stdin if omitted.
    #[clap(long, short)]
    input: Option<PathBuf>,

    /// Emit little-endian wordwise tables (default). Only affects which of
    /// the two equivalent lane-index enumerations `crc_word` uses (see
    /// `wordwise::merge_group`'s doc comment); the CRC it produces is the
    /// same either way.
    #[clap(long, conflicts_with = "big")]
    little: bool,

    /// Emit big-endian wordwise tables. See `--little`.
    #[clap(long, conflicts_with = "little")]
    big: bool,

    /// Target native word width for combine-table literals: 32 or 64.
    #[clap(long, default_value_t = 64, value_parser = clap::value_parser!(u32).range(32..=64))]
    word_bits: u32,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("reading input: {0}")]
    Io(#[from] io::Error),
    #[error("creating output directory {0:?}: {1}")]
    CreateDir(PathBuf, #[source] io::Error),
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(warnings) => {
            if warnings > 0 {
                log::warn!("completed with {warnings} non-fatal warning(s)");
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("crcgen: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Runs the generator end to end, returning the number of non-fatal
/// warnings encountered (unusable model lines, pre-existing output
/// files). A return of `Err` means a fatal condition: I/O failure other
/// than "file exists", or failure to create the output directory.
fn run(cli: &Cli) -> Result<usize, CliError> {
    let lines = read_input(cli.input.as_deref())?;

    fs::create_dir_all(&cli.outdir).map_err(|e| CliError::CreateDir(cli.outdir.clone(), e))?;

    let word_bits = if cli.word_bits <= 32 { WordBits::W32 } else { WordBits::W64 };
    let opts = GenOptions {
        word_bits,
        little: !cli.big,
    };

    let mut warnings = 0usize;
    for (lineno, line) in lines.iter().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("//") {
            continue;
        }
        match parse::parse_line(line, Leniency::Lenient) {
            Ok(raw) => {
                if let Err(e) = process_model(&raw, &opts, &cli.outdir) {
                    log::warn!("line {}: {e}", lineno + 1);
                    warnings += 1;
                }
            }
            Err(ParseError::Invalid(faults)) => {
                for fault in &faults {
                    log::warn!("line {}: {fault}", lineno + 1);
                }
                warnings += 1;
            }
            Err(ParseError::Missing(fields)) => {
                log::warn!("line {}: missing required field(s): {}", lineno + 1, fields.join(", "));
                warnings += 1;
            }
        }
    }

    Ok(warnings)
}

/// Validates, normalises, generates, and writes the source for one model.
/// Returns an error string describing why this single model was skipped —
/// the caller logs it as a warning and continues with the next line, per
/// §7's "unusable models encountered non-fatally produce warnings".
fn process_model(
    raw: &crc_rocksoft::RawModel,
    opts: &GenOptions,
    outdir: &std::path::Path,
) -> Result<(), String> {
    raw.validate().map_err(|e| e.to_string())?;
    let model = Model::normalize(raw);

    let width = model.width as u32;
    let max = match opts.word_bits {
        WordBits::W32 => 2 * 32,
        WordBits::W64 => 2 * 64,
    };
    if width > max {
        return Err(format!("width {width} exceeds {max}, skipping"));
    }

    let generated = codegen::generate(&model, opts).map_err(|e| e.to_string())?;
    let path = outdir.join(&generated.file_name);
    if path.exists() {
        return Err(format!("{} already exists, skipping", path.display()));
    }

    let mut f = fs::File::create(&path).map_err(|e| e.to_string())?;
    f.write_all(generated.source.as_bytes()).map_err(|e| e.to_string())?;
    log::debug!("wrote {}", path.display());
    Ok(())
}

fn read_input(path: Option<&std::path::Path>) -> io::Result<Vec<String>> {
    match path {
        Some(p) => {
            let contents = fs::read_to_string(p)?;
            Ok(contents.lines().map(str::to_string).collect())
        }
        None => {
            let stdin = io::stdin();
            let mut lines = Vec::new();
            for line in stdin.lock().lines() {
                lines.push(line?);
            }
            Ok(lines)
        }
    }
}
