//! CLI tool for xlconvert - converts a tab-delimited file to XLSX
//!
//! Usage:
//!   xlconvert_cli <input.csv>                          # Whole table → converted_file.xlsx
//!   xlconvert_cli <input.csv> --start 2 --end 10 -o out
//!   xlconvert_cli <input.csv> --encoding gb18030 --preview 5
//!   xlconvert_cli <input.csv> --json                   # Inspection report as JSON

use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use xlconvert::encoding::SELECTOR_OPTIONS;
use xlconvert::{ConvertError, ConvertOptions, Diagnostics, EncodingChoice, RangeInput, Session};

type TryInitError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Parser)]
#[command(name = "xlconvert_cli", version, about = "Convert a tab-delimited file of unknown encoding to XLSX")]
struct Args {
    /// Input file (tab-delimited, any encoding)
    input: PathBuf,

    /// Encoding to try first; "Auto-detect" sniffs and falls back only
    #[arg(short, long, default_value = "Auto-detect", value_parser = parse_choice)]
    encoding: EncodingChoice,

    /// First row to export (1-based, default 1)
    #[arg(long, allow_negative_numbers = true)]
    start: Option<i64>,

    /// Last row to export (1-based, default last row)
    #[arg(long, allow_negative_numbers = true)]
    end: Option<i64>,

    /// Output file name; ".xlsx" is appended when missing
    #[arg(short, long, default_value = "")]
    output: String,

    /// Directory the workbook is written to
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// JSON options file (fallback encodings, sheet name, ...)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print this many rows of the loaded table instead of exporting
    #[arg(long)]
    preview: Option<usize>,

    /// Print the inspection report as JSON instead of exporting
    #[arg(long)]
    json: bool,

    /// More logging (repeat for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_choice(value: &str) -> Result<EncodingChoice, String> {
    Ok(EncodingChoice::parse(value))
}

fn init_tracing(verbose: u8) -> Result<(), TryInitError> {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
}

fn main() -> ExitCode {
    let args = Args::parse();
    if let Err(e) = init_tracing(args.verbose) {
        eprintln!("Warning: logging disabled: {e}");
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(ConvertError::Exhausted { attempts }) => {
            eprint!("{}", Diagnostics::from_attempts(&attempts));
            eprintln!("Try one of: {}", SELECTOR_OPTIONS.join(", "));
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> xlconvert::error::Result<()> {
    let mut options = match &args.config {
        Some(path) => ConvertOptions::from_path(path)?,
        None => ConvertOptions::default(),
    };
    if let Some(n) = args.preview {
        options.preview_rows = n;
    }

    let data = fs::read(&args.input)?;
    let session = Session::new(data, options);
    eprintln!("Detected encoding: {}", session.sniffed_display());

    if args.json {
        let inspection = session.inspect(&args.encoding);
        let json = serde_json::to_string_pretty(&inspection)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        writeln!(stdout)?;
        return Ok(());
    }

    let loaded = session.load(&args.encoding)?;
    eprintln!("Loaded with encoding: {}", loaded.encoding());
    eprintln!("{}", loaded.summary());

    if args.preview.is_some() {
        let mut stdout = io::stdout();
        writeln!(stdout, "{}", loaded.table().columns.join("\t"))?;
        for row in loaded.preview() {
            let line: Vec<String> = row.iter().map(ToString::to_string).collect();
            writeln!(stdout, "{}", line.join("\t"))?;
        }
        return Ok(());
    }

    let range = RangeInput {
        start: args.start,
        end: args.end,
    };
    let download = loaded.export(range, &args.output)?;
    let path = args.out_dir.join(&download.file_name);
    fs::write(&path, &download.bytes)?;
    eprintln!("Written: {} ({})", path.display(), download.mime);
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_second_tracing_init_reports_error() {
        let _first = init_tracing(0);
        assert!(init_tracing(1).is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "xlconvert_cli",
            "data.csv",
            "-e",
            "gb18030",
            "--start",
            "-2",
            "-o",
            "out",
        ])
        .unwrap();
        assert_eq!(args.encoding, EncodingChoice::Explicit("gb18030".into()));
        assert_eq!(args.start, Some(-2));
        assert_eq!(args.output, "out");
        assert!(!args.json);
    }
}
