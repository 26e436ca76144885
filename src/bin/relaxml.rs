//! Command-line converter between markup and JSON.
//!
//! Parses each input (markup, JSON, or sniffed), optionally reports the
//! recovery warnings, and writes the document back out as markup or JSON.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use relaxml::encoding::decode_to_utf8;
use relaxml::serial::{to_json_with_options, to_markup_with_options};
use relaxml::{
    parse_auto, parse_json_with_options, parse_str_with_options, Document, Error, ParseOptions,
    WriteOptions,
};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// relaxml -- parse forgiving markup or JSON and convert between them.
#[derive(Parser, Debug)]
#[command(name = "relaxml", version, about, long_about = None)]
#[allow(clippy::struct_excessive_bools)]
struct Cli {
    /// Input files (use `-` for stdin; stdin if none are given).
    files: Vec<String>,

    // -- Input -------------------------------------------------------------
    /// Input format; `auto` picks JSON when the input starts with `{` or `[`.
    #[arg(long, value_enum, default_value_t = InputFormat::Auto)]
    from: InputFormat,

    /// Element names compare case-insensitively.
    #[arg(long)]
    case_insensitive_elements: bool,

    /// Attribute names compare case-insensitively.
    #[arg(long)]
    case_insensitive_attributes: bool,

    /// Treat the HTML void elements (`br`, `img`, ...) as childless.
    #[arg(long)]
    html_voids: bool,

    /// TOML file with `[parse]` and `[write]` tables. Flags override it.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    // -- Output ------------------------------------------------------------
    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Markup)]
    to: Format,

    /// Indent the output.
    #[arg(long)]
    pretty: bool,

    /// Write `<a></a>` instead of `<a />`.
    #[arg(long)]
    force_end_tag: bool,

    /// Do not write the converted document.
    #[arg(long)]
    noout: bool,

    /// Save output to a file instead of stdout.
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,

    // -- Diagnostics -------------------------------------------------------
    /// Print parser warnings to stderr.
    #[arg(long)]
    warnings: bool,

    /// Exit with status 2 if any input raised warnings.
    #[arg(long)]
    strict: bool,

    /// Log at debug level unless `RUST_LOG` says otherwise.
    #[arg(long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    Auto,
    Markup,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Markup,
    Json,
}

/// Contents of a `--config` file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    parse: ParseOptions,
    write: WriteOptions,
}

// ---------------------------------------------------------------------------
// Exit codes
// ---------------------------------------------------------------------------

const EXIT_SUCCESS: u8 = 0;
const EXIT_INPUT_ERROR: u8 = 1;
const EXIT_WARNINGS: u8 = 2;

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let (parse_opts, write_opts) = match load_options(&cli) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("relaxml: {e}");
            return ExitCode::from(EXIT_INPUT_ERROR);
        }
    };

    let files = if cli.files.is_empty() {
        vec!["-".to_string()]
    } else {
        cli.files.clone()
    };

    let mut worst_exit = EXIT_SUCCESS;
    let mut output = String::new();
    for file in &files {
        let exit = process_file(&cli, file, &parse_opts, &write_opts, &mut output);
        worst_exit = worst_exit.max(exit);
    }

    if !cli.noout {
        if let Err(e) = write_output(cli.output.as_deref(), &output) {
            eprintln!("relaxml: {e}");
            worst_exit = worst_exit.max(EXIT_INPUT_ERROR);
        }
    }

    ExitCode::from(worst_exit)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

/// Reads the config file, if any, and applies the command-line overrides.
fn load_options(cli: &Cli) -> Result<(ParseOptions, WriteOptions), Error> {
    let config = match &cli.config {
        Some(path) => read_config(path)?,
        None => ConfigFile::default(),
    };
    let mut parse = config.parse;
    let mut write = config.write;

    if cli.case_insensitive_elements {
        parse.element_case_sensitive = false;
    }
    if cli.case_insensitive_attributes {
        parse.attribute_case_sensitive = false;
    }
    if cli.html_voids {
        parse = parse.html_void_elements();
    }
    if cli.pretty {
        write.pretty = true;
    }
    if cli.force_end_tag {
        write.force_end_tag = true;
    }
    Ok((parse, write))
}

fn read_config(path: &Path) -> Result<ConfigFile, Error> {
    let text = fs::read_to_string(path)?;
    toml::from_str(&text).map_err(|e| Error::Config {
        message: format!("{}: {e}", path.display()),
    })
}

/// Processes a single input, appending its converted text to `output`, and
/// returns an exit code.
fn process_file(
    cli: &Cli,
    filename: &str,
    parse_opts: &ParseOptions,
    write_opts: &WriteOptions,
    output: &mut String,
) -> u8 {
    let bytes = match read_input(filename) {
        Ok(data) => data,
        Err(e) => {
            eprintln!("{filename}: failed to read: {e}");
            return EXIT_INPUT_ERROR;
        }
    };
    let text = match decode_to_utf8(&bytes) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("{filename}: {e}");
            return EXIT_INPUT_ERROR;
        }
    };

    let doc = parse(cli, &text, parse_opts);
    tracing::debug!(file = filename, warnings = doc.warnings.len(), "parsed input");

    if cli.warnings {
        for warning in &doc.warnings {
            eprintln!("{filename}: {warning}");
        }
    }

    if !cli.noout {
        let converted = match cli.to {
            Format::Markup => to_markup_with_options(&doc, write_opts),
            Format::Json => to_json_with_options(&doc, write_opts),
        };
        output.push_str(&converted);
        if !converted.ends_with('\n') {
            output.push('\n');
        }
    }

    if cli.strict && !doc.warnings.is_empty() {
        EXIT_WARNINGS
    } else {
        EXIT_SUCCESS
    }
}

fn parse(cli: &Cli, text: &str, opts: &ParseOptions) -> Document {
    match cli.from {
        InputFormat::Auto => parse_auto(text, opts),
        InputFormat::Markup => parse_str_with_options(text, opts),
        InputFormat::Json => parse_json_with_options(text, opts),
    }
}

fn read_input(filename: &str) -> io::Result<Vec<u8>> {
    if filename == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        fs::read(filename)
    }
}

fn write_output(path: Option<&Path>, content: &str) -> Result<(), Error> {
    match path {
        Some(path) => fs::write(path, content)?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
