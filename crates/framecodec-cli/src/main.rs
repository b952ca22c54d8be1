use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use framecodec_core::codec::convert::bytes_to_hex;
use framecodec_core::{CapturedFrame, Codec, Dissection, EncodeInput, FieldError};
use glob::glob;
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("FRAMECODEC_BUILD_COMMIT"),
    " ",
    env!("FRAMECODEC_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "framecodec")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Decode and build network frames layer by layer.",
    long_about = None,
    after_help = "Examples:\n  framecodec decode capture.pcapng -o frames.json\n  framecodec encode layers.json --pcap out.pcapng\n  framecodec schema tcp --pretty"
)]
struct Cli {
    /// Log codec internals (same as RUST_LOG=debug)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decode every frame of a capture file into JSON layers.
    #[command(alias = "dissect")]
    Decode {
        /// Path to a .pcap or .pcapng file
        input: PathBuf,

        /// Output path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        output: Option<PathBuf>,

        /// Write JSON to stdout
        #[arg(long, conflicts_with = "output")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Exit with a non-zero code if any field error was recorded
        #[arg(long)]
        strict: bool,
    },
    /// Build one packet from a JSON list of layers.
    Encode {
        /// JSON file holding `[{"id": "eth", "data": {...}}, ...]`
        input: PathBuf,

        /// Also write the packet as a single-frame pcapng
        #[arg(long, value_name = "OUT")]
        pcap: Option<PathBuf>,

        /// Exit with a non-zero code if any field error was recorded
        #[arg(long)]
        strict: bool,
    },
    /// Print registered protocol schemas as JSON.
    Schema {
        /// Protocol id (all protocols when omitted)
        id: Option<String>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Decode {
            input,
            output,
            stdout,
            pretty,
            compact,
            strict,
        } => cmd_decode(
            DecodeArgs {
                input,
                output,
                stdout,
                pretty,
                compact,
                strict,
            },
            cli.quiet,
        ),
        Commands::Encode {
            input,
            pcap,
            strict,
        } => cmd_encode(&input, pcap.as_deref(), strict, cli.quiet),
        Commands::Schema { id, pretty } => cmd_schema(id.as_deref(), pretty),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let default_level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{:#}", err), None)
    }
}

struct DecodeArgs {
    input: PathBuf,
    output: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    compact: bool,
    strict: bool,
}

fn cmd_decode(args: DecodeArgs, quiet: bool) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&args.input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;

    let output = if args.stdout {
        None
    } else {
        let output = args.output.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--output or --stdout".to_string()),
            )
        })?;
        ensure_distinct_output(&output, &input_abs)?;
        Some(output)
    };

    let dissection = framecodec_core::dissect_pcap_file(&resolved_input)
        .context("capture decoding failed")?;
    info!(
        frames = dissection.summary.frames_total,
        skipped = dissection.summary.frames_skipped,
        "capture decoded"
    );
    let json = serialize_json(&dissection, args.pretty, args.compact)?;

    match output {
        None => print!("{}", json),
        Some(output) => {
            if let Some(parent) = output.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create output directory: {}", parent.display())
                    })?;
                }
            }
            fs::write(&output, json)
                .with_context(|| format!("Failed to write output: {}", output.display()))?;
            if !quiet {
                eprintln!(
                    "OK: {} frames decoded -> {}",
                    dissection.summary.frames_total,
                    output.display()
                );
            }
        }
    }

    if args.strict && has_field_errors(&dissection) {
        return Err(CliError::new(
            format!(
                "{} field errors recorded",
                dissection.summary.field_errors
            ),
            Some("inspect the `errors` arrays of each layer".to_string()),
        ));
    }
    Ok(())
}

fn cmd_encode(
    input: &Path,
    pcap: Option<&Path>,
    strict: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let text = fs::read_to_string(input)
        .with_context(|| format!("Failed to read layer file: {}", input.display()))?;
    let layers: Vec<EncodeInput> = serde_json::from_str(&text).map_err(|err| {
        CliError::new(
            format!("invalid layer file '{}': {}", input.display(), err),
            Some(r#"expected a JSON array like [{"id": "eth", "data": {}}]"#.to_string()),
        )
    })?;
    if layers.is_empty() {
        return Err(CliError::new(
            "layer list is empty",
            Some("add at least one layer, e.g. {\"id\": \"eth\"}".to_string()),
        ));
    }

    let codec = Codec::default();
    let chain = codec.encode(&layers).map_err(|err| {
        let ids = codec
            .registry()
            .iter()
            .map(|protocol| protocol.id())
            .collect::<Vec<_>>()
            .join(", ");
        CliError::new(err.to_string(), Some(format!("known protocol ids: {ids}")))
    })?;
    debug!(len = chain.packet().len(), layers = chain.len(), "packet encoded");

    println!("{}", bytes_to_hex(chain.packet()));
    let errors = chain.errors();
    if !quiet {
        print_field_errors(&errors);
    }

    if let Some(out) = pcap {
        let frame = CapturedFrame::ethernet(chain.packet().to_vec(), 0, 0);
        framecodec_core::write_pcapng(out, &[frame])
            .with_context(|| format!("Failed to write capture: {}", out.display()))?;
        if !quiet {
            eprintln!("OK: capture written -> {}", out.display());
        }
    }

    if strict && !errors.is_empty() {
        return Err(CliError::new(
            format!("{} field errors recorded", errors.len()),
            None,
        ));
    }
    Ok(())
}

fn cmd_schema(id: Option<&str>, pretty: bool) -> Result<(), CliError> {
    let codec = Codec::default();
    let registry = codec.registry();
    let json = match id {
        Some(id) => {
            let schema = registry.schema(id).ok_or_else(|| {
                CliError::new(
                    format!("unknown protocol id '{}'", id),
                    Some("run `framecodec schema` to list every protocol".to_string()),
                )
            })?;
            serialize_json(&schema, pretty, false)?
        }
        None => serialize_json(&registry.schemas(), pretty, false)?,
    };
    println!("{}", json);
    Ok(())
}

fn ensure_distinct_output(output: &Path, input_abs: &Path) -> Result<(), CliError> {
    let parent = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    // A directory that does not exist yet cannot hold the input.
    let Ok(output_dir) = fs::canonicalize(parent) else {
        return Ok(());
    };
    let file_name = output
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Invalid output path: {}", output.display()))?;
    if output_dir.join(file_name) == input_abs {
        return Err(CliError::new(
            format!("output path must differ from input: {}", output.display()),
            Some("choose a different output path".to_string()),
        ));
    }
    Ok(())
}

fn serialize_json<T: Serialize + ?Sized>(
    value: &T,
    pretty: bool,
    compact: bool,
) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(value)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(value)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn has_field_errors(dissection: &Dissection) -> bool {
    dissection.summary.field_errors > 0
}

fn print_field_errors(errors: &[FieldError]) {
    if errors.is_empty() {
        return;
    }
    eprintln!("Field errors:");
    for error in errors {
        eprintln!("  {}", error);
    }
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "pcap" && ext != "pcapng" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .pcap or .pcapng file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .pcap or .pcapng".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        count => {
            let mut listed = matches
                .iter()
                .take(3)
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            if count > 3 {
                listed.push_str(", ...");
            }
            Err(CliError::new(
                format!(
                    "multiple files match pattern '{}' ({} matches); matches: {}",
                    pattern, count, listed
                ),
                Some("pass a single capture file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
