#![forbid(unsafe_code)]

//! Command-line argument parsing for the planner.
//!
//! Parses args manually to keep the binary lean. Supports environment
//! variable overrides via the `SITEPLAN_*` prefix; explicit flags win over
//! the environment, which wins over defaults.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::process;

use siteplan_layout::SequenceOperation;
use siteplan_runtime::DesignId;

const VERSION: &str = env!("CARGO_PKG_VERSION");

const HELP_TEXT: &str = "\
siteplan - battery site layout planner

USAGE:
    siteplan [OPTIONS]

OPTIONS:
    --qty=ID:N            Set the quantity of unit ID (repeatable)
    --manual              Prefer manual (order-preserving) layout
    --move=SRC:DST        Move item SRC to DST's slot (repeatable, manual only)
    --move-end=ID         Move item ID to the end (repeatable, manual only)
    --scroll=PX           Viewport scroll offset in pixels (default: 0)
    --max-row-width=FT    Maximum row width in feet (default: 100)
    --col-gap=FT          Gap after each unit in a row (default: 2)
    --row-gap=FT          Gap between rows (default: 2)
    --format=FMT          Output: 'summary' (default), 'breakdown', 'ascii'
                          or 'json'
    --store=PATH          Design store file
                          (default: $XDG_STATE_HOME/siteplan/designs.json)
    --save[=PATH]         Append the design to the store
    --name=NAME           Name for a saved design (default: untitled)
    --load[=PATH]         Start from the newest design in the store
    --load-id=ID          Start from the saved design with this id
    --list                List saved designs, newest first, and exit
    --delete=ID           Delete a saved design and exit
    --help, -h            Show this help message
    --version, -V         Show version

UNITS:
    megapack-xl  megapack-2  megapack  powerpack
    transformer  (derived: one per two batteries)

ENVIRONMENT VARIABLES:
    SITEPLAN_FORMAT           Override --format
    SITEPLAN_MAX_ROW_WIDTH    Override --max-row-width
    SITEPLAN_COL_GAP          Override --col-gap
    SITEPLAN_ROW_GAP          Override --row-gap
    SITEPLAN_MANUAL           Set to 1 to imply --manual
    SITEPLAN_STORE            Override --store
    SITEPLAN_LOG              Log filter, e.g. 'debug' (default: warn)";

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Summary,
    /// Per-unit cost and energy lines.
    Breakdown,
    Ascii,
    Json,
}

impl OutputFormat {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "summary" => Some(Self::Summary),
            "breakdown" => Some(Self::Breakdown),
            "ascii" => Some(Self::Ascii),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq)]
pub struct Opts {
    /// `(unit id, quantity)` edits, applied in order.
    pub quantities: Vec<(String, u32)>,
    pub manual: bool,
    /// Reorders, applied in order after quantities.
    pub moves: Vec<SequenceOperation>,
    pub scroll_top: f64,
    pub max_row_width: Option<f64>,
    pub col_gap: Option<f64>,
    pub row_gap: Option<f64>,
    pub format: OutputFormat,
    /// Store file; `None` means the default location.
    pub store: Option<PathBuf>,
    pub save: bool,
    pub name: String,
    /// Start from the newest saved design.
    pub load: bool,
    /// Start from this saved design; wins over `load`.
    pub load_id: Option<DesignId>,
    /// Print saved designs instead of planning.
    pub list: bool,
    pub delete: Option<DesignId>,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            quantities: Vec::new(),
            manual: false,
            moves: Vec::new(),
            scroll_top: 0.0,
            max_row_width: None,
            col_gap: None,
            row_gap: None,
            format: OutputFormat::Summary,
            store: None,
            save: false,
            name: "untitled".into(),
            load: false,
            load_id: None,
            list: false,
            delete: None,
        }
    }
}

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(Opts),
    Help,
    Version,
}

/// Argument errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    UnknownArgument(String),
    InvalidValue { flag: &'static str, value: String },
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownArgument(arg) => write!(f, "Unknown argument: {arg}"),
            Self::InvalidValue { flag, value } => write!(f, "Invalid {flag} value: {value}"),
        }
    }
}

impl std::error::Error for CliError {}

impl Opts {
    /// Parse process arguments and environment, exiting on `--help`,
    /// `--version` or errors.
    pub fn parse() -> Self {
        match parse_from(env::args().skip(1), |key| env::var(key).ok()) {
            Ok(Command::Run(opts)) => opts,
            Ok(Command::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Command::Version) => {
                println!("siteplan {VERSION}");
                process::exit(0);
            }
            Err(e) => {
                eprintln!("{e}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }
}

/// Parse `args` with environment lookups through `var`.
pub fn parse_from<I, S, F>(args: I, var: F) -> Result<Command, CliError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
    F: Fn(&str) -> Option<String>,
{
    let mut opts = Opts::default();

    // Environment first
    if let Some(val) = var("SITEPLAN_FORMAT") {
        opts.format =
            OutputFormat::parse(&val).ok_or_else(|| invalid("SITEPLAN_FORMAT", &val))?;
    }
    if let Some(val) = var("SITEPLAN_MAX_ROW_WIDTH") {
        opts.max_row_width = Some(parse_number("SITEPLAN_MAX_ROW_WIDTH", &val)?);
    }
    if let Some(val) = var("SITEPLAN_COL_GAP") {
        opts.col_gap = Some(parse_number("SITEPLAN_COL_GAP", &val)?);
    }
    if let Some(val) = var("SITEPLAN_ROW_GAP") {
        opts.row_gap = Some(parse_number("SITEPLAN_ROW_GAP", &val)?);
    }
    if let Some(val) = var("SITEPLAN_MANUAL") {
        opts.manual = matches!(val.as_str(), "1" | "true" | "yes");
    }
    if let Some(val) = var("SITEPLAN_STORE") {
        opts.store = Some(PathBuf::from(val));
    }

    for arg in args {
        let arg = arg.as_ref();
        match arg {
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-V" => return Ok(Command::Version),
            "--manual" => opts.manual = true,
            "--save" => opts.save = true,
            "--load" => opts.load = true,
            "--list" => opts.list = true,
            other => {
                if let Some(val) = other.strip_prefix("--qty=") {
                    let (id, count) = split_pair("--qty", val)?;
                    let count = count.parse().map_err(|_| invalid("--qty", val))?;
                    opts.quantities.push((id.to_string(), count));
                } else if let Some(val) = other.strip_prefix("--move=") {
                    let (source, target) = split_pair("--move", val)?;
                    opts.moves.push(SequenceOperation::MoveToPosition {
                        source: source.to_string(),
                        target: target.to_string(),
                    });
                } else if let Some(val) = other.strip_prefix("--move-end=") {
                    if val.is_empty() {
                        return Err(invalid("--move-end", val));
                    }
                    opts.moves.push(SequenceOperation::MoveToEnd {
                        source: val.to_string(),
                    });
                } else if let Some(val) = other.strip_prefix("--scroll=") {
                    opts.scroll_top = parse_number("--scroll", val)?;
                } else if let Some(val) = other.strip_prefix("--max-row-width=") {
                    opts.max_row_width = Some(parse_number("--max-row-width", val)?);
                } else if let Some(val) = other.strip_prefix("--col-gap=") {
                    opts.col_gap = Some(parse_number("--col-gap", val)?);
                } else if let Some(val) = other.strip_prefix("--row-gap=") {
                    opts.row_gap = Some(parse_number("--row-gap", val)?);
                } else if let Some(val) = other.strip_prefix("--format=") {
                    opts.format = OutputFormat::parse(val).ok_or_else(|| invalid("--format", val))?;
                } else if let Some(val) = other.strip_prefix("--store=") {
                    opts.store = Some(parse_path("--store", val)?);
                } else if let Some(val) = other.strip_prefix("--save=") {
                    opts.store = Some(parse_path("--save", val)?);
                    opts.save = true;
                } else if let Some(val) = other.strip_prefix("--name=") {
                    opts.name = val.to_string();
                } else if let Some(val) = other.strip_prefix("--load=") {
                    opts.store = Some(parse_path("--load", val)?);
                    opts.load = true;
                } else if let Some(val) = other.strip_prefix("--load-id=") {
                    opts.load_id = Some(parse_design_id("--load-id", val)?);
                } else if let Some(val) = other.strip_prefix("--delete=") {
                    opts.delete = Some(parse_design_id("--delete", val)?);
                } else {
                    return Err(CliError::UnknownArgument(other.to_string()));
                }
            }
        }
    }

    Ok(Command::Run(opts))
}

fn invalid(flag: &'static str, value: &str) -> CliError {
    CliError::InvalidValue {
        flag,
        value: value.to_string(),
    }
}

/// Split `A:B` with both halves non-empty.
fn split_pair<'a>(flag: &'static str, value: &'a str) -> Result<(&'a str, &'a str), CliError> {
    match value.split_once(':') {
        Some((a, b)) if !a.is_empty() && !b.is_empty() => Ok((a, b)),
        _ => Err(invalid(flag, value)),
    }
}

fn parse_path(flag: &'static str, value: &str) -> Result<PathBuf, CliError> {
    if value.is_empty() {
        return Err(invalid(flag, value));
    }
    Ok(PathBuf::from(value))
}

/// Design ids start at 1.
fn parse_design_id(flag: &'static str, value: &str) -> Result<DesignId, CliError> {
    value
        .parse::<u64>()
        .ok()
        .and_then(DesignId::new)
        .ok_or_else(|| invalid(flag, value))
}

fn parse_number(flag: &'static str, value: &str) -> Result<f64, CliError> {
    match value.parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(n),
        _ => Err(invalid(flag, value)),
    }
}
