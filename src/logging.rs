use tracing::Level;
use tracing_subscriber::{fmt, EnvFilter};

const CRATE_TARGET: &str = "xunit_explorer";

/// Logs one line per registered element at debug level.
const REGISTRY_TARGET: &str = "xunit_explorer::registry";

/// Ordered from least to most output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    Debug,
    Trace,
}

impl Verbosity {
    pub fn from_flags(verbose: u8, quiet: bool) -> Self {
        if quiet {
            return Self::Quiet;
        }
        match verbose {
            0 => Self::Normal,
            1 => Self::Verbose,
            2 => Self::Debug,
            _ => Self::Trace,
        }
    }

    fn level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::WARN,
            Self::Verbose => Level::INFO,
            Self::Debug => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// `-vv` shows per-file scan summaries; per-element registry churn
    /// stays hidden until `-vvv`.
    fn directives(self) -> String {
        let level = self.level();
        if self == Self::Debug {
            format!("{CRATE_TARGET}={level},{REGISTRY_TARGET}={}", Level::INFO)
        } else {
            format!("{CRATE_TARGET}={level}")
        }
    }
}

/// Installs the global subscriber on stderr. `RUST_LOG` takes precedence
/// over the flags.
pub fn init(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directives()));
    let detailed = verbosity >= Verbosity::Debug;

    // Files are scanned on the rayon pool.
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(detailed)
        .with_thread_ids(detailed)
        .with_file(detailed)
        .with_line_number(detailed)
        .compact();

    match verbosity {
        Verbosity::Quiet => subscriber.with_writer(std::io::sink).init(),
        Verbosity::Normal => subscriber.without_time().init(),
        _ => subscriber.init(),
    }
}
