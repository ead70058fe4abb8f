use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "DIETLOG_LOG";
const DEFAULT_DIRECTIVE: &str = "warn";

/// Log to stderr so `--json` output on stdout stays machine-readable.
pub fn init() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
