use tracing_subscriber::EnvFilter;

pub const DEFAULT_DIRECTIVE: &str = "kleague_fantasy=info";

/// Install a fmt subscriber filtered by `RUST_LOG` (default
/// `kleague_fantasy=info`). Returns false if one was already installed.
pub fn init() -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
