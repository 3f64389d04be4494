//! `tracing-subscriber` setup for the binary. The library itself never
//! installs a subscriber — only a leaf binary may own global logging state.

pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
}
