//! Logging initialization

/// Initialize the logging system
///
/// Uses env_logger with default filter level of `info`.
/// Override with RUST_LOG environment variable, e.g. `RUST_LOG=carvox=trace`
/// to see every chunk build.
///
/// # Example
/// ```no_run
/// carvox::core::logging::init();
/// log::info!("Volume ready");
/// ```
pub fn init() {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();
}
