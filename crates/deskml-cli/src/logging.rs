//! Logger setup for the `deskml` binary.

/// Initialise `env_logger` once.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects `debug` and the
/// default is `warn`, so diagnostics on stderr are not interleaved with log
/// lines.
pub fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::new();

    if let Ok(filter) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    } else if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    } else {
        builder.filter_level(log::LevelFilter::Warn);
    }

    builder.format_timestamp(None);

    // already initialised is fine
    let _ = builder.try_init();
}
