use tracing_subscriber::EnvFilter;

/// Route `tracing` output through the test harness's captured writer.
///
/// Silent unless `RUST_LOG` asks for output, e.g.
/// `RUST_LOG=fspath_fs=debug` to see every filesystem call of a failing
/// test. Only the first call in a process installs the subscriber; later
/// calls are no-ops, so every test can call it.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .with_target(true)
        .compact()
        .try_init();
}
