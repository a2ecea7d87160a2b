/// Initializes `env_logger` with a timestamped, level-colored format.
/// Safe to call more than once per process; subsequent calls are no-ops.
pub fn init() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
