use tracing_subscriber::EnvFilter;

// 初始化日志，默认 info 级别，可通过 RUST_LOG 覆盖
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
