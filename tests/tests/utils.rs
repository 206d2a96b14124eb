use std::net::SocketAddr;
use std::sync::OnceLock;
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        let _ = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::new(
                "steadyload=debug,steadyload_server=debug,mock_service=info",
            ))
            .with_test_writer()
            .try_init();
    });
}

/// Starts a mock service on the current runtime.
#[allow(unused)]
pub async fn mock() -> SocketAddr {
    init();
    mock_service::spawn().await.unwrap()
}
