//! Skips wiremock-backed tests where localhost cannot be bound.

use std::net::TcpListener;

use wiremock::MockServer;

/// Set to `1` to turn a skipped socket test into a failure (CI).
pub const REQUIRE_SOCKETS_ENV: &str = "TUBEFETCH_REQUIRE_SOCKET_TESTS";

/// Starts a mock server, or returns `None` after printing why the test is
/// being skipped.
pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    match TcpListener::bind("127.0.0.1:0") {
        Ok(_) => Some(MockServer::start().await),
        Err(error) => {
            let required = std::env::var(REQUIRE_SOCKETS_ENV).is_ok_and(|value| value == "1");
            assert!(
                !required,
                "cannot bind localhost ({error}) but {REQUIRE_SOCKETS_ENV}=1"
            );
            eprintln!("skipping: cannot bind localhost ({error}); set {REQUIRE_SOCKETS_ENV}=1 to fail instead");
            None
        }
    }
}
