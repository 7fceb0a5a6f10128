#![allow(dead_code)]

use std::net::TcpListener;
use std::panic::Location;

use wiremock::MockServer;

const REQUIRE_SOCKET_TESTS_ENV: &str = "COMMONS_SAMPLER_REQUIRE_SOCKET_TESTS";

fn socket_tests_required() -> bool {
    std::env::var(REQUIRE_SOCKET_TESTS_ENV)
        .ok()
        .is_some_and(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
}

/// Returns `true` when localhost sockets cannot be bound in this sandbox.
///
/// Panics instead when socket tests are required by the environment.
#[track_caller]
pub fn should_skip_socket_bound_test() -> bool {
    if TcpListener::bind("127.0.0.1:0").is_ok() {
        return false;
    }

    let location = Location::caller();
    let message = format!(
        "[socket-bound-test] cannot bind localhost socket at {}:{}",
        location.file(),
        location.line()
    );
    assert!(
        !socket_tests_required(),
        "{message}. Unset {REQUIRE_SOCKET_TESTS_ENV} to allow skipping."
    );
    eprintln!("{message}. Skipping test.");
    true
}

pub async fn start_mock_server_or_skip() -> Option<MockServer> {
    if should_skip_socket_bound_test() {
        None
    } else {
        Some(MockServer::start().await)
    }
}
