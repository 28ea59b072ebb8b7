//! Integration tests for ledgersync-api
//!
//! Uses wiremock to simulate the transactions API and verifies the
//! request shapes, pacing, the single 429 retry and error mapping of
//! the ApiClient.

mod common;

mod test_fetch;
mod test_write_back;
