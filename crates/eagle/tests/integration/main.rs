//! Integration tests for eaglewatch-eagle
//!
//! Uses wiremock to stand in for Eagle's local API and checks request
//! shapes, envelope handling and folder resolution end to end.

mod common;

mod test_resolver;
