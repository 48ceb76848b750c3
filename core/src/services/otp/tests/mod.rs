//! Tests for the one-time code service

#[cfg(test)]
mod service_tests;
