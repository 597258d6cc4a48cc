//! Durable log test suite
