//! Unit tests for the thread module.

mod service_tests;
