//! Unit tests for the message module.
//!
//! Tests are organised by concept: domain types, validation rules, the
//! in-memory store and the scope index and hint overlay services.
