//! Cross-module tests for the query pipeline.

pub(crate) mod support;

mod scenarios;
