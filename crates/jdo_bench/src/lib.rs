//! Benchmark support for the JDO lifecycle engine.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod utils;
