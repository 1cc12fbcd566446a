#![deny(warnings)]

pub mod config;
pub mod decode;
pub mod emotion;
pub mod fetch;
pub mod pipeline;
pub mod util;

#[cfg(test)]
pub(crate) mod test_support;
