//! Formatter adapters.

mod command;

pub use command::{CommandFormatter, FormatterRule};
