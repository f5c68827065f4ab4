//! Notifications module
//!
//! Provides:
//! - The `Sink` trait that accepts rendered reports
//! - A sink piping each report into a mail transport command

mod command;

pub use command::CommandSink;

use crate::error::Result;

/// Destination for rendered reports.
///
/// A report counts as delivered once `deliver` returns `Ok`; whatever the
/// sink does afterwards is not observed.
pub trait Sink {
    fn deliver(&mut self, commit: &str, message: &str) -> Result<()>;
}

/// Keeps every delivered report in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub messages: Vec<String>,
}

impl Sink for MemorySink {
    fn deliver(&mut self, _commit: &str, message: &str) -> Result<()> {
        self.messages.push(message.to_string());
        Ok(())
    }
}
