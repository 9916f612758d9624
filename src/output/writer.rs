//! Message writers
//!
//! Every message is written and flushed on its own, so a consumer reading
//! the stream sees each record before the next remote call is made.

use crate::engine::Message;
use crate::error::{Error, Result};
use std::io::Write;

/// Append-only destination for protocol messages
pub trait MessageSink: Send {
    /// Write one message
    fn emit(&mut self, message: &Message) -> Result<()>;
}

impl<S: MessageSink + ?Sized> MessageSink for &mut S {
    fn emit(&mut self, message: &Message) -> Result<()> {
        (**self).emit(message)
    }
}

/// Newline-delimited JSON writer
#[derive(Debug)]
pub struct JsonLinesWriter<W> {
    writer: W,
    pretty: bool,
    messages_written: u64,
}

impl JsonLinesWriter<std::io::Stdout> {
    /// Writer on the process standard output
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonLinesWriter<W> {
    /// Create a writer over any `Write`
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: false,
            messages_written: 0,
        }
    }

    /// Pretty-print each message (for humans; no longer one message per line)
    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Number of messages written so far
    pub fn messages_written(&self) -> u64 {
        self.messages_written
    }

    /// Unwrap the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> MessageSink for JsonLinesWriter<W> {
    fn emit(&mut self, message: &Message) -> Result<()> {
        let line = if self.pretty {
            serde_json::to_string_pretty(message)
        } else {
            serde_json::to_string(message)
        }
        .map_err(|e| Error::output(format!("Failed to serialize message: {e}")))?;

        writeln!(self.writer, "{line}")
            .and_then(|()| self.writer.flush())
            .map_err(|e| Error::output(format!("Failed to write message: {e}")))?;

        self.messages_written += 1;
        Ok(())
    }
}

/// In-memory sink
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    messages: Vec<Message>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// All messages, in emission order
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Take the collected messages
    pub fn into_messages(self) -> Vec<Message> {
        self.messages
    }

    /// Number of record messages
    pub fn record_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_record()).count()
    }

    /// Number of state messages
    pub fn state_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_state()).count()
    }
}

impl MessageSink for MemorySink {
    fn emit(&mut self, message: &Message) -> Result<()> {
        self.messages.push(message.clone());
        Ok(())
    }
}
