//! Command input
//!
//! Turns raw serial bytes into interpreted commands. Lifecycle requests are
//! handed to a [`RequestPort`] and the next line is not interpreted until the
//! port reports the request applied, so acknowledgements from the
//! interpreter and from the emission controller reach the host in command
//! order.

use crate::protocol::AckSink;
use crate::serial::LineReader;

use super::interpreter::{CommandInterpreter, ControlRequest};

/// Path from the interpreter to the emission controller
#[allow(async_fn_in_trait)]
pub trait RequestPort {
    /// Deliver a request; completes once the controller has applied it
    async fn submit(&mut self, request: ControlRequest);
}

/// Line framing plus interpreter
pub struct CommandInput {
    reader: LineReader,
    interpreter: CommandInterpreter,
}

impl CommandInput {
    /// Create an input stage around an interpreter
    #[must_use]
    pub const fn new(interpreter: CommandInterpreter) -> Self {
        Self {
            reader: LineReader::new(),
            interpreter,
        }
    }

    /// Get the interpreter
    #[must_use]
    pub const fn interpreter(&self) -> &CommandInterpreter {
        &self.interpreter
    }

    /// Feed one chunk of received bytes
    pub async fn receive<P: RequestPort>(
        &mut self,
        data: &[u8],
        acks: &mut impl AckSink,
        port: &mut P,
    ) {
        let mut pending = data;
        loop {
            let consumed = self.reader.push(pending);
            pending = &pending[consumed..];

            while let Some(line) = self.reader.read_line() {
                if let Some(request) = self.interpreter.handle(&line, acks) {
                    port.submit(request).await;
                }
            }

            if pending.is_empty() {
                break;
            }
        }
    }
}

impl Default for CommandInput {
    fn default() -> Self {
        Self::new(CommandInterpreter::default())
    }
}
