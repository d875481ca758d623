//! Interactive confirmation over a terminal
//!
//! Each question is printed as `<message> [Y/n/q]` (or `[y/N/q]` when the
//! default is no) and one line is read back. `q`/`quit` aborts the run;
//! end of input does the same.
//!
//! The read blocks; on a multi-thread runtime it runs under
//! [`tokio::task::block_in_place`] so the worker's other tasks move elsewhere.

use std::io::{BufRead, BufReader, Stdin, Stdout, Write};
use std::sync::Mutex;

use dropsync_core::ports::{Answer, IConfirmationPolicy};
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::warn;

/// Parses one reply; `None` means the reply was not understood
pub fn parse_reply(reply: &str, default: bool) -> Option<Answer> {
    match reply.trim().to_lowercase().as_str() {
        "" => Some(Answer::from(default)),
        "y" | "yes" => Some(Answer::Yes),
        "n" | "no" => Some(Answer::No),
        "q" | "quit" => Some(Answer::Abort),
        _ => None,
    }
}

/// Runs a blocking call, handing the worker back to the runtime first when
/// that is allowed
fn blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(f)
        }
        _ => f(),
    }
}

fn choices(default: bool) -> &'static str {
    if default {
        "[Y/n/q]"
    } else {
        "[y/N/q]"
    }
}

struct PromptIo<R, W> {
    input: R,
    output: W,
}

/// Asks every question on `output` and reads the answer from `input`
pub struct InteractivePolicy<R, W> {
    io: Mutex<PromptIo<R, W>>,
}

impl InteractivePolicy<BufReader<Stdin>, Stdout> {
    /// A policy bound to the process's stdin and stdout
    pub fn stdio() -> Self {
        Self::new(BufReader::new(std::io::stdin()), std::io::stdout())
    }
}

impl<R: BufRead, W: Write> InteractivePolicy<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            io: Mutex::new(PromptIo { input, output }),
        }
    }

    fn ask(io: &mut PromptIo<R, W>, message: &str, default: bool) -> std::io::Result<Answer> {
        loop {
            write!(io.output, "{} {} ", message, choices(default))?;
            io.output.flush()?;

            let mut line = String::new();
            if io.input.read_line(&mut line)? == 0 {
                writeln!(io.output)?;
                return Ok(Answer::Abort);
            }
            if let Some(answer) = parse_reply(&line, default) {
                return Ok(answer);
            }
            writeln!(io.output, "Please answer y, n or q.")?;
        }
    }
}

impl<R, W> IConfirmationPolicy for InteractivePolicy<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn confirm(&self, message: &str, default: bool) -> Answer {
        blocking(|| {
            let mut io = match self.io.lock() {
                Ok(io) => io,
                Err(poisoned) => poisoned.into_inner(),
            };
            Self::ask(&mut io, message, default).unwrap_or_else(|e| {
                warn!(error = %e, "Cannot read answer, aborting");
                Answer::Abort
            })
        })
    }
}
