//! Interactive message source.
//!
//! Prompts for a message and a destination and reads one line for each.
//! End of input before a message is read means the source is exhausted.

use tokenring_protocol::{InputError, TokenSource, UserToken, PAYLOAD_CAPACITY};
use tokio::io::{
    self, AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
    Stdin, Stdout,
};

use crate::args::lenient_int;

const MESSAGE_PROMPT: &str = "Enter a message: ";
const DESTINATION_PROMPT: &str = "Enter a destination: ";

/// Longest message line kept. Anything past the payload capacity is cut later;
/// the slack keeps a character split at the limit out of the kept prefix.
const MESSAGE_LINE_LIMIT: usize = PAYLOAD_CAPACITY + 4;

/// Longest destination line kept.
const DESTINATION_LINE_LIMIT: usize = 32;

/// Reads user tokens line by line, prompting on `output`.
pub struct ConsoleSource<R, W> {
    input: R,
    output: W,
}

impl ConsoleSource<BufReader<Stdin>, Stdout> {
    /// Prompt on stdout, read from stdin.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R, W> ConsoleSource<R, W>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Ask once and read one line of at most `limit` bytes. `None` on end
    /// of input.
    ///
    /// The rest of an overlong line is discarded, so the next question starts
    /// on a fresh line.
    async fn ask(&mut self, prompt: &str, limit: usize) -> Result<Option<String>, InputError> {
        self.output.write_all(prompt.as_bytes()).await?;
        self.output.flush().await?;

        let mut raw = Vec::new();
        let read = (&mut self.input)
            .take(limit as u64)
            .read_until(b'\n', &mut raw)
            .await?;
        if read == 0 {
            return Ok(None);
        }
        if raw.last() != Some(&b'\n') && read == limit {
            self.skip_line().await?;
        }

        let line = String::from_utf8_lossy(&raw);
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_owned()))
    }

    async fn skip_line(&mut self) -> Result<(), InputError> {
        loop {
            let buf = self.input.fill_buf().await?;
            if buf.is_empty() {
                return Ok(());
            }
            match buf.iter().position(|&b| b == b'\n') {
                Some(end) => {
                    self.input.consume(end + 1);
                    return Ok(());
                }
                None => {
                    let len = buf.len();
                    self.input.consume(len);
                }
            }
        }
    }
}

impl<R, W> TokenSource for ConsoleSource<R, W>
where
    R: AsyncBufRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    async fn read_user_token(&mut self) -> Result<Option<UserToken>, InputError> {
        let Some(message) = self.ask(MESSAGE_PROMPT, MESSAGE_LINE_LIMIT).await? else {
            return Ok(None);
        };
        let Some(destination) = self.ask(DESTINATION_PROMPT, DESTINATION_LINE_LIMIT).await? else {
            return Err(InputError::NoMessage);
        };
        Ok(Some(UserToken::new(message, lenient_int(&destination))))
    }
}
