use std::str::FromStr as _;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt as _, AsyncWriteExt as _, BufReader, Stdin};

use crate::Result;
use crate::error::Error;
use crate::types::Decimal;

/// Interactive surface of a DCA run.
#[async_trait]
pub trait Console: Send {
    /// Shows `message` and returns the line typed in reply, without the line ending.
    ///
    /// End of input is an empty answer.
    async fn prompt(&mut self, message: &str) -> Result<String>;

    fn show(&mut self, message: &str);
}

/// Console on the process's stdin/stdout.
#[derive(Debug)]
pub struct StdConsole {
    input: BufReader<Stdin>,
}

impl StdConsole {
    #[must_use]
    pub fn new() -> Self {
        Self {
            input: BufReader::new(tokio::io::stdin()),
        }
    }
}

impl Default for StdConsole {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Console for StdConsole {
    async fn prompt(&mut self, message: &str) -> Result<String> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(message.as_bytes()).await?;
        stdout.flush().await?;

        let mut line = String::new();
        self.input.read_line(&mut line).await?;
        Ok(line.trim_end_matches(['\r', '\n']).to_owned())
    }

    #[expect(clippy::print_stdout, reason = "The console is the process's stdout")]
    fn show(&mut self, message: &str) {
        println!("{message}");
    }
}

/// `y` or `yes` in any case. Everything else, including an empty line, declines.
#[must_use]
pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim();
    answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes")
}

/// Parses an amount answer. Empty takes `default`; `0` skips the asset.
pub fn parse_amount(answer: &str, default: Decimal) -> Result<Decimal> {
    let answer = answer.trim();
    if answer.is_empty() {
        return Ok(default);
    }

    let amount = Decimal::from_str(answer)
        .map_err(|e| Error::validation(format!("`{answer}` is not a number: {e}")))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(Error::validation(format!("`{answer}` is negative")));
    }

    Ok(amount)
}
