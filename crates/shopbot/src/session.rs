use std::io::{BufRead, Write};

use crate::chatbot::Chatbot;
use crate::error::ChatbotError;
use crate::responder::{is_exit_command, FAREWELL};

pub const WELCOME: &str = "E-commerce Chatbot: Welcome! How can I assist you today?";
pub const PROMPT: &str = "You: ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    Farewell,
    EndOfInput,
    /// A pipeline error ended the session; it was reported on the output.
    Aborted,
}

/// Like [`run_session`], but a pipeline error is printed to `out` as
/// `Error: <message>` and the session ends normally. Only a failure to write
/// that line is returned.
pub async fn run_chat<R, W>(
    bot: &Chatbot,
    input: R,
    out: &mut W,
) -> Result<SessionEnd, ChatbotError>
where
    R: BufRead,
    W: Write,
{
    match run_session(bot, input, out).await {
        Ok(end) => Ok(end),
        Err(e) => {
            tracing::error!(error = %e, kind = e.kind(), "chat session aborted");
            write_line(out, &format!("Error: {e}"))?;
            Ok(SessionEnd::Aborted)
        }
    }
}

/// Interactive loop: read a line, answer it, repeat until an exit command or
/// end of input. The first pipeline error ends the session and is returned.
pub async fn run_session<R, W>(
    bot: &Chatbot,
    mut input: R,
    out: &mut W,
) -> Result<SessionEnd, ChatbotError>
where
    R: BufRead,
    W: Write,
{
    write_line(out, WELCOME)?;
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            tracing::debug!("input closed");
            return Ok(SessionEnd::EndOfInput);
        }
        let query = line.trim_end_matches(['\r', '\n']);
        if is_exit_command(query) {
            write_line(out, FAREWELL)?;
            return Ok(SessionEnd::Farewell);
        }
        let answer = bot.ask(query).await?;
        write_line(out, &format!("Chatbot: {answer}"))?;
    }
}

fn write_line<W: Write>(out: &mut W, text: &str) -> Result<(), ChatbotError> {
    writeln!(out, "{text}")?;
    Ok(())
}
