//! Terminal input used for password prompts and confirmations.

use std::io::{self, BufRead, Write};

pub trait Terminal {
    /// Prompt and read a line with echo disabled.
    fn read_secret(&mut self, prompt: &str) -> io::Result<String>;

    /// Read one line from the input stream as-is, minus the line ending.
    fn read_raw_line(&mut self) -> io::Result<String>;

    /// Ask a yes/no question; anything but yes counts as no.
    fn confirm(&mut self, question: &str) -> io::Result<bool>;
}

/// The controlling terminal and the process's stdin.
pub struct StdTerminal;

impl Terminal for StdTerminal {
    fn read_secret(&mut self, prompt: &str) -> io::Result<String> {
        rpassword::prompt_password(prompt)
    }

    fn read_raw_line(&mut self) -> io::Result<String> {
        let mut line = String::new();
        let read = io::stdin().lock().read_line(&mut line)?;
        if read == 0 {
            return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "no input on stdin"));
        }
        Ok(strip_line_ending(line))
    }

    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let mut stderr = io::stderr();
        write!(stderr, "{question} [y/N]: ")?;
        stderr.flush()?;

        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        Ok(is_yes(&answer))
    }
}

fn strip_line_ending(mut line: String) -> String {
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    line
}

fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Pre-recorded answers, consumed in order.
#[cfg(test)]
#[derive(Default)]
pub struct ScriptedTerminal {
    pub inputs: std::collections::VecDeque<String>,
    pub prompts: Vec<String>,
}

#[cfg(test)]
impl ScriptedTerminal {
    pub fn with(inputs: &[&str]) -> Self {
        Self {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            prompts: Vec::new(),
        }
    }

    fn next(&mut self) -> io::Result<String> {
        self.inputs
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "script exhausted"))
    }
}

#[cfg(test)]
impl Terminal for ScriptedTerminal {
    fn read_secret(&mut self, prompt: &str) -> io::Result<String> {
        self.prompts.push(prompt.to_string());
        self.next()
    }

    fn read_raw_line(&mut self) -> io::Result<String> {
        self.next().map(strip_line_ending)
    }

    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        self.prompts.push(question.to_string());
        self.next().map(|answer| is_yes(&answer))
    }
}
