use std::io::{self, BufRead, Write};

use crossterm::style::Stylize;

use crate::cancel::CancelToken;
use crate::error::Error;

/// Line-oriented user interaction. End of input on any prompt means the
/// user walked away, which unwinds as [`Error::Cancelled`].
pub(crate) trait Prompt {
    fn ask(&mut self, message: &str) -> Result<String, Error>;
    fn ask_secret(&mut self, message: &str) -> Result<String, Error>;
    fn say(&mut self, line: &str);
}

#[derive(Debug)]
pub(crate) struct TerminalPrompt {
    cancel: CancelToken,
}

impl TerminalPrompt {
    pub(crate) fn new(cancel: CancelToken) -> Self {
        Self { cancel }
    }
}

impl Prompt for TerminalPrompt {
    fn ask(&mut self, message: &str) -> Result<String, Error> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        let mut stdout = io::stdout();
        write!(stdout, "{} ", message.yellow())?;
        stdout.flush()?;
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Err(Error::Cancelled);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    /// An interrupt while echo is off is only acted on after the read
    /// returns, so the terminal is always restored.
    fn ask_secret(&mut self, message: &str) -> Result<String, Error> {
        let read = {
            let _echo_off = self.cancel.track_secret_prompt();
            rpassword::prompt_password(format!("{} ", message.yellow()))
        };
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match read {
            Ok(secret) => Ok(secret),
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => Err(Error::Cancelled),
            Err(err) => Err(err.into()),
        }
    }

    fn say(&mut self, line: &str) {
        println!("{line}");
    }
}

pub(crate) fn heading(text: &str) -> String {
    format!("{}", text.cyan().bold())
}

pub(crate) fn error_line(text: &str) -> String {
    format!("{}", text.red().bold())
}

pub(crate) fn warn_line(text: &str) -> String {
    format!("{}", text.yellow())
}

pub(crate) fn success_line(text: &str) -> String {
    format!("{}", text.green())
}

pub(crate) fn dim(text: &str) -> String {
    format!("{}", text.dim())
}

/// Parses `"2"` or `"1, 3,4"` into zero-based indices, keeping the typed
/// order and dropping repeats. Every index must be within `1..=len`.
pub(crate) fn parse_index_list(input: &str, len: usize) -> Result<Vec<usize>, Error> {
    let mut picked = Vec::new();
    for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let number: usize = part
            .parse()
            .map_err(|_| Error::InvalidUserInput(format!("'{part}' is not a number")))?;
        if number == 0 || number > len {
            return Err(Error::InvalidUserInput(format!(
                "{number} is out of range (1-{len})"
            )));
        }
        if !picked.contains(&(number - 1)) {
            picked.push(number - 1);
        }
    }
    if picked.is_empty() {
        return Err(Error::InvalidUserInput("nothing selected".to_string()));
    }
    Ok(picked)
}

fn print_numbered<T: AsRef<str>>(prompt: &mut dyn Prompt, items: &[T]) {
    for (index, item) in items.iter().enumerate() {
        prompt.say(&format!("{:>3}. {}", index + 1, item.as_ref()));
    }
}

/// Re-prompts until one valid index is entered.
pub(crate) fn choose_one<T: AsRef<str>>(
    prompt: &mut dyn Prompt,
    items: &[T],
    message: &str,
) -> Result<usize, Error> {
    if items.is_empty() {
        return Err(Error::InvalidUserInput("nothing to choose from".to_string()));
    }
    print_numbered(prompt, items);
    loop {
        let answer = prompt.ask(message)?;
        match parse_index_list(&answer, items.len()) {
            Ok(picked) if picked.len() == 1 => return Ok(picked[0]),
            Ok(_) => prompt.say(&error_line("Pick exactly one entry.")),
            Err(err) => prompt.say(&error_line(&format!("Invalid choice: {err}"))),
        }
    }
}

pub(crate) fn choose_many<T: AsRef<str>>(
    prompt: &mut dyn Prompt,
    items: &[T],
    message: &str,
) -> Result<Vec<usize>, Error> {
    if items.is_empty() {
        return Err(Error::InvalidUserInput("nothing to choose from".to_string()));
    }
    print_numbered(prompt, items);
    loop {
        let answer = prompt.ask(message)?;
        match parse_index_list(&answer, items.len()) {
            Ok(picked) => return Ok(picked),
            Err(err) => prompt.say(&error_line(&format!("Invalid choice: {err}"))),
        }
    }
}

pub(crate) fn confirm(
    prompt: &mut dyn Prompt,
    message: &str,
    default: bool,
) -> Result<bool, Error> {
    let hint = if default { "[Y/n]" } else { "[y/N]" };
    loop {
        let answer = prompt.ask(&format!("{message} {hint}"))?;
        match answer.trim().to_lowercase().as_str() {
            "" => return Ok(default),
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => prompt.say(&error_line("Please answer y or n.")),
        }
    }
}

pub(crate) fn ask_non_empty(prompt: &mut dyn Prompt, message: &str) -> Result<String, Error> {
    loop {
        let answer = prompt.ask(message)?;
        let trimmed = answer.trim();
        if !trimmed.is_empty() {
            return Ok(trimmed.to_string());
        }
        prompt.say(&error_line("A value is required."));
    }
}

#[cfg(test)]
pub(crate) struct ScriptedPrompt {
    inputs: std::collections::VecDeque<String>,
    pub(crate) output: Vec<String>,
    pub(crate) asked: Vec<String>,
}

#[cfg(test)]
impl ScriptedPrompt {
    pub(crate) fn new(inputs: &[&str]) -> Self {
        Self {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            output: vec![],
            asked: vec![],
        }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.inputs.len()
    }

    pub(crate) fn printed(&self, needle: &str) -> bool {
        self.output.iter().any(|line| line.contains(needle))
    }
}

#[cfg(test)]
impl Prompt for ScriptedPrompt {
    fn ask(&mut self, message: &str) -> Result<String, Error> {
        self.asked.push(message.to_string());
        self.inputs.pop_front().ok_or(Error::Cancelled)
    }

    fn ask_secret(&mut self, message: &str) -> Result<String, Error> {
        self.ask(message)
    }

    fn say(&mut self, line: &str) {
        self.output.push(line.to_string());
    }
}
