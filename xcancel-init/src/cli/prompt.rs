//! Line-oriented prompt primitives.
//!
//! The prompter reads whole lines from any `BufRead` and writes to any
//! `Write`, so the same code drives a terminal and scripted test input.
//! End of input is treated as the operator walking away: every read turns it
//! into [`WizardError::Cancelled`].

use std::{
    fmt::Display,
    io::{self, BufRead, Write},
};

use dialoguer::console::style;

use crate::{error::WizardError, validation::Validator};

const RULE_WIDTH: usize = 60;

/// Reads answers from `R` and writes prompts and status lines to `W`.
#[derive(Debug)]
pub struct Prompter<R, W> {
    input: R,
    output: W,
    assume_defaults: bool,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    /// Interactive prompter over `input` and `output`.
    pub fn new(input: R, output: W) -> Self {
        Self {
            input,
            output,
            assume_defaults: false,
        }
    }

    /// Answer every prompt with its default instead of reading input.
    pub fn assume_defaults(mut self, enabled: bool) -> Self {
        self.assume_defaults = enabled;
        self
    }

    /// Give back the output sink.
    pub fn into_output(self) -> W {
        self.output
    }

    /// Multiple choice by 1-based number; returns the chosen label verbatim.
    pub fn choose<S: AsRef<str>>(
        &mut self,
        question: &str,
        options: &[S],
        default: Option<&str>,
    ) -> Result<String, WizardError> {
        let labels: Vec<String> =
            options.iter().map(|o| o.as_ref().to_string()).collect();
        let default_idx =
            default.and_then(|d| labels.iter().position(|l| l == d));
        let idx = self.choose_index(question, &labels, default_idx)?;
        Ok(labels[idx].clone())
    }

    /// Typed wrapper over [`Prompter::choose`] using each option's `Display`.
    pub fn select<T: Copy + Display + PartialEq>(
        &mut self,
        question: &str,
        options: &[T],
        default: Option<T>,
    ) -> Result<T, WizardError> {
        let labels: Vec<String> =
            options.iter().map(ToString::to_string).collect();
        let default_idx =
            default.and_then(|d| options.iter().position(|o| *o == d));
        let idx = self.choose_index(question, &labels, default_idx)?;
        Ok(options[idx])
    }

    fn choose_index(
        &mut self,
        question: &str,
        labels: &[String],
        default: Option<usize>,
    ) -> Result<usize, WizardError> {
        writeln!(self.output)?;
        writeln!(self.output, "{}", style(question).bold())?;
        for (i, label) in labels.iter().enumerate() {
            let marker = if Some(i) == default { " (default)" } else { "" };
            writeln!(self.output, "  {}. {label}{marker}", i + 1)?;
        }

        if self.assume_defaults {
            return match default {
                Some(idx) => {
                    writeln!(self.output, "Using default: {}", labels[idx])?;
                    Ok(idx)
                }
                None => Err(WizardError::NoDefault {
                    question: question.to_string(),
                }),
            };
        }

        let count = labels.len();
        loop {
            let answer =
                self.read_line(&format!("\nEnter choice [1-{count}]: "))?;
            if answer.is_empty()
                && let Some(idx) = default
            {
                return Ok(idx);
            }
            match answer.parse::<i64>() {
                Ok(n) if n >= 1 && n as usize <= count => {
                    return Ok(n as usize - 1);
                }
                Ok(_) => self.error(&format!(
                    "Please enter a number between 1 and {count}"
                ))?,
                Err(_) => self.error("Invalid input")?,
            }
        }
    }

    /// Free text, trimmed. Empty input takes the default when there is one.
    pub fn text(
        &mut self,
        question: &str,
        default: Option<&str>,
        validator: Option<Validator>,
    ) -> Result<String, WizardError> {
        let default = default.filter(|d| !d.is_empty());

        if self.assume_defaults {
            return match default {
                Some(value) => {
                    writeln!(
                        self.output,
                        "{}: {value}",
                        style(question).bold()
                    )?;
                    Ok(value.to_string())
                }
                None => Err(WizardError::NoDefault {
                    question: question.to_string(),
                }),
            };
        }

        let hint = default.map(|d| format!(" [{d}]")).unwrap_or_default();
        loop {
            let answer = self.read_line(&format!(
                "{}{hint}: ",
                style(question).bold()
            ))?;
            if answer.is_empty()
                && let Some(value) = default
            {
                return Ok(value.to_string());
            }
            if let Some(validate) = validator
                && let Err(message) = validate(&answer)
            {
                self.error(&message)?;
                continue;
            }
            if !answer.is_empty() {
                return Ok(answer);
            }
            self.error("Please provide an answer")?;
        }
    }

    /// `y`/`yes` (any case) is true, other input false, empty the default.
    pub fn yes_no(
        &mut self,
        question: &str,
        default: bool,
    ) -> Result<bool, WizardError> {
        let hint = if default { "Y/n" } else { "y/N" };
        if self.assume_defaults {
            writeln!(
                self.output,
                "{} [{hint}]: {}",
                style(question).bold(),
                if default { "yes" } else { "no" }
            )?;
            return Ok(default);
        }

        let answer = self
            .read_line(&format!("{} [{hint}]: ", style(question).bold()))?
            .to_lowercase();
        if answer.is_empty() {
            return Ok(default);
        }
        Ok(matches!(answer.as_str(), "y" | "yes"))
    }

    /// Block until the operator presses Enter.
    pub fn pause(&mut self, message: &str) -> Result<(), WizardError> {
        let message = format!("\n{}", style(message).bold());
        if self.assume_defaults {
            writeln!(self.output, "{message}")?;
            return Ok(());
        }
        self.read_line(&message)?;
        Ok(())
    }

    fn read_line(&mut self, prompt: &str) -> Result<String, WizardError> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(WizardError::Cancelled);
        }
        Ok(line.trim().to_string())
    }

    /// Section title centred between two rules.
    pub fn header(&mut self, text: &str) -> io::Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(self.output)?;
        writeln!(self.output, "{}", style(&rule).bold().blue())?;
        writeln!(
            self.output,
            "{}",
            style(format!("{text:^width$}", width = RULE_WIDTH))
                .bold()
                .blue()
        )?;
        writeln!(self.output, "{}", style(&rule).bold().blue())?;
        writeln!(self.output)
    }

    /// `✓` line.
    pub fn success(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{} {text}", style("✓").green())
    }

    /// `✗` line.
    pub fn error(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{} {text}", style("✗").red())
    }

    /// `⚠` line.
    pub fn warning(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{} {text}", style("⚠").yellow())
    }

    /// `ℹ` line.
    pub fn info(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.output, "{} {text}", style("ℹ").blue())
    }

    /// Plain line.
    pub fn line(&mut self, text: impl Display) -> io::Result<()> {
        writeln!(self.output, "{text}")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::validation::{validate_ip, validate_port};

    fn prompter(input: &str) -> Prompter<Cursor<Vec<u8>>, Vec<u8>> {
        Prompter::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    fn output(p: Prompter<Cursor<Vec<u8>>, Vec<u8>>) -> String {
        String::from_utf8(p.into_output()).expect("utf8 output")
    }

    const ABC: [&str; 3] = ["a", "b", "c"];

    #[test]
    fn choose_empty_takes_default() {
        let mut p = prompter("\n");
        assert_eq!(p.choose("Pick", &ABC, Some("b")).unwrap(), "b");
        assert!(output(p).contains("2. b (default)"));
    }

    #[test]
    fn choose_by_number() {
        let mut p = prompter("3\n");
        assert_eq!(p.choose("Pick", &ABC, Some("b")).unwrap(), "c");
    }

    #[test]
    fn choose_reprompts_until_in_range() {
        let mut p = prompter("0\n4\nx\n1\n");
        assert_eq!(p.choose("Pick", &ABC, Some("b")).unwrap(), "a");
        let out = output(p);
        assert_eq!(out.matches("Please enter a number between 1 and 3").count(), 2);
        assert_eq!(out.matches("Invalid input").count(), 1);
    }

    #[test]
    fn choose_without_default_rejects_empty() {
        let mut p = prompter("\n2\n");
        assert_eq!(p.choose("Pick", &ABC, None).unwrap(), "b");
        assert!(output(p).contains("Invalid input"));
    }

    #[test]
    fn choose_never_returns_out_of_range_before_eof() {
        let mut p = prompter("0\n4\nx\n");
        assert!(matches!(
            p.choose("Pick", &ABC, Some("b")),
            Err(WizardError::Cancelled)
        ));
    }

    #[test]
    fn select_maps_back_to_value() {
        let mut p = prompter("1\n");
        let picked = p.select("Port", &[80u16, 443], Some(443)).unwrap();
        assert_eq!(picked, 80);
    }

    #[test]
    fn text_trims_and_defaults() {
        let mut p = prompter("  eth1  \n\n");
        assert_eq!(p.text("Interface", Some("eth0"), None).unwrap(), "eth1");
        assert_eq!(p.text("Interface", Some("eth0"), None).unwrap(), "eth0");
    }

    #[test]
    fn text_validator_reprompts() {
        let mut p = prompter("999.1.1.1\n10.0.0.1\n");
        let ip = p.text("Gateway", None, Some(validate_ip)).unwrap();
        assert_eq!(ip, "10.0.0.1");
        assert!(output(p).contains("IP address octets must be 0-255"));
    }

    #[test]
    fn text_empty_without_default_is_rejected() {
        let mut p = prompter("\nvalue\n");
        assert_eq!(p.text("Name", None, None).unwrap(), "value");
        assert!(output(p).contains("Please provide an answer"));
    }

    #[test]
    fn text_default_skips_validation() {
        let mut p = prompter("\n");
        let port = p.text("HTTP port", Some("80"), Some(validate_port)).unwrap();
        assert_eq!(port, "80");
    }

    #[test]
    fn yes_no_rules() {
        let mut p = prompter("YES\ny\nnope\n\n");
        assert!(p.yes_no("Go?", false).unwrap());
        assert!(p.yes_no("Go?", false).unwrap());
        assert!(!p.yes_no("Go?", true).unwrap());
        assert!(p.yes_no("Go?", true).unwrap());
    }

    #[test]
    fn eof_is_cancellation() {
        let mut p = prompter("");
        assert!(matches!(p.pause("Press Enter"), Err(WizardError::Cancelled)));
    }

    #[test]
    fn assume_defaults_never_reads() {
        let mut p = prompter("").assume_defaults(true);
        assert_eq!(p.choose("Pick", &ABC, Some("c")).unwrap(), "c");
        assert_eq!(p.text("Port", Some("443"), None).unwrap(), "443");
        assert!(!p.yes_no("Start?", false).unwrap());
        assert!(matches!(
            p.choose("Pick", &ABC, None),
            Err(WizardError::NoDefault { .. })
        ));
    }
}
