//! Crop command arguments
//!
//! The engine takes an ffmpeg-style argument list:
//! `-i <input> -ss <start> -to <end> -c copy <output>`.

use crate::error::{CropError, Result};
use crate::selection::Interval;

/// A single crop invocation
#[derive(Debug, Clone, PartialEq)]
pub struct CropCommand {
    pub input: String,
    pub output: String,
    pub start: f64,
    pub end: f64,
    /// Copy streams instead of re-encoding
    pub stream_copy: bool,
}

impl CropCommand {
    /// Stream-copy crop of `interval` from `input` into `output`
    pub fn new(input: impl Into<String>, output: impl Into<String>, interval: Interval) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            start: interval.start,
            end: interval.end,
            stream_copy: true,
        }
    }

    pub fn interval(&self) -> Interval {
        Interval {
            start: self.start,
            end: self.end,
        }
    }

    /// Render the ordered argument list
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "-i".to_string(),
            self.input.clone(),
            "-ss".to_string(),
            format_timestamp(self.start),
            "-to".to_string(),
            format_timestamp(self.end),
        ];
        if self.stream_copy {
            args.push("-c".to_string());
            args.push("copy".to_string());
        }
        args.push(self.output.clone());
        args
    }

    /// Parse an argument list produced by [`to_args`](Self::to_args).
    ///
    /// Unknown flags are rejected; the last positional argument is the output.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        let mut input = None;
        let mut output = None;
        let mut start = 0.0;
        let mut end = None;
        let mut stream_copy = false;

        let mut iter = args.iter().map(AsRef::<str>::as_ref);
        while let Some(arg) = iter.next() {
            match arg {
                "-i" => input = Some(expect_value(&mut iter, "-i")?.to_string()),
                "-ss" => start = parse_timestamp(expect_value(&mut iter, "-ss")?)?,
                "-to" => end = Some(parse_timestamp(expect_value(&mut iter, "-to")?)?),
                "-c" | "-codec" | "-acodec" | "-c:a" => {
                    stream_copy = expect_value(&mut iter, arg)? == "copy";
                }
                "-y" | "-hide_banner" => {}
                flag if flag.starts_with('-') => {
                    return Err(CropError::InvalidArguments {
                        reason: format!("unsupported flag {}", flag),
                    })
                }
                positional => output = Some(positional.to_string()),
            }
        }

        let input = input.ok_or_else(|| CropError::InvalidArguments {
            reason: "missing -i <input>".to_string(),
        })?;
        let output = output.ok_or_else(|| CropError::InvalidArguments {
            reason: "missing output name".to_string(),
        })?;
        let end = end.ok_or_else(|| CropError::InvalidArguments {
            reason: "missing -to <end>".to_string(),
        })?;
        if end < start {
            return Err(CropError::InvalidArguments {
                reason: format!("-to {} is before -ss {}", end, start),
            });
        }

        Ok(Self {
            input,
            output,
            start,
            end,
            stream_copy,
        })
    }
}

fn expect_value<'a>(iter: &mut impl Iterator<Item = &'a str>, flag: &str) -> Result<&'a str> {
    iter.next().ok_or_else(|| CropError::InvalidArguments {
        reason: format!("{} expects a value", flag),
    })
}

/// Seconds as the shortest decimal that round-trips (2.5 -> "2.5")
pub fn format_timestamp(seconds: f64) -> String {
    format!("{}", seconds)
}

/// Parse `SS[.frac]`, `MM:SS[.frac]` or `HH:MM:SS[.frac]` into seconds
pub fn parse_timestamp(text: &str) -> Result<f64> {
    let invalid = || CropError::InvalidArguments {
        reason: format!("invalid timestamp '{}'", text),
    };
    let mut total = 0.0;
    let fields: Vec<&str> = text.trim().split(':').collect();
    if fields.is_empty() || fields.len() > 3 {
        return Err(invalid());
    }
    for field in &fields {
        let value: f64 = field.parse().map_err(|_| invalid())?;
        if !value.is_finite() || value < 0.0 {
            return Err(invalid());
        }
        total = total * 60.0 + value;
    }
    Ok(total)
}
