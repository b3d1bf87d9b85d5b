//! Scripted engine for tests
//!
//! Records every call and can be told to fail at load, at exec, or to
//! silently produce no output. A successful exec copies the input bytes to
//! the output name.

use std::collections::HashMap;

use crate::engine::{AudioProcessor, CropCommand};
use crate::error::{CropError, Result};

/// Mock audio engine
#[derive(Debug, Default)]
pub struct MockProcessor {
    loaded: bool,
    fail_load: Option<String>,
    fail_exec: Option<String>,
    skip_output: bool,
    files: HashMap<String, Vec<u8>>,
    /// Argument lists passed to `exec`, in call order
    pub exec_calls: Vec<Vec<String>>,
    /// Names passed to `write_file`, in call order
    pub writes: Vec<String>,
    /// Names passed to `read_file`, in call order
    pub reads: Vec<String>,
    pub load_calls: usize,
}

impl MockProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// `load` fails with this reason
    pub fn failing_load(reason: impl Into<String>) -> Self {
        Self {
            fail_load: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Every `exec` fails with `reason` until cleared
    pub fn fail_exec_with(&mut self, reason: impl Into<String>) {
        self.fail_exec = Some(reason.into());
    }

    pub fn clear_exec_failure(&mut self) {
        self.fail_exec = None;
    }

    /// `exec` succeeds but writes nothing
    pub fn skip_output(&mut self, skip: bool) {
        self.skip_output = skip;
    }

    /// Last parsed crop command
    pub fn last_command(&self) -> Option<CropCommand> {
        self.exec_calls
            .last()
            .and_then(|args| CropCommand::parse(args.as_slice()).ok())
    }

    pub fn file(&self, name: &str) -> Option<&[u8]> {
        self.files.get(name).map(Vec::as_slice)
    }
}

impl AudioProcessor for MockProcessor {
    fn name(&self) -> &str {
        "mock"
    }

    fn load(&mut self) -> Result<()> {
        self.load_calls += 1;
        if let Some(reason) = &self.fail_load {
            return Err(CropError::EngineInit {
                reason: reason.clone(),
            });
        }
        self.loaded = true;
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn write_file(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        if !self.loaded {
            return Err(CropError::EngineNotReady);
        }
        self.writes.push(name.to_string());
        self.files.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn exec(&mut self, args: &[String]) -> Result<()> {
        if !self.loaded {
            return Err(CropError::EngineNotReady);
        }
        self.exec_calls.push(args.to_vec());
        if let Some(reason) = &self.fail_exec {
            return Err(CropError::EngineInvocation {
                reason: reason.clone(),
            });
        }
        if self.skip_output {
            return Ok(());
        }

        let command = CropCommand::parse(args)?;
        let input = self
            .files
            .get(&command.input)
            .cloned()
            .ok_or_else(|| CropError::EngineInvocation {
                reason: format!("{}: no such file", command.input),
            })?;
        self.files.insert(command.output, input);
        Ok(())
    }

    fn read_file(&mut self, name: &str) -> Result<Vec<u8>> {
        self.reads.push(name.to_string());
        self.files
            .get(name)
            .cloned()
            .ok_or_else(|| CropError::MissingOutput {
                name: name.to_string(),
            })
    }

    fn remove_file(&mut self, name: &str) -> Result<()> {
        self.files.remove(name);
        Ok(())
    }
}
