//! In-process engine for PCM WAV
//!
//! Honours the same `-i/-ss/-to/-c copy` contract as ffmpeg. PCM frames are
//! copied verbatim with the source spec, which is what stream copy means
//! for uncompressed audio.

use std::collections::HashMap;
use std::io::Cursor;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::{debug, info};

use crate::engine::{validate_file_name, AudioProcessor, CropCommand};
use crate::error::{CropError, Result};

/// Pure-Rust engine with an in-memory working space
#[derive(Debug, Default)]
pub struct WavProcessor {
    loaded: bool,
    files: HashMap<String, Vec<u8>>,
}

impl WavProcessor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AudioProcessor for WavProcessor {
    fn name(&self) -> &str {
        "wav"
    }

    fn load(&mut self) -> Result<()> {
        if !self.loaded {
            info!("[ENGINE] Loaded in-process WAV engine");
            self.loaded = true;
        }
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn write_file(&mut self, name: &str, bytes: &[u8]) -> Result<()> {
        if !self.loaded {
            return Err(CropError::EngineNotReady);
        }
        validate_file_name(name)?;
        self.files.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn exec(&mut self, args: &[String]) -> Result<()> {
        if !self.loaded {
            return Err(CropError::EngineNotReady);
        }
        let command = CropCommand::parse(args)?;
        if !command.stream_copy {
            debug!("[ENGINE] Re-encode requested; PCM frames are copied as-is");
        }

        let input = self
            .files
            .get(&command.input)
            .ok_or_else(|| CropError::EngineInvocation {
                reason: format!("{}: no such file", command.input),
            })?;
        let output = crop_wav(input, command.start, command.end)?;
        debug!(
            "[ENGINE] Cropped {} -> {} ({} bytes)",
            command.input,
            command.output,
            output.len()
        );
        self.files.insert(command.output, output);
        Ok(())
    }

    fn read_file(&mut self, name: &str) -> Result<Vec<u8>> {
        match self.files.get(name) {
            Some(bytes) if !bytes.is_empty() => Ok(bytes.clone()),
            _ => Err(CropError::MissingOutput {
                name: name.to_string(),
            }),
        }
    }

    fn remove_file(&mut self, name: &str) -> Result<()> {
        self.files.remove(name);
        Ok(())
    }
}

/// Copy frames `[start, end)` seconds of a WAV file into a new WAV file
fn crop_wav(input: &[u8], start: f64, end: f64) -> Result<Vec<u8>> {
    let mut reader = WavReader::new(Cursor::new(input)).map_err(|e| CropError::EngineInvocation {
        reason: format!("input is not a WAV file: {}", e),
    })?;
    let spec = reader.spec();
    let total_frames = reader.duration();

    let first = ((start * spec.sample_rate as f64).floor() as u32).min(total_frames);
    let last = ((end * spec.sample_rate as f64).floor() as u32).min(total_frames);
    if last <= first {
        return Err(CropError::EngineInvocation {
            reason: format!("selection {:.3}s - {:.3}s contains no audio", start, end),
        });
    }

    reader.seek(first).map_err(|e| CropError::EngineInvocation {
        reason: format!("seek failed: {}", e),
    })?;
    let sample_count = (last - first) as usize * spec.channels as usize;

    let mut output = Vec::new();
    {
        let mut writer = WavWriter::new(Cursor::new(&mut output), spec).map_err(invocation)?;
        match spec.sample_format {
            SampleFormat::Float => {
                copy_samples::<f32>(&mut reader, &mut writer, sample_count)?;
            }
            SampleFormat::Int => {
                copy_samples::<i32>(&mut reader, &mut writer, sample_count)?;
            }
        }
        writer.finalize().map_err(invocation)?;
    }
    Ok(output)
}

fn copy_samples<S: hound::Sample>(
    reader: &mut WavReader<Cursor<&[u8]>>,
    writer: &mut WavWriter<Cursor<&mut Vec<u8>>>,
    count: usize,
) -> Result<()> {
    for sample in reader.samples::<S>().take(count) {
        writer.write_sample(sample.map_err(invocation)?).map_err(invocation)?;
    }
    Ok(())
}

fn invocation(e: hound::Error) -> CropError {
    CropError::EngineInvocation {
        reason: e.to_string(),
    }
}

/// Spec of a WAV buffer, if it parses
pub fn wav_spec(bytes: &[u8]) -> Option<WavSpec> {
    WavReader::new(Cursor::new(bytes)).ok().map(|r| r.spec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn stereo_wav(frames: u32, sample_rate: u32) -> Vec<u8> {
        let spec = WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut out = Vec::new();
        {
            let mut writer = WavWriter::new(Cursor::new(&mut out), spec).unwrap();
            for i in 0..frames {
                writer.write_sample((i % 1000) as i16).unwrap();
                writer.write_sample(-((i % 1000) as i16)).unwrap();
            }
            writer.finalize().unwrap();
        }
        out
    }

    fn loaded() -> WavProcessor {
        let mut engine = WavProcessor::new();
        engine.load().unwrap();
        engine
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_crop_copies_frames() {
        let mut engine = loaded();
        engine.write_file("input.wav", &stereo_wav(1000, 100)).unwrap();
        engine
            .exec(&args(&["-i", "input.wav", "-ss", "2.5", "-to", "7.3", "-c", "copy", "out.wav"]))
            .unwrap();

        let out = engine.read_file("out.wav").unwrap();
        let mut reader = WavReader::new(Cursor::new(out.as_slice())).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.duration(), 480);
        assert_relative_eq!(reader.duration() as f64 / 100.0, 4.8);

        let first: Vec<i16> = reader.samples::<i16>().take(2).map(|s| s.unwrap()).collect();
        assert_eq!(first, vec![250, -250]);
    }

    #[test]
    fn test_float_wav_is_supported() {
        let spec = WavSpec {
            channels: 1,
            sample_rate: 10,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut input = Vec::new();
        {
            let mut writer = WavWriter::new(Cursor::new(&mut input), spec).unwrap();
            for i in 0..100 {
                writer.write_sample(i as f32 / 100.0).unwrap();
            }
            writer.finalize().unwrap();
        }
        let output = crop_wav(&input, 1.0, 2.0).unwrap();
        assert_eq!(wav_spec(&output), Some(spec));
    }

    #[test]
    fn test_exec_requires_load() {
        let mut engine = WavProcessor::new();
        assert!(matches!(
            engine.exec(&args(&["-i", "a.wav", "-to", "1", "b.wav"])),
            Err(CropError::EngineNotReady)
        ));
    }

    #[test]
    fn test_missing_input_is_invocation_error() {
        let mut engine = loaded();
        let err = engine
            .exec(&args(&["-i", "nope.wav", "-ss", "0", "-to", "1", "o.wav"]))
            .unwrap_err();
        assert_eq!(err.error_code(), "ENGINE_INVOCATION");
    }

    #[test]
    fn test_empty_selection_fails() {
        let mut engine = loaded();
        engine.write_file("input.wav", &stereo_wav(100, 100)).unwrap();
        assert!(engine
            .exec(&args(&["-i", "input.wav", "-ss", "0.5", "-to", "0.5", "o.wav"]))
            .is_err());
        assert!(matches!(
            engine.read_file("o.wav"),
            Err(CropError::MissingOutput { .. })
        ));
    }

    #[test]
    fn test_non_wav_input_fails() {
        let mut engine = loaded();
        engine.write_file("input.wav", b"ID3 not a wav").unwrap();
        assert!(engine
            .exec(&args(&["-i", "input.wav", "-ss", "0", "-to", "1", "o.wav"]))
            .is_err());
    }
}
