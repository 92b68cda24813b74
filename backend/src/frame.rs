//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

//! Media frames and the interface that codec components implement to take
//! part in a media path.

use std::{fmt, time::Duration};

use serde::Serialize;

/// Describes the media carried by a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Format {
    pub encoding: &'static str,
    pub sample_rate: u32,
    /// Bits per sample, for uncompressed audio.
    pub sample_size: Option<u8>,
    pub channels: Option<u8>,
}

/// 16-bit mono PCM at 8kHz.
pub const LINEAR_8K: Format = Format::linear_audio(8000, 16, 1);
pub const OPUS_48K: Format = Format::audio("opus", 48000);

impl Format {
    pub const fn audio(encoding: &'static str, sample_rate: u32) -> Self {
        Self {
            encoding,
            sample_rate,
            sample_size: None,
            channels: None,
        }
    }

    pub const fn linear_audio(sample_rate: u32, sample_size: u8, channels: u8) -> Self {
        Self {
            encoding: "linear",
            sample_rate,
            sample_size: Some(sample_size),
            channels: Some(channels),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.encoding, self.sample_rate)?;
        if let Some(sample_size) = self.sample_size {
            write!(f, "/{}", sample_size)?;
        }
        if let Some(channels) = self.channels {
            write!(f, "/{}", channels)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub payload: Vec<u8>,
    pub timestamp: u64,
    pub duration: Duration,
    pub sequence_number: u64,
    /// End of media.
    pub eom: bool,
    pub format: Format,
}

impl Frame {
    /// A frame with new content that keeps this frame's timing, sequence
    /// number and end-of-media flag.
    pub fn derive(&self, payload: Vec<u8>, format: Format) -> Self {
        Self {
            payload,
            format,
            ..self.metadata_only()
        }
    }

    pub(crate) fn copy_metadata_from(&mut self, other: &Frame) {
        self.timestamp = other.timestamp;
        self.duration = other.duration;
        self.sequence_number = other.sequence_number;
        self.eom = other.eom;
    }

    fn metadata_only(&self) -> Self {
        Self {
            payload: Vec::new(),
            timestamp: self.timestamp,
            duration: self.duration,
            sequence_number: self.sequence_number,
            eom: self.eom,
            format: self.format,
        }
    }
}

/// A stateful transformation of frames from one format to another.
///
/// Implementations must accept frames in [`Codec::supported_input_format`]
/// and return frames in [`Codec::supported_output_format`]. `reset` puts the
/// codec back into its initial state without reallocating it.
pub trait Codec: Send {
    fn supported_input_format(&self) -> Format;
    fn supported_output_format(&self) -> Format;
    fn process(&mut self, frame: Frame) -> Frame;
    fn reset(&mut self);
}
