//
// Copyright 2024 Signal Messenger, LLC
// SPDX-License-Identifier: AGPL-3.0-only
//

use log::*;
use thiserror::Error;

use crate::frame::{Codec, Format, Frame};

#[derive(Error, Debug, Eq, PartialEq)]
pub enum PipelineError {
    #[error("a pipeline needs at least one stage")]
    Empty,
    #[error("stage {stage} produces {output} but the next stage expects {input}")]
    FormatMismatch {
        stage: usize,
        output: Format,
        input: Format,
    },
    #[error("pipeline expects {expected} but received {received}")]
    UnsupportedInputFormat { expected: Format, received: Format },
}

/// A chain of codecs, each feeding the next.
///
/// Whatever a stage does to the frame's payload and format, the timestamp,
/// duration, sequence number and end-of-media flag leave the pipeline as they
/// came in.
pub struct Pipeline {
    stages: Vec<Box<dyn Codec>>,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Codec>>) -> Result<Self, PipelineError> {
        if stages.is_empty() {
            return Err(PipelineError::Empty);
        }
        for (stage, (current, next)) in stages.iter().zip(stages.iter().skip(1)).enumerate() {
            let output = current.supported_output_format();
            let input = next.supported_input_format();
            if output != input {
                return Err(PipelineError::FormatMismatch {
                    stage,
                    output,
                    input,
                });
            }
        }
        Ok(Self { stages })
    }

    pub fn input_format(&self) -> Format {
        self.stages[0].supported_input_format()
    }

    pub fn output_format(&self) -> Format {
        self.stages[self.stages.len() - 1].supported_output_format()
    }

    pub fn process(&mut self, frame: Frame) -> Result<Frame, PipelineError> {
        let expected = self.input_format();
        if frame.format != expected {
            return Err(PipelineError::UnsupportedInputFormat {
                expected,
                received: frame.format,
            });
        }
        let original = frame.derive(Vec::new(), frame.format);
        let mut frame = frame;
        for stage in self.stages.iter_mut() {
            frame = stage.process(frame);
            frame.copy_metadata_from(&original);
        }
        Ok(frame)
    }

    pub fn reset(&mut self) {
        debug!("resetting {} pipeline stages", self.stages.len());
        for stage in self.stages.iter_mut() {
            stage.reset();
        }
    }
}
