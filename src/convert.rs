//! High-level conversion operations.
//!
//! [`Converter`] composes a [`ConvertRunner`] explicitly and exposes the
//! three operations the tool is driven for: a full conversion
//! ([`run`](Converter::run)), a trim-geometry query
//! ([`trim_info`](Converter::trim_info)) and a version probe
//! ([`version`](Converter::version)).

use crate::command::{self, InputEncodeError, RenderedCommand};
use crate::geometry::{self, GeometryError, TrimRect};
use crate::request::{ConvertRequest, Input, OutputSink, UndefinedInput};
use crate::runner::{ConvertRunner, RunError};
use image::DynamicImage;
use std::ffi::OsString;
use thiserror::Error;
use tracing::debug;

/// Everything that can go wrong between building a request and decoding the
/// tool's output.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error(transparent)]
    UndefinedInput(#[from] UndefinedInput),
    #[error(transparent)]
    EncodeInput(#[from] InputEncodeError),
    #[error(transparent)]
    Run(#[from] RunError),
    #[error("convert output is not a valid PNG image: {0}")]
    DecodeOutput(#[source] image::ImageError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}

/// Result of a conversion, mirroring the request's output sink.
#[derive(Debug)]
pub enum ConvertOutcome {
    /// The tool wrote the requested output file; nothing to hand back.
    File,
    /// Encoded bytes in the requested format.
    Encoded(Vec<u8>),
    /// The decoded image.
    Decoded(DynamicImage),
}

impl ConvertOutcome {
    pub fn into_image(self) -> Option<DynamicImage> {
        match self {
            Self::Decoded(image) => Some(image),
            _ => None,
        }
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Self::Encoded(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// Drives one `convert` executable.
pub struct Converter {
    runner: ConvertRunner,
}

impl Converter {
    pub fn new(runner: ConvertRunner) -> Self {
        Self { runner }
    }

    /// Converter over the first `convert` found on `PATH`.
    pub fn discover() -> Result<Self, RunError> {
        Ok(Self::new(ConvertRunner::discover()?))
    }

    pub fn runner(&self) -> &ConvertRunner {
        &self.runner
    }

    /// Run one conversion as described by `request`.
    pub fn run(&self, request: &ConvertRequest) -> Result<ConvertOutcome, ConvertError> {
        let RenderedCommand { args, stdin } = command::render(request)?;
        let output = self.runner.run(&args, stdin)?;

        match request.output() {
            OutputSink::File(_) => Ok(ConvertOutcome::File),
            OutputSink::Encoded => Ok(ConvertOutcome::Encoded(output.stdout)),
            OutputSink::Decoded => {
                let image =
                    image::load_from_memory_with_format(&output.stdout, image::ImageFormat::Png)
                        .map_err(ConvertError::DecodeOutput)?;
                Ok(ConvertOutcome::Decoded(image))
            }
        }
    }

    /// Ask the tool what a trim with `fuzz` percent tolerance would crop,
    /// without performing the crop.
    ///
    /// Fails with [`GeometryError::TooMuchTrimmed`] when the kept area would
    /// fall below `threshold` percent of the original, and with
    /// [`GeometryError::NothingToTrim`] when there is no border to remove.
    pub fn trim_info(
        &self,
        input: &Input,
        fuzz: u32,
        threshold: u32,
    ) -> Result<TrimRect, ConvertError> {
        let RenderedCommand { args, stdin } = command::render_trim_info(input, fuzz)?;
        let output = self.runner.run(&args, stdin)?;

        let text = String::from_utf8_lossy(&output.stdout);
        let parsed = geometry::parse_trim_geometry(&text)?;
        debug!(?parsed, "parsed trim geometry");
        Ok(geometry::evaluate(parsed, threshold)?)
    }

    /// The tool's version banner, first line only.
    pub fn version(&self) -> Result<String, ConvertError> {
        let output = self.runner.run(&[OsString::from("-version")], None)?;
        let text = String::from_utf8_lossy(&output.stdout);
        Ok(text.lines().next().unwrap_or_default().to_string())
    }
}
