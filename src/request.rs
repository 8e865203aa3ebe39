//! Request model for a single `convert` run.
//!
//! A [`ConvertRequest`] is an immutable description of one conversion: where
//! the pixels come from, where the result goes, and which options apply.
//! Requests are built with [`ConvertRequestBuilder`] and never mutated after
//! construction — re-running the same input with fresh options is expressed
//! by building a new value (see [`ConvertRequest::with_default_options`]).
//!
//! Input and output variants are enums, so a request can never hold two
//! input sources or two output sinks at once.

use image::DynamicImage;
use std::path::PathBuf;
use thiserror::Error;

/// A request was built without any input source.
///
/// Returned by [`ConvertRequestBuilder::build`]; no process is started.
#[derive(Debug, Error)]
#[error("no input source configured")]
pub struct UndefinedInput;

/// Where the pixels for a conversion come from.
#[derive(Debug, Clone)]
pub enum Input {
    /// Read from a file path, passed to the tool verbatim.
    File(PathBuf),
    /// Already-encoded image bytes, piped to the tool's stdin.
    Bytes(Vec<u8>),
    /// A decoded image, PNG-encoded in memory and piped to stdin.
    Image(DynamicImage),
}

impl Input {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File(path.into())
    }

    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(data.into())
    }

    pub fn image(image: DynamicImage) -> Self {
        Self::Image(image)
    }
}

/// Where the converted image goes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutputSink {
    /// The tool writes the file itself; the path is the final argument.
    File(PathBuf),
    /// Encoded bytes in the configured output format, captured from stdout
    /// and handed back to the caller.
    Encoded,
    /// Stdout captured as PNG and decoded into a [`DynamicImage`].
    #[default]
    Decoded,
}

/// Quality setting for lossy encoding.
///
/// 1 is the lowest quality and highest compression, 100 the best quality and
/// least effective compression. Values above 100 clamp to 100 on
/// construction. When no quality is set the tool uses the estimated quality
/// of the input image, or 92 if it cannot be determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

/// Per-run conversion options, all defaulted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertOptions {
    /// Lossy encoding quality; `None` leaves the tool's own default in place.
    pub quality: Option<Quality>,
    /// Color-distance tolerance in percent; 0 disables fuzzy matching.
    pub fuzz: u32,
    /// Crop away borders that match the corner pixel color.
    pub trim: bool,
    /// Output format tag used when encoding to stdout.
    pub format: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            quality: None,
            fuzz: 0,
            trim: false,
            format: "png".to_string(),
        }
    }
}

/// Immutable description of one conversion.
#[derive(Debug, Clone)]
pub struct ConvertRequest {
    pub(crate) input: Input,
    pub(crate) output: OutputSink,
    pub(crate) options: ConvertOptions,
}

impl ConvertRequest {
    pub fn builder() -> ConvertRequestBuilder {
        ConvertRequestBuilder::default()
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    pub fn output(&self) -> &OutputSink {
        &self.output
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// The same request with options restored to their defaults.
    ///
    /// Input and output selection is deliberately kept, so the same source
    /// can be re-run with a fresh set of options.
    pub fn with_default_options(mut self) -> Self {
        self.options = ConvertOptions::default();
        self
    }
}

/// Builder for [`ConvertRequest`].
///
/// Input and output setters replace any earlier choice in their group — the
/// last call wins. [`build`](Self::build) fails if no input was set.
#[derive(Debug, Default)]
pub struct ConvertRequestBuilder {
    input: Option<Input>,
    output: OutputSink,
    options: ConvertOptions,
}

impl ConvertRequestBuilder {
    /// Convert an image file on disk.
    pub fn input_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.input = Some(Input::file(path));
        self
    }

    /// Convert already-encoded image bytes.
    pub fn input_bytes(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.input = Some(Input::bytes(data));
        self
    }

    /// Convert a decoded in-memory image.
    pub fn input_image(mut self, image: DynamicImage) -> Self {
        self.input = Some(Input::image(image));
        self
    }

    /// Write the result to a file; the format follows the path's extension.
    pub fn output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = OutputSink::File(path.into());
        self
    }

    /// Return the encoded result bytes to the caller.
    pub fn output_encoded(mut self) -> Self {
        self.output = OutputSink::Encoded;
        self
    }

    /// Return the result as a decoded image (the default).
    pub fn output_decoded(mut self) -> Self {
        self.output = OutputSink::Decoded;
        self
    }

    /// Lossy encoding quality, 1-100. Values above 100 clamp to 100; 0 means
    /// unset and leaves the tool's default in place.
    pub fn quality(mut self, value: u32) -> Self {
        self.options.quality = (value > 0).then(|| Quality::new(value));
        self
    }

    /// Match colors within `percent` distance in RGB space instead of
    /// requiring an exact match. Useful together with [`trim`](Self::trim)
    /// on scanned images whose background color varies slightly.
    pub fn fuzz(mut self, percent: u32) -> Self {
        self.options.fuzz = percent;
        self
    }

    /// Remove any edges that are exactly the same color as the corner
    /// pixels. Combine with [`fuzz`](Self::fuzz) to also remove edges that
    /// are nearly that color.
    pub fn trim(mut self, trim: bool) -> Self {
        self.options.trim = trim;
        self
    }

    /// Output format tag used when encoding to stdout (default `png`).
    pub fn format(mut self, format: impl Into<String>) -> Self {
        self.options.format = format.into();
        self
    }

    pub fn build(self) -> Result<ConvertRequest, UndefinedInput> {
        let input = self.input.ok_or(UndefinedInput)?;
        Ok(ConvertRequest {
            input,
            output: self.output,
            options: self.options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_above_100() {
        assert_eq!(Quality::new(150).value(), 100);
        assert_eq!(Quality::new(100).value(), 100);
        assert_eq!(Quality::new(1).value(), 1);
    }

    #[test]
    fn quality_zero_means_unset() {
        let request = ConvertRequest::builder()
            .input_file("in.png")
            .quality(0)
            .build()
            .unwrap();
        assert_eq!(request.options().quality, None);
    }

    #[test]
    fn quality_above_100_is_stored_clamped() {
        let request = ConvertRequest::builder()
            .input_file("in.png")
            .quality(250)
            .build()
            .unwrap();
        assert_eq!(request.options().quality, Some(Quality::new(100)));
    }

    #[test]
    fn build_without_input_fails() {
        assert!(ConvertRequest::builder().build().is_err());
    }

    #[test]
    fn last_input_setter_wins() {
        let request = ConvertRequest::builder()
            .input_file("in.png")
            .input_bytes(vec![1, 2, 3])
            .build()
            .unwrap();
        assert!(matches!(request.input(), Input::Bytes(data) if data == &[1, 2, 3]));
    }

    #[test]
    fn last_output_setter_wins() {
        let request = ConvertRequest::builder()
            .input_file("in.png")
            .output_file("out.png")
            .output_encoded()
            .build()
            .unwrap();
        assert_eq!(request.output(), &OutputSink::Encoded);
    }

    #[test]
    fn default_output_is_decoded() {
        let request = ConvertRequest::builder().input_file("in.png").build().unwrap();
        assert_eq!(request.output(), &OutputSink::Decoded);
    }

    #[test]
    fn default_format_is_png() {
        assert_eq!(ConvertOptions::default().format, "png");
    }

    #[test]
    fn with_default_options_keeps_input_and_output() {
        let request = ConvertRequest::builder()
            .input_file("in.png")
            .output_file("out.webp")
            .quality(80)
            .fuzz(10)
            .trim(true)
            .format("webp")
            .build()
            .unwrap();

        let reset = request.with_default_options();
        assert_eq!(reset.options(), &ConvertOptions::default());
        assert!(matches!(reset.input(), Input::File(path) if path.as_os_str() == "in.png"));
        assert!(matches!(reset.output(), OutputSink::File(path) if path.as_os_str() == "out.webp"));
    }
}
