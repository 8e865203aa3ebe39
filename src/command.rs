//! Rendering a request into a `convert` argument vector.
//!
//! The tool's CLI grammar is positional: input token first, then options in
//! a fixed order, then the output token last. Stdin-fed inputs use the `-`
//! pseudo-path; stdout-bound outputs use a `<format>:-` pseudo-path.

use crate::request::{ConvertRequest, Input, OutputSink};
use image::DynamicImage;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use std::ffi::OsString;
use thiserror::Error;

/// An in-memory input image could not be PNG-encoded for the stdin handoff.
#[derive(Debug, Error)]
#[error("failed to encode input image for stdin: {source}")]
pub struct InputEncodeError {
    #[from]
    source: image::ImageError,
}

/// Argument vector plus the stdin payload that goes with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RenderedCommand {
    pub args: Vec<OsString>,
    pub stdin: Option<Vec<u8>>,
}

/// Render a full conversion: input token, options, output token.
pub(crate) fn render(request: &ConvertRequest) -> Result<RenderedCommand, InputEncodeError> {
    let mut args = Vec::new();
    let stdin = push_input(&mut args, &request.input)?;

    let options = &request.options;
    if let Some(quality) = options.quality {
        args.push("-quality".into());
        args.push(quality.value().to_string().into());
    }
    if options.fuzz > 0 {
        args.push("-fuzz".into());
        args.push(format!("{}%", options.fuzz).into());
    }
    if options.trim {
        args.push("-trim".into());
        // +repage drops the canvas offset left behind by the crop
        args.push("+repage".into());
    }

    match &request.output {
        OutputSink::File(path) => args.push(path.clone().into_os_string()),
        OutputSink::Encoded => args.push(format!("{}:-", options.format).into()),
        OutputSink::Decoded => args.push("png:-".into()),
    }

    Ok(RenderedCommand { args, stdin })
}

/// Render a trim-geometry query: `info:` makes the tool describe the crop it
/// would perform instead of performing it.
pub(crate) fn render_trim_info(input: &Input, fuzz: u32) -> Result<RenderedCommand, InputEncodeError> {
    let mut args = Vec::new();
    let stdin = push_input(&mut args, input)?;
    args.push("-fuzz".into());
    args.push(format!("{fuzz}%").into());
    args.push("-trim".into());
    args.push("info:".into());
    Ok(RenderedCommand { args, stdin })
}

fn push_input(args: &mut Vec<OsString>, input: &Input) -> Result<Option<Vec<u8>>, InputEncodeError> {
    match input {
        Input::File(path) => {
            args.push(path.clone().into_os_string());
            Ok(None)
        }
        Input::Bytes(data) => {
            args.push("-".into());
            Ok(Some(data.clone()))
        }
        Input::Image(image) => {
            let payload = encode_stdin_png(image)?;
            args.push("-".into());
            Ok(Some(payload))
        }
    }
}

/// Lossless PNG at the fastest compression setting: the tool re-encodes
/// anyway, so spending CPU on compression before the handoff buys nothing.
fn encode_stdin_png(image: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut payload = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        &mut payload,
        CompressionType::Fast,
        FilterType::NoFilter,
    );
    image.write_with_encoder(encoder)?;
    Ok(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn args_of(rendered: &RenderedCommand) -> Vec<&str> {
        rendered
            .args
            .iter()
            .map(|arg| arg.to_str().unwrap())
            .collect()
    }

    #[test]
    fn file_to_file_with_all_options() {
        let request = ConvertRequest::builder()
            .input_file("in.jpg")
            .output_file("out.png")
            .quality(80)
            .fuzz(5)
            .trim(true)
            .build()
            .unwrap();

        let rendered = render(&request).unwrap();
        assert_eq!(
            args_of(&rendered),
            ["in.jpg", "-quality", "80", "-fuzz", "5%", "-trim", "+repage", "out.png"]
        );
        assert_eq!(rendered.stdin, None);
    }

    #[test]
    fn unset_options_emit_no_flags() {
        let request = ConvertRequest::builder()
            .input_file("in.jpg")
            .output_file("out.png")
            .build()
            .unwrap();

        let rendered = render(&request).unwrap();
        assert_eq!(args_of(&rendered), ["in.jpg", "out.png"]);
    }

    #[test]
    fn decoded_output_appends_png_stdout_token() {
        let request = ConvertRequest::builder().input_file("in.jpg").build().unwrap();
        let rendered = render(&request).unwrap();
        assert_eq!(args_of(&rendered), ["in.jpg", "png:-"]);
    }

    #[test]
    fn encoded_output_uses_configured_format() {
        let request = ConvertRequest::builder()
            .input_file("in.jpg")
            .output_encoded()
            .format("webp")
            .build()
            .unwrap();
        let rendered = render(&request).unwrap();
        assert_eq!(args_of(&rendered), ["in.jpg", "webp:-"]);
    }

    #[test]
    fn bytes_input_binds_stdin() {
        let request = ConvertRequest::builder()
            .input_bytes(vec![0x89, 0x50])
            .output_file("out.png")
            .build()
            .unwrap();
        let rendered = render(&request).unwrap();
        assert_eq!(args_of(&rendered), ["-", "out.png"]);
        assert_eq!(rendered.stdin, Some(vec![0x89, 0x50]));
    }

    #[test]
    fn bytes_and_image_inputs_render_identical_args() {
        let image = RgbImage::from_pixel(4, 4, image::Rgb([10, 20, 30]));
        let from_image = ConvertRequest::builder()
            .input_image(image.into())
            .output_file("out.png")
            .build()
            .unwrap();
        let from_bytes = ConvertRequest::builder()
            .input_bytes(vec![1, 2, 3])
            .output_file("out.png")
            .build()
            .unwrap();

        let rendered_image = render(&from_image).unwrap();
        let rendered_bytes = render(&from_bytes).unwrap();
        assert_eq!(rendered_image.args, rendered_bytes.args);
        assert!(rendered_image.stdin.is_some());
    }

    #[test]
    fn image_input_stdin_is_valid_png() {
        let image = RgbImage::from_pixel(6, 3, image::Rgb([200, 100, 50]));
        let request = ConvertRequest::builder()
            .input_image(image.into())
            .output_file("out.png")
            .build()
            .unwrap();

        let rendered = render(&request).unwrap();
        let payload = rendered.stdin.unwrap();
        let decoded =
            image::load_from_memory_with_format(&payload, image::ImageFormat::Png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (6, 3));
    }

    #[test]
    fn trim_info_always_renders_fuzz_and_info_output() {
        let rendered = render_trim_info(&Input::file("in.png"), 0).unwrap();
        assert_eq!(args_of(&rendered), ["in.png", "-fuzz", "0%", "-trim", "info:"]);

        let rendered = render_trim_info(&Input::file("in.png"), 25).unwrap();
        assert_eq!(args_of(&rendered), ["in.png", "-fuzz", "25%", "-trim", "info:"]);
    }
}
