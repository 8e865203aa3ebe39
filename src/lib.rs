//! # magickbin
//!
//! A typed command builder and process driver for ImageMagick's `convert`
//! tool. The crate does no pixel work of its own: it translates a request
//! value into the tool's positional CLI grammar, runs the executable once
//! per request, and decodes what comes back on stdout.
//!
//! ```no_run
//! use magickbin::{ConvertRequest, Converter};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let converter = Converter::discover()?;
//! let request = ConvertRequest::builder()
//!     .input_file("scan.jpg")
//!     .output_file("scan.webp")
//!     .quality(85)
//!     .fuzz(10)
//!     .trim(true)
//!     .build()?;
//! converter.run(&request)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`request`] | Immutable [`ConvertRequest`] value + builder; enum-typed input/output variants |
//! | `command` | Renders a request into the argv tokens and stdin payload of one invocation |
//! | [`runner`] | Spawns the executable, pumps the pipes, surfaces exit status and timeouts |
//! | [`convert`] | The three operations: convert, trim-geometry query, version probe |
//! | [`geometry`] | Parses the tool's `WxH+X+Y` trim output and applies the caller's trim policy |
//!
//! # Design Decisions
//!
//! ## Requests Are Values
//!
//! A [`ConvertRequest`] is built once and never mutated. There is no hidden
//! state to reset between runs and no way to observe a half-reconfigured
//! request from another thread. Re-running the same input with fresh options
//! is [`ConvertRequest::with_default_options`] — construction, not mutation.
//!
//! ## Explicit Executable Resolution
//!
//! [`ConvertRunner::new`] takes the path to the executable; nothing in this
//! crate inspects the platform at load time or mutates process-global
//! defaults. [`ConvertRunner::discover`] is the one convenience — a plain
//! `PATH` lookup the composing application opts into. Downloading or
//! installing ImageMagick is out of scope entirely.
//!
//! ## Isolated Output Parsing
//!
//! The trim-geometry parser is a pure function from the tool's output text
//! to a structured rectangle. Process execution never leaks into it, so the
//! format contract — token shapes, integer fields, policy thresholds — is
//! covered by fast unit tests, and a different info format would touch one
//! module only.

mod command;
pub mod convert;
pub mod geometry;
pub mod request;
pub mod runner;

pub use command::InputEncodeError;
pub use convert::{ConvertError, ConvertOutcome, Converter};
pub use geometry::{GeometryError, TrimRect};
pub use request::{
    ConvertOptions, ConvertRequest, ConvertRequestBuilder, Input, OutputSink, Quality,
    UndefinedInput,
};
pub use runner::{ConvertRunner, RunError};
