use clap::{Parser, Subcommand};
use magickbin::{ConvertOutcome, ConvertRequest, Converter, ConvertRunner, Input};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "magickbin")]
#[command(about = "Drive a locally installed ImageMagick convert tool")]
#[command(version)]
struct Cli {
    /// Path to the convert executable (default: first `convert` on PATH)
    #[arg(long, global = true)]
    convert_bin: Option<PathBuf>,

    /// Kill the tool if it runs longer than this many seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Convert one image; `-` reads stdin, `-` as output writes encoded
    /// bytes to stdout
    Convert {
        input: PathBuf,
        output: PathBuf,
        /// Encoding quality, 1-100 (values above 100 are clamped)
        #[arg(long)]
        quality: Option<u32>,
        /// Color-distance tolerance in percent
        #[arg(long, default_value_t = 0)]
        fuzz: u32,
        /// Trim borders matching the corner pixel color
        #[arg(long)]
        trim: bool,
        /// Output format tag used when writing to stdout
        #[arg(long, default_value = "png")]
        format: String,
    },
    /// Report the crop a trim would perform, without performing it
    TrimInfo {
        input: PathBuf,
        /// Color-distance tolerance in percent
        #[arg(long, default_value_t = 0)]
        fuzz: u32,
        /// Fail when trimming would keep less than this percent of the image
        #[arg(long, default_value_t = 0)]
        threshold: u32,
        /// Print the rectangle as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the convert tool's version line
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut runner = match &cli.convert_bin {
        Some(path) => ConvertRunner::new(path),
        None => ConvertRunner::discover()?,
    };
    if let Some(secs) = cli.timeout_secs {
        runner = runner.with_timeout(Duration::from_secs(secs));
    }
    let converter = Converter::new(runner);

    match cli.command {
        Command::Convert {
            input,
            output,
            quality,
            fuzz,
            trim,
            format,
        } => {
            let mut builder = ConvertRequest::builder();

            builder = if input == Path::new("-") {
                let mut data = Vec::new();
                std::io::stdin().read_to_end(&mut data)?;
                builder.input_bytes(data)
            } else {
                builder.input_file(input)
            };

            builder = if output == Path::new("-") {
                builder.output_encoded()
            } else {
                builder.output_file(output)
            };

            if let Some(quality) = quality {
                builder = builder.quality(quality);
            }
            let request = builder.fuzz(fuzz).trim(trim).format(format).build()?;

            if let ConvertOutcome::Encoded(bytes) = converter.run(&request)? {
                std::io::stdout().write_all(&bytes)?;
            }
        }
        Command::TrimInfo {
            input,
            fuzz,
            threshold,
            json,
        } => {
            let rect = converter.trim_info(&Input::file(input), fuzz, threshold)?;
            if json {
                println!("{}", serde_json::to_string(&rect)?);
            } else {
                println!("{rect}");
            }
        }
        Command::Version => {
            println!("{}", converter.version()?);
        }
    }

    Ok(())
}
