use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context as _;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use wgblur::{
    pixel, AccelPipeline, CompileOptions, ConvolutionPipeline, DeviceClass, HostPipeline,
    ImageKind, PipelineConfig, WgBackend, WgError, DEFAULT_KERNEL_SOURCE,
};

/// Convert an image to grayscale and apply a Gaussian blur.
#[derive(Parser, Debug)]
#[command(name = "wgblur", version)]
struct Cli {
    /// WGSL kernel source defining `img_grayscale` and `img_gaussian_blur`.
    /// Optional: without it the built-in kernels are compiled instead of
    /// failing for a missing file name.
    #[arg(short = 'f', long = "kernel")]
    kernel: Option<PathBuf>,

    /// Source image.
    #[arg(short = 'i', long = "image")]
    image: PathBuf,

    /// Output image; the format follows the extension.
    #[arg(short = 'o', long = "output", default_value = "out.png")]
    output: PathBuf,

    /// Class of compute device to run on.
    #[arg(long, value_enum, default_value_t = DeviceChoice::Cpu)]
    device: DeviceChoice,

    /// Run both stages on the host instead of the accelerator.
    #[arg(long)]
    host: bool,

    /// Raise log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum DeviceChoice {
    Cpu,
    Gpu,
    Any,
}

impl From<DeviceChoice> for DeviceClass {
    fn from(choice: DeviceChoice) -> Self {
        match choice {
            DeviceChoice::Cpu => DeviceClass::Cpu,
            DeviceChoice::Gpu => DeviceClass::Gpu,
            DeviceChoice::Any => DeviceClass::Any,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            if let Some(diagnostics) = err.downcast_ref::<WgError>().and_then(WgError::diagnostics) {
                eprintln!("{diagnostics}");
            }
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "wgblur=info",
        1 => "wgblur=debug",
        _ => "wgblur=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let source = match &cli.kernel {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("read kernel source '{}'", path.display()))?,
        None => DEFAULT_KERNEL_SOURCE.to_string(),
    };

    let decoded = image::open(&cli.image)
        .with_context(|| format!("load image '{}'", cli.image.display()))?
        .to_rgb8();
    let rgb = pixel::from_rgb_image(&decoded, ImageKind::Rgb)?;
    tracing::info!(width = rgb.width(), height = rgb.height(), "loaded image");

    let config = PipelineConfig {
        device: cli.device.into(),
        ..PipelineConfig::default()
    };

    let gray = if cli.host {
        filter(&HostPipeline::new(config.kernel.clone()), &rgb)?
    } else {
        let backend = WgBackend::new(config.device)?;
        let info = backend.device_info();
        tracing::info!(adapter = %info.name, backend = ?info.backend, "using device");
        let program = backend.compile_program(&source, &CompileOptions::default())?;
        filter(&AccelPipeline::new(&backend, &program, &config), &rgb)?
    };

    save(&pixel::to_rgb_image(&gray)?, &cli.output)?;
    tracing::info!(output = %cli.output.display(), "wrote image");
    Ok(())
}

fn filter(
    pipeline: &dyn ConvolutionPipeline,
    rgb: &wgblur::ImageContext,
) -> anyhow::Result<wgblur::ImageContext> {
    Ok(wgblur::run(pipeline, rgb)?)
}

fn save(image: &image::RgbImage, path: &Path) -> anyhow::Result<()> {
    let format = image::ImageFormat::from_path(path).unwrap_or(image::ImageFormat::Png);
    image
        .save_with_format(path, format)
        .with_context(|| format!("write image '{}'", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_path_is_optional() {
        let cli = Cli::try_parse_from(["wgblur", "-i", "in.png"]).unwrap();
        assert!(cli.kernel.is_none());
        assert_eq!(cli.output, PathBuf::from("out.png"));
        assert!(matches!(cli.device, DeviceChoice::Cpu));

        let cli = Cli::try_parse_from(["wgblur", "-f", "k.wgsl", "-i", "in.png"]).unwrap();
        assert_eq!(cli.kernel, Some(PathBuf::from("k.wgsl")));
    }

    #[test]
    fn image_path_is_required() {
        assert!(Cli::try_parse_from(["wgblur", "-f", "k.wgsl"]).is_err());
    }
}
