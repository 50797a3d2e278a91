use std::path::PathBuf;
use std::process::ExitCode;

use warpfield::backdrop::reduced_motion_from_env;
use warpfield::{Backdrop, RunError, SurfaceSize, WarpConfig};

const USAGE: &str = "usage: warpfield [--config PATH] [--seed N] [--reduced-motion] [--snapshot PATH --size WxH]";

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    seed: Option<u64>,
    reduced_motion: bool,
    snapshot: Option<PathBuf>,
    size: Option<SurfaceSize>,
}

fn parse_size(value: &str) -> Option<SurfaceSize> {
    let (w, h) = value.split_once(['x', 'X'])?;
    let (w, h) = (w.trim().parse().ok()?, h.trim().parse().ok()?);
    (w > 0 && h > 0).then(|| SurfaceSize::new(w, h))
}

fn parse_args(mut argv: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut args = Args::default();
    while let Some(arg) = argv.next() {
        let mut value = |name: &str| argv.next().ok_or_else(|| format!("{name} needs a value"));
        match arg.as_str() {
            "--config" => args.config = Some(PathBuf::from(value("--config")?)),
            "--seed" => {
                let raw = value("--seed")?;
                args.seed = Some(raw.parse().map_err(|_| format!("invalid seed: {raw}"))?);
            }
            "--reduced-motion" => args.reduced_motion = true,
            "--snapshot" => args.snapshot = Some(PathBuf::from(value("--snapshot")?)),
            "--size" => {
                let raw = value("--size")?;
                args.size = Some(parse_size(&raw).ok_or_else(|| format!("invalid size: {raw}"))?);
            }
            other => return Err(format!("unknown argument: {other}")),
        }
    }
    Ok(args)
}

fn run(args: Args) -> Result<(), RunError> {
    let mut backdrop = Backdrop::new()
        .with_reduced_motion(args.reduced_motion || reduced_motion_from_env());
    if let Some(path) = &args.config {
        backdrop = backdrop.with_config(WarpConfig::load(path)?);
    }
    if let Some(seed) = args.seed {
        backdrop = backdrop.with_seed(seed);
    }

    match args.snapshot {
        Some(path) => backdrop.snapshot(args.size.unwrap_or(SurfaceSize::new(1280, 720)), path),
        None => backdrop.run(),
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
