use argh::FromArgs;
use log::{debug, error, info};
use planedelta_core::{
    container,
    encoder::{EncodedFrame, Encoder},
};

use crate::std_fs::StdFilesystem;

mod gif_source;
mod std_fs;

#[derive(FromArgs)]
/// Convert an animated GIF into a keyframe, per-plane delta files and a delay table
struct Args {
    /// input GIF path
    #[argh(option, short = 'i')]
    input_path: String,

    /// output directory
    #[argh(option, short = 'o', default = "String::from(\"frames\")")]
    output_dir: String,

    /// delay in milliseconds for frames that do not specify one
    #[argh(option, short = 'd', default = "100")]
    default_delay: u32,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();
    if let Err(e) = run(&args) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let data = std::fs::read(&args.input_path)?;
    let frames = gif_source::decode_gif(&data, args.default_delay)?;
    info!("Decoded {} frames from {}", frames.len(), args.input_path);

    let mut encoder = Encoder::new();
    let mut delta_bytes = 0;
    for (index, source) in frames.iter().enumerate() {
        match encoder.push(&source.frame, source.delay_ms) {
            EncodedFrame::Key(_) => debug!("frame {index}: keyframe"),
            EncodedFrame::Delta(pair) => delta_bytes += pair.bit0.len() + pair.bit4.len(),
        }
    }
    let sequence = encoder.finish()?;

    let fs = StdFilesystem::new_with_base_path(".".into());
    container::store(&fs, &args.output_dir, &sequence)?;
    info!(
        "Delta frames exported to {}: {} frames, {} delta bytes",
        args.output_dir,
        sequence.len(),
        delta_bytes
    );
    Ok(())
}
