use argh::FromArgs;
use log::{error, info};
use planedelta_core::{
    container,
    player::{LoopMode, Player, PlayerConfig},
    projector::Interlace,
};

use crate::headless::{CountingDevice, Limited, SleepPacer};
use crate::minifb_lcd::{MinifbLcd, SharedLcd, WindowPacer};
use crate::std_fs::StdFilesystem;

mod headless;
mod minifb_lcd;
mod std_fs;

#[derive(FromArgs)]
/// Play encoded frames on an emulated LCD
struct Args {
    /// directory holding frame000.bin, the delta files and frames.txt
    #[argh(option, short = 'd', default = "String::from(\"frames\")")]
    dir: String,

    /// update the panel in one pass instead of even rows then odd rows
    #[argh(switch)]
    progressive: bool,

    /// show the keyframe again at the start of every loop
    #[argh(switch)]
    resync: bool,

    /// do not blank the panel before the first keyframe
    #[argh(switch)]
    no_clear: bool,

    /// window scale: 1, 2, 4 or 8
    #[argh(option, short = 's', default = "4")]
    scale: u8,

    /// run without a window, only counting register traffic
    #[argh(switch)]
    headless: bool,

    /// stop after this many frames
    #[argh(option, short = 'n')]
    frames: Option<usize>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Args = argh::from_env();
    if let Err(e) = run(&args) {
        error!("{e}");
        std::process::exit(1);
    }
}

fn scale(value: u8) -> Result<minifb::Scale, String> {
    match value {
        1 => Ok(minifb::Scale::X1),
        2 => Ok(minifb::Scale::X2),
        4 => Ok(minifb::Scale::X4),
        8 => Ok(minifb::Scale::X8),
        _ => Err(format!("unsupported scale {value}")),
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = PlayerConfig {
        interlace: if args.progressive {
            Interlace::Progressive
        } else {
            Interlace::Interlaced
        },
        loop_mode: if args.resync {
            LoopMode::Keyframe
        } else {
            LoopMode::Wrap
        },
        clear_on_start: !args.no_clear,
    };

    let fs = StdFilesystem::new_with_base_path(".".into());
    let sequence = container::load(&fs, &args.dir)?;

    if args.headless {
        let pacer = Limited::new(SleepPacer, args.frames);
        let mut player = Player::new(sequence, CountingDevice::default(), pacer, config);
        player.run()?;
        let (_, device, _) = player.into_parts();
        info!(
            "{} plane selects, {} register writes",
            device.selects, device.writes
        );
    } else {
        let lcd = SharedLcd::new(MinifbLcd::new(scale(args.scale)?));
        let pacer = Limited::new(WindowPacer::new(lcd.clone()), args.frames);
        Player::new(sequence, lcd.clone(), pacer, config).run()?;
        info!("{} register writes", lcd.0.borrow().writes());
    }
    Ok(())
}
