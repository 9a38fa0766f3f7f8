//! CHIP-8 shell.

use std::io;
use std::path::PathBuf;
use std::process;

use argh::FromArgs;
use ocho_core::drivers::FrontendInterface;
use ocho_core::emulator::{
    Emulator, EmulatorContext, IllegalOpcodePolicy, DEFAULT_CYCLES_PER_FRAME,
};
use ocho_core::errors::{CResult, Fault};
use ocho_core::peripherals::cartridge::Cartridge;
use ocho_drivers::{BellAudioDriver, TermionFrontend};

/// CHIP-8 emulator
#[derive(FromArgs)]
pub struct Args {
    /// path to the ROM file
    #[argh(positional)]
    pub rom: PathBuf,

    /// print the ROM disassembly and exit
    #[argh(switch, short = 'd')]
    pub disassemble: bool,

    /// write an execution trace to a file ("-" for stdout)
    #[argh(option, short = 't')]
    pub trace: Option<String>,

    /// instructions per 60 Hz frame
    #[argh(option, short = 'c', default = "DEFAULT_CYCLES_PER_FRAME")]
    pub cycles: u32,

    /// step over unknown opcodes instead of halting
    #[argh(switch)]
    pub skip_illegal: bool,

    /// use the terminal bell instead of the audio device
    #[argh(switch, short = 'm')]
    pub mute: bool,
}

fn main() {
    let args: Args = argh::from_env();

    let s = tracing_subscriber::fmt();
    s.compact().init();

    // Exit 1 when the ROM cannot be loaded, 2 when execution traps.
    let cartridge = match Cartridge::load_from_path(&args.rom) {
        Ok(cartridge) => cartridge,
        Err(error) => {
            eprintln!("{}", error);
            process::exit(1);
        }
    };

    if args.disassemble {
        if let Err(error) = cartridge.write_disassembly_to_stream(&mut io::stdout()) {
            eprintln!("{}", error);
            process::exit(1);
        }
        return;
    }

    if let Err(error) = run(&args, &cartridge) {
        eprintln!("execution error: {}", error);
        let code = if error.downcast_ref::<Fault>().is_some() {
            2
        } else {
            1
        };
        process::exit(code);
    }
}

fn run(args: &Args, cartridge: &Cartridge) -> CResult {
    let mut emulator = Emulator::new();
    let mut ctx = EmulatorContext::new();

    ctx.cycles_per_frame = args.cycles;
    if args.skip_illegal {
        ctx.illegal_opcode_policy = IllegalOpcodePolicy::Skip;
    }
    ctx.prepare_tracefile(&args.trace)?;

    emulator.load_game(cartridge);
    set_audio_driver(&mut emulator, args.mute);

    tracing::info!(
        "running {:?} at {} cycles per frame",
        cartridge.get_title(),
        ctx.cycles_per_frame
    );

    let mut frontend = TermionFrontend::new();
    frontend.run_emulator(emulator, ctx)
}

#[cfg(feature = "audio")]
fn set_audio_driver(emulator: &mut Emulator, mute: bool) {
    if mute {
        emulator
            .cpu
            .drivers
            .set_audio_driver(Box::new(BellAudioDriver::new()));
        return;
    }

    match ocho_drivers::RodioAudioDriver::new() {
        Ok(driver) => emulator.cpu.drivers.set_audio_driver(Box::new(driver)),
        Err(error) => {
            tracing::warn!("audio device unavailable ({}), using the terminal bell", error);
            emulator
                .cpu
                .drivers
                .set_audio_driver(Box::new(BellAudioDriver::new()));
        }
    }
}

#[cfg(not(feature = "audio"))]
fn set_audio_driver(emulator: &mut Emulator, _mute: bool) {
    emulator
        .cpu
        .drivers
        .set_audio_driver(Box::new(BellAudioDriver::new()));
}
