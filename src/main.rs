

#[macro_use]
extern crate log;

use argparse::{ArgumentParser, Parse, ParseOption, Print, Store, StoreOption, StoreTrue, StoreFalse};
use std::fs::File;
use std::path::PathBuf;

mod logger;
mod hardware;
mod repl;


struct CmdLineArgs {
    firmware_file_path: Option<PathBuf>,
    disk_file_path: Option<PathBuf>,
    log_file_path: PathBuf,
    load_addr: Option<String>,
    steps: Option<u64>,
    sdram_mib: usize,
    protect_timer1: bool,
    single_disasm_arm: Option<String>,
    interactive: bool,
    verbose: bool,
    colour: bool,
}

impl Default for CmdLineArgs {
    //
    fn default() -> CmdLineArgs {
        CmdLineArgs {
            firmware_file_path: None,
            disk_file_path: None,
            log_file_path: PathBuf::from("./PodRs.log"),
            load_addr: None,
            steps: None,
            sdram_mib: 32,
            protect_timer1: false,
            single_disasm_arm: None,
            interactive: false,
            verbose: false,
            colour: true,
        }
    }
}


fn main() {
    // Build command line parser.
    let mut args = CmdLineArgs::default();
    parse_command_line(&mut args);
    configure_logging(&args);
    handle_oneshot_commands(&args);

    // Prepare the iPod.
    let mut pod = match build_pod(&args) {
        Ok(pod) => pod,
        Err(e) => { error!("Failed preparing the emulator:\n{}", e); return; },
    };

    pod.reset();
    if args.interactive {
        repl::PodRepl::new().with_colour(args.colour).run(&mut pod);
    } else {
        let executed = pod.run(args.steps);
        info!("Executed {} instructions.", executed);
    }

    if let Err(e) = pod.flush_disk() {
        error!("Failed writing the disk image back:\n{}", e);
    }
}


fn parse_command_line(args: &mut CmdLineArgs) {
    let mut parser = ArgumentParser::new();
    parser.set_description("A 5th-generation iPod emulator written in Rust.");
    parser.add_option(&["-V", "--version"],
                      Print(format!("PodRs v{}", env!("CARGO_PKG_VERSION"))),
                      "Show current version.");
    parser.refer(&mut args.firmware_file_path)
          .add_option(&["--firmware"], ParseOption,
                      "Path to a firmware image to load. Either a raw binary \
                       or a full image with the master header.")
          .metavar("PATH");
    parser.refer(&mut args.disk_file_path)
          .add_option(&["--disk"], ParseOption, "Path to a disk image behind the ATA controller.")
          .metavar("PATH");
    parser.refer(&mut args.log_file_path)
          .add_option(&["--log"], Parse, "Custom path for the log file.")
          .metavar("PATH");
    parser.refer(&mut args.load_addr)
          .add_option(&["--load-addr"], StoreOption,
                      "Load address for a raw firmware binary as a hex number \
                       without base, e.g. 40000000. Also the reset PC.")
          .metavar("ADDR");
    parser.refer(&mut args.steps)
          .add_option(&["--steps"], StoreOption, "Stop after this many instructions.")
          .metavar("N");
    parser.refer(&mut args.sdram_mib)
          .add_option(&["--sdram"], Store, "SDRAM size in MiB, 32 (default) or 64.")
          .metavar("MIB");
    parser.refer(&mut args.protect_timer1)
          .add_option(&["--protect-timer1"], StoreTrue,
                      "Keep the Timer1 interrupt enabled across firmware disable writes.");
    parser.refer(&mut args.single_disasm_arm)
          .add_option(&["--dasm-arm"], StoreOption,
                      "Prints the disassembly of the given ARM state instruction. \
                       The instruction must be a hex number without base, e.g. 01F7344, \
                       in Big Endian format, i.e. the most significant byte is left.")
          .metavar("INST");
    parser.refer(&mut args.interactive)
          .add_option(&["-i", "--interactive"], StoreTrue, "Drop into the debug REPL instead of running.");
    parser.refer(&mut args.verbose)
          .add_option(&["-v", "--verbose"], StoreTrue, "Log extra messages and information.");
    parser.refer(&mut args.colour)
          .add_option(&["-c", "--with-colour"], StoreTrue, "Enable terminal logging with colour codes. (default)")
          .add_option(&["-k", "--without-colour"], StoreFalse, "Disable terminal logging with colour codes.");
    parser.parse_args_or_exit();
}


fn configure_logging(args: &CmdLineArgs) {
    let p = args.log_file_path.as_path();
    let file = match File::create(p) {
        Ok(f) => Some(f),
        Err(e) => { eprintln!("Cannot open log file `{}`: {}", p.display(), e); None },
    };
    logger::init_with(file, args.verbose, args.colour).unwrap();
    info!("Logging to file `{}`.", p.display());
}


fn handle_oneshot_commands(args: &CmdLineArgs) {
    // Single ARM instruction to disassemble?
    if let Some(ref x) = args.single_disasm_arm {
        match u32::from_str_radix(x.as_str(), 16) {
            Ok(i) => { match hardware::cpu::ArmInstruction::decode(i) {
                Ok(inst) => info!("DASM ARM:\t{}", inst),
                Err(e)   => info!("DASM ARM invalid - {}", e),
            };},
            Err(e) => { error!("{}", e); },
        };
    }
}


fn build_pod(args: &CmdLineArgs) -> Result<hardware::Pod, hardware::PodError> {
    let load_addr = match args.load_addr {
        Some(ref x) => Some(u32::from_str_radix(x.as_str(), 16)
            .map_err(|e| hardware::PodError::InvalidConfig(format!("bad load address: {}", e)))?),
        None => None,
    };

    let mut config = hardware::PodConfig::default();
    config.sdram_mib = args.sdram_mib;
    config.protect_timer1 = args.protect_timer1;
    if let Some(addr) = load_addr {
        config.reset_pc = addr;
    }

    let mut pod = hardware::Pod::new(config)?;

    if let Some(ref fp) = args.disk_file_path {
        pod.load_disk_file(fp.as_path())?;
        info!("Attached disk image `{}`.", fp.display());
    }
    if let Some(ref fp) = args.firmware_file_path {
        pod.load_firmware_file(fp.as_path(), load_addr)?;
    } else {
        warn!("No firmware given; the CPU will execute zeroed memory.");
    }

    Ok(pod)
}
