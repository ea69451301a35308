//! sysload - boot a kernel from a zipl boot map

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use sysload::config::KEXEC_PATH;
use sysload::{
    open_disk, BootContext, BootEntry, DiskReport, Kexec, LoaderPaths, LocalFetcher, SysfsLayout,
};

#[derive(Parser)]
#[command(name = "sysload", author, version, about = "Boot a kernel from a zipl boot map")]
struct Cli {
    /// Directory for the staged kernel, initrd and parmfile (default /tmp)
    #[arg(long, global = true)]
    work_dir: Option<PathBuf>,

    /// kexec binary used for the handoff
    #[arg(long, global = true, default_value = KEXEC_PATH)]
    kexec: PathBuf,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load a boot program and start it
    Boot {
        /// Boot map URI: `dasd://(<busid>[,<program>])` or
        /// `zfcp://(<busid>,<wwpn>,<lun>[,<program>])`
        #[arg(long, conflicts_with = "device", required_unless_present = "device")]
        bootmap: Option<String>,

        /// Block device holding the boot map
        #[arg(long)]
        device: Option<PathBuf>,

        /// Boot program number on `--device`
        #[arg(long, default_value_t = 0)]
        program: usize,

        /// Additional kernel command line
        #[arg(long, default_value = "")]
        cmdline: String,

        /// Parmfile to prepend to the command line
        #[arg(long)]
        parmfile: Option<String>,

        /// Prefix for relative parmfile locations
        #[arg(long, default_value = "")]
        root: String,
    },
    /// List the boot programs on a device
    Inspect {
        #[arg(long)]
        device: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Boot {
            bootmap,
            device,
            program,
            cmdline,
            parmfile,
            root,
        } => {
            let mut paths = match &cli.work_dir {
                Some(dir) => LoaderPaths::in_dir(dir),
                None => LoaderPaths::default(),
            };
            paths.kexec = cli.kexec;
            let kexec = Kexec::new(&paths.kexec);
            let mut context = BootContext::new(paths, LocalFetcher, kexec);

            let entry = BootEntry {
                root,
                cmdline,
                parmfile,
                bootmap,
            };
            let never = match &device {
                Some(device) => context
                    .boot_from_bootmap(&entry, device, program)
                    .with_context(|| format!("Booting from {} failed", device.display()))?,
                None => context
                    .bootmap_boot(&entry, SysfsLayout::default())
                    .context("Booting from boot map failed")?,
            };
            match never {}
        }
        Command::Inspect { device } => {
            let mut disk = open_disk(&device)
                .with_context(|| format!("Unable to open {}", device.display()))?;
            let report = DiskReport::collect(&mut disk)?;
            print!("{report}");
            Ok(())
        }
    }
}
