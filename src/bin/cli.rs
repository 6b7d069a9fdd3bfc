//! HydraDancer CLI
//!
//! Command-line and interactive menu front end for the host controller.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use hydradancer::descriptors::DescriptorSet;
use hydradancer::protocol::{CommandType, SubCommand};
use hydradancer::transport::Transport;
use hydradancer::{Config, Controller, PollBound, Result, UploadReport};
use tracing_subscriber::{fmt, EnvFilter};

/// Per-transfer timeout used when only `--max-attempts` is given
const ATTEMPT_TIMEOUT_MS: u64 = 1000;

/// HydraDancer host controller
#[derive(Parser, Debug)]
#[command(name = "hydradancer")]
#[command(about = "Host controller for the HydraDancer board")]
#[command(version)]
struct Args {
    /// USB vendor ID (hex)
    #[arg(long, default_value = "1337", value_parser = parse_hex_u16)]
    vid: u16,

    /// USB product ID (hex)
    #[arg(long, default_value = "1337", value_parser = parse_hex_u16)]
    pid: u16,

    /// Interface number to claim
    #[arg(short, long, default_value = "0")]
    interface: u8,

    /// Per-transfer timeout in milliseconds (0 waits forever)
    #[arg(short, long, default_value = "0")]
    timeout_ms: u64,

    /// Give up on an echo response after this many reads (0 never gives up).
    /// Implies a 1000 ms transfer timeout unless --timeout-ms is set
    #[arg(short = 'n', long, default_value = "0")]
    max_attempts: usize,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the board's log
    Log {
        /// Keep polling until Ctrl+C
        #[arg(short, long)]
        follow: bool,
    },

    /// Send a message and print the ROT13'd answer
    Rot13 {
        /// The message to cipher
        message: String,
    },

    /// Program the keyboard descriptor set (no HID class descriptor)
    Keyboard,

    /// Upload one descriptor read from a file
    SetDescriptor {
        /// Descriptor kind
        kind: DescriptorKind,

        /// File holding the raw descriptor bytes
        file: PathBuf,

        /// Descriptor index (0-16)
        #[arg(short, long, default_value = "0")]
        index: u8,
    },

    /// Switch the board's mode
    Mode {
        /// Mode to enter
        mode: Mode,
    },

    /// Interactive menu (default)
    Menu,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DescriptorKind {
    Device,
    Config,
    Interface,
    Endpoint,
    String,
}

impl From<DescriptorKind> for SubCommand {
    fn from(kind: DescriptorKind) -> Self {
        match kind {
            DescriptorKind::Device => SubCommand::Device,
            DescriptorKind::Config => SubCommand::Config,
            DescriptorKind::Interface => SubCommand::Interface,
            DescriptorKind::Endpoint => SubCommand::Endpoint,
            DescriptorKind::String => SubCommand::String,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Mode {
    Main,
    Identify,
}

/// Ctrl+C state: the first press stops a log follow, otherwise exit
#[derive(Default)]
struct Teardown {
    following: AtomicBool,
    stop: AtomicBool,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,hydradancer=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("HydraDancer host controller v{}", hydradancer::VERSION);

    // A read bound means nothing if a read can block forever
    let timeout_ms = match (args.timeout_ms, args.max_attempts) {
        (0, n) if n > 0 => {
            tracing::info!(
                "--max-attempts given without --timeout-ms, using {} ms per transfer",
                ATTEMPT_TIMEOUT_MS
            );
            ATTEMPT_TIMEOUT_MS
        }
        (ms, _) => ms,
    };

    let config = Config::builder()
        .device(args.vid, args.pid)
        .interface(args.interface)
        .transfer_timeout((timeout_ms > 0).then(|| Duration::from_millis(timeout_ms)))
        .echo_poll(match args.max_attempts {
            0 => PollBound::Unbounded,
            n => PollBound::Attempts(n),
        })
        .build();

    let teardown = Arc::new(Teardown::default());
    let handler_state = Arc::clone(&teardown);
    if let Err(e) = ctrlc::set_handler(move || {
        if handler_state.following.load(Ordering::SeqCst)
            && !handler_state.stop.swap(true, Ordering::SeqCst)
        {
            tracing::info!("Received Ctrl+C, stopping log follow");
            return;
        }
        // The OS releases the claimed interface when the process exits
        println!("Exiting");
        std::process::exit(0);
    }) {
        tracing::warn!("Failed to install Ctrl+C handler: {}", e);
    }

    let mut controller = match Controller::open(config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to open board: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        "Board {:04x}:{:04x} ready on interface {}",
        controller.config().vendor_id,
        controller.config().product_id,
        controller.config().interface
    );

    let result = match args.command.unwrap_or(Commands::Menu) {
        Commands::Log { follow: false } => {
            print_log(&controller.log_once());
            Ok(())
        }
        Commands::Log { follow: true } => {
            follow_log(&mut controller, &teardown);
            Ok(())
        }
        Commands::Rot13 { message } => rot13(&mut controller, &message),
        Commands::Keyboard => keyboard(&mut controller),
        Commands::SetDescriptor { kind, file, index } => std::fs::read(&file)
            .map_err(Into::into)
            .and_then(|bytes| controller.set_descriptor(kind.into(), index, &bytes)),
        Commands::Mode { mode } => controller.send_command(match mode {
            Mode::Main => CommandType::Main,
            Mode::Identify => CommandType::Identify,
        }),
        Commands::Menu => menu(&mut controller, &teardown),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn parse_hex_u16(s: &str) -> std::result::Result<u16, String> {
    u16::from_str_radix(s.trim_start_matches("0x"), 16).map_err(|e| e.to_string())
}

// =============================================================================
// Actions
// =============================================================================

fn print_log(messages: &[String]) {
    let mut stdout = io::stdout().lock();
    for text in messages {
        let _ = write!(stdout, "{}", text);
    }
    let _ = stdout.flush();
}

fn follow_log<T: Transport>(controller: &mut Controller<T>, teardown: &Teardown) {
    teardown.stop.store(false, Ordering::SeqCst);
    teardown.following.store(true, Ordering::SeqCst);

    let delivered = controller.follow_log(&teardown.stop, |text| {
        let mut stdout = io::stdout().lock();
        let _ = write!(stdout, "{}", text);
        let _ = stdout.flush();
    });

    teardown.following.store(false, Ordering::SeqCst);
    tracing::debug!("Log follow stopped after {} messages", delivered);
}

fn rot13<T: Transport>(controller: &mut Controller<T>, message: &str) -> Result<()> {
    let response = controller.echo(message.as_bytes())?;
    println!("{}", response);
    Ok(())
}

fn keyboard<T: Transport>(controller: &mut Controller<T>) -> Result<()> {
    let report: UploadReport = controller.program_descriptors(&DescriptorSet::keyboard())?;
    for failure in &report.failures {
        tracing::error!(
            "{} descriptor {} failed: {}",
            failure.kind.name(),
            failure.index.get(),
            failure.error
        );
    }
    println!("{} descriptors uploaded, {} failed", report.uploaded, report.failures.len());
    Ok(())
}

// =============================================================================
// Interactive Menu
// =============================================================================

fn print_menu() {
    println!("HydraDancer host controller");
    println!("Select your action:");
    println!("1)Log once");
    println!("2)Log infinite loop");
    println!("3)ROT13");
    println!("4)Fill descriptors for keyboard");
    println!();
    println!("9)Exit");
    print!(">");
    let _ = io::stdout().flush();
}

fn menu<T: Transport>(controller: &mut Controller<T>, teardown: &Teardown) -> Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print_menu();
        let Some(line) = lines.next() else {
            return Ok(());
        };

        match line?.trim().parse::<u32>() {
            Ok(1) => print_log(&controller.log_once()),
            Ok(2) => follow_log(controller, teardown),
            Ok(3) => {
                print!("Message to cypher: ");
                io::stdout().flush()?;
                let Some(message) = lines.next() else {
                    return Ok(());
                };
                if let Err(e) = rot13(controller, &message?) {
                    tracing::error!("{}", e);
                }
            }
            Ok(4) => {
                if let Err(e) = keyboard(controller) {
                    tracing::error!("{}", e);
                }
            }
            Ok(9) => return Ok(()),
            _ => {}
        }
    }
}
