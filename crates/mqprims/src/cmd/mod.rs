use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};

use crate::exit::{CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod recv;
pub mod send;
pub mod unlink;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stream sample memory-access records into a queue.
    Send(SendArgs),
    /// Print records from a queue until end of stream.
    Recv(RecvArgs),
    /// Remove a queue name left behind by a crashed peer.
    Unlink(UnlinkArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args),
        Command::Recv(args) => recv::run(args, format),
        Command::Unlink(args) => unlink::run(args),
        Command::Version(args) => version::run(args),
    }
}

/// Which sample record type travels over the queue.
///
/// Both peers must agree; a mismatch is reported as a framing error.
#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum RecordKind {
    /// `{kind, addr}`, 9 bytes.
    Access,
    /// `{addr, kind, pc}`, 17 bytes.
    Ref,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Queue name (must start with '/').
    #[arg(env = "MQPRIMS_QUEUE")]
    pub queue: String,
    /// Number of records to send.
    #[arg(long, default_value_t = 20)]
    pub count: u64,
    /// Frames buffered before send blocks.
    #[arg(long, default_value_t = 5)]
    pub backlog: usize,
    /// Priority attached to every record.
    #[arg(long, default_value_t = 0)]
    pub priority: u32,
    /// Record type.
    #[arg(long, value_enum, default_value = "access")]
    pub record: RecordKind,
    /// Give up on a full queue after this long (e.g. 5s, 500ms).
    #[arg(long)]
    pub send_timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct RecvArgs {
    /// Queue name (must start with '/').
    #[arg(env = "MQPRIMS_QUEUE")]
    pub queue: String,
    /// Frames buffered before the sender blocks.
    #[arg(long, default_value_t = 5)]
    pub backlog: usize,
    /// Record type.
    #[arg(long, value_enum, default_value = "access")]
    pub record: RecordKind,
    /// Exit after receiving N records.
    #[arg(long)]
    pub count: Option<usize>,
    /// How often to check for Ctrl-C while waiting (e.g. 250ms, 1s).
    #[arg(long, default_value = "250ms")]
    pub poll: String,
}

#[derive(Args, Debug)]
pub struct UnlinkArgs {
    /// Queue name (must start with '/').
    pub queue: String,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, millis) = if let Some(num) = input.strip_suffix("ms") {
        (num, true)
    } else if let Some(num) = input.strip_suffix('s') {
        (num, false)
    } else {
        (input, false)
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(if millis {
        Duration::from_millis(value)
    } else {
        Duration::from_secs(value)
    })
}
