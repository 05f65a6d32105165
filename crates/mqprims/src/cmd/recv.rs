use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mqprims::records::{MemAccess, MemRef};
use mqprims::{Channel, ChannelConfig, Record};
use tracing::{debug, info};

use crate::cmd::{parse_duration, RecordKind, RecvArgs};
use crate::exit::{channel_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_record, OutputFormat, ToOutput};

pub fn run(args: RecvArgs, format: OutputFormat) -> CliResult<i32> {
    let poll = parse_duration(&args.poll)?;
    let config = ChannelConfig {
        receive_timeout: Some(poll),
        ..ChannelConfig::reader(args.backlog)
    };

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    match args.record {
        RecordKind::Access => drain::<MemAccess>(&args, config, format, &running),
        RecordKind::Ref => drain::<MemRef>(&args, config, format, &running),
    }
}

fn drain<T: Record + ToOutput>(
    args: &RecvArgs,
    config: ChannelConfig,
    format: OutputFormat,
    running: &AtomicBool,
) -> CliResult<i32> {
    let mut channel = Channel::<T>::with_config(&args.queue, config)
        .map_err(|err| channel_error("open failed", err))?;

    let mut printed = 0usize;
    while running.load(Ordering::SeqCst) {
        let record = match channel.recv() {
            Ok(Some(record)) => record,
            Ok(None) => {
                info!(queue = %args.queue, records = printed, "end of stream");
                break;
            }
            // Poll interval elapsed; check for Ctrl-C and wait again.
            Err(err) if err.is_retryable() => {
                debug!(error = %err, "no frame yet");
                continue;
            }
            Err(err) => return Err(channel_error("receive failed", err)),
        };

        print_record(&record.to_output(printed), format);
        printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if printed >= count {
                break;
            }
        }
    }

    Ok(SUCCESS)
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
