use mqprims::records::{MemAccess, MemRef};
use mqprims::{Channel, ChannelConfig, Record};
use tracing::info;

use crate::cmd::{parse_duration, RecordKind, SendArgs};
use crate::exit::{channel_error, CliResult, SUCCESS};

pub fn run(args: SendArgs) -> CliResult<i32> {
    let send_timeout = args.send_timeout.as_deref().map(parse_duration).transpose()?;
    let config = ChannelConfig {
        send_timeout,
        ..ChannelConfig::writer(args.backlog)
    };

    match args.record {
        RecordKind::Access => stream(&args, config, MemAccess::sample),
        RecordKind::Ref => stream(&args, config, MemRef::sample),
    }
}

fn stream<T: Record>(
    args: &SendArgs,
    config: ChannelConfig,
    sample: impl Fn(u64) -> T,
) -> CliResult<i32> {
    let mut channel = Channel::<T>::with_config(&args.queue, config)
        .map_err(|err| channel_error("open failed", err))?;

    for i in 0..args.count {
        channel
            .send(&sample(i), args.priority)
            .map_err(|err| channel_error("send failed", err))?;
    }
    info!(queue = %args.queue, count = args.count, "sent records");

    channel
        .close()
        .map_err(|err| channel_error("teardown failed", err))?;
    Ok(SUCCESS)
}
