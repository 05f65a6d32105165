use mqprims::queue::{MessageQueue, QueueName};

use crate::cmd::UnlinkArgs;
use crate::exit::{queue_error, CliError, CliResult, FAILURE, SUCCESS};

pub fn run(args: UnlinkArgs) -> CliResult<i32> {
    let name = QueueName::new(args.queue).map_err(|err| queue_error("invalid queue", err))?;

    let removed = MessageQueue::unlink(&name).map_err(|err| queue_error("unlink failed", err))?;
    if !removed {
        return Err(CliError::new(FAILURE, format!("no such queue: {name}")));
    }
    println!("unlinked {name}");
    Ok(SUCCESS)
}
