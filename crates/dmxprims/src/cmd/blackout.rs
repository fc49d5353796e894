use dmxprims_frame::{start_code, DmxFrame};
use dmxprims_serial::BreakTiming;

use crate::cmd::send::Transmission;
use crate::cmd::BlackoutArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_send_summary, OutputFormat};

pub fn run(args: BlackoutArgs, timing: BreakTiming, format: OutputFormat) -> CliResult<i32> {
    let frame = DmxFrame::new(start_code::NULL);
    let plan = Transmission {
        port: &args.port,
        timing,
        rate_hz: args.rate,
        stall_timeout: dmxprims_frame::DEFAULT_STALL_TIMEOUT,
    };

    let frames = plan.repeat(&frame, args.count)?;
    print_send_summary(&plan.summary(&frame, frames), format);
    Ok(SUCCESS)
}
