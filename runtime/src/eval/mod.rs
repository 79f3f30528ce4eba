mod system;

use crate::{Handler, Runtime};
use faithevm_core::{ExitReason, Opcode};

/// Resolve one trapped opcode against `host`, leaving the machine ready to
/// take its next `step()` (or exited, if the system opcode itself
/// terminated the frame).
///
/// # Errors
/// Returns the frame's terminal `ExitReason` if resolving the opcode ended
/// the frame (RETURN-like CREATE/CALL are not terminal to *this* frame,
/// only to the callee; they push a result and continue).
pub(crate) fn eval_system<H: Handler>(
    runtime: &mut Runtime,
    host: &mut H,
    opcode: Opcode,
) -> Result<(), ExitReason> {
    system::eval(runtime, host, opcode)
}
