//! Opt-in step tracing. Mirrors a `debug_traceTransaction`-style listener:
//! register one, and every opcode step anywhere in the call tree reports to
//! it. Off by default and compiled out entirely without the `tracing`
//! feature.

#[cfg(feature = "tracing")]
use faithevm_core::prelude::*;
#[cfg(feature = "tracing")]
use faithevm_core::{Capture, ExitReason, Machine, Opcode, Trap};
#[cfg(feature = "tracing")]
use primitive_types::H160;

#[cfg(feature = "tracing")]
environmental::environmental!(listener: dyn EventListener + 'static);

/// One step of the trace.
#[cfg(feature = "tracing")]
#[derive(Clone, Debug)]
pub enum Event<'a> {
    Step {
        address: H160,
        opcode: Opcode,
        position: usize,
        stack: &'a faithevm_core::Stack,
        memory: &'a faithevm_core::Memory,
    },
    StepResult {
        result: &'a Result<(), Capture<ExitReason, Trap>>,
        machine: &'a Machine,
    },
}

#[cfg(feature = "tracing")]
pub trait EventListener {
    fn event(&mut self, event: Event<'_>);
}

#[cfg(feature = "tracing")]
pub fn with_listener<F: FnOnce(&mut (dyn EventListener + 'static))>(f: F) {
    listener::with(f);
}

#[cfg(feature = "tracing")]
pub fn using<R, F: FnOnce() -> R>(new: &mut (dyn EventListener + 'static), f: F) -> R {
    listener::using(new, f)
}

#[cfg(feature = "tracing")]
pub fn emit(event: Event<'_>) {
    with_listener(|l| l.event(event));
}
