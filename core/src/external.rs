//! Hook for metering extensions that live outside the gas schedule proper
//! (e.g. a host charging its own resource model alongside EVM gas). The
//! interpreter never acts on these itself; it only reports them so a
//! `InterpreterHandler` implementation can charge for them.

/// A unit of work the interpreter performed that an embedding host may want
/// to additionally account for.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ExternalOperation {
    /// A single opcode step, with no further detail.
    Default,
    /// Reading or writing a storage slot for the given write status.
    AccountStorageWrite,
    /// Writing log data of the given length.
    Write(usize),
}
