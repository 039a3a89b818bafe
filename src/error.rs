//! Result codes shared by every driver

/// Failure reported by a driver operation.
///
/// Errors carry no payload. They are returned as soon as a sub-operation
/// fails, without retrying or undoing what was already done; whether to retry
/// is up to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The operation failed: a bus NACK, a receive error, a measurement out
    /// of its window, or a resource that is already in use.
    Error,
    /// A status flag did not reach the expected state within the iteration
    /// budget.
    Timeout,
    /// An argument lies outside the range the hardware accepts.
    InvalidParameter,
    /// The peripheral has not been configured for this operation.
    Uninitialized,
}

pub type Result<T> = core::result::Result<T, Error>;
