//! Optional observability helpers for relay operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `bearer_relay.op` with the `op` (operation)
//!   and `stage` (call site) fields, plus log events for token renewals.
//! - Enable `metrics` to increment the `bearer_relay_op_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Relay operations observed by spans and counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RelayOp {
	/// Token acquisition/renewal sequence.
	TokenRenewal,
	/// Authenticated POST against the wrapped API.
	Call,
	/// Authenticated GET against the wrapped API.
	Get,
}
impl RelayOp {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RelayOp::TokenRenewal => "token_renewal",
			RelayOp::Call => "call",
			RelayOp::Get => "get",
		}
	}
}
impl Display for RelayOp {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OpOutcome {
	/// Entry to a relay operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl OpOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OpOutcome::Attempt => "attempt",
			OpOutcome::Success => "success",
			OpOutcome::Failure => "failure",
		}
	}
}
impl Display for OpOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Records a successful acquisition with its validity window. The token value never reaches the
/// log stream; only the window does.
pub(crate) fn renewal_succeeded(expires_in: Duration) {
	#[cfg(feature = "tracing")]
	::tracing::info!(expires_in_secs = expires_in.whole_seconds(), "Access token renewed.");

	#[cfg(not(feature = "tracing"))]
	let _ = expires_in;
}

/// Records one failed acquisition attempt.
pub(crate) fn renewal_attempt_failed(attempt: u32, attempts: u32, status: Option<u16>, body: &str) {
	#[cfg(feature = "tracing")]
	::tracing::error!(attempt, attempts, status, body, "Token endpoint refused the grant.");

	#[cfg(not(feature = "tracing"))]
	let _ = (attempt, attempts, status, body);
}
