//! Reconciles Windows service failure-recovery configuration.
//!
//! Reads current state through `sc qfailure`, diffs it against desired
//! state, and applies the difference through `sc failure`. The library is
//! synchronous and talks to the service manager only through the
//! [`ScRunner`] seam, so everything above the process boundary is testable
//! with scripted output.

pub mod desired;
pub mod error;
pub mod model;
pub mod notify;
pub mod parsers;
pub mod reconcile;
pub mod runner;
pub mod session;

pub use desired::DesiredState;
pub use error::RecoveryError;
pub use model::{DesiredRecovery, FailureAction, FailureActionKind, RecoveryConfig};
pub use notify::{Change, ChangeSink, CollectingSink, LogSink};
pub use reconcile::{encode_actions, plan_update, MutationPlan};
pub use runner::{ScExe, ScRunner, DEFAULT_SC_PROGRAM};
pub use session::ReconcileSession;
