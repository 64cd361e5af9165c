//! The two-actor deadlock harness.
//!
//! Alice locks the parent post and then the child comment; Bob locks the
//! same two rows in the opposite order. A one-shot [`Gate`] makes Bob's
//! comment lock happen before Alice asks for the comment, so the two
//! transactions always end up waiting on each other and the lock manager
//! has to abort one of them.
//!
//! - [`gate`] - The one-shot latch between the actors
//! - [`events`] - The recorded sequence of actor steps
//! - [`runner`] - [`DeadlockHarness`], its configuration, and run reports

pub mod events;
pub mod gate;
pub mod runner;

pub use events::{Actor, Event, EventKind, EventLog, Target};
pub use gate::Gate;
pub use runner::{ActorOutcome, DeadlockHarness, HarnessConfig, HarnessError, RunReport};
