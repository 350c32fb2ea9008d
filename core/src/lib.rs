//! NCGC credit-guarantee desk: applications, claims and recoveries on
//! top of a single SQLite store.

pub mod application_workflow;
pub mod bank_onboarding;
pub mod claim_workflow;
pub mod clock;
pub mod compliance;
pub mod config;
pub mod demo;
pub mod desk;
pub mod error;
pub mod event;
pub mod loan;
pub mod notification;
pub mod recovery_workflow;
pub mod rng;
pub mod scoring;
pub mod session;
pub mod store;
pub mod types;

pub use desk::GuaranteeDesk;
pub use error::{DeskError, DeskResult};
pub use types::{Actor, Role};
