//! The guarantee desk — owns the store and every workflow.
//!
//! Workflow operations are split across modules as `impl GuaranteeDesk`
//! blocks (application_workflow, claim_workflow, recovery_workflow,
//! bank_onboarding, session, notification, demo).
//!
//! RULES:
//!   - A transition and its event-log entry commit in one transaction.
//!   - Notifications are best-effort and never fail the transition that
//!     triggered them.
//!   - The caller's role and bank come from its session, never its request.

use crate::{
    clock::DeskClock,
    compliance::ComplianceRegistry,
    config::DeskConfig,
    error::DeskResult,
    notification::{NotificationSink, StoreSink},
    rng::DeskRng,
    store::DeskStore,
};
use chrono::{DateTime, TimeZone, Utc};

pub struct GuaranteeDesk {
    pub store: DeskStore,
    pub clock: DeskClock,
    pub(crate) config: DeskConfig,
    pub(crate) rng: DeskRng,
    pub(crate) compliance: ComplianceRegistry,
    pub(crate) notifier: Box<dyn NotificationSink>,
}

impl GuaranteeDesk {
    pub fn new(store: DeskStore, config: DeskConfig, clock: DeskClock) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => DeskRng::seeded(seed),
            None => DeskRng::from_entropy(),
        };
        Self {
            store,
            clock,
            config,
            rng,
            compliance: ComplianceRegistry::with_format_checks(),
            notifier: Box::new(StoreSink),
        }
    }

    /// Build a ready desk: schema migrated and demo users present.
    /// Call this instead of new() + manual migrate()/seed_users() calls.
    pub fn build(store: DeskStore, config: DeskConfig) -> DeskResult<Self> {
        store.migrate()?;
        let desk = Self::new(store, config, DeskClock::system());
        let seeded = desk.seed_users()?;
        log::info!("Desk ready with {} demo users", seeded.len());
        Ok(desk)
    }

    /// In-memory desk with test config, a seeded RNG and a frozen clock.
    pub fn build_test(seed: u64) -> DeskResult<Self> {
        let store = DeskStore::in_memory()?;
        store.migrate()?;
        let mut config = DeskConfig::default_test();
        config.rng_seed = Some(seed);
        let desk = Self::new(store, config, DeskClock::frozen(test_epoch()));
        desk.seed_users()?;
        Ok(desk)
    }

    pub fn config(&self) -> &DeskConfig {
        &self.config
    }

    pub fn compliance(&self) -> &ComplianceRegistry {
        &self.compliance
    }

    /// Swap the compliance checks, e.g. for a real registry client.
    pub fn compliance_mut(&mut self) -> &mut ComplianceRegistry {
        &mut self.compliance
    }

    pub fn set_notification_sink(&mut self, sink: Box<dyn NotificationSink>) {
        self.notifier = sink;
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// The instant test desks start at.
pub fn test_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 10, 0, 0)
        .single()
        .unwrap_or_default()
}
