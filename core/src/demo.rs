//! Demo support: seeded logins and a full reset.

use crate::{
    config::DeskConfig,
    desk::GuaranteeDesk,
    error::{DeskError, DeskResult},
    session::{HashedPassword, UserProfile},
    types::{Actor, Role},
};

/// Hash every configured demo password, in `seed_users` order.
pub fn hash_seed_passwords(config: &DeskConfig) -> DeskResult<Vec<HashedPassword>> {
    config
        .seed_users
        .iter()
        .map(|s| HashedPassword::new(&config.password_hashing, &s.password))
        .collect()
}

impl GuaranteeDesk {
    /// Insert any configured demo user that is missing. Existing users are
    /// left untouched, so this is safe to call repeatedly.
    pub fn seed_users(&self) -> DeskResult<Vec<UserProfile>> {
        let mut missing = Vec::new();
        for seed in &self.config.seed_users {
            if self.store.user_by_email(&seed.email)?.is_none() {
                let password = HashedPassword::new(&self.config.password_hashing, &seed.password)?;
                missing.push(self.new_user_row(
                    &seed.email,
                    password,
                    seed.role,
                    seed.bank.as_deref(),
                ));
            }
        }
        if !missing.is_empty() {
            self.store.transaction(|store| {
                for row in &missing {
                    store.insert_user(row)?;
                }
                Ok(())
            })?;
            log::info!("Seeded {} demo users", missing.len());
        }

        Ok(self
            .config
            .seed_users
            .iter()
            .map(|s| UserProfile {
                email: s.email.clone(),
                role: s.role,
                bank: s.bank.clone(),
            })
            .collect())
    }

    /// Wipe every collection and put the demo users back. The caller's own
    /// session is gone afterwards.
    pub fn reset_demo(&self, actor: &Actor) -> DeskResult<Vec<UserProfile>> {
        actor.require(&[Role::Admin], "reset the demo")?;
        let passwords = hash_seed_passwords(&self.config)?;
        self.reset_demo_hashed(actor, passwords)
    }

    /// Reset with passwords from `hash_seed_passwords`.
    pub fn reset_demo_hashed(
        &self,
        actor: &Actor,
        passwords: Vec<HashedPassword>,
    ) -> DeskResult<Vec<UserProfile>> {
        actor.require(&[Role::Admin], "reset the demo")?;
        if passwords.len() != self.config.seed_users.len() {
            return Err(DeskError::invalid(format!(
                "expected {} seed passwords, got {}",
                self.config.seed_users.len(),
                passwords.len()
            )));
        }
        let rows: Vec<_> = self
            .config
            .seed_users
            .iter()
            .zip(passwords)
            .map(|(s, pw)| self.new_user_row(&s.email, pw, s.role, s.bank.as_deref()))
            .collect();

        self.store.transaction(|store| {
            store.clear_all()?;
            for row in &rows {
                store.insert_user(row)?;
            }
            Ok(())
        })?;

        log::info!("Demo reset by {}; {} users re-seeded", actor.email, rows.len());
        Ok(rows.iter().map(UserProfile::from).collect())
    }
}
