use crate::types::Role;
use serde::{Deserialize, Serialize};

/// Thirty days. Keeps expiry arithmetic and cookie Max-Age in range.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 30;

/// A demo credential created by `seed_users`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedUser {
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub bank: Option<String>,
}

/// Argon2id cost parameters. Tests use the minimum allowed values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordHashingConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanSimulationConfig {
    /// The simulated loan starts this many months before "now".
    pub start_months_ago: u32,
    /// Instalments marked as paid, counted from the first.
    pub paid_instalments: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeskConfig {
    pub suggested_guarantee_min: u32,
    pub suggested_guarantee_max: u32,
    pub loan_simulation: LoanSimulationConfig,
    /// Artificial latency applied by the HTTP layer to validator calls.
    pub validator_delay_ms: u64,
    pub session_ttl_hours: i64,
    pub password_hashing: PasswordHashingConfig,
    /// None = seed from entropy.
    #[serde(default)]
    pub rng_seed: Option<u64>,
    pub seed_users: Vec<SeedUser>,
}

impl DeskConfig {
    /// Load from the data/ directory.
    /// In tests, use DeskConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let path = format!("{data_dir}/desk_config.json");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: DeskConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.suggested_guarantee_min > self.suggested_guarantee_max
            || self.suggested_guarantee_max > 100
        {
            anyhow::bail!(
                "suggested guarantee range {}..={} is not a valid percentage range",
                self.suggested_guarantee_min,
                self.suggested_guarantee_max
            );
        }
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.session_ttl_hours) {
            anyhow::bail!(
                "session_ttl_hours must be between 1 and {MAX_SESSION_TTL_HOURS}, got {}",
                self.session_ttl_hours
            );
        }
        for user in &self.seed_users {
            if user.role == Role::BankMaker && user.bank.is_none() {
                anyhow::bail!("seed user {} is a bank maker without a bank", user.email);
            }
        }
        Ok(())
    }

    /// Config with hardcoded defaults for use in tests.
    pub fn default_test() -> Self {
        Self {
            suggested_guarantee_min: 70,
            suggested_guarantee_max: 90,
            loan_simulation: LoanSimulationConfig {
                start_months_ago: 3,
                paid_instalments: 2,
            },
            validator_delay_ms: 0,
            session_ttl_hours: 8,
            password_hashing: PasswordHashingConfig {
                memory_kib: 8,
                iterations: 1,
                parallelism: 1,
            },
            rng_seed: Some(42),
            seed_users: vec![
                SeedUser {
                    email: "admin@ncgc.gov.ng".into(),
                    password: "admin123".into(),
                    role: Role::Admin,
                    bank: None,
                },
                SeedUser {
                    email: "analyst@ncgc.gov.ng".into(),
                    password: "analyst123".into(),
                    role: Role::NcgcAnalyst,
                    bank: None,
                },
                SeedUser {
                    email: "maker@accessbank.com".into(),
                    password: "maker123".into(),
                    role: Role::BankMaker,
                    bank: Some("Access Bank".into()),
                },
                SeedUser {
                    email: "maker@zenithbank.com".into(),
                    password: "maker123".into(),
                    role: Role::BankMaker,
                    bank: Some("Zenith Bank".into()),
                },
            ],
        }
    }
}
