//! Layered configuration: built-in defaults, an optional TOML file, then
//! `DF__*` environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use config::{Config, Environment, File, Map};
use serde::{Deserialize, Serialize};

use df_core::constants::{
    ACTIVE_REWARDS_MULTIPLIER_BPS, DECAYING_SUPPLY_WEI, DFMAIN_SCHEDULE, HALF_LIFE_SECS,
    MAX_ALLOCATE_ATTEMPTS, MAX_BATCH_SIZE, PREDICTOOR_BUDGET_TOKENS, PREDICTOOR_RELEASE_WEEK,
    VESTING_START_UNIX, WEI_PER_TOKEN,
};
use df_core::types::{Address, MarketId};
use df_dispense::DispenseOptions;
use df_vesting::{ScheduleEntry, ScheduleTable, VestingParams};

const ENV_PREFIX: &str = "DF";
const ENV_SEPARATOR: &str = "__";

/// One schedule row as written in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub before_week: i64,
    pub tokens: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DfConfig {
    pub schedule: Vec<ScheduleRow>,
    /// Decimal string; wei amounts exceed what config numbers can carry.
    pub decaying_supply_wei: String,
    pub half_life_secs: u64,
    pub vesting_start: DateTime<Utc>,
    pub active_multiplier_bps: u64,
    pub predictoor_budget_tokens: u64,
    pub predictoor_release_week: i64,

    /// JSON-RPC endpoint used for exact-mode decay.
    pub rpc_url: Option<String>,
    /// Deployed vesting wallet queried in exact mode.
    pub vesting_wallet: Option<String>,
    /// Expected `eth_chainId` of `rpc_url`; checked before exact-mode queries.
    pub chain_id: u64,
    pub rpc_timeout_secs: u64,

    pub subgraph_url: Option<String>,
    /// Fixed market list; takes precedence over the subgraph when non-empty.
    pub markets: Vec<String>,

    pub batch_size: usize,
    pub max_attempts: u32,

    pub log_level: String,
    pub log_format: String,
}

impl Default for DfConfig {
    fn default() -> Self {
        Self {
            schedule: DFMAIN_SCHEDULE
                .iter()
                .map(|&(before_week, tokens)| ScheduleRow {
                    before_week,
                    tokens: tokens as u64,
                })
                .collect(),
            decaying_supply_wei: DECAYING_SUPPLY_WEI.to_string(),
            half_life_secs: HALF_LIFE_SECS,
            vesting_start: DateTime::from_timestamp(VESTING_START_UNIX, 0).unwrap_or_default(),
            active_multiplier_bps: ACTIVE_REWARDS_MULTIPLIER_BPS,
            predictoor_budget_tokens: PREDICTOOR_BUDGET_TOKENS as u64,
            predictoor_release_week: PREDICTOOR_RELEASE_WEEK,
            rpc_url: None,
            vesting_wallet: None,
            chain_id: 1,
            rpc_timeout_secs: 30,
            subgraph_url: None,
            markets: Vec::new(),
            batch_size: MAX_BATCH_SIZE,
            max_attempts: MAX_ALLOCATE_ATTEMPTS,
            log_level: "info".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl DfConfig {
    /// Load from `path` (required when given) or the default location
    /// (optional), then apply process environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`DfConfig::load`] but with an explicit environment map, or the
    /// process environment when `env` is `None`.
    pub fn load_with_env(path: Option<&Path>, env: Option<Map<String, String>>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::from(default_config_path()).required(false),
        };
        let cfg = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .list_separator(",")
                    .with_list_parse_key("markets")
                    .source(env),
            )
            .build()
            .context("Failed to read configuration")?;
        cfg.try_deserialize().context("Invalid configuration")
    }

    pub fn vesting_params(&self) -> Result<VestingParams> {
        let entries = self
            .schedule
            .iter()
            .map(|row| ScheduleEntry {
                before_week: row.before_week,
                tokens: row.tokens as u128,
            })
            .collect();
        let schedule = ScheduleTable::new(entries).context("Invalid schedule")?;
        let decaying_supply_wei: u128 = self
            .decaying_supply_wei
            .trim()
            .parse()
            .with_context(|| format!("decaying_supply_wei is not an integer: {:?}", self.decaying_supply_wei))?;
        if self.half_life_secs == 0 {
            bail!("half_life_secs must be positive");
        }
        if self.active_multiplier_bps > 10_000 {
            bail!("active_multiplier_bps must not exceed 10000");
        }
        Ok(VestingParams {
            schedule,
            decaying_supply_wei,
            half_life_secs: self.half_life_secs,
            vesting_start: self.vesting_start,
            active_multiplier_bps: self.active_multiplier_bps,
            predictoor_budget_wei: self.predictoor_budget_tokens as u128 * WEI_PER_TOKEN,
            predictoor_release_week: self.predictoor_release_week,
        })
    }

    pub fn dispense_options(&self, batch_number: Option<usize>) -> DispenseOptions {
        DispenseOptions {
            batch_size: self.batch_size,
            max_attempts: self.max_attempts,
            batch_number,
        }
    }

    pub fn vesting_wallet(&self) -> Result<Address> {
        let raw = self
            .vesting_wallet
            .as_deref()
            .context("vesting_wallet is required for exact mode")?;
        raw.parse().context("vesting_wallet is not a valid address")
    }

    pub fn markets(&self) -> Result<Vec<MarketId>> {
        self.markets
            .iter()
            .map(|m| m.parse().with_context(|| format!("invalid market id {m:?}")))
            .collect()
    }
}

/// `~/.config/df/config.toml` (or the platform equivalent).
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("df")
        .join("config.toml")
}
