use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{debug, info};

use crate::error::{AmountError, AppResult, ParseError};
use crate::types::{addresses_equal, TypeTag};
use crate::units::{DEFAULT_DECIMALS, MAX_DECIMALS};

/// Package the escrow, faucet and mock coins are published under
pub const DEFAULT_PACKAGE_ID: &str =
    "0xfe02aaaf954b752272ea188d398e36d1d117d3641f4b90d21b2f0df3dfcf18a2";

/// Shared faucet object
pub const DEFAULT_FAUCET_ID: &str =
    "0x4f5135f2706e1371adf34002e351c76d9c42d0b3a10c0a5dcc32e0f7605d48b0";

pub const CLOCK_OBJECT_ID: &str = "0x6";

/// A configured coin type with its display label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinPreset {
    pub label: String,
    pub coin_type: TypeTag,
}

impl CoinPreset {
    pub fn new(label: impl Into<String>, coin_type: TypeTag) -> Self {
        Self {
            label: label.into(),
            coin_type,
        }
    }
}

/// How the user picked a coin type: from the presets or by typing one in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CoinSelection {
    Preset(TypeTag),
    Custom(String),
}

impl CoinSelection {
    pub fn is_custom(&self) -> bool {
        matches!(self, CoinSelection::Custom(_))
    }

    /// The selected type, or a `ParseError` while a custom entry is incomplete
    pub fn resolve(&self) -> Result<TypeTag, ParseError> {
        match self {
            CoinSelection::Preset(tag) => Ok(tag.clone()),
            CoinSelection::Custom(raw) => TypeTag::from_str(raw.trim()),
        }
    }
}

/// Escrow contract coordinates and coin-type presets.
///
/// Passed explicitly into scanning, detection and plan building.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscrowConfig {
    pub package_id: String,
    pub faucet_id: String,
    pub escrow_module: String,
    pub escrow_struct: String,
    pub create_function: String,
    pub accept_function: String,
    pub cancel_function: String,
    pub faucet_module: String,
    pub claim_function: String,
    pub clock_object_id: String,
    pub decimals: u8,
    pub max_history_pages: usize,
    pub coin_presets: Vec<CoinPreset>,
    pub default_deposit_type: TypeTag,
    pub default_payment_type: TypeTag,
}

impl Default for EscrowConfig {
    fn default() -> Self {
        Self::for_package(DEFAULT_PACKAGE_ID)
    }
}

/// Overrides read from `ESCROW_*` environment variables
#[derive(Debug, Default, Deserialize)]
struct EnvOverrides {
    package_id: Option<String>,
    faucet_id: Option<String>,
    escrow_module: Option<String>,
    decimals: Option<u8>,
    max_history_pages: Option<usize>,
}

impl EscrowConfig {
    /// Defaults for a deployment at `package_id`, mock coins included
    pub fn for_package(package_id: &str) -> Self {
        let mock = |module: &str, name: &str| TypeTag::new(package_id, module, name);

        Self {
            package_id: package_id.to_string(),
            faucet_id: DEFAULT_FAUCET_ID.to_string(),
            escrow_module: "simple_escrow".to_string(),
            escrow_struct: "Escrow".to_string(),
            create_function: "create_escrow".to_string(),
            accept_function: "accept_escrow".to_string(),
            cancel_function: "cancel_escrow".to_string(),
            faucet_module: "faucet".to_string(),
            claim_function: "claim".to_string(),
            clock_object_id: CLOCK_OBJECT_ID.to_string(),
            decimals: DEFAULT_DECIMALS,
            max_history_pages: 1,
            coin_presets: vec![
                CoinPreset::new("Sui", TypeTag::new("0x2", "sui", "SUI")),
                CoinPreset::new("Mock Coin", mock("mock_coin", "MOCK_COIN")),
                CoinPreset::new("Mock TBTC", mock("mock_tbtc", "MOCK_TBTC")),
                CoinPreset::new("Mock zSUI", mock("mock_zsui", "MOCK_ZSUI")),
            ],
            default_deposit_type: mock("mock_coin", "MOCK_COIN"),
            default_payment_type: mock("mock_zsui", "MOCK_ZSUI"),
        }
    }

    /// Load defaults, then apply `ESCROW_*` environment overrides (after `.env`)
    pub fn from_env() -> AppResult<Self> {
        dotenv::dotenv().ok();

        let overrides: EnvOverrides = config::Config::builder()
            .add_source(config::Environment::with_prefix("ESCROW").try_parsing(true))
            .build()?
            .try_deserialize()?;
        debug!("Escrow config overrides: {:?}", overrides);

        let mut cfg = match overrides.package_id.as_deref() {
            Some(package_id) => Self::for_package(package_id),
            None => Self::default(),
        };
        if let Some(faucet_id) = overrides.faucet_id {
            cfg.faucet_id = faucet_id;
        }
        if let Some(module) = overrides.escrow_module {
            cfg.escrow_module = module;
        }
        if let Some(decimals) = overrides.decimals {
            if decimals > MAX_DECIMALS {
                return Err(AmountError::UnsupportedDecimals(decimals).into());
            }
            cfg.decimals = decimals;
        }
        if let Some(pages) = overrides.max_history_pages {
            cfg.max_history_pages = pages.max(1);
        }

        info!(
            "Escrow config loaded: package {} module {}",
            cfg.package_id, cfg.escrow_module
        );
        Ok(cfg)
    }

    /// `<package>::<module>::<Escrow>`
    pub fn escrow_type_prefix(&self) -> String {
        format!(
            "{}::{}::{}",
            self.package_id, self.escrow_module, self.escrow_struct
        )
    }

    pub fn preset(&self, coin_type: &TypeTag) -> Option<&CoinPreset> {
        self.coin_presets
            .iter()
            .find(|p| p.coin_type.same_type(coin_type))
    }

    /// Preset label, or the raw type string for unknown coins
    pub fn label_for(&self, coin_type: &str) -> String {
        TypeTag::from_str(coin_type)
            .ok()
            .and_then(|tag| self.preset(&tag).map(|p| p.label.clone()))
            .unwrap_or_else(|| coin_type.to_string())
    }

    /// Map a picker value to a selection; `"custom"` starts an empty custom entry
    pub fn select(&self, value: &str) -> CoinSelection {
        if value == "custom" {
            return CoinSelection::Custom(String::new());
        }
        match TypeTag::from_str(value) {
            Ok(tag) => match self.preset(&tag) {
                Some(preset) => CoinSelection::Preset(preset.coin_type.clone()),
                None => CoinSelection::Custom(value.to_string()),
            },
            Err(_) => CoinSelection::Custom(value.to_string()),
        }
    }

    /// Keep deposit and payment apart: on a collision pick the first preset that differs
    pub fn distinct_payment(&self, deposit: &TypeTag, payment: &TypeTag) -> TypeTag {
        if !deposit.same_type(payment) {
            return payment.clone();
        }
        self.coin_presets
            .iter()
            .find(|p| !p.coin_type.same_type(deposit))
            .map(|p| p.coin_type.clone())
            .unwrap_or_else(|| payment.clone())
    }

    /// Coins the faucet hands out: the presets published under this package
    pub fn faucet_coins(&self) -> Vec<&CoinPreset> {
        self.coin_presets
            .iter()
            .filter(|p| addresses_equal(&p.coin_type.address, &self.package_id))
            .collect()
    }
}
