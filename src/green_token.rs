use std::fmt;

use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::governance::pseudo_id;
use crate::journal::{Journal, LedgerEvent};
use crate::wallet::{WalletError, WalletSession};

pub const GREEN_DECIMALS: u32 = 9;
/// Opening GREEN balance of a freshly connected wallet.
pub const MOCK_GREEN_BALANCE: f64 = 150.0;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error("amount must be greater than zero")]
    ZeroAmount,
    #[error("insufficient GREEN balance: have {have:.2}, need {need:.2}")]
    InsufficientBalance { have: f64, need: f64 },
    #[error("amount overflows base units")]
    Overflow,
    #[error("failed to encode payload: {0}")]
    Encoding(String),
}

/// Eco actions that earn GREEN, with their reward multipliers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcoAction {
    CarbonOffset,
    RenewableEnergy,
    WasteReduction,
    EcoTransport,
    GreenInvestment,
    CommunityAction,
    Other(String),
}

impl EcoAction {
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "carbon_offset" => Self::CarbonOffset,
            "renewable_energy" => Self::RenewableEnergy,
            "waste_reduction" => Self::WasteReduction,
            "eco_transport" => Self::EcoTransport,
            "green_investment" => Self::GreenInvestment,
            "community_action" => Self::CommunityAction,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            Self::CarbonOffset => 10.0,
            Self::RenewableEnergy => 15.0,
            Self::WasteReduction => 8.0,
            Self::EcoTransport => 12.0,
            Self::GreenInvestment => 20.0,
            Self::CommunityAction => 5.0,
            Self::Other(_) => 1.0,
        }
    }
}

impl fmt::Display for EcoAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CarbonOffset => "carbon_offset",
            Self::RenewableEnergy => "renewable_energy",
            Self::WasteReduction => "waste_reduction",
            Self::EcoTransport => "eco_transport",
            Self::GreenInvestment => "green_investment",
            Self::CommunityAction => "community_action",
            Self::Other(s) => s,
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct GreenTokenAccount {
    pub balance: f64,
    pub carbon_offset: f64,
    pub eco_score: u8,
    pub staking_rewards: f64,
    pub staked: f64,
}

impl GreenTokenAccount {
    /// Starting figures for a freshly connected wallet.
    fn mocked() -> Self {
        Self {
            balance: MOCK_GREEN_BALANCE,
            carbon_offset: 75.5,
            eco_score: 92,
            staking_rewards: 12.3,
            staked: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintReceipt {
    pub tx_id: String,
    pub base_units: u64,
    pub payload_b64: String,
}

#[derive(Serialize)]
struct MintPayload<'a> {
    mint: &'a str,
    owner: &'a str,
    action: String,
    base_units: u64,
}

#[derive(Serialize)]
struct StakePayload<'a> {
    owner: &'a str,
    base_units: u64,
    duration_days: u32,
}

pub fn to_base_units(amount: f64) -> Result<u64, TokenError> {
    scaled_to_u64((amount * 10f64.powi(GREEN_DECIMALS as i32)).round())
}

/// `u64::MAX as f64` rounds up to 2^64, which is itself out of range.
fn scaled_to_u64(scaled: f64) -> Result<u64, TokenError> {
    if !scaled.is_finite() || scaled < 0.0 || scaled >= u64::MAX as f64 {
        return Err(TokenError::Overflow);
    }
    Ok(scaled as u64)
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, TokenError> {
    bincode::serialize(value).map_err(|e| TokenError::Encoding(e.to_string()))
}

/// Simulated GREEN token: a pseudo mint plus one in-memory account per session.
pub struct GreenTokenLedger {
    mint: Option<String>,
    account: Option<(String, GreenTokenAccount)>,
    journal: Journal,
}

impl GreenTokenLedger {
    pub fn new(journal: Journal) -> Self {
        Self { mint: None, account: None, journal }
    }

    pub fn mint_address(&self) -> Option<&str> {
        self.mint.as_deref()
    }

    /// Account for the connected wallet; zeros when disconnected.
    pub fn account(&mut self, wallet: &WalletSession) -> GreenTokenAccount {
        match wallet.address() {
            Some(addr) => self.account_mut(&addr.to_string()).clone(),
            None => GreenTokenAccount::default(),
        }
    }

    fn account_mut(&mut self, owner: &str) -> &mut GreenTokenAccount {
        if !matches!(&self.account, Some((o, _)) if o == owner) {
            self.account = None;
        }
        let (_, acct) = self
            .account
            .get_or_insert_with(|| (owner.to_string(), GreenTokenAccount::mocked()));
        acct
    }

    pub fn initialize_mint(&mut self, wallet: &WalletSession, now: DateTime<Utc>) -> Result<String, TokenError> {
        wallet.require_address()?;
        if let Some(mint) = &self.mint {
            return Ok(mint.clone());
        }
        let mint = pseudo_id();
        info!(%mint, decimals = GREEN_DECIMALS, "green.mint_initialized");
        self.journal.record(now, LedgerEvent::MintInitialized { mint: mint.clone() });
        self.mint = Some(mint.clone());
        Ok(mint)
    }

    pub async fn mint(
        &mut self,
        wallet: &WalletSession,
        amount: f64,
        action: EcoAction,
        now: DateTime<Utc>,
    ) -> Result<MintReceipt, TokenError> {
        if amount.is_nan() || amount <= 0.0 {
            return Err(TokenError::ZeroAmount);
        }
        let owner = wallet.require_address()?.to_string();
        let mint = self.initialize_mint(wallet, now)?;

        let reward = amount * action.multiplier();
        let base_units = to_base_units(reward)?;
        let payload = encode(&MintPayload {
            mint: &mint,
            owner: &owner,
            action: action.to_string(),
            base_units,
        })?;
        let sig = wallet.sign_and_send(&payload).await?;
        let tx_id = sig.to_string();

        self.account_mut(&owner).balance += reward;
        info!(%owner, %action, reward, %tx_id, "green.minted");
        self.journal.record(
            now,
            LedgerEvent::TokensMinted {
                owner,
                action: action.to_string(),
                amount: reward,
                tx: tx_id.clone(),
            },
        );

        Ok(MintReceipt {
            tx_id,
            base_units,
            payload_b64: base64::engine::general_purpose::STANDARD.encode(payload),
        })
    }

    pub async fn stake(
        &mut self,
        wallet: &WalletSession,
        amount: f64,
        duration_days: u32,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        if amount.is_nan() || amount <= 0.0 {
            return Err(TokenError::ZeroAmount);
        }
        let owner = wallet.require_address()?.to_string();
        let have = self.account_mut(&owner).balance;
        if amount > have {
            return Err(TokenError::InsufficientBalance { have, need: amount });
        }

        let payload = encode(&StakePayload {
            owner: &owner,
            base_units: to_base_units(amount)?,
            duration_days,
        })?;
        let tx_id = wallet.sign_and_send(&payload).await?.to_string();

        let acct = self.account_mut(&owner);
        acct.balance -= amount;
        acct.staked += amount;
        info!(%owner, amount, duration_days, %tx_id, "green.staked");
        self.journal.record(
            now,
            LedgerEvent::TokensStaked { owner, amount, duration_days, tx: tx_id.clone() },
        );
        Ok(tx_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::wallet::{BalanceSource, LocalWallet};

    async fn connected_session() -> WalletSession {
        let mut s = WalletSession::new(Some(Arc::new(LocalWallet::ephemeral())), BalanceSource::Mock);
        s.connect().await.unwrap();
        s
    }

    #[test]
    fn multipliers_follow_action_table() {
        assert_eq!(EcoAction::parse("carbon_offset").multiplier(), 10.0);
        assert_eq!(EcoAction::parse("renewable_energy").multiplier(), 15.0);
        assert_eq!(EcoAction::parse("waste_reduction").multiplier(), 8.0);
        assert_eq!(EcoAction::parse("eco_transport").multiplier(), 12.0);
        assert_eq!(EcoAction::parse("green_investment").multiplier(), 20.0);
        assert_eq!(EcoAction::parse("community_action").multiplier(), 5.0);
        assert_eq!(EcoAction::parse("gardening").multiplier(), 1.0);
        assert_eq!(EcoAction::parse("gardening").to_string(), "gardening");
    }

    #[test]
    fn base_units_use_nine_decimals() {
        assert_eq!(to_base_units(1.0).unwrap(), 1_000_000_000);
        assert_eq!(to_base_units(0.5).unwrap(), 500_000_000);
        assert!(matches!(to_base_units(1e12), Err(TokenError::Overflow)));
        assert!(matches!(to_base_units(-1.0), Err(TokenError::Overflow)));
        assert!(matches!(to_base_units(f64::INFINITY), Err(TokenError::Overflow)));
    }

    #[test]
    fn two_to_the_64_does_not_saturate() {
        let two_pow_64 = 2f64.powi(64);
        assert_eq!(two_pow_64, u64::MAX as f64);
        assert!(matches!(scaled_to_u64(two_pow_64), Err(TokenError::Overflow)));
        assert_eq!(scaled_to_u64(2f64.powi(63)).unwrap(), 1u64 << 63);
    }

    #[tokio::test]
    async fn disconnected_account_is_zeroed() {
        let mut ledger = GreenTokenLedger::new(Journal::default());
        let s = WalletSession::new(None, BalanceSource::Mock);
        assert_eq!(ledger.account(&s), GreenTokenAccount::default());
        assert!(matches!(
            ledger.mint(&s, 1.0, EcoAction::CarbonOffset, Utc::now()).await,
            Err(TokenError::Wallet(WalletError::NotConnected))
        ));
    }

    #[tokio::test]
    async fn mint_initialises_lazily_and_credits_reward() {
        let journal = Journal::default();
        let mut ledger = GreenTokenLedger::new(journal.clone());
        let s = connected_session().await;
        assert_eq!(ledger.account(&s).balance, 150.0);

        let r = ledger.mint(&s, 2.0, EcoAction::RenewableEnergy, Utc::now()).await.unwrap();
        assert_eq!(r.base_units, 30_000_000_000);
        assert!(ledger.mint_address().is_some());
        assert_eq!(ledger.account(&s).balance, 180.0);

        let mint = ledger.mint_address().map(str::to_string);
        ledger.mint(&s, 1.0, EcoAction::CommunityAction, Utc::now()).await.unwrap();
        assert_eq!(ledger.mint_address().map(str::to_string), mint);
        // mint init + two mints
        assert_eq!(journal.len(), 3);
    }

    #[tokio::test]
    async fn staking_moves_balance_and_checks_funds() {
        let mut ledger = GreenTokenLedger::new(Journal::default());
        let s = connected_session().await;

        assert!(matches!(
            ledger.stake(&s, 0.0, 30, Utc::now()).await,
            Err(TokenError::ZeroAmount)
        ));
        assert!(matches!(
            ledger.stake(&s, 500.0, 30, Utc::now()).await,
            Err(TokenError::InsufficientBalance { .. })
        ));

        ledger.stake(&s, 50.0, 30, Utc::now()).await.unwrap();
        let acct = ledger.account(&s);
        assert_eq!(acct.balance, 100.0);
        assert_eq!(acct.staked, 50.0);
    }
}
