use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{read_keypair_file, Keypair, Signature, Signer};
use thiserror::Error;
use tracing::{info, warn};

pub const MOCK_NATIVE_BALANCE: f64 = 2.35;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WalletError {
    #[error("wallet required: no wallet provider is available")]
    ProviderMissing,
    #[error("wallet is not connected")]
    NotConnected,
    #[error("wallet has not approved this app yet")]
    NotTrusted,
    #[error("signature does not match signer {0}")]
    SignatureMismatch(String),
}

/// The wallet capability a host injects (connect, sign, send).
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// True when signing never reaches a real network.
    fn is_simulated(&self) -> bool;
    async fn connect(&self, only_if_trusted: bool) -> Result<Pubkey, WalletError>;
    async fn disconnect(&self) -> Result<(), WalletError>;
    fn sign_message(&self, message: &[u8]) -> Result<Signature, WalletError>;
    /// Sign `payload` and submit it. Returns the transaction signature.
    async fn sign_and_send(&self, payload: &[u8]) -> Result<Signature, WalletError>;
}

/// Keypair-backed provider. Nothing it signs is broadcast.
pub struct LocalWallet {
    keypair: Keypair,
    trusted: AtomicBool,
    connected: AtomicBool,
}

impl LocalWallet {
    pub fn new(keypair: Keypair) -> Self {
        Self {
            keypair,
            trusted: AtomicBool::new(false),
            connected: AtomicBool::new(false),
        }
    }

    pub fn ephemeral() -> Self {
        Self::new(Keypair::new())
    }

    pub fn from_file(path: &str) -> Result<Self> {
        let kp = read_keypair_file(path).map_err(|e| anyhow!("failed to read keypair {path}: {e}"))?;
        Ok(Self::new(kp))
    }

    /// Mark the app as previously approved so a silent reconnect succeeds.
    pub fn pre_approved(self) -> Self {
        self.trusted.store(true, Ordering::SeqCst);
        self
    }

    fn ensure_connected(&self) -> Result<(), WalletError> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(WalletError::NotConnected)
        }
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    fn is_simulated(&self) -> bool {
        true
    }

    async fn connect(&self, only_if_trusted: bool) -> Result<Pubkey, WalletError> {
        if only_if_trusted && !self.trusted.load(Ordering::SeqCst) {
            return Err(WalletError::NotTrusted);
        }
        self.trusted.store(true, Ordering::SeqCst);
        self.connected.store(true, Ordering::SeqCst);
        Ok(self.keypair.pubkey())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.connected.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn sign_message(&self, message: &[u8]) -> Result<Signature, WalletError> {
        self.ensure_connected()?;
        Ok(self.keypair.sign_message(message))
    }

    async fn sign_and_send(&self, payload: &[u8]) -> Result<Signature, WalletError> {
        self.ensure_connected()?;
        let sig = self.keypair.sign_message(payload);
        info!(signer = %self.keypair.pubkey(), %sig, "wallet.simulated_send");
        Ok(sig)
    }
}

pub fn verify_signature(signer: &Pubkey, message: &[u8], sig: &Signature) -> Result<(), WalletError> {
    if sig.verify(signer.as_ref(), message) {
        Ok(())
    } else {
        Err(WalletError::SignatureMismatch(signer.to_string()))
    }
}

pub enum BalanceSource {
    Mock,
    Rpc(Arc<RpcClient>),
}

impl BalanceSource {
    pub fn rpc(url: String) -> Self {
        Self::Rpc(Arc::new(RpcClient::new_with_commitment(url, CommitmentConfig::confirmed())))
    }

    /// Native balance in SOL. RPC failures read as 0.
    async fn native_balance(&self, owner: &Pubkey) -> f64 {
        match self {
            Self::Mock => MOCK_NATIVE_BALANCE,
            Self::Rpc(rpc) => match rpc.get_balance(owner).await {
                Ok(lamports) => lamports as f64 / LAMPORTS_PER_SOL as f64,
                Err(e) => {
                    warn!(%owner, error = %e, "wallet.balance_failed");
                    0.0
                }
            },
        }
    }
}

/// Connection state for one user of the dashboard.
pub struct WalletSession {
    provider: Option<Arc<dyn WalletProvider>>,
    balances: BalanceSource,
    address: Option<Pubkey>,
    native_balance: f64,
}

impl WalletSession {
    pub fn new(provider: Option<Arc<dyn WalletProvider>>, balances: BalanceSource) -> Self {
        Self {
            provider,
            balances,
            address: None,
            native_balance: 0.0,
        }
    }

    fn provider(&self) -> Result<&Arc<dyn WalletProvider>, WalletError> {
        self.provider.as_ref().ok_or(WalletError::ProviderMissing)
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    pub fn is_simulated(&self) -> bool {
        self.provider.as_ref().map_or(true, |p| p.is_simulated())
    }

    pub fn is_connected(&self) -> bool {
        self.address.is_some()
    }

    pub fn address(&self) -> Option<Pubkey> {
        self.address
    }

    pub fn require_address(&self) -> Result<Pubkey, WalletError> {
        self.address.ok_or(WalletError::NotConnected)
    }

    pub fn native_balance(&self) -> f64 {
        self.native_balance
    }

    pub async fn connect(&mut self) -> Result<Pubkey, WalletError> {
        let pubkey = self.provider()?.connect(false).await?;
        self.establish(pubkey).await;
        info!(address = %pubkey, "wallet.connected");
        Ok(pubkey)
    }

    /// Reconnect without prompting. Any failure just leaves the session disconnected.
    pub async fn try_silent_reconnect(&mut self) -> Option<Pubkey> {
        let provider = self.provider.as_ref()?;
        match provider.connect(true).await {
            Ok(pubkey) => {
                self.establish(pubkey).await;
                info!(address = %pubkey, "wallet.reconnected");
                Some(pubkey)
            }
            Err(e) => {
                info!(reason = %e, "wallet.not_auto_connected");
                None
            }
        }
    }

    async fn establish(&mut self, pubkey: Pubkey) {
        self.native_balance = self.balances.native_balance(&pubkey).await;
        self.address = Some(pubkey);
    }

    /// Local state is cleared even if the provider errors.
    pub async fn disconnect(&mut self) -> Result<(), WalletError> {
        let result = match self.provider.as_ref() {
            Some(p) => p.disconnect().await,
            None => Ok(()),
        };
        self.address = None;
        self.native_balance = 0.0;
        if let Err(e) = &result {
            warn!(error = %e, "wallet.disconnect_failed");
        }
        result
    }

    pub fn sign_message(&self, message: &[u8]) -> Result<Signature, WalletError> {
        self.require_address()?;
        self.provider()?.sign_message(message)
    }

    pub async fn sign_and_send(&self, payload: &[u8]) -> Result<Signature, WalletError> {
        self.require_address()?;
        self.provider()?.sign_and_send(payload).await
    }
}
