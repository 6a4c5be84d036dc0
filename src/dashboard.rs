use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::advisor::{Advisor, AdvisorReply, Personality};
use crate::config::{Config, WalletMode};
use crate::governance::{Category, GovernanceError, GovernanceLedger, NewProposal, ProposalStatus, Receipt, VoteChoice};
use crate::green_token::{EcoAction, GreenTokenAccount, GreenTokenLedger, MintReceipt, TokenError};
use crate::journal::Journal;
use crate::market::{Board, MarketFeed};
use crate::notifier::Notifier;
use crate::okx::{OkxClient, TickerSource};
use crate::strategy::eco_signal::EcoSignalEngine;
use crate::time::{format_deadline, time_remaining};
use crate::wallet::{BalanceSource, LocalWallet, WalletError, WalletProvider, WalletSession};

#[derive(Debug, Clone, Serialize)]
pub struct ProposalView {
    pub id: String,
    pub title: String,
    pub category: Category,
    pub status: ProposalStatus,
    pub votes_for: u64,
    pub votes_against: u64,
    pub for_pct: u8,
    pub against_pct: u8,
    pub time_remaining: String,
    pub deadline_local: String,
    pub user_voted: bool,
    pub user_vote: Option<VoteChoice>,
}

/// Everything a dashboard session needs, built once and passed around.
pub struct Dashboard {
    cfg: Config,
    feed: MarketFeed,
    engine: EcoSignalEngine,
    wallet: Mutex<WalletSession>,
    governance: Mutex<GovernanceLedger>,
    tokens: Mutex<GreenTokenLedger>,
    advisor: Mutex<Advisor>,
    journal: Journal,
    notifier: Notifier,
}

impl Dashboard {
    pub fn from_config(cfg: Config) -> Result<Self> {
        let source = OkxClient::new(
            cfg.okx_base_url.clone(),
            cfg.active_proxy().map(str::to_string),
            Duration::from_secs(cfg.http_timeout_secs),
        )?;
        let provider: Option<Arc<dyn WalletProvider>> = match cfg.wallet_mode {
            WalletMode::None => None,
            WalletMode::Local => {
                let wallet = match cfg.sol_keypair_path.as_deref() {
                    // A keypair on disk counts as an already-approved wallet.
                    Some(path) => LocalWallet::from_file(path)?.pre_approved(),
                    None => LocalWallet::ephemeral(),
                };
                Some(Arc::new(wallet))
            }
        };
        Self::new(cfg, Arc::new(source), provider, Advisor::from_entropy())
    }

    pub fn new(
        cfg: Config,
        source: Arc<dyn TickerSource>,
        provider: Option<Arc<dyn WalletProvider>>,
        advisor: Advisor,
    ) -> Result<Self> {
        let journal = Journal::default();
        let notifier = Notifier::new(
            cfg.notify_webhook_url.clone(),
            Duration::from_secs(cfg.http_timeout_secs),
        )?;
        let balances = if cfg.rpc_balance {
            BalanceSource::rpc(cfg.solana_rpc_url.clone())
        } else {
            BalanceSource::Mock
        };
        Ok(Self {
            feed: MarketFeed::new(source, cfg.instrument_ids(), &cfg.quote_symbol),
            engine: EcoSignalEngine::default(),
            wallet: Mutex::new(WalletSession::new(provider, balances)),
            governance: Mutex::new(GovernanceLedger::new(cfg.proposal_duration_days, journal.clone())),
            tokens: Mutex::new(GreenTokenLedger::new(journal.clone())),
            advisor: Mutex::new(advisor),
            notifier,
            journal,
            cfg,
        })
    }

    /// Seed governance and try a silent wallet reconnect.
    pub async fn init(&self) {
        if self.cfg.seed_proposals {
            self.governance.lock().await.seed_defaults(Utc::now());
        }
        let mut wallet = self.wallet.lock().await;
        if !wallet.has_provider() {
            self.notifier
                .error("[WALLET] REQUIRED", "No wallet provider available; governance and GREEN actions are disabled.");
            return;
        }
        wallet.try_silent_reconnect().await;
        info!(
            connected = wallet.is_connected(),
            simulated = wallet.is_simulated(),
            "dashboard.init"
        );
    }

    pub async fn shutdown(&self) {
        let mut wallet = self.wallet.lock().await;
        if wallet.is_connected() {
            let _ = wallet.disconnect().await;
        }
        let entries = self.journal.entries();
        for entry in &entries {
            debug!(at = %entry.at, event = %entry.event, "dashboard.journal");
        }
        info!(events = entries.len(), "dashboard.shutdown");
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn feed(&self) -> &MarketFeed {
        &self.feed
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    // --- market ---

    pub async fn refresh_market(&self) -> bool {
        self.feed.refresh(&self.engine).await
    }

    /// Build a board for an already reserved sequence number and publish it.
    pub async fn refresh_market_tagged(&self, seq: u64) -> bool {
        let board = self.feed.build_board(seq, &self.engine).await;
        self.feed.publish(board).await
    }

    pub async fn board(&self) -> Option<Board> {
        self.feed.board().await
    }

    // --- wallet ---

    pub async fn connect_wallet(&self) -> Result<Pubkey, WalletError> {
        let result = self.wallet.lock().await.connect().await;
        match &result {
            Ok(addr) => self.notifier.info("[CONNECTION] ESTABLISHED", format!("Connected {addr}")),
            Err(e) => self.notifier.error("[CONNECTION] FAILED", e.to_string()),
        }
        result
    }

    pub async fn disconnect_wallet(&self) -> Result<(), WalletError> {
        let result = self.wallet.lock().await.disconnect().await;
        if result.is_ok() {
            self.notifier.info("[DISCONNECTION] COMPLETE", "Wallet disconnected");
        }
        result
    }

    pub async fn wallet_address(&self) -> Option<Pubkey> {
        self.wallet.lock().await.address()
    }

    /// (native SOL, GREEN). GREEN is read from the token ledger so minting and
    /// staking show up here too.
    pub async fn wallet_balances(&self) -> (f64, f64) {
        let wallet = self.wallet.lock().await;
        let green = self.tokens.lock().await.account(&wallet).balance;
        (wallet.native_balance(), green)
    }

    // --- governance ---

    pub async fn create_proposal(&self, draft: NewProposal) -> Result<Receipt, GovernanceError> {
        let title = draft.title.clone();
        let wallet = self.wallet.lock().await;
        let mut governance = self.governance.lock().await;
        let result = governance.create_proposal(&wallet, draft, Utc::now()).await;
        drop(governance);
        drop(wallet);
        match &result {
            Ok(r) => self.notifier.info("[PROPOSAL] CREATED", format!("\"{title}\" ({})", r.tx_id)),
            Err(e) => self.notifier.error("[PROPOSAL] FAILED", e.to_string()),
        }
        result
    }

    pub async fn vote(&self, proposal_id: &str, choice: VoteChoice) -> Result<Receipt, GovernanceError> {
        let wallet = self.wallet.lock().await;
        let mut governance = self.governance.lock().await;
        let result = governance.submit_vote(&wallet, proposal_id, choice, Utc::now()).await;
        drop(governance);
        drop(wallet);
        match &result {
            Ok(r) => self.notifier.info("[VOTE] RECORDED", format!("{choice:?} ({})", r.tx_id)),
            Err(e) => self.notifier.error("[VOTE] FAILED", e.to_string()),
        }
        result
    }

    pub async fn close_proposal(&self, proposal_id: &str) -> Result<(), GovernanceError> {
        let wallet = self.wallet.lock().await;
        let mut governance = self.governance.lock().await;
        let result = governance.close_proposal(&wallet, proposal_id, Utc::now());
        drop(governance);
        drop(wallet);
        if let Err(e) = &result {
            self.notifier.error("[PROPOSAL] CLOSE FAILED", e.to_string());
        }
        result
    }

    pub async fn expire_due(&self) -> usize {
        self.governance.lock().await.expire_due(Utc::now())
    }

    pub async fn proposals(&self) -> Vec<ProposalView> {
        let voter = self.wallet.lock().await.address().map(|a| a.to_string());
        let governance = self.governance.lock().await;
        let now = Utc::now();
        governance
            .proposals()
            .iter()
            .map(|p| {
                let user_vote = voter.as_deref().and_then(|v| p.vote_of(v));
                ProposalView {
                    id: p.id.clone(),
                    title: p.title.clone(),
                    category: p.category,
                    status: p.status,
                    votes_for: p.votes_for,
                    votes_against: p.votes_against,
                    for_pct: p.for_pct(),
                    against_pct: p.against_pct(),
                    time_remaining: time_remaining(p.deadline, now),
                    deadline_local: format_deadline(p.deadline, &self.cfg.tz)
                        .unwrap_or_else(|_| p.deadline.to_rfc3339()),
                    user_voted: user_vote.is_some(),
                    user_vote,
                }
            })
            .collect()
    }

    // --- green token ---

    pub async fn green_account(&self) -> GreenTokenAccount {
        let wallet = self.wallet.lock().await;
        self.tokens.lock().await.account(&wallet)
    }

    pub async fn mint_green(&self, amount: f64, action: &str) -> Result<MintReceipt, TokenError> {
        let wallet = self.wallet.lock().await;
        let mut tokens = self.tokens.lock().await;
        let result = tokens.mint(&wallet, amount, EcoAction::parse(action), Utc::now()).await;
        drop(tokens);
        drop(wallet);
        match &result {
            Ok(r) => self.notifier.info("[GREEN] MINTED", format!("{action} ({})", r.tx_id)),
            Err(e) => self.notifier.error("[GREEN] MINT FAILED", e.to_string()),
        }
        result
    }

    pub async fn stake_green(&self, amount: f64, duration_days: u32) -> Result<String, TokenError> {
        let wallet = self.wallet.lock().await;
        let mut tokens = self.tokens.lock().await;
        let result = tokens.stake(&wallet, amount, duration_days, Utc::now()).await;
        drop(tokens);
        drop(wallet);
        match &result {
            Ok(tx) => self.notifier.info("[GREEN] STAKED", format!("{amount:.2} for {duration_days}d ({tx})")),
            Err(e) => self.notifier.error("[GREEN] STAKE FAILED", e.to_string()),
        }
        result
    }

    // --- advisor ---

    pub async fn ask(&self, message: &str, personality: Personality) -> AdvisorReply {
        self.advisor.lock().await.respond(message, personality)
    }
}
