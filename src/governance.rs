//! Simulated governance: proposals and one-vote-per-wallet ballots.
//!
//! Nothing here touches a chain. Every state change is signed by the session's
//! wallet and the signature is checked against the voter's address before the
//! tally moves, so a vote is tied to an identity rather than a UI flag.

use std::collections::HashMap;

use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use solana_sdk::signature::{Keypair, Signer};
use thiserror::Error;
use tracing::{info, warn};

use crate::journal::{Journal, LedgerEvent};
use crate::wallet::{verify_signature, WalletError, WalletSession};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Policy,
    Community,
    Technology,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VoteChoice {
    For,
    Against,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProposalStatus {
    Active,
    Expired,
    Closed,
}

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error(transparent)]
    Wallet(#[from] WalletError),
    #[error("unknown proposal {0}")]
    UnknownProposal(String),
    #[error("{voter} already voted on proposal {proposal_id}")]
    AlreadyVoted { proposal_id: String, voter: String },
    #[error("proposal {0} is not active")]
    NotActive(String),
    #[error("only the creator can close proposal {0}")]
    NotCreator(String),
    #[error("proposal title cannot be empty")]
    EmptyTitle,
    #[error("voting period of {0} days puts the deadline out of range")]
    DeadlineOutOfRange(i64),
    #[error("failed to encode payload: {0}")]
    Encoding(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct Proposal {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub votes_for: u64,
    pub votes_against: u64,
    pub created_at: DateTime<Utc>,
    pub deadline: DateTime<Utc>,
    pub status: ProposalStatus,
    pub creator: String,
    pub creation_tx: Option<String>,
    /// voter address -> choice
    pub voters: HashMap<String, VoteChoice>,
}

impl Proposal {
    pub fn total_votes(&self) -> u64 {
        self.votes_for + self.votes_against
    }

    pub fn for_pct(&self) -> u8 {
        pct(self.votes_for, self.total_votes())
    }

    pub fn against_pct(&self) -> u8 {
        pct(self.votes_against, self.total_votes())
    }

    pub fn is_active(&self) -> bool {
        self.status == ProposalStatus::Active
    }

    pub fn vote_of(&self, voter: &str) -> Option<VoteChoice> {
        self.voters.get(voter).copied()
    }

    fn expire_if_due(&mut self, now: DateTime<Utc>) -> bool {
        if self.is_active() && now >= self.deadline {
            self.status = ProposalStatus::Expired;
            return true;
        }
        false
    }
}

fn pct(part: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    (part as f64 / total as f64 * 100.0).round() as u8
}

#[derive(Debug, Clone)]
pub struct NewProposal {
    pub title: String,
    pub description: String,
    pub category: Category,
}

/// What the wallet signed, and the resulting pseudo transaction id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub id: String,
    pub tx_id: String,
    pub payload_b64: String,
}

#[derive(Serialize)]
struct ProposalPayload<'a> {
    id: &'a str,
    title: &'a str,
    description: &'a str,
    category: Category,
    creator: &'a str,
    deadline_ms: i64,
}

#[derive(Serialize)]
struct Ballot<'a> {
    proposal_id: &'a str,
    voter: &'a str,
    choice: VoteChoice,
    cast_at_ms: i64,
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, GovernanceError> {
    bincode::serialize(value).map_err(|e| GovernanceError::Encoding(e.to_string()))
}

/// Fresh address-shaped identifier; no account is created for it.
pub fn pseudo_id() -> String {
    Keypair::new().pubkey().to_string()
}

pub struct GovernanceLedger {
    proposals: Vec<Proposal>,
    voting_period_days: i64,
    journal: Journal,
}

impl GovernanceLedger {
    pub fn new(voting_period_days: i64, journal: Journal) -> Self {
        Self {
            proposals: vec![],
            voting_period_days,
            journal,
        }
    }

    fn deadline_from(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, GovernanceError> {
        Duration::try_days(self.voting_period_days)
            .and_then(|period| now.checked_add_signed(period))
            .ok_or(GovernanceError::DeadlineOutOfRange(self.voting_period_days))
    }

    /// Newest first.
    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    pub fn get(&self, id: &str) -> Option<&Proposal> {
        self.proposals.iter().find(|p| p.id == id)
    }

    fn index_of(&self, id: &str) -> Result<usize, GovernanceError> {
        self.proposals
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| GovernanceError::UnknownProposal(id.to_string()))
    }

    pub fn user_voted(&self, id: &str, voter: &str) -> bool {
        self.get(id).is_some_and(|p| p.voters.contains_key(voter))
    }

    /// The two sample proposals shown on a fresh dashboard. Only tallies are
    /// seeded; a pre-cast ballot would need a voter key that does not exist yet.
    pub fn seed_defaults(&mut self, now: DateTime<Utc>) {
        let samples = [
            (
                "Ban Single-Use Plastics in Local Restaurants",
                "City-wide ban on single-use plastic containers, utensils and straws in food establishments.",
                Category::Policy,
                1247,
                453,
                7,
            ),
            (
                "Community Solar Panel Installation",
                "Fund solar panels on community buildings from the DAO treasury to cut the collective footprint.",
                Category::Community,
                892,
                234,
                14,
            ),
        ];
        for (title, description, category, votes_for, votes_against, days) in samples {
            self.proposals.push(Proposal {
                id: pseudo_id(),
                title: title.to_string(),
                description: description.to_string(),
                category,
                votes_for,
                votes_against,
                created_at: now,
                deadline: now + Duration::days(days),
                status: ProposalStatus::Active,
                creator: "greendao".to_string(),
                creation_tx: None,
                voters: HashMap::new(),
            });
        }
    }

    pub async fn create_proposal(
        &mut self,
        wallet: &WalletSession,
        draft: NewProposal,
        now: DateTime<Utc>,
    ) -> Result<Receipt, GovernanceError> {
        if draft.title.trim().is_empty() {
            return Err(GovernanceError::EmptyTitle);
        }
        let creator = wallet.require_address()?.to_string();
        let deadline = self.deadline_from(now)?;
        let id = pseudo_id();

        let payload = encode(&ProposalPayload {
            id: &id,
            title: &draft.title,
            description: &draft.description,
            category: draft.category,
            creator: &creator,
            deadline_ms: deadline.timestamp_millis(),
        })?;
        let sig = wallet.sign_and_send(&payload).await?;
        let tx_id = sig.to_string();

        info!(%id, title = %draft.title, %creator, %tx_id, "governance.proposal_created");
        self.journal.record(
            now,
            LedgerEvent::ProposalCreated {
                id: id.clone(),
                title: draft.title.clone(),
                creator: creator.clone(),
                tx: tx_id.clone(),
            },
        );
        self.proposals.insert(
            0,
            Proposal {
                id: id.clone(),
                title: draft.title,
                description: draft.description,
                category: draft.category,
                votes_for: 0,
                votes_against: 0,
                created_at: now,
                deadline,
                status: ProposalStatus::Active,
                creator,
                creation_tx: Some(tx_id.clone()),
                voters: HashMap::new(),
            },
        );

        Ok(Receipt {
            id,
            tx_id,
            payload_b64: base64::engine::general_purpose::STANDARD.encode(payload),
        })
    }

    /// Record one signed vote. Any failure leaves the tally untouched.
    pub async fn submit_vote(
        &mut self,
        wallet: &WalletSession,
        proposal_id: &str,
        choice: VoteChoice,
        now: DateTime<Utc>,
    ) -> Result<Receipt, GovernanceError> {
        let voter_key = wallet.require_address()?;
        let voter = voter_key.to_string();
        let idx = self.index_of(proposal_id)?;

        if self.proposals[idx].expire_if_due(now) {
            self.journal.record(now, LedgerEvent::ProposalExpired { id: proposal_id.to_string() });
        }
        let proposal = &self.proposals[idx];
        if !proposal.is_active() {
            return Err(GovernanceError::NotActive(proposal_id.to_string()));
        }
        if proposal.voters.contains_key(&voter) {
            warn!(%proposal_id, %voter, "governance.duplicate_vote");
            return Err(GovernanceError::AlreadyVoted {
                proposal_id: proposal_id.to_string(),
                voter,
            });
        }

        let ballot = encode(&Ballot {
            proposal_id,
            voter: &voter,
            choice,
            cast_at_ms: now.timestamp_millis(),
        })?;
        let sig = wallet.sign_and_send(&ballot).await?;
        verify_signature(&voter_key, &ballot, &sig)?;
        let tx_id = sig.to_string();

        let proposal = &mut self.proposals[idx];
        match choice {
            VoteChoice::For => proposal.votes_for += 1,
            VoteChoice::Against => proposal.votes_against += 1,
        }
        proposal.voters.insert(voter.clone(), choice);

        info!(%proposal_id, %voter, ?choice, %tx_id, "governance.vote");
        self.journal.record(
            now,
            LedgerEvent::VoteCast {
                proposal_id: proposal_id.to_string(),
                voter,
                choice,
                tx: tx_id.clone(),
            },
        );

        Ok(Receipt {
            id: proposal_id.to_string(),
            tx_id,
            payload_b64: base64::engine::general_purpose::STANDARD.encode(ballot),
        })
    }

    pub fn close_proposal(
        &mut self,
        wallet: &WalletSession,
        proposal_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), GovernanceError> {
        let caller = wallet.require_address()?.to_string();
        let idx = self.index_of(proposal_id)?;
        let proposal = &mut self.proposals[idx];
        if proposal.creator != caller {
            return Err(GovernanceError::NotCreator(proposal_id.to_string()));
        }
        if !proposal.is_active() {
            return Err(GovernanceError::NotActive(proposal_id.to_string()));
        }
        proposal.status = ProposalStatus::Closed;
        info!(%proposal_id, by = %caller, "governance.closed");
        self.journal.record(
            now,
            LedgerEvent::ProposalClosed { id: proposal_id.to_string(), by: caller },
        );
        Ok(())
    }

    /// Move every active proposal past its deadline to `Expired`.
    pub fn expire_due(&mut self, now: DateTime<Utc>) -> usize {
        let mut expired = 0;
        for p in &mut self.proposals {
            if p.expire_if_due(now) {
                info!(id = %p.id, "governance.expired");
                self.journal.record(now, LedgerEvent::ProposalExpired { id: p.id.clone() });
                expired += 1;
            }
        }
        expired
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

    fn draft(title: &str) -> NewProposal {
        NewProposal {
            title: title.to_string(),
            description: "Tax high-emission industries to fund renewables.".to_string(),
            category: Category::Policy,
        }
    }

    #[tokio::test]
    async fn create_requires_connected_wallet() {
        let journal = Journal::default();
        let mut ledger = GovernanceLedger::new(30, journal.clone());
        let s = WalletSession::new(None, BalanceSource::Mock);
        let err = ledger.create_proposal(&s, draft("Carbon tax"), Utc::now()).await.unwrap_err();
        assert!(matches!(err, GovernanceError::Wallet(WalletError::NotConnected)));
        assert!(ledger.proposals().is_empty());
        assert_eq!(journal.len(), 0);
    }

    #[tokio::test]
    async fn create_sets_deadline_and_prepends() {
        let journal = Journal::default();
        let mut ledger = GovernanceLedger::new(30, journal.clone());
        let now = Utc::now();
        ledger.seed_defaults(now);
        let s = connected_session().await;

        let receipt = ledger.create_proposal(&s, draft("Carbon tax"), now).await.unwrap();
        let p = &ledger.proposals()[0];
        assert_eq!(p.id, receipt.id);
        assert_eq!(p.deadline, now + Duration::days(30));
        assert_eq!(p.total_votes(), 0);
        assert_eq!(p.status, ProposalStatus::Active);
        assert_eq!(p.creator, s.address().unwrap().to_string());
        assert_eq!(p.creation_tx.as_deref(), Some(receipt.tx_id.as_str()));
        assert_eq!(ledger.proposals().len(), 3);
        assert_eq!(journal.len(), 1);
    }

    #[tokio::test]
    async fn oversized_voting_period_is_an_error() {
        let journal = Journal::default();
        let s = connected_session().await;
        for days in [1_000_000_000, i64::MAX] {
            let mut ledger = GovernanceLedger::new(days, journal.clone());
            let err = ledger.create_proposal(&s, draft("Carbon tax"), Utc::now()).await.unwrap_err();
            assert!(matches!(err, GovernanceError::DeadlineOutOfRange(d) if d == days));
            assert!(ledger.proposals().is_empty());
        }
        assert_eq!(journal.len(), 0);
    }

    #[tokio::test]
    async fn empty_title_is_rejected() {
        let mut ledger = GovernanceLedger::new(30, Journal::default());
        let s = connected_session().await;
        let err = ledger.create_proposal(&s, draft("   "), Utc::now()).await.unwrap_err();
        assert!(matches!(err, GovernanceError::EmptyTitle));
    }

    #[tokio::test]
    async fn second_vote_does_not_change_tally() {
        let mut ledger = GovernanceLedger::new(30, Journal::default());
        let now = Utc::now();
        ledger.seed_defaults(now);
        let id = ledger.proposals()[0].id.clone();
        let mut s = connected_session().await;
        let voter = s.address().unwrap().to_string();

        ledger.submit_vote(&s, &id, VoteChoice::For, now).await.unwrap();
        assert!(ledger.user_voted(&id, &voter));
        let p = ledger.get(&id).unwrap();
        assert_eq!((p.votes_for, p.votes_against), (1248, 453));

        let err = ledger.submit_vote(&s, &id, VoteChoice::Against, now).await.unwrap_err();
        assert!(matches!(err, GovernanceError::AlreadyVoted { .. }));

        // reconnecting does not reset the one-vote rule
        s.disconnect().await.unwrap();
        s.try_silent_reconnect().await.unwrap();
        let err = ledger.submit_vote(&s, &id, VoteChoice::Against, now).await.unwrap_err();
        assert!(matches!(err, GovernanceError::AlreadyVoted { .. }));

        let p = ledger.get(&id).unwrap();
        assert_eq!((p.votes_for, p.votes_against), (1248, 453));
        assert_eq!(p.vote_of(&voter), Some(VoteChoice::For));
    }

    #[tokio::test]
    async fn seeded_proposals_carry_tallies_but_no_ballots() {
        let mut ledger = GovernanceLedger::new(30, Journal::default());
        let now = Utc::now();
        ledger.seed_defaults(now);
        assert!(ledger.proposals().iter().all(|p| p.voters.is_empty()));

        // a tally is not a ballot: any wallet may still vote on the sample proposals
        let s = connected_session().await;
        let voter = s.address().unwrap().to_string();
        let id = ledger.proposals()[1].id.clone();
        assert!(!ledger.user_voted(&id, &voter));
        ledger.submit_vote(&s, &id, VoteChoice::For, now).await.unwrap();
        let p = ledger.get(&id).unwrap();
        assert_eq!((p.votes_for, p.votes_against), (893, 234));
    }

    #[tokio::test]
    async fn distinct_wallets_each_get_a_vote() {
        let mut ledger = GovernanceLedger::new(30, Journal::default());
        let now = Utc::now();
        let alice = connected_session().await;
        let bob = connected_session().await;
        let r = ledger.create_proposal(&alice, draft("Bike lanes"), now).await.unwrap();

        ledger.submit_vote(&alice, &r.id, VoteChoice::For, now).await.unwrap();
        ledger.submit_vote(&bob, &r.id, VoteChoice::Against, now).await.unwrap();

        let p = ledger.get(&r.id).unwrap();
        assert_eq!(p.total_votes(), 2);
        assert_eq!(p.for_pct(), 50);
        assert_eq!(p.against_pct(), 50);
    }

    #[tokio::test]
    async fn unknown_proposal_and_disconnected_voter() {
        let mut ledger = GovernanceLedger::new(30, Journal::default());
        let s = connected_session().await;
        let err = ledger.submit_vote(&s, "nope", VoteChoice::For, Utc::now()).await.unwrap_err();
        assert!(matches!(err, GovernanceError::UnknownProposal(_)));

        ledger.seed_defaults(Utc::now());
        let id = ledger.proposals()[0].id.clone();
        let offline = WalletSession::new(Some(Arc::new(LocalWallet::ephemeral())), BalanceSource::Mock);
        let err = ledger.submit_vote(&offline, &id, VoteChoice::For, Utc::now()).await.unwrap_err();
        assert!(matches!(err, GovernanceError::Wallet(WalletError::NotConnected)));
        assert_eq!(ledger.get(&id).unwrap().votes_for, 1247);
    }

    #[tokio::test]
    async fn proposals_expire_after_deadline() {
        let journal = Journal::default();
        let mut ledger = GovernanceLedger::new(30, journal.clone());
        let now = Utc::now();
        ledger.seed_defaults(now);

        assert_eq!(ledger.expire_due(now + Duration::days(1)), 0);
        assert_eq!(ledger.expire_due(now + Duration::days(7)), 1);
        assert_eq!(ledger.proposals()[0].status, ProposalStatus::Expired);
        assert_eq!(ledger.proposals()[1].status, ProposalStatus::Active);
        // already-expired proposals are not counted twice
        assert_eq!(ledger.expire_due(now + Duration::days(8)), 0);
        assert_eq!(journal.len(), 1);
    }

    #[tokio::test]
    async fn voting_past_deadline_is_rejected() {
        let mut ledger = GovernanceLedger::new(30, Journal::default());
        let now = Utc::now();
        ledger.seed_defaults(now);
        let id = ledger.proposals()[0].id.clone();
        let s = connected_session().await;

        let err = ledger
            .submit_vote(&s, &id, VoteChoice::For, now + Duration::days(8))
            .await
            .unwrap_err();
        assert!(matches!(err, GovernanceError::NotActive(_)));
        assert_eq!(ledger.get(&id).unwrap().status, ProposalStatus::Expired);
        assert_eq!(ledger.get(&id).unwrap().votes_for, 1247);
    }

    #[tokio::test]
    async fn only_creator_can_close() {
        let mut ledger = GovernanceLedger::new(30, Journal::default());
        let now = Utc::now();
        let alice = connected_session().await;
        let bob = connected_session().await;
        let r = ledger.create_proposal(&alice, draft("Tree planting"), now).await.unwrap();

        assert!(matches!(
            ledger.close_proposal(&bob, &r.id, now),
            Err(GovernanceError::NotCreator(_))
        ));
        ledger.close_proposal(&alice, &r.id, now).unwrap();
        assert_eq!(ledger.get(&r.id).unwrap().status, ProposalStatus::Closed);

        let err = ledger.submit_vote(&bob, &r.id, VoteChoice::For, now).await.unwrap_err();
        assert!(matches!(err, GovernanceError::NotActive(_)));
    }

    #[test]
    fn percentages_round_and_handle_zero() {
        assert_eq!(pct(0, 0), 0);
        assert_eq!(pct(1247, 1700), 73);
        assert_eq!(pct(453, 1700), 27);
        assert_eq!(pct(1, 3), 33);
    }
}
