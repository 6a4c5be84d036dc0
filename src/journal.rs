use std::fmt;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::governance::VoteChoice;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum LedgerEvent {
    ProposalCreated { id: String, title: String, creator: String, tx: String },
    VoteCast { proposal_id: String, voter: String, choice: VoteChoice, tx: String },
    ProposalExpired { id: String },
    ProposalClosed { id: String, by: String },
    MintInitialized { mint: String },
    TokensMinted { owner: String, action: String, amount: f64, tx: String },
    TokensStaked { owner: String, amount: f64, duration_days: u32, tx: String },
}

impl fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ProposalCreated { id, title, creator, tx } => {
                write!(f, "proposal {id} \"{title}\" created by {creator} ({tx})")
            }
            Self::VoteCast { proposal_id, voter, choice, tx } => {
                write!(f, "{voter} voted {choice:?} on {proposal_id} ({tx})")
            }
            Self::ProposalExpired { id } => write!(f, "proposal {id} expired"),
            Self::ProposalClosed { id, by } => write!(f, "proposal {id} closed by {by}"),
            Self::MintInitialized { mint } => write!(f, "GREEN mint {mint} initialised"),
            Self::TokensMinted { owner, action, amount, tx } => {
                write!(f, "minted {amount:.2} GREEN to {owner} for {action} ({tx})")
            }
            Self::TokensStaked { owner, amount, duration_days, tx } => {
                write!(f, "{owner} staked {amount:.2} GREEN for {duration_days}d ({tx})")
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JournalEntry {
    pub at: DateTime<Utc>,
    pub event: LedgerEvent,
}

/// In-memory event log shared by the simulated ledgers. Lost on restart.
#[derive(Clone, Default)]
pub struct Journal {
    entries: Arc<Mutex<Vec<JournalEntry>>>,
}

impl Journal {
    pub fn record(&self, at: DateTime<Utc>, event: LedgerEvent) {
        tracing::debug!(%event, "journal.record");
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.push(JournalEntry { at, event });
    }

    pub fn entries(&self) -> Vec<JournalEntry> {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_same_log() {
        let journal = Journal::default();
        let other = journal.clone();
        other.record(Utc::now(), LedgerEvent::ProposalExpired { id: "p1".into() });
        assert_eq!(journal.len(), 1);
        assert_eq!(journal.entries()[0].event.to_string(), "proposal p1 expired");
    }
}
