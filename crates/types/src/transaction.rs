//! Client transactions and the one-shot reply path.

use crate::{ReplicaId, TxnId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;
use tokio::sync::oneshot;

/// Reply delivered to the submitting client once its transaction is part of
/// a committed block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionReply {
    /// The transaction this reply acknowledges.
    pub txn_id: TxnId,
}

/// Single-use sink for the client reply.
///
/// The slot is consumed on the first `respond` call; later calls are
/// silently absorbed, so duplicate commit notifications for the same
/// transaction are harmless. A slot deserialized from the wire is empty:
/// only the replica that admitted the transaction holds the live sender.
#[derive(Default)]
pub struct ReplySlot(Mutex<Option<oneshot::Sender<TransactionReply>>>);

impl ReplySlot {
    /// A slot wired to the given sender.
    pub fn armed(sender: oneshot::Sender<TransactionReply>) -> Self {
        ReplySlot(Mutex::new(Some(sender)))
    }

    /// Consume the slot, delivering `reply` if a sender is still present.
    pub fn respond(&self, reply: TransactionReply) {
        let sender = self.0.lock().unwrap_or_else(|err| err.into_inner()).take();
        if let Some(sender) = sender {
            // The client may have gone away; nothing to do then.
            let _ = sender.send(reply);
        }
    }

    /// Whether the slot still holds an unconsumed sender.
    pub fn is_armed(&self) -> bool {
        self.0.lock().unwrap_or_else(|err| err.into_inner()).is_some()
    }
}

impl fmt::Debug for ReplySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReplySlot").field(&self.is_armed()).finish()
    }
}

/// A client transaction staged for inclusion in a block.
///
/// `submitter` is the replica that admitted the transaction; it is the one
/// that answers the client when the transaction commits.
#[derive(Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxnId,
    pub submitter: ReplicaId,
    pub payload: Vec<u8>,
    #[serde(skip)]
    pub reply: ReplySlot,
}

impl Transaction {
    /// A transaction without a reply channel (deserialized copies, tests).
    pub fn new(id: TxnId, submitter: ReplicaId, payload: Vec<u8>) -> Self {
        Transaction {
            id,
            submitter,
            payload,
            reply: ReplySlot::default(),
        }
    }

    /// A transaction with an armed reply slot, returning the receiving end
    /// for the client.
    pub fn with_reply(
        id: TxnId,
        submitter: ReplicaId,
        payload: Vec<u8>,
    ) -> (Self, oneshot::Receiver<TransactionReply>) {
        let (tx, rx) = oneshot::channel();
        let txn = Transaction {
            id,
            submitter,
            payload,
            reply: ReplySlot::armed(tx),
        };
        (txn, rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reply_slot_fires_once() {
        let (txn, mut rx) = Transaction::with_reply(TxnId(7), ReplicaId(0), vec![]);
        assert!(txn.reply.is_armed());

        txn.reply.respond(TransactionReply { txn_id: TxnId(7) });
        assert_eq!(rx.try_recv().unwrap().txn_id, TxnId(7));

        // Duplicate notifications are absorbed.
        txn.reply.respond(TransactionReply { txn_id: TxnId(7) });
        assert!(!txn.reply.is_armed());
    }

    #[test]
    fn deserialized_transaction_has_empty_slot() {
        let txn = Transaction::new(TxnId(1), ReplicaId(2), vec![1, 2, 3]);
        let bytes = serde_json::to_vec(&txn).unwrap();
        let back: Transaction = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(back.id, txn.id);
        assert!(!back.reply.is_armed());
    }
}
