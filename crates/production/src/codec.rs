//! Message encoding and framing for network transport.
//!
//! # Wire Format
//!
//! Each frame is length-prefixed on the stream:
//!
//! ```text
//! [len: u32 BE][version: u8][tag: u8][payload: bincode-encoded gossip]
//! ```
//!
//! The tag makes every frame self-describing, so a single connection can
//! carry all message kinds.

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use trichain_core::{Event, OutboundMessage};
use trichain_messages::{BlockGossip, QcGossip, TransactionGossip, VoteGossip};

/// Current wire format version.
pub const WIRE_VERSION: u8 = 1;

/// Upper bound on a single frame body.
const MAX_FRAME_LEN: usize = 4 * 1024 * 1024;

const TAG_BLOCK: u8 = 1;
const TAG_VOTE: u8 = 2;
const TAG_QC: u8 = 3;
const TAG_TRANSACTION: u8 = 4;

/// Errors that can occur during message encoding/decoding.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unknown wire version: {0}")]
    UnknownVersion(u8),

    #[error("unknown message tag: {0}")]
    UnknownTag(u8),

    #[error("message too short")]
    MessageTooShort,

    #[error("frame of {0} bytes exceeds the limit")]
    FrameTooLarge(usize),

    #[error("serialization failed: {0}")]
    Serialization(#[from] bincode::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Encode an outbound message to wire format.
pub fn encode_message(message: &OutboundMessage) -> Result<Vec<u8>, CodecError> {
    let (tag, payload) = match message {
        OutboundMessage::Block(gossip) => (TAG_BLOCK, bincode::serialize(gossip)?),
        OutboundMessage::Vote(gossip) => (TAG_VOTE, bincode::serialize(gossip)?),
        OutboundMessage::Qc(gossip) => (TAG_QC, bincode::serialize(gossip)?),
        OutboundMessage::Transaction(gossip) => (TAG_TRANSACTION, bincode::serialize(gossip)?),
    };
    let mut bytes = Vec::with_capacity(2 + payload.len());
    bytes.push(WIRE_VERSION);
    bytes.push(tag);
    bytes.extend(payload);
    Ok(bytes)
}

/// Decode a frame body into the receiving replica's event.
pub fn decode_message(data: &[u8]) -> Result<Event, CodecError> {
    if data.len() < 2 {
        return Err(CodecError::MessageTooShort);
    }
    let version = data[0];
    if version != WIRE_VERSION {
        return Err(CodecError::UnknownVersion(version));
    }
    let tag = data[1];
    let payload = &data[2..];
    match tag {
        TAG_BLOCK => {
            let gossip: BlockGossip = bincode::deserialize(payload)?;
            Ok(Event::BlockReceived {
                block: gossip.block,
            })
        }
        TAG_VOTE => {
            let gossip: VoteGossip = bincode::deserialize(payload)?;
            Ok(Event::VoteReceived { vote: gossip.vote })
        }
        TAG_QC => {
            let gossip: QcGossip = bincode::deserialize(payload)?;
            Ok(Event::QcReceived { qc: gossip.qc })
        }
        TAG_TRANSACTION => {
            let gossip: TransactionGossip = bincode::deserialize(payload)?;
            Ok(Event::TransactionSubmitted {
                txn: gossip.transaction,
            })
        }
        other => Err(CodecError::UnknownTag(other)),
    }
}

/// Write one length-prefixed frame.
pub async fn write_frame<W: AsyncWrite + Unpin>(
    writer: &mut W,
    body: &[u8],
) -> Result<(), CodecError> {
    if body.len() > MAX_FRAME_LEN {
        return Err(CodecError::FrameTooLarge(body.len()));
    }
    writer.write_u32(body.len() as u32).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame. Returns `None` on a clean EOF at a frame
/// boundary.
pub async fn read_frame<R: AsyncRead + Unpin>(
    reader: &mut R,
) -> Result<Option<Vec<u8>>, CodecError> {
    let len = match reader.read_u32().await {
        Ok(len) => len as usize,
        Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(err) => return Err(err.into()),
    };
    if len > MAX_FRAME_LEN {
        return Err(CodecError::FrameTooLarge(len));
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(Some(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use trichain_types::test_utils::{test_block, test_qc, test_transaction};
    use trichain_types::{QuorumCertificate, ReplicaId, View, Vote};

    #[test]
    fn block_round_trip() {
        let block = test_block(1, 1, QuorumCertificate::genesis());
        let message = OutboundMessage::Block(BlockGossip::new(block.clone()));
        let bytes = encode_message(&message).unwrap();
        assert_eq!(bytes[0], WIRE_VERSION);

        match decode_message(&bytes).unwrap() {
            Event::BlockReceived { block: decoded } => {
                assert_eq!(decoded.id, block.id);
                assert_eq!(decoded.view, block.view);
                assert_eq!(decoded.proposer, block.proposer);
            }
            other => panic!("expected a block event, got {other:?}"),
        }
    }

    #[test]
    fn vote_round_trip() {
        let block = test_block(2, 2, QuorumCertificate::genesis());
        let vote = Vote::new(View(2), ReplicaId(3), block.id);
        let bytes = encode_message(&OutboundMessage::Vote(VoteGossip::new(vote.clone()))).unwrap();

        match decode_message(&bytes).unwrap() {
            Event::VoteReceived { vote: decoded } => assert_eq!(decoded, vote),
            other => panic!("expected a vote event, got {other:?}"),
        }
    }

    #[test]
    fn qc_round_trip() {
        let block = test_block(3, 3, QuorumCertificate::genesis());
        let qc = test_qc(&block, &[0, 1, 2]);
        let bytes = encode_message(&OutboundMessage::Qc(QcGossip::new(qc.clone()))).unwrap();

        match decode_message(&bytes).unwrap() {
            Event::QcReceived { qc: decoded } => assert_eq!(decoded, qc),
            other => panic!("expected a qc event, got {other:?}"),
        }
    }

    #[test]
    fn transaction_round_trip_loses_the_reply_slot() {
        let txn = test_transaction(5);
        let bytes =
            encode_message(&OutboundMessage::Transaction(TransactionGossip::new(txn.clone())))
                .unwrap();

        match decode_message(&bytes).unwrap() {
            Event::TransactionSubmitted { txn: decoded } => {
                assert_eq!(decoded.id, txn.id);
                assert!(!decoded.reply.is_armed());
            }
            other => panic!("expected a transaction event, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_version_and_tag() {
        assert!(matches!(
            decode_message(&[9, TAG_BLOCK, 0]),
            Err(CodecError::UnknownVersion(9))
        ));
        assert!(matches!(
            decode_message(&[WIRE_VERSION, 99, 0]),
            Err(CodecError::UnknownTag(99))
        ));
        assert!(matches!(
            decode_message(&[WIRE_VERSION]),
            Err(CodecError::MessageTooShort)
        ));
    }

    #[tokio::test]
    async fn frames_round_trip_over_a_stream() {
        let (mut client, mut server) = tokio::io::duplex(1024);

        let body = b"frame body".to_vec();
        write_frame(&mut client, &body).await.unwrap();
        drop(client);

        let read = read_frame(&mut server).await.unwrap();
        assert_eq!(read, Some(body));
        // Clean EOF at the frame boundary.
        assert_eq!(read_frame(&mut server).await.unwrap(), None);
    }
}
