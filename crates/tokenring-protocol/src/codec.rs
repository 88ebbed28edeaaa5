//! Fixed-width token record.
//!
//! Every channel write carries exactly one record, and every read must
//! return exactly one. Layout (little endian):
//!
//! ```text
//! offset  size  field
//!      0     4  turn         u32
//!      4     4  destination  i32, -1 = empty
//!      8  1016  payload      UTF-8, NUL padded
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokenring_topology::Position;

use crate::error::{ProtocolViolation, Result};
use crate::token::{Payload, Token};

/// Size of one encoded token.
pub const RECORD_LEN: usize = 1024;

/// Bytes taken by `turn` and `destination`.
pub const HEADER_LEN: usize = 8;

/// Largest payload a record can carry.
pub const PAYLOAD_CAPACITY: usize = RECORD_LEN - HEADER_LEN;

const EMPTY_DESTINATION: i32 = -1;

/// Encode a token into one record.
pub fn encode(token: &Token) -> std::result::Result<Bytes, ProtocolViolation> {
    let destination = match token.destination {
        None => EMPTY_DESTINATION,
        Some(p) => i32::try_from(p.value())
            .map_err(|_| ProtocolViolation::BadDestination(i64::from(p.value())))?,
    };
    // `Payload` never exceeds the capacity and never holds a NUL.
    let payload = token.payload.as_bytes();

    let mut buf = BytesMut::with_capacity(RECORD_LEN);
    buf.put_u32_le(token.turn);
    buf.put_i32_le(destination);
    buf.put_slice(payload);
    buf.put_bytes(0, PAYLOAD_CAPACITY - payload.len());
    Ok(buf.freeze())
}

/// Decode one record. The buffer must be exactly [`RECORD_LEN`] bytes.
pub fn decode(record: &[u8]) -> std::result::Result<Token, ProtocolViolation> {
    if record.len() < RECORD_LEN {
        return Err(ProtocolViolation::TruncatedRecord {
            got: record.len(),
            expected: RECORD_LEN,
        });
    }
    if record.len() > RECORD_LEN {
        return Err(ProtocolViolation::OversizedRecord {
            got: record.len(),
            expected: RECORD_LEN,
        });
    }

    let mut buf = record;
    let turn = buf.get_u32_le();
    let destination = match buf.get_i32_le() {
        EMPTY_DESTINATION => None,
        d if d >= 0 => Some(Position::new(d as u32)),
        d => return Err(ProtocolViolation::BadDestination(i64::from(d))),
    };

    let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    let text = std::str::from_utf8(&buf[..end]).map_err(|_| ProtocolViolation::BadPayload)?;

    Ok(Token {
        turn,
        destination,
        payload: Payload::from_wire(text.to_owned()),
    })
}

/// Read one whole record.
///
/// Returns `Ok(None)` when the stream ends cleanly on a record boundary.
/// A stream that ends mid-record is a [`ProtocolViolation::TruncatedRecord`].
pub async fn read_record<R>(reader: &mut R) -> Result<Option<Token>>
where
    R: AsyncRead + Unpin,
{
    let mut buf = [0u8; RECORD_LEN];
    let mut filled = 0;
    while filled < RECORD_LEN {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }

    match filled {
        0 => Ok(None),
        RECORD_LEN => Ok(Some(decode(&buf)?)),
        got => Err(ProtocolViolation::TruncatedRecord {
            got,
            expected: RECORD_LEN,
        }
        .into()),
    }
}

/// Write one whole record.
pub async fn write_record<W>(writer: &mut W, token: &Token) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    let record = encode(token)?;
    writer.write_all(&record).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn sample() -> Token {
        Token {
            turn: 2,
            destination: Some(Position::new(1)),
            payload: Payload::new("hello"),
        }
    }

    #[test]
    fn record_is_fixed_width() {
        assert_eq!(encode(&sample()).unwrap().len(), RECORD_LEN);
        assert_eq!(encode(&Token::new()).unwrap().len(), RECORD_LEN);
    }

    #[test]
    fn header_layout() {
        let record = encode(&sample()).unwrap();
        assert_eq!(&record[0..4], &2u32.to_le_bytes());
        assert_eq!(&record[4..8], &1i32.to_le_bytes());
        assert_eq!(&record[8..13], b"hello");
        assert!(record[13..].iter().all(|&b| b == 0));
    }

    #[test]
    fn empty_destination_encodes_as_minus_one() {
        let record = encode(&Token::new()).unwrap();
        assert_eq!(&record[4..8], &(-1i32).to_le_bytes());
        assert_eq!(decode(&record).unwrap(), Token::new());
    }

    #[test]
    fn decodes_what_it_encodes() {
        let token = sample();
        assert_eq!(decode(&encode(&token).unwrap()).unwrap(), token);
    }

    #[test]
    fn full_capacity_payload() {
        let token = Token {
            turn: 0,
            destination: Some(Position::new(0)),
            payload: Payload::new(&"z".repeat(PAYLOAD_CAPACITY)),
        };
        assert_eq!(decode(&encode(&token).unwrap()).unwrap(), token);
    }

    #[test]
    fn destination_beyond_i32_rejected() {
        let token = Token {
            turn: 0,
            destination: Some(Position::new(u32::MAX)),
            payload: Payload::empty(),
        };
        assert_eq!(
            encode(&token).unwrap_err(),
            ProtocolViolation::BadDestination(i64::from(u32::MAX))
        );
    }

    #[test]
    fn wrong_lengths_rejected() {
        let record = encode(&sample()).unwrap();
        assert_eq!(
            decode(&record[..100]).unwrap_err(),
            ProtocolViolation::TruncatedRecord {
                got: 100,
                expected: RECORD_LEN
            }
        );

        let mut long = record.to_vec();
        long.push(0);
        assert_eq!(
            decode(&long).unwrap_err(),
            ProtocolViolation::OversizedRecord {
                got: RECORD_LEN + 1,
                expected: RECORD_LEN
            }
        );
    }

    #[test]
    fn negative_destination_rejected() {
        let mut record = encode(&sample()).unwrap().to_vec();
        record[4..8].copy_from_slice(&(-7i32).to_le_bytes());
        assert_eq!(
            decode(&record).unwrap_err(),
            ProtocolViolation::BadDestination(-7)
        );
    }

    #[test]
    fn invalid_utf8_rejected() {
        let mut record = encode(&sample()).unwrap().to_vec();
        record[8] = 0xff;
        assert_eq!(decode(&record).unwrap_err(), ProtocolViolation::BadPayload);
    }

    #[tokio::test]
    async fn stream_of_records() {
        let (mut tx, mut rx) = tokio::io::duplex(4 * RECORD_LEN);
        let first = sample();
        let mut second = sample();
        second.drain();
        second.turn = 0;

        write_record(&mut tx, &first).await.unwrap();
        write_record(&mut tx, &second).await.unwrap();
        drop(tx);

        assert_eq!(read_record(&mut rx).await.unwrap(), Some(first));
        assert_eq!(read_record(&mut rx).await.unwrap(), Some(second));
        assert_eq!(read_record(&mut rx).await.unwrap(), None);
    }

    #[tokio::test]
    async fn partial_record_is_violation() {
        let (mut tx, mut rx) = tokio::io::duplex(4 * RECORD_LEN);
        let record = encode(&sample()).unwrap();
        tx.write_all(&record[..RECORD_LEN / 2]).await.unwrap();
        drop(tx);

        match read_record(&mut rx).await {
            Err(Error::Protocol(ProtocolViolation::TruncatedRecord { got, expected })) => {
                assert_eq!(got, RECORD_LEN / 2);
                assert_eq!(expected, RECORD_LEN);
            }
            other => panic!("expected truncated record, got {:?}", other),
        }
    }
}
