//! Channel fabric: one unidirectional byte channel per ring position.
//!
//! Each slot is an in-memory pipe with a bounded buffer. The write end and
//! the read end are distinct types, so a participant holding a
//! [`ChannelWriter`] cannot read its own outbound data and a holder of a
//! [`ChannelReader`] cannot inject into its inbound channel.
//!
//! Dropping a writer is the close operation: once the buffer drains, the
//! reader sees end-of-stream. Dropping a reader makes further writes fail
//! with `BrokenPipe`.

use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};
use tracing::debug;

use crate::error::{Error, Result};
use crate::RingSize;

/// Which end of a channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Read,
    Write,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// Write end of a fabric channel.
#[derive(Debug)]
pub struct ChannelWriter {
    slot: usize,
    stream: DuplexStream,
}

impl ChannelWriter {
    /// Fabric slot this writer feeds.
    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl AsyncWrite for ChannelWriter {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.stream).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_flush(cx)
    }

    fn poll_shutdown(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_shutdown(cx)
    }
}

/// Read end of a fabric channel.
#[derive(Debug)]
pub struct ChannelReader {
    slot: usize,
    stream: DuplexStream,
}

impl ChannelReader {
    /// Fabric slot this reader drains.
    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl AsyncRead for ChannelReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.stream).poll_read(cx, buf)
    }
}

#[derive(Debug)]
struct FabricEntry {
    reader: Option<ChannelReader>,
    writer: Option<ChannelWriter>,
}

/// Fixed-size collection of channels, one per ring position.
///
/// The fabric holds every endpoint until it is taken. Each endpoint can be
/// taken once; whatever is still held when the fabric is closed or dropped
/// gets closed with it.
#[derive(Debug)]
pub struct ChannelFabric {
    entries: Vec<FabricEntry>,
    capacity: usize,
}

impl ChannelFabric {
    /// Allocate one channel per position of a ring of `size`.
    ///
    /// `capacity` is the number of bytes a channel buffers before writes
    /// wait for the reader.
    pub fn allocate(size: RingSize, capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::InsufficientCapacity {
                capacity,
                required: 1,
            });
        }

        let entries = (0..size.len())
            .map(|slot| {
                // Each duplex half is used in one direction only.
                let (write_half, read_half) = tokio::io::duplex(capacity);
                debug!(slot, capacity, "allocated channel");
                FabricEntry {
                    reader: Some(ChannelReader {
                        slot,
                        stream: read_half,
                    }),
                    writer: Some(ChannelWriter {
                        slot,
                        stream: write_half,
                    }),
                }
            })
            .collect();

        Ok(Self { entries, capacity })
    }

    /// Number of channel slots.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Per-channel buffer size in bytes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Take the write end of `slot`. Fails if it was already handed out.
    pub fn take_writer(&mut self, slot: usize) -> Result<ChannelWriter> {
        self.entry(slot)?
            .writer
            .take()
            .ok_or(Error::EndpointTaken {
                slot,
                end: Endpoint::Write,
            })
    }

    /// Take the read end of `slot`. Fails if it was already handed out.
    pub fn take_reader(&mut self, slot: usize) -> Result<ChannelReader> {
        self.entry(slot)?
            .reader
            .take()
            .ok_or(Error::EndpointTaken {
                slot,
                end: Endpoint::Read,
            })
    }

    /// Endpoints still held by the fabric.
    pub fn open_endpoints(&self) -> usize {
        self.entries
            .iter()
            .map(|e| usize::from(e.reader.is_some()) + usize::from(e.writer.is_some()))
            .sum()
    }

    /// Close every endpoint the fabric still holds. Returns how many were closed.
    pub fn close_remaining(&mut self) -> usize {
        let mut closed = 0;
        for (slot, entry) in self.entries.iter_mut().enumerate() {
            if entry.reader.take().is_some() {
                debug!(slot, "closed unused read end");
                closed += 1;
            }
            if entry.writer.take().is_some() {
                debug!(slot, "closed unused write end");
                closed += 1;
            }
        }
        closed
    }

    fn entry(&mut self, slot: usize) -> Result<&mut FabricEntry> {
        let len = self.entries.len();
        self.entries
            .get_mut(slot)
            .ok_or(Error::NoSuchSlot { slot, len })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    fn fabric(n: u32) -> ChannelFabric {
        ChannelFabric::allocate(RingSize::new(n).unwrap(), 64).unwrap()
    }

    #[test]
    fn zero_capacity_rejected() {
        let err = ChannelFabric::allocate(RingSize::DEFAULT, 0).unwrap_err();
        assert_eq!(
            err,
            Error::InsufficientCapacity {
                capacity: 0,
                required: 1
            }
        );
    }

    #[test]
    fn endpoint_taken_once() {
        let mut fabric = fabric(3);
        let writer = fabric.take_writer(1).unwrap();
        assert_eq!(writer.slot(), 1);
        assert_eq!(
            fabric.take_writer(1).unwrap_err(),
            Error::EndpointTaken {
                slot: 1,
                end: Endpoint::Write
            }
        );
        assert!(fabric.take_reader(1).is_ok());
        assert_eq!(fabric.open_endpoints(), 4);
    }

    #[test]
    fn out_of_range_slot() {
        let mut fabric = fabric(2);
        assert_eq!(
            fabric.take_reader(5).unwrap_err(),
            Error::NoSuchSlot { slot: 5, len: 2 }
        );
    }

    #[test]
    fn close_remaining_counts_leftovers() {
        let mut fabric = fabric(3);
        let _w = fabric.take_writer(0).unwrap();
        let _r = fabric.take_reader(2).unwrap();
        assert_eq!(fabric.close_remaining(), 4);
        assert_eq!(fabric.open_endpoints(), 0);
    }

    #[tokio::test]
    async fn data_flows_from_writer_to_reader() {
        let mut fabric = fabric(2);
        let mut writer = fabric.take_writer(0).unwrap();
        let mut reader = fabric.take_reader(0).unwrap();

        writer.write_all(b"token").await.unwrap();
        let mut buf = [0u8; 5];
        reader.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"token");
    }

    #[tokio::test]
    async fn dropping_writer_ends_stream() {
        let mut fabric = fabric(2);
        let mut writer = fabric.take_writer(1).unwrap();
        let mut reader = fabric.take_reader(1).unwrap();

        writer.write_all(b"ab").await.unwrap();
        drop(writer);

        let mut buf = Vec::new();
        reader.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"ab");
    }

    #[tokio::test]
    async fn dropping_reader_breaks_writes() {
        let mut fabric = fabric(2);
        let mut writer = fabric.take_writer(0).unwrap();
        drop(fabric.take_reader(0).unwrap());

        let err = writer.write_all(b"lost").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
