//! Bidirectional pump between the accepted and the dialed connection
//!
//! Two halves run concurrently inside the forwarding call:
//!
//! - accepted -> dialed, which closes the dialed connection when it ends
//! - dialed -> accepted, which closes the accepted connection when it ends
//!
//! Closing a connection wakes the other half's pending read, so whichever
//! half finishes first brings the other one down with it. Each half drops
//! its guard on the per-connection token when it returns.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::conn::{Closer, TunnelConn};
use super::direction::Direction;
use super::error::{CopyDirection, ForwardError};
use super::stats::ForwardStatsAtomic;

const COPY_BUFFER_SIZE: usize = 32 * 1024;

/// Pump bytes until both halves are done and return the first copy error.
///
/// Both connections are closed and dropped before this returns.
pub(crate) async fn pump(
    accepted: TunnelConn,
    dialed: TunnelConn,
    direction: &Direction,
    conn_done: &CancellationToken,
    stats: &ForwardStatsAtomic,
) -> Option<ForwardError> {
    let (mut accepted_read, mut accepted_write) = tokio::io::split(accepted.stream);
    let (mut dialed_read, mut dialed_write) = tokio::io::split(dialed.stream);

    let accepted_closer = Closer::new();
    let dialed_closer = Closer::new();
    let first_error: Mutex<Option<ForwardError>> = Mutex::new(None);

    let retain = |direction: CopyDirection, source: std::io::Error| {
        let mut slot = first_error.lock();
        if slot.is_none() {
            *slot = Some(ForwardError::Copy { direction, source });
        } else {
            debug!("Dropping later copy error ({}): {}", direction, source);
        }
    };

    let accepted_to_dialed = async {
        let _done = conn_done.clone().drop_guard();
        if let Err(e) = copy_half(
            &mut accepted_read,
            &mut dialed_write,
            &accepted_closer,
            &stats.bytes_sent,
        )
        .await
        {
            retain(direction.accepted_to_dialed, e);
        }
        close_conn(&mut dialed_write, &dialed_closer, "dialed").await;
    };

    let dialed_to_accepted = async {
        let _done = conn_done.clone().drop_guard();
        if let Err(e) = copy_half(
            &mut dialed_read,
            &mut accepted_write,
            &dialed_closer,
            &stats.bytes_received,
        )
        .await
        {
            retain(direction.dialed_to_accepted, e);
        }
        close_conn(&mut accepted_write, &accepted_closer, "accepted").await;
    };

    tokio::join!(accepted_to_dialed, dialed_to_accepted);

    drop(accepted_read.unsplit(accepted_write));
    drop(dialed_read.unsplit(dialed_write));

    first_error.into_inner()
}

/// Copy until EOF, an I/O error, or `reader_closed` fires.
///
/// EOF and being closed from the other half both count as a clean end.
async fn copy_half<R, W>(
    reader: &mut R,
    writer: &mut W,
    reader_closed: &Closer,
    counter: &AtomicU64,
) -> std::io::Result<u64>
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut buf = vec![0u8; COPY_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let n = tokio::select! {
            // Pending data wins over a concurrent close.
            biased;
            read = reader.read(&mut buf) => read?,
            _ = reader_closed.closed() => {
                trace!("Read side closed by the other half after {} bytes", total);
                return Ok(total);
            }
        };
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n]).await?;
        counter.fetch_add(n as u64, Ordering::Relaxed);
        total += n as u64;
    }

    writer.flush().await?;
    Ok(total)
}

/// Close one connection: wake its reader, then shut its write side.
///
/// Safe to call on a connection the peer already closed.
async fn close_conn<W>(writer: &mut W, closer: &Closer, which: &str)
where
    W: AsyncWrite + Unpin + ?Sized,
{
    if !closer.close() {
        return;
    }
    if let Err(e) = writer.shutdown().await {
        trace!("Shutdown of {} connection after close: {}", which, e);
    }
}
