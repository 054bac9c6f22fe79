/// Stream multiplexing: read the child's stdout/stderr in bounded chunks,
/// mirror every chunk to the matching terminal stream, and append a
/// quota-gated copy to the log file.
///
/// One reader task per child stream feeds a bounded mpsc channel; a single
/// writer task drains it. FIFO order within a stream is preserved by the
/// channel, interleaving across streams follows read arrival, and the
/// quota counter plus log handle are owned by the writer alone.
use crate::quota::{QuotaDecision, QuotaGate};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

/// Which of the child's output streams a chunk came from. Stdout chunks
/// mirror to the terminal's stdout, stderr chunks to its stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Stdout,
    Stderr,
}

/// One bounded read from a single child stream.
#[derive(Debug)]
pub struct Chunk {
    pub channel: Channel,
    pub data: Vec<u8>,
}

/// Byte totals observed by the writer loop.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MuxStats {
    /// Bytes read from the child (both streams, pre-quota).
    pub bytes_seen: u64,
    /// Bytes actually written to the log file.
    pub bytes_logged: u64,
}

/// Read `source` until end-of-stream, forwarding each chunk tagged with
/// `channel`.
///
/// A zero-length read is the stream's EOF. Any read error is a soft
/// channel failure: it is logged and the channel is dropped, not retried.
/// Dropping the sender is how the writer learns the channel closed.
pub async fn pump_channel<R>(
    mut source: R,
    channel: Channel,
    tx: mpsc::Sender<Chunk>,
    chunk_size: usize,
) where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; chunk_size];
    loop {
        match source.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let chunk = Chunk {
                    channel,
                    data: buf[..n].to_vec(),
                };
                // The writer hanging up means teardown is underway.
                if tx.send(chunk).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, channel = ?channel, "read error on child stream, dropping channel");
                break;
            }
        }
    }
    tracing::debug!(channel = ?channel, "child stream closed");
}

/// Drain `rx`, mirroring chunks to the terminal and appending admitted
/// chunks to the log. Returns once every sender has been dropped, i.e.
/// once both child streams have closed.
///
/// Terminal and log write failures are soft: the chunk is dropped from
/// that sink and the loop continues. Only a failure to flush the log at
/// the end is surfaced, since it can silently lose admitted bytes.
pub async fn run_multiplexer<WO, WE, L>(
    mut rx: mpsc::Receiver<Chunk>,
    term_stdout: &mut WO,
    term_stderr: &mut WE,
    log: &mut L,
    quota: &mut QuotaGate,
) -> std::io::Result<MuxStats>
where
    WO: AsyncWrite + Unpin,
    WE: AsyncWrite + Unpin,
    L: AsyncWrite + Unpin,
{
    let mut stats = MuxStats::default();

    while let Some(chunk) = rx.recv().await {
        let len = chunk.data.len() as u64;
        stats.bytes_seen += len;

        match chunk.channel {
            Channel::Stdout => mirror(term_stdout, &chunk.data).await,
            Channel::Stderr => mirror(term_stderr, &chunk.data).await,
        }

        // Quota is charged per chunk, before the log write; a chunk that
        // would cross the limit is rejected whole.
        match quota.admit(len) {
            QuotaDecision::Admit => {
                if let Err(e) = log.write_all(&chunk.data).await {
                    tracing::warn!(error = %e, "log write failed, chunk dropped from log");
                } else {
                    stats.bytes_logged += len;
                }
            }
            QuotaDecision::RejectFirst => eprintln!("Stopping log"),
            QuotaDecision::Reject => {}
        }
    }

    log.flush().await?;
    Ok(stats)
}

/// Mirror one chunk to a terminal stream. `write_all` retries partial
/// writes; an error drops mirroring of this chunk only.
async fn mirror<W: AsyncWrite + Unpin>(sink: &mut W, data: &[u8]) {
    if let Err(e) = sink.write_all(data).await {
        tracing::debug!(error = %e, "terminal write failed, chunk dropped");
        return;
    }
    if let Err(e) = sink.flush().await {
        tracing::debug!(error = %e, "terminal flush failed");
    }
}
