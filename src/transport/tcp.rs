//! S7 session over ISO-on-TCP.
//!
//! Opens a TCP stream, performs the COTP connection request and the S7
//! setup communication, then serves byte-wise read/write var jobs. Ranges
//! larger than the negotiated PDU are split into consecutive chunks.

use crate::error::{TransportError, TransportResult};
use crate::transport::iso;
use crate::transport::traits::{
    BoxedSession, ConnectMethod, ConnectionOptions, Connector, Session, Timeouts,
};
use crate::types::AreaKind;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Opens [`IsoTcpSession`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct S7Connector;

#[async_trait]
impl Connector for S7Connector {
    async fn connect(&self, options: &ConnectionOptions) -> TransportResult<BoxedSession> {
        let session = IsoTcpSession::connect(options).await?;
        Ok(Box::new(session))
    }
}

/// A live S7 session.
///
/// The socket is shut down by [`Session::close`]; dropping the session
/// closes it as well.
pub struct IsoTcpSession {
    stream: Option<TcpStream>,
    target: String,
    timeouts: Timeouts,
    pdu_length: u16,
    pdu_ref: u16,
}

impl IsoTcpSession {
    /// Connect and run both handshake phases.
    ///
    /// Every failure up to a negotiated PDU is reported as
    /// [`TransportError::Connect`] or [`TransportError::Negotiation`].
    pub async fn connect(options: &ConnectionOptions) -> TransportResult<Self> {
        let target = options.socket_target();
        let connect_failed = |reason: String| TransportError::Connect {
            target: target.clone(),
            reason,
        };

        if matches!(options.method, ConnectMethod::RackSlot)
            && (options.rack > 7 || options.slot > 31)
        {
            return Err(connect_failed(format!(
                "rack must be 0-7 and slot 0-31, got rack={} slot={}",
                options.rack, options.slot
            )));
        }

        let (local_tsap, remote_tsap) = options.tsap_pair();
        debug!(
            peer = %target,
            local_tsap = format_args!("0x{:04X}", local_tsap),
            remote_tsap = format_args!("0x{:04X}", remote_tsap),
            "opening ISO-on-TCP connection"
        );

        let stream = match timeout(options.timeouts.connect, TcpStream::connect(&target)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(connect_failed(e.to_string())),
            Err(_) => return Err(connect_failed("timed out".to_string())),
        };
        stream
            .set_nodelay(true)
            .map_err(|e| connect_failed(e.to_string()))?;

        let mut session = Self {
            stream: Some(stream),
            target: target.clone(),
            timeouts: options.timeouts,
            pdu_length: 0,
            pdu_ref: 0,
        };

        let handshake = timeout(
            options.timeouts.connect,
            session.handshake(local_tsap, remote_tsap),
        )
        .await;

        match handshake {
            Ok(Ok(pdu)) => {
                session.pdu_length = pdu;
                debug!(peer = %target, pdu_length = pdu, "S7 session established");
                Ok(session)
            }
            Ok(Err(e)) => {
                session.close().await;
                if e.is_connect() {
                    Err(e)
                } else {
                    Err(connect_failed(e.to_string()))
                }
            }
            Err(_) => {
                session.close().await;
                Err(connect_failed("handshake timed out".to_string()))
            }
        }
    }

    async fn handshake(&mut self, local_tsap: u16, remote_tsap: u16) -> TransportResult<u16> {
        let confirm = self
            .exchange(&iso::connection_request(local_tsap, remote_tsap))
            .await?;
        iso::check_connection_confirm(&confirm).map_err(|e| TransportError::Connect {
            target: self.target.clone(),
            reason: format!("{} (remote TSAP 0x{:04X})", e, remote_tsap),
        })?;

        let ack = self
            .exchange(&iso::setup_communication(iso::PDU_LEN_REQUEST))
            .await?;
        iso::parse_setup_response(&ack)
    }

    fn next_ref(&mut self) -> u16 {
        self.pdu_ref = self.pdu_ref.wrapping_add(1);
        self.pdu_ref
    }

    /// Send one telegram and receive one complete telegram back.
    async fn exchange(&mut self, request: &[u8]) -> TransportResult<Vec<u8>> {
        let Timeouts { read, write, .. } = self.timeouts;
        let stream = self.stream.as_mut().ok_or(TransportError::NotConnected)?;

        with_timeout(write, "send", stream.write_all(request)).await?;

        let mut header = [0u8; iso::TPKT_LEN];
        with_timeout(read, "receive", stream.read_exact(&mut header)).await?;
        let len = iso::telegram_length(&header)?;

        let mut frame = vec![0u8; len];
        frame[..iso::TPKT_LEN].copy_from_slice(&header);
        with_timeout(read, "receive", stream.read_exact(&mut frame[iso::TPKT_LEN..])).await?;

        Ok(frame)
    }

    fn max_read_chunk(&self) -> usize {
        usize::from(self.pdu_length.saturating_sub(iso::READ_OVERHEAD)).max(1)
    }

    fn max_write_chunk(&self) -> usize {
        usize::from(self.pdu_length.saturating_sub(iso::WRITE_OVERHEAD)).max(1)
    }
}

async fn with_timeout<T>(
    limit: Duration,
    phase: &'static str,
    op: impl std::future::Future<Output = std::io::Result<T>>,
) -> TransportResult<T> {
    match timeout(limit, op).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            Err(TransportError::ConnectionClosed)
        }
        Ok(Err(e)) => Err(TransportError::Io(e)),
        Err(_) => Err(TransportError::Timeout(phase)),
    }
}

#[async_trait]
impl Session for IsoTcpSession {
    async fn read_block(
        &mut self,
        area: AreaKind,
        block: u16,
        offset: u32,
        buf: &mut [u8],
    ) -> TransportResult<()> {
        let chunk_size = self.max_read_chunk();
        let mut start = offset;
        let mut chunks = 0usize;

        for chunk in buf.chunks_mut(chunk_size) {
            let pdu_ref = self.next_ref();
            let request = iso::read_request(area.code(), block, start, chunk.len() as u16, pdu_ref);
            let response = self.exchange(&request).await?;
            iso::check_pdu_ref(&response, pdu_ref)?;
            chunk.copy_from_slice(iso::parse_read_response(&response, chunk.len())?);

            start += chunk.len() as u32;
            chunks += 1;
        }

        debug!(%area, block, offset, len = buf.len(), chunks, "read complete");
        Ok(())
    }

    async fn write_block(
        &mut self,
        area: AreaKind,
        block: u16,
        offset: u32,
        data: &[u8],
    ) -> TransportResult<()> {
        let chunk_size = self.max_write_chunk();
        let mut start = offset;
        let mut chunks = 0usize;

        for chunk in data.chunks(chunk_size) {
            let pdu_ref = self.next_ref();
            let request = iso::write_request(area.code(), block, start, chunk, pdu_ref);
            let response = self.exchange(&request).await?;
            iso::check_pdu_ref(&response, pdu_ref)?;
            iso::parse_write_response(&response)?;

            start += chunk.len() as u32;
            chunks += 1;
        }

        debug!(%area, block, offset, len = data.len(), chunks, "write complete");
        Ok(())
    }

    async fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                warn!(peer = %self.target, error = %e, "socket shutdown failed");
            }
            debug!(peer = %self.target, "session closed");
        }
    }

    fn pdu_length(&self) -> u16 {
        self.pdu_length
    }
}
