//! Client-side resolver engine (spec.md §4.E): send a single-question
//! [`Message`] to a configured server, negotiating EDNS, attaching TSIG, and
//! falling back from UDP to TCP on truncation.
//!
//! Grounded on the teacher's async/tokio transport style
//! (`transport/manager.rs`'s trait-dispatched send, `protocol/udp.rs`'s
//! socket handling) and on `dandyvica-dnsquery`'s `query.rs` for the
//! client-side "build request, assign a random ID, send" shape. The socket
//! boundary is pulled out into a [`Transport`] trait — spec.md §9's
//! "overridable network seam" redesign flag — so the whole send/retry/TSIG
//! pipeline is testable without a real network.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;
use tracing::{debug, trace, warn};

use crate::config::{ResolverConfig, CLASSIC_UDP_PAYLOAD_SIZE};
use crate::dns::{Message, Question};
use crate::error::{DnsError, Result};

/// The resolver's entire network boundary: serialize a query, hand the
/// bytes to a transport, get reply bytes back. Production code uses
/// [`UdpTcpTransport`]; tests can substitute anything that implements this
/// (an in-memory echo, a scripted failure sequence, ...).
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `bytes` to `server` over UDP and wait for a reply datagram whose
    /// leading two bytes match `expected_id`, discarding anything else that
    /// arrives first (a stray reply to an earlier, already-timed-out query).
    /// Fails with [`DnsError::Timeout`] once `deadline` elapses either way.
    async fn send_udp(
        &self,
        bytes: &[u8],
        server: SocketAddr,
        expected_id: u16,
        deadline: Duration,
    ) -> Result<Vec<u8>>;

    /// Send `bytes` to `server` over a fresh TCP connection, framed with the
    /// standard two-byte big-endian length prefix (RFC 1035 §4.2.2), and
    /// return the reply's payload (prefix stripped).
    async fn send_tcp(&self, bytes: &[u8], server: SocketAddr, deadline: Duration) -> Result<Vec<u8>>;
}

/// The real network transport: plain UDP and TCP sockets via tokio.
#[derive(Debug, Default)]
pub struct UdpTcpTransport;

#[async_trait]
impl Transport for UdpTcpTransport {
    async fn send_udp(
        &self,
        bytes: &[u8],
        server: SocketAddr,
        expected_id: u16,
        deadline: Duration,
    ) -> Result<Vec<u8>> {
        let op = async {
            let socket = UdpSocket::bind(local_bind_addr(server)).await?;
            socket.connect(server).await?;
            socket.send(bytes).await?;
            loop {
                let mut buf = vec![0u8; 65535];
                let n = socket.recv(&mut buf).await?;
                buf.truncate(n);
                if buf.len() >= 2 && u16::from_be_bytes([buf[0], buf[1]]) == expected_id {
                    return Ok::<Vec<u8>, std::io::Error>(buf);
                }
                trace!(server = %server, "dropping reply with mismatched id, still listening");
            }
        };
        match timeout(deadline, op).await {
            Err(_) => Err(DnsError::Timeout),
            Ok(Err(e)) => Err(DnsError::NetworkError(e.to_string())),
            Ok(Ok(buf)) => Ok(buf),
        }
    }

    async fn send_tcp(&self, bytes: &[u8], server: SocketAddr, deadline: Duration) -> Result<Vec<u8>> {
        let op = async {
            let mut stream = TcpStream::connect(server).await?;
            let len = u16::try_from(bytes.len())
                .map_err(|_| std::io::Error::other("message too large for a TCP length prefix"))?;
            stream.write_all(&len.to_be_bytes()).await?;
            stream.write_all(bytes).await?;
            stream.flush().await?;

            let mut len_buf = [0u8; 2];
            stream.read_exact(&mut len_buf).await?;
            let reply_len = u16::from_be_bytes(len_buf) as usize;
            let mut reply = vec![0u8; reply_len];
            stream.read_exact(&mut reply).await?;
            Ok::<Vec<u8>, std::io::Error>(reply)
        };
        match timeout(deadline, op).await {
            Err(_) => Err(DnsError::Timeout),
            Ok(Err(e)) => Err(DnsError::NetworkError(e.to_string())),
            Ok(Ok(buf)) => Ok(buf),
        }
    }
}

fn local_bind_addr(server: SocketAddr) -> &'static str {
    if server.is_ipv4() {
        "0.0.0.0:0"
    } else {
        "[::]:0"
    }
}

/// Sends a single-question [`Message`] to a configured server and returns
/// its reply, handling ID assignment, EDNS negotiation, TSIG signing and
/// verification, UDP/TCP dispatch, truncation retry, and timeout/retry
/// (spec.md §4.E).
///
/// `send_async`'s only suspension points are the socket read/write and the
/// timeout timer inside [`Transport`], so cancelling it (dropping the
/// future, or `.abort()`ing the task it runs in) drops the in-flight socket
/// and produces no reply — the ordinary meaning of cancellation for an
/// async Rust future. [`DnsError::Cancelled`] is there for callers who want
/// to represent that outcome explicitly, e.g. mapping a `JoinError` from an
/// aborted task back into the crate's own error type.
pub struct SimpleResolver {
    config: ResolverConfig,
    transport: Arc<dyn Transport>,
    next_id: AtomicU16,
}

impl SimpleResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self::with_transport(config, Arc::new(UdpTcpTransport))
    }

    pub fn with_transport(config: ResolverConfig, transport: Arc<dyn Transport>) -> Self {
        let seed: u16 = rand::rng().random();
        SimpleResolver {
            config,
            transport,
            next_id: AtomicU16::new(seed),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    fn fresh_id(&self) -> u16 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Blocking entry point for callers outside an async context. Bridges
    /// onto a tokio runtime, reusing the current one if the caller is
    /// already inside one.
    pub fn send(&self, message: Message) -> Result<Message> {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => tokio::task::block_in_place(|| handle.block_on(self.send_async(message))),
            Err(_) => {
                let rt = tokio::runtime::Runtime::new().map_err(|e| DnsError::NetworkError(e.to_string()))?;
                rt.block_on(self.send_async(message))
            }
        }
    }

    /// Async entry point: prepares `message` (ID, EDNS, TSIG), then sends it
    /// to the configured server(s), retrying on timeout up to
    /// [`ResolverConfig::retries`] and falling back to TCP on truncation.
    pub async fn send_async(&self, mut message: Message) -> Result<Message> {
        if message.question.len() != 1 {
            return Err(DnsError::illegal_argument(
                "a resolver query must have exactly one question",
            ));
        }
        if message.header.id == 0 {
            message.header.id = self.fresh_id();
        }
        if self.config.use_edns && message.edns_opt().is_none() {
            message.add_opt(self.config.edns_payload_size, false);
        }
        if let Some(key) = &self.config.tsig_key {
            message.set_tsig(key.clone());
        }

        let request_id = message.header.id;
        let request_question = message.question[0].clone();
        let full_bytes = message.to_wire(None)?;

        let request_mac = if self.config.tsig_key.is_some() {
            Message::decode(&full_bytes).ok().and_then(|m| m.tsig_mac().map(<[u8]>::to_vec))
        } else {
            None
        };

        let udp_cap = if self.config.use_edns {
            self.config.edns_payload_size as usize
        } else {
            CLASSIC_UDP_PAYLOAD_SIZE as usize
        };
        let initial_tcp = self.config.force_tcp || full_bytes.len() > udp_cap;

        let mut last_err = DnsError::Timeout;
        for server in &self.config.servers {
            for attempt in 0..=self.config.retries {
                debug!(%server, attempt, tcp = initial_tcp, "sending query");
                match self
                    .try_once(&full_bytes, *server, request_id, initial_tcp)
                    .await
                {
                    Ok(reply) => {
                        return self.finish(reply, &request_question, request_id, request_mac.as_deref())
                    }
                    Err(DnsError::Timeout) => {
                        last_err = DnsError::Timeout;
                        continue;
                    }
                    Err(e) => return Err(e),
                }
            }
            warn!(%server, "exhausted retries, trying next server");
        }
        Err(last_err)
    }

    /// One UDP-or-TCP round trip, including a same-attempt TCP retry when a
    /// UDP reply comes back truncated (spec.md §4.E steps 6-8).
    async fn try_once(
        &self,
        request_bytes: &[u8],
        server: SocketAddr,
        request_id: u16,
        force_tcp: bool,
    ) -> Result<Message> {
        if force_tcp {
            let bytes = self.transport.send_tcp(request_bytes, server, self.config.timeout).await?;
            return Message::decode(&bytes);
        }

        let bytes = self
            .transport
            .send_udp(request_bytes, server, request_id, self.config.timeout)
            .await?;
        let reply = Message::decode(&bytes)?;
        if !reply.header.tc {
            return Ok(reply);
        }
        if !self.config.tcp_on_truncation {
            return Err(DnsError::Truncated);
        }
        debug!(%server, "udp reply truncated, retrying over tcp");
        let tcp_bytes = self.transport.send_tcp(request_bytes, server, self.config.timeout).await?;
        Message::decode(&tcp_bytes)
    }

    /// Validates the transport-independent invariants spec.md §4.E requires
    /// of any reply before handing it back: matching ID, matching question,
    /// and (if configured) a valid TSIG. The rcode itself is never treated
    /// as an error here — NXDOMAIN and friends are data, not failure.
    fn finish(
        &self,
        reply: Message,
        request_question: &Question,
        request_id: u16,
        request_mac: Option<&[u8]>,
    ) -> Result<Message> {
        if reply.header.id != request_id {
            return Err(DnsError::malformed("reply id did not match request id"));
        }
        if let Some(q) = reply.question.first() {
            let matches = q.qname.eq_ignore_case(&request_question.qname)
                && q.qtype == request_question.qtype
                && q.qclass == request_question.qclass;
            if !matches {
                return Err(DnsError::malformed("reply question section did not match request"));
            }
        }
        if let Some(key) = &self.config.tsig_key {
            reply.verify_tsig(key, request_mac)?;
        }
        Ok(reply)
    }
}

/// Test-only transport that hands the serialized request straight back as
/// the reply (spec.md §8 scenario 8): exercises ID assignment, EDNS/TSIG
/// attachment, and reply validation end to end without a socket.
#[derive(Debug, Default)]
pub struct EchoTransport;

#[async_trait]
impl Transport for EchoTransport {
    async fn send_udp(
        &self,
        bytes: &[u8],
        _server: SocketAddr,
        _expected_id: u16,
        _deadline: Duration,
    ) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }

    async fn send_tcp(&self, bytes: &[u8], _server: SocketAddr, _deadline: Duration) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}
