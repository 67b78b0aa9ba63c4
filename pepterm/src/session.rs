//! Terminal session state machine
//!
//! One session owns one UDP socket, at most one terminal binding, and at
//! most one transaction in flight. Public operations run against shared
//! state behind a `tokio` mutex; a spawned dispatch task applies inbound
//! frames to the same state and pushes [`TerminalEvent`]s to the channel
//! handed out at connect time.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use base64::{Engine as _, engine::general_purpose};
use bytes::{BufMut, Bytes, BytesMut};
use chrono::Utc;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use pepterm_core::constants::{self, headers, tags, transaction_types};
use pepterm_core::{Frame, FrameKind, ProgressStatus, RequestFlags, codes, tlv};
use pepterm_transport::{Datagram, Transport, UdpTransport, local_ipv4_hint};
use pepterm_types::{
    BindOutcome, CancelOutcome, PaymentRequest, PaymentStarted, ResultFields, StatusReport,
    TerminalBinding, Tid, Transaction, TransactionStatus,
};

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::event::{EventDetail, TerminalEvent};

/// Where the session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// No terminal bound yet
    Idle,
    /// Discovery broadcast sent, waiting for the acknowledgment
    Binding,
    /// Terminal bound, no transaction in flight
    Bound,
    /// Payment request sent, waiting for the result
    Transacting,
}

struct SessionState {
    phase: Phase,
    binding: Option<TerminalBinding>,
    transaction: Option<Transaction>,
    bind_ack: Option<oneshot::Sender<SocketAddr>>,
}

struct SessionCore {
    config: SessionConfig,
    transport: Arc<dyn Transport>,
    events: mpsc::Sender<TerminalEvent>,
    ready: AtomicBool,
    state: Mutex<SessionState>,
}

/// PeP terminal session
///
/// High-level interface for driving card payments on a PeP terminal from a
/// cash register.
///
/// # Examples
///
/// ```no_run
/// use pepterm::{EventDetail, PaymentRequest, SessionConfig, TerminalSession};
///
/// #[tokio::main]
/// async fn main() -> pepterm::Result<()> {
///     let (session, mut events) =
///         TerminalSession::connect(SessionConfig::from_env()).await?;
///
///     let binding = session.bind_terminal("12345678").await?;
///     println!("Terminal at {}", binding.ip);
///
///     session.send_payment(PaymentRequest::new(10.50, "ORDER-1")).await?;
///     while let Some(event) = events.recv().await {
///         println!("{:?}", event.detail);
///         if matches!(event.detail, EventDetail::Result { .. }) {
///             break;
///         }
///     }
///     Ok(())
/// }
/// ```
pub struct TerminalSession {
    core: Arc<SessionCore>,
    dispatch_task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl TerminalSession {
    /// Bind the UDP socket and start the session
    ///
    /// Returns the session and the receiver for transaction events. The
    /// receiver may be dropped if events are not needed; the session keeps
    /// working.
    ///
    /// # Errors
    ///
    /// Transport `SocketInit` if the local socket cannot be bound.
    pub async fn connect(
        config: SessionConfig,
    ) -> Result<(Self, mpsc::Receiver<TerminalEvent>)> {
        let (transport, datagrams) =
            UdpTransport::bind(config.local_port, config.broadcast_addr).await?;
        Ok(Self::with_transport(Arc::new(transport), datagrams, config))
    }

    /// Start a session over an existing transport
    ///
    /// Seam for tests and custom transports; `connect` is the normal entry
    /// point.
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        datagrams: mpsc::Receiver<Datagram>,
        config: SessionConfig,
    ) -> (Self, mpsc::Receiver<TerminalEvent>) {
        if config.test_mode {
            warn!("TEST_MODE is enabled; failed transactions will be reported as successful");
        }

        let (events, event_rx) = mpsc::channel(config.event_capacity);
        let core = Arc::new(SessionCore {
            config,
            transport,
            events,
            ready: AtomicBool::new(true),
            state: Mutex::new(SessionState {
                phase: Phase::Idle,
                binding: None,
                transaction: None,
                bind_ack: None,
            }),
        });

        let dispatch_task = tokio::spawn(dispatch_loop(Arc::clone(&core), datagrams));

        let session = Self {
            core,
            dispatch_task: parking_lot::Mutex::new(Some(dispatch_task)),
        };
        (session, event_rx)
    }

    /// Discover a terminal by identifier and bind to it
    ///
    /// Broadcasts a discovery packet advertising the local address, then
    /// waits for the terminal's acknowledgment. On timeout the configured
    /// fallback address is used when present, flagged in the outcome;
    /// without one the bind fails and prior state is kept.
    ///
    /// # Errors
    ///
    /// - `InvalidTid` if `tid` is not eight decimal digits
    /// - `BindInProgress` / `TransactionInProgress` while another operation
    ///   holds the session
    /// - `BindTimeout` when no acknowledgment arrives and no fallback is
    ///   configured
    pub async fn bind_terminal(&self, tid: &str) -> Result<BindOutcome> {
        self.ensure_ready()?;
        let tid = Tid::new(tid).map_err(|_| Error::InvalidTid(tid.to_string()))?;

        let packet = self.core.discovery_packet(&tid).await?;

        let ack_rx = {
            let mut state = self.core.state.lock().await;
            match state.phase {
                Phase::Binding => return Err(Error::BindInProgress),
                Phase::Transacting => {
                    let id = state
                        .transaction
                        .as_ref()
                        .map(|txn| txn.id.clone())
                        .unwrap_or_default();
                    return Err(Error::TransactionInProgress(id));
                }
                Phase::Idle | Phase::Bound => {}
            }

            let (ack_tx, ack_rx) = oneshot::channel();
            state.phase = Phase::Binding;
            state.bind_ack = Some(ack_tx);
            ack_rx
        };

        info!("Broadcasting binding request for terminal {}", tid);
        if let Err(e) = self
            .core
            .transport
            .broadcast(&packet, self.core.config.terminal_port)
            .await
        {
            self.core.abort_bind().await;
            return Err(e.into());
        }

        match timeout(self.core.config.bind_timeout, ack_rx).await {
            Ok(Ok(peer)) => {
                let mut state = self.core.state.lock().await;
                let binding = TerminalBinding {
                    tid,
                    ip: peer.ip(),
                    port: self.core.config.terminal_port,
                    bound_at: Utc::now(),
                    fallback: false,
                };
                info!("Terminal bound: {}", binding);

                let outcome = BindOutcome {
                    tid: binding.tid.clone(),
                    ip: binding.ip,
                    fallback: false,
                };
                state.binding = Some(binding);
                state.phase = Phase::Bound;
                Ok(outcome)
            }
            Ok(Err(_)) => {
                // Waiter dropped without an answer; only shutdown does that
                self.core.abort_bind().await;
                Err(Error::NotReady)
            }
            Err(_) => {
                let Some(fallback_ip) = self.core.config.fallback_terminal_ip else {
                    self.core.abort_bind().await;
                    return Err(Error::BindTimeout(self.core.config.bind_timeout));
                };

                let mut state = self.core.state.lock().await;
                state.bind_ack = None;
                warn!(
                    "No binding acknowledgment within {:?}, assuming terminal {} at configured {}",
                    self.core.config.bind_timeout, tid, fallback_ip
                );

                let binding = TerminalBinding {
                    tid,
                    ip: fallback_ip,
                    port: self.core.config.terminal_port,
                    bound_at: Utc::now(),
                    fallback: true,
                };
                let outcome = BindOutcome {
                    tid: binding.tid.clone(),
                    ip: binding.ip,
                    fallback: true,
                };
                state.binding = Some(binding);
                state.phase = Phase::Bound;
                Ok(outcome)
            }
        }
    }

    /// Send a payment request to the bound terminal
    ///
    /// The transaction becomes current only after the datagram is handed to
    /// the transport; a send failure leaves the previous state untouched.
    /// A still-active prior transaction is superseded with a warning.
    ///
    /// # Errors
    ///
    /// - `InvalidAmount` for non-positive or non-finite amounts
    /// - `NotBound` without a terminal binding
    /// - `BindInProgress` while a bind is waiting for its acknowledgment
    /// - `Protocol` if a field value does not fit its wire format
    pub async fn send_payment(&self, request: PaymentRequest) -> Result<PaymentStarted> {
        self.ensure_ready()?;
        if !request.amount.is_finite() || request.amount <= 0.0 {
            return Err(Error::InvalidAmount(request.amount));
        }

        let mut state = self.core.state.lock().await;
        if state.phase == Phase::Binding {
            return Err(Error::BindInProgress);
        }
        let Some(binding) = state.binding.as_ref() else {
            return Err(Error::NotBound);
        };
        let peer = SocketAddr::new(binding.ip, binding.port);

        let fields = compose_payment_fields(&request, &self.core.config)?;
        let frame = Frame::build(headers::PAYMENT_REQUEST, &fields);
        trace!("Payment frame: {}", hex::encode(&frame));

        if let Some(txn) = state.transaction.as_ref().filter(|txn| txn.is_active()) {
            warn!(
                "Transaction {} superseded before completion by {}",
                txn.id, request.transaction_id
            );
        }

        self.core.transport.send_to(&frame, peer).await?;
        info!(
            "Payment request sent to {}: amount={:.2} transaction={}",
            peer, request.amount, request.transaction_id
        );

        state.transaction = Some(Transaction::new(
            request.transaction_id.clone(),
            request.amount,
        ));
        state.phase = Phase::Transacting;

        Ok(PaymentStarted {
            accepted: true,
            transaction_id: request.transaction_id,
        })
    }

    /// Cancel the current transaction locally
    ///
    /// No cancel frame exists on the wire; the terminal keeps going on its
    /// own, and a result it delivers later still lands on this transaction.
    ///
    /// # Errors
    ///
    /// `NoActiveTransaction` if nothing is in flight.
    pub async fn cancel_transaction(&self) -> Result<CancelOutcome> {
        self.ensure_ready()?;

        let mut state = self.core.state.lock().await;
        let snapshot = {
            let Some(txn) = state
                .transaction
                .as_mut()
                .filter(|txn| txn.is_active())
            else {
                return Err(Error::NoActiveTransaction);
            };

            txn.status = TransactionStatus::Cancelled;
            txn.completed_at = Some(Utc::now());
            txn.clone()
        };
        state.phase = Phase::Bound;

        info!("Cancelled transaction {}", snapshot.id);
        self.core.emit(snapshot.clone(), EventDetail::Cancelled);

        Ok(CancelOutcome {
            transaction_id: snapshot.id,
        })
    }

    /// Snapshot of the session for control layers
    pub async fn status(&self) -> StatusReport {
        let state = self.core.state.lock().await;
        StatusReport {
            ready: self.core.ready.load(Ordering::SeqCst),
            bound: state.binding.is_some(),
            terminal_ip: state.binding.as_ref().map(|binding| binding.ip),
            terminal_tid: state.binding.as_ref().map(|binding| binding.tid.clone()),
            transaction: state.transaction.clone(),
        }
    }

    /// Stop the dispatch loop and refuse further operations
    ///
    /// Idempotent; also runs on drop. Dropping the dispatch task closes the
    /// inbound channel, which in turn stops the transport's receive loop.
    pub fn shutdown(&self) {
        if let Some(task) = self.dispatch_task.lock().take() {
            self.core.ready.store(false, Ordering::SeqCst);
            task.abort();
            if let Ok(mut state) = self.core.state.try_lock() {
                state.bind_ack = None;
            }
            debug!("Session dispatch loop stopped");
        }
    }

    fn ensure_ready(&self) -> Result<()> {
        if !self.core.ready.load(Ordering::SeqCst) {
            return Err(Error::NotReady);
        }
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl SessionCore {
    /// Build the 16-byte discovery packet: `? | ip | port | flags | tid`
    async fn discovery_packet(&self, tid: &Tid) -> Result<Bytes> {
        let local_ip = match self.config.local_ip {
            Some(ip) => ip,
            None => {
                let probe =
                    SocketAddr::new(self.config.broadcast_addr, self.config.terminal_port);
                local_ipv4_hint(probe).await
            }
        };
        let local_port = self.transport.local_addr()?.port();

        let mut packet = BytesMut::with_capacity(16);
        packet.put_u8(constants::DISCOVERY_MARKER);
        packet.put_slice(&local_ip.octets());
        packet.put_u16(local_port);
        packet.put_u8(0x00);
        packet.put_slice(tid.as_str().as_bytes());

        debug!(
            "Binding request advertises {}:{} for terminal {}",
            local_ip, local_port, tid
        );
        Ok(packet.freeze())
    }

    /// Roll back a failed bind attempt
    async fn abort_bind(&self) {
        let mut state = self.state.lock().await;
        state.bind_ack = None;
        state.phase = if state.binding.is_some() {
            Phase::Bound
        } else {
            Phase::Idle
        };
    }

    async fn resolve_bind(&self, peer: SocketAddr) {
        let mut state = self.state.lock().await;
        match state.bind_ack.take() {
            Some(ack) => {
                debug!("Binding acknowledged by {}", peer);
                if ack.send(peer).is_err() {
                    debug!("Binding caller gone before acknowledgment from {}", peer);
                }
            }
            None => debug!("Unsolicited binding acknowledgment from {}, ignoring", peer),
        }
    }

    async fn handle_datagram(&self, datagram: Datagram) {
        let Datagram { payload, peer } = datagram;
        trace!(
            "Inbound {} bytes from {}: {}",
            payload.len(),
            peer,
            hex::encode(&payload)
        );

        // Legacy terminals acknowledge binding with one bare marker byte
        if payload.len() == 1 {
            match payload[0] {
                constants::BIND_ACK_LEGACY | constants::DISCOVERY_MARKER => {
                    self.resolve_bind(peer).await;
                }
                constants::ACK => debug!("Terminal acknowledged our frame"),
                constants::NAK => warn!("Terminal rejected our frame (NAK)"),
                other => debug!("Ignoring single byte 0x{:02X} from {}", other, peer),
            }
            return;
        }

        let frame = match Frame::parse(&payload) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Dropping invalid frame from {}: {}", peer, e);
                self.reply(&[constants::NAK], peer).await;
                return;
            }
        };

        self.reply(&[constants::ACK], peer).await;
        debug!("Received {} from {}", frame, peer);

        if let Err(e) = self.handle_frame(frame, peer).await {
            warn!("Failed to handle frame from {}: {}", peer, e);
        }
    }

    async fn handle_frame(&self, frame: Frame, peer: SocketAddr) -> Result<()> {
        match frame.kind() {
            FrameKind::BindAck => {
                self.resolve_bind(peer).await;
                Ok(())
            }
            FrameKind::Progress => self.handle_progress(&frame).await,
            FrameKind::Result => self.handle_result(&frame).await,
            FrameKind::PaymentRequest | FrameKind::Unknown => {
                Err(Error::UnknownHeader(frame.header.clone()))
            }
        }
    }

    async fn handle_progress(&self, frame: &Frame) -> Result<()> {
        let (mut code, _) = split_status(&frame.payload);

        if self.config.test_mode && code == "DF" {
            warn!("TEST MODE: rewriting progress code DF to 03 (authorizing)");
            code = String::from("03");
        }

        let status = ProgressStatus::from_code(&code);

        let mut state = self.state.lock().await;
        let Some(txn) = state.transaction.as_mut() else {
            warn!("Progress report {} with no transaction in flight, dropping", code);
            return Ok(());
        };
        if txn.status.is_terminal() {
            debug!(
                "Progress report {} after completion of {}, ignoring",
                code, txn.id
            );
            return Ok(());
        }

        txn.status = TransactionStatus::InProgress;
        txn.progress_code = Some(code.clone());
        info!("Payment progress: {} (code {})", status, code);

        let snapshot = txn.clone();
        self.emit(snapshot, EventDetail::Progress { status, code });
        Ok(())
    }

    async fn handle_result(&self, frame: &Frame) -> Result<()> {
        let (mut code, tlv_data) = split_status(&frame.payload);
        let mut fields = tlv::parse_fields(&tlv_data);

        let mut success = code == codes::SUCCESS_CODE;
        if self.config.test_mode && !success {
            warn!("TEST MODE: forcing failed result {} to success", code);
            code = String::from(codes::SUCCESS_CODE);
            success = true;
            synthesize_test_fields(&mut fields);
        }

        let message = (!success).then(|| codes::result_message(&code));

        let mut state = self.state.lock().await;
        let Some(txn) = state.transaction.as_mut() else {
            warn!("Result {} with no transaction in flight, dropping", code);
            return Ok(());
        };

        txn.status = if success {
            TransactionStatus::Success
        } else {
            TransactionStatus::Failed
        };
        txn.result_code = Some(code.clone());
        txn.error_message = message.clone();
        txn.fields = extract_result_fields(fields);
        txn.completed_at = Some(Utc::now());

        if success {
            info!("Payment result: SUCCESS (transaction {})", txn.id);
        } else {
            warn!(
                "Payment result: FAILED ({}) {}",
                code,
                message.as_deref().unwrap_or("")
            );
        }

        let snapshot = txn.clone();
        state.phase = Phase::Bound;
        self.emit(
            snapshot,
            EventDetail::Result {
                success,
                code,
                message,
            },
        );
        Ok(())
    }

    async fn reply(&self, data: &[u8], peer: SocketAddr) {
        if let Err(e) = self.transport.send_to(data, peer).await {
            warn!("Failed to reply to {}: {}", peer, e);
        }
    }

    /// Push an event without ever blocking the dispatch loop
    fn emit(&self, transaction: Transaction, detail: EventDetail) {
        let event = TerminalEvent {
            at: Utc::now(),
            transaction,
            detail,
        };
        match self.events.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!("Event channel full, dropping {:?} event", event.kind());
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                warn!("Event channel closed, dropping {:?} event", event.kind());
            }
        }
    }
}

async fn dispatch_loop(core: Arc<SessionCore>, mut datagrams: mpsc::Receiver<Datagram>) {
    while let Some(datagram) = datagrams.recv().await {
        core.handle_datagram(datagram).await;
    }
    debug!("Datagram channel closed, dispatch loop ending");
}

/// Compose the payment TLV run in protocol field order
fn compose_payment_fields(request: &PaymentRequest, config: &SessionConfig) -> Result<String> {
    let mut data = String::new();

    data.push_str(&tlv::build_field(
        tags::TRANSACTION_TYPE,
        transaction_types::SALE,
        tlv::FieldFormat::Numeric(4),
    )?);

    let amount = tlv::encode_amount(request.amount)?;
    data.push_str(&tlv::build_field(
        tags::AMOUNT,
        &amount,
        tlv::FieldFormat::VarNumeric(amount.len() as u8),
    )?);

    data.push_str(&tlv::build_field(
        tags::REQUEST_FLAGS,
        &RequestFlags::EXTENDED_RESPONSE.encode(),
        tlv::FieldFormat::Binary,
    )?);

    if let Some(operator) = &request.operator_code {
        let padded = format!("{:0>4}", operator);
        data.push_str(&tlv::build_field(
            tags::OPERATOR_CODE,
            &padded,
            tlv::FieldFormat::Numeric(4),
        )?);
    }

    if let Some(description) = &request.description {
        let truncated: String = description.chars().take(42).collect();
        data.push_str(&tlv::build_field(
            tags::DESCRIPTION,
            &truncated,
            tlv::FieldFormat::Text,
        )?);
    }

    data.push_str(&tlv::build_field(
        tags::SYSTEM_INFO,
        &config.system_info,
        tlv::FieldFormat::Text,
    )?);

    if !request.transaction_id.is_empty() {
        let encoded = general_purpose::STANDARD.encode(request.transaction_id.as_bytes());
        let capped = &encoded[..encoded.len().min(50)];
        data.push_str(&tlv::build_field(
            tags::TRACKING_ID,
            &format!("0;{}", capped),
            tlv::FieldFormat::Text,
        )?);
    }

    Ok(data)
}

/// Split a terminal status payload into the two-char code and trailing TLV
///
/// A first segment shorter than two chars marks the whole payload garbled:
/// the code becomes `UNKNOWN` and the TLV part is dropped.
fn split_status(payload: &str) -> (String, String) {
    let mut parts = payload.split(constants::FS_CHAR);
    let first = parts.next().unwrap_or("");
    if first.chars().count() < 2 {
        return (String::from("UNKNOWN"), String::new());
    }

    let code = first.chars().take(2).collect();
    let rest: Vec<&str> = parts.collect();
    (code, rest.join(constants::FS_STR))
}

fn extract_result_fields(mut fields: BTreeMap<String, String>) -> ResultFields {
    let transaction_number = fields.remove(tags::TRANSACTION_NUMBER);
    let auth_code = fields.remove(tags::AUTH_CODE);
    let masked_pan = fields.remove(tags::MASKED_PAN);
    let amount_confirmed = match fields.remove(tags::AMOUNT) {
        Some(raw) => match tlv::decode_amount(&raw) {
            Ok(amount) => Some(amount),
            Err(e) => {
                warn!("Unreadable confirmed amount {:?}: {}", raw, e);
                fields.insert(tags::AMOUNT.to_string(), raw);
                None
            }
        },
        None => None,
    };

    ResultFields {
        transaction_number,
        auth_code,
        masked_pan,
        amount_confirmed,
        other: fields,
    }
}

/// Fill in the result fields a forced test-mode success would miss
fn synthesize_test_fields(fields: &mut BTreeMap<String, String>) {
    fields
        .entry(tags::TRANSACTION_NUMBER.to_string())
        .or_insert_with(|| format!("TEST-{:06}", Utc::now().timestamp_millis() % 1_000_000));
    fields
        .entry(tags::AUTH_CODE.to_string())
        .or_insert_with(|| String::from("TESTOK"));
    fields
        .entry(tags::MASKED_PAN.to_string())
        .or_insert_with(|| String::from("400000******0000"));
}
