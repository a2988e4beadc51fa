//! A connection to a single display.

use std::time::Duration;

use log::{debug, trace, warn};
use pid_protocol::{
    Decode, DisplayMessage, ETX, DLE, Message, Packet, PingMessage, START_MARKER, STX, frame,
    is_framed,
};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    select,
    time::sleep,
};

use crate::{SessionConfig, SessionError};

/// An open connection to a display over any byte stream.
///
/// Operations must not be run concurrently on the same session. Every write
/// is a complete packet: messages are fully encoded before anything is sent.
#[derive(Debug)]
pub struct Session<S> {
    stream: Option<S>,
    config: SessionConfig,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Session<S> {
    /// Wraps an already open stream.
    pub fn from_stream(stream: S, config: SessionConfig) -> Self {
        Self {
            stream: Some(stream),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn stream(&mut self) -> Result<&mut S, SessionError> {
        self.stream.as_mut().ok_or(SessionError::Closed)
    }

    /// Parses `text` as a [`DisplayMessage`] and sends it.
    ///
    /// Pages are separated by `|`. The first page scrolls in vertically and
    /// stays for ten seconds unless its header says otherwise.
    pub async fn send(&mut self, text: &str) -> Result<(), SessionError> {
        let message: DisplayMessage = text.parse()?;
        self.send_message(&message.into()).await
    }

    pub async fn send_message(&mut self, message: &Message) -> Result<(), SessionError> {
        debug!("Sending {message}");
        self.write_packet(&message.to_packet()).await
    }

    /// Sends bytes that are either a complete framed packet, which is written
    /// unchanged, or a bare message, which is checksummed and framed first.
    pub async fn send_raw(&mut self, bytes: &[u8]) -> Result<(), SessionError> {
        if is_framed(bytes) {
            self.write_packet(bytes).await
        } else {
            self.write_packet(&frame(&bytes)).await
        }
    }

    /// Sends a [`PingMessage`], which keeps the display from clearing itself
    /// after about a minute without traffic.
    pub async fn ping(&mut self) -> Result<(), SessionError> {
        self.send_message(&PingMessage::default().into()).await
    }

    /// Waits for the next packet from the display.
    ///
    /// Gives up with [`SessionError::Timeout`] after the configured read timeout.
    pub async fn recv(&mut self) -> Result<Message, SessionError> {
        let timeout = self.config.read_timeout;
        self.recv_within(timeout).await
    }

    /// Releases the stream. Closing a closed session does nothing.
    ///
    /// The stream is dropped even if shutting it down fails.
    pub async fn close(&mut self) -> Result<(), SessionError> {
        let Some(mut stream) = self.stream.take() else {
            return Ok(());
        };

        debug!("Closing display session.");
        stream.shutdown().await?;
        Ok(())
    }

    /// Writes `packet` and, when acknowledgements are enabled, waits for the
    /// reply. Bytes left over from earlier exchanges, such as a reply that
    /// arrived after its timeout, are discarded first so they cannot be taken
    /// for this packet's reply.
    async fn write_packet(&mut self, packet: &[u8]) -> Result<(), SessionError> {
        let ack_timeout = self.config.ack_timeout;
        let stream = self.stream()?;

        if ack_timeout.is_some() {
            let stale = discard_pending(stream).await?;
            if stale > 0 {
                warn!("Discarded {stale} stale bytes before writing.");
            }
        }

        trace!("sent packet: {:x?}", packet);
        stream.write_all(packet).await?;
        stream.flush().await?;

        if let Some(timeout) = ack_timeout {
            match self.recv_within(timeout).await? {
                Message::Response(response) => {
                    if !response.is_acknowledgement() {
                        warn!("Display replied with {response:x?} instead of an acknowledgement.");
                    }
                }
                other => return Err(SessionError::UnexpectedReply(other)),
            }
        }

        Ok(())
    }

    async fn recv_within(&mut self, timeout: Duration) -> Result<Message, SessionError> {
        let stream = self.stream()?;

        select! {
            result = receive_one_packet(stream) => {
                let packet = result?;
                Ok(Packet::<Message>::decode_exact(&packet)?.into_inner())
            }
            _ = sleep(timeout) => Err(SessionError::Timeout)
        }
    }
}

/// Reads whatever the stream has already buffered without waiting for more,
/// and returns how many bytes were thrown away.
async fn discard_pending<R: AsyncRead + Unpin>(stream: &mut R) -> Result<usize, SessionError> {
    let mut buf = [0; 64];
    let mut discarded = 0;

    loop {
        select! {
            biased;
            read = stream.read(&mut buf) => match read? {
                0 => return Ok(discarded),
                n => discarded += n,
            },
            _ = std::future::ready(()) => return Ok(discarded),
        }
    }
}

/// Reads one framed packet, markers included, skipping anything before its
/// start marker.
async fn receive_one_packet<R: AsyncRead + Unpin>(stream: &mut R) -> Result<Vec<u8>, SessionError> {
    let mut noise = 0;
    let mut previous = None;
    loop {
        let byte = stream.read_u8().await?;
        if previous == Some(DLE) && byte == STX {
            break;
        }
        if previous.is_some() {
            noise += 1;
        }
        previous = Some(byte);
    }

    if noise > 0 {
        warn!("Skipped {noise} bytes before a start marker.");
    }

    let mut packet = Vec::from(START_MARKER);
    loop {
        let byte = stream.read_u8().await?;
        packet.push(byte);

        if byte == DLE {
            let escaped = stream.read_u8().await?;
            packet.push(escaped);
            if escaped == ETX {
                break;
            }
        }
    }

    trace!("received packet: {:x?}", packet);
    Ok(packet)
}

#[cfg(test)]
mod tests {
    use pid_protocol::{DecodeErrorKind, EncodeError, ResponseMessage};
    use tokio::{
        io::{duplex, DuplexStream},
        task::JoinHandle,
    };

    use super::*;

    const ACK: [u8; 10] = [0x10, 0x02, 0x01, 0x52, 0x6F, 0x00, 0xA3, 0x30, 0x10, 0x03];

    fn session(config: SessionConfig) -> (Session<DuplexStream>, DuplexStream) {
        let (host, device) = duplex(1024);
        (Session::from_stream(host, config), device)
    }

    fn without_acks() -> SessionConfig {
        SessionConfig::default().with_ack_timeout(None)
    }

    fn ping_packet() -> Vec<u8> {
        frame(&PingMessage::default())
    }

    async fn read_packet(device: &mut DuplexStream, expected: &[u8]) {
        let mut received = vec![0; expected.len()];
        device.read_exact(&mut received).await.unwrap();
        assert_eq!(received, expected);
    }

    /// Acts as the display: waits for `expected`, then answers with `reply`.
    fn answer(
        mut device: DuplexStream,
        expected: Vec<u8>,
        reply: Vec<u8>,
    ) -> JoinHandle<DuplexStream> {
        tokio::spawn(async move {
            read_packet(&mut device, &expected).await;
            device.write_all(&reply).await.unwrap();
            device
        })
    }

    #[tokio::test]
    async fn send_writes_one_packet() {
        let (mut session, mut device) = session(without_acks());

        session.send("V0^OPEN_FOR BUSINESS").await.unwrap();

        let expected: DisplayMessage = "V0^OPEN_FOR BUSINESS".parse().unwrap();
        read_packet(&mut device, &frame(&expected)).await;
    }

    #[tokio::test]
    async fn send_waits_for_acknowledgement() {
        let (mut session, device) = session(SessionConfig::default());
        let display = answer(
            device,
            vec![0x10, 0x02, 0x01, 0x50, 0x6F, 0x16, 0xD4, 0x10, 0x03],
            ACK.to_vec(),
        );

        session.ping().await.unwrap();
        display.await.unwrap();
    }

    #[tokio::test]
    async fn acknowledgement_after_noise() {
        let (mut session, device) = session(SessionConfig::default());
        let hello: DisplayMessage = "HELLO".parse().unwrap();
        let mut reply = vec![0xFF, 0x00, 0x10];
        reply.extend_from_slice(&ACK);
        let display = answer(device, frame(&hello), reply);

        session.send("HELLO").await.unwrap();
        display.await.unwrap();
    }

    #[tokio::test]
    async fn missing_acknowledgement_times_out() {
        let (mut session, _device) = session(
            SessionConfig::default().with_ack_timeout(Some(Duration::from_millis(50))),
        );

        let error = session.ping().await.unwrap_err();
        assert!(matches!(error, SessionError::Timeout));
        assert!(error.is_transport());
    }

    #[tokio::test]
    async fn late_acknowledgement_is_not_reused() {
        let (mut session, mut device) = session(
            SessionConfig::default().with_ack_timeout(Some(Duration::from_millis(50))),
        );

        assert!(matches!(session.ping().await, Err(SessionError::Timeout)));
        read_packet(&mut device, &ping_packet()).await;

        // The first ping's acknowledgement arrives after its timeout.
        device.write_all(&ACK).await.unwrap();

        assert!(matches!(session.ping().await, Err(SessionError::Timeout)));
        read_packet(&mut device, &ping_packet()).await;
    }

    #[tokio::test]
    async fn reply_must_be_a_response() {
        let (mut session, device) = session(SessionConfig::default());
        let display = answer(device, ping_packet(), ping_packet());

        assert!(matches!(
            session.ping().await,
            Err(SessionError::UnexpectedReply(Message::Ping(_)))
        ));
        display.await.unwrap();
    }

    #[tokio::test]
    async fn corrupt_reply() {
        let (mut session, device) = session(SessionConfig::default());
        let mut corrupt = ACK;
        corrupt[4] ^= 0x01;
        let display = answer(device, ping_packet(), corrupt.to_vec());

        match session.ping().await {
            Err(SessionError::Decode(error)) => assert!(matches!(
                error.kind(),
                DecodeErrorKind::ChecksumMismatch { .. }
            )),
            other => panic!("expected a checksum mismatch, got {other:?}"),
        }
        display.await.unwrap();
    }

    #[tokio::test]
    async fn invalid_text_writes_nothing() {
        let (mut session, mut device) = session(without_acks());

        assert!(matches!(
            session.send("@@@ BAD TEXT @@@").await,
            Err(SessionError::Encode(EncodeError::UnsupportedCharacter('@')))
        ));

        // The next bytes on the wire belong to the next message.
        session.ping().await.unwrap();
        read_packet(&mut device, &ping_packet()).await;
    }

    #[tokio::test]
    async fn raw_bytes() {
        let (mut session, mut device) = session(without_acks());
        let ping = ping_packet();

        session.send_raw(&ping).await.unwrap();
        read_packet(&mut device, &ping).await;

        session.send_raw(b"\x01\x50\x6F").await.unwrap();
        read_packet(&mut device, &ping).await;
    }

    #[tokio::test]
    async fn recv_decodes_responses() {
        let (mut session, mut device) = session(without_acks());
        device.write_all(&ACK).await.unwrap();

        assert_eq!(
            session.recv().await.unwrap(),
            Message::Response(ResponseMessage {
                kind: 0x52,
                payload: vec![0x6F, 0x00],
            })
        );
    }

    #[tokio::test]
    async fn disconnected_device() {
        let (mut session, device) = session(without_acks());
        drop(device);

        let error = session.recv().await.unwrap_err();
        assert!(matches!(error, SessionError::Transport(_)));
        assert!(error.is_transport());
    }

    #[tokio::test]
    async fn write_to_disconnected_device() {
        for config in [SessionConfig::default(), without_acks()] {
            let (mut session, device) = session(config);
            drop(device);

            let error = session.ping().await.unwrap_err();
            assert!(matches!(error, SessionError::Transport(_)), "{error:?}");
            assert!(error.is_transport());

            assert!(matches!(
                session.send("HELLO").await,
                Err(SessionError::Transport(_))
            ));
        }
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (mut session, _device) = session(without_acks());
        assert!(session.is_open());

        session.close().await.unwrap();
        assert!(!session.is_open());
        session.close().await.unwrap();

        assert!(matches!(session.ping().await, Err(SessionError::Closed)));
        assert!(matches!(session.recv().await, Err(SessionError::Closed)));
    }
}
