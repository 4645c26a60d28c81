//! Event subscription on a dedicated control socket.

use std::path::{Path, PathBuf};

use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::channel::{ControlTransport, UnixTransport};
use super::command::WpaCommand;
use super::event::{EventParser, WpaEvent};
use super::WpaType;
use crate::config::ControlChannelConfig;
use crate::error::{Error, Result};

/// Events buffered by [`WpaEventListener::into_stream`].
const STREAM_CAPACITY: usize = 64;

/// A control socket that has sent `ATTACH` and receives events.
///
/// Created by [`ControlChannel::listen`](super::ControlChannel::listen).
/// Dropping the listener closes the socket; the daemon forgets the
/// subscription the next time it fails to deliver an event.
#[derive(Debug)]
pub struct WpaEventListener<T: ControlTransport = UnixTransport> {
    transport: T,
    parser: EventParser,
    path: PathBuf,
    buf: Vec<u8>,
}

impl<T: ControlTransport> WpaEventListener<T> {
    /// Send `ATTACH` on `transport` and wait for `OK`.
    pub async fn attach(
        transport: T,
        daemon: WpaType,
        path: PathBuf,
        config: &ControlChannelConfig,
    ) -> Result<Self> {
        let mut listener = Self {
            transport,
            parser: EventParser::new(daemon),
            path,
            buf: vec![0u8; config.recv_buffer_size],
        };
        listener.command(&WpaCommand::Attach).await?;
        debug!(path = %listener.path.display(), "attached to control socket");
        Ok(listener)
    }

    /// Control socket this listener is attached to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn command(&mut self, command: &WpaCommand) -> Result<()> {
        self.transport.send(command.payload().as_bytes()).await?;
        loop {
            let reply = self.recv().await?;
            if reply.starts_with('<') {
                continue;
            }
            if reply.starts_with("OK") {
                return Ok(());
            }
            return Err(Error::CommandFailed {
                command: command.to_string(),
                reply: reply.trim_end().to_string(),
            });
        }
    }

    async fn recv(&mut self) -> Result<String> {
        let len = self.transport.recv(&mut self.buf).await?;
        Ok(String::from_utf8_lossy(&self.buf[..len]).into_owned())
    }

    /// Wait for the next event. Lines that do not parse are skipped.
    pub async fn next_event(&mut self) -> Result<WpaEvent> {
        loop {
            let line = self.recv().await?;
            match self.parser.parse(&line) {
                Some(event) => return Ok(event),
                None => debug!(line = %line.trim_end(), "dropping malformed event"),
            }
        }
    }

    /// Send `DETACH` and close the socket.
    pub async fn detach(mut self) -> Result<()> {
        self.command(&WpaCommand::Detach).await
    }

    /// Forward events to a stream until `cancel` fires, the receiver is
    /// dropped, or the socket fails. The error, if any, is the last item.
    pub fn into_stream(mut self, cancel: CancellationToken) -> ReceiverStream<Result<WpaEvent>> {
        let (tx, rx) = mpsc::channel(STREAM_CAPACITY);

        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    event = self.next_event() => event,
                };

                match event {
                    Ok(event) => {
                        if tx.send(Ok(event)).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(path = %self.path.display(), error = %e, "event listener stopped");
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                }
            }

            if let Err(e) = self.detach().await {
                debug!(error = %e, "detach failed");
            }
        });

        ReceiverStream::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tokio_stream::StreamExt;

    use super::*;
    use crate::wpa::channel::tests::ScriptedTransport;
    use crate::wpa::event::WpaEventKind;

    async fn attached(transport: &Arc<ScriptedTransport>) -> WpaEventListener<Arc<ScriptedTransport>> {
        transport.push_reply("OK\n");
        WpaEventListener::attach(
            Arc::clone(transport),
            WpaType::Hostapd,
            PathBuf::from("/var/run/hostapd/wlan0"),
            &ControlChannelConfig::default(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_attach_and_receive() {
        let transport = Arc::new(ScriptedTransport::default());
        let mut listener = attached(&transport).await;

        transport.push_reply("not an event");
        transport.push_reply("<3>AP-ENABLED");
        let event = listener.next_event().await.unwrap();
        assert_eq!(event.kind, WpaEventKind::ApEnabled);
        assert_eq!(*transport.sent.lock().unwrap(), vec!["ATTACH".to_string()]);
    }

    #[tokio::test]
    async fn test_attach_rejected() {
        let transport = Arc::new(ScriptedTransport::default());
        transport.push_reply("FAIL\n");
        let err = WpaEventListener::attach(
            Arc::clone(&transport),
            WpaType::Hostapd,
            PathBuf::from("/var/run/hostapd/wlan0"),
            &ControlChannelConfig::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::CommandFailed { ref command, .. } if command == "ATTACH"));
    }

    #[tokio::test]
    async fn test_stream_until_cancelled() {
        let transport = Arc::new(ScriptedTransport::default());
        let listener = attached(&transport).await;
        transport.push_reply("<3>AP-STA-CONNECTED 02:00:00:00:01:00");

        let cancel = CancellationToken::new();
        let mut stream = listener.into_stream(cancel.clone());
        let event = stream.next().await.unwrap().unwrap();
        assert_eq!(event.kind, WpaEventKind::ApStaConnected);

        transport.push_reply("OK\n");
        cancel.cancel();
        assert!(stream.next().await.is_none());
        assert_eq!(
            *transport.sent.lock().unwrap(),
            vec!["ATTACH".to_string(), "DETACH".to_string()]
        );
    }
}
