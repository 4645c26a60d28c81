//! Connection to a daemon's control socket.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use tokio::net::UnixDatagram;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use super::command::WpaCommand;
use super::listener::WpaEventListener;
use super::response::{WpaResponse, WpaTypedResponse};
use super::WpaType;
use crate::config::ControlChannelConfig;
use crate::error::{Error, Result};

/// A connected datagram transport to one daemon socket.
pub trait ControlTransport: Send + Sync + 'static {
    /// Send one datagram.
    fn send(&self, payload: &[u8]) -> impl Future<Output = io::Result<()>> + Send;

    /// Receive one datagram into `buf`, returning its length.
    fn recv(&self, buf: &mut [u8]) -> impl Future<Output = io::Result<usize>> + Send;
}

/// Opens transports to daemon sockets.
pub trait ControlConnector: Send + Sync + 'static {
    type Transport: ControlTransport;

    /// Connect to the socket at `path`.
    fn connect(&self, path: &Path) -> impl Future<Output = io::Result<Self::Transport>> + Send;
}

static NEXT_LOCAL_SOCKET: AtomicU32 = AtomicU32::new(0);

/// Connects Unix datagram sockets.
///
/// Datagram replies need an addressable sender, so every transport binds a
/// unique path under `local_dir` before connecting.
#[derive(Debug, Clone)]
pub struct UnixConnector {
    local_dir: PathBuf,
}

impl UnixConnector {
    pub fn new(local_dir: impl Into<PathBuf>) -> Self {
        Self {
            local_dir: local_dir.into(),
        }
    }

    fn next_local_path(&self) -> PathBuf {
        let id = NEXT_LOCAL_SOCKET.fetch_add(1, Ordering::Relaxed);
        self.local_dir
            .join(format!("netremote_{}-{}", std::process::id(), id))
    }
}

impl Default for UnixConnector {
    fn default() -> Self {
        Self::new(std::env::temp_dir())
    }
}

impl ControlConnector for UnixConnector {
    type Transport = UnixTransport;

    async fn connect(&self, path: &Path) -> io::Result<UnixTransport> {
        let local_path = self.next_local_path();
        // A stale socket from a previous process with the same pid.
        let _ = std::fs::remove_file(&local_path);

        let socket = UnixDatagram::bind(&local_path)?;
        let transport = UnixTransport { socket, local_path };
        transport.socket.connect(path)?;
        Ok(transport)
    }
}

/// A Unix datagram socket bound to a local path that is removed on drop.
#[derive(Debug)]
pub struct UnixTransport {
    socket: UnixDatagram,
    local_path: PathBuf,
}

impl UnixTransport {
    /// The path this end is bound to.
    pub fn local_path(&self) -> &Path {
        &self.local_path
    }
}

impl ControlTransport for UnixTransport {
    async fn send(&self, payload: &[u8]) -> io::Result<()> {
        self.socket.send(payload).await.map(|_| ())
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.socket.recv(buf).await
    }
}

impl Drop for UnixTransport {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.local_path);
    }
}

/// A client of one daemon's control socket for one interface.
///
/// The socket is opened on first use and shared by every caller. Each
/// command/reply round trip holds the channel exclusively, so concurrent
/// callers never read each other's replies.
///
/// # Example
///
/// ```rust,no_run
/// use netremote::wpa::{ControlChannel, WpaCommand, WpaType};
///
/// # async fn example() -> netremote::Result<()> {
/// let channel = ControlChannel::new("wlan0", WpaType::Hostapd);
/// if channel.ping().await {
///     let reply = channel.send(&WpaCommand::get("ssid")).await?;
///     println!("{}", reply);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ControlChannel<C: ControlConnector = UnixConnector> {
    interface: String,
    daemon: WpaType,
    path: PathBuf,
    connector: C,
    config: ControlChannelConfig,
    transport: RwLock<Option<Arc<C::Transport>>>,
    exchange: Mutex<()>,
}

impl ControlChannel<UnixConnector> {
    /// Channel to `interface` using the default configuration.
    pub fn new(interface: impl Into<String>, daemon: WpaType) -> Self {
        Self::with_config(interface, daemon, ControlChannelConfig::default())
    }

    pub fn with_config(
        interface: impl Into<String>,
        daemon: WpaType,
        config: ControlChannelConfig,
    ) -> Self {
        let connector = UnixConnector::new(config.local_socket_dir.clone());
        Self::with_connector(interface, daemon, config, connector)
    }
}

impl<C: ControlConnector> ControlChannel<C> {
    /// Channel using a custom transport.
    pub fn with_connector(
        interface: impl Into<String>,
        daemon: WpaType,
        config: ControlChannelConfig,
        connector: C,
    ) -> Self {
        let interface = interface.into();
        let path = config.socket_path(daemon, &interface);
        Self {
            interface,
            daemon,
            path,
            connector,
            config,
            transport: RwLock::new(None),
            exchange: Mutex::new(()),
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn daemon(&self) -> WpaType {
        self.daemon
    }

    /// Path of the daemon's control socket.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &ControlChannelConfig {
        &self.config
    }

    /// Open the socket if it is not open yet, or replace it if
    /// `force_reconnect` is set.
    pub async fn connect(&self, force_reconnect: bool) -> Result<()> {
        self.connection(force_reconnect).await.map(|_| ())
    }

    /// Close the socket. The next command reconnects.
    pub async fn disconnect(&self) {
        if self.transport.write().await.take().is_some() {
            debug!(interface = %self.interface, daemon = %self.daemon, "control socket closed");
        }
    }

    pub async fn is_connected(&self) -> bool {
        self.transport.read().await.is_some()
    }

    async fn connection(&self, force_reconnect: bool) -> Result<Arc<C::Transport>> {
        if !force_reconnect {
            if let Some(transport) = self.transport.read().await.as_ref() {
                return Ok(Arc::clone(transport));
            }
        }

        let mut slot = self.transport.write().await;
        if !force_reconnect {
            if let Some(transport) = slot.as_ref() {
                return Ok(Arc::clone(transport));
            }
        }

        let transport = Arc::new(self.open().await?);
        *slot = Some(Arc::clone(&transport));
        debug!(
            interface = %self.interface,
            path = %self.path.display(),
            "control socket connected"
        );
        Ok(transport)
    }

    async fn open(&self) -> Result<C::Transport> {
        self.connector
            .connect(&self.path)
            .await
            .map_err(|source| Error::ControlSocketConnect {
                path: self.path.clone(),
                source,
            })
    }

    /// Send `command` and wait for its reply.
    ///
    /// Event datagrams that arrive in the meantime are discarded. If the
    /// exchange fails part way, including on timeout, the socket is closed
    /// so that a late reply cannot be read as the answer to a later command.
    pub async fn send(&self, command: &WpaCommand) -> Result<WpaResponse> {
        let _exchange = self.exchange.lock().await;
        let transport = self.connection(false).await?;

        let result = self.round_trip(&transport, command).await;
        if let Err(e) = &result {
            let mut slot = self.transport.write().await;
            if slot.as_ref().is_some_and(|t| Arc::ptr_eq(t, &transport)) {
                *slot = None;
                debug!(
                    interface = %self.interface,
                    error = %e,
                    "control socket closed after failed exchange"
                );
            }
        }
        result
    }

    async fn round_trip(&self, transport: &C::Transport, command: &WpaCommand) -> Result<WpaResponse> {
        let payload = command.payload();
        debug!(interface = %self.interface, command = %payload, "sending control command");
        transport.send(payload.as_bytes()).await?;

        let mut buf = vec![0u8; self.config.recv_buffer_size];
        loop {
            let len = self.recv(transport, &mut buf).await?;
            let reply = String::from_utf8_lossy(&buf[..len]);
            if reply.starts_with('<') {
                debug!(interface = %self.interface, event = %reply.trim_end(), "skipping event during exchange");
                continue;
            }
            return Ok(WpaResponse::new(reply.into_owned()));
        }
    }

    async fn recv(&self, transport: &C::Transport, buf: &mut [u8]) -> Result<usize> {
        match self.config.recv_timeout {
            Some(timeout) => tokio::time::timeout(timeout, transport.recv(buf))
                .await
                .map_err(|_| Error::Timeout {
                    path: self.path.clone(),
                    timeout,
                })?
                .map_err(Error::from),
            None => Ok(transport.recv(buf).await?),
        }
    }

    /// Send `command` and decode its reply.
    ///
    /// `Ok(None)` means the daemon answered but the reply did not decode.
    pub async fn request(&self, command: &WpaCommand) -> Result<Option<WpaTypedResponse>> {
        let response = self.send(command).await?;
        Ok(command.decode(&response))
    }

    /// Whether the daemon answers `PING` with `PONG`.
    pub async fn ping(&self) -> bool {
        match self.send(&WpaCommand::Ping).await {
            Ok(response) => response.is_pong(),
            Err(e) => {
                debug!(interface = %self.interface, error = %e, "ping failed");
                false
            }
        }
    }

    /// Open a separate socket subscribed to events.
    pub async fn listen(&self) -> Result<WpaEventListener<C::Transport>> {
        let transport = self.open().await?;
        WpaEventListener::attach(transport, self.daemon, self.path.clone(), &self.config).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use super::*;

    /// Replies to each datagram with the next scripted reply. With no script
    /// left, `recv` never completes.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedTransport {
        pub(crate) sent: StdMutex<Vec<String>>,
        replies: StdMutex<VecDeque<String>>,
        ready: tokio::sync::Notify,
    }

    impl ScriptedTransport {
        pub(crate) fn push_reply(&self, reply: &str) {
            self.replies.lock().unwrap().push_back(reply.to_string());
            self.ready.notify_one();
        }
    }

    impl ControlTransport for Arc<ScriptedTransport> {
        async fn send(&self, payload: &[u8]) -> io::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push(String::from_utf8_lossy(payload).into_owned());
            Ok(())
        }

        async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
            loop {
                let next = self.replies.lock().unwrap().pop_front();
                if let Some(reply) = next {
                    let len = reply.len().min(buf.len());
                    buf[..len].copy_from_slice(&reply.as_bytes()[..len]);
                    return Ok(len);
                }
                self.ready.notified().await;
            }
        }
    }

    /// Hands out `queued` transports first, then `transport` for every
    /// later connect.
    #[derive(Debug, Default)]
    pub(crate) struct ScriptedConnector {
        pub(crate) transport: Arc<ScriptedTransport>,
        pub(crate) queued: StdMutex<VecDeque<Arc<ScriptedTransport>>>,
        pub(crate) connects: AtomicUsize,
        pub(crate) refuse: bool,
    }

    impl ControlConnector for ScriptedConnector {
        type Transport = Arc<ScriptedTransport>;

        async fn connect(&self, _path: &Path) -> io::Result<Self::Transport> {
            if self.refuse {
                return Err(io::Error::from(io::ErrorKind::NotFound));
            }
            self.connects.fetch_add(1, Ordering::SeqCst);
            // Let concurrent callers pile up behind the first connect.
            tokio::task::yield_now().await;
            let queued = self.queued.lock().unwrap().pop_front();
            Ok(queued.unwrap_or_else(|| Arc::clone(&self.transport)))
        }
    }

    fn channel(connector: ScriptedConnector) -> ControlChannel<ScriptedConnector> {
        ControlChannel::with_connector(
            "wlan0",
            WpaType::Hostapd,
            ControlChannelConfig::default(),
            connector,
        )
    }

    #[tokio::test]
    async fn test_get_property_over_transport() {
        let connector = ScriptedConnector::default();
        connector.transport.push_reply("ssid=TestNetwork\n");
        let channel = channel(connector);

        let command = WpaCommand::get("ssid");
        let decoded = channel.request(&command).await.unwrap();
        match decoded {
            Some(WpaTypedResponse::Property(p)) => {
                assert_eq!(p.name, "ssid");
                assert_eq!(p.value, "TestNetwork");
            }
            other => panic!("unexpected decode: {:?}", other),
        }
        assert_eq!(
            *channel.connector.transport.sent.lock().unwrap(),
            vec!["GET ssid".to_string()]
        );
    }

    #[tokio::test]
    async fn test_connects_once() {
        let connector = ScriptedConnector::default();
        connector.transport.push_reply("PONG\n");
        connector.transport.push_reply("OK\n");
        let channel = channel(connector);

        assert!(!channel.is_connected().await);
        assert!(channel.ping().await);
        assert!(channel.send(&WpaCommand::Enable).await.unwrap().is_ok());
        assert!(channel.is_connected().await);
        assert_eq!(channel.connector.connects.load(Ordering::SeqCst), 1);

        channel.connect(true).await.unwrap();
        assert_eq!(channel.connector.connects.load(Ordering::SeqCst), 2);

        channel.disconnect().await;
        assert!(!channel.is_connected().await);
    }

    #[tokio::test]
    async fn test_skips_events() {
        let connector = ScriptedConnector::default();
        connector.transport.push_reply("<3>AP-STA-CONNECTED 02:00:00:00:01:00");
        connector.transport.push_reply("state=ENABLED\n");
        let channel = channel(connector);

        let response = channel.send(&WpaCommand::Status).await.unwrap();
        assert_eq!(response.as_str(), "state=ENABLED\n");
    }

    #[tokio::test]
    async fn test_connect_failure() {
        let connector = ScriptedConnector {
            refuse: true,
            ..Default::default()
        };
        let channel = channel(connector);

        let err = channel.send(&WpaCommand::Ping).await.unwrap_err();
        match err {
            Error::ControlSocketConnect { path, .. } => {
                assert_eq!(path, PathBuf::from("/var/run/hostapd/wlan0"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!channel.ping().await);
        assert!(!channel.is_connected().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let channel = ControlChannel::with_connector(
            "wlan0",
            WpaType::Hostapd,
            ControlChannelConfig::default().recv_timeout(Duration::from_secs(1)),
            ScriptedConnector::default(),
        );

        let err = channel.send(&WpaCommand::Status).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { timeout, .. } if timeout == Duration::from_secs(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_discards_late_reply() {
        let connector = ScriptedConnector::default();
        let stale = Arc::new(ScriptedTransport::default());
        let fresh = Arc::new(ScriptedTransport::default());
        connector.queued.lock().unwrap().push_back(Arc::clone(&stale));
        connector.queued.lock().unwrap().push_back(Arc::clone(&fresh));
        let channel = ControlChannel::with_connector(
            "wlan0",
            WpaType::Hostapd,
            ControlChannelConfig::default().recv_timeout(Duration::from_secs(1)),
            connector,
        );

        let err = channel.send(&WpaCommand::Status).await.unwrap_err();
        assert!(matches!(err, Error::Timeout { .. }));
        assert!(!channel.is_connected().await);

        // STATUS is answered after the caller gave up.
        stale.push_reply("state=ENABLED\n");
        stale.push_reply("ssid=Stale\n");
        fresh.push_reply("ssid=TestNetwork\n");

        match channel.request(&WpaCommand::get("ssid")).await.unwrap() {
            Some(WpaTypedResponse::Property(p)) => assert_eq!(p.value, "TestNetwork"),
            other => panic!("unexpected decode: {:?}", other),
        }
        assert_eq!(channel.connector.connects.load(Ordering::SeqCst), 2);
        assert_eq!(*fresh.sent.lock().unwrap(), vec!["GET ssid".to_string()]);
    }

    #[tokio::test]
    async fn test_concurrent_first_connect_opens_once() {
        let channel = Arc::new(channel(ScriptedConnector::default()));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let channel = Arc::clone(&channel);
            tasks.push(tokio::spawn(async move { channel.connect(false).await }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert!(channel.is_connected().await);
        assert_eq!(channel.connector.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sends_connect_once() {
        let connector = ScriptedConnector::default();
        for _ in 0..8 {
            connector.transport.push_reply("PONG\n");
        }
        let channel = Arc::new(channel(connector));

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let channel = Arc::clone(&channel);
            tasks.push(tokio::spawn(async move { channel.ping().await }));
        }
        for task in tasks {
            assert!(task.await.unwrap());
        }

        assert_eq!(channel.connector.connects.load(Ordering::SeqCst), 1);
    }
}
