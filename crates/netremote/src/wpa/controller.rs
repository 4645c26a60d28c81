//! Typed operations on a hostapd interface.

use tracing::info;

use super::channel::{ControlChannel, ControlConnector, UnixConnector};
use super::command::WpaCommand;
use super::response::{WpaConfig, WpaResponse, WpaStatus, WpaTypedResponse};
use super::WpaType;
use crate::config::ControlChannelConfig;
use crate::error::{Error, Result};

/// hostapd control for one interface.
///
/// Wraps a [`ControlChannel`] and turns `FAIL` replies into
/// [`Error::CommandFailed`] and undecodable replies into
/// [`Error::UnexpectedReply`].
///
/// ```rust,no_run
/// use netremote::wpa::HostapdController;
///
/// # async fn example() -> netremote::Result<()> {
/// let hostapd = HostapdController::new("wlan0");
/// let status = hostapd.status().await?;
/// if !status.state.is_operational() {
///     hostapd.enable().await?;
/// }
/// # Ok(())
/// # }
/// ```
pub struct HostapdController<C: ControlConnector = UnixConnector> {
    channel: ControlChannel<C>,
}

impl<C: ControlConnector> std::fmt::Debug for HostapdController<C>
where
    ControlChannel<C>: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostapdController").field("channel", &self.channel).finish()
    }
}

impl HostapdController<UnixConnector> {
    pub fn new(interface: impl Into<String>) -> Self {
        Self::with_config(interface, ControlChannelConfig::default())
    }

    pub fn with_config(interface: impl Into<String>, config: ControlChannelConfig) -> Self {
        Self {
            channel: ControlChannel::with_config(interface, WpaType::Hostapd, config),
        }
    }
}

impl<C: ControlConnector> HostapdController<C> {
    /// Wrap an existing channel.
    pub fn from_channel(channel: ControlChannel<C>) -> Self {
        Self { channel }
    }

    pub fn channel(&self) -> &ControlChannel<C> {
        &self.channel
    }

    pub fn interface(&self) -> &str {
        self.channel.interface()
    }

    /// Whether hostapd answers on this interface.
    pub async fn ping(&self) -> bool {
        self.channel.ping().await
    }

    pub async fn status(&self) -> Result<WpaStatus> {
        match self.decode(&WpaCommand::Status).await? {
            WpaTypedResponse::Status(status) => Ok(status),
            other => Err(unexpected(&WpaCommand::Status, &other)),
        }
    }

    pub async fn get_config(&self) -> Result<WpaConfig> {
        match self.decode(&WpaCommand::GetConfig).await? {
            WpaTypedResponse::Config(config) => Ok(config),
            other => Err(unexpected(&WpaCommand::GetConfig, &other)),
        }
    }

    /// Value of a configuration property.
    pub async fn get_property(&self, property: &str) -> Result<String> {
        let command = WpaCommand::get(property);
        match self.decode(&command).await? {
            WpaTypedResponse::Property(property) => Ok(property.value),
            other => Err(unexpected(&command, &other)),
        }
    }

    /// Set a configuration property. Most properties take effect on the
    /// next [`reload`](Self::reload).
    pub async fn set_property(&self, property: &str, value: &str) -> Result<()> {
        self.expect_ok(&WpaCommand::set(property, value)).await
    }

    /// Start beaconing.
    pub async fn enable(&self) -> Result<()> {
        self.expect_ok(&WpaCommand::Enable).await
    }

    /// Stop beaconing.
    pub async fn disable(&self) -> Result<()> {
        self.expect_ok(&WpaCommand::Disable).await
    }

    /// Ask hostapd to exit.
    pub async fn terminate(&self) -> Result<()> {
        self.expect_ok(&WpaCommand::Terminate).await
    }

    /// Reload the interface configuration.
    pub async fn reload(&self) -> Result<()> {
        self.expect_ok(&WpaCommand::Reload).await
    }

    /// Re-read the configuration file.
    pub async fn reconfigure(&self) -> Result<()> {
        self.expect_ok(&WpaCommand::Reconfigure).await
    }

    async fn expect_ok(&self, command: &WpaCommand) -> Result<()> {
        let response = self.channel.send(command).await?;
        if response.is_ok() {
            info!(interface = self.interface(), %command, "command accepted");
            return Ok(());
        }
        Err(rejected(command, &response))
    }

    async fn decode(&self, command: &WpaCommand) -> Result<WpaTypedResponse> {
        let response = self.channel.send(command).await?;
        if response.is_fail() {
            return Err(rejected(command, &response));
        }
        command
            .decode(&response)
            .ok_or_else(|| Error::UnexpectedReply {
                command: command.to_string(),
                reply: response.to_string(),
            })
    }
}

fn rejected(command: &WpaCommand, response: &WpaResponse) -> Error {
    if response.is_fail() {
        Error::CommandFailed {
            command: command.to_string(),
            reply: response.to_string(),
        }
    } else {
        Error::UnexpectedReply {
            command: command.to_string(),
            reply: response.to_string(),
        }
    }
}

fn unexpected(command: &WpaCommand, decoded: &WpaTypedResponse) -> Error {
    Error::UnexpectedReply {
        command: command.to_string(),
        reply: format!("{:?}", decoded),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wpa::channel::tests::ScriptedConnector;
    use crate::wpa::response::HostapdInterfaceState;

    fn controller(replies: &[&str]) -> HostapdController<ScriptedConnector> {
        let connector = ScriptedConnector::default();
        for reply in replies {
            connector.transport.push_reply(reply);
        }
        HostapdController::from_channel(ControlChannel::with_connector(
            "wlan0",
            WpaType::Hostapd,
            ControlChannelConfig::default(),
            connector,
        ))
    }

    #[tokio::test]
    async fn test_status() {
        let hostapd = controller(&["state=DISABLED\nphy=phy0\n"]);
        let status = hostapd.status().await.unwrap();
        assert_eq!(status.state, HostapdInterfaceState::Disabled);
        assert_eq!(status.phy.as_deref(), Some("phy0"));
    }

    #[tokio::test]
    async fn test_enable_fail() {
        let hostapd = controller(&["FAIL\n"]);
        let err = hostapd.enable().await.unwrap_err();
        match err {
            Error::CommandFailed { command, reply } => {
                assert_eq!(command, "ENABLE");
                assert_eq!(reply, "FAIL");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_get_property_fail() {
        let hostapd = controller(&["FAIL\n"]);
        assert!(matches!(
            hostapd.get_property("ssid").await,
            Err(Error::CommandFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_set_and_get_property() {
        let hostapd = controller(&["OK\n", "ssid=lab\n"]);
        hostapd.set_property("ssid", "lab").await.unwrap();
        assert_eq!(hostapd.get_property("ssid").await.unwrap(), "lab");
    }

    #[tokio::test]
    async fn test_undecodable_status() {
        let hostapd = controller(&["garbage\n"]);
        assert!(matches!(
            hostapd.status().await,
            Err(Error::UnexpectedReply { .. })
        ));
    }
}
