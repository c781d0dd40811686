use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle stage reported by the scanning engine. The local session only
/// mirrors the latest value it was told about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPhase {
    #[default]
    Uninitialized,
    Initialized,
    Previewing,
    Scanning,
    Viewing,
}

impl ScanPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::Initialized => "initialized",
            Self::Previewing => "previewing",
            Self::Scanning => "scanning",
            Self::Viewing => "viewing",
        }
    }

    pub fn is_initialized(self) -> bool {
        self != Self::Uninitialized
    }
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Part a device plays in a paired two-device setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceRole {
    /// Renders the remote stream and drives the scanner over the network.
    Mirror,
    /// Captures depth locally and streams rendered frames out.
    Scanner,
}

impl DeviceRole {
    pub fn scanner_type(self) -> ScannerType {
        match self {
            Self::Mirror => ScannerType::Network,
            Self::Scanner => ScannerType::TrueDepth,
        }
    }
}

impl fmt::Display for DeviceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mirror => f.write_str("mirror"),
            Self::Scanner => f.write_str("scanner"),
        }
    }
}

/// Device type passed to `initializeScanner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScannerType {
    Network,
    #[default]
    TrueDepth,
}

impl ScannerType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::TrueDepth => "true_depth",
        }
    }
}

impl fmt::Display for ScannerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamingFlag {
    SendRenderedStream,
    ReceiveRenderedStream,
    SendNetworkCommands,
    ReceiveNetworkCommands,
}

impl StreamingFlag {
    pub const ALL: [StreamingFlag; 4] = [
        StreamingFlag::SendRenderedStream,
        StreamingFlag::ReceiveNetworkCommands,
        StreamingFlag::ReceiveRenderedStream,
        StreamingFlag::SendNetworkCommands,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::SendRenderedStream => "send_rendered_stream",
            Self::ReceiveRenderedStream => "receive_rendered_stream",
            Self::SendNetworkCommands => "send_network_commands",
            Self::ReceiveNetworkCommands => "receive_network_commands",
        }
    }
}

/// The four streaming switches. They always come in two complementary
/// pairs: video goes one way and commands go the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StreamingFlags {
    pub send_rendered_stream: bool,
    pub receive_rendered_stream: bool,
    pub send_network_commands: bool,
    pub receive_network_commands: bool,
}

impl StreamingFlags {
    pub fn for_role(role: DeviceRole) -> Self {
        let scanner = role == DeviceRole::Scanner;
        Self {
            send_rendered_stream: scanner,
            receive_network_commands: scanner,
            receive_rendered_stream: !scanner,
            send_network_commands: !scanner,
        }
    }

    pub fn complement(self) -> Self {
        Self {
            send_rendered_stream: !self.send_rendered_stream,
            receive_rendered_stream: !self.receive_rendered_stream,
            send_network_commands: !self.send_network_commands,
            receive_network_commands: !self.receive_network_commands,
        }
    }

    pub fn get(&self, flag: StreamingFlag) -> bool {
        match flag {
            StreamingFlag::SendRenderedStream => self.send_rendered_stream,
            StreamingFlag::ReceiveRenderedStream => self.receive_rendered_stream,
            StreamingFlag::SendNetworkCommands => self.send_network_commands,
            StreamingFlag::ReceiveNetworkCommands => self.receive_network_commands,
        }
    }

    /// Flag/value pairs in the order they are pushed to the engine.
    pub fn entries(&self) -> [(StreamingFlag, bool); 4] {
        StreamingFlag::ALL.map(|flag| (flag, self.get(flag)))
    }
}

/// Physical unit of the scan-size parameter, selected by v2 scanning mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeUnit {
    Meters,
    Millimeters,
}

impl SizeUnit {
    /// An unknown mode (not yet queried) is treated as meters.
    pub fn from_v2_mode(v2_mode: Option<bool>) -> Self {
        if v2_mode == Some(true) {
            Self::Millimeters
        } else {
            Self::Meters
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Meters => "m",
            Self::Millimeters => "mm",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_flags_send_commands_and_receive_video() {
        let flags = StreamingFlags::for_role(DeviceRole::Mirror);
        assert!(!flags.send_rendered_stream);
        assert!(!flags.receive_network_commands);
        assert!(flags.receive_rendered_stream);
        assert!(flags.send_network_commands);
    }

    #[test]
    fn role_flags_are_exact_complements() {
        let mirror = StreamingFlags::for_role(DeviceRole::Mirror);
        let scanner = StreamingFlags::for_role(DeviceRole::Scanner);
        assert_eq!(mirror.complement(), scanner);
        assert_eq!(scanner.complement(), mirror);
    }

    #[test]
    fn roles_map_to_scanner_types() {
        assert_eq!(DeviceRole::Mirror.scanner_type().as_str(), "network");
        assert_eq!(DeviceRole::Scanner.scanner_type().as_str(), "true_depth");
    }

    #[test]
    fn unknown_v2_mode_uses_meters() {
        assert_eq!(SizeUnit::from_v2_mode(None), SizeUnit::Meters);
        assert_eq!(SizeUnit::from_v2_mode(Some(false)), SizeUnit::Meters);
        assert_eq!(SizeUnit::from_v2_mode(Some(true)), SizeUnit::Millimeters);
    }

    #[test]
    fn phases_serialize_as_snake_case() {
        let json = serde_json::to_string(&ScanPhase::Previewing).expect("serialize");
        assert_eq!(json, "\"previewing\"");
        let role: DeviceRole = serde_json::from_str("\"scanner\"").expect("deserialize");
        assert_eq!(role, DeviceRole::Scanner);
    }
}
