use std::net::IpAddr;

// MARK: - HostInfo

/// Servidor de display detectado na rede local.
///
/// Produced by the discovery listener, one per valid echo reply.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HostInfo {
    pub address: IpAddr,
    pub host_name: String,
}

impl HostInfo {
    pub fn new(address: IpAddr, host_name: impl Into<String>) -> Self {
        Self {
            address,
            host_name: host_name.into(),
        }
    }
}

impl std::fmt::Display for HostInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' @ {}", self.host_name, self.address)
    }
}

// MARK: - ConnectionState

/// Fase atual do ciclo de vida da conexão.
///
/// Written only by the connection task: `Init` before the task runs,
/// `Connecting` while dialing (and again after any failure), `Connected`
/// while streaming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Init,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Init => write!(f, "init"),
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

// MARK: - Frame

/// Uma unidade de dados de display recebida do servidor.
///
/// `Payload` carries the raw encoded image bytes exactly as they arrived;
/// decoding them into something renderable is the consumer's job. `Blank`
/// is the server's explicit clear-screen signal and carries no bytes.
/// A zero-length payload is never constructed (the wire's `size == 0`
/// message produces no frame at all).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Blank,
    Payload(bytes::Bytes),
}

impl Frame {
    /// Payload size in bytes; 0 for a blank frame.
    pub fn len(&self) -> usize {
        match self {
            Self::Blank => 0,
            Self::Payload(data) => data.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
