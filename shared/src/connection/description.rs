use std::fmt;

/// Transport used to reach a node
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum ConnectionKind {
    /// In-process pair, for tests and single-machine sessions
    #[default]
    Local,
    TcpIp,
}

/// How to reach the process of a node
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default)]
pub struct ConnectionDescription {
    pub kind: ConnectionKind,
    pub hostname: String,
    pub port: u16,
}

impl ConnectionDescription {
    pub fn local(name: &str) -> Self {
        Self {
            kind: ConnectionKind::Local,
            hostname: name.to_string(),
            port: 0,
        }
    }

    pub fn tcp(hostname: &str, port: u16) -> Self {
        Self {
            kind: ConnectionKind::TcpIp,
            hostname: hostname.to_string(),
            port,
        }
    }
}

impl fmt::Display for ConnectionDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ConnectionKind::Local => write!(f, "local:{}", self.hostname),
            ConnectionKind::TcpIp => write!(f, "tcp://{}:{}", self.hostname, self.port),
        }
    }
}
