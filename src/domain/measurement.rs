use chrono::{DateTime, Utc};
use std::fmt;

/// Which endpoint a probe should measure against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProbeTarget {
    /// Let the measurement tool pick the best server.
    BestAvailable,
    /// A specific server id.
    ServerId(u32),
}

impl ProbeTarget {
    /// Short label used when announcing a probe, `None` for the best-available server.
    pub fn label(&self) -> Option<String> {
        match self {
            ProbeTarget::BestAvailable => None,
            ProbeTarget::ServerId(id) => Some(format!("#{id}")),
        }
    }
}

impl fmt::Display for ProbeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeTarget::BestAvailable => write!(f, "best available server"),
            ProbeTarget::ServerId(id) => write!(f, "server #{id}"),
        }
    }
}

/// One completed measurement.
///
/// Values are only ever built from a fully validated tool output, so every
/// field is populated.
#[derive(Clone, Debug, PartialEq)]
pub struct MeasurementResult {
    pub timestamp: DateTime<Utc>,
    pub ping_ms: f64,
    pub download_bps: f64,
    pub upload_bps: f64,
    /// Sponsor of the server, e.g. the ISP operating it.
    pub server_name: String,
    /// City or region of the server.
    pub server_location: String,
    pub server_url: String,
}

impl MeasurementResult {
    pub fn download_mbit(&self) -> f64 {
        self.download_bps / 1_000_000.0
    }

    pub fn upload_mbit(&self) -> f64 {
        self.upload_bps / 1_000_000.0
    }
}
