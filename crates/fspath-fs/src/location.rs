//! Well-known directories resolved by the host.

/// Standard per-process and per-user locations.
///
/// Each lookup is re-queried on every call; nothing is cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WellKnownLocation {
    /// The process's current working directory
    Current,
    /// The system temporary directory
    Temporary,
    /// Per-user persistent application data (`dirs::data_dir`)
    Permanent,
    /// Per-user cache (`dirs::cache_dir`)
    Cache,
    /// The user's home directory
    Home,
}

impl WellKnownLocation {
    pub const ALL: [WellKnownLocation; 5] = [
        Self::Current,
        Self::Temporary,
        Self::Permanent,
        Self::Cache,
        Self::Home,
    ];

    /// Get the string representation of the location.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Current => "current",
            Self::Temporary => "temporary",
            Self::Permanent => "permanent",
            Self::Cache => "cache",
            Self::Home => "home",
        }
    }
}

impl AsRef<str> for WellKnownLocation {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for WellKnownLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
