use std::fmt;
use std::str::FromStr;

/// Host operating system family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsType {
    Windows,
    Macos,
    Linux,
}

impl OsType {
    /// OS family this binary was built for
    pub fn current() -> Self {
        if cfg!(windows) {
            Self::Windows
        } else if cfg!(target_os = "macos") {
            Self::Macos
        } else {
            Self::Linux
        }
    }

    /// Python interpreter binary name on this OS family
    pub fn interpreter(&self) -> &'static str {
        match self {
            Self::Windows => "python",
            Self::Macos | Self::Linux => "python3",
        }
    }
}

impl FromStr for OsType {
    type Err = std::convert::Infallible;

    // Hosts report unknown Unix flavours too; they all get python3.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "windows" | "windows_nt" => Self::Windows,
            "macos" | "darwin" => Self::Macos,
            _ => Self::Linux,
        })
    }
}

impl fmt::Display for OsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Windows => "windows",
            Self::Macos => "macos",
            Self::Linux => "linux",
        };
        f.write_str(name)
    }
}
