//! Configuration for the frame-synchronization server.
//!
//! Parsed from command-line arguments in the wall server's historical
//! flag style (value glued to the flag, no space):
//!
//! - `-screens<N>`   expected client count   (default: 2)
//! - `-framerate<N>` target frames/second    (default: 30)
//! - `-port<N>`      TCP listen port         (default: 9002)
//! - `-verbose`      debug-level diagnostics (default: off)
//!
//! Anything unrecognized is a hard error: `main` prints [`USAGE`] and
//! exits non-zero instead of starting the server.

use std::fmt;
use std::str::FromStr;

/// Usage text printed on argument errors.
pub const USAGE: &str = "\
The frame-synchronization wall server.
Accepted command-line parameters:
  -screens<number of screens>  Total # of expected clients. Defaults to 2.
  -framerate<framerate>        Desired frame rate. Defaults to 30.
  -port<port number>           Defines the port. Defaults to 9002.
  -verbose                     Turns debugging messages on.";

/// Server configuration, read-only after startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Expected client count; also the fixed slot-table size.
    pub screens: usize,

    /// Target frames/second the barrier is throttled to.
    pub framerate: u32,

    /// IP address / interface to bind to.
    pub bind_addr: String,

    /// TCP port to listen on.
    pub port: u16,

    /// Emit per-frame diagnostic traces.
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            screens: 2,
            framerate: 30,
            bind_addr: "0.0.0.0".to_string(),
            port: 9002,
            verbose: false,
        }
    }
}

impl Config {
    /// Construct a `Config` from command-line arguments (without the
    /// program name), falling back to defaults for anything omitted.
    pub fn from_args<I>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Config::default();

        for arg in args {
            if arg == "-verbose" {
                config.verbose = true;
            } else if let Some(value) = arg.strip_prefix("-screens") {
                config.screens = parse_flag_value("-screens", value)?;
            } else if let Some(value) = arg.strip_prefix("-framerate") {
                config.framerate = parse_flag_value("-framerate", value)?;
            } else if let Some(value) = arg.strip_prefix("-port") {
                config.port = parse_flag_value("-port", value)?;
            } else {
                return Err(ConfigError::UnrecognizedArgument(arg));
            }
        }

        if config.screens == 0 {
            return Err(ConfigError::InvalidValue {
                flag: "-screens",
                value: "0".to_string(),
            });
        }
        if config.framerate == 0 {
            return Err(ConfigError::InvalidValue {
                flag: "-framerate",
                value: "0".to_string(),
            });
        }

        Ok(config)
    }

    /// Convenience: `addr:port` socket string.
    pub fn socket_addr_string(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn parse_flag_value<T>(flag: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
{
    value.parse::<T>().map_err(|_| ConfigError::InvalidValue {
        flag,
        value: value.to_string(),
    })
}

/// Fatal startup errors from argument parsing.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Argument outside the accepted flag set.
    UnrecognizedArgument(String),

    /// Flag value missing, unparsable, or out of range.
    InvalidValue { flag: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnrecognizedArgument(arg) => {
                write!(f, "Unrecognized argument: {}", arg)
            }
            ConfigError::InvalidValue { flag, value } => {
                write!(f, "Invalid value for {}: {:?}", flag, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
