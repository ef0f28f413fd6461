//! Syslog facility definitions

use crate::core::error::{LoggerError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A syslog facility (the logical channel entries are directed toward).
///
/// Parsed case-insensitively from the name syslogd itself recognizes
/// ("local2", "daemon", ...). An unrecognized name is a fatal configuration
/// error: the logger cannot exist without a resolvable channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Facility {
    Kern,
    User,
    Mail,
    Daemon,
    Auth,
    Syslog,
    Lpr,
    News,
    Uucp,
    Cron,
    Authpriv,
    Ftp,
    Local0,
    Local1,
    #[default]
    Local2,
    Local3,
    Local4,
    Local5,
    Local6,
    Local7,
}

impl Facility {
    pub fn name(&self) -> &'static str {
        match self {
            Facility::Kern => "kern",
            Facility::User => "user",
            Facility::Mail => "mail",
            Facility::Daemon => "daemon",
            Facility::Auth => "auth",
            Facility::Syslog => "syslog",
            Facility::Lpr => "lpr",
            Facility::News => "news",
            Facility::Uucp => "uucp",
            Facility::Cron => "cron",
            Facility::Authpriv => "authpriv",
            Facility::Ftp => "ftp",
            Facility::Local0 => "local0",
            Facility::Local1 => "local1",
            Facility::Local2 => "local2",
            Facility::Local3 => "local3",
            Facility::Local4 => "local4",
            Facility::Local5 => "local5",
            Facility::Local6 => "local6",
            Facility::Local7 => "local7",
        }
    }

    /// Numeric syslog facility code (PRI high bits, before the <<3 shift)
    pub fn code(&self) -> u8 {
        match self {
            Facility::Kern => 0,
            Facility::User => 1,
            Facility::Mail => 2,
            Facility::Daemon => 3,
            Facility::Auth => 4,
            Facility::Syslog => 5,
            Facility::Lpr => 6,
            Facility::News => 7,
            Facility::Uucp => 8,
            Facility::Cron => 9,
            Facility::Authpriv => 10,
            Facility::Ftp => 11,
            Facility::Local0 => 16,
            Facility::Local1 => 17,
            Facility::Local2 => 18,
            Facility::Local3 => 19,
            Facility::Local4 => 20,
            Facility::Local5 => 21,
            Facility::Local6 => 22,
            Facility::Local7 => 23,
        }
    }

    /// Resolve a configured facility name, failing fatally on an
    /// unrecognized one.
    pub fn resolve(name: &str) -> Result<Self> {
        name.parse()
            .map_err(|_| LoggerError::config("facility", format!("unknown facility '{}'", name)))
    }
}

impl fmt::Display for Facility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Facility {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "kern" => Ok(Facility::Kern),
            "user" => Ok(Facility::User),
            "mail" => Ok(Facility::Mail),
            "daemon" => Ok(Facility::Daemon),
            "auth" => Ok(Facility::Auth),
            "syslog" => Ok(Facility::Syslog),
            "lpr" => Ok(Facility::Lpr),
            "news" => Ok(Facility::News),
            "uucp" => Ok(Facility::Uucp),
            "cron" => Ok(Facility::Cron),
            "authpriv" => Ok(Facility::Authpriv),
            "ftp" => Ok(Facility::Ftp),
            "local0" => Ok(Facility::Local0),
            "local1" => Ok(Facility::Local1),
            "local2" => Ok(Facility::Local2),
            "local3" => Ok(Facility::Local3),
            "local4" => Ok(Facility::Local4),
            "local5" => Ok(Facility::Local5),
            "local6" => Ok(Facility::Local6),
            "local7" => Ok(Facility::Local7),
            _ => Err(format!("Invalid facility: '{}'", s)),
        }
    }
}
