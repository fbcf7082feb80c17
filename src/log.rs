//! Log line delivery. The protocol reports progress as human-readable
//! lines through an optional callback; embedders route them to whatever
//! surface they own. A disabled logger drops everything, an enabled logger
//! without a callback prints to stdout.

/// Callback receiving one human-readable line per protocol event.
pub type LogCallback = Box<dyn Fn(&str) + Send>;

pub struct Logger {
    enabled: bool,
    callback: Option<LogCallback>,
}

impl Logger {
    /// Drops every line.
    pub fn disabled() -> Self {
        Logger {
            enabled: false,
            callback: None,
        }
    }

    /// Prints every line to stdout.
    pub fn stdout() -> Self {
        Logger {
            enabled: true,
            callback: None,
        }
    }

    /// Routes every line through `callback`.
    pub fn with_callback(callback: LogCallback) -> Self {
        Logger {
            enabled: true,
            callback: Some(callback),
        }
    }

    pub fn log(&self, line: impl AsRef<str>) {
        if !self.enabled {
            return;
        }
        match &self.callback {
            Some(callback) => callback(line.as_ref()),
            None => println!("{}", line.as_ref()),
        }
    }
}
