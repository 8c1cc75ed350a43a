//! Dev-server port discovery from free-form process output.
//!
//! Scraping output is a heuristic; everything the orchestrator needs goes through
//! [`PortProbe`] so another signal can replace it.

use regex::Regex;

/// Extracts a listening port from one line of dev-server output.
pub trait PortProbe: Send {
    fn probe(&self, line: &str) -> Option<u16>;
}

/// Matches `http://localhost:<port>`, ignoring ANSI color codes.
#[derive(Debug, Clone)]
pub struct LocalhostUrlProbe {
    url: Regex,
    ansi: Regex,
}

impl LocalhostUrlProbe {
    pub fn new() -> Self {
        Self {
            url: Regex::new(r"http://localhost:(\d+)").expect("url pattern is valid"),
            ansi: Regex::new(r"\x1b\[[0-9;?]*[A-Za-z]").expect("ansi pattern is valid"),
        }
    }
}

impl Default for LocalhostUrlProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl PortProbe for LocalhostUrlProbe {
    fn probe(&self, line: &str) -> Option<u16> {
        let plain = self.ansi.replace_all(line, "");
        self.url
            .captures_iter(&plain)
            .find_map(|caps| caps.get(1).and_then(|m| m.as_str().parse::<u16>().ok()))
    }
}
