//! Update-client configuration patching.
//!
//! The device's update engine reads `update.conf` to learn which server to
//! fetch firmware from. Patching rewrites the document in place: prior
//! `SERVER=` lines are commented out rather than deleted so the file stays
//! human-diffable and recoverable, and exactly one active `SERVER=` line
//! remains afterwards no matter how often the patch is applied.

use std::fmt;

/// Location of the update engine's config on the device.
pub const UPDATE_CONF_PATH: &str = "/usr/share/remarkable/update.conf";

/// Host and port the device will be told to fetch from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkEndpoint {
    pub host: String,
    pub port: u16,
}

impl NetworkEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl fmt::Display for NetworkEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Rewrite the config document to point at `endpoint`.
///
/// The new `SERVER=` line is inserted directly after the last `[General]`
/// header; with no header present it is appended at the end (deliberate
/// choice, the original behavior was unspecified there). Every pre-existing
/// `SERVER=` line is deactivated with a `#` prefix and kept at its position.
/// Pure function; read-modify-write through a transport is the caller's job.
pub fn patch_update_conf(contents: &str, endpoint: &NetworkEndpoint) -> String {
    let mut lines: Vec<String> = contents.lines().map(str::to_string).collect();
    let mut insert_at = lines.len();

    for (i, line) in lines.iter_mut().enumerate() {
        if line.starts_with("[General]") {
            insert_at = i + 1;
        }
        if line.starts_with("SERVER=") {
            line.insert(0, '#');
        }
    }

    lines.insert(insert_at, format!("SERVER={}", endpoint.url()));

    let mut patched = lines.join("\n");
    if contents.is_empty() || contents.ends_with('\n') {
        patched.push('\n');
    }
    patched
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserts_after_general_and_deactivates_old_server() {
        let endpoint = NetworkEndpoint::new("1.2.3.4", 8080);
        let patched = patch_update_conf("[General]\nSERVER=old\n", &endpoint);
        assert_eq!(patched, "[General]\nSERVER=http://1.2.3.4:8080\n#SERVER=old\n");
    }

    #[test]
    fn appends_without_general_header() {
        let endpoint = NetworkEndpoint::new("10.11.99.5", 8080);
        let patched = patch_update_conf("GROUP=Prod\n", &endpoint);
        assert_eq!(patched, "GROUP=Prod\nSERVER=http://10.11.99.5:8080\n");
    }

    #[test]
    fn unrelated_lines_survive_verbatim_and_in_order() {
        let endpoint = NetworkEndpoint::new("1.2.3.4", 8080);
        let doc = "# comment\nGROUP=Prod\n[General]\nREMARKABLE_RELEASE_VERSION=2.15.0.1067\nSERVER=http://old:80\n";
        let patched = patch_update_conf(doc, &endpoint);
        assert_eq!(
            patched,
            "# comment\nGROUP=Prod\n[General]\nSERVER=http://1.2.3.4:8080\nREMARKABLE_RELEASE_VERSION=2.15.0.1067\n#SERVER=http://old:80\n"
        );
    }

    #[test]
    fn patch_is_idempotent_on_active_server_count() {
        let endpoint = NetworkEndpoint::new("1.2.3.4", 8080);
        let once = patch_update_conf("[General]\nSERVER=old\n", &endpoint);
        let twice = patch_update_conf(&once, &endpoint);

        let active: Vec<&str> = twice
            .lines()
            .filter(|line| line.starts_with("SERVER="))
            .collect();
        assert_eq!(active, vec!["SERVER=http://1.2.3.4:8080"]);

        // deactivated lines accumulate but are never deleted
        assert_eq!(
            twice
                .lines()
                .filter(|line| line.starts_with("#SERVER="))
                .count(),
            2
        );
    }

    #[test]
    fn empty_document_gets_a_single_server_line() {
        let endpoint = NetworkEndpoint::new("127.0.0.1", 8080);
        let patched = patch_update_conf("", &endpoint);
        assert_eq!(patched, "SERVER=http://127.0.0.1:8080\n");
    }

    #[test]
    fn endpoint_url_formatting() {
        let endpoint = NetworkEndpoint::new("10.11.99.5", 8080);
        assert_eq!(endpoint.url(), "http://10.11.99.5:8080");
        assert_eq!(endpoint.to_string(), "10.11.99.5:8080");
    }
}
