//! Resolver configuration (resolv.conf).

use std::io;
use std::net::IpAddr;
use std::path::Path;

use tracing::debug;

use super::Collection;
use crate::error::{Result, SnapshotError};
use crate::state::{DnsResolver, Warning, WarningSource};

/// Read and parse `path`. A missing file means no resolver config.
pub async fn collect(path: &Path) -> Result<Option<Collection<DnsResolver>>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no resolver config");
            return Ok(None);
        }
        Err(e) => return Err(SnapshotError::from_io("dns", &e)),
    };
    Ok(Some(parse(&content)))
}

/// Parse resolv.conf text.
///
/// Only `nameserver`, `search` and `domain` are read. `search` and `domain`
/// both append to the search list. Bad name server addresses are skipped
/// with a warning.
pub fn parse(content: &str) -> Collection<DnsResolver> {
    let mut resolver = DnsResolver::default();
    let mut warnings = Vec::new();

    for (lineno, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        let mut words = line.split_whitespace();
        match words.next() {
            Some("nameserver") => {
                let Some(value) = words.next() else {
                    continue;
                };
                // Link-local servers may carry a zone suffix.
                let addr = value.split('%').next().unwrap_or(value);
                match addr.parse::<IpAddr>() {
                    Ok(ip) => resolver.name_servers.push(ip),
                    Err(_) => warnings.push(Warning::new(
                        WarningSource::Dns,
                        format!("line {}: invalid nameserver {value:?}", lineno + 1),
                    )),
                }
            }
            Some("search" | "domain") => {
                resolver.searches.extend(
                    words
                        .take_while(|w| !w.starts_with('#') && !w.starts_with(';'))
                        .map(str::to_string),
                );
            }
            _ => {}
        }
    }

    Collection::with_warnings(resolver, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolv_conf() {
        let content = "\
# Generated by NetworkManager
search example.com lab.example.com
nameserver 192.0.2.53
; legacy comment
nameserver 2001:db8::53
nameserver fe80::1%eth0
options edns0
";
        let parsed = parse(content);
        assert!(parsed.warnings.is_empty());
        assert_eq!(parsed.data.searches, vec!["example.com", "lab.example.com"]);
        assert_eq!(
            parsed.data.name_servers,
            vec![
                "192.0.2.53".parse::<IpAddr>().unwrap(),
                "2001:db8::53".parse().unwrap(),
                "fe80::1".parse().unwrap(),
            ]
        );
    }

    #[test]
    fn test_invalid_nameserver_warns() {
        let parsed = parse("nameserver not-an-ip\ndomain corp.example\n");
        assert!(parsed.data.name_servers.is_empty());
        assert_eq!(parsed.data.searches, vec!["corp.example"]);
        assert_eq!(parsed.warnings.len(), 1);
        assert_eq!(parsed.warnings[0].source, WarningSource::Dns);
    }

    #[tokio::test]
    async fn test_missing_file_is_absent() {
        let result = collect(Path::new("/nonexistent/netstate/resolv.conf"))
            .await
            .unwrap();
        assert!(result.is_none());
    }
}
