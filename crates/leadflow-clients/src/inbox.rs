use std::collections::HashSet;
use std::io::ErrorKind;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use async_trait::async_trait;
use leadflow_core::adapters::InboxPoller;
use leadflow_core::config::MailConfig;
use leadflow_core::types::TriggerEvent;
use leadflow_core::{LeadflowError, Result};
use mailparse::MailHeaderMap;

const ADAPTER: &str = "imap";

/// Most recent matches returned per poll.
pub const MAX_EVENTS: usize = 5;

/// Inbox polling over IMAPS. Matched messages are flagged `\Seen` so the
/// next poll does not report them again.
pub struct ImapPoller {
    config: MailConfig,
    timeout: Duration,
}

impl ImapPoller {
    pub fn new(config: MailConfig, timeout: Duration) -> Self {
        Self { config, timeout }
    }
}

#[async_trait]
impl InboxPoller for ImapPoller {
    async fn poll(&self, criteria: &str) -> Result<Vec<TriggerEvent>> {
        let config = self.config.clone();
        let timeout = self.timeout;
        let criteria = criteria.to_string();
        tokio::task::spawn_blocking(move || poll_blocking(&config, timeout, &criteria))
            .await
            .map_err(|e| LeadflowError::transport(ADAPTER, format!("poll task failed: {e}")))?
    }
}

type Session = imap::Session<native_tls::TlsStream<TcpStream>>;

fn poll_blocking(
    config: &MailConfig,
    timeout: Duration,
    criteria: &str,
) -> Result<Vec<TriggerEvent>> {
    let mut session = open_session(config, timeout)?;
    let events = search_and_mark(&mut session, criteria, timeout);
    if let Err(e) = session.logout() {
        tracing::debug!(error = %e, "imap logout failed");
    }
    events
}

fn open_session(config: &MailConfig, timeout: Duration) -> Result<Session> {
    let host = config.imap_server.as_str();
    let addr = (host, config.imap_port)
        .to_socket_addrs()
        .map_err(|e| LeadflowError::transport(ADAPTER, format!("resolve {host}: {e}")))?
        .next()
        .ok_or_else(|| LeadflowError::transport(ADAPTER, format!("no address for {host}")))?;

    let tcp = TcpStream::connect_timeout(&addr, timeout).map_err(|e| io_error(e, timeout))?;
    tcp.set_read_timeout(Some(timeout))
        .and_then(|_| tcp.set_write_timeout(Some(timeout)))
        .map_err(|e| io_error(e, timeout))?;

    let tls = native_tls::TlsConnector::builder()
        .build()
        .map_err(|e| LeadflowError::transport(ADAPTER, e.to_string()))?;
    let stream = tls
        .connect(host, tcp)
        .map_err(|e| LeadflowError::transport(ADAPTER, format!("tls handshake: {e}")))?;

    let mut client = imap::Client::new(stream);
    client.read_greeting().map_err(|e| imap_error(e, timeout))?;
    client
        .login(&config.address, config.password.expose())
        .map_err(|(e, _)| match e {
            imap::Error::No(_) => LeadflowError::AdapterAuthFailure(ADAPTER),
            other => imap_error(other, timeout),
        })
}

fn search_and_mark(
    session: &mut Session,
    criteria: &str,
    timeout: Duration,
) -> Result<Vec<TriggerEvent>> {
    let failed = |e| imap_error(e, timeout);
    session.select("INBOX").map_err(failed)?;
    let matches = session.search(criteria).map_err(failed)?;
    let ids = newest(&matches, MAX_EVENTS);
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let set = sequence_set(&ids);
    let fetched = session.fetch(&set, "RFC822.HEADER").map_err(failed)?;
    let mut headers: Vec<(u32, TriggerEvent)> = fetched
        .iter()
        .filter_map(|f| Some((f.message, parse_event(f.header()?))))
        .collect();
    headers.sort_by(|a, b| b.0.cmp(&a.0));

    session.store(&set, "+FLAGS (\\Seen)").map_err(failed)?;
    Ok(headers.into_iter().map(|(_, event)| event).collect())
}

/// Highest sequence numbers first.
fn newest(matches: &HashSet<u32>, limit: usize) -> Vec<u32> {
    let mut ids: Vec<u32> = matches.iter().copied().collect();
    ids.sort_unstable_by(|a, b| b.cmp(a));
    ids.truncate(limit);
    ids
}

fn sequence_set(ids: &[u32]) -> String {
    ids.iter().map(u32::to_string).collect::<Vec<_>>().join(",")
}

fn parse_event(raw: &[u8]) -> TriggerEvent {
    let headers = match mailparse::parse_headers(raw) {
        Ok((headers, _)) => headers,
        Err(e) => {
            tracing::warn!(error = %e, "unparseable message header");
            Vec::new()
        }
    };
    TriggerEvent {
        subject: headers.get_first_value("Subject").unwrap_or_default(),
        from: headers.get_first_value("From").unwrap_or_default(),
        date: headers.get_first_value("Date").unwrap_or_default(),
    }
}

fn io_error(e: std::io::Error, timeout: Duration) -> LeadflowError {
    match e.kind() {
        ErrorKind::TimedOut | ErrorKind::WouldBlock => LeadflowError::AdapterTimeout {
            adapter: ADAPTER,
            secs: timeout.as_secs(),
        },
        _ => LeadflowError::transport(ADAPTER, e.to_string()),
    }
}

fn imap_error(e: imap::Error, timeout: Duration) -> LeadflowError {
    match e {
        imap::Error::Io(io) => io_error(io, timeout),
        imap::Error::No(msg) | imap::Error::Bad(msg) => LeadflowError::bad_response(ADAPTER, msg),
        other => LeadflowError::transport(ADAPTER, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newest_keeps_highest_ids_descending() {
        let matches: HashSet<u32> = [3, 17, 9, 1, 12, 40, 8].into_iter().collect();
        assert_eq!(newest(&matches, MAX_EVENTS), vec![40, 17, 12, 9, 8]);
        assert_eq!(sequence_set(&newest(&matches, 2)), "40,17");
    }

    #[test]
    fn newest_of_nothing_is_empty() {
        assert!(newest(&HashSet::new(), MAX_EVENTS).is_empty());
    }

    #[test]
    fn parses_trigger_headers() {
        let raw = b"From: Dana <dana@acme.io>\r\n\
                    Subject: New Campaign Task\r\n\
                    Date: Mon, 12 Oct 2026 09:15:00 +0000\r\n\
                    \r\n";
        let event = parse_event(raw);
        assert_eq!(event.subject, "New Campaign Task");
        assert_eq!(event.from, "Dana <dana@acme.io>");
        assert_eq!(event.date, "Mon, 12 Oct 2026 09:15:00 +0000");
    }

    #[test]
    fn decodes_encoded_subject() {
        let raw = b"Subject: =?UTF-8?B?TmV3IENhbXBhaWduIFRhc2s=?=\r\n\r\n";
        assert_eq!(parse_event(raw).subject, "New Campaign Task");
    }

    #[test]
    fn missing_headers_default_to_empty() {
        let event = parse_event(b"X-Other: 1\r\n\r\n");
        assert!(event.subject.is_empty());
        assert!(event.from.is_empty());
    }

    #[test]
    fn refused_command_is_bad_response() {
        let err = imap_error(imap::Error::No("SEARCH failed".into()), Duration::ZERO);
        assert!(matches!(err, LeadflowError::AdapterBadResponse { adapter: "imap", .. }));
    }
}
