//! Request/response handling with bounded waits.

use std::time::Duration;

use tokio::time::{Instant, timeout_at};

use super::builder::MessageBuilder;
use super::error::{Error, Result};
use super::message::{
    MessageIter, NLM_F_ACK, NLM_F_DUMP, NLM_F_REQUEST, NLMSG_HDRLEN, NlMsgError, NlMsgType,
};
use super::parse::FromNetlink;
use super::socket::{NetlinkSocket, Protocol};

/// Default bound on a single request/response exchange.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Whether a request is a multipart dump or a single do-request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Exchange {
    /// Collect until NLMSG_DONE.
    Dump,
    /// Collect until the ACK (or error) for the request.
    Do,
}

/// Raw replies of one exchange.
#[derive(Debug, Default)]
pub(crate) struct Replies {
    /// Full messages, header included.
    pub messages: Vec<Vec<u8>>,
    /// Set when the kernel flagged the dump as inconsistent.
    pub interrupted: bool,
}

/// Send a request and gather every reply carrying its sequence number.
///
/// The whole exchange must finish before `limit` elapses.
pub(crate) async fn exchange(
    socket: &NetlinkSocket,
    mut builder: MessageBuilder,
    mode: Exchange,
    operation: &str,
    limit: Duration,
) -> Result<Replies> {
    let deadline = Instant::now() + limit;
    let seq = socket.next_seq();
    builder.set_seq(seq);
    builder.set_pid(socket.pid());

    let msg = builder.finish();
    timeout_at(deadline, socket.send(&msg))
        .await
        .map_err(|_| timed_out(operation, limit))??;

    let mut replies = Replies::default();

    loop {
        let data = timeout_at(deadline, socket.recv_msg())
            .await
            .map_err(|_| timed_out(operation, limit))??;
        let mut done = false;

        for result in MessageIter::new(&data) {
            let (header, payload) = result?;

            if header.nlmsg_seq != seq {
                continue;
            }

            if header.is_dump_interrupted() {
                replies.interrupted = true;
            }

            if header.is_error() {
                let err = NlMsgError::from_bytes(payload)?;
                if !err.is_ack() {
                    return Err(Error::from_errno_with_context(err.error, operation));
                }
                if mode == Exchange::Do {
                    done = true;
                    break;
                }
                continue;
            }

            if header.is_done() {
                done = true;
                break;
            }

            let msg_len = (header.nlmsg_len as usize).min(NLMSG_HDRLEN + payload.len());
            let mut full = Vec::with_capacity(msg_len);
            full.extend_from_slice(header.as_bytes());
            full.extend_from_slice(payload);
            replies.messages.push(full);
        }

        if done {
            break;
        }
    }

    Ok(replies)
}

fn timed_out(operation: &str, limit: Duration) -> Error {
    Error::Timeout {
        operation: operation.to_string(),
        elapsed: limit,
    }
}

/// Parsed records of a dump, plus the records that failed to parse.
#[derive(Debug)]
pub struct Dump<T> {
    /// Records in kernel order.
    pub records: Vec<T>,
    /// One entry per message that could not be decoded.
    pub malformed: Vec<Error>,
    /// The kernel flagged the dump as inconsistent (NLM_F_DUMP_INTR).
    pub interrupted: bool,
}

impl<T> Default for Dump<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            malformed: Vec::new(),
            interrupted: false,
        }
    }
}

/// rtnetlink connection.
///
/// Owns one socket; dropping the connection closes it.
pub struct Connection {
    socket: NetlinkSocket,
    timeout: Duration,
}

impl Connection {
    /// Create a new connection for the given protocol.
    pub fn new(protocol: Protocol) -> Result<Self> {
        Ok(Self {
            socket: NetlinkSocket::new(protocol)?,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Bound every exchange on this connection by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Dump `msg_type` with the default header of `T` and parse the replies.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use netstate::netlink::messages::AddressMessage;
    /// use netstate::netlink::message::NlMsgType;
    ///
    /// let dump = conn.dump_typed::<AddressMessage>(NlMsgType::RTM_GETADDR).await?;
    /// for addr in dump.records {
    ///     println!("{}: {:?}", addr.ifindex(), addr.address);
    /// }
    /// ```
    pub async fn dump_typed<T: FromNetlink>(&self, msg_type: u16) -> Result<Dump<T>> {
        let mut builder = dump_request(msg_type);

        let mut header_buf = Vec::new();
        T::write_dump_header(&mut header_buf);
        builder.append_bytes(&header_buf);

        self.dump_parsed(builder).await
    }

    /// Send a prepared dump request and parse the replies as `T`.
    ///
    /// The builder must already carry the family header.
    pub async fn dump_parsed<T: FromNetlink>(&self, builder: MessageBuilder) -> Result<Dump<T>> {
        let op = operation_name(&builder);
        let replies = exchange(&self.socket, builder, Exchange::Dump, &op, self.timeout).await?;

        let mut dump = Dump {
            interrupted: replies.interrupted,
            ..Default::default()
        };
        for response in replies.messages {
            match parse_response::<T>(&response) {
                Ok(msg) => dump.records.push(msg),
                Err(e) => dump.malformed.push(e.with_context(op.clone())),
            }
        }

        Ok(dump)
    }

    /// Send a prepared do-request and parse its single reply as `T`.
    pub async fn request_parsed<T: FromNetlink>(&self, builder: MessageBuilder) -> Result<T> {
        let op = operation_name(&builder);
        let replies = exchange(&self.socket, builder, Exchange::Do, &op, self.timeout).await?;
        let response = replies
            .messages
            .first()
            .ok_or_else(|| Error::InvalidMessage(format!("{op}: no reply before ACK")))?;
        parse_response(response).map_err(|e| e.with_context(op))
    }
}

fn operation_name(builder: &MessageBuilder) -> String {
    NlMsgType::name(builder.msg_type()).to_string()
}

/// Parse a single full response into a typed message.
pub fn parse_response<T: FromNetlink>(response: &[u8]) -> Result<T> {
    if response.len() < NLMSG_HDRLEN {
        return Err(Error::Truncated {
            expected: NLMSG_HDRLEN,
            actual: response.len(),
        });
    }
    T::from_bytes(&response[NLMSG_HDRLEN..])
}

/// Helper to build a dump request.
pub fn dump_request(msg_type: u16) -> MessageBuilder {
    MessageBuilder::new(msg_type, NLM_F_REQUEST | NLM_F_DUMP)
}

/// Helper to build a do-request that the kernel acknowledges.
pub fn do_request(msg_type: u16) -> MessageBuilder {
    MessageBuilder::new(msg_type, NLM_F_REQUEST | NLM_F_ACK)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::message::NlMsgHdr;
    use crate::netlink::messages::LinkMessage;
    use crate::netlink::types::link::IfInfoMsg;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn test_connection_is_send_sync() {
        assert_send::<Connection>();
        assert_sync::<Connection>();
    }

    #[test]
    fn test_parse_response_truncated() {
        let err = parse_response::<LinkMessage>(&[0u8; 4]).unwrap_err();
        assert!(matches!(err, Error::Truncated { expected: 16, actual: 4 }));
    }

    #[test]
    fn test_parse_response_skips_header() {
        let mut b = MessageBuilder::new(NlMsgType::RTM_GETLINK, 0);
        let mut hdr = IfInfoMsg::new();
        hdr.ifi_index = 4;
        b.append(&hdr);
        b.append_attr_str(crate::netlink::types::link::ifla::IFNAME, "eth1");
        let msg = b.finish();

        let link = parse_response::<LinkMessage>(&msg).unwrap();
        assert_eq!(link.ifindex(), 4);
        assert_eq!(link.name.as_deref(), Some("eth1"));
        assert_eq!(NlMsgHdr::from_bytes(&msg).unwrap().nlmsg_type, NlMsgType::RTM_GETLINK);
    }

    #[test]
    fn test_do_request_flags() {
        let msg = do_request(NlMsgType::RTM_GETLINK).finish();
        let hdr = NlMsgHdr::from_bytes(&msg).unwrap();
        assert_eq!(hdr.nlmsg_flags, NLM_F_REQUEST | NLM_F_ACK);
        assert_eq!(hdr.nlmsg_flags & NLM_F_DUMP, 0);
    }

    #[tokio::test]
    async fn test_timeout_error_shape() {
        let err = timed_out("RTM_GETLINK", Duration::from_millis(250));
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "RTM_GETLINK timed out after 250ms");
    }
}
