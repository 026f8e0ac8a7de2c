//! Low-level async netlink socket operations.

use std::os::unix::io::{AsRawFd, RawFd};
use std::sync::atomic::{AtomicU32, Ordering};

use bytes::BytesMut;
use netlink_sys::{Socket, SocketAddr, protocols};
use tokio::io::Interest;
use tokio::io::unix::AsyncFd;

use super::error::Result;

/// Minimum receive buffer size. Larger datagrams are sized by peeking.
const RECV_BUF_SIZE: usize = 65536;

/// Buffer capacity for a datagram the kernel reports as `pending` bytes.
fn recv_capacity(pending: usize) -> usize {
    pending.max(RECV_BUF_SIZE)
}

/// Netlink protocol families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    /// Routing/device hook (links, addresses, routes, rules)
    Route,
    /// Generic netlink (ethtool, mptcp_pm)
    Generic,
}

impl Protocol {
    fn as_isize(self) -> isize {
        match self {
            Protocol::Route => protocols::NETLINK_ROUTE,
            Protocol::Generic => protocols::NETLINK_GENERIC,
        }
    }
}

/// Async netlink socket.
///
/// The file descriptor is closed when the socket is dropped, so a collector
/// that owns one releases it on every return path.
pub struct NetlinkSocket {
    fd: AsyncFd<Socket>,
    seq: AtomicU32,
    pid: u32,
    protocol: Protocol,
}

impl NetlinkSocket {
    /// Create a new netlink socket for the given protocol.
    pub fn new(protocol: Protocol) -> Result<Self> {
        let mut socket = Socket::new(protocol.as_isize())?;
        socket.set_non_blocking(true)?;

        // Bind to get a port ID
        let mut addr = SocketAddr::new(0, 0);
        socket.bind(&addr)?;
        socket.get_address(&mut addr)?;
        let pid = addr.port_number();

        // Extended ACK gives better error messages; older kernels lack it
        socket.set_ext_ack(true).ok();

        let fd = AsyncFd::new(socket)?;

        Ok(Self {
            fd,
            seq: AtomicU32::new(1),
            pid,
            protocol,
        })
    }

    /// Get the next sequence number.
    pub fn next_seq(&self) -> u32 {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    /// Get the local port ID.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Get the protocol.
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Send a message.
    pub async fn send(&self, msg: &[u8]) -> Result<()> {
        loop {
            let mut guard = self.fd.ready(Interest::WRITABLE).await?;

            match guard.try_io(|inner| inner.get_ref().send(msg, 0)) {
                Ok(result) => {
                    result?;
                    return Ok(());
                }
                Err(_would_block) => continue,
            }
        }
    }

    /// Receive one datagram, which may carry several netlink messages.
    ///
    /// The datagram is peeked first so that one larger than the default
    /// buffer (a link dump with many VFs) is never truncated.
    pub async fn recv_msg(&self) -> Result<Vec<u8>> {
        loop {
            let mut guard = self.fd.ready(Interest::READABLE).await?;

            let received = guard.try_io(|inner| {
                let socket = inner.get_ref();
                // With MSG_TRUNC the kernel returns the full datagram length.
                let mut peek = BytesMut::with_capacity(64);
                let pending = socket.recv(&mut peek, libc::MSG_PEEK | libc::MSG_TRUNC)?;

                let mut buf = BytesMut::with_capacity(recv_capacity(pending));
                socket.recv(&mut buf, 0)?;
                Ok(buf)
            });
            match received {
                Ok(result) => return Ok(result?.to_vec()),
                Err(_would_block) => continue,
            }
        }
    }
}

impl AsRawFd for NetlinkSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.get_ref().as_raw_fd()
    }
}

impl std::fmt::Debug for NetlinkSocket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetlinkSocket")
            .field("protocol", &self.protocol)
            .field("pid", &self.pid)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recv_capacity_covers_large_datagram() {
        assert_eq!(recv_capacity(0), RECV_BUF_SIZE);
        assert_eq!(recv_capacity(4096), RECV_BUF_SIZE);
        assert_eq!(recv_capacity(200_000), 200_000);
    }

    #[cfg(feature = "integration")]
    #[tokio::test]
    async fn test_recv_full_datagram() {
        use crate::netlink::connection::dump_request;
        use crate::netlink::message::NlMsgType;
        use crate::netlink::types::link::IfInfoMsg;

        let socket = NetlinkSocket::new(Protocol::Route).unwrap();
        let mut builder = dump_request(NlMsgType::RTM_GETLINK);
        builder.append(&IfInfoMsg::new());
        let msg = builder.finish();
        socket.send(&msg).await.unwrap();

        let reply = socket.recv_msg().await.unwrap();
        let len = u32::from_ne_bytes(reply[..4].try_into().unwrap()) as usize;
        assert!(len <= reply.len());
    }
}
