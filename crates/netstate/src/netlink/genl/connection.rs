//! Generic Netlink connection with family resolution.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use super::header::{GENL_HDRLEN, GenlMsgHdr};
use super::{CtrlAttr, CtrlCmd, GENL_ID_CTRL};
use crate::netlink::attr::{AttrIter, get};
use crate::netlink::builder::MessageBuilder;
use crate::netlink::connection::{DEFAULT_TIMEOUT, Exchange, exchange};
use crate::netlink::error::{Error, Result};
use crate::netlink::message::{NLM_F_ACK, NLM_F_DUMP, NLM_F_REQUEST, NLMSG_HDRLEN};
use crate::netlink::socket::{NetlinkSocket, Protocol};

/// Information about a Generic Netlink family.
#[derive(Debug, Clone)]
pub struct FamilyInfo {
    /// Dynamically assigned family ID (used as nlmsg_type).
    pub id: u16,
    /// Family version.
    pub version: u8,
    /// Maximum attribute number.
    pub max_attr: u32,
}

/// Cache for resolved family information.
#[derive(Debug, Default)]
struct FamilyCache {
    families: HashMap<String, FamilyInfo>,
}

/// Generic Netlink connection.
///
/// Family IDs are cached so repeated per-device queries resolve the family
/// once.
///
/// # Example
///
/// ```ignore
/// use netstate::netlink::genl::GenlConnection;
///
/// let conn = GenlConnection::new()?;
/// match conn.get_family("mptcp_pm").await {
///     Ok(family) => println!("mptcp_pm id {}", family.id),
///     Err(e) if e.is_not_found() => println!("MPTCP not available"),
///     Err(e) => return Err(e),
/// }
/// ```
pub struct GenlConnection {
    socket: NetlinkSocket,
    cache: Arc<RwLock<FamilyCache>>,
    timeout: Duration,
}

impl GenlConnection {
    /// Create a new Generic Netlink connection.
    pub fn new() -> Result<Self> {
        Ok(Self {
            socket: NetlinkSocket::new(Protocol::Generic)?,
            cache: Arc::new(RwLock::new(FamilyCache::default())),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Bound every exchange on this connection by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Get information about a Generic Netlink family.
    ///
    /// An unregistered family yields [`Error::FamilyNotFound`].
    pub async fn get_family(&self, name: &str) -> Result<FamilyInfo> {
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(info) = cache.families.get(name) {
                return Ok(info.clone());
            }
        }

        let info = self.query_family(name).await?;

        {
            let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
            cache.families.insert(name.to_string(), info.clone());
        }

        Ok(info)
    }

    /// Query the kernel for family information.
    async fn query_family(&self, name: &str) -> Result<FamilyInfo> {
        let mut builder = MessageBuilder::new(GENL_ID_CTRL, NLM_F_REQUEST | NLM_F_ACK);
        builder.append(&GenlMsgHdr::new(CtrlCmd::GetFamily as u8, 1));
        builder.append_attr_str(CtrlAttr::FamilyName as u16, name);

        let op = format!("CTRL_CMD_GETFAMILY {name}");
        let replies = match exchange(&self.socket, builder, Exchange::Do, &op, self.timeout).await
        {
            Ok(replies) => replies,
            Err(e) if e.errno() == Some(libc::ENOENT) => {
                return Err(Error::FamilyNotFound {
                    name: name.to_string(),
                });
            }
            Err(e) => return Err(e),
        };

        let payload = replies
            .messages
            .first()
            .and_then(|m| m.get(NLMSG_HDRLEN..))
            .ok_or_else(|| Error::FamilyNotFound {
                name: name.to_string(),
            })?;
        if payload.len() < GENL_HDRLEN {
            return Err(Error::InvalidMessage("GENL header too short".into()));
        }

        parse_family_attrs(GenlMsgHdr::attrs(payload))
    }

    /// Send a do-request and return the reply payloads (GENL header included).
    pub async fn request(
        &self,
        family_id: u16,
        cmd: u8,
        version: u8,
        build_attrs: impl FnOnce(&mut MessageBuilder),
    ) -> Result<Vec<Vec<u8>>> {
        let builder = genl_message(family_id, NLM_F_REQUEST | NLM_F_ACK, cmd, version, build_attrs);
        let op = format!("genl family {family_id} cmd {cmd}");
        let replies = exchange(&self.socket, builder, Exchange::Do, &op, self.timeout).await?;
        Ok(strip_headers(replies.messages))
    }

    /// Send a dump request and return the reply payloads (GENL header included).
    pub async fn dump_command(
        &self,
        family_id: u16,
        cmd: u8,
        version: u8,
        build_attrs: impl FnOnce(&mut MessageBuilder),
    ) -> Result<Vec<Vec<u8>>> {
        let builder = genl_message(family_id, NLM_F_REQUEST | NLM_F_DUMP, cmd, version, build_attrs);
        let op = format!("genl family {family_id} dump cmd {cmd}");
        let replies = exchange(&self.socket, builder, Exchange::Dump, &op, self.timeout).await?;
        Ok(strip_headers(replies.messages))
    }
}

fn genl_message(
    family_id: u16,
    flags: u16,
    cmd: u8,
    version: u8,
    build_attrs: impl FnOnce(&mut MessageBuilder),
) -> MessageBuilder {
    let mut builder = MessageBuilder::new(family_id, flags);
    builder.append(&GenlMsgHdr::new(cmd, version));
    build_attrs(&mut builder);
    builder
}

fn strip_headers(messages: Vec<Vec<u8>>) -> Vec<Vec<u8>> {
    messages
        .into_iter()
        .filter_map(|m| m.get(NLMSG_HDRLEN..).map(<[u8]>::to_vec))
        .collect()
}

/// Parse family attributes from a CTRL_CMD_GETFAMILY response.
fn parse_family_attrs(data: &[u8]) -> Result<FamilyInfo> {
    let mut id: Option<u16> = None;
    let mut version: u8 = 0;
    let mut max_attr: u32 = 0;

    for (attr_type, payload) in AttrIter::new(data) {
        match attr_type {
            t if t == CtrlAttr::FamilyId as u16 => id = Some(get::u16_ne(payload)?),
            t if t == CtrlAttr::Version as u16 => version = get::u32_ne(payload)? as u8,
            t if t == CtrlAttr::MaxAttr as u16 => max_attr = get::u32_ne(payload)?,
            _ => {}
        }
    }

    let id = id.ok_or_else(|| Error::InvalidMessage("missing family ID".into()))?;

    Ok(FamilyInfo {
        id,
        version,
        max_attr,
    })
}
