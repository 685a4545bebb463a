use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use anyhow::{Context, Result};
use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::UdpSocket;
use shared::protocol::MULTICAST_TTL;

/// Open the discovery socket: reusable address, TTL 1, ephemeral port on
/// `interface` (or all interfaces), member of `group` on that interface.
///
/// Must be called from within a tokio runtime.
pub fn open_multicast_socket(interface: Option<Ipv4Addr>, group: Ipv4Addr) -> Result<UdpSocket> {
    let iface = interface.unwrap_or(Ipv4Addr::UNSPECIFIED);

    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .context("Failed to create UDP socket")?;
    socket
        .set_reuse_address(true)
        .context("Failed to set SO_REUSEADDR")?;
    socket
        .set_multicast_ttl_v4(MULTICAST_TTL)
        .context("Failed to set IP_MULTICAST_TTL")?;
    if interface.is_some() {
        socket
            .set_multicast_if_v4(&iface)
            .with_context(|| format!("Failed to select multicast interface {}", iface))?;
    }

    let bind_addr = SocketAddr::V4(SocketAddrV4::new(iface, 0));
    socket
        .bind(&bind_addr.into())
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;

    socket
        .join_multicast_v4(&group, &iface)
        .with_context(|| format!("Failed to join multicast group {} on {}", group, iface))?;

    socket
        .set_nonblocking(true)
        .context("Failed to make socket non-blocking")?;

    let socket: std::net::UdpSocket = socket.into();
    UdpSocket::from_std(socket).context("Failed to register socket with runtime")
}
