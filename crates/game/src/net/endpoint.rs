use std::cell::Cell;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, ToSocketAddrs, UdpSocket};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::protocol::PACKET_SIZE;
use super::stats::NetworkStats;
use super::transport::Transport;

const RECV_BUFFER_SIZE: usize = 1500;

/// Non-blocking UDP socket shared by every peer in the multicast group.
/// Senders cloned from it count into the same stats.
pub struct NetworkEndpoint {
    socket: UdpSocket,
    local_addr: SocketAddr,
    stats: Rc<Cell<NetworkStats>>,
    recv_buffer: [u8; RECV_BUFFER_SIZE],
    running: Arc<AtomicBool>,
}

impl NetworkEndpoint {
    pub fn bind<A: ToSocketAddrs>(addr: A) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr)?;
        socket.set_nonblocking(true)?;

        let local_addr = socket.local_addr()?;

        Ok(Self {
            socket,
            local_addr,
            stats: Rc::default(),
            recv_buffer: [0u8; RECV_BUFFER_SIZE],
            running: Arc::new(AtomicBool::new(true)),
        })
    }

    /// Joins `group` on every interface. Our own datagrams loop back so
    /// several peers can share one host; the registry drops its own.
    pub fn join_multicast(&mut self, group: Ipv4Addr, ttl: u32) -> io::Result<()> {
        self.socket.join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)?;
        self.socket.set_multicast_ttl_v4(ttl)?;
        self.socket.set_multicast_loop_v4(true)?;
        Ok(())
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn stats(&self) -> NetworkStats {
        self.stats.get()
    }

    /// A sending handle with a fixed destination, normally the group address
    /// on our port.
    pub fn sender_to(&self, dest: SocketAddr) -> io::Result<UdpSender> {
        Ok(UdpSender {
            socket: self.socket.try_clone()?,
            dest,
            stats: Rc::clone(&self.stats),
        })
    }

    pub fn group_sender(&self, group: Ipv4Addr) -> io::Result<UdpSender> {
        let dest = SocketAddr::V4(SocketAddrV4::new(group, self.local_addr.port()));
        self.sender_to(dest)
    }

    /// Drains every datagram currently queued on the socket.
    pub fn receive(&mut self) -> io::Result<Vec<(Vec<u8>, SocketAddr)>> {
        let mut datagrams = Vec::new();

        loop {
            match self.socket.recv_from(&mut self.recv_buffer) {
                Ok((size, addr)) => {
                    if size != PACKET_SIZE {
                        log::trace!("ignoring {} byte datagram from {}", size, addr);
                        continue;
                    }

                    let mut stats = self.stats.get();
                    stats.packets_received += 1;
                    stats.bytes_received += size as u64;
                    self.stats.set(stats);
                    datagrams.push((self.recv_buffer[..size].to_vec(), addr));
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e),
            }
        }

        Ok(datagrams)
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug)]
pub struct UdpSender {
    socket: UdpSocket,
    dest: SocketAddr,
    stats: Rc<Cell<NetworkStats>>,
}

impl UdpSender {
    pub fn dest(&self) -> SocketAddr {
        self.dest
    }
}

impl Transport for UdpSender {
    fn send(&mut self, data: &[u8]) -> io::Result<usize> {
        match self.socket.send_to(data, self.dest) {
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                log::debug!("send buffer full, dropping datagram to {}", self.dest);
                Ok(0)
            }
            Ok(bytes) => {
                let mut stats = self.stats.get();
                stats.packets_sent += 1;
                stats.bytes_sent += bytes as u64;
                self.stats.set(stats);
                Ok(bytes)
            }
            Err(e) => Err(e),
        }
    }
}
