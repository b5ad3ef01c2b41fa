// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Socket convenience words: `udp(port)`, `tcp(port)`, and the `network::<T>()`
//! trigger for bridge-delivered values.

use super::{BindCtx, Word};
use crate::{io::Ready,
            plant::{BindError, FromNetwork, Handle},
            util::tidy_type_name};
use std::{any::TypeId,
          fmt,
          marker::PhantomData,
          net::SocketAddr,
          os::fd::AsRawFd,
          sync::Arc};

/// One received datagram.
#[derive(Clone, Debug)]
pub struct UdpPacket {
    pub peer: SocketAddr,
    pub data: Vec<u8>,
}

/// Binds a UDP socket at construction and schedules the reaction per received
/// datagram.
///
/// Port `0` binds an ephemeral port; read it back with [`Udp::local_port`] before
/// handing the word to `on(...)`. Clones share the socket; it closes when the last
/// owner is dropped.
#[derive(Clone, Debug)]
pub struct Udp {
    socket: Arc<mio::net::UdpSocket>,
    local_port: u16,
}

/// See [`Udp`].
pub fn udp(port: u16) -> Result<Udp, BindError> {
    let socket = std::net::UdpSocket::bind(("0.0.0.0", port)).map_err(|source| {
        BindError::Socket { word: "udp", operation: "bind the socket", source }
    })?;
    socket.set_nonblocking(true).map_err(|source| BindError::Socket {
        word: "udp",
        operation: "set the socket non-blocking",
        source,
    })?;
    let local_port = socket
        .local_addr()
        .map_err(|source| BindError::Socket {
            word: "udp",
            operation: "read the bound address",
            source,
        })?
        .port();
    Ok(Udp { socket: Arc::new(mio::net::UdpSocket::from_std(socket)), local_port })
}

impl Udp {
    /// The actually-bound port (useful with port `0`).
    #[must_use]
    pub fn local_port(&self) -> u16 { self.local_port }
}

impl Word for Udp {
    type Args = UdpPacket;

    fn bind(&self, ctx: &mut BindCtx<'_>) -> Result<(), BindError> {
        ctx.register_io(self.socket.as_raw_fd(), Ready::READABLE)
    }

    fn fetch(&self, _handle: &Handle) -> Option<UdpPacket> {
        // Most MTUs sit around 1500; 2 KiB covers ordinary datagrams.
        let mut buffer = [0_u8; 2048];
        match self.socket.recv_from(&mut buffer) {
            Ok((len, peer)) => Some(UdpPacket { peer, data: buffer[..len].to_vec() }),
            Err(error) if error.kind() == std::io::ErrorKind::WouldBlock => None,
            Err(error) => {
                tracing::warn!(port = self.local_port, %error, "udp receive failed");
                None
            }
        }
    }

    fn arg_types(&self, out: &mut Vec<&'static str>) {
        out.push(std::any::type_name::<UdpPacket>());
    }
}

/// One accepted TCP connection.
#[derive(Debug)]
pub struct TcpConnection {
    pub stream: mio::net::TcpStream,
    pub peer: SocketAddr,
}

/// Binds a TCP listener at construction and schedules the reaction per accepted
/// connection.
#[derive(Clone, Debug)]
pub struct Tcp {
    listener: Arc<mio::net::TcpListener>,
    local_port: u16,
}

/// See [`Tcp`].
pub fn tcp(port: u16) -> Result<Tcp, BindError> {
    let listener = std::net::TcpListener::bind(("0.0.0.0", port)).map_err(|source| {
        BindError::Socket { word: "tcp", operation: "bind the listener", source }
    })?;
    listener.set_nonblocking(true).map_err(|source| BindError::Socket {
        word: "tcp",
        operation: "set the listener non-blocking",
        source,
    })?;
    let local_port = listener
        .local_addr()
        .map_err(|source| BindError::Socket {
            word: "tcp",
            operation: "read the bound address",
            source,
        })?
        .port();
    Ok(Tcp {
        listener: Arc::new(mio::net::TcpListener::from_std(listener)),
        local_port,
    })
}

impl Tcp {
    /// The actually-bound port (useful with port `0`).
    #[must_use]
    pub fn local_port(&self) -> u16 { self.local_port }
}

impl Word for Tcp {
    type Args = TcpConnection;

    fn bind(&self, ctx: &mut BindCtx<'_>) -> Result<(), BindError> {
        ctx.register_io(self.listener.as_raw_fd(), Ready::READABLE)
    }

    fn fetch(&self, _handle: &Handle) -> Option<TcpConnection> {
        match self.listener.accept() {
            Ok((stream, peer)) => Some(TcpConnection { stream, peer }),
            Err(error) if error.kind() == std::io::ErrorKind::WouldBlock => None,
            Err(error) => {
                tracing::warn!(port = self.local_port, %error, "tcp accept failed");
                None
            }
        }
    }

    fn arg_types(&self, out: &mut Vec<&'static str>) {
        out.push(std::any::type_name::<TcpConnection>());
    }
}

/// Schedules the reaction when the network bridge delivers a `T` (wrapped in
/// [`FromNetwork`]).
pub struct Network<T> {
    _type: PhantomData<fn() -> T>,
}

/// See [`Network`].
#[must_use]
pub fn network<T: Send + Sync + 'static>() -> Network<T> { Network { _type: PhantomData } }

impl<T: Send + Sync + 'static> Word for Network<T> {
    type Args = Arc<FromNetwork<T>>;

    fn bind(&self, ctx: &mut BindCtx<'_>) -> Result<(), BindError> {
        ctx.subscribe::<FromNetwork<T>>()
    }

    fn fetch(&self, handle: &Handle) -> Option<Arc<FromNetwork<T>>> {
        handle.get::<FromNetwork<T>>()
    }

    fn trigger_types(&self, out: &mut Vec<(TypeId, &'static str)>) {
        out.push((
            TypeId::of::<FromNetwork<T>>(),
            std::any::type_name::<FromNetwork<T>>(),
        ));
    }

    fn arg_types(&self, out: &mut Vec<&'static str>) {
        out.push(std::any::type_name::<T>());
    }
}

impl<T> fmt::Debug for Network<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "network::<{}>", tidy_type_name(std::any::type_name::<T>()))
    }
}
