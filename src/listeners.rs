// TCP listener setup, including dual-stack wildcard binding.

use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;

// Binds the server socket. A host of "*" means all interfaces, preferring an
// IPv6 socket with dual-stack enabled so one listener covers v4 and v6.
pub async fn create_listener(
    host: &str,
    port: u16,
) -> std::io::Result<(String, tokio::net::TcpListener)> {
    if host == "*" {
        return bind_wildcard(port);
    }

    let addr = format!("{}:{}", host, port);
    tracing::info!("Binding server to {}...", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    Ok((addr, listener))
}

fn bind_wildcard(port: u16) -> std::io::Result<(String, tokio::net::TcpListener)> {
    match bind_dual_stack(port) {
        Ok(bound) => Ok(bound),
        Err(e) => {
            tracing::warn!("Dual-stack bind failed ({}), falling back to IPv4 only", e);
            bind_socket(format!("0.0.0.0:{}", port), Domain::IPV4, None)
        }
    }
}

fn bind_dual_stack(port: u16) -> std::io::Result<(String, tokio::net::TcpListener)> {
    bind_socket(format!("[::]:{}", port), Domain::IPV6, Some(false))
}

fn bind_socket(
    str_addr: String,
    domain: Domain,
    only_v6: Option<bool>,
) -> std::io::Result<(String, tokio::net::TcpListener)> {
    let addr: SocketAddr = str_addr
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;

    tracing::info!("Binding server to {}...", str_addr);

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    if let Some(v6_only) = only_v6 {
        // Dual-stack mode is best-effort; some systems refuse to change it.
        if let Err(e) = socket.set_only_v6(v6_only) {
            tracing::warn!("Failed to set dual-stack mode for IPv6 socket: {}", e);
        }
    }

    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1024)?;
    socket.set_nonblocking(true)?;

    let std_listener: std::net::TcpListener = socket.into();
    let listener = tokio::net::TcpListener::from_std(std_listener)?;

    Ok((str_addr, listener))
}
