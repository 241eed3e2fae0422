//! Socket level probes
//!
//! [`ConnectProber`] answers "does this remote endpoint accept a TCP
//! connection?" and [`BindProber`] answers "is this local port already
//! taken?". Neither reports errors: every failure mode collapses into the
//! boolean result.

use crate::target::Endpoint;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;

/// TCP connect prober for remote endpoints
#[derive(Debug, Clone)]
pub struct ConnectProber {
    timeout: Duration,
}

impl ConnectProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Race a connect attempt against the timeout.
    ///
    /// Returns `true` only if the connection is established first. Refused
    /// connections, DNS failures and timeouts all yield `false`. On timeout
    /// the pending connect is dropped, which closes its socket.
    pub async fn probe(&self, endpoint: &Endpoint) -> bool {
        let start = Instant::now();

        let connect = TcpStream::connect((endpoint.host.as_str(), endpoint.port));
        let reachable = match tokio::time::timeout(self.timeout, connect).await {
            Ok(Ok(stream)) => {
                // close right away, nothing is sent
                drop(stream);
                true
            }
            Ok(Err(e)) => {
                log::debug!("Connect to {} failed: {}", endpoint, e);
                false
            }
            Err(_) => {
                log::debug!("Connect to {} timed out after {:?}", endpoint, self.timeout);
                false
            }
        };

        log::debug!(
            "{} -> {} in {:?}",
            endpoint,
            if reachable { "open" } else { "closed" },
            start.elapsed()
        );
        reachable
    }
}

/// Bind prober for local ports
#[derive(Debug, Clone)]
pub struct BindProber {
    address: Ipv4Addr,
    timeout: Duration,
}

impl BindProber {
    /// Create a prober that binds on `address`; `timeout` guards a stalled bind
    pub fn new(address: Ipv4Addr, timeout: Duration) -> Self {
        Self { address, timeout }
    }

    /// Try to claim `port` on the local address.
    ///
    /// Returns `false` when the bind succeeds (port free) and `true` when it
    /// fails for any reason, permission errors included. The socket is
    /// closed before this returns on the success path.
    pub async fn probe(&self, port: u16) -> bool {
        let addr = SocketAddr::new(IpAddr::V4(self.address), port);
        self.guarded(addr, move || try_bind(addr)).await
    }

    /// Run a blocking bind attempt on the blocking pool under the timeout.
    ///
    /// Only a completed, successful attempt reads as free.
    async fn guarded<F>(&self, addr: SocketAddr, attempt: F) -> bool
    where
        F: FnOnce() -> io::Result<()> + Send + 'static,
    {
        let task = tokio::task::spawn_blocking(attempt);

        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(Ok(()))) => {
                log::debug!("{} -> free", addr);
                false
            }
            Ok(Ok(Err(e))) => {
                log::debug!("{} -> in use ({})", addr, e);
                true
            }
            // panicked or cancelled
            Ok(Err(e)) => {
                log::warn!("Bind task for {} failed: {}", addr, e);
                true
            }
            // the blocking task keeps running; its socket closes when it finishes
            Err(_) => {
                log::warn!("Bind on {} did not complete within {:?}", addr, self.timeout);
                true
            }
        }
    }
}

/// Bind and listen on `addr`, releasing the socket before returning.
///
/// `SO_REUSEADDR` is set so that connections lingering in `TIME_WAIT` do not
/// count as an occupied port; an active listener still makes the bind fail.
fn try_bind(addr: SocketAddr) -> io::Result<()> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    // TIME_WAIT leftovers
    socket.set_reuse_address(true)?;
    socket.bind(&addr.into())?;
    socket.listen(1)?;
    drop(socket);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[tokio::test]
    async fn test_connect_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let prober = ConnectProber::new(Duration::from_millis(1000));
        assert!(prober.probe(&Endpoint::new("127.0.0.1", port)).await);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let prober = ConnectProber::new(Duration::from_millis(1000));
        assert!(!prober.probe(&Endpoint::new("127.0.0.1", port)).await);
    }

    #[tokio::test]
    async fn test_bind_free_and_taken() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let prober = BindProber::new(Ipv4Addr::LOCALHOST, Duration::from_millis(500));
        assert!(prober.probe(port).await);

        drop(listener);
        assert!(!prober.probe(port).await);
        // the probe released the port again
        assert!(TcpListener::bind(("127.0.0.1", port)).is_ok());
    }

    #[tokio::test]
    async fn test_stalled_bind_reads_as_taken() {
        let prober = BindProber::new(Ipv4Addr::LOCALHOST, Duration::from_millis(20));
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9);

        let start = Instant::now();
        let taken = prober
            .guarded(addr, || {
                std::thread::sleep(Duration::from_millis(300));
                Ok(())
            })
            .await;

        assert!(taken);
        // returned at the guard, not when the attempt finished
        assert!(start.elapsed() < Duration::from_millis(300));
    }

    #[tokio::test]
    async fn test_failed_bind_task_reads_as_taken() {
        let prober = BindProber::new(Ipv4Addr::LOCALHOST, Duration::from_millis(500));
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9);

        let taken = prober
            .guarded(addr, || -> io::Result<()> { panic!("bind attempt aborted") })
            .await;
        assert!(taken);
    }

    #[tokio::test]
    async fn test_guard_passes_attempt_result_through() {
        let prober = BindProber::new(Ipv4Addr::LOCALHOST, Duration::from_millis(500));
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 9);

        assert!(!prober.guarded(addr, || Ok(())).await);
        assert!(
            prober
                .guarded(addr, || Err(io::Error::from(io::ErrorKind::AddrInUse)))
                .await
        );
    }

    #[test]
    fn test_try_bind_releases_socket() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port);

        assert!(try_bind(addr).is_ok());
        assert!(try_bind(addr).is_ok());
    }
}
