//! Status-page HTTP server.
//!
//! A non-blocking `std::net::TcpListener` polled once per loop
//! iteration. Each poll serves at most one client: read up to 1 KiB of
//! request, write the rendered page, close. The request itself is not
//! parsed; every path gets the same page. Errors are logged and the
//! connection dropped; nothing propagates into the loop.

use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use log::{debug, info, warn};

use crate::ledger::DutyLedger;
use crate::status_page;

/// Largest request prefix read before answering.
const MAX_REQUEST: usize = 1024;
/// Per-client socket timeout once accepted.
const CLIENT_TIMEOUT: Duration = Duration::from_millis(500);

pub struct StatusServer {
    listener: TcpListener,
    served: u32,
}

impl StatusServer {
    pub fn bind(port: u16) -> std::io::Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port))?;
        listener.set_nonblocking(true)?;
        info!("HTTP: status page listening on port {}", port);
        Ok(Self {
            listener,
            served: 0,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serve one pending client, if any. Returns `true` when a page was sent.
    pub fn poll(&mut self, ledger: &DutyLedger, last_cleaner: Option<&str>) -> bool {
        let (stream, peer) = match self.listener.accept() {
            Ok(conn) => conn,
            Err(e) if e.kind() == ErrorKind::WouldBlock => return false,
            Err(e) => {
                warn!("HTTP: accept failed: {}", e);
                return false;
            }
        };
        debug!("HTTP: client {}", peer);
        match serve(stream, ledger, last_cleaner) {
            Ok(true) => {
                self.served += 1;
                true
            }
            Ok(false) => false,
            Err(e) => {
                warn!("HTTP: client {} failed: {}", peer, e);
                false
            }
        }
    }

    pub fn served(&self) -> u32 {
        self.served
    }
}

fn serve(
    mut stream: TcpStream,
    ledger: &DutyLedger,
    last_cleaner: Option<&str>,
) -> std::io::Result<bool> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(CLIENT_TIMEOUT))?;
    stream.set_write_timeout(Some(CLIENT_TIMEOUT))?;

    let mut buf = [0u8; MAX_REQUEST];
    let n = stream.read(&mut buf)?;
    if n == 0 {
        return Ok(false);
    }
    stream.write_all(status_page::render(ledger, last_cleaner).as_bytes())?;
    stream.flush()?;
    Ok(true)
}
