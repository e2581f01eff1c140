//! Two-socket TCP transport: a control connection for SCPI and a data
//! connection for the VRT packet stream.

use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::{instrument, trace, warn};

use crate::config::{self, DEFAULT_CONTROL_TIMEOUT_MS, DEFAULT_DATA_TIMEOUT_MS};
use crate::error::TransportError;

type Result<T> = std::result::Result<T, TransportError>;

/// One TCP connection with a send-retry budget and a configurable recv
/// timeout. The control socket uses one-shot recvs; the data socket loops
/// until the requested byte count has arrived or the timeout elapses.
pub struct Socket {
    stream: TcpStream,
    timeout: Duration,
}

impl Socket {
    fn connect(host: &str, port: u16, timeout: Duration) -> Result<Socket> {
        let addr = (host, port)
            .to_socket_addrs()?
            .next()
            .ok_or(TransportError::SocketDropped)?;
        let stream = TcpStream::connect_timeout(&addr, timeout)?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        Ok(Socket { stream, timeout })
    }

    pub fn set_timeout(&mut self, timeout: Duration) -> Result<()> {
        self.stream.set_read_timeout(Some(timeout))?;
        self.timeout = timeout;
        Ok(())
    }

    /// Single `recv` call into `buf`; returns the number of bytes read.
    /// Zero bytes is treated as a dropped connection.
    #[instrument(skip(self, buf))]
    pub fn recv_once(&mut self, buf: &mut [u8]) -> Result<usize> {
        match self.stream.read(buf) {
            Ok(0) => Err(TransportError::SocketDropped),
            Ok(n) => Ok(n),
            Err(e) if is_timeout(&e) => Err(TransportError::SocketTimeout(self.timeout)),
            Err(e) => Err(TransportError::Io(e)),
        }
    }

    /// Reads until `buf` is completely filled or the timeout elapses.
    #[instrument(skip(self, buf))]
    pub fn recv_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.recv_once(&mut buf[filled..])?;
            filled += n;
        }
        Ok(())
    }

    #[instrument(skip(self, buf))]
    pub fn send(&mut self, buf: &[u8]) -> Result<usize> {
        let mut sent = 0;
        let mut retries = 0;
        while sent < buf.len() {
            match self.stream.write(&buf[sent..]) {
                Ok(n) if n == buf[sent..].len() => return Ok(sent + n),
                Ok(n) => {
                    sent += n;
                    retries += 1;
                    if retries > config::MAX_SEND_RETRIES {
                        return Err(TransportError::SendFailed(retries));
                    }
                    warn!(retries, "short write, retrying");
                }
                Err(e) if is_timeout(&e) => return Err(TransportError::SocketTimeout(self.timeout)),
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
        Ok(sent)
    }

    /// Drains and discards whatever is currently available, up to
    /// `timeout`, used to clear stale packets before a new sweep.
    pub fn flush(&mut self) -> Result<()> {
        let mut scratch = [0u8; 4096];
        loop {
            match self.stream.read(&mut scratch) {
                Ok(0) => return Err(TransportError::SocketDropped),
                Ok(_) => continue,
                Err(e) if is_timeout(&e) => return Ok(()),
                Err(e) => return Err(TransportError::Io(e)),
            }
        }
    }
}

fn is_timeout(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}

/// Owns both sockets for one device connection.
pub struct Transport {
    pub control: Socket,
    pub data: Socket,
}

impl Transport {
    #[instrument(skip_all, fields(host))]
    pub fn connect(host: &str, control_port: u16, data_port: u16) -> Result<Transport> {
        trace!(host, control_port, data_port, "opening transport");
        let control = Socket::connect(
            host,
            control_port,
            Duration::from_millis(DEFAULT_CONTROL_TIMEOUT_MS),
        )?;
        let data = Socket::connect(
            host,
            data_port,
            Duration::from_millis(DEFAULT_DATA_TIMEOUT_MS),
        )?;
        Ok(Transport { control, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    #[test]
    fn send_and_recv_roundtrip() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut buf = [0u8; 5];
            stream.read_exact(&mut buf).unwrap();
            stream.write_all(&buf).unwrap();
        });

        let mut socket = Socket::connect(
            &addr.ip().to_string(),
            addr.port(),
            Duration::from_secs(1),
        )
        .unwrap();
        socket.send(b"hello").unwrap();
        let mut buf = [0u8; 5];
        socket.recv_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");
        handle.join().unwrap();
    }

    #[test]
    fn recv_times_out_when_nothing_sent() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let _keepalive = listener.accept().unwrap();
            thread::sleep(Duration::from_millis(200));
        });

        let mut socket = Socket::connect(
            &addr.ip().to_string(),
            addr.port(),
            Duration::from_millis(50),
        )
        .unwrap();
        let mut buf = [0u8; 1];
        let err = socket.recv_once(&mut buf).unwrap_err();
        assert!(matches!(err, TransportError::SocketTimeout(_)));
        handle.join().unwrap();
    }
}
