//! Newline-terminated ASCII SCPI command/query channel over the control
//! socket.

use tracing::{instrument, trace};

use crate::error::{Error, ProtocolError, TransportError, Warning};
use crate::transport::Socket;

/// A parsed query reply: the raw device status and the newline-stripped
/// text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: i64,
    pub text: String,
}

pub struct ScpiChannel<'a> {
    socket: &'a mut Socket,
}

impl<'a> ScpiChannel<'a> {
    pub fn new(socket: &'a mut Socket) -> ScpiChannel<'a> {
        ScpiChannel { socket }
    }

    /// Sends `command`. If it is not a query, follows up with `SYST:ERR?`
    /// and surfaces any reported device error. Returns `Ok(Some(warning))`
    /// for a non-fatal condition (currently only a trigger conflict).
    #[instrument(skip(self))]
    pub fn send(&mut self, command: &str) -> Result<Option<Warning>, Error> {
        let bytes_sent = self.send_raw(command)?;

        if command.contains("DATA?") || command.trim_end().ends_with('?') {
            return Ok(None);
        }

        let err_reply = self.query_raw("SYST:ERR?")?;
        if err_reply.trim().is_empty() || err_reply.trim().eq_ignore_ascii_case("no error") {
            return Ok(None);
        }
        if bytes_sent == 0 {
            return Err(TransportError::QueryNoResponse.into());
        }

        let (code, message) = split_error_reply(&err_reply);
        if message.contains("-221") || code == -221 {
            return Ok(Some(Warning::TriggerConflict));
        }
        Err(ProtocolError::SetFailed {
            command: command.to_string(),
            code,
            message,
        }
        .into())
    }

    /// Sends a query and returns its parsed reply.
    #[instrument(skip(self))]
    pub fn query(&mut self, command: &str) -> Result<Response, Error> {
        let text = self.query_raw(command)?;
        Ok(Response { status: 0, text })
    }

    pub fn query_i64(&mut self, command: &str) -> Result<i64, Error> {
        let reply = self.query(command)?;
        reply
            .text
            .trim()
            .parse()
            .map_err(|_| ProtocolError::RespUnknown(reply.text).into())
    }

    pub fn query_f64(&mut self, command: &str) -> Result<f64, Error> {
        let reply = self.query(command)?;
        reply
            .text
            .trim()
            .parse()
            .map_err(|_| ProtocolError::RespUnknown(reply.text).into())
    }

    fn send_raw(&mut self, command: &str) -> Result<usize, TransportError> {
        let mut buf = command.as_bytes().to_vec();
        if !buf.ends_with(b"\n") {
            buf.push(b'\n');
        }
        trace!(command, "sending SCPI command");
        self.socket.send(&buf)
    }

    fn query_raw(&mut self, command: &str) -> Result<String, TransportError> {
        self.send_raw(command)?;
        let mut buf = [0u8; 4096];
        let n = self.socket.recv_once(&mut buf)?;
        let text = String::from_utf8_lossy(&buf[..n]).trim().to_string();
        Ok(text)
    }
}

/// Splits a `code,message` `SYST:ERR?` reply. Malformed replies get code 0
/// and the full text as the message.
fn split_error_reply(reply: &str) -> (i32, String) {
    match reply.split_once(',') {
        Some((code, message)) => (
            code.trim().parse().unwrap_or(0),
            message.trim().trim_matches('"').to_string(),
        ),
        None => (0, reply.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_error_code_and_message() {
        let (code, message) = split_error_reply("-221,\"Settings conflict\"");
        assert_eq!(code, -221);
        assert_eq!(message, "Settings conflict");
    }

    #[test]
    fn malformed_error_reply_keeps_full_text() {
        let (code, message) = split_error_reply("garbage");
        assert_eq!(code, 0);
        assert_eq!(message, "garbage");
    }
}
