//! Length-prefixed chunked framing over a `TcpStream`.
//!
//! Turns an ordered, reliable byte stream into ordered, reliable delimited
//! byte messages of arbitrary positive length. Each chunk is preceded by a
//! 2-byte big-endian header packing a final-chunk flag into the top bit and
//! `length - 1` into the low 15 bits, so a single chunk payload is always in
//! `[1, 32768]` bytes but senders cap at 32767 to keep the length field
//! representable.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use log::debug;

use crate::error::Error;

/// Largest payload a single chunk may carry.
pub const MAX_CHUNK_PAYLOAD: usize = 32767;

const FINAL_FLAG: u16 = 0x8000;
const LENGTH_MASK: u16 = 0x7FFF;

/// A framed duplex byte-message transport over TCP.
///
/// Send and receive each hold their own lock so one thread can be writing
/// while another is reading, but two concurrent senders cannot interleave
/// chunks of different messages, and likewise for two concurrent receivers.
pub struct Connection {
    stream: TcpStream,
    send_lock: Mutex<()>,
    recv_lock: Mutex<()>,
    closed: AtomicBool,
}

impl Connection {
    /// Wrap an already-connected socket.
    pub fn new(stream: TcpStream) -> Self {
        Connection {
            stream,
            send_lock: Mutex::new(()),
            recv_lock: Mutex::new(()),
            closed: AtomicBool::new(false),
        }
    }

    /// Connect to `addr` and wrap the resulting socket.
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, Error> {
        let stream = TcpStream::connect(addr)?;
        Ok(Connection::new(stream))
    }

    /// Send `data` as one or more framed chunks, the last flagged final.
    ///
    /// The whole message is written atomically with respect to other
    /// senders on this connection: the send-lock is held for every chunk.
    pub fn send(&self, data: &[u8]) -> Result<(), Error> {
        if data.is_empty() {
            return Err(Error::EmptyMessage);
        }
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::ConnectionClosed);
        }

        let _guard = self.send_lock.lock().unwrap();
        let mut stream = &self.stream;

        let mut offset = 0;
        while offset < data.len() {
            let remaining = data.len() - offset;
            let chunk_len = remaining.min(MAX_CHUNK_PAYLOAD);
            let is_final = offset + chunk_len == data.len();
            let header = (if is_final { FINAL_FLAG } else { 0 }) | ((chunk_len - 1) as u16);

            stream.write_all(&header.to_be_bytes())?;
            stream.write_all(&data[offset..offset + chunk_len])?;
            offset += chunk_len;
        }
        Ok(())
    }

    /// Receive one framed message: read chunks until a final-flagged one
    /// arrives, and return their concatenated payload.
    pub fn recv(&self) -> Result<Vec<u8>, Error> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(Error::ConnectionClosed);
        }

        let _guard = self.recv_lock.lock().unwrap();
        let mut stream = &self.stream;

        let mut message = Vec::new();
        loop {
            let mut header_buf = [0u8; 2];
            read_exact_or_closed(&mut stream, &mut header_buf)?;
            let header = u16::from_be_bytes(header_buf);
            let is_final = header & FINAL_FLAG != 0;
            let chunk_len = (header & LENGTH_MASK) as usize + 1;

            let mut payload = vec![0u8; chunk_len];
            read_exact_or_closed(&mut stream, &mut payload)?;
            message.extend_from_slice(&payload);

            if is_final {
                return Ok(message);
            }
        }
    }

    /// Close the underlying socket. Idempotent: a second call is a no-op.
    pub fn close(&self) -> Result<(), Error> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        debug!("closing connection");
        match self.stream.shutdown(Shutdown::Both) {
            Ok(()) => Ok(()),
            // The peer may have already torn down the socket; that's not a
            // failure to close on our side.
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            Err(e) => Err(Error::Io(e)),
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

fn read_exact_or_closed(stream: &mut &TcpStream, buf: &mut [u8]) -> Result<(), Error> {
    match stream.read_exact(buf) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(Error::ConnectionClosed),
        Err(e) => Err(Error::Io(e)),
    }
}
