//! The chat client: connects, runs the handshake against a server, and
//! exposes a session to send and receive chat lines over.

use std::net::ToSocketAddrs;

use log::debug;

use crate::aes::Key;
use crate::error::Error;
use crate::net::{Connection, Session};
use crate::rsa::{generate_keypair, PublicKey};

pub struct Client {
    session: Session,
}

impl Client {
    /// Connect to `addr` and run the client side of the handshake, using a
    /// freshly generated `rsa_key_bits`-bit RSA identity and `username`.
    pub fn connect(
        addr: impl ToSocketAddrs,
        username: &str,
        rsa_key_bits: u32,
    ) -> Result<Self, Error> {
        let connection = Connection::connect(addr)?;

        let server_pub_bytes = connection.recv()?;
        let server_public = PublicKey::deserialize(&server_pub_bytes)?;

        let (private_key, public_key) = generate_keypair(rsa_key_bits)?;
        connection.send(&public_key.serialize())?;

        let username_cipher = server_public.encrypt(username.as_bytes())?;
        connection.send(&username_cipher)?;

        let key_cipher = connection.recv()?;
        let key_bytes = private_key.decrypt(&key_cipher);
        let key = Key::deserialize(&key_bytes)?;

        debug!("connected to chat server as {username}");
        Ok(Client {
            session: Session::new(connection, key),
        })
    }

    /// Send a chat line over the session.
    pub fn send(&mut self, message: &str) -> Result<(), Error> {
        self.session.send(message.as_bytes())
    }

    /// Receive one chat line from the session.
    pub fn recv(&mut self) -> Result<String, Error> {
        let bytes = self.session.recv()?;
        String::from_utf8(bytes).map_err(|e| Error::DecodeError(e.utf8_error()))
    }

    /// Close the underlying connection.
    pub fn disconnect(&self) -> Result<(), Error> {
        self.session.close()
    }
}
