//! The chat server: RSA identity, per-client handshake, receive loops, and
//! broadcast fan-out over a shared, lock-guarded client table.

use std::collections::HashMap;
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::sync::{Arc, Mutex, RwLock};
use std::thread;

use log::{info, trace, warn};

use crate::aes::{AesKey, Key};
use crate::error::Error;
use crate::net::{Connection, Session};
use crate::rsa::{generate_keypair, PrivateKey, PublicKey};

const MAX_USERNAME_LEN: usize = 32;

/// Documents the per-connection handshake lifecycle for logging purposes.
/// The accept routine does not persist this as a long-lived object; it is
/// a straight-line function, matching how the handshake reads end to end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HandshakeState {
    New,
    KeysExchanged,
    Authenticated,
    SessionOpen,
    Closed,
}

struct ConnectedClient {
    username: String,
    session: Mutex<Session>,
}

/// A running chat server: one RSA identity, a table of connected clients,
/// and the handshake/forwarding logic that wires new connections into it.
pub struct Server {
    chatname: String,
    private_key: PrivateKey,
    public_key: PublicKey,
    aes_key_bits: usize,
    clients: RwLock<HashMap<String, Arc<ConnectedClient>>>,
}

impl Server {
    /// Create a server with a fresh RSA identity of `rsa_key_bits` bits.
    /// Session keys it hands out to clients are `aes_key_bits` bits (128,
    /// 192, or 256).
    pub fn new(
        chatname: impl Into<String>,
        rsa_key_bits: u32,
        aes_key_bits: usize,
    ) -> Result<Self, Error> {
        let (private_key, public_key) = generate_keypair(rsa_key_bits)?;
        Ok(Server {
            chatname: chatname.into(),
            private_key,
            public_key,
            aes_key_bits,
            clients: RwLock::new(HashMap::new()),
        })
    }

    pub fn chatname(&self) -> &str {
        &self.chatname
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().unwrap().len()
    }

    pub fn has_client(&self, username: &str) -> bool {
        self.clients.read().unwrap().contains_key(username)
    }

    /// Bind `addr` and accept connections forever, spawning one thread per
    /// connection to run its handshake and receive loop.
    pub fn listen(self: &Arc<Self>, addr: impl ToSocketAddrs) -> Result<(), Error> {
        let listener = TcpListener::bind(addr)?;
        for stream in listener.incoming() {
            let stream = stream?;
            let server = Arc::clone(self);
            thread::spawn(move || {
                if let Err(e) = server.accept(stream) {
                    warn!("connection handling ended: {e}");
                }
            });
        }
        Ok(())
    }

    /// Run the handshake for one freshly-accepted TCP connection, then
    /// (on success) run its receive loop until it disconnects.
    pub fn accept(&self, stream: TcpStream) -> Result<(), Error> {
        let connection = Connection::new(stream);
        let mut state = HandshakeState::New;
        trace!("handshake state: {state:?}");

        connection.send(&self.public_key.serialize())?;
        let client_pub_bytes = connection.recv()?;
        let client_public = PublicKey::deserialize(&client_pub_bytes)?;
        state = HandshakeState::KeysExchanged;
        trace!("handshake state: {state:?}");

        let username_cipher = connection.recv()?;
        let username_bytes = self.private_key.decrypt(&username_cipher);
        let username = String::from_utf8(username_bytes)
            .map_err(|e| Error::DecodeError(e.utf8_error()))?;

        if let Err(reason) = self.validate_username(&username) {
            warn!("rejecting handshake for {username:?}: {reason}");
            connection.close()?;
            state = HandshakeState::Closed;
            trace!("handshake state: {state:?}");
            return Err(Error::HandshakeRejected(reason));
        }
        state = HandshakeState::Authenticated;
        trace!("handshake state: {state:?}");

        let key = Key::generate(self.aes_key_bits)?;
        let key_cipher = client_public.encrypt(&key.serialize())?;
        connection.send(&key_cipher)?;

        let mut session = Session::new(connection, key);
        state = HandshakeState::SessionOpen;
        trace!("handshake state: {state:?}");

        self.broadcast(&format!("{username} has joined the chat"));
        session.send(
            format!("{}: Welcome to the chat \"{}\"", self.chatname, self.chatname).as_bytes(),
        )?;

        let client = Arc::new(ConnectedClient {
            username: username.clone(),
            session: Mutex::new(session),
        });
        self.clients
            .write()
            .unwrap()
            .insert(username.clone(), Arc::clone(&client));
        info!("client {username} connected");

        self.receive_loop(&username, &client);
        Ok(())
    }

    fn validate_username(&self, username: &str) -> Result<(), String> {
        let len = username.chars().count();
        if len == 0 || len > MAX_USERNAME_LEN {
            return Err(format!("username length {len} outside 1..={MAX_USERNAME_LEN}"));
        }
        if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err("username contains characters outside [A-Za-z0-9_]".to_string());
        }
        if username == self.chatname {
            return Err("username equals server chatname".to_string());
        }
        if self.has_client(username) {
            return Err("username already connected".to_string());
        }
        Ok(())
    }

    /// Repeatedly receive from `client`'s session and forward to every
    /// other connected client. Removes `client` from the table and closes
    /// its connection on any failure.
    fn receive_loop(&self, username: &str, client: &Arc<ConnectedClient>) {
        loop {
            let received = client.session.lock().unwrap().recv();
            match received {
                Ok(message) => self.forward(username, &message),
                Err(Error::IntegrityFailure) => {
                    warn!("client {username} failed session integrity check");
                    break;
                }
                Err(_) => {
                    info!("client {username} disconnected");
                    break;
                }
            }
        }
        self.remove_client(username);
    }

    fn forward(&self, sender: &str, message: &[u8]) {
        let mut payload = format!("{sender}: ").into_bytes();
        payload.extend_from_slice(message);

        let recipients: Vec<Arc<ConnectedClient>> = {
            let clients = self.clients.read().unwrap();
            clients
                .values()
                .filter(|c| c.username != sender)
                .cloned()
                .collect()
        };
        for recipient in recipients {
            let mut session = recipient.session.lock().unwrap();
            if let Err(e) = session.send(&payload) {
                warn!("forwarding to {} failed: {e}", recipient.username);
            }
        }
    }

    /// Send `"{chatname}: {message}"` to every connected client.
    pub fn broadcast(&self, message: &str) {
        let full_message = format!("{}: {}", self.chatname, message);
        let recipients: Vec<Arc<ConnectedClient>> = {
            let clients = self.clients.read().unwrap();
            clients.values().cloned().collect()
        };
        for recipient in recipients {
            let mut session = recipient.session.lock().unwrap();
            if let Err(e) = session.send(full_message.as_bytes()) {
                warn!("broadcast to {} failed: {e}", recipient.username);
            }
        }
    }

    fn remove_client(&self, username: &str) {
        if let Some(client) = self.clients.write().unwrap().remove(username) {
            let _ = client.session.lock().unwrap().close();
        }
    }
}
