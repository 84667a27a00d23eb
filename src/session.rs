//! Session identity and the per-connection forwarding actor.
//!
//! A session is one client connection. The rest of the server knows it
//! by its [`SessionId`] and talks to it through its [`SessionHandle`],
//! an mpsc sender feeding the connection's write loop. Registration
//! state ([`UserInfo`]) lives in the router's session table, not here:
//! the router task is its single writer.

use std::sync::atomic::{AtomicU64, Ordering};

use pirc_proto::{Command, Message};
use tokio::sync::mpsc;
use tracing::debug;

use crate::router::RouterHandle;

/// Unique identifier for a client session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

impl SessionId {
    /// Allocate the next id. Never reused within a process lifetime.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        SessionId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Handle to a session's outbound inbox.
///
/// Cloneable; the router stores one per directory entry. Delivery
/// blocks on a full inbox (bounded-queue backpressure) and silently
/// drops the message if the connection is already gone.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    /// The session this handle belongs to.
    pub id: SessionId,
    tx: mpsc::Sender<Message>,
}

impl SessionHandle {
    /// Pair a new handle with the receiving end of its inbox.
    pub fn new(id: SessionId, capacity: usize) -> (Self, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { id, tx }, rx)
    }

    /// Queue a message for the session's write loop.
    pub async fn deliver(&self, msg: Message) {
        if self.tx.send(msg).await.is_err() {
            debug!(session = %self.id, "dropping message for closed session");
        }
    }
}

/// Registration details supplied by NICK and USER.
#[derive(Clone, Debug, Default)]
pub struct UserInfo {
    /// Current nickname, empty until NICK is seen.
    pub nick: String,
    /// Username from USER, empty until seen.
    pub username: String,
    /// Hostname from USER.
    pub hostname: String,
    /// Server name from USER.
    pub servername: String,
    /// Real name from USER.
    pub realname: String,
}

/// A client command paired with the session it came from.
#[derive(Clone, Debug)]
pub struct Envelope {
    /// The parsed command.
    pub message: Message,
    /// Originating session.
    pub from: SessionId,
}

/// The forwarding half of a session: reads parsed messages from the
/// connection's read loop and submits them to the router.
pub struct Session {
    id: SessionId,
    incoming: mpsc::Receiver<Message>,
    router: RouterHandle,
}

impl Session {
    /// Build the forwarding actor for one connection.
    pub fn new(id: SessionId, incoming: mpsc::Receiver<Message>, router: RouterHandle) -> Self {
        Self {
            id,
            incoming,
            router,
        }
    }

    /// Forward messages until the read loop closes or QUIT is sent.
    pub async fn run(mut self) {
        while let Some(mut message) = self.incoming.recv().await {
            // Clients do not get to claim an origin; the router stamps
            // the authentic one when relaying.
            message.prefix = None;

            let quitting = message.command == Command::Quit;
            debug!(session = %self.id, command = %message.command, "forwarding");

            let envelope = Envelope {
                message,
                from: self.id,
            };
            if self.router.submit(envelope).await.is_err() {
                break;
            }
            if quitting {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::Router;

    #[test]
    fn test_session_ids_are_unique() {
        let a = SessionId::next();
        let b = SessionId::next();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_deliver_to_closed_inbox_is_silent() {
        let (handle, rx) = SessionHandle::new(SessionId::next(), 4);
        drop(rx);
        // Must not panic or error.
        handle
            .deliver(Message::new(Command::Quit, Vec::new()))
            .await;
    }

    #[tokio::test]
    async fn test_forwarding_strips_spoofed_prefix_and_stops_on_quit() {
        let (router_handle, router) = Router::new("irc.test.net");
        tokio::spawn(router.run());

        // The session under test.
        let id = SessionId::next();
        let (handle, mut inbox) = SessionHandle::new(id, 16);
        router_handle.attach(handle).await;
        let (tx, rx) = mpsc::channel(16);
        let task = tokio::spawn(Session::new(id, rx, router_handle.clone()).run());

        // A registered peer to receive the relayed message.
        let peer = SessionId::next();
        let (peer_handle, mut peer_inbox) = SessionHandle::new(peer, 16);
        router_handle.attach(peer_handle).await;
        for line in ["NICK bob", "USER b h s :Bob"] {
            router_handle
                .submit(Envelope {
                    message: Message::parse(line).unwrap(),
                    from: peer,
                })
                .await
                .unwrap();
        }
        peer_inbox.recv().await.unwrap(); // welcome

        for line in ["NICK alice", "USER a h s :Alice"] {
            tx.send(Message::parse(line).unwrap()).await.unwrap();
        }
        inbox.recv().await.unwrap(); // welcome

        // A forged origin is discarded; the router stamps the real one.
        tx.send(Message::parse(":bob!x@y PRIVMSG bob :hi").unwrap())
            .await
            .unwrap();
        let relayed = peer_inbox.recv().await.unwrap();
        assert_eq!(relayed.prefix.as_ref().and_then(|p| p.nick()), Some("alice"));

        // QUIT ends the forwarding loop.
        tx.send(Message::parse("QUIT").unwrap()).await.unwrap();
        task.await.unwrap();
    }

    #[tokio::test]
    async fn test_deliver_preserves_order() {
        let (handle, mut rx) = SessionHandle::new(SessionId::next(), 8);
        for text in ["one", "two", "three"] {
            handle
                .deliver(Message::new(
                    Command::Privmsg,
                    vec!["bob".into(), text.into()],
                ))
                .await;
        }
        for text in ["one", "two", "three"] {
            let msg = rx.recv().await.unwrap();
            assert_eq!(msg.args[1], text);
        }
    }
}
