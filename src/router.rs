//! The router actor.
//!
//! One router task owns every shared directory: session records, the
//! nick-to-inbox map, and channel memberships. Nothing else reads or
//! writes them; the rest of the server talks to the router through its
//! bounded event queue. Replies and relayed traffic leave through the
//! per-session inbox handles.

use std::collections::{HashMap, HashSet};

use pirc_proto::{Command, Message, Prefix, Response};
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::session::{Envelope, SessionHandle, SessionId, UserInfo};

/// Router inbox depth. Submitting past this blocks the sender, which
/// is the designed backpressure point for misbehaving clients.
const EVENT_QUEUE_DEPTH: usize = 128;

/// Events accepted by the router task.
pub enum RouterEvent {
    /// A freshly accepted connection's inbox handle.
    Attach(SessionHandle),
    /// A client command.
    Command(Envelope),
    /// Connection teardown; same cleanup as QUIT, then the record goes.
    Detach(SessionId),
}

/// The router task has stopped and no longer accepts events.
#[derive(Debug, Error)]
#[error("router is gone")]
pub struct RouterClosed;

/// Cloneable sender half of the router's event queue.
#[derive(Clone)]
pub struct RouterHandle {
    tx: mpsc::Sender<RouterEvent>,
}

impl RouterHandle {
    /// Register a new session with the router.
    pub async fn attach(&self, handle: SessionHandle) {
        let _ = self.tx.send(RouterEvent::Attach(handle)).await;
    }

    /// Submit a client command for dispatch.
    pub async fn submit(&self, envelope: Envelope) -> Result<(), RouterClosed> {
        self.tx
            .send(RouterEvent::Command(envelope))
            .await
            .map_err(|_| RouterClosed)
    }

    /// Tear a session out of every directory.
    pub async fn detach(&self, id: SessionId) {
        let _ = self.tx.send(RouterEvent::Detach(id)).await;
    }
}

/// Per-session state, owned by the router task.
struct SessionRecord {
    handle: SessionHandle,
    user: UserInfo,
    /// True once the welcome has been sent; never sent twice.
    registered: bool,
    /// Channels this session has joined, for rename and cleanup.
    channels: HashSet<String>,
}

/// A chat channel: members keyed by nick.
struct Channel {
    name: String,
    members: HashMap<String, SessionHandle>,
}

impl Channel {
    fn new(name: String) -> Self {
        Self {
            name,
            members: HashMap::new(),
        }
    }
}

/// The directory-owning actor. Built with [`Router::new`], driven by
/// [`Router::run`] on its own task.
pub struct Router {
    server_name: String,
    events: mpsc::Receiver<RouterEvent>,
    sessions: HashMap<SessionId, SessionRecord>,
    direct: HashMap<String, SessionHandle>,
    channels: HashMap<String, Channel>,
}

/// Stamp a reply with the server's own origin.
fn stamp(server_name: &str, msg: Message) -> Message {
    msg.with_prefix(Prefix::ServerName(server_name.to_string()))
}

/// The origin stamped onto relayed client traffic. A session that has
/// not yet picked a nick relays with no origin at all.
fn origin(user: &UserInfo) -> Option<Prefix> {
    if user.nick.is_empty() {
        None
    } else {
        Some(Prefix::Nickname(
            user.nick.clone(),
            user.username.clone(),
            user.hostname.clone(),
        ))
    }
}

impl Router {
    /// Create the router and the handle used to reach it.
    pub fn new(server_name: impl Into<String>) -> (RouterHandle, Router) {
        let (tx, events) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let router = Router {
            server_name: server_name.into(),
            events,
            sessions: HashMap::new(),
            direct: HashMap::new(),
            channels: HashMap::new(),
        };
        (RouterHandle { tx }, router)
    }

    /// Event loop. Runs until every handle is dropped.
    pub async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            match event {
                RouterEvent::Attach(handle) => self.handle_attach(handle),
                RouterEvent::Command(envelope) => self.handle_command(envelope).await,
                RouterEvent::Detach(id) => self.handle_detach(id),
            }
        }
        info!("router stopped");
    }

    fn handle_attach(&mut self, handle: SessionHandle) {
        debug!(session = %handle.id, "session attached");
        self.sessions.insert(
            handle.id,
            SessionRecord {
                handle,
                user: UserInfo::default(),
                registered: false,
                channels: HashSet::new(),
            },
        );
    }

    async fn handle_command(&mut self, envelope: Envelope) {
        let Envelope { message, from } = envelope;
        if !self.sessions.contains_key(&from) {
            debug!(session = %from, "command from detached session");
            return;
        }
        match &message.command {
            Command::Nick | Command::User => self.handle_registration(from, &message).await,
            Command::Privmsg => self.handle_privmsg(from, &message).await,
            Command::Join => self.handle_join(from, &message).await,
            Command::Names => self.handle_names(from, &message).await,
            Command::Ping => self.handle_ping(from, &message).await,
            Command::Quit => self.cleanup_directories(from),
            Command::Pong => debug!(session = %from, "ignoring PONG"),
            Command::Reply(resp) => {
                debug!(session = %from, code = resp.code(), "ignoring numeric from client");
            }
            Command::Unknown(raw) => {
                debug!(session = %from, command = %raw, "command not handled");
            }
        }
    }

    /// NICK and USER share a tail: once both a nick and a username are
    /// on file, the session claims its nick in the direct map and gets
    /// welcomed exactly once.
    async fn handle_registration(&mut self, from: SessionId, message: &Message) {
        let mut outgoing: Vec<Message> = Vec::new();
        let Some(record) = self.sessions.get_mut(&from) else {
            return;
        };

        match &message.command {
            Command::Nick => {
                let Some(new_nick) = message.args.first() else {
                    debug!(session = %from, "NICK without a nickname");
                    return;
                };
                if record.registered {
                    // Rename: re-key the direct entry and every
                    // channel membership to the new nick.
                    self.direct.remove(&record.user.nick);
                    for name in &record.channels {
                        if let Some(channel) = self.channels.get_mut(name) {
                            if let Some(handle) = channel.members.remove(&record.user.nick) {
                                channel.members.insert(new_nick.clone(), handle);
                            }
                        }
                    }
                    debug!(session = %from, old = %record.user.nick, new = %new_nick, "nick change");
                }
                record.user.nick = new_nick.clone();
            }
            Command::User => {
                if message.args.len() < 4 {
                    let reply = stamp(&self.server_name, Response::err_needmoreparams("USER"));
                    record.handle.deliver(reply).await;
                    return;
                }
                record.user.username = message.args[0].clone();
                record.user.hostname = message.args[1].clone();
                record.user.servername = message.args[2].clone();
                record.user.realname = message.args[3].clone();
            }
            _ => return,
        }

        if !record.user.nick.is_empty() && !record.user.username.is_empty() {
            let nick = record.user.nick.clone();
            if self.direct.contains_key(&nick) {
                outgoing.push(stamp(&self.server_name, Response::err_alreadyregistred()));
            }
            // The entry is replaced even after the rebuke: the newer
            // claimant takes the nick over. Historical behavior, kept.
            self.direct.insert(nick.clone(), record.handle.clone());
            if !record.registered {
                record.registered = true;
                outgoing.push(stamp(&self.server_name, Response::rpl_welcome(&nick)));
                info!(session = %from, nick = %nick, "session registered");
            }
        }

        let handle = record.handle.clone();
        for msg in outgoing {
            handle.deliver(msg).await;
        }
    }

    async fn handle_privmsg(&mut self, from: SessionId, message: &Message) {
        let Some(record) = self.sessions.get(&from) else {
            return;
        };
        let Some(target) = message.args.first().filter(|t| !t.is_empty()) else {
            debug!(session = %from, "PRIVMSG without a target");
            return;
        };

        let mut relay = message.clone();
        relay.prefix = origin(&record.user);

        if target.starts_with('#') {
            if let Some(channel) = self.channels.get(target.as_str()) {
                for (nick, handle) in &channel.members {
                    if nick != &record.user.nick {
                        handle.deliver(relay.clone()).await;
                    }
                }
                return;
            }
        } else if let Some(handle) = self.direct.get(target.as_str()) {
            handle.deliver(relay).await;
            return;
        }

        let reply = stamp(&self.server_name, Response::err_nosuchnick(target));
        record.handle.deliver(reply).await;
    }

    /// JOIN echoes to the joiner only (members learn of newcomers via
    /// NAMES), then sends topic and the member listing.
    async fn handle_join(&mut self, from: SessionId, message: &Message) {
        let Some(channel_name) = message.args.first().filter(|t| !t.is_empty()).cloned() else {
            debug!(session = %from, "JOIN without a channel");
            return;
        };
        let Some(record) = self.sessions.get_mut(&from) else {
            return;
        };
        let nick = record.user.nick.clone();
        if !self.direct.contains_key(&nick) {
            debug!(session = %from, channel = %channel_name, "JOIN before registration");
        }

        let channel = self
            .channels
            .entry(channel_name.clone())
            .or_insert_with(|| Channel::new(channel_name.clone()));
        channel.members.insert(nick.clone(), record.handle.clone());
        record.channels.insert(channel_name.clone());
        info!(session = %from, nick = %nick, channel = %channel.name, "joined");

        let mut nicks: Vec<String> = channel.members.keys().cloned().collect();
        nicks.sort();

        let mut echo = message.clone();
        echo.prefix = origin(&record.user);
        let handle = record.handle.clone();

        handle.deliver(echo).await;
        // No topic storage: the channel's name doubles as its topic.
        handle
            .deliver(stamp(
                &self.server_name,
                Response::rpl_topic(&nick, &channel_name, &channel_name),
            ))
            .await;
        handle
            .deliver(stamp(
                &self.server_name,
                Response::rpl_namreply(&channel_name, &nicks),
            ))
            .await;
        handle
            .deliver(stamp(
                &self.server_name,
                Response::rpl_endofnames(&channel_name),
            ))
            .await;
    }

    async fn handle_names(&mut self, from: SessionId, message: &Message) {
        let Some(record) = self.sessions.get(&from) else {
            return;
        };
        let handle = record.handle.clone();
        match message.args.first() {
            Some(channel_name) => {
                if let Some(channel) = self.channels.get(channel_name.as_str()) {
                    let mut nicks: Vec<String> = channel.members.keys().cloned().collect();
                    nicks.sort();
                    handle
                        .deliver(stamp(
                            &self.server_name,
                            Response::rpl_namreply(channel_name, &nicks),
                        ))
                        .await;
                }
                handle
                    .deliver(stamp(
                        &self.server_name,
                        Response::rpl_endofnames(channel_name),
                    ))
                    .await;
            }
            None => {
                handle
                    .deliver(stamp(&self.server_name, Response::rpl_endofnames("")))
                    .await;
            }
        }
    }

    /// PING is answered only when addressed to this server by name,
    /// with an unprefixed PONG echoing the arguments.
    async fn handle_ping(&mut self, from: SessionId, message: &Message) {
        let Some(record) = self.sessions.get(&from) else {
            return;
        };
        if let Some(target) = message.args.first() {
            if *target == self.server_name {
                record
                    .handle
                    .deliver(Message::new(Command::Pong, message.args.clone()))
                    .await;
            } else {
                debug!(session = %from, target = %target, "ignoring PING for another server");
            }
        }
    }

    /// Remove a session's nick and memberships. Idempotent, and never
    /// evicts an entry a later session has since claimed.
    fn cleanup_directories(&mut self, id: SessionId) {
        let Some(record) = self.sessions.get_mut(&id) else {
            return;
        };
        let nick = record.user.nick.clone();
        if self.direct.get(&nick).is_some_and(|h| h.id == id) {
            self.direct.remove(&nick);
        }
        for name in record.channels.drain() {
            if let Some(channel) = self.channels.get_mut(&name) {
                if channel.members.get(&nick).is_some_and(|h| h.id == id) {
                    channel.members.remove(&nick);
                }
            }
        }
        debug!(session = %id, nick = %nick, "directories cleaned");
    }

    fn handle_detach(&mut self, id: SessionId) {
        self.cleanup_directories(id);
        if self.sessions.remove(&id).is_some() {
            info!(session = %id, "session detached");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pirc_proto::Response;
    use tokio::sync::mpsc::Receiver;

    const SERVER: &str = "irc.test.net";

    fn spawn_router() -> RouterHandle {
        let (handle, router) = Router::new(SERVER);
        tokio::spawn(router.run());
        handle
    }

    async fn attach(router: &RouterHandle) -> (SessionId, Receiver<Message>) {
        let id = SessionId::next();
        let (handle, rx) = SessionHandle::new(id, 64);
        router.attach(handle).await;
        (id, rx)
    }

    async fn send(router: &RouterHandle, from: SessionId, line: &str) {
        let message = Message::parse(line).expect("test line must parse");
        router.submit(Envelope { message, from }).await.unwrap();
    }

    async fn register(router: &RouterHandle, from: SessionId, nick: &str, rx: &mut Receiver<Message>) {
        send(router, from, &format!("NICK {nick}")).await;
        send(router, from, &format!("USER {nick} host server :Real Name")).await;
        let welcome = rx.recv().await.unwrap();
        assert_eq!(welcome.command, Command::Reply(Response::RPL_WELCOME));
    }

    /// Sending a correctly addressed PING flushes the pipeline: once
    /// the PONG arrives, everything before it has been delivered.
    async fn marker(router: &RouterHandle, from: SessionId, rx: &mut Receiver<Message>) -> Vec<Message> {
        send(router, from, &format!("PING {SERVER}")).await;
        let mut before = Vec::new();
        loop {
            let msg = rx.recv().await.unwrap();
            if msg.command == Command::Pong {
                return before;
            }
            before.push(msg);
        }
    }

    async fn join(router: &RouterHandle, from: SessionId, channel: &str, rx: &mut Receiver<Message>) {
        send(router, from, &format!("JOIN {channel}")).await;
        // JOIN echo, topic, names, end-of-names.
        for _ in 0..4 {
            rx.recv().await.unwrap();
        }
    }

    #[tokio::test]
    async fn welcome_is_sent_exactly_once() {
        let router = spawn_router();
        let (a, mut rx) = attach(&router).await;
        register(&router, a, "alice", &mut rx).await;

        // Re-sending USER rebukes but never re-welcomes.
        send(&router, a, "USER alice host server :Alice").await;
        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.command, Command::Reply(Response::ERR_ALREADYREGISTRED));
        assert!(marker(&router, a, &mut rx).await.is_empty());
    }

    #[tokio::test]
    async fn welcome_waits_for_both_nick_and_user() {
        let router = spawn_router();
        let (a, mut rx) = attach(&router).await;
        send(&router, a, "NICK alice").await;
        assert!(marker(&router, a, &mut rx).await.is_empty());

        send(&router, a, "USER al host server :Alice").await;
        let welcome = rx.recv().await.unwrap();
        assert_eq!(welcome.command, Command::Reply(Response::RPL_WELCOME));
        assert_eq!(welcome.args[0], "alice");
        assert_eq!(
            welcome.prefix,
            Some(Prefix::ServerName(SERVER.to_string()))
        );
    }

    #[tokio::test]
    async fn user_requires_four_params() {
        let router = spawn_router();
        let (a, mut rx) = attach(&router).await;
        send(&router, a, "NICK alice").await;
        send(&router, a, "USER al host server").await;
        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.command, Command::Reply(Response::ERR_NEEDMOREPARAMS));
        assert_eq!(msg.args[0], "USER");
    }

    #[tokio::test]
    async fn direct_message_is_relayed_with_sender_origin() {
        let router = spawn_router();
        let (a, mut rx_a) = attach(&router).await;
        let (b, mut rx_b) = attach(&router).await;
        register(&router, a, "alice", &mut rx_a).await;
        register(&router, b, "bob", &mut rx_b).await;

        send(&router, a, "PRIVMSG bob :hello there").await;
        let msg = rx_b.recv().await.unwrap();
        assert_eq!(msg.command, Command::Privmsg);
        assert_eq!(msg.args, vec!["bob", "hello there"]);
        assert_eq!(
            msg.prefix,
            Some(Prefix::Nickname(
                "alice".into(),
                "alice".into(),
                "host".into()
            ))
        );
    }

    #[tokio::test]
    async fn unknown_target_gets_exactly_one_nosuchnick() {
        let router = spawn_router();
        let (a, mut rx) = attach(&router).await;
        register(&router, a, "alice", &mut rx).await;

        send(&router, a, "PRIVMSG ghost :anyone home").await;
        let before = marker(&router, a, &mut rx).await;
        assert_eq!(before.len(), 1);
        assert_eq!(
            before[0].command,
            Command::Reply(Response::ERR_NOSUCHNICK)
        );
        assert_eq!(before[0].args[0], "ghost");
    }

    #[tokio::test]
    async fn missing_channel_gets_nosuchnick() {
        let router = spawn_router();
        let (a, mut rx) = attach(&router).await;
        register(&router, a, "alice", &mut rx).await;

        send(&router, a, "PRIVMSG #void :hello").await;
        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.command, Command::Reply(Response::ERR_NOSUCHNICK));
    }

    #[tokio::test]
    async fn channel_relay_reaches_everyone_but_the_sender() {
        let router = spawn_router();
        let (a, mut rx_a) = attach(&router).await;
        let (b, mut rx_b) = attach(&router).await;
        let (c, mut rx_c) = attach(&router).await;
        register(&router, a, "alice", &mut rx_a).await;
        register(&router, b, "bob", &mut rx_b).await;
        register(&router, c, "carol", &mut rx_c).await;
        join(&router, a, "#tea", &mut rx_a).await;
        join(&router, b, "#tea", &mut rx_b).await;
        join(&router, c, "#tea", &mut rx_c).await;

        send(&router, a, "PRIVMSG #tea :tea time").await;
        for rx in [&mut rx_b, &mut rx_c] {
            let msg = rx.recv().await.unwrap();
            assert_eq!(msg.command, Command::Privmsg);
            assert_eq!(msg.args[1], "tea time");
        }
        // The sender hears nothing back.
        assert!(marker(&router, a, &mut rx_a).await.is_empty());
    }

    #[tokio::test]
    async fn join_burst_echo_topic_names_end() {
        let router = spawn_router();
        let (a, mut rx) = attach(&router).await;
        register(&router, a, "alice", &mut rx).await;

        send(&router, a, "JOIN #tea").await;
        let echo = rx.recv().await.unwrap();
        assert_eq!(echo.command, Command::Join);
        assert_eq!(echo.prefix.as_ref().and_then(|p| p.nick()), Some("alice"));

        let topic = rx.recv().await.unwrap();
        assert_eq!(topic.command, Command::Reply(Response::RPL_TOPIC));
        // The channel name stands in for a real topic.
        assert_eq!(topic.args, vec!["alice", "#tea", "#tea"]);

        let names = rx.recv().await.unwrap();
        assert_eq!(names.command, Command::Reply(Response::RPL_NAMREPLY));
        assert_eq!(names.args, vec!["=", "#tea", "alice"]);

        let end = rx.recv().await.unwrap();
        assert_eq!(end.command, Command::Reply(Response::RPL_ENDOFNAMES));
        assert_eq!(end.args[0], "#tea");
    }

    #[tokio::test]
    async fn names_tracks_joins_and_quits() {
        let router = spawn_router();
        let (a, mut rx_a) = attach(&router).await;
        let (b, mut rx_b) = attach(&router).await;
        register(&router, a, "alice", &mut rx_a).await;
        register(&router, b, "bob", &mut rx_b).await;
        join(&router, a, "#tea", &mut rx_a).await;
        join(&router, b, "#tea", &mut rx_b).await;

        send(&router, a, "NAMES #tea").await;
        let names = rx_a.recv().await.unwrap();
        assert_eq!(names.args, vec!["=", "#tea", "alice bob"]);
        rx_a.recv().await.unwrap(); // end of names

        send(&router, b, "QUIT").await;
        send(&router, a, "NAMES #tea").await;
        let names = rx_a.recv().await.unwrap();
        assert_eq!(names.args, vec!["=", "#tea", "alice"]);
    }

    #[tokio::test]
    async fn names_for_unknown_channel_is_just_the_end_marker() {
        let router = spawn_router();
        let (a, mut rx) = attach(&router).await;
        register(&router, a, "alice", &mut rx).await;

        send(&router, a, "NAMES #void").await;
        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.command, Command::Reply(Response::RPL_ENDOFNAMES));
        assert_eq!(msg.args[0], "#void");
    }

    #[tokio::test]
    async fn rename_rekeys_direct_and_channel_entries() {
        let router = spawn_router();
        let (a, mut rx_a) = attach(&router).await;
        let (b, mut rx_b) = attach(&router).await;
        register(&router, a, "alice", &mut rx_a).await;
        register(&router, b, "bob", &mut rx_b).await;
        join(&router, a, "#tea", &mut rx_a).await;

        send(&router, a, "NICK alicia").await;

        send(&router, b, "PRIVMSG alicia :new name suits you").await;
        let msg = rx_a.recv().await.unwrap();
        assert_eq!(msg.args[1], "new name suits you");

        // The old nick is free again.
        send(&router, b, "PRIVMSG alice :hello").await;
        let msg = rx_b.recv().await.unwrap();
        assert_eq!(msg.command, Command::Reply(Response::ERR_NOSUCHNICK));

        // Channel membership follows the rename.
        send(&router, b, "NAMES #tea").await;
        let names = rx_b.recv().await.unwrap();
        assert_eq!(names.args, vec!["=", "#tea", "alicia"]);
    }

    #[tokio::test]
    async fn nick_collision_rebukes_then_takes_over() {
        let router = spawn_router();
        let (a, mut rx_a) = attach(&router).await;
        let (b, mut rx_b) = attach(&router).await;
        let (c, mut rx_c) = attach(&router).await;
        register(&router, a, "dude", &mut rx_a).await;
        register(&router, c, "carol", &mut rx_c).await;

        send(&router, b, "NICK dude").await;
        send(&router, b, "USER dude host server :The Other Dude").await;
        let rebuke = rx_b.recv().await.unwrap();
        assert_eq!(
            rebuke.command,
            Command::Reply(Response::ERR_ALREADYREGISTRED)
        );
        let welcome = rx_b.recv().await.unwrap();
        assert_eq!(welcome.command, Command::Reply(Response::RPL_WELCOME));

        // The newcomer now owns the nick.
        send(&router, c, "PRIVMSG dude :which dude am I talking to").await;
        let msg = rx_b.recv().await.unwrap();
        assert_eq!(msg.args[1], "which dude am I talking to");
        assert!(marker(&router, a, &mut rx_a).await.is_empty());
    }

    #[tokio::test]
    async fn ping_is_answered_only_for_this_server() {
        let router = spawn_router();
        let (a, mut rx) = attach(&router).await;
        register(&router, a, "alice", &mut rx).await;

        send(&router, a, "PING elsewhere.example.org").await;
        // No reply for a foreign target; the marker PONG is next.
        assert!(marker(&router, a, &mut rx).await.is_empty());

        send(&router, a, &format!("PING {SERVER}")).await;
        let pong = rx.recv().await.unwrap();
        assert_eq!(pong.command, Command::Pong);
        assert_eq!(pong.args, vec![SERVER]);
        assert_eq!(pong.prefix, None);
    }

    #[tokio::test]
    async fn detach_cleans_every_directory() {
        let router = spawn_router();
        let (a, mut rx_a) = attach(&router).await;
        let (b, mut rx_b) = attach(&router).await;
        register(&router, a, "alice", &mut rx_a).await;
        register(&router, b, "bob", &mut rx_b).await;
        join(&router, a, "#tea", &mut rx_a).await;

        router.detach(a).await;

        send(&router, b, "PRIVMSG alice :are you there").await;
        let msg = rx_b.recv().await.unwrap();
        assert_eq!(msg.command, Command::Reply(Response::ERR_NOSUCHNICK));

        send(&router, b, "NAMES #tea").await;
        let names = rx_b.recv().await.unwrap();
        assert_eq!(names.command, Command::Reply(Response::RPL_NAMREPLY));
        assert_eq!(names.args, vec!["=", "#tea", ""]);
    }

    #[tokio::test]
    async fn late_detach_does_not_evict_the_nicks_new_owner() {
        let router = spawn_router();
        let (a, mut rx_a) = attach(&router).await;
        let (b, mut rx_b) = attach(&router).await;
        let (c, mut rx_c) = attach(&router).await;
        register(&router, a, "dude", &mut rx_a).await;
        register(&router, c, "carol", &mut rx_c).await;

        send(&router, a, "QUIT").await;
        register(&router, b, "dude", &mut rx_b).await;

        // The first session's teardown arrives after the nick changed
        // hands; the new owner must keep it.
        router.detach(a).await;

        send(&router, c, "PRIVMSG dude :still there").await;
        let msg = rx_b.recv().await.unwrap();
        assert_eq!(msg.args[1], "still there");
    }
}
