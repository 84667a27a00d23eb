//! Numeric server replies.
//!
//! The relay emits a small set of RFC 1459 numerics. Each has a
//! semantic constructor returning a ready-to-send [`Message`]; the
//! caller stamps the server prefix.
//!
//! Argument layouts are deliberately sparse: only 001 and 332 carry the
//! client's nick, the rest lead with the subject of the reply.
//!
//! # Reference
//! - RFC 2812: Internet Relay Chat: Client Protocol

#![allow(non_camel_case_types)]

use crate::command::Command;
use crate::message::Message;

/// IRC server response code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
#[non_exhaustive]
pub enum Response {
    /// 001 - Welcome to the IRC network
    RPL_WELCOME = 1,
    /// 332 - Channel topic
    RPL_TOPIC = 332,
    /// 353 - NAMES reply
    RPL_NAMREPLY = 353,
    /// 366 - End of NAMES list
    RPL_ENDOFNAMES = 366,
    /// 401 - No such nick/channel
    ERR_NOSUCHNICK = 401,
    /// 411 - No recipient given
    ERR_NORECIPIENT = 411,
    /// 421 - Unknown command
    ERR_UNKNOWNCOMMAND = 421,
    /// 461 - Not enough parameters
    ERR_NEEDMOREPARAMS = 461,
    /// 462 - Already registered
    ERR_ALREADYREGISTRED = 462,
}

impl Response {
    /// The numeric code as sent on the wire.
    pub fn code(self) -> u16 {
        self as u16
    }

    /// Helper to construct a Message with a Reply command.
    fn reply(response: Response, args: Vec<String>) -> Message {
        Message::new(Command::Reply(response), args)
    }

    /// `001 RPL_WELCOME`
    /// `<nick> :Welcome to the Internet Relay Network <nick>`
    pub fn rpl_welcome(nick: &str) -> Message {
        Self::reply(
            Response::RPL_WELCOME,
            vec![
                nick.to_string(),
                format!("Welcome to the Internet Relay Network {nick}"),
            ],
        )
    }

    /// `332 RPL_TOPIC`
    /// `<nick> <channel> :<topic>`
    pub fn rpl_topic(nick: &str, channel: &str, topic: &str) -> Message {
        Self::reply(
            Response::RPL_TOPIC,
            vec![nick.to_string(), channel.to_string(), topic.to_string()],
        )
    }

    /// `353 RPL_NAMREPLY`
    /// `= <channel> :<nick> ...`
    pub fn rpl_namreply(channel: &str, nicks: &[String]) -> Message {
        Self::reply(
            Response::RPL_NAMREPLY,
            vec!["=".to_string(), channel.to_string(), nicks.join(" ")],
        )
    }

    /// `366 RPL_ENDOFNAMES`
    /// `<channel> :End of /NAMES list`
    pub fn rpl_endofnames(channel: &str) -> Message {
        Self::reply(
            Response::RPL_ENDOFNAMES,
            vec![channel.to_string(), "End of /NAMES list".to_string()],
        )
    }

    /// `401 ERR_NOSUCHNICK`
    /// `<target> :No such nick/channel`
    pub fn err_nosuchnick(target: &str) -> Message {
        Self::reply(
            Response::ERR_NOSUCHNICK,
            vec![target.to_string(), "No such nick/channel".to_string()],
        )
    }

    /// `411 ERR_NORECIPIENT`
    /// `:No recipient given (<command>)`
    pub fn err_norecipient(command: &str) -> Message {
        Self::reply(
            Response::ERR_NORECIPIENT,
            vec![format!("No recipient given ({command})")],
        )
    }

    /// `421 ERR_UNKNOWNCOMMAND`
    /// `<command> :Unknown command`
    pub fn err_unknowncommand(command: &str) -> Message {
        Self::reply(
            Response::ERR_UNKNOWNCOMMAND,
            vec![command.to_string(), "Unknown command".to_string()],
        )
    }

    /// `461 ERR_NEEDMOREPARAMS`
    /// `<command> :Not enough parameters`
    pub fn err_needmoreparams(command: &str) -> Message {
        Self::reply(
            Response::ERR_NEEDMOREPARAMS,
            vec![command.to_string(), "Not enough parameters".to_string()],
        )
    }

    /// `462 ERR_ALREADYREGISTRED`
    /// `:You may not reregister`
    pub fn err_alreadyregistred() -> Message {
        Self::reply(
            Response::ERR_ALREADYREGISTRED,
            vec!["You may not reregister".to_string()],
        )
    }
}
