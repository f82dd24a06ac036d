//! WebSocket envelopes and submission payloads.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::command::Command;

/// Frame sent from the server to a connected socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    ConnectionEstablished {
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    /// Broadcast or resync of the current command.
    Command(Command),
    /// Private rejection of a `send-command` frame.
    CommandError { error: String },
    Pong,
}

/// Frame sent from a socket to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Command fields plus a `token`; parsed only after the token checks out.
    SendCommand(Submission),
    Ping,
}

/// A command as submitted: raw command fields and the bearer token beside them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Submission {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Submission {
    pub fn new(token: Option<String>, command: &Command) -> Self {
        let fields = match serde_json::to_value(command) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Self { token, fields }
    }

    /// Best-effort read of an untrusted payload. A string `token` is lifted out
    /// when present; anything that is not an object contributes no fields, so it
    /// fails as a command only after the token has been checked.
    pub fn from_loose(payload: Option<Value>) -> Self {
        match payload {
            Some(Value::Object(mut fields)) => {
                let token = match fields.remove("token") {
                    Some(Value::String(token)) => Some(token),
                    _ => None,
                };
                Self { token, fields }
            }
            _ => Self::default(),
        }
    }

    /// Interpret the fields as a command. The token is never part of the result.
    pub fn into_command(self) -> Result<Command, serde_json::Error> {
        serde_json::from_value(Value::Object(self.fields))
    }
}
