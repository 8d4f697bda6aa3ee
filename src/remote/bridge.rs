use std::{num::Wrapping, path::Path, process::Stdio};

use futures::{SinkExt as _, StreamExt as _};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};

use crate::{
    config::ApiCredentials,
    remote::{AccountTier, InputRef, ItemDescriptor, RemoteError, RemoteListClient},
};

/// Talks to a helper process that owns the session with the remote service.
///
/// Every request is one JSON object per line on the helper's stdin and is
/// answered by exactly one JSON object per line on its stdout, carrying the
/// same tag and either an `ok` value or an `error` message.
#[derive(Debug)]
pub struct BridgeClient {
    child: Child,
    requests: FramedWrite<ChildStdin, LinesCodec>,
    replies: FramedRead<ChildStdout, LinesCodec>,
    next_tag: Wrapping<u16>,
}

#[derive(Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
enum Request<'a> {
    ListSaved,
    SetSavedState { item: &'a InputRef, saved: bool },
    WhoAmI,
    Download {
        item: &'a ItemDescriptor,
        path: &'a Path,
    },
}

#[derive(Serialize)]
struct Envelope<'a> {
    tag: &'a str,
    #[serde(flatten)]
    request: Request<'a>,
}

#[derive(Deserialize)]
struct Reply {
    tag: String,
    #[serde(flatten)]
    body: ReplyBody,
}

#[derive(Deserialize)]
#[serde(rename_all = "snake_case")]
enum ReplyBody {
    Ok(serde_json::Value),
    Error(String),
}

#[derive(Deserialize)]
struct SavedItems {
    items: Vec<ItemDescriptor>,
}

#[derive(Deserialize)]
struct Identity {
    is_elevated_tier: bool,
}

impl BridgeClient {
    pub fn spawn(
        bridge_cmd: &str,
        credentials: &ApiCredentials,
        session: Option<&Path>,
    ) -> Result<Self, RemoteError> {
        let mut cmd_parts = bridge_cmd.split(' ').filter(|part| !part.is_empty());
        let program = cmd_parts
            .next()
            .ok_or_else(|| RemoteError::Transport("bridge_cmd should specify a program".into()))?;
        let mut command = Command::new(program);
        command
            .args(cmd_parts)
            .env("SAVEDEXPORT_APP_ID", credentials.app_id().to_string())
            .env("SAVEDEXPORT_APP_HASH", credentials.app_hash())
            .env(
                "SAVEDEXPORT_SESSION",
                session.map(Path::as_os_str).unwrap_or_default(),
            );
        debug!("starting bridge {program}");

        Self::start(command)
    }

    fn start(mut command: Command) -> Result<Self, RemoteError> {
        // A terminal Ctrl+C must only reach the interrupt listener, never a
        // bridge that is in the middle of a call.
        #[cfg(unix)]
        command.process_group(0);
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RemoteError::Transport("bridge stdin was not captured".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RemoteError::Transport("bridge stdout was not captured".into()))?;

        Ok(Self {
            child,
            requests: FramedWrite::new(stdin, LinesCodec::new()),
            replies: FramedRead::new(stdout, LinesCodec::new()),
            next_tag: Wrapping(0),
        })
    }

    /// Four hex digits, wrapping after `ffff`.
    fn next_tag(&mut self) -> String {
        let tag = format!("{:04x}", self.next_tag);
        self.next_tag += Wrapping(1);
        tag
    }

    /// Closes the helper's stdin and waits for it to exit.
    pub async fn close(self) -> Result<(), RemoteError> {
        let Self {
            mut child,
            requests,
            ..
        } = self;
        drop(requests);
        let status = child.wait().await?;
        if status.success() {
            debug!("bridge exited");
        } else {
            warn!("bridge exited with {status}");
        }

        Ok(())
    }

    async fn call<T: DeserializeOwned>(&mut self, request: Request<'_>) -> Result<T, RemoteError> {
        let tag = self.next_tag();
        let line = serde_json::to_string(&Envelope { tag: &tag, request })
            .map_err(|e| RemoteError::Transport(format!("request is not encodable: {e}")))?;
        trace!("{tag}: sending {line}");
        self.requests
            .send(line)
            .await
            .map_err(|e| RemoteError::Transport(format!("writing to bridge failed: {e}")))?;

        let line = self
            .replies
            .next()
            .await
            .ok_or_else(|| RemoteError::Transport("bridge closed its output".into()))?
            .map_err(|e| RemoteError::Transport(format!("reading from bridge failed: {e}")))?;
        trace!("{tag}: received {line}");

        let reply: Reply = serde_json::from_str(&line)
            .map_err(|e| RemoteError::UnexpectedResponse(format!("malformed reply: {e}")))?;
        if reply.tag != tag {
            return Err(RemoteError::UnexpectedResponse(format!(
                "reply tag {} does not match request tag {tag}",
                reply.tag
            )));
        }
        match reply.body {
            ReplyBody::Ok(value) => serde_json::from_value(value).map_err(|e| {
                RemoteError::UnexpectedResponse(format!("reply has wrong shape: {e}"))
            }),
            ReplyBody::Error(message) => Err(RemoteError::Transport(message)),
        }
    }
}

impl RemoteListClient for BridgeClient {
    async fn list_saved(&mut self) -> Result<Vec<ItemDescriptor>, RemoteError> {
        let saved: SavedItems = self.call(Request::ListSaved).await?;
        Ok(saved.items)
    }

    async fn set_saved_state(&mut self, item: &InputRef, saved: bool) -> Result<(), RemoteError> {
        let _: serde_json::Value = self
            .call(Request::SetSavedState { item, saved })
            .await?;
        Ok(())
    }

    async fn who_am_i(&mut self) -> Result<AccountTier, RemoteError> {
        let identity: Identity = self.call(Request::WhoAmI).await?;
        if identity.is_elevated_tier {
            Ok(AccountTier::Elevated)
        } else {
            Ok(AccountTier::Ordinary)
        }
    }

    async fn download(
        &mut self,
        item: &ItemDescriptor,
        destination: &Path,
    ) -> Result<(), RemoteError> {
        let _: serde_json::Value = self
            .call(Request::Download {
                item,
                path: destination,
            })
            .await?;
        Ok(())
    }
}
