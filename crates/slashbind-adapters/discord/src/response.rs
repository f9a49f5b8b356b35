//! Interaction responses and the callback [`Responder`].
//!
//! # Overview
//!
//! | Effect | Request |
//! |--------|---------|
//! | Reply | `POST /interactions/{id}/{token}/callback` with type 4 |
//! | Deferred | type 5 callback, then `PATCH` of the original response once the value completes |
//! | None | nothing is sent |
//!
//! [`InteractionCallback`] does not own a network stack. It hands each
//! request to the `send` closure supplied by the transport, which captures
//! the HTTP client and authentication.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use slashbind_core::{
    ApiError, ApiResult, DeferredError, Embed, Invocation, PlatformEffect, ReplyBody, Responder,
};

use crate::model::interaction::InteractionEvent;
use crate::platform::Client;

/// Responds with a message.
pub const CHANNEL_MESSAGE_WITH_SOURCE: u8 = 4;
/// Acknowledges now and edits the response later.
pub const DEFERRED_CHANNEL_MESSAGE_WITH_SOURCE: u8 = 5;
/// Message flag: only the invoking user sees the message.
pub const EPHEMERAL: u64 = 1 << 6;

// =============================================================================
// Wire types
// =============================================================================

/// The message part of a response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessageData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_mentions: Option<Value>,
}

impl MessageData {
    /// Builds the message of a reply.
    pub fn reply(body: &ReplyBody, ephemeral: bool, suppress_mentions: bool) -> Self {
        let (content, embeds) = match body {
            ReplyBody::Text(text) => (Some(text.clone()), Vec::new()),
            ReplyBody::Embed(embed) => (None, vec![embed.clone()]),
        };
        Self {
            content,
            embeds,
            flags: ephemeral.then_some(EPHEMERAL),
            allowed_mentions: suppress_mentions.then(|| json!({ "parse": [] })),
        }
    }
}

/// An interaction callback body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<MessageData>,
}

impl InteractionResponse {
    /// A message response.
    pub fn message(data: MessageData) -> Self {
        Self {
            kind: CHANNEL_MESSAGE_WITH_SOURCE,
            data: Some(data),
        }
    }

    /// A deferred acknowledgement.
    pub fn deferred() -> Self {
        Self {
            kind: DEFERRED_CHANNEL_MESSAGE_WITH_SOURCE,
            data: None,
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Post,
    Patch,
}

/// A REST request for the transport to perform.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub body: Value,
}

/// Transport-supplied closure performing a request.
pub type SendFn = Arc<dyn Fn(ApiRequest) -> BoxFuture<'static, ApiResult<()>> + Send + Sync>;

// =============================================================================
// InteractionCallback
// =============================================================================

/// [`Responder`] answering interactions through the callback endpoint.
pub struct InteractionCallback {
    client: Client,
    send: SendFn,
}

impl InteractionCallback {
    /// Creates a responder for `client` sending through `send`.
    pub fn new(client: Client, send: SendFn) -> Self {
        Self { client, send }
    }

    fn reply_data(&self, body: &ReplyBody, ephemeral: bool) -> MessageData {
        MessageData::reply(body, ephemeral, self.client.config().suppress_mentions)
    }

    async fn callback(&self, event: &InteractionEvent, response: InteractionResponse) -> ApiResult<()> {
        let request = ApiRequest {
            method: Method::Post,
            url: self.client.config().callback_url(event.id, &event.token),
            body: serde_json::to_value(&response)?,
        };
        debug!(interaction = event.id, kind = response.kind, "Sending interaction callback");
        (self.send)(request).await
    }

    async fn edit_original(&self, event: &InteractionEvent, data: MessageData) -> ApiResult<()> {
        let request = ApiRequest {
            method: Method::Patch,
            url: self
                .client
                .config()
                .original_url(event.application_id, &event.token),
            body: serde_json::to_value(&data)?,
        };
        debug!(interaction = event.id, "Editing deferred response");
        (self.send)(request).await
    }
}

#[async_trait]
impl Responder for InteractionCallback {
    async fn respond(&self, invocation: &Invocation, effect: PlatformEffect) -> ApiResult<()> {
        let Some(event) = invocation.context().get_ref::<InteractionEvent>() else {
            return Err(ApiError::Other("invocation carries no interaction".to_string()));
        };

        match effect {
            PlatformEffect::None => {
                debug!(interaction = event.id, "No response to send");
                Ok(())
            }
            PlatformEffect::Reply { body, ephemeral } => {
                let data = self.reply_data(&body, ephemeral);
                self.callback(event, InteractionResponse::message(data)).await
            }
            PlatformEffect::Deferred(deferred) => {
                self.callback(event, InteractionResponse::deferred()).await?;
                match deferred.resolve().await {
                    Ok(PlatformEffect::Reply { body, ephemeral }) => {
                        let data = self.reply_data(&body, ephemeral);
                        self.edit_original(event, data).await
                    }
                    Ok(_) => Ok(()),
                    Err(DeferredError::Cancelled) => {
                        warn!(interaction = event.id, "Deferred response was cancelled");
                        Err(ApiError::Expired)
                    }
                    Err(e) => Err(ApiError::Other(e.to_string())),
                }
            }
        }
    }
}
