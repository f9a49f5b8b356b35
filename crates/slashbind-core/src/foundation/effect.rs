//! Platform effects produced from handler return values.

use std::fmt;
use std::future::Future;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::DeferredError;
use crate::foundation::deferred::Deferred;

// ============================================================================
// Rich Content
// ============================================================================

/// A field of an [`Embed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub inline: bool,
}

/// Rich content rendered by the platform as a card.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<String>,
}

impl Embed {
    /// Creates an empty embed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title.
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the link target of the title.
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the sidebar color as `0xRRGGBB`.
    pub fn color(mut self, color: u32) -> Self {
        self.color = Some(color);
        self
    }

    /// Appends a field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    /// Sets the footer text.
    pub fn footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }
}

// ============================================================================
// Effects
// ============================================================================

/// The content of a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyBody {
    Text(String),
    Embed(Embed),
}

/// What the platform should do in response to an invocation.
pub enum PlatformEffect {
    /// Nothing is sent.
    None,
    /// A reply to the interaction.
    Reply {
        body: ReplyBody,
        /// Only the invoking user sees the reply.
        ephemeral: bool,
    },
    /// The response is produced later.
    Deferred(DeferredEffect),
}

impl PlatformEffect {
    /// A public text reply.
    pub fn text(content: impl Into<String>) -> Self {
        Self::Reply {
            body: ReplyBody::Text(content.into()),
            ephemeral: false,
        }
    }

    /// A public embed reply.
    pub fn embed(embed: Embed) -> Self {
        Self::Reply {
            body: ReplyBody::Embed(embed),
            ephemeral: false,
        }
    }

    /// Marks a reply as visible to the invoking user only.
    pub fn ephemeral(self) -> Self {
        match self {
            Self::Reply { body, .. } => Self::Reply {
                body,
                ephemeral: true,
            },
            other => other,
        }
    }

    /// Returns a short name of the effect kind, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Reply {
                body: ReplyBody::Text(_),
                ..
            } => "text",
            Self::Reply {
                body: ReplyBody::Embed(_),
                ..
            } => "embed",
            Self::Deferred(_) => "deferred",
        }
    }

    /// Returns `true` for [`PlatformEffect::None`].
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns the text of a text reply.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Reply {
                body: ReplyBody::Text(text),
                ..
            } => Some(text),
            _ => None,
        }
    }

    /// Returns the embed of an embed reply.
    pub fn as_embed(&self) -> Option<&Embed> {
        match self {
            Self::Reply {
                body: ReplyBody::Embed(embed),
                ..
            } => Some(embed),
            _ => None,
        }
    }

    /// Returns `true` if this is an ephemeral reply.
    pub fn is_ephemeral(&self) -> bool {
        matches!(self, Self::Reply { ephemeral: true, .. })
    }
}

impl fmt::Debug for PlatformEffect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Reply { body, ephemeral } => f
                .debug_struct("Reply")
                .field("body", body)
                .field("ephemeral", ephemeral)
                .finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

/// An effect whose content completes later.
pub struct DeferredEffect {
    inner: Deferred<PlatformEffect>,
}

impl DeferredEffect {
    /// Wraps a deferred effect.
    pub fn new(inner: Deferred<PlatformEffect>) -> Self {
        Self { inner }
    }

    /// Bounds the wait by `deadline`.
    ///
    /// Whichever of `deadline` and `token` fires first ends the wait with
    /// [`DeferredError::Cancelled`]. An expired deadline also cancels `token`,
    /// so deferred values handed out during the invocation stop too.
    pub fn bounded<D>(self, deadline: D, token: CancellationToken) -> Self
    where
        D: Future<Output = ()> + Send + 'static,
    {
        let pending = self.resolve();
        Self::new(Deferred::from_result(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => Err(DeferredError::Cancelled),
                result = pending => result,
                _ = deadline => {
                    token.cancel();
                    Err(DeferredError::Cancelled)
                }
            }
        }))
    }

    /// Waits for the final, non-deferred effect.
    pub fn resolve(self) -> BoxFuture<'static, Result<PlatformEffect, DeferredError>> {
        Box::pin(async move {
            let mut current = self.inner;
            loop {
                match current.await? {
                    PlatformEffect::Deferred(next) => current = next.inner,
                    effect => return Ok(effect),
                }
            }
        })
    }
}

crate::impl_typed!(Embed, PlatformEffect);
