//! Default converters and context providers for Discord.
//!
//! | Type | Raw kind | Notes |
//! |------|----------|-------|
//! | `String` | STRING | |
//! | `i64`, `i32` | INTEGER | `i32` follows the narrowing policy |
//! | `bool` | BOOLEAN | |
//! | `f64` | NUMBER | |
//! | `f32` | NUMBER, then STRING | narrowing policy; text is parsed |
//! | [`User`], [`Member`] | USER | from `data.resolved` |
//! | [`Role`] | ROLE | |
//! | [`Mentionable`] | MENTIONABLE | user or role |
//! | [`Channel`], [`GuildChannel`] | CHANNEL | guild channels only for the latter |
//! | [`Attachment`] | ATTACHMENT | |

use slashbind_core::{
    ContextRegistryBuilder, ConvertError, Narrowing, OptionKind, RawValue, RegistryResult,
    TypeRegistryBuilder,
};

use crate::model::entity::{
    Attachment, Channel, Guild, GuildChannel, Member, Mentionable, MessageChannel, Role, User,
};
use crate::model::interaction::InteractionEvent;
use crate::platform::Client;

/// Registers the Discord option converters.
pub fn register_types(types: &mut TypeRegistryBuilder, narrowing: Narrowing) -> RegistryResult<()> {
    types
        .register::<String, _>(OptionKind::String, RawValue::as_string)?
        .register::<i64, _>(OptionKind::Integer, RawValue::as_long)?
        .register::<i32, _>(OptionKind::Integer, move |raw: &RawValue| {
            narrowing.narrow_i32(raw.as_long()?)
        })?
        .register::<bool, _>(OptionKind::Boolean, RawValue::as_bool)?
        .register::<f64, _>(OptionKind::Number, RawValue::as_double)?
        .register::<f32, _>(OptionKind::Number, move |raw: &RawValue| {
            narrowing.narrow_f32(raw.as_double()?)
        })?
        .register_overlay::<f32, _>(OptionKind::String, move |raw: &RawValue| {
            narrowing.narrow_f32(raw.as_double()?)
        })?
        .register::<User, _>(OptionKind::User, |raw: &RawValue| raw.resolved_entity("user"))?
        .register::<Member, _>(OptionKind::User, |raw: &RawValue| raw.resolved_entity("member"))?
        .register::<Role, _>(OptionKind::Role, |raw: &RawValue| raw.resolved_entity("role"))?
        .register::<Mentionable, _>(OptionKind::Mentionable, mentionable)?
        .register::<Channel, _>(OptionKind::Channel, |raw: &RawValue| {
            raw.resolved_entity("channel")
        })?
        .register::<GuildChannel, _>(OptionKind::Channel, |raw: &RawValue| {
            GuildChannel::try_from(raw.resolved_entity::<Channel>("channel")?)
        })?
        .register::<Attachment, _>(OptionKind::Attachment, |raw: &RawValue| {
            raw.resolved_entity("attachment")
        })?;
    Ok(())
}

fn mentionable(raw: &RawValue) -> Result<Mentionable, ConvertError> {
    if raw.has_resolved("user") {
        raw.resolved_entity("user").map(Mentionable::User)
    } else {
        raw.resolved_entity("role").map(Mentionable::Role)
    }
}

/// Registers the Discord context providers.
///
/// The guild, channel, member and event are read from the invocation
/// context; the acting user is derived from the event and the client is
/// bound.
pub fn register_contexts(contexts: &mut ContextRegistryBuilder, client: Client) -> RegistryResult<()> {
    contexts
        .provide_from_store::<InteractionEvent>()?
        .provide_from_store::<Guild>()?
        .provide_from_store::<MessageChannel>()?
        .provide_from_store::<Member>()?
        .derive::<InteractionEvent, User, _>(|event| event.invoker().cloned())?
        .bind(client)?;
    Ok(())
}
