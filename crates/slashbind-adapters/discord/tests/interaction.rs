//! Drives JSON interactions through the engine and the callback responder.

use std::sync::{Arc, Mutex};

use futures::FutureExt;
use serde_json::{Value, json};

use slashbind_adapter_discord::{
    ApiRequest, Client, DiscordPlatform, Guild, InteractionCallback, InteractionEvent, Member,
    SendFn, User,
};
use slashbind_core::{ApiError, Embed, InteractionContext, Permission};
use slashbind_framework::{CommandGroup, CommandSpec};
use slashbind_runtime::{Engine, SlashbindConfig};

async fn ban(target: Member, reason: Option<String>, moderator: User) -> String {
    format!(
        "{} banned {} ({})",
        moderator.display_name(),
        target.display_name(),
        reason.as_deref().unwrap_or("no reason")
    )
}

async fn info(guild: Option<Guild>, user: User) -> Embed {
    Embed::new()
        .title(user.display_name().to_string())
        .description(match guild {
            Some(guild) => format!("in {guild}"),
            None => "in direct messages".to_string(),
        })
}

fn engine() -> (Engine, Client) {
    let platform = DiscordPlatform::builder(200).build();
    let mut engine = Engine::builder(SlashbindConfig::default())
        .platform(&platform)
        .unwrap()
        .build()
        .unwrap();

    let moderation = CommandGroup::new("mod").require(Permission::BanMembers);
    engine
        .register(
            CommandSpec::new("ban")
                .within(&moderation)
                .option::<Member>("target")
                .option::<Option<String>>("reason")
                .context::<User>()
                .visible_in([InteractionContext::Guild]),
            ban,
        )
        .unwrap();
    engine
        .register(
            CommandSpec::new("info")
                .context::<Option<Guild>>()
                .context::<User>(),
            info,
        )
        .unwrap();
    (engine, platform.client().clone())
}

fn responder(client: Client) -> (InteractionCallback, Arc<Mutex<Vec<ApiRequest>>>) {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&requests);
    let send: SendFn = Arc::new(move |request| {
        sink.lock().unwrap().push(request);
        async { Ok::<_, ApiError>(()) }.boxed()
    });
    (InteractionCallback::new(client, send), requests)
}

fn ban_interaction(permissions: &str, reason: Option<&str>) -> InteractionEvent {
    let mut options = vec![json!({"name": "target", "type": 6, "value": "2"})];
    if let Some(reason) = reason {
        options.push(json!({"name": "reason", "type": 3, "value": reason}));
    }
    let payload = json!({
        "id": "100",
        "application_id": "200",
        "type": 2,
        "token": "tok",
        "guild_id": "300",
        "context": 0,
        "channel": {"id": "400", "type": 0, "name": "general"},
        "member": {
            "user": {"id": "1", "username": "ada", "global_name": "Ada"},
            "roles": [],
            "permissions": permissions
        },
        "data": {
            "id": "500",
            "name": "mod",
            "options": [{"name": "ban", "type": 1, "options": options}],
            "resolved": {
                "users": {"2": {"id": "2", "username": "bob"}},
                "members": {"2": {"nick": "bobby", "roles": []}}
            }
        }
    });
    InteractionEvent::parse(&payload.to_string()).unwrap()
}

fn single_body(requests: &Mutex<Vec<ApiRequest>>) -> Value {
    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    requests[0].body.clone()
}

#[tokio::test]
async fn test_sub_command_reply() {
    let (engine, client) = engine();
    let (responder, requests) = responder(client);

    let event = ban_interaction("4", Some("spam"));
    engine
        .respond(event.into_invocation(), &responder)
        .await
        .unwrap();

    let body = single_body(&requests);
    assert_eq!(body["type"], 4);
    assert_eq!(body["data"]["content"], "Ada banned bobby (spam)");
    assert!(body["data"].get("flags").is_none());
}

#[tokio::test]
async fn test_optional_option_absent() {
    let (engine, client) = engine();
    let (responder, requests) = responder(client);

    engine
        .respond(ban_interaction("4", None).into_invocation(), &responder)
        .await
        .unwrap();
    assert_eq!(
        single_body(&requests)["data"]["content"],
        "Ada banned bobby (no reason)"
    );
}

#[tokio::test]
async fn test_missing_permission_is_ephemeral() {
    let (engine, client) = engine();
    let (responder, requests) = responder(client);

    engine
        .respond(ban_interaction("2048", Some("spam")).into_invocation(), &responder)
        .await
        .unwrap();

    let body = single_body(&requests);
    assert_eq!(
        body["data"]["content"],
        "You are missing the following permissions: BAN_MEMBERS"
    );
    assert_eq!(body["data"]["flags"], 64);
}

#[tokio::test]
async fn test_embed_reply_in_direct_messages() {
    let (engine, client) = engine();
    let (responder, requests) = responder(client);

    let event = InteractionEvent::parse(
        &json!({
            "id": "101",
            "application_id": "200",
            "type": 2,
            "token": "tok2",
            "context": 1,
            "user": {"id": "1", "username": "ada"},
            "data": {"id": "501", "name": "info"}
        })
        .to_string(),
    )
    .unwrap();
    engine
        .respond(event.into_invocation(), &responder)
        .await
        .unwrap();

    let requests = requests.lock().unwrap();
    assert!(requests[0].url.ends_with("/interactions/101/tok2/callback"));
    assert_eq!(
        requests[0].body["data"]["embeds"][0],
        json!({"title": "ada", "description": "in direct messages"})
    );
}
