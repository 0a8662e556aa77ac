//! End-to-end journeys against the scripted engine.

use std::sync::Arc;
use trailhead::prelude::*;
use trailhead_test::{ScriptedConnector, ScriptedEngine, Script, Step, assert_node_kind};

const SERVER: &str = "https://idp.example/am";

fn session(engine: ScriptedEngine) -> (JourneySession, ScriptedConnector) {
    let connector = ScriptedConnector::new(engine);
    (JourneySession::new(connector.clone()), connector)
}

#[tokio::test]
async fn login_journey_reaches_session() -> anyhow::Result<()> {
    trailhead::observe::try_init_stdout_tracing();
    let (session, _) = session(ScriptedEngine::login("alice", "secret"));

    assert!(session.configure(&JourneyConfig::new(SERVER)).await?);

    let node = session.start("Login", StartOptions::default()).await?;
    assert_node_kind!(node, NodeKind::Continue);
    assert_eq!(node.callbacks().len(), 1);
    assert_eq!(node.callbacks()[0].kind(), CallbackType::NAME);

    let node = session
        .next(node.id(), &JourneyInput::new().with(CallbackType::NAME, "alice"))
        .await?;
    assert_node_kind!(node, NodeKind::Continue);
    assert_eq!(node.callbacks().len(), 1);
    assert_eq!(node.callbacks()[0].kind(), CallbackType::PASSWORD);

    let node = session
        .next(node.id(), &JourneyInput::new().with(CallbackType::PASSWORD, "secret"))
        .await?;
    assert_node_kind!(node, NodeKind::Success);

    let user = session.session().await?.expect("session after Success");
    assert!(!user.access_token.is_empty());
    let user_info = user.user_info.as_ref().expect("user info");
    assert_eq!(user_info["sub"], "alice");
    assert_eq!(user_info["email_verified"], "true");

    let json = serde_json::to_value(&user)?;
    assert!(json.get("accessToken").is_some());
    assert!(json.get("userInfo").is_some());
    Ok(())
}

#[tokio::test]
async fn values_are_forwarded_in_order_and_password_never_echoed() -> anyhow::Result<()> {
    let engine = ScriptedEngine::new().journey(
        "Combined",
        Script::new()
            .step(Step::Collect(vec![
                Callback::new(CallbackType::NAME).with_prompt("User Name"),
                Callback::new(CallbackType::PASSWORD).with_prompt("Password"),
            ]))
            .expect(CallbackType::NAME, "alice")
            .expect(CallbackType::PASSWORD, "secret"),
    );
    let (session, connector) = session(engine);
    session.configure(&JourneyConfig::new(SERVER)).await?;

    let node = session.start("Combined", StartOptions::default()).await?;
    let input = JourneyInput::new()
        .with(CallbackType::PASSWORD, "secret")
        .with(CallbackType::NAME, "alice");
    let done = session.next(node.id(), &input).await?;
    assert_node_kind!(done, NodeKind::Success);

    assert_eq!(
        connector.engine().submissions(),
        vec![vec![
            ("NameCallback".to_string(), Some("alice".to_string())),
            ("PasswordCallback".to_string(), Some("secret".to_string())),
        ]]
    );

    for held in [&node, &done] {
        let json = serde_json::to_string(&**held)?;
        assert!(!json.contains("secret"), "password leaked: {json}");
    }

    // the request payload built for the engine does not serialize the secret either
    let applied = input.apply(node.callbacks());
    let json = serde_json::to_string(&applied)?;
    assert!(json.contains("alice"));
    assert!(!json.contains("secret"));
    Ok(())
}

#[tokio::test]
async fn suspended_journey_resumes_from_link() -> anyhow::Result<()> {
    let engine = ScriptedEngine::new().journey(
        "MagicLink",
        Script::new()
            .step(Step::name("Email"))
            .step(Step::Suspend {
                message: "Check your inbox".to_string(),
            })
            .expect(CallbackType::NAME, "alice@example.com"),
    );
    let (session, connector) = session(engine);
    session.configure(&JourneyConfig::new(SERVER)).await?;

    let node = session.start("MagicLink", StartOptions::default()).await?;
    let node = session
        .next(
            node.id(),
            &JourneyInput::new().with(CallbackType::NAME, "alice@example.com"),
        )
        .await?;
    assert!(node.is_suspended());
    assert_eq!(node.callbacks()[0].prompt(), Some("Check your inbox"));

    let err = session
        .resume(&format!("{SERVER}/XUI/?suspendedId=forged"))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "ENGINE_ERROR");
    assert_eq!(session.current().as_ref(), Some(&node));

    let suspended_id = connector.engine().suspended_id().expect("suspended id");
    let node = session
        .resume(&format!("{SERVER}/XUI/?realm=/&suspendedId={suspended_id}"))
        .await?;
    assert_node_kind!(node, NodeKind::Success);
    Ok(())
}

#[tokio::test]
async fn unknown_callbacks_pass_through_untouched() -> anyhow::Result<()> {
    let kba = Callback::new("KbaCreateCallback")
        .with_prompt("Security question")
        .with_extra("predefinedQuestions", serde_json::json!(["Favourite colour?"]));
    let engine = ScriptedEngine::new().journey(
        "Register",
        Script::new()
            .step(Step::Collect(vec![
                Callback::new(CallbackType::TEXT_OUTPUT).with_message("Welcome"),
                kba,
            ]))
            .expect("KbaCreateCallback", "blue"),
    );
    let (session, connector) = session(engine);
    session.configure(&JourneyConfig::new(SERVER)).await?;

    let node = session.start("Register", StartOptions::default()).await?;
    let json = serde_json::to_value(&*node)?;
    assert_eq!(json["callbacks"][1]["type"], "KbaCreateCallback");
    assert_eq!(
        json["callbacks"][1]["predefinedQuestions"],
        serde_json::json!(["Favourite colour?"])
    );

    // input aimed at the output-only callback is dropped
    let input = JourneyInput::new()
        .with(CallbackType::TEXT_OUTPUT, "ignored")
        .with("KbaCreateCallback", "blue");
    let node = session.next(node.id(), &input).await?;
    assert_node_kind!(node, NodeKind::Success);
    assert_eq!(
        connector.engine().submissions()[0],
        vec![
            ("TextOutputCallback".to_string(), None),
            ("KbaCreateCallback".to_string(), Some("blue".to_string())),
        ]
    );
    Ok(())
}

#[tokio::test]
async fn client_drives_the_same_journey() -> anyhow::Result<()> {
    let connector = ScriptedConnector::new(ScriptedEngine::login("alice", "secret"));
    let session = Arc::new(JourneySession::new(connector));
    let client = JourneyClient::new(Arc::clone(&session), JourneyConfig::new(SERVER));
    let mut updates = client.subscribe();

    client.start("Login").await?;
    client
        .next(&JourneyInput::new().with(CallbackType::NAME, "alice"))
        .await?;
    client
        .next(&JourneyInput::new().with(CallbackType::PASSWORD, "secret"))
        .await?;

    let state = updates.borrow_and_update().clone();
    assert!(!state.loading);
    assert!(state.error.is_none());
    assert_node_kind!(state.node.expect("node"), NodeKind::Success);
    assert_eq!(session.current(), client.node());

    let user = client.user().await.expect("user");
    assert_eq!(user.claim("given_name"), Some("Alice"));

    assert!(client.logout().await);
    assert!(client.logout().await);
    assert!(client.user().await.is_none());
    Ok(())
}
