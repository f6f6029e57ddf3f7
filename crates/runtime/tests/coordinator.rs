mod common;

use std::path::Path;

use common::{TestParticipant, arena, home};
use event_content::EventConfig;
use event_core::{ItemSpec, Location, MessageId};
use event_runtime::{
    ConfigEvent, CoordinatorConfig, Event, EventCoordinator, EventError, Participant, Placement,
    SessionEvent, Store, Topic,
};
use tempfile::TempDir;

const CONFIG: &str = r#"
default-mode = "solo"

[modes.solo]
spawn = ["location"]
items = ["salmon"]

[modes.teams]
spawn = ["teams"]

[modes.broken]
spawn = ["nowhere"]

[messages]
"joining.self" = "Welcome to the event!"
"#;

fn write_items(root: &Path) {
    std::fs::create_dir_all(root.join("items")).unwrap();
    std::fs::write(
        root.join("items/salmon.json"),
        br#"{"salmon": {"type": "COOKED_SALMON", "name": "Event Salmon"}}"#,
    )
    .unwrap();
}

async fn start(root: &Path) -> EventCoordinator {
    EventCoordinator::builder(Store::new(root))
        .config(CoordinatorConfig::default())
        .event_config(EventConfig::from_toml(CONFIG).unwrap())
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_start_and_end_lifecycle() {
    let temp = TempDir::new().unwrap();
    let coordinator = start(temp.path()).await;

    assert!(coordinator.current_session().await.unwrap().is_none());
    assert!(!coordinator.end_event().await.unwrap());

    let session = coordinator.start_event().await.unwrap();
    match coordinator.start_event().await {
        Err(EventError::EventAlreadyRunning(existing)) => assert_eq!(existing.id(), session.id()),
        other => panic!("expected EventAlreadyRunning, got {other:?}"),
    }

    assert!(coordinator.end_event().await.unwrap());
    assert!(!session.is_active());
    assert!(coordinator.current_session().await.unwrap().is_none());
    assert!(!coordinator.end_event().await.unwrap());

    coordinator.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_solo_mode_scenario() {
    let temp = TempDir::new().unwrap();
    write_items(temp.path());
    let coordinator = start(temp.path()).await;

    assert_eq!(coordinator.current_mode().await.unwrap().name, "solo");
    assert_eq!(coordinator.modes().len(), 2);
    assert!(coordinator.event_items().get("salmon").is_some());

    coordinator
        .set_event_location(Some(arena()))
        .await
        .unwrap()
        .wait()
        .await
        .unwrap();
    assert_eq!(coordinator.event_location(), Some(arena()));

    let err = coordinator
        .join(TestParticipant::new("Early", home()))
        .await
        .unwrap_err();
    assert!(matches!(err, EventError::NoEvent));

    coordinator.start_event().await.unwrap();
    let alex = TestParticipant::new("Alex", home());
    let outcome = coordinator.join(alex.clone()).await.unwrap();

    assert_eq!(outcome.placement, Placement::SharedLocation(arena()));
    assert_eq!(outcome.items_given, 1);
    assert_eq!(alex.current_location(), arena());
    assert_eq!(
        alex.items(),
        [ItemSpec::new("COOKED_SALMON").named("Event Salmon")]
    );
    assert!(alex.messages().iter().any(|m| m == "Welcome to the event!"));

    let err = coordinator.join(alex.clone()).await.unwrap_err();
    assert_eq!(
        err.user_message(coordinator.messages()).as_deref(),
        Some(MessageId::JoinAlreadyIn.default_template())
    );

    let teleport = coordinator.teleport_event().await.unwrap();
    assert_eq!(teleport.teleported, 1);
    assert!(teleport.rosters.is_empty());
    assert_eq!(teleport.items_given, 1);

    coordinator.leave(alex.clone()).await.unwrap();
    assert_eq!(alex.current_location(), home());
    assert!(
        alex.messages()
            .iter()
            .any(|m| m == MessageId::LeaveSelf.default_template())
    );

    let err = coordinator.leave(alex.clone()).await.unwrap_err();
    assert!(matches!(err, EventError::NotPresent(id) if id == alex.id()));

    coordinator.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_teams_mode_scenario() {
    let temp = TempDir::new().unwrap();
    let coordinator = start(temp.path()).await;
    let red = Location::new("world", 50.0, 64.0, 0.0);
    let blue = Location::new("world", -50.0, 64.0, 0.0);

    assert!(coordinator.set_event_mode("teams").await.is_ok());
    coordinator.start_event().await.unwrap();

    let err = coordinator.teleport_event().await.unwrap_err();
    assert!(matches!(err, EventError::NoTeams));

    for (team, location) in [("red", &red), ("blue", &blue)] {
        coordinator
            .set_team_location(team, Some(location.clone()))
            .await
            .unwrap()
            .wait()
            .await
            .unwrap();
    }
    assert_eq!(coordinator.team_locations().await.unwrap().unwrap().len(), 2);

    let players: Vec<_> = ["A", "B", "C"]
        .iter()
        .map(|name| TestParticipant::new(name, home()))
        .collect();
    for player in &players {
        let outcome = coordinator.join(player.clone()).await.unwrap();
        match outcome.placement {
            Placement::Team { team, location } => {
                assert!(team == "red" || team == "blue");
                assert_eq!(player.current_location(), location);
            }
            other => panic!("expected a team placement, got {other:?}"),
        }
        assert_eq!(outcome.items_given, 0);
    }

    let teleport = coordinator.teleport_event().await.unwrap();
    let mut sizes: Vec<usize> = teleport.rosters.iter().map(|r| r.members.len()).collect();
    sizes.sort();
    assert_eq!(sizes, [1, 2]);
    assert_eq!(teleport.teleported, 3);

    for roster in &teleport.rosters {
        for member in &roster.members {
            let player = players.iter().find(|p| p.id() == *member).unwrap();
            assert_eq!(player.current_location(), roster.location);
        }
    }

    coordinator.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_mode_switch_ends_session_before_mode_changes() {
    let temp = TempDir::new().unwrap();
    let coordinator = start(temp.path()).await;
    let mut session_rx = coordinator.subscribe(Topic::Session);
    let mut config_rx = coordinator.subscribe(Topic::Config);

    let session = coordinator.start_event().await.unwrap();
    let alex = TestParticipant::new("Alex", home());
    coordinator.join(alex.clone()).await.unwrap();

    assert!(coordinator.set_event_mode("teams").await.unwrap());
    assert!(!session.is_active());
    assert!(coordinator.current_session().await.unwrap().is_none());
    assert_eq!(coordinator.current_mode().await.unwrap().name, "teams");

    let mut ended_seq = None;
    while let Ok(envelope) = session_rx.try_recv() {
        if let Event::Session(SessionEvent::Ended { members, .. }) = envelope.event {
            assert_eq!(members, 1);
            ended_seq = Some(envelope.seq);
        }
    }
    let changed = config_rx.try_recv().unwrap();
    assert_eq!(
        changed.event,
        Event::Config(ConfigEvent::ModeChanged {
            from: "solo".into(),
            to: "teams".into(),
        })
    );
    assert!(ended_seq.unwrap() < changed.seq);

    // Without a running session nothing is ended.
    assert!(!coordinator.set_event_mode("solo").await.unwrap());

    coordinator.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_mode_validation() {
    let temp = TempDir::new().unwrap();
    let coordinator = start(temp.path()).await;
    let session = coordinator.start_event().await.unwrap();

    assert!(!coordinator.set_event_mode("solo").await.unwrap());
    assert!(session.is_active());

    let err = coordinator.set_event_mode("broken").await.unwrap_err();
    assert!(matches!(err, EventError::InvalidMode(name) if name == "broken"));
    assert!(session.is_active());
    assert_eq!(coordinator.current_mode().await.unwrap().name, "solo");

    coordinator.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_invalid_team_name() {
    let temp = TempDir::new().unwrap();
    let coordinator = start(temp.path()).await;

    let err = coordinator
        .set_team_location("red.team", Some(arena()))
        .await
        .unwrap_err();
    assert!(matches!(err, EventError::InvalidTeamName(_)));
    assert!(coordinator.team_locations().await.unwrap().is_none());

    coordinator.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_restart_replaces_session() {
    let temp = TempDir::new().unwrap();
    let coordinator = start(temp.path()).await;

    let first = coordinator.restart_event().await.unwrap();
    let alex = TestParticipant::new("Alex", home());
    coordinator.join(alex.clone()).await.unwrap();

    let second = coordinator.restart_event().await.unwrap();
    assert_ne!(first.id(), second.id());
    assert!(!first.is_active());
    assert!(second.is_empty());
    assert_eq!(alex.current_location(), home());

    coordinator.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_state_survives_restart() {
    let temp = TempDir::new().unwrap();
    {
        let coordinator = start(temp.path()).await;
        coordinator.set_event_mode("teams").await.unwrap();
        coordinator
            .set_event_location(Some(arena()))
            .await
            .unwrap()
            .wait()
            .await
            .unwrap();
        coordinator
            .set_team_location("red", Some(home()))
            .await
            .unwrap()
            .wait()
            .await
            .unwrap();
        coordinator.start_event().await.unwrap();
        coordinator
            .join(TestParticipant::new("Alex", home()))
            .await
            .unwrap();

        assert_eq!(coordinator.shutdown().await.unwrap(), 1);
        assert!(matches!(
            coordinator.start_event().await,
            Err(EventError::CommandChannelClosed)
        ));
    }

    assert!(!temp.path().join("users").read_dir().unwrap().any(|_| true));

    let coordinator = start(temp.path()).await;
    assert_eq!(coordinator.current_mode().await.unwrap().name, "teams");
    assert_eq!(coordinator.event_location(), Some(arena()));
    assert_eq!(
        coordinator
            .team_locations()
            .await
            .unwrap()
            .unwrap()
            .get("red"),
        Some(&home())
    );

    // The interrupted event resumes empty.
    let session = coordinator.current_session().await.unwrap().unwrap();
    assert!(session.is_empty());

    coordinator.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_no_modes_is_fatal() {
    let temp = TempDir::new().unwrap();
    let config = EventConfig::from_toml(
        r#"
        [modes.empty]
        spawn = []
        "#,
    )
    .unwrap();

    let err = EventCoordinator::builder(Store::new(temp.path()))
        .event_config(config)
        .build()
        .await
        .unwrap_err();
    assert!(matches!(err, EventError::NoModes));
}

#[tokio::test]
async fn test_respawn_hook_follows_session() {
    let temp = TempDir::new().unwrap();
    let coordinator = start(temp.path()).await;
    coordinator
        .set_event_location(Some(arena()))
        .await
        .unwrap();

    coordinator.start_event().await.unwrap();
    let alex = TestParticipant::new("Alex", home());
    coordinator.join(alex.clone()).await.unwrap();

    let mut request = event_runtime::RespawnRequest::new(alex.id(), Some(home()));
    coordinator.hooks().dispatch_respawn(&mut request);
    assert_eq!(request.location(), Some(&arena()));

    coordinator.end_event().await.unwrap();
    let mut request = event_runtime::RespawnRequest::new(alex.id(), Some(home()));
    coordinator.hooks().dispatch_respawn(&mut request);
    assert_eq!(request.location(), Some(&home()));

    coordinator.shutdown().await.unwrap();
}
