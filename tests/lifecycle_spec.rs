//! Room lifecycle: occupancy, ambience timers, teardown, hot reload.

use roomlore::content::ContentStore;
use roomlore::models::event::Event;
use roomlore::models::player::PlayerSnapshot;
use roomlore::models::room::RoomDefinition;
use roomlore::models::types::{Limits, PlayerId, RoomId};
use roomlore::services::rooms::RoomLifecycle;
use roomlore::{GameRng, Scheduler};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn room(yaml: &str) -> RoomDefinition {
    serde_yaml::from_str(yaml).unwrap()
}

fn store(rooms: Vec<RoomDefinition>) -> Arc<ContentStore> {
    Arc::new(ContentStore::from_parts(vec![], vec![], HashMap::new(), rooms).unwrap())
}

fn lifecycle(content: Arc<ContentStore>, events: mpsc::UnboundedSender<Event>) -> RoomLifecycle {
    RoomLifecycle::new(
        content,
        Scheduler::spawn(),
        Duration::from_secs(1),
        GameRng::seeded(5),
        Limits::default(),
        events,
    )
}

fn drain(rx: &mut mpsc::UnboundedReceiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}

fn den() -> RoomDefinition {
    room(concat!(
        "id: den\n",
        "ambience:\n",
        "  - name: drip\n",
        "    every: 2\n",
        "    messages: [\"Water drips from the ceiling.\"]\n",
        "on_enter:\n",
        "  - type: message\n",
        "    direct: \"It is dark in here.\"\n",
        "on_exit:\n",
        "  - type: message\n",
        "    room: \"%p gropes for the way out.\"\n",
        "triggers:\n",
        "  - verbs: [knock]\n",
        "    actions:\n",
        "      - type: increment_room_state\n",
        "        key: knocks\n",
    ))
}

#[tokio::test(start_paused = true)]
async fn enter_announces_and_counts() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let rooms = lifecycle(store(vec![den()]), tx);
    let den_id = RoomId::from("den");

    let mut a = PlayerSnapshot::new(PlayerId(1), "Ash", den_id.clone());
    let mut b = PlayerSnapshot::new(PlayerId(2), "Bel", den_id.clone());
    rooms.enter(&mut a, &den_id).unwrap();
    rooms.enter(&mut b, &den_id).unwrap();

    assert_eq!(rooms.occupant_count(&den_id), 2);
    let events = drain(&mut rx);
    let enters: Vec<_> = events.iter().filter(|e| e.event == "player_enter").collect();
    assert_eq!(enters.len(), 2);
    assert_eq!(enters[0].exclude_player, Some(PlayerId(1)));
    // on-enter hook fired for both
    assert_eq!(
        events
            .iter()
            .filter(|e| e.text.as_deref() == Some("It is dark in here."))
            .count(),
        2
    );
}

#[tokio::test(start_paused = true)]
async fn ambience_runs_only_while_occupied() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let rooms = lifecycle(store(vec![den()]), tx);
    let den_id = RoomId::from("den");

    let mut player = PlayerSnapshot::new(PlayerId(1), "Ash", den_id.clone());
    rooms.enter(&mut player, &den_id).unwrap();
    drain(&mut rx);

    // every 2 ticks at a 1s tick: at least two firings in 5s
    tokio::time::sleep(Duration::from_millis(5200)).await;
    let ambient = drain(&mut rx)
        .into_iter()
        .filter(|e| e.event == "ambience")
        .count();
    assert!(ambient >= 2, "expected ambience while occupied, saw {ambient}");

    rooms.exit(&mut player, &den_id).unwrap();
    let events = drain(&mut rx);
    assert!(events.iter().any(|e| e.event == "room_empty"));
    assert!(!rooms.room_is_active(&den_id));

    tokio::time::sleep(Duration::from_secs(10)).await;
    let ambient_after = drain(&mut rx)
        .into_iter()
        .filter(|e| e.event == "ambience")
        .count();
    assert_eq!(ambient_after, 0, "dormant rooms must not tick");
}

#[tokio::test(start_paused = true)]
async fn second_occupant_does_not_rearm_ambience() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let rooms = lifecycle(store(vec![den()]), tx);
    let den_id = RoomId::from("den");

    let mut a = PlayerSnapshot::new(PlayerId(1), "Ash", den_id.clone());
    let mut b = PlayerSnapshot::new(PlayerId(2), "Bel", den_id.clone());
    rooms.enter(&mut a, &den_id).unwrap();
    rooms.enter(&mut b, &den_id).unwrap();
    drain(&mut rx);

    tokio::time::sleep(Duration::from_millis(4100)).await;
    let ambient = drain(&mut rx)
        .into_iter()
        .filter(|e| e.event == "ambience")
        .count();
    // one timer, firing every 2s: exactly twice in 4.1s
    assert_eq!(ambient, 2);

    // first leaves, room stays active for the second
    rooms.exit(&mut a, &den_id).unwrap();
    assert!(rooms.room_is_active(&den_id));
    drain(&mut rx);
    tokio::time::sleep(Duration::from_millis(2100)).await;
    assert!(drain(&mut rx).iter().any(|e| e.event == "ambience"));
}

#[tokio::test(start_paused = true)]
async fn exit_hook_runs_and_state_survives_until_empty() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let rooms = lifecycle(store(vec![den()]), tx);
    let den_id = RoomId::from("den");

    let mut a = PlayerSnapshot::new(PlayerId(1), "Ash", den_id.clone());
    let mut b = PlayerSnapshot::new(PlayerId(2), "Bel", den_id.clone());
    rooms.enter(&mut a, &den_id).unwrap();
    rooms.enter(&mut b, &den_id).unwrap();
    rooms.handle_command(&mut a, "knock", &[]).unwrap();
    drain(&mut rx);

    rooms.exit(&mut a, &den_id).unwrap();
    let events = drain(&mut rx);
    assert!(events.iter().any(|e| e.text.as_deref() == Some("Ash gropes for the way out.")));
    assert!(events.iter().all(|e| e.event != "room_empty"));
    assert!(rooms.room_is_active(&den_id));

    rooms.exit(&mut b, &den_id).unwrap();
    assert!(drain(&mut rx).iter().any(|e| e.event == "room_empty"));
    assert!(!rooms.room_is_active(&den_id));
}

#[tokio::test(start_paused = true)]
async fn reload_swaps_rules_without_touching_state() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let rooms = lifecycle(store(vec![den()]), tx);
    let den_id = RoomId::from("den");

    let mut player = PlayerSnapshot::new(PlayerId(1), "Ash", den_id.clone());
    rooms.enter(&mut player, &den_id).unwrap();
    rooms.handle_command(&mut player, "knock", &[]).unwrap();
    rooms.handle_command(&mut player, "knock", &[]).unwrap();
    drain(&mut rx);

    // the knock trigger is gone; a kick trigger reads the old counter
    let reloaded = room(concat!(
        "id: den\n",
        "triggers:\n",
        "  - verbs: [kick]\n",
        "    room_state_min: {key: knocks, value: 2}\n",
        "    actions:\n",
        "      - type: message\n",
        "        direct: \"The door finally gives way.\"\n",
    ));
    rooms.reload(store(vec![reloaded]));

    assert!(!rooms.handle_command(&mut player, "knock", &[]).unwrap());
    assert!(rooms.handle_command(&mut player, "kick", &[]).unwrap());
    let events = drain(&mut rx);
    assert!(events.iter().any(|e| e.text.as_deref() == Some("The door finally gives way.")));
    // occupancy was untouched by the reload
    assert_eq!(rooms.occupant_count(&den_id), 1);
}
