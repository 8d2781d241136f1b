//! End-to-end engine behavior over the shipped demo content.

use roomlore::content::loader;
use roomlore::models::event::Event;
use roomlore::models::player::PlayerSnapshot;
use roomlore::models::types::{Limits, PlayerId, RoomId, SpellClass};
use roomlore::services::rooms::RoomLifecycle;
use roomlore::{GameRng, Scheduler};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

fn demo_content() -> Arc<roomlore::content::ContentStore> {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("content");
    let store = loader::load_dir(&dir).expect("demo content loads");
    assert!(
        loader::verify_references(&store).is_empty(),
        "demo content references resolve"
    );
    Arc::new(store)
}

fn lifecycle(events: mpsc::UnboundedSender<Event>) -> RoomLifecycle {
    RoomLifecycle::new(
        demo_content(),
        Scheduler::spawn(),
        Duration::from_secs(1),
        GameRng::seeded(1),
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

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn unmatched_commands_fall_through() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let rooms = lifecycle(tx);
    let mut player = PlayerSnapshot::new(PlayerId(1), "Nim", RoomId::from("entry"));
    rooms.enter(&mut player, &RoomId::from("entry")).unwrap();
    drain(&mut rx);

    assert!(!rooms.handle_command(&mut player, "juggle", &[]).unwrap());
    assert!(rooms.handle_command(&mut player, "wave", &[]).unwrap());
    let events = drain(&mut rx);
    assert!(events.iter().any(|e| e.message_id.as_deref() == Some("msg_wave")));
    assert!(events.iter().any(|e| e.message_id.as_deref() == Some("msg_wave_room")));
}

#[tokio::test]
async fn commands_in_rooms_without_documents_fall_through() {
    let (tx, _rx) = mpsc::unbounded_channel();
    let rooms = lifecycle(tx);
    let mut player = PlayerSnapshot::new(PlayerId(1), "Nim", RoomId::from("wilds"));
    rooms.enter(&mut player, &RoomId::from("wilds")).unwrap();
    assert!(!rooms.handle_command(&mut player, "wave", &[]).unwrap());
}

#[tokio::test]
async fn password_phrase_transfers_the_player() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let rooms = lifecycle(tx);
    let mut player = PlayerSnapshot::new(PlayerId(1), "Nim", RoomId::from("entry"));
    rooms.enter(&mut player, &RoomId::from("entry")).unwrap();
    drain(&mut rx);

    // normalization forgives case and punctuation
    let claimed = rooms
        .handle_command(&mut player, "say", &args(&["'FRIEND!'"]))
        .unwrap();
    assert!(claimed);
    assert_eq!(player.location, RoomId::from("sanctum"));
    assert_eq!(player.previous_location, RoomId::from("entry"));
    assert_eq!(rooms.occupant_count(&RoomId::from("entry")), 0);
    assert_eq!(rooms.occupant_count(&RoomId::from("sanctum")), 1);

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| e.event == "room_transfer"));
    assert!(events.iter().any(|e| e.event == "room_empty"));
    assert!(events.iter().any(|e| e.event == "player_enter"));
}

#[tokio::test]
async fn spell_shop_debits_gold() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let rooms = lifecycle(tx);
    let mut player = PlayerSnapshot::new(PlayerId(1), "Nim", RoomId::from("sanctum"));
    rooms.enter(&mut player, &RoomId::from("sanctum")).unwrap();
    drain(&mut rx);

    player.gold = 200;
    rooms
        .handle_command(&mut player, "buy", &args(&["the", "spell", "of", "fireball"]))
        .unwrap();
    let events = drain(&mut rx);
    assert!(events.iter().any(|e| e.message_id.as_deref() == Some("msg_shop_poor")));
    assert_eq!(player.gold, 200);

    player.gold = 600;
    rooms
        .handle_command(&mut player, "buy", &args(&["fireball"]))
        .unwrap();
    let events = drain(&mut rx);
    assert!(events.iter().any(|e| e.message_id.as_deref() == Some("msg_shop_done")));
    assert_eq!(player.gold, 100);
    let fireball = rooms.content().spell_by_name("fireball").unwrap().id;
    assert!(player.owns_spell(SpellClass::Offense, fireball));
}

#[tokio::test]
async fn the_stump_rite_rewards_the_twelfth_offering() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let rooms = lifecycle(tx);
    let glade = RoomId::from("stump_glade");

    let mut player = PlayerSnapshot::new(PlayerId(1), "Nim", glade.clone());
    player.level = 5;
    let ruby = rooms.content().object_by_name("ruby").unwrap().id;
    for _ in 0..12 {
        assert!(player.give_item(ruby, 0, 16));
    }

    rooms.enter(&mut player, &glade).unwrap();
    drain(&mut rx);

    for n in 0..12 {
        let claimed = rooms
            .handle_command(&mut player, "put", &args(&["the", "ruby", "into", "the", "stump"]))
            .unwrap();
        assert!(claimed, "offering {n} should match a trigger");
    }

    assert_eq!(player.item_count, 0);
    assert!(player.inventory_consistent());

    let stumplore = rooms.content().spell_by_name("stumplore").unwrap().id;
    assert!(player.owns_spell(SpellClass::Other, stumplore));
    assert!(player.memorized.contains(&stumplore));
    assert_eq!(player.level, 5);

    let events = drain(&mut rx);
    assert!(events.iter().any(|e| e.message_id.as_deref() == Some("msg_stump_reward")));

    // the stump remembers: a look now reports it sated
    rooms
        .handle_command(&mut player, "look", &args(&["stump"]))
        .unwrap();
    let events = drain(&mut rx);
    assert!(events.iter().any(|e| e.message_id.as_deref() == Some("msg_stump_sated")));
}

#[tokio::test]
async fn the_stump_ignores_the_unleveled() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let rooms = lifecycle(tx);
    let glade = RoomId::from("stump_glade");

    let mut player = PlayerSnapshot::new(PlayerId(1), "Nim", glade.clone());
    player.level = 2;
    let ruby = rooms.content().object_by_name("ruby").unwrap().id;
    for _ in 0..12 {
        player.give_item(ruby, 0, 16);
    }
    rooms.enter(&mut player, &glade).unwrap();

    for _ in 0..12 {
        rooms
            .handle_command(&mut player, "put", &args(&["ruby", "into", "stump"]))
            .unwrap();
    }
    let events = drain(&mut rx);
    assert!(events.iter().any(|e| e.message_id.as_deref() == Some("msg_too_green")));
    let stumplore = rooms.content().spell_by_name("stumplore").unwrap().id;
    assert!(!player.owns_spell(SpellClass::Other, stumplore));
}
