use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use gridpaint_web_app::game::error::GameError;
use gridpaint_web_app::game::player::PlayerStatus;
use gridpaint_web_app::game::session::{GameSession, SessionConfig, SessionStatus};
use gridpaint_web_app::game::timer;
use gridpaint_web_app::models::AppState;
use gridpaint_web_app::websocket::discard_unjoined_sessions;

fn rng() -> StdRng {
    StdRng::seed_from_u64(99)
}

fn two_player_session(board_size: i32) -> GameSession {
    let mut rng = rng();
    let mut session = GameSession::new(
        "flow",
        SessionConfig {
            max_players: 4,
            time_limit_seconds: 60,
            board_size,
        },
    );
    session.add_player("a", "Ann", &mut rng).unwrap();
    session.add_player("b", "Ben", &mut rng).unwrap();
    session
}

#[test]
fn two_players_paint_their_way_across_the_board() {
    let mut rng = rng();
    let mut session = two_player_session(10);
    session.start(&mut rng).unwrap();
    assert_eq!(session.status, SessionStatus::Playing);

    // Pin the scenario down: clear the randomized spawns and place the
    // players at known positions.
    session.board.reset();
    let a = session.players.get_mut("a").unwrap();
    a.x = 2;
    a.y = 2;
    let b = session.players.get_mut("b").unwrap();
    b.x = 5;
    b.y = 5;
    let base = session.players["a"].score;
    let red = session.players["a"].color.clone();

    let outcome = session.apply_move("a", 3, 3, &mut rng).unwrap();
    assert!(outcome.painted);
    assert_eq!(outcome.player.score, base + 1);
    assert_eq!((outcome.player.x, outcome.player.y), (3, 3));
    assert_eq!(session.board.get(3, 3).unwrap().owner.as_ref(), Some(&red));
    assert_eq!(session.players["b"].status, PlayerStatus::Active);

    // A reseed may have dropped a power-up anywhere open; keep the second
    // hop a plain paint.
    session.board.get_mut(4, 4).unwrap().power_up = None;
    let outcome = session.apply_move("a", 4, 4, &mut rng).unwrap();
    assert!(outcome.painted);
    assert_eq!(outcome.player.score, base + 2);
    assert_eq!(session.board.get(4, 4).unwrap().owner.as_ref(), Some(&red));
}

#[test]
fn a_full_session_rejects_the_third_join() {
    let mut rng = rng();
    let mut session = GameSession::new(
        "full",
        SessionConfig {
            max_players: 2,
            time_limit_seconds: 60,
            board_size: 10,
        },
    );
    session.add_player("a", "Ann", &mut rng).unwrap();
    session.add_player("b", "Ben", &mut rng).unwrap();
    assert_eq!(
        session.add_player("c", "Cam", &mut rng).unwrap_err(),
        GameError::SessionFull
    );
    assert_eq!(session.players.len(), 2);
}

#[test]
fn moves_in_a_waiting_session_change_nothing() {
    let mut rng = rng();
    let mut session = two_player_session(10);
    let scores: Vec<u32> = session.players.values().map(|p| p.score).collect();
    let err = session.apply_move("a", 3, 3, &mut rng).unwrap_err();
    assert_eq!(err, GameError::GameNotActive);
    assert!(session.board.tiles().iter().all(|t| t.owner.is_none()));
    let after: Vec<u32> = session.players.values().map(|p| p.score).collect();
    assert_eq!(scores, after);
}

#[actix_rt::test]
async fn a_stunned_player_recovers_when_the_timer_fires() {
    let mut rng = rng();
    let mut session = two_player_session(10);
    session.start(&mut rng).unwrap();
    session.players.get_mut("b").unwrap().status = PlayerStatus::Stunned;
    let session = Arc::new(Mutex::new(session));

    let revived = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&revived);
    let shared = Arc::clone(&session);
    let handle = timer::schedule(Duration::from_millis(20), move |fired| {
        if shared.lock().unwrap().expire_stun("b", &fired) {
            seen.store(true, Ordering::SeqCst);
        }
    });
    session.lock().unwrap().set_stun_timer("b", handle);

    actix_rt::time::sleep(Duration::from_millis(80)).await;
    assert!(revived.load(Ordering::SeqCst));
    assert_eq!(
        session.lock().unwrap().players["b"].status,
        PlayerStatus::Active
    );
}

#[actix_rt::test]
async fn removing_a_stunned_player_cancels_the_pending_expiry() {
    let mut rng = rng();
    let mut session = two_player_session(10);
    session.start(&mut rng).unwrap();
    session.players.get_mut("b").unwrap().status = PlayerStatus::Stunned;
    let session = Arc::new(Mutex::new(session));

    let revived = Arc::new(AtomicBool::new(false));
    let seen = Arc::clone(&revived);
    let shared = Arc::clone(&session);
    let handle = timer::schedule(Duration::from_millis(20), move |fired| {
        if shared.lock().unwrap().expire_stun("b", &fired) {
            seen.store(true, Ordering::SeqCst);
        }
    });
    session.lock().unwrap().set_stun_timer("b", handle);
    session.lock().unwrap().remove_player("b").unwrap();

    actix_rt::time::sleep(Duration::from_millis(80)).await;
    assert!(!revived.load(Ordering::SeqCst));
    assert!(!session.lock().unwrap().players.contains_key("b"));
}

#[actix_rt::test]
async fn the_session_clock_finishes_a_playing_game() {
    let mut rng = rng();
    let mut session = two_player_session(10);
    session.start(&mut rng).unwrap();
    let session = Arc::new(Mutex::new(session));

    let shared = Arc::clone(&session);
    let handle = timer::schedule(Duration::from_millis(20), move |fired| {
        shared.lock().unwrap().expire_clock(&fired);
    });
    session.lock().unwrap().set_clock(handle);

    actix_rt::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(session.lock().unwrap().status, SessionStatus::Finished);
}

#[actix_rt::test]
async fn restart_cancels_the_session_clock() {
    let mut rng = rng();
    let mut session = two_player_session(10);
    session.start(&mut rng).unwrap();
    let session = Arc::new(Mutex::new(session));

    let shared = Arc::clone(&session);
    let handle = timer::schedule(Duration::from_millis(20), move |fired| {
        shared.lock().unwrap().expire_clock(&fired);
    });
    session.lock().unwrap().set_clock(handle);
    session.lock().unwrap().restart();

    actix_rt::time::sleep(Duration::from_millis(80)).await;
    let session = session.lock().unwrap();
    assert_eq!(session.status, SessionStatus::Waiting);
    assert!(session.players.values().all(|p| p.score == 0));
}

#[test]
fn a_finished_session_rejects_a_direct_start() {
    let mut rng = rng();
    let mut session = two_player_session(10);
    session.start(&mut rng).unwrap();
    let clock = timer::TimerHandle::new();
    session.set_clock(clock.clone());
    assert!(session.expire_clock(&clock));
    assert_eq!(session.status, SessionStatus::Finished);

    let scores: Vec<u32> = session.players.values().map(|p| p.score).collect();
    assert_eq!(
        session.start(&mut rng).unwrap_err(),
        GameError::SessionFinished
    );
    let after: Vec<u32> = session.players.values().map(|p| p.score).collect();
    assert_eq!(scores, after);
}

#[test]
fn sessions_nobody_joined_are_dropped_with_their_creator() {
    let app_state = AppState::new();
    for (id, peers) in [("unjoined", vec![]), ("occupied", vec!["peer".to_string()])] {
        app_state.sessions.lock().unwrap().insert(
            id.to_string(),
            GameSession::new(id, SessionConfig::default()),
        );
        app_state
            .rooms
            .lock()
            .unwrap()
            .insert(id.to_string(), peers);
    }

    discard_unjoined_sessions(
        &app_state,
        &["unjoined".to_string(), "occupied".to_string()],
    );

    let sessions = app_state.sessions.lock().unwrap();
    let rooms = app_state.rooms.lock().unwrap();
    assert!(!sessions.contains_key("unjoined"));
    assert!(!rooms.contains_key("unjoined"));
    assert!(sessions.contains_key("occupied"));
    assert!(rooms.contains_key("occupied"));
}
