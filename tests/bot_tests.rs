// Request-level tests for the HTTP bot
//
// These call the Bot methods directly, exactly as the Rocket handlers do.

use tron_lookahead::arena::Arena;
use tron_lookahead::bot::Bot;
use tron_lookahead::config::Config;
use tron_lookahead::types::Coord;

const MOVES: [&str; 4] = ["up", "down", "left", "right"];

fn duel_state() -> tron_lookahead::types::GameState {
    Arena::new(10, 10, &[Coord::new(1, 1), Coord::new(8, 8)]).to_game_state("duel", 0, 100)
}

#[test]
fn test_info_reports_metadata() {
    let bot = Bot::new(Config::default_hardcoded());
    let info = bot.info();
    assert_eq!(info["apiversion"], "1");
    assert_eq!(info["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_game_lifecycle() {
    let bot = Bot::new(Config::default_hardcoded());
    let state = duel_state();

    bot.start(&state);
    assert_eq!(bot.active_games(), 1);

    let response = bot.get_move(&state).await;
    let chosen = response["move"].as_str().unwrap();
    assert!(MOVES.contains(&chosen), "unexpected move {}", chosen);
    assert_eq!(bot.active_games(), 1);

    bot.end(&state);
    assert_eq!(bot.active_games(), 0);
}

#[tokio::test]
async fn test_move_without_start_creates_agent() {
    let bot = Bot::new(Config::default_hardcoded());
    let response = bot.get_move(&duel_state()).await;
    assert!(MOVES.contains(&response["move"].as_str().unwrap()));
    assert_eq!(bot.active_games(), 1);
}

#[tokio::test]
async fn test_walled_in_request_repeats_last_move() {
    let mut arena = Arena::new(7, 7, &[Coord::new(3, 3), Coord::new(0, 0)]);
    for c in &[(3, 2), (3, 4), (2, 3), (4, 3)] {
        arena.place_wall(Coord::new(c.0, c.1));
    }
    let bot = Bot::new(Config::default_hardcoded());
    let response = bot.get_move(&arena.to_game_state("boxed", 0, 100)).await;
    assert_eq!(response["move"], "up");
}

#[tokio::test]
async fn test_malformed_board_is_answered_without_agent() {
    let bot = Bot::new(Config::default_hardcoded());
    let mut state = duel_state();
    state.board.rows.pop();

    bot.start(&state);
    assert_eq!(bot.active_games(), 0);

    let response = bot.get_move(&state).await;
    assert_eq!(response["move"], "up");
    assert_eq!(bot.active_games(), 0);
}

#[tokio::test]
async fn test_request_without_clock_uses_configured_turn_time() {
    let bot = Bot::new(Config::default_hardcoded());
    let mut value = serde_json::to_value(duel_state()).unwrap();
    value.as_object_mut().unwrap().remove("remaining_time");

    let parsed: tron_lookahead::types::GameState = serde_json::from_value(value).unwrap();
    assert_eq!(parsed.remaining_time, None);

    let response = bot.get_move(&parsed).await;
    assert!(MOVES.contains(&response["move"].as_str().unwrap()));
}

#[tokio::test]
async fn test_malformed_mid_game_request_keeps_agent() {
    let bot = Bot::new(Config::default_hardcoded());
    let state = duel_state();
    bot.start(&state);

    let first = bot.get_move(&state).await;
    let first_move = first["move"].as_str().unwrap().to_string();
    let carried = bot.agent_state("duel").unwrap();
    assert!(carried.prev_positions.is_some());

    let mut truncated = duel_state();
    truncated.turn = 1;
    truncated.board.rows.pop();
    let response = bot.get_move(&truncated).await;
    assert_eq!(response["move"], first_move.as_str());
    assert_eq!(bot.active_games(), 1);
    assert_eq!(bot.agent_state("duel").unwrap(), carried);

    let mut shrunk = duel_state();
    shrunk.turn = 1;
    shrunk.board.players.pop();
    let response = bot.get_move(&shrunk).await;
    assert_eq!(response["move"], first_move.as_str());
    assert_eq!(bot.active_games(), 1);
    assert_eq!(bot.agent_state("duel").unwrap(), carried);
}

#[tokio::test]
async fn test_request_for_other_board_size_is_rejected() {
    let bot = Bot::new(Config::default_hardcoded());
    bot.start(&duel_state());

    let other = Arena::new(12, 12, &[Coord::new(1, 1), Coord::new(8, 8)]).to_game_state("duel", 0, 100);
    let response = bot.get_move(&other).await;

    assert_eq!(response["move"], "up");
    let carried = bot.agent_state("duel").unwrap();
    assert_eq!(carried.prev_positions, None);
    assert_eq!(carried.budget, 101);
}

#[tokio::test]
async fn test_concurrent_moves_for_one_game_share_the_agent() {
    let bot = Bot::new(Config::default_hardcoded());
    let state = duel_state();
    bot.start(&state);

    let (a, b) = tokio::join!(bot.get_move(&state), bot.get_move(&state));
    assert!(MOVES.contains(&a["move"].as_str().unwrap()));
    assert!(MOVES.contains(&b["move"].as_str().unwrap()));
    assert_eq!(bot.active_games(), 1);

    // The second request saw the first one's positions unchanged, so it
    // treated every player as gone.
    let carried = bot.agent_state("duel").unwrap();
    assert_eq!(carried.prev_positions, Some(vec![None, None]));
}
