use nuggets_core::{
    Action, CellCoord, ClientId, GameConfig, Message, Outbound, PlayerLetter, Step, Tile,
};
use nuggets_game::{apply, occupied_cells, ActionOutcome, Game, Rejection};
use nuggets_world::MapGrid;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const OPEN_ROOM: &str = ".....\n.....\n.....\n.....\n.....\n";

const CORRIDOR_ROOM: &str = "\
+------+\n\
|......|\n\
|......|\n\
+------+\n";

const MAZE: &str = "\
+-----+       +------+\n\
|.....|       |......|\n\
|.....#########......|\n\
|.....|       |......|\n\
+--#--+       +---#--+\n\
\x20  #              #   \n\
\x20  #   +------+   #   \n\
\x20  ####........####   \n\
\x20      |......|       \n\
\x20      +------+       \n";

fn client(id: u64) -> ClientId {
    ClientId::new(id)
}

fn letter(symbol: char) -> PlayerLetter {
    PlayerLetter::from_symbol(symbol).expect("uppercase letter")
}

fn join(name: &str) -> Action {
    Action::Join {
        name: name.to_owned(),
    }
}

fn open_room(size: usize) -> String {
    let row = format!("{}\n", ".".repeat(size));
    row.repeat(size)
}

fn seeded(seed: u64) -> GameConfig {
    GameConfig {
        seed: Some(seed),
        ..GameConfig::default()
    }
}

fn messages_for(out: &[Outbound], to: ClientId) -> Vec<&Message> {
    out.iter()
        .filter(|outbound| outbound.to == to)
        .map(|outbound| &outbound.message)
        .collect()
}

/// Loads `text` with a single gold pile of `amount` at `cell`.
fn grid_with_pile(text: &str, cell: CellCoord, amount: u32) -> MapGrid {
    for seed in 0..10_000 {
        let mut grid = MapGrid::load(text).expect("valid map");
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        grid.nuggets_populate(1, 1, amount, &mut rng)
            .expect("populate");
        if grid.gold_at(cell) == amount {
            return grid;
        }
    }
    panic!("no seed placed the pile at {cell:?}");
}

/// Starts a game on `grid` whose players, joining in order as clients
/// `1..`, spawn on `spawns`.
fn game_with_spawns(grid: &MapGrid, spawns: &[CellCoord]) -> Game {
    'seeds: for seed in 0..200_000 {
        let mut game = Game::with_grid(grid.clone(), seeded(seed));
        let mut out = Vec::new();
        for (offset, expected) in spawns.iter().enumerate() {
            let id = client(offset as u64 + 1);
            let _ = apply(&mut game, id, join("player"), &mut out);
            if game.player_for(id).map(|player| player.position()) != Some(*expected) {
                continue 'seeds;
            }
        }
        return game;
    }
    panic!("no seed spawned players at {spawns:?}");
}

#[test]
fn join_sends_letter_dimensions_gold_and_view() {
    let mut game = Game::new(MAZE, seeded(4)).expect("game starts");
    let mut out = Vec::new();

    let outcome = apply(&mut game, client(1), join("Alice"), &mut out);

    assert_eq!(outcome, ActionOutcome::Applied);
    let received = messages_for(&out, client(1));
    assert_eq!(received[0], &Message::JoinAccepted { letter: letter('A') });
    assert_eq!(received[1], &Message::GridDimensions { rows: 10, columns: 22 });
    assert_eq!(
        received[2],
        &Message::GoldStatus {
            collected: 0,
            purse: 0,
            remaining: 250
        }
    );
    let Message::Display { text } = received[3] else {
        panic!("expected a display, got {:?}", received[3]);
    };
    assert_eq!(text.matches('@').count(), 1);
    assert_eq!(game.players()[0].name(), "Alice");
}

#[test]
fn step_onto_empty_room_moves_the_player() {
    let grid = MapGrid::load(OPEN_ROOM).expect("valid map");
    let mut game = game_with_spawns(&grid, &[CellCoord::new(2, 2)]);
    let mut out = Vec::new();

    let outcome = apply(&mut game, client(1), Action::Move { step: Step::RIGHT }, &mut out);

    assert_eq!(outcome, ActionOutcome::Applied);
    let player = game.player_for(client(1)).expect("active player");
    assert_eq!(player.position(), CellCoord::new(3, 2));
    assert_eq!(player.purse(), 0);
    assert_eq!(game.grid().tile_at(CellCoord::new(2, 2)), Tile::Room);
    assert!(
        out.iter().all(|outbound| !matches!(outbound.message, Message::GoldStatus { .. })),
        "no gold means no gold broadcast"
    );
}

#[test]
fn collecting_the_last_pile_ends_the_game() {
    let grid = grid_with_pile(OPEN_ROOM, CellCoord::new(3, 2), 7);
    let mut game = game_with_spawns(&grid, &[CellCoord::new(2, 2), CellCoord::new(0, 0)]);
    assert_eq!(game.gold_remaining(), 7);
    let mut out = Vec::new();

    let outcome = apply(&mut game, client(1), Action::Move { step: Step::RIGHT }, &mut out);

    assert_eq!(outcome, ActionOutcome::GameOver);
    assert!(game.is_over());
    assert_eq!(game.gold_remaining(), 0);
    assert_eq!(game.players()[0].purse(), 7);

    let mover = messages_for(&out, client(1));
    let other = messages_for(&out, client(2));
    assert!(mover.contains(&&Message::GoldStatus {
        collected: 7,
        purse: 7,
        remaining: 0
    }));
    assert!(other.contains(&&Message::GoldStatus {
        collected: 0,
        purse: 0,
        remaining: 0
    }));

    let Some(Message::GameOver { summary }) = mover.last() else {
        panic!("mover must finish with the summary");
    };
    assert_eq!(summary.len(), 2);
    assert_eq!((summary[0].letter, summary[0].purse), (letter('A'), 7));
    assert_eq!((summary[1].letter, summary[1].purse), (letter('B'), 0));
    assert!(matches!(other.last(), Some(Message::GameOver { .. })));
}

#[test]
fn actions_after_game_over_are_ignored() {
    let grid = grid_with_pile(OPEN_ROOM, CellCoord::new(3, 2), 7);
    let mut game = game_with_spawns(&grid, &[CellCoord::new(2, 2)]);
    let mut out = Vec::new();
    let _ = apply(&mut game, client(1), Action::Move { step: Step::RIGHT }, &mut out);
    out.clear();

    assert_eq!(
        apply(&mut game, client(1), Action::Move { step: Step::LEFT }, &mut out),
        ActionOutcome::Ignored
    );
    assert_eq!(apply(&mut game, client(9), join("late"), &mut out), ActionOutcome::Ignored);
    assert!(out.is_empty());
}

#[test]
fn moving_into_another_player_swaps_them() {
    let grid = MapGrid::load(OPEN_ROOM).expect("valid map");
    let (a, b) = (CellCoord::new(2, 2), CellCoord::new(3, 2));
    let mut game = game_with_spawns(&grid, &[a, b]);
    let mut out = Vec::new();

    let outcome = apply(&mut game, client(1), Action::Move { step: Step::RIGHT }, &mut out);

    assert_eq!(outcome, ActionOutcome::Applied);
    assert_eq!(game.player_for(client(1)).map(|p| p.position()), Some(b));
    assert_eq!(game.player_for(client(2)).map(|p| p.position()), Some(a));
    assert_eq!(game.grid().tile_at(b), Tile::Player(letter('A')));
    assert_eq!(game.grid().tile_at(a), Tile::Player(letter('B')));
    assert_eq!(messages_for(&out, client(2)).len(), 1, "both views are refreshed");
}

#[test]
fn slide_swaps_through_another_player_and_continues() {
    let grid = MapGrid::load(".......\n").expect("valid map");
    let mut game = game_with_spawns(&grid, &[CellCoord::new(0, 0), CellCoord::new(3, 0)]);
    let mut out = Vec::new();

    let outcome = apply(&mut game, client(1), Action::Slide { step: Step::RIGHT }, &mut out);

    assert_eq!(outcome, ActionOutcome::Applied);
    assert_eq!(game.player_for(client(1)).map(|p| p.position()), Some(CellCoord::new(6, 0)));
    assert_eq!(game.player_for(client(2)).map(|p| p.position()), Some(CellCoord::new(2, 0)));
    assert_eq!(game.grid().display(), "..B...A\n");
    assert_eq!(messages_for(&out, client(2)).len(), 1, "one refresh per slide");
}

#[test]
fn blocked_moves_change_nothing() {
    let grid = MapGrid::load(CORRIDOR_ROOM).expect("valid map");
    let start = CellCoord::new(1, 1);
    let mut game = game_with_spawns(&grid, &[start]);
    let before = game.grid().display();
    let mut out = Vec::new();

    for step in [Step::LEFT, Step::UP, Step::UP_LEFT] {
        assert_eq!(
            apply(&mut game, client(1), Action::Move { step }, &mut out),
            ActionOutcome::Rejected(Rejection::Blocked)
        );
        assert_eq!(
            apply(&mut game, client(1), Action::Slide { step }, &mut out),
            ActionOutcome::Rejected(Rejection::Blocked)
        );
    }
    assert!(out.is_empty());
    assert_eq!(game.grid().display(), before);
    assert_eq!(game.player_for(client(1)).map(|p| p.position()), Some(start));
}

#[test]
fn slide_stops_at_the_wall_and_sums_gold() {
    for seed in 0..5_000 {
        let mut game = Game::new(
            CORRIDOR_ROOM,
            GameConfig {
                gold_total: 30,
                min_piles: 3,
                max_piles: 6,
                seed: Some(seed),
                ..GameConfig::default()
            },
        )
        .expect("game starts");
        let mut out = Vec::new();
        let _ = apply(&mut game, client(1), join("slider"), &mut out);
        if game.player_for(client(1)).map(|p| p.position()) != Some(CellCoord::new(1, 1)) {
            continue;
        }
        let along_row: u32 = (2..=6)
            .map(|column| game.grid().gold_at(CellCoord::new(column, 1)))
            .sum();
        out.clear();

        let outcome = apply(&mut game, client(1), Action::Slide { step: Step::RIGHT }, &mut out);

        let player = &game.players()[0];
        assert_eq!(player.position(), CellCoord::new(6, 1));
        assert_eq!(player.purse(), along_row);
        assert_eq!(game.gold_remaining(), 30 - along_row);
        let gold_updates = out
            .iter()
            .filter(|outbound| matches!(outbound.message, Message::GoldStatus { .. }))
            .count();
        assert_eq!(gold_updates, usize::from(along_row > 0), "one broadcast per slide");
        let expected = if game.gold_remaining() == 0 {
            ActionOutcome::GameOver
        } else {
            ActionOutcome::Applied
        };
        assert_eq!(outcome, expected);
        return;
    }
    panic!("no seed spawned the slider at the west wall");
}

#[test]
fn gold_is_conserved_across_random_play() {
    let config = GameConfig {
        gold_total: 120,
        min_piles: 5,
        max_piles: 15,
        seed: Some(21),
        ..GameConfig::default()
    };
    let mut game = Game::new(MAZE, config).expect("game starts");
    let mut out = Vec::new();
    for id in 1..=3 {
        assert_eq!(apply(&mut game, client(id), join("walker"), &mut out), ActionOutcome::Applied);
    }

    let steps = [
        Step::LEFT,
        Step::RIGHT,
        Step::UP,
        Step::DOWN,
        Step::UP_LEFT,
        Step::UP_RIGHT,
        Step::DOWN_LEFT,
        Step::DOWN_RIGHT,
    ];
    let mut rng = ChaCha8Rng::seed_from_u64(77);
    for _ in 0..3_000 {
        let id = client(rng.gen_range(1..=3));
        let step = steps[rng.gen_range(0..steps.len())];
        let action = if rng.gen_bool(0.2) {
            Action::Slide { step }
        } else {
            Action::Move { step }
        };
        out.clear();
        let outcome = apply(&mut game, id, action, &mut out);

        let purses: u32 = game.players().iter().map(|player| player.purse()).sum();
        assert_eq!(game.grid().total_gold() + purses, 120);
        assert_eq!(game.gold_remaining(), game.grid().total_gold());
        if outcome == ActionOutcome::GameOver {
            return;
        }
        for (letter, cell) in occupied_cells(&game) {
            assert_eq!(game.grid().tile_at(cell), Tile::Player(letter));
        }
    }
}

#[test]
fn blank_names_are_rejected() {
    let mut game = Game::new(MAZE, seeded(1)).expect("game starts");
    let mut out = Vec::new();

    let outcome = apply(&mut game, client(1), join("  \t "), &mut out);

    assert_eq!(outcome, ActionOutcome::Rejected(Rejection::EmptyName));
    assert_eq!(
        out,
        vec![Outbound::new(
            client(1),
            Message::JoinRejected {
                reason: "Sorry - you must provide player's name.".to_owned()
            }
        )]
    );
    assert!(game.players().is_empty());
}

#[test]
fn twenty_seventh_player_is_turned_away() {
    let mut game = Game::new(&open_room(10), seeded(2)).expect("game starts");
    let mut out = Vec::new();
    for id in 1..=26 {
        assert_eq!(apply(&mut game, client(id), join("crowd"), &mut out), ActionOutcome::Applied);
    }
    assert_eq!(game.players()[25].letter(), letter('Z'));
    out.clear();

    let outcome = apply(&mut game, client(27), join("late"), &mut out);

    assert_eq!(outcome, ActionOutcome::Rejected(Rejection::GameFull));
    assert_eq!(
        messages_for(&out, client(27)),
        vec![&Message::JoinRejected {
            reason: "Game is full: no more players can join.".to_owned()
        }]
    );
    assert_eq!(game.grid().player_count(), 26);
}

#[test]
fn configured_capacity_is_honoured() {
    let config = GameConfig {
        max_players: 1,
        ..seeded(3)
    };
    let mut game = Game::new(MAZE, config).expect("game starts");
    let mut out = Vec::new();
    let _ = apply(&mut game, client(1), join("solo"), &mut out);
    assert_eq!(
        apply(&mut game, client(2), join("second"), &mut out),
        ActionOutcome::Rejected(Rejection::GameFull)
    );
}

#[test]
fn leaving_retires_the_letter() {
    let mut game = Game::new(MAZE, seeded(5)).expect("game starts");
    let mut out = Vec::new();
    let _ = apply(&mut game, client(1), join("first"), &mut out);
    let cell = game.players()[0].position();
    out.clear();

    assert_eq!(apply(&mut game, client(1), Action::Leave, &mut out), ActionOutcome::Applied);
    assert_eq!(
        messages_for(&out, client(1)),
        vec![&Message::Quit {
            reason: "Thanks for playing!".to_owned()
        }]
    );
    assert_eq!(game.grid().tile_at(cell), Tile::Room);
    assert!(!game.players()[0].is_active());
    assert!(game.player_for(client(1)).is_none());

    assert_eq!(
        apply(&mut game, client(1), Action::Move { step: Step::LEFT }, &mut out),
        ActionOutcome::Ignored
    );
    let _ = apply(&mut game, client(2), join("second"), &mut out);
    assert_eq!(game.player_for(client(2)).map(|p| p.letter()), Some(letter('B')));
}

#[test]
fn joining_twice_is_refused() {
    let mut game = Game::new(MAZE, seeded(6)).expect("game starts");
    let mut out = Vec::new();
    let _ = apply(&mut game, client(1), join("twice"), &mut out);
    assert_eq!(
        apply(&mut game, client(1), join("twice"), &mut out),
        ActionOutcome::Rejected(Rejection::AlreadyPlaying)
    );
    assert_eq!(game.players().len(), 1);
}

#[test]
fn spectator_sees_the_whole_map_and_can_be_replaced() {
    let mut game = Game::new(MAZE, seeded(7)).expect("game starts");
    let mut out = Vec::new();

    assert_eq!(apply(&mut game, client(10), Action::Spectate, &mut out), ActionOutcome::Applied);
    assert_eq!(
        messages_for(&out, client(10)),
        vec![
            &Message::GridDimensions { rows: 10, columns: 22 },
            &Message::GoldStatus {
                collected: 0,
                purse: 0,
                remaining: 250
            },
            &Message::Display {
                text: game.grid().display()
            },
        ]
    );
    out.clear();

    let _ = apply(&mut game, client(11), Action::Spectate, &mut out);
    assert_eq!(game.spectator(), Some(client(11)));
    assert_eq!(
        messages_for(&out, client(10)),
        vec![&Message::Quit {
            reason: "You have been replaced by a new spectator.".to_owned()
        }]
    );
    out.clear();

    let _ = apply(&mut game, client(1), join("watched"), &mut out);
    assert!(
        messages_for(&out, client(11))
            .iter()
            .any(|message| matches!(message, Message::Display { text } if text.contains('A'))),
        "spectator sees the new player on the full map"
    );

    out.clear();
    assert_eq!(apply(&mut game, client(11), Action::Leave, &mut out), ActionOutcome::Applied);
    assert_eq!(
        out,
        vec![Outbound::new(
            client(11),
            Message::Quit {
                reason: "Thanks for watching!".to_owned()
            }
        )]
    );
    assert_eq!(game.spectator(), None);
}

#[test]
fn unknown_clients_are_ignored() {
    let mut game = Game::new(MAZE, seeded(8)).expect("game starts");
    let mut out = Vec::new();
    assert_eq!(
        apply(&mut game, client(3), Action::Move { step: Step::UP }, &mut out),
        ActionOutcome::Ignored
    );
    assert_eq!(
        apply(&mut game, client(3), Action::Slide { step: Step::UP }, &mut out),
        ActionOutcome::Ignored
    );
    assert_eq!(apply(&mut game, client(3), Action::Leave, &mut out), ActionOutcome::Ignored);
    assert!(out.is_empty());
}

#[test]
fn unplaceable_gold_fails_at_startup() {
    let config = GameConfig {
        min_piles: 5,
        max_piles: 40,
        ..GameConfig::default()
    };
    assert!(Game::new(CORRIDOR_ROOM, config).is_err());
    assert!(Game::new("", GameConfig::default()).is_err());
}
