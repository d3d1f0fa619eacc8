use playwise::engine::{EngineError, PositionBase, SamePositionMove, SongEdit};
use playwise::engine::{SortAlgorithm, SortCriterion};
use playwise::model::{Song, SongId};
use playwise::validation::check_consistency;
use playwise::{EngineConfig, PlaylistEngine};

/// Build the three-song playlist used across scenarios
fn abc_playlist() -> (PlaylistEngine, SongId, SongId, SongId) {
    let mut engine = PlaylistEngine::default();
    let a = engine.add_song("A", "Artist A", 180, 4).unwrap();
    let b = engine.add_song("B", "Artist B", 90, 5).unwrap();
    let c = engine.add_song("C", "Artist C", 240, 3).unwrap();
    (engine, a, b, c)
}

fn ids(songs: &[Song]) -> Vec<SongId> {
    songs.iter().map(|s| s.id).collect()
}

fn order(engine: &PlaylistEngine) -> Vec<SongId> {
    engine.iter().map(|s| s.id).collect()
}

#[test]
fn test_shortest_longest_and_rating_query() {
    let (mut engine, a, b, c) = abc_playlist();

    assert_eq!(engine.shortest().unwrap().id, b);
    assert_eq!(engine.longest().unwrap().id, c);
    assert_eq!(ids(&engine.query_by_rating(5).unwrap()), vec![b]);
    assert_eq!(ids(&engine.query_by_rating(4).unwrap()), vec![a]);
}

#[test]
fn test_remove_then_undo_restores_song_exactly() {
    let (mut engine, a, b, c) = abc_playlist();
    let original = engine.get_song(a).unwrap();

    engine.remove_song(a).unwrap();
    assert_eq!(order(&engine), vec![b, c]);

    engine.undo_last().unwrap();
    assert_eq!(order(&engine), vec![a, b, c]);
    assert_eq!(engine.get_song(a).unwrap(), original);
    check_consistency(&engine).unwrap();
}

#[test]
fn test_rerating_moves_song_between_buckets() {
    let (mut engine, a, _, _) = abc_playlist();

    engine.rate_song(a, 2).unwrap();
    assert!(!ids(&engine.query_by_rating(4).unwrap()).contains(&a));
    assert!(ids(&engine.query_by_rating(2).unwrap()).contains(&a));
}

#[test]
fn test_undo_on_empty_history_is_idempotent() {
    let mut engine = PlaylistEngine::default();
    for _ in 0..3 {
        assert_eq!(engine.undo_last(), Err(EngineError::NothingToUndo));
    }
    assert!(engine.is_empty());
    assert_eq!(engine.history_len(), 0);
}

#[test]
fn test_add_then_undo_restores_prior_state() {
    let (mut engine, a, b, c) = abc_playlist();
    let before = engine.full_snapshot().without_metrics();

    engine.add_song("D", "Artist D", 60, 1).unwrap();
    engine.undo_last().unwrap();

    let after = engine.full_snapshot().without_metrics();
    assert_eq!(before, after);
    assert_eq!(order(&engine), vec![a, b, c]);
    check_consistency(&engine).unwrap();
}

#[test]
fn test_blocked_artist_cannot_be_added_until_unblocked() {
    let mut engine = PlaylistEngine::default();
    engine.block_artist("X").unwrap();

    for duration in [10, 200, 3000] {
        assert_eq!(
            engine.add_song("Song", "X", duration, 3),
            Err(EngineError::BlockedArtist("X".to_string()))
        );
    }
    assert!(engine.is_empty());

    engine.unblock_artist("X");
    assert!(engine.add_song("Song", "X", 10, 3).is_ok());
}

#[test]
fn test_blocked_artist_hidden_from_searches_until_unblocked() {
    let mut engine = PlaylistEngine::default();
    let hit = engine.add_song("Hit", "X", 100, 4).unwrap();
    let other = engine.add_song("Other", "Y", 100, 4).unwrap();

    engine.block_artist("X").unwrap();
    assert_eq!(ids(&engine.query_by_rating(4).unwrap()), vec![other]);
    assert!(engine.search_by_title("Hit").is_empty());

    engine.unblock_artist("X");
    assert_eq!(ids(&engine.query_by_rating(4).unwrap()), vec![hit, other]);
    assert_eq!(ids(&engine.search_by_title("hit")), vec![hit]);
}

#[test]
fn test_remove_then_undo_keeps_equal_rating_and_duration_order() {
    let mut engine = PlaylistEngine::default();
    let a = engine.add_song("A", "Artist", 120, 4).unwrap();
    let d = engine.add_song("D", "Artist", 120, 4).unwrap();
    assert_eq!(engine.shortest().unwrap().id, a);

    engine.remove_song(a).unwrap();
    engine.undo_last().unwrap();

    assert_eq!(ids(&engine.query_by_rating(4).unwrap()), vec![a, d]);
    assert_eq!(engine.shortest().unwrap().id, a);
    assert_eq!(engine.longest().unwrap().id, a);
    check_consistency(&engine).unwrap();
}

#[test]
fn test_blocked_artist_rejected_on_edit() {
    let (mut engine, a, _, _) = abc_playlist();
    engine.block_artist("Nope").unwrap();

    let edit = SongEdit {
        artist: Some("Nope".into()),
        ..SongEdit::default()
    };
    assert_eq!(
        engine.edit_song(a, edit),
        Err(EngineError::BlockedArtist("Nope".to_string()))
    );
    assert_eq!(engine.get_song(a).unwrap().artist, "Artist A");
}

#[test]
fn test_move_positions_zero_and_one_based() {
    let (mut zero, a, b, c) = abc_playlist();
    zero.move_song(c, 0).unwrap();
    assert_eq!(order(&zero), vec![c, a, b]);
    assert_eq!(
        zero.move_song(a, 3),
        Err(EngineError::OutOfRange { position: 3, len: 3 })
    );

    let mut one = PlaylistEngine::new(EngineConfig::new().with_position_base(PositionBase::One));
    let a = one.add_song("A", "X", 10, 1).unwrap();
    let b = one.add_song("B", "X", 20, 1).unwrap();
    let c = one.add_song("C", "X", 30, 1).unwrap();
    one.move_song(c, 1).unwrap();
    assert_eq!(order(&one), vec![c, a, b]);
    assert_eq!(one.position_of(b).unwrap(), 3);
    assert_eq!(
        one.move_song(a, 0),
        Err(EngineError::OutOfRange { position: 0, len: 3 })
    );
    assert!(one.move_song(a, 3).is_ok());
    assert_eq!(order(&one), vec![c, b, a]);
}

#[test]
fn test_move_to_current_position_per_policy() {
    let (mut lenient, a, _, _) = abc_playlist();
    let depth = lenient.history_len();
    assert!(lenient.move_song(a, 0).is_ok());
    assert_eq!(lenient.history_len(), depth);

    let mut strict = PlaylistEngine::new(
        EngineConfig::new().with_same_position_move(SamePositionMove::Reject),
    );
    let x = strict.add_song("X", "Y", 10, 1).unwrap();
    strict.add_song("Z", "Y", 10, 1).unwrap();
    assert!(matches!(
        strict.move_song(x, 0),
        Err(EngineError::InvalidInput(_))
    ));
    assert!(strict.move_song(x, 1).is_ok());
}

#[test]
fn test_sort_variants_agree_on_unique_keys() {
    let (mut merge, _, _, _) = abc_playlist();
    let (mut quick, _, _, _) = abc_playlist();

    merge
        .sort_playlist(SortCriterion::Duration, SortAlgorithm::Merge)
        .unwrap();
    quick
        .sort_playlist(SortCriterion::Duration, SortAlgorithm::Quick)
        .unwrap();

    let durations = |e: &PlaylistEngine| e.iter().map(|s| s.duration_seconds).collect::<Vec<_>>();
    assert_eq!(durations(&merge), vec![90, 180, 240]);
    assert_eq!(durations(&quick), vec![90, 180, 240]);
}

#[test]
fn test_snapshot_shape_is_stable() {
    let (mut engine, _, b, c) = abc_playlist();
    engine.play_song(b).unwrap();

    let json = serde_json::to_value(engine.full_snapshot()).unwrap();
    assert_eq!(json["total_songs"], 3);
    assert_eq!(json["total_duration"], 510);
    for rating in 1..=5 {
        assert!(json["rating_distribution"][rating.to_string()].is_u64());
    }
    assert_eq!(json["rating_distribution"]["1"], 0);
    assert_eq!(json["longest_songs"][0]["id"], c.to_string());
    assert_eq!(json["recent_history"][0]["id"], b.to_string());
    assert_eq!(json["duration_stats"]["average_duration"], 170.0);
}

/// Small deterministic generator so failures reproduce
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: u64) -> u64 {
        if n == 0 {
            0
        } else {
            self.next() % n
        }
    }
}

#[test]
fn test_indexes_stay_consistent_under_random_operations() {
    let mut rng = Lcg(0x5eed);
    let artists = ["Alpha", "Beta", "Gamma", "Delta"];
    let mut engine = PlaylistEngine::new(
        EngineConfig::new()
            .with_history_depth(20)
            .with_purge_on_block(true),
    );

    for step in 0..2000 {
        let live = order(&engine);
        let pick = |rng: &mut Lcg| live[rng.below(live.len() as u64) as usize];

        match rng.below(12) {
            0..=3 => {
                let artist = artists[rng.below(artists.len() as u64) as usize];
                let _ = engine.add_song(
                    &format!("Song {}", step),
                    artist,
                    1 + rng.below(600) as u32,
                    1 + rng.below(5) as u8,
                );
            }
            4 if !live.is_empty() => {
                engine.remove_song(pick(&mut rng)).unwrap();
            }
            5 if !live.is_empty() => {
                let position = rng.below(live.len() as u64) as usize;
                engine.move_song(pick(&mut rng), position).unwrap();
            }
            6 if !live.is_empty() => {
                engine
                    .rate_song(pick(&mut rng), 1 + rng.below(5) as u8)
                    .unwrap();
            }
            7 if !live.is_empty() => {
                let edit = SongEdit {
                    duration_seconds: Some(1 + rng.below(600) as u32),
                    ..SongEdit::default()
                };
                engine.edit_song(pick(&mut rng), edit).unwrap();
            }
            8 => match engine.undo_last() {
                Ok(_) | Err(EngineError::NothingToUndo) => {}
                Err(e) => panic!("undo failed at step {}: {}", step, e),
            },
            9 if !live.is_empty() => {
                engine.play_song(pick(&mut rng)).unwrap();
            }
            10 => {
                if rng.below(2) == 0 {
                    engine.reverse();
                } else {
                    let _ = engine.sort_playlist(SortCriterion::Rating, SortAlgorithm::Quick);
                }
            }
            11 if rng.below(20) == 0 => {
                let artist = artists[rng.below(artists.len() as u64) as usize];
                if engine.is_blocked(artist) {
                    engine.unblock_artist(artist);
                } else {
                    engine.block_artist(artist).unwrap();
                }
            }
            _ => {}
        }

        check_consistency(&engine)
            .unwrap_or_else(|e| panic!("inconsistent after step {}: {:#}", step, e));

        if let (Ok(shortest), Ok(longest)) = (engine.shortest(), engine.longest()) {
            for song in engine.iter() {
                assert!(shortest.duration_seconds <= song.duration_seconds);
                assert!(song.duration_seconds <= longest.duration_seconds);
            }
        }
    }
}
