//! Integration tests for the round lifecycle, result entry and the session file format.

use chrono::{TimeZone, Utc};
use swiss_tournament_web::{
    aggregate_standings, check_round_generation, commit_round, delete_round, export_session,
    import_session, load_session_into, paste_winners, set_notes, set_scores, set_winner,
    snapshot_file_name, start_next_round, GenerationWarning, PairingOptions, PlayerId, Session,
    SessionError, Winner, WinnerChoice,
};

const FIXTURE: &str = r#"{
  "players": { "Alice": false, "Bob": false, "Cara": true },
  "rounds": [
    { "matchups": [
        { "player1": "Alice", "player2": "Bob", "winner": "Alice",
          "score_player1": 1.0, "score_player2": 0.0, "notes": "" },
        { "player1": "Cara", "player2": null, "winner": "Cara",
          "score_player1": 1.0, "score_player2": 0.0, "notes": "BYE" } ] },
    { "matchups": [
        { "player1": "Bob", "player2": "Cara", "winner": "Delayed",
          "score_player1": 0.0, "score_player2": 0.0, "notes": "table 3" },
        { "player1": "Alice", "player2": null, "winner": "No Winner",
          "score_player1": 0.0, "score_player2": 0.0, "notes": "" } ] }
  ]
}"#;

fn session_with(names: &[&str]) -> Session {
    let mut s = Session::new();
    for name in names {
        s.add_player(*name).unwrap();
    }
    s
}

fn start(s: &mut Session) -> Result<usize, SessionError> {
    start_next_round(s, &PairingOptions::default()).map(|r| r.round)
}

/// Give every open matchup of a round to its first player.
fn resolve_round(s: &mut Session, round: usize) {
    for idx in 0..s.rounds[round].matchups.len() {
        let m = &s.rounds[round].matchups[idx];
        if !m.is_resolved() {
            let p1 = m.player1;
            set_winner(s, round, idx, WinnerChoice::Player(p1)).unwrap();
        }
    }
}

fn id(s: &Session, name: &str) -> PlayerId {
    s.find_player_by_name(name).unwrap().id
}

#[test]
fn fixture_imports_with_names_winners_and_flags() {
    let s = import_session(FIXTURE).unwrap();
    let names: Vec<&str> = s.players.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob", "Cara"]);
    assert!(s.find_player_by_name("Cara").unwrap().dropped);
    assert_eq!(s.rounds.len(), 2);
    assert!(!s.rounds[0].locked);

    let bye = &s.rounds[0].matchups[1];
    assert!(bye.is_bye());
    assert_eq!(bye.player1, id(&s, "Cara"));
    assert_eq!(bye.winner, Some(Winner::Player1));

    let delayed = &s.rounds[1].matchups[0];
    assert_eq!(delayed.winner, Some(Winner::Delayed));
    assert_eq!(delayed.notes, "table 3");
    assert_eq!(s.rounds[1].matchups[1].winner, Some(Winner::NoWinner));
}

#[test]
fn export_then_import_preserves_the_file() {
    let mut s = session_with(&["Alice", "Bob", "Cara", "Dan", "Eve"]);
    start(&mut s).unwrap();
    resolve_round(&mut s, 0);
    set_notes(&mut s, 0, 0, "close game").unwrap();
    start(&mut s).unwrap();
    set_winner(&mut s, 1, 0, WinnerChoice::Delayed).unwrap();

    let text = export_session(&s).unwrap();
    let back = import_session(&text).unwrap();
    assert_eq!(export_session(&back).unwrap(), text);
    assert!(back.rounds[0].locked);
    assert!(!back.rounds[1].locked);
    assert_eq!(back.rounds[0].matchups[0].notes, "close game");
}

#[test]
fn files_without_lock_flags_load_unlocked() {
    let s = import_session(r#"{ "players": { "A": false } }"#).unwrap();
    assert_eq!(s.players.len(), 1);
    assert!(s.rounds.is_empty());
}

#[test]
fn malformed_files_are_rejected() {
    let cases = [
        "not json",
        r#"{ "rounds": [] }"#,
        r#"{ "players": { "A": "yes" } }"#,
        r#"{ "players": { "A": false, "a": false } }"#,
        r#"{ "players": { "A": false, "B": false, "A": true } }"#,
        r#"{ "players": { "Bye": false } }"#,
        r#"{ "players": { " A": false } }"#,
        r#"{ "players": { "A": false }, "rounds": [ { "matchups": [
            { "player1": "A", "player2": "Ghost", "winner": null,
              "score_player1": 0, "score_player2": 0 } ] } ] }"#,
        r#"{ "players": { "A": false, "B": false }, "rounds": [ { "matchups": [
            { "player1": "A", "player2": "B", "winner": "Carol",
              "score_player1": 0, "score_player2": 0 } ] } ] }"#,
        r#"{ "players": { "A": false }, "rounds": [ { "matchups": [
            { "player1": "A", "player2": "A", "winner": null,
              "score_player1": 0, "score_player2": 0 } ] } ] }"#,
    ];
    for text in cases {
        assert!(
            matches!(import_session(text), Err(SessionError::InvalidSessionFormat(_))),
            "accepted {text}"
        );
    }
}

#[test]
fn repeated_player_key_is_reported_as_duplicate() {
    let err = import_session(r#"{ "players": { "A": false, "B": false, "A": true } }"#).unwrap_err();
    match err {
        SessionError::InvalidSessionFormat(reason) => {
            assert!(reason.contains("\"A\" already exists"), "{reason}")
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn failed_load_leaves_session_untouched() {
    let mut s = session_with(&["A", "B"]);
    start(&mut s).unwrap();
    let before = export_session(&s).unwrap();
    let err = load_session_into(&mut s, r#"{ "players": { "X": false, "x": true } }"#);
    assert!(err.is_err());
    assert_eq!(export_session(&s).unwrap(), before);

    load_session_into(&mut s, FIXTURE).unwrap();
    assert_eq!(s.players.len(), 3);
}

#[test]
fn gate_blocks_on_unresolved_matchups() {
    let mut s = session_with(&["A", "B", "C", "D"]);
    start(&mut s).unwrap();
    let p1 = s.rounds[0].matchups[0].player1;
    set_winner(&mut s, 0, 0, WinnerChoice::Player(p1)).unwrap();

    let err = start(&mut s).unwrap_err();
    assert_eq!(err, SessionError::UnresolvedMatchup { round: 0, matchup: 1 });
    assert!(err.to_string().contains("Round 1, matchup 2"));
    assert_eq!(s.rounds.len(), 1);
    assert!(!s.rounds[0].locked);
}

#[test]
fn gate_warns_about_delays_and_odd_scores() {
    let mut s = session_with(&["A", "B", "C", "D"]);
    start(&mut s).unwrap();
    set_winner(&mut s, 0, 0, WinnerChoice::Delayed).unwrap();
    let p1 = s.rounds[0].matchups[1].player1;
    set_winner(&mut s, 0, 1, WinnerChoice::Player(p1)).unwrap();
    set_scores(&mut s, 0, 1, 1.0, 1.0).unwrap();

    let warnings = check_round_generation(&s).unwrap();
    assert_eq!(
        warnings,
        vec![
            GenerationWarning::DelayedMatchup { round: 0, matchup: 0 },
            GenerationWarning::NonStandardScore { round: 0, matchup: 1, total: 2.0 },
        ]
    );

    let started = start_next_round(&mut s, &PairingOptions::default()).unwrap();
    assert_eq!(started.round, 1);
    assert_eq!(started.warnings, warnings);
    assert!(s.rounds[0].locked);
}

#[test]
fn empty_session_passes_the_gate() {
    assert_eq!(check_round_generation(&Session::new()), Ok(Vec::new()));
}

#[test]
fn commit_requires_results_and_happens_once() {
    let mut s = session_with(&["A", "B"]);
    start(&mut s).unwrap();
    assert_eq!(
        commit_round(&mut s, 0),
        Err(SessionError::UnresolvedMatchup { round: 0, matchup: 0 })
    );
    resolve_round(&mut s, 0);
    commit_round(&mut s, 0).unwrap();
    assert_eq!(commit_round(&mut s, 0), Err(SessionError::RoundAlreadyCommitted(0)));
    assert_eq!(commit_round(&mut s, 3), Err(SessionError::RoundNotFound(3)));
}

#[test]
fn committed_rounds_only_accept_delayed_resolutions() {
    let mut s = session_with(&["A", "B", "C", "D"]);
    start(&mut s).unwrap();
    resolve_round(&mut s, 0);
    set_winner(&mut s, 0, 1, WinnerChoice::Delayed).unwrap();
    commit_round(&mut s, 0).unwrap();

    let p2 = s.rounds[0].matchups[0].player2.unwrap();
    assert_eq!(
        set_winner(&mut s, 0, 0, WinnerChoice::Player(p2)),
        Err(SessionError::RoundLocked(0))
    );
    assert_eq!(set_scores(&mut s, 0, 0, 0.0, 1.0), Err(SessionError::RoundLocked(0)));
    assert_eq!(set_notes(&mut s, 0, 0, "x"), Err(SessionError::RoundLocked(0)));
    assert_eq!(paste_winners(&mut s, 0, "A"), Err(SessionError::RoundLocked(0)));
    assert_eq!(
        set_winner(&mut s, 0, 1, WinnerChoice::Clear),
        Err(SessionError::RoundLocked(0))
    );

    let late = s.rounds[0].matchups[1].player2.unwrap();
    set_winner(&mut s, 0, 1, WinnerChoice::Player(late)).unwrap();
    let m = &s.rounds[0].matchups[1];
    assert_eq!(m.winner, Some(Winner::Player2));
    assert_eq!((m.score_player1, m.score_player2), (0.0, 1.0));
}

#[test]
fn choosing_a_winner_sets_scores() {
    let mut s = session_with(&["A", "B"]);
    start(&mut s).unwrap();
    let m = s.rounds[0].matchups[0].clone();
    let p2 = m.player2.unwrap();

    set_winner(&mut s, 0, 0, WinnerChoice::Player(p2)).unwrap();
    assert_eq!(s.rounds[0].matchups[0].score_player2, 1.0);
    set_winner(&mut s, 0, 0, WinnerChoice::Player(m.player1)).unwrap();
    let m = &s.rounds[0].matchups[0];
    assert_eq!((m.score_player1, m.score_player2), (1.0, 0.0));

    set_winner(&mut s, 0, 0, WinnerChoice::NoWinner).unwrap();
    assert_eq!(s.rounds[0].matchups[0].winner, Some(Winner::NoWinner));
    set_winner(&mut s, 0, 0, WinnerChoice::Clear).unwrap();
    assert!(!s.rounds[0].matchups[0].is_resolved());

    assert_eq!(
        set_winner(&mut s, 0, 0, WinnerChoice::Player(PlayerId::new_v4())),
        Err(SessionError::InvalidWinner)
    );
    assert_eq!(
        set_winner(&mut s, 0, 5, WinnerChoice::NoWinner),
        Err(SessionError::MatchupNotFound { round: 0, matchup: 5 })
    );
}

#[test]
fn delaying_a_decided_game_takes_back_its_points() {
    let mut s = session_with(&["A", "B"]);
    start(&mut s).unwrap();
    let p1 = s.rounds[0].matchups[0].player1;
    set_winner(&mut s, 0, 0, WinnerChoice::Player(p1)).unwrap();
    set_winner(&mut s, 0, 0, WinnerChoice::Delayed).unwrap();

    let m = &s.rounds[0].matchups[0];
    assert_eq!((m.score_player1, m.score_player2), (0.0, 0.0));
    let standings = aggregate_standings(&s.players, &s.rounds, None);
    assert_eq!(standings[&p1].score, 0.0);
    assert_eq!(standings[&p1].pairing_score(), 0.5);

    set_scores(&mut s, 0, 0, 0.5, 0.5).unwrap();
    set_winner(&mut s, 0, 0, WinnerChoice::NoWinner).unwrap();
    let m = &s.rounds[0].matchups[0];
    assert_eq!((m.score_player1, m.score_player2), (0.5, 0.5));
}

#[test]
fn bye_winner_cannot_change() {
    let mut s = session_with(&["A", "B", "C"]);
    start(&mut s).unwrap();
    let bye_idx = s.rounds[0].matchups.iter().position(|m| m.is_bye()).unwrap();
    let holder = s.rounds[0].matchups[bye_idx].player1;
    for choice in [WinnerChoice::NoWinner, WinnerChoice::Delayed, WinnerChoice::Clear] {
        assert_eq!(
            set_winner(&mut s, 0, bye_idx, choice),
            Err(SessionError::InvalidWinner)
        );
    }
    set_winner(&mut s, 0, bye_idx, WinnerChoice::Player(holder)).unwrap();
    assert_eq!(s.rounds[0].matchups[bye_idx].winner, Some(Winner::Player1));
}

#[test]
fn pasted_winners_match_names_loosely() {
    let mut s = session_with(&["Alice", "Bob", "Cara", "Dan", "Eve"]);
    start(&mut s).unwrap();
    let winners: Vec<String> = s.rounds[0]
        .matchups
        .iter()
        .filter(|m| !m.is_bye())
        .map(|m| s.player_name(m.player2.unwrap()).to_uppercase())
        .collect();
    let text = format!("  {}\n\nnobody\n{}\n", winners[0], winners[1]);

    assert_eq!(paste_winners(&mut s, 0, &text).unwrap(), 2);
    for m in s.rounds[0].matchups.iter().filter(|m| !m.is_bye()) {
        assert_eq!(m.winner, Some(Winner::Player2));
        assert_eq!(m.score_player2, 1.0);
    }
    assert_eq!(paste_winners(&mut s, 0, "nobody").unwrap(), 0);
}

#[test]
fn only_the_last_open_round_can_be_deleted() {
    let mut s = session_with(&["A", "B", "C", "D"]);
    start(&mut s).unwrap();
    resolve_round(&mut s, 0);
    start(&mut s).unwrap();

    assert_eq!(delete_round(&mut s, 0), Err(SessionError::NotLastRound));
    assert_eq!(delete_round(&mut s, 7), Err(SessionError::RoundNotFound(7)));
    delete_round(&mut s, 1).unwrap();
    assert_eq!(s.rounds.len(), 1);
    assert_eq!(delete_round(&mut s, 0), Err(SessionError::RoundLocked(0)));
}

#[test]
fn snapshot_names_carry_session_and_timestamp() {
    let s = Session::new();
    let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
    assert_eq!(
        snapshot_file_name(s.id, &at),
        format!("session-{}-20250102-030405.json", s.id)
    );
}
