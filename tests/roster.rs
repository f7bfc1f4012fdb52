//! Integration tests for roster import and player management.

use swiss_tournament_web::{
    import_roster, import_roster_strict, parse_roster_names, RosterFormat, Session, SessionError,
};

#[test]
fn lines_keep_the_whole_name() {
    let text = "Alice\n  Bob  \n\nDoe, John\n";
    assert_eq!(
        parse_roster_names(text, RosterFormat::Lines),
        vec!["Alice", "Bob", "Doe, John"]
    );
    assert!(parse_roster_names("", RosterFormat::Lines).is_empty());
}

#[test]
fn csv_takes_the_first_column() {
    let text = "Alice\n  Bob  \n\nCara, 1200, Oslo\n\"Smith, Dan\",x\n";
    assert_eq!(
        parse_roster_names(text, RosterFormat::Csv),
        vec!["Alice", "Bob", "Cara", "Smith, Dan"]
    );
}

#[test]
fn surname_first_names_stay_distinct() {
    let mut s = Session::new();
    let report = import_roster(&mut s, "Doe, John\nDoe, Jane\n", RosterFormat::Lines);
    assert_eq!(report.added, vec!["Doe, John", "Doe, Jane"]);
    assert!(report.skipped_duplicates.is_empty());
    let names: Vec<&str> = s.players.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Doe, John", "Doe, Jane"]);
}

#[test]
fn lenient_import_reports_skipped_names() {
    let mut s = Session::new();
    s.add_player("Alice").unwrap();
    let report = import_roster(&mut s, "alice\nBob\nbob\nBye\nCara\n", RosterFormat::Lines);
    assert_eq!(report.added, vec!["Bob", "Cara"]);
    assert_eq!(report.skipped_duplicates, vec!["alice", "bob"]);
    assert_eq!(report.skipped_reserved, vec!["Bye"]);
    assert_eq!(s.players.len(), 3);
}

#[test]
fn strict_import_is_all_or_nothing() {
    let mut s = Session::new();
    assert_eq!(
        import_roster_strict(&mut s, "Alice\nBob\nALICE\n", RosterFormat::Lines),
        Err(SessionError::DuplicatePlayer("ALICE".to_string()))
    );
    assert!(s.players.is_empty());
    assert_eq!(
        import_roster_strict(&mut s, "Alice\nNo Winner\n", RosterFormat::Lines),
        Err(SessionError::ReservedName("No Winner".to_string()))
    );
    assert!(s.players.is_empty());

    let ids = import_roster_strict(&mut s, "Alice,1\nBob,2\n", RosterFormat::Csv).unwrap();
    assert_eq!(ids.len(), 2);
    assert_eq!(s.player_name(ids[1]), "Bob");
}

#[test]
fn renames_follow_history() {
    let mut s = Session::new();
    let ids = import_roster_strict(&mut s, "Alice\nBob", RosterFormat::Lines).unwrap();
    s.rename_player(ids[0], "Alicia").unwrap();
    assert!(s.find_player_loose("ALICIA").is_some());
    assert!(s.find_player_by_name("Alice").is_none());
    assert!(matches!(
        s.rename_player(ids[0], "delayed"),
        Err(SessionError::ReservedName(_))
    ));
}
