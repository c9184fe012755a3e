use super::*;
use crate::options::EngineOptions;

fn protocol() -> UciProtocol {
    UciProtocol::new(EngineOptions {
        hash_mb: 1,
        ..EngineOptions::default()
    })
    .unwrap()
}

fn send(uci: &mut UciProtocol, line: &str) -> UciResult<String> {
    let mut out = Vec::new();
    uci.handle_command(line, &mut out)?;
    Ok(String::from_utf8(out).unwrap())
}

#[test]
fn test_uci_handshake() {
    let mut uci = protocol();
    let out = send(&mut uci, "uci").unwrap();
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "id name axw-chess classical");
    assert_eq!(lines[1], "id author axw-chess");
    assert!(lines.contains(&"option name Hash type spin default 1 min 1 max 2048"));
    assert!(lines.contains(&"option name Move Overhead type spin default 200 min 1 max 1000"));
    assert!(lines.contains(&"option name Max Time type spin default 30 min 2 max 300"));
    assert_eq!(lines.last(), Some(&"uciok"));

    assert_eq!(send(&mut uci, "isready").unwrap(), "readyok\n");
}

#[test]
fn test_blank_lines_and_quit() {
    let mut uci = protocol();
    let mut out = Vec::new();
    assert!(uci.handle_command("   ", &mut out).unwrap());
    assert!(!uci.handle_command("quit", &mut out).unwrap());
    assert!(out.is_empty());
}

#[test]
fn test_unknown_command_is_an_error() {
    let mut uci = protocol();
    let err = send(&mut uci, "xyzzy 1 2").unwrap_err();
    assert!(matches!(err, UciError::UnknownCommand(ref c) if c == "xyzzy"));
    assert!(!err.is_fatal());
}

// =============================================================================
// position
// =============================================================================

#[test]
fn test_position_startpos_with_moves() {
    let mut uci = protocol();
    send(&mut uci, "position startpos moves e2e4 e7e5 g1f3").unwrap();
    assert_eq!(uci.game().moves().len(), 3);
    assert_eq!(
        uci.game().position().to_fen(),
        "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
    );
}

#[test]
fn test_position_fen_with_and_without_moves() {
    let mut uci = protocol();
    let fen = "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1";
    send(&mut uci, &format!("position fen {fen}")).unwrap();
    assert_eq!(uci.game().position().to_fen(), fen);

    send(&mut uci, &format!("position fen {fen} moves e2e4 e8d7")).unwrap();
    assert_eq!(uci.game().moves().len(), 2);
}

#[test]
fn test_promotion_without_letter_becomes_queen() {
    let mut uci = protocol();
    send(&mut uci, "position fen 4k3/1P6/8/8/8/8/8/4K3 w - - 0 1 moves b7b8").unwrap();
    assert_eq!(uci.game().moves()[0].to_string(), "b7b8q");
}

#[test]
fn test_bad_position_leaves_game_untouched() {
    let mut uci = protocol();
    send(&mut uci, "position startpos moves d2d4").unwrap();
    let before = uci.game().clone();

    for bad in [
        "position",
        "position somewhere",
        "position fen",
        "position fen not/a/fen w - - 0 1",
        "position startpos moves e2e4 e2e4",
        "position startpos e2e4",
    ] {
        let err = send(&mut uci, bad).unwrap_err();
        assert!(!err.is_fatal(), "{bad}");
        assert_eq!(uci.game(), &before, "{bad}");
    }
    assert!(matches!(
        send(&mut uci, "position startpos moves e2e5").unwrap_err(),
        UciError::Chess(ChessError::InvalidMove { .. })
    ));
}

// =============================================================================
// setoption
// =============================================================================

#[test]
fn test_setoption_names_with_spaces() {
    assert_eq!(
        parse_setoption(&["name", "Move", "Overhead", "value", "50"]).unwrap(),
        ("Move Overhead".to_string(), "50".to_string())
    );
    assert_eq!(
        parse_setoption(&["name", "Clear", "Hash"]).unwrap(),
        ("Clear Hash".to_string(), String::new())
    );
    assert!(parse_setoption(&["Hash", "value", "2"]).is_err());
    assert!(parse_setoption(&["name", "value", "2"]).is_err());
}

#[test]
fn test_setoption_updates_options() {
    let mut uci = protocol();
    send(&mut uci, "setoption name Hash value 2").unwrap();
    assert_eq!(uci.options().hash_mb, 2);
    assert_eq!(uci.engine().hash_mb(), 2);

    send(&mut uci, "setoption name Move Overhead value 75").unwrap();
    assert_eq!(uci.options().move_overhead_ms, 75);

    send(&mut uci, "setoption name max time value 1000").unwrap();
    assert_eq!(uci.options().max_time_s, MAX_MAX_TIME_S);
}

#[test]
fn test_setoption_rejects_unknown_and_malformed() {
    let mut uci = protocol();
    assert!(matches!(
        send(&mut uci, "setoption name Ponder value true").unwrap_err(),
        UciError::InvalidArguments { command: "setoption", .. }
    ));
    assert!(send(&mut uci, "setoption name Hash value lots").is_err());
    assert!(send(&mut uci, "setoption").is_err());
    assert_eq!(uci.options().hash_mb, 1);
}

// =============================================================================
// go / eval / ucinewgame
// =============================================================================

#[test]
fn test_go_depth_reports_each_iteration() {
    let mut uci = protocol();
    send(&mut uci, "position startpos").unwrap();
    let out = send(&mut uci, "go depth 3").unwrap();
    let lines: Vec<&str> = out.lines().collect();

    assert_eq!(lines.len(), 4, "{out}");
    for (depth, line) in lines[..3].iter().enumerate() {
        assert!(line.starts_with(&format!("info depth {} score cp ", depth + 1)), "{line}");
        assert!(line.contains(" nodes ") && line.contains(" nps ") && line.contains(" pv "));
    }
    let best = lines[3].strip_prefix("bestmove ").unwrap();
    assert!(parse_legal_move(uci.game().position(), best).is_some());
    assert_eq!(uci.game(), &GameState::new());
}

#[test]
fn test_go_finds_mate() {
    let mut uci = protocol();
    send(&mut uci, "position fen 1r4k1/p4p1p/p4p2/2pn4/K3b3/3q2n1/3r4/b7 b - - 11 38").unwrap();
    let out = send(&mut uci, "go depth 2").unwrap();
    assert!(out.contains("score cp 999999"), "{out}");

    let best = out.lines().last().unwrap().strip_prefix("bestmove ").unwrap().to_string();
    send(&mut uci, &format!("position fen 1r4k1/p4p1p/p4p2/2pn4/K3b3/3q2n1/3r4/b7 b - - 11 38 moves {best}")).unwrap();
    assert!(uci.game().is_game_over());
}

#[test]
fn test_go_without_moves_answers_null_move() {
    let mut uci = protocol();
    send(&mut uci, "position fen 8/8/8/8/8/2k5/1q6/K7 w - - 0 1").unwrap();
    assert_eq!(send(&mut uci, "go movetime 500").unwrap(), "bestmove 0000\n");
}

#[test]
fn test_go_with_clock_returns_a_move() {
    let mut uci = protocol();
    send(&mut uci, "position startpos moves e2e4").unwrap();
    let out = send(&mut uci, "go wtime 1000 btime 1000 winc 0 binc 0 depth 4").unwrap();
    assert!(out.lines().last().unwrap().starts_with("bestmove "));
}

#[test]
fn test_go_rejects_malformed_arguments() {
    let mut uci = protocol();
    let err = send(&mut uci, "go wtime soon").unwrap_err();
    assert!(matches!(err, UciError::Chess(ChessError::InvalidArgument { .. })));
}

#[test]
fn test_eval_prints_breakdown() {
    let mut uci = protocol();
    let out = send(&mut uci, "eval").unwrap();
    assert_eq!(out, format!("{}\n", uci.engine().evaluator().breakdown(&GameState::new())));
}

#[test]
fn test_ucinewgame_resets_game_and_table() {
    let mut uci = protocol();
    send(&mut uci, "position startpos moves e2e4").unwrap();
    send(&mut uci, "go depth 2").unwrap();
    assert!(!uci.engine().table().is_empty());

    send(&mut uci, "ucinewgame").unwrap();
    assert!(uci.engine().table().is_empty());
    assert_eq!(uci.game(), &GameState::new());
}

// =============================================================================
// run loop
// =============================================================================

#[test]
fn test_run_continues_after_errors() {
    let mut uci = protocol();
    let input = "uci\nbogus\nposition startpos moves e2e5\nisready\nquit\nisready\n";
    let mut out = Vec::new();
    uci.run(input.as_bytes(), &mut out).unwrap();
    let out = String::from_utf8(out).unwrap();

    assert!(out.contains("uciok"));
    assert!(out.contains("info string error: unknown command: bogus"));
    assert!(out.contains("info string error: invalid move \"e2e5\""));
    assert_eq!(out.matches("readyok").count(), 1);
}
