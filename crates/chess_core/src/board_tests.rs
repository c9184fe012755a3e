use super::*;

const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";

fn sq_of(c: &str) -> u8 {
    coord_to_sq(c).unwrap()
}

#[test]
fn test_startpos_matches_start_fen() {
    let parsed = Position::from_fen(START_FEN).unwrap();
    assert_eq!(parsed, Position::startpos());
    assert_eq!(Position::startpos().to_fen(), START_FEN);
}

#[test]
fn test_fen_round_trip() {
    for fen in [
        KIWIPETE,
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        "rnbqkbnr/pp3ppp/3p4/3Pp3/1Pp1P3/5P2/P1P3PP/RNBQKBNR b KQkq b3 0 5",
        "7k/6R1/5K2/8/8/8/8/8 b - - 12 80",
    ] {
        assert_eq!(Position::from_fen(fen).unwrap().to_fen(), fen);
    }
}

#[test]
fn test_fen_without_counters_defaults() {
    let pos = Position::from_fen("8/2k5/8/8/8/8/3K4/8 w - -").unwrap();
    assert_eq!(pos.halfmove_clock(), 0);
    assert_eq!(pos.fullmove_number(), 1);
}

#[test]
fn test_malformed_fen_is_rejected() {
    for bad in [
        "",
        "8/8/8/8 w - - 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNX w KQkq - 0 1",
        "rnbqkbnr/pppppppp/9/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBN w KQkq - 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR x KQkq - 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkz - 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq e4 0 1",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - x 1",
    ] {
        assert!(
            matches!(Position::from_fen(bad), Err(ChessError::InvalidFen { .. })),
            "accepted malformed FEN: {bad}"
        );
    }
}

#[test]
fn test_make_unmake_restores_position() {
    let mut pos = Position::from_fen(KIWIPETE).unwrap();
    let before = pos.clone();
    for text in ["e1g1", "e1c1", "d5e6", "a2a4", "e2a6", "f3h3"] {
        let mv = pos.parse_move(text).unwrap();
        let undo = pos.make_move(mv);
        assert_eq!(pos.hash(), pos.compute_hash(), "hash drift after {text}");
        pos.unmake_move(mv, undo);
        assert_eq!(pos, before, "position not restored after {text}");
    }
}

#[test]
fn test_castling_moves_rook_and_clears_rights() {
    let mut pos = Position::from_fen(KIWIPETE).unwrap();
    let mv = pos.parse_move("e1g1").unwrap();
    assert!(mv.is_castle);
    let undo = pos.make_move(mv);
    assert_eq!(undo.rook_move, Some((sq_of("h1"), sq_of("f1"))));
    assert_eq!(
        pos.piece_at(sq_of("f1")),
        Some(Piece::new(Color::White, PieceKind::Rook))
    );
    assert!(!pos.castling().king_side(Color::White));
    assert!(!pos.castling().queen_side(Color::White));
    assert!(pos.castling().king_side(Color::Black));
}

#[test]
fn test_rook_capture_clears_opponent_right() {
    let mut pos = Position::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
    let mv = pos.parse_move("a1a8").unwrap();
    pos.make_move(mv);
    assert!(!pos.castling().queen_side(Color::White));
    assert!(!pos.castling().queen_side(Color::Black));
    assert!(pos.castling().king_side(Color::Black));
    assert_eq!(pos.hash(), pos.compute_hash());
}

#[test]
fn test_en_passant_capture_and_undo() {
    let fen = "rnbqkbnr/pp3ppp/3p4/3Pp3/1Pp1P3/5P2/P1P3PP/RNBQKBNR b KQkq b3 0 5";
    let mut pos = Position::from_fen(fen).unwrap();
    let before = pos.clone();
    let mv = pos.parse_move("c4b3").unwrap();
    assert!(mv.is_en_passant);

    let undo = pos.make_move(mv);
    assert_eq!(undo.captured_sq, sq_of("b4"));
    assert_eq!(pos.piece_at(sq_of("b4")), None);
    assert_eq!(
        undo.captured,
        Some(Piece::new(Color::White, PieceKind::Pawn))
    );

    pos.unmake_move(mv, undo);
    assert_eq!(pos, before);
}

#[test]
fn test_double_push_sets_en_passant() {
    let mut pos = Position::startpos();
    let mv = pos.parse_move("e2e4").unwrap();
    pos.make_move(mv);
    assert_eq!(pos.en_passant(), Some(sq_of("e3")));
    assert_eq!(pos.halfmove_clock(), 0);
    assert_eq!(pos.hash(), pos.compute_hash());

    let reply = pos.parse_move("g8f6").unwrap();
    pos.make_move(reply);
    assert_eq!(pos.en_passant(), None);
    assert_eq!(pos.fullmove_number(), 2);
    assert_eq!(pos.halfmove_clock(), 1);
}

#[test]
fn test_promotion_defaults_to_queen() {
    let mut pos = Position::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
    let mv = Move::new(sq_of("a7"), sq_of("a8"));
    pos.make_move(mv);
    assert_eq!(
        pos.piece_at(sq_of("a8")),
        Some(Piece::new(Color::White, PieceKind::Queen))
    );

    let mut pos = Position::from_fen("8/P6k/8/8/8/8/8/K7 w - - 0 1").unwrap();
    let mv = pos.parse_move("a7a8n").unwrap();
    pos.make_move(mv);
    assert_eq!(
        pos.piece_at(sq_of("a8")),
        Some(Piece::new(Color::White, PieceKind::Knight))
    );
}

#[test]
fn test_parse_move_errors() {
    let pos = Position::startpos();
    assert!(pos.parse_move("e2").is_err());
    assert!(pos.parse_move("e2e9").is_err());
    assert!(pos.parse_move("e7e8k").is_err());
    assert!(pos.parse_move("e4e5").is_err()); // empty origin
    assert!(pos.parse_move("e7e5").is_err()); // black pawn, white to move
}

#[test]
fn test_square_attack_queries() {
    let pos = Position::startpos();
    assert!(pos.is_square_attacked(sq_of("f3"), Color::White));
    assert!(!pos.is_square_attacked(sq_of("e4"), Color::White));
    assert!(pos.is_square_attacked(sq_of("f6"), Color::Black));
    assert!(!pos.in_check(Color::White));

    let mated = Position::from_fen(
        "rn1qkbnr/pbpp1Qpp/1p6/4p3/2B1P3/8/PPPP1PPP/RNB1K1NR b KQkq - 0 1",
    )
    .unwrap();
    assert!(mated.in_check(Color::Black));
}
