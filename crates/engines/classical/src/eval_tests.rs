use super::*;
use chess_core::START_FEN;

fn breakdown(fen: &str) -> Evaluation {
    Evaluator::default().breakdown(&GameState::from_fen(fen).unwrap())
}

/// Colour-flipped copy of a FEN: ranks reversed, piece case swapped, other side to move.
fn mirror_fen(fen: &str) -> String {
    let fields: Vec<&str> = fen.split_whitespace().collect();
    let swap_case = |s: &str| -> String {
        s.chars()
            .map(|c| {
                if c.is_ascii_uppercase() {
                    c.to_ascii_lowercase()
                } else {
                    c.to_ascii_uppercase()
                }
            })
            .collect()
    };
    let board: Vec<String> = fields[0].split('/').rev().map(swap_case).collect();
    let side = if fields[1] == "w" { "b" } else { "w" };
    let mut castling: Vec<char> = swap_case(fields[2]).chars().collect();
    castling.sort_by_key(|c| (c.is_ascii_lowercase(), *c != 'K' && *c != 'k'));
    let castling: String = castling.into_iter().collect();
    let ep = match fields[3] {
        "-" => "-".to_string(),
        sq => {
            let rank = sq.as_bytes()[1] - b'0';
            format!("{}{}", &sq[..1], 9 - rank)
        }
    };
    format!("{} {side} {castling} {ep} {} {}", board.join("/"), fields[4], fields[5])
}

// =============================================================================
// Symmetry
// =============================================================================

#[test]
fn test_start_position_sides_match_apart_from_tempo() {
    let eval = breakdown(START_FEN);
    let mut white = eval.white;
    white.tempo = 0;
    assert_eq!(white, eval.black);
    assert_eq!(eval.white.tempo, 10);
    assert_eq!(eval.total, 10);
    assert_eq!(eval.perspective, 10);

    let black_to_move =
        breakdown("rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR b KQkq - 0 1");
    assert_eq!(black_to_move.total, -10);
    assert_eq!(black_to_move.perspective, 10);
}

#[test]
fn test_start_position_without_tempo_is_zero() {
    let weights = EvaluationWeights::from_toml("[modifiers]\ntempo = 0").unwrap();
    let evaluator = Evaluator::new(weights);
    assert_eq!(evaluator.evaluate(&GameState::new()), 0);
}

#[test]
fn test_mirrored_positions_score_the_same_for_the_mover() {
    for fen in [
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "1q6/2k1b3/8/8/8/5P2/3KN3/7R w - - 0 1",
        "2rq1rk1/1Rp3pp/p2pN3/3Nn3/b3pb1P/2B3Q1/2PP1PP1/1R4K1 w - - 0 23",
        "4k3/pp3p1p/3Kp3/3P2r1/2r5/3q4/5PPP/4b2R b - - 5 29",
    ] {
        let original = breakdown(fen);
        let mirrored = breakdown(&mirror_fen(fen));
        assert_eq!(original.white, mirrored.black, "{fen}");
        assert_eq!(original.black, mirrored.white, "{fen}");
        assert_eq!(original.total, -mirrored.total, "{fen}");
        assert_eq!(original.perspective, mirrored.perspective, "{fen}");
    }
}

// =============================================================================
// Material, tables and phase
// =============================================================================

#[test]
fn test_piece_terms() {
    let game = GameState::from_fen("1q6/2k1b3/8/8/8/5P2/3KN3/7R w - - 0 1").unwrap();
    let pos = game.position();
    let eval = Evaluator::default();
    let terms = |color, kind| {
        let t = eval.piece_terms(pos, color, kind);
        (t.material, t.midgame, t.endgame)
    };

    assert_eq!(terms(Color::White, PieceKind::Pawn), (100, 1, 1));
    assert_eq!(terms(Color::White, PieceKind::Knight), (320, 2, 2));
    assert_eq!(terms(Color::White, PieceKind::Bishop), (0, 0, 0));
    assert_eq!(terms(Color::White, PieceKind::Rook), (500, 0, 0));
    assert_eq!(terms(Color::White, PieceKind::King), (0, 0, 0));
    assert_eq!(terms(Color::Black, PieceKind::Pawn), (0, 0, 0));
    assert_eq!(terms(Color::Black, PieceKind::Bishop), (330, 1, 1));
    assert_eq!(terms(Color::Black, PieceKind::Queen), (900, -5, -5));
    assert_eq!(terms(Color::Black, PieceKind::King), (0, 20, -12));
}

#[test]
fn test_start_position_pawn_tables() {
    let eval = breakdown(START_FEN);
    let pawns = eval.white.pieces[PieceKind::Pawn.idx()];
    assert_eq!(pawns, PieceTerms { material: 800, midgame: -66, endgame: -66 });
    assert_eq!(eval.white.material(), 4000);
    assert_eq!(eval.black.material(), 4000);
}

#[test]
fn test_game_phase() {
    let start = breakdown(START_FEN);
    assert_eq!((start.white.phase, start.black.phase, start.phase), (12, 12, 24));

    let kvkq = breakdown("1q6/2k5/8/8/8/8/3K4/8 w - - 0 1");
    assert_eq!((kvkq.white.phase, kvkq.black.phase, kvkq.phase), (0, 4, 4));

    // Promoted queens push the raw sum past 24
    let heavy = breakdown("qqqqk3/8/8/8/8/8/8/QQQQK3 w - - 0 1");
    assert_eq!(heavy.white.phase, 16);
    assert_eq!(heavy.phase, MAX_PHASE);
}

#[test]
fn test_tapering_blends_king_tables() {
    let part = EvaluationPart {
        pieces: {
            let mut pieces = [PieceTerms::default(); 6];
            pieces[PieceKind::King.idx()] = PieceTerms { material: 0, midgame: 20, endgame: -12 };
            pieces
        },
        ..EvaluationPart::default()
    };
    assert_eq!(part.tapered(24), 20);
    assert_eq!(part.tapered(0), -12);
    assert_eq!(part.tapered(12), 4);
    // (5 * 20 + 19 * -12) / 24 = -128 / 24, truncated towards zero
    assert_eq!(part.tapered(5), -5);
}

// =============================================================================
// Modifiers
// =============================================================================

#[test]
fn test_pair_modifiers() {
    let eval = breakdown("4k3/8/8/8/8/8/8/RNBQKBNR w - - 0 1");
    assert_eq!(eval.white.pair, 30 - 8 - 16);
    let rooks = breakdown("4k3/8/8/8/8/8/8/R3K2R w - - 0 1");
    assert_eq!(rooks.white.pair, -16);
    assert_eq!(rooks.black.pair, 0);
}

#[test]
fn test_rook_files() {
    // a-file holds only a black pawn, h-file is empty
    let eval = breakdown("4k3/p7/8/8/8/8/8/R3K2R w - - 0 1");
    assert_eq!(eval.white.rook_files, 5 + 10);

    let blocked = breakdown("4k3/8/8/8/8/8/P7/R3K3 w - - 0 1");
    assert_eq!(blocked.white.rook_files, 0);
}

#[test]
fn test_passed_pawns() {
    let lone = breakdown("4k3/8/8/3P4/8/8/8/4K3 w - - 0 1");
    assert_eq!(lone.white.passed_pawns, 60);

    // Each pawn stands in the other one's path: neither is passed
    let facing = breakdown("4k3/4p3/8/3P4/8/8/8/4K3 w - - 0 1");
    assert_eq!((facing.white.passed_pawns, facing.black.passed_pawns), (0, 0));

    // Pawns that already ran past each other are both passed
    let crossed = breakdown("4k3/8/8/3P4/2p5/8/8/4K3 w - - 0 1");
    assert_eq!((crossed.white.passed_pawns, crossed.black.passed_pawns), (60, 60));

    // Edge files do not wrap into the opposite edge
    let edges = breakdown("4k3/7p/8/P7/8/8/8/4K3 w - - 0 1");
    assert_eq!(edges.white.passed_pawns, 60);
    assert_eq!(edges.black.passed_pawns, 20);
}

#[test]
fn test_mobility() {
    let rook = breakdown("4k3/8/8/8/8/8/8/R3K3 w - - 0 1");
    assert_eq!(rook.white.mobility, 10 * 2);

    let bishop = breakdown("4k3/8/8/8/8/8/8/2B1K3 w - - 0 1");
    assert_eq!(bishop.white.mobility, 7 * 3);

    // Start position: only knights could move, and they are not counted
    let start = breakdown(START_FEN);
    assert_eq!((start.white.mobility, start.black.mobility), (0, 0));
}

#[test]
fn test_king_safety() {
    // Rook on the open d-file reaches d8 and d7, the queen's diagonal reaches e7 and d8
    let eval = breakdown("4k3/8/8/8/7Q/8/8/3RK3 w - - 0 1");
    // 3 + 2 attack units
    assert_eq!(eval.black.king_safety, -5);
    assert_eq!(eval.white.king_safety, 0);

    let rook_only = breakdown("4k3/8/8/8/8/8/8/3RK3 w - - 0 1");
    assert_eq!(rook_only.black.king_safety, -2);

    // Attacks stop at the first blocker
    let blocked = breakdown("4k3/8/8/8/8/8/3P4/3RK3 w - - 0 1");
    assert_eq!(blocked.black.king_safety, 0);

    let start = breakdown(START_FEN);
    assert_eq!((start.white.king_safety, start.black.king_safety), (0, 0));
}

// =============================================================================
// Terminal positions
// =============================================================================

#[test]
fn test_terminal_scores() {
    let white_mates = breakdown("7k/6Q1/5K2/8/8/8/8/8 b - - 0 1");
    assert!(white_mates.game_over);
    assert_eq!(white_mates.total, MATE_SCORE);
    assert_eq!(white_mates.perspective, -MATE_SCORE);

    let black_mates = breakdown("8/8/8/8/8/2k5/1q6/K7 w - - 0 1");
    assert_eq!(black_mates.total, -MATE_SCORE);
    assert_eq!(black_mates.perspective, -MATE_SCORE);

    let stalemate = breakdown("8/8/8/8/8/2k5/1r6/K7 w - - 0 1");
    assert!(stalemate.game_over);
    assert_eq!(stalemate.total, 0);

    // Material is ignored once the game is drawn
    let bare_kings = breakdown("8/2k5/8/8/8/8/3K4/8 w - - 0 1");
    assert_eq!(bare_kings.total, 0);
}

#[test]
fn test_evaluate_matches_breakdown() {
    let evaluator = Evaluator::default();
    for fen in [
        START_FEN,
        "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1",
        "1r3k1R/5p2/5p2/4rQ2/p3p3/n1b3P1/4qP1P/5RK1 b - - 4 33",
    ] {
        let game = GameState::from_fen(fen).unwrap();
        assert_eq!(evaluator.evaluate(&game), evaluator.breakdown(&game).perspective);
    }
}

#[test]
fn test_null_evaluator() {
    let game = GameState::from_fen("7k/6Q1/5K2/8/8/8/8/8 b - - 0 1").unwrap();
    assert_eq!(NullEvaluator.evaluate(&game), 0);
    assert_eq!(NullEvaluator.piece_value(PieceKind::Queen), 0);
    assert_eq!(Evaluator::default().piece_value(PieceKind::Queen), 900);
}

#[test]
fn test_display_lists_every_term() {
    let text = breakdown(START_FEN).to_string();
    for needle in ["Pawn", "King", "mobility", "king safety", "total 10"] {
        assert!(text.contains(needle), "missing {needle} in:\n{text}");
    }
}
