use big_two_core::*;
use Rank::*;
use Suit::*;

fn card(rank: Rank, suit: Suit) -> Card {
    Card::new(rank, suit)
}

/// 让每个座位拿到指定的牌，其余的牌依次补齐
fn rigged_deck(wanted: [&[Card]; NUM_PLAYERS]) -> Deck {
    Deck::from_partial_hands(&wanted).unwrap()
}

fn indices(round: &GameRound, seat: Seat, cards: &[Card]) -> Vec<usize> {
    let hand = round.player(seat).unwrap().hand();
    cards.iter().map(|c| hand.iter().position(|h| h == c).unwrap()).collect()
}

fn play(round: &mut GameRound, seat: Seat, cards: &[Card]) -> Result<MoveOutcome, MoveError> {
    let selection = indices(round, seat, cards);
    round.apply_move(seat, &selection)
}

fn pass(round: &mut GameRound, seat: Seat) -> Result<MoveOutcome, MoveError> {
    round.apply_move(seat, &[])
}

#[test]
fn holder_of_three_of_diamonds_opens() {
    let mut round = GameRound::new();
    round.start(rigged_deck([&[Card::THREE_OF_DIAMONDS, card(Ace, Club)], &[], &[], &[]])).unwrap();
    assert_eq!(round.current_player(), Some(0));

    assert_eq!(play(&mut round, 0, &[card(Ace, Club)]), Err(MoveError::MissingOpeningCard));
    assert_eq!(round.current_player(), Some(0));
    assert!(round.table().is_empty());
}

#[test]
fn single_three_of_diamonds_opens_the_round() {
    let mut round = GameRound::new();
    round.start(rigged_deck([&[Card::THREE_OF_DIAMONDS], &[], &[], &[]])).unwrap();

    let outcome = play(&mut round, 0, &[Card::THREE_OF_DIAMONDS]).unwrap();
    match outcome {
        MoveOutcome::Played { hand, next_player } => {
            assert_eq!(hand.kind(), HandType::Single);
            assert_eq!(next_player, 1);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(round.table().len(), 1);
    assert_eq!(round.current_player(), Some(1));
}

#[test]
fn pass_on_empty_table_is_rejected() {
    let mut round = GameRound::new();
    round.start(rigged_deck([&[], &[Card::THREE_OF_DIAMONDS], &[], &[]])).unwrap();
    assert_eq!(round.current_player(), Some(1));

    assert_eq!(pass(&mut round, 1), Err(MoveError::PassNotAllowed));
    assert_eq!(round.current_player(), Some(1));
}

#[test]
fn higher_pair_beats_lower_pair() {
    let mut round = GameRound::new();
    round
        .start(rigged_deck([
            &[Card::THREE_OF_DIAMONDS, card(Three, Spade), card(Three, Heart)],
            &[card(Four, Diamond), card(Four, Club)],
            &[],
            &[],
        ]))
        .unwrap();

    play(&mut round, 0, &[Card::THREE_OF_DIAMONDS]).unwrap();
    pass(&mut round, 1).unwrap();
    pass(&mut round, 2).unwrap();
    pass(&mut round, 3).unwrap();
    play(&mut round, 0, &[card(Three, Spade), card(Three, Heart)]).unwrap();

    let outcome = play(&mut round, 1, &[card(Four, Diamond), card(Four, Club)]).unwrap();
    assert!(matches!(outcome, MoveOutcome::Played { next_player: 2, .. }));
    assert_eq!(round.last_play().map(PlayedHand::owner), Some(1));
}

#[test]
fn straight_does_not_beat_straight_flush() {
    let straight_flush = [
        Card::THREE_OF_DIAMONDS,
        card(Four, Diamond),
        card(Five, Diamond),
        card(Six, Diamond),
        card(Seven, Diamond),
    ];
    let straight = [card(Three, Club), card(Four, Heart), card(Five, Spade), card(Six, Club), card(Seven, Heart)];

    let mut round = GameRound::new();
    round.start(rigged_deck([&straight_flush, &straight, &[], &[]])).unwrap();

    play(&mut round, 0, &straight_flush).unwrap();
    assert_eq!(
        play(&mut round, 1, &straight),
        Err(MoveError::DoesNotBeat { candidate: HandType::Straight, reference: HandType::StraightFlush })
    );
    assert_eq!(round.current_player(), Some(1));
    assert_eq!(round.player(1).unwrap().card_count(), 13);
}

#[test]
fn leader_plays_freely_after_everyone_passes() {
    let mut round = GameRound::new();
    round
        .start(rigged_deck([
            &[Card::THREE_OF_DIAMONDS, card(Five, Club)],
            &[card(Two, Spade)],
            &[],
            &[],
        ]))
        .unwrap();

    play(&mut round, 0, &[Card::THREE_OF_DIAMONDS]).unwrap();
    play(&mut round, 1, &[card(Two, Spade)]).unwrap();
    pass(&mut round, 2).unwrap();
    pass(&mut round, 3).unwrap();
    pass(&mut round, 0).unwrap();

    // 回到最后出牌的人：不能过牌，但任意合法牌型都可以出，哪怕比 2♠ 小
    assert_eq!(round.current_player(), Some(1));
    assert_eq!(pass(&mut round, 1), Err(MoveError::PassNotAllowed));

    let hand = round.player(1).unwrap().hand().to_vec();
    let lowest = hand[0];
    assert!(lowest < card(Two, Spade));
    assert!(play(&mut round, 1, &[lowest]).is_ok());

    let passes = round.table().iter().filter(|e| matches!(e, TableEntry::Pass { .. })).count();
    assert_eq!(passes, 3);
}

#[test]
fn emptying_a_hand_ends_the_round() {
    let straight_flush = [
        Card::THREE_OF_DIAMONDS,
        card(Four, Diamond),
        card(Five, Diamond),
        card(Six, Diamond),
        card(Seven, Diamond),
    ];
    let quad = [card(Eight, Diamond), card(Eight, Club), card(Eight, Heart), card(Eight, Spade), card(Nine, Diamond)];
    let triple = [card(King, Club), card(King, Heart), card(King, Spade)];
    let all: Vec<Card> = straight_flush.iter().chain(&quad).chain(&triple).copied().collect();

    let mut round = GameRound::with_names(["Ann", "Ben", "Cat", "Dan"]);
    round.start(rigged_deck([&all[..], &[], &[], &[]])).unwrap();

    play(&mut round, 0, &straight_flush).unwrap();
    for seat in 1..NUM_PLAYERS {
        pass(&mut round, seat).unwrap();
    }
    play(&mut round, 0, &quad).unwrap();
    for seat in 1..NUM_PLAYERS {
        pass(&mut round, seat).unwrap();
    }
    let outcome = play(&mut round, 0, &triple).unwrap();

    let results = match outcome {
        MoveOutcome::RoundEnded { hand, results } => {
            assert_eq!(hand.kind(), HandType::Triple);
            results
        }
        other => panic!("unexpected outcome: {:?}", other),
    };
    assert!(round.is_round_over());
    assert_eq!(round.current_player(), None);

    let winner = results.winner().unwrap();
    assert_eq!(winner.player, 0);
    assert_eq!(winner.name, "Ann");
    assert!(results.standings[1..].iter().all(|s| s.cards_left == 13));
    assert_eq!(round.results(), Some(&results));

    // 结束后任何出牌都会被拒绝
    for seat in 0..NUM_PLAYERS {
        assert!(matches!(pass(&mut round, seat), Err(MoveError::NotCurrentPlayer { current: None, .. })));
    }

    let snapshot = round.snapshot(None);
    assert!(snapshot.round_over);
    assert_eq!(snapshot.results, Some(results));
    assert!(snapshot.players.iter().all(|p| p.hand.is_some()));
}

#[test]
fn snapshot_counts_cards_and_hides_hands() {
    let mut round = GameRound::new();
    round.start(rigged_deck([&[Card::THREE_OF_DIAMONDS], &[card(Two, Spade)], &[], &[]])).unwrap();

    play(&mut round, 0, &[Card::THREE_OF_DIAMONDS]).unwrap();
    play(&mut round, 1, &[card(Two, Spade)]).unwrap();
    let snapshot = round.snapshot(Some(2));
    let counts: Vec<usize> = snapshot.players.iter().map(|p| p.card_count).collect();
    assert_eq!(counts, vec![12, 12, 13, 13]);
    assert_eq!(snapshot.hand_of(2).map(<[Card]>::len), Some(13));
    assert_eq!(snapshot.hand_of(0), None);
}

#[test]
fn snapshot_reflects_every_accepted_move() {
    let mut round = GameRound::new();
    round.start(rigged_deck([&[Card::THREE_OF_DIAMONDS], &[], &[], &[]])).unwrap();

    let report = round.submit_move(0, &[0]);
    assert!(report.accepted);
    assert_eq!(report.snapshot.table.len(), 1);
    assert_eq!(report.snapshot.current_player, Some(1));

    let report = round.submit_move(3, &[0]);
    assert!(!report.accepted);
    assert!(matches!(report.reason, Some(MoveError::NotCurrentPlayer { player: 3, current: Some(1) })));
}

#[test]
fn rejected_moves_leave_state_unchanged() {
    let mut round = GameRound::new();
    round.start(rigged_deck([&[Card::THREE_OF_DIAMONDS, card(Four, Club)], &[], &[], &[]])).unwrap();
    let before = round.snapshot(Some(0));

    assert!(matches!(round.apply_move(1, &[0]), Err(MoveError::NotCurrentPlayer { player: 1, current: Some(0) })));
    assert_eq!(round.apply_move(0, &[]), Err(MoveError::PassNotAllowed));
    assert_eq!(round.apply_move(0, &[13]), Err(MoveError::InvalidSelection));
    assert_eq!(round.apply_move(0, &[0, 0]), Err(MoveError::InvalidSelection));
    assert_eq!(play(&mut round, 0, &[card(Four, Club)]), Err(MoveError::MissingOpeningCard));
    assert_eq!(
        play(&mut round, 0, &[Card::THREE_OF_DIAMONDS, card(Four, Club)]),
        Err(MoveError::InvalidHandShape)
    );

    let after = round.snapshot(Some(0));
    assert_eq!(after.current_player, before.current_player);
    assert_eq!(after.players, before.players);
    assert!(after.table.is_empty());
    assert_eq!(round.deck().len(), 52);
}

#[test]
fn played_cards_leave_hand_and_deck() {
    let mut round = GameRound::new();
    round.start(rigged_deck([&[Card::THREE_OF_DIAMONDS], &[card(Two, Spade)], &[], &[]])).unwrap();

    play(&mut round, 0, &[Card::THREE_OF_DIAMONDS]).unwrap();
    assert!(!round.player(0).unwrap().holds(&Card::THREE_OF_DIAMONDS));
    assert!(!round.deck().contains(&Card::THREE_OF_DIAMONDS));
    play(&mut round, 1, &[card(Two, Spade)]).unwrap();

    // 牌堆始终等于四家手牌的并集
    let mut in_hands: Vec<Card> = round.players().iter().flat_map(|p| p.hand().to_vec()).collect();
    in_hands.sort();
    let mut in_deck = round.deck().as_slice().to_vec();
    in_deck.sort();
    assert_eq!(in_hands, in_deck);
    assert_eq!(in_deck.len() + round.table().len(), 52);
}

#[test]
fn single_does_not_beat_pair() {
    let mut round = GameRound::new();
    round
        .start(rigged_deck([
            &[Card::THREE_OF_DIAMONDS, card(Three, Club)],
            &[card(Four, Diamond), card(Five, Club)],
            &[],
            &[],
        ]))
        .unwrap();
    play(&mut round, 0, &[Card::THREE_OF_DIAMONDS, card(Three, Club)]).unwrap();
    assert_eq!(
        play(&mut round, 1, &[card(Four, Diamond)]),
        Err(MoveError::DoesNotBeat { candidate: HandType::Single, reference: HandType::Pair })
    );
    assert_eq!(round.current_player(), Some(1));
}

#[test]
fn submit_move_reports_both_outcomes() {
    let mut round = GameRound::new();
    round.start(rigged_deck([&[Card::THREE_OF_DIAMONDS], &[], &[], &[]])).unwrap();

    let rejected = round.submit_move(0, &[]);
    assert!(!rejected.accepted);
    assert_eq!(rejected.reason, Some(MoveError::PassNotAllowed));
    assert_eq!(rejected.snapshot.current_player, Some(0));

    let selection = indices(&round, 0, &[Card::THREE_OF_DIAMONDS]);
    let accepted = round.submit_move(0, &selection);
    assert!(accepted.accepted);
    assert!(accepted.reason.is_none());
    assert_eq!(accepted.snapshot.current_player, Some(1));
    assert_eq!(accepted.snapshot.hand_of(0).map(<[Card]>::len), Some(12));
}
