use crate::card::*;
use crate::error::{DeckError, MoveError};
use crate::hand::PlayedHand;
use crate::state::*;
use tracing::{debug, info};

// --- 核心游戏流程函数 ---

impl GameRound {
    /// 开始新的一局
    ///
    /// - 清空所有玩家的手牌和桌面记录。
    /// - 按外部洗好的顺序发牌：第 i 张牌发给 i % 4 号玩家。
    /// - 每名玩家的手牌只在这里排序一次。
    /// - 持有方块3的玩家第一个行动。
    ///
    /// 牌堆必须恰好是完整的 52 张牌，否则返回错误且不改变任何状态。
    /// 返回第一个行动的座位号。
    pub fn start(&mut self, deck: Deck) -> Result<Seat, DeckError> {
        if deck.len() != Deck::FULL_SIZE {
            return Err(DeckError::Incomplete(deck.len()));
        }
        let opener = deck
            .iter()
            .position(|c| *c == Card::THREE_OF_DIAMONDS)
            .map(|i| i % NUM_PLAYERS)
            .ok_or(DeckError::CardNotFound(Card::THREE_OF_DIAMONDS))?;

        self.reset();
        for (i, card) in deck.iter().enumerate() {
            self.players[i % NUM_PLAYERS].hand.push(*card);
        }
        for player in &mut self.players {
            player.hand.sort();
        }
        self.deck = deck;
        self.phase = RoundPhase::AwaitingMove(opener);

        debug!(opener, "新的一局开始");
        Ok(opener)
    }

    /// 中止当前牌局（例如有玩家断线），回到 `Idle`
    pub fn abort(&mut self) {
        if self.phase != RoundPhase::Idle {
            info!(phase = ?self.phase, "牌局被中止");
        }
        self.reset();
    }

    fn reset(&mut self) {
        for player in &mut self.players {
            player.hand.clear();
        }
        self.table.clear();
        self.deck.clear();
        self.results = None;
        self.phase = RoundPhase::Idle;
    }

    /// 处理单个玩家的出牌或过牌
    ///
    /// `selection` 是玩家手牌（已排序）中的下标，为空表示过牌。
    /// 所有检查都在修改状态之前完成，被拒绝的操作不会改变牌局，
    /// 当前玩家也保持不变。
    pub fn apply_move(&mut self, seat: Seat, selection: &[usize]) -> Result<MoveOutcome, MoveError> {
        let current = self.current_player();
        if current != Some(seat) {
            return Err(MoveError::NotCurrentPlayer { player: seat, current });
        }

        if selection.is_empty() {
            return self.pass(seat);
        }

        let player = self
            .players
            .get(seat)
            .ok_or(MoveError::NotCurrentPlayer { player: seat, current })?;
        let cards = player.select(selection)?;
        let candidate = PlayedHand::new(seat, &cards)?;

        // 第一手牌必须带方块3
        if self.table.is_empty() && !candidate.contains(&Card::THREE_OF_DIAMONDS) {
            return Err(MoveError::MissingOpeningCard);
        }

        // 桌面上最后出牌的是自己时（其他人都过了），任意合法牌型都可以出
        if let Some(reference) = self.last_play().filter(|h| h.owner() != seat) {
            if !candidate.beats(reference) {
                return Err(MoveError::DoesNotBeat {
                    candidate: candidate.kind(),
                    reference: reference.kind(),
                });
            }
        }

        // 在副本上移除，牌堆与手牌不一致时整步作废
        let mut deck = self.deck.clone();
        for card in candidate.cards() {
            deck.remove_card(card)?;
        }

        Ok(self.play(seat, candidate, deck))
    }

    /// 对外接口：无论是否被接受都返回该玩家视角的最新快照
    pub fn submit_move(&mut self, seat: Seat, selection: &[usize]) -> MoveReport {
        let result = self.apply_move(seat, selection);
        let snapshot = self.snapshot(Some(seat));
        match result {
            Ok(outcome) => MoveReport { accepted: true, reason: None, outcome: Some(outcome), snapshot },
            Err(err) => MoveReport { accepted: false, reason: Some(err), outcome: None, snapshot },
        }
    }

    fn pass(&mut self, seat: Seat) -> Result<MoveOutcome, MoveError> {
        match self.last_play() {
            None => return Err(MoveError::PassNotAllowed),
            Some(hand) if hand.owner() == seat => return Err(MoveError::PassNotAllowed),
            Some(_) => {}
        }

        self.table.push(TableEntry::Pass { player: seat });
        let next_player = self.advance(seat);
        debug!(seat, next_player, "过牌");
        Ok(MoveOutcome::Passed { player: seat, next_player })
    }

    /// 所有检查通过后执行出牌，`deck` 是已经移除了这手牌的牌堆
    fn play(&mut self, seat: Seat, hand: PlayedHand, deck: Deck) -> MoveOutcome {
        self.players[seat].remove_cards(hand.cards());
        self.deck = deck;
        self.table.push(TableEntry::Play(hand.clone()));
        debug!(seat, hand = %hand, "出牌");

        if self.players.iter().any(|p| p.hand.is_empty()) {
            let results = self.finish_round();
            return MoveOutcome::RoundEnded { hand, results };
        }

        let next_player = self.advance(seat);
        MoveOutcome::Played { hand, next_player }
    }

    fn advance(&mut self, seat: Seat) -> Seat {
        let next = (seat + 1) % NUM_PLAYERS;
        self.phase = RoundPhase::AwaitingMove(next);
        next
    }

    /// 结算：按剩余手牌数排名，手牌出完的玩家获胜
    fn finish_round(&mut self) -> RoundResults {
        let mut standings: Vec<Standing> = self
            .players
            .iter()
            .map(|p| Standing { player: p.id, name: p.name.clone(), cards_left: p.hand.len() })
            .collect();
        standings.sort_by_key(|s| s.cards_left);

        let results = RoundResults { standings };
        self.phase = RoundPhase::RoundOver;
        self.results = Some(results.clone());

        if let Some(winner) = results.winner() {
            info!(winner = winner.player, name = %winner.name, "本局结束");
        }
        results
    }
}

// --- 单元测试 ---
