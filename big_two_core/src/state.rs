use crate::card::{Card, Deck};
use crate::error::MoveError;
use crate::hand::PlayedHand;
use serde::{Deserialize, Serialize};

/// 座位号，0..NUM_PLAYERS
pub type Seat = usize;

/// 大老二固定四人
pub const NUM_PLAYERS: usize = 4;

/// 一局牌的完整状态，由服务端独占持有。
/// 不存在全局的牌局对象，多桌牌局各自拥有独立的 `GameRound`。
/// 不可序列化：对外只发送 `RoundSnapshot`，牌局状态只能由引擎自己构造。
#[derive(Debug, Clone)]
pub struct GameRound {
    pub(crate) players: Vec<Player>,
    // 按时间顺序记录的出牌与过牌，只在新一局开始时清空
    pub(crate) table: Vec<TableEntry>,
    // 尚未打到桌面上的牌，始终等于四名玩家手牌的并集
    pub(crate) deck: Deck,
    pub(crate) phase: RoundPhase,
    pub(crate) results: Option<RoundResults>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: Seat,
    pub name: String,
    // 只有引擎在发牌和出牌时修改
    pub(crate) hand: Vec<Card>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RoundPhase {
    /// 没有进行中的牌局
    Idle,
    /// 等待该座位的玩家出牌或过牌
    AwaitingMove(Seat),
    /// 有玩家出完了手牌，结算完成
    RoundOver,
}

/// 桌面记录中的一项
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TableEntry {
    Play(PlayedHand),
    Pass { player: Seat },
}

/// 一局结束后单个玩家的名次
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Standing {
    pub player: Seat,
    pub name: String,
    pub cards_left: usize,
}

/// 按剩余手牌数从少到多排列，出完牌的玩家排在第一位
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundResults {
    pub standings: Vec<Standing>,
}

/// 出牌被接受后的结果
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum MoveOutcome {
    Passed { player: Seat, next_player: Seat },
    Played { hand: PlayedHand, next_player: Seat },
    RoundEnded { hand: PlayedHand, results: RoundResults },
}

/// 对外接口的出牌回执：是否接受、拒绝原因以及出牌后的快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveReport {
    pub accepted: bool,
    pub reason: Option<MoveError>,
    pub outcome: Option<MoveOutcome>,
    pub snapshot: RoundSnapshot,
}

/// 发给某个观察者的牌局快照
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub phase: RoundPhase,
    pub current_player: Option<Seat>,
    pub players: Vec<PlayerView>,
    pub table: Vec<TableEntry>,
    pub round_over: bool,
    pub results: Option<RoundResults>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerView {
    pub id: Seat,
    pub name: String,
    pub card_count: usize,
    // 只有观察者自己（或牌局结束后）才能看到具体手牌
    pub hand: Option<Vec<Card>>,
}

// --- 实现方法 ---

impl Player {
    pub fn new(id: Seat) -> Player {
        Player { id, name: format!("Player {}", id), hand: Vec::new() }
    }

    /// 已排序的手牌
    pub fn hand(&self) -> &[Card] {
        &self.hand
    }

    pub fn card_count(&self) -> usize {
        self.hand.len()
    }

    pub fn holds(&self, card: &Card) -> bool {
        self.hand.contains(card)
    }

    /// 按手牌下标取出选中的牌，下标越界或重复时失败
    pub(crate) fn select(&self, indices: &[usize]) -> Result<Vec<Card>, MoveError> {
        let mut seen = vec![false; self.hand.len()];
        let mut cards = Vec::with_capacity(indices.len());
        for &idx in indices {
            match seen.get_mut(idx) {
                Some(flag) if !*flag => {
                    *flag = true;
                    cards.push(self.hand[idx]);
                }
                _ => return Err(MoveError::InvalidSelection),
            }
        }
        Ok(cards)
    }

    pub(crate) fn remove_cards(&mut self, cards: &[Card]) {
        self.hand.retain(|c| !cards.contains(c));
        self.hand.sort();
    }
}

impl RoundResults {
    pub fn winner(&self) -> Option<&Standing> {
        self.standings.first().filter(|s| s.cards_left == 0)
    }
}

impl Default for GameRound {
    fn default() -> Self {
        GameRound::new()
    }
}

impl GameRound {
    pub fn new() -> GameRound {
        GameRound {
            players: (0..NUM_PLAYERS).map(Player::new).collect(),
            table: Vec::new(),
            deck: Deck::new(),
            phase: RoundPhase::Idle,
            results: None,
        }
    }

    /// 使用指定昵称创建牌局
    pub fn with_names<S: Into<String>>(names: [S; NUM_PLAYERS]) -> GameRound {
        let mut round = GameRound::new();
        for (player, name) in round.players.iter_mut().zip(names) {
            player.name = name.into();
        }
        round
    }

    pub fn set_player_name(&mut self, seat: Seat, name: impl Into<String>) {
        if let Some(player) = self.players.get_mut(seat) {
            player.name = name.into();
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    /// 当前应该行动的玩家；没有进行中的牌局时为 `None`
    pub fn current_player(&self) -> Option<Seat> {
        match self.phase {
            RoundPhase::AwaitingMove(seat) => Some(seat),
            RoundPhase::Idle | RoundPhase::RoundOver => None,
        }
    }

    pub fn is_round_over(&self) -> bool {
        self.phase == RoundPhase::RoundOver
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self.phase, RoundPhase::AwaitingMove(_))
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, seat: Seat) -> Option<&Player> {
        self.players.get(seat)
    }

    pub fn table(&self) -> &[TableEntry] {
        &self.table
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn results(&self) -> Option<&RoundResults> {
        self.results.as_ref()
    }

    /// 桌面上最近一次（非过牌）出的牌
    pub fn last_play(&self) -> Option<&PlayedHand> {
        self.table.iter().rev().find_map(|entry| match entry {
            TableEntry::Play(hand) => Some(hand),
            TableEntry::Pass { .. } => None,
        })
    }

    /// 为某个观察者生成快照。`viewer` 为 `None` 表示旁观者，看不到任何手牌。
    /// 牌局结束后公开所有剩余手牌。
    pub fn snapshot(&self, viewer: Option<Seat>) -> RoundSnapshot {
        let reveal_all = self.is_round_over();
        let players = self
            .players
            .iter()
            .map(|p| PlayerView {
                id: p.id,
                name: p.name.clone(),
                card_count: p.hand.len(),
                hand: (reveal_all || Some(p.id) == viewer).then(|| p.hand.clone()),
            })
            .collect();

        RoundSnapshot {
            phase: self.phase,
            current_player: self.current_player(),
            players,
            table: self.table.clone(),
            round_over: self.is_round_over(),
            results: self.results.clone(),
        }
    }
}

impl RoundSnapshot {
    /// 桌面上最近一次（非过牌）出的牌
    pub fn last_play(&self) -> Option<&PlayedHand> {
        self.table.iter().rev().find_map(|entry| match entry {
            TableEntry::Play(hand) => Some(hand),
            TableEntry::Pass { .. } => None,
        })
    }

    pub fn hand_of(&self, seat: Seat) -> Option<&[Card]> {
        self.players.get(seat).and_then(|p| p.hand.as_deref())
    }
}

// --- 单元测试 ---
