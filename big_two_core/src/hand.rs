use crate::card::Card;
use crate::error::HandError;
use crate::state::Seat;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// 牌型 (HandType)
///
/// 大老二只有 1、2、3、5 张这几种出牌数量。
/// 五张牌型之间的大小由 `dominance` 决定，不依赖变体的声明顺序。
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum HandType {
    Single,        // 单张
    Pair,          // 对子
    Triple,        // 三条
    Straight,      // 顺子
    Flush,         // 同花
    FullHouse,     // 葫芦
    Quad,          // 四条 (铁支)
    StraightFlush, // 同花顺
}

impl HandType {
    /// 该牌型需要的牌数
    pub fn size(self) -> usize {
        match self {
            HandType::Single => 1,
            HandType::Pair => 2,
            HandType::Triple => 3,
            HandType::Straight
            | HandType::Flush
            | HandType::FullHouse
            | HandType::Quad
            | HandType::StraightFlush => 5,
        }
    }

    /// 牌型压制等级，只在五张牌型之间有意义。
    /// 同花顺 > 四条 > 葫芦 > 同花 > 顺子；一到三张的牌型都为 0。
    pub fn dominance(self) -> u8 {
        match self {
            HandType::Single | HandType::Pair | HandType::Triple => 0,
            HandType::Straight => 1,
            HandType::Flush => 2,
            HandType::FullHouse => 3,
            HandType::Quad => 4,
            HandType::StraightFlush => 5,
        }
    }
}

impl fmt::Display for HandType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            HandType::Single => "单张",
            HandType::Pair => "对子",
            HandType::Triple => "三条",
            HandType::Straight => "顺子",
            HandType::Flush => "同花",
            HandType::FullHouse => "葫芦",
            HandType::Quad => "四条",
            HandType::StraightFlush => "同花顺",
        })
    }
}

// --- 牌型识别 ---

/// 判断一组牌能组成哪种牌型，不合法时返回 `None`。
/// 结果与输入顺序无关：内部先排序再判断。含有重复牌的输入不合法。
pub fn classify(cards: &[Card]) -> Option<HandType> {
    let mut sorted = cards.to_vec();
    sorted.sort();
    classify_sorted(&sorted)
}

fn classify_sorted(cards: &[Card]) -> Option<HandType> {
    if cards.windows(2).any(|w| w[0] == w[1]) {
        return None;
    }
    match cards.len() {
        1 => Some(HandType::Single),
        2 if same_rank(cards) => Some(HandType::Pair),
        3 if same_rank(cards) => Some(HandType::Triple),
        5 => classify_five(cards),
        _ => None,
    }
}

fn same_rank(cards: &[Card]) -> bool {
    cards.windows(2).all(|w| w[0].rank == w[1].rank)
}

/// 五张牌：必须先判断同花顺，否则会被误判为顺子或同花
fn classify_five(cards: &[Card]) -> Option<HandType> {
    let is_flush = cards.windows(2).all(|w| w[0].suit == w[1].suit);
    // 按游戏点数顺序连续，不允许绕回 (Q-K-A-2-3 不是顺子)
    let is_straight = cards.windows(2).all(|w| w[1].rank.score() == w[0].rank.score() + 1);

    if is_flush && is_straight {
        return Some(HandType::StraightFlush);
    }

    match rank_counts(cards).as_slice() {
        [4, 1] => Some(HandType::Quad),
        [3, 2] => Some(HandType::FullHouse),
        _ if is_flush => Some(HandType::Flush),
        _ if is_straight => Some(HandType::Straight),
        _ => None,
    }
}

/// 各点数出现的次数，从多到少排列
fn rank_counts(sorted: &[Card]) -> Vec<usize> {
    let mut counts: Vec<usize> = sorted.chunk_by(|a, b| a.rank == b.rank).map(<[Card]>::len).collect();
    counts.sort_by(|a, b| b.cmp(a));
    counts
}

/// 用于同牌型比较的关键牌。`sorted` 必须已排序并且是 `kind` 的合法组合。
fn top_card(kind: HandType, sorted: &[Card]) -> Card {
    match kind {
        // 排序后中间那张一定属于三条
        HandType::FullHouse => sorted[2],
        // 四条要么在前四张，要么在后四张，取其中最大的一张
        HandType::Quad if sorted[0].rank == sorted[1].rank => sorted[3],
        _ => sorted[sorted.len() - 1],
    }
}

// --- 打出的牌 ---

/// 打到桌面上的一手牌。只能通过合法的牌型构造，构造后不可变。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PlayedHandRecord")]
pub struct PlayedHand {
    owner: Seat,
    kind: HandType,
    cards: Vec<Card>,
}

/// 反序列化时的原始数据，经过 `PlayedHand::new` 重新校验
#[derive(Deserialize)]
struct PlayedHandRecord {
    owner: Seat,
    cards: Vec<Card>,
}

impl TryFrom<PlayedHandRecord> for PlayedHand {
    type Error = HandError;

    fn try_from(record: PlayedHandRecord) -> Result<Self, Self::Error> {
        PlayedHand::new(record.owner, &record.cards)
    }
}

impl PlayedHand {
    pub fn new(owner: Seat, cards: &[Card]) -> Result<PlayedHand, HandError> {
        let mut cards = cards.to_vec();
        cards.sort();
        let kind = classify_sorted(&cards).ok_or(HandError::InvalidShape)?;
        Ok(PlayedHand { owner, kind, cards })
    }

    pub fn owner(&self) -> Seat {
        self.owner
    }

    pub fn kind(&self) -> HandType {
        self.kind
    }

    /// 已排序的牌
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn contains(&self, card: &Card) -> bool {
        self.cards.contains(card)
    }

    pub fn top_card(&self) -> Card {
        top_card(self.kind, &self.cards)
    }

    pub fn beats(&self, reference: &PlayedHand) -> bool {
        beats(self, reference)
    }
}

impl fmt::Display for PlayedHand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{{}}}", self.kind)?;
        for card in &self.cards {
            write!(f, " [{}]", card)?;
        }
        Ok(())
    }
}

// --- 牌型比较 ---

/// `candidate` 是否能压过 `reference`。
/// 张数不同永远压不过；五张牌型先比压制等级，同牌型再比关键牌（点数优先，花色其次）。
pub fn beats(candidate: &PlayedHand, reference: &PlayedHand) -> bool {
    if candidate.len() != reference.len() {
        return false;
    }
    match candidate.kind.dominance().cmp(&reference.kind.dominance()) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => candidate.kind == reference.kind && candidate.top_card() > reference.top_card(),
    }
}

// --- 单元测试 ---
