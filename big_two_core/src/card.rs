use crate::error::DeckError;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

// --- 核心数据结构定义 ---

/// 花色 (Suit)
/// 大老二的花色大小：方块 < 梅花 < 红心 < 黑桃，变体按从小到大的顺序声明
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Suit {
    Diamond, // 方块 ♦️
    Club,    // 梅花 ♣️
    Heart,   // 红心 ♥️
    Spade,   // 黑桃 ♠️
}

/// 点数 (Rank)
/// 大老二中 3 最小，2 最大。变体的声明顺序就是比较顺序，
/// 派生的 `Ord` 因此直接就是游戏规则下的大小。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Rank {
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
    Two,
}

/// 单张扑克牌 (Card)
/// 字段顺序不能调换：派生的 `Ord` 先比点数，再比花色。
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy, Serialize, Deserialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Diamond, Suit::Club, Suit::Heart, Suit::Spade];
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Three, Rank::Four, Rank::Five, Rank::Six, Rank::Seven, Rank::Eight, Rank::Nine,
        Rank::Ten, Rank::Jack, Rank::Queen, Rank::King, Rank::Ace, Rank::Two,
    ];

    /// 点数分值：3 为 0，2 为 12，用于判断顺子是否连续
    pub fn score(self) -> u8 {
        self as u8
    }
}

impl Card {
    /// 开局牌：方块 3
    pub const THREE_OF_DIAMONDS: Card = Card { rank: Rank::Three, suit: Suit::Diamond };

    pub fn new(rank: Rank, suit: Suit) -> Card {
        Card { rank, suit }
    }
}

// --- 实现辅助功能 ---

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Suit::Diamond => "♦️",
            Suit::Club => "♣️",
            Suit::Heart => "♥️",
            Suit::Spade => "♠️",
        })
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "T",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
            Rank::Two => "2",
        })
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.suit, self.rank)
    }
}

// --- 牌堆 ---

/// 牌堆 (Deck)
///
/// 保存一局中尚未打到桌面上的牌，任何时候都不会出现重复的牌。
/// 牌的顺序保持外部洗牌后的顺序，引擎本身从不洗牌。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Card>", into = "Vec<Card>")]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// 完整的一副牌数量
    pub const FULL_SIZE: usize = 52;

    pub fn new() -> Deck {
        Deck::default()
    }

    /// 按花色、点数顺序生成完整的 52 张牌
    pub fn standard() -> Deck {
        let mut deck = Deck::new();
        deck.fill();
        deck
    }

    /// 使用外部给定顺序的牌构造牌堆，拒绝重复的牌
    pub fn from_cards(cards: Vec<Card>) -> Result<Deck, DeckError> {
        let mut deck = Deck::with_capacity(cards.len());
        for card in cards {
            deck.add_card(card)?;
        }
        Ok(deck)
    }

    /// 按发牌顺序排列四名玩家各自的手牌：第 i 张牌发给 i % 4 号玩家。
    /// 用于重放一局已知的发牌结果。
    pub fn from_hands(hands: &[Vec<Card>]) -> Result<Deck, DeckError> {
        let seats = hands.len();
        let per_hand = hands.first().map_or(0, Vec::len);
        if seats == 0 || hands.iter().any(|h| h.len() != per_hand) {
            return Err(DeckError::Incomplete(hands.iter().map(Vec::len).sum()));
        }

        let mut deck = Deck::with_capacity(seats * per_hand);
        for i in 0..per_hand {
            for hand in hands {
                deck.add_card(hand[i])?;
            }
        }
        Ok(deck)
    }

    /// 预先指定部分座位的手牌，其余的牌按标准顺序补齐到平均张数，
    /// 再按 `from_hands` 的发牌顺序排列。用于复现残局或指定的发牌。
    pub fn from_partial_hands(preset: &[&[Card]]) -> Result<Deck, DeckError> {
        let seats = preset.len();
        if seats == 0 || Deck::FULL_SIZE % seats != 0 {
            return Err(DeckError::Incomplete(preset.iter().map(|h| h.len()).sum()));
        }
        let per_hand = Deck::FULL_SIZE / seats;

        let taken = Deck::from_cards(preset.iter().flat_map(|h| h.iter().copied()).collect())?;
        let mut rest = Deck::standard().cards.into_iter().filter(|c| !taken.contains(c));
        let hands: Vec<Vec<Card>> = preset
            .iter()
            .map(|cards| {
                let mut hand = cards.to_vec();
                hand.extend(rest.by_ref().take(per_hand.saturating_sub(cards.len())));
                hand
            })
            .collect();
        Deck::from_hands(&hands)
    }

    fn with_capacity(capacity: usize) -> Deck {
        Deck { cards: Vec::with_capacity(capacity) }
    }

    fn fill(&mut self) {
        for &suit in &Suit::ALL {
            for &rank in &Rank::ALL {
                self.cards.push(Card { rank, suit });
            }
        }
    }

    /// 填充完整的 52 张牌。牌堆非空时失败，需要先调用 `clear`。
    pub fn initialize(&mut self) -> Result<(), DeckError> {
        if !self.cards.is_empty() {
            return Err(DeckError::NotEmpty(self.cards.len()));
        }
        self.fill();
        Ok(())
    }

    pub fn clear(&mut self) {
        self.cards.clear();
    }

    pub fn add_card(&mut self, card: Card) -> Result<(), DeckError> {
        if self.contains(&card) {
            return Err(DeckError::DuplicateCard(card));
        }
        self.cards.push(card);
        Ok(())
    }

    /// 按值移除一张牌，保持其余牌的相对顺序
    pub fn remove_card(&mut self, card: &Card) -> Result<(), DeckError> {
        let pos = self
            .cards
            .iter()
            .position(|c| c == card)
            .ok_or(DeckError::CardNotFound(*card))?;
        self.cards.remove(pos);
        Ok(())
    }

    pub fn contains(&self, card: &Card) -> bool {
        self.cards.contains(card)
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn card_at(&self, index: usize) -> Option<Card> {
        self.cards.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }

    pub fn as_slice(&self) -> &[Card] {
        &self.cards
    }

    /// 洗牌。只供调用方（服务端）在开局前使用。
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }
}

impl TryFrom<Vec<Card>> for Deck {
    type Error = DeckError;

    fn try_from(cards: Vec<Card>) -> Result<Self, Self::Error> {
        Deck::from_cards(cards)
    }
}

impl From<Deck> for Vec<Card> {
    fn from(deck: Deck) -> Self {
        deck.cards
    }
}

// --- 单元测试 ---
