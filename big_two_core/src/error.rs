use crate::card::Card;
use crate::hand::HandType;
use crate::state::Seat;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 牌堆一致性错误。
/// 在引擎内部出现时属于程序错误（不变量被破坏），而不是玩家的非法操作。
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeckError {
    #[error("牌堆非空（{0} 张），请先清空")]
    NotEmpty(usize),

    #[error("牌堆中没有 {0}")]
    CardNotFound(Card),

    #[error("牌堆中已有 {0}")]
    DuplicateCard(Card),

    #[error("需要完整的 52 张牌，实际为 {0} 张")]
    Incomplete(usize),
}

/// 构造 `PlayedHand` 失败的原因
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum HandError {
    #[error("所选的牌无法组成合法牌型")]
    InvalidShape,
}

/// 出牌被拒绝的原因。
/// 所有变体都只是拒绝：牌局状态不会因此发生任何改变，调用方应提示同一玩家重新选择。
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveError {
    #[error("现在不是玩家 {player} 的回合")]
    NotCurrentPlayer { player: Seat, current: Option<Seat> },

    #[error("现在不能过牌")]
    PassNotAllowed,

    #[error("选择的牌无效（越界或重复）")]
    InvalidSelection,

    #[error("所选的牌无法组成合法牌型")]
    InvalidHandShape,

    #[error("第一手牌必须包含方块3")]
    MissingOpeningCard,

    #[error("{candidate} 压不过桌面上的 {reference}")]
    DoesNotBeat { candidate: HandType, reference: HandType },

    #[error("内部错误: {0}")]
    Inconsistent(#[from] DeckError),
}

impl From<HandError> for MoveError {
    fn from(err: HandError) -> Self {
        match err {
            HandError::InvalidShape => MoveError::InvalidHandShape,
        }
    }
}
