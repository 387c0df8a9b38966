use crate::card::Card;
use crate::error::MoveError;
use crate::state::{MoveOutcome, RoundResults, RoundSnapshot, Seat};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type RoomId = Uuid;

// --- 客户端 -> 服务器 的消息 ---
// 这些是客户端可以发送给服务器的指令或动作。

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    // --- 房间管理消息 ---
    /// 客户端请求创建一个新房间
    CreateRoom { nickname: String },
    /// 客户端请求加入一个已存在的房间
    JoinRoom { room_id: RoomId, nickname: String },

    // --- 游戏内消息 ---
    /// 准备好开始下一局。四个座位都准备好后服务器发牌。
    Ready,
    /// 出牌：手牌中的下标，为空表示过牌
    PlayMove { cards: Vec<usize> },
    /// 请求一份自己视角的快照
    GetSnapshot,
}

// --- 服务器 -> 客户端 的消息 ---
// 这些是服务器在游戏状态改变后，广播给所有客户端的事件通知。

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum ServerMessage {
    // --- 房间管理消息 ---
    /// 成功加入或创建房间后，服务器私密地发给该玩家
    RoomJoined {
        room_id: RoomId,
        your_seat: Seat,
        snapshot: RoundSnapshot,
    },

    /// 一个新玩家坐下了
    PlayerJoined { seat: Seat, nickname: String },

    /// 一个玩家离开了房间
    PlayerLeft { seat: Seat, nickname: String },

    /// 一个玩家已准备
    PlayerReady { seat: Seat },

    // --- 游戏状态更新消息 ---
    /// 新的一局开始。每个座位只会收到自己的手牌。
    RoundStarted {
        first_player: Seat,
        your_hand: Vec<Card>,
    },

    /// 某个玩家的出牌或过牌被接受
    MoveMade { player: Seat, outcome: MoveOutcome },

    /// 出牌被拒绝，只发给出牌的玩家，需要重新选择
    MoveRejected { error: MoveError },

    /// 当前视角的牌局快照，发送前已隐藏他人手牌
    Snapshot(RoundSnapshot),

    /// 本局结束，公布名次
    RoundOver { results: RoundResults },

    /// 服务器向特定客户端发送提示或错误信息
    Info { message: String },
    Error { message: String },
}

impl ClientMessage {
    pub fn play(cards: Vec<usize>) -> ClientMessage {
        ClientMessage::PlayMove { cards }
    }

    pub fn pass() -> ClientMessage {
        ClientMessage::PlayMove { cards: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::GameRound;

    #[test]
    fn test_pass_is_empty_selection() {
        assert_eq!(ClientMessage::pass(), ClientMessage::PlayMove { cards: vec![] });
        assert_eq!(ClientMessage::play(vec![0, 2]), ClientMessage::PlayMove { cards: vec![0, 2] });
    }

    #[test]
    fn test_messages_survive_json() {
        let msg = ClientMessage::JoinRoom { room_id: Uuid::new_v4(), nickname: "小明".to_string() };
        let text = serde_json::to_string(&msg).unwrap();
        assert_eq!(serde_json::from_str::<ClientMessage>(&text).unwrap(), msg);

        let rejected = ServerMessage::MoveRejected { error: MoveError::MissingOpeningCard };
        let text = serde_json::to_string(&rejected).unwrap();
        match serde_json::from_str::<ServerMessage>(&text).unwrap() {
            ServerMessage::MoveRejected { error } => assert_eq!(error, MoveError::MissingOpeningCard),
            other => panic!("unexpected message: {:?}", other),
        }

        let snapshot = ServerMessage::Snapshot(GameRound::new().snapshot(None));
        assert!(serde_json::to_string(&snapshot).is_ok());
    }
}
