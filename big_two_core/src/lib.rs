//! # 大老二核心逻辑库
//!
//! 这个 `core` crate 包含了大老二的牌序、牌型识别、牌型比较、
//! 每局的出牌状态机，以及客户端-服务器通信消息的定义。
//! 它不涉及网络、界面或洗牌策略，可以被任何上层应用复用：
//! 调用方负责洗牌并把 52 张牌交给 `GameRound::start`，
//! 之后把每个玩家的操作交给 `GameRound::apply_move`。

mod card;
mod error;
mod hand;
mod logic;
mod message;
mod state;

pub use card::*;

pub use error::*;

pub use hand::*;

pub use message::*;

pub use state::*;
