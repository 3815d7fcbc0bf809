//! 会话监管：中断管理
//!
//! 每个会话持有一个根 CancellationToken；每次计划执行领取子 token，
//! ExecutionEngine 在每一步开始前检查。cancel() 取消当前所有执行并换上新的根 token，
//! 之后到达的请求不受影响。

use std::sync::Mutex;

use tokio_util::sync::CancellationToken;

/// 会话级取消令牌
#[derive(Debug)]
pub struct SessionSupervisor {
    cancel_token: Mutex<CancellationToken>,
}

impl SessionSupervisor {
    pub fn new() -> Self {
        Self {
            cancel_token: Mutex::new(CancellationToken::new()),
        }
    }

    /// 创建子 token（用于单次计划执行）
    pub fn child_token(&self) -> CancellationToken {
        match self.cancel_token.lock() {
            Ok(token) => token.child_token(),
            Err(poisoned) => poisoned.into_inner().child_token(),
        }
    }

    /// 取消该会话正在进行的执行
    pub fn cancel(&self) {
        let mut token = match self.cancel_token.lock() {
            Ok(token) => token,
            Err(poisoned) => poisoned.into_inner(),
        };
        token.cancel();
        *token = CancellationToken::new();
    }
}

impl Default for SessionSupervisor {
    fn default() -> Self {
        Self::new()
    }
}
