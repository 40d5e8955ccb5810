// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::EngineError;
use serde::Serialize;
use thiserror::Error;

/// 步骤失败分类
///
/// 写入判定记录，供报告区分“内容错误”和“没有内容”等情况
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// 前置条件未满足（缺少令牌、未登录等）
    Precondition,
    /// 后置条件（状态码或关键字）未满足
    Assertion,
    /// 底层 HTTP 或浏览器协作者出错
    Transport,
    /// 响应或渲染内容为空
    EmptyCorpus,
}

/// 测试框架错误类型
///
/// 每个错误只影响产生它的步骤，不会中断整个运行
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HarnessError {
    #[error("precondition not met: {0}")]
    Precondition(String),

    #[error("assertion failed: {0}")]
    Assertion(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("empty corpus: {0}")]
    EmptyCorpus(String),
}

impl HarnessError {
    /// 错误对应的失败分类
    pub fn kind(&self) -> FailureKind {
        match self {
            HarnessError::Precondition(_) => FailureKind::Precondition,
            HarnessError::Assertion(_) => FailureKind::Assertion,
            HarnessError::Transport(_) => FailureKind::Transport,
            HarnessError::EmptyCorpus(_) => FailureKind::EmptyCorpus,
        }
    }
}

impl From<EngineError> for HarnessError {
    fn from(err: EngineError) -> Self {
        HarnessError::Transport(err.to_string())
    }
}
