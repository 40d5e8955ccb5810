// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 包含的服务：
/// - 文本规范化（text_normalizer）：小写并去除变音符号
/// - 令牌提取（token_extractor）：从HTML中读取防伪令牌
/// - 关键字断言（keyword_engine）：语料构建与期望评估
/// - 流程编排（flow_sequencer）：步骤状态机与失败策略
/// - 会话载体（session_carrier）：HTTP层的流程参与者
/// - 浏览器会话（browser_session）：可用性层的流程参与者
/// - 可用性探测（usability_probe）：页面加载计时与元素查询
pub mod browser_session;
pub mod flow_sequencer;
pub mod keyword_engine;
pub mod session_carrier;
pub mod text_normalizer;
pub mod token_extractor;
pub mod usability_probe;
