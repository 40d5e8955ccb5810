// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了测试工具的核心数据结构，包括：
/// - 期望（expectation）：关键字、状态码和元素断言，以及时间预算
/// - 流程（flow）：步骤、动作、前置条件和模板变量
/// - 令牌（token）：页面作用域的防伪令牌
/// - 判定（verdict）：步骤状态机、流程判定和运行报告
pub mod expectation;
pub mod flow;
pub mod token;
pub mod verdict;
