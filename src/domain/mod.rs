// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含测试工具的核心逻辑，包括：
/// - 领域模型（models）：流程、期望、令牌和判定结果
/// - 服务（services）：文本规范化、令牌提取、关键字断言、会话载体、
///   流程编排和可用性探测
///
/// 领域层只通过特质依赖传输与浏览器，不直接依赖具体实现。
pub mod models;
pub mod services;
