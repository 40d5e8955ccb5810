// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 场景目录
///
/// 按层级组织的字面负载与期望：
/// - 单元层（unit_tier）：每个功能用例一个独立流程
/// - 集成层（integration_tier）：共享会话的端到端流程
/// - 可用性层（usability_tier）：浏览器中的页面计时与元素检查
pub mod integration_tier;
pub mod payloads;
pub mod unit_tier;
pub mod usability_tier;

use crate::config::settings::Settings;
use crate::domain::models::flow::Flow;
use crate::domain::models::verdict::Tier;

/// 构建指定层级的流程
pub fn flows_for(tier: Tier, settings: &Settings) -> Vec<Flow> {
    match tier {
        Tier::Unit => unit_tier::flows(settings),
        Tier::Integration => vec![integration_tier::flow(settings)],
        Tier::Usability => vec![usability_tier::flow(settings)],
    }
}
