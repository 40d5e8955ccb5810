// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 场景目录描述“测什么”，层级运行器负责为流程创建参与者并汇总报告
pub mod runner;
pub mod scenarios;
