// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 场景目录与层级运行器
pub mod application;

/// 配置模块
///
/// 处理测试工具的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含流程模型、断言引擎、会话载体和流程编排
pub mod domain;

/// 引擎模块
///
/// HTTP传输、静态HTML文档和浏览器驱动
pub mod engines;

/// 工具模块
///
/// 提供错误分类和遥测初始化
pub mod utils;
