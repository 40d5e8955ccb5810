// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理被测应用地址、预置账户、传输、可用性预算等配置
pub mod settings;
