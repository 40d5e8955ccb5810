// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::Serialize;

/// 防伪令牌
///
/// 作用域为一次页面抓取。`fetch_seq` 是抓取它的那次请求在所属会话中的序号，
/// 即使服务器两次返回相同的值，两个令牌也能按新鲜度区分
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AntiForgeryToken {
    /// 令牌值
    pub value: String,
    /// 令牌所在页面的URL
    pub source_url: String,
    /// 抓取序号
    pub fetch_seq: u64,
}

impl AntiForgeryToken {
    /// 是否来自比 `other` 更晚的一次抓取
    pub fn is_fresher_than(&self, other: &AntiForgeryToken) -> bool {
        self.fetch_seq > other.fetch_seq
    }
}
