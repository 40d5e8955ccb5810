// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use scraper::{Html, Selector};

/// 从HTML文档中提取防伪令牌
///
/// 先查找 `<input name="{field}">` 的 `value`，找不到时回退到
/// `<meta name="csrf-token" content="...">`。空值视为不存在
///
/// # 参数
///
/// * `html` - 页面源码
/// * `field` - 令牌字段名（例如 `_token`）
///
/// # 返回值
///
/// * `Some(String)` - 令牌值
/// * `None` - 页面上没有令牌
pub fn extract_token(html: &str, field: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let input_selector = Selector::parse(&format!("input[name=\"{}\"]", field)).ok()?;
    let from_input = document
        .select(&input_selector)
        .find_map(|el| el.value().attr("value"))
        .map(str::trim)
        .filter(|v| !v.is_empty());

    if let Some(value) = from_input {
        return Some(value.to_string());
    }

    let meta_selector = Selector::parse("meta[name=\"csrf-token\"]").ok()?;
    document
        .select(&meta_selector)
        .find_map(|el| el.value().attr("content"))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
