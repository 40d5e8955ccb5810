// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::text_normalizer::normalize;
use crate::engines::traits::{ElementFinder, ElementLocator, EngineError};
use async_trait::async_trait;
use scraper::{Html, Selector};

/// 静态HTML文档
///
/// 对抓取到的原始HTML做元素查询，不执行任何脚本。
/// 只保存源码，解析在每次查询时进行（`Html` 不能跨 await 持有）
#[derive(Debug, Clone)]
pub struct StaticDocument {
    source: String,
}

impl StaticDocument {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// 同步统计匹配定位器的元素数量
    ///
    /// 文本定位器按规范化后的子串匹配，与关键字断言的容错规则一致
    pub fn count(&self, locator: &ElementLocator) -> Result<usize, EngineError> {
        let document = Html::parse_document(&self.source);
        match locator {
            ElementLocator::Text { tag, text } => {
                let selector = parse_selector(tag)?;
                let needle = normalize(text);
                Ok(document
                    .select(&selector)
                    .filter(|el| normalize(&el.text().collect::<String>()).contains(&needle))
                    .count())
            }
            other => {
                let css = other
                    .to_css()
                    .ok_or_else(|| EngineError::InvalidLocator(other.to_string()))?;
                let selector = parse_selector(&css)?;
                Ok(document.select(&selector).count())
            }
        }
    }
}

fn parse_selector(css: &str) -> Result<Selector, EngineError> {
    Selector::parse(css).map_err(|e| EngineError::InvalidLocator(format!("{}: {}", css, e)))
}

#[async_trait]
impl ElementFinder for StaticDocument {
    async fn count_elements(&self, locator: &ElementLocator) -> Result<usize, EngineError> {
        self.count(locator)
    }
}
