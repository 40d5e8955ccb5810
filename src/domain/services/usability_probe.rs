// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::keyword_engine::{find_expected_elements, ElementReport};
use crate::engines::traits::{BrowserDriver, ElementLocator, EngineError};
use serde::Serialize;
use tokio::time::Instant;
use tracing::info;

/// 探测报告
///
/// 只记录事实（耗时、找到的元素），是否满足时间预算由调用方用
/// [`TimingBudget::check`](crate::domain::models::expectation::TimingBudget::check) 决定
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    pub url: String,
    pub elapsed_ms: u64,
    pub elements: ElementReport,
}

/// 可用性探测器
///
/// 用挂钟计时包裹一次导航，导航完成后在渲染后的 DOM 中查询期望的交互元素
pub struct UsabilityProbe<'a> {
    driver: &'a dyn BrowserDriver,
}

impl<'a> UsabilityProbe<'a> {
    pub fn new(driver: &'a dyn BrowserDriver) -> Self {
        Self { driver }
    }

    /// 计时导航并查询元素
    ///
    /// # 参数
    ///
    /// * `url` - 目标URL
    /// * `expected` - 期望存在的元素定位器
    ///
    /// # 返回值
    ///
    /// * `Ok(ProbeReport)` - 耗时与元素查找结果
    /// * `Err(EngineError)` - 导航或查询失败
    pub async fn measure(
        &self,
        url: &str,
        expected: &[ElementLocator],
    ) -> Result<ProbeReport, EngineError> {
        let start = Instant::now();
        self.driver.navigate(url).await?;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        let elements = find_expected_elements(self.driver, expected).await?;

        info!(
            url,
            elapsed_ms,
            found = elements.found.len(),
            missing = elements.missing.len(),
            driver = self.driver.name(),
            "usability probe measured"
        );

        Ok(ProbeReport {
            url: url.to_string(),
            elapsed_ms,
            elements,
        })
    }
}
