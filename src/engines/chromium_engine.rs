// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::UsabilitySettings;
use crate::engines::traits::{BrowserDriver, ElementFinder, ElementLocator, EngineError};
use async_trait::async_trait;
use chromiumoxide::element::Element;
use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Chromium驱动
///
/// 基于chromiumoxide的浏览器自动化驱动。每次可用性运行启动（或连接）一个浏览器，
/// 运行结束时通过 [`BrowserDriver::close`] 关闭
pub struct ChromiumDriver {
    browser: Mutex<Browser>,
    page: Page,
    handler: JoinHandle<()>,
    navigation_timeout: Duration,
}

/// 是否为“没有匹配节点”类错误
///
/// XPath 搜索零结果时 Chrome 拒绝读取空区间；其余错误（连接断开、标签页崩溃、
/// 协议超时）都不是零匹配
fn is_no_node(err: &CdpError) -> bool {
    const NO_NODE_MESSAGES: [&str; 3] = [
        "Invalid search result range",
        "Could not find node",
        "No node with given id",
    ];
    match err {
        CdpError::NotFound => true,
        CdpError::Chrome(e) => NO_NODE_MESSAGES.iter().any(|m| e.message.contains(m)),
        _ => false,
    }
}

impl ChromiumDriver {
    /// 启动或连接浏览器并打开空白页
    ///
    /// # 参数
    ///
    /// * `settings` - 可用性层配置（无头模式、窗口大小、远程调试地址）
    ///
    /// # 返回值
    ///
    /// * `Ok(ChromiumDriver)` - 可用的驱动
    /// * `Err(EngineError)` - 浏览器启动或连接失败
    pub async fn launch(settings: &UsabilitySettings) -> Result<Self, EngineError> {
        let request_timeout = Duration::from_secs(settings.request_timeout_secs);

        let (browser, mut handler) = if let Some(url) = &settings.remote_debugging_url {
            info!("Connecting to remote Chrome instance at: {}", url);
            Browser::connect(url.as_str()).await.map_err(|e| {
                EngineError::BrowserUnavailable(format!(
                    "Failed to connect to remote Chrome: {}",
                    e
                ))
            })?
        } else {
            let mut builder = BrowserConfig::builder()
                .no_sandbox()
                .request_timeout(request_timeout)
                .window_size(settings.window_width, settings.window_height)
                .arg("--disable-gpu")
                .arg("--disable-dev-shm-usage");
            if !settings.headless {
                builder = builder.with_head();
            }
            let config = builder.build().map_err(EngineError::BrowserUnavailable)?;
            Browser::launch(config)
                .await
                .map_err(|e| EngineError::BrowserUnavailable(e.to_string()))?
        };

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::BrowserUnavailable(e.to_string()))?;

        Ok(Self {
            browser: Mutex::new(browser),
            page,
            handler,
            navigation_timeout: request_timeout,
        })
    }

    async fn find_all(&self, locator: &ElementLocator) -> Result<Vec<Element>, EngineError> {
        let result = match (locator.to_css(), locator.to_xpath()) {
            (Some(css), _) => self.page.find_elements(css).await,
            (None, Some(xpath)) => self.page.find_xpaths(xpath).await,
            (None, None) => return Err(EngineError::InvalidLocator(locator.to_string())),
        };
        match result {
            Ok(elements) => Ok(elements),
            Err(e) if is_no_node(&e) => {
                debug!(%locator, error = %e, "element lookup returned no nodes");
                Ok(Vec::new())
            }
            Err(e) => Err(EngineError::Other(format!(
                "Element lookup for {} failed: {}",
                locator, e
            ))),
        }
    }

    async fn find_one(&self, locator: &ElementLocator) -> Result<Element, EngineError> {
        self.find_all(locator)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::ElementNotFound(locator.to_string()))
    }
}

#[async_trait]
impl ElementFinder for ChromiumDriver {
    async fn count_elements(&self, locator: &ElementLocator) -> Result<usize, EngineError> {
        Ok(self.find_all(locator).await?.len())
    }
}

#[async_trait]
impl BrowserDriver for ChromiumDriver {
    async fn navigate(&self, url: &str) -> Result<(), EngineError> {
        // goto waits for the load event
        tokio::time::timeout(self.navigation_timeout, self.page.goto(url))
            .await
            .map_err(|_| EngineError::Timeout)?
            .map_err(|e| EngineError::NavigationFailed(format!("{}: {}", url, e)))?;
        Ok(())
    }

    async fn type_into(&self, locator: &ElementLocator, text: &str) -> Result<(), EngineError> {
        let element = self.find_one(locator).await?;
        element
            .click()
            .await
            .map_err(|e| EngineError::Other(format!("Focus failed: {}", e)))?;
        element
            .type_str(text)
            .await
            .map_err(|e| EngineError::Other(format!("Input failed: {}", e)))?;
        Ok(())
    }

    async fn click(&self, locator: &ElementLocator) -> Result<(), EngineError> {
        let element = self.find_one(locator).await?;
        element
            .click()
            .await
            .map_err(|e| EngineError::Other(format!("Click failed: {}", e)))?;
        tokio::time::timeout(self.navigation_timeout, self.page.wait_for_navigation())
            .await
            .map_err(|_| EngineError::Timeout)?
            .map_err(|e| EngineError::NavigationFailed(e.to_string()))?;
        Ok(())
    }

    async fn page_source(&self) -> Result<String, EngineError> {
        self.page
            .content()
            .await
            .map_err(|e| EngineError::Other(e.to_string()))
    }

    async fn title(&self) -> Result<String, EngineError> {
        Ok(self
            .page
            .get_title()
            .await
            .map_err(|e| EngineError::Other(e.to_string()))?
            .unwrap_or_default())
    }

    async fn current_url(&self) -> Result<String, EngineError> {
        Ok(self
            .page
            .url()
            .await
            .map_err(|e| EngineError::Other(e.to_string()))?
            .unwrap_or_default())
    }

    async fn reset_session(&self) -> Result<(), EngineError> {
        self.browser
            .lock()
            .await
            .clear_cookies()
            .await
            .map_err(|e| EngineError::Other(format!("Failed to clear cookies: {}", e)))?;
        self.navigate("about:blank").await
    }

    async fn close(&self) -> Result<(), EngineError> {
        let mut browser = self.browser.lock().await;
        let closed = browser
            .close()
            .await
            .map(|_| ())
            .map_err(|e| EngineError::Other(format!("Failed to close browser: {}", e)));
        if closed.is_ok() {
            let _ = browser.wait().await;
        }
        self.handler.abort();
        closed
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}
