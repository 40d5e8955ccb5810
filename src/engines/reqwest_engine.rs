// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::config::settings::TransportSettings;
use crate::engines::traits::{
    EngineError, HttpMethod, HttpTransport, PageResponse, TransportRequest,
};
use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::redirect::Policy;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::debug;

/// 基于reqwest的HTTP传输
///
/// 每个实例拥有自己的 cookie 存储，两个客户端（跟随重定向与不跟随重定向）
/// 共享同一个存储，所以无论是否跟随重定向，服务器下发的会话都会被保留
pub struct ReqwestTransport {
    jar: Arc<Jar>,
    follow: reqwest::Client,
    manual: reqwest::Client,
}

impl ReqwestTransport {
    /// 创建新的传输实例
    ///
    /// # 参数
    ///
    /// * `settings` - 传输配置（超时、User-Agent）
    ///
    /// # 返回值
    ///
    /// * `Ok(ReqwestTransport)` - 拥有全新 cookie 存储的传输
    /// * `Err(EngineError)` - 客户端构建失败
    pub fn new(settings: &TransportSettings) -> Result<Self, EngineError> {
        let jar = Arc::new(Jar::default());
        let follow = Self::builder(settings, jar.clone())
            .redirect(Policy::limited(10))
            .build()?;
        let manual = Self::builder(settings, jar.clone())
            .redirect(Policy::none())
            .build()?;

        Ok(Self {
            jar,
            follow,
            manual,
        })
    }

    fn builder(settings: &TransportSettings, jar: Arc<Jar>) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .user_agent(settings.user_agent.clone())
            .timeout(Duration::from_secs(settings.timeout_secs))
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .cookie_provider(jar)
    }

    /// 返回该传输对给定URL会发送的 Cookie 头
    pub fn cookie_header(&self, url: &str) -> Option<String> {
        let url = url::Url::parse(url).ok()?;
        self.jar
            .cookies(&url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: &TransportRequest) -> Result<PageResponse, EngineError> {
        let client = if request.allow_redirects {
            &self.follow
        } else {
            &self.manual
        };

        let builder = match request.method {
            HttpMethod::Get => client.get(&request.url),
            HttpMethod::Post => client.post(&request.url).form(&request.form),
        };

        let start = Instant::now();
        let response = builder.send().await?;
        let status_code = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().await?;
        let response_time_ms = start.elapsed().as_millis() as u64;

        debug!(
            method = %request.method,
            url = %request.url,
            status = status_code,
            elapsed_ms = response_time_ms,
            "transport call completed"
        );

        Ok(PageResponse {
            status_code,
            body,
            final_url,
            response_time_ms,
        })
    }

    fn name(&self) -> &'static str {
        "reqwest"
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
