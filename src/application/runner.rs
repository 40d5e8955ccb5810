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

use crate::application::scenarios::flows_for;
use crate::config::settings::Settings;
use crate::domain::models::flow::Flow;
use crate::domain::models::verdict::{FlowVerdict, RunReport, Tier};
use crate::domain::services::browser_session::BrowserSession;
use crate::domain::services::flow_sequencer::FlowSequencer;
use crate::domain::services::session_carrier::SessionCarrier;
use crate::engines::chromium_engine::ChromiumDriver;
use crate::engines::reqwest_engine::ReqwestTransport;
use crate::engines::traits::BrowserDriver;
use crate::utils::errors::HarnessError;
use chrono::Utc;
use tracing::{error, info, warn};

/// 层级运行器
///
/// 为每个 HTTP 流程创建拥有独立 cookie 存储的新会话载体；
/// 可用性层在一次运行中只启动一个浏览器，每个流程使用清空过的新会话，结束后关闭
pub struct TierRunner {
    settings: Settings,
}

impl TierRunner {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// 依次运行多个层级
    pub async fn run_all(&self, tiers: &[Tier]) -> Vec<RunReport> {
        let mut reports = Vec::with_capacity(tiers.len());
        for tier in tiers {
            reports.push(self.run(*tier).await);
        }
        reports
    }

    /// 运行单个层级
    ///
    /// # 参数
    ///
    /// * `tier` - 要运行的层级
    ///
    /// # 返回值
    ///
    /// 该层级的运行报告；单个流程的错误只影响该流程的判定
    pub async fn run(&self, tier: Tier) -> RunReport {
        let started_at = Utc::now();
        let flows = flows_for(tier, &self.settings);
        info!(%tier, flows = flows.len(), "tier started");

        let verdicts = match tier {
            Tier::Unit | Tier::Integration => self.run_http(&flows).await,
            Tier::Usability => self.run_browser(&flows).await,
        };

        let report = RunReport::new(tier, started_at, verdicts);
        let failed = report.flows.iter().filter(|f| !f.passed()).count();
        if report.passed {
            info!(%tier, run_id = %report.run_id, "tier passed");
        } else {
            warn!(%tier, run_id = %report.run_id, failed, "tier failed");
        }
        report
    }

    /// 用新的 HTTP 会话载体运行流程
    pub async fn run_http(&self, flows: &[Flow]) -> Vec<FlowVerdict> {
        FlowSequencer::run_independent(flows, |_| self.http_carrier()).await
    }

    /// 创建新的会话载体
    pub fn http_carrier(&self) -> Result<SessionCarrier, HarnessError> {
        let transport = ReqwestTransport::new(&self.settings.transport)?;
        Ok(SessionCarrier::new(
            Box::new(transport),
            &self.settings.target.base_url,
            &self.settings.target.token_field,
        )
        .require_rotating_tokens(self.settings.harness.require_rotating_tokens))
    }

    async fn run_browser(&self, flows: &[Flow]) -> Vec<FlowVerdict> {
        match ChromiumDriver::launch(&self.settings.usability).await {
            Ok(driver) => self.run_with_driver(flows, Box::new(driver)).await,
            Err(e) => {
                error!(error = %e, "browser unavailable");
                let err = HarnessError::from(e);
                flows
                    .iter()
                    .map(|flow| FlowSequencer::unrunnable(flow, &err))
                    .collect()
            }
        }
    }

    /// 在同一个浏览器中依次运行流程，结束后关闭浏览器
    ///
    /// 每个流程开始前清除浏览器 cookie 并创建新的浏览器会话，
    /// 上一个流程的登录状态和身份不会带入下一个流程
    pub async fn run_with_driver(
        &self,
        flows: &[Flow],
        driver: Box<dyn BrowserDriver>,
    ) -> Vec<FlowVerdict> {
        let mut driver = driver;
        let mut verdicts = Vec::with_capacity(flows.len());
        for flow in flows {
            if let Err(e) = driver.reset_session().await {
                error!(flow = %flow.name, error = %e, "failed to reset browser session");
                verdicts.push(FlowSequencer::unrunnable(flow, &HarnessError::from(e)));
                continue;
            }
            let mut session = BrowserSession::new(driver, &self.settings.target.base_url);
            verdicts.push(FlowSequencer::run(flow, &mut session).await);
            driver = session.into_driver();
        }

        if let Err(e) = driver.close().await {
            warn!(driver = driver.name(), error = %e, "failed to close browser");
        }
        verdicts
    }
}
