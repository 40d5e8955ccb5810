// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::flow::{FlowStep, StepAction, TemplateVars};
use crate::domain::services::flow_sequencer::{FlowActor, Outcome};
use crate::domain::services::keyword_engine::{find_expected_elements, Corpus};
use crate::domain::services::usability_probe::UsabilityProbe;
use crate::engines::traits::BrowserDriver;
use crate::utils::errors::HarnessError;
use async_trait::async_trait;
use tokio::time::Instant;
use tracing::info;

/// 浏览器会话
///
/// 可用性层的流程参与者。导航动作由可用性探测器计时，
/// 元素查询走渲染后的 DOM 而不是静态HTML
pub struct BrowserSession {
    driver: Box<dyn BrowserDriver>,
    base_url: String,
    identity: Option<String>,
}

impl BrowserSession {
    pub fn new(driver: Box<dyn BrowserDriver>, base_url: &str) -> Self {
        Self {
            driver,
            base_url: base_url.trim_end_matches('/').to_string(),
            identity: None,
        }
    }

    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// 取回驱动（用于运行结束时关闭浏览器）
    pub fn into_driver(self) -> Box<dyn BrowserDriver> {
        self.driver
    }

    async fn rendered_corpus(&self) -> Result<(Corpus, String), HarnessError> {
        let source = self.driver.page_source().await?;
        let title = self.driver.title().await?;
        let url = self.driver.current_url().await?;
        Ok((Corpus::from_rendered(&source, &title), url))
    }
}

#[async_trait]
impl FlowActor for BrowserSession {
    async fn perform(
        &mut self,
        step: &FlowStep,
        vars: &TemplateVars,
    ) -> Result<Outcome, HarnessError> {
        match &step.action {
            StepAction::Navigate { path } | StepAction::Fetch { path } => {
                let url = self.resolve(&vars.render(path)?);
                let report = UsabilityProbe::new(self.driver.as_ref())
                    .measure(&url, &step.expect.locators())
                    .await?;
                let (corpus, final_url) = self.rendered_corpus().await?;
                Ok(Outcome {
                    status: None,
                    final_url: Some(final_url),
                    corpus,
                    elements: report.elements,
                    elapsed_ms: report.elapsed_ms,
                })
            }
            StepAction::FillAndSubmit {
                path,
                inputs,
                submit,
            } => {
                let started = Instant::now();
                let url = self.resolve(&vars.render(path)?);
                self.driver.navigate(&url).await?;
                for (locator, template) in inputs {
                    let text = vars.render(template)?;
                    self.driver.type_into(locator, &text).await?;
                }
                self.driver.click(submit).await?;
                info!(step = %step.name, url = %url, "browser form submitted");

                let elements =
                    find_expected_elements(self.driver.as_ref(), &step.expect.locators()).await?;
                let (corpus, final_url) = self.rendered_corpus().await?;
                Ok(Outcome {
                    status: None,
                    final_url: Some(final_url),
                    corpus,
                    elements,
                    elapsed_ms: started.elapsed().as_millis() as u64,
                })
            }
            StepAction::SubmitForm { .. } | StepAction::TokenFreshness { .. } => {
                Err(HarnessError::Precondition(format!(
                    "step '{}' requires an HTTP session",
                    step.name
                )))
            }
        }
    }

    fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    fn bind_identity(&mut self, identity: String) -> Result<(), HarnessError> {
        match &self.identity {
            Some(current) if *current != identity => Err(HarnessError::Precondition(format!(
                "browser session already authenticated as '{}'",
                current
            ))),
            _ => {
                self.identity = Some(identity);
                Ok(())
            }
        }
    }

    fn clear_identity(&mut self) {
        self.identity = None;
    }
}
