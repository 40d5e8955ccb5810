// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::flow::{FlowStep, StepAction, TemplateVars};
use crate::domain::models::token::AntiForgeryToken;
use crate::domain::services::flow_sequencer::{FlowActor, Outcome};
use crate::domain::services::keyword_engine::{find_expected_elements, Corpus};
use crate::domain::services::token_extractor::extract_token;
use crate::engines::static_document::StaticDocument;
use crate::engines::traits::{HttpTransport, PageResponse, TransportRequest};
use crate::utils::errors::HarnessError;
use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

/// 会话载体
///
/// 一个模拟用户的HTTP会话。凭据（cookie）保存在传输实例内部，由传输层在
/// 收到服务器下发的凭据时更新，步骤逻辑无法直接写入。
/// 每个流程新建一个载体，流程结束即丢弃
pub struct SessionCarrier {
    id: Uuid,
    transport: Box<dyn HttpTransport>,
    base_url: String,
    token_field: String,
    require_rotating_tokens: bool,
    identity: Option<String>,
    fetch_seq: u64,
}

impl SessionCarrier {
    /// 创建新的会话载体
    ///
    /// # 参数
    ///
    /// * `transport` - 该载体独占的传输实例
    /// * `base_url` - 被测应用的基础URL
    /// * `token_field` - 防伪令牌字段名
    pub fn new(transport: Box<dyn HttpTransport>, base_url: &str, token_field: &str) -> Self {
        let id = Uuid::new_v4();
        debug!(carrier = %id, transport = transport.name(), "session carrier created");
        Self {
            id,
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            token_field: token_field.to_string(),
            require_rotating_tokens: false,
            identity: None,
            fetch_seq: 0,
        }
    }

    /// 要求两次抓取得到的令牌值也必须不同
    pub fn require_rotating_tokens(mut self, required: bool) -> Self {
        self.require_rotating_tokens = required;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// 把相对路径解析为完整URL；已是绝对URL时原样返回
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// GET 页面
    pub async fn get(&mut self, path: &str) -> Result<PageResponse, HarnessError> {
        self.fetch_seq += 1;
        let request = TransportRequest::get(self.resolve(path));
        Ok(self.transport.send(&request).await?)
    }

    /// 提交表单
    pub async fn submit(
        &mut self,
        path: &str,
        form: Vec<(String, String)>,
        allow_redirects: bool,
    ) -> Result<PageResponse, HarnessError> {
        let request = TransportRequest::post_form(self.resolve(path), form, allow_redirects);
        Ok(self.transport.send(&request).await?)
    }

    /// 抓取页面并提取新的防伪令牌
    ///
    /// 页面上没有令牌时返回 `Precondition` 错误，调用方不得继续提交
    pub async fn fetch_token(
        &mut self,
        path: &str,
    ) -> Result<(AntiForgeryToken, PageResponse), HarnessError> {
        let page = self.get(path).await?;
        let value = extract_token(&page.body, &self.token_field).ok_or_else(|| {
            HarnessError::Precondition(format!(
                "anti-forgery token '{}' absent on {}",
                self.token_field,
                self.resolve(path)
            ))
        })?;
        debug!(carrier = %self.id, url = %page.final_url, fetch_seq = self.fetch_seq, "token extracted");
        let token = AntiForgeryToken {
            value,
            source_url: page.final_url.clone(),
            fetch_seq: self.fetch_seq,
        };
        Ok((token, page))
    }

    async fn outcome(
        &self,
        step: &FlowStep,
        page: PageResponse,
        started: Instant,
    ) -> Result<Outcome, HarnessError> {
        let document = StaticDocument::new(page.body);
        let elements = find_expected_elements(&document, &step.expect.locators()).await?;
        Ok(Outcome {
            status: Some(page.status_code),
            final_url: Some(page.final_url),
            corpus: Corpus::from_html(document.source()),
            elements,
            elapsed_ms: started.elapsed().as_millis() as u64,
        })
    }
}

#[async_trait]
impl FlowActor for SessionCarrier {
    async fn perform(
        &mut self,
        step: &FlowStep,
        vars: &TemplateVars,
    ) -> Result<Outcome, HarnessError> {
        let started = Instant::now();
        match &step.action {
            StepAction::Fetch { path } => {
                let page = self.get(&vars.render(path)?).await?;
                self.outcome(step, page, started).await
            }
            StepAction::SubmitForm {
                form_path,
                target_path,
                method_override,
                fields,
                allow_redirects,
            } => {
                let form_path = vars.render(form_path)?;
                let target = match target_path {
                    Some(target) => vars.render(target)?,
                    None => form_path.clone(),
                };

                let (token, _) = self.fetch_token(&form_path).await?;
                let mut form = vec![(self.token_field.clone(), token.value)];
                if let Some(method) = method_override {
                    form.push(("_method".to_string(), method.clone()));
                }
                form.extend(fields.render(vars)?);

                let page = self.submit(&target, form, *allow_redirects).await?;
                info!(
                    carrier = %self.id,
                    step = %step.name,
                    status = page.status_code,
                    final_url = %page.final_url,
                    "form submitted"
                );
                self.outcome(step, page, started).await
            }
            StepAction::TokenFreshness { form_path } => {
                let form_path = vars.render(form_path)?;
                let (first, _) = self.fetch_token(&form_path).await?;
                let (second, page) = self.fetch_token(&form_path).await?;

                if !second.is_fresher_than(&first) {
                    return Err(HarnessError::Assertion(format!(
                        "token from fetch {} is not fresher than fetch {}",
                        second.fetch_seq, first.fetch_seq
                    )));
                }
                if self.require_rotating_tokens && first.value == second.value {
                    return Err(HarnessError::Assertion(format!(
                        "token value reused across fetches of {}",
                        second.source_url
                    )));
                }
                self.outcome(step, page, started).await
            }
            StepAction::Navigate { .. } | StepAction::FillAndSubmit { .. } => {
                Err(HarnessError::Precondition(format!(
                    "step '{}' requires a browser session",
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
                "carrier {} already authenticated as '{}'",
                self.id, current
            ))),
            _ => {
                info!(carrier = %self.id, %identity, "session authenticated");
                self.identity = Some(identity);
                Ok(())
            }
        }
    }

    fn clear_identity(&mut self) {
        if let Some(identity) = self.identity.take() {
            info!(carrier = %self.id, %identity, "session ended");
        }
    }
}
