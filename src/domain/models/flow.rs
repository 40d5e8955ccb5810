// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::expectation::{ExpectationSet, TimingBudget};
use crate::engines::traits::ElementLocator;
use crate::utils::errors::HarnessError;
use std::collections::BTreeMap;

/// 模板变量
///
/// 在流程构建时确定（例如随机生成的邮箱），执行时替换 `{name}` 占位符
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateVars(BTreeMap<String, String>);

impl TemplateVars {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// 替换模板中的占位符
    ///
    /// # 返回值
    ///
    /// * `Ok(String)` - 替换后的文本
    /// * `Err(HarnessError::Precondition)` - 存在未定义的占位符
    pub fn render(&self, template: &str) -> Result<String, HarnessError> {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find('{') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            let end = after.find('}').ok_or_else(|| {
                HarnessError::Precondition(format!("unterminated placeholder in '{}'", template))
            })?;
            let key = &after[..end];
            let value = self.get(key).ok_or_else(|| {
                HarnessError::Precondition(format!("unresolved placeholder {{{}}}", key))
            })?;
            out.push_str(value);
            rest = &after[end + 1..];
        }
        out.push_str(rest);
        Ok(out)
    }
}

/// 表单负载模板
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormTemplate {
    fields: Vec<(String, String)>,
}

impl FormTemplate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: &str, value: &str) -> Self {
        self.fields.push((name.to_string(), value.to_string()));
        self
    }

    /// 用变量渲染所有字段值
    pub fn render(&self, vars: &TemplateVars) -> Result<Vec<(String, String)>, HarnessError> {
        self.fields
            .iter()
            .map(|(name, value)| Ok((name.clone(), vars.render(value)?)))
            .collect()
    }
}

/// 步骤动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    /// GET 页面
    Fetch { path: String },
    /// 抓取表单页面、提取新令牌并提交
    SubmitForm {
        form_path: String,
        /// 提交目标，缺省为表单页面本身
        target_path: Option<String>,
        /// 表单方法覆盖（例如 `PUT`）
        method_override: Option<String>,
        fields: FormTemplate,
        allow_redirects: bool,
    },
    /// 连续两次抓取同一表单并比较令牌
    TokenFreshness { form_path: String },
    /// 浏览器导航（计时）
    Navigate { path: String },
    /// 浏览器中填写字段并点击提交
    FillAndSubmit {
        path: String,
        inputs: Vec<(ElementLocator, String)>,
        submit: ElementLocator,
    },
}

impl StepAction {
    pub fn fetch(path: &str) -> Self {
        StepAction::Fetch {
            path: path.to_string(),
        }
    }

    pub fn submit(form_path: &str, fields: FormTemplate) -> Self {
        StepAction::SubmitForm {
            form_path: form_path.to_string(),
            target_path: None,
            method_override: None,
            fields,
            allow_redirects: true,
        }
    }

    pub fn navigate(path: &str) -> Self {
        StepAction::Navigate {
            path: path.to_string(),
        }
    }
}

/// 前置条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Precondition {
    /// 紧邻的上一步已通过
    PriorStepPassed,
    /// 指定步骤已通过
    StepPassed(String),
    /// 会话已绑定身份
    Authenticated,
    /// 会话未绑定身份
    Anonymous,
}

/// 失败传播策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// 第一个未通过的步骤使其余步骤全部跳过
    FailFast,
    /// 只按各步骤自己声明的前置条件决定是否执行
    Continue,
}

/// 流程步骤
#[derive(Debug, Clone)]
pub struct FlowStep {
    pub name: String,
    pub preconditions: Vec<Precondition>,
    pub action: StepAction,
    pub expect: ExpectationSet,
    pub budget: Option<TimingBudget>,
    /// 通过后绑定的身份（模板）
    pub authenticates_as: Option<String>,
    /// 通过后解除身份绑定
    pub ends_session: bool,
}

impl FlowStep {
    pub fn new(name: &str, action: StepAction) -> Self {
        Self {
            name: name.to_string(),
            preconditions: Vec::new(),
            action,
            expect: ExpectationSet::new(),
            budget: None,
            authenticates_as: None,
            ends_session: false,
        }
    }

    pub fn requires(mut self, precondition: Precondition) -> Self {
        self.preconditions.push(precondition);
        self
    }

    pub fn expect(mut self, expect: ExpectationSet) -> Self {
        self.expect = expect;
        self
    }

    pub fn budget(mut self, budget: TimingBudget) -> Self {
        self.budget = Some(budget);
        self
    }

    pub fn authenticates_as(mut self, identity: &str) -> Self {
        self.authenticates_as = Some(identity.to_string());
        self
    }

    pub fn ends_session(mut self) -> Self {
        self.ends_session = true;
        self
    }
}

/// 流程：一组有依赖关系的有序步骤
#[derive(Debug, Clone)]
pub struct Flow {
    pub name: String,
    pub policy: FailurePolicy,
    pub vars: TemplateVars,
    pub steps: Vec<FlowStep>,
}

impl Flow {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            policy: FailurePolicy::FailFast,
            vars: TemplateVars::new(),
            steps: Vec::new(),
        }
    }

    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn var(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key, value);
        self
    }

    pub fn step(mut self, step: FlowStep) -> Self {
        self.steps.push(step);
        self
    }
}
