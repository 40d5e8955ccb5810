// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::expectation::BudgetSeverity;
use crate::domain::models::flow::{FailurePolicy, Flow, FlowStep, Precondition, TemplateVars};
use crate::domain::models::verdict::{FlowVerdict, StepState, StepVerdict};
use crate::domain::services::keyword_engine::{
    evaluate_set, Corpus, Diagnostic, ElementReport, Evaluation, Observation,
};
use crate::utils::errors::{FailureKind, HarnessError};
use async_trait::async_trait;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

/// 步骤执行后的可观察结果
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    /// HTTP状态码；浏览器层没有状态码
    pub status: Option<u16>,
    pub final_url: Option<String>,
    pub corpus: Corpus,
    pub elements: ElementReport,
    /// 动作本身的耗时（浏览器导航时为探测器计时）
    pub elapsed_ms: u64,
}

/// 流程参与者
///
/// 代表一个模拟用户：HTTP 层是会话载体，可用性层是浏览器会话。
/// 身份只在步骤通过后由参与者自己绑定或解除
#[async_trait]
pub trait FlowActor: Send {
    /// 执行步骤动作
    async fn perform(
        &mut self,
        step: &FlowStep,
        vars: &TemplateVars,
    ) -> Result<Outcome, HarnessError>;

    /// 当前绑定的身份
    fn identity(&self) -> Option<&str>;

    /// 绑定身份
    fn bind_identity(&mut self, identity: String) -> Result<(), HarnessError>;

    /// 解除身份绑定
    fn clear_identity(&mut self);
}

/// 流程步骤编排器
///
/// 按顺序执行一个流程的所有步骤。单个流程内失败即停（或按策略继续），
/// 不同流程之间互不影响
pub struct FlowSequencer;

impl FlowSequencer {
    /// 执行一个流程
    ///
    /// # 参数
    ///
    /// * `flow` - 流程定义
    /// * `actor` - 该流程专属的参与者
    ///
    /// # 返回值
    ///
    /// 流程判定；错误都被记录到步骤判定中，不会向外抛出
    pub async fn run<A>(flow: &Flow, actor: &mut A) -> FlowVerdict
    where
        A: FlowActor + ?Sized,
    {
        info!(flow = %flow.name, steps = flow.steps.len(), "flow started");

        let mut verdicts: Vec<StepVerdict> = Vec::with_capacity(flow.steps.len());
        let mut blocked_by: Option<String> = None;

        for (idx, step) in flow.steps.iter().enumerate() {
            let verdict = if let Some(blocker) = &blocked_by {
                let reason = format!("skipped: step '{}' did not pass", blocker);
                Self::skip(flow, step, FailureKind::Precondition, reason)
            } else if let Err(reason) = Self::check_preconditions(flow, step, idx, &verdicts, actor)
            {
                Self::skip(flow, step, FailureKind::Precondition, reason)
            } else {
                Self::execute(flow, step, actor).await
            };

            if !verdict.passed() && flow.policy == FailurePolicy::FailFast && blocked_by.is_none()
            {
                blocked_by = Some(step.name.clone());
            }
            verdicts.push(verdict);
        }

        let verdict = FlowVerdict::from_steps(&flow.name, verdicts);
        info!(flow = %flow.name, state = %verdict.state, "flow finished");
        verdict
    }

    /// 依次执行多个互相独立的流程，每个流程使用新建的参与者
    ///
    /// 参与者创建失败时，该流程的第一步记为传输失败，其余步骤跳过
    pub async fn run_independent<A, F>(flows: &[Flow], mut make_actor: F) -> Vec<FlowVerdict>
    where
        A: FlowActor,
        F: FnMut(&Flow) -> Result<A, HarnessError>,
    {
        let mut out = Vec::with_capacity(flows.len());
        for flow in flows {
            match make_actor(flow) {
                Ok(mut actor) => out.push(Self::run(flow, &mut actor).await),
                Err(err) => {
                    error!(flow = %flow.name, error = %err, "could not create actor");
                    out.push(Self::unrunnable(flow, &err));
                }
            }
        }
        out
    }

    /// 参与者无法创建时的流程判定：第一步失败，其余步骤跳过
    pub fn unrunnable(flow: &Flow, err: &HarnessError) -> FlowVerdict {
        let steps = flow
            .steps
            .iter()
            .enumerate()
            .map(|(idx, step)| {
                if idx == 0 {
                    StepVerdict {
                        step_name: step.name.clone(),
                        state: StepState::Failed,
                        elapsed_ms: 0,
                        status_code: None,
                        matched_keywords: Vec::new(),
                        evaluations: Vec::new(),
                        failure_kind: Some(err.kind()),
                        failure_reason: Some(err.to_string()),
                    }
                } else {
                    StepVerdict::skipped(
                        &step.name,
                        FailureKind::Precondition,
                        format!("skipped: step '{}' did not pass", flow.steps[0].name),
                    )
                }
            })
            .collect();
        FlowVerdict::from_steps(&flow.name, steps)
    }

    fn skip(flow: &Flow, step: &FlowStep, kind: FailureKind, reason: String) -> StepVerdict {
        debug_assert!(StepState::Pending.can_transition_to(StepState::Skipped));
        info!(flow = %flow.name, step = %step.name, %reason, "step SKIPPED");
        StepVerdict::skipped(&step.name, kind, reason)
    }

    fn check_preconditions<A>(
        flow: &Flow,
        step: &FlowStep,
        idx: usize,
        prior: &[StepVerdict],
        actor: &A,
    ) -> Result<(), String>
    where
        A: FlowActor + ?Sized,
    {
        for precondition in &step.preconditions {
            match precondition {
                Precondition::PriorStepPassed => {
                    if let Some(previous) = idx.checked_sub(1).and_then(|i| prior.get(i)) {
                        if !previous.passed() {
                            return Err(format!(
                                "requires prior step '{}' PASSED, was {}",
                                previous.step_name, previous.state
                            ));
                        }
                    }
                }
                Precondition::StepPassed(name) => match prior.iter().find(|v| &v.step_name == name)
                {
                    Some(v) if v.passed() => {}
                    Some(v) => {
                        return Err(format!(
                            "requires step '{}' PASSED, was {}",
                            name, v.state
                        ))
                    }
                    None => return Err(format!("requires step '{}' PASSED, not run yet", name)),
                },
                Precondition::Authenticated => {
                    if actor.identity().is_none() {
                        return Err("requires an authenticated session".to_string());
                    }
                }
                Precondition::Anonymous => {
                    if let Some(identity) = actor.identity() {
                        return Err(format!(
                            "requires an anonymous session, authenticated as '{}'",
                            identity
                        ));
                    }
                }
            }
        }

        if let (Some(template), Some(current)) = (&step.authenticates_as, actor.identity()) {
            let wanted = flow.vars.render(template).map_err(|e| e.to_string())?;
            if wanted != current {
                return Err(format!(
                    "session already authenticated as '{}', cannot switch to '{}' without logging out",
                    current, wanted
                ));
            }
        }
        Ok(())
    }

    async fn execute<A>(flow: &Flow, step: &FlowStep, actor: &mut A) -> StepVerdict
    where
        A: FlowActor + ?Sized,
    {
        debug_assert!(StepState::Pending.can_transition_to(StepState::Running));
        info!(flow = %flow.name, step = %step.name, "step RUNNING");

        let started = Instant::now();
        let result = actor.perform(step, &flow.vars).await;
        let wall_ms = started.elapsed().as_millis() as u64;

        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                let state = match err {
                    HarnessError::Precondition(_) => StepState::Skipped,
                    _ => StepState::Failed,
                };
                if state == StepState::Failed {
                    error!(flow = %flow.name, step = %step.name, error = %err, "step FAILED");
                } else {
                    info!(flow = %flow.name, step = %step.name, reason = %err, "step SKIPPED");
                }
                return StepVerdict {
                    step_name: step.name.clone(),
                    state,
                    elapsed_ms: wall_ms,
                    status_code: None,
                    matched_keywords: Vec::new(),
                    evaluations: Vec::new(),
                    failure_kind: Some(err.kind()),
                    failure_reason: Some(err.to_string()),
                };
            }
        };

        let evaluations = evaluate_set(
            &step.expect,
            &Observation {
                status: outcome.status,
                corpus: &outcome.corpus,
                elements: &outcome.elements,
            },
        );
        let elapsed_ms = if outcome.elapsed_ms > 0 {
            outcome.elapsed_ms
        } else {
            wall_ms
        };

        let mut failures: Vec<String> = evaluations
            .iter()
            .filter(|e| !e.passed)
            .map(Evaluation::describe)
            .collect();
        let mut kind = if evaluations
            .iter()
            .any(|e| !e.passed && e.diagnostic == Diagnostic::EmptyCorpus)
        {
            FailureKind::EmptyCorpus
        } else {
            FailureKind::Assertion
        };

        if let Some(budget) = &step.budget {
            let check = budget.check(elapsed_ms);
            if !check.within {
                match budget.severity {
                    BudgetSeverity::Fail => failures.push(format!(
                        "{} ms exceeds timing budget of {} ms by {} ms",
                        elapsed_ms, budget.max_ms, check.exceeded_by_ms
                    )),
                    BudgetSeverity::Warn => warn!(
                        flow = %flow.name,
                        step = %step.name,
                        elapsed_ms,
                        budget_ms = budget.max_ms,
                        exceeded_by_ms = check.exceeded_by_ms,
                        "step exceeds timing budget"
                    ),
                }
            }
        }

        if failures.is_empty() {
            if let Some(template) = &step.authenticates_as {
                let bound = flow
                    .vars
                    .render(template)
                    .and_then(|identity| actor.bind_identity(identity));
                if let Err(err) = bound {
                    kind = err.kind();
                    failures.push(err.to_string());
                }
            }
            if step.ends_session {
                actor.clear_identity();
            }
        }

        let mut matched_keywords: Vec<String> = Vec::new();
        for evaluation in &evaluations {
            if evaluation.diagnostic == Diagnostic::Satisfied
                || evaluation.diagnostic == Diagnostic::KeywordMismatch
            {
                for m in &evaluation.matched {
                    if !matched_keywords.contains(m) {
                        matched_keywords.push(m.clone());
                    }
                }
            }
        }

        let (state, failure_kind, failure_reason) = if failures.is_empty() {
            info!(flow = %flow.name, step = %step.name, elapsed_ms, "step PASSED");
            (StepState::Passed, None, None)
        } else {
            let reason = failures.join("; ");
            warn!(flow = %flow.name, step = %step.name, %reason, "step FAILED");
            (StepState::Failed, Some(kind), Some(reason))
        };
        debug!(flow = %flow.name, step = %step.name, ?matched_keywords, "step evaluated");

        StepVerdict {
            step_name: step.name.clone(),
            state,
            elapsed_ms,
            status_code: outcome.status,
            matched_keywords,
            evaluations,
            failure_kind,
            failure_reason,
        }
    }
}
