// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::keyword_engine::Evaluation;
use crate::utils::errors::FailureKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 步骤状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepState {
    Pending,
    Running,
    Passed,
    Failed,
    Skipped,
}

impl StepState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepState::Passed | StepState::Failed | StepState::Skipped
        )
    }

    /// 状态机允许的迁移：PENDING→RUNNING/SKIPPED，RUNNING→PASSED/FAILED/SKIPPED
    pub fn can_transition_to(&self, next: StepState) -> bool {
        matches!(
            (self, next),
            (StepState::Pending, StepState::Running)
                | (StepState::Pending, StepState::Skipped)
                | (StepState::Running, StepState::Passed)
                | (StepState::Running, StepState::Failed)
                | (StepState::Running, StepState::Skipped)
        )
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepState::Pending => "PENDING",
            StepState::Running => "RUNNING",
            StepState::Passed => "PASSED",
            StepState::Failed => "FAILED",
            StepState::Skipped => "SKIPPED",
        };
        write!(f, "{}", s)
    }
}

/// 步骤判定记录
#[derive(Debug, Clone, Serialize)]
pub struct StepVerdict {
    pub step_name: String,
    pub state: StepState,
    pub elapsed_ms: u64,
    pub status_code: Option<u16>,
    pub matched_keywords: Vec<String>,
    pub evaluations: Vec<Evaluation>,
    pub failure_kind: Option<FailureKind>,
    pub failure_reason: Option<String>,
}

impl StepVerdict {
    /// 未执行即跳过的步骤
    pub fn skipped(step_name: &str, kind: FailureKind, reason: String) -> Self {
        Self {
            step_name: step_name.to_string(),
            state: StepState::Skipped,
            elapsed_ms: 0,
            status_code: None,
            matched_keywords: Vec::new(),
            evaluations: Vec::new(),
            failure_kind: Some(kind),
            failure_reason: Some(reason),
        }
    }

    pub fn passed(&self) -> bool {
        self.state == StepState::Passed
    }
}

/// 流程判定
#[derive(Debug, Clone, Serialize)]
pub struct FlowVerdict {
    pub flow_name: String,
    pub state: StepState,
    pub steps: Vec<StepVerdict>,
}

impl FlowVerdict {
    /// 汇总：所有步骤通过时流程通过
    pub fn from_steps(flow_name: &str, steps: Vec<StepVerdict>) -> Self {
        let state = if steps.iter().all(StepVerdict::passed) {
            StepState::Passed
        } else {
            StepState::Failed
        };
        Self {
            flow_name: flow_name.to_string(),
            state,
            steps,
        }
    }

    pub fn passed(&self) -> bool {
        self.state == StepState::Passed
    }

    pub fn step(&self, name: &str) -> Option<&StepVerdict> {
        self.steps.iter().find(|s| s.step_name == name)
    }

    /// 第一个未通过的步骤
    pub fn first_failure(&self) -> Option<&StepVerdict> {
        self.steps.iter().find(|s| !s.passed())
    }
}

/// 测试层级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Unit,
    Integration,
    Usability,
}

impl Tier {
    pub fn all() -> Vec<Tier> {
        vec![Tier::Unit, Tier::Integration, Tier::Usability]
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Tier::Unit => "unit",
            Tier::Integration => "integration",
            Tier::Usability => "usability",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unit" => Ok(Tier::Unit),
            "integration" => Ok(Tier::Integration),
            "usability" => Ok(Tier::Usability),
            other => Err(format!("unknown tier '{}'", other)),
        }
    }
}

/// 单个层级的运行报告
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub tier: Tier,
    pub started_at: DateTime<Utc>,
    pub passed: bool,
    pub flows: Vec<FlowVerdict>,
}

impl RunReport {
    pub fn new(tier: Tier, started_at: DateTime<Utc>, flows: Vec<FlowVerdict>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            tier,
            started_at,
            passed: flows.iter().all(FlowVerdict::passed),
            flows,
        }
    }
}
