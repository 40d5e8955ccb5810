// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::text_normalizer::normalize_all;
use crate::engines::traits::ElementLocator;
use serde::Serialize;

/// 量词
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", content = "n", rename_all = "snake_case")]
pub enum Quantifier {
    /// 至少一个关键字出现
    Any,
    /// 所有关键字都出现
    All,
    /// 不同的命中关键字数量 ≥ N
    AtLeast(usize),
}

impl Quantifier {
    /// 根据命中数量和总数判断是否满足
    pub fn holds(&self, matched: usize, total: usize) -> bool {
        match self {
            Quantifier::Any => matched >= 1,
            Quantifier::All => matched == total,
            Quantifier::AtLeast(n) => matched >= *n,
        }
    }
}

/// 断言作用的内容面
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    /// 原始响应文本或渲染后的页面源码
    Body,
    /// 可见文本 + 输入框占位符/值 + 按钮文字
    VisibleText,
    /// 按钮文字列表，任一元素包含关键字即命中
    Elements,
    /// 页面标题
    Title,
}

/// 关键字期望
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordExpectation {
    pub surface: Surface,
    /// 已规范化的关键字
    pub keywords: Vec<String>,
    pub quantifier: Quantifier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExpectationKind {
    /// 状态码属于允许集合
    Status { allowed: Vec<u16> },
    Keywords(KeywordExpectation),
    /// 结构元素（按定位器）存在
    Elements {
        locators: Vec<ElementLocator>,
        quantifier: Quantifier,
    },
}

/// 命名期望
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Expectation {
    pub name: String,
    pub kind: ExpectationKind,
}

/// 期望集合
///
/// 每个步骤执行后评估一次；关键字在构建时即被规范化，
/// 所以手写的带重音关键字与规范化后的文本可以直接比较
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExpectationSet {
    expectations: Vec<Expectation>,
}

impl ExpectationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// 状态码期望
    pub fn status(mut self, name: &str, allowed: impl IntoIterator<Item = u16>) -> Self {
        self.expectations.push(Expectation {
            name: name.to_string(),
            kind: ExpectationKind::Status {
                allowed: allowed.into_iter().collect(),
            },
        });
        self
    }

    /// 关键字期望
    pub fn keywords<I, S>(
        mut self,
        name: &str,
        surface: Surface,
        quantifier: Quantifier,
        keywords: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.expectations.push(Expectation {
            name: name.to_string(),
            kind: ExpectationKind::Keywords(KeywordExpectation {
                surface,
                keywords: normalize_all(keywords),
                quantifier,
            }),
        });
        self
    }

    pub fn any<I, S>(self, name: &str, surface: Surface, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords(name, surface, Quantifier::Any, keywords)
    }

    pub fn all<I, S>(self, name: &str, surface: Surface, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords(name, surface, Quantifier::All, keywords)
    }

    pub fn at_least<I, S>(self, name: &str, surface: Surface, n: usize, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords(name, surface, Quantifier::AtLeast(n), keywords)
    }

    /// 结构元素期望
    pub fn elements(
        mut self,
        name: &str,
        quantifier: Quantifier,
        locators: impl IntoIterator<Item = ElementLocator>,
    ) -> Self {
        self.expectations.push(Expectation {
            name: name.to_string(),
            kind: ExpectationKind::Elements {
                locators: locators.into_iter().collect(),
                quantifier,
            },
        });
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Expectation> {
        self.expectations.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.expectations.is_empty()
    }

    /// 所有元素期望用到的定位器（去重，保持声明顺序）
    pub fn locators(&self) -> Vec<ElementLocator> {
        let mut out: Vec<ElementLocator> = Vec::new();
        for expectation in &self.expectations {
            if let ExpectationKind::Elements { locators, .. } = &expectation.kind {
                for locator in locators {
                    if !out.contains(locator) {
                        out.push(locator.clone());
                    }
                }
            }
        }
        out
    }
}

/// 超出时间预算的处理方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetSeverity {
    /// 记为断言失败
    Fail,
    /// 只记录警告
    Warn,
}

/// 预算检查结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BudgetCheck {
    pub within: bool,
    pub exceeded_by_ms: u64,
}

/// 时间预算
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimingBudget {
    pub max_ms: u64,
    pub severity: BudgetSeverity,
}

impl TimingBudget {
    pub fn fail(max_ms: u64) -> Self {
        Self {
            max_ms,
            severity: BudgetSeverity::Fail,
        }
    }

    pub fn warn(max_ms: u64) -> Self {
        Self {
            max_ms,
            severity: BudgetSeverity::Warn,
        }
    }

    /// 耗时是否超出预算（等于预算不算超出）
    pub fn is_exceeded(&self, elapsed_ms: u64) -> bool {
        elapsed_ms > self.max_ms
    }

    /// 对照预算检查一次测得的耗时
    pub fn check(&self, elapsed_ms: u64) -> BudgetCheck {
        BudgetCheck {
            within: !self.is_exceeded(elapsed_ms),
            exceeded_by_ms: elapsed_ms.saturating_sub(self.max_ms),
        }
    }
}
