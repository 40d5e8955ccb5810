// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::expectation::{
    Expectation, ExpectationKind, ExpectationSet, KeywordExpectation, Quantifier, Surface,
};
use crate::domain::services::text_normalizer::normalize;
use crate::engines::traits::{ElementFinder, ElementLocator, EngineError};
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::warn;

/// 断言语料
///
/// 所有字段在构建时已规范化
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Corpus {
    body: String,
    visible_text: String,
    elements: Vec<String>,
    title: String,
}

impl Corpus {
    /// 从抓取到的HTML构建语料
    pub fn from_html(html: &str) -> Self {
        let document = Html::parse_document(html);

        let mut visible: Vec<String> = document
            .root_element()
            .text()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();

        if let Ok(inputs) = Selector::parse("input") {
            for input in document.select(&inputs) {
                for attr in ["placeholder", "value"] {
                    if let Some(v) = input.value().attr(attr) {
                        visible.push(v.to_string());
                    }
                }
            }
        }

        let mut elements = Vec::new();
        if let Ok(buttons) = Selector::parse("button") {
            for button in document.select(&buttons) {
                let label = button.text().collect::<Vec<_>>().join(" ");
                let label = label.split_whitespace().collect::<Vec<_>>().join(" ");
                if !label.is_empty() {
                    elements.push(normalize(&label));
                }
            }
        }
        if let Ok(submits) = Selector::parse("input[type=\"submit\"], input[type=\"button\"]") {
            for submit in document.select(&submits) {
                if let Some(v) = submit.value().attr("value") {
                    elements.push(normalize(v));
                }
            }
        }

        let title = Selector::parse("title")
            .ok()
            .and_then(|sel| document.select(&sel).next())
            .map(|t| t.text().collect::<String>())
            .unwrap_or_default();

        Self {
            body: normalize(html),
            visible_text: normalize(&visible.join(" ")),
            elements,
            title: normalize(title.trim()),
        }
    }

    /// 从浏览器渲染结果构建语料，标题以驱动报告的为准
    pub fn from_rendered(page_source: &str, title: &str) -> Self {
        let mut corpus = Self::from_html(page_source);
        corpus.title = normalize(title.trim());
        corpus
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// 响应正文是否为空
    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    fn surface(&self, surface: Surface) -> Vec<&str> {
        match surface {
            Surface::Body => vec![self.body.as_str()],
            Surface::VisibleText => vec![self.visible_text.as_str()],
            Surface::Elements => self.elements.iter().map(String::as_str).collect(),
            Surface::Title => vec![self.title.as_str()],
        }
    }
}

/// 诊断信息
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    Satisfied,
    /// 有内容但关键字不满足量词
    KeywordMismatch,
    /// 没有可供匹配的内容
    EmptyCorpus,
    StatusMismatch { actual: Option<u16> },
    ElementsMissing,
}

/// 单个期望的评估结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub name: String,
    pub passed: bool,
    pub expected: Vec<String>,
    pub matched: Vec<String>,
    pub diagnostic: Diagnostic,
}

impl Evaluation {
    /// 人类可读的失败描述
    pub fn describe(&self) -> String {
        match &self.diagnostic {
            Diagnostic::Satisfied => format!("{}: satisfied", self.name),
            Diagnostic::EmptyCorpus => format!("{}: empty corpus", self.name),
            Diagnostic::StatusMismatch { actual } => format!(
                "{}: status {} not in {:?}",
                self.name,
                actual.map_or_else(|| "none".to_string(), |s| s.to_string()),
                self.expected
            ),
            Diagnostic::KeywordMismatch | Diagnostic::ElementsMissing => format!(
                "{}: expected {:?}, matched {:?}",
                self.name, self.expected, self.matched
            ),
        }
    }
}

/// 结构元素查找结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ElementReport {
    pub found: Vec<ElementLocator>,
    pub missing: Vec<ElementLocator>,
}

impl ElementReport {
    pub fn contains(&self, locator: &ElementLocator) -> bool {
        self.found.contains(locator)
    }
}

/// 查找期望的结构元素
///
/// 对静态文档和渲染后的 DOM 使用同一套逻辑，区别只在 `finder` 的实现
pub async fn find_expected_elements<F>(
    finder: &F,
    locators: &[ElementLocator],
) -> Result<ElementReport, EngineError>
where
    F: ElementFinder + ?Sized,
{
    let mut report = ElementReport::default();
    for locator in locators {
        if finder.count_elements(locator).await? > 0 {
            report.found.push(locator.clone());
        } else {
            report.missing.push(locator.clone());
        }
    }
    Ok(report)
}

/// 评估关键字期望
///
/// # 参数
///
/// * `corpus` - 规范化后的语料
/// * `name` - 期望名称
/// * `expectation` - 关键字、量词和内容面
///
/// # 返回值
///
/// 评估结果；响应正文为空时总是失败并给出 `EmptyCorpus` 诊断。
/// 正文非空但所选内容面为空（例如页面没有按钮）属于关键字不匹配
pub fn evaluate(corpus: &Corpus, name: &str, expectation: &KeywordExpectation) -> Evaluation {
    if corpus.is_empty() {
        return Evaluation {
            name: name.to_string(),
            passed: false,
            expected: expectation.keywords.clone(),
            matched: Vec::new(),
            diagnostic: Diagnostic::EmptyCorpus,
        };
    }

    let texts = corpus.surface(expectation.surface);
    let mut matched: Vec<String> = Vec::new();
    for keyword in &expectation.keywords {
        let needle = normalize(keyword);
        if texts.iter().any(|t| t.contains(&needle)) && !matched.contains(keyword) {
            matched.push(keyword.clone());
        }
    }

    let passed = expectation
        .quantifier
        .holds(matched.len(), distinct_count(&expectation.keywords));
    Evaluation {
        name: name.to_string(),
        passed,
        expected: expectation.keywords.clone(),
        matched,
        diagnostic: if passed {
            Diagnostic::Satisfied
        } else {
            Diagnostic::KeywordMismatch
        },
    }
}

fn distinct_count(keywords: &[String]) -> usize {
    let mut seen: Vec<&String> = Vec::new();
    for k in keywords {
        if !seen.contains(&k) {
            seen.push(k);
        }
    }
    seen.len()
}

/// 评估状态码期望
pub fn evaluate_status(name: &str, allowed: &[u16], actual: Option<u16>) -> Evaluation {
    let passed = actual.is_some_and(|s| allowed.contains(&s));
    if let Some(status) = actual.filter(|s| passed && !(200..300).contains(s)) {
        warn!(expectation = name, status, "tolerated non-2xx status");
    }
    Evaluation {
        name: name.to_string(),
        passed,
        expected: allowed.iter().map(|s| s.to_string()).collect(),
        matched: actual.map(|s| vec![s.to_string()]).unwrap_or_default(),
        diagnostic: if passed {
            Diagnostic::Satisfied
        } else {
            Diagnostic::StatusMismatch { actual }
        },
    }
}

/// 评估结构元素期望
pub fn evaluate_elements(
    name: &str,
    locators: &[ElementLocator],
    quantifier: Quantifier,
    corpus: &Corpus,
    report: &ElementReport,
) -> Evaluation {
    let expected: Vec<String> = locators.iter().map(|l| l.to_string()).collect();
    if corpus.is_empty() {
        return Evaluation {
            name: name.to_string(),
            passed: false,
            expected,
            matched: Vec::new(),
            diagnostic: Diagnostic::EmptyCorpus,
        };
    }
    let matched: Vec<String> = locators
        .iter()
        .filter(|l| report.contains(l))
        .map(|l| l.to_string())
        .collect();
    let passed = quantifier.holds(matched.len(), locators.len());
    Evaluation {
        name: name.to_string(),
        passed,
        expected,
        matched,
        diagnostic: if passed {
            Diagnostic::Satisfied
        } else {
            Diagnostic::ElementsMissing
        },
    }
}

/// 一次步骤执行的可观察结果
pub struct Observation<'a> {
    pub status: Option<u16>,
    pub corpus: &'a Corpus,
    pub elements: &'a ElementReport,
}

/// 评估整个期望集合
pub fn evaluate_set(set: &ExpectationSet, observation: &Observation<'_>) -> Vec<Evaluation> {
    set.iter()
        .map(|expectation| evaluate_one(expectation, observation))
        .collect()
}

fn evaluate_one(expectation: &Expectation, observation: &Observation<'_>) -> Evaluation {
    match &expectation.kind {
        ExpectationKind::Status { allowed } => {
            evaluate_status(&expectation.name, allowed, observation.status)
        }
        ExpectationKind::Keywords(keywords) => {
            evaluate(observation.corpus, &expectation.name, keywords)
        }
        ExpectationKind::Elements {
            locators,
            quantifier,
        } => evaluate_elements(
            &expectation.name,
            locators,
            *quantifier,
            observation.corpus,
            observation.elements,
        ),
    }
}
