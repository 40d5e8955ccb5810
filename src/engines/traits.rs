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

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 浏览器启动或连接失败
    #[error("Browser unavailable: {0}")]
    BrowserUnavailable(String),
    /// 导航失败
    #[error("Navigation failed: {0}")]
    NavigationFailed(String),
    /// 元素未找到
    #[error("Element not found: {0}")]
    ElementNotFound(String),
    /// 无效定位器
    #[error("Invalid locator: {0}")]
    InvalidLocator(String),
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

/// HTTP 方法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// 传输请求
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// 请求方法
    pub method: HttpMethod,
    /// 完整目标URL
    pub url: String,
    /// 表单字段（按声明顺序编码）
    pub form: Vec<(String, String)>,
    /// 是否跟随重定向
    pub allow_redirects: bool,
}

impl TransportRequest {
    /// 构造跟随重定向的 GET 请求
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            form: Vec::new(),
            allow_redirects: true,
        }
    }

    /// 构造表单 POST 请求
    pub fn post_form(
        url: impl Into<String>,
        form: Vec<(String, String)>,
        allow_redirects: bool,
    ) -> Self {
        Self {
            method: HttpMethod::Post,
            url: url.into(),
            form,
            allow_redirects,
        }
    }
}

/// 页面响应
#[derive(Debug, Clone)]
pub struct PageResponse {
    /// HTTP状态码
    pub status_code: u16,
    /// 响应内容
    pub body: String,
    /// 重定向后的最终URL
    pub final_url: String,
    /// 响应时间（毫秒）
    pub response_time_ms: u64,
}

/// HTTP 传输特质
///
/// 每个实例持有一个独立的凭据（cookie）存储，由实现自身在收到服务器
/// 下发的凭据时更新
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// 发送请求
    async fn send(&self, request: &TransportRequest) -> Result<PageResponse, EngineError>;

    /// 引擎名称
    fn name(&self) -> &'static str;
}

/// 元素定位器
///
/// 通过稳定的标识属性（name、class、文本内容）查找交互元素
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum ElementLocator {
    /// `name` 属性
    Name(String),
    /// CSS 类名
    Class(String),
    /// 指定标签且文本包含给定内容
    Text { tag: String, text: String },
    /// 原始 CSS 选择器
    Css(String),
}

impl ElementLocator {
    pub fn name(value: impl Into<String>) -> Self {
        ElementLocator::Name(value.into())
    }

    pub fn class(value: impl Into<String>) -> Self {
        ElementLocator::Class(value.into())
    }

    pub fn text(tag: impl Into<String>, text: impl Into<String>) -> Self {
        ElementLocator::Text {
            tag: tag.into(),
            text: text.into(),
        }
    }

    /// 转换为 CSS 选择器；文本定位器没有 CSS 等价形式，返回 None
    pub fn to_css(&self) -> Option<String> {
        match self {
            ElementLocator::Name(name) => Some(format!("[name=\"{}\"]", name)),
            ElementLocator::Class(class) => Some(format!(".{}", class)),
            ElementLocator::Css(css) => Some(css.clone()),
            ElementLocator::Text { .. } => None,
        }
    }

    /// 转换为 XPath，仅文本定位器使用
    pub fn to_xpath(&self) -> Option<String> {
        match self {
            ElementLocator::Text { tag, text } => {
                Some(format!("//{}[contains(., '{}')]", tag, text.replace('\'', "")))
            }
            _ => None,
        }
    }
}

impl fmt::Display for ElementLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementLocator::Name(name) => write!(f, "name={}", name),
            ElementLocator::Class(class) => write!(f, "class={}", class),
            ElementLocator::Text { tag, text } => write!(f, "{}~'{}'", tag, text),
            ElementLocator::Css(css) => write!(f, "css={}", css),
        }
    }
}

/// 元素查找特质
///
/// HTTP 层用静态 HTML 文档实现，可用性层用浏览器渲染后的 DOM 实现
#[async_trait]
pub trait ElementFinder: Send + Sync {
    /// 返回匹配定位器的元素数量
    async fn count_elements(&self, locator: &ElementLocator) -> Result<usize, EngineError>;
}

/// 浏览器驱动特质
#[async_trait]
pub trait BrowserDriver: ElementFinder {
    /// 导航到URL并等待页面加载完成
    async fn navigate(&self, url: &str) -> Result<(), EngineError>;

    /// 在元素中输入文本
    async fn type_into(&self, locator: &ElementLocator, text: &str) -> Result<(), EngineError>;

    /// 点击元素并等待可能的导航完成
    async fn click(&self, locator: &ElementLocator) -> Result<(), EngineError>;

    /// 读取渲染后的页面源码
    async fn page_source(&self) -> Result<String, EngineError>;

    /// 读取页面标题
    async fn title(&self) -> Result<String, EngineError>;

    /// 当前URL
    async fn current_url(&self) -> Result<String, EngineError>;

    /// 开始新流程前清除会话状态（cookie）并回到空白页
    async fn reset_session(&self) -> Result<(), EngineError> {
        Ok(())
    }

    /// 关闭浏览器
    async fn close(&self) -> Result<(), EngineError> {
        Ok(())
    }

    /// 驱动名称
    fn name(&self) -> &'static str;
}
