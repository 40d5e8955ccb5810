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

use crate::domain::models::verdict::Tier;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// 测试工具配置设置
///
/// 包含被测应用地址、固定账户、传输、可用性、运行层级和日志等配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 被测应用配置
    pub target: TargetSettings,
    /// 预置账户配置
    pub account: AccountSettings,
    /// HTTP传输配置
    pub transport: TransportSettings,
    /// 可用性层配置
    pub usability: UsabilitySettings,
    /// 运行配置
    pub harness: HarnessSettings,
    /// 日志配置
    pub log: LogSettings,
}

/// 被测应用配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct TargetSettings {
    /// 应用基础URL
    pub base_url: String,
    /// 注册页路径
    pub register_path: String,
    /// 登录页路径
    pub login_path: String,
    /// 个人资料页路径
    pub profile_path: String,
    /// 阅读器路径
    pub reader_path: String,
    /// 不存在的书籍路径
    pub missing_book_path: String,
    /// 防伪令牌字段名
    pub token_field: String,
}

/// 预置账户配置设置
///
/// 单元层与可用性层使用的已存在账户
#[derive(Debug, Clone, Deserialize)]
pub struct AccountSettings {
    pub email: String,
    pub password: String,
    pub display_name: String,
    pub username: String,
    pub phone: String,
    pub address: String,
}

/// HTTP传输配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct TransportSettings {
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    /// 连接超时时间（秒）
    pub connect_timeout_secs: u64,
    /// User-Agent
    pub user_agent: String,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            user_agent: format!("flowprobe/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// 可用性层配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct UsabilitySettings {
    /// 页面加载时间预算（毫秒）
    pub timing_budget_ms: u64,
    /// 是否无头模式
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    /// 浏览器请求超时时间（秒）
    pub request_timeout_secs: u64,
    /// 远程调试地址，设置后连接已运行的 Chrome 而不是启动新实例
    pub remote_debugging_url: Option<String>,
}

/// 运行配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct HarnessSettings {
    /// 默认运行的层级
    pub tiers: Vec<Tier>,
    /// 是否要求两次抓取的令牌值不同
    pub require_rotating_tokens: bool,
}

/// 日志配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LogSettings {
    /// 是否输出JSON格式日志
    pub json: bool,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加内置默认值、`config/default.toml`、`config/{APP_ENVIRONMENT}.toml`
    /// 以及 `FLOWPROBE__` 前缀的环境变量
    ///
    /// # 返回值
    ///
    /// * `Ok(Settings)` - 成功加载并通过校验的配置
    /// * `Err(ConfigError)` - 配置加载或校验失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::load(
            Self::defaults()?
                .add_source(File::with_name("config/default").required(false))
                .add_source(File::with_name(&format!("config/{}", env)).required(false))
                .add_source(Environment::with_prefix("FLOWPROBE").separator("__")),
        )
    }

    /// 从指定配置文件加载（不读取环境变量）
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Self::defaults()?.add_source(File::with_name(path)))
    }

    fn load(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    fn defaults() -> Result<config::ConfigBuilder<config::builder::DefaultState>, ConfigError> {
        let transport = TransportSettings::default();
        Config::builder()
            // Target application
            .set_default("target.base_url", "https://biblioteca-cubo.com/Biblioteca-CUBO/public")?
            .set_default("target.register_path", "/user/registerUser")?
            .set_default("target.login_path", "/user/loginUser")?
            .set_default("target.profile_path", "/perfil")?
            .set_default("target.reader_path", "/libros/EP02025/leer")?
            .set_default("target.missing_book_path", "/libros/ERROR404/leer")?
            .set_default("target.token_field", "_token")?
            // Fixture account
            .set_default("account.email", "mp20049@ues.edu.sv")?
            .set_default("account.password", "12345678")?
            .set_default("account.display_name", "Jesse Miranda")?
            .set_default("account.username", "Jesmir")?
            .set_default("account.phone", "79355730")?
            .set_default("account.address", "Barrio La Cruz, Calle Central")?
            // Transport
            .set_default("transport.timeout_secs", transport.timeout_secs)?
            .set_default("transport.connect_timeout_secs", transport.connect_timeout_secs)?
            .set_default("transport.user_agent", transport.user_agent)?
            // Usability
            .set_default("usability.timing_budget_ms", 5000)?
            .set_default("usability.headless", true)?
            .set_default("usability.window_width", 1920)?
            .set_default("usability.window_height", 1080)?
            .set_default("usability.request_timeout_secs", 10)?
            // Harness
            .set_default("harness.tiers", vec!["unit", "integration", "usability"])?
            .set_default("harness.require_rotating_tokens", false)?
            .set_default("log.json", false)
    }

    /// 校验配置
    ///
    /// # 返回值
    ///
    /// * `Ok(())` - 配置有效
    /// * `Err(ConfigError)` - 基础URL无法解析或时间预算为零
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = url::Url::parse(&self.target.base_url).map_err(|e| {
            ConfigError::Message(format!(
                "target.base_url '{}' is not a valid URL: {}",
                self.target.base_url, e
            ))
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Message(format!(
                "target.base_url must use http or https, got '{}'",
                url.scheme()
            )));
        }
        if self.usability.timing_budget_ms == 0 {
            return Err(ConfigError::Message(
                "usability.timing_budget_ms must be greater than zero".to_string(),
            ));
        }
        if self.target.token_field.trim().is_empty() {
            return Err(ConfigError::Message(
                "target.token_field must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
