// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::Settings;
use crate::domain::models::expectation::ExpectationSet;
use crate::domain::models::flow::{Flow, FlowStep, FormTemplate, StepAction};
use rand::Rng;

/// 登录后页面出现的会话标记
pub const SESSION_MARKERS: [&str; 3] = ["perfil", "cerrar sesión", "biblioteca cubo"];

/// 生成 `{prefix}_{1000..=9999}@example.com` 形式的随机邮箱
pub fn random_email(prefix: &str) -> String {
    let n: u32 = rand::rng().random_range(1000..=9999);
    format!("{}_{}@example.com", prefix, n)
}

/// 生成 `{prefix}{100..=999}` 形式的随机用户名
pub fn random_username(prefix: &str) -> String {
    let n: u32 = rand::rng().random_range(100..=999);
    format!("{}{}", prefix, n)
}

/// 注册表单，字段值取自流程变量
pub fn registration_form() -> FormTemplate {
    FormTemplate::new()
        .field("nombre", "{nombre}")
        .field("edad", "{edad}")
        .field("sexo", "{sexo}")
        .field("correo", "{correo}")
        .field("username", "{username}")
        .field("telefono", "{telefono}")
        .field("direccion", "{direccion}")
        .field("password", "{password}")
        .field("password_confirmation", "{password_confirmation}")
}

/// 登录表单
pub fn login_form() -> FormTemplate {
    FormTemplate::new()
        .field("email", "{email}")
        .field("password", "{password}")
}

/// 个人资料更新表单（随 `_method=PUT` 提交）
pub fn profile_form() -> FormTemplate {
    FormTemplate::new()
        .field("nombre", "{nombre}")
        .field("edad", "{edad}")
        .field("sexo", "{sexo}")
        .field("correo", "{correo}")
        .field("username", "{username}")
        .field("telefono", "{telefono}")
        .field("direccion", "{direccion}")
}

/// 个人资料更新动作
pub fn profile_update(settings: &Settings) -> StepAction {
    StepAction::SubmitForm {
        form_path: settings.target.profile_path.clone(),
        target_path: None,
        method_override: Some("PUT".to_string()),
        fields: profile_form(),
        allow_redirects: true,
    }
}

/// 以预置账户登录的步骤，要求流程中已设置 `email` 与 `password` 变量
pub fn login_step(name: &str, settings: &Settings) -> FlowStep {
    FlowStep::new(
        name,
        StepAction::submit(&settings.target.login_path, login_form()),
    )
    .expect(ExpectationSet::new().status("estado", [200, 302]))
    .authenticates_as("{email}")
}

/// 为流程设置预置账户的登录凭据
pub fn with_account(flow: Flow, settings: &Settings) -> Flow {
    flow.var("email", settings.account.email.as_str())
        .var("password", settings.account.password.as_str())
}

/// 一次性设置多个流程变量
pub fn with_vars(flow: Flow, vars: &[(&str, &str)]) -> Flow {
    vars.iter()
        .fold(flow, |flow, (key, value)| flow.var(key, *value))
}
