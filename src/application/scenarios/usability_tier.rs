// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::payloads::with_account;
use crate::config::settings::Settings;
use crate::domain::models::expectation::{ExpectationSet, Quantifier, Surface, TimingBudget};
use crate::domain::models::flow::{FailurePolicy, Flow, FlowStep, Precondition, StepAction};
use crate::engines::traits::ElementLocator;

/// 注册页必须渲染的字段
pub const REGISTER_FIELDS: [&str; 8] = [
    "nombre",
    "edad",
    "sexo",
    "correo",
    "username",
    "telefono",
    "direccion",
    "password",
];

/// 构建可用性流程
///
/// 使用 `Continue` 策略在同一个浏览器会话中依次检查各页面，
/// 一个页面超时不会掩盖其他页面的结果
pub fn flow(settings: &Settings) -> Flow {
    let target = &settings.target;
    let budget_ms = settings.usability.timing_budget_ms;

    let mut register_elements: Vec<ElementLocator> =
        REGISTER_FIELDS.iter().map(|f| ElementLocator::name(*f)).collect();
    register_elements.push(ElementLocator::text("button", "Registrarse"));

    with_account(Flow::new("usabilidad"), settings)
        .policy(FailurePolicy::Continue)
        .step(
            FlowStep::new("registro", StepAction::navigate(&target.register_path))
                .expect(ExpectationSet::new().elements(
                    "campos_registro",
                    Quantifier::All,
                    register_elements,
                ))
                .budget(TimingBudget::fail(budget_ms)),
        )
        .step(
            FlowStep::new("login", StepAction::navigate(&target.login_path))
                .expect(ExpectationSet::new().elements(
                    "campos_login",
                    Quantifier::All,
                    [
                        ElementLocator::name("email"),
                        ElementLocator::name("password"),
                        ElementLocator::class("login-btn"),
                    ],
                ))
                // a slow login page is only reported
                .budget(TimingBudget::warn(budget_ms)),
        )
        .step(
            FlowStep::new(
                "iniciar_sesion",
                StepAction::FillAndSubmit {
                    path: target.login_path.clone(),
                    inputs: vec![
                        (ElementLocator::name("email"), "{email}".to_string()),
                        (ElementLocator::name("password"), "{password}".to_string()),
                    ],
                    submit: ElementLocator::class("login-btn"),
                },
            )
            .authenticates_as("{email}"),
        )
        .step(
            FlowStep::new("perfil", StepAction::navigate(&target.profile_path))
                .requires(Precondition::StepPassed("iniciar_sesion".to_string()))
                .expect(
                    ExpectationSet::new()
                        .any("titulo", Surface::Title, ["biblioteca cubo", "mi perfil"])
                        .at_least(
                            "elementos_perfil",
                            Surface::Body,
                            3,
                            [
                                "guardar cambios",
                                "información",
                                "seguridad",
                                "imagen",
                                "nombre",
                                "correo",
                                "teléfono",
                                "dirección",
                            ],
                        ),
                )
                .budget(TimingBudget::fail(budget_ms)),
        )
        .step(
            FlowStep::new("leer", StepAction::navigate(&target.reader_path))
                .expect(
                    ExpectationSet::new()
                        .any(
                            "contenido_libro",
                            Surface::Body,
                            ["el principito", "capítulo", "lector"],
                        )
                        .at_least(
                            "controles_lectura",
                            Surface::Body,
                            2,
                            [
                                "página siguiente",
                                "página anterior",
                                "índice",
                                "modo noche",
                                "justificar",
                            ],
                        ),
                )
                .budget(TimingBudget::fail(budget_ms)),
        )
}
