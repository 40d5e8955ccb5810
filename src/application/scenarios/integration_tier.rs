// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::payloads::{login_form, profile_update, random_email, random_username, registration_form, with_vars};
use crate::config::settings::Settings;
use crate::domain::models::expectation::{ExpectationSet, Surface};
use crate::domain::models::flow::{Flow, FlowStep, Precondition, StepAction};

/// 个人资料页的容错检查关键字
pub const PROFILE_KEYWORDS: [&str; 13] = [
    "nombre",
    "nombre completo",
    "usuario",
    "correo",
    "correo electronico",
    "telefono",
    "direccion",
    "guardar cambios",
    "guardar",
    "actualizar",
    "informacion",
    "seguridad",
    "imagen",
];

/// 阅读器页面关键字
pub const READER_KEYWORDS: [&str; 7] = [
    "el principito",
    "capitulo",
    "pagina siguiente",
    "pagina anterior",
    "indice",
    "modo noche",
    "lector",
];

/// 构建集成流程：注册 → 登录 → 个人资料 → 更新资料 → 阅读
///
/// 所有步骤共享一个会话载体，第一个未通过的步骤会跳过其后的全部步骤
pub fn flow(settings: &Settings) -> Flow {
    let correo = random_email("integracion");
    let username = random_username("userint");
    let target = &settings.target;

    with_vars(
        Flow::new("integracion"),
        &[
            ("nombre", "Integracion Prueba"),
            ("edad", "24"),
            ("sexo", "Masculino"),
            ("correo", correo.as_str()),
            ("email", correo.as_str()),
            ("username", username.as_str()),
            ("telefono", "70001111"),
            ("direccion", "San Miguel"),
            ("password", "12345678"),
            ("password_confirmation", "12345678"),
        ],
    )
    .step(
        FlowStep::new(
            "registro",
            StepAction::submit(&target.register_path, registration_form()),
        )
        .requires(Precondition::Anonymous)
        .expect(
            ExpectationSet::new().status("estado", [200, 302]).any(
                "sesion_activa",
                Surface::Body,
                ["perfil", "bienvenido", "cerrar sesion", "biblioteca cubo"],
            ),
        )
        .authenticates_as("{correo}"),
    )
    .step(
        FlowStep::new("login", StepAction::submit(&target.login_path, login_form()))
            .expect(
                ExpectationSet::new().status("estado", [200, 302]).any(
                    "sesion_activa",
                    Surface::Body,
                    ["perfil", "cerrar sesion", "inicio", "bienvenido"],
                ),
            )
            .authenticates_as("{email}"),
    )
    .step(
        FlowStep::new("perfil", StepAction::fetch(&target.profile_path))
            .requires(Precondition::Authenticated)
            .expect(
                ExpectationSet::new()
                    .status("estado", [200])
                    .at_least("formulario_perfil", Surface::VisibleText, 2, PROFILE_KEYWORDS),
            ),
    )
    .step(
        FlowStep::new("actualizar_perfil", profile_update(settings))
            .requires(Precondition::Authenticated)
            .expect(
                ExpectationSet::new().status("estado", [200, 302]).any(
                    "actualizado",
                    Surface::Body,
                    ["actualizado", "éxito", "perfil"],
                ),
            ),
    )
    .step(
        FlowStep::new("leer", StepAction::fetch(&target.reader_path))
            .requires(Precondition::Authenticated)
            .expect(
                ExpectationSet::new()
                    .status("estado", [200])
                    .any("contenido_libro", Surface::Body, READER_KEYWORDS),
            ),
    )
}
