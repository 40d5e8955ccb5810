// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::payloads::{
    login_form, login_step, profile_update, random_email, random_username, registration_form,
    with_account, with_vars, SESSION_MARKERS,
};
use crate::config::settings::Settings;
use crate::domain::models::expectation::{ExpectationSet, Surface};
use crate::domain::models::flow::{Flow, FlowStep, Precondition, StepAction};

/// 构建单元层的全部流程
///
/// 每个用例是一个独立流程，由运行器为其创建新的会话载体；
/// 需要登录的用例是 `[iniciar_sesion, 用例]` 两步的快速失败流程
pub fn flows(settings: &Settings) -> Vec<Flow> {
    vec![
        registro_exitoso(settings),
        registro_contrasena_invalida(settings),
        registro_correo_duplicado(settings),
        registro_token_fresco(settings),
        login_correcto(settings),
        login_contrasena_incorrecta(settings),
        login_campos_vacios(settings),
        perfil_carga(settings),
        perfil_actualizacion_valida(settings),
        perfil_actualizacion_invalida(settings),
        leer_carga(settings),
        leer_navegacion(settings),
        leer_libro_inexistente(settings),
    ]
}

fn register(name: &str, settings: &Settings) -> FlowStep {
    FlowStep::new(
        name,
        StepAction::submit(&settings.target.register_path, registration_form()),
    )
}

fn registro_exitoso(settings: &Settings) -> Flow {
    let correo = random_email("usuario_test");
    let username = random_username("jesmir");
    with_vars(
        Flow::new("registro_exitoso"),
        &[
            ("nombre", "Jesse Miranda"),
            ("edad", "24"),
            ("sexo", "Masculino"),
            ("correo", correo.as_str()),
            ("username", username.as_str()),
            ("telefono", "79356730"),
            ("direccion", "Barrio La Cruz, Calle Principal"),
            ("password", "12345678"),
            ("password_confirmation", "12345678"),
        ],
    )
    .step(
        register("registro_exitoso", settings)
            .expect(
                ExpectationSet::new()
                    .status("estado", [200, 302])
                    .any("sesion_iniciada", Surface::Body, SESSION_MARKERS),
            )
            .authenticates_as("{correo}"),
    )
}

fn registro_contrasena_invalida(settings: &Settings) -> Flow {
    let correo = random_email("fail");
    let username = random_username("userfail");
    with_vars(
        Flow::new("registro_contrasena_invalida"),
        &[
            ("nombre", "Error Contraseña"),
            ("edad", "22"),
            ("sexo", "Femenino"),
            ("correo", correo.as_str()),
            ("username", username.as_str()),
            ("telefono", "70001111"),
            ("direccion", "San Miguel"),
            ("password", "12345678"),
            ("password_confirmation", "87654321"),
        ],
    )
    .step(
        register("registro_contrasena_invalida", settings).expect(
            ExpectationSet::new()
                .status("estado", [200])
                .all("error_contrasena", Surface::Body, ["contraseña"]),
        ),
    )
}

fn registro_correo_duplicado(settings: &Settings) -> Flow {
    with_vars(
        Flow::new("registro_correo_duplicado"),
        &[
            ("nombre", "Usuario Duplicado"),
            ("edad", "23"),
            ("sexo", "Masculino"),
            ("correo", settings.account.email.as_str()),
            ("username", "jesmir_duplicado"),
            ("telefono", "79998888"),
            ("direccion", "San Miguel"),
            ("password", "12345678"),
            ("password_confirmation", "12345678"),
        ],
    )
    .step(
        register("registro_correo_duplicado", settings).expect(
            ExpectationSet::new()
                .status("estado", [200])
                .all("error_correo", Surface::Body, ["correo"]),
        ),
    )
}

fn registro_token_fresco(settings: &Settings) -> Flow {
    Flow::new("registro_token_fresco").step(
        FlowStep::new(
            "registro_token_fresco",
            StepAction::TokenFreshness {
                form_path: settings.target.register_path.clone(),
            },
        )
        .expect(ExpectationSet::new().status("estado", [200])),
    )
}

fn login_correcto(settings: &Settings) -> Flow {
    with_account(Flow::new("login_correcto"), settings).step(
        FlowStep::new(
            "login_correcto",
            StepAction::submit(&settings.target.login_path, login_form()),
        )
        .requires(Precondition::Anonymous)
        .expect(
            ExpectationSet::new()
                .status("estado", [200, 302])
                .any("sesion_iniciada", Surface::Body, SESSION_MARKERS),
        )
        .authenticates_as("{email}"),
    )
}

fn login_contrasena_incorrecta(settings: &Settings) -> Flow {
    Flow::new("login_contrasena_incorrecta")
        .var("email", settings.account.email.as_str())
        .var("password", "clave_incorrecta")
        .step(
            FlowStep::new(
                "login_contrasena_incorrecta",
                StepAction::submit(&settings.target.login_path, login_form()),
            )
            .requires(Precondition::Anonymous)
            .expect(
                ExpectationSet::new().status("estado", [200]).any(
                    "error_credenciales",
                    Surface::Body,
                    ["credenciales", "incorrecta", "error"],
                ),
            ),
        )
}

fn login_campos_vacios(settings: &Settings) -> Flow {
    Flow::new("login_campos_vacios")
        .var("email", "")
        .var("password", "")
        .step(
            FlowStep::new(
                "login_campos_vacios",
                StepAction::submit(&settings.target.login_path, login_form()),
            )
            .requires(Precondition::Anonymous)
            .expect(
                ExpectationSet::new().status("estado", [200]).any(
                    "validacion",
                    Surface::Body,
                    ["obligatorio", "requerido", "correo"],
                ),
            ),
        )
}

/// 先登录再执行给定步骤的流程
fn authenticated(name: &str, settings: &Settings, step: FlowStep) -> Flow {
    with_account(Flow::new(name), settings)
        .step(login_step("iniciar_sesion", settings))
        .step(step.requires(Precondition::Authenticated))
}

fn perfil_carga(settings: &Settings) -> Flow {
    authenticated(
        "perfil_carga",
        settings,
        FlowStep::new("perfil_carga", StepAction::fetch(&settings.target.profile_path)).expect(
            ExpectationSet::new().status("estado", [200]).all(
                "datos_perfil",
                Surface::Body,
                [
                    settings.account.display_name.as_str(),
                    settings.account.email.as_str(),
                    "guardar cambios",
                ],
            ),
        ),
    )
}

fn profile_vars(flow: Flow, settings: &Settings, edad: &str, direccion: &str) -> Flow {
    let account = &settings.account;
    with_vars(
        flow,
        &[
            ("nombre", account.display_name.as_str()),
            ("edad", edad),
            ("sexo", "Masculino"),
            ("correo", account.email.as_str()),
            ("username", account.username.as_str()),
            ("telefono", account.phone.as_str()),
            ("direccion", direccion),
        ],
    )
}

fn perfil_actualizacion_valida(settings: &Settings) -> Flow {
    let flow = authenticated(
        "perfil_actualizacion_valida",
        settings,
        FlowStep::new("perfil_actualizacion_valida", profile_update(settings)).expect(
            ExpectationSet::new().status("estado", [200, 302]).any(
                "actualizado",
                Surface::Body,
                ["actualizado", "éxito", "perfil"],
            ),
        ),
    );
    profile_vars(flow, settings, "25", &settings.account.address)
}

fn perfil_actualizacion_invalida(settings: &Settings) -> Flow {
    let flow = authenticated(
        "perfil_actualizacion_invalida",
        settings,
        FlowStep::new("perfil_actualizacion_invalida", profile_update(settings)).expect(
            ExpectationSet::new().status("estado", [200]).any(
                "error_validacion",
                Surface::Body,
                ["error", "válido", "edad"],
            ),
        ),
    );
    profile_vars(flow, settings, "texto", "Barrio inválido")
}

fn leer_carga(settings: &Settings) -> Flow {
    authenticated(
        "leer_carga",
        settings,
        FlowStep::new("leer_carga", StepAction::fetch(&settings.target.reader_path)).expect(
            ExpectationSet::new().status("estado", [200]).all(
                "contenido_libro",
                Surface::Body,
                ["el principito", "capítulo", "página siguiente"],
            ),
        ),
    )
}

fn leer_navegacion(settings: &Settings) -> Flow {
    authenticated(
        "leer_navegacion",
        settings,
        FlowStep::new("leer_navegacion", StepAction::fetch(&settings.target.reader_path))
            .expect(
                ExpectationSet::new()
                    .all(
                        "botones_pagina",
                        Surface::Elements,
                        ["página siguiente", "página anterior"],
                    )
                    .any(
                        "botones_lector",
                        Surface::Elements,
                        ["índice", "justificar", "noche"],
                    ),
            ),
    )
}

fn leer_libro_inexistente(settings: &Settings) -> Flow {
    authenticated(
        "leer_libro_inexistente",
        settings,
        FlowStep::new(
            "leer_libro_inexistente",
            StepAction::fetch(&settings.target.missing_book_path),
        )
        .expect(
            ExpectationSet::new().status("estado", [200, 404]).any(
                "error_visible",
                Surface::Body,
                ["error", "no encontrado", "libro"],
            ),
        ),
    )
}
