// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use flowprobe::config::settings::TransportSettings;
use flowprobe::engines::reqwest_engine::ReqwestTransport;
use flowprobe::engines::traits::{EngineError, HttpTransport, TransportRequest};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn transport() -> ReqwestTransport {
    ReqwestTransport::new(&TransportSettings::default()).unwrap()
}

#[tokio::test]
async fn test_redirect_followed_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/origen"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/destino"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/destino"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Bienvenido"))
        .mount(&server)
        .await;

    let response = transport()
        .send(&TransportRequest::get(format!("{}/origen", server.uri())))
        .await
        .unwrap();

    assert_eq!(response.status_code, 200);
    assert!(response.final_url.ends_with("/destino"));
    assert_eq!(response.body, "Bienvenido");
}

#[tokio::test]
async fn test_redirect_not_followed_when_disabled() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/user/loginUser"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/perfil"))
        .mount(&server)
        .await;

    let request = TransportRequest::post_form(
        format!("{}/user/loginUser", server.uri()),
        vec![("email".into(), "a@b.c".into())],
        false,
    );
    let response = transport().send(&request).await.unwrap();

    assert_eq!(response.status_code, 302);
    assert!(response.final_url.ends_with("/user/loginUser"));
}

#[tokio::test]
async fn test_status_passthrough() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/libros/ERROR404/leer"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Libro no encontrado"))
        .mount(&server)
        .await;

    let response = transport()
        .send(&TransportRequest::get(format!(
            "{}/libros/ERROR404/leer",
            server.uri()
        )))
        .await
        .unwrap();

    assert_eq!(response.status_code, 404);
    assert_eq!(response.body, "Libro no encontrado");
}

#[tokio::test]
async fn test_form_is_url_encoded_in_declared_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/perfil"))
        .and(body_string_contains("_token=abc&_method=PUT&direccion=Barrio+inv%C3%A1lido"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let request = TransportRequest::post_form(
        format!("{}/perfil", server.uri()),
        vec![
            ("_token".into(), "abc".into()),
            ("_method".into(), "PUT".into()),
            ("direccion".into(), "Barrio inválido".into()),
        ],
        true,
    );
    let response = transport().send(&request).await.unwrap();
    assert_eq!(response.status_code, 200);
}

#[tokio::test]
async fn test_connection_failure_is_request_error() {
    let result = transport()
        .send(&TransportRequest::get("http://127.0.0.1:1/"))
        .await;
    assert!(matches!(result, Err(EngineError::RequestFailed(_))));
}
