// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 进程内的假图书馆应用
//!
//! 模拟被测系统：注册、登录、个人资料、阅读器。每次抓取表单都会签发新的
//! 一次性防伪令牌，登录后通过 `session` cookie 维持会话，页面文案为带重音的西班牙语。

use axum::extract::{Form, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use flowprobe::config::settings::Settings;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

pub const FIXTURE_EMAIL: &str = "mp20049@ues.edu.sv";
pub const FIXTURE_PASSWORD: &str = "12345678";
pub const STATIC_TOKEN: &str = "static-token";

/// 假应用的行为开关
#[derive(Debug, Clone, Copy)]
pub struct LibraryOptions {
    /// 每次抓取签发不同的令牌
    pub rotate_tokens: bool,
    /// 注册提交返回空响应体
    pub blank_registration: bool,
}

impl Default for LibraryOptions {
    fn default() -> Self {
        Self {
            rotate_tokens: true,
            blank_registration: false,
        }
    }
}

#[derive(Debug, Clone)]
struct User {
    nombre: String,
    edad: String,
    correo: String,
    username: String,
    telefono: String,
    direccion: String,
    password: String,
}

#[derive(Default)]
struct LibraryState {
    users: HashMap<String, User>,
    sessions: HashMap<String, String>,
    tokens: HashSet<String>,
    flash: HashMap<String, String>,
    counter: u64,
}

#[derive(Clone)]
struct Library {
    options: LibraryOptions,
    state: Arc<Mutex<LibraryState>>,
}

impl Library {
    fn seeded(options: LibraryOptions) -> Self {
        let mut state = LibraryState::default();
        state.users.insert(
            FIXTURE_EMAIL.to_string(),
            User {
                nombre: "Jesse Miranda".to_string(),
                edad: "24".to_string(),
                correo: FIXTURE_EMAIL.to_string(),
                username: "Jesmir".to_string(),
                telefono: "79355730".to_string(),
                direccion: "Barrio La Cruz, Calle Central".to_string(),
                password: FIXTURE_PASSWORD.to_string(),
            },
        );
        Self {
            options,
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn issue_token(&self) -> String {
        if !self.options.rotate_tokens {
            return STATIC_TOKEN.to_string();
        }
        let mut state = self.state.lock().unwrap();
        state.counter += 1;
        let token = format!("tok-{:06}", state.counter);
        state.tokens.insert(token.clone());
        token
    }

    fn accept_token(&self, form: &HashMap<String, String>) -> bool {
        let Some(token) = form.get("_token") else {
            return false;
        };
        if !self.options.rotate_tokens {
            return token == STATIC_TOKEN;
        }
        self.state.lock().unwrap().tokens.remove(token)
    }

    fn current_user(&self, headers: &HeaderMap) -> Option<(String, User)> {
        let sid = session_id(headers)?;
        let state = self.state.lock().unwrap();
        let email = state.sessions.get(&sid)?;
        state.users.get(email).cloned().map(|u| (sid, u))
    }

    fn open_session(&self, email: &str) -> String {
        let mut state = self.state.lock().unwrap();
        state.counter += 1;
        let sid = format!("sid-{:06}", state.counter);
        state.sessions.insert(sid.clone(), email.to_string());
        sid
    }
}

fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix("session="))
        .map(str::to_string)
        .next()
}

fn page(title: &str, logged_in: bool, main: &str) -> Html<String> {
    let nav = if logged_in {
        r#"<nav><a href="/perfil">Mi perfil</a> <a href="/logout">Cerrar sesión</a></nav>"#
    } else {
        r#"<nav><a href="/user/loginUser">Iniciar sesión</a> <a href="/user/registerUser">Crear cuenta</a></nav>"#
    };
    Html(format!(
        "<!DOCTYPE html><html lang=\"es\"><head><meta charset=\"utf-8\"><title>{}</title></head>\
         <body>{}<main>{}</main></body></html>",
        title, nav, main
    ))
}

fn redirect_with_session(sid: &str, location: &str) -> Response {
    (
        StatusCode::FOUND,
        [
            (header::SET_COOKIE, format!("session={}; Path=/; HttpOnly", sid)),
            (header::LOCATION, location.to_string()),
        ],
    )
        .into_response()
}

fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

fn expired() -> Response {
    let status = StatusCode::from_u16(419).unwrap();
    (status, page("Página expirada", false, "<h1>Página expirada</h1>")).into_response()
}

fn register_form(token: &str, message: &str) -> String {
    format!(
        r#"<h1>Registro</h1>{message}
        <form method="POST" action="/user/registerUser">
          <input type="hidden" name="_token" value="{token}">
          <label>Nombre completo</label><input name="nombre">
          <label>Edad</label><input name="edad">
          <label>Sexo</label><select name="sexo"><option>Masculino</option><option>Femenino</option></select>
          <label>Correo electrónico</label><input name="correo">
          <label>Usuario</label><input name="username">
          <label>Teléfono</label><input name="telefono">
          <label>Dirección</label><input name="direccion">
          <label>Clave</label><input type="password" name="password">
          <label>Confirmar clave</label><input type="password" name="password_confirmation">
          <button type="submit">Registrarse</button>
        </form>"#
    )
}

fn login_form(token: &str, message: &str) -> String {
    format!(
        r#"<h1>Iniciar sesión</h1>{message}
        <form method="POST" action="/user/loginUser">
          <input type="hidden" name="_token" value="{token}">
          <input name="email" placeholder="Correo">
          <input type="password" name="password" placeholder="Clave">
          <button type="submit" class="login-btn">Entrar</button>
        </form>"#
    )
}

async fn register_page(State(app): State<Library>) -> Html<String> {
    let token = app.issue_token();
    page("Registro", false, &register_form(&token, ""))
}

async fn register(
    State(app): State<Library>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    if !app.accept_token(&form) {
        return expired();
    }
    if app.options.blank_registration {
        return (StatusCode::OK, "").into_response();
    }
    let field = |name: &str| form.get(name).cloned().unwrap_or_default();

    let message = if field("password") != field("password_confirmation") {
        Some("<p class=\"error\">Las contraseñas no coinciden.</p>")
    } else if app.state.lock().unwrap().users.contains_key(&field("correo")) {
        Some("<p class=\"error\">El correo ya está registrado.</p>")
    } else {
        None
    };
    if let Some(message) = message {
        let token = app.issue_token();
        return page("Registro", false, &register_form(&token, message)).into_response();
    }

    let user = User {
        nombre: field("nombre"),
        edad: field("edad"),
        correo: field("correo"),
        username: field("username"),
        telefono: field("telefono"),
        direccion: field("direccion"),
        password: field("password"),
    };
    app.state
        .lock()
        .unwrap()
        .users
        .insert(user.correo.clone(), user.clone());
    let sid = app.open_session(&user.correo);
    redirect_with_session(&sid, "/perfil")
}

async fn login_page(State(app): State<Library>) -> Html<String> {
    let token = app.issue_token();
    page("Iniciar sesión", false, &login_form(&token, ""))
}

async fn login(State(app): State<Library>, Form(form): Form<HashMap<String, String>>) -> Response {
    if !app.accept_token(&form) {
        return expired();
    }
    let email = form.get("email").cloned().unwrap_or_default();
    let password = form.get("password").cloned().unwrap_or_default();

    let message = if email.is_empty() || password.is_empty() {
        Some("<p class=\"error\">El campo correo es obligatorio.</p>")
    } else {
        let state = app.state.lock().unwrap();
        match state.users.get(&email) {
            Some(user) if user.password == password => None,
            _ => Some("<p class=\"error\">Credenciales incorrectas.</p>"),
        }
    };
    if let Some(message) = message {
        let token = app.issue_token();
        return page("Iniciar sesión", false, &login_form(&token, message)).into_response();
    }
    let sid = app.open_session(&email);
    redirect_with_session(&sid, "/perfil")
}

fn profile_form(token: &str, user: &User, message: &str) -> String {
    format!(
        r#"<h1>Información personal</h1>{message}
        <form method="POST" action="/perfil">
          <input type="hidden" name="_token" value="{token}">
          <input type="hidden" name="_method" value="PUT">
          <label>Nombre</label><input name="nombre" value="{nombre}">
          <label>Edad</label><input name="edad" value="{edad}">
          <label>Correo</label><input name="correo" value="{correo}">
          <label>Usuario</label><input name="username" value="{username}">
          <label>Teléfono</label><input name="telefono" value="{telefono}">
          <label>Dirección</label><input name="direccion" value="{direccion}">
          <button type="submit">Guardar cambios</button>
        </form>
        <section><h2>Seguridad</h2><button type="button">Cambiar imagen</button></section>"#,
        nombre = user.nombre,
        edad = user.edad,
        correo = user.correo,
        username = user.username,
        telefono = user.telefono,
        direccion = user.direccion,
    )
}

async fn profile_page(State(app): State<Library>, headers: HeaderMap) -> Response {
    let Some((sid, user)) = app.current_user(&headers) else {
        return redirect("/user/loginUser");
    };
    let flash = app
        .state
        .lock()
        .unwrap()
        .flash
        .remove(&sid)
        .unwrap_or_default();
    let token = app.issue_token();
    page("Mi Perfil", true, &profile_form(&token, &user, &flash)).into_response()
}

async fn profile_update(
    State(app): State<Library>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let Some((sid, user)) = app.current_user(&headers) else {
        return redirect("/user/loginUser");
    };
    if form.get("_method").map(String::as_str) != Some("PUT") {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }
    if !app.accept_token(&form) {
        return expired();
    }
    let edad = form.get("edad").cloned().unwrap_or_default();
    if edad.parse::<u32>().is_err() {
        let token = app.issue_token();
        let message = "<p class=\"error\">La edad debe ser un número válido.</p>";
        return page("Mi Perfil", true, &profile_form(&token, &user, message)).into_response();
    }

    let mut state = app.state.lock().unwrap();
    if let Some(stored) = state.users.get_mut(&user.correo) {
        stored.edad = edad;
        if let Some(v) = form.get("telefono") {
            stored.telefono = v.clone();
        }
        if let Some(v) = form.get("direccion") {
            stored.direccion = v.clone();
        }
    }
    state.flash.insert(
        sid,
        "<p class=\"ok\">Datos actualizados con éxito.</p>".to_string(),
    );
    redirect("/perfil")
}

async fn reader(
    State(app): State<Library>,
    headers: HeaderMap,
    Path(code): Path<String>,
) -> Response {
    if app.current_user(&headers).is_none() {
        return redirect("/user/loginUser");
    }
    if code != "EP02025" {
        return (
            StatusCode::NOT_FOUND,
            page("Error", true, "<h1>Error 404</h1><p>Libro no encontrado.</p>"),
        )
            .into_response();
    }
    page(
        "Lector",
        true,
        r#"<article><h1>El Principito</h1><h2>Capítulo I</h2>
        <p>Cuando yo tenía seis años vi en un libro una magnífica lámina.</p></article>
        <div class="controles">
          <button>Página anterior</button>
          <button>Página siguiente</button>
          <button>Índice</button>
          <button>Modo noche</button>
        </div>"#,
    )
    .into_response()
}

async fn tokenless_form() -> Html<String> {
    page(
        "Contacto",
        false,
        r#"<form method="POST" action="/sin-token"><input name="mensaje"><button>Enviar</button></form>"#,
    )
}

/// 启动假应用，返回基础URL
pub async fn spawn_library(options: LibraryOptions) -> String {
    let app = Router::new()
        .route("/user/registerUser", get(register_page).post(register))
        .route("/user/loginUser", get(login_page).post(login))
        .route("/perfil", get(profile_page).post(profile_update))
        .route("/libros/{code}/leer", get(reader))
        .route("/sin-token", get(tokenless_form))
        .with_state(Library::seeded(options));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// 指向给定基础URL的配置（其余取默认值）
pub fn settings_for(base_url: &str) -> Settings {
    let mut settings = Settings::from_file("config/default").unwrap();
    settings.target.base_url = base_url.to_string();
    settings
}
