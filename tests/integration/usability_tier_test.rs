// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::settings_for;
use async_trait::async_trait;
use flowprobe::application::runner::TierRunner;
use flowprobe::application::scenarios::usability_tier;
use flowprobe::domain::models::flow::{Flow, FlowStep, Precondition, StepAction};
use flowprobe::domain::models::verdict::{FlowVerdict, StepState};
use flowprobe::engines::static_document::StaticDocument;
use flowprobe::engines::traits::{BrowserDriver, ElementFinder, ElementLocator, EngineError};
use flowprobe::utils::errors::FailureKind;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const BASE: &str = "http://biblioteca.test";

const REGISTRO: &str = r#"<html><head><title>Registro</title></head><body><form>
    <input name="nombre"><input name="edad"><select name="sexo"></select><input name="correo">
    <input name="username"><input name="telefono"><input name="direccion"><input name="password">
    <button type="submit">Registrarse</button></form></body></html>"#;

const LOGIN: &str = r#"<html><head><title>Login</title></head><body><form>
    <input name="email"><input name="password">
    <button class="login-btn">Iniciar sesión</button></form></body></html>"#;

const LOGIN_SIN_BOTON: &str = r#"<html><head><title>Login</title></head><body><form>
    <input name="email"><input name="password"></form></body></html>"#;

const PERFIL: &str = r#"<html><head><title>Mi Perfil</title></head><body>
    <h1>Información personal</h1><label>Nombre</label><label>Correo</label>
    <label>Teléfono</label><label>Dirección</label><button>Guardar cambios</button>
    </body></html>"#;

const LECTOR: &str = r#"<html><head><title>Lector</title></head><body>
    <h1>El Principito</h1><h2>Capítulo I</h2>
    <button>Página anterior</button><button>Página siguiente</button><button>Modo noche</button>
    </body></html>"#;

/// 按URL返回固定页面的驱动，导航耗时由暂停的时钟推进
struct ScriptedBrowser {
    pages: HashMap<String, (u64, &'static str, &'static str)>,
    current: Mutex<String>,
    typed: Arc<Mutex<Vec<(ElementLocator, String)>>>,
    closed: Arc<AtomicBool>,
    resets: Arc<AtomicUsize>,
    broken_lookup: bool,
}

impl ScriptedBrowser {
    fn new() -> Self {
        Self {
            pages: HashMap::new(),
            current: Mutex::new(String::new()),
            typed: Arc::new(Mutex::new(Vec::new())),
            closed: Arc::new(AtomicBool::new(false)),
            resets: Arc::new(AtomicUsize::new(0)),
            broken_lookup: false,
        }
    }

    /// 元素查询时模拟浏览器连接断开
    fn broken_lookup(mut self) -> Self {
        self.broken_lookup = true;
        self
    }

    fn page(mut self, path: &str, load_ms: u64, title: &'static str, html: &'static str) -> Self {
        self.pages
            .insert(format!("{}{}", BASE, path), (load_ms, title, html));
        self
    }

    fn html(&self) -> &'static str {
        let url = self.current.lock().unwrap().clone();
        self.pages.get(&url).map(|p| p.2).unwrap_or("")
    }
}

#[async_trait]
impl ElementFinder for ScriptedBrowser {
    async fn count_elements(&self, locator: &ElementLocator) -> Result<usize, EngineError> {
        if self.broken_lookup {
            return Err(EngineError::Other(format!(
                "Element lookup for {} failed: Received no response from the chromium instance.",
                locator
            )));
        }
        StaticDocument::new(self.html()).count(locator)
    }
}

#[async_trait]
impl BrowserDriver for ScriptedBrowser {
    async fn navigate(&self, url: &str) -> Result<(), EngineError> {
        let (load_ms, _, _) = *self
            .pages
            .get(url)
            .ok_or_else(|| EngineError::NavigationFailed(url.to_string()))?;
        tokio::time::sleep(Duration::from_millis(load_ms)).await;
        *self.current.lock().unwrap() = url.to_string();
        Ok(())
    }

    async fn type_into(&self, locator: &ElementLocator, text: &str) -> Result<(), EngineError> {
        self.typed
            .lock()
            .unwrap()
            .push((locator.clone(), text.to_string()));
        Ok(())
    }

    async fn click(&self, locator: &ElementLocator) -> Result<(), EngineError> {
        if self.count_elements(locator).await? == 0 {
            return Err(EngineError::ElementNotFound(locator.to_string()));
        }
        *self.current.lock().unwrap() = format!("{}/perfil", BASE);
        Ok(())
    }

    async fn page_source(&self) -> Result<String, EngineError> {
        Ok(self.html().to_string())
    }

    async fn title(&self) -> Result<String, EngineError> {
        let url = self.current.lock().unwrap().clone();
        Ok(self
            .pages
            .get(&url)
            .map(|p| p.1.to_string())
            .unwrap_or_default())
    }

    async fn current_url(&self) -> Result<String, EngineError> {
        Ok(self.current.lock().unwrap().clone())
    }

    async fn reset_session(&self) -> Result<(), EngineError> {
        self.resets.fetch_add(1, Ordering::SeqCst);
        self.current.lock().unwrap().clear();
        Ok(())
    }

    async fn close(&self) -> Result<(), EngineError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

async fn run(browser: ScriptedBrowser) -> FlowVerdict {
    let runner = TierRunner::new(settings_for(BASE));
    let flow = usability_tier::flow(runner.settings());
    let mut verdicts = runner.run_with_driver(&[flow], Box::new(browser)).await;
    verdicts.remove(0)
}

fn library(login_ms: u64, perfil_ms: u64) -> ScriptedBrowser {
    ScriptedBrowser::new()
        .page("/user/registerUser", 900, "Registro", REGISTRO)
        .page("/user/loginUser", login_ms, "Login", LOGIN)
        .page("/perfil", perfil_ms, "Mi Perfil", PERFIL)
        .page("/libros/EP02025/leer", 1500, "Lector", LECTOR)
}

#[tokio::test(start_paused = true)]
async fn test_fast_pages_pass_and_browser_is_closed() {
    let browser = library(700, 1100);
    let closed = browser.closed.clone();
    let typed = browser.typed.clone();

    let verdict = run(browser).await;

    assert!(verdict.passed(), "{:?}", verdict);
    assert_eq!(verdict.step("registro").unwrap().elapsed_ms, 900);
    assert_eq!(verdict.step("perfil").unwrap().elapsed_ms, 1100);
    assert!(closed.load(Ordering::SeqCst));

    let typed = typed.lock().unwrap();
    assert_eq!(
        typed[0],
        (ElementLocator::name("email"), "mp20049@ues.edu.sv".to_string())
    );
    assert_eq!(typed[1].1, "12345678");
}

#[tokio::test(start_paused = true)]
async fn test_slow_login_page_only_warns() {
    let verdict = run(library(6400, 1100)).await;

    let login = verdict.step("login").unwrap();
    assert_eq!(login.state, StepState::Passed);
    assert_eq!(login.elapsed_ms, 6400);
    assert!(verdict.passed());
}

#[tokio::test(start_paused = true)]
async fn test_slow_profile_fails_without_hiding_reader() {
    let verdict = run(library(700, 5200)).await;

    let perfil = verdict.step("perfil").unwrap();
    assert_eq!(perfil.state, StepState::Failed);
    assert_eq!(perfil.failure_kind, Some(FailureKind::Assertion));
    assert!(perfil
        .failure_reason
        .as_deref()
        .unwrap()
        .contains("5200 ms exceeds timing budget of 5000 ms"));
    // keyword checks still ran
    assert!(perfil.evaluations.iter().all(|e| e.passed));

    assert_eq!(verdict.step("leer").unwrap().state, StepState::Passed);
}

#[tokio::test(start_paused = true)]
async fn test_failed_login_skips_profile_only() {
    let browser = ScriptedBrowser::new()
        .page("/user/registerUser", 900, "Registro", REGISTRO)
        .page("/user/loginUser", 700, "Login", LOGIN_SIN_BOTON)
        .page("/perfil", 1100, "Mi Perfil", PERFIL)
        .page("/libros/EP02025/leer", 1500, "Lector", LECTOR);

    let verdict = run(browser).await;

    assert_eq!(verdict.step("login").unwrap().state, StepState::Failed);
    let iniciar = verdict.step("iniciar_sesion").unwrap();
    assert_eq!(iniciar.state, StepState::Failed);
    assert_eq!(iniciar.failure_kind, Some(FailureKind::Transport));

    let perfil = verdict.step("perfil").unwrap();
    assert_eq!(perfil.state, StepState::Skipped);
    assert!(perfil
        .failure_reason
        .as_deref()
        .unwrap()
        .contains("iniciar_sesion"));

    assert_eq!(verdict.step("leer").unwrap().state, StepState::Passed);
}

#[tokio::test(start_paused = true)]
async fn test_each_flow_starts_with_a_fresh_browser_session() {
    let browser = library(700, 1100);
    let resets = browser.resets.clone();
    let runner = TierRunner::new(settings_for(BASE));

    let primero = Flow::new("primero").step(
        FlowStep::new("entrar", StepAction::navigate("/user/loginUser"))
            .authenticates_as("a@example.com"),
    );
    let segundo = Flow::new("segundo").step(
        FlowStep::new("anonimo", StepAction::navigate("/user/registerUser"))
            .requires(Precondition::Anonymous),
    );

    let verdicts = runner
        .run_with_driver(&[primero, segundo], Box::new(browser))
        .await;

    assert!(verdicts[0].passed(), "{:?}", verdicts[0]);
    let anonimo = verdicts[1].step("anonimo").unwrap();
    assert_eq!(anonimo.state, StepState::Passed, "{:?}", anonimo);
    assert_eq!(resets.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn test_browser_lookup_fault_is_transport_failure() {
    let verdict = run(library(700, 1100).broken_lookup()).await;

    let registro = verdict.step("registro").unwrap();
    assert_eq!(registro.state, StepState::Failed);
    assert_eq!(registro.failure_kind, Some(FailureKind::Transport));
    assert!(registro
        .failure_reason
        .as_deref()
        .unwrap()
        .contains("transport failure"));
}
