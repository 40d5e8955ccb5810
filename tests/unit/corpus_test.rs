// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use flowprobe::domain::models::expectation::{ExpectationSet, Surface};
use flowprobe::domain::services::keyword_engine::{
    evaluate_set, Corpus, Diagnostic, ElementReport, Observation,
};
use flowprobe::domain::services::text_normalizer::normalize;

const PERFIL: &str = r#"<html><head><title>Mi Perfil</title></head><body>
    <h1>Información</h1>
    <input name="telefono" placeholder="Teléfono">
    <input name="direccion" value="Barrio La Cruz">
    <button>  Guardar
        cambios </button>
    </body></html>"#;

fn observe(corpus: &Corpus, set: &ExpectationSet) -> Vec<bool> {
    let elements = ElementReport::default();
    evaluate_set(
        set,
        &Observation {
            status: Some(200),
            corpus,
            elements: &elements,
        },
    )
    .into_iter()
    .map(|e| e.passed)
    .collect()
}

#[test]
fn test_accented_copy_matches_plain_keywords() {
    let corpus = Corpus::from_html(PERFIL);
    let set = ExpectationSet::new()
        .all("cuerpo", Surface::Body, ["informacion", "telefono"])
        .any("titulo", Surface::Title, ["mi perfil"])
        .all("botones", Surface::Elements, ["guardar cambios"])
        .at_least(
            "visibles",
            Surface::VisibleText,
            3,
            ["información", "teléfono", "barrio la cruz", "seguridad"],
        );
    assert_eq!(observe(&corpus, &set), vec![true, true, true, true]);
}

#[test]
fn test_visible_text_ignores_markup() {
    let corpus = Corpus::from_html(PERFIL);
    let set = ExpectationSet::new()
        .any("markup", Surface::VisibleText, ["placeholder"])
        .any("markup_cuerpo", Surface::Body, ["placeholder"]);
    assert_eq!(observe(&corpus, &set), vec![false, true]);
}

#[test]
fn test_empty_body_is_distinct_diagnostic() {
    let corpus = Corpus::from_html("");
    let elements = ElementReport::default();
    let set = ExpectationSet::new().any("cualquiera", Surface::Body, ["perfil"]);
    let evaluations = evaluate_set(
        &set,
        &Observation {
            status: Some(200),
            corpus: &corpus,
            elements: &elements,
        },
    );
    assert_eq!(evaluations[0].diagnostic, Diagnostic::EmptyCorpus);
}

#[test]
fn test_normalize_is_idempotent_on_spanish_copy() {
    for text in ["Página Siguiente", "ÍNDICE", "Contraseña", "Dirección", "El Principito"] {
        let once = normalize(text);
        assert_eq!(normalize(&once), once);
        assert!(once.chars().all(|c| !c.is_uppercase()));
    }
}
