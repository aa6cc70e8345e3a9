//! Legal-case provider gateway (C3): queries the external judicial API
//! (DataJud-shaped) by CNJ case number and court acronym, and maps the
//! response into domain `LegalCase`/`LegalCaseMovement` records.

pub mod cnj;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fishsub_core::entities::{LegalCase, LegalCaseMovement};
use fishsub_core::{Error, Result};
use serde::Deserialize;
use uuid::Uuid;

#[async_trait]
pub trait LegalCaseProvider: Send + Sync {
    /// Returns the mapped case alongside its full movement history, in
    /// ascending date order, so callers can diff against what's already
    /// persisted instead of only seeing the latest movement.
    async fn find_case(
        &self,
        cnj_number: &str,
        court_acronym: &str,
    ) -> Result<Option<(LegalCase, Vec<(DateTime<Utc>, String)>)>>;
}

pub struct DataJudGateway {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl DataJudGateway {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    fn endpoint_for(&self, court_acronym: &str) -> String {
        format!(
            "{}/api_publica_{}/_search",
            self.base_url.trim_end_matches('/'),
            court_acronym.to_lowercase()
        )
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_source")]
    source: CaseSource,
}

#[derive(Debug, Deserialize)]
struct CaseSource {
    #[serde(rename = "numeroProcesso")]
    numero_processo: String,
    tribunal: String,
    #[serde(default)]
    classe: Option<NamedRef>,
    #[serde(rename = "orgaoJulgador", default)]
    orgao_julgador: Option<NamedRef>,
    #[serde(rename = "dataAjuizamento", default)]
    data_ajuizamento: Option<DateTime<Utc>>,
    #[serde(default)]
    assuntos: Vec<NamedRef>,
    #[serde(default)]
    movimentos: Vec<RawMovement>,
}

#[derive(Debug, Deserialize)]
struct NamedRef {
    nome: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RawMovement {
    #[serde(rename = "dataHora")]
    data_hora: DateTime<Utc>,
    nome: String,
    #[serde(rename = "complementosTabelados", default)]
    complementos_tabelados: Vec<NamedRef>,
}

impl RawMovement {
    /// Concatenates movement complements into the description (spec §4.3).
    fn description(&self) -> String {
        if self.complementos_tabelados.is_empty() {
            self.nome.clone()
        } else {
            let complements = self
                .complementos_tabelados
                .iter()
                .map(|c| c.nome.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            format!("{} - {}", self.nome, complements)
        }
    }
}

#[async_trait]
impl LegalCaseProvider for DataJudGateway {
    #[tracing::instrument(skip(self), fields(cnj_number, court_acronym))]
    async fn find_case(
        &self,
        cnj_number: &str,
        court_acronym: &str,
    ) -> Result<Option<(LegalCase, Vec<(DateTime<Utc>, String)>)>> {
        let clean_number = cnj::clean_digits(cnj_number)?;
        let canonical = cnj::canonicalize(cnj_number)?;

        let response = self
            .http
            .post(self.endpoint_for(court_acronym))
            .header("Authorization", format!("ApiKey {}", self.api_key))
            .json(&serde_json::json!({
                "query": { "match": { "numeroProcesso": clean_number } }
            }))
            .send()
            .await
            .map_err(|e| Error::LegalCasePersistence(anyhow::anyhow!(e)))?;

        let response = response
            .error_for_status()
            .map_err(|e| Error::LegalCasePersistence(anyhow::anyhow!(e)))?;

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| Error::LegalCasePersistence(anyhow::anyhow!(e)))?;

        let Some(hit) = body.hits.hits.into_iter().next() else {
            return Ok(None);
        };

        Ok(Some(map_source(hit.source, canonical)))
    }
}

fn map_source(source: CaseSource, canonical_number: String) -> (LegalCase, Vec<(DateTime<Utc>, String)>) {
    let movements = map_movements(&source.movimentos);
    let last = movements.last();
    let ultima_movimentacao = last.map(|(date, _)| *date);
    let ultima_movimentacao_descricao = last.map(|(_, desc)| desc.clone());

    let case = LegalCase {
        id: Uuid::nil(),
        numero_processo: canonical_number,
        court: source.tribunal,
        body: source.orgao_julgador.map(|n| n.nome),
        class: source.classe.map(|n| n.nome),
        subject: source.assuntos.into_iter().next().map(|n| n.nome),
        status: None,
        filing_date: source.data_ajuizamento,
        movimentacoes: movements.len() as i64,
        ultima_movimentacao,
        ultima_movimentacao_descricao,
        last_synced_at: None,
    };
    (case, movements)
}

/// Movements extracted alongside the case, in ascending date order, ready to
/// diff against persisted movements by `(timestamp, description)` identity
/// (spec §4.8 per-case update).
fn map_movements(movimentos: &[RawMovement]) -> Vec<(DateTime<Utc>, String)> {
    let mut movimentos = movimentos.to_vec();
    movimentos.sort_by_key(|m| m.data_hora);
    movimentos
        .into_iter()
        .map(|m| {
            let desc = m.description();
            (m.data_hora, desc)
        })
        .collect()
}

pub fn movement_to_entity(case_id: Uuid, movement_date: DateTime<Utc>, description: String) -> LegalCaseMovement {
    LegalCaseMovement {
        id: Uuid::new_v4(),
        case_id,
        movement_date,
        description,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn find_case_maps_response_and_sorts_movements() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api_publica_tjal/_search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hits": {
                    "hits": [{
                        "_source": {
                            "numeroProcesso": "0710802-55.2018.8.02.0001",
                            "tribunal": "TJAL",
                            "classe": {"nome": "Classe Teste"},
                            "orgaoJulgador": {"nome": "1a Vara"},
                            "dataAjuizamento": "2024-01-03T10:00:00Z",
                            "assuntos": [{"nome": "Assunto Teste"}],
                            "movimentos": [
                                {"dataHora": "2024-02-01T12:00:00Z", "nome": "Despacho", "complementosTabelados": []},
                                {"dataHora": "2024-01-15T09:00:00Z", "nome": "Distribuicao", "complementosTabelados": []}
                            ]
                        }
                    }]
                }
            })))
            .mount(&server)
            .await;

        let gateway = DataJudGateway::new(server.uri(), "dummy-key");
        let (case, movements) = gateway
            .find_case("07108025520188020001", "tjal")
            .await
            .unwrap()
            .expect("case present");

        assert_eq!(case.numero_processo, "0710802-55.2018.8.02.0001");
        assert_eq!(case.movimentacoes, 2);
        assert_eq!(
            case.ultima_movimentacao_descricao.as_deref(),
            Some("Despacho")
        );
        assert_eq!(movements.len(), 2);
        assert_eq!(movements[0].1, "Distribuicao");
        assert_eq!(movements[1].1, "Despacho");
    }

    #[tokio::test]
    async fn find_case_returns_none_on_zero_hits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api_publica_tjsp/_search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hits": { "hits": [] }
            })))
            .mount(&server)
            .await;

        let gateway = DataJudGateway::new(server.uri(), "dummy-key");
        let case = gateway
            .find_case("07108025520188020001", "tjsp")
            .await
            .unwrap();
        assert!(case.is_none());
    }
}
