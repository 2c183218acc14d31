//! # Modelo Externo de NER — Fronteira Injetada
//!
//! O pipeline pode consumir candidatos de um modelo neural de
//! reconhecimento de entidades (ex: um BERT para português servido fora do
//! processo). O modelo é uma caixa-preta: só o que entra no motor são spans
//! `{tipo, início, fim, confiança}` na mesma convenção de offsets de byte
//! do texto original.
//!
//! A integração é uma estratégia injetada: o núcleo não carrega nenhuma
//! dependência de runtime de ML, e o padrão é [`NoopModel`] — o motor se
//! comporta de forma idêntica, apenas sem esses candidatos. Falhas do
//! modelo são capturadas na fronteira que o invoca e tratadas como "zero
//! candidatos desta fonte"; o pipeline nunca aborta por causa dele.

use serde::{Deserialize, Serialize};

use crate::entity::PiiType;

/// Erro opaco devolvido pela fronteira do modelo.
pub type ModelError = Box<dyn std::error::Error + Send + Sync>;

/// Um candidato produzido pelo modelo externo.
///
/// `start`/`end` seguem a mesma convenção de offsets de byte das entidades
/// do motor; cabe ao adaptador do modelo fazer essa conversão.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpan {
    pub pii_type: PiiType,
    pub start: usize,
    pub end: usize,
    pub confidence: f64,
}

/// Estratégia de extração de candidatos por modelo externo.
///
/// A chamada é bloqueante e o motor não impõe timeout — política de latência
/// pertence ao chamador/adaptador.
pub trait ExternalEntityModel: Send + Sync {
    fn extract(&self, text: &str) -> Result<Vec<ModelSpan>, ModelError>;
}

/// Implementação padrão: nenhum candidato, nunca falha.
pub struct NoopModel;

impl ExternalEntityModel for NoopModel {
    fn extract(&self, _text: &str) -> Result<Vec<ModelSpan>, ModelError> {
        Ok(vec![])
    }
}
