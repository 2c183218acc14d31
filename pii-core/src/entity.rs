//! # Tipos de Dado Pessoal e Entidades Detectadas
//!
//! Define o vocabulário do sistema: os tipos de dado pessoal brasileiros
//! reconhecidos, o método de detecção que originou cada achado e a entidade
//! final entregue ao chamador.
//!
//! ## Tipos Reconhecidos
//!
//! | Tipo            | Exemplo              | Validação matemática |
//! |-----------------|----------------------|----------------------|
//! | CPF             | 529.982.247-25       | sim (mod-11)         |
//! | CNPJ            | 11.222.333/0001-81   | sim (mod-11)         |
//! | TELEFONE/CELULAR| (61) 99999-8888      | sim (DDD + estrutura)|
//! | EMAIL           | maria@exemplo.com.br | sim (estrutural)     |
//! | CEP             | 70000-000            | sim (estrutural)     |
//! | RG, CNH, ...    | —                    | não                  |
//!
//! A proveniência de cada entidade é o par explícito
//! (`pii_type`, `detection_method`) — não há sufixos de string como
//! `_CONTEXTUAL` em lugar nenhum do crate.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::DetectionMode;

/// Tipos de dado pessoal identificáveis em textos brasileiros.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PiiType {
    /// Cadastro de Pessoa Física (11 dígitos, dois verificadores).
    Cpf,
    /// Cadastro Nacional de Pessoa Jurídica (14 dígitos, dois verificadores).
    Cnpj,
    /// Telefone fixo (10 dígitos com DDD).
    Telefone,
    /// Telefone celular (11 dígitos, terceiro dígito 9).
    Celular,
    Email,
    /// Código de Endereçamento Postal (8 dígitos).
    Cep,
    /// Registro Geral — formato varia por estado, sem validação matemática.
    Rg,
    /// Carteira Nacional de Habilitação (11 dígitos).
    Cnh,
    /// Título de eleitor (12 dígitos).
    TituloEleitor,
    /// PIS/PASEP (11 dígitos).
    PisPasep,
    /// Cartão de pagamento (prefixos Visa, Master, Amex, Discover).
    CartaoCredito,
    NomePessoa,
    Endereco,
    DataNascimento,
    /// Placa de veículo (formato antigo AAA-1234 ou Mercosul AAA1A23).
    PlacaVeiculo,
    Passaporte,
}

impl PiiType {
    /// Nome canônico do tipo (idêntico à forma serializada).
    pub fn name(&self) -> &'static str {
        match self {
            PiiType::Cpf => "CPF",
            PiiType::Cnpj => "CNPJ",
            PiiType::Telefone => "TELEFONE",
            PiiType::Celular => "CELULAR",
            PiiType::Email => "EMAIL",
            PiiType::Cep => "CEP",
            PiiType::Rg => "RG",
            PiiType::Cnh => "CNH",
            PiiType::TituloEleitor => "TITULO_ELEITOR",
            PiiType::PisPasep => "PIS_PASEP",
            PiiType::CartaoCredito => "CARTAO_CREDITO",
            PiiType::NomePessoa => "NOME_PESSOA",
            PiiType::Endereco => "ENDERECO",
            PiiType::DataNascimento => "DATA_NASCIMENTO",
            PiiType::PlacaVeiculo => "PLACA_VEICULO",
            PiiType::Passaporte => "PASSAPORTE",
        }
    }

    /// Tenta parsear a partir do nome canônico (ex: "CPF" → Some(Cpf)).
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "CPF" => Some(PiiType::Cpf),
            "CNPJ" => Some(PiiType::Cnpj),
            "TELEFONE" => Some(PiiType::Telefone),
            "CELULAR" => Some(PiiType::Celular),
            "EMAIL" => Some(PiiType::Email),
            "CEP" => Some(PiiType::Cep),
            "RG" => Some(PiiType::Rg),
            "CNH" => Some(PiiType::Cnh),
            "TITULO_ELEITOR" => Some(PiiType::TituloEleitor),
            "PIS_PASEP" => Some(PiiType::PisPasep),
            "CARTAO_CREDITO" => Some(PiiType::CartaoCredito),
            "NOME_PESSOA" => Some(PiiType::NomePessoa),
            "ENDERECO" => Some(PiiType::Endereco),
            "DATA_NASCIMENTO" => Some(PiiType::DataNascimento),
            "PLACA_VEICULO" => Some(PiiType::PlacaVeiculo),
            "PASSAPORTE" => Some(PiiType::Passaporte),
            _ => None,
        }
    }
}

impl std::fmt::Display for PiiType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Estágio do pipeline que originou a detecção.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Regra do catálogo de padrões (regex preciso).
    Pattern,
    /// Regex agressivo suplementar — aceita números malformados/parciais.
    PatternAggressive,
    /// Regra contextual (palavra-chave + grupo de captura).
    Contextual,
    /// Varredura final anti-falso-negativo sobre o texto original.
    AntiFalseNegative,
    /// Hit de padrão cuja confiança foi elevada pelo modelo externo.
    Hybrid,
    /// Candidato vindo exclusivamente do modelo externo de NER.
    ExternalModel,
}

impl DetectionMethod {
    /// Nome canônico do método (idêntico à forma serializada).
    pub fn name(&self) -> &'static str {
        match self {
            DetectionMethod::Pattern => "pattern",
            DetectionMethod::PatternAggressive => "pattern_aggressive",
            DetectionMethod::Contextual => "contextual",
            DetectionMethod::AntiFalseNegative => "anti_false_negative",
            DetectionMethod::Hybrid => "hybrid",
            DetectionMethod::ExternalModel => "external_model",
        }
    }
}

/// Estado de validação matemática de uma entidade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    /// O tipo não possui validador (RG, placa, nome...).
    NotApplicable,
    Valid,
    Invalid,
    /// A etapa de validação não foi executada (config desligada).
    NotValidated,
}

/// Uma entidade de dado pessoal detectada no texto.
///
/// Os offsets `start`/`end` são posições de byte no texto original
/// (`start < end <= text.len()`), o que permite recortar o valor com
/// `&text[start..end]` e aplicar substituições sem re-busca.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "type")]
    pub pii_type: PiiType,
    pub value: String,
    pub start: usize,
    pub end: usize,
    /// Certeza do pipeline de que o span é mesmo do tipo declarado (0.0 a 1.0).
    pub confidence: f64,
    pub validation_status: ValidationStatus,
    pub validation_message: String,
    pub detection_method: DetectionMethod,
    /// Justificativa legível acumulada ao longo dos estágios.
    pub explanation: String,
}

impl Entity {
    /// Verifica se dois spans `[start, end)` se intersectam.
    pub fn overlaps(&self, other: &Entity) -> bool {
        !(self.end <= other.start || other.end <= self.start)
    }

    /// Interseção com um span arbitrário.
    pub fn overlaps_span(&self, start: usize, end: usize) -> bool {
        !(self.end <= start || end <= self.start)
    }
}

/// Contagens agregadas do resultado.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub total_entities: usize,
    pub by_type: HashMap<PiiType, usize>,
}

/// Metadados de execução do pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metadata {
    pub processing_time_ms: f64,
    pub text_length: usize,
    pub mode: DetectionMode,
    pub external_model_used: bool,
}

/// Resultado final de uma chamada de detecção.
///
/// Construído uma única vez por requisição; nenhum estágio posterior o muta.
/// Serializa como estrutura plana de primitivos e arrays (adequada a JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionResult {
    pub has_pii: bool,
    pub entities: Vec<Entity>,
    pub summary: Summary,
    pub metadata: Metadata,
}

impl DetectionResult {
    /// Resultado vazio para entrada vazia/apenas-espaços.
    pub fn empty(mode: DetectionMode) -> Self {
        DetectionResult {
            has_pii: false,
            entities: vec![],
            summary: Summary {
                total_entities: 0,
                by_type: HashMap::new(),
            },
            metadata: Metadata {
                processing_time_ms: 0.0,
                text_length: 0,
                mode,
                external_model_used: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(start: usize, end: usize) -> Entity {
        Entity {
            pii_type: PiiType::Cpf,
            value: String::new(),
            start,
            end,
            confidence: 0.9,
            validation_status: ValidationStatus::NotValidated,
            validation_message: String::new(),
            detection_method: DetectionMethod::Pattern,
            explanation: String::new(),
        }
    }

    #[test]
    fn test_overlap_detection() {
        assert!(entity(0, 10).overlaps(&entity(5, 15)));
        assert!(entity(5, 15).overlaps(&entity(0, 10)));
        assert!(!entity(0, 10).overlaps(&entity(10, 20)));
        assert!(!entity(10, 20).overlaps(&entity(0, 10)));
    }

    #[test]
    fn test_pii_type_roundtrip() {
        for pii_type in [
            PiiType::Cpf,
            PiiType::TituloEleitor,
            PiiType::NomePessoa,
            PiiType::PlacaVeiculo,
        ] {
            assert_eq!(PiiType::from_name(pii_type.name()), Some(pii_type));
        }
        assert_eq!(PiiType::from_name("DESCONHECIDO"), None);
    }

    #[test]
    fn test_serialization_is_flat() {
        let result = DetectionResult::empty(DetectionMode::Balanced);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["has_pii"], false);
        assert_eq!(json["summary"]["total_entities"], 0);
        assert_eq!(json["metadata"]["mode"], "balanced");
    }

    #[test]
    fn test_entity_json_type_field() {
        let mut e = entity(0, 3);
        e.pii_type = PiiType::TituloEleitor;
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["type"], "TITULO_ELEITOR");
        assert_eq!(json["detection_method"], "pattern");
    }
}
