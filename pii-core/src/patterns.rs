//! # Catálogo de Padrões — Regex para Dados Pessoais Brasileiros
//!
//! Registro imutável de regras de casamento tipadas, com múltiplas variações
//! de formatação por tipo para maximizar o recall. O catálogo é construído
//! uma única vez (padrões extras do chamador são incorporados na construção,
//! via [`PatternCatalogBuilder`]) e depois é somente-leitura: uma instância
//! pode ser compartilhada por qualquer número de requisições concorrentes.
//!
//! ## Deduplicação
//!
//! Regras diferentes frequentemente casam o mesmo trecho (um CPF sem
//! formatação também parece uma CNH de 11 dígitos). Após varrer todas as
//! regras, os candidatos são ordenados por `(start crescente, confiança
//! decrescente)` e mantidos gulosamente apenas se não sobrepõem nenhum
//! candidato já aceito — entre sobrepostos, vence o de maior confiança.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::DetectorError;
use crate::entity::PiiType;

/// Uma regra de casamento tipada do catálogo.
///
/// Imutável após a construção do catálogo.
#[derive(Debug)]
pub struct PatternRule {
    pub regex: Regex,
    pub pii_type: PiiType,
    pub description: &'static str,
    /// 1 = alta, 2 = média, 3 = baixa.
    pub priority: u8,
    /// Confiança-base atribuída a cada casamento desta regra.
    pub confidence: f64,
    /// O valor precisa passar por validação matemática posterior.
    pub requires_validation: bool,
}

/// Um candidato emitido pela varredura do catálogo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternMatch {
    pub pii_type: PiiType,
    pub value: String,
    pub start: usize,
    pub end: usize,
    pub confidence: f64,
    pub description: String,
    pub requires_validation: bool,
    pub priority: u8,
}

impl PatternMatch {
    fn overlaps(&self, other: &PatternMatch) -> bool {
        !(self.end <= other.start || other.end <= self.start)
    }
}

/// Definição estática de uma regra embutida:
/// (padrão, tipo, descrição, prioridade, requer_validação, confiança).
type RuleDef = (&'static str, PiiType, &'static str, u8, bool, f64);

/// Regras embutidas. As variações de formatação existem de propósito:
/// perder um CPF escrito com espaços custa mais que um falso positivo
/// filtrado depois pelo limiar de confiança.
const BUILTIN_RULES: &[RuleDef] = &[
    // --- CPF ---
    (r"\b\d{3}\.?\d{3}\.?\d{3}[-./]?\d{2}\b", PiiType::Cpf, "CPF padrão com ou sem formatação", 1, true, 0.9),
    (r"\b\d{3}\s\d{3}\s\d{3}\s\d{2}\b", PiiType::Cpf, "CPF com espaços", 1, true, 0.85),
    (r"\b\d{9}[-./]?\d{2}\b", PiiType::Cpf, "CPF sem separadores intermediários", 2, true, 0.8),
    // --- CNPJ ---
    (r"\b\d{2}\.?\d{3}\.?\d{3}/?0001[-.]?\d{2}\b", PiiType::Cnpj, "CNPJ matriz", 1, true, 0.95),
    (r"\b\d{2}\.?\d{3}\.?\d{3}/?\d{4}[-.]?\d{2}\b", PiiType::Cnpj, "CNPJ padrão", 1, true, 0.9),
    (r"\b\d{14}\b", PiiType::Cnpj, "CNPJ sem formatação", 2, true, 0.7),
    // --- Telefone / Celular ---
    (r"\(?\d{2}\)?\s*9?\d{4}[-.\s]?\d{4}\b", PiiType::Telefone, "Telefone com DDD", 1, true, 0.85),
    (r"\b(?:\+?55\s?)?\(?\d{2}\)?\s*9\d{4}[-.\s]?\d{4}\b", PiiType::Celular, "Celular com DDI opcional", 1, true, 0.9),
    (r"\b(?:\+?55\s?)?\(?\d{2}\)?\s*[2-5]\d{3}[-.\s]?\d{4}\b", PiiType::Telefone, "Telefone fixo", 1, true, 0.85),
    (r"\b9?\d{4}[-.\s]?\d{4}\b", PiiType::Telefone, "Telefone sem DDD", 3, false, 0.6),
    (r"\+55\s?\d{2}\s?\d{4,5}[-.\s]?\d{4}\b", PiiType::Telefone, "Telefone formato internacional", 1, true, 0.95),
    // --- Email ---
    (r"\b[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}\b", PiiType::Email, "Email padrão", 1, true, 0.95),
    (r"\b[a-zA-Z0-9._%+-]+\s*@\s*[a-zA-Z0-9.-]+\s*\.\s*[a-zA-Z]{2,}\b", PiiType::Email, "Email com espaços", 2, true, 0.8),
    (r"\b[a-zA-Z0-9._%+-]+\s*\[\s*@\s*\]\s*[a-zA-Z0-9.-]+\s*\.\s*[a-zA-Z]{2,}\b", PiiType::Email, "Email ofuscado com [@]", 2, false, 0.85),
    // --- CEP ---
    (r"\b\d{5}[-.\s]?\d{3}\b", PiiType::Cep, "CEP padrão", 1, true, 0.85),
    (r"\b\d{2}\.\d{3}[-.]?\d{3}\b", PiiType::Cep, "CEP com ponto no meio", 2, true, 0.75),
    // --- RG ---
    (r"\b\d{1,2}\.?\d{3}\.?\d{3}[-.]?[0-9xX]\b", PiiType::Rg, "RG padrão", 2, false, 0.7),
    (r"\b[A-Z]{2}[-.\s]?\d{2}\.?\d{3}\.?\d{3}\b", PiiType::Rg, "RG com UF", 1, false, 0.8),
    // --- CNH ---
    (r"\b\d{11}\b", PiiType::Cnh, "CNH (11 dígitos)", 3, false, 0.5),
    (r"\b\d{4}\s\d{4}\s\d{3}\b", PiiType::Cnh, "CNH formatada", 2, false, 0.6),
    // --- Título de eleitor ---
    (r"\b\d{4}\s\d{4}\s\d{4}\b", PiiType::TituloEleitor, "Título de eleitor (12 dígitos)", 2, false, 0.6),
    // --- PIS/PASEP ---
    (r"\b\d{3}\.?\d{5}\.?\d{2}[-.]?\d\b", PiiType::PisPasep, "PIS/PASEP", 2, false, 0.7),
    // --- Cartão de crédito ---
    (r"\b(?:4\d{3}|5[1-5]\d{2}|6011|3[47]\d{2})[-.\s]?\d{4}[-.\s]?\d{4}[-.\s]?\d{4}\b", PiiType::CartaoCredito, "Cartão de crédito (Visa, Master, Amex, Discover)", 1, false, 0.9),
    // --- Data de nascimento ---
    (r"\b(?:0[1-9]|[12]\d|3[01])[-/.](?:0[1-9]|1[0-2])[-/.](?:19|20)\d{2}\b", PiiType::DataNascimento, "Data DD/MM/AAAA", 2, false, 0.7),
    (r"\b(?:19|20)\d{2}[-/.](?:0[1-9]|1[0-2])[-/.](?:0[1-9]|[12]\d|3[01])\b", PiiType::DataNascimento, "Data AAAA-MM-DD", 2, false, 0.7),
    // --- Placa de veículo ---
    (r"(?i)\b[A-Z]{3}[-.\s]?\d{4}\b", PiiType::PlacaVeiculo, "Placa antiga AAA-1234", 1, false, 0.85),
    (r"(?i)\b[A-Z]{3}\d[A-Z]\d{2}\b", PiiType::PlacaVeiculo, "Placa Mercosul AAA1A23", 1, false, 0.9),
    // --- Passaporte ---
    (r"(?i)\b[A-Z]{2}\d{6}\b", PiiType::Passaporte, "Passaporte brasileiro", 2, false, 0.7),
];

/// Construtor do catálogo: regras embutidas + padrões extras do chamador.
///
/// Substitui o ponto de extensão mutável por incorporação na construção —
/// depois de `build()` o catálogo nunca mais muda.
#[derive(Debug)]
pub struct PatternCatalogBuilder {
    rules: Vec<PatternRule>,
}

impl PatternCatalogBuilder {
    fn new() -> Result<Self, DetectorError> {
        let mut rules = Vec::with_capacity(BUILTIN_RULES.len());
        for &(pattern, pii_type, description, priority, requires_validation, confidence) in
            BUILTIN_RULES
        {
            rules.push(PatternRule {
                regex: compile(pattern)?,
                pii_type,
                description,
                priority,
                confidence,
                requires_validation,
            });
        }
        Ok(PatternCatalogBuilder { rules })
    }

    /// Adiciona uma regra extra. A descrição é fixa porque regras extras
    /// são indistinguíveis das embutidas no restante do pipeline.
    pub fn extra_rule(
        mut self,
        pattern: &str,
        pii_type: PiiType,
        confidence: f64,
    ) -> Result<Self, DetectorError> {
        self.rules.push(PatternRule {
            regex: compile(pattern)?,
            pii_type,
            description: "Padrão customizado",
            priority: 2,
            confidence,
            requires_validation: false,
        });
        Ok(self)
    }

    pub fn build(self) -> PatternCatalog {
        PatternCatalog { rules: self.rules }
    }
}

fn compile(pattern: &str) -> Result<Regex, DetectorError> {
    Regex::new(pattern).map_err(|e| DetectorError::InvalidPattern(e.to_string()))
}

/// O catálogo de padrões compilado. Somente-leitura após a construção.
pub struct PatternCatalog {
    rules: Vec<PatternRule>,
}

impl PatternCatalog {
    /// Catálogo apenas com as regras embutidas.
    pub fn new() -> Self {
        // As regras embutidas são constantes testadas; falha aqui é bug do crate.
        PatternCatalogBuilder::new()
            .expect("regras embutidas devem compilar")
            .build()
    }

    pub fn builder() -> Result<PatternCatalogBuilder, DetectorError> {
        PatternCatalogBuilder::new()
    }

    /// Varre o texto com todas as regras e retorna os candidatos deduplicados.
    ///
    /// Garantia pós-condição: nenhum par de candidatos retornados se sobrepõe.
    pub fn find_all(&self, text: &str) -> Vec<PatternMatch> {
        let mut matches = Vec::new();

        for rule in &self.rules {
            for m in rule.regex.find_iter(text) {
                matches.push(PatternMatch {
                    pii_type: rule.pii_type,
                    value: m.as_str().to_string(),
                    start: m.start(),
                    end: m.end(),
                    confidence: rule.confidence,
                    description: rule.description.to_string(),
                    requires_validation: rule.requires_validation,
                    priority: rule.priority,
                });
            }
        }

        deduplicate(matches)
    }

    /// Varre o texto apenas com as regras de um tipo específico.
    pub fn find_by_type(&self, text: &str, pii_type: PiiType) -> Vec<PatternMatch> {
        let mut matches = Vec::new();

        for rule in self.rules.iter().filter(|r| r.pii_type == pii_type) {
            for m in rule.regex.find_iter(text) {
                matches.push(PatternMatch {
                    pii_type: rule.pii_type,
                    value: m.as_str().to_string(),
                    start: m.start(),
                    end: m.end(),
                    confidence: rule.confidence,
                    description: rule.description.to_string(),
                    requires_validation: rule.requires_validation,
                    priority: rule.priority,
                });
            }
        }

        deduplicate(matches)
    }

    /// Número de regras registradas (embutidas + extras).
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for PatternCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Ordena por `(start, -confiança)` e mantém gulosamente os não-sobrepostos.
fn deduplicate(mut matches: Vec<PatternMatch>) -> Vec<PatternMatch> {
    matches.sort_by(|a, b| {
        a.start.cmp(&b.start).then(
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal),
        )
    });

    let mut result: Vec<PatternMatch> = Vec::new();
    for m in matches {
        if !result.iter().any(|kept| kept.overlaps(&m)) {
            result.push(m);
        }
    }
    result
}
