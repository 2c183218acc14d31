//! # Orquestrador de Detecção — Pipeline Multi-Estágio
//!
//! O detector coordena os seis estágios da cascata de detecção e emite
//! eventos de progresso via um canal Rust (`mpsc`), permitindo que um
//! observador acompanhe o que cada estágio produziu — o substituto do
//! logger global: todo diagnóstico sai pelo canal injetado.
//!
//! ## Estágios (por requisição)
//!
//! 1. **Padrões**: varredura do catálogo de regex + padrões agressivos.
//! 2. **Modelo externo** (opcional): candidatos do NER neural injetado.
//! 3. **Fusão**: padrões são autoridade de span; o modelo só eleva
//!    confiança (híbrido) ou acrescenta spans disjuntos.
//! 4. **Anti-falso-negativo** (opcional): re-varredura do texto *original*
//!    com o catálogo contextual + regras de proximidade de palavra-chave.
//! 5. **Validação** (opcional): matemática de dígitos verificadores.
//! 6. **Limiares**: corte de confiança por tipo, conforme o modo.
//!
//! O fluxo é estritamente para frente; nenhum estágio muta os catálogos
//! compartilhados, então uma única instância atende chamadas concorrentes
//! ilimitadas.

use std::collections::HashMap;
use std::sync::mpsc;
use std::time::Instant;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::{DetectionConfig, DetectionMode, DetectorError};
use crate::contextual::{is_plausible_name, ContextualCatalog};
use crate::entity::{
    DetectionMethod, DetectionResult, Entity, Metadata, PiiType, Summary, ValidationStatus,
};
use crate::model::{ExternalEntityModel, NoopModel};
use crate::patterns::{PatternCatalog, PatternMatch};
use crate::validators::Validators;

/// Eventos emitidos pelo pipeline durante o processamento.
///
/// Cada estágio reporta quantos candidatos produziu ou descartou; o evento
/// final `Done` carrega o resultado consolidado.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum DetectionEvent {
    /// **Estágio 1**: catálogo de padrões varrido.
    PatternStage { candidates: usize },
    /// **Estágio 1b**: padrões agressivos suplementares.
    AggressiveStage { added: usize },
    /// **Estágio 2**: modelo externo consultado.
    ModelStage { candidates: usize },
    /// O modelo externo falhou; a requisição segue sem esses candidatos.
    ModelFailed { message: String },
    /// **Estágio 3**: fusão concluída.
    FusionDone { total: usize },
    /// **Estágio 4**: varredura anti-falso-negativo.
    AntiFalseNegativeDone { added: usize },
    /// **Estágio 5**: validação matemática.
    ValidationDone { kept: usize, discarded: usize },
    /// Uma entidade caiu no corte de limiar.
    EntityDiscarded {
        pii_type: PiiType,
        value: String,
        confidence: f64,
        threshold: f64,
    },
    /// **Estágio 6**: limiares aplicados.
    ThresholdDone { kept: usize, discarded: usize },
    /// **Conclusão**: resultado final.
    Done { result: DetectionResult },
}

/// Construtor do detector: configuração, padrões extras e modelo injetado.
pub struct PiiDetectorBuilder {
    config: DetectionConfig,
    extra_rules: Vec<(String, PiiType, f64)>,
    model: Box<dyn ExternalEntityModel>,
    model_injected: bool,
}

impl PiiDetectorBuilder {
    pub fn new(mode: DetectionMode) -> Self {
        PiiDetectorBuilder {
            config: DetectionConfig::for_mode(mode),
            extra_rules: vec![],
            model: Box::new(NoopModel),
            model_injected: false,
        }
    }

    /// Substitui o preset por uma configuração customizada.
    pub fn config(mut self, config: DetectionConfig) -> Self {
        self.config = config;
        self
    }

    /// Registra um padrão regex extra, incorporado ao catálogo na construção.
    pub fn extra_pattern(mut self, pattern: &str, pii_type: PiiType, confidence: f64) -> Self {
        self.extra_rules
            .push((pattern.to_string(), pii_type, confidence));
        self
    }

    /// Injeta o modelo externo de NER.
    pub fn model(mut self, model: Box<dyn ExternalEntityModel>) -> Self {
        self.model = model;
        self.model_injected = true;
        self
    }

    pub fn build(self) -> Result<PiiDetector, DetectorError> {
        self.config.validate()?;

        let mut builder = PatternCatalog::builder()?;
        for (pattern, pii_type, confidence) in &self.extra_rules {
            builder = builder.extra_rule(pattern, *pii_type, *confidence)?;
        }

        Ok(PiiDetector {
            config: self.config,
            patterns: builder.build(),
            contextual: ContextualCatalog::new(),
            validators: Validators::new(),
            model: self.model,
            model_injected: self.model_injected,
            aggressive: AggressivePatterns::new(),
        })
    }
}

/// Regex soltos de propósito, compilados uma vez na construção do detector.
///
/// Aceitam grupos de dígitos que as regras precisas rejeitam (números
/// malformados ou parciais) e as três regras fixas de proximidade de
/// palavra-chave do passo anti-falso-negativo.
struct AggressivePatterns {
    cpf: Regex,
    phone: Regex,
    number_keyword: Regex,
    cpf_keyword: Regex,
    honorific_name: Regex,
}

impl AggressivePatterns {
    fn new() -> Self {
        AggressivePatterns {
            cpf: Regex::new(r"\b(?:\d{3}[\.\-\s]?){2}\d{3}[\.\-\s]?\d{2}?\b")
                .expect("regex agressivo de CPF deve compilar"),
            phone: Regex::new(r"\b(?:\d{4,5}[-\s]?\d{4}|\d{2}\)\s?\d{4,5}[-\s]?\d{4})\b")
                .expect("regex agressivo de telefone deve compilar"),
            number_keyword: Regex::new(
                r"(?i)\b(?:número|numero|telefone|celular|fone|contato)[\s:]+(\d{4,5}[-\s]?\d{4})\b",
            )
            .expect("regex de número-após-palavra-chave deve compilar"),
            cpf_keyword: Regex::new(r"(?i)\b(?:cpf|c\.p\.f\.?|cadastro)[\s:]+([0-9.\-\s]{8,18})")
                .expect("regex de CPF-após-palavra-chave deve compilar"),
            honorific_name: Regex::new(
                r"\b(?:[Ss]r\.?|[Ss]ra\.?|[Ss]enhora?|[Dd]outora?|[Dd]r\.?|[Dd]ra\.?)\s+([A-Z][a-záàâãéèêíïóôõöúçñ]+(?:\s+[A-Z][a-záàâãéèêíïóôõöúçñ]+){1,4})\b",
            )
            .expect("regex de nome-após-honorífico deve compilar"),
        }
    }
}

/// O detector de dados pessoais.
///
/// Imutável após a construção: catálogos, validadores e configuração são
/// somente-leitura, então a mesma instância é segura para chamadas
/// `detect` concorrentes de múltiplas threads.
///
/// # Exemplo
///
/// ```rust
/// use pii_core::{DetectionMode, PiiDetector};
///
/// let detector = PiiDetector::new(DetectionMode::Balanced);
/// let result = detector.detect("Meu CPF é 529.982.247-25");
/// assert!(result.has_pii);
/// ```
pub struct PiiDetector {
    config: DetectionConfig,
    patterns: PatternCatalog,
    contextual: ContextualCatalog,
    validators: Validators,
    model: Box<dyn ExternalEntityModel>,
    model_injected: bool,
    aggressive: AggressivePatterns,
}

impl PiiDetector {
    /// Cria o detector com o preset canônico do modo dado.
    pub fn new(mode: DetectionMode) -> Self {
        // Presets e regras embutidas são válidos por construção
        PiiDetectorBuilder::new(mode)
            .build()
            .expect("preset canônico deve construir")
    }

    /// Resolve um nome de modo e constrói o detector.
    ///
    /// Falha imediatamente para modos desconhecidos — nunca assume um padrão.
    pub fn from_mode(mode: &str) -> Result<Self, DetectorError> {
        Ok(PiiDetector::new(mode.parse()?))
    }

    /// Constrói a partir de uma configuração totalmente customizada.
    pub fn with_config(config: DetectionConfig) -> Result<Self, DetectorError> {
        PiiDetectorBuilder::new(config.mode).config(config).build()
    }

    pub fn builder(mode: DetectionMode) -> PiiDetectorBuilder {
        PiiDetectorBuilder::new(mode)
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Executa o pipeline completo e retorna o resultado consolidado.
    pub fn detect(&self, text: &str) -> DetectionResult {
        let (tx, rx) = mpsc::channel();
        self.detect_streaming(text, tx);

        let mut result = DetectionResult::empty(self.config.mode);
        while let Ok(event) = rx.recv() {
            if let DetectionEvent::Done { result: r } = event {
                result = r;
            }
        }
        result
    }

    /// Executa o pipeline emitindo eventos de progresso pelo canal `tx`.
    ///
    /// Entrada vazia ou só de espaços é um caso degenerado, não um erro:
    /// nenhum estágio executa e o resultado sai vazio com `has_pii = false`.
    pub fn detect_streaming(&self, text: &str, tx: mpsc::Sender<DetectionEvent>) {
        let start = Instant::now();

        if text.trim().is_empty() {
            let _ = tx.send(DetectionEvent::Done {
                result: DetectionResult::empty(self.config.mode),
            });
            return;
        }

        // === Estágio 1: catálogo de padrões ===
        let mut entities = self.pattern_stage(text);
        let _ = tx.send(DetectionEvent::PatternStage {
            candidates: entities.len(),
        });

        // === Estágio 1b: padrões agressivos ===
        let added = self.aggressive_stage(text, &mut entities);
        let _ = tx.send(DetectionEvent::AggressiveStage { added });

        // === Estágio 2: modelo externo ===
        let model_hits = if self.config.use_external_model {
            match self.model.extract(text) {
                Ok(spans) => {
                    let hits = self.model_spans_to_entities(text, spans);
                    let _ = tx.send(DetectionEvent::ModelStage {
                        candidates: hits.len(),
                    });
                    hits
                }
                Err(e) => {
                    let _ = tx.send(DetectionEvent::ModelFailed {
                        message: e.to_string(),
                    });
                    vec![]
                }
            }
        } else {
            vec![]
        };

        // === Estágio 3: fusão ===
        let mut merged = merge_detections(entities, model_hits);
        let _ = tx.send(DetectionEvent::FusionDone {
            total: merged.len(),
        });

        // === Estágio 4: anti-falso-negativo ===
        if self.config.use_contextual {
            let added = self.anti_false_negative_stage(text, &mut merged);
            let _ = tx.send(DetectionEvent::AntiFalseNegativeDone { added });
        }

        // === Estágio 5: validação matemática ===
        let validated = if self.config.validate_documents {
            let before = merged.len();
            let validated = self.validation_stage(merged);
            let _ = tx.send(DetectionEvent::ValidationDone {
                kept: validated.len(),
                discarded: before - validated.len(),
            });
            validated
        } else {
            merged
        };

        // === Estágio 6: limiares de confiança ===
        let before = validated.len();
        let mut filtered = self.threshold_stage(validated, &tx);
        let _ = tx.send(DetectionEvent::ThresholdDone {
            kept: filtered.len(),
            discarded: before - filtered.len(),
        });

        filtered.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));

        let mut by_type: HashMap<PiiType, usize> = HashMap::new();
        for entity in &filtered {
            *by_type.entry(entity.pii_type).or_insert(0) += 1;
        }

        let result = DetectionResult {
            has_pii: !filtered.is_empty(),
            summary: Summary {
                total_entities: filtered.len(),
                by_type,
            },
            metadata: Metadata {
                processing_time_ms: start.elapsed().as_secs_f64() * 1000.0,
                text_length: text.len(),
                mode: self.config.mode,
                external_model_used: self.model_injected && self.config.use_external_model,
            },
            entities: filtered,
        };

        let _ = tx.send(DetectionEvent::Done { result });
    }

    fn pattern_stage(&self, text: &str) -> Vec<Entity> {
        self.patterns
            .find_all(text)
            .into_iter()
            .map(entity_from_pattern)
            .collect()
    }

    /// Acrescenta hits dos regex agressivos, a menos que uma entidade já
    /// exista com o mesmo valor exato **ou** span sobreposto (o valor-só do
    /// original subdeduplicava quando o mesmo número aparecia com espaçamento
    /// diferente).
    fn aggressive_stage(&self, text: &str, entities: &mut Vec<Entity>) -> usize {
        let mut added = 0;

        for m in self.aggressive.cpf.find_iter(text) {
            let digits = count_digits(m.as_str());
            if (9..=11).contains(&digits)
                && !is_known(entities, m.as_str(), m.start(), m.end())
            {
                entities.push(Entity {
                    pii_type: PiiType::Cpf,
                    value: m.as_str().to_string(),
                    start: m.start(),
                    end: m.end(),
                    confidence: 0.7,
                    validation_status: ValidationStatus::NotValidated,
                    validation_message: String::new(),
                    detection_method: DetectionMethod::PatternAggressive,
                    explanation: "Padrão agressivo de CPF detectado".to_string(),
                });
                added += 1;
            }
        }

        for m in self.aggressive.phone.find_iter(text) {
            let digits = count_digits(m.as_str());
            if (8..=11).contains(&digits)
                && !is_known(entities, m.as_str(), m.start(), m.end())
            {
                entities.push(Entity {
                    pii_type: PiiType::Telefone,
                    value: m.as_str().to_string(),
                    start: m.start(),
                    end: m.end(),
                    confidence: 0.75,
                    validation_status: ValidationStatus::NotValidated,
                    validation_message: String::new(),
                    detection_method: DetectionMethod::PatternAggressive,
                    explanation: "Padrão agressivo de telefone detectado".to_string(),
                });
                added += 1;
            }
        }

        added
    }

    fn model_spans_to_entities(
        &self,
        text: &str,
        spans: Vec<crate::model::ModelSpan>,
    ) -> Vec<Entity> {
        spans
            .into_iter()
            .filter_map(|span| {
                // Spans vazios, fora do texto ou fora de fronteira de caractere
                // são do adaptador do modelo, não nossos: descarta em silêncio
                if span.start >= span.end {
                    return None;
                }
                let value = text.get(span.start..span.end)?;
                Some(Entity {
                    pii_type: span.pii_type,
                    value: value.to_string(),
                    start: span.start,
                    end: span.end,
                    confidence: span.confidence.clamp(0.0, 1.0),
                    validation_status: ValidationStatus::NotValidated,
                    validation_message: String::new(),
                    detection_method: DetectionMethod::ExternalModel,
                    explanation: "Entidade detectada por modelo externo de NER".to_string(),
                })
            })
            .collect()
    }

    /// Varredura final sobre o texto original: catálogo contextual + três
    /// regras fixas de proximidade de palavra-chave. Um candidato só entra
    /// se nenhuma entidade existente tiver o mesmo valor exato ou span
    /// sobreposto.
    fn anti_false_negative_stage(&self, text: &str, entities: &mut Vec<Entity>) -> usize {
        let mut added = 0;

        for m in self.contextual.find_contextual(text) {
            if is_known(entities, &m.value, m.start, m.end) {
                continue;
            }
            let context: String = m.full_context.chars().take(50).collect();
            entities.push(Entity {
                pii_type: m.pii_type,
                value: m.value,
                start: m.start,
                end: m.end,
                confidence: m.confidence,
                validation_status: ValidationStatus::NotValidated,
                validation_message: String::new(),
                detection_method: DetectionMethod::Contextual,
                explanation: format!("Detectado por contexto: '{}...'", context),
            });
            added += 1;
        }

        // 1. "meu número é 9XXXX-XXXX"
        for caps in self.aggressive.number_keyword.captures_iter(text) {
            if let Some(group) = caps.get(1) {
                if !is_known(entities, group.as_str(), group.start(), group.end()) {
                    entities.push(Entity {
                        pii_type: PiiType::Telefone,
                        value: group.as_str().to_string(),
                        start: group.start(),
                        end: group.end(),
                        confidence: 0.88,
                        validation_status: ValidationStatus::NotValidated,
                        validation_message: String::new(),
                        detection_method: DetectionMethod::AntiFalseNegative,
                        explanation: "Contexto explícito de telefone detectado".to_string(),
                    });
                    added += 1;
                }
            }
        }

        // 2. "meu CPF é XXX" mesmo com o número incompleto
        for caps in self.aggressive.cpf_keyword.captures_iter(text) {
            if let Some(group) = caps.get(1) {
                let value = group.as_str().trim();
                if count_digits(value) >= 9 && !is_known(entities, value, group.start(), group.end())
                {
                    entities.push(Entity {
                        pii_type: PiiType::Cpf,
                        value: value.to_string(),
                        start: group.start(),
                        end: group.start() + value.len(),
                        confidence: 0.85,
                        validation_status: ValidationStatus::NotValidated,
                        validation_message: String::new(),
                        detection_method: DetectionMethod::AntiFalseNegative,
                        explanation: "Menção explícita de CPF no contexto".to_string(),
                    });
                    added += 1;
                }
            }
        }

        // 3. nome capitalizado após pronome de tratamento
        for caps in self.aggressive.honorific_name.captures_iter(text) {
            if let Some(group) = caps.get(1) {
                let value = group.as_str();
                if is_plausible_name(value)
                    && !is_known(entities, value, group.start(), group.end())
                {
                    entities.push(Entity {
                        pii_type: PiiType::NomePessoa,
                        value: value.to_string(),
                        start: group.start(),
                        end: group.end(),
                        confidence: 0.75,
                        validation_status: ValidationStatus::NotValidated,
                        validation_message: String::new(),
                        detection_method: DetectionMethod::AntiFalseNegative,
                        explanation: "Nome detectado após palavra-chave de tratamento".to_string(),
                    });
                    added += 1;
                }
            }
        }

        added
    }

    /// Máquina de estados da validação:
    /// - sem validador → `NotApplicable`, mantém;
    /// - válido → confiança vira `max(atual, validador)`, mantém;
    /// - inválido e tipo com checksum (CPF/CNPJ) → modo strict reduz a
    ///   confiança à metade e mantém com aviso; balanced/precise descartam;
    /// - inválido e qualquer outro tipo → mantém inalterado (não há regra
    ///   de rejeição dura sem checksum).
    fn validation_stage(&self, entities: Vec<Entity>) -> Vec<Entity> {
        let mut validated = Vec::with_capacity(entities.len());

        for mut entity in entities {
            let validator = match self.validators.for_type(entity.pii_type) {
                Some(v) => v,
                None => {
                    entity.validation_status = ValidationStatus::NotApplicable;
                    validated.push(entity);
                    continue;
                }
            };

            let result = validator.validate(&entity.value);
            entity.validation_message = result.message.clone();

            if result.is_valid {
                entity.validation_status = ValidationStatus::Valid;
                entity.confidence = entity.confidence.max(result.confidence);
                entity.explanation.push_str(&format!(" | Validação: {}", result.message));
                validated.push(entity);
            } else if matches!(entity.pii_type, PiiType::Cpf | PiiType::Cnpj) {
                if self.config.mode == DetectionMode::Strict {
                    entity.validation_status = ValidationStatus::Invalid;
                    entity.confidence *= 0.5;
                    entity.explanation.push_str(&format!(" | AVISO: {}", result.message));
                    validated.push(entity);
                }
                // balanced/precise: CPF/CNPJ reprovado no checksum é descartado
            } else {
                entity.validation_status = ValidationStatus::Invalid;
                validated.push(entity);
            }
        }

        validated
    }

    fn threshold_stage(
        &self,
        entities: Vec<Entity>,
        tx: &mpsc::Sender<DetectionEvent>,
    ) -> Vec<Entity> {
        let mut filtered = Vec::with_capacity(entities.len());

        for entity in entities {
            let threshold = self.config.threshold_for(entity.pii_type);
            if entity.confidence >= threshold {
                filtered.push(entity);
            } else {
                let _ = tx.send(DetectionEvent::EntityDiscarded {
                    pii_type: entity.pii_type,
                    value: entity.value,
                    confidence: entity.confidence,
                    threshold,
                });
            }
        }

        filtered
    }
}

/// Fusão dos candidatos de padrão com os do modelo externo.
///
/// A camada de padrões é autoridade sobre fronteiras de span: todo hit de
/// padrão entra incondicionalmente. Um hit do modelo que sobrepõe um hit de
/// padrão é redundante e cai fora — mas, se sua confiança for maior, o hit
/// de padrão herda essa confiança e vira `Hybrid`. Hits do modelo sem
/// sobreposição entram como entidades independentes.
fn merge_detections(pattern_hits: Vec<Entity>, model_hits: Vec<Entity>) -> Vec<Entity> {
    let mut merged = pattern_hits;

    for model_hit in model_hits {
        let mut redundant = false;
        for kept in merged.iter_mut() {
            if kept.overlaps(&model_hit) {
                redundant = true;
                if model_hit.confidence > kept.confidence {
                    kept.confidence = model_hit.confidence;
                    kept.detection_method = DetectionMethod::Hybrid;
                }
                break;
            }
        }
        if !redundant {
            merged.push(model_hit);
        }
    }

    merged
}

fn entity_from_pattern(m: PatternMatch) -> Entity {
    Entity {
        pii_type: m.pii_type,
        value: m.value,
        start: m.start,
        end: m.end,
        confidence: m.confidence,
        validation_status: ValidationStatus::NotValidated,
        validation_message: String::new(),
        detection_method: DetectionMethod::Pattern,
        explanation: m.description,
    }
}

fn count_digits(s: &str) -> usize {
    s.chars().filter(|c| c.is_ascii_digit()).count()
}

/// Já existe uma entidade com o mesmo valor exato ou span sobreposto?
fn is_known(entities: &[Entity], value: &str, start: usize, end: usize) -> bool {
    entities
        .iter()
        .any(|e| e.value == value || e.overlaps_span(start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ModelError, ModelSpan};

    struct FakeModel {
        spans: Vec<ModelSpan>,
    }

    impl ExternalEntityModel for FakeModel {
        fn extract(&self, _text: &str) -> Result<Vec<ModelSpan>, ModelError> {
            Ok(self.spans.clone())
        }
    }

    struct FailingModel;

    impl ExternalEntityModel for FailingModel {
        fn extract(&self, _text: &str) -> Result<Vec<ModelSpan>, ModelError> {
            Err("conexão recusada".into())
        }
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        let detector = PiiDetector::new(DetectionMode::Balanced);
        for text in ["", "   \n\t "] {
            let result = detector.detect(text);
            assert!(!result.has_pii);
            assert!(result.entities.is_empty());
            assert_eq!(result.summary.total_entities, 0);
        }
    }

    #[test]
    fn test_multi_type_scenario() {
        let detector = PiiDetector::new(DetectionMode::Balanced);
        let result = detector.detect("CPF: 123.456.789-09, Email: a@b.com");
        assert!(result.has_pii);
        assert!(result.entities.len() >= 2);
        let types: Vec<PiiType> = result.entities.iter().map(|e| e.pii_type).collect();
        assert!(types.contains(&PiiType::Cpf));
        assert!(types.contains(&PiiType::Email));
    }

    #[test]
    fn test_entity_bounds_and_confidence_invariants() {
        let detector = PiiDetector::new(DetectionMode::Strict);
        let texts = [
            "Meu CPF é 123.456.789-09 e meu telefone (61) 99999-8888",
            "Sr. Carlos Eduardo da Silva, residente na Rua das Flores, 123",
            "Contato: celular 11 98765-4321 ou fixo (11) 3456-7890",
            "Email: maria@exemplo.com e CEP 70000-000",
        ];
        for text in texts {
            let result = detector.detect(text);
            for e in &result.entities {
                assert!(e.start < e.end, "span vazio em {:?}", e);
                assert!(e.end <= text.len());
                assert!((0.0..=1.0).contains(&e.confidence));
            }
        }
    }

    #[test]
    fn test_no_same_type_overlap() {
        let detector = PiiDetector::new(DetectionMode::Strict);
        let result = detector
            .detect("CPF 529.982.247-25, cadastro: 529.982.247-25, fone (61) 99999-8888");
        for (i, a) in result.entities.iter().enumerate() {
            for b in result.entities.iter().skip(i + 1) {
                if a.pii_type == b.pii_type {
                    assert!(!a.overlaps(b), "{:?} sobrepõe {:?}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_determinism() {
        let detector = PiiDetector::new(DetectionMode::Balanced);
        let text = "Sr. João Silva, CPF 529.982.247-25, fone (61) 99999-8888, joao@ex.com.br";
        let a = detector.detect(text);
        let b = detector.detect(text);
        assert_eq!(a.entities.len(), b.entities.len());
        for (x, y) in a.entities.iter().zip(b.entities.iter()) {
            assert_eq!(x.value, y.value);
            assert_eq!(x.pii_type, y.pii_type);
            assert_eq!(x.start, y.start);
            assert_eq!(x.confidence, y.confidence);
        }
    }

    #[test]
    fn test_recall_ordering_strict_vs_precise() {
        let strict = PiiDetector::new(DetectionMode::Strict);
        let precise = PiiDetector::new(DetectionMode::Precise);
        let text = "Número: 99999-8888";
        assert!(strict.detect(text).entities.len() >= precise.detect(text).entities.len());
    }

    #[test]
    fn test_monotonic_thresholding() {
        let text = "CPF 123.456.789-09, fone (61) 99999-8888, maria@exemplo.com, CEP 70000-100";
        let base = PiiDetector::new(DetectionMode::Balanced);
        let baseline = base.detect(text).entities.len();

        let mut raised = DetectionConfig::for_mode(DetectionMode::Balanced);
        for value in raised.thresholds.values_mut() {
            *value = (*value + 0.3).min(1.0);
        }
        raised.default_threshold = (raised.default_threshold + 0.3).min(1.0);
        let stricter = PiiDetector::with_config(raised).unwrap();
        assert!(stricter.detect(text).entities.len() <= baseline);
    }

    #[test]
    fn test_invalid_cpf_discarded_in_balanced_kept_in_strict() {
        // 111.111.111-11 cai na regra de dígitos repetidos
        let text = "documento 111.111.111-11 anexo";

        let balanced = PiiDetector::new(DetectionMode::Balanced);
        assert!(balanced
            .detect(text)
            .entities
            .iter()
            .all(|e| e.pii_type != PiiType::Cpf));

        let strict = PiiDetector::new(DetectionMode::Strict);
        let result = strict.detect(text);
        let cpf = result.entities.iter().find(|e| e.pii_type == PiiType::Cpf);
        if let Some(cpf) = cpf {
            assert_eq!(cpf.validation_status, ValidationStatus::Invalid);
            assert!(cpf.explanation.contains("AVISO"));
        }
    }

    #[test]
    fn test_valid_cpf_gets_confidence_lift() {
        let detector = PiiDetector::new(DetectionMode::Balanced);
        let result = detector.detect("CPF 529.982.247-25");
        let cpf = result
            .entities
            .iter()
            .find(|e| e.pii_type == PiiType::Cpf)
            .expect("CPF válido deve sobreviver");
        assert_eq!(cpf.validation_status, ValidationStatus::Valid);
        assert!(cpf.confidence >= 0.98);
    }

    #[test]
    fn test_fusion_hybrid_lift() {
        let text = "CPF 529.982.247-25";
        // O span do CPF no texto: "529.982.247-25" começa no byte 4
        let model = FakeModel {
            spans: vec![ModelSpan {
                pii_type: PiiType::Cpf,
                start: 4,
                end: 18,
                confidence: 0.99,
            }],
        };
        let detector = PiiDetector::builder(DetectionMode::Balanced)
            .model(Box::new(model))
            .build()
            .unwrap();

        let result = detector.detect(text);
        let cpf = result
            .entities
            .iter()
            .find(|e| e.pii_type == PiiType::Cpf)
            .unwrap();
        assert_eq!(cpf.detection_method, DetectionMethod::Hybrid);
        assert!(cpf.confidence >= 0.99);
        assert!(result.metadata.external_model_used);
    }

    #[test]
    fn test_fusion_appends_disjoint_model_hit() {
        let text = "Requerente informou os dados de Ystephanye em anexo";
        let start = text.find("Ystephanye").unwrap();
        let model = FakeModel {
            spans: vec![ModelSpan {
                pii_type: PiiType::NomePessoa,
                start,
                end: start + "Ystephanye".len(),
                confidence: 0.9,
            }],
        };
        let detector = PiiDetector::builder(DetectionMode::Balanced)
            .model(Box::new(model))
            .build()
            .unwrap();

        let result = detector.detect(text);
        let name = result
            .entities
            .iter()
            .find(|e| e.pii_type == PiiType::NomePessoa)
            .expect("hit disjunto do modelo deve entrar");
        assert_eq!(name.detection_method, DetectionMethod::ExternalModel);
        assert_eq!(name.value, "Ystephanye");
    }

    #[test]
    fn test_degenerate_model_spans_dropped() {
        let text = "Requerente anexou os documentos solicitados";
        // span vazio, span invertido e span além do fim do texto
        let model = FakeModel {
            spans: vec![
                ModelSpan {
                    pii_type: PiiType::NomePessoa,
                    start: 5,
                    end: 5,
                    confidence: 0.99,
                },
                ModelSpan {
                    pii_type: PiiType::NomePessoa,
                    start: 10,
                    end: 3,
                    confidence: 0.99,
                },
                ModelSpan {
                    pii_type: PiiType::NomePessoa,
                    start: 0,
                    end: text.len() + 7,
                    confidence: 0.99,
                },
            ],
        };
        let detector = PiiDetector::builder(DetectionMode::Balanced)
            .model(Box::new(model))
            .build()
            .unwrap();

        let result = detector.detect(text);
        for e in &result.entities {
            assert!(e.start < e.end, "span degenerado sobreviveu: {:?}", e);
            assert!(e.end <= text.len());
            assert!(!e.value.is_empty());
        }
        assert!(result
            .entities
            .iter()
            .all(|e| e.pii_type != PiiType::NomePessoa));
    }

    #[test]
    fn test_model_failure_degrades_gracefully() {
        let detector = PiiDetector::builder(DetectionMode::Balanced)
            .model(Box::new(FailingModel))
            .build()
            .unwrap();

        let (tx, rx) = mpsc::channel();
        detector.detect_streaming("CPF 529.982.247-25", tx);
        let events: Vec<DetectionEvent> = rx.try_iter().collect();

        assert!(events
            .iter()
            .any(|e| matches!(e, DetectionEvent::ModelFailed { .. })));
        let done = events.last().unwrap();
        if let DetectionEvent::Done { result } = done {
            assert!(result.has_pii, "padrões seguem funcionando sem o modelo");
        } else {
            panic!("último evento deve ser Done");
        }
    }

    #[test]
    fn test_unknown_mode_fails() {
        assert!(PiiDetector::from_mode("turbo").is_err());
        assert!(PiiDetector::from_mode("strict").is_ok());
    }

    #[test]
    fn test_streaming_event_order() {
        let detector = PiiDetector::new(DetectionMode::Balanced);
        let (tx, rx) = mpsc::channel();
        detector.detect_streaming("Meu CPF é 123.456.789-09", tx);
        let events: Vec<DetectionEvent> = rx.try_iter().collect();

        assert!(matches!(events[0], DetectionEvent::PatternStage { .. }));
        assert!(matches!(events.last().unwrap(), DetectionEvent::Done { .. }));
    }

    #[test]
    fn test_anti_fn_catches_keyword_proximate_name() {
        let detector = PiiDetector::new(DetectionMode::Balanced);
        let result = detector.detect("Atendimento prestado ao Sr. Carlos Eduardo Silva ontem");
        assert!(result
            .entities
            .iter()
            .any(|e| e.pii_type == PiiType::NomePessoa && e.value.contains("Carlos")));
    }

    #[test]
    fn test_counts_by_type_groups_contextual_with_base() {
        let detector = PiiDetector::new(DetectionMode::Strict);
        let result = detector.detect("CPF: 529.982.247-25 e cadastro 987.654.321-00");
        let cpf_count = result.summary.by_type.get(&PiiType::Cpf).copied().unwrap_or(0);
        let total: usize = result.summary.by_type.values().sum();
        assert_eq!(total, result.summary.total_entities);
        assert!(cpf_count >= 1);
    }
}
