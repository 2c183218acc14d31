//! # Configuração do Detector — Modos e Limiares
//!
//! Define os modos de operação do detector e os limiares de confiança
//! por tipo de dado. A configuração é imutável após a construção do
//! detector: trocar de modo exige instanciar um novo detector.
//!
//! ## Modos Disponíveis
//!
//! | Modo     | Postura                                   | min_confidence |
//! |----------|-------------------------------------------|----------------|
//! | strict   | Recall máximo — captura tudo que parecer  | 0.3            |
//! | balanced | Equilíbrio recall/precisão (padrão)       | 0.5            |
//! | precise  | Precisão máxima — menos falsos positivos  | 0.7            |

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::entity::PiiType;

/// Erros fatais de construção do detector.
///
/// São os únicos erros que o núcleo propaga: modo desconhecido ou limiar
/// fora de [0,1]. Tudo o mais (validação, modelo externo, entrada vazia)
/// é recuperado localmente sem abortar o pipeline.
#[derive(Debug, Error)]
pub enum DetectorError {
    #[error("modo de detecção desconhecido: '{0}' (esperado: strict, balanced ou precise)")]
    UnknownMode(String),
    #[error("limiar inválido para {pii_type:?}: {value} (esperado valor em [0,1])")]
    InvalidThreshold { pii_type: PiiType, value: f64 },
    #[error("padrão extra inválido: {0}")]
    InvalidPattern(String),
}

/// Modo de operação do detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// **Ultra sensível**: limiares baixos, mantém até CPF/CNPJ com dígito
    /// verificador errado (com confiança reduzida). Prioriza não perder nada.
    Strict,
    /// **Equilibrado**: limiares moderados. É o padrão.
    Balanced,
    /// **Preciso**: limiares altos, descarta tudo que não tiver confiança forte.
    Precise,
}

impl Default for DetectionMode {
    fn default() -> Self {
        DetectionMode::Balanced
    }
}

impl DetectionMode {
    /// Nome do modo como string (para serialização e mensagens).
    pub fn name(&self) -> &'static str {
        match self {
            DetectionMode::Strict => "strict",
            DetectionMode::Balanced => "balanced",
            DetectionMode::Precise => "precise",
        }
    }
}

impl FromStr for DetectionMode {
    type Err = DetectorError;

    /// Resolve um nome de modo. Falha imediatamente para nomes desconhecidos —
    /// nunca cai silenciosamente em um modo padrão.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(DetectionMode::Strict),
            "balanced" => Ok(DetectionMode::Balanced),
            "precise" => Ok(DetectionMode::Precise),
            other => Err(DetectorError::UnknownMode(other.to_string())),
        }
    }
}

/// Configuração completa de uma instância do detector.
///
/// Imutável por instância. Os três presets canônicos vêm de
/// [`DetectionConfig::for_mode`]; um chamador também pode montar uma
/// configuração totalmente customizada e validá-la com [`DetectionConfig::validate`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub mode: DetectionMode,
    /// Piso global de confiança (limiares por tipo têm precedência).
    pub min_confidence: f64,
    /// Limiares de sobrevivência por tipo de dado.
    pub thresholds: HashMap<PiiType, f64>,
    /// Limiar usado quando o tipo não tem entrada em `thresholds`.
    pub default_threshold: f64,
    /// Consulta o modelo externo de NER (se um foi injetado).
    pub use_external_model: bool,
    /// Executa o passo anti-falso-negativo (catálogo contextual).
    pub use_contextual: bool,
    /// Executa validação matemática de documentos.
    pub validate_documents: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        DetectionConfig::for_mode(DetectionMode::Balanced)
    }
}

impl DetectionConfig {
    /// Retorna o preset canônico para o modo dado.
    ///
    /// As tabelas de limiares refletem a postura recall-first do sistema:
    /// CPF e telefone têm limiares baixos mesmo no modo balanced, porque
    /// perder um CPF verdadeiro custa mais caro que reportar um espúrio.
    pub fn for_mode(mode: DetectionMode) -> Self {
        match mode {
            DetectionMode::Strict => DetectionConfig {
                mode,
                min_confidence: 0.3,
                thresholds: thresholds_from(&[
                    (PiiType::Cpf, 0.2),
                    (PiiType::Cnpj, 0.3),
                    (PiiType::Telefone, 0.3),
                    (PiiType::Celular, 0.3),
                    (PiiType::Email, 0.5),
                    (PiiType::Cep, 0.4),
                    (PiiType::NomePessoa, 0.4),
                ]),
                default_threshold: 0.3,
                use_external_model: true,
                use_contextual: true,
                validate_documents: true,
            },
            DetectionMode::Balanced => DetectionConfig {
                mode,
                min_confidence: 0.5,
                thresholds: thresholds_from(&[
                    (PiiType::Cpf, 0.3),
                    (PiiType::Cnpj, 0.4),
                    (PiiType::Telefone, 0.4),
                    (PiiType::Celular, 0.4),
                    (PiiType::Email, 0.7),
                    (PiiType::Cep, 0.5),
                    (PiiType::NomePessoa, 0.6),
                    (PiiType::Rg, 0.5),
                    (PiiType::DataNascimento, 0.6),
                ]),
                default_threshold: 0.5,
                use_external_model: true,
                use_contextual: true,
                validate_documents: true,
            },
            DetectionMode::Precise => DetectionConfig {
                mode,
                min_confidence: 0.7,
                thresholds: thresholds_from(&[
                    (PiiType::Cpf, 0.7),
                    (PiiType::Cnpj, 0.7),
                    (PiiType::Telefone, 0.7),
                    (PiiType::Celular, 0.7),
                    (PiiType::Email, 0.8),
                    (PiiType::Cep, 0.7),
                    (PiiType::NomePessoa, 0.8),
                ]),
                default_threshold: 0.7,
                use_external_model: true,
                use_contextual: true,
                validate_documents: true,
            },
        }
    }

    /// Limiar efetivo para um tipo: entrada específica ou o padrão.
    pub fn threshold_for(&self, pii_type: PiiType) -> f64 {
        self.thresholds
            .get(&pii_type)
            .copied()
            .unwrap_or(self.default_threshold)
    }

    /// Valida uma configuração customizada antes da construção do detector.
    pub fn validate(&self) -> Result<(), DetectorError> {
        for (&pii_type, &value) in &self.thresholds {
            if !(0.0..=1.0).contains(&value) {
                return Err(DetectorError::InvalidThreshold { pii_type, value });
            }
        }
        if !(0.0..=1.0).contains(&self.default_threshold) {
            return Err(DetectorError::InvalidThreshold {
                pii_type: PiiType::Cpf,
                value: self.default_threshold,
            });
        }
        Ok(())
    }
}

fn thresholds_from(pairs: &[(PiiType, f64)]) -> HashMap<PiiType, f64> {
    pairs.iter().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_from_str() {
        assert_eq!("strict".parse::<DetectionMode>().unwrap(), DetectionMode::Strict);
        assert_eq!("balanced".parse::<DetectionMode>().unwrap(), DetectionMode::Balanced);
        assert_eq!("precise".parse::<DetectionMode>().unwrap(), DetectionMode::Precise);
    }

    #[test]
    fn test_unknown_mode_fails_fast() {
        let err = "turbo".parse::<DetectionMode>().unwrap_err();
        assert!(matches!(err, DetectorError::UnknownMode(_)));
        assert!(err.to_string().contains("turbo"));
    }

    #[test]
    fn test_strict_thresholds_below_precise() {
        let strict = DetectionConfig::for_mode(DetectionMode::Strict);
        let precise = DetectionConfig::for_mode(DetectionMode::Precise);
        for pii_type in [PiiType::Cpf, PiiType::Telefone, PiiType::Email, PiiType::Cep] {
            assert!(strict.threshold_for(pii_type) < precise.threshold_for(pii_type));
        }
        assert!(strict.default_threshold < precise.default_threshold);
    }

    #[test]
    fn test_threshold_fallback() {
        let config = DetectionConfig::for_mode(DetectionMode::Balanced);
        // PLACA_VEICULO não tem entrada específica
        assert_eq!(
            config.threshold_for(PiiType::PlacaVeiculo),
            config.default_threshold
        );
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        let mut config = DetectionConfig::default();
        config.thresholds.insert(PiiType::Cpf, 1.5);
        assert!(matches!(
            config.validate(),
            Err(DetectorError::InvalidThreshold { .. })
        ));
    }
}
