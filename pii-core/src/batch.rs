//! # Processamento em Lote
//!
//! Varredura paralela de coleções de textos sobre um detector
//! compartilhado. O detector é imutável após a construção, então o fan-out
//! com `rayon` não precisa de nenhuma sincronização: cada worker acumula
//! estatísticas parciais e os parciais são fundidos na redução.

use std::collections::HashMap;
use std::time::Instant;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::detector::PiiDetector;
use crate::entity::{DetectionResult, PiiType};

/// Estatísticas agregadas de uma rodada de lote.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    pub total_texts: usize,
    pub texts_with_pii: usize,
    pub total_entities: usize,
    pub by_type: HashMap<PiiType, usize>,
    /// Tempo de parede da rodada inteira, não a soma dos tempos por texto.
    pub total_time_ms: f64,
}

impl BatchStats {
    fn absorb(mut self, result: &DetectionResult) -> Self {
        self.total_texts += 1;
        if result.has_pii {
            self.texts_with_pii += 1;
        }
        self.total_entities += result.summary.total_entities;
        for (pii_type, count) in &result.summary.by_type {
            *self.by_type.entry(*pii_type).or_insert(0) += count;
        }
        self
    }

    fn merge(mut self, other: BatchStats) -> Self {
        self.total_texts += other.total_texts;
        self.texts_with_pii += other.texts_with_pii;
        self.total_entities += other.total_entities;
        for (pii_type, count) in other.by_type {
            *self.by_type.entry(pii_type).or_insert(0) += count;
        }
        self
    }
}

/// Detecta dados pessoais em todos os textos, em paralelo.
///
/// Os resultados saem na mesma ordem dos textos de entrada,
/// independentemente da ordem em que os workers terminam.
pub fn detect_batch(detector: &PiiDetector, texts: &[String]) -> (Vec<DetectionResult>, BatchStats) {
    let start = Instant::now();

    let results: Vec<DetectionResult> = texts
        .par_iter()
        .map(|text| detector.detect(text))
        .collect();

    let mut stats = results
        .par_iter()
        .fold(BatchStats::default, |acc, result| acc.absorb(result))
        .reduce(BatchStats::default, BatchStats::merge);

    stats.total_time_ms = start.elapsed().as_secs_f64() * 1000.0;
    (results, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectionMode;

    #[test]
    fn test_batch_preserves_input_order() {
        let detector = PiiDetector::new(DetectionMode::Balanced);
        let texts = vec![
            "CPF 529.982.247-25".to_string(),
            "nada aqui".to_string(),
            "email: a@b.com".to_string(),
        ];
        let (results, stats) = detect_batch(&detector, &texts);

        assert_eq!(results.len(), 3);
        assert!(results[0].has_pii);
        assert!(!results[1].has_pii);
        assert!(results[2].has_pii);
        assert_eq!(stats.total_texts, 3);
        assert_eq!(stats.texts_with_pii, 2);
    }

    #[test]
    fn test_batch_stats_consistency() {
        let detector = PiiDetector::new(DetectionMode::Strict);
        let texts: Vec<String> = vec![
            "Sr. João Silva, fone (61) 99999-8888".to_string(),
            "CPF: 123.456.789-09 e CEP 70000-100".to_string(),
            "".to_string(),
        ];
        let (results, stats) = detect_batch(&detector, &texts);

        let expected_entities: usize = results.iter().map(|r| r.summary.total_entities).sum();
        assert_eq!(stats.total_entities, expected_entities);

        let by_type_total: usize = stats.by_type.values().sum();
        assert_eq!(by_type_total, expected_entities);
        assert!(stats.total_time_ms >= 0.0);
    }

    #[test]
    fn test_empty_batch() {
        let detector = PiiDetector::new(DetectionMode::Balanced);
        let (results, stats) = detect_batch(&detector, &[]);
        assert!(results.is_empty());
        assert_eq!(stats.total_texts, 0);
        assert_eq!(stats.total_entities, 0);
    }
}
