//! # Relatório Legível
//!
//! Renderização Markdown de um resultado de detecção, para revisão humana
//! (triagem de pedidos de acesso à informação, auditoria de anonimização).
//! A saída é estável: entidades na ordem do resultado e contagens por tipo
//! em ordem alfabética.

use std::fmt::Write;

use crate::entity::DetectionResult;

/// Renderiza o resultado como Markdown.
pub fn render_markdown(result: &DetectionResult) -> String {
    let mut out = String::new();

    out.push_str("# Resultado da Detecção de Dados Pessoais\n\n");

    if result.has_pii {
        out.push_str("**Status:** dados pessoais detectados\n\n");
    } else {
        out.push_str("**Status:** nenhum dado pessoal identificado\n\n");
    }

    if !result.entities.is_empty() {
        out.push_str("## Entidades Detectadas\n\n");
        out.push_str("| Tipo | Valor | Confiança | Método | Validação |\n");
        out.push_str("|------|-------|-----------|--------|-----------|\n");
        for entity in &result.entities {
            let _ = writeln!(
                out,
                "| {} | `{}` | {:.0}% | {} | {:?} |",
                entity.pii_type.name(),
                entity.value,
                entity.confidence * 100.0,
                entity.detection_method.name(),
                entity.validation_status,
            );
        }
        out.push('\n');
    }

    out.push_str("## Sumário\n\n");
    let _ = writeln!(
        out,
        "- **Total de entidades:** {}",
        result.summary.total_entities
    );

    let mut counts: Vec<(&str, usize)> = result
        .summary
        .by_type
        .iter()
        .map(|(pii_type, count)| (pii_type.name(), *count))
        .collect();
    counts.sort();
    for (name, count) in counts {
        let _ = writeln!(out, "  - {}: {}", name, count);
    }

    out.push_str("\n## Metadados\n\n");
    let _ = writeln!(
        out,
        "- **Tempo de processamento:** {:.2}ms",
        result.metadata.processing_time_ms
    );
    let _ = writeln!(out, "- **Modo:** {}", result.metadata.mode.name());
    let _ = writeln!(
        out,
        "- **Tamanho do texto:** {} bytes",
        result.metadata.text_length
    );
    let _ = writeln!(
        out,
        "- **Modelo externo:** {}",
        if result.metadata.external_model_used {
            "sim"
        } else {
            "não"
        }
    );

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectionMode;
    use crate::detector::PiiDetector;

    #[test]
    fn test_report_lists_detected_entities() {
        let detector = PiiDetector::new(DetectionMode::Balanced);
        let result = detector.detect("CPF 529.982.247-25 e email a@b.com");
        let report = render_markdown(&result);

        assert!(report.contains("dados pessoais detectados"));
        assert!(report.contains("| CPF |"));
        assert!(report.contains("`529.982.247-25`"));
        assert!(report.contains("- **Modo:** balanced"));
    }

    #[test]
    fn test_report_for_clean_text() {
        let detector = PiiDetector::new(DetectionMode::Precise);
        let result = detector.detect("relatório trimestral sem dados sensíveis");
        let report = render_markdown(&result);

        assert!(report.contains("nenhum dado pessoal identificado"));
        assert!(!report.contains("## Entidades Detectadas"));
        assert!(report.contains("**Total de entidades:** 0"));
    }
}
