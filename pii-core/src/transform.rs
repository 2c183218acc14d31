//! # Transformações de Texto — Mascaramento e Anonimização
//!
//! Consumidores de um resultado de detecção: recebem o texto original e as
//! entidades e produzem uma versão segura para exibição ou armazenamento.
//!
//! Todas as substituições são aplicadas em ordem **decrescente** de offset,
//! para que a edição de um span não invalide os offsets dos anteriores.
//! O mascaramento conta *graphemes*, não bytes: "José" mascarado vira
//! "****", nunca um corte no meio do "é".

use unicode_segmentation::UnicodeSegmentation;

use crate::entity::{Entity, PiiType};

/// Mascara as entidades no texto, preservando parcialmente o valor.
///
/// Valores com mais de quatro graphemes mantêm os dois primeiros e os dois
/// últimos visíveis ("529.982.247-25" → "52**********25"); valores curtos
/// são mascarados por inteiro.
pub fn mask_entities(text: &str, entities: &[Entity], mask_char: char) -> String {
    if entities.is_empty() {
        return text.to_string();
    }

    let mut result = text.to_string();
    for entity in sorted_descending(entities) {
        if !valid_span(&result, entity.start, entity.end) {
            continue;
        }
        let masked = mask_value(&entity.value, mask_char);
        result.replace_range(entity.start..entity.end, &masked);
    }
    result
}

/// Substitui cada entidade por um placeholder por tipo (`[CPF_REMOVIDO]`).
pub fn anonymize_entities(text: &str, entities: &[Entity]) -> String {
    if entities.is_empty() {
        return text.to_string();
    }

    let mut result = text.to_string();
    for entity in sorted_descending(entities) {
        if !valid_span(&result, entity.start, entity.end) {
            continue;
        }
        result.replace_range(entity.start..entity.end, placeholder(entity.pii_type));
    }
    result
}

fn mask_value(value: &str, mask_char: char) -> String {
    let graphemes: Vec<&str> = value.graphemes(true).collect();
    if graphemes.len() > 4 {
        let head: String = graphemes[..2].concat();
        let tail: String = graphemes[graphemes.len() - 2..].concat();
        let middle: String = std::iter::repeat(mask_char)
            .take(graphemes.len() - 4)
            .collect();
        format!("{}{}{}", head, middle, tail)
    } else {
        std::iter::repeat(mask_char).take(graphemes.len()).collect()
    }
}

fn placeholder(pii_type: PiiType) -> &'static str {
    match pii_type {
        PiiType::Cpf => "[CPF_REMOVIDO]",
        PiiType::Cnpj => "[CNPJ_REMOVIDO]",
        PiiType::Telefone => "[TELEFONE_REMOVIDO]",
        PiiType::Celular => "[CELULAR_REMOVIDO]",
        PiiType::Email => "[EMAIL_REMOVIDO]",
        PiiType::Cep => "[CEP_REMOVIDO]",
        PiiType::Rg => "[RG_REMOVIDO]",
        PiiType::Cnh => "[CNH_REMOVIDA]",
        PiiType::TituloEleitor => "[TITULO_ELEITOR_REMOVIDO]",
        PiiType::PisPasep => "[PIS_PASEP_REMOVIDO]",
        PiiType::CartaoCredito => "[CARTAO_REMOVIDO]",
        PiiType::NomePessoa => "[NOME_REMOVIDO]",
        PiiType::Endereco => "[ENDERECO_REMOVIDO]",
        PiiType::DataNascimento => "[DATA_REMOVIDA]",
        PiiType::PlacaVeiculo => "[PLACA_REMOVIDA]",
        PiiType::Passaporte => "[PASSAPORTE_REMOVIDO]",
    }
}

/// Entidades vindas do motor sempre têm spans bem formados, mas a API
/// aceita entidades montadas pelo chamador: spans vazios, além do fim do
/// texto ou fora de fronteira de caractere UTF-8 são ignorados em vez de
/// causar pânico no `replace_range`.
fn valid_span(text: &str, start: usize, end: usize) -> bool {
    start < end && end <= text.len() && text.is_char_boundary(start) && text.is_char_boundary(end)
}

/// Ordena por início decrescente sem mutar a lista do chamador.
fn sorted_descending(entities: &[Entity]) -> Vec<&Entity> {
    let mut sorted: Vec<&Entity> = entities.iter().collect();
    sorted.sort_by(|a, b| b.start.cmp(&a.start));
    sorted
}

/// Normaliza o texto para processamento:
/// remove caracteres de controle (exceto `\n` e `\t`), converte `\r\n` e
/// `\r` em `\n` e colapsa espaços repetidos dentro de cada linha.
pub fn normalize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let without_control: String = text
        .chars()
        .filter(|&c| !c.is_control() || c == '\n' || c == '\t' || c == '\r')
        .collect();

    let unified = without_control.replace("\r\n", "\n").replace('\r', "\n");

    let lines: Vec<String> = unified
        .split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect();

    lines.join("\n").trim().to_string()
}

/// Divide textos longos em pedaços com sobreposição, preferindo quebrar em
/// espaço quando existe um na metade final da janela.
///
/// `overlap` deve ser menor que `max_len`; a divisão nunca regride (cada
/// pedaço avança pelo menos um byte), então a função termina para qualquer
/// entrada.
pub fn chunk_text(text: &str, max_len: usize, overlap: usize) -> Vec<String> {
    if text.len() <= max_len || max_len == 0 {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0usize;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }

        if end < text.len() {
            if let Some(last_space) = text[start..end].rfind(' ') {
                if last_space > max_len / 2 {
                    end = start + last_space;
                }
            }
        }

        chunks.push(text[start..end].trim().to_string());

        if end >= text.len() {
            break;
        }
        let mut next = end.saturating_sub(overlap).max(start + 1);
        while !text.is_char_boundary(next) {
            next += 1;
        }
        start = next;
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DetectionMode;
    use crate::detector::PiiDetector;

    fn entity(pii_type: PiiType, value: &str, start: usize) -> Entity {
        use crate::entity::{DetectionMethod, ValidationStatus};
        Entity {
            pii_type,
            value: value.to_string(),
            start,
            end: start + value.len(),
            confidence: 0.9,
            validation_status: ValidationStatus::NotValidated,
            validation_message: String::new(),
            detection_method: DetectionMethod::Pattern,
            explanation: String::new(),
        }
    }

    #[test]
    fn test_mask_keeps_edges() {
        let text = "CPF 529.982.247-25 fim";
        let e = entity(PiiType::Cpf, "529.982.247-25", 4);
        let masked = mask_entities(text, &[e], '*');
        assert_eq!(masked, "CPF 52**********25 fim");
    }

    #[test]
    fn test_mask_short_value_fully() {
        let text = "ramal 1234";
        let e = entity(PiiType::Telefone, "1234", 6);
        assert_eq!(mask_entities(text, &[e], '*'), "ramal ****");
    }

    #[test]
    fn test_mask_is_grapheme_aware() {
        let text = "nome José";
        let e = entity(PiiType::NomePessoa, "José", 5);
        let masked = mask_entities(text, &[e], '*');
        assert_eq!(masked, "nome ****");
    }

    #[test]
    fn test_anonymize_multiple_entities() {
        let text = "CPF 529.982.247-25 email a@b.com";
        let entities = vec![
            entity(PiiType::Cpf, "529.982.247-25", 4),
            entity(PiiType::Email, "a@b.com", 25),
        ];
        let anon = anonymize_entities(text, &entities);
        assert_eq!(anon, "CPF [CPF_REMOVIDO] email [EMAIL_REMOVIDO]");
    }

    #[test]
    fn test_descending_application_preserves_offsets() {
        // As entidades chegam em ordem crescente; a substituição do segundo
        // span não pode deslocar o primeiro
        let text = "a@b.com e c@d.com";
        let entities = vec![
            entity(PiiType::Email, "a@b.com", 0),
            entity(PiiType::Email, "c@d.com", 10),
        ];
        let anon = anonymize_entities(text, &entities);
        assert_eq!(anon, "[EMAIL_REMOVIDO] e [EMAIL_REMOVIDO]");
    }

    #[test]
    fn test_mask_then_redetect_finds_nothing() {
        let detector = PiiDetector::new(DetectionMode::Precise);
        let text = "CPF 529.982.247-25, email de contato: fulano@exemplo.com.br";
        let first = detector.detect(text);
        assert!(first.has_pii);
        let masked_types: Vec<PiiType> = first.entities.iter().map(|e| e.pii_type).collect();
        assert!(masked_types.contains(&PiiType::Cpf));
        assert!(masked_types.contains(&PiiType::Email));

        // Nenhum tipo já mascarado pode reaparecer na redetecção
        let masked = mask_entities(text, &first.entities, '*');
        let second = detector.detect(&masked);
        for e in &second.entities {
            assert!(
                !masked_types.contains(&e.pii_type),
                "{:?} redetectado após mascaramento: {:?}",
                e.pii_type,
                e
            );
        }
    }

    #[test]
    fn test_malformed_caller_spans_are_skipped() {
        // "é" ocupa os bytes 9..11; offsets no meio dele não podem causar pânico
        let text = "nome: José da Silva";
        let mut mid_char = entity(PiiType::NomePessoa, "é", 10);
        mid_char.end = 12;
        let mut past_end = entity(PiiType::NomePessoa, "Silva", text.len());
        past_end.end = text.len() + 5;
        let mut empty_span = entity(PiiType::NomePessoa, "", 3);
        empty_span.end = 3;

        let entities = vec![mid_char, past_end, empty_span];
        assert_eq!(mask_entities(text, &entities, '*'), text);
        assert_eq!(anonymize_entities(text, &entities), text);
    }

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text(""), "");
        assert_eq!(normalize_text("  a   b  \r\nc\rd  "), "a b\nc\nd");
        assert_eq!(normalize_text("x\x00y\x07z"), "xyz");
    }

    #[test]
    fn test_chunk_short_text_single_chunk() {
        assert_eq!(chunk_text("curto", 512, 50), vec!["curto".to_string()]);
    }

    #[test]
    fn test_chunk_long_text_overlaps_and_terminates() {
        let word = "palavra ";
        let text = word.repeat(200);
        let chunks = chunk_text(&text, 100, 20);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 100);
            assert!(!chunk.is_empty());
        }
    }

    #[test]
    fn test_chunk_multibyte_safe() {
        let text = "ação coração não ".repeat(50);
        let chunks = chunk_text(&text, 64, 10);
        // nenhum chunk pode cortar um caractere multibyte ao meio
        for chunk in &chunks {
            assert!(chunk.is_char_boundary(chunk.len()));
        }
    }
}
