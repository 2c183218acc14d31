//! # Catálogo Contextual — Palavra-Chave + Grupo de Captura
//!
//! Segundo registro imutável de regras, ancoradas em palavras-chave do
//! português ("meu CPF é …", "ligue no …", honorífico + nome). Diferente do
//! catálogo de padrões, aqui só o **grupo capturado** vira candidato — a
//! palavra-chave fica de fora do span. O objetivo é recuperar valores que as
//! regras literais rejeitam (números malformados, parciais, nomes) quando o
//! próprio autor do texto anuncia o que o valor é.
//!
//! As confianças são pré-fixadas por regra (0.75–0.95) conforme a
//! ambiguidade da âncora: "inscrito sob CPF" quase não erra; "número:" erra
//! bastante.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::entity::PiiType;

/// Uma regra contextual: regex com exatamente um grupo de captura de valor.
pub struct ContextualRule {
    pub regex: Regex,
    pub pii_type: PiiType,
    pub confidence: f64,
}

/// Candidato emitido por uma regra contextual.
///
/// `start`/`end` referem-se ao grupo capturado (já sem espaços nas bordas),
/// nunca à âncora.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextualMatch {
    pub pii_type: PiiType,
    pub value: String,
    pub start: usize,
    pub end: usize,
    pub confidence: f64,
    /// O casamento completo (âncora + valor), para a explicação.
    pub full_context: String,
}

/// Nomes e sobrenomes brasileiros frequentes, em minúsculas.
///
/// Usado para aceitar capturas de nome com uma palavra só reconhecível,
/// reduzindo capturas espúrias de palavras capitalizadas.
pub const COMMON_NAMES: &[&str] = &[
    // Sobrenomes mais comuns
    "silva", "santos", "oliveira", "souza", "rodrigues", "ferreira",
    "alves", "pereira", "lima", "gomes", "costa", "ribeiro", "martins",
    "carvalho", "almeida", "lopes", "soares", "fernandes", "vieira",
    "barbosa", "rocha", "dias", "nascimento", "andrade", "moreira",
    "nunes", "marques", "machado", "mendes", "freitas", "cardoso",
    "ramos", "gonçalves", "santana", "teixeira", "moura", "araújo",
    // Nomes próprios comuns
    "maria", "josé", "ana", "joão", "paulo", "carlos", "antonio",
    "francisco", "pedro", "lucas", "luiz", "marcos", "gabriel",
    "rafael", "daniel", "fernanda", "juliana", "camila", "amanda",
    "patricia", "aline", "bruna", "jessica", "leticia", "larissa",
];

type ContextualDef = (&'static str, PiiType, f64);

/// Regras contextuais embutidas. As de nome são sensíveis a maiúsculas de
/// propósito: a capitalização é o sinal que separa "Sr. João Silva" de
/// "sr. fulano qualquer".
const CONTEXTUAL_RULES: &[ContextualDef] = &[
    // --- CPF após palavra-chave ---
    (r"(?i)(?:meu|seu|nosso|dele|dela)?\s*(?:cpf|c\.p\.f\.?)[\s:é]+([0-9.\-\s]{11,18})", PiiType::Cpf, 0.92),
    (r"(?i)(?:cpf|c\.p\.f\.?)[\s:]+n[°º]?\s*([0-9.\-\s]{11,18})", PiiType::Cpf, 0.90),
    (r"(?i)(?:cadastro|documento)[\s:]+([0-9]{3}\.?[0-9]{3}\.?[0-9]{3}[-.]?[0-9]{2})", PiiType::Cpf, 0.88),
    (r"(?i)(?:inscrito|registrado)\s+(?:no|sob)\s+(?:cpf|c\.p\.f\.?)[\s:]+([0-9.\-\s]{11,18})", PiiType::Cpf, 0.93),
    // --- Telefone após palavra-chave ---
    (r"(?i)(?:meu|seu|nosso)?\s*(?:telefone|tel|fone|celular|cel|contato|whatsapp|zap)[\s:é]+([0-9()\-\s]{8,20})", PiiType::Telefone, 0.90),
    (r"(?i)(?:ligue|ligar|chamar)[\s:]*(?:para|no|em)?\s*([0-9()\-\s]{8,20})", PiiType::Telefone, 0.85),
    (r"(?i)(?:número|n[°º])[\s:]+([0-9()\-\s]{8,20})", PiiType::Telefone, 0.75),
    // --- Email após palavra-chave ---
    (r"(?i)(?:meu|seu|nosso)?\s*(?:e-?mail|correio)[\s:é]+([a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,})", PiiType::Email, 0.95),
    (r"(?i)(?:envie?|mande?|contato)[\s:]+(?:para|em)?\s*([a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,})", PiiType::Email, 0.90),
    // --- Endereço após palavra-chave ---
    (r"(?i)(?:rua|av\.?|avenida|travessa|alameda|praça)[\s:]+([A-Za-záàâãéèêíïóôõöúçñÁÀÂÃÉÈÊÍÏÓÔÕÖÚÇÑ\s]+,?\s*(?:n[°º]?|número)?\s*\d+)", PiiType::Endereco, 0.85),
    (r"(?i)(?:endereço|mora em|residente em|localizado em)[\s:]+([A-Za-záàâãéèêíïóôõöúçñÁÀÂÃÉÈÊÍÏÓÔÕÖÚÇÑ\s,\d]+)", PiiType::Endereco, 0.80),
    // --- Nome após honorífico ou auto-referência (sensível a maiúsculas) ---
    (r"(?:[Ee]u\s+me\s+chamo|[Mm]e\s+chamo|[Mm]eu\s+nome\s+[eé])[\s:]+([A-Z][a-záàâãéèêíïóôõöúçñ]+(?:\s+[A-Z][a-záàâãéèêíïóôõöúçñ]+)+)", PiiType::NomePessoa, 0.85),
    (r"(?:[Aa]ssinado|[Aa]ssinatura|[Rr]esponsável|[Ss]olicitante|[Rr]equerente)[\s:]+([A-Z][a-záàâãéèêíïóôõöúçñ]+(?:\s+[A-Z][a-záàâãéèêíïóôõöúçñ]+)+)", PiiType::NomePessoa, 0.80),
    (r"(?:[Ss]r\.?|[Ss]ra\.?|[Ss]enhora?|[Dd]r\.?|[Dd]ra\.?)[\s:]+([A-Z][a-záàâãéèêíïóôõöúçñ]+(?:\s+[A-Z][a-záàâãéèêíïóôõöúçñ]+)+)", PiiType::NomePessoa, 0.75),
];

/// O catálogo contextual compilado. Somente-leitura após a construção.
pub struct ContextualCatalog {
    rules: Vec<ContextualRule>,
}

impl ContextualCatalog {
    pub fn new() -> Self {
        let rules = CONTEXTUAL_RULES
            .iter()
            .map(|&(pattern, pii_type, confidence)| ContextualRule {
                regex: Regex::new(pattern).expect("regras contextuais embutidas devem compilar"),
                pii_type,
                confidence,
            })
            .collect();
        ContextualCatalog { rules }
    }

    /// Varre o texto com todas as regras contextuais.
    ///
    /// Capturas de nome passam pelo filtro de plausibilidade
    /// ([`is_plausible_name`]); os demais tipos entram direto. Não há
    /// deduplicação aqui — o orquestrador decide contra a lista já fundida.
    pub fn find_contextual(&self, text: &str) -> Vec<ContextualMatch> {
        let mut matches = Vec::new();

        for rule in &self.rules {
            for caps in rule.regex.captures_iter(text) {
                let group = match caps.get(1) {
                    Some(g) => g,
                    None => continue,
                };
                let full = match caps.get(0) {
                    Some(m) => m,
                    None => continue,
                };

                let (value, start, end) = trim_span(group.as_str(), group.start());
                if value.is_empty() {
                    continue;
                }
                if rule.pii_type == PiiType::NomePessoa && !is_plausible_name(&value) {
                    continue;
                }

                matches.push(ContextualMatch {
                    pii_type: rule.pii_type,
                    value,
                    start,
                    end,
                    confidence: rule.confidence,
                    full_context: full.as_str().to_string(),
                });
            }
        }

        matches
    }
}

impl Default for ContextualCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Aceita uma captura de nome se tiver ao menos duas palavras capitalizadas
/// ou alguma palavra na lista de nomes comuns.
pub fn is_plausible_name(value: &str) -> bool {
    let words: Vec<&str> = value.split_whitespace().collect();
    let capitalized = words
        .iter()
        .filter(|w| w.chars().next().map(|c| c.is_uppercase()).unwrap_or(false))
        .count();
    if capitalized >= 2 {
        return true;
    }
    words
        .iter()
        .any(|w| COMMON_NAMES.contains(&w.to_lowercase().as_str()))
}

/// Remove espaços das bordas do grupo capturado, ajustando os offsets.
fn trim_span(raw: &str, raw_start: usize) -> (String, usize, usize) {
    let trimmed = raw.trim();
    let leading = raw.len() - raw.trim_start().len();
    let start = raw_start + leading;
    (trimmed.to_string(), start, start + trimmed.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cpf_after_keyword() {
        let catalog = ContextualCatalog::new();
        let matches = catalog.find_contextual("Meu CPF é 123.456.789-09 conforme anexo");
        let cpf = matches
            .iter()
            .find(|m| m.pii_type == PiiType::Cpf)
            .expect("deve capturar o CPF anunciado");
        assert_eq!(cpf.value, "123.456.789-09");
        assert!(cpf.full_context.to_lowercase().contains("cpf"));
    }

    #[test]
    fn test_capture_offsets_exclude_keyword() {
        let catalog = ContextualCatalog::new();
        let text = "ligue no 99999-8888 por favor";
        let matches = catalog.find_contextual(text);
        let phone = matches
            .iter()
            .find(|m| m.pii_type == PiiType::Telefone)
            .expect("telefone contextual");
        assert_eq!(&text[phone.start..phone.end], phone.value);
        assert!(!phone.value.contains("ligue"));
    }

    #[test]
    fn test_name_after_honorific() {
        let catalog = ContextualCatalog::new();
        let matches = catalog.find_contextual("Atenciosamente, Sr. Carlos Eduardo Silva");
        assert!(matches
            .iter()
            .any(|m| m.pii_type == PiiType::NomePessoa && m.value.contains("Carlos")));
    }

    #[test]
    fn test_name_gate_rejects_single_unknown_word() {
        assert!(!is_plausible_name("Protocolo"));
        assert!(is_plausible_name("Maria"));
        assert!(is_plausible_name("Carlos Eduardo"));
    }

    #[test]
    fn test_self_reference_name() {
        let catalog = ContextualCatalog::new();
        let matches = catalog.find_contextual("Eu me chamo João Pedro Santos e solicito acesso");
        assert!(matches
            .iter()
            .any(|m| m.pii_type == PiiType::NomePessoa && m.value.starts_with("João")));
    }

    #[test]
    fn test_email_after_keyword() {
        let catalog = ContextualCatalog::new();
        let matches = catalog.find_contextual("meu e-mail: fulano@exemplo.com.br");
        assert!(matches
            .iter()
            .any(|m| m.pii_type == PiiType::Email && m.value == "fulano@exemplo.com.br"));
    }

    #[test]
    fn test_trimmed_value_offsets() {
        let catalog = ContextualCatalog::new();
        let text = "CPF:   529.982.247-25  fim";
        for m in catalog.find_contextual(text) {
            assert_eq!(&text[m.start..m.end], m.value);
            assert!(!m.value.starts_with(' ') && !m.value.ends_with(' '));
        }
    }
}
