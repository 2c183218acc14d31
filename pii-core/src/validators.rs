//! # Validadores Matemáticos de Documentos Brasileiros
//!
//! Cada validador é uma função pura de um valor candidato para um veredito:
//! sem I/O, sem estado mutável compartilhado, e **nunca** retorna erro —
//! um candidato malformado (comprimento errado, caracteres estranhos)
//! simplesmente produz `is_valid = false` com confiança 0.0.
//!
//! ## Algoritmo do dígito verificador (CPF)
//!
//! 1. Multiplica os 9 primeiros dígitos pelos pesos decrescentes 10..2.
//! 2. Dígito esperado = `(soma * 10 % 11) % 10`.
//! 3. Repete com 10 dígitos e pesos 11..2 para o segundo verificador.
//!
//! O CNPJ usa a mesma ideia com dois vetores de pesos fixos e a forma
//! `resto < 2 ⇒ 0, senão 11 − resto`.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::entity::PiiType;

/// Veredito puro de um validador. Nunca mutado após a criação.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub confidence: f64,
    pub message: String,
    /// Valor normalizado (somente dígitos / minúsculas), quando a estrutura permitiu.
    pub cleaned_value: Option<String>,
}

impl ValidationResult {
    fn reject(message: impl Into<String>) -> Self {
        ValidationResult {
            is_valid: false,
            confidence: 0.0,
            message: message.into(),
            cleaned_value: None,
        }
    }
}

/// Contrato comum dos validadores de documento.
pub trait DocumentValidator: Send + Sync {
    fn validate(&self, raw: &str) -> ValidationResult;
}

/// Remove tudo que não for dígito.
pub fn clean_digits(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

fn all_same_digit(digits: &str) -> bool {
    let mut chars = digits.chars();
    match chars.next() {
        Some(first) => chars.all(|c| c == first),
        None => false,
    }
}

// ---------------------------------------------------------------------------
// CPF
// ---------------------------------------------------------------------------

/// Validador de CPF (11 dígitos, dois verificadores mod-11).
pub struct CpfValidator;

impl CpfValidator {
    /// Calcula os dois dígitos verificadores para uma base de 9 dígitos.
    pub fn check_digits(base: &[u32; 9]) -> (u32, u32) {
        let sum_first: u32 = base
            .iter()
            .zip((2..=10).rev())
            .map(|(d, w)| d * w)
            .sum();
        let first = (sum_first * 10 % 11) % 10;

        let mut extended = [0u32; 10];
        extended[..9].copy_from_slice(base);
        extended[9] = first;
        let sum_second: u32 = extended
            .iter()
            .zip((2..=11).rev())
            .map(|(d, w)| d * w)
            .sum();
        let second = (sum_second * 10 % 11) % 10;

        (first, second)
    }

    /// Formata no padrão XXX.XXX.XXX-XX (ou devolve o original se não couber).
    pub fn format(raw: &str) -> String {
        let cleaned = clean_digits(raw);
        if cleaned.len() == 11 {
            format!(
                "{}.{}.{}-{}",
                &cleaned[..3],
                &cleaned[3..6],
                &cleaned[6..9],
                &cleaned[9..]
            )
        } else {
            raw.to_string()
        }
    }
}

impl DocumentValidator for CpfValidator {
    fn validate(&self, raw: &str) -> ValidationResult {
        let cleaned = clean_digits(raw);

        if cleaned.len() != 11 {
            return ValidationResult::reject(format!(
                "CPF deve ter 11 dígitos, encontrado: {}",
                cleaned.len()
            ));
        }
        if all_same_digit(&cleaned) {
            return ValidationResult::reject("CPF com sequência inválida (dígitos repetidos)");
        }

        let digits: Vec<u32> = cleaned.chars().filter_map(|c| c.to_digit(10)).collect();
        let mut base = [0u32; 9];
        base.copy_from_slice(&digits[..9]);
        let (first, second) = CpfValidator::check_digits(&base);

        if first != digits[9] {
            return ValidationResult {
                is_valid: false,
                confidence: 0.3,
                message: format!(
                    "Primeiro dígito verificador inválido: esperado {}, encontrado {}",
                    first, digits[9]
                ),
                cleaned_value: Some(cleaned),
            };
        }
        if second != digits[10] {
            return ValidationResult {
                is_valid: false,
                confidence: 0.3,
                message: format!(
                    "Segundo dígito verificador inválido: esperado {}, encontrado {}",
                    second, digits[10]
                ),
                cleaned_value: Some(cleaned),
            };
        }

        ValidationResult {
            is_valid: true,
            confidence: 0.98,
            message: "CPF válido - dígitos verificadores conferem".to_string(),
            cleaned_value: Some(cleaned),
        }
    }
}

// ---------------------------------------------------------------------------
// CNPJ
// ---------------------------------------------------------------------------

/// Validador de CNPJ (14 dígitos, dois verificadores mod-11).
pub struct CnpjValidator;

const CNPJ_WEIGHTS_FIRST: [u32; 12] = [5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
const CNPJ_WEIGHTS_SECOND: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];

impl CnpjValidator {
    /// Formata no padrão XX.XXX.XXX/XXXX-XX.
    pub fn format(raw: &str) -> String {
        let cleaned = clean_digits(raw);
        if cleaned.len() == 14 {
            format!(
                "{}.{}.{}/{}-{}",
                &cleaned[..2],
                &cleaned[2..5],
                &cleaned[5..8],
                &cleaned[8..12],
                &cleaned[12..]
            )
        } else {
            raw.to_string()
        }
    }
}

fn cnpj_check_digit(digits: &[u32], weights: &[u32]) -> u32 {
    let sum: u32 = digits.iter().zip(weights).map(|(d, w)| d * w).sum();
    let remainder = sum % 11;
    if remainder < 2 {
        0
    } else {
        11 - remainder
    }
}

impl DocumentValidator for CnpjValidator {
    fn validate(&self, raw: &str) -> ValidationResult {
        let cleaned = clean_digits(raw);

        if cleaned.len() != 14 {
            return ValidationResult::reject(format!(
                "CNPJ deve ter 14 dígitos, encontrado: {}",
                cleaned.len()
            ));
        }
        if all_same_digit(&cleaned) {
            return ValidationResult::reject("CNPJ com sequência inválida (dígitos repetidos)");
        }

        let digits: Vec<u32> = cleaned.chars().filter_map(|c| c.to_digit(10)).collect();

        let first = cnpj_check_digit(&digits[..12], &CNPJ_WEIGHTS_FIRST);
        if first != digits[12] {
            return ValidationResult {
                is_valid: false,
                confidence: 0.3,
                message: "Primeiro dígito verificador inválido".to_string(),
                cleaned_value: Some(cleaned),
            };
        }

        let second = cnpj_check_digit(&digits[..13], &CNPJ_WEIGHTS_SECOND);
        if second != digits[13] {
            return ValidationResult {
                is_valid: false,
                confidence: 0.3,
                message: "Segundo dígito verificador inválido".to_string(),
                cleaned_value: Some(cleaned),
            };
        }

        ValidationResult {
            is_valid: true,
            confidence: 0.98,
            message: "CNPJ válido - dígitos verificadores conferem".to_string(),
            cleaned_value: Some(cleaned),
        }
    }
}

// ---------------------------------------------------------------------------
// Telefone
// ---------------------------------------------------------------------------

/// Validador de telefones brasileiros (fixo com 10 dígitos, celular com 11).
pub struct PhoneValidator;

/// DDDs em uso no Brasil.
const VALID_DDDS: [u32; 67] = [
    11, 12, 13, 14, 15, 16, 17, 18, 19, // São Paulo
    21, 22, 24, 27, 28, // Rio de Janeiro / Espírito Santo
    31, 32, 33, 34, 35, 37, 38, // Minas Gerais
    41, 42, 43, 44, 45, 46, 47, 48, 49, // Paraná / Santa Catarina
    51, 53, 54, 55, // Rio Grande do Sul
    61, 62, 63, 64, 65, 66, 67, 68, 69, // Centro-Oeste
    71, 73, 74, 75, 77, 79, 81, 82, 83, 84, 85, 86, 87, 88, 89, // Nordeste
    91, 92, 93, 94, 95, 96, 97, 98, 99, // Norte
];

impl DocumentValidator for PhoneValidator {
    fn validate(&self, raw: &str) -> ValidationResult {
        let mut cleaned = clean_digits(raw);

        // Descarta o DDI 55 quando presente
        if cleaned.starts_with("55") && cleaned.len() > 11 {
            cleaned = cleaned[2..].to_string();
        }

        if cleaned.len() != 10 && cleaned.len() != 11 {
            return ValidationResult::reject(format!(
                "Telefone deve ter 10 ou 11 dígitos, encontrado: {}",
                cleaned.len()
            ));
        }

        let ddd: u32 = match cleaned[..2].parse() {
            Ok(d) => d,
            Err(_) => return ValidationResult::reject("Telefone deve conter apenas dígitos"),
        };

        if !VALID_DDDS.contains(&ddd) {
            return ValidationResult {
                is_valid: false,
                confidence: 0.4,
                message: format!("DDD {} não é válido no Brasil", ddd),
                cleaned_value: Some(cleaned),
            };
        }

        if cleaned.len() == 11 && cleaned.as_bytes()[2] != b'9' {
            return ValidationResult {
                is_valid: false,
                confidence: 0.5,
                message: "Celular com 11 dígitos deve ter terceiro dígito = 9".to_string(),
                cleaned_value: Some(cleaned),
            };
        }

        if all_same_digit(&cleaned[2..]) {
            return ValidationResult {
                is_valid: false,
                confidence: 0.2,
                message: "Telefone com dígitos repetidos".to_string(),
                cleaned_value: Some(cleaned),
            };
        }

        let phone_type = if cleaned.len() == 11 { "celular" } else { "fixo" };
        ValidationResult {
            is_valid: true,
            confidence: 0.90,
            message: format!("Telefone {} válido - DDD {}", phone_type, ddd),
            cleaned_value: Some(cleaned),
        }
    }
}

// ---------------------------------------------------------------------------
// Email
// ---------------------------------------------------------------------------

/// Validador estrutural de email (local@domínio.tld, tld ≥ 2).
pub struct EmailValidator {
    pattern: Regex,
}

/// TLDs frequentes; um domínio conhecido rende confiança 0.95 em vez de 0.85.
const COMMON_TLDS: &[&str] = &[
    "com", "com.br", "org", "org.br", "net", "net.br", "gov", "gov.br",
    "edu", "edu.br", "mil", "mil.br", "info", "biz", "io", "co",
    "br", "pt", "us", "uk", "de", "fr", "es", "it", "jp", "cn",
];

impl EmailValidator {
    pub fn new() -> Self {
        EmailValidator {
            pattern: Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
                .expect("regex de email deve compilar"),
        }
    }
}

impl Default for EmailValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentValidator for EmailValidator {
    fn validate(&self, raw: &str) -> ValidationResult {
        let email = raw.trim().to_lowercase();

        if !self.pattern.is_match(&email) {
            return ValidationResult::reject("Formato de email inválido");
        }

        // O regex garante exatamente a forma local@domínio
        let (local, domain) = match email.rsplit_once('@') {
            Some(parts) => parts,
            None => return ValidationResult::reject("Email deve conter exatamente um @"),
        };

        if local.len() > 64 {
            return ValidationResult {
                is_valid: false,
                confidence: 0.3,
                message: "Parte local do email muito longa (máximo 64 caracteres)".to_string(),
                cleaned_value: None,
            };
        }
        if domain.len() > 255 {
            return ValidationResult {
                is_valid: false,
                confidence: 0.3,
                message: "Domínio do email muito longo (máximo 255 caracteres)".to_string(),
                cleaned_value: None,
            };
        }

        let known_tld = COMMON_TLDS
            .iter()
            .any(|t| domain.ends_with(&format!(".{}", t)));
        let confidence = if known_tld { 0.95 } else { 0.85 };

        ValidationResult {
            is_valid: true,
            confidence,
            message: "Email com formato válido".to_string(),
            cleaned_value: Some(email),
        }
    }
}

// ---------------------------------------------------------------------------
// CEP
// ---------------------------------------------------------------------------

/// Validador de CEP (8 dígitos; o primeiro indica a faixa geográfica).
pub struct CepValidator;

impl CepValidator {
    /// Formata no padrão XXXXX-XXX.
    pub fn format(raw: &str) -> String {
        let cleaned = clean_digits(raw);
        if cleaned.len() == 8 {
            format!("{}-{}", &cleaned[..5], &cleaned[5..])
        } else {
            raw.to_string()
        }
    }

    fn region(first_digit: char) -> &'static str {
        match first_digit {
            '0' => "São Paulo - Capital",
            '1' => "São Paulo - Interior",
            '2' => "Rio de Janeiro / Espírito Santo",
            '3' => "Minas Gerais",
            '4' => "Bahia / Sergipe",
            '5' => "Nordeste (PE, AL, PB, RN)",
            '6' => "Norte/Nordeste (CE, PI, MA, PA, AM, AC, AP, RR)",
            '7' => "Centro-Oeste (GO, TO, MT, MS, DF)",
            '8' => "Sul (PR, SC)",
            _ => "Rio Grande do Sul",
        }
    }
}

impl DocumentValidator for CepValidator {
    fn validate(&self, raw: &str) -> ValidationResult {
        let cleaned = clean_digits(raw);

        if cleaned.len() != 8 {
            return ValidationResult::reject(format!(
                "CEP deve ter 8 dígitos, encontrado: {}",
                cleaned.len()
            ));
        }
        if all_same_digit(&cleaned) {
            return ValidationResult::reject("CEP com dígitos repetidos");
        }

        let first = cleaned.chars().next().unwrap_or('0');
        ValidationResult {
            is_valid: true,
            confidence: 0.85,
            message: format!("CEP válido - Região: {}", CepValidator::region(first)),
            cleaned_value: Some(cleaned),
        }
    }
}

// ---------------------------------------------------------------------------
// Registro
// ---------------------------------------------------------------------------

/// Registro imutável validador-por-tipo, compartilhado entre requisições.
pub struct Validators {
    cpf: CpfValidator,
    cnpj: CnpjValidator,
    phone: PhoneValidator,
    email: EmailValidator,
    cep: CepValidator,
}

impl Validators {
    pub fn new() -> Self {
        Validators {
            cpf: CpfValidator,
            cnpj: CnpjValidator,
            phone: PhoneValidator,
            email: EmailValidator::new(),
            cep: CepValidator,
        }
    }

    /// Validador para o tipo, se existir. Telefone e celular compartilham o
    /// mesmo validador; tipos sem validação matemática retornam `None`.
    pub fn for_type(&self, pii_type: PiiType) -> Option<&dyn DocumentValidator> {
        match pii_type {
            PiiType::Cpf => Some(&self.cpf),
            PiiType::Cnpj => Some(&self.cnpj),
            PiiType::Telefone | PiiType::Celular => Some(&self.phone),
            PiiType::Email => Some(&self.email),
            PiiType::Cep => Some(&self.cep),
            _ => None,
        }
    }
}

impl Default for Validators {
    fn default() -> Self {
        Self::new()
    }
}
