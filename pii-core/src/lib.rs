//! # pii-core — Motor de Detecção de Dados Pessoais (PII)
//!
//! Este crate implementa um pipeline completo de detecção de dados pessoais brasileiros
//! (CPF, CNPJ, telefones, e-mails, CEP, RG, nomes...) em texto livre em Português.
//! Foi projetado para triagem de documentos públicos, onde deixar passar um dado pessoal
//! custa mais caro do que marcar um falso positivo — o pipeline é deliberadamente
//! enviesado para recall, com a precisão recuperada nos estágios finais.
//!
//! ## Arquitetura do Sistema
//!
//! O sistema segue uma arquitetura de cascata linear, onde os candidatos fluem e são
//! refinados estágio a estágio:
//!
//! 1.  **Entrada**: Texto bruto (String).
//! 2.  **Padrões** ([`patterns`]): varredura por catálogo de regex precisos + padrões
//!     agressivos que aceitam números malformados, preservando offsets de byte.
//! 3.  **Modelo externo** ([`model`]): candidatos opcionais de um NER neural injetado.
//! 4.  **Fusão** ([`detector`]): padrões são autoridade de span; o modelo eleva
//!     confiança (híbrido) ou acrescenta spans disjuntos.
//! 5.  **Anti-falso-negativo** ([`contextual`]): re-varredura do texto original com
//!     regras de palavra-chave ("meu CPF é ...") que recuperam o que os regex
//!     literais rejeitaram.
//! 6.  **Validação** ([`validators`]): matemática de dígitos verificadores (mod-11)
//!     separa números reais de números inventados.
//! 7.  **Saída**: [`DetectionResult`] com entidades filtradas por limiar de confiança
//!     conforme o modo ([`DetectionMode`]).
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use pii_core::{DetectionMode, PiiDetector};
//!
//! // 1. Instancia o detector (compila catálogos de regras)
//! let detector = PiiDetector::new(DetectionMode::Balanced);
//!
//! // 2. Texto para análise
//! let text = "Sr. João Silva, CPF 529.982.247-25, fone (61) 99999-8888";
//!
//! // 3. Executa a cascata completa
//! let result = detector.detect(text);
//!
//! // 4. Exibe as entidades encontradas
//! for entity in &result.entities {
//!     println!(
//!         "{}: '{}' ({:.0}%) via {}",
//!         entity.pii_type, entity.value,
//!         entity.confidence * 100.0,
//!         entity.detection_method.name()
//!     );
//! }
//! ```
//!
//! ## Módulos Principais
//!
//! - [`detector`]: orquestrador que conecta todos os estágios e emite eventos.
//! - [`patterns`]: catálogo imutável de regras regex por tipo de dado.
//! - [`contextual`]: regras de palavra-chave + grupo de captura.
//! - [`validators`]: validadores matemáticos (CPF, CNPJ, telefone, e-mail, CEP).
//! - [`transform`]: mascaramento, anonimização e utilitários de texto.
//! - [`batch`]: processamento paralelo de coleções de textos.

pub mod batch;
pub mod config;
pub mod contextual;
pub mod detector;
pub mod entity;
pub mod model;
pub mod patterns;
pub mod report;
pub mod transform;
pub mod validators;

pub use batch::{detect_batch, BatchStats};
pub use config::{DetectionConfig, DetectionMode, DetectorError};
pub use detector::{DetectionEvent, PiiDetector, PiiDetectorBuilder};
pub use entity::{
    DetectionMethod, DetectionResult, Entity, Metadata, PiiType, Summary, ValidationStatus,
};
pub use model::{ExternalEntityModel, ModelSpan, NoopModel};
pub use patterns::{PatternCatalog, PatternCatalogBuilder};
pub use transform::{anonymize_entities, chunk_text, mask_entities, normalize_text};
pub use validators::{DocumentValidator, ValidationResult, Validators};
