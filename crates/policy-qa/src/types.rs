use serde::{Deserialize, Serialize};

/// Where the document bytes come from: an already-uploaded buffer or a URL
/// to fetch over HTTP.
#[derive(Debug, Clone)]
pub enum DocumentSource {
    Bytes(Vec<u8>),
    Url(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Text,
}

impl DocumentFormat {
    /// Sniff the format from leading magic bytes. DOCX is a ZIP container,
    /// so any ZIP local-file header is treated as DOCX here; the extractor
    /// verifies that `word/document.xml` is actually present.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"%PDF") {
            Some(Self::Pdf)
        } else if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            Some(Self::Docx)
        } else if std::str::from_utf8(bytes).is_ok() {
            Some(Self::Text)
        } else {
            None
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" | "md" | "text" => Some(Self::Text),
            _ => None,
        }
    }
}

/// A clause paired with its similarity score against a query, in [0, 1].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredClause {
    pub text: String,
    pub score: f32,
}

/// Structured claim outcome returned by classification-mode synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimDecision {
    pub decision: String,
    pub amount: String,
    pub justification: String,
}

impl ClaimDecision {
    pub fn rejected(justification: impl Into<String>) -> Self {
        Self {
            decision: "Rejected".to_string(),
            amount: "N/A".to_string(),
            justification: justification.into(),
        }
    }
}

/// Final per-question result. Classification mode produces `Decision`,
/// open-QA mode produces `Text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Decision(ClaimDecision),
    Text(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_pdf_and_docx_magic() {
        assert_eq!(DocumentFormat::sniff(b"%PDF-1.7 ..."), Some(DocumentFormat::Pdf));
        assert_eq!(
            DocumentFormat::sniff(&[0x50, 0x4B, 0x03, 0x04, 0x00]),
            Some(DocumentFormat::Docx)
        );
        assert_eq!(
            DocumentFormat::sniff("plain policy text".as_bytes()),
            Some(DocumentFormat::Text)
        );
        assert_eq!(DocumentFormat::sniff(&[0xFF, 0xFE, 0x00, 0x80]), None);
    }

    #[test]
    fn maps_extensions_case_insensitively() {
        assert_eq!(DocumentFormat::from_extension("PDF"), Some(DocumentFormat::Pdf));
        assert_eq!(DocumentFormat::from_extension("docx"), Some(DocumentFormat::Docx));
        assert_eq!(DocumentFormat::from_extension("exe"), None);
    }

    #[test]
    fn decision_serializes_with_exact_fields() {
        let d = ClaimDecision::rejected("policy not active long enough");
        let json = serde_json::to_value(&d).unwrap();
        assert_eq!(json["decision"], "Rejected");
        assert_eq!(json["amount"], "N/A");
        assert_eq!(json["justification"], "policy not active long enough");
    }
}
