use std::io::{Cursor, Read};

use crate::error::PipelineError;
use crate::types::DocumentFormat;

/// Converts raw document bytes into plain text. Stateless; the document is
/// never written to disk.
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract plain text from document bytes, sniffing the format from
    /// magic bytes. Pages/paragraphs are concatenated in document order.
    pub fn extract(&self, bytes: &[u8]) -> Result<String, PipelineError> {
        let format = DocumentFormat::sniff(bytes)
            .ok_or_else(|| PipelineError::Extraction("unrecognized document format".into()))?;
        self.extract_as(format, bytes)
    }

    pub fn extract_as(
        &self,
        format: DocumentFormat,
        bytes: &[u8],
    ) -> Result<String, PipelineError> {
        let text = match format {
            DocumentFormat::Pdf => self.extract_pdf(bytes)?,
            DocumentFormat::Docx => self.extract_docx(bytes)?,
            DocumentFormat::Text => String::from_utf8(bytes.to_vec())
                .map_err(|e| PipelineError::Extraction(format!("invalid UTF-8 text: {}", e)))?,
        };

        tracing::debug!(format = ?format, chars = text.len(), "extracted document text");
        Ok(text)
    }

    fn extract_pdf(&self, bytes: &[u8]) -> Result<String, PipelineError> {
        let text = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| PipelineError::Extraction(format!("PDF parse failed: {}", e)))?;

        // Drop layout artifacts: trim lines, skip blanks.
        let cleaned = text
            .lines()
            .map(|line| line.trim())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        Ok(cleaned)
    }

    fn extract_docx(&self, bytes: &[u8]) -> Result<String, PipelineError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| PipelineError::Extraction(format!("DOCX is not a valid ZIP: {}", e)))?;

        let mut xml_content = String::new();
        {
            let mut document_xml = archive.by_name("word/document.xml").map_err(|_| {
                PipelineError::Extraction("DOCX missing word/document.xml".into())
            })?;
            document_xml
                .read_to_string(&mut xml_content)
                .map_err(|e| PipelineError::Extraction(format!("failed to read document.xml: {}", e)))?;
        }

        Ok(docx_paragraph_text(&xml_content))
    }
}

impl Default for TextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull visible text out of a DOCX `document.xml`: one line per `<w:p>`
/// paragraph, concatenating the contents of its `<w:t>` runs.
fn docx_paragraph_text(xml: &str) -> String {
    let mut result = String::new();
    let mut pos = 0;

    while let Some(p_start) = xml[pos..].find("<w:p") {
        let abs_p_start = pos + p_start;
        let p_end = match xml[abs_p_start..].find("</w:p>") {
            Some(end) => abs_p_start + end + "</w:p>".len(),
            None => xml.len(),
        };

        let paragraph = &xml[abs_p_start..p_end];
        let mut line = String::new();
        let mut t_pos = 0;

        while let Some(t_start) = paragraph[t_pos..].find("<w:t") {
            let abs_t_start = t_pos + t_start;
            // Skip past the opening tag (may carry attributes like xml:space).
            let content_start = match paragraph[abs_t_start..].find('>') {
                Some(gt) => abs_t_start + gt + 1,
                None => break,
            };
            let content_end = match paragraph[content_start..].find("</w:t>") {
                Some(end) => content_start + end,
                None => break,
            };
            line.push_str(&paragraph[content_start..content_end]);
            t_pos = content_end + "</w:t>".len();
        }

        let line = line
            .replace("&amp;", "&")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&apos;", "'");

        if !line.trim().is_empty() {
            result.push_str(line.trim());
            result.push('\n');
        }

        pos = p_end;
    }

    result.trim_end().to_string()
}
