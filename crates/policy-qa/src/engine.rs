use std::sync::Arc;

use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::fetch::DocumentFetcher;
use crate::llm::TextGenerator;
use crate::processing::{ClauseSegmenter, TextExtractor};
use crate::query::QueryNormalizer;
use crate::ranking::RelevanceRanker;
use crate::synthesis::AnswerSynthesizer;
use crate::types::{Answer, DocumentSource};

/// End-to-end pipeline for one request: document in, one answer per
/// question out. All working state is request-scoped; nothing is cached
/// across calls.
pub struct ClaimPipeline {
    config: PipelineConfig,
    extractor: TextExtractor,
    segmenter: ClauseSegmenter,
    ranker: RelevanceRanker,
    synthesizer: AnswerSynthesizer,
    fetcher: DocumentFetcher,
}

impl ClaimPipeline {
    pub fn new(
        config: PipelineConfig,
        generator: Arc<dyn TextGenerator>,
    ) -> Result<Self, PipelineError> {
        config.validate().map_err(PipelineError::Config)?;

        Ok(Self {
            extractor: TextExtractor::new(),
            segmenter: ClauseSegmenter::new(config.segmentation.clone()),
            ranker: RelevanceRanker::new(config.ranking.clone()),
            synthesizer: AnswerSynthesizer::new(generator, config.synthesis.clone()),
            fetcher: DocumentFetcher::new(&config.fetch)?,
            config,
        })
    }

    /// Process a batch of questions against one document. Returns exactly
    /// one answer per question, in input order; per-question failures
    /// degrade to fallback answers while fetch/extraction/segmentation
    /// failures abort the whole request.
    pub async fn run(
        &self,
        source: DocumentSource,
        questions: &[String],
    ) -> Result<Vec<Answer>, PipelineError> {
        let request_id = Uuid::new_v4();

        let bytes = match source {
            DocumentSource::Bytes(bytes) => bytes,
            DocumentSource::Url(url) => self.fetcher.fetch(&url).await?,
        };

        let text = self.extractor.extract(&bytes)?;
        if text.trim().is_empty() {
            return Err(PipelineError::NoDocumentText);
        }

        let clauses = self.segmenter.segment(&text);
        if clauses.is_empty() {
            return Err(PipelineError::NoClausesFound);
        }

        tracing::info!(
            %request_id,
            clauses = clauses.len(),
            questions = questions.len(),
            "document segmented, answering questions"
        );

        let mut answers = Vec::with_capacity(questions.len());
        for (index, question) in questions.iter().enumerate() {
            let answer = self.answer_question(question, &clauses).await;
            tracing::debug!(%request_id, index, "question answered");
            answers.push(answer);
        }

        Ok(answers)
    }

    /// normalize → rank → (retry with the raw question) → synthesize.
    /// Never fails: an empty match set is passed through to the
    /// synthesizer, which produces the appropriate fallback answer.
    async fn answer_question(&self, question: &str, clauses: &[String]) -> Answer {
        let top_k = self.config.ranking.top_k;

        let enhanced = QueryNormalizer::normalize(question);
        let mut matches = self.ranker.rank(&enhanced, clauses, top_k);

        if matches.is_empty() && enhanced != question {
            // The enhanced form can over-filter; retry with the raw question.
            matches = self.ranker.rank(question, clauses, top_k);
        }

        if matches.is_empty() {
            tracing::debug!(question = %question, "no clauses matched");
        }

        let context: Vec<String> = matches.into_iter().map(|m| m.text).collect();
        self.synthesizer.synthesize(question, &context).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::llm::GenerationConfig;
    use crate::synthesis::AnswerMode;
    use crate::types::ClaimDecision;
    use async_trait::async_trait;

    const POLICY_TEXT: &str = "Hospitalization claims are payable only after 12 months of continuous coverage. \
        Dental procedures are excluded from coverage unless caused by an accident. \
        Premium payments are due on the first day of each quarter without exception.";

    /// Echoes a fixed structured decision; records nothing.
    struct StubGenerator;

    #[async_trait]
    impl TextGenerator for StubGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            _config: &GenerationConfig,
        ) -> Result<String, GenerationError> {
            Ok(r#"{"decision": "Rejected", "amount": "N/A", "justification": "Coverage requires 12 months, only 10 elapsed"}"#.to_string())
        }
    }

    struct FailingGenerator;

    #[async_trait]
    impl TextGenerator for FailingGenerator {
        async fn generate(
            &self,
            _prompt: &str,
            _config: &GenerationConfig,
        ) -> Result<String, GenerationError> {
            Err(GenerationError::EmptyCompletion)
        }
    }

    fn pipeline(generator: impl TextGenerator + 'static) -> ClaimPipeline {
        ClaimPipeline::new(PipelineConfig::default(), Arc::new(generator)).unwrap()
    }

    #[tokio::test]
    async fn one_answer_per_question_in_order() {
        let pipeline = pipeline(StubGenerator);
        let questions = vec![
            "I was hospitalized 10 months after starting the policy.".to_string(),
            "Is dental treatment covered?".to_string(),
            "When are premiums due?".to_string(),
        ];
        let answers = pipeline
            .run(DocumentSource::Bytes(POLICY_TEXT.as_bytes().to_vec()), &questions)
            .await
            .unwrap();
        assert_eq!(answers.len(), questions.len());
    }

    #[tokio::test]
    async fn empty_batch_returns_empty_answers() {
        let pipeline = pipeline(StubGenerator);
        let answers = pipeline
            .run(DocumentSource::Bytes(POLICY_TEXT.as_bytes().to_vec()), &[])
            .await
            .unwrap();
        assert!(answers.is_empty());
    }

    #[tokio::test]
    async fn classification_yields_rejected_for_waiting_period_violation() {
        let pipeline = pipeline(StubGenerator);
        let answers = pipeline
            .run(
                DocumentSource::Bytes(POLICY_TEXT.as_bytes().to_vec()),
                &["I was hospitalized 10 months after starting the policy.".to_string()],
            )
            .await
            .unwrap();

        match &answers[0] {
            Answer::Decision(ClaimDecision { decision, .. }) => assert_eq!(decision, "Rejected"),
            Answer::Text(t) => panic!("expected decision, got {t}"),
        }
    }

    #[tokio::test]
    async fn document_without_usable_sentences_is_a_domain_error() {
        let pipeline = pipeline(StubGenerator);
        let err = pipeline
            .run(
                DocumentSource::Bytes(b"Short. Tiny. No. Yes.".to_vec()),
                &["anything".to_string()],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::NoClausesFound));
    }

    #[tokio::test]
    async fn generation_failure_still_yields_an_answer_per_question() {
        let pipeline = pipeline(FailingGenerator);
        let questions = vec![
            "Is hospitalization covered?".to_string(),
            "Is dental covered?".to_string(),
        ];
        let answers = pipeline
            .run(DocumentSource::Bytes(POLICY_TEXT.as_bytes().to_vec()), &questions)
            .await
            .unwrap();
        assert_eq!(answers.len(), 2);
        for answer in answers {
            match answer {
                Answer::Decision(d) => assert!(!d.justification.is_empty()),
                Answer::Text(t) => assert!(!t.is_empty()),
            }
        }
    }

    #[tokio::test]
    async fn open_mode_unmatched_question_gets_sentinel() {
        let mut config = PipelineConfig::default();
        config.synthesis.mode = AnswerMode::OpenQa;
        let pipeline = ClaimPipeline::new(config, Arc::new(FailingGenerator)).unwrap();

        let answers = pipeline
            .run(
                DocumentSource::Bytes(POLICY_TEXT.as_bytes().to_vec()),
                &["zebra quagga wildebeest migration".to_string()],
            )
            .await
            .unwrap();
        assert_eq!(
            answers[0],
            Answer::Text(crate::synthesis::NO_INFORMATION_ANSWER.to_string())
        );
    }
}
