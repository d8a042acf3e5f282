//! Grounding context and prompt assembly

use crate::corpus::Corpus;
use crate::retriever::{Retriever, DEFAULT_TOP_K};
use closurecast_core::{Error, Result, ScoredDocument};
use std::sync::Arc;
use tracing::debug;

const CONTEXT_PLACEHOLDER: &str = "{context}";
const QUERY_PLACEHOLDER: &str = "{query}";

/// Separator placed between document bodies
pub const DOCUMENT_SEPARATOR: &str = "\n\n";

/// Grounding instructions for closure-risk questions
pub const DEFAULT_PROMPT_TEMPLATE: &str = "다음은 소상공인 폐업 위기 예측에 관한 전문 지식 자료입니다. 이 문서의 내용을 바탕으로 질문에 답변해주세요.

=== 참고 문서 ===
{context}

=== 사용자 질문 ===
{query}

=== 답변 지침 ===
- 위 문서의 내용을 근거로 명확하고 구체적으로 답변하세요
- 수치나 데이터가 있으면 정확히 인용하세요
- 문서에 없는 내용은 추측하지 마세요
- 실용적이고 구체적인 조언을 제공하세요
- 친절하고 이해하기 쉽게 설명하세요
- **나 ### 같은 기호들을 사용해서 글의 제목, 목록, 강조(굵게), 인용 등의 서식을 지정하는 언어인 **마크업 언어(Markup Language)는 사용하지마세요.";

/// Prompt text with `{context}` and `{query}` placeholders
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Create a template; both placeholders must be present
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for placeholder in [CONTEXT_PLACEHOLDER, QUERY_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(Error::config(format!(
                    "prompt template is missing the {} placeholder",
                    placeholder
                )));
            }
        }
        Ok(Self { template })
    }

    /// Substitute placeholders in a single pass, so placeholder-like text
    /// inside the context or query is left untouched.
    pub fn render(&self, context: &str, query: &str) -> String {
        let mut out = String::with_capacity(self.template.len() + context.len() + query.len());
        let mut rest = self.template.as_str();

        loop {
            let next = [(CONTEXT_PLACEHOLDER, context), (QUERY_PLACEHOLDER, query)]
                .into_iter()
                .filter_map(|(placeholder, value)| {
                    rest.find(placeholder).map(|pos| (pos, placeholder, value))
                })
                .min_by_key(|(pos, _, _)| *pos);

            match next {
                Some((pos, placeholder, value)) => {
                    out.push_str(&rest[..pos]);
                    out.push_str(value);
                    rest = &rest[pos + placeholder.len()..];
                }
                None => {
                    out.push_str(rest);
                    return out;
                }
            }
        }
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self {
            template: DEFAULT_PROMPT_TEMPLATE.to_string(),
        }
    }
}

/// Documents selected for one query, joined into a context block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledContext {
    /// Selected documents in ranked order. Fallback documents carry score 0.
    pub documents: Vec<ScoredDocument>,

    /// Whether nothing matched and the default documents were used
    pub fallback: bool,

    /// Document bodies joined by [`DOCUMENT_SEPARATOR`]
    pub text: String,
}

/// Builds grounding context and prompts from a retriever's ranking
pub struct ContextAssembler {
    retriever: Arc<dyn Retriever>,
    corpus: Arc<Corpus>,
    template: PromptTemplate,
    fallback_count: usize,
}

impl ContextAssembler {
    pub fn new(retriever: Arc<dyn Retriever>, corpus: Arc<Corpus>) -> Self {
        Self {
            retriever,
            corpus,
            template: PromptTemplate::default(),
            fallback_count: DEFAULT_TOP_K,
        }
    }

    /// Replace the prompt template
    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// How many leading corpus entries to use when nothing matches
    pub fn with_fallback_count(mut self, count: usize) -> Self {
        self.fallback_count = count;
        self
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn retriever(&self) -> &dyn Retriever {
        self.retriever.as_ref()
    }

    /// Rank the corpus and join the selected bodies.
    ///
    /// Falls back to the first entries of the corpus when the ranking is empty.
    pub async fn assemble(&self, query: &str) -> Result<AssembledContext> {
        let ranked = self.retriever.rank(query).await?;

        let (documents, fallback) = if ranked.is_empty() {
            let defaults = self
                .corpus
                .head(self.fallback_count)
                .iter()
                .cloned()
                .map(|entry| ScoredDocument::new(entry, 0))
                .collect();
            (defaults, true)
        } else {
            (ranked, false)
        };

        let text = documents
            .iter()
            .map(|d| d.entry.text.as_str())
            .collect::<Vec<_>>()
            .join(DOCUMENT_SEPARATOR);

        debug!(
            retriever = self.retriever.name(),
            documents = documents.len(),
            fallback,
            "Context assembled"
        );

        Ok(AssembledContext {
            documents,
            fallback,
            text,
        })
    }

    /// Assemble context for `query` and render the full prompt
    pub async fn build_prompt(&self, query: &str) -> Result<String> {
        let context = self.assemble(query).await?;
        Ok(self.render_prompt(&context, query))
    }

    /// Render the prompt for an already assembled context
    pub fn render_prompt(&self, context: &AssembledContext, query: &str) -> String {
        self.template.render(&context.text, query)
    }
}
