//! Mark-based answer schemas.
//!
//! Each schema fixes the prompt structure, token budget and sampling
//! temperature for one mark value. Marks outside the table resolve to the
//! nearest key; on a tie the smaller key wins.

use serde::Serialize;

/// Answer layout for one mark value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnswerSchema {
    pub marks: i64,
    pub name: &'static str,
    pub structure: &'static str,
    pub guidelines: &'static [&'static str],
    pub max_tokens: u32,
    pub temperature: f64,
}

/// The `schema` block returned alongside an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaSummary {
    pub name: String,
    pub structure: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

const MIN_MARKS: i64 = 1;
const MAX_INPUT_MARKS: i64 = 20;
const CLAMPED_MAX_MARKS: i64 = 15;

/// Sorted ascending by `marks`; the nearest-key scan relies on it.
static SCHEMAS: [AnswerSchema; 8] = [
    AnswerSchema {
        marks: 1,
        name: "1 Mark Answer",
        structure: "Definition only",
        guidelines: &[
            "Provide only a concise definition",
            "1-2 sentences maximum",
            "Use clear, precise language",
            "No examples or elaboration",
        ],
        max_tokens: 100,
        temperature: 0.2,
    },
    AnswerSchema {
        marks: 2,
        name: "2 Mark Answer",
        structure: "Definition + Example",
        guidelines: &[
            "Start with a clear definition (1-2 sentences)",
            "Provide one relevant example",
            "Keep it concise and direct",
            "Example should illustrate the concept",
        ],
        max_tokens: 200,
        temperature: 0.3,
    },
    AnswerSchema {
        marks: 3,
        name: "3 Mark Answer",
        structure: "Definition + Explanation + Example",
        guidelines: &[
            "Begin with a clear definition",
            "Explain the concept in 2-3 sentences",
            "Provide a relevant example with context",
            "Ensure logical flow between sections",
        ],
        max_tokens: 300,
        temperature: 0.3,
    },
    AnswerSchema {
        marks: 4,
        name: "4 Mark Answer",
        structure: "Definition + Detailed Explanation + Examples",
        guidelines: &[
            "Start with a comprehensive definition",
            "Provide detailed explanation with key points",
            "Include 1-2 examples with context",
            "Cover important aspects of the topic",
        ],
        max_tokens: 400,
        temperature: 0.3,
    },
    AnswerSchema {
        marks: 5,
        name: "5 Mark Answer",
        structure: "Definition + Explanation + Multiple Examples + Key Points",
        guidelines: &[
            "Begin with a complete definition",
            "Explain the concept thoroughly",
            "Provide 2-3 diverse examples",
            "Include key points or characteristics",
            "Show depth of understanding",
        ],
        max_tokens: 500,
        temperature: 0.3,
    },
    AnswerSchema {
        marks: 7,
        name: "7 Mark Answer",
        structure: "Comprehensive Coverage",
        guidelines: &[
            "Detailed definition and context",
            "Thorough explanation with multiple aspects",
            "Multiple examples from different contexts",
            "Include advantages/disadvantages or applications",
            "Show comprehensive understanding",
        ],
        max_tokens: 700,
        temperature: 0.3,
    },
    AnswerSchema {
        marks: 10,
        name: "10 Mark Answer",
        structure: "Complete Analysis",
        guidelines: &[
            "Comprehensive definition with context",
            "Detailed explanation covering all aspects",
            "Multiple examples with detailed context",
            "Include types, categories, or classifications",
            "Discuss applications, advantages, and limitations",
            "Show critical analysis and depth",
        ],
        max_tokens: 1000,
        temperature: 0.3,
    },
    AnswerSchema {
        marks: 15,
        name: "15 Mark Answer",
        structure: "In-Depth Essay Style",
        guidelines: &[
            "Structured with introduction, body, conclusion",
            "Comprehensive coverage of all aspects",
            "Multiple detailed examples and case studies",
            "Compare and contrast different approaches",
            "Discuss real-world applications",
            "Include diagrams or structured explanations where relevant",
            "Critical analysis and evaluation",
        ],
        max_tokens: 1500,
        temperature: 0.3,
    },
];

const SYSTEM_PREAMBLE: &str = "You are an expert academic tutor helping college students prepare for exams. \nYou provide answers following strict academic marking schemes.";

const ANSWER_RULES: &str = "IMPORTANT RULES:
- Answer ONLY based on the provided context
- If context lacks information, state it clearly
- Use academic language appropriate for college level
- Structure your answer according to the mark allocation
- Be precise and exam-focused
- Do not add information not present in the context";

const FORMAT_1: &str = "\nDefinition: [Your concise definition here]";
const FORMAT_2: &str = "\nDefinition: [Clear definition]\nExample: [One relevant example]";
const FORMAT_3: &str =
    "\nDefinition: [Clear definition]\nExplanation: [Brief explanation]\nExample: [Relevant example]";
const FORMAT_4_5: &str = "\nDefinition: [Comprehensive definition]\nExplanation: [Detailed explanation with key points]\nExamples: [1-2 relevant examples]";
const FORMAT_7_10: &str = "\nDefinition: [Complete definition with context]\nExplanation: [Thorough explanation covering multiple aspects]\nExamples: [Multiple diverse examples]\nKey Points/Applications: [Important aspects or real-world applications]";
const FORMAT_ESSAY: &str = "\nIntroduction: [Brief overview]\nDefinition: [Comprehensive definition]\nDetailed Explanation: [Cover all major aspects]\nExamples: [Multiple detailed examples]\nApplications/Types: [Practical applications or classifications]\nAnalysis: [Critical evaluation]\nConclusion: [Summary of key points]";

/// Exact table hit, else the nearest key (smaller key on ties). Never fails.
pub fn schema_for(marks: i64) -> &'static AnswerSchema {
    let mut best = &SCHEMAS[0];
    let mut best_distance = best.marks.abs_diff(marks);
    for schema in SCHEMAS.iter().skip(1) {
        let distance = schema.marks.abs_diff(marks);
        // strict comparison keeps the earlier (smaller) key on ties
        if distance < best_distance {
            best = schema;
            best_distance = distance;
        }
    }

    if best.marks != marks {
        tracing::info!(
            "No exact schema for {} marks, using {} mark schema",
            marks,
            best.marks
        );
    }
    best
}

/// Clamps below 1 to 1 and above 20 to 15. Everything in between passes through.
pub fn validate_marks(marks: i64) -> i64 {
    if marks < MIN_MARKS {
        tracing::warn!("Marks {} too low, using {}", marks, MIN_MARKS);
        return MIN_MARKS;
    }
    if marks > MAX_INPUT_MARKS {
        tracing::warn!("Marks {} too high, using {}", marks, CLAMPED_MAX_MARKS);
        return CLAMPED_MAX_MARKS;
    }
    marks
}

/// Skeleton bands use the mark value itself, not the resolved schema key.
fn format_skeleton(marks: i64) -> &'static str {
    match marks {
        1 => FORMAT_1,
        2 => FORMAT_2,
        3 => FORMAT_3,
        4..=5 => FORMAT_4_5,
        7..=10 => FORMAT_7_10,
        _ => FORMAT_ESSAY,
    }
}

pub fn build_system_prompt(marks: i64) -> String {
    let schema = schema_for(marks);
    let guidelines = schema
        .guidelines
        .iter()
        .map(|g| format!("- {}", g))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{}\n\nMARKING SCHEME: {}\nSTRUCTURE: {}\n\nGUIDELINES:\n{}\n\n{}\n\nFORMAT YOUR ANSWER AS:\n{}",
        SYSTEM_PREAMBLE,
        schema.name,
        schema.structure,
        guidelines,
        ANSWER_RULES,
        format_skeleton(marks)
    )
}

pub fn build_user_prompt(query: &str, context: &str, marks: i64) -> String {
    let schema = schema_for(marks);
    format!(
        "Context Information:\n{}\n\nQuestion ({} marks): {}\n\nProvide a {} following the structure: {}",
        context, marks, query, schema.name, schema.structure
    )
}

/// User prompt paired with a caller-supplied system prompt.
pub fn build_custom_user_prompt(query: &str, context: &str) -> String {
    format!("Context: {}\n\nQuestion: {}", context, query)
}

pub fn temperature_for(marks: i64) -> f64 {
    schema_for(marks).temperature
}

pub fn max_tokens_for(marks: i64) -> u32 {
    schema_for(marks).max_tokens
}

impl AnswerSchema {
    /// Summary with effective sampling values substituted.
    pub fn summary(&self, temperature: f64, max_tokens: u32) -> SchemaSummary {
        SchemaSummary {
            name: self.name.to_string(),
            structure: self.structure.to_string(),
            max_tokens,
            temperature,
        }
    }
}
