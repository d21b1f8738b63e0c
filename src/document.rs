//! Typed strategy document and the markdown artifact writer.
//!
//! The Writer role is asked for a fenced JSON document matching
//! [`StrategyDocument`]. When that parse succeeds the artifact is rendered
//! section by section from the typed model; when it fails the raw writer
//! output is saved as-is so a run never loses its result to a schema
//! mismatch.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::errors::PipelineError;

/// A named keyword cluster with its targeting rationale.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopicCluster {
    pub name: String,
    pub keywords: Vec<String>,
    pub target: String,
}

/// A topic's position in the recommended execution order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopicPriority {
    pub topic_name: String,
    pub score: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentTemplate {
    pub category: String,
    pub title_formula: String,
    pub structure: Vec<String>,
    pub key_elements: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExecutionPlan {
    pub timeline: Vec<String>,
    pub resources: Vec<String>,
    pub kpis: Vec<String>,
}

/// The full content-strategy document the pipeline produces.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategyDocument {
    pub title: String,
    pub generated_at: String,
    pub business_scenario: String,

    pub target_audience: String,
    pub pain_points: Vec<String>,
    pub decision_factors: Vec<String>,

    pub core_topics: Vec<TopicCluster>,
    pub secondary_topics: Vec<TopicCluster>,
    pub longtail_topics: Vec<TopicCluster>,

    pub priority_criteria: Vec<String>,
    pub priority_ranking: Vec<TopicPriority>,

    pub templates: Vec<ContentTemplate>,

    pub execution: ExecutionPlan,

    #[serde(default)]
    pub notes: Vec<String>,
}

impl StrategyDocument {
    pub fn to_markdown(&self) -> String {
        let mut lines: Vec<String> = vec![
            format!("# {}", self.title),
            String::new(),
            format!("> Generated: {}", self.generated_at),
            format!("> Business scenario: {}", self.business_scenario),
            String::new(),
            "---".to_string(),
            String::new(),
            "## Contents".to_string(),
            "1. Business Scenario".to_string(),
            "2. Target Audience".to_string(),
            "3. Topic Keyword Clusters".to_string(),
            "4. Topic Priorities".to_string(),
            "5. Content Templates".to_string(),
            "6. Execution Plan".to_string(),
            "7. Appendix".to_string(),
            String::new(),
            "---".to_string(),
            String::new(),
            "## 1. Business Scenario".to_string(),
            String::new(),
            self.business_scenario.clone(),
            String::new(),
            "---".to_string(),
            String::new(),
            "## 2. Target Audience".to_string(),
            String::new(),
            format!("**Core audience**: {}", self.target_audience),
            String::new(),
            "**Key pain points**:".to_string(),
        ];

        for point in &self.pain_points {
            lines.push(format!("- {point}"));
        }

        lines.push(String::new());
        lines.push("**Decision factors**:".to_string());
        for factor in &self.decision_factors {
            lines.push(format!("- {factor}"));
        }

        lines.extend([
            String::new(),
            "---".to_string(),
            String::new(),
            "## 3. Topic Keyword Clusters".to_string(),
            String::new(),
            "### 3.1 Core topics (high value, high conversion)".to_string(),
            String::new(),
        ]);
        push_clusters(&mut lines, &self.core_topics);

        lines.extend([
            String::new(),
            "### 3.2 Secondary topics (medium value, broader reach)".to_string(),
            String::new(),
        ]);
        push_clusters(&mut lines, &self.secondary_topics);

        lines.extend([
            String::new(),
            "### 3.3 Long-tail topics (low competition, precise intent)".to_string(),
            String::new(),
        ]);
        push_clusters(&mut lines, &self.longtail_topics);

        lines.extend([
            String::new(),
            "---".to_string(),
            String::new(),
            "## 4. Topic Priorities".to_string(),
            String::new(),
            "### 4.1 Scoring criteria".to_string(),
            String::new(),
        ]);
        for criterion in &self.priority_criteria {
            lines.push(format!("- {criterion}"));
        }

        lines.extend([
            String::new(),
            "### 4.2 Recommended execution order".to_string(),
            String::new(),
        ]);
        for (i, item) in self.priority_ranking.iter().enumerate() {
            lines.push(format!(
                "{}. **{}** ({} pts) - {}",
                i + 1,
                item.topic_name,
                item.score,
                item.reason
            ));
        }

        lines.extend([
            String::new(),
            "---".to_string(),
            String::new(),
            "## 5. Content Templates".to_string(),
            String::new(),
        ]);
        for template in &self.templates {
            lines.push(format!("### {} template", template.category));
            lines.push(String::new());
            lines.push(format!("**Title formula**: {}", template.title_formula));
            lines.push(String::new());
            lines.push("**Structure**:".to_string());
            for (j, item) in template.structure.iter().enumerate() {
                lines.push(format!("{}. {item}", j + 1));
            }
            lines.push(String::new());
            lines.push(format!(
                "**Key elements**: {}",
                template.key_elements.join(", ")
            ));
            lines.push(String::new());
        }

        lines.extend([
            "---".to_string(),
            String::new(),
            "## 6. Execution Plan".to_string(),
            String::new(),
            "### 6.1 Timeline".to_string(),
            String::new(),
        ]);
        for item in &self.execution.timeline {
            lines.push(format!("- {item}"));
        }

        lines.extend([
            String::new(),
            "### 6.2 Resources".to_string(),
            String::new(),
        ]);
        for item in &self.execution.resources {
            lines.push(format!("- {item}"));
        }

        lines.extend([String::new(), "### 6.3 KPIs".to_string(), String::new()]);
        for item in &self.execution.kpis {
            lines.push(format!("- {item}"));
        }

        lines.extend([
            String::new(),
            "---".to_string(),
            String::new(),
            "## 7. Appendix".to_string(),
            String::new(),
            "### 7.1 Notes".to_string(),
            String::new(),
        ]);
        if self.notes.is_empty() {
            lines.push(
                "- Generated from current market data; refresh periodically".to_string(),
            );
            lines.push("- Adjust the plan against observed results during execution".to_string());
        } else {
            for note in &self.notes {
                lines.push(format!("- {note}"));
            }
        }

        lines.extend([
            String::new(),
            "---".to_string(),
            String::new(),
            "**End of document**".to_string(),
        ]);

        lines.join("\n")
    }
}

fn push_clusters(lines: &mut Vec<String>, clusters: &[TopicCluster]) {
    for topic in clusters {
        lines.push(format!(
            "- **{}** | Keywords: {} | Target: {}",
            topic.name,
            topic.keywords.join(", "),
            topic.target
        ));
    }
}

/// Pull the contents of the first ```json fenced block, if any.
pub fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find("```json")? + "```json".len();
    let rest = &text[start..];
    let end = rest.find("```")?;
    Some(rest[..end].trim())
}

/// Turn the Writer's raw output into the final markdown artifact.
///
/// Preference order: a fenced JSON document parsed into the typed model,
/// then bare JSON, then the raw text untouched.
pub fn render_final(writer_output: &str) -> String {
    let candidate = extract_json_block(writer_output).unwrap_or_else(|| writer_output.trim());
    match serde_json::from_str::<StrategyDocument>(candidate) {
        Ok(doc) => doc.to_markdown(),
        Err(e) => {
            tracing::debug!(error = %e, "writer output is not a structured document, saving as-is");
            writer_output.trim().to_string()
        }
    }
}

/// Write the artifact to `strategy_YYYYmmdd_HHMMSS.md` under `output_dir`.
pub fn save_strategy(output_dir: &Path, content: &str) -> Result<PathBuf, PipelineError> {
    let filename = format!("strategy_{}.md", Local::now().format("%Y%m%d_%H%M%S"));
    let path = output_dir.join(filename);
    std::fs::write(&path, content).map_err(|source| PipelineError::DocumentWrite {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}
