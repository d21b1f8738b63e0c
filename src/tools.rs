//! Local tools exposed to tool-using roles (Analyst, Critic).
//!
//! Three built-ins:
//! - `current_date` — today's date for recency-sensitive analysis
//! - `web_search` — industry/market summaries from a curated offline corpus
//! - `calculate` — arithmetic-only expression evaluator for market sizing
//!
//! The search corpus is a stand-in for a real search integration (Tavily,
//! Bing, a DuckDuckGo scraper); swapping one in means replacing
//! `web_search` only.

use serde_json::{Value, json};

/// A tool's wire-facing description: name, purpose, JSON-schema parameters.
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

/// Dispatches tool invocations by name. Unknown tools and bad arguments
/// come back as error strings fed to the model, never as process errors.
#[derive(Debug, Clone, Default)]
pub struct ToolRegistry;

impl ToolRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Specs for the named subset of tools, in the order given.
    pub fn specs_for(&self, names: &[&str]) -> Vec<ToolSpec> {
        names.iter().filter_map(|n| self.spec(n)).collect()
    }

    fn spec(&self, name: &str) -> Option<ToolSpec> {
        match name {
            "current_date" => Some(ToolSpec {
                name: "current_date",
                description: "Get today's date (YYYY-MM-DD), for recency-sensitive analysis",
                parameters: json!({"type": "object", "properties": {}}),
            }),
            "web_search" => Some(ToolSpec {
                name: "web_search",
                description: "Search for industry and market data summaries",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "query": {
                            "type": "string",
                            "description": "Search keywords, e.g. 'B2B SaaS market trends'"
                        }
                    },
                    "required": ["query"]
                }),
            }),
            "calculate" => Some(ToolSpec {
                name: "calculate",
                description: "Evaluate an arithmetic expression, for market sizing and growth rates",
                parameters: json!({
                    "type": "object",
                    "properties": {
                        "expression": {
                            "type": "string",
                            "description": "Arithmetic expression, e.g. '3000*0.15'"
                        }
                    },
                    "required": ["expression"]
                }),
            }),
            _ => None,
        }
    }

    /// Invoke a tool with its serialized JSON arguments.
    pub fn invoke(&self, name: &str, arguments: &str) -> String {
        let args: Value = serde_json::from_str(arguments).unwrap_or(Value::Null);
        match name {
            "current_date" => chrono::Local::now().format("%Y-%m-%d").to_string(),
            "web_search" => {
                let query = args.get("query").and_then(|v| v.as_str()).unwrap_or("");
                web_search(query)
            }
            "calculate" => {
                let expression = args
                    .get("expression")
                    .and_then(|v| v.as_str())
                    .unwrap_or("");
                match eval_arithmetic(expression) {
                    Ok(value) => format!("Result: {}", value),
                    Err(e) => format!("Calculation error: {}", e),
                }
            }
            other => format!("Error: unknown tool '{}'", other),
        }
    }
}

/// Curated market summaries keyed by topic keyword.
const SEARCH_CORPUS: &[(&str, &str)] = &[
    (
        "b2b saas",
        "The B2B SaaS market keeps growing, with global size projected around $300B. \
         Key trends: AI integration, verticalized solutions, subscription optimization. \
         Growth areas: sales automation, customer success, analytics platforms.",
    ),
    (
        "southeast asia",
        "Southeast Asia's digital economy is expanding fast, projected around $300B by 2025. \
         Core markets: Indonesia, Vietnam, Thailand, the Philippines. Growth drivers: \
         e-commerce (~25% YoY), fintech, online education. Users are mobile-first, \
         social-driven, and price-sensitive.",
    ),
    (
        "ivd",
        "The in-vitro diagnostics (IVD) market continues to expand, roughly $90B globally. \
         Trends: rapid POCT growth, molecular diagnostics adoption, AI-assisted diagnosis. \
         Policy tailwinds include centralized procurement and domestic substitution.",
    ),
    (
        "e-commerce",
        "E-commerce competition is intense and customer acquisition costs keep rising \
         (CAC up ~30%). Effective plays: private-domain traffic, content commerce, \
         livestream selling, social referral loops. Key metrics: ROI, repeat rate, LTV.",
    ),
    (
        "content marketing",
        "Content marketing ROI keeps improving; enterprises allocate ~25% of budget. \
         Effective formats: short video, long-form deep dives, interactive livestreams, \
         user-generated content. What works: value delivery, emotional resonance, \
         consistent cadence.",
    ),
    (
        "going global",
        "Cross-border expansion is accelerating. Hot markets: Southeast Asia, the Middle \
         East, Latin America. Success factors: localized operations, compliance, payments \
         and logistics, cultural fit. Risks: policy shifts, brand awareness, competition.",
    ),
    (
        "ai",
        "The AI market exceeds $500B globally. Main applications: large language models, \
         computer vision, intelligent support. Enterprise use: efficiency, personalization, \
         decision support. Watch-outs: data security and ethics.",
    ),
];

/// Keyword-matched lookup over the curated corpus.
fn web_search(query: &str) -> String {
    let query_lower = query.to_lowercase();
    for (keyword, summary) in SEARCH_CORPUS {
        if query_lower.contains(keyword) {
            return format!("[search results] for '{}':\n{}", query, summary);
        }
    }
    format!(
        "[search results] for '{}': no curated summary available; consider industry \
         trend reports, competitor analysis, shifting user needs, and the policy \
         environment for deeper research.",
        query
    )
}

/// Evaluate `+ - * /` and parentheses over f64. Anything outside that
/// grammar is rejected rather than interpreted.
pub fn eval_arithmetic(expression: &str) -> Result<f64, String> {
    let allowed = |c: char| c.is_ascii_digit() || "+-*/(). ".contains(c);
    if expression.is_empty() {
        return Err("empty expression".to_string());
    }
    if !expression.chars().all(allowed) {
        return Err("expression contains unsupported characters".to_string());
    }

    let tokens: Vec<char> = expression.chars().filter(|c| !c.is_whitespace()).collect();
    let mut parser = Parser { tokens, pos: 0 };
    let value = parser.expr()?;
    if parser.pos != parser.tokens.len() {
        return Err(format!("unexpected input at position {}", parser.pos));
    }
    if !value.is_finite() {
        return Err("result is not a finite number".to_string());
    }
    Ok(value)
}

struct Parser {
    tokens: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.tokens.get(self.pos).copied()
    }

    fn expr(&mut self) -> Result<f64, String> {
        let mut value = self.term()?;
        while let Some(op @ ('+' | '-')) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, String> {
        let mut value = self.factor()?;
        while let Some(op @ ('*' | '/')) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            if op == '*' {
                value *= rhs;
            } else {
                if rhs == 0.0 {
                    return Err("division by zero".to_string());
                }
                value /= rhs;
            }
        }
        Ok(value)
    }

    fn factor(&mut self) -> Result<f64, String> {
        match self.peek() {
            Some('-') => {
                self.pos += 1;
                Ok(-self.factor()?)
            }
            Some('(') => {
                self.pos += 1;
                let value = self.expr()?;
                if self.peek() != Some(')') {
                    return Err("unbalanced parentheses".to_string());
                }
                self.pos += 1;
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            _ => Err(format!("unexpected token at position {}", self.pos)),
        }
    }

    fn number(&mut self) -> Result<f64, String> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        let literal: String = self.tokens[start..self.pos].iter().collect();
        literal
            .parse::<f64>()
            .map_err(|_| format!("invalid number '{}'", literal))
    }
}
