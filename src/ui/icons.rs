//! Shared emoji constants for the terminal renderer, with plain-text
//! fallbacks for terminals without emoji support.

use console::Emoji;

// Status indicators
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static SPARKLE: Emoji<'_, '_> = Emoji("✨ ", "*");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "[WARN]");

// Stream indicators
pub static TOOL: Emoji<'_, '_> = Emoji("🔧 ", "[TOOL]");
pub static RESULT: Emoji<'_, '_> = Emoji("📊 ", "[RES]");
pub static ROLE: Emoji<'_, '_> = Emoji("🤖 ", "[ROLE]");
