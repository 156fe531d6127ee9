use anyhow::Result;
use async_trait::async_trait;

use smorti_core::Language;

/// Input for one creative turn.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreativeRequest {
    pub text: String,
    pub language: Language,
    /// Turns already served in this conversation; rotates canned output.
    pub sequence: u64,
}

/// Produces free text for creative requests. Output is untrusted and always
/// goes through the grounding validator.
#[async_trait]
pub trait CreativeWriter: Send + Sync {
    async fn compose(&self, request: &CreativeRequest) -> Result<String>;
}

const ARABIC_TECH_JOKES: &[&str] = &[
    "ليش الواي فاي زعلان؟\nلأن الكل يتصل فيه… وما أحد يسأل عنه 📶😂",
    "قالوا للمبرمج: اكتب كود نظيف…\nراح غسل اللابتوب 🧼💻😂",
    "المبرمج إذا قال: بس أصلح شي بسيط…\nاعرف إن اليوم راح يطول 😭⌨️",
    "ليش السيرفر متوتر؟\nلأن عليه ضغط… حرفياً 😅🖥️",
    "سألته: ليه تحب البرمجة؟\nقال: لأنها العلاقة الوحيدة اللي إذا خربت تصلحها بـ Ctrl+Z 😄⌨️",
];

const ENGLISH_TECH_JOKES: &[&str] = &[
    "Why do programmers prefer dark mode?\nBecause light attracts bugs 🐛😄",
    "Debugging: where you remove one bug and add two new features 🐛✨",
    "I told my computer I needed a break…\nIt said: no problem, I'll go to sleep 😴💻",
    "Why did the developer go broke?\nBecause he used up all his cache 💸😂",
    "\"It works on my machine\" is the most powerful spell in software engineering 😅🧩",
];

/// Deterministic writer that rotates through a fixed set of tech jokes.
#[derive(Clone, Debug, Default)]
pub struct CannedJokeWriter;

impl CannedJokeWriter {
    pub fn joke(language: Language, sequence: u64) -> &'static str {
        let jokes = match language {
            Language::Arabic => ARABIC_TECH_JOKES,
            Language::English => ENGLISH_TECH_JOKES,
        };
        let index = (sequence % jokes.len() as u64) as usize;
        jokes[index]
    }
}

#[async_trait]
impl CreativeWriter for CannedJokeWriter {
    async fn compose(&self, request: &CreativeRequest) -> Result<String> {
        Ok(Self::joke(request.language, request.sequence).to_string())
    }
}
