//! Built-in message catalogs. English is the fallback for unknown languages
//! and for keys a catalog lacks.

use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    En,
    Zh,
}

impl Locale {
    /// Catalog for a `general.language` value such as `en`, `zh` or `zh-CN`.
    pub fn from_code(code: &str) -> Self {
        let primary = code.split(['-', '_']).next().unwrap_or_default();
        match primary.to_ascii_lowercase().as_str() {
            "en" => Locale::En,
            "zh" => Locale::Zh,
            _ => {
                tracing::warn!(language = code, "no catalog for language, using English");
                Locale::En
            }
        }
    }

    fn lookup(self, key: &str) -> Option<&'static str> {
        match self {
            Locale::En => en(key),
            Locale::Zh => with_fallback(zh, key),
        }
    }

    /// Resolve `key`, substituting `{name}` placeholders. Parameter values that
    /// name a phase are shown by their label. Unknown keys come back verbatim.
    pub fn translate(self, key: &str, params: &BTreeMap<String, String>) -> String {
        let mut text = self.lookup(key).unwrap_or(key).to_string();
        for (name, value) in params {
            let shown = self
                .lookup(&format!("state_{value}"))
                .unwrap_or(value.as_str());
            text = text.replace(&format!("{{{name}}}"), shown);
        }
        text
    }

    pub fn text(self, key: &str) -> String {
        self.translate(key, &BTreeMap::new())
    }
}

fn with_fallback(catalog: fn(&str) -> Option<&'static str>, key: &str) -> Option<&'static str> {
    catalog(key).or_else(|| en(key))
}

fn en(key: &str) -> Option<&'static str> {
    let text = match key {
        "state_idle" => "Idle",
        "state_work" => "Work",
        "state_shortrest" => "Short break",
        "state_longrest" => "Long break",
        "state_paused" => " (paused)",
        "notification_work_complete_title" => "Work session complete",
        "notification_work_complete_next_body" => "Next up: {next}. Resume when you are ready.",
        "notification_work_complete_auto_body" => "Starting {next} now.",
        "notification_break_complete_title" => "Break is over",
        "notification_break_complete_body" => "Time to get back to work.",
        _ => return None,
    };
    Some(text)
}

fn zh(key: &str) -> Option<&'static str> {
    let text = match key {
        "state_idle" => "空闲",
        "state_work" => "工作",
        "state_shortrest" => "短休息",
        "state_longrest" => "长休息",
        "state_paused" => "（已暂停）",
        "notification_work_complete_title" => "工作时段结束",
        "notification_work_complete_next_body" => "下一步：{next}。准备好后继续。",
        "notification_work_complete_auto_body" => "即将开始{next}。",
        "notification_break_complete_title" => "休息结束",
        "notification_break_complete_body" => "该回到工作了。",
        _ => return None,
    };
    Some(text)
}

/// `m:ss`, as on the overlay card.
pub fn format_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
