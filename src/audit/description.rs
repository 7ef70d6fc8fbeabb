//! Template-backed audit record.
//!
//! A description carries a `comment` template and the values that fill it.
//! Only the five known placeholders are substituted: `<%system%>`,
//! `<%module%>`, `<%operate%>`, `<%user%>` and `<%data%>`. A known
//! placeholder without a value becomes the empty string. Any other
//! `<%name%>` token is left as written. Substituted values are never
//! scanned again.

use chrono::{DateTime, Local};
use serde::Serialize;

const OPEN: &str = "<%";
const CLOSE: &str = "%>";

/// One audit line before rendering.
#[derive(Debug, Clone, Serialize)]
pub struct AuditDescription {
    pub system: Option<String>,
    pub module: Option<String>,
    pub operate: Option<String>,
    pub comment: String,
    pub user: Option<String>,
    pub data: Option<String>,
    pub occur_date: DateTime<Local>,
}

impl AuditDescription {
    /// Create a description with the given template, stamped with the
    /// current time.
    pub fn new(comment: impl Into<String>) -> Self {
        Self {
            system: None,
            module: None,
            operate: None,
            comment: comment.into(),
            user: None,
            data: None,
            occur_date: Local::now(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn with_operate(mut self, operate: impl Into<String>) -> Self {
        self.operate = Some(operate.into());
        self
    }

    pub fn with_user(mut self, user: Option<String>) -> Self {
        self.user = user;
        self
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Value for a known placeholder name, `None` if the name is unknown.
    fn placeholder(&self, name: &str) -> Option<&str> {
        let value = match name {
            "system" => &self.system,
            "module" => &self.module,
            "operate" => &self.operate,
            "user" => &self.user,
            "data" => &self.data,
            _ => return None,
        };
        Some(value.as_deref().unwrap_or(""))
    }

    /// Render the comment template.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.comment.len());
        let mut rest = self.comment.as_str();

        while let Some(start) = rest.find(OPEN) {
            out.push_str(&rest[..start]);
            let after_open = &rest[start + OPEN.len()..];

            match after_open.find(CLOSE) {
                Some(end) => match self.placeholder(&after_open[..end]) {
                    Some(value) => {
                        out.push_str(value);
                        rest = &after_open[end + CLOSE.len()..];
                    }
                    None => {
                        // Not one of ours: keep the opener and continue after it.
                        out.push_str(OPEN);
                        rest = after_open;
                    }
                },
                None => {
                    out.push_str(&rest[start..]);
                    rest = "";
                }
            }
        }

        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_all_placeholders() {
        let desc = AuditDescription::new("<%system%>/<%module%> <%operate%> by <%user%>: <%data%>")
            .with_system("http")
            .with_module("orders")
            .with_operate("begin")
            .with_user(Some("alice".into()))
            .with_data("GET /orders");

        assert_eq!(desc.render(), "http/orders begin by alice: GET /orders");
    }

    #[test]
    fn test_unset_placeholders_render_empty() {
        let desc = AuditDescription::new("[<%user%>] <%data%>|");
        assert_eq!(desc.render(), "[] |");
    }

    #[test]
    fn test_plain_text_is_unchanged() {
        let desc = AuditDescription::new("*** API-URL:[GET] /api/ping ***");
        assert_eq!(desc.render(), "*** API-URL:[GET] /api/ping ***");
    }

    #[test]
    fn test_substituted_values_are_not_rescanned() {
        let desc = AuditDescription::new("<%data%>")
            .with_user(Some("bob".into()))
            .with_data("body mentions <%user%>");
        assert_eq!(desc.render(), "body mentions <%user%>");
    }

    #[test]
    fn test_unknown_and_unterminated_placeholders_are_kept() {
        let desc = AuditDescription::new("<%other%> <%data%> <%data").with_data("x");
        assert_eq!(desc.render(), "<%other%> x <%data");
    }

    #[test]
    fn test_multibyte_text_around_placeholders() {
        let desc = AuditDescription::new("é<%data%>ü").with_data("ß");
        assert_eq!(desc.render(), "éßü");
    }
}
