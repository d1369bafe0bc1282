//! Catalog of reusable rule builders.
//!
//! Every builder is pure: it takes [`RuleArgs`] (all fields optional) and
//! returns a fresh [`RuleDescriptor`] carrying the catalog's trigger hint.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::id_number::is_id_number;
use super::{Predicate, RuleDescriptor, RuleKind, Trigger, ValueType};

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

/// Eight digits, no leading zero.
pub const USER_ID_PATTERN: &str = r"^[1-9][0-9]{7}$";

pub const ACCOUNT_PATTERN: &str = r"^[a-zA-Z0-9_-]{8,20}$";

/// ASCII word characters or CJK ideographs, 2 to 8 of them.
pub const NICKNAME_PATTERN: &str = r"^[A-Za-z0-9_\x{4e00}-\x{9fa5}]{2,8}$";

/// Mainland mobile number, optional spaces after the 3rd and 7th digit.
pub const PHONE_NUMBER_PATTERN: &str = r"^1[0-9]{2}\s?[0-9]{4}\s?[0-9]{4}$";

pub const EMAIL_PATTERN: &str = r#"^(([^<>()\[\]\\.,;:\s@"]+(\.[^<>()\[\]\\.,;:\s@"]+)*)|(".+"))@((\[[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\.[0-9]{1,3}\])|(([a-zA-Z\-0-9]+\.)+[a-zA-Z]{2,}))$"#;

/// Allowed password alphabet and length; digit/letter mix is checked separately.
pub const PASSWORD_CHARSET_PATTERN: &str = r"^[A-Za-z0-9_!@#$%^&*()\-+=]{6,16}$";

/// Length of a verification code.
pub const CAPTCHA_LENGTH: usize = 6;

static USER_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(USER_ID_PATTERN).expect("valid regex"));
static ACCOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ACCOUNT_PATTERN).expect("valid regex"));
static NICKNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(NICKNAME_PATTERN).expect("valid regex"));
static PHONE_NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PHONE_NUMBER_PATTERN).expect("valid regex"));
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN).expect("valid regex"));
static PASSWORD_CHARSET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(PASSWORD_CHARSET_PATTERN).expect("valid regex"));

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Options shared by every rule a [`Catalog`] builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleOptions {
    pub trigger: Option<Trigger>,
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            trigger: Some(Trigger::Blur),
        }
    }
}

/// Per-rule arguments. An explicit `message` wins over the label-derived one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleArgs {
    pub label: Option<String>,
    pub message: Option<String>,
}

impl RuleArgs {
    pub fn label(label: impl Into<String>) -> Self {
        Self {
            label: Some(label.into()),
            message: None,
        }
    }

    pub fn message(message: impl Into<String>) -> Self {
        Self {
            label: None,
            message: Some(message.into()),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    fn resolve(&self, default_label: &str, default_message: impl FnOnce(&str) -> String) -> String {
        if let Some(message) = self.message.as_deref().filter(|m| !m.is_empty()) {
            return message.to_string();
        }
        default_message(self.label.as_deref().unwrap_or(default_label))
    }
}

fn format_error(label: &str) -> String {
    format!("Invalid {label} format")
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// Rule builders sharing one set of [`RuleOptions`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Catalog {
    options: RuleOptions,
}

impl Catalog {
    pub fn new(options: RuleOptions) -> Self {
        Self { options }
    }

    /// A catalog whose rules carry no trigger hint.
    pub fn plain() -> Self {
        Self::new(RuleOptions { trigger: None })
    }

    pub fn options(&self) -> RuleOptions {
        self.options
    }

    fn build(&self, kind: RuleKind, message: String) -> RuleDescriptor {
        RuleDescriptor::new(kind, message).with_trigger(self.options.trigger)
    }

    /// Optional 8-digit numeric user ID.
    pub fn user_id(&self, args: RuleArgs) -> RuleDescriptor {
        let message = args.resolve("", |_| "Please enter an 8-digit numeric ID".to_string());
        self.predicate(
            Predicate::sync(|_, value| match value.as_str() {
                None => value.is_null(),
                Some(s) => s.is_empty() || USER_ID_RE.is_match(s),
            }),
            message,
        )
    }

    pub fn account(&self, args: RuleArgs) -> RuleDescriptor {
        let message = args.resolve("account", format_error);
        self.build(RuleKind::Pattern(ACCOUNT_RE.clone()), message)
    }

    pub fn nickname(&self, args: RuleArgs) -> RuleDescriptor {
        let message = args.resolve("nickname", format_error);
        self.build(RuleKind::Pattern(NICKNAME_RE.clone()), message)
    }

    pub fn required(&self, args: RuleArgs) -> RuleDescriptor {
        let message = args.resolve("this field", |label| format!("Please enter {label}"));
        self.build(RuleKind::Required, message)
    }

    pub fn phone_number(&self, args: RuleArgs) -> RuleDescriptor {
        let message = args.resolve("phone number", format_error);
        self.build(RuleKind::Pattern(PHONE_NUMBER_RE.clone()), message)
    }

    pub fn email(&self, args: RuleArgs) -> RuleDescriptor {
        let message = args.resolve("email", format_error);
        self.build(RuleKind::Type(ValueType::Email), message)
    }

    pub fn phone_number_or_email(&self, args: RuleArgs) -> RuleDescriptor {
        let message = args.resolve("account", |label| {
            format!("Invalid {label} format (must be a phone number or email)")
        });
        self.predicate(
            Predicate::sync(|_, value| {
                value
                    .as_str()
                    .is_some_and(|s| PHONE_NUMBER_RE.is_match(s) || EMAIL_RE.is_match(s))
            }),
            message,
        )
    }

    /// 6-16 characters with at least one digit and one letter.
    pub fn password(&self, args: RuleArgs) -> RuleDescriptor {
        let message = args.resolve("password", |label| {
            format!("Invalid {label} format (6-16 letters and digits)")
        });
        self.predicate(
            Predicate::sync(|_, value| value.as_str().is_some_and(is_password)),
            message,
        )
    }

    pub fn captcha(&self, args: RuleArgs) -> RuleDescriptor {
        let message = args.resolve("verification code", format_error);
        self.build(RuleKind::Length(CAPTCHA_LENGTH), message)
    }

    /// Optional resident identity number, see [`is_id_number`].
    pub fn id_number(&self, args: RuleArgs) -> RuleDescriptor {
        let message = args.resolve("ID number", |label| format!("Invalid {label}"));
        self.predicate(
            Predicate::sync(|_, value| match value.as_str() {
                None => value.is_null(),
                Some(s) => s.is_empty() || is_id_number(s),
            }),
            message,
        )
    }

    /// A picked object that must carry a non-empty `id`.
    pub fn selected(&self, args: RuleArgs) -> RuleDescriptor {
        let message = args.resolve("option", |label| format!("Please select {label}"));
        self.predicate(Predicate::sync(|_, value| has_identifier(value)), message)
    }

    // -- custom shapes ------------------------------------------------------

    pub fn pattern(&self, pattern: Regex, message: impl Into<String>) -> RuleDescriptor {
        self.build(RuleKind::Pattern(pattern), message.into())
    }

    pub fn value_type(&self, value_type: ValueType, message: impl Into<String>) -> RuleDescriptor {
        self.build(RuleKind::Type(value_type), message.into())
    }

    pub fn length(&self, len: usize, message: impl Into<String>) -> RuleDescriptor {
        self.build(RuleKind::Length(len), message.into())
    }

    pub fn predicate(&self, predicate: Predicate, message: impl Into<String>) -> RuleDescriptor {
        self.build(RuleKind::Predicate(predicate), message.into())
    }
}

fn is_password(s: &str) -> bool {
    PASSWORD_CHARSET_RE.is_match(s)
        && s.chars().any(|c| c.is_ascii_digit())
        && s.chars().any(|c| c.is_ascii_alphabetic())
}

fn has_identifier(value: &Value) -> bool {
    match value.get("id") {
        Some(Value::String(id)) => !id.is_empty(),
        Some(Value::Number(_)) => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleContext;
    use crate::types::Model;
    use serde_json::json;

    async fn passes(rule: &RuleDescriptor, value: Value) -> bool {
        let model = Model::new();
        let ctx = RuleContext {
            field: "f",
            model: &model,
        };
        match rule.kind() {
            RuleKind::Predicate(p) => p.check(&ctx, &value).await,
            RuleKind::Pattern(re) => value.as_str().is_some_and(|s| re.is_match(s)),
            other => panic!("unexpected rule kind {}", other.name()),
        }
    }

    #[test]
    fn default_catalog_uses_blur_trigger() {
        let rule = Catalog::default().required(RuleArgs::label("name"));
        assert_eq!(rule.trigger(), Some(Trigger::Blur));
        assert_eq!(rule.message(), "Please enter name");
    }

    #[test]
    fn plain_catalog_has_no_trigger() {
        let rule = Catalog::plain().email(RuleArgs::default());
        assert_eq!(rule.trigger(), None);
        assert_eq!(rule.message(), "Invalid email format");
    }

    #[test]
    fn explicit_message_wins() {
        let rule = Catalog::default().account(RuleArgs::label("login").with_message("nope"));
        assert_eq!(rule.message(), "nope");
    }

    #[test]
    fn empty_message_falls_back_to_label() {
        let rule = Catalog::default().account(RuleArgs::label("login").with_message(""));
        assert_eq!(rule.message(), "Invalid login format");
    }

    #[test]
    fn default_args_never_fail() {
        let c = Catalog::default();
        let rules = [
            c.user_id(RuleArgs::default()),
            c.account(RuleArgs::default()),
            c.nickname(RuleArgs::default()),
            c.required(RuleArgs::default()),
            c.phone_number(RuleArgs::default()),
            c.email(RuleArgs::default()),
            c.phone_number_or_email(RuleArgs::default()),
            c.password(RuleArgs::default()),
            c.captcha(RuleArgs::default()),
            c.id_number(RuleArgs::default()),
            c.selected(RuleArgs::default()),
        ];
        assert!(rules.iter().all(|r| !r.message().is_empty()));
    }

    #[tokio::test]
    async fn user_id_allows_empty() {
        let rule = Catalog::default().user_id(RuleArgs::default());
        assert!(passes(&rule, json!("")).await);
        assert!(passes(&rule, json!(null)).await);
        assert!(passes(&rule, json!("12345678")).await);
        assert!(!passes(&rule, json!("02345678")).await);
        assert!(!passes(&rule, json!("1234567")).await);
    }

    #[tokio::test]
    async fn phone_or_email_alternation() {
        let rule = Catalog::default().phone_number_or_email(RuleArgs::default());
        assert!(passes(&rule, json!("138 1234 5678")).await);
        assert!(passes(&rule, json!("alice@example.com")).await);
        assert!(!passes(&rule, json!("alice")).await);
        assert!(!passes(&rule, json!("")).await);
    }

    #[tokio::test]
    async fn digit_patterns_are_ascii_only() {
        let phone = Catalog::default().phone_number(RuleArgs::default());
        assert!(passes(&phone, json!("13812345678")).await);
        assert!(!passes(&phone, json!("1\u{0663}\u{0668}12345678")).await);

        let either = Catalog::default().phone_number_or_email(RuleArgs::default());
        assert!(!passes(&either, json!("1\u{0663}\u{0668}12345678")).await);

        let user_id = Catalog::default().user_id(RuleArgs::default());
        assert!(!passes(&user_id, json!("1234567\u{0668}")).await);
    }

    #[test]
    fn password_charset_is_ascii_only() {
        assert!(is_password("abc123"));
        assert!(!is_password("密码abc123"));
        assert!(!is_password("abc123é"));
    }

    #[tokio::test]
    async fn nickname_word_chars_are_ascii() {
        let rule = Catalog::default().nickname(RuleArgs::default());
        assert!(passes(&rule, json!("bob_小明")).await);
        assert!(!passes(&rule, json!("josé")).await);
    }

    #[tokio::test]
    async fn password_needs_digit_and_letter() {
        let rule = Catalog::default().password(RuleArgs::default());
        assert!(passes(&rule, json!("abc123")).await);
        assert!(passes(&rule, json!("abc123!@")).await);
        assert!(!passes(&rule, json!("abcdef")).await);
        assert!(!passes(&rule, json!("123456")).await);
        assert!(!passes(&rule, json!("a1")).await);
        assert!(!passes(&rule, json!("abc123abc123abc12")).await);
    }

    #[tokio::test]
    async fn nickname_accepts_cjk() {
        let rule = Catalog::default().nickname(RuleArgs::default());
        assert!(passes(&rule, json!("小明")).await);
        assert!(passes(&rule, json!("bob_42")).await);
        assert!(!passes(&rule, json!("x")).await);
        assert!(!passes(&rule, json!("has space")).await);
    }

    #[tokio::test]
    async fn account_is_anchored() {
        let rule = Catalog::default().account(RuleArgs::default());
        assert!(passes(&rule, json!("user_name-1")).await);
        assert!(!passes(&rule, json!("short")).await);
        assert!(!passes(&rule, json!("valid_account!")).await);
    }

    #[tokio::test]
    async fn selected_requires_identifier() {
        let rule = Catalog::default().selected(RuleArgs::label("city"));
        assert_eq!(rule.message(), "Please select city");
        assert!(passes(&rule, json!({"id": "sh", "name": "Shanghai"})).await);
        assert!(passes(&rule, json!({"id": 7})).await);
        assert!(!passes(&rule, json!({"id": ""})).await);
        assert!(!passes(&rule, json!({"name": "x"})).await);
        assert!(!passes(&rule, json!(null)).await);
    }

    #[tokio::test]
    async fn id_number_predicate() {
        let rule = Catalog::default().id_number(RuleArgs::default());
        assert!(passes(&rule, json!("")).await);
        assert!(passes(&rule, json!("11010519491231002X")).await);
        assert!(!passes(&rule, json!("110105194912310021")).await);
    }

    #[test]
    fn captcha_is_fixed_length() {
        let rule = Catalog::default().captcha(RuleArgs::default());
        assert!(matches!(rule.kind(), RuleKind::Length(6)));
    }
}
