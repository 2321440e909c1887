//! Wrappers for sensitive fields that never render their raw value.
//!
//! [`Password`] and [`Email`] redact themselves in `Display`, `Debug` and
//! `Serialize`, so they stay masked in log fields (`%value` or `?value`), JSON
//! payloads and `format!` output alike. Code that needs the raw value asks for
//! it explicitly with `expose`.

use std::borrow::Cow;
use std::fmt::{Debug, Display, Formatter};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use serde::{Deserialize, Serialize, Serializer};

pub const REDACTED: &str = "[REDACTED]";

pub trait Redact {
    fn redact(&self) -> Cow<'_, str>;
}

/// Masking strategy. Returns `None` when the input does not qualify, in which
/// case callers keep it unchanged.
pub trait Redactor: Send + Sync {
    fn redact(&self, input: &str) -> Option<String>;
}

/// Replaces the first three characters of the local part with `xxx` when the
/// local part has at least four characters.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleEmailMasker;

impl Redactor for SimpleEmailMasker {
    fn redact(&self, input: &str) -> Option<String> {
        let at = input.find('@')?;
        let (cut, _) = input[..at].char_indices().nth(3)?;
        Some(format!("xxx{}", &input[cut..]))
    }
}

pub struct EmailRedactor {
    inner: Box<dyn Redactor>,
}

impl EmailRedactor {
    pub fn new(inner: impl Redactor + 'static) -> Self {
        Self {
            inner: Box::new(inner),
        }
    }

    pub fn redact<'a>(&self, email: &'a str) -> Cow<'a, str> {
        match self.inner.redact(email) {
            Some(masked) => Cow::Owned(masked),
            None => Cow::Borrowed(email),
        }
    }
}

impl Default for EmailRedactor {
    fn default() -> Self {
        Self::new(SimpleEmailMasker)
    }
}

impl Debug for EmailRedactor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailRedactor").finish_non_exhaustive()
    }
}

static GLOBAL_EMAIL_REDACTOR: RwLock<Option<Arc<EmailRedactor>>> = RwLock::new(None);

static DEFAULT_EMAIL_REDACTOR: OnceLock<Arc<EmailRedactor>> = OnceLock::new();

/// Replaces the redactor used by every [`Email`] in the process.
pub fn set_global_email_redactor(redactor: EmailRedactor) {
    let mut slot = GLOBAL_EMAIL_REDACTOR
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    *slot = Some(Arc::new(redactor));
}

/// Returns the process-wide email redactor, a [`SimpleEmailMasker`] unless one
/// was installed with [`set_global_email_redactor`].
pub fn global_email_redactor() -> Arc<EmailRedactor> {
    let installed = GLOBAL_EMAIL_REDACTOR
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    installed.unwrap_or_else(|| {
        DEFAULT_EMAIL_REDACTOR
            .get_or_init(|| Arc::new(EmailRedactor::default()))
            .clone()
    })
}

#[derive(Clone, Eq, PartialEq, Hash, Deserialize)]
#[serde(transparent)]
pub struct Password(String);

impl Password {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Redact for Password {
    fn redact(&self) -> Cow<'_, str> {
        Cow::Borrowed(REDACTED)
    }
}

#[derive(Clone, Eq, PartialEq, Hash, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Redact for Email {
    fn redact(&self) -> Cow<'_, str> {
        Cow::Owned(global_email_redactor().redact(&self.0).into_owned())
    }
}

macro_rules! redacted_rendering {
    ($($ty:ty),+) => {$(
        impl Display for $ty {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.redact())
            }
        }

        impl Debug for $ty {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.redact())
            }
        }

        impl Serialize for $ty {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.redact())
            }
        }

        impl From<&str> for $ty {
            fn from(raw: &str) -> Self {
                Self::new(raw)
            }
        }

        impl From<String> for $ty {
            fn from(raw: String) -> Self {
                Self::new(raw)
            }
        }
    )+};
}

redacted_rendering!(Password, Email);
