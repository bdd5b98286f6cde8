//! App-to-user notifications.

use std::collections::BTreeMap;

use fbgraph_common::http_client::HttpClient;
use fbgraph_common::request::GraphRequest;
use serde::Deserialize;
use smol_str::SmolStr;

use crate::client::{AccessToken, RemoteLoader, node_error};
use crate::error::{Error, Result};

/// Longest template the API accepts, in characters.
pub const MAX_TEMPLATE_CHARS: usize = 180;

/// A notification from the application to one user.
///
/// ```
/// use fbgraph::AppNotification;
///
/// let note = AppNotification::new("100004", "Your crops are ready")
///     .unwrap()
///     .param("farm", "north field")
///     .param("a", "1");
/// assert!(note.is_valid());
/// assert_eq!(note.href(), "?a=1&farm=north%20field");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppNotification {
    user_id: SmolStr,
    template: SmolStr,
    href_params: BTreeMap<SmolStr, SmolStr>,
}

#[derive(Deserialize)]
struct SendResult {
    #[serde(default)]
    success: bool,
}

impl AppNotification {
    /// Address `template` to `user_id`.
    pub fn new(user_id: impl Into<SmolStr>, template: &str) -> Result<Self> {
        let mut note = Self {
            user_id: user_id.into(),
            template: SmolStr::default(),
            href_params: BTreeMap::new(),
        };
        note.set_template(template)?;
        Ok(note)
    }

    /// Replace the message text.
    pub fn set_template(&mut self, template: &str) -> Result<()> {
        let chars = template.chars().count();
        if chars > MAX_TEMPLATE_CHARS {
            return Err(Error::InvalidNotification {
                reason: format!("template is {chars} characters, at most {MAX_TEMPLATE_CHARS} allowed"),
            });
        }
        self.template = template.into();
        Ok(())
    }

    /// Add a parameter to the link the user lands on; later values win.
    pub fn param(mut self, key: impl Into<SmolStr>, value: impl Into<SmolStr>) -> Self {
        self.href_params.insert(key.into(), value.into());
        self
    }

    /// Recipient
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Message text
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Whether there is a recipient and something to say.
    pub fn is_valid(&self) -> bool {
        !self.user_id.is_empty() && !self.template.is_empty()
    }

    /// The landing query string, `?k=v&...` in key order; empty without parameters.
    pub fn href(&self) -> String {
        if self.href_params.is_empty() {
            return String::new();
        }
        let pairs: Vec<String> = self
            .href_params
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        format!("?{}", pairs.join("&"))
    }

    /// Deliver through `loader`, which must carry the app access token.
    ///
    /// Returns the API's `success` flag.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self, loader), fields(user_id = %self.user_id)))]
    pub async fn send<C, T>(&self, loader: &RemoteLoader<C, T>) -> Result<bool>
    where
        C: HttpClient + Sync,
        T: AccessToken + Sync,
    {
        if !self.is_valid() {
            return Err(Error::InvalidNotification {
                reason: "a recipient and a template are required".into(),
            });
        }
        let mut request = GraphRequest::post(self.user_id.clone())
            .path("notifications")
            .param("template", self.template.clone());
        let href = self.href();
        if !href.is_empty() {
            request = request.param("href", href);
        }

        let response = loader
            .call(&request, true)
            .await
            .map_err(|e| node_error(&self.user_id, e))?;
        let result: SendResult = response
            .json()
            .map_err(|e| Error::invalid_node(&self.user_id, response.status(), e.to_string()))?;
        Ok(result.success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_length_is_bounded() {
        let exactly = "é".repeat(MAX_TEMPLATE_CHARS);
        assert!(AppNotification::new("1", &exactly).is_ok());
        let over = "x".repeat(MAX_TEMPLATE_CHARS + 1);
        assert!(matches!(
            AppNotification::new("1", &over),
            Err(Error::InvalidNotification { .. })
        ));

        let mut note = AppNotification::new("1", "hi").unwrap();
        assert!(note.set_template(&over).is_err());
        assert_eq!(note.template(), "hi");
    }

    #[test]
    fn validity() {
        assert!(!AppNotification::new("", "hi").unwrap().is_valid());
        assert!(!AppNotification::new("1", "").unwrap().is_valid());
        assert_eq!(AppNotification::new("1", "hi").unwrap().href(), "");
    }

    #[test]
    fn href_is_encoded_and_ordered() {
        let note = AppNotification::new("1", "hi")
            .unwrap()
            .param("z", "a&b=c")
            .param("b", "x")
            .param("b", "y");
        assert_eq!(note.href(), "?b=y&z=a%26b%3Dc");
    }
}
