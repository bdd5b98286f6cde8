//! Fetching Graph nodes into schema-bound records.

use fbgraph_common::error::{AuthError, ClientError};
use fbgraph_common::http_client::HttpClient;
use fbgraph_common::request::{GraphExt, GraphRequest, Response};
use fbgraph_common::value::FieldValue;
use fbgraph_object::{
    Application, Entity, EntityFactory, EntityRecord, EntitySchema, ObjectError,
    SubscriptionList,
};
use http::StatusCode;
use smol_str::SmolStr;
use url::Url;

use super::token::{AccessToken, NoToken};
use crate::config::{GraphConfig, IngestPolicy};
use crate::error::{Error, Result};

/// Loads Graph nodes and hands them back as populated [`EntityRecord`]s.
///
/// Every call is validated against the entity schema before anything goes on
/// the wire. An expired token is invalidated and the call repeated once with a
/// fresh one.
///
/// ```no_run
/// # #[tokio::main]
/// # async fn main() -> Result<(), fbgraph::Error> {
/// use fbgraph::{EntityType, RemoteLoader};
///
/// let loader = RemoteLoader::new(reqwest::Client::new());
/// let app = loader.load(EntityType::Application, "2439131959", &["name", "namespace"]).await?;
/// println!("{}", app.to_json());
/// # Ok(())
/// # }
/// ```
pub struct RemoteLoader<C, T = NoToken> {
    client: C,
    token: T,
    config: GraphConfig,
    base: Url,
    factory: EntityFactory,
}

impl<C: HttpClient> RemoteLoader<C, NoToken> {
    /// A loader without credentials using the default configuration.
    pub fn new(client: C) -> Self {
        let config = GraphConfig::default();
        Self {
            client,
            token: NoToken,
            base: config.base_url.clone(),
            config,
            factory: EntityFactory::default(),
        }
    }
}

#[cfg(feature = "reqwest-client")]
impl RemoteLoader<reqwest::Client, NoToken> {
    /// A credential-less loader over a default reqwest client.
    pub fn unauthenticated() -> Self {
        Self::new(reqwest::Client::new())
    }
}

impl<C, T> RemoteLoader<C, T> {
    /// Validate and apply `config`.
    pub fn with_config(self, config: GraphConfig) -> Result<Self> {
        let base = config.base()?;
        Ok(Self {
            base,
            config,
            ..self
        })
    }

    /// Attach a credential.
    pub fn with_token<U: AccessToken>(self, token: U) -> RemoteLoader<C, U> {
        RemoteLoader {
            client: self.client,
            token,
            config: self.config,
            base: self.base,
            factory: self.factory,
        }
    }

    /// Use a custom type registry.
    pub fn with_factory(self, factory: EntityFactory) -> Self {
        Self { factory, ..self }
    }

    /// Active configuration
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Type registry used to build records
    pub fn factory(&self) -> &EntityFactory {
        &self.factory
    }

    /// The credential
    pub fn token(&self) -> &T {
        &self.token
    }

    /// The transport
    pub fn client(&self) -> &C {
        &self.client
    }
}

impl<C, T> RemoteLoader<C, T>
where
    C: HttpClient + Sync,
    T: AccessToken + Sync,
{
    /// Fetch node `id` as an entity of type `kind`.
    ///
    /// `kind` is a type tag (`"application"`, `"Payments"`, ...) or an
    /// [`EntityType`](fbgraph_object::EntityType). With no `fields` the API's
    /// default field set is returned.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self, kind, fields), fields(kind = kind.as_ref())))]
    pub async fn load(
        &self,
        kind: impl AsRef<str>,
        id: &str,
        fields: &[&str],
    ) -> Result<EntityRecord> {
        let schema = self.factory.schema(kind.as_ref())?;
        self.fetch(schema, id, fields).await
    }

    /// Fetch node `id` straight into a typed entity.
    pub async fn load_typed<E: Entity>(&self, id: &str, fields: &[&str]) -> Result<E> {
        let record = self.fetch(E::TYPE.schema(), id, fields).await?;
        Ok(E::try_from(record)?)
    }

    /// Re-fetch `record` by its own `id`, replacing every value.
    ///
    /// On error the record is left as it was.
    pub async fn refresh(&self, record: &mut EntityRecord, fields: &[&str]) -> Result<()> {
        let id = record_id(record)?;
        *record = self.fetch(record.schema(), &id, fields).await?;
        Ok(())
    }

    async fn fetch(
        &self,
        schema: &'static EntitySchema,
        id: &str,
        fields: &[&str],
    ) -> Result<EntityRecord> {
        let required = schema.required_permission(fields.iter().copied())?;
        let request = GraphRequest::get(id)
            .fields(fields.iter().copied())
            .map_err(ClientError::from)?;

        let response = self
            .call(&request, required.is_required())
            .await
            .map_err(|e| node_error(id, e))?;
        let object = response
            .object()
            .map_err(|e| Error::invalid_node(id, response.status(), e.to_string()))?;

        let mut record = EntityRecord::new(schema);
        self.ingest(&mut record, object)?;
        record.mark_loaded();
        Ok(record)
    }

    fn ingest(
        &self,
        record: &mut EntityRecord,
        object: impl IntoIterator<Item = (SmolStr, FieldValue)>,
    ) -> Result<()> {
        for (key, value) in object {
            match record.set_field_value(&key, value) {
                Ok(()) => {}
                Err(ObjectError::UnknownField { .. })
                    if self.config.ingest == IngestPolicy::Permissive =>
                {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(entity = record.name(), field = %key, "skipping undeclared field");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Subscriptions registered for application `app_id`. Needs the app token.
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self)))]
    pub async fn subscriptions(&self, app_id: &str) -> Result<SubscriptionList> {
        let request = GraphRequest::get(app_id).path("subscriptions");
        let response = self
            .call(&request, true)
            .await
            .map_err(|e| node_error(app_id, e))?;
        let page: FieldValue = response
            .json()
            .map_err(|e| Error::invalid_node(app_id, response.status(), e.to_string()))?;
        Ok(SubscriptionList::try_from(page)?)
    }

    /// Fetch the subscriptions of `app` and store them on it.
    pub async fn fetch_subscriptions(&self, app: &mut Application) -> Result<()> {
        let id = record_id(app.record())?;
        let list = self.subscriptions(&id).await?;
        app.set_subscriptions(list);
        Ok(())
    }

    /// Send `request` with the current token, retrying once after an expired-token answer.
    ///
    /// Without `needs_token`, a loader that has no credential sends the request anonymously.
    pub(crate) async fn call(
        &self,
        request: &GraphRequest,
        needs_token: bool,
    ) -> std::result::Result<Response, ClientError> {
        let token = self.current_token(needs_token).await?;
        let sent_token = token.is_some();
        match self.send(request, token).await {
            Err(ClientError::Auth(AuthError::TokenExpired)) if sent_token => {
                #[cfg(feature = "tracing")]
                tracing::warn!(endpoint = %request.endpoint(), "access token expired, retrying with a new one");
                self.token.invalidate().await;
                let token = self.current_token(true).await?;
                self.send(request, token).await
            }
            other => other,
        }
    }

    async fn current_token(
        &self,
        required: bool,
    ) -> std::result::Result<Option<SmolStr>, ClientError> {
        match self.token.token().await {
            Ok(token) => Ok(Some(token)),
            Err(ClientError::Auth(AuthError::NotAuthenticated)) if !required => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn send(
        &self,
        request: &GraphRequest,
        token: Option<SmolStr>,
    ) -> std::result::Result<Response, ClientError> {
        let mut call = self.client.graph(self.base.clone()).retry(self.config.retry);
        if let Some(token) = token {
            call = call.auth(token);
        }
        call.send(request).await
    }
}

fn record_id(record: &EntityRecord) -> Result<SmolStr> {
    record
        .get_field_value("id")?
        .and_then(FieldValue::as_str)
        .filter(|id| !id.is_empty())
        .map(SmolStr::from)
        .ok_or(Error::MissingId {
            entity: record.name(),
        })
}

/// Auth and transport failures keep their shape; everything else means the node is unusable.
pub(crate) fn node_error(id: &str, error: ClientError) -> Error {
    match error {
        ClientError::Http(http) => {
            let message = http
                .body
                .as_ref()
                .map(|body| String::from_utf8_lossy(body).into_owned())
                .unwrap_or_default();
            Error::invalid_node(id, http.status, message)
        }
        ClientError::Api(api) => Error::invalid_node(
            id,
            StatusCode::from_u16(api.status).unwrap_or(StatusCode::BAD_REQUEST),
            api.message,
        ),
        ClientError::Decode(e) => Error::invalid_node(id, StatusCode::OK, e.to_string()),
        other => other.into(),
    }
}
