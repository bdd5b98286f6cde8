//! Facebook applications and their app-level settings.

use smol_str::SmolStr;

use crate::error::ObjectError;
use crate::factory::EntityType;
use crate::record::EntityRecord;
use crate::schema::{ConnectionDefinition, EntitySchema, FieldDefinition, FieldType, Permission};
use crate::subscription::{Subscription, SubscriptionList};

/// Schema of the `Application` node.
pub static APPLICATION: EntitySchema = EntitySchema::new(
    "Application",
    "The application ID",
    &[
        FieldDefinition::new("name", FieldType::String, "The title of the application"),
        FieldDefinition::new("description", FieldType::String, "The description of the application written by the 3rd party developers"),
        FieldDefinition::new("category", FieldType::String, "The category of the application"),
        FieldDefinition::new("company", FieldType::String, "The company the application belongs to"),
        FieldDefinition::new("icon_url", FieldType::String, "The URL of the application's icon"),
        FieldDefinition::new("subcategory", FieldType::String, "The subcategory of the application"),
        FieldDefinition::new("link", FieldType::String, "A link to the Application on Facebook"),
        FieldDefinition::new("logo_url", FieldType::String, "The URL of the application's logo"),
        FieldDefinition::new("daily_active_users", FieldType::String, "The number of daily active users the application has"),
        FieldDefinition::new("daily_active_users_rank", FieldType::String, "Ranking of this app vs other apps comparing daily active users"),
        FieldDefinition::new("weekly_active_users", FieldType::String, "The number of weekly active users the application has"),
        FieldDefinition::new("monthly_active_users", FieldType::String, "The number of monthly active users the application has"),
        FieldDefinition::new("monthly_active_users_rank", FieldType::String, "Ranking of this app vs other apps comparing monthly active users"),
        FieldDefinition::new("migrations", FieldType::Array, "Migrations settings for app profile")
            .permission(Permission::App)
            .editable()
            .must_ask(),
        FieldDefinition::new("namespace", FieldType::String, "The namespace for the app")
            .permission(Permission::App)
            .editable(),
        FieldDefinition::new("restrictions", FieldType::Object, "Demographic restrictions set for this app")
            .permission(Permission::App)
            .editable()
            .must_ask(),
        FieldDefinition::new("app_domains", FieldType::Array, "Domains and subdomains this app can use")
            .permission(Permission::App)
            .editable()
            .must_ask(),
        FieldDefinition::new("auth_dialog_data_help_url", FieldType::String, "The URL of a special landing page that helps users of an app begin publishing Open Graph activity")
            .permission(Permission::App)
            .editable()
            .must_ask(),
        FieldDefinition::new("auth_dialog_headline", FieldType::String, "One line description of an app that appears in the Auth Dialog")
            .permission(Permission::App)
            .editable()
            .must_ask(),
        FieldDefinition::new("canvas_url", FieldType::String, "The non-secure URL from which Canvas app content is loaded")
            .permission(Permission::App)
            .editable()
            .must_ask(),
        FieldDefinition::new("contact_email", FieldType::String, "Email address listed for users to contact developers")
            .permission(Permission::App)
            .editable()
            .must_ask(),
        FieldDefinition::new("created_time", FieldType::Integer, "Unix timestamp that indicates when the app was created")
            .permission(Permission::App)
            .must_ask(),
        FieldDefinition::new("creator_uid", FieldType::Integer, "User ID of the creator of this app")
            .permission(Permission::App)
            .must_ask(),
        FieldDefinition::new("deauth_callback_url", FieldType::String, "URL that is pinged whenever a user removes the app")
            .permission(Permission::App)
            .editable()
            .must_ask(),
        FieldDefinition::new("page_tab_default_name", FieldType::String, "The title of the app when used in a Page Tab")
            .permission(Permission::App)
            .editable()
            .must_ask(),
        FieldDefinition::new("page_tab_url", FieldType::String, "The non-secure URL from which Page Tab app content is loaded")
            .permission(Permission::App)
            .editable()
            .must_ask(),
        FieldDefinition::new("privacy_policy_url", FieldType::String, "The URL that links to a Privacy Policy for the app")
            .permission(Permission::App)
            .editable()
            .must_ask(),
        FieldDefinition::new("profile_section_url", FieldType::String, "The desktop URL that is a direct link to the section created when your app creates objects for collections")
            .permission(Permission::App)
            .editable()
            .must_ask(),
        FieldDefinition::new("secure_canvas_url", FieldType::String, "The secure URL from which Canvas app content is loaded")
            .permission(Permission::App)
            .editable()
            .must_ask(),
        FieldDefinition::new("secure_page_tab_url", FieldType::String, "The secure URL from which Page Tab app content is loaded")
            .permission(Permission::App)
            .editable()
            .must_ask(),
        FieldDefinition::new("server_ip_whitelist", FieldType::String, "App requests must originate from this comma-separated list of IP addresses")
            .permission(Permission::App)
            .editable()
            .must_ask(),
        FieldDefinition::new("social_discovery", FieldType::Boolean, "Indicates whether app usage stories show up in the Ticker or News Feed")
            .permission(Permission::App)
            .editable()
            .must_ask(),
        FieldDefinition::new("terms_of_service_url", FieldType::String, "URL to Terms of Service which is linked to in Auth Dialog")
            .permission(Permission::App)
            .editable()
            .must_ask(),
        FieldDefinition::new("user_support_email", FieldType::String, "Main contact email for this app")
            .permission(Permission::App)
            .editable()
            .must_ask(),
        FieldDefinition::new("user_support_url", FieldType::String, "URL of support for users of an app shown in Canvas footer")
            .permission(Permission::App)
            .editable()
            .must_ask(),
        FieldDefinition::new("website_url", FieldType::String, "URL of a website that integrates with this app")
            .permission(Permission::App)
            .editable()
            .must_ask(),
    ],
    &[
        ConnectionDefinition::new("accounts", "Test User accounts associated with the app", Permission::App),
        ConnectionDefinition::new("achievements", "Achievements registered for the app", Permission::App),
        ConnectionDefinition::new("banned", "Banned users from your app", Permission::App),
        ConnectionDefinition::new("groups", "Groups for this app", Permission::App),
        ConnectionDefinition::new("insights", "Usage metrics for this application", Permission::App),
        ConnectionDefinition::new("payment_currencies", "Open Graph currency objects associated with this application", Permission::App),
        ConnectionDefinition::new("payments", "The list of Facebook Credits orders associated with the application", Permission::App),
        ConnectionDefinition::new("picture", "The application's profile picture with maximum dimensions of 75x75 pixels suitable for embedding as the source of an image tag", Permission::None),
        ConnectionDefinition::new("roles", "The developer roles defined for this application", Permission::App),
        ConnectionDefinition::new("staticresources", "Usage stats about the canvas application's static resources, such as javascript and CSS, and which ones are being flushed to browsers early", Permission::App),
        ConnectionDefinition::new("subscriptions", "All of the subscriptions this application has for real-time notifications", Permission::App),
        ConnectionDefinition::new("translations", "The translated strings for this application", Permission::App),
        ConnectionDefinition::new("scores", "Scores for the user and their friends", Permission::User),
    ],
);

/// An application node plus the local settings that never travel as fields:
/// its secret, the permissions it asks users for, and its realtime subscriptions.
///
/// ```
/// use fbgraph_object::Application;
///
/// let mut app = Application::with_credentials("2439131959", "s3cr3t");
/// app.set_scope("email, user_likes");
/// assert_eq!(app.scope_string(), "email,user_likes");
/// assert_eq!(app.credentials().unwrap(), ("2439131959", "s3cr3t"));
/// ```
#[derive(Debug, Clone)]
pub struct Application {
    record: EntityRecord,
    secret: Option<SmolStr>,
    scope: Vec<SmolStr>,
    subscriptions: SubscriptionList,
}

impl Application {
    /// An empty application
    pub fn new() -> Self {
        Self::from_record(EntityRecord::new(&APPLICATION))
    }

    /// An application handle with its id and secret, ready to request an app token.
    pub fn with_credentials(id: &str, secret: impl Into<SmolStr>) -> Self {
        let mut app = Self::new();
        app.record.seed_id(id);
        app.secret = Some(secret.into());
        app
    }

    fn from_record(record: EntityRecord) -> Self {
        Self {
            record,
            secret: None,
            scope: Vec::new(),
            subscriptions: SubscriptionList::new(),
        }
    }

    typed_accessors! {
        "id" => id, set_id: str;
        "name" => name, set_name: str;
        "description" => description, set_description: str;
        "category" => category, set_category: str;
        "company" => company, set_company: str;
        "icon_url" => icon_url, set_icon_url: str;
        "subcategory" => subcategory, set_subcategory: str;
        "link" => link, set_link: str;
        "logo_url" => logo_url, set_logo_url: str;
        "daily_active_users" => daily_active_users, set_daily_active_users: str;
        "daily_active_users_rank" => daily_active_users_rank, set_daily_active_users_rank: str;
        "weekly_active_users" => weekly_active_users, set_weekly_active_users: str;
        "monthly_active_users" => monthly_active_users, set_monthly_active_users: str;
        "monthly_active_users_rank" => monthly_active_users_rank, set_monthly_active_users_rank: str;
        "migrations" => migrations, set_migrations: array;
        "namespace" => namespace, set_namespace: str;
        "restrictions" => restrictions, set_restrictions: object;
        "app_domains" => app_domains, set_app_domains: array;
        "auth_dialog_data_help_url" => auth_dialog_data_help_url, set_auth_dialog_data_help_url: str;
        "auth_dialog_headline" => auth_dialog_headline, set_auth_dialog_headline: str;
        "canvas_url" => canvas_url, set_canvas_url: str;
        "contact_email" => contact_email, set_contact_email: str;
        "created_time" => created_time, set_created_time: int;
        "creator_uid" => creator_uid, set_creator_uid: int;
        "deauth_callback_url" => deauth_callback_url, set_deauth_callback_url: str;
        "page_tab_default_name" => page_tab_default_name, set_page_tab_default_name: str;
        "page_tab_url" => page_tab_url, set_page_tab_url: str;
        "privacy_policy_url" => privacy_policy_url, set_privacy_policy_url: str;
        "profile_section_url" => profile_section_url, set_profile_section_url: str;
        "secure_canvas_url" => secure_canvas_url, set_secure_canvas_url: str;
        "secure_page_tab_url" => secure_page_tab_url, set_secure_page_tab_url: str;
        "server_ip_whitelist" => server_ip_whitelist, set_server_ip_whitelist: str;
        "social_discovery" => social_discovery, set_social_discovery: bool;
        "terms_of_service_url" => terms_of_service_url, set_terms_of_service_url: str;
        "user_support_email" => user_support_email, set_user_support_email: str;
        "user_support_url" => user_support_url, set_user_support_url: str;
        "website_url" => website_url, set_website_url: str;
    }

    /// The app secret, if known
    pub fn secret(&self) -> Option<&str> {
        self.secret.as_deref()
    }

    /// Store the app secret
    pub fn set_secret(&mut self, secret: impl Into<SmolStr>) {
        self.secret = Some(secret.into());
    }

    /// Id and secret together, as needed for the client credentials grant.
    pub fn credentials(&self) -> Result<(&str, &str), ObjectError> {
        let id = self
            .id()
            .filter(|id| !id.is_empty())
            .ok_or(ObjectError::MissingCredentials {
                what: "application id",
            })?;
        let secret = self
            .secret()
            .filter(|s| !s.is_empty())
            .ok_or(ObjectError::MissingCredentials { what: "app secret" })?;
        Ok((id, secret))
    }

    /// Requested permissions
    pub fn scope(&self) -> &[SmolStr] {
        &self.scope
    }

    /// Replace the requested permissions from a comma separated list.
    pub fn set_scope(&mut self, scope: &str) {
        self.set_scope_list(scope.split(','));
    }

    /// Replace the requested permissions; blanks and repeats are dropped.
    pub fn set_scope_list<S: AsRef<str>>(&mut self, scope: impl IntoIterator<Item = S>) {
        self.scope.clear();
        for item in scope {
            let item = item.as_ref().trim();
            if !item.is_empty() && !self.scope.iter().any(|s| s == item) {
                self.scope.push(item.into());
            }
        }
    }

    /// Requested permissions joined with commas, as the login dialog expects
    pub fn scope_string(&self) -> String {
        self.scope.join(",")
    }

    /// Realtime subscriptions of this application
    pub fn subscriptions(&self) -> &SubscriptionList {
        &self.subscriptions
    }

    /// Replace the subscriptions wholesale.
    pub fn set_subscriptions(&mut self, subscriptions: SubscriptionList) {
        self.subscriptions = subscriptions;
    }

    /// Replace the subscriptions from JSON text, either a list or a `{"data": [...]}` page.
    ///
    /// On error the current subscriptions are kept.
    pub fn set_subscriptions_json(&mut self, json: &str) -> Result<(), ObjectError> {
        self.subscriptions = SubscriptionList::from_json(json)?;
        Ok(())
    }

    /// Add one subscription; a second one for the same object is refused.
    pub fn add_subscription(&mut self, subscription: Subscription) -> Result<(), ObjectError> {
        self.subscriptions.insert(subscription)
    }
}

impl Default for Application {
    fn default() -> Self {
        Self::new()
    }
}

entity_record!(Application, APPLICATION, EntityType::Application);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Entity;
    use crate::error::ErrorKind;
    use crate::factory::EntityFactory;

    #[test]
    fn schema_shape() {
        assert_eq!(APPLICATION.name(), "Application");
        assert_eq!(APPLICATION.id().description(), "The application ID");
        assert!(APPLICATION.contains("icon_url"));
        assert!(APPLICATION.contains("namespace"));
        assert_eq!(APPLICATION.field("created_time").unwrap().field_type(), FieldType::Integer);
        assert!(APPLICATION.connection("subscriptions").is_ok());
        assert!(APPLICATION.connection("photos").is_err());
    }

    #[test]
    fn typed_accessors_follow_the_schema() {
        let mut app = Application::new();
        app.set_name("Graffiti ").unwrap();
        app.set_namespace("graffitiwall").unwrap();
        app.set_social_discovery("1").unwrap();
        app.set_creator_uid("499").unwrap();
        assert_eq!(app.name(), Some("Graffiti "));
        assert_eq!(app.namespace(), Some("graffitiwall"));
        assert_eq!(app.social_discovery(), Some(true));
        assert_eq!(app.creator_uid(), Some(499));
        assert_eq!(app.icon_url(), None);

        let err = app.set_app_domains("example.com").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidType);
    }

    #[test]
    fn converts_from_matching_records_only() {
        let factory = EntityFactory::default();
        let mut record = factory.create("application").unwrap();
        record.set_field_value("name", "Graffiti").unwrap();
        let app = Application::try_from(record).unwrap();
        assert_eq!(app.name(), Some("Graffiti"));
        assert!(app.record().is_modified());

        let err = Application::try_from(factory.create("user").unwrap()).unwrap_err();
        assert!(matches!(
            err,
            ObjectError::WrongEntity {
                expected: "Application",
                found: "User"
            }
        ));
    }

    #[test]
    fn credentials_need_both_parts() {
        let mut app = Application::new();
        assert!(matches!(
            app.credentials(),
            Err(ObjectError::MissingCredentials { what: "application id" })
        ));
        app.set_id("123").unwrap();
        assert!(matches!(
            app.credentials(),
            Err(ObjectError::MissingCredentials { what: "app secret" })
        ));
        app.set_secret("abc");
        assert_eq!(app.credentials().unwrap(), ("123", "abc"));
        assert!(!Application::with_credentials("1", "x").record().is_modified());
    }

    #[test]
    fn scope_lists() {
        let mut app = Application::new();
        app.set_scope(" email,user_likes,,email ");
        assert_eq!(app.scope(), ["email", "user_likes"]);
        app.set_scope_list(["publish_actions"]);
        assert_eq!(app.scope_string(), "publish_actions");
        app.set_scope("");
        assert!(app.scope().is_empty());
    }

    #[test]
    fn subscriptions() {
        let mut app = Application::new();
        app.set_subscriptions_json(
            r#"[{"object":"user","callback_url":"https://a","fields":["name"],"active":true}]"#,
        )
        .unwrap();
        assert_eq!(app.subscriptions().len(), 1);

        let err = app
            .add_subscription(Subscription::new("user", "https://b", ["email"], true))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Duplicate);
        app.add_subscription(Subscription::new("page", "https://b", ["feed"], true))
            .unwrap();
        assert_eq!(app.subscriptions().len(), 2);

        assert!(app.set_subscriptions_json("{}").is_err());
        assert_eq!(app.subscriptions().len(), 2);

        app.set_subscriptions(SubscriptionList::new());
        assert!(app.subscriptions().is_empty());
    }
}
